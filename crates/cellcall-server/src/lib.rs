//! # cellcall-server
//!
//! A reference compute server for the cellcall add-in. Functions are looked
//! up by name in a [`FunctionRegistry`] and each connection is served on its
//! own task.
//!
//! ```no_run
//! use cellcall_protocol::{CellError, Value};
//! use cellcall_server::{FunctionRegistry, FunctionServer, ServerConfig};
//!
//! # async fn run() -> cellcall_server::Result<()> {
//! let mut registry = FunctionRegistry::with_builtins();
//! registry.register("SQUARE", |args: &[Value]| {
//!     let n = args.first().and_then(Value::as_number).ok_or(CellError::Value)?;
//!     Ok(Value::Number(n * n))
//! });
//!
//! let server = FunctionServer::bind(&ServerConfig::default(), registry).await?;
//! server.run().await
//! # }
//! ```

pub mod builtins;
pub mod error;
pub mod registry;
pub mod server;

pub use error::{Result, ServerError};
pub use registry::{Function, FunctionRegistry};
pub use server::{FunctionServer, ServerConfig};
