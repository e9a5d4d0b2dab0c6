//! # cellcall-addin
//!
//! The spreadsheet side of cellcall. A single generic worksheet function
//! (by default `FS`) takes a function name and up to ten operands, forwards
//! them to the compute server and places the result back in the cell.
//!
//! The host-specific glue (operand marshalling, function registration) calls
//! into the [`entry`] module:
//!
//! ```no_run
//! use cellcall_addin::{entry, AddinConfig, HostValue};
//!
//! entry::configure(AddinConfig::from_json(r#"{"hostname": "calc01"}"#).unwrap());
//! let result = entry::execute("ADD", &[HostValue::Num(2.0), HostValue::Num(3.0)]);
//! assert_eq!(result, HostValue::Num(5.0));
//! entry::shutdown();
//! ```

pub mod addin;
pub mod config;
pub mod convert;
pub mod entry;
pub mod error;
pub mod host;

pub use addin::{Addin, HOST_ARITY};
pub use config::{AddinConfig, FunctionRegistration};
pub use convert::{ArrayPolicy, Converter};
pub use error::{ConfigError, Result};
pub use host::{HostRange, HostValue, CONNECT_FAILED};
