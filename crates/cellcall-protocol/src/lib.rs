//! Remote execution of spreadsheet functions over a socket.
//!
//! A spreadsheet add-in forwards custom-function calls to an out-of-process
//! compute server. This crate holds everything both sides share, plus the
//! client half of the conversation.
//!
//! # Architecture
//!
//! - **Value** (`value.rs`): numbers, text, booleans, errors, empties and
//!   one-level arrays of those
//! - **Codec** (`codec.rs`): tagged little-endian binary encoding of values
//! - **Messages** (`message.rs`): call requests and status-tagged replies
//! - **Transport** (`transport.rs`): frame send/receive over TCP
//!
//! On top of these, `connection.rs` provides the async [`Connection`] and
//! `client.rs` the blocking [`RemoteClient`] that a recalculation callback
//! can call directly.
//!
//! # Example
//!
//! ```rust,no_run
//! use cellcall_protocol::{ArgumentList, ClientOptions, RemoteClient, Value};
//!
//! # fn example() -> cellcall_protocol::Result<()> {
//! let mut client = RemoteClient::new(ClientOptions::default())?;
//! client.connect("localhost", 5454)?;
//! let args = ArgumentList::new(vec![Value::Number(2.0), Value::Number(3.0)])
//!     .expect("two arguments fit");
//! let sum = client.execute_function("ADD", args)?;
//! assert_eq!(sum, Value::Number(5.0));
//! client.disconnect();
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod codec;
pub mod connection;
pub mod error;
pub mod message;
pub mod transport;
pub mod value;

pub use client::{ClientOptions, RemoteClient};
pub use connection::Connection;
pub use error::{CodecError, ConnectionError, Result, ValueError};
pub use message::{CallRequest, Frame, Reply, Status};
pub use transport::Transport;
pub use value::{ArgumentList, Array, CellError, Value};

/// Port the compute server listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 5454;
