//! Error types for the compute server

use std::io;

use cellcall_protocol::ConnectionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

pub type Result<T> = std::result::Result<T, ServerError>;
