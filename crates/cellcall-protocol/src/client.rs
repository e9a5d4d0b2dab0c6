//! Synchronous client used from spreadsheet recalculation callbacks.
//!
//! The host calls into us on its recalculation thread and expects one value
//! back per call, so `RemoteClient` exposes a blocking API. Internally it
//! drives an async [`Connection`] on a private current-thread runtime.
//!
//! State machine:
//!
//! ```text
//! Disconnected --connect() ok--> Connected
//! Connected --disconnect() / any I/O or codec failure--> Disconnected
//! ```
//!
//! There are no automatic retries. After a failure the next `connect()` call
//! (typically made by the next formula evaluation) starts over.

use std::time::Duration;

use tokio::runtime::{Builder, Runtime};

use crate::connection::Connection;
use crate::error::{ConnectionError, Result};
use crate::message::{CallRequest, Status};
use crate::value::{ArgumentList, Value};

/// Tunables for [`RemoteClient`]. No timeouts by default: a call blocks for
/// as long as the server takes.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    pub connect_timeout: Option<Duration>,
    pub call_timeout: Option<Duration>,
}

/// Blocking request/response client over a single persistent connection.
pub struct RemoteClient {
    runtime: Runtime,
    options: ClientOptions,
    connection: Option<Connection>,
    last_status: Option<Status>,
}

impl RemoteClient {
    pub fn new(options: ClientOptions) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_io()
            .enable_time()
            .build()
            .map_err(ConnectionError::Runtime)?;

        Ok(Self {
            runtime,
            options,
            connection: None,
            last_status: None,
        })
    }

    /// Open a connection. Succeeds immediately when already connected.
    ///
    /// On failure the client stays disconnected.
    pub fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        if self.connection.is_some() {
            return Ok(());
        }

        let mut conn = self.runtime.block_on(Connection::connect_with_timeout(
            host,
            port,
            self.options.connect_timeout,
        ))?;
        conn.set_call_timeout(self.options.call_timeout);
        self.connection = Some(conn);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Status byte of the most recent successful round trip.
    pub fn last_status(&self) -> Option<Status> {
        self.last_status
    }

    /// Invoke `name` on the server and return its value.
    ///
    /// Values the server reports with an error status are returned as `Ok`.
    /// Only connectivity-class failures are `Err`, and every one of them
    /// leaves the client disconnected.
    pub fn execute_function(&mut self, name: &str, args: ArgumentList) -> Result<Value> {
        let Some(conn) = self.connection.as_mut() else {
            return Err(ConnectionError::NotConnected);
        };

        let request = CallRequest::new(name, args);
        match self.runtime.block_on(conn.call(&request)) {
            Ok(reply) => {
                if reply.is_error() {
                    tracing::debug!("{name}() reported an error: {}", reply.value);
                }
                self.last_status = Some(reply.status);
                Ok(reply.value)
            }
            Err(e) => {
                tracing::warn!("Dropping connection after failed call to {name}(): {e}");
                // The stream may hold half a frame; it cannot be reused.
                self.connection = None;
                self.last_status = None;
                Err(e)
            }
        }
    }

    /// Close the connection if open. Safe to call any number of times.
    pub fn disconnect(&mut self) {
        if let Some(conn) = self.connection.take() {
            if let Err(e) = self.runtime.block_on(conn.shutdown()) {
                tracing::debug!("Error while closing connection: {e}");
            }
        }
        self.last_status = None;
    }
}

impl Drop for RemoteClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}
