//! Async connection to a compute server.
//!
//! `Connection` owns the transport and performs strictly sequential
//! request/reply round trips; there is never more than one call in flight.

use std::time::Duration;

use tokio::net::TcpStream;

use crate::error::{ConnectionError, Result};
use crate::message::{CallRequest, Reply};
use crate::transport::Transport;

/// An established connection to a compute server.
pub struct Connection {
    transport: Transport,
    addr: String,
    call_timeout: Option<Duration>,
}

impl Connection {
    /// Connect to a compute server listening on the given address.
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        Self::connect_with_timeout(host, port, None).await
    }

    /// Connect, giving up after `timeout` if one is set.
    pub async fn connect_with_timeout(
        host: &str,
        port: u16,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let addr = format!("{host}:{port}");
        let connecting = TcpStream::connect(&addr);
        let stream = match timeout {
            Some(limit) => tokio::time::timeout(limit, connecting)
                .await
                .map_err(|_| ConnectionError::Timeout(limit))?,
            None => connecting.await,
        }
        .map_err(|source| ConnectionError::Connect {
            addr: addr.clone(),
            source,
        })?;

        // Requests are small and latency bound.
        stream.set_nodelay(true)?;

        tracing::info!("Connected to compute server at {addr}");

        Ok(Self {
            transport: Transport::new(stream),
            addr,
            call_timeout: None,
        })
    }

    /// Bound every subsequent round trip by `timeout`.
    pub fn set_call_timeout(&mut self, timeout: Option<Duration>) {
        self.call_timeout = timeout;
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Send a request and wait for its reply.
    pub async fn call(&mut self, request: &CallRequest) -> Result<Reply> {
        tracing::debug!(
            "Calling {}() with {} args on {}",
            request.name,
            request.args.len(),
            self.addr
        );

        match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, self.round_trip(request))
                .await
                .map_err(|_| ConnectionError::Timeout(limit))?,
            None => self.round_trip(request).await,
        }
    }

    async fn round_trip(&mut self, request: &CallRequest) -> Result<Reply> {
        self.transport.send(request).await?;
        let reply: Reply = self.transport.recv().await?;
        tracing::trace!("{}() returned {:?}", request.name, reply);
        Ok(reply)
    }

    /// Close the connection, signalling end of stream to the server.
    pub async fn shutdown(mut self) -> Result<()> {
        tracing::info!("Disconnecting from compute server at {}", self.addr);
        self.transport.shutdown().await
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("addr", &self.addr)
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}
