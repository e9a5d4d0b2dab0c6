//! TCP front end of the compute server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use cellcall_protocol::{CallRequest, ConnectionError, Transport, DEFAULT_PORT};
use tokio::net::{TcpListener, TcpStream};

use crate::error::{Result, ServerError};
use crate::registry::FunctionRegistry;

/// Pause after a failed accept. Errors such as running out of file
/// descriptors persist until connections close, so retrying at once spins.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Where the server listens.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Accepts connections and answers requests from a [`FunctionRegistry`].
pub struct FunctionServer {
    listener: TcpListener,
    registry: Arc<FunctionRegistry>,
}

impl FunctionServer {
    pub async fn bind(config: &ServerConfig, registry: FunctionRegistry) -> Result<Self> {
        let addr = config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;

        tracing::info!(
            "Listening on {} with {} functions",
            listener.local_addr().map_or(addr, |a| a.to_string()),
            registry.len()
        );

        Ok(Self {
            listener,
            registry: Arc::new(registry),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until the process exits.
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Serve until `shutdown` completes. Connections already accepted keep
    /// running on their own tasks.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            accept_backoff(&e).await;
                            continue;
                        }
                    };
                    let registry = Arc::clone(&self.registry);
                    tokio::spawn(async move {
                        tracing::debug!("Connection from {peer}");
                        match serve_connection(stream, &registry).await {
                            Ok(()) => tracing::debug!("{peer} disconnected"),
                            Err(e) => tracing::warn!("Dropping connection from {peer}: {e}"),
                        }
                    });
                }
            }
        }
    }
}

async fn accept_backoff(err: &std::io::Error) {
    tracing::warn!("Accept failed, retrying in {ACCEPT_BACKOFF:?}: {err}");
    tokio::time::sleep(ACCEPT_BACKOFF).await;
}

/// Answer requests on one connection until the peer hangs up.
///
/// A request that fails to decode ends the connection, as the stream can no
/// longer be resynchronised.
async fn serve_connection(
    stream: TcpStream,
    registry: &FunctionRegistry,
) -> std::result::Result<(), ConnectionError> {
    stream.set_nodelay(true)?;
    let mut transport = Transport::new(stream);

    loop {
        let request: CallRequest = match transport.recv().await {
            Ok(request) => request,
            Err(ConnectionError::ConnectionClosed) => return Ok(()),
            Err(e) => return Err(e),
        };

        tracing::trace!("{}() with {} args", request.name, request.args.len());
        let reply = registry.invoke(&request);
        transport.send(&reply).await?;
    }
}
