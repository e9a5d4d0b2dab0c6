use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;

use cellcall_addin::AddinConfig;
use cellcall_server::{FunctionRegistry, FunctionServer, ServerConfig};
use tokio::sync::oneshot;

/// A builtin server running on its own thread until dropped.
pub struct RunningServer {
    pub port: u16,
    stop: Option<oneshot::Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl RunningServer {
    pub fn start() -> Self {
        let (port_tx, port_rx) = mpsc::channel();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let thread = thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async move {
                let config = ServerConfig {
                    host: "127.0.0.1".into(),
                    port: 0,
                };
                let server = FunctionServer::bind(&config, FunctionRegistry::with_builtins())
                    .await
                    .unwrap();
                port_tx.send(server.local_addr().unwrap().port()).unwrap();
                server
                    .run_until(async {
                        let _ = stop_rx.await;
                    })
                    .await
                    .unwrap();
            });
        });

        Self {
            port: port_rx.recv().unwrap(),
            stop: Some(stop_tx),
            thread: Some(thread),
        }
    }

    pub fn config(&self) -> AddinConfig {
        config_for(self.port)
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

pub fn config_for(port: u16) -> AddinConfig {
    AddinConfig {
        hostname: "127.0.0.1".into(),
        port,
        ..AddinConfig::default()
    }
}

/// A port with nothing listening on it.
pub fn unused_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}
