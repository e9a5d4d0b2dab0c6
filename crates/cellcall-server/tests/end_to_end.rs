//! The blocking client against a running server.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::mpsc;
use std::thread;

use cellcall_protocol::codec::TAG_NUMBER;
use cellcall_protocol::{
    ArgumentList, CellError, ClientOptions, RemoteClient, Status, Value,
};
use cellcall_server::{FunctionRegistry, FunctionServer, ServerConfig};
use pretty_assertions::assert_eq;
use tokio::sync::oneshot;

struct RunningServer {
    port: u16,
    stop: Option<oneshot::Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl RunningServer {
    fn start(registry: FunctionRegistry) -> Self {
        let (port_tx, port_rx) = mpsc::channel();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let thread = thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async move {
                let config = ServerConfig {
                    host: "127.0.0.1".into(),
                    port: 0,
                };
                let server = FunctionServer::bind(&config, registry).await.unwrap();
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

fn args(values: Vec<Value>) -> ArgumentList {
    ArgumentList::new(values).unwrap()
}

fn connected_client(port: u16) -> RemoteClient {
    let mut client = RemoteClient::new(ClientOptions::default()).unwrap();
    client.connect("127.0.0.1", port).unwrap();
    client
}

#[test]
fn test_add() {
    let server = RunningServer::start(FunctionRegistry::with_builtins());
    let mut client = connected_client(server.port);

    let value = client
        .execute_function("ADD", args(vec![Value::Number(2.0), Value::Number(3.0)]))
        .unwrap();
    assert_eq!(value, Value::Number(5.0));
    assert_eq!(client.last_status(), Some(Status::Ok));
}

#[test]
fn test_unknown_function_is_name_error() {
    let server = RunningServer::start(FunctionRegistry::with_builtins());
    let mut client = connected_client(server.port);

    let value = client.execute_function("NO.SUCH", args(vec![])).unwrap();
    assert_eq!(value, Value::Error(CellError::Name));
    assert_eq!(client.last_status(), Some(Status::Error));
    assert!(client.is_connected());
}

#[test]
fn test_transpose_array() {
    let server = RunningServer::start(FunctionRegistry::with_builtins());
    let mut client = connected_client(server.port);

    let grid = Value::array(vec![
        vec![Value::Number(1.0), Value::text("a")],
        vec![Value::Boolean(true), Value::Empty],
        vec![Value::Error(CellError::Na), Value::Number(6.0)],
    ])
    .unwrap();
    let value = client
        .execute_function("TRANSPOSE", args(vec![grid]))
        .unwrap();

    let expected = Value::array(vec![
        vec![Value::Number(1.0), Value::Boolean(true), Value::Error(CellError::Na)],
        vec![Value::text("a"), Value::Empty, Value::Number(6.0)],
    ])
    .unwrap();
    assert_eq!(value, expected);
}

#[test]
fn test_custom_function() {
    let mut registry = FunctionRegistry::new();
    registry.register("GREET", |args: &[Value]| {
        let who = args.first().and_then(Value::as_text).ok_or(CellError::Value)?;
        Ok(Value::text(format!("hello {who}")))
    });
    let server = RunningServer::start(registry);
    let mut client = connected_client(server.port);

    assert_eq!(
        client
            .execute_function("greet", args(vec![Value::text("sheet")]))
            .unwrap(),
        Value::text("hello sheet")
    );
    assert_eq!(
        client
            .execute_function("greet", args(vec![Value::Number(1.0)]))
            .unwrap(),
        Value::Error(CellError::Value)
    );
}

#[test]
fn test_malformed_request_closes_only_that_connection() {
    let server = RunningServer::start(FunctionRegistry::with_builtins());
    let mut client = connected_client(server.port);

    // Name "X", one argument with an unassigned tag.
    let mut raw = TcpStream::connect(("127.0.0.1", server.port)).unwrap();
    raw.write_all(&[1, 0, 0, 0, b'X', 1, 0, 0xEE]).unwrap();
    let mut buf = [0u8; 16];
    assert_eq!(raw.read(&mut buf).unwrap(), 0);

    let value = client
        .execute_function("SUM", args(vec![Value::Number(1.0), Value::Number(2.0)]))
        .unwrap();
    assert_eq!(value, Value::Number(3.0));
}

#[test]
fn test_request_split_across_writes() {
    let server = RunningServer::start(FunctionRegistry::with_builtins());

    let mut raw = TcpStream::connect(("127.0.0.1", server.port)).unwrap();
    raw.set_nodelay(true).unwrap();
    let mut frame = vec![4, 0, 0, 0];
    frame.extend_from_slice(b"ECHO");
    frame.extend_from_slice(&[1, 0, TAG_NUMBER]);
    frame.extend_from_slice(&7.5f64.to_le_bytes());

    let (head, tail) = frame.split_at(6);
    raw.write_all(head).unwrap();
    thread::sleep(std::time::Duration::from_millis(20));
    raw.write_all(tail).unwrap();

    let mut reply = [0u8; 10];
    raw.read_exact(&mut reply).unwrap();
    assert_eq!(reply[0], 0);
    assert_eq!(reply[1], TAG_NUMBER);
    assert_eq!(f64::from_le_bytes(reply[2..].try_into().unwrap()), 7.5);
}
