//! Host operands in, host operands out, through a live server.

mod common;

use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use cellcall_addin::host::{XLERR_DIV0, XLERR_NAME, XLERR_VALUE};
use cellcall_addin::{Addin, ArrayPolicy, HostRange, HostValue, HOST_ARITY};
use common::{config_for, unused_port, RunningServer};
use pretty_assertions::assert_eq;

#[test]
fn test_add() {
    let server = RunningServer::start();
    let mut addin = Addin::new(server.config());

    let result = addin.execute("ADD", &[HostValue::Num(2.0), HostValue::Int(3)]);
    assert_eq!(result, HostValue::Num(5.0));
    assert!(addin.is_connected());
}

#[test]
fn test_operands_are_padded() {
    let server = RunningServer::start();
    let mut addin = Addin::new(server.config());

    let result = addin.execute(
        "ARGC",
        &[HostValue::Str("a".into()), HostValue::Missing, HostValue::Bool(true)],
    );
    assert_eq!(result, HostValue::Num(2.0));

    let full = vec![HostValue::Num(1.0); HOST_ARITY];
    assert_eq!(addin.execute("SUM", &full), HostValue::Num(10.0));
}

#[test]
fn test_server_errors_reach_the_cell() {
    let server = RunningServer::start();
    let mut addin = Addin::new(server.config());

    let result = addin.execute("DIV", &[HostValue::Num(1.0), HostValue::Num(0.0)]);
    assert_eq!(result, HostValue::Err(XLERR_DIV0));

    let result = addin.execute("NOT.A.FUNCTION", &[]);
    assert_eq!(result, HostValue::Err(XLERR_NAME));

    // An unresolved reference travels as #VALUE! and comes back as such.
    let result = addin.execute("ECHO", &[HostValue::Ref("Sheet2!B4".into())]);
    assert_eq!(result, HostValue::Err(XLERR_VALUE));

    assert!(addin.is_connected());
}

#[test]
fn test_array_round_trip() {
    let server = RunningServer::start();
    let mut addin = Addin::new(server.config());

    let range = HostRange::from_rows(vec![
        vec![HostValue::Num(1.0), HostValue::Str("a".into())],
        vec![HostValue::Bool(true), HostValue::Nil],
        vec![HostValue::Err(XLERR_DIV0), HostValue::Num(-2.5)],
    ]);
    let result = addin.execute("ECHO", &[HostValue::Multi(range.clone())]);
    assert_eq!(result, HostValue::Multi(range));
}

#[test]
fn test_single_cell_array_policy() {
    let server = RunningServer::start();
    let single = HostValue::Multi(HostRange::new(1, 1, vec![HostValue::Num(4.0)]));

    let mut flatten = Addin::new(server.config());
    assert_eq!(flatten.execute("ECHO", &[single.clone()]), HostValue::Num(4.0));

    let mut config = server.config();
    config.array_policy = ArrayPolicy::KeepShape;
    let mut keep = Addin::new(config);
    assert_eq!(keep.execute("ECHO", &[single.clone()]), single);
}

#[test]
fn test_unreachable_server() {
    let mut addin = Addin::new(config_for(unused_port()));

    let result = addin.execute("ADD", &[HostValue::Num(2.0), HostValue::Num(3.0)]);
    assert!(result.is_connect_failed(), "{result:?}");
    assert_eq!(result, HostValue::Str(" #Could not connect to server  ".into()));
    assert!(!addin.is_connected());
}

#[test]
fn test_recovers_when_server_returns() {
    let port = unused_port();
    let mut addin = Addin::new(config_for(port));
    assert!(addin.execute("ADD", &[]).is_connect_failed());

    // A server that dies mid-call, then a healthy one on the same port.
    let listener = TcpListener::bind(("127.0.0.1", port)).unwrap();
    let flaky = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        drop(stream);
    });
    assert!(addin.execute("ADD", &[]).is_connect_failed());
    assert!(!addin.is_connected());
    flaky.join().unwrap();

    let listener = TcpListener::bind(("127.0.0.1", port)).unwrap();
    let healthy = thread::spawn(move || {
        use cellcall_protocol::{Frame, Reply};
        use std::io::{Read, Write};

        let (mut stream, _) = listener.accept().unwrap();
        // Wait for the request, then answer without parsing it.
        let mut buf = [0u8; 1024];
        stream.read(&mut buf).unwrap();
        thread::sleep(Duration::from_millis(10));
        stream.write_all(&Reply::ok(42.0).to_bytes()).unwrap();
    });
    assert_eq!(addin.execute("ANSWER", &[]), HostValue::Num(42.0));
    healthy.join().unwrap();
}

#[test]
fn test_shutdown_then_execute_reconnects() {
    let server = RunningServer::start();
    let mut addin = Addin::new(server.config());

    assert_eq!(addin.execute("MUL", &[HostValue::Num(3.0), HostValue::Num(4.0)]), HostValue::Num(12.0));
    addin.shutdown();
    assert!(!addin.is_connected());
    addin.shutdown();

    assert_eq!(addin.execute("SUB", &[HostValue::Num(3.0), HostValue::Num(4.0)]), HostValue::Num(-1.0));
}
