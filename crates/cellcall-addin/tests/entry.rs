//! The process-wide entry points.
//!
//! These share one global add-in, so everything runs in a single test.

mod common;

use cellcall_addin::{entry, AddinConfig, HostValue};
use common::{config_for, unused_port, RunningServer};
use pretty_assertions::assert_eq;

#[test]
fn test_entry_lifecycle() {
    assert_eq!(entry::addin_name(), "cellcall");
    assert_eq!(entry::registrations().len(), 1);

    entry::configure(config_for(unused_port()));
    assert!(entry::execute("ADD", &[HostValue::Num(1.0)]).is_connect_failed());

    let server = RunningServer::start();
    let config = AddinConfig {
        addin_name: "Pricing".into(),
        include_volatile: true,
        ..server.config()
    };
    entry::configure(config);
    assert_eq!(entry::addin_name(), "Pricing");
    assert_eq!(entry::registrations().len(), 2);

    assert_eq!(
        entry::execute("ADD", &[HostValue::Num(2.0), HostValue::Num(3.0)]),
        HostValue::Num(5.0)
    );
    assert_eq!(
        entry::execute_volatile("CONCAT", &[HostValue::Str("x".into()), HostValue::Int(1)]),
        HostValue::Str("x1".into())
    );

    entry::shutdown();
    entry::shutdown();

    // The next call reconnects on demand.
    assert_eq!(
        entry::execute("SUB", &[HostValue::Num(5.0), HostValue::Num(3.0)]),
        HostValue::Num(2.0)
    );
    entry::shutdown();
}
