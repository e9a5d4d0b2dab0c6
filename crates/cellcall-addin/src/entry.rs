//! Process-wide add-in instance used by the host's entry points.
//!
//! The host loads the add-in once per process and calls the dispatch
//! functions from its recalculation thread.

use lazy_static::lazy_static;
use std::sync::{Mutex, PoisonError};

use crate::addin::Addin;
use crate::config::{AddinConfig, FunctionRegistration};
use crate::host::HostValue;

lazy_static! {
    static ref ADDIN: Mutex<Addin> = Mutex::new(Addin::new(AddinConfig::default()));
}

/// Run `f` against the global add-in.
///
/// A panic while the lock was held leaves the add-in in a usable state
/// (at worst disconnected), so a poisoned lock is recovered.
fn with_addin<R>(f: impl FnOnce(&mut Addin) -> R) -> R {
    let mut guard = ADDIN.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard)
}

/// Replace the configuration. Any open connection is closed first.
pub fn configure(config: AddinConfig) {
    with_addin(|addin| {
        addin.shutdown();
        tracing::info!(
            "Configured for {}:{} as {}",
            config.hostname,
            config.port,
            config.addin_name
        );
        *addin = Addin::new(config);
    });
}

/// Entry point behind the non-volatile worksheet function.
pub fn execute(name: &str, args: &[HostValue]) -> HostValue {
    with_addin(|addin| addin.execute(name, args))
}

/// Entry point behind the volatile worksheet function.
///
/// Volatility only changes when the host recalculates; dispatch is the same.
pub fn execute_volatile(name: &str, args: &[HostValue]) -> HostValue {
    with_addin(|addin| addin.execute(name, args))
}

/// Name reported to the host's add-in manager.
pub fn addin_name() -> String {
    with_addin(|addin| addin.config().addin_name.clone())
}

pub fn registrations() -> Vec<FunctionRegistration> {
    with_addin(|addin| addin.config().registrations())
}

/// Called when the host unloads the add-in.
pub fn shutdown() {
    with_addin(Addin::shutdown);
}
