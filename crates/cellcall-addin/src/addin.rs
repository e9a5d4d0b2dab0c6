//! Function dispatch from the host to the compute server.

use cellcall_protocol::{ArgumentList, RemoteClient, Value};

use crate::config::AddinConfig;
use crate::convert::Converter;
use crate::host::{HostValue, XLERR_VALUE};

/// Number of operand slots the host passes to the dispatch function.
pub const HOST_ARITY: usize = 10;

/// The add-in: configuration, a converter and a lazily created client.
pub struct Addin {
    config: AddinConfig,
    converter: Converter,
    client: Option<RemoteClient>,
}

impl Addin {
    pub fn new(config: AddinConfig) -> Self {
        let converter = Converter::new(config.array_policy);
        Self {
            config,
            converter,
            client: None,
        }
    }

    pub fn config(&self) -> &AddinConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.client.as_ref().is_some_and(RemoteClient::is_connected)
    }

    /// Evaluate `name` remotely with the host's operands.
    ///
    /// Always yields something the host can place in a cell. Connectivity
    /// failures of any kind yield [`HostValue::connect_failed`].
    pub fn execute(&mut self, name: &str, args: &[HostValue]) -> HostValue {
        if args.len() > HOST_ARITY {
            tracing::warn!(
                "{name}() called with {} operands, at most {HOST_ARITY} are supported",
                args.len()
            );
            return HostValue::Err(XLERR_VALUE);
        }

        if self.client.is_none() {
            match RemoteClient::new(self.config.client_options()) {
                Ok(client) => self.client = Some(client),
                Err(e) => {
                    tracing::error!("Failed to create client: {e}");
                    return HostValue::connect_failed();
                }
            }
        }
        let Some(client) = self.client.as_mut() else {
            return HostValue::connect_failed();
        };

        if let Err(e) = client.connect(&self.config.hostname, self.config.port) {
            tracing::warn!("{name}(): {e}");
            return HostValue::connect_failed();
        }

        // Omitted trailing operands still travel, as empties.
        let values: Vec<Value> = (0..HOST_ARITY)
            .map(|i| {
                args.get(i)
                    .map_or(Value::Empty, |arg| self.converter.to_value(arg))
            })
            .collect();
        let args = match ArgumentList::new(values) {
            Ok(args) => args,
            Err(e) => {
                tracing::warn!("{name}(): {e}");
                return HostValue::Err(XLERR_VALUE);
            }
        };

        match client.execute_function(name, args) {
            Ok(value) => self.converter.to_host(&value),
            Err(e) => {
                tracing::warn!("{name}(): {e}");
                HostValue::connect_failed()
            }
        }
    }

    /// Close the connection and release the client.
    pub fn shutdown(&mut self) {
        if let Some(mut client) = self.client.take() {
            client.disconnect();
            tracing::info!("Add-in connection closed");
        }
    }
}
