//! Add-in configuration.
//!
//! Configuration is a flat JSON object whose keys follow the dotted naming
//! the host-side loader uses, e.g.
//!
//! ```json
//! { "hostname": "calc01", "port": 5454, "include.volatile": true }
//! ```
//!
//! Every key is optional.

use std::time::Duration;

use cellcall_protocol::{ClientOptions, DEFAULT_PORT};
use serde::Deserialize;

use crate::convert::ArrayPolicy;
use crate::error::{ConfigError, Result};

/// Symbol the host calls for the non-volatile dispatch function.
pub const EXECUTE_SYMBOL: &str = "cellcall_execute";
/// Symbol the host calls for the volatile dispatch function.
pub const EXECUTE_VOLATILE_SYMBOL: &str = "cellcall_execute_volatile";

/// Host type text: returns an operand, takes a name then ten operands.
const TYPE_TEXT: &str = "RCPPPPPPPPPP";
/// Same signature, marked volatile so the host recalculates it every time.
const TYPE_TEXT_VOLATILE: &str = "RCPPPPPPPPPP!";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AddinConfig {
    /// Compute server host
    #[serde(rename = "hostname")]
    pub hostname: String,
    /// Compute server port
    #[serde(rename = "port")]
    pub port: u16,
    /// Name the add-in reports to the host
    #[serde(rename = "addin.name")]
    pub addin_name: String,
    /// Worksheet name of the dispatch function
    #[serde(rename = "function.name")]
    pub function_name: String,
    /// Whether to register the volatile variant as well
    #[serde(rename = "include.volatile")]
    pub include_volatile: bool,
    /// Worksheet name of the volatile dispatch function
    #[serde(rename = "function.name.volatile")]
    pub volatile_function_name: String,
    #[serde(rename = "array.policy")]
    pub array_policy: ArrayPolicy,
    #[serde(rename = "connect.timeout.ms")]
    pub connect_timeout_ms: Option<u64>,
    #[serde(rename = "call.timeout.ms")]
    pub call_timeout_ms: Option<u64>,
}

impl Default for AddinConfig {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            port: DEFAULT_PORT,
            addin_name: "cellcall".to_string(),
            function_name: "FS".to_string(),
            include_volatile: false,
            volatile_function_name: "FSV".to_string(),
            array_policy: ArrayPolicy::default(),
            connect_timeout_ms: None,
            call_timeout_ms: None,
        }
    }
}

/// One function the host should register on load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRegistration {
    pub symbol: &'static str,
    pub display_name: String,
    pub type_text: &'static str,
    pub volatile: bool,
}

impl AddinConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: AddinConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.hostname.trim().is_empty() {
            return Err(ConfigError::Invalid("hostname must not be empty".into()));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be non-zero".into()));
        }
        if self.function_name.trim().is_empty() {
            return Err(ConfigError::Invalid("function.name must not be empty".into()));
        }
        if self.include_volatile
            && self
                .volatile_function_name
                .eq_ignore_ascii_case(&self.function_name)
        {
            return Err(ConfigError::Invalid(format!(
                "function.name.volatile must differ from function.name ({})",
                self.function_name
            )));
        }
        Ok(())
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            connect_timeout: self.connect_timeout_ms.map(Duration::from_millis),
            call_timeout: self.call_timeout_ms.map(Duration::from_millis),
        }
    }

    /// Functions to register with the host, in registration order.
    pub fn registrations(&self) -> Vec<FunctionRegistration> {
        let mut regs = vec![FunctionRegistration {
            symbol: EXECUTE_SYMBOL,
            display_name: self.function_name.clone(),
            type_text: TYPE_TEXT,
            volatile: false,
        }];
        if self.include_volatile {
            regs.push(FunctionRegistration {
                symbol: EXECUTE_VOLATILE_SYMBOL,
                display_name: self.volatile_function_name.clone(),
                type_text: TYPE_TEXT_VOLATILE,
                volatile: true,
            });
        }
        regs
    }
}
