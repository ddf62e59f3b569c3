//! Protocol registration data
//!
//! What the host client learns about this protocol when the bridge is
//! registered: identity, account options and the capabilities the bridge
//! deliberately does not offer.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::{BootstrapConfig, DEFAULT_BOOTSTRAP_ADDRESS, DEFAULT_BOOTSTRAP_KEY, DEFAULT_BOOTSTRAP_PORT};
use crate::errors::{BridgeError, Result};
use crate::types::PublicKey;

pub const PROTOCOL_ID: &str = "prpl-jin_eld-tox";
pub const PROTOCOL_NAME: &str = "Tox";
pub const PROTOCOL_SUMMARY: &str = "Tox Protocol Plugin";

pub const OPTION_SERVER: &str = "dht_server";
pub const OPTION_PORT: &str = "dht_server_port";
pub const OPTION_SERVER_KEY: &str = "dht_server_key";

/// Default value of an account option
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum OptionValue {
    Text(String),
    Int(i64),
}

/// One entry of the account settings dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountOption {
    pub id: &'static str,
    pub label: &'static str,
    pub default: OptionValue,
}

/// Bootstrap settings exposed per account
pub fn account_options() -> Vec<AccountOption> {
    vec![
        AccountOption {
            id: OPTION_SERVER,
            label: "Server",
            default: OptionValue::Text(DEFAULT_BOOTSTRAP_ADDRESS.to_string()),
        },
        AccountOption {
            id: OPTION_PORT,
            label: "Port",
            default: OptionValue::Int(i64::from(DEFAULT_BOOTSTRAP_PORT)),
        },
        AccountOption {
            id: OPTION_SERVER_KEY,
            label: "Server key",
            default: OptionValue::Text(DEFAULT_BOOTSTRAP_KEY.to_string()),
        },
    ]
}

/// Bootstrap configuration from account option values
///
/// Options that are absent keep their defaults.
pub fn bootstrap_from_options(options: &BTreeMap<String, String>) -> Result<BootstrapConfig> {
    let mut config = BootstrapConfig::default();

    if let Some(address) = options.get(OPTION_SERVER) {
        config.address = address.clone();
    }
    if let Some(port) = options.get(OPTION_PORT) {
        config.port = port
            .trim()
            .parse()
            .map_err(|_| BridgeError::config_error(format!("invalid port '{}'", port)))?;
    }
    if let Some(key) = options.get(OPTION_SERVER_KEY) {
        key.parse::<PublicKey>()?;
        config.key = key.clone();
    }
    Ok(config)
}

/// File transfer is not implemented by the bridge
pub fn can_receive_file(_who: &str) -> bool {
    false
}

/// The network has no store-and-forward for offline friends
pub fn offline_message() -> bool {
    false
}

/// Icon name of the protocol in buddy lists
pub fn list_icon() -> &'static str {
    "null"
}
