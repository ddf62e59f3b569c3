//! Centralized Configuration Management
//!
//! Every tunable of the bridge lives here so that the runtime, the harness and
//! the CLI read the same structure. All sections deserialize with defaults,
//! which lets a partial TOML file override only what it names.

use core::time::Duration;
use serde::{Deserialize, Serialize};

use crate::errors::{BridgeError, Result};
use crate::types::PublicKey;

/// Invitation text used when the user gives none
pub const DEFAULT_REQUEST_MESSAGE: &str = "Please allow me to add you as a friend!";

/// Preference entry holding the base64 network state
pub const DEFAULT_PREFERENCE_KEY: &str = "/plugins/prpl/tox/messenger";

pub const DEFAULT_BOOTSTRAP_ADDRESS: &str = "192.184.81.118";
pub const DEFAULT_BOOTSTRAP_PORT: u16 = 33445;
pub const DEFAULT_BOOTSTRAP_KEY: &str =
    "5CD7EB176C19A2FD840406CD56177BB8E75587BB366F7BB3004B19E3EDC04143";

/// Largest friend request payload the network accepts
pub const MAX_REQUEST_LEN: usize = 1016;

/// Largest nickname the network stores
pub const MAX_NAME_LEN: usize = 128;

// ----------------------------------------------------------------------------
// Bootstrap Configuration
// ----------------------------------------------------------------------------

/// Well-known node used to join the network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub address: String,
    pub port: u16,
    /// Hex public key of the node
    pub key: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_BOOTSTRAP_ADDRESS.to_string(),
            port: DEFAULT_BOOTSTRAP_PORT,
            key: DEFAULT_BOOTSTRAP_KEY.to_string(),
        }
    }
}

impl BootstrapConfig {
    pub fn public_key(&self) -> Result<PublicKey> {
        Ok(self.key.parse::<PublicKey>()?)
    }
}

// ----------------------------------------------------------------------------
// Timer Configuration
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Interval of the network pump
    pub pump_interval_ms: u64,
    /// Interval of the connection check
    pub poll_interval_ms: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            pump_interval_ms: 100,
            poll_interval_ms: 2000,
        }
    }
}

impl TimerConfig {
    pub fn pump_interval(&self) -> Duration {
        Duration::from_millis(self.pump_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// ----------------------------------------------------------------------------
// Friend Configuration
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FriendConfig {
    /// Message sent when accepting a request or adding without text
    pub request_message: String,
    /// Upper bound on request payloads, in bytes
    pub max_request_len: usize,
    /// Upper bound on aliases read from the network, in bytes
    pub max_name_len: usize,
}

impl Default for FriendConfig {
    fn default() -> Self {
        Self {
            request_message: DEFAULT_REQUEST_MESSAGE.to_string(),
            max_request_len: MAX_REQUEST_LEN,
            max_name_len: MAX_NAME_LEN,
        }
    }
}

// ----------------------------------------------------------------------------
// Channel Configuration
// ----------------------------------------------------------------------------

/// Buffer sizes of the bounded host-facing channels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Host → bridge commands
    pub command_buffer_size: usize,
    /// Bridge → host events
    pub host_event_buffer_size: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            command_buffer_size: 32,
            host_event_buffer_size: 128,
        }
    }
}

impl ChannelConfig {
    /// Small buffers so tests notice a stalled consumer quickly
    pub fn testing() -> Self {
        Self {
            command_buffer_size: 8,
            host_event_buffer_size: 256,
        }
    }
}

// ----------------------------------------------------------------------------
// Persistence Configuration
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub preference_key: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            preference_key: DEFAULT_PREFERENCE_KEY.to_string(),
        }
    }
}

// ----------------------------------------------------------------------------
// Bridge Configuration
// ----------------------------------------------------------------------------

/// Top-level configuration of one bridge instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub bootstrap: BootstrapConfig,
    pub timers: TimerConfig,
    pub friends: FriendConfig,
    pub channels: ChannelConfig,
    pub persistence: PersistenceConfig,
    /// Re-issue bootstrap whenever the connection drops
    pub rebootstrap_on_disconnect: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bootstrap: BootstrapConfig::default(),
            timers: TimerConfig::default(),
            friends: FriendConfig::default(),
            channels: ChannelConfig::default(),
            persistence: PersistenceConfig::default(),
            rebootstrap_on_disconnect: true,
        }
    }
}

impl BridgeConfig {
    /// Fast timers for tests and demos
    pub fn testing() -> Self {
        Self {
            timers: TimerConfig {
                pump_interval_ms: 5,
                poll_interval_ms: 20,
            },
            channels: ChannelConfig::testing(),
            ..Self::default()
        }
    }

    /// Check the configuration before a bridge is built from it
    pub fn validate(&self) -> Result<()> {
        self.bootstrap
            .public_key()
            .map_err(|e| BridgeError::config_error(format!("bootstrap key: {}", e)))?;

        if self.bootstrap.address.trim().is_empty() {
            return Err(BridgeError::config_error("bootstrap address is empty"));
        }
        if self.timers.pump_interval_ms == 0 || self.timers.poll_interval_ms == 0 {
            return Err(BridgeError::config_error("timer intervals must be non-zero"));
        }
        if self.timers.poll_interval_ms < self.timers.pump_interval_ms {
            return Err(BridgeError::config_error(
                "poll interval must not be shorter than the pump interval",
            ));
        }
        if self.friends.request_message.is_empty() {
            return Err(BridgeError::config_error("default request message is empty"));
        }
        if self.friends.request_message.len() > self.friends.max_request_len {
            return Err(BridgeError::config_error(
                "default request message exceeds max_request_len",
            ));
        }
        if self.friends.max_name_len == 0 {
            return Err(BridgeError::config_error("max_name_len must be non-zero"));
        }
        if self.channels.command_buffer_size == 0 || self.channels.host_event_buffer_size == 0 {
            return Err(BridgeError::config_error("channel buffers must be non-zero"));
        }
        if self.persistence.preference_key.is_empty() {
            return Err(BridgeError::config_error("preference key is empty"));
        }
        Ok(())
    }
}
