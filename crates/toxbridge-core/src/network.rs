//! Network Layer Abstraction
//!
//! The peer-to-peer network lives outside this crate. The bridge drives it
//! through [`Network`]: plain synchronous commands plus a `pump` that
//! delivers callbacks as [`NetworkEvent`]s on a queue. Exactly one network
//! identity belongs to each bridge and is handed to it explicitly.

use core::fmt;
use serde::{Deserialize, Serialize};

use crate::channel::NetworkEventSender;
use crate::config::BootstrapConfig;
use crate::errors::{NetworkError, Result};
use crate::presence::Mood;
use crate::types::{FriendSlot, PublicKey};

// ----------------------------------------------------------------------------
// Bootstrap Node
// ----------------------------------------------------------------------------

/// Resolved entry point into the network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapNode {
    pub address: String,
    pub port: u16,
    pub key: PublicKey,
}

impl BootstrapNode {
    pub fn from_config(config: &BootstrapConfig) -> Result<Self> {
        Ok(Self {
            address: config.address.clone(),
            port: config.port,
            key: config.public_key()?,
        })
    }
}

impl fmt::Display for BootstrapNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.address, self.port, self.key.short())
    }
}

// ----------------------------------------------------------------------------
// Network Trait
// ----------------------------------------------------------------------------

/// Commands and queries the bridge issues against the network identity
///
/// Queries taking a [`FriendSlot`] return `None` when the slot is empty.
pub trait Network: Send {
    /// Contact a bootstrap node
    fn bootstrap(&mut self, node: &BootstrapNode) -> core::result::Result<(), NetworkError>;

    /// Run one iteration of the network loop, queueing raised callbacks
    fn pump(&mut self, events: &NetworkEventSender);

    /// Whether the identity currently reaches the network
    fn is_connected(&self) -> bool;

    /// Own public key
    fn self_key(&self) -> PublicKey;

    /// Send a friend request; failures are the network's numeric codes
    fn add_friend(&mut self, key: &PublicKey, message: &[u8]) -> core::result::Result<FriendSlot, i32>;

    fn remove_friend(&mut self, slot: FriendSlot) -> core::result::Result<(), NetworkError>;

    fn send_message(&mut self, slot: FriendSlot, body: &[u8]) -> core::result::Result<(), NetworkError>;

    fn friend_mood(&self, slot: FriendSlot) -> Option<Mood>;

    fn friend_is_online(&self, slot: FriendSlot) -> Option<bool>;

    /// Nickname bytes as stored by the network
    fn friend_name(&self, slot: FriendSlot) -> Option<Vec<u8>>;

    fn friend_slot(&self, key: &PublicKey) -> Option<FriendSlot>;

    fn friend_key(&self, slot: FriendSlot) -> Option<PublicKey>;

    /// Serialize the identity, friends included
    fn save(&self) -> Vec<u8>;

    /// Restore a previously saved identity
    fn load(&mut self, bytes: &[u8]) -> core::result::Result<(), NetworkError>;
}

impl<N: Network + ?Sized> Network for Box<N> {
    fn bootstrap(&mut self, node: &BootstrapNode) -> core::result::Result<(), NetworkError> {
        (**self).bootstrap(node)
    }

    fn pump(&mut self, events: &NetworkEventSender) {
        (**self).pump(events)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn self_key(&self) -> PublicKey {
        (**self).self_key()
    }

    fn add_friend(&mut self, key: &PublicKey, message: &[u8]) -> core::result::Result<FriendSlot, i32> {
        (**self).add_friend(key, message)
    }

    fn remove_friend(&mut self, slot: FriendSlot) -> core::result::Result<(), NetworkError> {
        (**self).remove_friend(slot)
    }

    fn send_message(&mut self, slot: FriendSlot, body: &[u8]) -> core::result::Result<(), NetworkError> {
        (**self).send_message(slot, body)
    }

    fn friend_mood(&self, slot: FriendSlot) -> Option<Mood> {
        (**self).friend_mood(slot)
    }

    fn friend_is_online(&self, slot: FriendSlot) -> Option<bool> {
        (**self).friend_is_online(slot)
    }

    fn friend_name(&self, slot: FriendSlot) -> Option<Vec<u8>> {
        (**self).friend_name(slot)
    }

    fn friend_slot(&self, key: &PublicKey) -> Option<FriendSlot> {
        (**self).friend_slot(key)
    }

    fn friend_key(&self, slot: FriendSlot) -> Option<PublicKey> {
        (**self).friend_key(slot)
    }

    fn save(&self) -> Vec<u8> {
        (**self).save()
    }

    fn load(&mut self, bytes: &[u8]) -> core::result::Result<(), NetworkError> {
        (**self).load(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_node_from_defaults() {
        let node = BootstrapNode::from_config(&BootstrapConfig::default()).unwrap();
        assert_eq!(node.port, 33445);
        assert_eq!(node.to_string(), "192.184.81.118:33445 (5cd7eb17)");
    }

    #[test]
    fn test_bootstrap_node_rejects_bad_key() {
        let config = BootstrapConfig {
            key: "xyz".to_string(),
            ..BootstrapConfig::default()
        };
        assert!(BootstrapNode::from_config(&config).is_err());
    }
}
