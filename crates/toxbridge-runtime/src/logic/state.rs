//! Bridge State Management
//!
//! Everything the bridge task owns apart from the network handle and its
//! channels.

use std::collections::HashMap;

use serde::Serialize;

use toxbridge_core::{BridgeConfig, BuddyList, CanonicalStatus, PendingRequest, PublicKey};

use crate::managers::{ConnectionSupervisor, FriendManager};

// ----------------------------------------------------------------------------
// Bridge State
// ----------------------------------------------------------------------------

pub struct BridgeState {
    /// Account name as known to the host client
    pub account: String,
    /// Own identifier, known once logged in
    pub self_key: Option<PublicKey>,
    pub buddies: BuddyList,
    /// Inbound requests awaiting a decision
    pub pending: HashMap<PublicKey, PendingRequest>,
    pub supervisor: ConnectionSupervisor,
    pub friends: FriendManager,
    /// Account status chosen by the user
    pub status: AccountStatus,
    pub logged_in: bool,
    /// Own identifier already announced in the log
    pub announced: bool,
    pub stats: BridgeStats,
}

impl BridgeState {
    pub fn new(account: impl Into<String>, config: &BridgeConfig, buddies: BuddyList) -> Self {
        Self {
            account: account.into(),
            self_key: None,
            buddies,
            pending: HashMap::new(),
            supervisor: ConnectionSupervisor::new(),
            friends: FriendManager::new(config.friends.clone()),
            status: AccountStatus::default(),
            logged_in: false,
            announced: false,
            stats: BridgeStats::default(),
        }
    }
}

/// Status of the local account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountStatus {
    pub status: CanonicalStatus,
    pub message: Option<String>,
}

impl Default for AccountStatus {
    fn default() -> Self {
        Self {
            status: CanonicalStatus::Online,
            message: None,
        }
    }
}

/// Counters of the bridge task
#[derive(Debug, Clone, Default, Serialize)]
pub struct BridgeStats {
    pub commands_processed: u64,
    pub network_events_processed: u64,
    pub network_events_dropped: u64,
    pub host_events_emitted: u64,
    pub status_pushes: u64,
    pub messages_received: u64,
    pub messages_sent: u64,
    pub pumps: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_logged_out() {
        let state = BridgeState::new("alice", &BridgeConfig::default(), BuddyList::new());
        assert!(!state.logged_in);
        assert!(state.self_key.is_none());
        assert_eq!(state.status.status, CanonicalStatus::Online);
        assert!(!state.supervisor.is_connected());
    }
}
