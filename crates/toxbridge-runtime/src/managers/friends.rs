//! Friend lifecycle management
//!
//! Adding, accepting, removing and messaging friends. Numeric add-friend
//! codes of the network are classified here and never travel further.

use tracing::{debug, info, warn};

use toxbridge_core::{
    bounded_text, canonical_status, AddFriendError, BridgeError, BridgeResult, BuddyEntry,
    CanonicalStatus, FriendConfig, FriendSlot, Mood, Network, PendingRequest, PublicKey,
    UnresolvedFriend,
};

#[derive(Debug, Clone)]
pub struct FriendManager {
    config: FriendConfig,
}

impl FriendManager {
    pub fn new(config: FriendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FriendConfig {
        &self.config
    }

    /// Send a friend request to `key`
    pub fn add_friend<N: Network + ?Sized>(
        &self,
        network: &mut N,
        key: &PublicKey,
        message: &str,
    ) -> Result<FriendSlot, AddFriendError> {
        if message.is_empty() {
            return Err(AddFriendError::MissingMessage);
        }
        if message.len() > self.config.max_request_len {
            return Err(AddFriendError::MessageTooLong);
        }
        if *key == network.self_key() {
            return Err(AddFriendError::SelfAdd);
        }
        if network.friend_slot(key).is_some() {
            return Err(AddFriendError::AlreadyRequested);
        }

        match network.add_friend(key, message.as_bytes()) {
            Ok(slot) => {
                info!(key = %key, slot = %slot, "Friend added");
                Ok(slot)
            }
            Err(code) => {
                let error = AddFriendError::from_code(code);
                warn!(key = %key, code, error = %error, "Network refused friend request");
                Err(error)
            }
        }
    }

    /// Send a friend request to a textual identifier
    pub fn add_friend_from_text<N: Network + ?Sized>(
        &self,
        network: &mut N,
        text: &str,
        message: &str,
    ) -> BridgeResult<(PublicKey, FriendSlot)> {
        let key: PublicKey = text.parse()?;
        let slot = self.add_friend(network, &key, message)?;
        Ok((key, slot))
    }

    /// Authorize a pending request, returning the new buddy
    pub fn accept_request<N: Network + ?Sized>(
        &self,
        network: &mut N,
        pending: &PendingRequest,
    ) -> Result<BuddyEntry, AddFriendError> {
        let slot = self.add_friend(network, &pending.key, &self.config.request_message)?;
        let alias = self.read_alias(network, slot);
        Ok(BuddyEntry::with_slot(pending.key, slot, alias))
    }

    /// Drop a friend from the network roster
    ///
    /// A friend the network no longer knows counts as removed.
    pub fn remove_friend<N: Network + ?Sized>(&self, network: &mut N, entry: &mut BuddyEntry) {
        let Some(slot) = self.resolve_slot(network, entry) else {
            debug!(key = %entry.key(), "Removing buddy without a network friend");
            return;
        };
        match network.remove_friend(slot) {
            Ok(()) => info!(key = %entry.key(), slot = %slot, "Friend removed"),
            Err(e) => debug!(key = %entry.key(), error = %e, "Friend already gone"),
        }
        entry.slot = None;
    }

    /// Send a message to a buddy; the body is forwarded unchanged
    pub fn send_message<N: Network + ?Sized>(
        &self,
        network: &mut N,
        entry: &mut BuddyEntry,
        body: &str,
    ) -> BridgeResult<FriendSlot> {
        let slot = self.require_slot(network, entry)?;
        network
            .send_message(slot, body.as_bytes())
            .map_err(BridgeError::from)?;
        debug!(key = %entry.key(), slot = %slot, bytes = body.len(), "Message sent");
        Ok(slot)
    }

    /// Look up the buddy's slot, caching it on the entry
    ///
    /// A cached slot is trusted only while the network still maps it to the
    /// same key.
    pub fn resolve_slot<N: Network + ?Sized>(
        &self,
        network: &N,
        entry: &mut BuddyEntry,
    ) -> Option<FriendSlot> {
        if let Some(slot) = entry.slot {
            if network.friend_key(slot).as_ref() == Some(entry.key()) {
                return Some(slot);
            }
        }
        entry.slot = network.friend_slot(entry.key());
        entry.slot
    }

    pub fn require_slot<N: Network + ?Sized>(
        &self,
        network: &N,
        entry: &mut BuddyEntry,
    ) -> Result<FriendSlot, UnresolvedFriend> {
        self.resolve_slot(network, entry)
            .ok_or(UnresolvedFriend { key: *entry.key() })
    }

    /// Current nickname of a friend, if it has one
    pub fn read_alias<N: Network + ?Sized>(&self, network: &N, slot: FriendSlot) -> Option<String> {
        let name = network.friend_name(slot)?;
        bounded_text(&name, self.config.max_name_len)
    }

    /// Canonical status of a friend from both presence dimensions
    pub fn query_status<N: Network + ?Sized>(&self, network: &N, slot: FriendSlot) -> CanonicalStatus {
        let online = network.friend_is_online(slot).unwrap_or(false);
        let mood = network.friend_mood(slot).unwrap_or(Mood::None);
        canonical_status(online, mood)
    }
}
