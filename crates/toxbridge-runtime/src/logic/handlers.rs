//! Bridge Event and Command Handlers
//!
//! Network callbacks are routed by [`EventHandlers`], which only get shared
//! access to the network and therefore cannot issue network commands. Host
//! actions are handled by [`CommandHandlers`]. Both return the host events
//! to emit and leave the sending to the task.

use tracing::{debug, info, warn};

use toxbridge_core::{
    bounded_text, canonical_status, BridgeError, BridgeResult, BuddyEntry, FriendSlot, HostEvent,
    Mood, Network, NetworkEvent, PendingRequest, PublicKey,
};

use super::state::BridgeState;

/// Title of the dialog shown when adding a friend fails
pub const ADD_FRIEND_ERROR_TITLE: &str = "Error adding friend";

// ----------------------------------------------------------------------------
// Event Dispatcher
// ----------------------------------------------------------------------------

pub struct EventHandlers;

impl EventHandlers {
    /// Route one network callback
    pub fn dispatch<N: Network + ?Sized>(
        state: &mut BridgeState,
        network: &N,
        event: NetworkEvent,
    ) -> Vec<HostEvent> {
        state.stats.network_events_processed += 1;

        if let NetworkEvent::FriendRequest { key, message } = event {
            return Self::handle_friend_request(state, key, &message);
        }

        let Some(slot) = event.slot() else {
            return Vec::new();
        };
        let Some(key) = network.friend_key(slot) else {
            state.stats.network_events_dropped += 1;
            warn!(slot = %slot, kind = event.kind(), "Dropping event for unknown friend slot");
            return Vec::new();
        };

        match event {
            NetworkEvent::Message { body, .. } => Self::handle_message(state, key, slot, &body),
            NetworkEvent::NameChanged { name, .. } => Self::handle_name_changed(state, key, slot, &name),
            NetworkEvent::MoodChanged { mood, .. } => {
                let online = network.friend_is_online(slot).unwrap_or(false);
                Self::push_status(state, key, slot, online, mood)
            }
            NetworkEvent::ConnectionChanged { online, .. } => {
                let mood = network.friend_mood(slot).unwrap_or(Mood::None);
                Self::push_status(state, key, slot, online, mood)
            }
            NetworkEvent::FriendRequest { .. } => Vec::new(),
        }
    }

    fn handle_friend_request(state: &mut BridgeState, key: PublicKey, message: &[u8]) -> Vec<HostEvent> {
        if state.buddies.contains(&key) {
            debug!(key = %key, "Ignoring friend request from existing buddy");
            return Vec::new();
        }

        let pending = PendingRequest::from_raw(key, message, state.friends.config().max_request_len);
        info!(key = %key, "Friend request received");
        let event = HostEvent::FriendRequest {
            key,
            message: pending.message.clone(),
        };
        state.pending.insert(key, pending);
        vec![event]
    }

    fn handle_message(state: &mut BridgeState, key: PublicKey, slot: FriendSlot, body: &[u8]) -> Vec<HostEvent> {
        let known_buddy = match state.buddies.get_mut(&key) {
            Some(entry) => {
                entry.slot = Some(slot);
                true
            }
            None => false,
        };
        if !known_buddy {
            debug!(key = %key, "Message from a friend outside the buddy list");
        }

        state.stats.messages_received += 1;
        vec![HostEvent::MessageReceived {
            key,
            body: bounded_text(body, usize::MAX).unwrap_or_default(),
            known_buddy,
        }]
    }

    fn handle_name_changed(state: &mut BridgeState, key: PublicKey, slot: FriendSlot, name: &[u8]) -> Vec<HostEvent> {
        let max_name_len = state.friends.config().max_name_len;
        let Some(entry) = state.buddies.get_mut(&key) else {
            debug!(key = %key, "Ignoring nickname of unknown buddy");
            return Vec::new();
        };
        entry.slot = Some(slot);

        let Some(alias) = bounded_text(name, max_name_len) else {
            return Vec::new();
        };
        entry.alias = Some(alias.clone());
        vec![HostEvent::AliasChanged { key, alias }]
    }

    fn push_status(
        state: &mut BridgeState,
        key: PublicKey,
        slot: FriendSlot,
        online: bool,
        mood: Mood,
    ) -> Vec<HostEvent> {
        let Some(entry) = state.buddies.get_mut(&key) else {
            debug!(key = %key, "Ignoring presence of unknown buddy");
            return Vec::new();
        };
        entry.slot = Some(slot);

        let status = canonical_status(online, mood);
        state.stats.status_pushes += 1;
        debug!(key = %key, status = %status, "Buddy status changed");
        vec![HostEvent::StatusChanged { key, status }]
    }
}

// ----------------------------------------------------------------------------
// Command Handlers
// ----------------------------------------------------------------------------

pub struct CommandHandlers;

impl CommandHandlers {
    /// Buddy added in the host UI
    pub fn handle_add_buddy<N: Network + ?Sized>(
        state: &mut BridgeState,
        network: &mut N,
        name: String,
        alias: Option<String>,
        message: Option<String>,
    ) -> BridgeResult<Vec<HostEvent>> {
        let key = match name.parse::<PublicKey>() {
            Ok(key) => key,
            Err(e) => {
                warn!(name = %name, error = %e, "Refusing buddy with malformed identifier");
                return Ok(vec![
                    HostEvent::error(ADD_FRIEND_ERROR_TITLE, e.to_string()),
                    HostEvent::BuddyRejected { name },
                ]);
            }
        };

        if state.buddies.contains(&key) {
            debug!(key = %key, "Buddy already present");
            return Ok(Vec::new());
        }

        let message = message.unwrap_or_else(|| state.friends.config().request_message.clone());
        match state.friends.add_friend(network, &key, &message) {
            Ok(slot) => {
                let status = state.friends.query_status(network, slot);
                state.buddies.insert(BuddyEntry::with_slot(key, slot, alias.clone()));
                state.pending.remove(&key);
                Ok(vec![
                    HostEvent::BuddyAdded { key, alias },
                    HostEvent::StatusChanged { key, status },
                ])
            }
            Err(e) => Ok(vec![
                HostEvent::error(ADD_FRIEND_ERROR_TITLE, e.user_message()),
                HostEvent::BuddyRejected { name },
            ]),
        }
    }

    /// Buddy removed in the host UI
    ///
    /// Names from other protocols and buddies already gone are ignored.
    pub fn handle_remove_buddy<N: Network + ?Sized>(
        state: &mut BridgeState,
        network: &mut N,
        name: &str,
    ) -> BridgeResult<Vec<HostEvent>> {
        let key: PublicKey = match name.parse() {
            Ok(key) => key,
            Err(e) => {
                debug!(name, error = %e, "Not our buddy, nothing to remove");
                return Ok(Vec::new());
            }
        };
        let Some(mut entry) = state.buddies.remove(&key) else {
            debug!(key = %key, "Buddy already removed");
            return Ok(Vec::new());
        };
        state.friends.remove_friend(network, &mut entry);
        Ok(Vec::new())
    }

    /// User authorized a pending request
    ///
    /// The request stays pending when the network refuses it so the user can
    /// try again.
    pub fn handle_accept_request<N: Network + ?Sized>(
        state: &mut BridgeState,
        network: &mut N,
        key: PublicKey,
    ) -> BridgeResult<Vec<HostEvent>> {
        let pending = state
            .pending
            .get(&key)
            .ok_or_else(|| BridgeError::unknown_buddy(key.to_hex()))?;

        match state.friends.accept_request(network, pending) {
            Ok(mut entry) => {
                state.pending.remove(&key);
                let status = match state.friends.resolve_slot(network, &mut entry) {
                    Some(slot) => state.friends.query_status(network, slot),
                    None => canonical_status(false, Mood::None),
                };
                let alias = entry.alias.clone();
                state.buddies.insert(entry);
                info!(key = %key, "Friend request accepted");
                Ok(vec![
                    HostEvent::BuddyAdded { key, alias },
                    HostEvent::StatusChanged { key, status },
                ])
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Unable to accept friend request");
                Ok(vec![HostEvent::error(ADD_FRIEND_ERROR_TITLE, e.user_message())])
            }
        }
    }

    /// User denied a pending request
    pub fn handle_decline_request(state: &mut BridgeState, key: PublicKey) -> BridgeResult<Vec<HostEvent>> {
        if state.pending.remove(&key).is_none() {
            return Err(BridgeError::unknown_buddy(key.to_hex()));
        }
        debug!(key = %key, "Friend request declined");
        Ok(Vec::new())
    }

    /// Outgoing instant message
    pub fn handle_send_message<N: Network + ?Sized>(
        state: &mut BridgeState,
        network: &mut N,
        name: &str,
        body: &str,
    ) -> BridgeResult<Vec<HostEvent>> {
        let key: PublicKey = name.parse()?;
        let entry = state
            .buddies
            .get_mut(&key)
            .ok_or_else(|| BridgeError::unknown_buddy(name))?;
        state.friends.send_message(network, entry, body)?;
        state.stats.messages_sent += 1;
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toxbridge_core::{BridgeConfig, BuddyList, CanonicalStatus};
    use toxbridge_harness::{key_from_name, SimulatedNetwork};

    fn state_with(buddies: &[PublicKey]) -> BridgeState {
        let names: Vec<(String, Option<String>)> = buddies.iter().map(|k| (k.to_hex(), None)).collect();
        BridgeState::new("me", &BridgeConfig::default(), BuddyList::from_persisted(names))
    }

    #[test]
    fn test_request_from_existing_buddy_is_ignored() {
        let bob = key_from_name("bob");
        let mut state = state_with(&[bob]);
        let network = SimulatedNetwork::new("me");

        let events = EventHandlers::dispatch(
            &mut state,
            &network,
            NetworkEvent::FriendRequest {
                key: bob,
                message: b"hi".to_vec(),
            },
        );
        assert!(events.is_empty());
        assert!(state.pending.is_empty());
    }

    #[test]
    fn test_request_with_empty_message() {
        let mut state = state_with(&[]);
        let network = SimulatedNetwork::new("me");
        let carol = key_from_name("carol");

        let events = EventHandlers::dispatch(
            &mut state,
            &network,
            NetworkEvent::FriendRequest {
                key: carol,
                message: Vec::new(),
            },
        );
        assert_eq!(events, vec![HostEvent::FriendRequest { key: carol, message: None }]);
        assert!(state.pending.contains_key(&carol));
    }

    #[test]
    fn test_unknown_slot_is_dropped() {
        let mut state = state_with(&[]);
        let network = SimulatedNetwork::new("me");

        let events = EventHandlers::dispatch(
            &mut state,
            &network,
            NetworkEvent::Message {
                slot: FriendSlot::new(42),
                body: b"hi".to_vec(),
            },
        );
        assert!(events.is_empty());
        assert_eq!(state.stats.network_events_dropped, 1);
    }

    #[test]
    fn test_anonymous_message_is_delivered() {
        let mut state = state_with(&[]);
        let network = SimulatedNetwork::new("me");
        let stranger = key_from_name("stranger");
        let slot = network.controller().add_existing_friend(stranger, "");

        let events = EventHandlers::dispatch(
            &mut state,
            &network,
            NetworkEvent::Message {
                slot,
                body: b"who am i\0".to_vec(),
            },
        );
        assert_eq!(
            events,
            vec![HostEvent::MessageReceived {
                key: stranger,
                body: "who am i".to_string(),
                known_buddy: false,
            }]
        );
    }

    #[test]
    fn test_mood_combines_with_liveness() {
        let dave = key_from_name("dave");
        let mut state = state_with(&[dave]);
        let network = SimulatedNetwork::new("me");
        let ctl = network.controller();
        let slot = ctl.add_existing_friend(dave, "Dave");

        // offline friend: mood does not matter
        let events = EventHandlers::dispatch(
            &mut state,
            &network,
            NetworkEvent::MoodChanged { slot, mood: Mood::Away },
        );
        assert_eq!(
            events,
            vec![HostEvent::StatusChanged {
                key: dave,
                status: CanonicalStatus::Offline
            }]
        );

        ctl.set_mood(&dave, Mood::Busy);
        let events = EventHandlers::dispatch(
            &mut state,
            &network,
            NetworkEvent::ConnectionChanged { slot, online: true },
        );
        assert_eq!(
            events,
            vec![HostEvent::StatusChanged {
                key: dave,
                status: CanonicalStatus::Busy
            }]
        );
        assert_eq!(state.buddies.get(&dave).unwrap().slot, Some(slot));
    }

    #[test]
    fn test_nickname_of_unknown_buddy_is_ignored() {
        let mut state = state_with(&[]);
        let network = SimulatedNetwork::new("me");
        let erin = key_from_name("erin");
        let slot = network.controller().add_existing_friend(erin, "");

        let events = EventHandlers::dispatch(
            &mut state,
            &network,
            NetworkEvent::NameChanged {
                slot,
                name: b"Erin".to_vec(),
            },
        );
        assert!(events.is_empty());
    }

    #[test]
    fn test_add_buddy_failure_rejects_buddy() {
        let mut state = state_with(&[]);
        let mut network = SimulatedNetwork::new("me");
        let me = network.self_key();

        let events =
            CommandHandlers::handle_add_buddy(&mut state, &mut network, me.to_hex(), None, None).unwrap();
        assert_eq!(
            events,
            vec![
                HostEvent::error(ADD_FRIEND_ERROR_TITLE, "You're trying to add yourself as a friend"),
                HostEvent::BuddyRejected { name: me.to_hex() },
            ]
        );
        assert!(state.buddies.is_empty());
    }

    #[test]
    fn test_add_existing_buddy_is_noop() {
        let bob = key_from_name("bob");
        let mut state = state_with(&[bob]);
        let mut network = SimulatedNetwork::new("me");

        let events =
            CommandHandlers::handle_add_buddy(&mut state, &mut network, bob.to_hex(), None, None).unwrap();
        assert!(events.is_empty());
        assert!(network.controller().outgoing_requests().is_empty());
    }

    #[test]
    fn test_accept_unknown_request_fails() {
        let mut state = state_with(&[]);
        let mut network = SimulatedNetwork::new("me");
        let result = CommandHandlers::handle_accept_request(&mut state, &mut network, key_from_name("x"));
        assert!(matches!(result, Err(BridgeError::UnknownBuddy { .. })));
    }

    #[test]
    fn test_send_to_unknown_buddy_fails() {
        let mut state = state_with(&[]);
        let mut network = SimulatedNetwork::new("me");
        let name = key_from_name("nobody").to_hex();

        let result = CommandHandlers::handle_send_message(&mut state, &mut network, &name, "hi");
        assert!(matches!(result, Err(BridgeError::UnknownBuddy { .. })));
        assert!(network.controller().sent_messages().is_empty());
    }
}
