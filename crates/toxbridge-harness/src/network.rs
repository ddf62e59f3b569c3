//! Simulated network identity
//!
//! [`SimulatedNetwork`] implements the bridge's [`Network`] trait entirely in
//! memory. A [`SimController`] sharing the same state plays the remote side:
//! it raises friend requests, flips presence, delivers messages and inspects
//! what the bridge sent. Callbacks raised through the controller are queued
//! and only reach the bridge on its next pump, like the real network loop.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use toxbridge_core::config::MAX_REQUEST_LEN;
use toxbridge_core::{
    BootstrapNode, FriendSlot, Mood, Network, NetworkError, NetworkEvent, NetworkEventSender,
    PublicKey,
};

use crate::identity::key_from_name;

const STATE_VERSION: u8 = 1;

// ----------------------------------------------------------------------------
// Shared State
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SimFriend {
    key: PublicKey,
    name: Vec<u8>,
    #[serde(skip)]
    mood: Mood,
    #[serde(skip)]
    online: bool,
    #[serde(skip)]
    accepted: bool,
}

impl SimFriend {
    fn new(key: PublicKey) -> Self {
        Self {
            key,
            name: Vec::new(),
            mood: Mood::None,
            online: false,
            accepted: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SavedState {
    version: u8,
    self_key: PublicKey,
    friends: Vec<Option<SimFriend>>,
}

#[derive(Debug)]
struct SimState {
    self_key: PublicKey,
    friends: Vec<Option<SimFriend>>,
    queued: VecDeque<NetworkEvent>,
    connected: bool,
    connect_delay: u64,
    connect_at: Option<u64>,
    pumps: u64,
    bootstrap_count: u32,
    last_bootstrap: Option<BootstrapNode>,
    reject_bootstrap: bool,
    auto_accept: bool,
    forced_add_code: Option<i32>,
    sent: Vec<(PublicKey, Vec<u8>)>,
    outgoing_requests: Vec<(PublicKey, Vec<u8>)>,
    removed: Vec<PublicKey>,
    status_queries: u64,
}

impl SimState {
    fn new(self_key: PublicKey) -> Self {
        Self {
            self_key,
            friends: Vec::new(),
            queued: VecDeque::new(),
            connected: false,
            connect_delay: 1,
            connect_at: None,
            pumps: 0,
            bootstrap_count: 0,
            last_bootstrap: None,
            reject_bootstrap: false,
            auto_accept: false,
            forced_add_code: None,
            sent: Vec::new(),
            outgoing_requests: Vec::new(),
            removed: Vec::new(),
            status_queries: 0,
        }
    }

    fn slot_of(&self, key: &PublicKey) -> Option<FriendSlot> {
        self.friends
            .iter()
            .position(|f| f.as_ref().is_some_and(|f| f.key == *key))
            .map(|index| FriendSlot::new(index as u32))
    }

    fn friend(&self, slot: FriendSlot) -> Option<&SimFriend> {
        self.friends.get(slot.index() as usize)?.as_ref()
    }

    fn friend_mut(&mut self, slot: FriendSlot) -> Option<&mut SimFriend> {
        self.friends.get_mut(slot.index() as usize)?.as_mut()
    }

    fn insert_friend(&mut self, friend: SimFriend) -> FriendSlot {
        match self.friends.iter().position(Option::is_none) {
            Some(index) => {
                self.friends[index] = Some(friend);
                FriendSlot::new(index as u32)
            }
            None => {
                self.friends.push(Some(friend));
                FriendSlot::new((self.friends.len() - 1) as u32)
            }
        }
    }

    /// Mark a friend as having accepted us, raising the presence callback
    fn accept(&mut self, slot: FriendSlot) {
        let Some(friend) = self.friend_mut(slot) else {
            return;
        };
        friend.accepted = true;
        friend.online = true;
        let name = friend.name.clone();
        self.queued.push_back(NetworkEvent::ConnectionChanged { slot, online: true });
        if !name.is_empty() {
            self.queued.push_back(NetworkEvent::NameChanged { slot, name });
        }
    }
}

fn lock(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ----------------------------------------------------------------------------
// Simulated Network
// ----------------------------------------------------------------------------

/// In-memory network identity
#[derive(Debug)]
pub struct SimulatedNetwork {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedNetwork {
    /// Identity whose key is derived from `name`
    pub fn new(name: &str) -> Self {
        Self::with_key(key_from_name(name))
    }

    pub fn with_key(self_key: PublicKey) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState::new(self_key))),
        }
    }

    /// Handle for playing the remote side of this identity
    pub fn controller(&self) -> SimController {
        SimController {
            state: Arc::clone(&self.state),
        }
    }
}

impl Network for SimulatedNetwork {
    fn bootstrap(&mut self, node: &BootstrapNode) -> Result<(), NetworkError> {
        let mut state = lock(&self.state);
        if state.reject_bootstrap {
            return Err(NetworkError::bootstrap(format!("{} unreachable", node)));
        }
        state.bootstrap_count += 1;
        state.last_bootstrap = Some(node.clone());
        if !state.connected && state.connect_at.is_none() {
            state.connect_at = Some(state.pumps + state.connect_delay);
        }
        debug!(node = %node, "Simulated bootstrap");
        Ok(())
    }

    fn pump(&mut self, events: &NetworkEventSender) {
        let mut state = lock(&self.state);
        state.pumps += 1;

        if let Some(at) = state.connect_at {
            if !state.connected && state.pumps >= at {
                state.connected = true;
                state.connect_at = None;
            }
        }

        if state.connected && state.auto_accept {
            let waiting: Vec<FriendSlot> = state
                .friends
                .iter()
                .enumerate()
                .filter(|(_, f)| f.as_ref().is_some_and(|f| !f.accepted))
                .map(|(index, _)| FriendSlot::new(index as u32))
                .collect();
            for slot in waiting {
                state.accept(slot);
            }
        }

        while let Some(event) = state.queued.pop_front() {
            if events.send(event).is_err() {
                warn!("Network event queue closed, dropping callbacks");
                state.queued.clear();
                break;
            }
        }
    }

    fn is_connected(&self) -> bool {
        lock(&self.state).connected
    }

    fn self_key(&self) -> PublicKey {
        lock(&self.state).self_key
    }

    fn add_friend(&mut self, key: &PublicKey, message: &[u8]) -> Result<FriendSlot, i32> {
        let mut state = lock(&self.state);
        if let Some(code) = state.forced_add_code.take() {
            return Err(code);
        }
        if message.len() > MAX_REQUEST_LEN {
            return Err(-1);
        }
        if message.is_empty() {
            return Err(-2);
        }
        if *key == state.self_key {
            return Err(-3);
        }
        if state.slot_of(key).is_some() {
            return Err(-4);
        }

        state.outgoing_requests.push((*key, message.to_vec()));
        Ok(state.insert_friend(SimFriend::new(*key)))
    }

    fn remove_friend(&mut self, slot: FriendSlot) -> Result<(), NetworkError> {
        let mut state = lock(&self.state);
        let removed = state
            .friends
            .get_mut(slot.index() as usize)
            .and_then(Option::take)
            .ok_or(NetworkError::NoSuchFriend { slot })?;
        state.removed.push(removed.key);
        Ok(())
    }

    fn send_message(&mut self, slot: FriendSlot, body: &[u8]) -> Result<(), NetworkError> {
        let mut state = lock(&self.state);
        let key = state
            .friend(slot)
            .map(|f| f.key)
            .ok_or(NetworkError::NoSuchFriend { slot })?;
        state.sent.push((key, body.to_vec()));
        Ok(())
    }

    fn friend_mood(&self, slot: FriendSlot) -> Option<Mood> {
        let mut state = lock(&self.state);
        state.status_queries += 1;
        state.friend(slot).map(|f| f.mood)
    }

    fn friend_is_online(&self, slot: FriendSlot) -> Option<bool> {
        let mut state = lock(&self.state);
        state.status_queries += 1;
        state.friend(slot).map(|f| f.online)
    }

    fn friend_name(&self, slot: FriendSlot) -> Option<Vec<u8>> {
        lock(&self.state).friend(slot).map(|f| f.name.clone())
    }

    fn friend_slot(&self, key: &PublicKey) -> Option<FriendSlot> {
        lock(&self.state).slot_of(key)
    }

    fn friend_key(&self, slot: FriendSlot) -> Option<PublicKey> {
        lock(&self.state).friend(slot).map(|f| f.key)
    }

    fn save(&self) -> Vec<u8> {
        let state = lock(&self.state);
        let saved = SavedState {
            version: STATE_VERSION,
            self_key: state.self_key,
            friends: state.friends.clone(),
        };
        match bincode::serialize(&saved) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Failed to serialize simulated state");
                Vec::new()
            }
        }
    }

    fn load(&mut self, bytes: &[u8]) -> Result<(), NetworkError> {
        let saved: SavedState = bincode::deserialize(bytes)
            .map_err(|e| NetworkError::invalid_state(e.to_string()))?;
        if saved.version != STATE_VERSION {
            return Err(NetworkError::invalid_state(format!(
                "unsupported state version {}",
                saved.version
            )));
        }

        let mut state = lock(&self.state);
        state.self_key = saved.self_key;
        state.friends = saved.friends;
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Controller
// ----------------------------------------------------------------------------

/// Remote side and inspection handle of a [`SimulatedNetwork`]
#[derive(Debug, Clone)]
pub struct SimController {
    state: Arc<Mutex<SimState>>,
}

impl SimController {
    pub fn self_key(&self) -> PublicKey {
        lock(&self.state).self_key
    }

    /// Number of pumps after bootstrap before the identity connects
    pub fn set_connect_delay(&self, pumps: u64) {
        lock(&self.state).connect_delay = pumps;
    }

    /// Friends added by the bridge accept on the next connected pump
    pub fn set_auto_accept(&self, enabled: bool) {
        lock(&self.state).auto_accept = enabled;
    }

    pub fn set_reject_bootstrap(&self, reject: bool) {
        lock(&self.state).reject_bootstrap = reject;
    }

    /// Fail the next add-friend with a raw network code
    pub fn force_add_friend_code(&self, code: i32) {
        lock(&self.state).forced_add_code = Some(code);
    }

    /// Drop off the network; reconnects only after the next bootstrap
    pub fn drop_connection(&self) {
        let mut state = lock(&self.state);
        state.connected = false;
        state.connect_at = None;
    }

    /// Put a friend into the roster as if restored from saved state
    pub fn add_existing_friend(&self, key: PublicKey, name: &str) -> FriendSlot {
        let mut state = lock(&self.state);
        if let Some(slot) = state.slot_of(&key) {
            return slot;
        }
        let mut friend = SimFriend::new(key);
        friend.name = name.as_bytes().to_vec();
        friend.accepted = true;
        state.insert_friend(friend)
    }

    /// A stranger asks to be our friend
    pub fn receive_request(&self, from: PublicKey, message: &[u8]) {
        lock(&self.state).queued.push_back(NetworkEvent::FriendRequest {
            key: from,
            message: message.to_vec(),
        });
    }

    /// The remote side accepts a request the bridge sent
    pub fn accept(&self, key: &PublicKey) -> Option<FriendSlot> {
        let mut state = lock(&self.state);
        let slot = state.slot_of(key)?;
        state.accept(slot);
        Some(slot)
    }

    pub fn set_online(&self, key: &PublicKey, online: bool) -> Option<FriendSlot> {
        let mut state = lock(&self.state);
        let slot = state.slot_of(key)?;
        state.friend_mut(slot)?.online = online;
        state.queued.push_back(NetworkEvent::ConnectionChanged { slot, online });
        Some(slot)
    }

    pub fn set_mood(&self, key: &PublicKey, mood: Mood) -> Option<FriendSlot> {
        let mut state = lock(&self.state);
        let slot = state.slot_of(key)?;
        state.friend_mut(slot)?.mood = mood;
        state.queued.push_back(NetworkEvent::MoodChanged { slot, mood });
        Some(slot)
    }

    pub fn rename(&self, key: &PublicKey, name: &str) -> Option<FriendSlot> {
        let mut state = lock(&self.state);
        let slot = state.slot_of(key)?;
        state.friend_mut(slot)?.name = name.as_bytes().to_vec();
        state.queued.push_back(NetworkEvent::NameChanged {
            slot,
            name: name.as_bytes().to_vec(),
        });
        Some(slot)
    }

    /// A friend sends us a message
    pub fn deliver_message(&self, from: &PublicKey, body: &[u8]) -> Option<FriendSlot> {
        let mut state = lock(&self.state);
        let slot = state.slot_of(from)?;
        state.queued.push_back(NetworkEvent::Message {
            slot,
            body: body.to_vec(),
        });
        Some(slot)
    }

    /// Queue a raw callback, including ones naming slots that do not exist
    pub fn inject(&self, event: NetworkEvent) {
        lock(&self.state).queued.push_back(event);
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    pub fn is_connected(&self) -> bool {
        lock(&self.state).connected
    }

    pub fn is_friend(&self, key: &PublicKey) -> bool {
        lock(&self.state).slot_of(key).is_some()
    }

    pub fn friend_count(&self) -> usize {
        lock(&self.state).friends.iter().flatten().count()
    }

    pub fn friend_keys(&self) -> Vec<PublicKey> {
        lock(&self.state).friends.iter().flatten().map(|f| f.key).collect()
    }

    pub fn sent_messages(&self) -> Vec<(PublicKey, Vec<u8>)> {
        lock(&self.state).sent.clone()
    }

    pub fn outgoing_requests(&self) -> Vec<(PublicKey, Vec<u8>)> {
        lock(&self.state).outgoing_requests.clone()
    }

    pub fn removed(&self) -> Vec<PublicKey> {
        lock(&self.state).removed.clone()
    }

    /// Liveness and mood queries answered so far
    pub fn status_queries(&self) -> u64 {
        lock(&self.state).status_queries
    }

    pub fn bootstrap_count(&self) -> u32 {
        lock(&self.state).bootstrap_count
    }

    pub fn last_bootstrap(&self) -> Option<BootstrapNode> {
        lock(&self.state).last_bootstrap.clone()
    }

    pub fn pumps(&self) -> u64 {
        lock(&self.state).pumps
    }

    pub fn queued_events(&self) -> usize {
        lock(&self.state).queued.len()
    }
}
