//! Bridge Communication Protocol Types
//!
//! Host → bridge actions travel as [`Command`]s, network callbacks as
//! [`NetworkEvent`]s and everything the host client has to show as
//! [`HostEvent`]s. No other path exists between the bridge task and the
//! outside world.

use core::fmt;
use serde::{Deserialize, Serialize};

use crate::presence::{CanonicalStatus, Mood};
use crate::types::{FriendSlot, PublicKey};

// ----------------------------------------------------------------------------
// Command: Host → Bridge
// ----------------------------------------------------------------------------

/// Actions requested by the host client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Buddy added in the host UI; `name` is the textual identifier
    AddBuddy {
        name: String,
        alias: Option<String>,
        message: Option<String>,
    },
    /// Buddy removed in the host UI
    RemoveBuddy { name: String },
    /// User authorized a pending friend request
    AcceptRequest { key: PublicKey },
    /// User denied a pending friend request
    DeclineRequest { key: PublicKey },
    /// Outgoing instant message
    SendMessage { name: String, body: String },
    /// Account status chosen by the user
    SetStatus {
        status_id: String,
        message: Option<String>,
    },
    /// Close the account
    Shutdown,
}

// ----------------------------------------------------------------------------
// NetworkEvent: Network → Bridge
// ----------------------------------------------------------------------------

/// Callbacks raised by the network layer during a pump
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkEvent {
    /// A stranger asks to become a friend
    FriendRequest { key: PublicKey, message: Vec<u8> },
    /// Instant message from a friend
    Message { slot: FriendSlot, body: Vec<u8> },
    /// A friend changed nickname
    NameChanged { slot: FriendSlot, name: Vec<u8> },
    /// A friend changed mood
    MoodChanged { slot: FriendSlot, mood: Mood },
    /// A friend came online or went offline
    ConnectionChanged { slot: FriendSlot, online: bool },
}

impl NetworkEvent {
    pub fn slot(&self) -> Option<FriendSlot> {
        match self {
            NetworkEvent::FriendRequest { .. } => None,
            NetworkEvent::Message { slot, .. }
            | NetworkEvent::NameChanged { slot, .. }
            | NetworkEvent::MoodChanged { slot, .. }
            | NetworkEvent::ConnectionChanged { slot, .. } => Some(*slot),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            NetworkEvent::FriendRequest { .. } => "friend_request",
            NetworkEvent::Message { .. } => "message",
            NetworkEvent::NameChanged { .. } => "name_changed",
            NetworkEvent::MoodChanged { .. } => "mood_changed",
            NetworkEvent::ConnectionChanged { .. } => "connection_changed",
        }
    }
}

// ----------------------------------------------------------------------------
// HostEvent: Bridge → Host
// ----------------------------------------------------------------------------

/// State changes the host client has to reflect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostEvent {
    /// Buddy status push
    StatusChanged {
        key: PublicKey,
        status: CanonicalStatus,
    },
    /// Incoming message, delivered even when the sender is not a buddy
    MessageReceived {
        key: PublicKey,
        body: String,
        known_buddy: bool,
    },
    /// Buddy alias set from a nickname change
    AliasChanged { key: PublicKey, alias: String },
    /// Authorization prompt for an inbound request
    FriendRequest {
        key: PublicKey,
        message: Option<String>,
    },
    /// Connection progress indicator
    ConnectionProgress(ConnectionProgress),
    /// Error dialog
    Error { title: String, message: String },
    /// A friend entered the buddy list
    BuddyAdded {
        key: PublicKey,
        alias: Option<String>,
    },
    /// The host must drop a buddy it added optimistically
    BuddyRejected { name: String },
    /// Account is online under this identifier
    AccountConnected { self_key: PublicKey },
    /// Status of another local account, relayed to this one
    SiblingStatus {
        account: String,
        status_id: String,
        message: Option<String>,
    },
}

impl HostEvent {
    pub fn error<T: Into<String>, M: Into<String>>(title: T, message: M) -> Self {
        HostEvent::Error {
            title: title.into(),
            message: message.into(),
        }
    }
}

// ----------------------------------------------------------------------------
// Supporting Types
// ----------------------------------------------------------------------------

/// Step of the host's connection progress bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProgress {
    pub step: u32,
    pub total: u32,
    pub text: String,
}

impl ConnectionProgress {
    pub fn connecting() -> Self {
        Self {
            step: 0,
            total: 2,
            text: "Connecting".to_string(),
        }
    }

    pub fn connected() -> Self {
        Self {
            step: 1,
            total: 2,
            text: "Connected".to_string(),
        }
    }
}

impl fmt::Display for ConnectionProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}] {}", self.step, self.total, self.text)
    }
}
