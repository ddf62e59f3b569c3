//! Error types for the Tox bridge
//!
//! This module contains every error type used across the bridge: identifier
//! decoding, friend negotiation, slot resolution, state restore, the network
//! boundary and preference storage, plus the `BridgeError` type that unifies
//! them all.

use crate::types::{FriendSlot, PublicKey, PUBLIC_KEY_HEX_LEN};

// ----------------------------------------------------------------------------
// Specific Error Types
// ----------------------------------------------------------------------------

/// A string that is not the hex form of a public key
///
/// Buddy lists may mix entries of several protocols, so callers treat this as
/// "not ours" rather than as a failure of the bridge.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedIdentifier {
    #[error("Identifier must be {expected} hex digits, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("Identifier contains non-hex characters")]
    InvalidHex,
}

impl MalformedIdentifier {
    pub(crate) fn wrong_length(actual: usize) -> Self {
        MalformedIdentifier::WrongLength {
            expected: PUBLIC_KEY_HEX_LEN,
            actual,
        }
    }
}

/// Outcome classes of an add-friend attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AddFriendError {
    #[error("Message too long")]
    MessageTooLong,
    #[error("Missing request message")]
    MissingMessage,
    #[error("You're trying to add yourself as a friend")]
    SelfAdd,
    #[error("Friend request already sent")]
    AlreadyRequested,
    #[error("Error adding friend (code {code})")]
    Other { code: i32 },
}

impl AddFriendError {
    /// Classify a raw network add-friend result code
    pub fn from_code(code: i32) -> Self {
        match code {
            -1 => AddFriendError::MessageTooLong,
            -2 => AddFriendError::MissingMessage,
            -3 => AddFriendError::SelfAdd,
            -4 => AddFriendError::AlreadyRequested,
            code => AddFriendError::Other { code },
        }
    }

    /// Text shown to the user in the error dialog
    pub fn user_message(&self) -> &'static str {
        match self {
            AddFriendError::MessageTooLong => "Message too long",
            AddFriendError::MissingMessage => "Missing request message",
            AddFriendError::SelfAdd => "You're trying to add yourself as a friend",
            AddFriendError::AlreadyRequested => "Friend request already sent",
            AddFriendError::Other { .. } => "Error adding friend",
        }
    }
}

/// A buddy that has no live slot in the network friend table
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Buddy {key} has no network friend slot")]
pub struct UnresolvedFriend {
    pub key: PublicKey,
}

/// Errors raised while restoring persisted network state
#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    #[error("Persisted state is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("Persisted state rejected by the network layer: {reason}")]
    Corrupt { reason: String },
    #[error("Preference storage failed: {0}")]
    Storage(#[from] StorageError),
}

/// Errors reported by the network layer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    #[error("Bootstrap failed: {reason}")]
    Bootstrap { reason: String },
    #[error("No friend in slot {slot}")]
    NoSuchFriend { slot: FriendSlot },
    #[error("Sending to slot {slot} failed: {reason}")]
    SendFailed { slot: FriendSlot, reason: String },
    #[error("Network state invalid: {reason}")]
    InvalidState { reason: String },
}

/// Preference storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Preference store not available")]
    NotAvailable,
    #[error("Preference file I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Preference file is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ----------------------------------------------------------------------------
// Bridge Error
// ----------------------------------------------------------------------------

/// Core error type for the bridge
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Malformed identifier: {0}")]
    Identifier(#[from] MalformedIdentifier),

    #[error("Add friend failed: {0}")]
    AddFriend(#[from] AddFriendError),

    #[error(transparent)]
    Unresolved(#[from] UnresolvedFriend),

    #[error("Restore failed: {0}")]
    Restore(#[from] RestoreError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Buddy not present in the local buddy table
    #[error("Unknown buddy: {key}")]
    UnknownBuddy { key: String },

    /// Channel communication error
    #[error("Channel error: {message}")]
    Channel { message: String },

    /// Configuration error
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },
}

// ----------------------------------------------------------------------------
// Convenience Error Constructors
// ----------------------------------------------------------------------------

impl BridgeError {
    /// Create a channel error with a message
    pub fn channel_error<T: Into<String>>(message: T) -> Self {
        BridgeError::Channel {
            message: message.into(),
        }
    }

    /// Create a configuration error with a reason
    pub fn config_error<T: Into<String>>(reason: T) -> Self {
        BridgeError::Configuration {
            reason: reason.into(),
        }
    }

    /// Create an unknown buddy error
    pub fn unknown_buddy<T: Into<String>>(key: T) -> Self {
        BridgeError::UnknownBuddy { key: key.into() }
    }

    /// Whether the bridge task has to stop after this error
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BridgeError::Channel { .. } | BridgeError::Configuration { .. } | BridgeError::Restore(_)
        )
    }
}

impl NetworkError {
    pub fn bootstrap<T: Into<String>>(reason: T) -> Self {
        NetworkError::Bootstrap {
            reason: reason.into(),
        }
    }

    pub fn invalid_state<T: Into<String>>(reason: T) -> Self {
        NetworkError::InvalidState {
            reason: reason.into(),
        }
    }
}

// ----------------------------------------------------------------------------
// Type Aliases
// ----------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, BridgeError>;
pub type BridgeResult<T> = Result<T>;
