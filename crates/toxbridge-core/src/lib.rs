//! Tox Bridge Core
//!
//! Types, codecs and collaborator interfaces for bridging a peer-to-peer
//! messaging network onto the account/buddy/status model of a multi-protocol
//! chat client. The runtime crate drives these pieces from a single task.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod buddy;
pub mod capabilities;
pub mod channel;
pub mod config;
pub mod errors;
pub mod network;
pub mod persistence;
pub mod presence;
pub mod storage;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use buddy::{bounded_text, BuddyEntry, BuddyList, PendingRequest};
pub use channel::{
    create_command_channel, create_host_event_channel, create_network_event_channel,
    ChannelError, Command, CommandReceiver, CommandSender, ConnectionProgress, HostEvent,
    HostEventEmitter, HostEventReceiver, HostEventSender, NetworkEvent, NetworkEventReceiver,
    NetworkEventSender,
};
pub use config::{
    BootstrapConfig, BridgeConfig, ChannelConfig, FriendConfig, PersistenceConfig, TimerConfig,
    DEFAULT_REQUEST_MESSAGE,
};
pub use errors::{
    AddFriendError, BridgeError, BridgeResult, MalformedIdentifier, NetworkError, RestoreError,
    Result, StorageError, UnresolvedFriend,
};
pub use network::{BootstrapNode, Network};
pub use persistence::LoadOutcome;
pub use presence::{canonical_status, status_types, CanonicalStatus, Mood, StatusPrimitive, StatusType};
pub use storage::{FilePreferences, MemoryPreferences, PreferenceStore};
pub use types::{FriendSlot, PublicKey, PUBLIC_KEY_HEX_LEN, PUBLIC_KEY_SIZE};
