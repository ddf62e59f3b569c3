//! Tox Bridge Runtime
//!
//! The engine of the bridge:
//! - `BridgeTask`: one account's pump/poll/command loop
//! - `FriendManager` and `ConnectionSupervisor`: friend lifecycle and liveness
//! - `AccountDirectory`: status relay between accounts of one process
//!
//! `toxbridge-core` provides the types and collaborator traits these build on.

pub mod broadcast;
pub mod builder;
pub mod logic;
pub mod managers;

pub use broadcast::{AccountDirectory, AccountPresence};
pub use builder::{BridgeBuilder, BridgeExit, BridgeHandle};
pub use logic::{AccountStatus, BridgeState, BridgeStats, BridgeTask};
pub use managers::*;

// Re-export core types for convenience
pub use toxbridge_core::{
    BridgeConfig, BridgeError, BridgeResult, CanonicalStatus, Command, CommandSender, HostEvent,
    HostEventReceiver, LoadOutcome, Network, PreferenceStore, PublicKey,
};
