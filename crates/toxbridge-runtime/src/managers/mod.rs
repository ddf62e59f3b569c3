//! Managers owned by the bridge task

pub mod connection;
pub mod friends;

pub use connection::{
    ConnectionPhase, ConnectionStats, ConnectionSupervisor, PhaseTransition, TransitionRecord,
};
pub use friends::FriendManager;
