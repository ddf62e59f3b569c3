//! Tox Bridge Harness
//!
//! In-process stand-in for the peer-to-peer network, used by the runtime's
//! tests and by the CLI's `simulate` command.

pub mod channels;
pub mod identity;
pub mod network;
pub mod scenario;

pub use channels::{drain_host_events, TestChannels};
pub use identity::key_from_name;
pub use network::{SimController, SimulatedNetwork};
pub use scenario::{PeerAction, Scenario, ScriptedPeer};
