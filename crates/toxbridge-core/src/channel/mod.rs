//! Channel Module
//!
//! - `communication`: commands, network events and host events
//! - `utils`: channel aliases, constructors and the host event emitter

pub mod communication;
pub mod utils;

pub use communication::{Command, ConnectionProgress, HostEvent, NetworkEvent};

pub use crate::config::ChannelConfig;

pub use utils::{
    create_command_channel, create_host_event_channel, create_network_event_channel,
    ChannelError, ChannelStats, CommandReceiver, CommandSender, HostEventEmitter,
    HostEventReceiver, HostEventSender, NetworkEventReceiver, NetworkEventSender,
};
