//! Channel helpers for tests and demos

use toxbridge_core::{
    create_command_channel, create_host_event_channel, ChannelConfig, CommandReceiver,
    CommandSender, HostEvent, HostEventReceiver, HostEventSender,
};

/// Both host-facing channel pairs of one bridge
#[derive(Debug)]
pub struct TestChannels {
    pub command_tx: CommandSender,
    pub command_rx: CommandReceiver,
    pub host_tx: HostEventSender,
    pub host_rx: HostEventReceiver,
}

impl TestChannels {
    pub fn new(config: &ChannelConfig) -> Self {
        let (command_tx, command_rx) = create_command_channel(config);
        let (host_tx, host_rx) = create_host_event_channel(config);
        Self {
            command_tx,
            command_rx,
            host_tx,
            host_rx,
        }
    }
}

/// Everything currently buffered on a host event receiver
pub fn drain_host_events(rx: &mut HostEventReceiver) -> Vec<HostEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
