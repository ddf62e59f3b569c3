//! Channel Utilities
//!
//! Typed aliases over tokio channels plus the non-blocking emitter the bridge
//! task uses to talk to the host. Commands and host events travel on bounded
//! channels; network events are queued without bound because the network
//! layer must never be blocked inside a pump.
//!
//! Host events that do not fit in the channel wait in the emitter's backlog
//! until the task loop hands them over with [`HostEventEmitter::flush_one`].

use core::sync::atomic::{AtomicU64, Ordering};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::channel::communication::{Command, HostEvent, NetworkEvent};
use crate::config::ChannelConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel is closed")]
    ChannelClosed,
}

pub type CommandSender = mpsc::Sender<Command>;
pub type CommandReceiver = mpsc::Receiver<Command>;
pub type HostEventSender = mpsc::Sender<HostEvent>;
pub type HostEventReceiver = mpsc::Receiver<HostEvent>;
pub type NetworkEventSender = mpsc::UnboundedSender<NetworkEvent>;
pub type NetworkEventReceiver = mpsc::UnboundedReceiver<NetworkEvent>;

// ----------------------------------------------------------------------------
// Channel Creation Utilities
// ----------------------------------------------------------------------------

/// Create bounded command channel (Host → Bridge)
pub fn create_command_channel(config: &ChannelConfig) -> (CommandSender, CommandReceiver) {
    mpsc::channel(config.command_buffer_size)
}

/// Create bounded host event channel (Bridge → Host)
pub fn create_host_event_channel(config: &ChannelConfig) -> (HostEventSender, HostEventReceiver) {
    mpsc::channel(config.host_event_buffer_size)
}

/// Create the network callback queue (Network → Bridge)
pub fn create_network_event_channel() -> (NetworkEventSender, NetworkEventReceiver) {
    mpsc::unbounded_channel()
}

// ----------------------------------------------------------------------------
// Non-blocking Emitter
// ----------------------------------------------------------------------------

/// Counters of one emitter, shared between clones
#[derive(Debug, Default)]
pub struct ChannelStats {
    sent: AtomicU64,
    deferred: AtomicU64,
    dropped: AtomicU64,
}

impl ChannelStats {
    pub fn messages_sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// Events that waited in the backlog for channel space
    pub fn messages_deferred(&self) -> u64 {
        self.deferred.load(Ordering::Relaxed)
    }

    pub fn messages_dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn drop_rate(&self) -> f32 {
        let sent = self.messages_sent();
        let dropped = self.messages_dropped();
        if sent + dropped == 0 {
            0.0
        } else {
            dropped as f32 / (sent + dropped) as f32
        }
    }
}

/// Sends host events without ever blocking the bridge task
///
/// Events that find the channel full are kept in order in a backlog shared
/// between clones; only a closed channel drops them.
#[derive(Debug, Clone)]
pub struct HostEventEmitter {
    sender: HostEventSender,
    backlog: Arc<Mutex<VecDeque<HostEvent>>>,
    stats: Arc<ChannelStats>,
}

impl HostEventEmitter {
    pub fn new(sender: HostEventSender) -> Self {
        Self {
            sender,
            backlog: Arc::new(Mutex::new(VecDeque::new())),
            stats: Arc::new(ChannelStats::default()),
        }
    }

    /// Hand one event to the channel, or queue it behind earlier ones
    pub fn emit(&self, event: HostEvent) -> Result<(), ChannelError> {
        let mut backlog = self.backlog();
        if !backlog.is_empty() {
            if self.sender.is_closed() {
                return Err(self.drop_all(&mut backlog, 1));
            }
            backlog.push_back(event);
            self.stats.deferred.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }

        match self.sender.try_send(event) {
            Ok(()) => {
                self.stats.sent.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(event)) => {
                debug!(backlog = backlog.len() + 1, "Host event channel full, deferring");
                backlog.push_back(event);
                self.stats.deferred.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(self.drop_all(&mut backlog, 1)),
        }
    }

    /// Wait for channel space and move the oldest backlogged event into it
    ///
    /// Returns `Ok(false)` when the backlog was empty. Cancelling the future
    /// before it completes loses nothing.
    pub async fn flush_one(&self) -> Result<bool, ChannelError> {
        if !self.has_backlog() {
            return Ok(false);
        }
        let permit = match self.sender.reserve().await {
            Ok(permit) => permit,
            Err(_) => {
                let mut backlog = self.backlog();
                return Err(self.drop_all(&mut backlog, 0));
            }
        };

        let Some(event) = self.backlog().pop_front() else {
            return Ok(false);
        };
        permit.send(event);
        self.stats.sent.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    pub fn has_backlog(&self) -> bool {
        !self.backlog().is_empty()
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog().len()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    pub fn stats(&self) -> &ChannelStats {
        &self.stats
    }

    fn backlog(&self) -> MutexGuard<'_, VecDeque<HostEvent>> {
        self.backlog.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Discard the backlog plus `extra` unsent events once the host is gone
    fn drop_all(&self, backlog: &mut VecDeque<HostEvent>, extra: u64) -> ChannelError {
        let dropped = backlog.len() as u64 + extra;
        backlog.clear();
        self.stats.dropped.fetch_add(dropped, Ordering::Relaxed);
        warn!(dropped, "Host event channel closed, dropping events");
        ChannelError::ChannelClosed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PublicKey;

    fn alias_event() -> HostEvent {
        HostEvent::AliasChanged {
            key: PublicKey::new([2; 32]),
            alias: "Carol".to_string(),
        }
    }

    fn status_event(n: u8) -> HostEvent {
        HostEvent::StatusChanged {
            key: PublicKey::new([n; 32]),
            status: crate::presence::CanonicalStatus::Online,
        }
    }

    #[tokio::test]
    async fn test_emitter_defers_when_full() {
        let config = ChannelConfig {
            command_buffer_size: 1,
            host_event_buffer_size: 1,
        };
        let (tx, mut rx) = create_host_event_channel(&config);
        let emitter = HostEventEmitter::new(tx);

        for n in 0..3 {
            assert!(emitter.emit(status_event(n)).is_ok());
        }
        assert_eq!(emitter.backlog_len(), 2);
        assert_eq!(emitter.stats().messages_sent(), 1);
        assert_eq!(emitter.stats().messages_deferred(), 2);
        assert_eq!(emitter.stats().messages_dropped(), 0);

        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(rx.recv().await.unwrap());
            emitter.flush_one().await.unwrap();
        }
        assert_eq!(seen, (0..3).map(status_event).collect::<Vec<_>>());
        assert!(!emitter.has_backlog());
        assert_eq!(emitter.flush_one().await, Ok(false));
        assert_eq!(emitter.stats().messages_sent(), 3);
    }

    #[tokio::test]
    async fn test_backlog_is_shared_between_clones() {
        let config = ChannelConfig {
            command_buffer_size: 1,
            host_event_buffer_size: 1,
        };
        let (tx, mut rx) = create_host_event_channel(&config);
        let emitter = HostEventEmitter::new(tx);
        let sibling = emitter.clone();

        emitter.emit(status_event(1)).unwrap();
        sibling.emit(alias_event()).unwrap();
        assert_eq!(emitter.backlog_len(), 1);

        assert_eq!(rx.recv().await, Some(status_event(1)));
        assert_eq!(emitter.flush_one().await, Ok(true));
        assert_eq!(rx.recv().await, Some(alias_event()));
    }

    #[tokio::test]
    async fn test_closed_channel_drops_backlog() {
        let config = ChannelConfig {
            command_buffer_size: 1,
            host_event_buffer_size: 1,
        };
        let (tx, rx) = create_host_event_channel(&config);
        let emitter = HostEventEmitter::new(tx);
        emitter.emit(status_event(1)).unwrap();
        emitter.emit(status_event(2)).unwrap();
        drop(rx);

        assert_eq!(emitter.flush_one().await, Err(ChannelError::ChannelClosed));
        assert!(!emitter.has_backlog());
        assert_eq!(emitter.stats().messages_dropped(), 1);
    }

    #[tokio::test]
    async fn test_emitter_reports_closed() {
        let (tx, rx) = create_host_event_channel(&ChannelConfig::default());
        let emitter = HostEventEmitter::new(tx);
        drop(rx);

        assert!(emitter.is_closed());
        assert_eq!(emitter.emit(alias_event()), Err(ChannelError::ChannelClosed));
    }

    #[tokio::test]
    async fn test_network_queue_preserves_order() {
        let (tx, mut rx) = create_network_event_channel();
        for online in [true, false, true] {
            tx.send(NetworkEvent::ConnectionChanged {
                slot: crate::types::FriendSlot::new(0),
                online,
            })
            .unwrap();
        }
        let mut seen = Vec::new();
        while let Ok(NetworkEvent::ConnectionChanged { online, .. }) = rx.try_recv() {
            seen.push(online);
        }
        assert_eq!(seen, vec![true, false, true]);
    }
}
