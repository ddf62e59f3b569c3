//! Connection supervision for the bridge
//!
//! The [`ConnectionSupervisor`] owns the account's connection phase. It is
//! polled on a fixed interval with the network's liveness flag and reports a
//! [`PhaseTransition`] only when the phase actually changes.

use std::collections::VecDeque;

use serde::Serialize;

/// Audit entries kept before the oldest is dropped
const MAX_AUDIT_ENTRIES: usize = 256;

// ----------------------------------------------------------------------------
// Phase Types
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ConnectionPhase {
    #[default]
    Connecting,
    Connected,
}

/// Phase change observed by one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PhaseTransition {
    /// Connecting → Connected
    Connected,
    /// Connected → Connecting
    Lost,
}

/// One recorded phase change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionRecord {
    /// Poll number on which the change was observed
    pub poll: u64,
    pub from: ConnectionPhase,
    pub to: ConnectionPhase,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConnectionStats {
    pub polls: u64,
    pub connects: u64,
    pub losses: u64,
    pub reconciliations: u64,
    pub buddies_reconciled: u64,
}

// ----------------------------------------------------------------------------
// Connection Supervisor
// ----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ConnectionSupervisor {
    phase: ConnectionPhase,
    audit_trail: VecDeque<TransitionRecord>,
    stats: ConnectionStats,
}

impl ConnectionSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn is_connected(&self) -> bool {
        self.phase == ConnectionPhase::Connected
    }

    /// Feed the current liveness flag into the state machine
    pub fn poll(&mut self, live: bool) -> Option<PhaseTransition> {
        self.stats.polls += 1;

        let (next, transition) = match (self.phase, live) {
            (ConnectionPhase::Connecting, true) => {
                (ConnectionPhase::Connected, PhaseTransition::Connected)
            }
            (ConnectionPhase::Connected, false) => {
                (ConnectionPhase::Connecting, PhaseTransition::Lost)
            }
            _ => return None,
        };

        self.record(next);
        match transition {
            PhaseTransition::Connected => self.stats.connects += 1,
            PhaseTransition::Lost => self.stats.losses += 1,
        }
        Some(transition)
    }

    /// Count one reconciliation pass covering `buddies` entries
    pub fn record_reconciliation(&mut self, buddies: usize) {
        self.stats.reconciliations += 1;
        self.stats.buddies_reconciled += buddies as u64;
    }

    fn record(&mut self, next: ConnectionPhase) {
        self.audit_trail.push_back(TransitionRecord {
            poll: self.stats.polls,
            from: self.phase,
            to: next,
        });
        if self.audit_trail.len() > MAX_AUDIT_ENTRIES {
            self.audit_trail.pop_front();
        }
        self.phase = next;
    }

    /// Most recent transitions, oldest first
    pub fn recent_transitions(&self, limit: usize) -> Vec<TransitionRecord> {
        let skip = self.audit_trail.len().saturating_sub(limit);
        self.audit_trail.iter().skip(skip).copied().collect()
    }

    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_connecting() {
        let supervisor = ConnectionSupervisor::new();
        assert_eq!(supervisor.phase(), ConnectionPhase::Connecting);
        assert!(!supervisor.is_connected());
    }

    #[test]
    fn test_transitions_only_on_change() {
        let mut supervisor = ConnectionSupervisor::new();

        assert_eq!(supervisor.poll(false), None);
        assert_eq!(supervisor.poll(true), Some(PhaseTransition::Connected));
        assert_eq!(supervisor.poll(true), None);
        assert_eq!(supervisor.poll(true), None);
        assert_eq!(supervisor.poll(false), Some(PhaseTransition::Lost));
        assert_eq!(supervisor.poll(false), None);
        assert_eq!(supervisor.poll(true), Some(PhaseTransition::Connected));

        let stats = supervisor.stats();
        assert_eq!(stats.polls, 7);
        assert_eq!(stats.connects, 2);
        assert_eq!(stats.losses, 1);
    }

    #[test]
    fn test_audit_trail() {
        let mut supervisor = ConnectionSupervisor::new();
        supervisor.poll(true);
        supervisor.poll(false);

        let trail = supervisor.recent_transitions(10);
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[0].from, ConnectionPhase::Connecting);
        assert_eq!(trail[0].to, ConnectionPhase::Connected);
        assert_eq!(trail[1].poll, 2);
        assert_eq!(supervisor.recent_transitions(1)[0].to, ConnectionPhase::Connecting);
    }

    #[test]
    fn test_audit_trail_is_bounded() {
        let mut supervisor = ConnectionSupervisor::new();
        for i in 0..(MAX_AUDIT_ENTRIES * 2) {
            supervisor.poll(i % 2 == 0);
        }
        assert_eq!(supervisor.recent_transitions(usize::MAX).len(), MAX_AUDIT_ENTRIES);
    }
}
