//! Presence mapping
//!
//! The network reports presence on two independent channels: a liveness flag
//! per friend and a self-reported mood. The host client only knows four
//! statuses, so every (liveness, mood) pair collapses to exactly one of them.

use core::fmt;
use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Network Mood
// ----------------------------------------------------------------------------

/// Self-reported presence hint of a network peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mood {
    #[default]
    None,
    Away,
    Busy,
}

impl Mood {
    /// Map the network's raw status byte; unknown values read as `None`
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Mood::Away,
            2 => Mood::Busy,
            _ => Mood::None,
        }
    }

    pub fn as_raw(&self) -> u8 {
        match self {
            Mood::None => 0,
            Mood::Away => 1,
            Mood::Busy => 2,
        }
    }
}

// ----------------------------------------------------------------------------
// Canonical Status
// ----------------------------------------------------------------------------

/// Status primitive of the host client's status model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusPrimitive {
    Available,
    Away,
    Unavailable,
    Offline,
}

/// The four statuses exposed to the host client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalStatus {
    Online,
    Away,
    Busy,
    Offline,
}

impl CanonicalStatus {
    /// All statuses, in registration order
    pub const ALL: [CanonicalStatus; 4] = [
        CanonicalStatus::Online,
        CanonicalStatus::Away,
        CanonicalStatus::Busy,
        CanonicalStatus::Offline,
    ];

    /// Stable status id used by the host client
    pub fn id(&self) -> &'static str {
        match self {
            CanonicalStatus::Online => "tox_online",
            CanonicalStatus::Away => "tox_away",
            CanonicalStatus::Busy => "tox_busy",
            CanonicalStatus::Offline => "tox_offline",
        }
    }

    /// Human readable title
    pub fn title(&self) -> &'static str {
        match self {
            CanonicalStatus::Online => "Online",
            CanonicalStatus::Away => "Away",
            CanonicalStatus::Busy => "Busy",
            CanonicalStatus::Offline => "Offline",
        }
    }

    pub fn primitive(&self) -> StatusPrimitive {
        match self {
            CanonicalStatus::Online => StatusPrimitive::Available,
            CanonicalStatus::Away => StatusPrimitive::Away,
            CanonicalStatus::Busy => StatusPrimitive::Unavailable,
            CanonicalStatus::Offline => StatusPrimitive::Offline,
        }
    }

    /// Look a status up by its id
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.id() == id)
    }

    pub fn is_online(&self) -> bool {
        !matches!(self, CanonicalStatus::Offline)
    }
}

impl fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Collapse liveness and mood into a canonical status
///
/// Offline liveness wins over any mood; otherwise away beats busy beats online.
pub fn canonical_status(online: bool, mood: Mood) -> CanonicalStatus {
    if !online {
        return CanonicalStatus::Offline;
    }
    match mood {
        Mood::Away => CanonicalStatus::Away,
        Mood::Busy => CanonicalStatus::Busy,
        Mood::None => CanonicalStatus::Online,
    }
}

// ----------------------------------------------------------------------------
// Status Types
// ----------------------------------------------------------------------------

/// Attribute id carrying a free-form status message
pub const STATUS_MESSAGE_ATTR: &str = "message";

/// Description of one status type registered with the host client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusType {
    pub status: CanonicalStatus,
    pub primitive: StatusPrimitive,
    pub id: &'static str,
    pub title: &'static str,
    pub user_settable: bool,
    pub attributes: Vec<&'static str>,
}

/// Status types offered to the host client for this protocol
pub fn status_types() -> Vec<StatusType> {
    CanonicalStatus::ALL
        .into_iter()
        .map(|status| StatusType {
            status,
            primitive: status.primitive(),
            id: status.id(),
            title: status.title(),
            user_settable: true,
            attributes: vec![STATUS_MESSAGE_ATTR],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapper_is_total() {
        let cases = [
            (false, Mood::None, CanonicalStatus::Offline),
            (false, Mood::Away, CanonicalStatus::Offline),
            (false, Mood::Busy, CanonicalStatus::Offline),
            (true, Mood::None, CanonicalStatus::Online),
            (true, Mood::Away, CanonicalStatus::Away),
            (true, Mood::Busy, CanonicalStatus::Busy),
        ];
        for (online, mood, expected) in cases {
            assert_eq!(canonical_status(online, mood), expected, "{online} {mood:?}");
        }
    }

    #[test]
    fn test_raw_mood() {
        assert_eq!(Mood::from_raw(0), Mood::None);
        assert_eq!(Mood::from_raw(1), Mood::Away);
        assert_eq!(Mood::from_raw(2), Mood::Busy);
        // the network's "invalid" marker and anything past it
        assert_eq!(Mood::from_raw(3), Mood::None);
        assert_eq!(Mood::from_raw(255), Mood::None);
        for mood in [Mood::None, Mood::Away, Mood::Busy] {
            assert_eq!(Mood::from_raw(mood.as_raw()), mood);
        }
    }

    #[test]
    fn test_status_ids() {
        for status in CanonicalStatus::ALL {
            assert_eq!(CanonicalStatus::from_id(status.id()), Some(status));
        }
        assert_eq!(CanonicalStatus::from_id("available"), None);
        assert_eq!(CanonicalStatus::Busy.primitive(), StatusPrimitive::Unavailable);
    }

    #[test]
    fn test_status_types() {
        let types = status_types();
        assert_eq!(types.len(), 4);
        assert_eq!(types[0].id, "tox_online");
        assert_eq!(types[3].primitive, StatusPrimitive::Offline);
        assert!(types.iter().all(|t| t.attributes == vec![STATUS_MESSAGE_ATTR]));
    }
}
