//! Buddy table
//!
//! Host-side view of the friend roster. Entries are keyed by public key; the
//! network friend slot is cached on the entry once known.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{FriendSlot, PublicKey};

/// One friend as known to the host client's buddy list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuddyEntry {
    key: PublicKey,
    /// Display alias set from nickname changes
    pub alias: Option<String>,
    /// Cached network friend slot
    pub slot: Option<FriendSlot>,
}

impl BuddyEntry {
    /// Entry loaded from the host's persisted list, slot resolved later
    pub fn persisted(key: PublicKey, alias: Option<String>) -> Self {
        Self {
            key,
            alias,
            slot: None,
        }
    }

    /// Entry created from a successful add-friend
    pub fn with_slot(key: PublicKey, slot: FriendSlot, alias: Option<String>) -> Self {
        Self {
            key,
            alias,
            slot: Some(slot),
        }
    }

    pub fn key(&self) -> &PublicKey {
        &self.key
    }

    /// Name the host client displays: the alias when set, otherwise the key
    pub fn display_name(&self) -> String {
        self.alias.clone().unwrap_or_else(|| self.key.to_hex())
    }
}

/// Inbound friend request awaiting a user decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequest {
    pub key: PublicKey,
    pub message: Option<String>,
}

impl PendingRequest {
    /// Build from raw request bytes, truncated to `max_len` bytes
    ///
    /// An empty payload yields no message. Truncation never splits a UTF-8
    /// character.
    pub fn from_raw(key: PublicKey, raw: &[u8], max_len: usize) -> Self {
        Self {
            key,
            message: bounded_text(raw, max_len),
        }
    }
}

/// Decode network text, dropping trailing NULs and bounding the length
///
/// `None` when nothing is left once the text is cut to the bound.
pub fn bounded_text(raw: &[u8], max_len: usize) -> Option<String> {
    let end = raw.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    if end == 0 {
        return None;
    }

    let text = String::from_utf8_lossy(&raw[..end]);
    if text.len() <= max_len {
        return Some(text.into_owned());
    }

    let mut cut = max_len;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    if cut == 0 {
        return None;
    }
    Some(text[..cut].to_string())
}

// ----------------------------------------------------------------------------
// Buddy List
// ----------------------------------------------------------------------------

/// Table of buddies owned by one bridge
#[derive(Debug, Default, Clone)]
pub struct BuddyList {
    entries: HashMap<PublicKey, BuddyEntry>,
}

impl BuddyList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the host's persisted buddy names
    ///
    /// Names that do not decode as identifiers belong to other protocols in a
    /// shared list and are skipped.
    pub fn from_persisted<I, S>(buddies: I) -> Self
    where
        I: IntoIterator<Item = (S, Option<String>)>,
        S: AsRef<str>,
    {
        let mut list = Self::new();
        for (name, alias) in buddies {
            match name.as_ref().parse::<PublicKey>() {
                Ok(key) => {
                    list.insert(BuddyEntry::persisted(key, alias));
                }
                Err(e) => {
                    debug!(name = name.as_ref(), error = %e, "Skipping buddy that is not a public key");
                }
            }
        }
        list
    }

    /// Insert or replace an entry, returning the previous one
    pub fn insert(&mut self, entry: BuddyEntry) -> Option<BuddyEntry> {
        self.entries.insert(*entry.key(), entry)
    }

    pub fn remove(&mut self, key: &PublicKey) -> Option<BuddyEntry> {
        self.entries.remove(key)
    }

    pub fn get(&self, key: &PublicKey) -> Option<&BuddyEntry> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &PublicKey) -> Option<&mut BuddyEntry> {
        self.entries.get_mut(key)
    }

    pub fn contains(&self, key: &PublicKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Find by textual key; names that are not identifiers never match
    pub fn find(&self, name: &str) -> Option<&BuddyEntry> {
        let key = name.parse::<PublicKey>().ok()?;
        self.entries.get(&key)
    }

    /// Keys in a stable order
    pub fn keys(&self) -> Vec<PublicKey> {
        let mut keys: Vec<PublicKey> = self.entries.keys().copied().collect();
        keys.sort();
        keys
    }

    pub fn iter(&self) -> impl Iterator<Item = &BuddyEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: u8) -> PublicKey {
        PublicKey::new([id; 32])
    }

    #[test]
    fn test_from_persisted_skips_foreign_names() {
        let list = BuddyList::from_persisted(vec![
            (key(1).to_hex(), None),
            ("someone@jabber.org".to_string(), None),
            (key(2).to_hex().to_uppercase(), Some("Bob".to_string())),
        ]);

        assert_eq!(list.len(), 2);
        assert!(list.contains(&key(1)));
        assert_eq!(list.get(&key(2)).unwrap().alias.as_deref(), Some("Bob"));
        assert!(list.iter().all(|entry| entry.slot.is_none()));
    }

    #[test]
    fn test_find_by_name() {
        let mut list = BuddyList::new();
        list.insert(BuddyEntry::with_slot(key(3), FriendSlot::new(0), None));

        assert!(list.find(&key(3).to_hex()).is_some());
        assert!(list.find("not-a-key").is_none());
        assert_eq!(list.keys(), vec![key(3)]);
    }

    #[test]
    fn test_display_name() {
        let entry = BuddyEntry::persisted(key(4), None);
        assert_eq!(entry.display_name(), key(4).to_hex());

        let entry = BuddyEntry::persisted(key(4), Some("Alice".to_string()));
        assert_eq!(entry.display_name(), "Alice");
    }

    #[test]
    fn test_bounded_text() {
        assert_eq!(bounded_text(b"", 10), None);
        assert_eq!(bounded_text(b"\0\0", 10), None);
        assert_eq!(bounded_text(b"hello\0", 10).as_deref(), Some("hello"));
        assert_eq!(bounded_text(b"hello world", 5).as_deref(), Some("hello"));
        // "é" is two bytes; a cut in the middle falls back to the boundary
        assert_eq!(bounded_text("aé".as_bytes(), 2).as_deref(), Some("a"));
        assert_eq!(bounded_text(b"hello", 0), None);
        assert_eq!(bounded_text("é".as_bytes(), 1), None);
    }

    #[test]
    fn test_pending_request_from_raw() {
        let pending = PendingRequest::from_raw(key(5), b"", 100);
        assert_eq!(pending.message, None);

        let pending = PendingRequest::from_raw(key(5), b"add me please", 6);
        assert_eq!(pending.message.as_deref(), Some("add me"));
    }
}
