//! Multi-account status broadcast
//!
//! Several accounts of this protocol can be open in one process. When one of
//! them changes status or closes, every sibling that lists it as a buddy is
//! told about the new status through its own host event channel.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, error};

use toxbridge_core::{CanonicalStatus, HostEvent, HostEventEmitter};

/// Presence of one account as seen by its siblings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPresence {
    pub status_id: String,
    pub message: Option<String>,
}

#[derive(Debug)]
struct AccountEntry {
    presence: AccountPresence,
    buddies: HashSet<String>,
    emitter: HostEventEmitter,
}

/// Registry of the open accounts of one process
#[derive(Debug, Clone, Default)]
pub struct AccountDirectory {
    accounts: Arc<DashMap<String, AccountEntry>>,
}

impl AccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account with its buddy names; it starts online
    pub fn register<I>(&self, account: &str, buddies: I, emitter: HostEventEmitter)
    where
        I: IntoIterator<Item = String>,
    {
        self.accounts.insert(
            account.to_string(),
            AccountEntry {
                presence: AccountPresence {
                    status_id: CanonicalStatus::Online.id().to_string(),
                    message: None,
                },
                buddies: buddies.into_iter().collect(),
                emitter,
            },
        );
        debug!(account, "Account registered for status relay");
    }

    pub fn unregister(&self, account: &str) {
        self.accounts.remove(account);
    }

    pub fn is_registered(&self, account: &str) -> bool {
        self.accounts.contains_key(account)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn add_buddy(&self, account: &str, buddy: &str) {
        if let Some(mut entry) = self.accounts.get_mut(account) {
            entry.buddies.insert(buddy.to_string());
        }
    }

    pub fn remove_buddy(&self, account: &str, buddy: &str) {
        if let Some(mut entry) = self.accounts.get_mut(account) {
            entry.buddies.remove(buddy);
        }
    }

    pub fn presence(&self, account: &str) -> Option<AccountPresence> {
        self.accounts.get(account).map(|entry| entry.presence.clone())
    }

    /// Store a new status for `from` and relay it to its siblings
    ///
    /// Returns the number of accounts that were told.
    pub fn set_status(&self, from: &str, status_id: &str, message: Option<String>) -> usize {
        if CanonicalStatus::from_id(status_id).is_none() {
            error!(account = from, status_id, "Refusing unknown status");
            return 0;
        }
        match self.accounts.get_mut(from) {
            Some(mut entry) => {
                entry.presence = AccountPresence {
                    status_id: status_id.to_string(),
                    message,
                };
            }
            None => return 0,
        }
        self.relay_from(from)
    }

    /// Let `from` learn the status of `to`, if `to` is one of its buddies
    pub fn discover_status(&self, from: &str, to: &str) -> Option<AccountPresence> {
        let presence = self.presence(to)?;
        let entry = self.accounts.get(from)?;
        if !entry.buddies.contains(to) {
            return None;
        }

        if CanonicalStatus::from_id(&presence.status_id).is_none() {
            error!(
                account = from,
                buddy = to,
                status_id = %presence.status_id,
                "Buddy has an unknown status"
            );
            return None;
        }

        debug!(account = from, buddy = to, status_id = %presence.status_id, "Relaying sibling status");
        let _ = entry.emitter.emit(HostEvent::SiblingStatus {
            account: to.to_string(),
            status_id: presence.status_id.clone(),
            message: presence.message.clone(),
        });
        Some(presence)
    }

    /// Announce that `account` goes offline, then forget it
    pub fn report_close(&self, account: &str) -> usize {
        if let Some(mut entry) = self.accounts.get_mut(account) {
            entry.presence = AccountPresence {
                status_id: CanonicalStatus::Offline.id().to_string(),
                message: None,
            };
        }
        let told = self.relay_from(account);
        self.unregister(account);
        told
    }

    fn relay_from(&self, from: &str) -> usize {
        let siblings: Vec<String> = self
            .accounts
            .iter()
            .filter(|entry| entry.key() != from)
            .map(|entry| entry.key().clone())
            .collect();

        siblings
            .iter()
            .filter(|sibling| self.discover_status(sibling, from).is_some())
            .count()
    }
}
