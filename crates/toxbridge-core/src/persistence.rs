//! Network State Persistence
//!
//! The network identity serializes to an opaque blob. The blob is kept as
//! standard padded base64 in a single preference entry and restored before the
//! network receives any other command.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::{debug, info};

use crate::errors::{RestoreError, StorageError};
use crate::network::Network;
use crate::storage::PreferenceStore;

/// Result of a restore attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No state was stored; the identity starts fresh
    FirstRun,
    /// State of `bytes` length was handed to the network
    Restored { bytes: usize },
}

impl LoadOutcome {
    pub fn is_first_run(&self) -> bool {
        matches!(self, LoadOutcome::FirstRun)
    }
}

/// Text form of a network blob
pub fn encode_blob(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Blob bytes from their text form
pub fn decode_blob(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(text.trim())
}

/// Store the network's state under `pref_key`, returning the blob size
pub fn save<N, P>(network: &N, prefs: &mut P, pref_key: &str) -> Result<usize, StorageError>
where
    N: Network + ?Sized,
    P: PreferenceStore + ?Sized,
{
    let bytes = network.save();
    prefs.set_string(pref_key, &encode_blob(&bytes))?;
    debug!(pref_key, bytes = bytes.len(), "Saved network state");
    Ok(bytes.len())
}

/// Restore the network's state from `pref_key`
///
/// A missing entry is created empty so the host lists it among the plugin's
/// preferences.
pub fn load<N, P>(network: &mut N, prefs: &mut P, pref_key: &str) -> Result<LoadOutcome, RestoreError>
where
    N: Network + ?Sized,
    P: PreferenceStore + ?Sized,
{
    let stored = match prefs.get_string(pref_key)? {
        Some(stored) => stored,
        None => {
            prefs.add_string(pref_key, "")?;
            info!(pref_key, "No stored network state, starting fresh");
            return Ok(LoadOutcome::FirstRun);
        }
    };

    if stored.trim().is_empty() {
        info!(pref_key, "Stored network state is empty, starting fresh");
        return Ok(LoadOutcome::FirstRun);
    }

    let bytes = decode_blob(&stored)?;
    network
        .load(&bytes)
        .map_err(|e| RestoreError::Corrupt {
            reason: e.to_string(),
        })?;

    info!(pref_key, bytes = bytes.len(), "Restored network state");
    Ok(LoadOutcome::Restored { bytes: bytes.len() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_text_form() {
        assert_eq!(encode_blob(b""), "");
        assert_eq!(encode_blob(b"tox"), "dG94");
        assert_eq!(encode_blob(b"to"), "dG8=");
        assert_eq!(decode_blob("dG8=").unwrap(), b"to");
        assert_eq!(decode_blob(" dG94\n").unwrap(), b"tox");
        assert!(decode_blob("@@@@").is_err());
    }

    #[test]
    fn test_load_outcome() {
        assert!(LoadOutcome::FirstRun.is_first_run());
        assert!(!LoadOutcome::Restored { bytes: 3 }.is_first_run());
    }
}
