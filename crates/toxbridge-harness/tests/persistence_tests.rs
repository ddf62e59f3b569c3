//! Simulated identities stored through the preference layer

use toxbridge_core::persistence::{self, LoadOutcome};
use toxbridge_core::{FilePreferences, MemoryPreferences, Network, PreferenceStore, RestoreError};
use toxbridge_harness::{key_from_name, SimulatedNetwork};

const PREF_KEY: &str = "/plugins/prpl/tox/messenger";

#[test]
fn test_saved_roster_survives_reload() {
    let mut prefs = MemoryPreferences::new();
    let mut network = SimulatedNetwork::new("me");
    let bob = key_from_name("bob");
    network.add_friend(&bob, b"hello").unwrap();

    let saved = persistence::save(&network, &mut prefs, PREF_KEY).unwrap();

    let mut restored = SimulatedNetwork::new("someone else");
    let outcome = persistence::load(&mut restored, &mut prefs, PREF_KEY).unwrap();
    assert_eq!(outcome, LoadOutcome::Restored { bytes: saved });
    assert_eq!(restored.self_key(), key_from_name("me"));
    assert!(restored.friend_slot(&bob).is_some());
}

#[test]
fn test_empty_entry_is_first_run() {
    let mut prefs = MemoryPreferences::new();
    prefs.set_string(PREF_KEY, "").unwrap();
    let mut network = SimulatedNetwork::new("me");

    let outcome = persistence::load(&mut network, &mut prefs, PREF_KEY).unwrap();
    assert!(outcome.is_first_run());
}

#[test]
fn test_foreign_blob_is_corrupt() {
    let mut prefs = MemoryPreferences::new();
    prefs
        .set_string(PREF_KEY, &persistence::encode_blob(b"definitely not a roster"))
        .unwrap();
    let mut network = SimulatedNetwork::new("me");

    let err = persistence::load(&mut network, &mut prefs, PREF_KEY).unwrap_err();
    assert!(matches!(err, RestoreError::Corrupt { .. }));
    assert_eq!(network.self_key(), key_from_name("me"));
}

#[test]
fn test_state_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts").join("prefs.json");
    let mut network = SimulatedNetwork::new("me");
    network.add_friend(&key_from_name("carol"), b"hi").unwrap();

    {
        let mut prefs = FilePreferences::open(&path).unwrap();
        persistence::save(&network, &mut prefs, PREF_KEY).unwrap();
    }

    let mut prefs = FilePreferences::open(&path).unwrap();
    let mut restored = SimulatedNetwork::new("me");
    let outcome = persistence::load(&mut restored, &mut prefs, PREF_KEY).unwrap();
    assert!(!outcome.is_first_run());
    assert!(restored.friend_slot(&key_from_name("carol")).is_some());
}
