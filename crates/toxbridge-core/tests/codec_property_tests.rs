//! Property-based tests for the identifier codec and presence mapper
//!
//! These cover the round-trip laws of the hex identifier form, rejection of
//! every malformed length, and totality of the status mapping.

use proptest::prelude::*;
use toxbridge_core::{
    bounded_text, canonical_status, persistence, CanonicalStatus, Mood, PublicKey,
    PUBLIC_KEY_HEX_LEN,
};

/// Generate arbitrary public keys
fn arb_public_key() -> impl Strategy<Value = PublicKey> {
    any::<[u8; 32]>().prop_map(PublicKey::new)
}

/// Generate 64-digit hex strings of mixed case
fn arb_mixed_case_hex() -> impl Strategy<Value = String> {
    prop::string::string_regex("[0-9a-fA-F]{64}").unwrap()
}

fn arb_mood() -> impl Strategy<Value = Mood> {
    prop_oneof![Just(Mood::None), Just(Mood::Away), Just(Mood::Busy)]
}

proptest! {
    /// Property: decode(encode(x)) == x
    #[test]
    fn key_survives_hex_round_trip(key in arb_public_key()) {
        let hex = key.to_hex();
        prop_assert_eq!(hex.len(), PUBLIC_KEY_HEX_LEN);
        prop_assert!(hex.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        prop_assert_eq!(hex.parse::<PublicKey>().unwrap(), key);
    }

    /// Property: encode(decode(s)) == lowercase(s)
    #[test]
    fn valid_text_normalizes_to_lowercase(text in arb_mixed_case_hex()) {
        let key: PublicKey = text.parse().unwrap();
        prop_assert_eq!(key.to_string(), text.to_lowercase());
    }

    /// Property: any length other than 64 is rejected, even for hex digits
    #[test]
    fn wrong_lengths_are_rejected(text in prop::string::string_regex("[0-9a-f]{0,130}").unwrap()) {
        prop_assume!(text.len() != PUBLIC_KEY_HEX_LEN);
        prop_assert!(text.parse::<PublicKey>().is_err());
    }

    /// Property: arbitrary buddy names never panic the decoder
    #[test]
    fn arbitrary_names_decode_without_panic(name in ".*") {
        let _ = name.parse::<PublicKey>();
    }

    /// Property: offline always wins over mood
    #[test]
    fn offline_dominates_mood(mood in arb_mood()) {
        prop_assert_eq!(canonical_status(false, mood), CanonicalStatus::Offline);
        prop_assert!(canonical_status(true, mood).is_online());
    }

    /// Property: raw mood bytes always map to one of the three moods
    #[test]
    fn raw_moods_are_total(raw in any::<u8>()) {
        let mood = Mood::from_raw(raw);
        prop_assert!(raw <= 2 || mood == Mood::None);
    }

    /// Property: bounded text is never empty and never exceeds its bound
    #[test]
    fn bounded_text_respects_bound(raw in prop::collection::vec(any::<u8>(), 0..64), max in 0usize..32) {
        if let Some(text) = bounded_text(&raw, max) {
            prop_assert!(!text.is_empty());
            prop_assert!(text.len() <= max);
        }
        if raw.iter().all(|b| *b == 0) {
            prop_assert!(bounded_text(&raw, max).is_none());
        }
    }

    /// Property: ASCII text survives whenever the bound leaves room for it
    #[test]
    fn bounded_ascii_text_is_kept(text in "[a-zA-Z0-9 ]{1,40}", max in 1usize..32) {
        let bounded = bounded_text(text.as_bytes(), max);
        prop_assert_eq!(bounded.as_deref(), Some(&text[..text.len().min(max)]));
    }

    /// Property: blob text form restores the exact bytes
    #[test]
    fn blob_text_round_trip(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let text = persistence::encode_blob(&bytes);
        prop_assert_eq!(persistence::decode_blob(&text).unwrap(), bytes);
    }
}
