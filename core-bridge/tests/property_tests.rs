// =====================================================================================
// File: core-bridge/tests/property_tests.rs
// Description: Property-based tests for the quantified invariants this
//              crate's core algorithms must hold regardless of input.
// Author: arkSong (arksong2018@gmail.com)
// =====================================================================================

use core_bridge::atomic_swap::{generate_hash_lock, generate_secret, verify_hash_lock};
use core_bridge::multisig::{threshold_for, MultiSigEngine, PermissiveVerifier};
use core_bridge::queue::{MessageQueue, QueueConfig};
use proptest::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

proptest! {
    /// Roundtrip: verify(reveal = s, hashlock = SHA256(hex(s))) is true for
    /// the secret that produced the hashlock, and false for any other
    /// 32-byte secret.
    #[test]
    fn hash_lock_roundtrip_holds_for_any_secret(seed in any::<[u8; 32]>()) {
        let secret = hex::encode(seed);
        let hash_lock = generate_hash_lock(&secret);
        prop_assert!(verify_hash_lock(&hash_lock, &secret));
    }

    #[test]
    fn wrong_secret_never_verifies_against_an_unrelated_hash_lock(
        seed_a in any::<[u8; 32]>(),
        seed_b in any::<[u8; 32]>(),
    ) {
        prop_assume!(seed_a != seed_b);
        let hash_lock = generate_hash_lock(&hex::encode(seed_a));
        prop_assert!(!verify_hash_lock(&hash_lock, &hex::encode(seed_b)));
    }

    /// Threshold tracks ceil(2n/3) for any validator-set size.
    #[test]
    fn threshold_is_always_between_two_thirds_and_n(n in 1usize..200) {
        let t = threshold_for(n);
        prop_assert!(t <= n);
        prop_assert!(3 * t >= 2 * n);
        prop_assert!(t == 0 || 3 * (t - 1) < 2 * n);
    }

    /// Adding the same validator's signature twice never increments the
    /// collection's signature count.
    #[test]
    fn duplicate_validator_signature_never_double_counts(
        extra_signatures in proptest::collection::vec(1usize..5, 0..10),
    ) {
        let engine = MultiSigEngine::new(Arc::new(PermissiveVerifier));
        let validators = vec!["v1".to_string(), "v2".to_string(), "v3".to_string()];
        let id = engine.open(Uuid::new_v4(), validators).unwrap();
        let payload = b"payload";

        engine.add_signature(id, "v1", "ab", payload).unwrap();
        for _ in &extra_signatures {
            engine.add_signature(id, "v1", "cd", payload).unwrap();
        }
        let status = engine.status(id).unwrap();
        prop_assert_eq!(status.signatures.len(), 1);
    }

    /// Messages dispatched from a single destination queue emerge in
    /// strictly increasing nonce order and no nonce is dispatched twice.
    #[test]
    fn queue_dispatches_in_strictly_increasing_nonce_order(
        nonces in proptest::collection::vec(0u64..1000, 1..30),
    ) {
        // Build a strictly increasing nonce sequence from arbitrary input so
        // the property exercises FIFO dispatch order, not `send`'s own
        // replay rejection (covered separately in queue.rs's unit tests).
        let mut sorted: Vec<u64> = nonces;
        sorted.sort_unstable();
        sorted.dedup();

        let queue = MessageQueue::new(QueueConfig::default());
        for &n in &sorted {
            queue.send("ethereum".to_string(), "polygon".to_string(), n, vec![]).unwrap();
        }

        let mut dispatched = Vec::new();
        while let Some(msg) = queue.process_next("polygon").unwrap() {
            dispatched.push(msg.nonce);
            queue.acknowledge(msg.id).unwrap();
        }

        prop_assert_eq!(&dispatched, &sorted);
        for window in dispatched.windows(2) {
            prop_assert!(window[0] < window[1]);
        }
    }
}

#[test]
fn secret_generation_produces_32_distinct_bytes_each_call() {
    let a = generate_secret();
    let b = generate_secret();
    assert_eq!(a.len(), 64); // 32 bytes, hex-encoded
    assert_ne!(a, b);
}
