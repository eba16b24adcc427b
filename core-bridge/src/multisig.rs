// =====================================================================================
// File: core-bridge/src/multisig.rs
// Description: Multi-signature validator threshold engine — m-of-n signature
//              collection backing each transfer's target-chain execution.
// Author: arkSong (arksong2018@gmail.com)
// =====================================================================================

use crate::error::{BridgeError, BridgeResult};
use crate::types::{SignatureCollection, ValidationStatus, Validator};
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Minimum signatures required for a validator set of size `n`: ceil(2n/3).
pub fn threshold_for(n: usize) -> usize {
    (2 * n + 2) / 3
}

/// Process-wide, reconfigurable set of validators. `open()` snapshots the
/// active subset and its derived threshold at the moment a collection is
/// created; later additions/removals here never retroactively change an
/// already-open collection's threshold.
#[derive(Default)]
pub struct ValidatorRegistry {
    validators: DashMap<String, Validator>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, validator_id: impl Into<String>, public_key: impl Into<String>) {
        let validator_id = validator_id.into();
        self.validators.insert(
            validator_id.clone(),
            Validator {
                validator_id,
                public_key: public_key.into(),
                active: true,
            },
        );
    }

    pub fn set_active(&self, validator_id: &str, active: bool) -> BridgeResult<()> {
        let mut entry = self
            .validators
            .get_mut(validator_id)
            .ok_or_else(|| BridgeError::not_found("validator", validator_id.to_string()))?;
        entry.active = active;
        Ok(())
    }

    pub fn active_validator_ids(&self) -> Vec<String> {
        self.validators
            .iter()
            .filter(|v| v.active)
            .map(|v| v.validator_id.clone())
            .collect()
    }

    pub fn total_active(&self) -> usize {
        self.validators.iter().filter(|v| v.active).count()
    }

    /// `ceil(2 * total_active / 3)`, the default threshold a new collection
    /// is opened with unless the caller overrides it.
    pub fn default_threshold(&self) -> usize {
        threshold_for(self.total_active())
    }
}

/// Deterministic byte payload every validator signs: pipe-joined fields in
/// a fixed order so the same transfer always produces the same bytes.
pub fn canonical_signable_payload(
    transfer_id: Uuid,
    source_chain: &str,
    target_chain: &str,
    source_address: &str,
    target_address: &str,
    token_symbol: &str,
    amount: Decimal,
    nonce: u64,
) -> Vec<u8> {
    format!(
        "{}|{}|{}|{}|{}|{}|{}|{}",
        transfer_id,
        source_chain,
        target_chain,
        source_address,
        target_address,
        token_symbol,
        amount,
        nonce
    )
    .into_bytes()
}

/// A single validator's signature over a canonical payload, verified before
/// being accepted into a collection.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, payload: &[u8], validator_id: &str, signature: &str) -> bool;
}

/// Accepts any well-formed hex signature. Stands in for a real ECDSA/ed25519
/// verifier hook; production deployments supply their own `SignatureVerifier`.
pub struct PermissiveVerifier;

impl SignatureVerifier for PermissiveVerifier {
    fn verify(&self, _payload: &[u8], _validator_id: &str, signature: &str) -> bool {
        !signature.is_empty() && hex::decode(signature).is_ok()
    }
}

/// Verifies an ECDSA (secp256k1, via k256) signature against the validator's
/// known public key.
pub struct EcdsaVerifier {
    pub public_keys: std::collections::HashMap<String, k256::ecdsa::VerifyingKey>,
}

impl SignatureVerifier for EcdsaVerifier {
    fn verify(&self, payload: &[u8], validator_id: &str, signature: &str) -> bool {
        use k256::ecdsa::signature::Verifier;
        use k256::ecdsa::Signature;

        let Some(key) = self.public_keys.get(validator_id) else {
            return false;
        };
        let Ok(sig_bytes) = hex::decode(signature) else {
            return false;
        };
        let Ok(sig) = Signature::from_slice(&sig_bytes) else {
            return false;
        };
        key.verify(payload, &sig).is_ok()
    }
}

/// Collects m-of-n validator signatures for each transfer independently.
pub struct MultiSigEngine {
    collections: Arc<DashMap<Uuid, SignatureCollection>>,
    verifier: Arc<dyn SignatureVerifier>,
}

impl MultiSigEngine {
    pub fn new(verifier: Arc<dyn SignatureVerifier>) -> Self {
        Self {
            collections: Arc::new(DashMap::new()),
            verifier,
        }
    }

    /// Opens a new signature collection for `transfer_id` against the given
    /// validator set, snapshotting the threshold at open time — later
    /// changes to the validator set elsewhere do not retroactively change
    /// the threshold for an already-open collection.
    pub fn open(&self, transfer_id: Uuid, validator_set: Vec<String>) -> BridgeResult<Uuid> {
        if validator_set.is_empty() {
            return Err(BridgeError::invalid_request("validator set must be non-empty"));
        }
        let threshold = threshold_for(validator_set.len());
        let collection = SignatureCollection {
            id: Uuid::new_v4(),
            transfer_id,
            validator_set,
            threshold,
            signatures: std::collections::HashMap::new(),
            status: ValidationStatus::Open,
            opened_at: Utc::now(),
            completed_at: None,
        };
        let id = collection.id;
        self.collections.insert(id, collection);
        Ok(id)
    }

    /// Opens a collection against the current active subset of `registry`,
    /// optionally overriding the derived `ceil(2n/3)` threshold per transfer
    /// as spec.md §4.3 permits.
    pub fn open_from_registry(
        &self,
        transfer_id: Uuid,
        registry: &ValidatorRegistry,
        required_override: Option<usize>,
    ) -> BridgeResult<Uuid> {
        let validator_set = registry.active_validator_ids();
        if validator_set.is_empty() {
            return Err(BridgeError::invalid_request("no active validators registered"));
        }
        let threshold = required_override.unwrap_or_else(|| threshold_for(validator_set.len()));
        let collection = SignatureCollection {
            id: Uuid::new_v4(),
            transfer_id,
            validator_set,
            threshold,
            signatures: std::collections::HashMap::new(),
            status: ValidationStatus::Open,
            opened_at: Utc::now(),
            completed_at: None,
        };
        let id = collection.id;
        self.collections.insert(id, collection);
        Ok(id)
    }

    /// Adds a validator's signature over `payload`, verifying it and
    /// deduplicating repeat submissions from the same validator.
    pub fn add_signature(
        &self,
        collection_id: Uuid,
        validator_id: &str,
        signature: &str,
        payload: &[u8],
    ) -> BridgeResult<bool> {
        let mut entry = self
            .collections
            .get_mut(&collection_id)
            .ok_or_else(|| BridgeError::not_found("signature_collection", collection_id.to_string()))?;

        if !entry.validator_set.iter().any(|v| v == validator_id) {
            return Err(BridgeError::invalid_signature(
                validator_id,
                "validator is not a member of this collection's validator set",
            ));
        }

        if !self.verifier.verify(payload, validator_id, signature) {
            return Err(BridgeError::invalid_signature(validator_id, "signature failed verification"));
        }

        entry.signatures.insert(validator_id.to_string(), signature.to_string());

        let threshold_just_met =
            entry.status == ValidationStatus::Open && entry.has_met_threshold();
        if threshold_just_met {
            entry.status = ValidationStatus::ThresholdMet;
            entry.completed_at = Some(Utc::now());
        }
        Ok(threshold_just_met)
    }

    pub fn status(&self, collection_id: Uuid) -> BridgeResult<SignatureCollection> {
        self.collections
            .get(&collection_id)
            .map(|e| e.clone())
            .ok_or_else(|| BridgeError::not_found("signature_collection", collection_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> MultiSigEngine {
        MultiSigEngine::new(Arc::new(PermissiveVerifier))
    }

    #[test]
    fn threshold_rounds_up() {
        assert_eq!(threshold_for(3), 2);
        assert_eq!(threshold_for(4), 3);
        assert_eq!(threshold_for(5), 4);
        assert_eq!(threshold_for(1), 1);
    }

    #[test]
    fn collection_reaches_threshold_once_enough_signatures_arrive() {
        let engine = engine();
        let transfer_id = Uuid::new_v4();
        let validators = vec!["v1".to_string(), "v2".to_string(), "v3".to_string()];
        let id = engine.open(transfer_id, validators).unwrap();
        let payload = b"payload";

        let met1 = engine.add_signature(id, "v1", "ab", payload).unwrap();
        assert!(!met1);
        let met2 = engine.add_signature(id, "v2", "cd", payload).unwrap();
        assert!(met2);

        let status = engine.status(id).unwrap();
        assert_eq!(status.status, ValidationStatus::ThresholdMet);
        assert!(status.completed_at.is_some());
    }

    #[test]
    fn duplicate_signature_from_same_validator_is_a_no_op() {
        let engine = engine();
        let validators = vec!["v1".to_string(), "v2".to_string(), "v3".to_string()];
        let id = engine.open(Uuid::new_v4(), validators).unwrap();
        let payload = b"payload";
        engine.add_signature(id, "v1", "ab", payload).unwrap();
        engine.add_signature(id, "v1", "ef", payload).unwrap();
        let status = engine.status(id).unwrap();
        assert_eq!(status.signatures.len(), 1);
        assert_eq!(status.signatures.get("v1").unwrap(), "ef");
    }

    #[test]
    fn non_member_validator_rejected() {
        let engine = engine();
        let id = engine
            .open(Uuid::new_v4(), vec!["v1".to_string(), "v2".to_string()])
            .unwrap();
        let result = engine.add_signature(id, "outsider", "ab", b"payload");
        assert!(result.is_err());
    }

    #[test]
    fn registry_threshold_tracks_active_set_on_next_open_only() {
        let registry = ValidatorRegistry::new();
        registry.register("v1", "pk1");
        registry.register("v2", "pk2");
        registry.register("v3", "pk3");
        assert_eq!(registry.total_active(), 3);
        assert_eq!(registry.default_threshold(), 2);

        let engine = engine();
        let first = engine.open_from_registry(Uuid::new_v4(), &registry, None).unwrap();
        assert_eq!(engine.status(first).unwrap().threshold, 2);

        registry.register("v4", "pk4");
        registry.set_active("v1", false).unwrap();
        assert_eq!(registry.total_active(), 3);

        // Already-open collection keeps its snapshotted threshold.
        assert_eq!(engine.status(first).unwrap().threshold, 2);

        let second = engine.open_from_registry(Uuid::new_v4(), &registry, None).unwrap();
        assert_eq!(engine.status(second).unwrap().threshold, 2);
        assert!(!engine.status(second).unwrap().validator_set.contains(&"v1".to_string()));
    }

    #[test]
    fn canonical_payload_is_deterministic() {
        let id = Uuid::new_v4();
        let p1 = canonical_signable_payload(
            id, "ethereum", "polygon", "0xa", "0xb", "USDC", Decimal::new(100, 0), 7,
        );
        let p2 = canonical_signable_payload(
            id, "ethereum", "polygon", "0xa", "0xb", "USDC", Decimal::new(100, 0), 7,
        );
        assert_eq!(p1, p2);
    }
}
