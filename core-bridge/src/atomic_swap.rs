// =====================================================================================
// File: core-bridge/src/atomic_swap.rs
// Description: Hash-time-locked atomic swap engine
// Author: arkSong (arksong2018@gmail.com)
// =====================================================================================

use crate::error::{BridgeError, BridgeResult};
use crate::types::{AtomicSwap, FraudProof, SwapStatus};
use chrono::{Duration, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AtomicSwapConfig {
    pub default_timelock_hours: i64,
    pub min_timelock_hours: i64,
    pub max_timelock_hours: i64,
}

impl Default for AtomicSwapConfig {
    fn default() -> Self {
        Self {
            default_timelock_hours: 24,
            min_timelock_hours: 1,
            max_timelock_hours: 168,
        }
    }
}

/// 32 random bytes, hex-encoded. Never logged or persisted until revealed.
pub fn generate_secret() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let secret: [u8; 32] = rng.gen();
    hex::encode(secret)
}

/// SHA-256 of the secret's hex-encoded ASCII bytes, lowercase hex.
pub fn generate_hash_lock(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn verify_hash_lock(hash_lock: &str, secret: &str) -> bool {
    generate_hash_lock(secret) == hash_lock
}

/// HTLC atomic swap engine. INITIATED -> SOURCE_LOCKED -> BOTH_LOCKED ->
/// COMPLETED, with EXPIRED/REFUNDED on timeout and FRAUD_DETECTED when a
/// secret reveal is not matched by the expected counter-redemption before
/// the time lock elapses.
pub struct AtomicSwapEngine {
    swaps: Arc<DashMap<Uuid, AtomicSwap>>,
    fraud_proofs: Arc<DashMap<Uuid, FraudProof>>,
    config: AtomicSwapConfig,
}

/// Canonical digest input over `(swap_id, source_chain, target_chain,
/// amount, hashlock, evidence)`, per spec.md §6's fraud-proof digest layout.
/// Evidence is embedded verbatim so the proof is self-contained and two
/// stores of the same inputs never disagree.
fn fraud_proof_digest(swap: &AtomicSwap, evidence: Option<&str>) -> String {
    let digest_input = format!(
        "{}|{}|{}|{}|{}|{}",
        swap.id,
        swap.initiator_chain,
        swap.target_chain,
        swap.amount,
        swap.hash_lock,
        evidence.unwrap_or("")
    );
    let mut hasher = Sha256::new();
    hasher.update(digest_input.as_bytes());
    hex::encode(hasher.finalize())
}

impl AtomicSwapEngine {
    pub fn new(config: AtomicSwapConfig) -> Self {
        Self {
            swaps: Arc::new(DashMap::new()),
            fraud_proofs: Arc::new(DashMap::new()),
            config,
        }
    }

    pub fn initiate_swap(
        &self,
        initiator_chain: String,
        target_chain: String,
        initiator_address: String,
        participant_address: String,
        amount: Decimal,
        timelock_hours: Option<i64>,
    ) -> BridgeResult<(Uuid, String)> {
        if initiator_chain == target_chain {
            return Err(BridgeError::invalid_request(
                "initiator and target chain must differ",
            ));
        }
        if amount <= Decimal::ZERO {
            return Err(BridgeError::invalid_request("amount must be positive"));
        }
        let hours = timelock_hours.unwrap_or(self.config.default_timelock_hours);
        if hours < self.config.min_timelock_hours || hours > self.config.max_timelock_hours {
            return Err(BridgeError::invalid_request(format!(
                "timelock {hours}h outside [{}, {}]h",
                self.config.min_timelock_hours, self.config.max_timelock_hours
            )));
        }

        let secret = generate_secret();
        let hash_lock = generate_hash_lock(&secret);
        let now = Utc::now();
        let swap = AtomicSwap {
            id: Uuid::new_v4(),
            initiator_chain,
            target_chain,
            initiator_address,
            participant_address,
            amount,
            hash_lock: hash_lock.clone(),
            secret: Some(secret.clone()),
            time_lock: now + Duration::hours(hours),
            status: SwapStatus::Initiated,
            source_lock_tx: None,
            target_lock_tx: None,
            redeem_tx: None,
            refund_tx: None,
            created_at: now,
            updated_at: now,
        };
        let id = swap.id;
        self.swaps.insert(id, swap);
        tracing::info!(swap_id = %id, hash_lock = %hash_lock, "swap initiated");
        Ok((id, secret))
    }

    pub fn lock_source(&self, swap_id: Uuid, tx_hash: &str) -> BridgeResult<()> {
        self.transition(swap_id, SwapStatus::Initiated, SwapStatus::SourceLocked, |swap| {
            swap.source_lock_tx = Some(tx_hash.to_string());
        })
    }

    pub fn lock_target(&self, swap_id: Uuid, tx_hash: &str) -> BridgeResult<()> {
        self.transition(swap_id, SwapStatus::SourceLocked, SwapStatus::BothLocked, |swap| {
            swap.target_lock_tx = Some(tx_hash.to_string());
        })
    }

    /// Redeems the swap once the secret is revealed on-chain, verifying it
    /// against the stored hash lock before completing.
    pub fn complete_swap(&self, swap_id: Uuid, revealed_secret: &str, redeem_tx: &str) -> BridgeResult<()> {
        let mut entry = self
            .swaps
            .get_mut(&swap_id)
            .ok_or_else(|| BridgeError::not_found("atomic_swap", swap_id.to_string()))?;

        if entry.status != SwapStatus::BothLocked {
            return Err(BridgeError::precondition_failed(format!(
                "swap {swap_id} is {:?}, expected BOTH_LOCKED",
                entry.status
            )));
        }
        if entry.is_expired() {
            return Err(BridgeError::precondition_failed("time lock has already expired"));
        }
        if !verify_hash_lock(&entry.hash_lock, revealed_secret) {
            let evidence = format!("secret reveal did not match hashlock: {revealed_secret}");
            let digest = fraud_proof_digest(&entry, Some(&evidence));
            let proof = FraudProof {
                swap_id: entry.id,
                source_chain: entry.initiator_chain.clone(),
                target_chain: entry.target_chain.clone(),
                amount: entry.amount,
                hash_lock: entry.hash_lock.clone(),
                evidence: Some(evidence),
                digest,
                created_at: Utc::now(),
            };
            self.fraud_proofs.insert(swap_id, proof);

            entry.status = SwapStatus::FraudDetected;
            entry.updated_at = Utc::now();
            tracing::warn!(swap_id = %swap_id, "swap secret mismatch, fraud detected");
            return Err(BridgeError::invalid_secret(entry.hash_lock.clone()));
        }

        entry.secret = Some(revealed_secret.to_string());
        entry.redeem_tx = Some(redeem_tx.to_string());
        entry.status = SwapStatus::Completed;
        entry.updated_at = Utc::now();
        tracing::info!(swap_id = %swap_id, "swap completed");
        Ok(())
    }

    /// Refunds a swap past its time lock that never reached COMPLETED.
    pub fn refund_swap(&self, swap_id: Uuid, refund_tx: &str) -> BridgeResult<()> {
        let mut entry = self
            .swaps
            .get_mut(&swap_id)
            .ok_or_else(|| BridgeError::not_found("atomic_swap", swap_id.to_string()))?;

        if entry.status.is_terminal() {
            return Err(BridgeError::precondition_failed(format!(
                "swap {swap_id} already terminal ({:?})",
                entry.status
            )));
        }
        if !entry.is_expired() {
            return Err(BridgeError::precondition_failed("time lock has not expired yet"));
        }

        entry.refund_tx = Some(refund_tx.to_string());
        entry.status = SwapStatus::Refunded;
        entry.updated_at = Utc::now();
        Ok(())
    }

    /// Marks a swap in BOTH_LOCKED past its time lock as expired without a
    /// refund transaction recorded yet (refund is a separate, later step).
    pub fn expire_if_due(&self, swap_id: Uuid) -> BridgeResult<bool> {
        let mut entry = self
            .swaps
            .get_mut(&swap_id)
            .ok_or_else(|| BridgeError::not_found("atomic_swap", swap_id.to_string()))?;
        if entry.status.is_terminal() || !entry.is_expired() {
            return Ok(false);
        }
        entry.status = SwapStatus::Expired;
        entry.updated_at = Utc::now();
        Ok(true)
    }

    /// Builds the canonical fraud-proof digest and records it, moving the
    /// swap to FRAUD_DETECTED. Evidence is embedded verbatim, not stored by
    /// reference, so the proof remains self-contained.
    pub fn generate_fraud_proof(&self, swap_id: Uuid, evidence: Option<String>) -> BridgeResult<FraudProof> {
        let mut entry = self
            .swaps
            .get_mut(&swap_id)
            .ok_or_else(|| BridgeError::not_found("atomic_swap", swap_id.to_string()))?;

        let digest = fraud_proof_digest(&entry, evidence.as_deref());
        entry.status = SwapStatus::FraudDetected;
        entry.updated_at = Utc::now();

        let proof = FraudProof {
            swap_id: entry.id,
            source_chain: entry.initiator_chain.clone(),
            target_chain: entry.target_chain.clone(),
            amount: entry.amount,
            hash_lock: entry.hash_lock.clone(),
            evidence,
            digest,
            created_at: Utc::now(),
        };
        self.fraud_proofs.insert(swap_id, proof.clone());
        Ok(proof)
    }

    pub fn verify_fraud_proof(&self, proof: &FraudProof) -> bool {
        let digest_input = format!(
            "{}|{}|{}|{}|{}|{}",
            proof.swap_id,
            proof.source_chain,
            proof.target_chain,
            proof.amount,
            proof.hash_lock,
            proof.evidence.as_deref().unwrap_or("")
        );
        let mut hasher = Sha256::new();
        hasher.update(digest_input.as_bytes());
        hex::encode(hasher.finalize()) == proof.digest
    }

    /// The fraud proof recorded against a swap, if one was ever generated
    /// (either via a failed `complete_swap` reveal or an explicit
    /// `generate_fraud_proof` call).
    pub fn get_fraud_proof(&self, swap_id: Uuid) -> BridgeResult<FraudProof> {
        self.fraud_proofs
            .get(&swap_id)
            .map(|e| e.clone())
            .ok_or_else(|| BridgeError::not_found("fraud_proof", swap_id.to_string()))
    }

    pub fn get_swap(&self, swap_id: Uuid) -> BridgeResult<AtomicSwap> {
        self.swaps
            .get(&swap_id)
            .map(|e| e.clone())
            .ok_or_else(|| BridgeError::not_found("atomic_swap", swap_id.to_string()))
    }

    fn transition(
        &self,
        swap_id: Uuid,
        expected: SwapStatus,
        next: SwapStatus,
        mutate: impl FnOnce(&mut AtomicSwap),
    ) -> BridgeResult<()> {
        let mut entry = self
            .swaps
            .get_mut(&swap_id)
            .ok_or_else(|| BridgeError::not_found("atomic_swap", swap_id.to_string()))?;
        if entry.status != expected {
            return Err(BridgeError::precondition_failed(format!(
                "swap {swap_id} is {:?}, expected {:?}",
                entry.status, expected
            )));
        }
        if entry.is_expired() {
            return Err(BridgeError::precondition_failed("time lock has already expired"));
        }
        mutate(&mut entry);
        entry.status = next;
        entry.updated_at = Utc::now();
        Ok(())
    }
}

pub fn time_remaining(swap: &AtomicSwap) -> Option<chrono::Duration> {
    let remaining = swap.time_lock - Utc::now();
    if remaining > Duration::zero() {
        Some(remaining)
    } else {
        None
    }
}
