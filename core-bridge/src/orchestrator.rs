// =====================================================================================
// File: core-bridge/src/orchestrator.rs
// Description: Bridge transfer orchestrator — per-transfer state machine,
//              retry/backoff, fee and chain-limit policy enforcement.
// Author: arkSong (arksong2018@gmail.com)
// =====================================================================================

use crate::chain::ChainAdapter;
use crate::error::{BridgeError, BridgeResult};
use crate::policy::{bridge_fee, AddressRateLimiter, ChainLimits, TokenRegistry};
use crate::types::{Transfer, TransferStatus};
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_base: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1_000,
            max_delay_ms: 30_000,
            backoff_base: 2,
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff with a hard cap: `initial * base^attempt`, capped
    /// at `max_delay_ms`.
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        let scaled = self
            .initial_delay_ms
            .saturating_mul(self.backoff_base.saturating_pow(attempt));
        scaled.min(self.max_delay_ms)
    }

    /// Same as [`Self::delay_for_attempt`] with up to 20% random jitter added,
    /// so a burst of transfers failing at the same instant don't all retry
    /// on the same tick.
    pub fn delay_with_jitter(&self, attempt: u32) -> u64 {
        use rand::Rng;
        let base = self.delay_for_attempt(attempt);
        let jitter_span = base / 5;
        if jitter_span == 0 {
            return base;
        }
        base + rand::thread_rng().gen_range(0..=jitter_span)
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub retry_policy: RetryPolicy,
    pub chain_limits: ChainLimits,
    pub token_registry: TokenRegistry,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            retry_policy: RetryPolicy::default(),
            chain_limits: ChainLimits::default(),
            token_registry: TokenRegistry::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrchestratorStatistics {
    pub total_initiated: u64,
    pub total_completed: u64,
    pub total_failed: u64,
    pub total_refunded: u64,
    pub total_pending: u64,
    pub total_volume: Decimal,
    pub success_rate: Decimal,
    pub avg_completion_seconds: f64,
}

/// Coordinates the full lifecycle of a bridge transfer: submission,
/// chain/token/amount validation, fee computation, source-chain confirmation
/// tracking, and the retry loop that drives PENDING back from a transient
/// failure instead of dropping straight to FAILED.
pub struct BridgeOrchestrator {
    transfers: Arc<DashMap<Uuid, Transfer>>,
    adapters: Arc<DashMap<String, Arc<dyn ChainAdapter>>>,
    config: OrchestratorConfig,
    rate_limiter: AddressRateLimiter,
    stats: Arc<Stats>,
}

#[derive(Default)]
struct Stats {
    initiated: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    refunded: AtomicU64,
}

impl BridgeOrchestrator {
    pub fn new(config: OrchestratorConfig) -> Self {
        Self {
            transfers: Arc::new(DashMap::new()),
            adapters: Arc::new(DashMap::new()),
            config,
            rate_limiter: AddressRateLimiter::new(),
            stats: Arc::new(Stats::default()),
        }
    }

    pub fn register_adapter(&self, adapter: Arc<dyn ChainAdapter>) {
        self.adapters.insert(adapter.chain_id().to_string(), adapter);
    }

    pub fn estimate_fee(&self, amount: Decimal) -> Decimal {
        bridge_fee(amount)
    }

    /// Full fee quote: bridge fee (0.1% of amount, this crate's own cut),
    /// gas fee (supplied by the target-chain adapter), and their sum. Falls
    /// back to zero gas when no adapter is registered for `target_chain` —
    /// callers quoting a chain before its adapter comes online still get a
    /// usable bridge-fee number.
    pub async fn estimate_fee_breakdown(
        &self,
        target_chain: &str,
        token_symbol: &str,
        amount: Decimal,
    ) -> (Decimal, Decimal, Decimal) {
        let bridge = bridge_fee(amount);
        let gas = match self.adapter_for(target_chain) {
            Ok(adapter) => adapter
                .estimate_fee(token_symbol, amount)
                .await
                .unwrap_or(Decimal::ZERO),
            Err(_) => Decimal::ZERO,
        };
        (bridge, gas, bridge + gas)
    }

    /// Validates the request against chain/token/rate-limit policy, opens a
    /// PENDING transfer, and returns it. Does not itself call out to any
    /// chain adapter — source-chain locking happens in `advance`.
    pub fn initiate_bridge(
        &self,
        source_chain: String,
        target_chain: String,
        source_address: String,
        target_address: String,
        token_symbol: String,
        amount: Decimal,
        nonce: u64,
    ) -> BridgeResult<Transfer> {
        if source_chain == target_chain {
            return Err(BridgeError::invalid_request(
                "source and target chain must differ",
            ));
        }
        self.rate_limiter.check(&source_address)?;
        self.config.chain_limits.check(&source_chain, amount)?;
        self.config.chain_limits.check(&target_chain, amount)?;
        self.config.token_registry.check_amount(&token_symbol, amount)?;

        let fee = bridge_fee(amount);
        let transfer = Transfer::new(
            source_chain,
            target_chain,
            source_address,
            target_address,
            token_symbol,
            amount,
            fee,
            nonce,
        );
        self.transfers.insert(transfer.id, transfer.clone());
        self.stats.initiated.fetch_add(1, Ordering::Relaxed);
        tracing::info!(transfer_id = %transfer.id, amount = %amount, "transfer initiated");
        Ok(transfer)
    }

    /// Drives PENDING -> CONFIRMING by submitting the source-chain
    /// transaction through the registered adapter.
    pub async fn advance_to_confirming(&self, transfer_id: Uuid) -> BridgeResult<()> {
        let (source_chain, source_address, target_address, token_symbol, net_amount) = {
            let entry = self.get_entry(transfer_id)?;
            if entry.status != TransferStatus::Pending {
                return Err(BridgeError::precondition_failed(format!(
                    "transfer {transfer_id} is {:?}, expected PENDING",
                    entry.status
                )));
            }
            (
                entry.source_chain.clone(),
                entry.source_address.clone(),
                entry.target_address.clone(),
                entry.token_symbol.clone(),
                entry.net_amount(),
            )
        };

        let adapter = self.adapter_for(&source_chain)?;
        let result = adapter
            .send_transaction(&source_address, &target_address, &token_symbol, net_amount)
            .await;

        let mut entry = self.get_entry_mut(transfer_id)?;
        match result {
            Ok(submitted) => {
                entry.source_tx_hash = Some(submitted.hash);
                entry.status = TransferStatus::Confirming;
                entry.updated_at = Utc::now();
                Ok(())
            }
            Err(err) => self.record_failure(&mut entry, err),
        }
    }

    /// Drives CONFIRMING -> COMPLETED once the target-chain execution lands,
    /// or retries/fails depending on whether the underlying error is
    /// transient.
    pub async fn complete_transfer(&self, transfer_id: Uuid, target_tx_hash: &str) -> BridgeResult<()> {
        let mut entry = self.get_entry_mut(transfer_id)?;
        if entry.status != TransferStatus::Confirming {
            return Err(BridgeError::precondition_failed(format!(
                "transfer {transfer_id} is {:?}, expected CONFIRMING",
                entry.status
            )));
        }
        entry.target_tx_hash = Some(target_tx_hash.to_string());
        entry.status = TransferStatus::Completed;
        entry.completed_at = Some(Utc::now());
        entry.updated_at = Utc::now();
        self.stats.completed.fetch_add(1, Ordering::Relaxed);
        tracing::info!(transfer_id = %transfer_id, "transfer completed");
        Ok(())
    }

    /// Retries a FAILED transfer by moving it back to PENDING, bumping the
    /// retry counter, as long as the recorded error was retryable and the
    /// attempt budget is not exhausted.
    pub fn retry(&self, transfer_id: Uuid) -> BridgeResult<u64> {
        let mut entry = self.get_entry_mut(transfer_id)?;
        if entry.status != TransferStatus::Failed {
            return Err(BridgeError::precondition_failed(format!(
                "transfer {transfer_id} is {:?}, expected FAILED",
                entry.status
            )));
        }
        if entry.retry_count >= self.config.retry_policy.max_attempts {
            return Err(BridgeError::precondition_failed(
                "retry attempts exhausted",
            ));
        }
        entry.status = TransferStatus::Pending;
        entry.retry_count += 1;
        entry.updated_at = Utc::now();
        Ok(self.config.retry_policy.delay_with_jitter(entry.retry_count))
    }

    /// Refunds a transfer that is FAILED with its retry budget exhausted.
    /// Completed transfers can never be refunded.
    pub fn refund_transfer(&self, transfer_id: Uuid) -> BridgeResult<()> {
        let mut entry = self.get_entry_mut(transfer_id)?;
        if entry.status != TransferStatus::Failed {
            return Err(BridgeError::precondition_failed(format!(
                "transfer {transfer_id} is {:?}, only FAILED transfers can be refunded",
                entry.status
            )));
        }
        if entry.retry_count < self.config.retry_policy.max_attempts {
            return Err(BridgeError::precondition_failed(
                "refund requires retry attempts to be exhausted first",
            ));
        }
        entry.status = TransferStatus::Refunded;
        entry.updated_at = Utc::now();
        self.stats.refunded.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn get_transfer(&self, transfer_id: Uuid) -> BridgeResult<Transfer> {
        self.get_entry(transfer_id).map(|e| e.clone())
    }

    /// Transfers where `address` is either the source or the target,
    /// newest first.
    pub fn list_transfers_for_address(&self, address: &str) -> Vec<Transfer> {
        let mut matches: Vec<Transfer> = self
            .transfers
            .iter()
            .filter(|e| e.source_address == address || e.target_address == address)
            .map(|e| e.clone())
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matches
    }

    pub fn statistics(&self) -> OrchestratorStatistics {
        let total_initiated = self.stats.initiated.load(Ordering::Relaxed);
        let total_completed = self.stats.completed.load(Ordering::Relaxed);
        let total_failed = self.stats.failed.load(Ordering::Relaxed);
        let total_refunded = self.stats.refunded.load(Ordering::Relaxed);

        let mut total_volume = Decimal::ZERO;
        let mut total_pending = 0u64;
        let mut completion_seconds_sum = 0f64;
        let mut completed_seen = 0u64;
        for entry in self.transfers.iter() {
            total_volume += entry.amount;
            if matches!(entry.status, TransferStatus::Pending | TransferStatus::Confirming) {
                total_pending += 1;
            }
            if let Some(completed_at) = entry.completed_at {
                completion_seconds_sum += (completed_at - entry.created_at).num_milliseconds() as f64 / 1000.0;
                completed_seen += 1;
            }
        }

        let success_rate = if total_initiated > 0 {
            Decimal::new(total_completed as i64, 0) / Decimal::new(total_initiated as i64, 0)
        } else {
            Decimal::ZERO
        };
        let avg_completion_seconds = if completed_seen > 0 {
            completion_seconds_sum / completed_seen as f64
        } else {
            0.0
        };

        OrchestratorStatistics {
            total_initiated,
            total_completed,
            total_failed,
            total_refunded,
            total_pending,
            total_volume,
            success_rate,
            avg_completion_seconds,
        }
    }

    fn record_failure(
        &self,
        entry: &mut dashmap::mapref::one::RefMut<'_, Uuid, Transfer>,
        err: BridgeError,
    ) -> BridgeResult<()> {
        entry.status = TransferStatus::Failed;
        entry.last_error = Some(err.to_string());
        entry.updated_at = Utc::now();
        self.stats.failed.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(transfer_id = %entry.id, error = %err, retryable = err.is_retryable(), "transfer failed");
        Err(err)
    }

    fn adapter_for(&self, chain: &str) -> BridgeResult<Arc<dyn ChainAdapter>> {
        self.adapters
            .get(chain)
            .map(|e| e.clone())
            .ok_or_else(|| BridgeError::unsupported_chain(chain))
    }

    fn get_entry(&self, transfer_id: Uuid) -> BridgeResult<dashmap::mapref::one::Ref<'_, Uuid, Transfer>> {
        self.transfers
            .get(&transfer_id)
            .ok_or_else(|| BridgeError::not_found("transfer", transfer_id.to_string()))
    }

    fn get_entry_mut(&self, transfer_id: Uuid) -> BridgeResult<dashmap::mapref::one::RefMut<'_, Uuid, Transfer>> {
        self.transfers
            .get_mut(&transfer_id)
            .ok_or_else(|| BridgeError::not_found("transfer", transfer_id.to_string()))
    }
}

/// Last-known nonce per source address, used by callers that want strictly
/// increasing nonces without delegating nonce assignment to this crate.
#[derive(Default)]
pub struct NonceTracker {
    last: HashMap<String, u64>,
}

impl NonceTracker {
    pub fn next(&mut self, source_address: &str) -> u64 {
        let next = self.last.get(source_address).map(|n| n + 1).unwrap_or(0);
        self.last.insert(source_address.to_string(), next);
        next
    }
}
