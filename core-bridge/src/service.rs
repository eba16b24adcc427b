// =====================================================================================
// File: core-bridge/src/service.rs
// Description: Top-level bridge service wiring the orchestrator, swap
//              engine, multi-sig engine, and message queue together.
// Author: arkSong (arksong2018@gmail.com)
// =====================================================================================

use crate::atomic_swap::AtomicSwapEngine;
use crate::error::{BridgeError, BridgeResult};
use crate::multisig::MultiSigEngine;
use crate::orchestrator::{BridgeOrchestrator, OrchestratorStatistics};
use crate::queue::MessageQueue;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Aggregated statistics across all four subsystems, surfaced for
/// dashboards and operational tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeStatistics {
    pub total_transfers_initiated: u64,
    pub total_transfers_completed: u64,
    pub total_transfers_failed: u64,
    pub total_transfers_refunded: u64,
    pub total_transfers_pending: u64,
    pub total_volume: Decimal,
    pub success_rate: Decimal,
    pub avg_completion_seconds: f64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeHealthStatus {
    pub overall_status: String,
    pub orchestrator: String,
    pub atomic_swap_engine: String,
    pub multisig_engine: String,
    pub message_queue: String,
    pub emergency_pause_active: bool,
    pub last_check: DateTime<Utc>,
}

/// Composition root over the four coordination subsystems.
pub struct BridgeService {
    pub orchestrator: Arc<BridgeOrchestrator>,
    pub atomic_swap_engine: Arc<AtomicSwapEngine>,
    pub multisig_engine: Arc<MultiSigEngine>,
    pub message_queue: Arc<MessageQueue>,
    emergency_pause: Arc<AtomicBool>,
}

impl BridgeService {
    pub fn new(
        orchestrator: Arc<BridgeOrchestrator>,
        atomic_swap_engine: Arc<AtomicSwapEngine>,
        multisig_engine: Arc<MultiSigEngine>,
        message_queue: Arc<MessageQueue>,
    ) -> Self {
        Self {
            orchestrator,
            atomic_swap_engine,
            multisig_engine,
            message_queue,
            emergency_pause: Arc::new(AtomicBool::new(false)),
        }
    }

    /// While paused, transfer and swap initiation reject with
    /// `BridgeError::BridgePaused`; in-flight work is left untouched.
    pub fn emergency_pause(&self, reason: &str) {
        self.emergency_pause.store(true, Ordering::SeqCst);
        tracing::warn!(reason, "bridge emergency pause engaged");
    }

    pub fn resume_operations(&self) {
        self.emergency_pause.store(false, Ordering::SeqCst);
        tracing::info!("bridge operations resumed");
    }

    pub fn is_paused(&self) -> bool {
        self.emergency_pause.load(Ordering::SeqCst)
    }

    pub fn check_not_paused(&self) -> BridgeResult<()> {
        if self.is_paused() {
            return Err(BridgeError::bridge_paused("emergency pause is active"));
        }
        Ok(())
    }

    pub fn get_statistics(&self) -> BridgeStatistics {
        let OrchestratorStatistics {
            total_initiated,
            total_completed,
            total_failed,
            total_refunded,
            total_pending,
            total_volume,
            success_rate,
            avg_completion_seconds,
        } = self.orchestrator.statistics();
        BridgeStatistics {
            total_transfers_initiated: total_initiated,
            total_transfers_completed: total_completed,
            total_transfers_failed: total_failed,
            total_transfers_refunded: total_refunded,
            total_transfers_pending: total_pending,
            total_volume,
            success_rate,
            avg_completion_seconds,
            last_updated: Utc::now(),
        }
    }

    /// Full fee quote for a prospective transfer: bridge fee, adapter-quoted
    /// gas fee, and their sum.
    pub async fn estimate_fee(
        &self,
        target_chain: &str,
        token_symbol: &str,
        amount: Decimal,
    ) -> (Decimal, Decimal, Decimal) {
        self.orchestrator
            .estimate_fee_breakdown(target_chain, token_symbol, amount)
            .await
    }

    pub fn comprehensive_health_check(&self) -> BridgeHealthStatus {
        let paused = self.is_paused();
        let overall = if paused { "degraded" } else { "healthy" };
        BridgeHealthStatus {
            overall_status: overall.to_string(),
            orchestrator: "healthy".to_string(),
            atomic_swap_engine: "healthy".to_string(),
            multisig_engine: "healthy".to_string(),
            message_queue: "healthy".to_string(),
            emergency_pause_active: paused,
            last_check: Utc::now(),
        }
    }
}
