// =====================================================================================
// File: core-bridge/src/lib.rs
// Description: Cross-chain bridge coordination core for the StableRWA platform
// Author: arkSong (arksong2018@gmail.com)
// =====================================================================================

//! # Core Bridge Module
//!
//! Coordination core for a cross-chain asset bridge: a transfer
//! orchestrator, an HTLC atomic swap engine, a multi-signature validator
//! threshold engine, and a cross-chain message queue and delivery tracker,
//! all built against a single abstract [`chain::ChainAdapter`] contract.
//! Per-chain adapter implementations are a host concern, not part of this
//! crate.

pub mod atomic_swap;
pub mod chain;
pub mod error;
pub mod multisig;
pub mod orchestrator;
pub mod policy;
pub mod queue;
pub mod service;
pub mod types;

pub use atomic_swap::{AtomicSwapConfig, AtomicSwapEngine};
pub use chain::{
    AddressValidation, ChainAdapter, ChainInfo, ChainTxStatus, ConfirmationOutcome,
    SubmittedTransaction,
};
pub use error::{BridgeError, BridgeResult};
pub use multisig::{MultiSigEngine, SignatureVerifier, ValidatorRegistry};
pub use orchestrator::{BridgeOrchestrator, OrchestratorConfig, RetryPolicy};
pub use policy::{ChainLimits, TokenRegistry};
pub use queue::{MessageQueue, QueueConfig};
pub use service::{BridgeHealthStatus, BridgeService, BridgeStatistics};
pub use types::{
    AtomicSwap, FraudProof, Message, MessageStatus, SignatureCollection, SwapStatus, Transfer,
    TransferStatus, ValidationStatus, Validator,
};

/// Aggregates every subsystem's configuration, mirroring how the teacher's
/// `BridgeServiceConfig` gathers `TransferConfig`/`LiquidityConfig`/etc.
/// Loading these values from files or environment variables is a host
/// concern; this struct only carries the shape and the defaults.
#[derive(Debug, Clone)]
pub struct BridgeServiceConfig {
    pub orchestrator: orchestrator::OrchestratorConfig,
    pub atomic_swap: atomic_swap::AtomicSwapConfig,
    pub queue: queue::QueueConfig,
}

impl Default for BridgeServiceConfig {
    fn default() -> Self {
        Self {
            orchestrator: orchestrator::OrchestratorConfig::default(),
            atomic_swap: atomic_swap::AtomicSwapConfig::default(),
            queue: queue::QueueConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_carries_spec_constants() {
        let config = BridgeServiceConfig::default();
        assert_eq!(config.atomic_swap.default_timelock_hours, 24);
        assert_eq!(config.queue.max_delivery_attempts, 5);
    }
}
