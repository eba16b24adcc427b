// =====================================================================================
// File: core-bridge/src/types.rs
// Description: Domain model for the cross-chain bridge coordination core
// Author: arkSong (arksong2018@gmail.com)
// =====================================================================================

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Chain identifier used across every module. Per-chain adapter
/// implementations live outside this crate, so chains are addressed by
/// name rather than a closed enum — new chains are onboarded by adding a
/// `ChainAdapter` and a policy entry, not by touching this type.
pub type ChainName = String;

/// Lifecycle of a bridge transfer. Wire-stable: these strings cross process
/// boundaries via serialization and must not be renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "CONFIRMING")]
    Confirming,
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "FAILED")]
    Failed,
    #[serde(rename = "REFUNDED")]
    Refunded,
}

impl TransferStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Refunded)
    }

    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirming => "CONFIRMING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
        }
    }
}

/// A single cross-chain transfer coordinated by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    pub id: Uuid,
    pub source_chain: ChainName,
    pub target_chain: ChainName,
    pub source_address: String,
    pub target_address: String,
    pub token_symbol: String,
    pub amount: Decimal,
    pub bridge_fee: Decimal,
    pub nonce: u64,
    pub status: TransferStatus,
    pub source_tx_hash: Option<String>,
    pub target_tx_hash: Option<String>,
    pub retry_count: u32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Transfer {
    pub fn new(
        source_chain: ChainName,
        target_chain: ChainName,
        source_address: String,
        target_address: String,
        token_symbol: String,
        amount: Decimal,
        bridge_fee: Decimal,
        nonce: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            source_chain,
            target_chain,
            source_address,
            target_address,
            token_symbol,
            amount,
            bridge_fee,
            nonce,
            status: TransferStatus::Pending,
            source_tx_hash: None,
            target_tx_hash: None,
            retry_count: 0,
            last_error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn net_amount(&self) -> Decimal {
        self.amount - self.bridge_fee
    }
}

/// Lifecycle of an HTLC atomic swap. Wire-stable names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapStatus {
    #[serde(rename = "INITIATED")]
    Initiated,
    #[serde(rename = "SOURCE_LOCKED")]
    SourceLocked,
    #[serde(rename = "BOTH_LOCKED")]
    BothLocked,
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "EXPIRED")]
    Expired,
    #[serde(rename = "REFUNDED")]
    Refunded,
    #[serde(rename = "FRAUD_DETECTED")]
    FraudDetected,
}

impl SwapStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Expired | Self::Refunded | Self::FraudDetected
        )
    }

    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Initiated => "INITIATED",
            Self::SourceLocked => "SOURCE_LOCKED",
            Self::BothLocked => "BOTH_LOCKED",
            Self::Completed => "COMPLETED",
            Self::Expired => "EXPIRED",
            Self::Refunded => "REFUNDED",
            Self::FraudDetected => "FRAUD_DETECTED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtomicSwap {
    pub id: Uuid,
    pub initiator_chain: ChainName,
    pub target_chain: ChainName,
    pub initiator_address: String,
    pub participant_address: String,
    pub amount: Decimal,
    pub hash_lock: String,
    pub secret: Option<String>,
    pub time_lock: DateTime<Utc>,
    pub status: SwapStatus,
    pub source_lock_tx: Option<String>,
    pub target_lock_tx: Option<String>,
    pub redeem_tx: Option<String>,
    pub refund_tx: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AtomicSwap {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.time_lock
    }
}

/// Fraud proof produced when a secret reveal on one chain is not matched by
/// the expected redemption on the other within the time lock window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudProof {
    pub swap_id: Uuid,
    pub source_chain: ChainName,
    pub target_chain: ChainName,
    pub amount: Decimal,
    pub hash_lock: String,
    pub evidence: Option<String>,
    pub digest: String,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of a validator signature collection backing one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationStatus {
    #[serde(rename = "OPEN")]
    Open,
    #[serde(rename = "THRESHOLD_MET")]
    ThresholdMet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureCollection {
    pub id: Uuid,
    pub transfer_id: Uuid,
    pub validator_set: Vec<String>,
    pub threshold: usize,
    pub signatures: HashMap<String, String>,
    pub status: ValidationStatus,
    pub opened_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SignatureCollection {
    pub fn has_met_threshold(&self) -> bool {
        self.signatures.len() >= self.threshold
    }
}

/// Lifecycle of a cross-chain message dispatched through the delivery tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "PROCESSING")]
    Processing,
    #[serde(rename = "DELIVERED")]
    Delivered,
    #[serde(rename = "FAILED")]
    Failed,
    #[serde(rename = "EXPIRED")]
    Expired,
}

impl MessageStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Failed | Self::Expired)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub source_chain: ChainName,
    pub target_chain: ChainName,
    pub nonce: u64,
    pub payload: Vec<u8>,
    pub status: MessageStatus,
    pub delivery_attempts: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
}

/// A member of the process-wide validator set backing multi-sig threshold
/// collection. Owned by the multi-sig engine's registry, not by any single
/// transfer or collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Validator {
    pub validator_id: String,
    pub public_key: String,
    pub active: bool,
}
