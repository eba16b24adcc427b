// =====================================================================================
// File: core-bridge/src/error.rs
// Description: Error taxonomy for the cross-chain bridge coordination core
// Author: arkSong (arksong2018@gmail.com)
// =====================================================================================

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias used throughout this crate.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Severity bucket attached to every error kind, used by callers deciding
/// whether to page someone or just log and move on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// All failure modes surfaced by the orchestrator, the swap engine, the
/// multi-sig engine, and the message queue.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum BridgeError {
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("unsupported chain: {chain}")]
    UnsupportedChain { chain: String },

    #[error("{limit_type} limit exceeded: amount {amount} > limit {limit}")]
    LimitExceeded {
        limit_type: String,
        amount: String,
        limit: String,
    },

    #[error("rate limit exceeded for {source}, retry after {reset_seconds}s")]
    RateLimited { source: String, reset_seconds: u64 },

    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: String },

    #[error("precondition failed: {message}")]
    PreconditionFailed { message: String },

    #[error("replay detected: nonce {nonce} already seen for {scope}")]
    ReplayDetected { scope: String, nonce: u64 },

    #[error("invalid signature from validator {validator_id}: {message}")]
    InvalidSignature {
        validator_id: String,
        message: String,
    },

    #[error("invalid secret for hashlock {hash_lock}")]
    InvalidSecret { hash_lock: String },

    #[error("adapter error on {chain} (transient): {message}")]
    AdapterTransient { chain: String, message: String },

    #[error("adapter error on {chain} (terminal): {message}")]
    AdapterTerminal { chain: String, message: String },

    #[error("bridge is paused: {reason}")]
    BridgePaused { reason: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl BridgeError {
    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn unsupported_chain<S: Into<String>>(chain: S) -> Self {
        Self::UnsupportedChain {
            chain: chain.into(),
        }
    }

    pub fn limit_exceeded<S: Into<String>>(limit_type: S, amount: String, limit: String) -> Self {
        Self::LimitExceeded {
            limit_type: limit_type.into(),
            amount,
            limit,
        }
    }

    pub fn rate_limited<S: Into<String>>(source: S, reset_seconds: u64) -> Self {
        Self::RateLimited {
            source: source.into(),
            reset_seconds,
        }
    }

    pub fn not_found<A: Into<String>, B: Into<String>>(entity: A, id: B) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn precondition_failed<S: Into<String>>(message: S) -> Self {
        Self::PreconditionFailed {
            message: message.into(),
        }
    }

    pub fn replay_detected<S: Into<String>>(scope: S, nonce: u64) -> Self {
        Self::ReplayDetected {
            scope: scope.into(),
            nonce,
        }
    }

    pub fn invalid_signature<A: Into<String>, B: Into<String>>(validator_id: A, message: B) -> Self {
        Self::InvalidSignature {
            validator_id: validator_id.into(),
            message: message.into(),
        }
    }

    pub fn invalid_secret<S: Into<String>>(hash_lock: S) -> Self {
        Self::InvalidSecret {
            hash_lock: hash_lock.into(),
        }
    }

    pub fn adapter_transient<A: Into<String>, B: Into<String>>(chain: A, message: B) -> Self {
        Self::AdapterTransient {
            chain: chain.into(),
            message: message.into(),
        }
    }

    pub fn adapter_terminal<A: Into<String>, B: Into<String>>(chain: A, message: B) -> Self {
        Self::AdapterTerminal {
            chain: chain.into(),
            message: message.into(),
        }
    }

    pub fn bridge_paused<S: Into<String>>(reason: S) -> Self {
        Self::BridgePaused {
            reason: reason.into(),
        }
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Errors the orchestrator's retry loop should back off and retry on.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BridgeError::AdapterTransient { .. } | BridgeError::Internal { .. }
        )
    }

    pub fn category(&self) -> &'static str {
        match self {
            BridgeError::InvalidRequest { .. } => "validation",
            BridgeError::UnsupportedChain { .. } => "validation",
            BridgeError::LimitExceeded { .. } => "policy",
            BridgeError::RateLimited { .. } => "policy",
            BridgeError::NotFound { .. } => "lookup",
            BridgeError::PreconditionFailed { .. } => "state",
            BridgeError::ReplayDetected { .. } => "security",
            BridgeError::InvalidSignature { .. } => "security",
            BridgeError::InvalidSecret { .. } => "security",
            BridgeError::AdapterTransient { .. } => "adapter",
            BridgeError::AdapterTerminal { .. } => "adapter",
            BridgeError::BridgePaused { .. } => "operations",
            BridgeError::Internal { .. } => "internal",
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            BridgeError::InvalidRequest { .. }
            | BridgeError::UnsupportedChain { .. }
            | BridgeError::NotFound { .. } => ErrorSeverity::Low,
            BridgeError::LimitExceeded { .. }
            | BridgeError::RateLimited { .. }
            | BridgeError::PreconditionFailed { .. }
            | BridgeError::AdapterTransient { .. } => ErrorSeverity::Medium,
            BridgeError::InvalidSignature { .. }
            | BridgeError::InvalidSecret { .. }
            | BridgeError::AdapterTerminal { .. }
            | BridgeError::BridgePaused { .. } => ErrorSeverity::High,
            BridgeError::ReplayDetected { .. } | BridgeError::Internal { .. } => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            BridgeError::InvalidRequest { .. }
                | BridgeError::UnsupportedChain { .. }
                | BridgeError::LimitExceeded { .. }
                | BridgeError::RateLimited { .. }
                | BridgeError::NotFound { .. }
                | BridgeError::PreconditionFailed { .. }
        )
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::internal(format!("serialization error: {err}"))
    }
}

impl From<reqwest::Error> for BridgeError {
    fn from(err: reqwest::Error) -> Self {
        BridgeError::adapter_transient("unknown", err.to_string())
    }
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for BridgeError {
    fn from(err: sqlx::Error) -> Self {
        BridgeError::internal(format!("database error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors_match_adapter_transient_and_internal() {
        assert!(BridgeError::adapter_transient("ethereum", "timeout").is_retryable());
        assert!(BridgeError::internal("unexpected state").is_retryable());
        assert!(!BridgeError::invalid_request("bad amount").is_retryable());
        assert!(!BridgeError::adapter_terminal("ethereum", "contract reverted").is_retryable());
    }

    #[test]
    fn severity_ranks_replay_above_limit() {
        assert!(BridgeError::replay_detected("chain:eth", 5).severity() > ErrorSeverity::Low);
        assert_eq!(
            BridgeError::limit_exceeded("amount", "100".into(), "50".into()).severity(),
            ErrorSeverity::Medium
        );
    }

    #[test]
    fn user_facing_excludes_security_and_adapter_errors() {
        assert!(BridgeError::invalid_request("bad").is_user_facing());
        assert!(!BridgeError::replay_detected("scope", 1).is_user_facing());
        assert!(!BridgeError::adapter_transient("eth", "timeout").is_user_facing());
    }

    #[test]
    fn category_groups_by_concern() {
        assert_eq!(BridgeError::unsupported_chain("mars").category(), "validation");
        assert_eq!(BridgeError::rate_limited("0xabc", 1).category(), "policy");
        assert_eq!(
            BridgeError::invalid_signature("v1", "bad sig").category(),
            "security"
        );
    }
}
