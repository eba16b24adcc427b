// =====================================================================================
// File: core-bridge/src/policy.rs
// Description: Fee, chain-limit, token, and rate-limit policy shared by the
//              orchestrator and the atomic swap engine.
// Author: arkSong (arksong2018@gmail.com)
// =====================================================================================

use crate::error::{BridgeError, BridgeResult};
use governor::{Quota, RateLimiter};
use governor::clock::{Clock, DefaultClock};
use governor::state::{InMemoryState, NotKeyed};
use nonzero_ext::nonzero;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;

/// Per-chain maximum transfer amount, expressed in the token's own units.
#[derive(Debug, Clone)]
pub struct ChainLimits {
    pub limits: HashMap<String, Decimal>,
}

impl Default for ChainLimits {
    fn default() -> Self {
        let mut limits = HashMap::new();
        limits.insert("ethereum".to_string(), Decimal::new(404_000, 0));
        limits.insert("bsc".to_string(), Decimal::new(101_000, 0));
        limits.insert("polygon".to_string(), Decimal::new(250_000, 0));
        limits.insert("avalanche".to_string(), Decimal::new(300_000, 0));
        limits.insert("solana".to_string(), Decimal::new(500_000, 0));
        limits.insert("polkadot".to_string(), Decimal::new(750_000, 0));
        limits.insert("aurigraph".to_string(), Decimal::new(1_000_000, 0));
        Self { limits }
    }
}

impl ChainLimits {
    pub fn max_for(&self, chain: &str) -> BridgeResult<Decimal> {
        self.limits
            .get(chain)
            .copied()
            .ok_or_else(|| BridgeError::unsupported_chain(chain))
    }

    pub fn check(&self, chain: &str, amount: Decimal) -> BridgeResult<()> {
        let max = self.max_for(chain)?;
        if amount > max {
            return Err(BridgeError::limit_exceeded(
                "chain",
                amount.to_string(),
                max.to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-token decimal precision and transfer bounds.
#[derive(Debug, Clone)]
pub struct TokenPolicy {
    pub source_decimals: u32,
    pub target_decimals: u32,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
}

#[derive(Debug, Clone)]
pub struct TokenRegistry {
    pub tokens: HashMap<String, TokenPolicy>,
}

impl Default for TokenRegistry {
    fn default() -> Self {
        let mut tokens = HashMap::new();
        tokens.insert(
            "ETH".to_string(),
            TokenPolicy {
                source_decimals: 18,
                target_decimals: 18,
                min_amount: Decimal::new(1, 2),
                max_amount: Decimal::new(100, 0),
            },
        );
        tokens.insert(
            "USDT".to_string(),
            TokenPolicy {
                source_decimals: 6,
                target_decimals: 6,
                min_amount: Decimal::new(100, 0),
                max_amount: Decimal::new(1_000_000, 0),
            },
        );
        tokens.insert(
            "USDC".to_string(),
            TokenPolicy {
                source_decimals: 6,
                target_decimals: 6,
                min_amount: Decimal::new(100, 0),
                max_amount: Decimal::new(1_000_000, 0),
            },
        );
        tokens.insert(
            "WBTC".to_string(),
            TokenPolicy {
                source_decimals: 8,
                target_decimals: 8,
                min_amount: Decimal::new(1, 3),
                max_amount: Decimal::new(10, 0),
            },
        );
        tokens.insert(
            "AUR".to_string(),
            TokenPolicy {
                source_decimals: 18,
                target_decimals: 18,
                min_amount: Decimal::new(1, 0),
                max_amount: Decimal::new(10_000_000, 0),
            },
        );
        Self { tokens }
    }
}

impl TokenRegistry {
    pub fn get(&self, symbol: &str) -> BridgeResult<&TokenPolicy> {
        self.tokens
            .get(symbol)
            .ok_or_else(|| BridgeError::invalid_request(format!("unsupported token {symbol}")))
    }

    pub fn is_supported(&self, symbol: &str) -> bool {
        self.tokens.contains_key(symbol)
    }

    pub fn check_amount(&self, symbol: &str, amount: Decimal) -> BridgeResult<()> {
        let policy = self.get(symbol)?;
        if amount < policy.min_amount || amount > policy.max_amount {
            return Err(BridgeError::limit_exceeded(
                "token",
                amount.to_string(),
                policy.max_amount.to_string(),
            ));
        }
        Ok(())
    }
}

/// `bridge_fee = amount * 0.001`
pub fn bridge_fee(amount: Decimal) -> Decimal {
    amount * Decimal::new(1, 3)
}

/// `slippage_bps_equivalent = 100 * amount / 1_000_000`, expressed as a
/// percentage of `amount`.
pub fn slippage(amount: Decimal) -> Decimal {
    Decimal::new(100, 0) * amount / Decimal::new(1_000_000, 0)
}

/// 100 requests/second admission control, keyed per source address.
pub struct AddressRateLimiter {
    limiters: dashmap::DashMap<String, Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>>,
    quota: Quota,
}

impl AddressRateLimiter {
    pub fn new() -> Self {
        Self {
            limiters: dashmap::DashMap::new(),
            quota: Quota::per_second(nonzero!(100u32)),
        }
    }

    pub fn with_quota(per_second: NonZeroU32) -> Self {
        Self {
            limiters: dashmap::DashMap::new(),
            quota: Quota::per_second(per_second),
        }
    }

    pub fn check(&self, source_address: &str) -> BridgeResult<()> {
        let limiter = self
            .limiters
            .entry(source_address.to_string())
            .or_insert_with(|| Arc::new(RateLimiter::direct(self.quota)))
            .clone();
        limiter.check().map_err(|not_until| {
            let clock = DefaultClock::default();
            let reset_seconds = not_until.wait_time_from(clock.now()).as_secs().max(1);
            BridgeError::rate_limited(source_address, reset_seconds)
        })
    }
}

impl Default for AddressRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_limits_reject_over_cap() {
        let limits = ChainLimits::default();
        assert!(limits.check("ethereum", Decimal::new(404_000, 0)).is_ok());
        assert!(limits.check("ethereum", Decimal::new(404_001, 0)).is_err());
    }

    #[test]
    fn chain_limits_reject_unknown_chain() {
        let limits = ChainLimits::default();
        assert!(limits.check("mars", Decimal::new(1, 0)).is_err());
    }

    #[test]
    fn token_registry_enforces_bounds() {
        let registry = TokenRegistry::default();
        assert!(registry.check_amount("USDC", Decimal::new(50, 0)).is_err());
        assert!(registry.check_amount("USDC", Decimal::new(500, 0)).is_ok());
    }

    #[test]
    fn bridge_fee_is_ten_bps() {
        assert_eq!(bridge_fee(Decimal::new(1000, 0)), Decimal::new(1, 0));
    }

    #[test]
    fn rate_limiter_blocks_after_burst() {
        let limiter = AddressRateLimiter::with_quota(nonzero!(1u32));
        assert!(limiter.check("0xabc").is_ok());
        assert!(limiter.check("0xabc").is_err());
    }
}
