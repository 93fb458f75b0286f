use crate::errors::ProviderError;
use crate::policy::{round_sats, LiquidityPolicy};
use chrono::{DateTime, Utc};
use log::warn;

const SATS_PER_BTC: f64 = 100_000_000.0;

/// Price of one bitcoin in a fiat currency.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRate {
    pub currency_code: String,
    /// Fiat units per BTC
    pub rate: f64,
    pub updated_at: DateTime<Utc>,
}

/// Supplies current exchange rates, e.g. the LSP's ticker endpoint.
#[async_trait::async_trait]
pub trait ExchangeRateProvider: Send + Sync {
    async fn get_rate(&self, currency_code: &str) -> anyhow::Result<ExchangeRate>;
}

impl ExchangeRate {
    /// Reject rates that would poison the sat arithmetic downstream.
    pub fn validate(&self, now: DateTime<Utc>, max_age_secs: u64) -> Result<(), ProviderError> {
        if !self.rate.is_finite() || self.rate <= 0.0 {
            warn!(
                "Rejecting exchange rate {} for {}",
                self.rate, self.currency_code
            );
            return Err(ProviderError::InvalidExchangeRate {
                currency: self.currency_code.clone(),
                rate: self.rate,
            });
        }
        let age_secs = (now - self.updated_at).num_seconds();
        if age_secs > max_age_secs as i64 {
            warn!(
                "Rejecting stale {} rate ({}s old)",
                self.currency_code, age_secs
            );
            return Err(ProviderError::StaleExchangeRate {
                currency: self.currency_code.clone(),
                age_secs,
                max_age_secs,
            });
        }
        Ok(())
    }

    pub fn fiat_to_sats(&self, amount: f64) -> u64 {
        round_sats(amount / self.rate * SATS_PER_BTC)
    }
}

/// Fiat-denominated sizing thresholds, converted to sats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FiatThresholds {
    /// Above this client balance the default channel is symmetric
    pub spending_threshold_sat: u64,
    /// Channel size aimed for with small client balances
    pub default_lsp_target_sat: u64,
    /// Above this client balance the default LSP balance is the maximum
    pub max_lsp_threshold_sat: u64,
}

impl FiatThresholds {
    pub fn from_rate(
        rate: &ExchangeRate,
        policy: &LiquidityPolicy,
        now: DateTime<Utc>,
    ) -> Result<Self, ProviderError> {
        rate.validate(now, policy.max_rate_age_secs)?;
        Ok(Self {
            spending_threshold_sat: rate.fiat_to_sats(policy.spending_threshold_fiat),
            default_lsp_target_sat: rate.fiat_to_sats(policy.default_lsp_target_fiat),
            max_lsp_threshold_sat: rate.fiat_to_sats(policy.max_lsp_threshold_fiat),
        })
    }

    /// Thresholds for a fixed sats-per-fiat-unit price, mainly for tests and
    /// offline tooling.
    pub fn from_sats_per_unit(sats_per_unit: u64, policy: &LiquidityPolicy) -> Self {
        let convert = |amount: f64| round_sats(amount * sats_per_unit as f64);
        Self {
            spending_threshold_sat: convert(policy.spending_threshold_fiat),
            default_lsp_target_sat: convert(policy.default_lsp_target_fiat),
            max_lsp_threshold_sat: convert(policy.max_lsp_threshold_fiat),
        }
    }
}
