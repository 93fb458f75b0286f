//! Liquidity allocation for LSP-opened channels.
//!
//! The resolver and splitter are pure functions of their inputs; the fee
//! estimator is the only part that talks to the network.

pub mod bounds;
pub mod fee;
pub mod limits;
pub mod order;
pub mod split;

use crate::config::Config;
use crate::errors::{FeeEstimateError, OrderError, SplitError};
use crate::lsp::client::LspClient;
use crate::lsp::LspOptions;
use crate::policy::LiquidityPolicy;
use crate::rates::{ExchangeRateProvider, FiatThresholds};
use crate::state::{WalletBalances, WalletState};
use anyhow::Context;
use bounds::ConstraintBounds;
use chrono::Utc;
use fee::{TransferFee, TransferFeeEstimator};
use limits::{ChannelLimitsResolver, TransferLimits};
use log::info;
use order::OrderProposal;
use split::{SplitResult, SpendingSavingsSplitter};
use std::time::Duration;

/// Everything needed to size a transfer: the LSP's advertised options plus
/// the bounds derived from them and the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquiditySnapshot {
    pub options: LspOptions,
    pub bounds: ConstraintBounds,
}

/// Entry point tying the resolver, splitter and fee estimator to one policy.
#[derive(Debug, Clone)]
pub struct LiquidityEngine {
    policy: LiquidityPolicy,
    resolver: ChannelLimitsResolver,
    splitter: SpendingSavingsSplitter,
    estimator: TransferFeeEstimator,
}

impl Default for LiquidityEngine {
    fn default() -> Self {
        Self::new(LiquidityPolicy::default(), TransferFeeEstimator::default())
    }
}

impl LiquidityEngine {
    pub fn new(policy: LiquidityPolicy, estimator: TransferFeeEstimator) -> Self {
        Self {
            resolver: ChannelLimitsResolver::new(policy.clone()),
            splitter: SpendingSavingsSplitter::new(policy.clone()),
            estimator,
            policy,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let estimator = TransferFeeEstimator::new(
            Duration::from_secs(config.lsp.fee_quote_timeout_secs),
            config.policy.channel_expiry_weeks,
            config.lsp.source.clone(),
        );
        Self::new(config.policy.clone(), estimator)
    }

    pub fn policy(&self) -> &LiquidityPolicy {
        &self.policy
    }

    /// Fetch LSP options and the exchange rate, validate both, and combine
    /// them with the wallet into bounds.
    pub async fn load_snapshot(
        &self,
        lsp: &(impl LspClient + ?Sized),
        rates: &(impl ExchangeRateProvider + ?Sized),
        currency_code: &str,
        wallet: &WalletState,
    ) -> anyhow::Result<LiquiditySnapshot> {
        let info = lsp.get_info().await.context("Failed to fetch LSP info")?;
        info!(
            "LSP v{}: channel size [{}, {}]sat, max client {}sat",
            info.version,
            info.options.min_channel_size_sat,
            info.options.max_channel_size_sat,
            info.options.max_client_balance_sat
        );

        let rate = rates
            .get_rate(currency_code)
            .await
            .with_context(|| format!("Failed to fetch {} exchange rate", currency_code))?;
        let fiat = FiatThresholds::from_rate(&rate, &self.policy, Utc::now())?;
        let bounds = ConstraintBounds::new(&info.options, wallet, fiat)?;

        Ok(LiquiditySnapshot {
            options: info.options,
            bounds,
        })
    }

    pub fn resolve_limits(&self, client_balance_sat: u64, bounds: &ConstraintBounds) -> TransferLimits {
        self.resolver.resolve(client_balance_sat, bounds)
    }

    pub fn split_allocation(
        &self,
        options: &LspOptions,
        balances: &WalletBalances,
        spending_amount_sat: u64,
    ) -> Result<SplitResult, SplitError> {
        self.splitter.split(options, balances, spending_amount_sat)
    }

    pub async fn estimate_fee(
        &self,
        lsp: &(impl LspClient + ?Sized),
        lsp_balance_sat: u64,
        client_balance_sat: u64,
    ) -> Result<TransferFee, FeeEstimateError> {
        self.estimator
            .estimate_fee(lsp, lsp_balance_sat, client_balance_sat)
            .await
    }

    /// Resolve limits for `client_balance_sat` and build an order from them.
    pub fn propose_order(
        &self,
        client_balance_sat: u64,
        lsp_balance_override: Option<u64>,
        bounds: &ConstraintBounds,
    ) -> Result<OrderProposal, OrderError> {
        let limits = self.resolve_limits(client_balance_sat, bounds);
        order::propose_order(
            client_balance_sat,
            lsp_balance_override,
            &limits,
            bounds,
            &self.policy,
        )
    }
}
