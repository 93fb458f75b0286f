//! Channel limits for an LSP-opened channel.
//!
//! Given the client (spending) side of a prospective channel, work out how
//! much the LSP side may and should hold:
//! - The LSP's max channel size gets a 2% buffer because the advertised
//!   limit moves with network fees between quote and order.
//! - Capacity already open with the LSP counts against that max.
//! - LDK requires a 2.5% reserve on each side of the channel.

use crate::liquidity::bounds::ConstraintBounds;
use crate::policy::{round_sats, LiquidityPolicy};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferLimits {
    pub min_lsp_balance_sat: u64,
    pub max_lsp_balance_sat: u64,
    pub default_lsp_balance_sat: u64,
    pub max_client_balance_sat: u64,
    /// Effective max channel size after buffer and existing capacity
    pub max_channel_size_sat: u64,
}

impl TransferLimits {
    /// No LSP balance satisfies both bounds; continuing must be disabled.
    pub fn is_degenerate(&self) -> bool {
        self.min_lsp_balance_sat > self.max_lsp_balance_sat
    }

    pub fn accepts_lsp_balance(&self, lsp_balance_sat: u64) -> bool {
        !self.is_degenerate()
            && lsp_balance_sat >= self.min_lsp_balance_sat
            && lsp_balance_sat <= self.max_lsp_balance_sat
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChannelLimitsResolver {
    policy: LiquidityPolicy,
}

impl ChannelLimitsResolver {
    pub fn new(policy: LiquidityPolicy) -> Self {
        Self { policy }
    }

    pub fn resolve(&self, client_balance_sat: u64, bounds: &ConstraintBounds) -> TransferLimits {
        let max_channel_size = self.max_channel_size(bounds);

        let min_lsp_balance = self.min_lsp_balance(client_balance_sat, bounds.min_channel_size_sat);
        let max_lsp_balance = max_channel_size.saturating_sub(client_balance_sat);
        let default_lsp_balance =
            default_lsp_balance(client_balance_sat, min_lsp_balance, max_lsp_balance, bounds);
        let max_client_balance = self.max_client_balance(max_channel_size);

        debug!(
            "Limits for {}sat client balance: lsp [{}, {}] default {}, max client {}",
            client_balance_sat, min_lsp_balance, max_lsp_balance, default_lsp_balance, max_client_balance
        );

        TransferLimits {
            min_lsp_balance_sat: min_lsp_balance,
            max_lsp_balance_sat: max_lsp_balance,
            default_lsp_balance_sat: default_lsp_balance,
            max_client_balance_sat: max_client_balance,
            max_channel_size_sat: max_channel_size,
        }
    }

    fn max_channel_size(&self, bounds: &ConstraintBounds) -> u64 {
        let buffered =
            round_sats(bounds.max_channel_size_sat as f64 * self.policy.max_channel_size_buffer);
        let remaining = buffered.saturating_sub(bounds.existing_channels_capacity_sat);
        buffered.min(remaining)
    }

    fn min_lsp_balance(&self, client_balance_sat: u64, min_channel_size_sat: u64) -> u64 {
        let ldk_minimum = self.policy.reserve_for(client_balance_sat);
        let channel_minimum = min_channel_size_sat.saturating_sub(client_balance_sat);
        ldk_minimum.max(channel_minimum)
    }

    fn max_client_balance(&self, max_channel_size: u64) -> u64 {
        if max_channel_size == 0 {
            return 0;
        }
        // The LSP side must hold at least one sat of reserve
        let min_remote_reserve = self.policy.reserve_for(max_channel_size).max(1);
        max_channel_size.saturating_sub(min_remote_reserve)
    }
}

fn default_lsp_balance(
    client_balance_sat: u64,
    min_lsp_balance: u64,
    max_lsp_balance: u64,
    bounds: &ConstraintBounds,
) -> u64 {
    let fiat = &bounds.fiat;
    let lsp_balance = if client_balance_sat > fiat.max_lsp_threshold_sat {
        max_lsp_balance
    } else if client_balance_sat > fiat.spending_threshold_sat {
        client_balance_sat
    } else {
        fiat.default_lsp_target_sat.saturating_sub(client_balance_sat)
    };

    if min_lsp_balance > max_lsp_balance {
        return lsp_balance.min(max_lsp_balance);
    }
    lsp_balance.clamp(min_lsp_balance, max_lsp_balance)
}

/// Resolve limits with the default policy.
pub fn resolve_limits(client_balance_sat: u64, bounds: &ConstraintBounds) -> TransferLimits {
    ChannelLimitsResolver::default().resolve(client_balance_sat, bounds)
}
