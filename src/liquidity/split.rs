use crate::errors::SplitError;
use crate::lsp::LspOptions;
use crate::policy::{round_sats, LiquidityPolicy};
use crate::state::WalletBalances;
use log::debug;

/// Geometry of the spending/savings slider, in sats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliderGeometry {
    pub start_value: u64,
    pub end_value: u64,
    /// Furthest point the user may drag to
    pub max_value: u64,
    /// Current Lightning balance, i.e. "no change"
    pub snap_point: u64,
    /// Where the slider starts when the screen opens
    pub initial_value: u64,
}

/// Rounded independently, so the two may not add up to exactly 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPercentage {
    pub spendings: u8,
    pub savings: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpendingLimits {
    /// Share of total funds allowed in Lightning
    pub local_sat: u64,
    /// Balanced ceiling derived from the LSP's limits
    pub lsp_sat: u64,
}

/// Number-pad shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpendingPresets {
    pub quarter_sat: u64,
    pub max_sat: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitResult {
    pub slider: SliderGeometry,
    pub percentage: SplitPercentage,
    pub limits: SpendingLimits,
    pub presets: SpendingPresets,
    pub spending_limit_sat: u64,
    pub client_balance_sat: u64,
    pub can_continue: bool,
    /// Spending shrinks: this is a channel close, not an open
    pub is_transferring_to_savings: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SpendingSavingsSplitter {
    policy: LiquidityPolicy,
}

impl SpendingSavingsSplitter {
    pub fn new(policy: LiquidityPolicy) -> Self {
        Self { policy }
    }

    pub fn split(
        &self,
        options: &LspOptions,
        balances: &WalletBalances,
        spending_amount_sat: u64,
    ) -> Result<SplitResult, SplitError> {
        let total = balances.total_sats();
        if total == 0 {
            return Err(SplitError::ZeroBalance);
        }
        let current = balances.lightning_sats;

        let lsp_limit = self.balanced_spending_limit(options);
        let spendable = round_sats(total as f64 * self.policy.spending_limit_ratio);
        // An existing larger channel is never reported as over the limit
        let spending_limit = spendable.min(lsp_limit).max(current);

        let initial_value = if current > 0 {
            current
        } else {
            round_sats(balances.onchain_sats as f64 * self.policy.lightning_default_slider)
                .min(lsp_limit)
        };

        let percentage = SplitPercentage {
            spendings: percent_of(spending_amount_sat, total),
            savings: percent_of(total.saturating_sub(spending_amount_sat), total),
        };

        let can_continue = spending_amount_sat != current && spending_amount_sat <= spending_limit;

        debug!(
            "Split of {}sat total: spending {}sat (limit {}sat, lsp {}sat, local {}sat), continue={}",
            total, spending_amount_sat, spending_limit, lsp_limit, spendable, can_continue
        );

        Ok(SplitResult {
            slider: SliderGeometry {
                start_value: 0,
                end_value: total,
                max_value: spending_limit,
                snap_point: current,
                initial_value,
            },
            percentage,
            limits: SpendingLimits {
                local_sat: spendable,
                lsp_sat: lsp_limit,
            },
            presets: SpendingPresets {
                quarter_sat: round_sats(balances.onchain_sats as f64 / 4.0).min(spending_limit),
                max_sat: spending_limit,
            },
            spending_limit_sat: spending_limit,
            client_balance_sat: spending_amount_sat,
            can_continue,
            is_transferring_to_savings: spending_amount_sat < current,
        })
    }

    /// Client ceiling assuming a 50/50 channel, discounted by the lightning
    /// diff and capped by the LSP's per-client maximum.
    fn balanced_spending_limit(&self, options: &LspOptions) -> u64 {
        let max_channel = options.max_channel_size_sat as f64;
        round_sats(max_channel / 2.0 - max_channel * self.policy.lightning_diff)
            .min(options.max_client_balance_sat)
    }
}

fn percent_of(amount: u64, total: u64) -> u8 {
    round_sats(amount as f64 / total as f64 * 100.0).min(100) as u8
}

/// Split with the default policy.
pub fn split_allocation(
    options: &LspOptions,
    balances: &WalletBalances,
    spending_amount_sat: u64,
) -> Result<SplitResult, SplitError> {
    SpendingSavingsSplitter::default().split(options, balances, spending_amount_sat)
}
