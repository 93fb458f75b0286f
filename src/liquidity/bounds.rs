use crate::errors::ProviderError;
use crate::lsp::LspOptions;
use crate::rates::FiatThresholds;
use crate::state::WalletState;

/// Everything the resolver needs, rebuilt whenever LSP info, balances or the
/// exchange rate refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintBounds {
    pub min_channel_size_sat: u64,
    pub max_channel_size_sat: u64,
    pub max_client_balance_sat: u64,
    pub max_0conf_client_balance_sat: u64,
    pub min_expiry_weeks: u32,
    pub max_expiry_weeks: u32,
    pub onchain_balance_sat: u64,
    /// Open and pending channel capacity. The LSP's max channel size is a
    /// per-wallet total, so this is deducted before bounding.
    pub existing_channels_capacity_sat: u64,
    pub fiat: FiatThresholds,
}

impl ConstraintBounds {
    pub fn new(
        options: &LspOptions,
        wallet: &WalletState,
        fiat: FiatThresholds,
    ) -> Result<Self, ProviderError> {
        if options.min_channel_size_sat > options.max_channel_size_sat {
            return Err(ProviderError::InvalidLspLimits {
                min_sat: options.min_channel_size_sat,
                max_sat: options.max_channel_size_sat,
            });
        }
        Ok(Self {
            min_channel_size_sat: options.min_channel_size_sat,
            max_channel_size_sat: options.max_channel_size_sat,
            max_client_balance_sat: options.max_client_balance_sat,
            max_0conf_client_balance_sat: options.max_0conf_client_balance_sat,
            min_expiry_weeks: options.min_expiry_weeks,
            max_expiry_weeks: options.max_expiry_weeks.max(options.min_expiry_weeks),
            onchain_balance_sat: wallet.onchain_balance_sats,
            existing_channels_capacity_sat: wallet.existing_channels_capacity_sats(),
            fiat,
        })
    }

    /// Clamp a requested channel duration to what the LSP accepts. An
    /// inverted range collapses to its minimum.
    pub fn clamp_expiry_weeks(&self, weeks: u32) -> u32 {
        let max_weeks = self.max_expiry_weeks.max(self.min_expiry_weeks);
        weeks.max(self.min_expiry_weeks).min(max_weeks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lsp::client::mock::make_options;
    use crate::state::{make_channel, ChannelStatus};

    #[test]
    fn test_bounds_from_lsp_and_wallet() {
        let wallet = WalletState {
            onchain_balance_sats: 500_000,
            claimable_balance_sats: 0,
            channels: vec![
                make_channel("a", ChannelStatus::Open, 100_000, 40_000, 39_000),
                make_channel("b", ChannelStatus::Pending, 50_000, 0, 0),
            ],
        };
        let fiat = FiatThresholds::default();
        let bounds = ConstraintBounds::new(&make_options(50_000, 10_000_000), &wallet, fiat).unwrap();
        assert_eq!(bounds.min_channel_size_sat, 50_000);
        assert_eq!(bounds.max_channel_size_sat, 10_000_000);
        assert_eq!(bounds.onchain_balance_sat, 500_000);
        assert_eq!(bounds.existing_channels_capacity_sat, 150_000);
    }

    #[test]
    fn test_bounds_reject_inverted_limits() {
        let err = ConstraintBounds::new(
            &make_options(2_000_000, 1_000_000),
            &WalletState::default(),
            FiatThresholds::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ProviderError::InvalidLspLimits {
                min_sat: 2_000_000,
                max_sat: 1_000_000
            }
        );
    }

    #[test]
    fn test_clamp_expiry_weeks() {
        let bounds = ConstraintBounds::new(
            &make_options(0, 1_000_000),
            &WalletState::default(),
            FiatThresholds::default(),
        )
        .unwrap();
        assert_eq!(bounds.clamp_expiry_weeks(6), 6);
        assert_eq!(bounds.clamp_expiry_weeks(0), 1);
        assert_eq!(bounds.clamp_expiry_weeks(52), 12);
    }

    #[test]
    fn test_clamp_expiry_weeks_inverted_range() {
        let bounds = ConstraintBounds {
            min_expiry_weeks: 12,
            max_expiry_weeks: 4,
            ..ConstraintBounds::new(
                &make_options(0, 1_000_000),
                &WalletState::default(),
                FiatThresholds::default(),
            )
            .unwrap()
        };
        assert_eq!(bounds.clamp_expiry_weeks(6), 12);
        assert_eq!(bounds.clamp_expiry_weeks(1), 12);
        assert_eq!(bounds.clamp_expiry_weeks(52), 12);
    }
}
