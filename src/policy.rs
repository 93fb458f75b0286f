use serde::Deserialize;

/// Share of channel capacity LDK keeps unspendable on each side.
pub const DEFAULT_RESERVE_RATIO: f64 = 0.025;
/// Applied to the LSP's max channel size; LSP limits move with network fees.
pub const DEFAULT_MAX_CHANNEL_SIZE_BUFFER: f64 = 0.98;
/// Client balances above this get a symmetric channel by default.
pub const DEFAULT_SPENDING_THRESHOLD_FIAT: f64 = 225.0;
/// Target channel size for small client balances.
pub const DEFAULT_LSP_TARGET_FIAT: f64 = 450.0;
/// Client balances above this get the maximum LSP balance by default.
pub const DEFAULT_MAX_LSP_THRESHOLD_FIAT: f64 = 495.0;
/// Cap on the share of total funds that may sit in Lightning.
pub const DEFAULT_SPENDING_LIMIT_RATIO: f64 = 0.8;
/// Discount applied to the balanced (50/50) spending ceiling.
pub const DEFAULT_LIGHTNING_DIFF: f64 = 0.01;
/// Share of on-chain funds the slider starts at when there is no channel yet.
pub const DEFAULT_LIGHTNING_DEFAULT_SLIDER: f64 = 0.2;
pub const DEFAULT_CHANNEL_EXPIRY_WEEKS: u32 = 6;
pub const DEFAULT_MAX_RATE_AGE_SECS: u64 = 3600;

/// Business rules of the allocation engine.
///
/// Every field defaults to the matching `DEFAULT_*` constant and can be
/// overridden from the `[policy]` section of the config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LiquidityPolicy {
    #[serde(default = "default_reserve_ratio")]
    pub reserve_ratio: f64,
    #[serde(default = "default_max_channel_size_buffer")]
    pub max_channel_size_buffer: f64,
    #[serde(default = "default_spending_threshold_fiat")]
    pub spending_threshold_fiat: f64,
    #[serde(default = "default_lsp_target_fiat")]
    pub default_lsp_target_fiat: f64,
    #[serde(default = "default_max_lsp_threshold_fiat")]
    pub max_lsp_threshold_fiat: f64,
    #[serde(default = "default_spending_limit_ratio")]
    pub spending_limit_ratio: f64,
    #[serde(default = "default_lightning_diff")]
    pub lightning_diff: f64,
    #[serde(default = "default_lightning_default_slider")]
    pub lightning_default_slider: f64,
    #[serde(default = "default_channel_expiry_weeks")]
    pub channel_expiry_weeks: u32,
    /// Exchange rates older than this are treated as a provider fault
    #[serde(default = "default_max_rate_age_secs")]
    pub max_rate_age_secs: u64,
}

fn default_reserve_ratio() -> f64 {
    DEFAULT_RESERVE_RATIO
}
fn default_max_channel_size_buffer() -> f64 {
    DEFAULT_MAX_CHANNEL_SIZE_BUFFER
}
fn default_spending_threshold_fiat() -> f64 {
    DEFAULT_SPENDING_THRESHOLD_FIAT
}
fn default_lsp_target_fiat() -> f64 {
    DEFAULT_LSP_TARGET_FIAT
}
fn default_max_lsp_threshold_fiat() -> f64 {
    DEFAULT_MAX_LSP_THRESHOLD_FIAT
}
fn default_spending_limit_ratio() -> f64 {
    DEFAULT_SPENDING_LIMIT_RATIO
}
fn default_lightning_diff() -> f64 {
    DEFAULT_LIGHTNING_DIFF
}
fn default_lightning_default_slider() -> f64 {
    DEFAULT_LIGHTNING_DEFAULT_SLIDER
}
fn default_channel_expiry_weeks() -> u32 {
    DEFAULT_CHANNEL_EXPIRY_WEEKS
}
fn default_max_rate_age_secs() -> u64 {
    DEFAULT_MAX_RATE_AGE_SECS
}

impl Default for LiquidityPolicy {
    fn default() -> Self {
        Self {
            reserve_ratio: default_reserve_ratio(),
            max_channel_size_buffer: default_max_channel_size_buffer(),
            spending_threshold_fiat: default_spending_threshold_fiat(),
            default_lsp_target_fiat: default_lsp_target_fiat(),
            max_lsp_threshold_fiat: default_max_lsp_threshold_fiat(),
            spending_limit_ratio: default_spending_limit_ratio(),
            lightning_diff: default_lightning_diff(),
            lightning_default_slider: default_lightning_default_slider(),
            channel_expiry_weeks: default_channel_expiry_weeks(),
            max_rate_age_secs: default_max_rate_age_secs(),
        }
    }
}

impl LiquidityPolicy {
    /// Reserve LDK requires for a channel side holding `sats`.
    pub fn reserve_for(&self, sats: u64) -> u64 {
        round_sats(sats as f64 * self.reserve_ratio)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let ratios = [
            ("reserve_ratio", self.reserve_ratio),
            ("max_channel_size_buffer", self.max_channel_size_buffer),
            ("spending_limit_ratio", self.spending_limit_ratio),
            ("lightning_diff", self.lightning_diff),
            ("lightning_default_slider", self.lightning_default_slider),
        ];
        for (name, value) in ratios {
            if !value.is_finite() || value < 0.0 || value > 1.0 {
                anyhow::bail!("{} ({}) must be between 0.0 and 1.0", name, value);
            }
        }
        if self.max_channel_size_buffer == 0.0 {
            anyhow::bail!("max_channel_size_buffer must be greater than 0.0");
        }
        // The balanced ceiling is max/2 - max * diff
        if self.lightning_diff >= 0.5 {
            anyhow::bail!("lightning_diff ({}) must be below 0.5", self.lightning_diff);
        }

        let thresholds = [
            self.spending_threshold_fiat,
            self.default_lsp_target_fiat,
            self.max_lsp_threshold_fiat,
        ];
        if thresholds.iter().any(|t| !t.is_finite() || *t < 0.0) {
            anyhow::bail!("fiat thresholds must be finite and non-negative");
        }
        if self.spending_threshold_fiat > self.max_lsp_threshold_fiat {
            anyhow::bail!("spending_threshold_fiat > max_lsp_threshold_fiat");
        }
        if self.channel_expiry_weeks == 0 {
            anyhow::bail!("channel_expiry_weeks must be at least 1");
        }
        Ok(())
    }
}

/// Round a non-negative sat amount to the nearest whole sat.
pub(crate) fn round_sats(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    value.round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_pass_validation() {
        assert!(LiquidityPolicy::default().validate().is_ok());
    }

    #[test]
    fn test_reserve_rounds_to_nearest() {
        let policy = LiquidityPolicy::default();
        assert_eq!(policy.reserve_for(20_000), 500);
        assert_eq!(policy.reserve_for(9_800_000), 245_000);
        // 0.025 * 30 = 0.75 -> 1
        assert_eq!(policy.reserve_for(30), 1);
        // 0.025 * 10 = 0.25 -> 0
        assert_eq!(policy.reserve_for(10), 0);
        assert_eq!(policy.reserve_for(0), 0);
    }

    #[test]
    fn test_validate_rejects_ratio_out_of_range() {
        let mut policy = LiquidityPolicy::default();
        policy.spending_limit_ratio = 1.2;
        let err = policy.validate().unwrap_err();
        assert!(err.to_string().contains("spending_limit_ratio"));

        let mut policy = LiquidityPolicy::default();
        policy.reserve_ratio = f64::NAN;
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let mut policy = LiquidityPolicy::default();
        policy.spending_threshold_fiat = 600.0;
        let err = policy.validate().unwrap_err();
        assert!(err.to_string().contains("spending_threshold_fiat"));
    }

    #[test]
    fn test_round_sats_clamps_negative_and_nan() {
        assert_eq!(round_sats(-5.0), 0);
        assert_eq!(round_sats(f64::NAN), 0);
        assert_eq!(round_sats(2.5), 3);
        assert_eq!(round_sats(2.4), 2);
    }
}
