use crate::policy::LiquidityPolicy;
use crate::state::WalletState;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub lsp: LspConfig,
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub policy: LiquidityPolicy,
    /// Wallet snapshot, only read by the command line tool
    #[serde(default)]
    pub wallet: WalletState,
}

#[derive(Debug, Deserialize)]
pub struct LspConfig {
    /// Blocktank API root, e.g. https://api1.blocktank.to/api
    pub base_url: String,
    /// Exchange-rate ticker endpoint
    #[serde(default = "default_fx_url")]
    pub fx_url: String,
    /// Timeout for every HTTP request in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Upper bound on a single fee quote round-trip in seconds
    #[serde(default = "default_fee_quote_timeout")]
    pub fee_quote_timeout_secs: u64,
    /// Order source tag sent to the LSP
    #[serde(default = "default_source")]
    pub source: String,
    /// Currency the fiat thresholds are denominated in
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default value functions
fn default_fx_url() -> String {
    "https://api1.blocktank.to/api/fx/rates/btc".to_string()
}
fn default_request_timeout() -> u64 {
    10
}
fn default_fee_quote_timeout() -> u64 {
    10
}
fn default_source() -> String {
    "bitkit".to_string()
}
fn default_currency() -> String {
    "EUR".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        // Hard limits (non-configurable safety rails)
        const ABS_MAX_TIMEOUT_SECS: u64 = 60;
        const ABS_MAX_EXPIRY_WEEKS: u32 = 52;

        if self.lsp.base_url.is_empty() {
            anyhow::bail!("lsp.base_url must not be empty");
        }
        if !self.lsp.base_url.starts_with("http://") && !self.lsp.base_url.starts_with("https://")
        {
            anyhow::bail!("lsp.base_url ({}) must include a scheme", self.lsp.base_url);
        }
        for (name, secs) in [
            ("request_timeout_secs", self.lsp.request_timeout_secs),
            ("fee_quote_timeout_secs", self.lsp.fee_quote_timeout_secs),
        ] {
            if secs == 0 || secs > ABS_MAX_TIMEOUT_SECS {
                anyhow::bail!(
                    "{} ({}) must be between 1 and {}",
                    name,
                    secs,
                    ABS_MAX_TIMEOUT_SECS
                );
            }
        }
        if self.lsp.currency.len() != 3 {
            anyhow::bail!("currency ({}) must be an ISO 4217 code", self.lsp.currency);
        }
        if self.policy.channel_expiry_weeks > ABS_MAX_EXPIRY_WEEKS {
            anyhow::bail!(
                "channel_expiry_weeks ({}) above absolute maximum ({})",
                self.policy.channel_expiry_weeks,
                ABS_MAX_EXPIRY_WEEKS
            );
        }
        self.policy.validate()?;
        Ok(())
    }

    /// Create a config with all defaults for testing purposes.
    #[cfg(test)]
    pub fn test_default(base_url: &str) -> Self {
        Self {
            lsp: LspConfig {
                base_url: base_url.to_string(),
                fx_url: default_fx_url(),
                request_timeout_secs: default_request_timeout(),
                fee_quote_timeout_secs: default_fee_quote_timeout(),
                source: default_source(),
                currency: default_currency(),
            },
            general: GeneralConfig::default(),
            policy: LiquidityPolicy::default(),
            wallet: WalletState::default(),
        }
    }
}
