/// Upstream data that must not reach the resolver.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("Invalid exchange rate for {currency}: {rate}")]
    InvalidExchangeRate { currency: String, rate: f64 },
    #[error("Stale exchange rate for {currency}: {age_secs}s old (max {max_age_secs}s)")]
    StaleExchangeRate {
        currency: String,
        age_secs: i64,
        max_age_secs: u64,
    },
    #[error("Invalid LSP limits: min channel size {min_sat} > max channel size {max_sat}")]
    InvalidLspLimits { min_sat: u64, max_sat: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SplitError {
    #[error("Cannot split a zero total balance")]
    ZeroBalance,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeeEstimateError {
    #[error("{message}")]
    Upstream { message: String },
    #[error("Fee quote timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("No valid channel size: min LSP balance {min_sat} > max LSP balance {max_sat}")]
    NoValidChannelSize { min_sat: u64, max_sat: u64 },
    #[error("Client balance {client_sat} above maximum {max_sat}")]
    ClientBalanceTooHigh { client_sat: u64, max_sat: u64 },
    #[error("LSP balance {lsp_sat} outside [{min_sat}, {max_sat}]")]
    LspBalanceOutOfRange {
        lsp_sat: u64,
        min_sat: u64,
        max_sat: u64,
    },
}
