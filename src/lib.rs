//! Liquidity allocation for Lightning channels opened by an LSP.
//!
//! Given LSP limits, wallet balances and an exchange rate, this crate works
//! out how large a new channel should be, how a wallet's funds split between
//! spending and savings, and what the LSP will charge for the channel.

pub mod config;
pub mod errors;
pub mod liquidity;
pub mod lsp;
pub mod policy;
pub mod rates;
pub mod state;

#[cfg(test)]
mod test_utils;

pub use errors::{FeeEstimateError, OrderError, ProviderError, SplitError};
pub use liquidity::bounds::ConstraintBounds;
pub use liquidity::fee::{FeeQuotes, TransferFee, TransferFeeEstimator, TransferPair};
pub use liquidity::limits::{resolve_limits, ChannelLimitsResolver, TransferLimits};
pub use liquidity::order::{propose_order, OrderProposal};
pub use liquidity::split::{split_allocation, SpendingSavingsSplitter, SplitResult};
pub use liquidity::{LiquidityEngine, LiquiditySnapshot};
pub use policy::LiquidityPolicy;
