use crate::errors::OrderError;
use crate::liquidity::bounds::ConstraintBounds;
use crate::liquidity::limits::TransferLimits;
use crate::policy::LiquidityPolicy;
use log::debug;

/// Channel order ready to be quoted or submitted to the LSP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderProposal {
    pub lsp_balance_sat: u64,
    pub client_balance_sat: u64,
    pub channel_expiry_weeks: u32,
    /// Client side is small enough to be paid into a zero-conf channel
    pub zero_conf_payment: bool,
}

/// Turn resolved limits into an order.
///
/// Without an override the LSP balance is the resolver's default. An override
/// must lie within the resolved range.
pub fn propose_order(
    client_balance_sat: u64,
    lsp_balance_override: Option<u64>,
    limits: &TransferLimits,
    bounds: &ConstraintBounds,
    policy: &LiquidityPolicy,
) -> Result<OrderProposal, OrderError> {
    if limits.is_degenerate() {
        return Err(OrderError::NoValidChannelSize {
            min_sat: limits.min_lsp_balance_sat,
            max_sat: limits.max_lsp_balance_sat,
        });
    }
    if client_balance_sat > limits.max_client_balance_sat {
        return Err(OrderError::ClientBalanceTooHigh {
            client_sat: client_balance_sat,
            max_sat: limits.max_client_balance_sat,
        });
    }

    let lsp_balance_sat = lsp_balance_override.unwrap_or(limits.default_lsp_balance_sat);
    if !limits.accepts_lsp_balance(lsp_balance_sat) {
        return Err(OrderError::LspBalanceOutOfRange {
            lsp_sat: lsp_balance_sat,
            min_sat: limits.min_lsp_balance_sat,
            max_sat: limits.max_lsp_balance_sat,
        });
    }

    let proposal = OrderProposal {
        lsp_balance_sat,
        client_balance_sat,
        channel_expiry_weeks: bounds.clamp_expiry_weeks(policy.channel_expiry_weeks),
        zero_conf_payment: client_balance_sat <= bounds.max_0conf_client_balance_sat,
    };
    debug!("Proposed order: {:?}", proposal);
    Ok(proposal)
}
