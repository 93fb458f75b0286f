use log::debug;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelStatus {
    Open,
    Pending,
    Closed,
}

/// A wallet channel as reported by the Lightning node.
#[derive(Debug, Clone, Deserialize)]
pub struct Channel {
    pub channel_id: String,
    pub channel_value_sats: u64,
    /// Our side of the channel, reserve included
    #[serde(default)]
    pub balance_sats: u64,
    /// What we can actually spend right now
    #[serde(default)]
    pub outbound_capacity_sats: u64,
    pub status: ChannelStatus,
    #[serde(default)]
    pub is_channel_ready: bool,
}

/// Breakdown of funds held in Lightning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightningBalance {
    pub spending_sats: u64,
    pub reserve_sats: u64,
    pub claimable_sats: u64,
}

impl LightningBalance {
    pub fn total_sats(&self) -> u64 {
        self.spending_sats
            .saturating_add(self.reserve_sats)
            .saturating_add(self.claimable_sats)
    }
}

/// Balances consumed by the splitter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalletBalances {
    pub onchain_sats: u64,
    pub lightning_sats: u64,
}

impl WalletBalances {
    pub fn total_sats(&self) -> u64 {
        self.onchain_sats.saturating_add(self.lightning_sats)
    }
}

/// Snapshot of wallet state supplied by the caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletState {
    #[serde(default)]
    pub onchain_balance_sats: u64,
    #[serde(default)]
    pub claimable_balance_sats: u64,
    #[serde(default)]
    pub channels: Vec<Channel>,
}

impl WalletState {
    /// Capacity already committed with the LSP (open and pending channels).
    pub fn existing_channels_capacity_sats(&self) -> u64 {
        self.channels
            .iter()
            .filter(|c| c.status != ChannelStatus::Closed)
            .map(|c| c.channel_value_sats)
            .fold(0, u64::saturating_add)
    }

    /// Lightning funds, counting only channels that are open and ready.
    pub fn lightning_balance(&self) -> LightningBalance {
        let mut balance = LightningBalance {
            claimable_sats: self.claimable_balance_sats,
            ..Default::default()
        };
        for ch in self
            .channels
            .iter()
            .filter(|c| c.status == ChannelStatus::Open && c.is_channel_ready)
        {
            balance.spending_sats = balance.spending_sats.saturating_add(ch.outbound_capacity_sats);
            balance.reserve_sats = balance
                .reserve_sats
                .saturating_add(ch.balance_sats.saturating_sub(ch.outbound_capacity_sats));
        }
        debug!(
            "Lightning balance: {}sat spending, {}sat reserve, {}sat claimable",
            balance.spending_sats, balance.reserve_sats, balance.claimable_sats
        );
        balance
    }

    pub fn balances(&self) -> WalletBalances {
        WalletBalances {
            onchain_sats: self.onchain_balance_sats,
            lightning_sats: self.lightning_balance().spending_sats,
        }
    }

    /// Total funds (on-chain + lightning).
    pub fn total_balance_sats(&self) -> u64 {
        self.onchain_balance_sats
            .saturating_add(self.lightning_balance().total_sats())
    }
}

#[cfg(test)]
pub(crate) fn make_channel(
    id: &str,
    status: ChannelStatus,
    value_sats: u64,
    balance_sats: u64,
    outbound_sats: u64,
) -> Channel {
    Channel {
        channel_id: id.to_string(),
        channel_value_sats: value_sats,
        balance_sats,
        outbound_capacity_sats: outbound_sats,
        status,
        is_channel_ready: status == ChannelStatus::Open,
    }
}
