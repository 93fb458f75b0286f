pub mod client;

use serde::{Deserialize, Serialize};

/// LSP info as published on the Blocktank `/info` endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LspInfo {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub nodes: Vec<LspNode>,
    pub options: LspOptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LspNode {
    #[serde(default)]
    pub alias: String,
    pub pubkey: String,
    #[serde(default)]
    pub connection_strings: Vec<String>,
}

/// Channel limits advertised by the LSP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LspOptions {
    pub min_channel_size_sat: u64,
    pub max_channel_size_sat: u64,
    pub max_client_balance_sat: u64,
    #[serde(rename = "max0ConfClientBalanceSat")]
    pub max_0conf_client_balance_sat: u64,
    pub min_expiry_weeks: u32,
    pub max_expiry_weeks: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeEstimateRequest {
    pub lsp_balance_sat: u64,
    pub channel_expiry_weeks: u32,
    pub client_balance_sat: u64,
    pub zero_reserve: bool,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeEstimateResponse {
    pub fee_sat: u64,
    #[serde(default)]
    pub network_fee_sat: u64,
    #[serde(default)]
    pub service_fee_sat: u64,
}
