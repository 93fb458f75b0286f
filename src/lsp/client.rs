use anyhow::Context;
use chrono::{TimeZone, Utc};
use log::{debug, warn};
use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::LspConfig;
use crate::lsp::{FeeEstimateRequest, FeeEstimateResponse, LspInfo};
use crate::rates::{ExchangeRate, ExchangeRateProvider};

/// Trait abstracting the LSP API surface used by the engine.
///
/// This enables mock-based testing without a live LSP.
#[async_trait::async_trait]
pub trait LspClient: Send + Sync {
    async fn get_info(&self) -> anyhow::Result<LspInfo>;
    async fn estimate_order_fee(
        &self,
        request: FeeEstimateRequest,
    ) -> anyhow::Result<FeeEstimateResponse>;
}

/// HTTP client for the Blocktank LSP API.
pub struct BlocktankClient {
    http: reqwest::Client,
    base_url: String,
    fx_url: String,
}

const MAX_RETRIES: u32 = 3;
const RETRY_BASE_MS: u64 = 1000;

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FxTickers {
    tickers: Vec<FxTicker>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FxTicker {
    quote: String,
    last_price: String,
    /// Milliseconds since epoch
    last_updated_at: i64,
}

impl BlocktankClient {
    pub fn new(config: &LspConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            fx_url: config.fx_url.clone(),
        })
    }

    /// Retries idempotent reads. Fee quotes are not retried: a newer quote
    /// request supersedes a failed one.
    async fn with_retry<F, Fut, T>(&self, name: &str, f: F) -> anyhow::Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = anyhow::Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match f().await {
                Ok(resp) => {
                    debug!("{}: success", name);
                    return Ok(resp);
                }
                Err(e) if attempt + 1 < MAX_RETRIES => {
                    let delay = RETRY_BASE_MS * 2u64.pow(attempt);
                    warn!(
                        "{}: attempt {} failed ({}), retrying in {}ms",
                        name,
                        attempt + 1,
                        e,
                        delay
                    );
                    sleep(Duration::from_millis(delay)).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(e.context(format!("{}: all {} attempts failed", name, MAX_RETRIES)));
                }
            }
        }
    }

    async fn fetch_info(&self) -> anyhow::Result<LspInfo> {
        let url = format!("{}/info", self.base_url);
        let resp = self.http.get(&url).send().await?;
        Ok(error_for_status(resp).await?.json().await?)
    }

    async fn fetch_tickers(&self) -> anyhow::Result<FxTickers> {
        let resp = self.http.get(&self.fx_url).send().await?;
        Ok(error_for_status(resp).await?.json().await?)
    }
}

/// Turn a non-2xx response into an error carrying the LSP's own message.
async fn error_for_status(resp: reqwest::Response) -> anyhow::Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(anyhow::anyhow!("{}", upstream_message(status, &body)))
}

fn upstream_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(err) = serde_json::from_str::<ApiError>(body) {
        return err.message;
    }
    let body = body.trim();
    if body.is_empty() {
        status.to_string()
    } else {
        body.to_string()
    }
}

#[async_trait::async_trait]
impl LspClient for BlocktankClient {
    async fn get_info(&self) -> anyhow::Result<LspInfo> {
        self.with_retry("GetInfo", || self.fetch_info()).await
    }

    async fn estimate_order_fee(
        &self,
        request: FeeEstimateRequest,
    ) -> anyhow::Result<FeeEstimateResponse> {
        let url = format!("{}/channels/estimate-fee-full", self.base_url);
        let resp = self.http.post(&url).json(&request).send().await?;
        let quote = error_for_status(resp).await?.json().await?;
        Ok(quote)
    }
}

#[async_trait::async_trait]
impl ExchangeRateProvider for BlocktankClient {
    async fn get_rate(&self, currency_code: &str) -> anyhow::Result<ExchangeRate> {
        let tickers = self.with_retry("GetRates", || self.fetch_tickers()).await?;
        let ticker = tickers
            .tickers
            .into_iter()
            .find(|t| t.quote.eq_ignore_ascii_case(currency_code))
            .with_context(|| format!("No exchange rate for {}", currency_code))?;

        // A garbage price parses to NaN here and is rejected by validation
        let rate = ticker.last_price.parse::<f64>().unwrap_or(f64::NAN);
        let updated_at = Utc
            .timestamp_millis_opt(ticker.last_updated_at)
            .single()
            .with_context(|| format!("Invalid rate timestamp {}", ticker.last_updated_at))?;

        Ok(ExchangeRate {
            currency_code: currency_code.to_uppercase(),
            rate,
            updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Mock client for testing
// ---------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::serve_once;
    use reqwest::StatusCode;

    #[test]
    fn test_upstream_message_from_json() {
        let msg = upstream_message(
            StatusCode::BAD_REQUEST,
            r#"{"message": "lspBalanceSat must be at least 10000"}"#,
        );
        assert_eq!(msg, "lspBalanceSat must be at least 10000");
    }

    #[test]
    fn test_upstream_message_from_text() {
        let msg = upstream_message(StatusCode::BAD_GATEWAY, "  upstream down \n");
        assert_eq!(msg, "upstream down");
    }

    fn lsp_config(base_url: &str, fx_url: &str) -> LspConfig {
        LspConfig {
            base_url: base_url.to_string(),
            fx_url: fx_url.to_string(),
            request_timeout_secs: 5,
            fee_quote_timeout_secs: 5,
            source: "bitkit".to_string(),
            currency: "EUR".to_string(),
        }
    }

    #[tokio::test]
    async fn test_get_info_parses_options() {
        let base_url = serve_once(
            "200 OK",
            r#"{"version": 2, "nodes": [{"alias": "blocktank", "pubkey": "02abc", "connectionStrings": ["02abc@1.2.3.4:9735"]}],
                "options": {"minChannelSizeSat": 50000, "maxChannelSizeSat": 10000000, "maxClientBalanceSat": 856487,
                            "max0ConfClientBalanceSat": 856487, "minExpiryWeeks": 2, "maxExpiryWeeks": 12}}"#,
        )
        .await;
        let client = BlocktankClient::new(&lsp_config(&base_url, "")).unwrap();
        let info = client.get_info().await.unwrap();
        assert_eq!(info.version, 2);
        assert_eq!(info.nodes[0].alias, "blocktank");
        assert_eq!(info.options.min_channel_size_sat, 50_000);
        assert_eq!(info.options.max_0conf_client_balance_sat, 856_487);
        assert_eq!(info.options.min_expiry_weeks, 2);
    }

    #[tokio::test]
    async fn test_get_rate_from_tickers() {
        let fx_url = serve_once(
            "200 OK",
            r#"{"tickers": [
                {"symbol": "BTCUSD", "quote": "USD", "lastPrice": "65000.12", "lastUpdatedAt": 1700000000000},
                {"symbol": "BTCEUR", "quote": "EUR", "lastPrice": "60000.5", "lastUpdatedAt": 1700000000000}
            ]}"#,
        )
        .await;
        let client = BlocktankClient::new(&lsp_config("http://unused", &fx_url)).unwrap();
        let rate = client.get_rate("eur").await.unwrap();
        assert_eq!(rate.currency_code, "EUR");
        assert_eq!(rate.rate, 60_000.5);
        assert_eq!(rate.updated_at.timestamp(), 1_700_000_000);
    }

    #[tokio::test]
    async fn test_get_rate_garbage_price_is_nan() {
        let fx_url = serve_once(
            "200 OK",
            r#"{"tickers": [{"quote": "EUR", "lastPrice": "n/a", "lastUpdatedAt": 1700000000000}]}"#,
        )
        .await;
        let client = BlocktankClient::new(&lsp_config("http://unused", &fx_url)).unwrap();
        let rate = client.get_rate("EUR").await.unwrap();
        assert!(rate.rate.is_nan());
    }

    #[test]
    fn test_upstream_message_empty_body() {
        let msg = upstream_message(StatusCode::SERVICE_UNAVAILABLE, "");
        assert_eq!(msg, "503 Service Unavailable");
    }
}
