use crate::errors::FeeEstimateError;
use crate::lsp::client::LspClient;
use crate::lsp::FeeEstimateRequest;
use crate::policy::DEFAULT_CHANNEL_EXPIRY_WEEKS;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_FEE_QUOTE_TIMEOUT: Duration = Duration::from_secs(10);

/// Fee the LSP charges to open a channel of the given shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferFee {
    pub fee_sat: u64,
    pub network_fee_sat: u64,
    pub service_fee_sat: u64,
}

/// The amounts a fee quote was requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransferPair {
    pub client_balance_sat: u64,
    pub lsp_balance_sat: u64,
}

#[derive(Debug, Clone)]
pub struct TransferFeeEstimator {
    timeout: Duration,
    channel_expiry_weeks: u32,
    source: String,
}

impl Default for TransferFeeEstimator {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_FEE_QUOTE_TIMEOUT,
            channel_expiry_weeks: DEFAULT_CHANNEL_EXPIRY_WEEKS,
            source: "bitkit".to_string(),
        }
    }
}

impl TransferFeeEstimator {
    pub fn new(timeout: Duration, channel_expiry_weeks: u32, source: impl Into<String>) -> Self {
        Self {
            timeout,
            channel_expiry_weeks,
            source: source.into(),
        }
    }

    /// Ask the LSP what opening this channel costs.
    ///
    /// One round-trip, bounded by the configured timeout. Failures come back
    /// as `Err` carrying the LSP's own message.
    pub async fn estimate_fee(
        &self,
        client: &(impl LspClient + ?Sized),
        lsp_balance_sat: u64,
        client_balance_sat: u64,
    ) -> Result<TransferFee, FeeEstimateError> {
        let request = FeeEstimateRequest {
            lsp_balance_sat,
            channel_expiry_weeks: self.channel_expiry_weeks,
            client_balance_sat,
            zero_reserve: true,
            source: self.source.clone(),
        };

        debug!(
            "Requesting fee quote: lsp {}sat, client {}sat",
            lsp_balance_sat, client_balance_sat
        );

        let response = match tokio::time::timeout(self.timeout, client.estimate_order_fee(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!("Fee quote failed: {}", e);
                return Err(FeeEstimateError::Upstream {
                    message: e.to_string(),
                });
            }
            Err(_) => {
                warn!("Fee quote timed out after {:?}", self.timeout);
                return Err(FeeEstimateError::Timeout {
                    timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                });
            }
        };

        info!(
            "Fee quote for lsp {}sat / client {}sat: {}sat",
            lsp_balance_sat, client_balance_sat, response.fee_sat
        );

        Ok(TransferFee {
            fee_sat: response.fee_sat,
            network_fee_sat: response.network_fee_sat,
            service_fee_sat: response.service_fee_sat,
        })
    }
}

/// Caller-side book of fee quotes with last-request-wins semantics.
///
/// Quotes are cached per pair so moving the slider back and forth does not
/// refetch, and a result arriving for a pair that is no longer selected is
/// kept in the cache but not applied.
#[derive(Debug, Default)]
pub struct FeeQuotes {
    selected: Option<TransferPair>,
    cache: HashMap<TransferPair, TransferFee>,
}

impl FeeQuotes {
    /// Mark `pair` as the current selection. Returns the cached quote, if
    /// any; `None` means a request should be made.
    pub fn select(&mut self, pair: TransferPair) -> Option<TransferFee> {
        self.selected = Some(pair);
        self.cache.get(&pair).copied()
    }

    /// Store a finished request. Returns whether it matches the current
    /// selection; stale results must not be displayed.
    pub fn record(&mut self, pair: TransferPair, result: &Result<TransferFee, FeeEstimateError>) -> bool {
        if let Ok(fee) = result {
            self.cache.insert(pair, *fee);
        }
        let is_current = self.selected == Some(pair);
        if !is_current {
            debug!("Discarding superseded fee quote for {:?}", pair);
        }
        is_current
    }

    /// Quote for the current selection, if known.
    pub fn current(&self) -> Option<TransferFee> {
        self.selected.and_then(|pair| self.cache.get(&pair).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LspConfig;
    use crate::lsp::client::mock::MockLspClient;
    use crate::lsp::client::BlocktankClient;
    use crate::lsp::FeeEstimateResponse;
    use crate::test_utils::serve_once;

    fn pair(client: u64, lsp: u64) -> TransferPair {
        TransferPair {
            client_balance_sat: client,
            lsp_balance_sat: lsp,
        }
    }

    fn lsp_config(base_url: String) -> LspConfig {
        LspConfig {
            base_url,
            fx_url: String::new(),
            request_timeout_secs: 5,
            fee_quote_timeout_secs: 5,
            source: "bitkit".to_string(),
            currency: "EUR".to_string(),
        }
    }

    #[tokio::test]
    async fn test_estimate_fee_success() {
        let mock = MockLspClient::new();
        let fee = TransferFeeEstimator::default()
            .estimate_fee(&mock, 100_000, 50_000)
            .await
            .unwrap();
        assert_eq!(fee.fee_sat, 2_500);
        assert_eq!(fee.network_fee_sat, 1_500);
        assert_eq!(fee.service_fee_sat, 1_000);

        let calls = mock.fee_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].lsp_balance_sat, 100_000);
        assert_eq!(calls[0].client_balance_sat, 50_000);
        assert_eq!(calls[0].channel_expiry_weeks, 6);
        assert!(calls[0].zero_reserve);
    }

    #[tokio::test]
    async fn test_estimate_fee_upstream_error_keeps_message() {
        let mut mock = MockLspClient::new();
        mock.fee = Err("Channel size check failed".to_string());
        let err = TransferFeeEstimator::default()
            .estimate_fee(&mock, 100_000, 50_000)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            FeeEstimateError::Upstream {
                message: "Channel size check failed".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_estimate_fee_times_out() {
        let mut mock = MockLspClient::new();
        mock.delay = Some(Duration::from_millis(500));
        let estimator = TransferFeeEstimator::new(Duration::from_millis(20), 6, "bitkit");
        let err = estimator.estimate_fee(&mock, 100_000, 0).await.unwrap_err();
        assert_eq!(err, FeeEstimateError::Timeout { timeout_ms: 20 });
        assert_eq!(err.to_string(), "Fee quote timed out after 20ms");
    }

    #[tokio::test]
    async fn test_estimate_fee_http_error_message() {
        let base_url = serve_once(
            "400 Bad Request",
            r#"{"message": "lspBalanceSat must be at least 10000"}"#,
        )
        .await;
        let client = BlocktankClient::new(&lsp_config(base_url)).unwrap();
        let err = TransferFeeEstimator::default()
            .estimate_fee(&client, 5_000, 0)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "lspBalanceSat must be at least 10000");
    }

    #[tokio::test]
    async fn test_estimate_fee_http_success() {
        let base_url = serve_once(
            "200 OK",
            r#"{"feeSat": 4321, "networkFeeSat": 321, "serviceFeeSat": 4000, "min0ConfTxFee": {"satPerVByte": 2}}"#,
        )
        .await;
        let client = BlocktankClient::new(&lsp_config(base_url)).unwrap();
        let fee = TransferFeeEstimator::default()
            .estimate_fee(&client, 200_000, 100_000)
            .await
            .unwrap();
        assert_eq!(fee.fee_sat, 4321);
        assert_eq!(fee.service_fee_sat, 4000);
    }

    #[test]
    fn test_quotes_cache_and_select() {
        let mut quotes = FeeQuotes::default();
        let fee = TransferFee {
            fee_sat: 1_000,
            network_fee_sat: 0,
            service_fee_sat: 1_000,
        };

        assert_eq!(quotes.select(pair(10, 20)), None);
        assert!(quotes.record(pair(10, 20), &Ok(fee)));
        assert_eq!(quotes.current(), Some(fee));

        // Coming back to a known pair needs no request
        assert_eq!(quotes.select(pair(11, 20)), None);
        assert_eq!(quotes.current(), None);
        assert_eq!(quotes.select(pair(10, 20)), Some(fee));
    }

    #[test]
    fn test_quotes_last_request_wins() {
        let mut quotes = FeeQuotes::default();
        let first = TransferFee {
            fee_sat: 1,
            network_fee_sat: 0,
            service_fee_sat: 1,
        };
        let second = TransferFee {
            fee_sat: 2,
            network_fee_sat: 0,
            service_fee_sat: 2,
        };

        quotes.select(pair(1, 1));
        quotes.select(pair(2, 2));
        // The newer request resolves first
        assert!(quotes.record(pair(2, 2), &Ok(second)));
        // The older one arrives late and is not applied
        assert!(!quotes.record(pair(1, 1), &Ok(first)));
        assert_eq!(quotes.current(), Some(second));
        // ...but it is cached for later
        assert_eq!(quotes.select(pair(1, 1)), Some(first));
    }

    #[test]
    fn test_quotes_errors_not_cached() {
        let mut quotes = FeeQuotes::default();
        quotes.select(pair(5, 5));
        let failed: Result<TransferFee, FeeEstimateError> = Err(FeeEstimateError::Upstream {
            message: "boom".to_string(),
        });
        assert!(quotes.record(pair(5, 5), &failed));
        assert_eq!(quotes.current(), None);
        assert_eq!(quotes.select(pair(5, 5)), None);
    }

    #[tokio::test]
    async fn test_mock_response_shape() {
        let mut mock = MockLspClient::new();
        mock.fee = Ok(FeeEstimateResponse {
            fee_sat: 7,
            network_fee_sat: 3,
            service_fee_sat: 4,
        });
        let fee = TransferFeeEstimator::default()
            .estimate_fee(&mock, 1, 1)
            .await
            .unwrap();
        assert_eq!(fee.fee_sat, 7);
    }
}
