use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use common::{Error, IndicatorSource, Result};

const RSI_URL: &str = "https://api.twelvedata.com/rsi";

/// Per-request timeout so one stalled upstream call never wedges a tick.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// REST client for the TwelveData RSI endpoint.
pub struct TwelveDataClient {
    api_key: String,
    interval: String,
    period: u32,
    http: Client,
}

impl TwelveDataClient {
    pub fn new(api_key: impl Into<String>, interval: impl Into<String>, period: u32) -> Self {
        Self {
            api_key: api_key.into(),
            interval: interval.into(),
            period,
            http: Client::builder()
                .use_rustls_tls()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

#[async_trait]
impl IndicatorSource for TwelveDataClient {
    async fn latest_rsi(&self, symbol: &str) -> Result<Option<f64>> {
        let period = self.period.to_string();
        debug!(symbol = %symbol, interval = %self.interval, "Fetching RSI");

        let resp = self
            .http
            .get(RSI_URL)
            .query(&[
                ("symbol", symbol),
                ("interval", self.interval.as_str()),
                ("period", period.as_str()),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::Provider(format!("HTTP {status}: {body}")));
        }

        let mut parsed: RsiResponse = serde_json::from_str(&body)?;
        // TwelveData reports quota and symbol errors as 200s with a message.
        if let Some(message) = parsed.message.take() {
            return Err(Error::Provider(message));
        }

        Ok(extract_latest(parsed))
    }
}

fn extract_latest(resp: RsiResponse) -> Option<f64> {
    resp.values
        .into_iter()
        .flatten()
        .next()
        .and_then(|v| v.rsi.parse::<f64>().ok())
}

#[derive(Deserialize)]
struct RsiResponse {
    #[serde(default)]
    values: Option<Vec<RsiValue>>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct RsiValue {
    rsi: String,
}
