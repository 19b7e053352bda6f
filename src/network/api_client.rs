// network/api_client.rs - REST adapters for the two funding-rate sources

use crate::config::SourcesConfig;
use crate::core::*;
use crate::exchange_types::{Exchange, LighterFundingRatesResponse, PacificaMarketInfoResponse};
use crate::utils::parse_rate;
use async_trait::async_trait;
use log::{debug, info};
use reqwest::header::{ACCEPT, CACHE_CONTROL, PRAGMA};
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A market-data source producing one funding-rate snapshot per instrument
#[async_trait]
pub trait RateSource: Send + Sync {
    fn exchange(&self) -> Exchange;

    /// Fetch the current rates. Resolves to `AppError::Cancelled` as soon as
    /// `cancel` fires.
    async fn fetch(&self, cancel: &CancellationToken) -> Result<Vec<RateSnapshot>, AppError>;
}

/// Build the shared HTTP client. Responses are never cached locally.
pub fn build_http_client(config: &SourcesConfig) -> Result<Client, AppError> {
    Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
        .build()
        .map_err(|e| AppError::Other(format!("Failed to build HTTP client: {}", e)))
}

/// GET `url` and return the body of a 2xx response
async fn fetch_body(client: &Client, exchange: Exchange, url: &str) -> Result<String, AppError> {
    debug!("Fetching {} funding data from {}", exchange, url);

    let response = client
        .get(url)
        .header(ACCEPT, "application/json")
        .header(CACHE_CONTROL, "no-cache")
        .header(PRAGMA, "no-cache")
        .send()
        .await
        .map_err(|source| AppError::RequestError { exchange, source })?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::TransportError {
            exchange,
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("unknown status").to_string(),
        });
    }

    response
        .text()
        .await
        .map_err(|source| AppError::RequestError { exchange, source })
}

/// Race a request against the cancellation token
async fn fetch_cancellable(
    client: &Client,
    exchange: Exchange,
    url: &str,
    cancel: &CancellationToken,
) -> Result<String, AppError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AppError::Cancelled),
        body = fetch_body(client, exchange, url) => body,
    }
}

/// Translate a Pacifica market-info payload into snapshots
pub fn parse_pacifica_payload(body: &str) -> Result<Vec<RateSnapshot>, AppError> {
    let exchange = Exchange::Pacifica;
    let payload: PacificaMarketInfoResponse =
        serde_json::from_str(body).map_err(|e| AppError::SchemaError {
            exchange,
            reason: e.to_string(),
        })?;

    if !payload.success {
        return Err(AppError::SchemaError {
            exchange,
            reason: format!("success flag is false (error: {:?})", payload.error),
        });
    }
    let data = payload.data.ok_or_else(|| AppError::SchemaError {
        exchange,
        reason: "missing market list".to_string(),
    })?;

    Ok(data
        .into_iter()
        .map(|entry| {
            RateSnapshot::new(exchange, entry.symbol, parse_rate(entry.funding_rate.as_ref()))
                .with_next_rate(parse_rate(entry.next_funding_rate.as_ref()))
        })
        .collect())
}

/// Translate a Lighter funding-rate payload into snapshots, keeping only the
/// records Lighter publishes for itself.
pub fn parse_lighter_payload(body: &str) -> Result<Vec<RateSnapshot>, AppError> {
    let exchange = Exchange::Lighter;
    let payload: LighterFundingRatesResponse =
        serde_json::from_str(body).map_err(|e| AppError::SchemaError {
            exchange,
            reason: e.to_string(),
        })?;

    let rates = payload.funding_rates.ok_or_else(|| AppError::SchemaError {
        exchange,
        reason: format!(
            "missing funding rate list (code: {:?}, message: {:?})",
            payload.code, payload.message
        ),
    })?;

    Ok(rates
        .into_iter()
        .filter(|entry| entry.is_from_lighter())
        .map(|entry| RateSnapshot::new(exchange, entry.symbol, parse_rate(entry.rate.as_ref())))
        .collect())
}

/// Side A: Pacifica market info, hourly rates
pub struct PacificaSource {
    client: Client,
    url: String,
}

impl PacificaSource {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), PACIFICA_MARKET_INFO_PATH),
        }
    }
}

#[async_trait]
impl RateSource for PacificaSource {
    fn exchange(&self) -> Exchange {
        Exchange::Pacifica
    }

    async fn fetch(&self, cancel: &CancellationToken) -> Result<Vec<RateSnapshot>, AppError> {
        let body = fetch_cancellable(&self.client, self.exchange(), &self.url, cancel).await?;
        let snapshots = parse_pacifica_payload(&body)?;
        info!("Pacifica returned {} markets", snapshots.len());
        Ok(snapshots)
    }
}

/// Side B: Lighter funding rates, 8-hour rates
pub struct LighterSource {
    client: Client,
    url: String,
}

impl LighterSource {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), LIGHTER_FUNDING_RATES_PATH),
        }
    }
}

#[async_trait]
impl RateSource for LighterSource {
    fn exchange(&self) -> Exchange {
        Exchange::Lighter
    }

    async fn fetch(&self, cancel: &CancellationToken) -> Result<Vec<RateSnapshot>, AppError> {
        let body = fetch_cancellable(&self.client, self.exchange(), &self.url, cancel).await?;
        let snapshots = parse_lighter_payload(&body)?;
        info!("Lighter returned {} funding rates", snapshots.len());
        Ok(snapshots)
    }
}
