// core.rs - Shared constants, data model and error type

use crate::exchange_types::Exchange;
use serde::{Deserialize, Serialize};
use std::time::Duration;

//
// CONSTANTS
//

// Native funding windows
pub const PACIFICA_FUNDING_WINDOW_HOURS: f64 = 1.0;
pub const LIGHTER_FUNDING_WINDOW_HOURS: f64 = 8.0;

// Endpoints
pub const PACIFICA_BASE_URL: &str = "https://api.pacifica.fi";
pub const PACIFICA_MARKET_INFO_PATH: &str = "/api/v1/info";
pub const LIGHTER_BASE_URL: &str = "https://mainnet.zklighter.elliot.ai";
pub const LIGHTER_FUNDING_RATES_PATH: &str = "/api/v1/funding-rates";

// Environment overrides for the endpoints above
pub const PACIFICA_BASE_URL_ENV: &str = "PACIFICA_API_BASE_URL";
pub const LIGHTER_BASE_URL_ENV: &str = "LIGHTER_API_BASE_URL";
pub const TIMEFRAME_ENV: &str = "FUNDFURY_TIMEFRAME";

// Timeouts
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// Display precision
pub const FUNDING_RATE_PRECISION: usize = 6;
pub const SPREAD_PERCENT_PRECISION: usize = 4;

/// Rate as published by one exchange for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub exchange: Exchange,
    /// Symbol exactly as the exchange reported it
    pub symbol: String,
    /// Rate for the native window; `None` when not published or unparseable
    pub raw_rate: Option<f64>,
    pub next_raw_rate: Option<f64>,
    pub window_hours: f64,
}

impl RateSnapshot {
    pub fn new(exchange: Exchange, symbol: impl Into<String>, raw_rate: Option<f64>) -> Self {
        Self {
            exchange,
            symbol: symbol.into(),
            raw_rate,
            next_raw_rate: None,
            window_hours: exchange.window_hours(),
        }
    }

    pub fn with_next_rate(mut self, next_raw_rate: Option<f64>) -> Self {
        self.next_raw_rate = next_raw_rate;
        self
    }
}

/// Which side pays the higher funding rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpreadDirection {
    #[serde(rename = "A_leads")]
    ALeads,
    #[serde(rename = "B_leads")]
    BLeads,
    #[serde(rename = "neutral")]
    Neutral,
}

impl SpreadDirection {
    pub fn from_spread(spread: f64) -> Self {
        if spread > 0.0 {
            SpreadDirection::ALeads
        } else if spread < 0.0 {
            SpreadDirection::BLeads
        } else {
            SpreadDirection::Neutral
        }
    }
}

/// Spread between the two per-hour rates of one instrument
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadMetrics {
    pub spread: f64,
    pub direction: SpreadDirection,
    pub percentage: Option<f64>,
}

/// Joined record for an instrument listed on both exchanges. All rates are
/// per hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    /// Reconciled symbol used as the join key
    pub symbol: String,
    pub symbol_a: String,
    pub symbol_b: String,
    pub rate_a: f64,
    pub rate_a_next: Option<f64>,
    pub rate_b: f64,
    pub raw_rate_b: f64,
    pub window_hours_a: f64,
    pub window_hours_b: f64,
    pub spread: f64,
    pub spread_direction: SpreadDirection,
    pub spread_percentage: Option<f64>,
}

/// Error types that can occur in our application
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{exchange} request failed: {source}")]
    RequestError {
        exchange: Exchange,
        #[source]
        source: reqwest::Error,
    },

    #[error("{exchange} returned HTTP {status}: {reason}")]
    TransportError {
        exchange: Exchange,
        status: u16,
        reason: String,
    },

    #[error("{exchange} payload is not valid: {reason}")]
    SchemaError { exchange: Exchange, reason: String },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl AppError {
    /// Exchange the error originated from, if any
    pub fn exchange(&self) -> Option<Exchange> {
        match self {
            AppError::RequestError { exchange, .. }
            | AppError::TransportError { exchange, .. }
            | AppError::SchemaError { exchange, .. } => Some(*exchange),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_follows_sign() {
        assert_eq!(SpreadDirection::from_spread(0.1), SpreadDirection::ALeads);
        assert_eq!(SpreadDirection::from_spread(-0.1), SpreadDirection::BLeads);
        assert_eq!(SpreadDirection::from_spread(0.0), SpreadDirection::Neutral);
        assert_eq!(SpreadDirection::from_spread(-0.0), SpreadDirection::Neutral);
    }

    #[test]
    fn direction_serializes_with_wire_names() {
        let json = serde_json::to_string(&SpreadDirection::ALeads).unwrap();
        assert_eq!(json, "\"A_leads\"");
    }

    #[test]
    fn snapshot_takes_exchange_window() {
        let snapshot = RateSnapshot::new(Exchange::Lighter, "BTC", Some(0.0006));
        assert_eq!(snapshot.window_hours, 8.0);
        assert!(AppError::Cancelled.is_cancelled());
        assert_eq!(
            AppError::SchemaError { exchange: Exchange::Pacifica, reason: "x".into() }.exchange(),
            Some(Exchange::Pacifica)
        );
    }
}
