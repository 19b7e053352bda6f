// exchange_types.rs - Exchange identifiers and vendor wire formats

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, str::FromStr};

/// Exchange identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exchange {
    /// Side A: publishes hourly funding rates
    Pacifica,
    /// Side B: publishes 8-hour funding rates
    Lighter,
}

impl Exchange {
    /// Native funding window in hours
    pub fn window_hours(&self) -> f64 {
        match self {
            Exchange::Pacifica => crate::core::PACIFICA_FUNDING_WINDOW_HOURS,
            Exchange::Lighter => crate::core::LIGHTER_FUNDING_WINDOW_HOURS,
        }
    }

    /// Human readable name used in the terminal table
    pub fn label(&self) -> &'static str {
        match self {
            Exchange::Pacifica => "Pacifica",
            Exchange::Lighter => "Lighter",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Exchange::Pacifica => write!(f, "PACIFICA"),
            Exchange::Lighter => write!(f, "LIGHTER"),
        }
    }
}

impl FromStr for Exchange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PACIFICA" => Ok(Exchange::Pacifica),
            "LIGHTER" => Ok(Exchange::Lighter),
            _ => Err(format!("Unknown exchange: {}", s)),
        }
    }
}

//
// PACIFICA WIRE FORMAT
//

/// Response of `GET /api/v1/info`
#[derive(Debug, Clone, Deserialize)]
pub struct PacificaMarketInfoResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<Vec<PacificaMarketInfoEntry>>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub code: Option<Value>,
}

/// One market in the Pacifica info list. Numeric fields arrive string-encoded,
/// so they are kept as raw JSON values and parsed defensively.
#[derive(Debug, Clone, Deserialize)]
pub struct PacificaMarketInfoEntry {
    pub symbol: String,
    #[serde(default)]
    pub funding_rate: Option<Value>,
    #[serde(default)]
    pub next_funding_rate: Option<Value>,
    #[serde(default)]
    pub max_leverage: Option<Value>,
}

//
// LIGHTER WIRE FORMAT
//

/// Response of `GET /api/v1/funding-rates`
#[derive(Debug, Clone, Deserialize)]
pub struct LighterFundingRatesResponse {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub funding_rates: Option<Vec<LighterFundingRate>>,
}

/// One funding-rate record. Lighter republishes rates of other venues in the
/// same list, tagged by `exchange`.
#[derive(Debug, Clone, Deserialize)]
pub struct LighterFundingRate {
    #[serde(default)]
    pub market_id: Option<i64>,
    pub exchange: String,
    pub symbol: String,
    #[serde(default)]
    pub rate: Option<Value>,
}

impl LighterFundingRate {
    pub fn is_from_lighter(&self) -> bool {
        self.exchange.eq_ignore_ascii_case("lighter")
    }
}
