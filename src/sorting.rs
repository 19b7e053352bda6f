// sorting.rs - Timeframe scaling, ordering and filtering of opportunities

use crate::core::{Opportunity, SpreadMetrics};
use crate::cross_exchange::{spread_metrics, ArbSuggestion};
use crate::utils::scale_rate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::{fmt, str::FromStr};

const HOURS_IN_DAY: f64 = 24.0;
const DAYS_IN_WEEK: f64 = 7.0;
const DAYS_IN_YEAR: f64 = 365.0;

/// Period the per-hour rates are scaled to for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Timeframe {
    #[default]
    #[serde(rename = "1h")]
    Hour,
    #[serde(rename = "8h")]
    EightHours,
    #[serde(rename = "1d")]
    Day,
    #[serde(rename = "1w")]
    Week,
    #[serde(rename = "1y")]
    Year,
}

impl Timeframe {
    pub const ALL: [Timeframe; 5] = [
        Timeframe::Hour,
        Timeframe::EightHours,
        Timeframe::Day,
        Timeframe::Week,
        Timeframe::Year,
    ];

    pub fn hours(&self) -> f64 {
        match self {
            Timeframe::Hour => 1.0,
            Timeframe::EightHours => 8.0,
            Timeframe::Day => HOURS_IN_DAY,
            Timeframe::Week => HOURS_IN_DAY * DAYS_IN_WEEK,
            Timeframe::Year => HOURS_IN_DAY * DAYS_IN_YEAR,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::Hour => "Hourly",
            Timeframe::EightHours => "8 Hours",
            Timeframe::Day => "Day",
            Timeframe::Week => "Week",
            Timeframe::Year => "Year",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Timeframe::Hour => "1h",
            Timeframe::EightHours => "8h",
            Timeframe::Day => "1d",
            Timeframe::Week => "1w",
            Timeframe::Year => "1y",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        Timeframe::ALL
            .into_iter()
            .find(|tf| tf.code() == s)
            .ok_or_else(|| format!("Unknown timeframe: {}", s))
    }
}

/// Sortable columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Symbol,
    RateA,
    RateANext,
    RateB,
    Spread,
    SpreadAbs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Active sort column and direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self { key: SortKey::SpreadAbs, direction: SortDirection::Desc }
    }
}

impl SortState {
    /// Clicking the active column flips direction; a new column starts
    /// ascending for symbols and descending for numbers.
    pub fn toggle(self, key: SortKey) -> Self {
        if self.key == key {
            return Self { key, direction: self.direction.flip() };
        }
        let direction = if key == SortKey::Symbol {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        };
        Self { key, direction }
    }
}

enum Comparable {
    Str(String),
    Num(f64),
    Missing,
}

fn value_for(op: &Opportunity, key: SortKey, hours: f64) -> Comparable {
    let value = match key {
        SortKey::Symbol => return Comparable::Str(op.symbol.to_uppercase()),
        SortKey::RateA => scale_rate(Some(op.rate_a), hours),
        SortKey::RateANext => scale_rate(op.rate_a_next, hours),
        SortKey::RateB => scale_rate(Some(op.rate_b), hours),
        SortKey::Spread => scale_rate(Some(op.rate_a), hours)
            .zip(scale_rate(Some(op.rate_b), hours))
            .map(|(a, b)| a - b),
        SortKey::SpreadAbs => scale_rate(Some(op.rate_a), hours)
            .zip(scale_rate(Some(op.rate_b), hours))
            .map(|(a, b)| (a - b).abs()),
    };

    match value {
        Some(v) if v.is_finite() => Comparable::Num(v),
        _ => Comparable::Missing,
    }
}

fn compare_comparable(a: &Comparable, b: &Comparable, direction: SortDirection) -> Ordering {
    let ordering = match (a, b) {
        // Missing values sink regardless of direction
        (Comparable::Missing, Comparable::Missing) => return Ordering::Equal,
        (Comparable::Missing, _) => return Ordering::Greater,
        (_, Comparable::Missing) => return Ordering::Less,
        (Comparable::Str(x), Comparable::Str(y)) => x.cmp(y),
        (Comparable::Num(x), Comparable::Num(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Comparable::Str(_), Comparable::Num(_)) => return Ordering::Less,
        (Comparable::Num(_), Comparable::Str(_)) => return Ordering::Greater,
    };

    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

/// Total order over opportunities for the given column, direction and
/// timeframe.
pub fn compare(
    a: &Opportunity,
    b: &Opportunity,
    key: SortKey,
    direction: SortDirection,
    hours: f64,
) -> Ordering {
    compare_comparable(&value_for(a, key, hours), &value_for(b, key, hours), direction)
}

/// Stable in-place sort
pub fn sort_opportunities(opportunities: &mut [Opportunity], sort: SortState, hours: f64) {
    opportunities.sort_by(|a, b| compare(a, b, sort.key, sort.direction, hours));
}

/// Everything the host can change without re-fetching
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewOptions {
    pub timeframe: Timeframe,
    pub sort: SortState,
    pub search: String,
}

/// Filter by case-insensitive symbol substring, then sort. Pure: the input
/// snapshot is never reordered.
pub fn apply_view<'a>(opportunities: &'a [Opportunity], view: &ViewOptions) -> Vec<&'a Opportunity> {
    let query = view.search.trim().to_uppercase();
    let hours = view.timeframe.hours();

    let mut rows: Vec<&Opportunity> = opportunities
        .iter()
        .filter(|op| query.is_empty() || op.symbol.to_uppercase().contains(&query))
        .collect();
    rows.sort_by(|a, b| compare(a, b, view.sort.key, view.sort.direction, hours));
    rows
}

/// Values of one table row at the selected timeframe
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRow {
    pub symbol: String,
    pub rate_a: Option<f64>,
    pub rate_a_next: Option<f64>,
    pub rate_b: Option<f64>,
    pub metrics: SpreadMetrics,
    pub suggestion: Option<ArbSuggestion>,
}

impl DisplayRow {
    pub fn from_opportunity(op: &Opportunity, timeframe: Timeframe) -> Self {
        let hours = timeframe.hours();
        let rate_a = scale_rate(Some(op.rate_a), hours);
        let rate_b = scale_rate(Some(op.rate_b), hours);

        Self {
            symbol: op.symbol.clone(),
            rate_a,
            rate_a_next: scale_rate(op.rate_a_next, hours),
            rate_b,
            metrics: spread_metrics(op.rate_a * hours, op.rate_b * hours),
            suggestion: ArbSuggestion::from_rates(rate_a, rate_b),
        }
    }
}
