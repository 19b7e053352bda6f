// cross_exchange.rs - Joins the two funding-rate books into spread opportunities

use crate::core::*;
use crate::exchange_types::Exchange;
use crate::symbol_mapper::{reconcile, reconcile_all};
use crate::utils::normalize_rate;
use log::debug;
use std::collections::HashMap;

const PERCENT_SCALE: f64 = 100.0;

/// Snapshots of one exchange keyed by reconciled symbol.
///
/// When two raw symbols reconcile to the same key, the one later in the
/// payload replaces the earlier one; key order stays first-seen.
#[derive(Debug, Clone, Default)]
pub struct SnapshotBook {
    entries: HashMap<String, RateSnapshot>,
    order: Vec<String>,
}

impl SnapshotBook {
    pub fn from_snapshots(snapshots: Vec<RateSnapshot>) -> Self {
        let mut book = Self::default();
        for snapshot in snapshots {
            book.insert(snapshot);
        }
        book
    }

    fn insert(&mut self, snapshot: RateSnapshot) {
        let key = reconcile(&snapshot.symbol);
        if key.is_empty() {
            return;
        }
        if let Some(previous) = self.entries.insert(key.clone(), snapshot) {
            debug!("{} symbol {} collapsed onto {}", previous.exchange, previous.symbol, key);
        } else {
            self.order.push(key);
        }
    }

    pub fn get(&self, symbol: &str) -> Option<&RateSnapshot> {
        self.entries.get(symbol)
    }

    /// Reconciled symbols in first-seen order
    pub fn symbols(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Pre-filters applied to the driving symbol list before the join
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolFilter {
    /// Only the first `n` driving symbols are considered
    pub max_symbols: Option<usize>,
    /// Explicit allow-list replacing the driving side's universe
    pub target_symbols: Option<Vec<String>>,
}

impl SymbolFilter {
    /// Driving keys for the join. Side B (Lighter) drives unless an allow-list
    /// is configured.
    pub fn driving_symbols(&self, driving: &SnapshotBook) -> Vec<String> {
        let mut symbols = match &self.target_symbols {
            Some(targets) if !targets.is_empty() => reconcile_all(targets),
            _ => driving.symbols().to_vec(),
        };
        if let Some(max) = self.max_symbols {
            symbols.truncate(max);
        }
        symbols
    }
}

/// Compute spread, direction and relative spread between two per-hour rates.
///
/// The relative spread is measured against side B. When B is zero the
/// reference falls back to side A; when both are zero there is no reference
/// and the percentage is `None`. Non-finite results are `None` as well.
pub fn spread_metrics(rate_a: f64, rate_b: f64) -> SpreadMetrics {
    let spread = rate_a - rate_b;
    let reference = if rate_b != 0.0 { rate_b } else { rate_a };
    let percentage = if reference == 0.0 {
        None
    } else {
        Some(spread / reference * PERCENT_SCALE).filter(|p| p.is_finite())
    };

    SpreadMetrics {
        spread,
        direction: SpreadDirection::from_spread(spread),
        percentage,
    }
}

/// Join both books on the reconciled symbol.
///
/// Instruments missing on either side, or without a primary rate on either
/// side, are dropped. Output order is the driving order, which callers must
/// not rely on.
pub fn build_opportunities(
    side_a: &SnapshotBook,
    side_b: &SnapshotBook,
    filter: &SymbolFilter,
) -> Vec<Opportunity> {
    let driving = filter.driving_symbols(side_b);
    let mut opportunities = Vec::with_capacity(driving.len());

    for symbol in &driving {
        let Some(entry_b) = side_b.get(symbol) else {
            continue;
        };
        let Some(entry_a) = side_a.get(symbol) else {
            continue;
        };

        let rate_a = normalize_rate(entry_a.raw_rate, entry_a.window_hours);
        let rate_b = normalize_rate(entry_b.raw_rate, entry_b.window_hours);
        let (Some(rate_a), Some(rate_b), Some(raw_rate_b)) = (rate_a, rate_b, entry_b.raw_rate) else {
            continue;
        };

        let metrics = spread_metrics(rate_a, rate_b);
        opportunities.push(Opportunity {
            symbol: symbol.clone(),
            symbol_a: entry_a.symbol.clone(),
            symbol_b: entry_b.symbol.clone(),
            rate_a,
            rate_a_next: normalize_rate(entry_a.next_raw_rate, entry_a.window_hours),
            rate_b,
            raw_rate_b,
            window_hours_a: entry_a.window_hours,
            window_hours_b: entry_b.window_hours,
            spread: metrics.spread,
            spread_direction: metrics.direction,
            spread_percentage: metrics.percentage,
        });
    }

    debug!(
        "Joined {} opportunities from {} driving symbols ({} on A, {} on B)",
        opportunities.len(),
        driving.len(),
        side_a.len(),
        side_b.len()
    );

    opportunities
}

/// Suggested legs for collecting the funding spread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArbSuggestion {
    pub short: Exchange,
    pub long: Exchange,
}

impl ArbSuggestion {
    /// Short the side paying the higher funding rate, long the other one
    pub fn from_rates(rate_a: Option<f64>, rate_b: Option<f64>) -> Option<Self> {
        let (a, b) = (rate_a?, rate_b?);
        if a > b {
            Some(Self { short: Exchange::Pacifica, long: Exchange::Lighter })
        } else if a < b {
            Some(Self { short: Exchange::Lighter, long: Exchange::Pacifica })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pacifica(symbol: &str, rate: Option<f64>) -> RateSnapshot {
        RateSnapshot::new(Exchange::Pacifica, symbol, rate)
    }

    fn lighter(symbol: &str, rate: Option<f64>) -> RateSnapshot {
        RateSnapshot::new(Exchange::Lighter, symbol, rate)
    }

    #[test]
    fn btc_example_joins_and_normalizes() {
        let a = SnapshotBook::from_snapshots(vec![pacifica("BTC-PERP", Some(0.0001))]);
        let b = SnapshotBook::from_snapshots(vec![lighter("BTC", Some(0.0006))]);

        let opportunities = build_opportunities(&a, &b, &SymbolFilter::default());
        assert_eq!(opportunities.len(), 1);

        let op = &opportunities[0];
        assert_eq!(op.symbol, "BTC");
        assert_eq!(op.symbol_a, "BTC-PERP");
        assert_eq!(op.rate_a, 0.0001);
        assert!((op.rate_b - 0.000075).abs() < 1e-18);
        assert!((op.spread - 0.000025).abs() < 1e-15);
        assert_eq!(op.spread_direction, SpreadDirection::ALeads);
        assert_eq!(op.raw_rate_b, 0.0006);
    }

    #[test]
    fn one_sided_instruments_are_dropped() {
        let a = SnapshotBook::from_snapshots(vec![pacifica("BTC", Some(0.0001))]);
        let b = SnapshotBook::from_snapshots(vec![
            lighter("BTC", Some(0.0008)),
            lighter("DOGE", Some(0.0004)),
        ]);

        let symbols: Vec<String> = build_opportunities(&a, &b, &SymbolFilter::default())
            .into_iter()
            .map(|op| op.symbol)
            .collect();
        assert_eq!(symbols, vec!["BTC".to_string()]);
    }

    #[test]
    fn null_rates_exclude_the_instrument() {
        let a = SnapshotBook::from_snapshots(vec![
            pacifica("ETH", None),
            pacifica("SOL", Some(0.0002)),
        ]);
        let b = SnapshotBook::from_snapshots(vec![lighter("ETH", Some(0.001)), lighter("SOL", None)]);

        assert!(build_opportunities(&a, &b, &SymbolFilter::default()).is_empty());
    }

    #[test]
    fn later_payload_entry_wins_on_collision() {
        let a = SnapshotBook::from_snapshots(vec![
            pacifica("BTC", Some(0.0001)),
            pacifica("BTC-PERP", Some(0.0003)),
        ]);
        assert_eq!(a.len(), 1);
        assert_eq!(a.get("BTC").unwrap().raw_rate, Some(0.0003));
        assert_eq!(a.get("BTC").unwrap().symbol, "BTC-PERP");
    }

    #[test]
    fn thousand_prefixed_symbols_join() {
        let a = SnapshotBook::from_snapshots(vec![pacifica("kPEPE", Some(0.0001))]);
        let b = SnapshotBook::from_snapshots(vec![lighter("1000PEPE", Some(0.0008))]);
        let opportunities = build_opportunities(&a, &b, &SymbolFilter::default());
        assert_eq!(opportunities.len(), 1);
        assert_eq!(opportunities[0].symbol, "KPEPE");
        assert_eq!(opportunities[0].spread_direction, SpreadDirection::Neutral);
    }

    #[test]
    fn filters_apply_to_driving_keys() {
        let a = SnapshotBook::from_snapshots(vec![
            pacifica("BTC", Some(0.0001)),
            pacifica("ETH", Some(0.0001)),
            pacifica("SOL", Some(0.0001)),
        ]);
        let b = SnapshotBook::from_snapshots(vec![
            lighter("SOL", Some(0.0001)),
            lighter("ETH", Some(0.0001)),
            lighter("BTC", Some(0.0001)),
        ]);

        let capped = SymbolFilter { max_symbols: Some(2), target_symbols: None };
        let symbols: Vec<String> =
            build_opportunities(&a, &b, &capped).into_iter().map(|op| op.symbol).collect();
        assert_eq!(symbols, vec!["SOL".to_string(), "ETH".to_string()]);

        let none = SymbolFilter { max_symbols: Some(0), target_symbols: None };
        assert!(build_opportunities(&a, &b, &none).is_empty());

        let targeted = SymbolFilter {
            max_symbols: None,
            target_symbols: Some(vec!["btc-perp".into(), "BTC".into(), "XRP".into()]),
        };
        let symbols: Vec<String> =
            build_opportunities(&a, &b, &targeted).into_iter().map(|op| op.symbol).collect();
        assert_eq!(symbols, vec!["BTC".to_string()]);
    }

    #[test]
    fn join_never_exceeds_smaller_side() {
        let a = SnapshotBook::from_snapshots(
            ["BTC", "ETH", "SOL", "DOGE"].iter().map(|s| pacifica(s, Some(0.0001))).collect(),
        );
        let b = SnapshotBook::from_snapshots(
            ["ETH-PERP", "eth", "WIF", "DOGE"].iter().map(|s| lighter(s, Some(0.0002))).collect(),
        );
        let opportunities = build_opportunities(&a, &b, &SymbolFilter::default());
        assert!(opportunities.len() <= a.len().min(b.len()));
        for op in &opportunities {
            assert!(a.get(&op.symbol).is_some() && b.get(&op.symbol).is_some());
        }
    }

    #[test]
    fn spread_sign_law_holds() {
        for &(a, b) in &[(0.001, 0.0005), (0.0001, 0.0009), (0.0003, 0.0003), (-0.001, 0.0)] {
            let metrics = spread_metrics(a, b);
            let expected = if a > b {
                SpreadDirection::ALeads
            } else if a < b {
                SpreadDirection::BLeads
            } else {
                SpreadDirection::Neutral
            };
            assert_eq!(metrics.direction, expected);
        }
    }

    #[test]
    fn zero_reference_never_yields_non_finite_percentage() {
        let metrics = spread_metrics(0.0001, 0.0);
        assert_eq!(metrics.percentage, Some(100.0));

        let metrics = spread_metrics(0.0, 0.0);
        assert_eq!(metrics.percentage, None);
        assert_eq!(metrics.direction, SpreadDirection::Neutral);

        let metrics = spread_metrics(0.0003, 0.0002);
        assert!((metrics.percentage.unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn suggestion_shorts_the_higher_rate() {
        let suggestion = ArbSuggestion::from_rates(Some(0.002), Some(0.001)).unwrap();
        assert_eq!(suggestion.short, Exchange::Pacifica);
        assert_eq!(suggestion.long, Exchange::Lighter);
        assert_eq!(
            ArbSuggestion::from_rates(Some(0.0), Some(0.001)).unwrap().short,
            Exchange::Lighter
        );
        assert!(ArbSuggestion::from_rates(Some(0.001), Some(0.001)).is_none());
        assert!(ArbSuggestion::from_rates(None, Some(0.001)).is_none());
    }
}
