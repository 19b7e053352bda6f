use async_trait::async_trait;
use fundfury::network::api_client::{parse_lighter_payload, parse_pacifica_payload};
use fundfury::{
    apply_view, build_opportunities, AppError, DisplayRow, Exchange, FundingMonitor, MonitorOptions,
    MonitorState, RateSnapshot, RateSource, SnapshotBook, SpreadDirection, SymbolFilter, Timeframe,
    ViewOptions,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const PACIFICA_BODY: &str = r#"{
    "success": true,
    "data": [
        {"symbol": "BTC", "funding_rate": "0.0001", "next_funding_rate": "0.00011"},
        {"symbol": "ETH", "funding_rate": "0.00002", "next_funding_rate": null},
        {"symbol": "kPEPE", "funding_rate": "-0.00005", "next_funding_rate": "-0.00004"},
        {"symbol": "SOL", "funding_rate": "", "next_funding_rate": "0.0001"}
    ]
}"#;

const LIGHTER_BODY: &str = r#"{
    "code": 200,
    "funding_rates": [
        {"market_id": 1, "exchange": "lighter", "symbol": "BTC", "rate": 0.0006},
        {"market_id": 2, "exchange": "lighter", "symbol": "ETH", "rate": 0.00032},
        {"market_id": 3, "exchange": "lighter", "symbol": "1000PEPE", "rate": 0.0},
        {"market_id": 4, "exchange": "lighter", "symbol": "SOL", "rate": 0.0004},
        {"market_id": 5, "exchange": "lighter", "symbol": "DOGE", "rate": 0.0008},
        {"market_id": 1, "exchange": "binance", "symbol": "BTC", "rate": 0.01}
    ]
}"#;

fn books() -> (SnapshotBook, SnapshotBook) {
    let a = parse_pacifica_payload(PACIFICA_BODY).unwrap();
    let b = parse_lighter_payload(LIGHTER_BODY).unwrap();
    (SnapshotBook::from_snapshots(a), SnapshotBook::from_snapshots(b))
}

#[test]
fn payloads_join_into_normalized_opportunities() {
    let (a, b) = books();
    let opportunities = build_opportunities(&a, &b, &SymbolFilter::default());

    let symbols: Vec<_> = opportunities.iter().map(|o| o.symbol.as_str()).collect();
    assert_eq!(symbols, ["BTC", "ETH", "KPEPE"]);
    assert!(opportunities.len() <= a.len().min(b.len()));

    let btc = &opportunities[0];
    assert!((btc.rate_b - 0.000075).abs() < 1e-12);
    assert!((btc.spread - 0.000025).abs() < 1e-12);
    assert_eq!(btc.spread_direction, SpreadDirection::ALeads);
    assert!((btc.spread_percentage.unwrap() - 33.3333).abs() < 1e-3);
    assert_eq!(btc.raw_rate_b, 0.0006);

    let eth = &opportunities[1];
    assert_eq!(eth.spread_direction, SpreadDirection::BLeads);
    assert_eq!(eth.rate_a_next, None);

    // Lighter publishes 0 for PEPE, so the reference falls back to Pacifica
    let pepe = &opportunities[2];
    assert_eq!(pepe.symbol_b, "1000PEPE");
    assert_eq!(pepe.spread_percentage, Some(100.0));
}

#[test]
fn daily_view_scales_and_orders_rows() {
    let (a, b) = books();
    let opportunities = build_opportunities(&a, &b, &SymbolFilter::default());

    let view = ViewOptions { timeframe: Timeframe::Day, ..Default::default() };
    let rows: Vec<_> = apply_view(&opportunities, &view)
        .into_iter()
        .map(|op| DisplayRow::from_opportunity(op, view.timeframe))
        .collect();

    let symbols: Vec<_> = rows.iter().map(|row| row.symbol.as_str()).collect();
    assert_eq!(symbols, ["KPEPE", "BTC", "ETH"]);

    let btc = &rows[1];
    assert!((btc.rate_a.unwrap() - 0.0024).abs() < 1e-12);
    assert!((btc.rate_b.unwrap() - 0.0018).abs() < 1e-12);
    assert!((btc.metrics.spread - 0.0006).abs() < 1e-12);
    assert_eq!(btc.suggestion.map(|s| s.short), Some(Exchange::Pacifica));

    let searched = ViewOptions { search: "pepe".into(), ..view };
    let hits = apply_view(&opportunities, &searched);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].symbol, "KPEPE");
}

/// Source serving a fixed payload through the real parser
struct PayloadSource {
    exchange: Exchange,
    body: &'static str,
}

#[async_trait]
impl RateSource for PayloadSource {
    fn exchange(&self) -> Exchange {
        self.exchange
    }

    async fn fetch(&self, cancel: &CancellationToken) -> Result<Vec<RateSnapshot>, AppError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(AppError::Cancelled),
            _ = tokio::time::sleep(Duration::from_millis(20)) => match self.exchange {
                Exchange::Pacifica => parse_pacifica_payload(self.body),
                Exchange::Lighter => parse_lighter_payload(self.body),
            },
        }
    }
}

#[tokio::test(start_paused = true)]
async fn monitor_runs_full_cycle_over_payloads() {
    let monitor = FundingMonitor::new(
        Arc::new(PayloadSource { exchange: Exchange::Pacifica, body: PACIFICA_BODY }),
        Arc::new(PayloadSource { exchange: Exchange::Lighter, body: LIGHTER_BODY }),
        MonitorOptions { filter: SymbolFilter::default(), refresh_interval: Some(Duration::from_secs(30)) },
    );
    let mut updates = monitor.subscribe();

    monitor.start();
    updates
        .wait_for(|snapshot| snapshot.state == MonitorState::Ready)
        .await
        .unwrap();

    let snapshot = monitor.snapshot();
    let symbols: Vec<_> = snapshot.opportunities.iter().map(|o| o.symbol.as_str()).collect();
    // descending absolute spread per hour
    assert_eq!(symbols, ["KPEPE", "BTC", "ETH"]);
    assert_eq!(snapshot.completed_cycles, 1);

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(monitor.snapshot().completed_cycles, 2);

    monitor.shutdown();
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(monitor.snapshot().completed_cycles, 2);
}

#[tokio::test(start_paused = true)]
async fn failing_source_surfaces_retry_message() {
    let monitor = FundingMonitor::new(
        Arc::new(PayloadSource { exchange: Exchange::Pacifica, body: r#"{"success": false, "data": null}"# }),
        Arc::new(PayloadSource { exchange: Exchange::Lighter, body: LIGHTER_BODY }),
        MonitorOptions::default(),
    );

    monitor.refetch().await;
    let snapshot = monitor.snapshot();
    assert_eq!(snapshot.state, MonitorState::Error);
    assert!(snapshot.opportunities.is_empty());
    assert!(snapshot.last_updated.is_none());
    let message = snapshot.error.unwrap();
    assert!(message.starts_with("Pacifica sent an unexpected response."), "{message}");
}
