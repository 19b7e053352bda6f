// terminal_log.rs - Terminal rendering of the funding comparison table

use crate::config::DisplayConfig;
use crate::core::SpreadDirection;
use crate::cross_exchange::ArbSuggestion;
use crate::error_handling::{init_error_tracker, ErrorTracker};
use crate::exchange_types::Exchange;
use crate::monitor::{MonitorSnapshot, MonitorState};
use crate::sorting::{apply_view, DisplayRow, ViewOptions};
use crate::utils::{format_percentage, format_rate};
use colored::*;
use log::debug;
use std::fmt::Write as _;
use std::io::{self, Write};
use tokio::sync::watch;

const TITLE: &str = "FundFury Funding Arbitrage Monitor";
const SYMBOL_WIDTH: usize = 10;
const RATE_WIDTH: usize = 16;
const PERCENT_WIDTH: usize = 12;

pub fn clear_terminal() {
    print!("\x1B[2J\x1B[1;1H");
    let _ = io::stdout().flush();
}

fn suggestion_text(suggestion: Option<ArbSuggestion>) -> String {
    match suggestion {
        Some(s) => format!("Short {} / Long {}", s.short.label(), s.long.label()),
        None => String::from("-"),
    }
}

fn spread_cell(row: &DisplayRow, precision: usize) -> ColoredString {
    let text = format!("{:>RATE_WIDTH$}", format_rate(Some(row.metrics.spread), precision));
    match row.metrics.direction {
        SpreadDirection::ALeads => text.green(),
        SpreadDirection::BLeads => text.red(),
        SpreadDirection::Neutral => text.normal(),
    }
}

fn status_line(snapshot: &MonitorSnapshot) -> ColoredString {
    match snapshot.state {
        MonitorState::Idle => "Waiting for the first refresh...".dimmed(),
        MonitorState::Loading => "Refreshing funding rates...".yellow(),
        MonitorState::Error => snapshot
            .error
            .as_deref()
            .unwrap_or("Unable to load funding arbitrage data.")
            .red()
            .bold(),
        MonitorState::Ready => "Up to date".green(),
    }
}

/// Render one snapshot as a table under the given view
pub fn render_snapshot(
    snapshot: &MonitorSnapshot,
    view: &ViewOptions,
    display: &DisplayConfig,
    tracker: &ErrorTracker,
) -> String {
    let mut out = String::new();
    let timeframe = view.timeframe;

    let _ = writeln!(out, "{}", TITLE.bold().green());
    let _ = writeln!(out, "{}", "=".repeat(TITLE.len()).green());
    let _ = writeln!(out, "{}: {}", "Status".bold().blue(), status_line(snapshot));
    if snapshot.state == MonitorState::Error {
        if let Some(summary) = tracker.failure_summary() {
            let _ = writeln!(out, "{}", summary.dimmed());
        }
    }
    let last_updated = snapshot
        .last_updated
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| String::from("never"));
    let _ = writeln!(out, "{}: {}", "Last updated".bold().blue(), last_updated);
    let _ = writeln!(out, "{}: {}", "Timeframe".bold().blue(), timeframe.label());
    if !view.search.trim().is_empty() {
        let _ = writeln!(out, "{}: {}", "Search".bold().blue(), view.search.trim().to_uppercase());
    }
    out.push('\n');

    let rows = apply_view(&snapshot.opportunities, view);
    if rows.is_empty() {
        let message = if snapshot.opportunities.is_empty() {
            "No funding data available."
        } else {
            "No markets match the current search."
        };
        let _ = writeln!(out, "{}", message.dimmed());
        return out;
    }

    let header = format!(
        "{:<SYMBOL_WIDTH$}{:>RATE_WIDTH$}{:>RATE_WIDTH$}{:>RATE_WIDTH$}{:>RATE_WIDTH$}{:>PERCENT_WIDTH$}  {}",
        "Symbol",
        Exchange::Pacifica.label(),
        format!("{} Next", Exchange::Pacifica.label()),
        Exchange::Lighter.label(),
        "Spread",
        "Spread %",
        "Suggestion",
    );
    let _ = writeln!(out, "{}", header.bold().yellow());

    for op in &rows {
        let row = DisplayRow::from_opportunity(op, timeframe);
        let _ = writeln!(
            out,
            "{:<SYMBOL_WIDTH$}{:>RATE_WIDTH$}{:>RATE_WIDTH$}{:>RATE_WIDTH$}{}{:>PERCENT_WIDTH$}  {}",
            row.symbol,
            format_rate(row.rate_a, display.rate_precision),
            format_rate(row.rate_a_next, display.rate_precision),
            format_rate(row.rate_b, display.rate_precision),
            spread_cell(&row, display.rate_precision),
            format_percentage(row.metrics.percentage, display.percent_precision),
            suggestion_text(row.suggestion),
        );
    }

    let _ = writeln!(out, "\n{} of {} markets", rows.len(), snapshot.opportunities.len());
    out
}

/// Redraw the table on every monitor update until the monitor goes away
pub async fn run_funding_display(
    mut updates: watch::Receiver<MonitorSnapshot>,
    view: ViewOptions,
    display: DisplayConfig,
) {
    let tracker = init_error_tracker();
    loop {
        let snapshot = updates.borrow_and_update().clone();
        clear_terminal();
        print!("{}", render_snapshot(&snapshot, &view, &display, tracker));
        println!("{}", "Press Ctrl+C to exit".dimmed());
        if let Err(e) = io::stdout().flush() {
            eprintln!("Error flushing stdout: {}", e);
        }

        if updates.changed().await.is_err() {
            debug!("Monitor closed, display loop exiting");
            break;
        }
    }
}
