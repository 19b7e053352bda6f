// Define modules
pub mod core;
pub mod utils;
pub mod network;  // This points to network/mod.rs
pub mod terminal_log;  // Terminal table rendering
pub mod exchange_types;  // Exchange identities and wire payloads
pub mod cross_exchange;  // Symbol join and spread math
pub mod symbol_mapper;  // Symbol reconciliation across venues
pub mod config;
pub mod error_handling;
pub mod sorting;  // Timeframes, sort and search
pub mod monitor;  // Fetch cycles and polling

// Re-export key components for easier usage
pub use core::*;

// Re-export exchange types
pub use exchange_types::Exchange;

// Re-export symbol and rate helpers
pub use symbol_mapper::{normalize_symbol, reconcile};
pub use utils::{format_percentage, format_rate, normalize_rate, scale_rate};

// Re-export the join
pub use cross_exchange::{
    build_opportunities,
    spread_metrics,
    ArbSuggestion,
    SnapshotBook,
    SymbolFilter,
};

// Re-export presentation
pub use sorting::{
    apply_view,
    sort_opportunities,
    DisplayRow,
    SortDirection,
    SortKey,
    SortState,
    Timeframe,
    ViewOptions,
};

// Re-export from network module
pub use network::api_client::{
    LighterSource,
    PacificaSource,
    RateSource,
};

pub use monitor::{
    FundingMonitor,
    MonitorOptions,
    MonitorSnapshot,
    MonitorState,
};

// Re-export from terminal_log module
pub use terminal_log::run_funding_display;
