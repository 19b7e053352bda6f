// error_handling.rs - Error classification, tracking and user-facing messages

use crate::core::AppError;
use crate::exchange_types::Exchange;
use dashmap::DashMap;
use log::warn;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

/// Detailed error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    // Network errors
    ConnectionFailure,
    Timeout,

    // Protocol errors
    Transport,
    InvalidPayload,

    // Superseded request, never shown to the user
    Cancelled,

    // Local errors
    Configuration,
    InternalFailure,
}

impl From<&AppError> for ErrorCategory {
    fn from(error: &AppError) -> Self {
        match error {
            AppError::RequestError { source, .. } => {
                if source.is_timeout() {
                    ErrorCategory::Timeout
                } else if source.is_decode() || source.is_body() {
                    ErrorCategory::InvalidPayload
                } else {
                    ErrorCategory::ConnectionFailure
                }
            }
            AppError::TransportError { .. } => ErrorCategory::Transport,
            AppError::SchemaError { .. } => ErrorCategory::InvalidPayload,
            AppError::Cancelled => ErrorCategory::Cancelled,
            AppError::ConfigError(_) => ErrorCategory::Configuration,
            AppError::IoError(_) | AppError::Other(_) => ErrorCategory::InternalFailure,
        }
    }
}

impl ErrorCategory {
    /// Transient failures are worth retrying on the next tick or refresh
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorCategory::ConnectionFailure | ErrorCategory::Timeout | ErrorCategory::Transport
        )
    }
}

/// Message shown to the user when a fetch cycle fails
pub fn user_message(error: &AppError) -> String {
    let category = ErrorCategory::from(error);
    let source = error
        .exchange()
        .map(|exchange| exchange.label())
        .unwrap_or("funding data");

    let detail = match category {
        ErrorCategory::ConnectionFailure => format!("Could not reach {}.", source),
        ErrorCategory::Timeout => format!("{} did not respond in time.", source),
        ErrorCategory::Transport => format!("{} is currently unavailable ({}).", source, error),
        ErrorCategory::InvalidPayload => format!("{} sent an unexpected response.", source),
        _ => format!("Unable to load funding arbitrage data ({}).", error),
    };

    format!("{} Refresh to try again.", detail)
}

/// Failure counters per exchange and category
pub struct ErrorTracker {
    error_counts: DashMap<(Exchange, ErrorCategory), AtomicUsize>,
    unattributed: AtomicUsize,
}

impl ErrorTracker {
    pub fn new() -> Self {
        Self {
            error_counts: DashMap::new(),
            unattributed: AtomicUsize::new(0),
        }
    }

    /// Record a failure; cancellations are not failures and are ignored
    pub fn record_error(&self, error: &AppError) {
        let category = ErrorCategory::from(error);
        if category == ErrorCategory::Cancelled {
            return;
        }

        match error.exchange() {
            Some(exchange) => {
                let count = self
                    .error_counts
                    .entry((exchange, category))
                    .or_insert_with(|| AtomicUsize::new(0))
                    .fetch_add(1, Ordering::SeqCst)
                    + 1;
                warn!("{} {:?} error #{}: {}", exchange, category, count, error);
            }
            None => {
                self.unattributed.fetch_add(1, Ordering::SeqCst);
                warn!("{:?} error: {}", category, error);
            }
        }
    }

    /// Total failures attributed to an exchange
    pub fn exchange_error_count(&self, exchange: Exchange) -> usize {
        self.error_counts
            .iter()
            .filter(|entry| entry.key().0 == exchange)
            .map(|entry| entry.value().load(Ordering::SeqCst))
            .sum()
    }

    pub fn unattributed_count(&self) -> usize {
        self.unattributed.load(Ordering::SeqCst)
    }

    /// One-line tally of the failures seen so far, if any
    pub fn failure_summary(&self) -> Option<String> {
        let mut parts: Vec<String> = [Exchange::Pacifica, Exchange::Lighter]
            .into_iter()
            .map(|exchange| (exchange, self.exchange_error_count(exchange)))
            .filter(|(_, count)| *count > 0)
            .map(|(exchange, count)| format!("{} {}", exchange.label(), count))
            .collect();

        let other = self.unattributed_count();
        if other > 0 {
            parts.push(format!("other {}", other));
        }

        if parts.is_empty() {
            None
        } else {
            Some(format!("Failures this session: {}", parts.join(", ")))
        }
    }
}

impl Default for ErrorTracker {
    fn default() -> Self {
        Self::new()
    }
}

// Global instance
pub static ERROR_TRACKER: OnceLock<ErrorTracker> = OnceLock::new();

// Initialize the error tracker
pub fn init_error_tracker() -> &'static ErrorTracker {
    ERROR_TRACKER.get_or_init(ErrorTracker::new)
}

// Helper function to record errors with proper classification
pub fn record_error(error: &AppError) {
    init_error_tracker().record_error(error);
}
