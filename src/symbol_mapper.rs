// symbol_mapper.rs - Reconciles exchange-specific symbols into one join key

use std::collections::HashSet;

/// Contract marker some venues append to perpetual symbols
const PERP_SUFFIX: &str = "PERP";

/// Multiplier prefix for low-priced assets quoted per thousand units
const THOUSAND_PREFIX: &str = "1000";
const THOUSAND_SYMBOL_PREFIX: &str = "K";

/// Enum to represent different symbol format styles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolFormat {
    /// BASE_QUOTE with underscore (e.g., BTC_USDT)
    Underscore,
    /// BASE-QUOTE with hyphen (e.g., BTC-PERP)
    Hyphen,
    /// BASE/QUOTE with slash (e.g., BTC/USDC)
    Slash,
    /// BASE with no separator (e.g., BTC)
    NoSeparator,
}

impl SymbolFormat {
    pub fn separator(&self) -> Option<char> {
        match self {
            SymbolFormat::Underscore => Some('_'),
            SymbolFormat::Hyphen => Some('-'),
            SymbolFormat::Slash => Some('/'),
            SymbolFormat::NoSeparator => None,
        }
    }
}

/// Get the format of a symbol from its first separator
pub fn detect_symbol_format(symbol: &str) -> SymbolFormat {
    match symbol.chars().find(|c| matches!(c, '_' | '-' | '/')) {
        Some('_') => SymbolFormat::Underscore,
        Some('-') => SymbolFormat::Hyphen,
        Some('/') => SymbolFormat::Slash,
        _ => SymbolFormat::NoSeparator,
    }
}

/// Trim and uppercase a symbol without changing its structure
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Map a symbol from either exchange onto its canonical form.
///
/// `BTC-PERP`, `btc_usdc` and `BTCPERP` all become `BTC`; `1000PEPE` becomes
/// `KPEPE`. The mapping is idempotent.
pub fn reconcile(symbol: &str) -> String {
    let normalized = normalize_symbol(symbol);

    // Keep the base segment of BASE-QUOTE style symbols
    let mut base = match detect_symbol_format(&normalized).separator() {
        Some(_) => normalized
            .split(|c| matches!(c, '_' | '-' | '/'))
            .map(str::trim)
            .find(|segment| !segment.is_empty())
            .unwrap_or("")
            .to_string(),
        None => normalized,
    };

    // Strip PERP markers and any whitespace they leave behind until stable
    loop {
        base.truncate(base.trim_end().len());
        if base.len() > PERP_SUFFIX.len() && base.ends_with(PERP_SUFFIX) {
            base.truncate(base.len() - PERP_SUFFIX.len());
        } else {
            break;
        }
    }

    if base.len() > THOUSAND_PREFIX.len() && base.starts_with(THOUSAND_PREFIX) {
        base = format!("{}{}", THOUSAND_SYMBOL_PREFIX, &base[THOUSAND_PREFIX.len()..]);
    }

    base
}

/// Reconcile a user supplied symbol list, dropping blanks and duplicates while
/// keeping the first occurrence order.
pub fn reconcile_all<'a, I>(symbols: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut seen = HashSet::new();
    symbols
        .into_iter()
        .map(|symbol| reconcile(symbol))
        .filter(|symbol| !symbol.is_empty() && seen.insert(symbol.clone()))
        .collect()
}
