use std::collections::HashSet;
use std::str::FromStr;

const DEFAULT_SYMBOLS: &str =
    "EUR/USD,GBP/USD,USD/JPY,AUD/USD,USD/CAD,NZD/USD,EUR/JPY,GBP/JPY";

/// All configuration loaded from environment variables at startup.
/// Missing required variables cause an immediate panic with a clear message.
#[derive(Debug, Clone)]
pub struct Config {
    // Credentials
    pub telegram_token: String,
    pub twelve_api_key: String,

    // Signal settings
    pub symbols: Vec<String>,
    pub timeframe: String,
    pub rsi_period: u32,
    pub overbought: f64,
    pub oversold: f64,

    // Anti-spam / polling
    pub cooldown_minutes: u64,
    /// Used only when the timeframe cannot be aligned to candle boundaries.
    pub check_every_seconds: u64,

    pub debug_log: bool,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any missing or invalid variable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let symbols = parse_symbols(
            &optional_env("SYMBOLS").unwrap_or_else(|| DEFAULT_SYMBOLS.to_string()),
        );
        if symbols.is_empty() {
            panic!("SYMBOLS parsed to an empty list. Provide at least one symbol.");
        }

        let rsi_period: u32 = parsed_env("RSI_PERIOD", 14);
        if rsi_period == 0 {
            panic!("RSI_PERIOD must be a positive integer, got: '0'");
        }

        let overbought: f64 = parsed_env("OVERBOUGHT", 70.0);
        let oversold: f64 = parsed_env("OVERSOLD", 30.0);
        if overbought <= oversold {
            panic!("OVERBOUGHT ({overbought}) must be greater than OVERSOLD ({oversold})");
        }

        Config {
            telegram_token: required_env("TELEGRAM_BOT_TOKEN"),
            twelve_api_key: required_env("TWELVE_API_KEY"),
            symbols,
            timeframe: optional_env("TIMEFRAME").unwrap_or_else(|| "1min".to_string()),
            rsi_period,
            overbought,
            oversold,
            cooldown_minutes: parsed_env("COOLDOWN_MINUTES", 20),
            check_every_seconds: parsed_env("CHECK_EVERY_SECONDS", 60),
            debug_log: parsed_env::<u8>("DEBUG_LOG", 0) != 0,
        }
    }
}

/// Split a raw symbol list on commas, semicolons, or newlines.
/// Trims whitespace, drops empty entries, deduplicates preserving
/// first-seen order.
pub fn parse_symbols(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split([',', ';', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_string()))
        .map(str::to_string)
        .collect()
}

fn required_env(key: &str) -> String {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => panic!("Required environment variable '{key}' is not set. Check your .env file."),
    }
}

/// Blank values count as unset so a `FOO=` line in `.env` falls through
/// to the default.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed_env<T: FromStr>(key: &str, default: T) -> T {
    match optional_env(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            panic!("Environment variable '{key}' is not a valid number: '{raw}'")
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_symbols_handles_mixed_separators() {
        let parsed = parse_symbols("EUR/USD,,GBP/USD;USD/JPY\nEUR/USD");
        assert_eq!(parsed, vec!["EUR/USD", "GBP/USD", "USD/JPY"]);
    }

    #[test]
    fn parse_symbols_trims_whitespace() {
        let parsed = parse_symbols("  EUR/USD , GBP/USD\n  ");
        assert_eq!(parsed, vec!["EUR/USD", "GBP/USD"]);
    }

    #[test]
    fn parse_symbols_preserves_first_seen_order() {
        let parsed = parse_symbols("USD/JPY;EUR/USD;USD/JPY;GBP/USD;EUR/USD");
        assert_eq!(parsed, vec!["USD/JPY", "EUR/USD", "GBP/USD"]);
    }

    #[test]
    fn parse_symbols_empty_input_yields_empty_list() {
        assert!(parse_symbols("").is_empty());
        assert!(parse_symbols(" ,;\n ").is_empty());
    }

    #[test]
    fn default_symbol_list_has_eight_pairs() {
        assert_eq!(parse_symbols(DEFAULT_SYMBOLS).len(), 8);
    }
}
