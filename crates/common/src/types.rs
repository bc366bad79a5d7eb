use serde::{Deserialize, Serialize};

/// Which threshold an RSI reading crossed.
///
/// Cooldown state is keyed per (symbol, direction), so a symbol oscillating
/// between overbought and oversold is never cross-suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Overbought,
    Oversold,
}

impl Direction {
    pub fn emoji(&self) -> &'static str {
        match self {
            Direction::Overbought => "\u{1F4C8}",
            Direction::Oversold => "\u{1F4C9}",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Overbought => write!(f, "OVERBOUGHT"),
            Direction::Oversold => write!(f, "OVERSOLD"),
        }
    }
}

/// A threshold-crossing event produced by the poller and consumed by the
/// notification fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub symbol: String,
    pub rsi: f64,
    pub direction: Direction,
}

impl Alert {
    /// Plain-text message delivered to each subscriber.
    pub fn format_message(&self) -> String {
        format!(
            "{} {} RSI {:.2} \u{2192} {}",
            self.direction.emoji(),
            self.symbol,
            self.rsi,
            self.direction
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_message_format() {
        let alert = Alert {
            symbol: "EUR/USD".to_string(),
            rsi: 71.456,
            direction: Direction::Overbought,
        };
        assert_eq!(
            alert.format_message(),
            "\u{1F4C8} EUR/USD RSI 71.46 \u{2192} OVERBOUGHT"
        );
    }

    #[test]
    fn oversold_message_format() {
        let alert = Alert {
            symbol: "USD/JPY".to_string(),
            rsi: 29.0,
            direction: Direction::Oversold,
        };
        assert_eq!(
            alert.format_message(),
            "\u{1F4C9} USD/JPY RSI 29.00 \u{2192} OVERSOLD"
        );
    }
}
