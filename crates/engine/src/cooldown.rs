use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use common::Direction;

/// Anti-spam gate: at most one alert per (symbol, direction) per window.
///
/// In-memory only. Losing the map on restart means at worst one early
/// repeat alert per pair, which is accepted.
pub struct CooldownGate {
    window: Duration,
    last_fired: HashMap<(String, Direction), DateTime<Utc>>,
}

impl CooldownGate {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_fired: HashMap::new(),
        }
    }

    /// Whether an alert for (symbol, direction) may fire at `now`.
    /// Firing records `now` as the new last-alert timestamp.
    pub fn try_fire(&mut self, symbol: &str, direction: Direction, now: DateTime<Utc>) -> bool {
        let key = (symbol.to_string(), direction);
        match self.last_fired.get(&key) {
            Some(&last) if now - last < self.window => false,
            _ => {
                self.last_fired.insert(key, now);
                true
            }
        }
    }
}
