use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use common::{Alert, Config, Direction, IndicatorSource};

use crate::cooldown::CooldownGate;
use crate::schedule;

/// Upper bound on simultaneous outbound requests per tick.
const MAX_CONCURRENT_FETCHES: usize = 4;

/// Classify an RSI reading against the thresholds. Boundaries are inclusive:
/// exactly 70 counts as overbought, exactly 30 as oversold.
pub fn evaluate(rsi: f64, overbought: f64, oversold: f64) -> Option<Direction> {
    if rsi >= overbought {
        Some(Direction::Overbought)
    } else if rsi <= oversold {
        Some(Direction::Oversold)
    } else {
        None
    }
}

/// The polling loop: wake at each candle boundary, fetch RSI for every
/// symbol, evaluate thresholds, and emit alerts past the cooldown gate.
///
/// Runs forever; spawn it and abort the task on shutdown. Sleeps and
/// network calls are the only await points, so aborting mid-tick leaves
/// the cooldown map consistent.
pub struct Poller {
    cfg: Arc<Config>,
    source: Arc<dyn IndicatorSource>,
    cooldown: CooldownGate,
    alert_tx: mpsc::Sender<Alert>,
}

impl Poller {
    pub fn new(
        cfg: Arc<Config>,
        source: Arc<dyn IndicatorSource>,
        alert_tx: mpsc::Sender<Alert>,
    ) -> Self {
        let cooldown = CooldownGate::new(chrono::Duration::minutes(cfg.cooldown_minutes as i64));
        Self {
            cfg,
            source,
            cooldown,
            alert_tx,
        }
    }

    pub async fn run(mut self) {
        let step = schedule::interval_to_seconds(&self.cfg.timeframe);
        match step {
            Some(s) => info!(
                timeframe = %self.cfg.timeframe,
                step_seconds = s,
                "Polling aligned to candle boundaries"
            ),
            None => warn!(
                timeframe = %self.cfg.timeframe,
                fallback_seconds = self.cfg.check_every_seconds,
                "Timeframe not alignable, polling at fixed interval"
            ),
        }

        loop {
            let sleep_secs = match step {
                Some(s) => schedule::seconds_until_next_boundary(s, schedule::epoch_now()),
                None => self.cfg.check_every_seconds.max(1),
            };
            debug!(sleep_secs, "Sleeping until next tick");
            tokio::time::sleep(Duration::from_secs(sleep_secs)).await;
            self.tick().await;
        }
    }

    /// One polling pass over all configured symbols.
    ///
    /// Fetches run with bounded concurrency; a failure for one symbol never
    /// blocks evaluation of the rest.
    async fn tick(&mut self) {
        let readings = stream::iter(self.cfg.symbols.clone())
            .map(|symbol| {
                let source = self.source.clone();
                async move {
                    let result = source.latest_rsi(&symbol).await;
                    (symbol, result)
                }
            })
            .buffer_unordered(MAX_CONCURRENT_FETCHES)
            .collect::<Vec<_>>()
            .await;

        for (symbol, result) in readings {
            match result {
                Err(e) => warn!(symbol = %symbol, error = %e, "RSI fetch failed, skipping"),
                Ok(None) => debug!(symbol = %symbol, "No RSI value in provider response"),
                Ok(Some(rsi)) => self.process_reading(&symbol, rsi).await,
            }
        }
    }

    async fn process_reading(&mut self, symbol: &str, rsi: f64) {
        let Some(direction) = evaluate(rsi, self.cfg.overbought, self.cfg.oversold) else {
            debug!(symbol = %symbol, rsi, "RSI within neutral band");
            return;
        };
        if !self.cooldown.try_fire(symbol, direction, Utc::now()) {
            debug!(symbol = %symbol, %direction, "Alert suppressed by cooldown");
            return;
        }

        info!(symbol = %symbol, rsi, %direction, "Threshold crossed, alerting");
        let alert = Alert {
            symbol: symbol.to_string(),
            rsi,
            direction,
        };
        if self.alert_tx.send(alert).await.is_err() {
            warn!("Alert channel closed, dropping alert");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use common::{Error, Result};
    use std::collections::HashSet;

    #[test]
    fn exactly_overbought_threshold_triggers() {
        assert_eq!(evaluate(70.0, 70.0, 30.0), Some(Direction::Overbought));
    }

    #[test]
    fn exactly_oversold_threshold_triggers() {
        assert_eq!(evaluate(30.0, 70.0, 30.0), Some(Direction::Oversold));
    }

    #[test]
    fn neutral_band_triggers_nothing() {
        assert_eq!(evaluate(30.01, 70.0, 30.0), None);
        assert_eq!(evaluate(50.0, 70.0, 30.0), None);
        assert_eq!(evaluate(69.99, 70.0, 30.0), None);
    }

    #[test]
    fn extremes_trigger() {
        assert_eq!(evaluate(100.0, 70.0, 30.0), Some(Direction::Overbought));
        assert_eq!(evaluate(0.0, 70.0, 30.0), Some(Direction::Oversold));
    }

    fn test_config(symbols: &[&str]) -> Arc<Config> {
        Arc::new(Config {
            telegram_token: "test-token".to_string(),
            twelve_api_key: "test-key".to_string(),
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            timeframe: "5min".to_string(),
            rsi_period: 14,
            overbought: 70.0,
            oversold: 30.0,
            cooldown_minutes: 20,
            check_every_seconds: 60,
            debug_log: false,
        })
    }

    /// Fake source: symbols named FAIL/* error, others return a fixed value.
    struct ScriptedSource;

    #[async_trait]
    impl IndicatorSource for ScriptedSource {
        async fn latest_rsi(&self, symbol: &str) -> Result<Option<f64>> {
            match symbol {
                s if s.starts_with("FAIL") => Err(Error::Provider("simulated outage".into())),
                "EMPTY/USD" => Ok(None),
                "HOT/USD" => Ok(Some(85.0)),
                "COLD/USD" => Ok(Some(15.0)),
                _ => Ok(Some(50.0)),
            }
        }
    }

    #[tokio::test]
    async fn one_failing_symbol_does_not_block_the_rest() {
        let cfg = test_config(&["FAIL/USD", "HOT/USD", "COLD/USD"]);
        let (tx, mut rx) = mpsc::channel(8);
        let mut poller = Poller::new(cfg, Arc::new(ScriptedSource), tx);

        poller.tick().await;

        let mut alerted = HashSet::new();
        while let Ok(alert) = rx.try_recv() {
            alerted.insert((alert.symbol.clone(), alert.direction));
        }
        assert_eq!(alerted.len(), 2);
        assert!(alerted.contains(&("HOT/USD".to_string(), Direction::Overbought)));
        assert!(alerted.contains(&("COLD/USD".to_string(), Direction::Oversold)));
    }

    #[tokio::test]
    async fn missing_value_and_neutral_reading_emit_nothing() {
        let cfg = test_config(&["EMPTY/USD", "CALM/USD"]);
        let (tx, mut rx) = mpsc::channel(8);
        let mut poller = Poller::new(cfg, Arc::new(ScriptedSource), tx);

        poller.tick().await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn second_tick_within_cooldown_is_silent() {
        let cfg = test_config(&["HOT/USD"]);
        let (tx, mut rx) = mpsc::channel(8);
        let mut poller = Poller::new(cfg, Arc::new(ScriptedSource), tx);

        poller.tick().await;
        assert!(rx.try_recv().is_ok());

        poller.tick().await;
        assert!(rx.try_recv().is_err());
    }
}
