use std::collections::BTreeMap;

use crate::config::Config;
use crate::engine::*;
use crate::errors::{Error, Result};

/// Backtesting runner.
///
/// Holds only the configuration: every run builds a fresh [`PositionMachine`], so one
/// `Backtest` can replay any number of series, from any number of threads.
#[derive(Debug, Clone)]
pub struct Backtest {
    config: Config,
}

impl Backtest {
    /// Creates a new runner after validating `config`.
    ///
    /// ### Example
    /// ```rust
    /// use bte_rs::prelude::*;
    ///
    /// let bts = Backtest::new(Config::default()).unwrap();
    /// assert!(bts.run(&[]).is_empty());
    /// ```
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Checks that `bars` is a simulable series of one instrument with well-formed bars.
    pub fn validate_series(bars: &[Bar]) -> Result<()> {
        if bars.len() < 2 {
            return Err(Error::InvalidInput(format!(
                "at least 2 bars are required (got: {})",
                bars.len()
            )));
        }
        bars.iter().try_for_each(Bar::validate)?;
        for pair in bars.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);
            if current.date() <= previous.date() {
                return Err(Error::InvalidInput(format!(
                    "dates must be strictly ascending ({} then {})",
                    previous.date(),
                    current.date()
                )));
            }
            if current.ticker() != previous.ticker() {
                return Err(Error::InvalidInput(format!(
                    "series mixes tickers {} and {}",
                    previous.ticker(),
                    current.ticker()
                )));
            }
        }
        Ok(())
    }

    /// Runs the series and returns the trades in exit order.
    ///
    /// Invalid input yields an empty list and a warning instead of an error.
    ///
    /// ### Example
    /// ```rust
    /// use bte_rs::prelude::*;
    ///
    /// let bars = bte_rs::utils::synthetic_bars("DEMO", 250, 42, 100.0);
    /// let bts = Backtest::new(Config::default()).unwrap();
    /// let trades = bts.run(&bars);
    /// let stats = Stats::from(trades.as_slice());
    /// assert_eq!(stats.total_trades(), trades.len());
    /// ```
    pub fn run(&self, bars: &[Bar]) -> Vec<TradeRecord> {
        self.run_with_events(bars).0
    }

    /// Same as [`Backtest::run`], but surfaces invalid input as an error.
    pub fn try_run(&self, bars: &[Bar]) -> Result<Vec<TradeRecord>> {
        Self::validate_series(bars)?;
        Ok(self.simulate(bars).0)
    }

    /// Runs the series and returns the trades with the order journal.
    pub fn run_with_events(&self, bars: &[Bar]) -> (Vec<TradeRecord>, Vec<Event>) {
        if let Err(err) = Self::validate_series(bars) {
            let ticker = bars.first().map(Bar::ticker).unwrap_or_default();
            tracing::warn!(ticker, error = %err, "backtest skipped");
            return (Vec::new(), Vec::new());
        }
        self.simulate(bars)
    }

    /// Runs every ticker of `tickers` found in `data`, one after the other.
    ///
    /// Missing tickers are logged and skipped; trades are concatenated in ticker order.
    pub fn run_universe(&self, tickers: &[String], data: &BTreeMap<String, Vec<Bar>>) -> Vec<TradeRecord> {
        let mut trades = Vec::new();
        for ticker in tickers {
            match data.get(ticker) {
                Some(bars) => trades.extend(self.run(bars)),
                None => tracing::warn!(%ticker, "no data found for ticker"),
            }
        }
        trades
    }

    /// Indicator values for `index`, or `None` while the windows are not filled.
    fn snapshot(&self, indicators: &Indicators<'_>, index: usize) -> Option<Snapshot> {
        if index < self.config.warmup() {
            return None;
        }
        let values = || -> Result<Snapshot> {
            Ok(Snapshot {
                moving_average: indicators.moving_average(self.config.ma_period, index)?,
                adr: indicators.adr(self.config.adr_period, index)?,
                avg_volume: indicators.avg_volume(self.config.ma_period, index)?,
            })
        };
        match values() {
            Ok(snapshot) if snapshot.is_finite() => Some(snapshot),
            Ok(snapshot) => {
                tracing::debug!(index, ?snapshot, "non-finite indicators skipped");
                None
            }
            Err(err) => {
                tracing::debug!(index, error = %err, "indicators skipped");
                None
            }
        }
    }

    fn simulate(&self, bars: &[Bar]) -> (Vec<TradeRecord>, Vec<Event>) {
        let ticker = bars.first().map(Bar::ticker).unwrap_or_default();
        let _span = tracing::info_span!("backtest", ticker, bars = bars.len()).entered();

        let indicators = Indicators::new(bars);
        let mut machine = PositionMachine::new(self.config.clone());
        let mut trades = Vec::with_capacity(bars.len() / 5);

        for (index, bar) in bars.iter().enumerate() {
            let snapshot = self.snapshot(&indicators, index);
            if let Some(trade) = machine.on_bar(bar, snapshot.as_ref()) {
                trades.push(trade);
            }
        }

        tracing::debug!(trades = trades.len(), "backtest completed");
        (trades, machine.into_events())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Duration, NaiveDate};

    fn series(ticker: &str, closes: &[f64]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                BarBuilder::builder()
                    .ticker(ticker)
                    .date(start + Duration::days(i as i64))
                    .open(close)
                    .high(close + 1.0)
                    .low(close - 1.0)
                    .close(close)
                    .volume(10_000)
                    .build()
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = Config {
            adr_period: 0,
            ..Config::default()
        };
        assert!(matches!(Backtest::new(config), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn short_series_yields_nothing() {
        let bts = Backtest::new(Config::default()).unwrap();
        assert!(bts.run(&series("A", &[10.0])).is_empty());
        assert!(matches!(bts.try_run(&series("A", &[10.0])), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn unordered_dates_yield_nothing() {
        let mut bars = series("A", &[10.0; 30]);
        bars.swap(3, 4);
        let bts = Backtest::new(Config::default()).unwrap();
        assert!(bts.run(&bars).is_empty());
        assert!(matches!(bts.try_run(&bars), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn duplicate_dates_are_rejected() {
        let mut bars = series("A", &[10.0; 3]);
        bars[2] = bars[1].clone();
        assert!(Backtest::validate_series(&bars).is_err());
    }

    #[test]
    fn nan_close_yields_nothing() {
        // highs stay below every real average, only the NaN close could trigger a signal
        let mut bars = (0..14)
            .map(|i| {
                let close = 100.0 - i as f64;
                let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(i);
                Bar::from(("A", date, close, close + 0.5, close - 1.0, close, 10_000))
            })
            .collect::<Vec<_>>();
        let date = bars[11].date();
        bars[11] = Bar::from(("A", date, 89.0, 89.5, 88.0, f64::NAN, 10_000));

        let bts = Backtest::new(Config::default()).unwrap();
        let (trades, events) = bts.run_with_events(&bars);
        assert!(trades.is_empty());
        assert!(events.is_empty());
        assert!(matches!(bts.try_run(&bars), Err(Error::InvalidBar(_))));
    }

    #[test]
    fn mixed_tickers_are_rejected() {
        let mut bars = series("A", &[10.0; 3]);
        bars[2] = series("B", &[10.0; 3]).remove(2);
        assert!(matches!(Backtest::validate_series(&bars), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn series_shorter_than_warmup_yields_nothing() {
        let bts = Backtest::new(Config::default()).unwrap();
        let bars = series("A", &[10.0, 11.0, 12.0, 13.0, 14.0]);
        assert!(bts.try_run(&bars).unwrap().is_empty());
    }

    #[test]
    fn flat_market_never_signals() {
        // high = close + 1 on a constant close stays above the average, but the
        // volume floor blocks every signal
        let config = Config {
            liquidity_floor: 10_000,
            ..Config::default()
        };
        let bts = Backtest::new(config).unwrap();
        let (trades, events) = bts.run_with_events(&series("A", &[10.0; 40]));
        assert!(trades.is_empty());
        assert!(events.is_empty());
    }

    #[test]
    fn run_universe_skips_missing_tickers() {
        let bts = Backtest::new(Config::default()).unwrap();
        let closes = (0..60).map(|i| 50.0 + (i as f64 * 0.7).sin() * 4.0).collect::<Vec<_>>();
        let mut data = BTreeMap::new();
        data.insert("A".to_string(), series("A", &closes));

        let tickers = vec!["A".to_string(), "MISSING".to_string()];
        let trades = bts.run_universe(&tickers, &data);
        assert_eq!(trades, bts.run(&data["A"]));
    }
}
