use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// One daily OHLCV record of an instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    ticker: String,
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

type BarTuple<'t> = (&'t str, NaiveDate, f64, f64, f64, f64, u64);

/// Unchecked conversion from `(ticker, date, open, high, low, close, volume)`.
impl From<BarTuple<'_>> for Bar {
    fn from((ticker, date, open, high, low, close, volume): BarTuple<'_>) -> Self {
        Self {
            ticker: ticker.to_string(),
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

impl Bar {
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn open(&self) -> f64 {
        self.open
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn close(&self) -> f64 {
        self.close
    }

    pub fn volume(&self) -> u64 {
        self.volume
    }

    /// Distance between the high and the low of the bar.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Checks the OHLC ordering the simulator relies on.
    pub fn validate(&self) -> Result<()> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(Error::InvalidBar(format!("{} {}: non-finite price", self.ticker, self.date)));
        }
        if self.high < self.low {
            return Err(Error::InvalidBar(format!(
                "{} {}: high {} below low {}",
                self.ticker, self.date, self.high, self.low
            )));
        }
        if self.high < self.open.max(self.close) || self.low > self.open.min(self.close) {
            return Err(Error::InvalidBar(format!(
                "{} {}: open/close outside of [{}, {}]",
                self.ticker, self.date, self.low, self.high
            )));
        }
        Ok(())
    }
}

/// Builder for [`Bar`]; `build` validates the OHLC ordering.
#[derive(Debug, Default)]
pub struct BarBuilder {
    ticker: Option<String>,
    date: Option<NaiveDate>,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<u64>,
}

impl BarBuilder {
    pub fn builder() -> Self {
        Self::default()
    }

    pub fn ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker = Some(ticker.into());
        self
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn open(mut self, open: f64) -> Self {
        self.open = Some(open);
        self
    }

    pub fn high(mut self, high: f64) -> Self {
        self.high = Some(high);
        self
    }

    pub fn low(mut self, low: f64) -> Self {
        self.low = Some(low);
        self
    }

    pub fn close(mut self, close: f64) -> Self {
        self.close = Some(close);
        self
    }

    pub fn volume(mut self, volume: u64) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn build(self) -> Result<Bar> {
        let missing = |field: &str| Error::InvalidBar(format!("missing field `{field}`"));
        let bar = Bar {
            ticker: self.ticker.ok_or_else(|| missing("ticker"))?,
            date: self.date.ok_or_else(|| missing("date"))?,
            open: self.open.ok_or_else(|| missing("open"))?,
            high: self.high.ok_or_else(|| missing("high"))?,
            low: self.low.ok_or_else(|| missing("low"))?,
            close: self.close.ok_or_else(|| missing("close"))?,
            volume: self.volume.unwrap_or_default(),
        };
        bar.validate()?;
        Ok(bar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn build_bar() {
        let bar = BarBuilder::builder()
            .ticker("AAPL")
            .date(day(2))
            .open(100.0)
            .high(110.0)
            .low(95.0)
            .close(105.0)
            .volume(1_000)
            .build()
            .unwrap();

        assert_eq!(bar.ticker(), "AAPL");
        assert_eq!(bar.date(), day(2));
        assert_eq!(bar.range(), 15.0);
        assert_eq!(bar.volume(), 1_000);
    }

    #[test]
    fn build_rejects_high_below_low() {
        let result = BarBuilder::builder()
            .ticker("AAPL")
            .date(day(2))
            .open(100.0)
            .high(90.0)
            .low(95.0)
            .close(92.0)
            .build();
        assert!(matches!(result, Err(Error::InvalidBar(_))));
    }

    #[test]
    fn build_rejects_close_outside_range() {
        let result = BarBuilder::builder()
            .ticker("AAPL")
            .date(day(2))
            .open(100.0)
            .high(110.0)
            .low(95.0)
            .close(111.0)
            .build();
        assert!(matches!(result, Err(Error::InvalidBar(_))));
    }

    #[test]
    fn build_requires_date() {
        let result = BarBuilder::builder()
            .ticker("AAPL")
            .open(100.0)
            .high(110.0)
            .low(95.0)
            .close(105.0)
            .build();
        assert!(matches!(result, Err(Error::InvalidBar(_))));
    }
}
