use crate::engine::Bar;
use crate::errors::{Error, Result};

/// Trailing-window calculators over a bar series.
///
/// Every indicator averages the bars `[end_index + 1 - length, end_index]` and re-sums the
/// window on each call, so results never depend on call order.
#[derive(Debug, Clone, Copy)]
pub struct Indicators<'a> {
    bars: &'a [Bar],
}

impl<'a> Indicators<'a> {
    pub fn new(bars: &'a [Bar]) -> Self {
        Self { bars }
    }

    fn window(&self, length: usize, end_index: usize) -> Result<&'a [Bar]> {
        if length == 0 {
            return Err(Error::InvalidConfig("indicator window must be positive".to_string()));
        }
        if end_index >= self.bars.len() {
            return Err(Error::InvalidInput(format!(
                "end index {end_index} outside of a series of {} bars",
                self.bars.len()
            )));
        }
        let available = end_index + 1;
        if available < length {
            return Err(Error::InsufficientData { length, available });
        }
        Ok(&self.bars[available - length..available])
    }

    /// Arithmetic mean of `close` over the trailing window.
    pub fn moving_average(&self, length: usize, end_index: usize) -> Result<f64> {
        let window = self.window(length, end_index)?;
        let sum = window.iter().map(Bar::close).sum::<f64>();
        Ok(sum / length as f64)
    }

    /// Average daily range: mean of `high - low` over the trailing window.
    pub fn adr(&self, length: usize, end_index: usize) -> Result<f64> {
        let window = self.window(length, end_index)?;
        let sum = window.iter().map(Bar::range).sum::<f64>();
        Ok(sum / length as f64)
    }

    /// Mean of `volume` over the trailing window.
    pub fn avg_volume(&self, length: usize, end_index: usize) -> Result<f64> {
        let window = self.window(length, end_index)?;
        let sum = window.iter().map(|b| u128::from(b.volume())).sum::<u128>();
        Ok(sum as f64 / length as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BarBuilder;

    use chrono::{Duration, NaiveDate};

    fn get_data() -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        [
            (10.0, 12.0, 9.0, 11.0, 100),
            (11.0, 13.0, 10.0, 12.0, 200),
            (12.0, 14.0, 11.0, 13.0, 300),
            (13.0, 15.0, 11.0, 14.0, 400),
            (14.0, 16.0, 13.0, 15.0, 500),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, (open, high, low, close, volume))| {
            BarBuilder::builder()
                .ticker("TEST")
                .date(start + Duration::days(i as i64))
                .open(open)
                .high(high)
                .low(low)
                .close(close)
                .volume(volume)
                .build()
                .unwrap()
        })
        .collect()
    }

    #[test]
    fn moving_average_over_trailing_window() {
        let bars = get_data();
        let indicators = Indicators::new(&bars);
        assert_eq!(indicators.moving_average(3, 2).unwrap(), 12.0);
        assert_eq!(indicators.moving_average(3, 4).unwrap(), 14.0);
        assert_eq!(indicators.moving_average(1, 0).unwrap(), 11.0);
        assert_eq!(indicators.moving_average(5, 4).unwrap(), 13.0);
    }

    #[test]
    fn adr_over_trailing_window() {
        let bars = get_data();
        let indicators = Indicators::new(&bars);
        // ranges: 3, 3, 3, 4, 3
        assert_eq!(indicators.adr(3, 2).unwrap(), 3.0);
        assert_eq!(indicators.adr(2, 4).unwrap(), 3.5);
    }

    #[test]
    fn avg_volume_over_trailing_window() {
        let bars = get_data();
        let indicators = Indicators::new(&bars);
        assert_eq!(indicators.avg_volume(2, 1).unwrap(), 150.0);
        assert_eq!(indicators.avg_volume(5, 4).unwrap(), 300.0);
    }

    #[test]
    fn window_longer_than_history_is_insufficient() {
        let bars = get_data();
        let indicators = Indicators::new(&bars);
        assert!(matches!(
            indicators.moving_average(3, 1),
            Err(Error::InsufficientData { length: 3, available: 2 })
        ));
        assert!(matches!(
            indicators.adr(10, 4),
            Err(Error::InsufficientData { length: 10, available: 5 })
        ));
        assert!(matches!(indicators.avg_volume(6, 4), Err(Error::InsufficientData { .. })));
    }

    #[test]
    fn end_index_past_series_is_rejected() {
        let bars = get_data();
        let indicators = Indicators::new(&bars);
        assert!(matches!(indicators.moving_average(1, 5), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn zero_length_window_is_rejected() {
        let bars = get_data();
        let indicators = Indicators::new(&bars);
        assert!(matches!(indicators.adr(0, 2), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn moving_average_matches_ta_sma() {
        use ta::Next;
        use ta::indicators::SimpleMovingAverage;

        let bars = crate::utils::synthetic_bars("SMA", 200, 7, 50.0);
        let indicators = Indicators::new(&bars);
        let length = 10;
        let mut sma = SimpleMovingAverage::new(length).unwrap();

        for (i, bar) in bars.iter().enumerate() {
            let expected = sma.next(bar.close());
            if i + 1 >= length {
                let actual = indicators.moving_average(length, i).unwrap();
                assert!((actual - expected).abs() < 1e-9, "bar {i}: {actual} != {expected}");
            }
        }
    }
}
