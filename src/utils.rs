use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use chrono::{Duration, NaiveDate};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::engine::Bar;
use crate::errors::Result;

// ticker,date,open,high,low,close,volume
// AAPL,2024-01-02,187.15,188.44,183.89,185.64,82488700

/// Reads bars from CSV rows and groups them per ticker, ascending by date.
///
/// Rows with an invalid OHLC ordering are skipped with a warning. When `max_bars` is not zero,
/// only the most recent `max_bars` bars of each ticker are kept.
pub fn bars_from_csv_reader<R: Read>(reader: R, max_bars: usize) -> Result<BTreeMap<String, Vec<Bar>>> {
    let mut data: BTreeMap<String, Vec<Bar>> = BTreeMap::new();
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    for row in reader.deserialize::<Bar>() {
        let bar = row?;
        if let Err(err) = bar.validate() {
            tracing::warn!(error = %err, "bar skipped");
            continue;
        }
        data.entry(bar.ticker().to_string()).or_default().push(bar);
    }

    for bars in data.values_mut() {
        bars.sort_by_key(Bar::date);
        if max_bars > 0 && bars.len() > max_bars {
            bars.drain(..bars.len() - max_bars);
        }
    }
    Ok(data)
}

/// Reads a CSV bar file; see [`bars_from_csv_reader`].
pub fn read_bars_csv(path: impl AsRef<Path>, max_bars: usize) -> Result<BTreeMap<String, Vec<Bar>>> {
    let file = std::fs::File::open(path)?;
    bars_from_csv_reader(BufReader::new(file), max_bars)
}

/// Reads a ticker universe: one ticker per line, blank lines ignored.
pub fn read_tickers(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let file = std::fs::File::open(path)?;
    let mut tickers = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let ticker = line.trim();
        if !ticker.is_empty() {
            tickers.push(ticker.to_string());
        }
    }
    Ok(tickers)
}

#[cfg(feature = "json")]
/// Reads a JSON array of bars from `filepath`.
pub fn read_bars_json(filepath: impl AsRef<Path>) -> Result<Vec<Bar>> {
    let file = std::fs::File::open(filepath)?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(crate::errors::Error::from)
}

/// Generates a reproducible random-walk series of daily bars.
///
/// The same `(count, seed, base_price)` always yields the same bars.
pub fn synthetic_bars(ticker: &str, count: usize, seed: u64, base_price: f64) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default();
    let mut close = base_price;

    (0..count)
        .map(|i| {
            let open = close;
            let drift = rng.random_range(-0.02..0.021);
            close = (open * (1.0 + drift)).max(1.0);

            let spread = open * rng.random_range(0.002..0.02);
            let high = open.max(close) + spread * rng.random::<f64>();
            let low = (open.min(close) - spread * rng.random::<f64>()).max(0.5);
            let volume = rng.random_range(50_000..150_000);

            Bar::from((ticker, start + Duration::days(i as i64), open, high, low, close, volume))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
ticker,date,open,high,low,close,volume
MSFT,2024-01-03,11.0,12.0,10.0,11.5,200
AAPL,2024-01-02,10.0,11.0,9.0,10.5,100
MSFT,2024-01-02,10.0,11.0,9.0,10.5,100
AAPL,2024-01-03,10.0,9.0,11.0,10.5,100
MSFT,2024-01-04,11.5,13.0,11.0,12.5,300
";

    #[test]
    fn csv_groups_and_sorts_per_ticker() {
        let data = bars_from_csv_reader(CSV.as_bytes(), 0).unwrap();
        assert_eq!(data.keys().collect::<Vec<_>>(), vec!["AAPL", "MSFT"]);

        let msft = &data["MSFT"];
        assert_eq!(msft.len(), 3);
        assert!(msft.windows(2).all(|w| w[0].date() < w[1].date()));
        assert_eq!(msft[2].volume(), 300);
    }

    #[test]
    fn csv_skips_invalid_rows() {
        let data = bars_from_csv_reader(CSV.as_bytes(), 0).unwrap();
        assert_eq!(data["AAPL"].len(), 1);
    }

    #[test]
    fn csv_keeps_most_recent_bars() {
        let data = bars_from_csv_reader(CSV.as_bytes(), 2).unwrap();
        let msft = &data["MSFT"];
        assert_eq!(msft.len(), 2);
        assert_eq!(msft[0].date().to_string(), "2024-01-03");
    }

    #[test]
    fn csv_reports_malformed_rows() {
        let raw = "ticker,date,open,high,low,close,volume\nAAPL,not-a-date,1,1,1,1,1\n";
        assert!(bars_from_csv_reader(raw.as_bytes(), 0).is_err());
    }

    #[test]
    fn tickers_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "AAPL\r\n\n  MSFT \nNVDA").unwrap();
        let tickers = read_tickers(file.path()).unwrap();
        assert_eq!(tickers, vec!["AAPL", "MSFT", "NVDA"]);
    }

    #[test]
    fn synthetic_bars_are_reproducible_and_valid() {
        let first = synthetic_bars("SYN", 300, 42, 100.0);
        let second = synthetic_bars("SYN", 300, 42, 100.0);
        assert_eq!(first, second);
        assert_eq!(first.len(), 300);
        assert!(first.iter().all(|b| b.validate().is_ok()));
        assert!(first.windows(2).all(|w| w[0].date() < w[1].date()));
        assert_ne!(first, synthetic_bars("SYN", 300, 43, 100.0));
    }
}
