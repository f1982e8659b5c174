use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use bte_rs::prelude::*;
use bte_rs::utils::{read_bars_csv, read_tickers, synthetic_bars};
use clap::Parser;

/// Replays daily bars through the simulator and prints the completed trades.
#[derive(Debug, Parser)]
#[command(name = "bte", version, about)]
struct Args {
    /// CSV file of `ticker,date,open,high,low,close,volume` rows.
    #[arg(long, conflicts_with = "synthetic")]
    bars: Option<PathBuf>,

    /// Ticker universe, one per line. Defaults to every ticker of the bar file.
    #[arg(long)]
    tickers: Option<PathBuf>,

    /// Keep only the most recent bars of each ticker read from `--bars` (0 keeps all).
    #[arg(long, default_value_t = 0)]
    max_bars: usize,

    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Generate this many synthetic tickers instead of reading bars.
    #[arg(long)]
    synthetic: Option<usize>,

    /// Number of bars of each synthetic series.
    #[arg(long, default_value_t = 250)]
    synthetic_bars: usize,

    /// Seed of the synthetic series.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Run the tickers on the rayon pool.
    #[arg(long)]
    parallel: bool,

    /// Write the cumulative P/L chart to this file (.svg or .png).
    #[cfg(feature = "draws")]
    #[arg(long)]
    chart: Option<PathBuf>,

    /// Default log filter, overridden by `BTE_LOG`.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// `text` or `json`.
    #[arg(long, default_value = "text")]
    log_format: String,
}

fn init_tracing(log_level: &str, log_format: &str) -> Result<()> {
    let filter = std::env::var("BTE_LOG").unwrap_or_else(|_| log_level.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter).context("invalid log filter")?;

    let format = log_format.trim().to_lowercase();
    if format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn load_data(args: &Args) -> Result<(Vec<String>, BTreeMap<String, Vec<Bar>>)> {
    let data = match (&args.bars, args.synthetic) {
        (Some(path), _) => {
            read_bars_csv(path, args.max_bars).with_context(|| format!("reading bars from {}", path.display()))?
        }
        (None, Some(count)) => (0..count)
            .map(|i| {
                let ticker = format!("SYN{i:03}");
                let base_price = 20.0 + 10.0 * i as f64;
                let bars = synthetic_bars(&ticker, args.synthetic_bars, args.seed + i as u64, base_price);
                (ticker, bars)
            })
            .collect(),
        (None, None) => bail!("either --bars or --synthetic is required"),
    };

    let tickers = match &args.tickers {
        Some(path) => read_tickers(path).with_context(|| format!("reading tickers from {}", path.display()))?,
        None => data.keys().cloned().collect(),
    };
    Ok((tickers, data))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level, &args.log_format)?;

    let config = match &args.config {
        Some(path) => Config::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    let (tickers, data) = load_data(&args)?;
    tracing::info!(tickers = tickers.len(), parallel = args.parallel, "starting backtest");

    let bts = Backtest::new(config)?;
    let trades = if args.parallel {
        run_universe_par(&bts, &tickers, &data)
    } else {
        bts.run_universe(&tickers, &data)
    };

    println!(
        "{:<8} {:>10} {:>10} {:>8} {:>12} {:<10} {:<10} Exit",
        "Ticker", "Buy", "Sell", "Qty", "Profit", "Bought", "Sold"
    );
    for trade in &trades {
        println!("{trade}");
    }
    println!();
    print!("{}", Stats::from(trades.as_slice()));

    #[cfg(feature = "draws")]
    if let Some(path) = &args.chart {
        if trades.is_empty() {
            tracing::warn!("no trades, chart skipped");
        } else {
            let options = DrawOptions::default()
                .title("Cumulative P/L")
                .draw_output(DrawOutput::from_path(path))
                .show_stats(true);
            Draw::with_trades(&trades).with_options(options).plot()?;
        }
    }

    Ok(())
}
