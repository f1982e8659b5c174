//! # Universe backtest
//!
//! Replays a small synthetic universe with a wider profit target, prints every trade,
//! the order journal of the first ticker and the aggregate summary.

use std::collections::BTreeMap;

use bte_rs::prelude::*;
use bte_rs::utils::synthetic_bars;

fn main() -> Result<()> {
    let tickers = ["ALFA", "BRVO", "CHRL", "DLTA"].map(String::from).to_vec();
    let data = tickers
        .iter()
        .enumerate()
        .map(|(i, ticker)| (ticker.clone(), synthetic_bars(ticker, 750, 42 + i as u64, 25.0 * (i + 1) as f64)))
        .collect::<BTreeMap<_, _>>();

    let config = Config {
        dollar_risk: 500.0,
        ma_period: 20,
        adr_period: 14,
        full_target_multiplier: 4.0,
        ..Config::default()
    };
    let bts = Backtest::new(config)?;

    let trades = bts.run_universe(&tickers, &data);
    for trade in &trades {
        println!("{trade}");
    }

    let (_, events) = bts.run_with_events(&data[&tickers[0]]);
    let canceled = events.iter().filter(|e| matches!(e, Event::OrderCanceled(..))).count();
    println!("\n{}: {} order events, {canceled} cancellations", tickers[0], events.len());
    for event in events.iter().take(6) {
        println!("{} {}", event.date(), event.order());
    }

    println!("\n{}", Stats::from(trades.as_slice()));

    #[cfg(feature = "draws")]
    if !trades.is_empty() {
        let options = DrawOptions::default()
            .title("Synthetic universe")
            .draw_output(DrawOutput::from_path("universe.svg"))
            .show_stats(true);
        Draw::with_trades(&trades).with_options(options).plot()?;
    }

    Ok(())
}
