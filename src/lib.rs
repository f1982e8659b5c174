//! # BTE: Backtest Execution simulator
//!
//! **BTE** replays daily OHLCV bars of an instrument through a simulated order book and
//! records the completed trades. No exchange is involved: entries, stops and profit targets
//! are filled bar by bar with the priority rules a real book would apply.
//!
//! ## Core Components
//! | Component             | Description                                                                  |
//! |-----------------------|------------------------------------------------------------------------------|
//! | **`Bar`**             | One daily OHLCV record of a ticker.                                          |
//! | **`Indicators`**      | Moving average of close, average daily range (ADR), average volume.          |
//! | **`Order`**           | Immutable entry/exit order: a fill or cancel yields a new value.             |
//! | **`PositionMachine`** | Flat, pending entry, open, partially closed: one transition per bar.         |
//! | **`TradeRecord`**     | One completed round trip (or half of it on a partial exit).                  |
//! | **`Backtest`**        | Feeds bars and indicator snapshots to the machine and collects the trades.   |
//! | **`Stats`**           | Totals, wins, losses, win rate, profit factor, drawdown.                     |
//!
//! ## Trading rules
//! - A signal fires on a bar whose high crosses above the moving average while the average
//!   volume is above the liquidity floor. A buy stop-limit is placed at
//!   `ma + entry_offset * adr`, sized `floor(dollar_risk / adr)`.
//! - Once filled, a stop sits one ADR below the entry, half the position targets
//!   `entry + partial * adr` and the rest `entry + full * adr`.
//! - The stop wins when a bar touches both the stop and a target. After the partial exit
//!   the stop moves to breakeven.
//!
//! ## Getting Started
//! ```rust
//! use bte_rs::prelude::*;
//!
//! let config = Config {
//!     dollar_risk: 250.0,
//!     ..Config::default()
//! };
//! let bars = bte_rs::utils::synthetic_bars("DEMO", 500, 7, 80.0);
//!
//! let bts = Backtest::new(config).unwrap();
//! let trades = bts.run(&bars);
//! for trade in &trades {
//!     println!("{trade}");
//! }
//! println!("{}", Stats::from(trades.as_slice()));
//! ```
//!
//! ## Features
//! | Feature     | Description                                                          |
//! |-------------|----------------------------------------------------------------------|
//! | `draws`     | Cumulative P/L chart (SVG or PNG) with `plotters`. Enabled by default. |
//! | `optimizer` | Parallel universe runs and parameter sweeps with `rayon`.            |
//! | `json`      | JSON bar files with `serde_json`.                                    |
//! | `cli`       | The `bte` binary.                                                    |
//!
//! ## Logging
//! The library emits `tracing` events and spans (`backtest` span per series). Install any
//! subscriber to see them; the `bte` binary reads its filter from `BTE_LOG`.

/// Bars, indicators, orders, the position state machine and the backtest runner.
pub mod engine;

/// Error types for the library.
pub mod errors;

/// Simulation parameters.
pub mod config;

/// Aggregate statistics and equity curve.
pub mod metrics;

/// Bar and ticker loading, synthetic series.
pub mod utils;

/// Parallel universe runs and parameter sweeps.
#[cfg(feature = "optimizer")]
pub mod optimizer;

/// Equity curve charts: png, svg.
#[cfg(feature = "draws")]
pub mod draws;

/// Re-exports of commonly used types for convenience.
pub mod prelude {
    pub use crate::config::*;
    pub use crate::engine::*;
    pub use crate::errors::*;
    pub use crate::metrics::*;

    #[cfg(feature = "optimizer")]
    pub use crate::optimizer::*;

    #[cfg(feature = "draws")]
    pub use crate::draws::*;
}
