//! Core simulation components.
//!
//! This module provides the fundamental types for backtesting:
//! - `Bar`: daily OHLCV record of one instrument.
//! - `Indicators`: moving average, average daily range and average volume.
//! - `Order`: immutable entry and exit orders.
//! - `OpenPosition`: a held position with its stop and targets.
//! - `PositionMachine`: the per-bar position lifecycle.
//! - `Backtest`: the runner feeding bars and indicators to the machine.

mod bar;
mod bts;
mod indicators;
mod order;
mod position;
mod state;
mod trade;

pub use bar::*;
pub use bts::*;
pub use indicators::*;
pub use order::*;
pub use position::OpenPosition;
pub(crate) use position::OrderSequence;
pub use state::*;
pub use trade::*;
