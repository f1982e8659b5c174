//! Aggregate statistics over a list of completed trades.
//!
//! Nothing here is stored by the simulator: `Stats` is recomputed from the trade list,
//! which stays the single source of truth.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::engine::TradeRecord;

/// Counters and ratios derived from a trade list.
///
/// A trade with a profit of exactly zero (breakeven stop) counts as a loss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    total_trades: usize,
    total_profit: f64,
    wins: usize,
    losses: usize,
    gross_profit: f64,
    gross_loss: f64,
    max_drawdown: f64,
}

impl From<&[TradeRecord]> for Stats {
    fn from(trades: &[TradeRecord]) -> Self {
        let mut stats = Self::default();
        for trade in trades {
            let profit = trade.profit();
            stats.total_trades += 1;
            stats.total_profit += profit;
            if profit > 0.0 {
                stats.wins += 1;
                stats.gross_profit += profit;
            } else {
                stats.losses += 1;
                stats.gross_loss += profit.abs();
            }
        }

        let mut peak = 0.0_f64;
        for (_, cumulative) in equity_curve(trades) {
            peak = peak.max(cumulative);
            stats.max_drawdown = stats.max_drawdown.max(peak - cumulative);
        }
        stats
    }
}

impl From<&Vec<TradeRecord>> for Stats {
    fn from(trades: &Vec<TradeRecord>) -> Self {
        Self::from(trades.as_slice())
    }
}

impl Stats {
    pub fn total_trades(&self) -> usize {
        self.total_trades
    }

    /// Sum of `(sell - buy) * quantity` over all trades.
    pub fn total_profit(&self) -> f64 {
        self.total_profit
    }

    pub fn wins(&self) -> usize {
        self.wins
    }

    pub fn losses(&self) -> usize {
        self.losses
    }

    /// Largest drop of the cumulative profit curve from a previous peak, in money.
    pub fn max_drawdown(&self) -> f64 {
        self.max_drawdown
    }

    /// Computes the win rate as a percentage of winning trades.
    pub fn win_rate(&self) -> f64 {
        if self.total_trades == 0 {
            return 0.0;
        }
        (self.wins as f64 / self.total_trades as f64) * 100.0
    }

    /// Computes the profit factor: gross profit over gross loss.
    ///
    /// Zero without trades, infinite when no trade lost money.
    pub fn profit_factor(&self) -> f64 {
        if self.total_trades == 0 {
            return 0.0;
        }
        if self.gross_loss == 0.0 {
            return f64::INFINITY;
        }
        self.gross_profit / self.gross_loss
    }

    /// Mean profit per trade.
    pub fn average_trade(&self) -> f64 {
        if self.total_trades == 0 {
            return 0.0;
        }
        self.total_profit / self.total_trades as f64
    }
}

/// Cumulative profit after each trade, ordered by sell date.
///
/// Trades closing on the same date keep their relative order.
pub fn equity_curve(trades: &[TradeRecord]) -> Vec<(NaiveDate, f64)> {
    let mut sorted = trades.iter().collect::<Vec<_>>();
    sorted.sort_by_key(|t| t.sell_date());

    let mut cumulative = 0.0;
    sorted
        .into_iter()
        .map(|trade| {
            cumulative += trade.profit();
            (trade.sell_date(), cumulative)
        })
        .collect()
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Backtesting completed ===")?;
        writeln!(f, "Total Trades: {}", self.total_trades)?;
        writeln!(f, "Total Profit: ${:.2}", self.total_profit)?;
        writeln!(f, "Wins: {}", self.wins)?;
        writeln!(f, "Losses: {}", self.losses)?;
        #[allow(clippy::writeln_empty_string)]
        writeln!(f, "")?;
        writeln!(f, "Win Rate: {:.2}%", self.win_rate())?;
        writeln!(f, "Profit Factor: {:.2}", self.profit_factor())?;
        writeln!(f, "Average Trade: ${:.2}", self.average_trade())?;
        writeln!(f, "Max Drawdown: ${:.2}", self.max_drawdown)
    }
}

#[cfg(test)]
fn trade(sell_day: u32, buy: f64, sell: f64, quantity: u64) -> TradeRecord {
    use crate::engine::ExitKind;

    let date = |d| NaiveDate::from_ymd_opt(2024, 4, d).unwrap();
    let exit = if sell > buy { ExitKind::Full } else { ExitKind::Stop };
    TradeRecord::new("TEST", date(1), date(sell_day), buy, sell, quantity, exit)
}

#[cfg(test)]
#[test]
fn stats_from_trades() {
    let trades = vec![trade(2, 100.0, 102.0, 25), trade(3, 100.0, 98.0, 50), trade(4, 100.0, 106.0, 25)];
    let stats = Stats::from(&trades);

    assert_eq!(stats.total_trades(), 3);
    assert_eq!(stats.total_profit(), 100.0); // 50 - 100 + 150
    assert_eq!(stats.wins(), 2);
    assert_eq!(stats.losses(), 1);
    assert_eq!(stats.profit_factor(), 2.0); // 200 / 100
}

#[cfg(test)]
#[test]
fn breakeven_counts_as_loss() {
    let trades = vec![trade(2, 100.0, 100.0, 25)];
    let stats = Stats::from(&trades);
    assert_eq!(stats.wins(), 0);
    assert_eq!(stats.losses(), 1);
    assert_eq!(stats.total_profit(), 0.0);
}

#[cfg(test)]
#[test]
fn stats_no_trades() {
    let trades: Vec<TradeRecord> = Vec::new();
    let stats = Stats::from(&trades);
    assert_eq!(stats.total_trades(), 0);
    assert_eq!(stats.win_rate(), 0.0);
    assert_eq!(stats.average_trade(), 0.0);
    assert_eq!(stats.max_drawdown(), 0.0);
    assert_eq!(stats.profit_factor(), 0.0);
    assert!(stats.to_string().contains("Profit Factor: 0.00"));
}

#[cfg(test)]
#[test]
fn profit_factor_without_losses() {
    let trades = vec![trade(2, 100.0, 102.0, 25)];
    assert_eq!(Stats::from(&trades).profit_factor(), f64::INFINITY);
}

#[cfg(test)]
#[test]
fn win_rate() {
    let trades = vec![trade(2, 100.0, 110.0, 1), trade(3, 100.0, 90.0, 1)];
    assert_eq!(Stats::from(&trades).win_rate(), 50.0);
}

#[cfg(test)]
#[test]
fn equity_curve_sorted_by_sell_date() {
    let trades = vec![trade(5, 100.0, 101.0, 10), trade(3, 100.0, 99.0, 10)];
    let curve = equity_curve(&trades);
    let days = curve.iter().map(|(d, _)| d.to_string()).collect::<Vec<_>>();
    assert_eq!(days, vec!["2024-04-03", "2024-04-05"]);
    assert_eq!(curve[0].1, -10.0);
    assert_eq!(curve[1].1, 0.0);
}

#[cfg(test)]
#[test]
fn max_drawdown() {
    // +20, -30, +10 => peak 20, trough -10
    let trades = vec![trade(2, 100.0, 120.0, 1), trade(3, 100.0, 70.0, 1), trade(4, 100.0, 110.0, 1)];
    assert_eq!(Stats::from(&trades).max_drawdown(), 30.0);
}

#[cfg(test)]
#[test]
fn display_summary() {
    let trades = vec![trade(2, 100.0, 102.0, 25)];
    let summary = Stats::from(&trades).to_string();
    assert!(summary.contains("Total Trades: 1"));
    assert!(summary.contains("Total Profit: $50.00"));
    assert!(summary.contains("Wins: 1"));
}
