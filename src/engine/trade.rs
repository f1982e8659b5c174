use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which exit order closed (part of) a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitKind {
    Partial,
    Full,
    Stop,
}

impl fmt::Display for ExitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Partial => "Partial",
            Self::Full => "Full",
            Self::Stop => "Stop",
        };
        f.write_str(label)
    }
}

/// A completed exit. One entry produces one or two records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    ticker: String,
    buy_date: NaiveDate,
    sell_date: NaiveDate,
    buy_price: f64,
    sell_price: f64,
    quantity: u64,
    exit: ExitKind,
}

impl TradeRecord {
    pub(crate) fn new(
        ticker: impl Into<String>,
        buy_date: NaiveDate,
        sell_date: NaiveDate,
        buy_price: f64,
        sell_price: f64,
        quantity: u64,
        exit: ExitKind,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            buy_date,
            sell_date,
            buy_price,
            sell_price,
            quantity,
            exit,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn buy_date(&self) -> NaiveDate {
        self.buy_date
    }

    pub fn sell_date(&self) -> NaiveDate {
        self.sell_date
    }

    pub fn buy_price(&self) -> f64 {
        self.buy_price
    }

    pub fn sell_price(&self) -> f64 {
        self.sell_price
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn exit(&self) -> ExitKind {
        self.exit
    }

    /// Realized profit: `(sell - buy) * quantity`.
    pub fn profit(&self) -> f64 {
        (self.sell_price - self.buy_price) * self.quantity as f64
    }
}

impl fmt::Display for TradeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<8} {:>10.2} {:>10.2} {:>8} {:>12.2} {} {} {}",
            self.ticker,
            self.buy_price,
            self.sell_price,
            self.quantity,
            self.profit(),
            self.buy_date,
            self.sell_date,
            self.exit
        )
    }
}
