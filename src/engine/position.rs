use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::engine::{FillScope, Order, OrderKind, OrderSide};

/// Hands out order ids in creation order, so runs stay reproducible.
#[derive(Debug, Default, Clone)]
pub(crate) struct OrderSequence {
    next: u64,
}

impl OrderSequence {
    pub(crate) fn next_id(&mut self) -> u64 {
        self.next += 1;
        self.next
    }
}

/// A long position and the exit orders attached to it.
///
/// The partial target only exists until it fills; afterwards the stop sits at the entry price
/// and covers the remaining quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    entry_price: f64,
    entry_date: NaiveDate,
    quantity: u64,
    stop: Order,
    partial_target: Option<Order>,
    full_target: Order,
}

impl OpenPosition {
    /// Opens a position from a filled entry order and derives its exits from `adr`.
    ///
    /// The partial target takes half of the quantity rounded down, the full target the rest.
    pub(crate) fn open(
        entry: &Order,
        entry_date: NaiveDate,
        adr: f64,
        config: &Config,
        ids: &mut OrderSequence,
    ) -> Self {
        let entry_price = entry.price();
        let quantity = entry.quantity();
        let ticker = entry.ticker();
        let half = quantity / 2;

        let stop = Order::new(
            ids.next_id(),
            OrderKind::Stop,
            OrderSide::Sell,
            entry_price - adr,
            quantity,
            ticker,
            FillScope::Full,
        );
        let partial_target = Order::new(
            ids.next_id(),
            OrderKind::Limit,
            OrderSide::Sell,
            entry_price + config.partial_target_multiplier * adr,
            half,
            ticker,
            FillScope::Partial,
        );
        let full_target = Order::new(
            ids.next_id(),
            OrderKind::Limit,
            OrderSide::Sell,
            entry_price + config.full_target_multiplier * adr,
            quantity - half,
            ticker,
            FillScope::Full,
        );

        Self {
            entry_price,
            entry_date,
            quantity,
            stop,
            partial_target: Some(partial_target),
            full_target,
        }
    }

    pub fn entry_price(&self) -> f64 {
        self.entry_price
    }

    pub fn entry_date(&self) -> NaiveDate {
        self.entry_date
    }

    /// Quantity still held.
    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn stop(&self) -> &Order {
        &self.stop
    }

    pub fn partial_target(&self) -> Option<&Order> {
        self.partial_target.as_ref()
    }

    pub fn full_target(&self) -> &Order {
        &self.full_target
    }

    /// The position left after the partial target filled, protected by `breakeven_stop`.
    pub(crate) fn after_partial(&self, filled: u64, breakeven_stop: Order) -> Self {
        Self {
            quantity: self.quantity - filled,
            stop: breakeven_stop,
            partial_target: None,
            ..self.clone()
        }
    }
}
