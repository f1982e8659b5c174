use std::fmt;

use serde::{Deserialize, Serialize};

/// Represents the side of an order (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Execution style of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    Market,
    /// Fills once the market trades at the price or better (profit targets).
    Limit,
    /// Fills once the market trades through the price against the holder (stop-loss).
    Stop,
    /// Entry that triggers when the high reaches the price.
    BuyStopLimit,
}

/// How much of the position an exit order closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillScope {
    Partial,
    Full,
}

/// Lifecycle of an order. `Active` moves to `Filled` or `Canceled` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Active,
    Filled,
    Canceled,
}

/// An immutable order value.
///
/// Status changes produce a new `Order`; the previous value is left untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: u64,
    kind: OrderKind,
    side: OrderSide,
    price: f64,
    quantity: u64,
    ticker: String,
    scope: FillScope,
    status: OrderStatus,
}

impl Order {
    /// Creates an active order.
    pub fn new(
        id: u64,
        kind: OrderKind,
        side: OrderSide,
        price: f64,
        quantity: u64,
        ticker: impl Into<String>,
        scope: FillScope,
    ) -> Self {
        Self {
            id,
            kind,
            side,
            price,
            quantity,
            ticker: ticker.into(),
            scope,
            status: OrderStatus::Active,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> OrderKind {
        self.kind
    }

    pub fn side(&self) -> OrderSide {
        self.side
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn scope(&self) -> FillScope {
        self.scope
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == OrderStatus::Active
    }

    fn with_status(&self, status: OrderStatus) -> Self {
        debug_assert!(self.is_active(), "order {} is already {:?}", self.id, self.status);
        Self {
            status,
            ..self.clone()
        }
    }

    /// Returns the filled copy of this active order.
    pub fn filled(&self) -> Self {
        self.with_status(OrderStatus::Filled)
    }

    /// Returns the canceled copy of this active order.
    pub fn canceled(&self) -> Self {
        self.with_status(OrderStatus::Canceled)
    }

    /// Returns a fresh active order that replaces this one at a new price and quantity.
    pub fn replaced(&self, id: u64, price: f64, quantity: u64) -> Self {
        Self {
            id,
            price,
            quantity,
            status: OrderStatus::Active,
            ..self.clone()
        }
    }

    /// Returns the total notional of the order (price * quantity).
    pub fn cost(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Order #{} [{:?} {:?} {:?}, price: ${:.2}, quantity: {}, ticker: {}, {:?}]",
            self.id, self.kind, self.side, self.scope, self.price, self.quantity, self.ticker, self.status
        )
    }
}

#[cfg(test)]
fn stop_order() -> Order {
    Order::new(7, OrderKind::Stop, OrderSide::Sell, 98.0, 50, "AAPL", FillScope::Full)
}

#[cfg(test)]
#[test]
fn create_order() {
    let order = stop_order();

    assert_eq!(order.id(), 7);
    assert_eq!(order.price(), 98.0);
    assert_eq!(order.quantity(), 50);
    assert_eq!(order.cost(), 4900.0);
    assert_eq!(order.ticker(), "AAPL");
    assert!(matches!(order.kind(), OrderKind::Stop));
    assert!(matches!(order.side(), OrderSide::Sell));
    assert!(order.is_active());
}

#[cfg(test)]
#[test]
fn fill_leaves_order_untouched() {
    let order = stop_order();
    let filled = order.filled();

    assert_eq!(filled.status(), OrderStatus::Filled);
    assert_eq!(order.status(), OrderStatus::Active);
    assert_eq!(filled.id(), order.id());
}

#[cfg(test)]
#[test]
fn cancel_order() {
    let canceled = stop_order().canceled();
    assert_eq!(canceled.status(), OrderStatus::Canceled);
    assert!(!canceled.is_active());
}

#[cfg(test)]
#[test]
fn replace_order_at_breakeven() {
    let order = stop_order();
    let moved = order.replaced(8, 100.0, 25);

    assert_eq!(moved.id(), 8);
    assert_eq!(moved.price(), 100.0);
    assert_eq!(moved.quantity(), 25);
    assert!(moved.is_active());
    assert_eq!(moved.kind(), OrderKind::Stop);
    assert_eq!(order.price(), 98.0);
    assert_eq!(order.quantity(), 50);
}

#[cfg(all(test, debug_assertions))]
#[test]
#[should_panic]
fn fill_twice_panics_in_debug() {
    stop_order().filled().filled();
}
