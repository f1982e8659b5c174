//! Per-instrument position lifecycle.
//!
//! ```text
//! Flat --signal--> PendingEntry --high >= entry--> OpenSingle --high >= partial--> OpenPartial
//!  ^                                                  |                              |
//!  +------------------------- stop ------------------+---------- stop / full -------+
//! ```
//!
//! Exactly one transition is evaluated per bar, so a bar never records more than one exit.
//! Inside a bar that touches both the stop and a target, the stop wins.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::engine::{Bar, ExitKind, FillScope, OpenPosition, Order, OrderKind, OrderSequence, OrderSide, TradeRecord};
use crate::errors::{Error, Result};

/// Indicator values of one bar, computed once the warm-up is over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    /// Moving average of close.
    pub moving_average: f64,
    /// Average daily range.
    pub adr: f64,
    /// Average volume.
    pub avg_volume: f64,
}

impl Snapshot {
    pub fn is_finite(&self) -> bool {
        self.moving_average.is_finite() && self.adr.is_finite() && self.avg_volume.is_finite()
    }
}

/// Where the single position of a run stands.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PositionState {
    /// No order and no position.
    #[default]
    Flat,
    /// An entry order waits for the market to reach its price.
    PendingEntry {
        /// Active entry order.
        order: Order,
        /// Range the order was sized with; the exits are placed with it too.
        adr: f64,
    },
    /// Full quantity held, partial target still working.
    OpenSingle {
        /// The open position.
        position: OpenPosition,
    },
    /// Partial target filled, stop moved to breakeven.
    OpenPartial {
        /// The open position.
        position: OpenPosition,
    },
}

impl PositionState {
    pub fn is_flat(&self) -> bool {
        matches!(self, Self::Flat)
    }

    /// The open position, if any.
    pub fn position(&self) -> Option<&OpenPosition> {
        match self {
            Self::OpenSingle { position } | Self::OpenPartial { position } => Some(position),
            _ => None,
        }
    }
}

/// Order lifecycle journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// A new active order.
    OrderPlaced(NaiveDate, Order),
    /// An order executed.
    OrderFilled(NaiveDate, Order),
    /// An order withdrawn before execution.
    OrderCanceled(NaiveDate, Order),
}

impl Event {
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::OrderPlaced(date, _) | Self::OrderFilled(date, _) | Self::OrderCanceled(date, _) => *date,
        }
    }

    pub fn order(&self) -> &Order {
        match self {
            Self::OrderPlaced(_, order) | Self::OrderFilled(_, order) | Self::OrderCanceled(_, order) => order,
        }
    }
}

/// Drives one position at a time through entry, partial exit and final exit.
#[derive(Debug, Clone)]
pub struct PositionMachine {
    config: Config,
    state: PositionState,
    ids: OrderSequence,
    events: Vec<Event>,
}

impl PositionMachine {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: PositionState::Flat,
            ids: OrderSequence::default(),
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> &PositionState {
        &self.state
    }

    /// Returns an iterator over the order journal.
    pub fn events(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    /// Feeds one bar. `snapshot` is `None` while the indicators are still warming up.
    ///
    /// Returns the exit recorded on this bar, if any.
    pub fn on_bar(&mut self, bar: &Bar, snapshot: Option<&Snapshot>) -> Option<TradeRecord> {
        match std::mem::take(&mut self.state) {
            PositionState::Flat => {
                if let Some(snapshot) = snapshot {
                    self.signal(bar, snapshot);
                }
                None
            }
            PositionState::PendingEntry { order, adr } => {
                self.pending_entry(bar, order, adr);
                None
            }
            PositionState::OpenSingle { position } => self.open_single(bar, position),
            PositionState::OpenPartial { position } => self.open_partial(bar, position),
        }
    }

    /// Entry size for the given range: `floor(dollar_risk / adr)`.
    pub fn order_size(&self, adr: f64) -> Result<u64> {
        if !(adr > 0.0 && adr.is_finite()) {
            return Err(Error::ZeroAdr);
        }
        Ok((self.config.dollar_risk / adr).floor() as u64)
    }

    fn signal(&mut self, bar: &Bar, snapshot: &Snapshot) {
        let crossed = bar.high() > snapshot.moving_average;
        let liquid = snapshot.avg_volume > self.config.liquidity_floor as f64;
        if !(crossed && liquid) {
            return;
        }

        let size = match self.order_size(snapshot.adr) {
            Ok(size) => size,
            Err(err) => {
                tracing::debug!(ticker = bar.ticker(), date = %bar.date(), error = %err, "signal skipped");
                return;
            }
        };
        if size < self.config.min_order_size {
            tracing::debug!(ticker = bar.ticker(), date = %bar.date(), size, "order size below minimum");
            return;
        }

        let price = snapshot.moving_average + self.config.entry_offset_multiplier * snapshot.adr;
        let order = Order::new(
            self.ids.next_id(),
            OrderKind::BuyStopLimit,
            OrderSide::Buy,
            price,
            size,
            bar.ticker(),
            FillScope::Full,
        );
        tracing::debug!(date = %bar.date(), %order, "entry order placed");
        self.events.push(Event::OrderPlaced(bar.date(), order.clone()));
        self.state = PositionState::PendingEntry {
            order,
            adr: snapshot.adr,
        };
    }

    fn pending_entry(&mut self, bar: &Bar, order: Order, adr: f64) {
        let reached = bar.high() >= order.price();
        if !reached {
            self.state = PositionState::PendingEntry { order, adr };
            return;
        }

        let filled = order.filled();
        let position = OpenPosition::open(&filled, bar.date(), adr, &self.config, &mut self.ids);
        tracing::debug!(
            date = %bar.date(),
            price = filled.price(),
            quantity = filled.quantity(),
            stop = position.stop().price(),
            full_target = position.full_target().price(),
            "entry filled"
        );

        self.events.push(Event::OrderFilled(bar.date(), filled));
        self.events.push(Event::OrderPlaced(bar.date(), position.stop().clone()));
        if let Some(partial) = position.partial_target() {
            self.events.push(Event::OrderPlaced(bar.date(), partial.clone()));
        }
        self.events.push(Event::OrderPlaced(bar.date(), position.full_target().clone()));
        self.state = PositionState::OpenSingle { position };
    }

    fn open_single(&mut self, bar: &Bar, position: OpenPosition) -> Option<TradeRecord> {
        if bar.low() <= position.stop().price() {
            let trade = self.record(bar, &position, position.stop(), position.quantity(), ExitKind::Stop);
            if let Some(partial) = position.partial_target() {
                self.events.push(Event::OrderCanceled(bar.date(), partial.canceled()));
            }
            self.events.push(Event::OrderCanceled(bar.date(), position.full_target().canceled()));
            return Some(trade);
        }

        let Some(partial) = position.partial_target().cloned() else {
            // without a partial target the position already behaves like a partial one
            return self.open_partial(bar, position);
        };
        let reached = bar.high() >= partial.price();
        if !reached {
            self.state = PositionState::OpenSingle { position };
            return None;
        }

        let trade = self.record(bar, &position, &partial, partial.quantity(), ExitKind::Partial);
        let remaining = position.quantity() - partial.quantity();
        let breakeven = position
            .stop()
            .replaced(self.ids.next_id(), position.entry_price(), remaining);
        self.events.push(Event::OrderCanceled(bar.date(), position.stop().canceled()));
        self.events.push(Event::OrderPlaced(bar.date(), breakeven.clone()));
        tracing::debug!(date = %bar.date(), stop = breakeven.price(), remaining, "stop moved to breakeven");

        self.state = PositionState::OpenPartial {
            position: position.after_partial(partial.quantity(), breakeven),
        };
        Some(trade)
    }

    fn open_partial(&mut self, bar: &Bar, position: OpenPosition) -> Option<TradeRecord> {
        if bar.low() <= position.stop().price() {
            let trade = self.record(bar, &position, position.stop(), position.quantity(), ExitKind::Stop);
            self.events.push(Event::OrderCanceled(bar.date(), position.full_target().canceled()));
            return Some(trade);
        }

        if bar.high() >= position.full_target().price() {
            let trade = self.record(bar, &position, position.full_target(), position.quantity(), ExitKind::Full);
            self.events.push(Event::OrderCanceled(bar.date(), position.stop().canceled()));
            return Some(trade);
        }

        self.state = PositionState::OpenPartial { position };
        None
    }

    fn record(
        &mut self,
        bar: &Bar,
        position: &OpenPosition,
        exit: &Order,
        quantity: u64,
        kind: ExitKind,
    ) -> TradeRecord {
        let trade = TradeRecord::new(
            exit.ticker(),
            position.entry_date(),
            bar.date(),
            position.entry_price(),
            exit.price(),
            quantity,
            kind,
        );
        tracing::debug!(date = %bar.date(), exit = %kind, price = exit.price(), quantity, "exit filled");
        self.events.push(Event::OrderFilled(bar.date(), exit.filled()));
        trade
    }
}
