use std::collections::BTreeMap;

use bte_rs::prelude::*;
use bte_rs::utils::synthetic_bars;
use chrono::NaiveDate;
use proptest::prelude::*;

fn config_strategy() -> impl Strategy<Value = Config> {
    (2usize..25, 2usize..25, 50.0f64..2_000.0, 0.0f64..1.0, 0.25f64..2.0, 0.0f64..3.0).prop_map(
        |(ma_period, adr_period, dollar_risk, entry_offset, partial, extra)| Config {
            dollar_risk,
            ma_period,
            adr_period,
            entry_offset_multiplier: entry_offset,
            partial_target_multiplier: partial,
            full_target_multiplier: partial + extra,
            ..Config::default()
        },
    )
}

/// Filled entry quantities keyed by fill date.
fn entries(events: &[Event]) -> BTreeMap<NaiveDate, u64> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::OrderFilled(date, order) if order.kind() == OrderKind::BuyStopLimit => {
                Some((*date, order.quantity()))
            }
            _ => None,
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn exits_conserve_entry_quantity(
        config in config_strategy(),
        seed in any::<u64>(),
        count in 2usize..400,
        base in 5.0f64..500.0,
    ) {
        let bars = synthetic_bars("PROP", count, seed, base);
        let (trades, events) = Backtest::new(config).unwrap().run_with_events(&bars);
        let entries = entries(&events);

        let mut exits: BTreeMap<NaiveDate, Vec<&TradeRecord>> = BTreeMap::new();
        for trade in &trades {
            prop_assert!(trade.sell_date() > trade.buy_date());
            exits.entry(trade.buy_date()).or_default().push(trade);
        }

        for (buy_date, records) in &exits {
            prop_assert!(records.len() <= 2);
            let entry_quantity = entries.get(buy_date).copied();
            prop_assert!(entry_quantity.is_some());

            let exited = records.iter().map(|t| t.quantity()).sum::<u64>();
            let closed = records.last().map(|t| t.exit() != ExitKind::Partial).unwrap_or(false);
            if closed {
                prop_assert_eq!(Some(exited), entry_quantity);
            } else {
                prop_assert!(Some(exited) < entry_quantity);
            }
            if records.len() == 2 {
                prop_assert_eq!(records[0].exit(), ExitKind::Partial);
                prop_assert!(records[1].exit() != ExitKind::Partial);
            }
        }
    }

    #[test]
    fn stop_exits_never_profit(config in config_strategy(), seed in any::<u64>()) {
        let bars = synthetic_bars("PROP", 300, seed, 50.0);
        for trade in Backtest::new(config).unwrap().run(&bars) {
            match trade.exit() {
                ExitKind::Stop => prop_assert!(trade.profit() <= 0.0),
                ExitKind::Partial | ExitKind::Full => prop_assert!(trade.profit() > 0.0),
            }
        }
    }

    #[test]
    fn runs_are_deterministic(config in config_strategy(), seed in any::<u64>()) {
        let bars = synthetic_bars("PROP", 250, seed, 80.0);
        let bts = Backtest::new(config).unwrap();
        prop_assert_eq!(bts.run_with_events(&bars), bts.run_with_events(&bars));
    }

    #[test]
    fn stats_match_trade_list(config in config_strategy(), seed in any::<u64>()) {
        let bars = synthetic_bars("PROP", 300, seed, 30.0);
        let trades = Backtest::new(config).unwrap().run(&bars);
        let stats = Stats::from(trades.as_slice());

        prop_assert_eq!(stats.total_trades(), trades.len());
        prop_assert_eq!(stats.wins() + stats.losses(), trades.len());
        let total = trades.iter().map(TradeRecord::profit).sum::<f64>();
        prop_assert!((stats.total_profit() - total).abs() < 1e-6);
        prop_assert!(stats.max_drawdown() >= 0.0);
    }
}
