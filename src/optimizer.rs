//! Parallel runs.
//!
//! `run_universe_par` spreads the tickers of a universe over the rayon pool. The `Optimizer`
//! replays a universe once per parameter combination, each combination producing its own
//! [`Config`], and reports the aggregate [`Stats`] of every run.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use rayon::prelude::*;

use crate::config::Config;
use crate::engine::{Backtest, Bar, TradeRecord};
use crate::errors::Result;
use crate::metrics::Stats;

/// Runs every ticker of `tickers` found in `data` in parallel.
///
/// Results are merged in ticker-list order, so the output equals [`Backtest::run_universe`].
pub fn run_universe_par(bts: &Backtest, tickers: &[String], data: &BTreeMap<String, Vec<Bar>>) -> Vec<TradeRecord> {
    tickers
        .par_iter()
        .map(|ticker| match data.get(ticker) {
            Some(bars) => bts.run(bars),
            None => {
                tracing::warn!(%ticker, "no data found for ticker");
                Vec::new()
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

/// Generates the parameter combinations to sweep.
///
/// The associated type `Output` is one combination (e.g. `(usize, f64)`); the combinator
/// given to [`Optimizer::with`] turns it into a [`Config`].
pub trait ParameterCombination: Sync {
    type Output: Clone + Send + Sync;

    fn generate() -> Vec<Self::Output>;
}

/// Replays a universe once per parameter combination.
pub struct Optimizer<PC: ParameterCombination> {
    tickers: Vec<String>,
    data: BTreeMap<String, Vec<Bar>>,
    _marker: PhantomData<PC>,
}

impl<PC: ParameterCombination> Optimizer<PC> {
    pub fn new(tickers: Vec<String>, data: BTreeMap<String, Vec<Bar>>) -> Self {
        Self {
            tickers,
            data,
            _marker: PhantomData,
        }
    }

    /// Runs every combination and returns its configuration with the resulting stats.
    ///
    /// Results keep the order of [`ParameterCombination::generate`]. Fails on the first
    /// combination whose configuration is rejected.
    pub fn with<C>(&self, combinator: C) -> Result<Vec<(Config, Stats)>>
    where
        C: Fn(&PC::Output) -> Result<Config> + Sync,
    {
        let num_cpus = num_cpus::get();
        let combinations = PC::generate();
        let chunk_size = combinations.len().div_ceil(num_cpus).max(1);

        combinations
            .par_chunks(chunk_size)
            .map::<_, Result<_>>(|par_combinations| {
                let mut local_results = Vec::with_capacity(par_combinations.len());
                for param_set in par_combinations {
                    let bts = Backtest::new(combinator(param_set)?)?;
                    let trades = bts.run_universe(&self.tickers, &self.data);
                    local_results.push((bts.config().clone(), Stats::from(trades.as_slice())));
                }
                Ok(local_results)
            })
            .collect::<Result<Vec<_>>>()
            .map(|chunks| chunks.into_iter().flatten().collect())
    }
}

#[cfg(test)]
struct Parameters;

#[cfg(test)]
impl ParameterCombination for Parameters {
    type Output = (usize, f64);

    fn generate() -> Vec<Self::Output> {
        (5..=8).flat_map(|ma| [1.0, 1.5, 2.0].map(move |partial| (ma, partial))).collect()
    }
}

#[cfg(test)]
fn get_data() -> (Vec<String>, BTreeMap<String, Vec<Bar>>) {
    use crate::utils::synthetic_bars;

    let tickers = vec!["AAA".to_string(), "BBB".to_string(), "CCC".to_string()];
    let data = tickers
        .iter()
        .enumerate()
        .map(|(i, t)| (t.clone(), synthetic_bars(t, 150, i as u64 + 1, 40.0 + i as f64 * 30.0)))
        .collect();
    (tickers, data)
}

#[cfg(test)]
#[test]
fn par_universe_matches_sequential() {
    let (mut tickers, data) = get_data();
    tickers.push("MISSING".to_string());
    let bts = Backtest::new(Config::default()).unwrap();
    assert_eq!(run_universe_par(&bts, &tickers, &data), bts.run_universe(&tickers, &data));
}

#[cfg(test)]
#[test]
fn optimizer_sweeps_every_combination() {
    let (tickers, data) = get_data();
    let opt = Optimizer::<Parameters>::new(tickers.clone(), data.clone());

    let result = opt
        .with(|&(ma_period, partial)| {
            Ok(Config {
                ma_period,
                partial_target_multiplier: partial,
                ..Config::default()
            })
        })
        .unwrap();

    assert_eq!(result.len(), Parameters::generate().len());
    assert_eq!(result[0].0.ma_period, 5);
    assert_eq!(result[0].0.partial_target_multiplier, 1.0);

    for (config, stats) in &result {
        let trades = Backtest::new(config.clone()).unwrap().run_universe(&tickers, &data);
        assert_eq!(*stats, Stats::from(trades.as_slice()));
    }
}

#[cfg(test)]
#[test]
fn optimizer_rejects_invalid_combination() {
    let (tickers, data) = get_data();
    let opt = Optimizer::<Parameters>::new(tickers, data);
    let result = opt.with(|&(_, partial)| {
        Ok(Config {
            full_target_multiplier: partial - 1.0,
            ..Config::default()
        })
    });
    assert!(result.is_err());
}
