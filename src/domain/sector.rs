//! Sector aggregation: final cumulative return per ticker and top-N ranking.
//!
//! A ticker whose series cannot be loaded is skipped, never fatal. Each
//! ticker gets an outcome record so callers can report what was left out.

use crate::domain::error::KumoError;
use crate::domain::indicator::returns::{add_cumulative_return, add_daily_return};
use crate::domain::series::{CUM_RETURN, DateRange, PriceSeries};
use crate::ports::data_port::DataPort;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct FinalReturn {
    pub ticker: String,
    pub cum_return: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    Unloadable(String),
    NoCumulativeReturn,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeStatus {
    Included(f64),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickerOutcome {
    pub ticker: String,
    pub status: OutcomeStatus,
}

#[derive(Debug, Clone, Default)]
pub struct SectorAggregation {
    /// Included tickers, in input order.
    pub returns: Vec<FinalReturn>,
    /// One record per input ticker, in input order.
    pub outcomes: Vec<TickerOutcome>,
}

impl SectorAggregation {
    pub fn as_map(&self) -> HashMap<String, f64> {
        self.returns
            .iter()
            .map(|r| (r.ticker.clone(), r.cum_return))
            .collect()
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&str, &SkipReason)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            OutcomeStatus::Skipped(reason) => Some((o.ticker.as_str(), reason)),
            OutcomeStatus::Included(_) => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Descending,
    Ascending,
}

/// Collects the last defined `cum_return` of each loadable series. A
/// non-finite final value counts as no return.
pub fn aggregate_final_returns<I, S>(series_by_ticker: I) -> SectorAggregation
where
    I: IntoIterator<Item = (S, Result<PriceSeries, KumoError>)>,
    S: Into<String>,
{
    let mut aggregation = SectorAggregation::default();

    for (ticker, loaded) in series_by_ticker {
        let ticker = ticker.into();
        let status = match loaded {
            Err(e) => {
                tracing::warn!(ticker = %ticker, error = %e, "skipping ticker: series unavailable");
                OutcomeStatus::Skipped(SkipReason::Unloadable(e.to_string()))
            }
            Ok(series) => match series.last_value(CUM_RETURN).filter(|v| v.is_finite()) {
                Some(value) => {
                    aggregation.returns.push(FinalReturn {
                        ticker: ticker.clone(),
                        cum_return: value,
                    });
                    OutcomeStatus::Included(value)
                }
                None => {
                    tracing::warn!(ticker = %ticker, "skipping ticker: no cumulative return");
                    OutcomeStatus::Skipped(SkipReason::NoCumulativeReturn)
                }
            },
        };
        aggregation.outcomes.push(TickerOutcome { ticker, status });
    }

    aggregation
}

/// Best `n` entries by cumulative return. Ties keep their input order.
pub fn top_n(table: &[FinalReturn], n: usize, order: Order) -> Result<Vec<FinalReturn>, KumoError> {
    if n == 0 {
        return Err(KumoError::invalid_parameter("n", "n must be at least 1"));
    }

    let mut ranked = table.to_vec();
    match order {
        Order::Descending => ranked.sort_by(|a, b| b.cum_return.total_cmp(&a.cum_return)),
        Order::Ascending => ranked.sort_by(|a, b| a.cum_return.total_cmp(&b.cum_return)),
    }
    ranked.truncate(n);
    Ok(ranked)
}

/// Loads a ticker with a `cum_return` column. Stored returns are reused for
/// an unbounded range; a bounded range recompounds from its first row.
pub fn load_with_returns(
    port: &dyn DataPort,
    ticker: &str,
    range: &DateRange,
) -> Result<PriceSeries, KumoError> {
    let series = port.load_series(ticker)?;
    if range.is_unbounded() {
        if series.has_column(CUM_RETURN) {
            return Ok(series);
        }
        return add_cumulative_return(series);
    }
    add_daily_return(series.within(range)).and_then(add_cumulative_return)
}

#[derive(Debug)]
pub struct SectorScreen {
    pub aggregation: SectorAggregation,
    pub top: Vec<FinalReturn>,
}

/// Ranks `tickers` by final cumulative return and keeps the first `n`.
pub fn screen_sector(
    port: &dyn DataPort,
    tickers: &[String],
    n: usize,
    range: &DateRange,
    order: Order,
) -> Result<SectorScreen, KumoError> {
    if n == 0 {
        return Err(KumoError::invalid_parameter("n", "n must be at least 1"));
    }

    let aggregation = aggregate_final_returns(
        tickers
            .iter()
            .map(|t| (t.clone(), load_with_returns(port, t, range))),
    );
    let top = top_n(&aggregation.returns, n, order)?;

    tracing::debug!(
        tickers = tickers.len(),
        included = aggregation.returns.len(),
        "sector screen complete"
    );

    Ok(SectorScreen { aggregation, top })
}
