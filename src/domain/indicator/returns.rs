//! Daily and cumulative returns from the close price.
//!
//! daily_return[i] = C[i] / C[i-1] - 1, row 0 missing, and missing when
//! either close is missing
//! cum_return[i] = product of (1 + daily_return[j]) for defined j <= i
//!
//! Missing daily returns stay missing in `cum_return` without resetting the
//! running product, so row 0 is missing and row 1 equals 1 + daily_return[1].

use crate::domain::error::KumoError;
use crate::domain::series::{CUM_RETURN, DAILY_RETURN, PriceSeries};

pub fn daily_returns(closes: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut values = Vec::with_capacity(closes.len());
    for i in 0..closes.len() {
        let value = match (i.checked_sub(1).and_then(|p| closes[p]), closes[i]) {
            (Some(prev), Some(close)) if prev != 0.0 => Some(close / prev - 1.0),
            _ => None,
        };
        values.push(value);
    }
    values
}

pub fn cumulative_returns(daily: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut product = 1.0;
    daily
        .iter()
        .map(|r| {
            r.map(|r| {
                product *= 1.0 + r;
                product
            })
        })
        .collect()
}

pub fn add_daily_return(mut series: PriceSeries) -> Result<PriceSeries, KumoError> {
    let daily = daily_returns(&series.closes());
    series.set_column(DAILY_RETURN, daily)?;
    Ok(series)
}

/// Adds `cum_return`, computing `daily_return` first when it is absent.
pub fn add_cumulative_return(series: PriceSeries) -> Result<PriceSeries, KumoError> {
    let mut series = if series.has_column(DAILY_RETURN) {
        series
    } else {
        add_daily_return(series)?
    };
    let cumulative = cumulative_returns(series.require_column(DAILY_RETURN)?);
    series.set_column(CUM_RETURN, cumulative)?;
    Ok(series)
}
