//! Technical indicator stages and the rolling-window primitives they share.
//!
//! Every stage takes a `PriceSeries` by value, appends its columns and hands
//! the series back:
//! - `returns`: `daily_return`, `cum_return`
//! - `bollinger`: `middle_band`, `upper_band`, `lower_band`
//! - `ichimoku`: `conversion_line`, `base_line`, `span_A`, `span_B`, `lag_span`
//!
//! Rolling statistics require a full window of non-missing inputs; a window
//! that is short or touches a missing cell produces `None`.

pub mod bollinger;
pub mod ichimoku;
pub mod returns;

use crate::domain::error::KumoError;
use crate::domain::series::PriceSeries;
use bollinger::BollingerParams;
use ichimoku::IchimokuParams;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Indicator {
    Returns,
    Bollinger(BollingerParams),
    Ichimoku(IchimokuParams),
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Indicator::Returns => write!(f, "RETURNS"),
            Indicator::Bollinger(p) => write!(f, "BOLLINGER({},{})", p.window, p.k),
            Indicator::Ichimoku(p) => write!(
                f,
                "ICHIMOKU({},{},{},{})",
                p.conversion, p.base, p.span_b, p.displacement
            ),
        }
    }
}

impl Indicator {
    pub fn apply(&self, series: PriceSeries) -> Result<PriceSeries, KumoError> {
        tracing::debug!(ticker = series.ticker(), indicator = %self, "computing");
        match self {
            Indicator::Returns => {
                returns::add_daily_return(series).and_then(returns::add_cumulative_return)
            }
            Indicator::Bollinger(params) => bollinger::add_bollinger_bands(series, params),
            Indicator::Ichimoku(params) => ichimoku::add_ichimoku(series, params),
        }
    }
}

/// Runs each indicator stage in order over the same series.
pub fn compute_indicators(
    series: PriceSeries,
    indicators: &[Indicator],
) -> Result<PriceSeries, KumoError> {
    indicators
        .iter()
        .try_fold(series, |series, indicator| indicator.apply(series))
}

fn check_window(name: &str, window: usize) -> Result<(), KumoError> {
    if window == 0 {
        return Err(KumoError::invalid_parameter(name, "window must be positive"));
    }
    Ok(())
}

/// Applies `stat` to each full trailing window of `window` defined values.
pub fn rolling<F>(values: &[Option<f64>], window: usize, stat: F) -> Result<Vec<Option<f64>>, KumoError>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    check_window("window", window)?;
    let mut out = Vec::with_capacity(values.len());
    let mut buf = Vec::with_capacity(window);

    for i in 0..values.len() {
        if i + 1 < window {
            out.push(None);
            continue;
        }
        buf.clear();
        buf.extend(values[i + 1 - window..=i].iter().map_while(|v| *v));
        out.push(if buf.len() == window { stat(&buf) } else { None });
    }

    Ok(out)
}

pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Result<Vec<Option<f64>>, KumoError> {
    rolling(values, window, |w| Some(w.iter().sum::<f64>() / w.len() as f64))
}

/// Sample standard deviation (n - 1 denominator); undefined for a window of one.
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Result<Vec<Option<f64>>, KumoError> {
    rolling(values, window, |w| {
        if w.len() < 2 {
            return None;
        }
        let n = w.len() as f64;
        let mean = w.iter().sum::<f64>() / n;
        let variance = w
            .iter()
            .map(|v| {
                let diff = v - mean;
                diff * diff
            })
            .sum::<f64>()
            / (n - 1.0);
        Some(variance.sqrt())
    })
}

pub fn rolling_max(values: &[Option<f64>], window: usize) -> Result<Vec<Option<f64>>, KumoError> {
    rolling(values, window, |w| w.iter().copied().reduce(f64::max))
}

pub fn rolling_min(values: &[Option<f64>], window: usize) -> Result<Vec<Option<f64>>, KumoError> {
    rolling(values, window, |w| w.iter().copied().reduce(f64::min))
}

/// Moves values `periods` rows later (positive) or earlier (negative).
/// Vacated cells become `None`; the length never changes.
pub fn shift(values: &[Option<f64>], periods: isize) -> Vec<Option<f64>> {
    let len = values.len();
    let offset = periods.unsigned_abs();
    (0..len)
        .map(|i| {
            if periods >= 0 {
                i.checked_sub(offset).and_then(|src| values[src])
            } else {
                values.get(i + offset).copied().flatten()
            }
        })
        .collect()
}

/// Element-wise combination; `None` on either side yields `None`.
pub fn zip_with<F>(a: &[Option<f64>], b: &[Option<f64>], f: F) -> Vec<Option<f64>>
where
    F: Fn(f64, f64) -> f64,
{
    a.iter()
        .zip(b)
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some(f(*x, *y)),
            _ => None,
        })
        .collect()
}
