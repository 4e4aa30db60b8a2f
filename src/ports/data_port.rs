//! Price series store port.

use crate::domain::error::KumoError;
use crate::domain::series::PriceSeries;

pub trait DataPort {
    /// Loads the full stored series for `ticker`, duplicate dates resolved.
    fn load_series(&self, ticker: &str) -> Result<PriceSeries, KumoError>;

    /// Persists a series, including its derived columns.
    fn save_series(&self, series: &PriceSeries) -> Result<(), KumoError>;

    fn list_tickers(&self) -> Result<Vec<String>, KumoError>;
}
