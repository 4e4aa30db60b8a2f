//! Configuration validation.
//!
//! Validates every config field before any series is loaded, so bad
//! parameters fail fast instead of producing empty indicator columns.

use crate::domain::error::KumoError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), KumoError> {
    validate_stocks_path(config)?;
    validate_bollinger(config)?;
    validate_ichimoku(config)?;
    validate_top(config)?;
    validate_dates(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> KumoError {
    KumoError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_stocks_path(config: &dyn ConfigPort) -> Result<(), KumoError> {
    match config.get_string("data", "stocks_path") {
        Some(_) => Ok(()),
        None => Err(KumoError::ConfigMissing {
            section: "data".to_string(),
            key: "stocks_path".to_string(),
        }),
    }
}

fn validate_positive(config: &dyn ConfigPort, section: &str, key: &str, default: i64) -> Result<(), KumoError> {
    if config.get_int(section, key, default) < 1 {
        return Err(invalid(section, key, &format!("{} must be at least 1", key)));
    }
    Ok(())
}

fn validate_bollinger(config: &dyn ConfigPort) -> Result<(), KumoError> {
    validate_positive(config, "bollinger", "window", 20)?;
    let k = config.get_double("bollinger", "k", 1.96);
    if !k.is_finite() || k < 0.0 {
        return Err(invalid("bollinger", "k", "k must be non-negative"));
    }
    Ok(())
}

fn validate_ichimoku(config: &dyn ConfigPort) -> Result<(), KumoError> {
    validate_positive(config, "ichimoku", "conversion_period", 9)?;
    validate_positive(config, "ichimoku", "base_period", 26)?;
    validate_positive(config, "ichimoku", "span_b_period", 52)?;
    if config.get_int("ichimoku", "displacement", 26) < 0 {
        return Err(invalid(
            "ichimoku",
            "displacement",
            "displacement must be non-negative",
        ));
    }
    Ok(())
}

fn validate_top(config: &dyn ConfigPort) -> Result<(), KumoError> {
    validate_positive(config, "screen", "top", 10)
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), KumoError> {
    let start = parse_optional_date(config, "start_date")?;
    let end = parse_optional_date(config, "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(invalid(
                "screen",
                "start_date",
                "start_date must not be after end_date",
            ));
        }
    }
    Ok(())
}

/// Reads an optional `[screen]` date in `YYYY-MM-DD` form.
pub fn parse_optional_date(config: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDate>, KumoError> {
    match config.get_string("screen", key) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| invalid("screen", key, &format!("invalid {} format, expected YYYY-MM-DD", key))),
    }
}
