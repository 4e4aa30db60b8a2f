//! Core domain types and logic.

pub mod ohlcv;
pub mod series;
pub mod indicator;
pub mod sector;
pub mod universe;
pub mod config_validation;
pub mod error;
