//! Domain error types.

/// Top-level error type for kumoscreen.
#[derive(Debug, thiserror::Error)]
pub enum KumoError {
    #[error("data store error: {reason}")]
    Store { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("missing column {column}")]
    MissingColumn { column: String },

    #[error("no data for {ticker}")]
    NoData { ticker: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl KumoError {
    pub fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        KumoError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&KumoError> for std::process::ExitCode {
    fn from(err: &KumoError) -> Self {
        let code: u8 = match err {
            KumoError::Io(_) => 1,
            KumoError::ConfigParse { .. }
            | KumoError::ConfigMissing { .. }
            | KumoError::ConfigInvalid { .. } => 2,
            KumoError::Store { .. } => 3,
            KumoError::InvalidParameter { .. } | KumoError::MissingColumn { .. } => 4,
            KumoError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_parameter_message() {
        let err = KumoError::invalid_parameter("window", "must be positive");
        assert_eq!(err.to_string(), "invalid parameter window: must be positive");
    }

    #[test]
    fn missing_column_message() {
        let err = KumoError::MissingColumn {
            column: "span_A".into(),
        };
        assert_eq!(err.to_string(), "missing column span_A");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: KumoError = io.into();
        assert!(matches!(err, KumoError::Io(_)));
    }
}
