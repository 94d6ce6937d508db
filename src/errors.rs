use serde::Serialize;
use thiserror::Error;

/// Hard failures raised before the worksheet is touched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReflowError {
    #[error("invalid template configuration: {0}")]
    Configuration(String),
    #[error("invalid percent bounds: min {min} max {max} (expected -100 <= min <= max <= 100)")]
    InvalidPercentBounds { min: f64, max: f64 },
    #[error("item count must not be negative (got {0})")]
    NegativeCount(i64),
}

impl ReflowError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "INVALID_TEMPLATE",
            Self::InvalidPercentBounds { .. } => "INVALID_PERCENT_BOUNDS",
            Self::NegativeCount(_) => "NEGATIVE_COUNT",
        }
    }
}

/// Structural assumption that did not hold; the run continued on a fallback path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReflowWarning {
    pub code: String,
    pub message: String,
}

impl ReflowWarning {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

pub const WARN_LABEL_NOT_FOUND: &str = "WARN_LABEL_NOT_FOUND";
pub const WARN_MERGE_ADDRESS: &str = "WARN_MERGE_ADDRESS";
pub const WARN_MERGE_OVERLAP: &str = "WARN_MERGE_OVERLAP";
pub const WARN_TOTAL_FORMULA: &str = "WARN_TOTAL_FORMULA";
pub const WARN_FIELD_ADDRESS: &str = "WARN_FIELD_ADDRESS";
