/// Raised when an evaluation cannot proceed because of a misconfigured
/// deployment. Missing or malformed data never produces one of these.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("no threshold registered for metric '{metric}'")]
    UnknownMetric { metric: String },
    #[error("reporting period ends ({end}) before it starts ({start})")]
    InvalidPeriod {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },
}

/// Problems building or loading a threshold table.
#[derive(Debug, thiserror::Error)]
pub enum ThresholdError {
    #[error("threshold for '{metric}' must satisfy critical_low <= low <= high <= critical_high ({detail})")]
    InvalidRange { metric: String, detail: String },
    #[error("threshold for '{metric}' is declared more than once")]
    DuplicateMetric { metric: String },
    #[error("threshold metric key must not be blank")]
    BlankMetric,
    #[error("unsupported threshold table format '{0}' (expected .csv or .json)")]
    UnsupportedFormat(String),
    #[error("failed to read threshold table: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid threshold CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid threshold JSON: {0}")]
    Json(#[from] serde_json::Error),
}
