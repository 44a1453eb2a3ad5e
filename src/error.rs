use thiserror::Error;

/// Errors raised while loading matches, rating them, or building features.
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("Malformed input row {row}: {reason}")]
    MalformedInputRow { row: usize, reason: String },

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Invalid match #{index} ({home_team} vs {away_team}): {reason}")]
    InvalidMatch {
        index: usize,
        home_team: String,
        away_team: String,
        reason: String,
    },

    #[error("Unknown aggregation key: {0}")]
    UnknownAggregationKey(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Length mismatch: {what} has {found} entries, expected {expected}")]
    LengthMismatch {
        what: String,
        expected: usize,
        found: usize,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FeatureError>;
