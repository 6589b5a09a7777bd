// Error types for the analysis core.
//
// Only malformed input is an error. A chord sequence that no candidate
// tonality can explain is a normal negative `AnalysisResult`, never an
// `AnalysisError`. Both input errors abort `analyze()` before any step is
// recorded, so callers never see a partial derivation.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// A chord symbol whose root or quality token is not recognised.
    #[error("invalid chord symbol '{symbol}': {reason}")]
    InvalidChordSymbol { symbol: String, reason: String },

    /// A tonality name that is not "<note> Major" or "<note> Minor".
    #[error("invalid tonality name '{0}'")]
    InvalidTonalityName(String),

    /// The progression contained no chords.
    #[error("chord progression is empty")]
    EmptyProgression,

    /// A locale code with no catalog ("en" and "pt_br" are supported).
    #[error("unsupported locale '{0}'")]
    UnsupportedLocale(String),

    /// Analyzer configuration failed validation.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalysisError {
    pub(crate) fn chord(symbol: &str, reason: impl Into<String>) -> Self {
        AnalysisError::InvalidChordSymbol {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }
}
