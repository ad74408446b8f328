//! Error types for extractor configuration

use thiserror::Error;

/// Errors raised while building an [`OtpExtractor`](crate::OtpExtractor).
///
/// Extraction itself never fails; only an invalid configuration does.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// No context keywords were configured
    #[error("At least one context keyword is required")]
    NoKeywords,

    /// A keyword was empty or contained non-ASCII characters
    #[error("Invalid context keyword: {0:?}")]
    InvalidKeyword(String),

    /// Digit length bounds are unusable
    #[error("Invalid digit length bounds: min {min}, max {max}")]
    InvalidDigitBounds { min: usize, max: usize },

    /// The digit-run pattern failed to compile
    #[error("Failed to compile digit pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Result type alias for extractor configuration
pub type ExtractorResult<T> = Result<T, ExtractorError>;
