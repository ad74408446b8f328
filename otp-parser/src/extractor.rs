//! Two-phase OTP extraction.
//!
//! The extractor first looks for a digit run close to a context keyword
//! ("otp", "code", ...), then falls back to the first standalone digit run
//! anywhere in the message. Both phases only accept runs whose length is
//! inside the configured bounds (4 to 6 digits by default).

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ExtractorError, ExtractorResult};

/// Context keywords, searched in this order
pub const DEFAULT_KEYWORDS: [&str; 7] = [
    "otp",
    "code",
    "verification",
    "pin",
    "password",
    "token",
    "authenticate",
];

/// Characters searched before a keyword occurrence
pub const DEFAULT_WINDOW_BEFORE: usize = 20;

/// Characters searched from a keyword occurrence onwards
pub const DEFAULT_WINDOW_AFTER: usize = 50;

pub const DEFAULT_MIN_DIGITS: usize = 4;
pub const DEFAULT_MAX_DIGITS: usize = 6;

/// How a code was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    /// Found inside the window around `keyword`
    Context { keyword: String },
    /// Found by the whole-message fallback scan
    Pattern,
}

/// Result of a successful extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpMatch {
    /// The digit string
    pub code: String,
    /// Which phase produced the code
    pub provenance: Provenance,
}

impl OtpMatch {
    /// Whether the code came from the keyword phase
    pub fn is_context_matched(&self) -> bool {
        matches!(self.provenance, Provenance::Context { .. })
    }
}

/// Configurable OTP extractor
///
/// The default configuration is what [`extract`](crate::extract) uses.
///
/// # Example
///
/// ```rust
/// use otp_parser::OtpExtractor;
///
/// let extractor = OtpExtractor::builder()
///     .keywords(["passcode", "otp"])
///     .digits(6, 8)
///     .build()?;
///
/// assert_eq!(
///     extractor.extract("Your passcode: 12345678").as_deref(),
///     Some("12345678")
/// );
/// # Ok::<(), otp_parser::ExtractorError>(())
/// ```
#[derive(Debug, Clone)]
pub struct OtpExtractor {
    keywords: Vec<String>,
    window_before: usize,
    window_after: usize,
    min_digits: usize,
    max_digits: usize,
    digit_run: Regex,
}

impl OtpExtractor {
    /// Start building an extractor from the default settings
    pub fn builder() -> OtpExtractorBuilder {
        OtpExtractorBuilder::default()
    }

    /// Context keywords in search order (lower-case)
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Window size as (chars before, chars after) the keyword start
    pub fn window(&self) -> (usize, usize) {
        (self.window_before, self.window_after)
    }

    /// Accepted digit run length as (min, max)
    pub fn digit_bounds(&self) -> (usize, usize) {
        (self.min_digits, self.max_digits)
    }

    /// Extract the most likely OTP from `message`
    ///
    /// Returns `None` when the message contains no acceptable digit run.
    pub fn extract(&self, message: &str) -> Option<String> {
        self.find_otp(message).map(|m| m.code)
    }

    /// Extract the most likely OTP together with how it was found
    pub fn find_otp(&self, message: &str) -> Option<OtpMatch> {
        self.find_with_context(message).or_else(|| {
            self.first_digit_run(message).map(|code| OtpMatch {
                code: code.to_string(),
                provenance: Provenance::Pattern,
            })
        })
    }

    /// Keyword phase: first digit run inside the window of the first keyword that has one
    fn find_with_context(&self, message: &str) -> Option<OtpMatch> {
        // ASCII folding keeps byte offsets identical to `message`.
        let lowered = message.to_ascii_lowercase();

        self.keywords.iter().find_map(|keyword| {
            let keyword_start = lowered.find(keyword.as_str())?;
            let window = self.context_window(message, keyword_start);
            self.first_digit_run(window).map(|code| OtpMatch {
                code: code.to_string(),
                provenance: Provenance::Context {
                    keyword: keyword.clone(),
                },
            })
        })
    }

    /// Slice of `message` spanning the configured number of chars around a keyword
    fn context_window<'a>(&self, message: &'a str, keyword_byte: usize) -> &'a str {
        let keyword_char = message[..keyword_byte].chars().count();
        let start = byte_offset(message, keyword_char.saturating_sub(self.window_before));
        let end = byte_offset(message, keyword_char + self.window_after);
        &message[start..end]
    }

    fn first_digit_run<'a>(&self, haystack: &'a str) -> Option<&'a str> {
        self.digit_run.find(haystack).map(|m| m.as_str())
    }
}

impl Default for OtpExtractor {
    fn default() -> Self {
        OtpExtractorBuilder::default()
            .build()
            .expect("default extractor settings are valid")
    }
}

/// Byte offset of the `n`th char, clamped to the end of `s`
fn byte_offset(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

/// Builder for [`OtpExtractor`]
#[derive(Debug, Clone)]
pub struct OtpExtractorBuilder {
    keywords: Vec<String>,
    window_before: usize,
    window_after: usize,
    min_digits: usize,
    max_digits: usize,
}

impl Default for OtpExtractorBuilder {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            window_before: DEFAULT_WINDOW_BEFORE,
            window_after: DEFAULT_WINDOW_AFTER,
            min_digits: DEFAULT_MIN_DIGITS,
            max_digits: DEFAULT_MAX_DIGITS,
        }
    }
}

impl OtpExtractorBuilder {
    /// Replace the context keywords; order is search priority
    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn window(mut self, before: usize, after: usize) -> Self {
        self.window_before = before;
        self.window_after = after;
        self
    }

    pub fn digits(mut self, min: usize, max: usize) -> Self {
        self.min_digits = min;
        self.max_digits = max;
        self
    }

    /// Validate the settings and compile the digit pattern
    pub fn build(self) -> ExtractorResult<OtpExtractor> {
        if self.keywords.is_empty() {
            return Err(ExtractorError::NoKeywords);
        }

        let mut keywords = Vec::with_capacity(self.keywords.len());
        for keyword in self.keywords {
            if keyword.is_empty() || !keyword.is_ascii() {
                return Err(ExtractorError::InvalidKeyword(keyword));
            }
            keywords.push(keyword.to_ascii_lowercase());
        }

        if self.min_digits == 0 || self.min_digits > self.max_digits {
            return Err(ExtractorError::InvalidDigitBounds {
                min: self.min_digits,
                max: self.max_digits,
            });
        }

        let digit_run = Regex::new(&format!(
            r"\b[0-9]{{{},{}}}\b",
            self.min_digits, self.max_digits
        ))?;

        Ok(OtpExtractor {
            keywords,
            window_before: self.window_before,
            window_after: self.window_after,
            min_digits: self.min_digits,
            max_digits: self.max_digits,
            digit_run,
        })
    }
}

/// Shared extractor with the default settings
pub fn default_extractor() -> &'static OtpExtractor {
    static DEFAULT: OnceLock<OtpExtractor> = OnceLock::new();
    DEFAULT.get_or_init(OtpExtractor::default)
}

/// Extract the most likely OTP from an SMS body using the default settings
///
/// ```rust
/// assert_eq!(
///     otp_parser::extract("Your verification code is 482913 today").as_deref(),
///     Some("482913")
/// );
/// assert_eq!(otp_parser::extract("Thanks for your purchase"), None);
/// ```
pub fn extract(message: &str) -> Option<String> {
    default_extractor().extract(message)
}

/// Like [`extract`], but reports which phase matched
pub fn find_otp(message: &str) -> Option<OtpMatch> {
    default_extractor().find_otp(message)
}
