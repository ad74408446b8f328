//! # otp-parser
//!
//! Finds the one-time passcode inside a free-form SMS body.
//!
//! Extraction is a pure function: the same text always yields the same
//! result, and a message without a code is a normal `None`, not an error.
//!
//! ## Usage
//!
//! ### Default heuristic
//! ```rust
//! let otp = otp_parser::extract("Use 739201 to verify, ref AVAS_HASH_XYZ");
//! assert_eq!(otp.as_deref(), Some("739201"));
//! ```
//!
//! ### Diagnostics
//! ```rust
//! use otp_parser::Provenance;
//!
//! let found = otp_parser::find_otp("Your code is 4410").unwrap();
//! assert_eq!(found.provenance, Provenance::Context { keyword: "code".to_string() });
//! ```
//!
//! ## How it works
//!
//! 1. **Context phase**: for each keyword (`otp`, `code`, `verification`,
//!    `pin`, `password`, `token`, `authenticate`) take its first occurrence and
//!    search 20 chars before to 50 chars after it for a standalone 4-6 digit run.
//! 2. **Fallback phase**: the first standalone 4-6 digit run anywhere in the text.

pub mod error;
pub mod extractor;

pub use error::{ExtractorError, ExtractorResult};
pub use extractor::{
    default_extractor, extract, find_otp, OtpExtractor, OtpExtractorBuilder, OtpMatch, Provenance,
};
