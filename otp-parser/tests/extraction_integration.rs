//! Integration tests for the two-phase OTP heuristic

use otp_parser::{extract, find_otp, Provenance};
use proptest::prelude::*;
use rstest::rstest;

#[test]
fn test_context_precedence() {
    let found = find_otp("Your verification code is 482913 today").unwrap();
    assert_eq!(found.code, "482913");
    assert!(found.is_context_matched());
}

#[test]
fn test_fallback_without_keyword() {
    let found = find_otp("482913").unwrap();
    assert_eq!(found.code, "482913");
    assert_eq!(found.provenance, Provenance::Pattern);
}

#[test]
fn test_no_match() {
    assert_eq!(extract("Thanks for your purchase"), None);
    assert_eq!(extract(""), None);
}

#[test]
fn test_end_to_end_message() {
    assert_eq!(
        extract("Use 739201 to verify, ref AVAS_HASH_XYZ").as_deref(),
        Some("739201")
    );
}

#[test]
fn test_first_run_in_window_wins() {
    // Both runs sit inside the "code" window; the earlier one is returned.
    assert_eq!(extract("1111 then code 2222").as_deref(), Some("1111"));
}

#[rstest]
#[case("Your code is 123", None)]
#[case("Your code is 1234", Some("1234"))]
#[case("Your code is 12345", Some("12345"))]
#[case("Your code is 123456", Some("123456"))]
#[case("Your code is 1234567", None)]
#[case("OTP: 12345678", None)]
fn test_digit_length_boundary(#[case] message: &str, #[case] expected: Option<&str>) {
    assert_eq!(extract(message).as_deref(), expected);
}

#[rstest]
#[case("Your OTP is 5521", "5521")]
#[case("PIN: 0042", "0042")]
#[case("(8812) is your login token", "8812")]
#[case("Authenticate with 667788 within 5 minutes", "667788")]
#[case("G-309137 is your Google verification code.", "309137")]
fn test_common_formats(#[case] message: &str, #[case] expected: &str) {
    assert_eq!(extract(message).as_deref(), Some(expected));
}

#[test]
fn test_digits_glued_to_letters_are_not_standalone() {
    assert_eq!(extract("Your code is A12345B"), None);
    assert_eq!(extract("ref AB1234"), None);
}

proptest! {
    #[test]
    fn prop_extraction_is_deterministic(message in ".{0,200}") {
        prop_assert_eq!(extract(&message), extract(&message));
    }

    #[test]
    fn prop_result_is_always_4_to_6_ascii_digits(message in "[a-z0-9 :.]{0,120}") {
        if let Some(code) = extract(&message) {
            prop_assert!((4..=6).contains(&code.len()));
            prop_assert!(code.bytes().all(|b| b.is_ascii_digit()));
            prop_assert!(message.contains(&code));
        }
    }

    #[test]
    fn prop_long_runs_never_returned(run in "[1-9][0-9]{6,10}") {
        let message = format!("Your verification code is {run}");
        prop_assert_eq!(extract(&message), None);
    }
}
