//! App signature hash used to address retriever SMS to this application.
//!
//! The sender appends the 11-character hash to the message; the broker only
//! delivers messages whose hash matches the receiving app.

use base64::Engine;
use sha2::{Digest, Sha256};

use crate::error::SignatureError;

/// Digest bytes kept before encoding
const HASH_BYTES: usize = 9;

/// Length of the final hash string
pub const APP_HASH_LEN: usize = 11;

/// Source of the package identity and signing certificates.
///
/// Implementations hide how the platform exposes certificates (including
/// any version-specific lookup).
pub trait SignatureProvider: Send + Sync {
    /// Application package identifier
    fn package_name(&self) -> &str;

    /// Signing certificates as their character encoding, one per signer
    fn signing_certificates(&self) -> Result<Vec<String>, SignatureError>;
}

/// Compute the app hash for one certificate
///
/// SHA-256 over `"{package_name} {certificate}"`, truncated to 9 bytes,
/// base64 encoded with the URL-safe alphabet and cut to 11 characters.
pub fn app_hash(package_name: &str, certificate: &str) -> String {
    let digest = Sha256::digest(format!("{package_name} {certificate}").as_bytes());
    let encoded = base64::engine::general_purpose::URL_SAFE.encode(&digest[..HASH_BYTES]);
    encoded[..APP_HASH_LEN].to_string()
}

/// One hash per signing certificate
///
/// A provider failure is logged and yields an empty list; callers decide
/// whether having no hash is an error.
pub fn compute_app_hashes(provider: &dyn SignatureProvider) -> Vec<String> {
    let package_name = provider.package_name();
    match provider.signing_certificates() {
        Ok(certificates) => certificates
            .iter()
            .map(|certificate| app_hash(package_name, certificate))
            .collect(),
        Err(e) => {
            tracing::error!("Error getting app signatures for {}: {}", package_name, e);
            Vec::new()
        }
    }
}

/// Fixed package name and certificate list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticSignatures {
    package_name: String,
    certificates: Vec<String>,
}

impl StaticSignatures {
    pub fn new<I, S>(package_name: impl Into<String>, certificates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            package_name: package_name.into(),
            certificates: certificates.into_iter().map(Into::into).collect(),
        }
    }
}

impl SignatureProvider for StaticSignatures {
    fn package_name(&self) -> &str {
        &self.package_name
    }

    fn signing_certificates(&self) -> Result<Vec<String>, SignatureError> {
        Ok(self.certificates.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenProvider;

    impl SignatureProvider for BrokenProvider {
        fn package_name(&self) -> &str {
            "com.example.app"
        }

        fn signing_certificates(&self) -> Result<Vec<String>, SignatureError> {
            Err(SignatureError::Unavailable("NameNotFoundException".to_string()))
        }
    }

    #[test]
    fn test_known_hashes() {
        // '/' in the standard alphabet becomes '_'.
        assert_eq!(app_hash("com.example.app", "3082abcd"), "7OS8_g6GQfB");
        assert_eq!(
            app_hash(
                "avas.modules.otp_autofill.example",
                "308201dd30820146020101"
            ),
            "IchGcSezjgx"
        );
    }

    #[test]
    fn test_hash_shape() {
        let hash = app_hash("com.example.app", "another-certificate");
        assert_eq!(hash.len(), APP_HASH_LEN);
        assert!(hash
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_one_hash_per_certificate() {
        let provider = StaticSignatures::new("com.example.app", ["3082abcd", "3082ef01"]);
        let hashes = compute_app_hashes(&provider);
        assert_eq!(hashes.len(), 2);
        assert_eq!(hashes[0], "7OS8_g6GQfB");
        assert_ne!(hashes[0], hashes[1]);
    }

    #[test]
    fn test_provider_failure_yields_no_hashes() {
        assert!(compute_app_hashes(&BrokenProvider).is_empty());
    }
}
