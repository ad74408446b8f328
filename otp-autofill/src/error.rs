use otp_event_manager::StartError;
use otp_state::ListenerError;
use sms_retriever::ConfigError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SdkError {
    #[error("Failed to start OTP listener: {0}")]
    Start(#[from] StartError),

    #[error("Invalid retriever configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Could not generate app hash")]
    HashUnavailable,

    #[error("Phone number hint is not supported in this version")]
    PhoneHintNotSupported,
}

impl SdkError {
    /// Error code reported to the application bridge
    pub fn code(&self) -> &'static str {
        match self {
            SdkError::Start(_) | SdkError::Config(_) => "SMS_RETRIEVER_ERROR",
            SdkError::HashUnavailable => "HASH_ERROR",
            SdkError::PhoneHintNotSupported => "PHONE_HINT_NOT_SUPPORTED",
        }
    }
}

impl From<ListenerError> for SdkError {
    fn from(err: ListenerError) -> Self {
        match err {
            ListenerError::Start(e) => SdkError::Start(e),
            ListenerError::NoAppHash => SdkError::HashUnavailable,
        }
    }
}
