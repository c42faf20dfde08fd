//! Passcode delivery and checking capability.

use async_trait::async_trait;
use tracing::info;

use courier_core::config::OtpConfig;
use courier_core::error::AppError;

/// Sends and checks one-time passcodes for a phone number.
#[async_trait]
pub trait OtpVerifier: Send + Sync + 'static {
    /// Starts a verification and returns the provider's status string.
    async fn send(&self, phone_number: &str) -> Result<String, AppError>;

    /// Returns whether `code` is the current passcode for `phone_number`.
    async fn check(&self, phone_number: &str, code: &str) -> Result<bool, AppError>;
}

/// Development verifier that accepts one fixed code and sends nothing.
#[derive(Debug, Clone)]
pub struct DevOtpVerifier {
    code: String,
}

impl DevOtpVerifier {
    /// Creates a verifier that accepts `code`.
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }

    /// Builds the verifier from configuration.
    ///
    /// Fails when development mode is off, since no provider is wired.
    pub fn from_config(config: &OtpConfig) -> Result<Self, AppError> {
        if !config.dev_mode {
            return Err(AppError::configuration(
                "No passcode provider configured; enable otp.dev_mode",
            ));
        }
        if config.dev_code.is_empty() {
            return Err(AppError::configuration("otp.dev_code must not be empty"));
        }
        Ok(Self::new(config.dev_code.clone()))
    }
}

#[async_trait]
impl OtpVerifier for DevOtpVerifier {
    async fn send(&self, phone_number: &str) -> Result<String, AppError> {
        info!(phone_number = %phone_number, "Passcode send bypassed in development mode");
        Ok("sent".to_string())
    }

    async fn check(&self, _phone_number: &str, code: &str) -> Result<bool, AppError> {
        Ok(code == self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dev_verifier_accepts_only_fixed_code() {
        let verifier = DevOtpVerifier::new("123456");
        assert_eq!(verifier.send("+15550001111").await.unwrap(), "sent");
        assert!(verifier.check("+15550001111", "123456").await.unwrap());
        assert!(!verifier.check("+15550001111", "654321").await.unwrap());
    }

    #[test]
    fn test_from_config_requires_dev_mode() {
        let config = OtpConfig {
            dev_mode: false,
            ..OtpConfig::default()
        };
        assert!(DevOtpVerifier::from_config(&config).is_err());
        assert!(DevOtpVerifier::from_config(&OtpConfig::default()).is_ok());
    }
}
