//! Passcode login flow.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use courier_core::error::AppError;
use courier_entity::session::DeviceInfo;
use courier_entity::user::User;

use crate::jwt::TokenPair;
use crate::session::SessionManager;

use super::directory::UserDirectory;
use super::verifier::OtpVerifier;

/// Result of a successful passcode login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResult {
    /// The authenticated user.
    pub user: User,
    /// Generated token pair.
    pub tokens: TokenPair,
}

/// Checks that `phone_number` is in E.164 form: `+` then 8 to 15 digits.
pub fn validate_phone_number(phone_number: &str) -> Result<(), AppError> {
    let digits = phone_number
        .strip_prefix('+')
        .ok_or_else(|| AppError::validation("Phone number must start with '+'"))?;
    if !(8..=15).contains(&digits.len()) || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::validation(
            "Phone number must contain 8 to 15 digits after '+'",
        ));
    }
    Ok(())
}

/// Sends passcodes and exchanges verified ones for a token pair.
#[derive(Clone)]
pub struct OtpLoginService {
    verifier: Arc<dyn OtpVerifier>,
    users: Arc<dyn UserDirectory>,
    sessions: SessionManager,
}

impl std::fmt::Debug for OtpLoginService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpLoginService")
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}

impl OtpLoginService {
    /// Creates a new login service.
    pub fn new(
        verifier: Arc<dyn OtpVerifier>,
        users: Arc<dyn UserDirectory>,
        sessions: SessionManager,
    ) -> Self {
        Self {
            verifier,
            users,
            sessions,
        }
    }

    /// Starts passcode verification for a phone number.
    pub async fn send_otp(&self, phone_number: &str) -> Result<String, AppError> {
        validate_phone_number(phone_number)?;
        let status = self.verifier.send(phone_number).await?;
        info!(status = %status, "Passcode requested");
        Ok(status)
    }

    /// Verifies a passcode, resolving or creating the user and opening a
    /// device session.
    pub async fn verify_otp(
        &self,
        phone_number: &str,
        code: &str,
        device: DeviceInfo,
    ) -> Result<LoginResult, AppError> {
        validate_phone_number(phone_number)?;

        if !self.verifier.check(phone_number, code).await? {
            warn!("Passcode verification failed");
            return Err(AppError::unauthorized("Invalid verification code"));
        }

        let user = self.users.find_or_create_by_phone(phone_number).await?;
        let tokens = self.sessions.login(user.id, normalize_device(device)).await?;

        info!(user_id = %user.id, "Passcode login succeeded");
        Ok(LoginResult { user, tokens })
    }
}

fn normalize_device(mut device: DeviceInfo) -> DeviceInfo {
    let defaults = DeviceInfo::default();
    if device.device_name.trim().is_empty() {
        device.device_name = defaults.device_name;
    }
    if device.device_type.trim().is_empty() {
        device.device_type = defaults.device_type;
    }
    device.push_token = device.push_token.filter(|t| !t.is_empty());
    device
}

#[cfg(test)]
mod tests {
    use courier_core::config::AuthConfig;
    use courier_core::error::ErrorKind;

    use super::*;
    use crate::otp::{DevOtpVerifier, MemoryUserDirectory};
    use crate::session::MemoryDeviceSessionStore;

    fn service() -> (OtpLoginService, Arc<MemoryDeviceSessionStore>) {
        let store = Arc::new(MemoryDeviceSessionStore::new());
        let config = AuthConfig::with_secret("0123456789abcdef0123456789abcdef");
        let sessions = SessionManager::from_config(&config, store.clone()).unwrap();
        let service = OtpLoginService::new(
            Arc::new(DevOtpVerifier::new("123456")),
            Arc::new(MemoryUserDirectory::new()),
            sessions,
        );
        (service, store)
    }

    #[test]
    fn test_phone_number_format() {
        assert!(validate_phone_number("+15550001111").is_ok());
        assert!(validate_phone_number("15550001111").is_err());
        assert!(validate_phone_number("+1555").is_err());
        assert!(validate_phone_number("+1555000111122223").is_err());
        assert!(validate_phone_number("+1555-000-1111").is_err());
    }

    #[tokio::test]
    async fn test_wrong_code_is_unauthorized() {
        let (service, _) = service();
        let err = service
            .verify_otp("+15550001111", "000000", DeviceInfo::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }

    #[tokio::test]
    async fn test_bad_phone_is_validation_error() {
        let (service, _) = service();
        let err = service.send_otp("not-a-phone").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_verify_opens_session_with_defaults() {
        let (service, store) = service();
        let device = DeviceInfo {
            device_name: "  ".to_string(),
            device_type: String::new(),
            push_token: Some(String::new()),
        };
        let result = service.verify_otp("+15550001111", "123456", device).await.unwrap();

        let sessions = store.list_for_user(result.user.id).await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].device_name, "unknown");
        assert_eq!(sessions[0].device_type, "mobile");
        assert!(sessions[0].push_token.is_none());
    }

    #[tokio::test]
    async fn test_repeat_login_reuses_user() {
        let (service, store) = service();
        let first = service.verify_otp("+15550001111", "123456", DeviceInfo::default()).await.unwrap();
        let second = service.verify_otp("+15550001111", "123456", DeviceInfo::default()).await.unwrap();

        assert_eq!(first.user.id, second.user.id);
        assert_eq!(store.list_for_user(first.user.id).await.len(), 2);
    }
}
