//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use courier_core::error::AppError;
use courier_entity::session::DeviceInfo;

/// Runs `validator` rules and maps failures to a validation error.
pub fn validate_request<T: Validate>(request: &T) -> Result<(), AppError> {
    request
        .validate()
        .map_err(|e| AppError::validation(format!("Invalid request: {e}")))
}

/// Passcode request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendOtpRequest {
    /// Phone number in E.164 form.
    #[validate(length(min = 1, max = 16, message = "Phone number is required"))]
    pub phone_number: String,
}

/// Passcode verification body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    /// Phone number in E.164 form.
    #[validate(length(min = 1, max = 16, message = "Phone number is required"))]
    pub phone_number: String,
    /// The passcode received by the user.
    #[validate(length(min = 1, max = 12, message = "Code is required"))]
    pub code: String,
    /// Device name, e.g. "Pixel 8".
    #[validate(length(max = 255))]
    pub device_name: Option<String>,
    /// Device type, e.g. "ios" or "android".
    #[validate(length(max = 50))]
    pub device_type: Option<String>,
    /// Push notification token.
    #[validate(length(max = 1024))]
    pub push_token: Option<String>,
}

impl VerifyOtpRequest {
    /// Device metadata for the new session; blanks fall back to defaults
    /// in the login service.
    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            device_name: self.device_name.clone().unwrap_or_default(),
            device_type: self.device_type.clone().unwrap_or_default(),
            push_token: self.push_token.clone(),
        }
    }
}

/// Access token check body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRequest {
    /// Access token to check.
    pub access_token: String,
}

/// Token refresh request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RefreshRequest {
    /// Refresh token.
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Single-session revocation body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RevokeRequest {
    /// Refresh token of the session to revoke.
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_code_rejected() {
        let req = VerifyOtpRequest {
            phone_number: "+15551234567".into(),
            code: String::new(),
            device_name: None,
            device_type: None,
            push_token: None,
        };
        let err = validate_request(&req).unwrap_err();
        assert_eq!(err.kind, courier_core::error::ErrorKind::Validation);
    }

    #[test]
    fn test_device_info_passthrough() {
        let req = VerifyOtpRequest {
            phone_number: "+15551234567".into(),
            code: "123456".into(),
            device_name: Some("Pixel".into()),
            device_type: None,
            push_token: Some("push".into()),
        };
        let device = req.device_info();
        assert_eq!(device.device_name, "Pixel");
        assert_eq!(device.device_type, "");
        assert_eq!(device.push_token.as_deref(), Some("push"));
    }
}
