use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{
    client::ApiClient,
    types::{
        ApiError, ForgotPasswordRequest, MessageResponse, SendOtpRequest, VerifyOtpRequest,
        VerifyOtpResponse,
    },
};

pub const SEND_OTP_PATH: &str = "sendOTP";
pub const VERIFY_OTP_PATH: &str = "verifyOTP";
pub const FORGOT_PASSWORD_PATH: &str = "forgotPassword";

pub const SEND_OTP_FALLBACK: &str = "Failed to send verification code";
pub const VERIFY_OTP_FALLBACK: &str = "Failed to verify code";
pub const FORGOT_PASSWORD_FALLBACK: &str = "Failed to reset password";
pub const MISSING_TOKEN_MESSAGE: &str = "No token received from server";

impl ApiClient {
    pub async fn send_otp(&self, email: &str) -> Result<MessageResponse, ApiError> {
        let body = SendOtpRequest {
            email: email.to_string(),
        };
        let value = self
            .post_json(SEND_OTP_PATH, &body, SEND_OTP_FALLBACK)
            .await?;
        decode_or_default(value)
    }

    /// Verifies `code` for `email` and returns the decoded body as sent. The
    /// caller decides what a 2xx answer without a usable token means.
    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<VerifyOtpResponse, ApiError> {
        let body = VerifyOtpRequest {
            email: email.to_string(),
            otp_code: code.to_string(),
        };
        let value = self
            .post_json(VERIFY_OTP_PATH, &body, VERIFY_OTP_FALLBACK)
            .await?;
        decode_or_default(value)
    }

    pub async fn forgot_password(
        &self,
        new_password: &str,
        reset_token: &str,
    ) -> Result<MessageResponse, ApiError> {
        let body = ForgotPasswordRequest {
            new_password: new_password.to_string(),
            reset_token: reset_token.to_string(),
        };
        let value = self
            .post_json(FORGOT_PASSWORD_PATH, &body, FORGOT_PASSWORD_FALLBACK)
            .await?;
        decode_or_default(value)
    }
}

fn decode_or_default<T>(value: Value) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
{
    match value {
        Value::Null => Ok(T::default()),
        Value::Object(_) => serde_json::from_value(value)
            .map_err(|e| ApiError::unknown(format!("Failed to parse response: {}", e))),
        // Non-object bodies carry nothing we read.
        _ => Ok(T::default()),
    }
}
