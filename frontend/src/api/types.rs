use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendOtpRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    pub new_password: String,
    pub reset_token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<Value>,
}

impl MessageResponse {
    pub fn message_text(&self) -> Option<String> {
        self.message.as_ref().and_then(super::client::describe_message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerifyOtpResponse {
    #[serde(default)]
    pub token: Option<Value>,
    #[serde(default)]
    pub message: Option<Value>,
}

impl VerifyOtpResponse {
    /// The bearer token, if the server sent a non-empty string. Any other
    /// shape counts as no token.
    pub fn bearer_token(&self) -> Option<&str> {
        self.token
            .as_ref()
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{error}")]
pub struct ApiError {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl From<ApiError> for String {
    fn from(error: ApiError) -> Self {
        error.error
    }
}

impl ApiError {
    pub const REQUEST_FAILED: &'static str = "REQUEST_FAILED";
    pub const SERVER_ERROR: &'static str = "SERVER_ERROR";
    pub const MISSING_TOKEN: &'static str = "MISSING_TOKEN";
    pub const UNKNOWN: &'static str = "UNKNOWN";

    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::with_code(msg, Self::UNKNOWN)
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::with_code(msg, Self::REQUEST_FAILED)
    }

    pub fn server(msg: impl Into<String>, details: Option<Value>) -> Self {
        Self {
            details,
            ..Self::with_code(msg, Self::SERVER_ERROR)
        }
    }

    pub fn missing_token(msg: impl Into<String>) -> Self {
        Self::with_code(msg, Self::MISSING_TOKEN)
    }

    pub fn is_transport(&self) -> bool {
        self.code == Self::REQUEST_FAILED
    }

    fn with_code(msg: impl Into<String>, code: &str) -> Self {
        Self {
            error: msg.into(),
            code: code.to_string(),
            details: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn api_error_helpers_set_expected_codes() {
        let unknown = ApiError::unknown("something failed");
        assert_eq!(unknown.code, "UNKNOWN");
        assert_eq!(unknown.error, "something failed");
        assert!(unknown.details.is_none());

        assert_eq!(ApiError::missing_token("none").code, "MISSING_TOKEN");

        let request_failed = ApiError::request_failed("network error");
        assert_eq!(request_failed.code, "REQUEST_FAILED");
        assert!(request_failed.is_transport());
        assert!(!ApiError::server("nope", None).is_transport());
    }

    #[test]
    fn api_error_display_and_string_conversion_match_error_text() {
        let error = ApiError::unknown("boom");
        assert_eq!(format!("{}", error), "boom");

        let raw: String = ApiError::missing_token("bad input").into();
        assert_eq!(raw, "bad input");
    }

    #[test]
    fn verify_response_ignores_blank_tokens() {
        let blank: VerifyOtpResponse = serde_json::from_value(json!({ "token": "  " })).unwrap();
        assert_eq!(blank.bearer_token(), None);

        let missing: VerifyOtpResponse =
            serde_json::from_value(json!({ "message": "verified" })).unwrap();
        assert_eq!(missing.bearer_token(), None);

        let present: VerifyOtpResponse = serde_json::from_value(json!({ "token": "abc" })).unwrap();
        assert_eq!(present.bearer_token(), Some("abc"));
    }

    #[test]
    fn verify_response_treats_non_string_tokens_as_missing() {
        for token in [json!(123), json!(null), json!(true), json!({ "value": "abc" }), json!(["abc"])] {
            let response: VerifyOtpResponse =
                serde_json::from_value(json!({ "token": token })).unwrap();
            assert_eq!(response.bearer_token(), None, "{token}");
        }
    }

    #[test]
    fn forgot_password_request_uses_wire_field_names() {
        let body = serde_json::to_value(ForgotPasswordRequest {
            new_password: "Passw0rd".into(),
            reset_token: "abc".into(),
        })
        .unwrap();
        assert_eq!(body, json!({ "new_password": "Passw0rd", "reset_token": "abc" }));
    }
}
