use leptos::*;
use validator::ValidateEmail;

pub const OTP_LENGTH: usize = 6;
pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Clone, Copy, Default)]
pub struct MessageState {
    pub error: RwSignal<Option<String>>,
    pub success: RwSignal<Option<String>>,
}

impl MessageState {
    pub fn set_error(&self, msg: String) {
        self.error.set(Some(msg));
        self.success.set(None);
    }

    pub fn set_success(&self, msg: String) {
        self.success.set(Some(msg));
        self.error.set(None);
    }

    pub fn clear(&self) {
        self.error.set(None);
        self.success.set(None);
    }
}

pub fn validate_email(raw: &str) -> Result<String, String> {
    let email = raw.trim().to_string();
    if email.is_empty() {
        return Err("Email is required".into());
    }
    if !email.validate_email() {
        return Err("Please enter a valid email address".into());
    }
    Ok(email)
}

pub fn validate_otp_code(raw: &str) -> Result<String, String> {
    let code = raw.trim();
    if code.chars().count() != OTP_LENGTH || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("Please enter the complete {}-digit code", OTP_LENGTH));
    }
    Ok(code.to_string())
}

/// Composition rules for a new password, checked in order; the first
/// violated rule is reported.
pub fn validate_new_password(password: &str, confirmation: &str) -> Result<String, String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ));
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return Err("Password must contain at least one lowercase letter".into());
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err("Password must contain at least one uppercase letter".into());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one number".into());
    }
    if password != confirmation {
        return Err("Passwords do not match".into());
    }
    Ok(password.to_string())
}
