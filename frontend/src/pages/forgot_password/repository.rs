use crate::api::{
    verification::MISSING_TOKEN_MESSAGE, ApiClient, ApiError, MessageResponse, VerifyOtpResponse,
};
use crate::utils::{
    redact::mask_email,
    storage::{KeyValueStore, RESET_TOKEN_KEY},
};
use async_trait::async_trait;
use std::rc::Rc;

/// Remote operations behind the password-reset wizard.
#[async_trait(?Send)]
pub trait VerificationApi {
    async fn request_code(&self, email: &str) -> Result<MessageResponse, ApiError>;

    /// On success the returned token has also been written to the durable
    /// `"token"` slot.
    async fn verify_code(&self, email: &str, code: &str) -> Result<String, ApiError>;

    async fn reset_password(
        &self,
        new_password: &str,
        reset_token: &str,
    ) -> Result<MessageResponse, ApiError>;

    /// Drops the durable reset token, if any.
    fn discard_reset_token(&self);
}

#[derive(Clone)]
pub struct ForgotPasswordRepository {
    client: Rc<ApiClient>,
    storage: Rc<dyn KeyValueStore>,
}

impl ForgotPasswordRepository {
    pub fn new_with_client(client: Rc<ApiClient>, storage: Rc<dyn KeyValueStore>) -> Self {
        Self { client, storage }
    }

    fn persist_token(&self, token: &str) -> Result<(), ApiError> {
        self.storage.set(RESET_TOKEN_KEY, token).map_err(|e| {
            log::error!("failed to persist reset token: {}", e);
            ApiError::unknown(format!("Failed to store reset token: {}", e))
        })
    }
}

#[async_trait(?Send)]
impl VerificationApi for ForgotPasswordRepository {
    async fn request_code(&self, email: &str) -> Result<MessageResponse, ApiError> {
        log::info!("requesting verification code for {}", mask_email(email));
        self.client.send_otp(email).await
    }

    async fn verify_code(&self, email: &str, code: &str) -> Result<String, ApiError> {
        log::info!("verifying code for {}", mask_email(email));
        let response: VerifyOtpResponse = self.client.verify_otp(email, code).await?;
        let Some(token) = response.bearer_token().map(str::to_string) else {
            log::warn!("verifyOTP succeeded without a token");
            return Err(ApiError::missing_token(MISSING_TOKEN_MESSAGE));
        };
        self.persist_token(&token)?;
        Ok(token)
    }

    async fn reset_password(
        &self,
        new_password: &str,
        reset_token: &str,
    ) -> Result<MessageResponse, ApiError> {
        log::info!("submitting new password");
        self.client.forgot_password(new_password, reset_token).await
    }

    fn discard_reset_token(&self) {
        if let Err(e) = self.storage.remove(RESET_TOKEN_KEY) {
            log::warn!("failed to clear reset token: {}", e);
        }
    }
}
