//! Step controller for the forgot-password wizard.
//!
//! [`ResetFlow`] is a synchronous state machine: every submission is split
//! into a `begin_*` call that validates input and hands out a [`Ticket`], and
//! a `finish_*` call that applies the server's answer. Tickets are bound to
//! the step and generation they were issued for, so a response that arrives
//! after the user navigated away is dropped instead of being applied to a
//! step that is no longer on screen.
//!
//! [`ResetWizard`] pairs a flow with a [`VerificationApi`] for callers that
//! can hold the flow across an await.

use std::fmt;

use super::{
    repository::VerificationApi,
    timer::ResendTimer,
    utils::{validate_email, validate_new_password, validate_otp_code},
};
use crate::api::{ApiError, MessageResponse};

pub const TRANSPORT_NOTICE: &str =
    "Unable to reach the server. Please check your connection and try again.";
pub const MISSING_RESET_TOKEN_NOTICE: &str =
    "Your verification session has expired. Please verify your code again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResetStep {
    Email,
    Otp,
    NewPassword,
    Confirmation,
}

impl ResetStep {
    pub fn label(self) -> &'static str {
        match self {
            ResetStep::Email => "email",
            ResetStep::Otp => "verification code",
            ResetStep::NewPassword => "new password",
            ResetStep::Confirmation => "confirmation",
        }
    }
}

impl fmt::Display for ResetStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Email,
    OtpCode,
    NewPassword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Error,
    Info,
}

/// A dismissible, blocking message shown over the current step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    fn from_api_error(err: &ApiError) -> Self {
        if err.is_transport() {
            Self::error(TRANSPORT_NOTICE)
        } else {
            Self::error(err.error.clone())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("{message}")]
    Invalid { field: Field, message: String },
    #[error("{0}")]
    Blocked(String),
    #[error("a request for this step is already in progress")]
    Busy,
    #[error("a new code can be requested in {0} seconds")]
    ResendLocked(u32),
    #[error("not available on the {0} step")]
    WrongStep(ResetStep),
    #[error("the password reset flow has ended")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowExit {
    /// Reset done; the caller hands over to the login screen.
    Completed,
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Advanced(ResetStep),
    Stayed,
    /// The ticket no longer matches the flow; the response was dropped.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Moved(ResetStep),
    Exited,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    step: ResetStep,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailSubmission {
    pub ticket: Ticket,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSubmission {
    pub ticket: Ticket,
    pub email: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResendSubmission {
    pub ticket: Ticket,
    pub email: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct PasswordSubmission {
    pub ticket: Ticket,
    pub new_password: String,
    pub reset_token: String,
}

impl fmt::Debug for PasswordSubmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordSubmission")
            .field("ticket", &self.ticket)
            .finish_non_exhaustive()
    }
}

/// Data accumulated while moving forward through the wizard.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ResetSession {
    pub email: String,
    pub otp_code: String,
    pub reset_token: Option<String>,
    pub new_password: String,
}

impl fmt::Debug for ResetSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResetSession")
            .field("email", &self.email)
            .field("has_otp_code", &!self.otp_code.is_empty())
            .field("has_reset_token", &self.reset_token.is_some())
            .finish_non_exhaustive()
    }
}

impl ResetSession {
    fn for_email(email: String) -> Self {
        Self {
            email,
            ..Self::default()
        }
    }

    fn forget_verification(&mut self) {
        self.otp_code.clear();
        self.reset_token = None;
        self.new_password.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetFlow {
    step: ResetStep,
    session: ResetSession,
    timer: ResendTimer,
    submitting: bool,
    resending: bool,
    generation: u64,
    field_error: Option<FieldError>,
    notice: Option<Notice>,
    exit: Option<FlowExit>,
}

impl Default for ResetFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl ResetFlow {
    pub fn new() -> Self {
        Self {
            step: ResetStep::Email,
            session: ResetSession::default(),
            timer: ResendTimer::Idle,
            submitting: false,
            resending: false,
            generation: 0,
            field_error: None,
            notice: None,
            exit: None,
        }
    }

    pub fn step(&self) -> ResetStep {
        self.step
    }

    pub fn session(&self) -> &ResetSession {
        &self.session
    }

    pub fn timer(&self) -> ResendTimer {
        self.timer
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn is_resending(&self) -> bool {
        self.resending
    }

    pub fn can_resend(&self) -> bool {
        self.exit.is_none()
            && self.step == ResetStep::Otp
            && !self.resending
            && self.timer.can_resend()
    }

    pub fn field_error(&self) -> Option<&FieldError> {
        self.field_error.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn exit(&self) -> Option<FlowExit> {
        self.exit
    }

    pub fn is_closed(&self) -> bool {
        self.exit.is_some()
    }

    pub fn begin_email(&mut self, raw_email: &str) -> Result<EmailSubmission, FlowError> {
        let ticket = self.open_ticket(ResetStep::Email)?;
        let email = validate_email(raw_email)
            .map_err(|message| self.reject_field(Field::Email, message))?;
        self.submitting = true;
        Ok(EmailSubmission { ticket, email })
    }

    pub fn finish_email(
        &mut self,
        submission: EmailSubmission,
        result: Result<MessageResponse, ApiError>,
    ) -> Applied {
        if !self.accepts(submission.ticket) {
            return Applied::Stale;
        }
        self.submitting = false;
        match result {
            Ok(_) => {
                self.session = ResetSession::for_email(submission.email);
                self.enter(ResetStep::Otp);
                self.timer.restart();
                Applied::Advanced(ResetStep::Otp)
            }
            Err(err) => self.stay_with(&err),
        }
    }

    pub fn begin_verify(&mut self, raw_code: &str) -> Result<CodeSubmission, FlowError> {
        let ticket = self.open_ticket(ResetStep::Otp)?;
        let code = match validate_otp_code(raw_code) {
            Ok(code) => code,
            Err(message) => {
                self.notice = Some(Notice::error(message.clone()));
                return Err(FlowError::Invalid {
                    field: Field::OtpCode,
                    message,
                });
            }
        };
        self.submitting = true;
        Ok(CodeSubmission {
            ticket,
            email: self.session.email.clone(),
            code,
        })
    }

    /// `result` carries the reset token on success.
    pub fn finish_verify(
        &mut self,
        submission: CodeSubmission,
        result: Result<String, ApiError>,
    ) -> Applied {
        if !self.accepts(submission.ticket) {
            return Applied::Stale;
        }
        self.submitting = false;
        match result {
            Ok(token) => {
                self.session.otp_code = submission.code;
                self.session.reset_token = Some(token);
                self.timer.cancel();
                self.enter(ResetStep::NewPassword);
                Applied::Advanced(ResetStep::NewPassword)
            }
            Err(err) => self.stay_with(&err),
        }
    }

    /// Restarts the countdown before the request goes out, so a second press
    /// is rejected until the next expiry whatever the first request returns.
    pub fn begin_resend(&mut self) -> Result<ResendSubmission, FlowError> {
        if self.exit.is_some() {
            return Err(FlowError::Closed);
        }
        if self.step != ResetStep::Otp {
            return Err(FlowError::WrongStep(self.step));
        }
        if self.resending {
            return Err(FlowError::Busy);
        }
        if !self.timer.can_resend() {
            return Err(FlowError::ResendLocked(self.timer.remaining()));
        }
        self.timer.restart();
        self.resending = true;
        self.notice = None;
        Ok(ResendSubmission {
            ticket: self.ticket(),
            email: self.session.email.clone(),
        })
    }

    pub fn finish_resend(
        &mut self,
        submission: ResendSubmission,
        result: Result<MessageResponse, ApiError>,
    ) -> Applied {
        if !self.accepts(submission.ticket) {
            return Applied::Stale;
        }
        self.resending = false;
        match result {
            Ok(_) => {
                self.notice = Some(Notice::info(format!(
                    "A new verification code was sent to {}",
                    submission.email
                )));
                Applied::Stayed
            }
            Err(err) => self.stay_with(&err),
        }
    }

    pub fn begin_reset(
        &mut self,
        new_password: &str,
        confirmation: &str,
    ) -> Result<PasswordSubmission, FlowError> {
        let ticket = self.open_ticket(ResetStep::NewPassword)?;
        let new_password = validate_new_password(new_password, confirmation)
            .map_err(|message| self.reject_field(Field::NewPassword, message))?;
        let Some(reset_token) = self
            .session
            .reset_token
            .clone()
            .filter(|token| !token.is_empty())
        else {
            self.notice = Some(Notice::error(MISSING_RESET_TOKEN_NOTICE));
            return Err(FlowError::Blocked(MISSING_RESET_TOKEN_NOTICE.to_string()));
        };
        self.session.new_password = new_password.clone();
        self.submitting = true;
        Ok(PasswordSubmission {
            ticket,
            new_password,
            reset_token,
        })
    }

    pub fn finish_reset(
        &mut self,
        submission: PasswordSubmission,
        result: Result<MessageResponse, ApiError>,
    ) -> Applied {
        if !self.accepts(submission.ticket) {
            return Applied::Stale;
        }
        self.submitting = false;
        // The password is only held while the reset call is in flight.
        self.session.new_password.clear();
        match result {
            Ok(_) => {
                // Only the email survives into the confirmation screen.
                self.session.forget_verification();
                self.enter(ResetStep::Confirmation);
                Applied::Advanced(ResetStep::Confirmation)
            }
            Err(err) => self.stay_with(&err),
        }
    }

    /// Moves to the previous step, discarding the code and token gathered on
    /// the way forward. Backing out of the first step exits the flow.
    pub fn back(&mut self) -> Navigation {
        if self.exit.is_some() {
            return Navigation::Ignored;
        }
        match self.step {
            ResetStep::Email => {
                self.abandon();
                Navigation::Exited
            }
            ResetStep::Otp => {
                self.timer.cancel();
                self.session.forget_verification();
                self.enter(ResetStep::Email);
                Navigation::Moved(ResetStep::Email)
            }
            ResetStep::NewPassword => {
                self.session.forget_verification();
                self.enter(ResetStep::Otp);
                self.timer.restart();
                Navigation::Moved(ResetStep::Otp)
            }
            // The password has already been changed.
            ResetStep::Confirmation => Navigation::Ignored,
        }
    }

    /// Leaves the confirmation screen. Returns false on any other step.
    pub fn confirm(&mut self) -> bool {
        if self.exit.is_some() || self.step != ResetStep::Confirmation {
            return false;
        }
        self.close(FlowExit::Completed);
        true
    }

    pub fn abandon(&mut self) {
        if self.exit.is_none() {
            self.close(FlowExit::Abandoned);
        }
    }

    /// One second of countdown. Only the OTP step counts down.
    pub fn tick(&mut self) -> bool {
        if self.exit.is_some() || self.step != ResetStep::Otp {
            return false;
        }
        self.timer.tick()
    }

    fn ticket(&self) -> Ticket {
        Ticket {
            step: self.step,
            generation: self.generation,
        }
    }

    fn open_ticket(&mut self, step: ResetStep) -> Result<Ticket, FlowError> {
        if self.exit.is_some() {
            return Err(FlowError::Closed);
        }
        if self.step != step {
            return Err(FlowError::WrongStep(self.step));
        }
        if self.submitting {
            return Err(FlowError::Busy);
        }
        self.field_error = None;
        self.notice = None;
        Ok(self.ticket())
    }

    fn accepts(&self, ticket: Ticket) -> bool {
        self.exit.is_none() && ticket == self.ticket()
    }

    fn reject_field(&mut self, field: Field, message: String) -> FlowError {
        self.field_error = Some(FieldError {
            field,
            message: message.clone(),
        });
        FlowError::Invalid { field, message }
    }

    fn stay_with(&mut self, err: &ApiError) -> Applied {
        log::warn!("{} step failed: {} ({})", self.step, err.error, err.code);
        self.notice = Some(Notice::from_api_error(err));
        Applied::Stayed
    }

    fn enter(&mut self, step: ResetStep) {
        log::debug!("password reset: {} -> {}", self.step, step);
        self.step = step;
        self.generation += 1;
        self.submitting = false;
        self.resending = false;
        self.field_error = None;
        self.notice = None;
    }

    fn close(&mut self, exit: FlowExit) {
        let email = std::mem::take(&mut self.session.email);
        self.session = ResetSession::default();
        if exit == FlowExit::Completed {
            self.session.email = email;
        }
        self.timer.cancel();
        self.generation += 1;
        self.submitting = false;
        self.resending = false;
        self.field_error = None;
        self.notice = None;
        self.exit = Some(exit);
    }
}

/// A [`ResetFlow`] driven directly against a [`VerificationApi`].
pub struct ResetWizard<A> {
    api: A,
    flow: ResetFlow,
}

impl<A: VerificationApi> ResetWizard<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            flow: ResetFlow::new(),
        }
    }

    pub fn flow(&self) -> &ResetFlow {
        &self.flow
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn dismiss_notice(&mut self) {
        self.flow.dismiss_notice();
    }

    pub async fn submit_email(&mut self, email: &str) -> Result<Applied, FlowError> {
        let submission = self.flow.begin_email(email)?;
        let result = self.api.request_code(&submission.email).await;
        Ok(self.flow.finish_email(submission, result))
    }

    pub async fn submit_code(&mut self, code: &str) -> Result<Applied, FlowError> {
        let submission = self.flow.begin_verify(code)?;
        let result = self
            .api
            .verify_code(&submission.email, &submission.code)
            .await;
        Ok(self.flow.finish_verify(submission, result))
    }

    pub async fn resend_code(&mut self) -> Result<Applied, FlowError> {
        let submission = self.flow.begin_resend()?;
        let result = self.api.request_code(&submission.email).await;
        Ok(self.flow.finish_resend(submission, result))
    }

    pub async fn submit_new_password(
        &mut self,
        new_password: &str,
        confirmation: &str,
    ) -> Result<Applied, FlowError> {
        let submission = self.flow.begin_reset(new_password, confirmation)?;
        let result = self
            .api
            .reset_password(&submission.new_password, &submission.reset_token)
            .await;
        let applied = self.flow.finish_reset(submission, result);
        if applied == Applied::Advanced(ResetStep::Confirmation) {
            self.api.discard_reset_token();
        }
        Ok(applied)
    }

    pub fn back(&mut self) -> Navigation {
        let navigation = self.flow.back();
        if navigation != Navigation::Ignored {
            self.api.discard_reset_token();
        }
        navigation
    }

    pub fn tick(&mut self) -> bool {
        self.flow.tick()
    }

    pub fn confirm(&mut self) -> bool {
        self.flow.confirm()
    }

    pub fn abandon(&mut self) {
        self.flow.abandon();
        self.api.discard_reset_token();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_message() -> Result<MessageResponse, ApiError> {
        Ok(MessageResponse::default())
    }

    fn at_otp() -> ResetFlow {
        let mut flow = ResetFlow::new();
        let sub = flow.begin_email("user@example.com").unwrap();
        flow.finish_email(sub, ok_message());
        flow
    }

    fn at_new_password() -> ResetFlow {
        let mut flow = at_otp();
        let sub = flow.begin_verify("123456").unwrap();
        flow.finish_verify(sub, Ok("abc".into()));
        flow
    }

    fn expire(flow: &mut ResetFlow) {
        while !flow.tick() {}
    }

    #[test]
    fn starts_on_email_step() {
        let flow = ResetFlow::new();
        assert_eq!(flow.step(), ResetStep::Email);
        assert_eq!(flow.timer(), ResendTimer::Idle);
        assert!(!flow.is_submitting());
        assert!(flow.exit().is_none());
    }

    #[test]
    fn invalid_email_sets_field_error_without_submission() {
        let mut flow = ResetFlow::new();
        let err = flow.begin_email("not-an-email").unwrap_err();
        assert!(matches!(err, FlowError::Invalid { field: Field::Email, .. }));
        assert_eq!(flow.field_error().map(|e| e.field), Some(Field::Email));
        assert!(!flow.is_submitting());
        assert_eq!(flow.step(), ResetStep::Email);
    }

    #[test]
    fn email_success_moves_to_otp_and_starts_timer() {
        let flow = at_otp();
        assert_eq!(flow.step(), ResetStep::Otp);
        assert_eq!(flow.session().email, "user@example.com");
        assert_eq!(flow.timer(), ResendTimer::started());
        assert!(!flow.can_resend());
    }

    #[test]
    fn duplicate_submission_is_busy_until_response() {
        let mut flow = ResetFlow::new();
        let first = flow.begin_email("user@example.com").unwrap();
        assert_eq!(flow.begin_email("user@example.com"), Err(FlowError::Busy));

        let applied = flow.finish_email(first, Err(ApiError::server("Unknown email", None)));
        assert_eq!(applied, Applied::Stayed);
        assert!(!flow.is_submitting());
        assert!(flow.begin_email("user@example.com").is_ok());
    }

    #[test]
    fn transport_failures_use_generic_notice() {
        let mut flow = ResetFlow::new();
        let sub = flow.begin_email("user@example.com").unwrap();
        flow.finish_email(sub, Err(ApiError::request_failed("connection refused")));
        assert_eq!(flow.notice(), Some(&Notice::error(TRANSPORT_NOTICE)));
        assert_eq!(flow.step(), ResetStep::Email);
    }

    #[test]
    fn server_failures_show_server_message() {
        let mut flow = at_otp();
        let sub = flow.begin_verify("123456").unwrap();
        let applied = flow.finish_verify(sub, Err(ApiError::server("Invalid OTP", None)));
        assert_eq!(applied, Applied::Stayed);
        assert_eq!(flow.notice(), Some(&Notice::error("Invalid OTP")));
        assert_eq!(flow.step(), ResetStep::Otp);
        assert!(flow.session().reset_token.is_none());
    }

    #[test]
    fn short_code_is_blocked_with_notice() {
        let mut flow = at_otp();
        let err = flow.begin_verify("12345").unwrap_err();
        assert!(matches!(err, FlowError::Invalid { field: Field::OtpCode, .. }));
        assert_eq!(
            flow.notice().map(|n| n.kind),
            Some(NoticeKind::Error)
        );
        assert!(!flow.is_submitting());
    }

    #[test]
    fn verify_success_threads_token_into_session() {
        let flow = at_new_password();
        assert_eq!(flow.step(), ResetStep::NewPassword);
        assert_eq!(flow.session().reset_token.as_deref(), Some("abc"));
        assert_eq!(flow.session().otp_code, "123456");
        assert_eq!(flow.timer(), ResendTimer::Idle);
    }

    #[test]
    fn resend_is_locked_until_countdown_expires() {
        let mut flow = at_otp();
        assert_eq!(flow.begin_resend(), Err(FlowError::ResendLocked(60)));
        flow.tick();
        assert_eq!(flow.begin_resend(), Err(FlowError::ResendLocked(59)));

        expire(&mut flow);
        assert!(flow.can_resend());
        let sub = flow.begin_resend().unwrap();
        assert_eq!(flow.timer(), ResendTimer::started());
        assert!(!flow.can_resend());
        assert_eq!(flow.begin_resend(), Err(FlowError::Busy));

        flow.finish_resend(sub, Err(ApiError::server("Too many requests", None)));
        // The countdown restarted regardless of the failure.
        assert_eq!(flow.timer(), ResendTimer::started());
        assert!(!flow.is_resending());
        assert_eq!(flow.begin_resend(), Err(FlowError::ResendLocked(60)));
    }

    #[test]
    fn resend_success_reports_info_notice() {
        let mut flow = at_otp();
        expire(&mut flow);
        let sub = flow.begin_resend().unwrap();
        assert_eq!(flow.finish_resend(sub, ok_message()), Applied::Stayed);
        assert_eq!(flow.notice().map(|n| n.kind), Some(NoticeKind::Info));
    }

    #[test]
    fn password_rules_are_checked_before_token() {
        let mut flow = at_new_password();
        let err = flow.begin_reset("password", "password").unwrap_err();
        assert!(matches!(err, FlowError::Invalid { field: Field::NewPassword, .. }));
        assert!(!flow.is_submitting());

        let err = flow.begin_reset("Passw0rd", "Passw0rd!").unwrap_err();
        assert_eq!(
            err,
            FlowError::Invalid {
                field: Field::NewPassword,
                message: "Passwords do not match".into()
            }
        );
    }

    #[test]
    fn missing_token_blocks_reset() {
        let mut flow = at_otp();
        let sub = flow.begin_verify("123456").unwrap();
        flow.finish_verify(sub, Ok(String::new()));

        let err = flow.begin_reset("Passw0rd", "Passw0rd").unwrap_err();
        assert_eq!(err, FlowError::Blocked(MISSING_RESET_TOKEN_NOTICE.into()));
        assert_eq!(flow.notice(), Some(&Notice::error(MISSING_RESET_TOKEN_NOTICE)));
        assert!(!flow.is_submitting());
    }

    #[test]
    fn new_password_is_held_only_while_reset_is_in_flight() {
        let mut flow = at_new_password();
        let sub = flow.begin_reset("Passw0rd", "Passw0rd").unwrap();
        assert_eq!(flow.session().new_password, "Passw0rd");

        flow.finish_reset(sub, Err(ApiError::server("Reset token expired", None)));
        assert_eq!(flow.step(), ResetStep::NewPassword);
        assert!(flow.session().new_password.is_empty());
        assert_eq!(flow.session().reset_token.as_deref(), Some("abc"));

        let err = flow.begin_reset("password", "password").unwrap_err();
        assert!(matches!(err, FlowError::Invalid { .. }));
        assert!(flow.session().new_password.is_empty());
    }

    #[test]
    fn reset_success_discards_secrets() {
        let mut flow = at_new_password();
        let sub = flow.begin_reset("Passw0rd", "Passw0rd").unwrap();
        assert_eq!(sub.reset_token, "abc");
        let applied = flow.finish_reset(sub, ok_message());
        assert_eq!(applied, Applied::Advanced(ResetStep::Confirmation));
        assert_eq!(flow.session().email, "user@example.com");
        assert!(flow.session().reset_token.is_none());
        assert!(flow.session().otp_code.is_empty());
        assert!(flow.session().new_password.is_empty());
    }

    #[test]
    fn back_from_new_password_discards_token_and_restarts_timer() {
        let mut flow = at_new_password();
        assert_eq!(flow.back(), Navigation::Moved(ResetStep::Otp));
        assert!(flow.session().reset_token.is_none());
        assert!(flow.session().otp_code.is_empty());
        assert_eq!(flow.session().email, "user@example.com");
        assert_eq!(flow.timer(), ResendTimer::started());
    }

    #[test]
    fn back_from_otp_cancels_timer() {
        let mut flow = at_otp();
        flow.tick();
        assert_eq!(flow.back(), Navigation::Moved(ResetStep::Email));
        assert_eq!(flow.timer(), ResendTimer::Idle);
        assert!(!flow.tick());
        assert_eq!(flow.timer(), ResendTimer::Idle);
    }

    #[test]
    fn back_from_email_exits() {
        let mut flow = ResetFlow::new();
        assert_eq!(flow.back(), Navigation::Exited);
        assert_eq!(flow.exit(), Some(FlowExit::Abandoned));
        assert_eq!(flow.begin_email("user@example.com"), Err(FlowError::Closed));
        assert_eq!(flow.back(), Navigation::Ignored);
    }

    #[test]
    fn late_response_after_back_is_dropped() {
        let mut flow = at_otp();
        let sub = flow.begin_verify("123456").unwrap();
        flow.back();

        assert_eq!(flow.finish_verify(sub, Ok("abc".into())), Applied::Stale);
        assert_eq!(flow.step(), ResetStep::Email);
        assert!(flow.session().reset_token.is_none());
        assert!(!flow.is_submitting());
    }

    #[test]
    fn late_response_after_reentering_same_step_is_dropped() {
        let mut flow = at_otp();
        let stale = flow.begin_verify("123456").unwrap();
        flow.back();
        let sub = flow.begin_email("user@example.com").unwrap();
        flow.finish_email(sub, ok_message());
        assert_eq!(flow.step(), ResetStep::Otp);

        assert_eq!(flow.finish_verify(stale, Ok("abc".into())), Applied::Stale);
        assert_eq!(flow.step(), ResetStep::Otp);
    }

    #[test]
    fn late_resend_after_verification_is_dropped() {
        let mut flow = at_otp();
        expire(&mut flow);
        let resend = flow.begin_resend().unwrap();
        let verify = flow.begin_verify("123456").unwrap();
        flow.finish_verify(verify, Ok("abc".into()));

        assert_eq!(
            flow.finish_resend(resend, Err(ApiError::server("late", None))),
            Applied::Stale
        );
        assert!(flow.notice().is_none());
    }

    #[test]
    fn confirmation_is_terminal() {
        let mut flow = at_new_password();
        let sub = flow.begin_reset("Passw0rd", "Passw0rd").unwrap();
        flow.finish_reset(sub, ok_message());

        assert_eq!(flow.back(), Navigation::Ignored);
        assert!(flow.confirm());
        assert_eq!(flow.exit(), Some(FlowExit::Completed));
        assert!(!flow.confirm());
    }

    #[test]
    fn confirm_is_refused_before_confirmation_step() {
        let mut flow = at_otp();
        assert!(!flow.confirm());
        assert!(flow.exit().is_none());
    }

    #[test]
    fn actions_on_wrong_step_are_rejected() {
        let mut flow = ResetFlow::new();
        assert_eq!(
            flow.begin_verify("123456"),
            Err(FlowError::WrongStep(ResetStep::Email))
        );
        assert_eq!(flow.begin_resend(), Err(FlowError::WrongStep(ResetStep::Email)));
        assert!(!flow.tick());
    }

    #[test]
    fn session_debug_hides_secrets() {
        let mut flow = at_new_password();
        let _sub = flow.begin_reset("Passw0rd", "Passw0rd").unwrap();
        let rendered = format!("{:?}", flow.session());
        assert!(!rendered.contains("abc"));
        assert!(!rendered.contains("123456"));
        assert!(!rendered.contains("Passw0rd"));
    }
}
