//! Forgot-password wizard: email → verification code → new password →
//! confirmation.

pub mod flow;
pub mod repository;
pub mod timer;
pub mod utils;
pub mod view_model;

pub use flow::{Applied, FlowError, FlowExit, Navigation, ResetFlow, ResetStep, ResetWizard};
pub use repository::{ForgotPasswordRepository, VerificationApi};
pub use timer::{ResendTimer, RESEND_COOLDOWN_SECS};
pub use view_model::{use_forgot_password_view_model, ForgotPasswordViewModel};
