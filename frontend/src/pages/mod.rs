pub mod forgot_password;

pub use forgot_password::*;
