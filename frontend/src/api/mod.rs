pub mod client;
pub mod types;
pub mod verification;

pub use client::*;
pub use types::*;

#[cfg(all(test, not(target_arch = "wasm32")))]
pub mod test_support;
