pub mod redact;
pub mod storage;
