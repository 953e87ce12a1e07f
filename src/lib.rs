//! Analytical core of an API test harness: fixture accumulation over
//! captured response payloads, suite detection from the artifacts a run
//! leaves behind, and the webhook notifier that reports outcomes.

pub mod cmd;
pub mod config;
pub mod detect;
pub mod errors;
pub mod fixtures;
pub mod http;
pub mod log;
pub mod notify;
