//! Retry and backoff policy for failed segment attempts.
//!
//! Classifies per-segment errors (timeouts, throttling, connection failures)
//! and decides whether a failed index goes back on the queue and after how long.

mod classify;
mod policy;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
