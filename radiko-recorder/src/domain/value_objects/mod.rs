//! Value objects shared across the recorder.

pub mod retry_policy;

pub use retry_policy::RetryPolicy;
