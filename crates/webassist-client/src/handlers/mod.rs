//! Ready-made delegating handlers

mod logging;
mod retry;

pub use logging::LoggingHandler;
pub use retry::{RetryConfig, RetryHandler, RetryStrategy};
