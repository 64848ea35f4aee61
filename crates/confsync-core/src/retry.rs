use std::time::Duration;

/// Fixed-delay retry policy handed to the transport.
///
/// `max_attempts` counts the first attempt too: the default of 3 means one
/// call plus up to two retries, with `delay` slept between attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, delay: Duration::from_secs(5) }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        // zero attempts would make every call fail before trying
        Self { max_attempts: max_attempts.max(1), delay }
    }

    /// Whether another attempt may follow the given failed attempt (1-based).
    pub fn allows_retry(&self, failed_attempt: u32) -> bool {
        failed_attempt < self.max_attempts
    }
}
