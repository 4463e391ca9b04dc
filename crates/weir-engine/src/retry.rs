use std::time::Duration;

/// Backoff settings for transient delivery failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Once the current delay reaches this, the batch is abandoned
    pub ceiling: Duration,
    /// Bounds of the uniform random jitter added after each doubling
    pub jitter_min: Duration,
    pub jitter_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            ceiling: Duration::from_secs(20 * 60),
            jitter_min: Duration::from_millis(100),
            jitter_max: Duration::from_millis(1100),
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn ceiling(mut self, ceiling: Duration) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Set the jitter range; `jitter(Duration::ZERO, Duration::ZERO)` makes
    /// the backoff deterministic
    pub fn jitter(mut self, min: Duration, max: Duration) -> Self {
        self.jitter_min = min;
        self.jitter_max = max;
        self
    }
}

/// Backoff state for one in-flight batch
///
/// Explicit state machine, independent of the transport: the delivery loop
/// asks `next_delay` after each transient failure and sleeps the answer, or
/// abandons the batch when the ceiling has been reached.
#[derive(Debug)]
pub struct RetryState {
    policy: RetryPolicy,
    delay: Duration,
    retries: u32,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        let delay = policy.base_delay;
        Self {
            policy,
            delay,
            retries: 0,
        }
    }

    /// Delay to sleep before the next attempt, or `None` once the current
    /// delay has reached the ceiling
    ///
    /// Each granted delay doubles the next one and adds random jitter from
    /// the policy's range.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.delay >= self.policy.ceiling {
            return None;
        }
        let current = self.delay;
        self.delay = current * 2 + self.jitter();
        self.retries += 1;
        Some(current)
    }

    /// Number of retries granted so far
    pub fn retries(&self) -> u32 {
        self.retries
    }

    fn jitter(&self) -> Duration {
        let min = self.policy.jitter_min.as_millis() as u64;
        let max = self.policy.jitter_max.as_millis() as u64;
        if max <= min {
            return self.policy.jitter_min;
        }
        Duration::from_millis(min + rand::random::<u64>() % (max - min))
    }
}
