use rand::Rng;
use std::time::Duration;

/// Exponential reconnect schedule: `initial * 2^(attempt-1)`, capped.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
    /// Fraction of the delay added or removed at random, `0.0` disables jitter.
    pub jitter: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            max_attempts: 10,
            jitter: 0.0,
        }
    }
}

impl ReconnectPolicy {
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    #[must_use]
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Delay before reconnect `attempt` (1-based), without jitter.
    /// `None` once the attempts are exhausted.
    pub fn base_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        let factor = 2u32.saturating_pow(attempt - 1);
        Some(self.initial_delay.saturating_mul(factor).min(self.max_delay))
    }

    /// Delay before reconnect `attempt` with jitter applied.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        let base = self.base_delay(attempt)?;
        if self.jitter <= 0.0 {
            return Some(base);
        }
        let spread = rand::thread_rng().gen_range(-self.jitter..=self.jitter);
        Some(base.mul_f64(1.0 + spread).min(self.max_delay))
    }
}
