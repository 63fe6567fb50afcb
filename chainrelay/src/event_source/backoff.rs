use std::time::Duration;

use crate::config::RelayerConfig;

/// Exponential retry delays: `min(base_delay * factor^attempt, max_delay)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    base_delay: Duration,
    factor: f64,
    max_delay: Duration,
}

impl Backoff {
    pub fn new(base_delay: Duration, factor: f64, max_delay: Duration) -> Self {
        Self {
            base_delay,
            factor,
            max_delay,
        }
    }

    pub fn from_config(config: &RelayerConfig) -> Self {
        Self::new(
            config.get_rpc_base_delay(),
            config.rpc_backoff_factor,
            config.get_rpc_max_backoff(),
        )
    }

    /// Delay to wait after the failed attempt number `attempt` (zero-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay = self.base_delay.as_secs_f64() * self.factor.powi(exponent);

        if delay.is_finite() && delay < self.max_delay.as_secs_f64() {
            Duration::from_secs_f64(delay)
        } else {
            self.max_delay
        }
    }
}
