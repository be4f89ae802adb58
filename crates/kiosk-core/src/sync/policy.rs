use std::time::Duration;

use serde::Serialize;

/// Reconnect backoff: `base_delay * growth^(attempt - 1)`, no jitter,
/// at most `max_attempts` scheduled reconnects in a row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub growth: f64,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(5000),
            growth: 1.5,
            max_attempts: 10,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.growth.powi(exponent);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(5000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(7500));
        assert_eq!(policy.delay_for(3), Duration::from_millis(11_250));
        assert_eq!(policy.delay_for(10), Duration::from_secs_f64(192.216_796_875));
    }

    #[test]
    fn attempt_zero_is_treated_as_first() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(0), policy.base_delay);
    }

    #[test]
    fn huge_growth_saturates() {
        let policy = ReconnectPolicy {
            growth: 1e300,
            ..ReconnectPolicy::default()
        };
        assert_eq!(policy.delay_for(5), Duration::MAX);
    }
}
