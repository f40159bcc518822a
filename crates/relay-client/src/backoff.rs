use relay_core::config::RealtimeConfig;
use std::time::Duration;

// ─── ReconnectPolicy ──────────────────────────────────────────────────────

/// Exponential reconnect schedule: the delay doubles from `initial` on each
/// attempt, never exceeds `max`, and stops after `max_attempts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub initial: Duration,
    pub max: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from(&RealtimeConfig::default())
    }
}

impl From<&RealtimeConfig> for ReconnectPolicy {
    fn from(cfg: &RealtimeConfig) -> Self {
        Self {
            initial: Duration::from_millis(cfg.backoff_initial_ms),
            max: Duration::from_millis(cfg.backoff_max_ms),
            max_attempts: cfg.max_attempts,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect `attempt` (1-based); `None` once the attempts
    /// are used up.
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
        Some(self.initial.saturating_mul(factor).min(self.max))
    }

    /// The full schedule, in order.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..=self.max_attempts).filter_map(move |a| self.delay(a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_doubles_from_one_second() {
        let secs: Vec<u64> = ReconnectPolicy::default().delays().map(|d| d.as_secs()).collect();
        assert_eq!(secs, vec![1, 2, 4, 8, 16]);
    }

    #[test]
    fn stops_after_max_attempts() {
        let policy = ReconnectPolicy::default();
        assert!(policy.delay(5).is_some());
        assert_eq!(policy.delay(6), None);
        assert_eq!(policy.delay(0), None);
    }

    #[test]
    fn delay_is_capped() {
        let policy = ReconnectPolicy {
            max_attempts: 40,
            ..Default::default()
        };
        assert_eq!(policy.delay(6), Some(Duration::from_secs(30)));
        assert_eq!(policy.delay(40), Some(Duration::from_secs(30)));
        assert!(policy.delays().all(|d| d <= Duration::from_secs(30)));
    }
}
