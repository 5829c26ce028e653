// crates/jobs/src/config.rs
//! Limits applied to every polling task the registry spawns.

use std::time::Duration;

/// Default cap on total polling time for one job.
pub const DEFAULT_POLL_DEADLINE: Duration = Duration::from_secs(600);

/// Registry-wide polling configuration.
///
/// The per-kind tick cadence lives on `JobKind`; this covers everything
/// that is not kind-specific.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Cap on total polling time for one job. Exceeding it ends the job
    /// in a terminal failure rather than polling forever.
    pub deadline: Duration,
    /// Capacity of the registry-wide event channel.
    pub event_capacity: usize,
}

impl PollConfig {
    pub fn with_deadline(deadline: Duration) -> Self {
        Self {
            deadline,
            ..Self::default()
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            deadline: DEFAULT_POLL_DEADLINE,
            event_capacity: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_deadline() {
        let config = PollConfig::default();
        assert_eq!(config.deadline, Duration::from_secs(600));
        assert_eq!(config.event_capacity, 256);
    }

    #[test]
    fn test_with_deadline_keeps_other_fields() {
        let config = PollConfig::with_deadline(Duration::from_secs(30));
        assert_eq!(config.deadline, Duration::from_secs(30));
        assert_eq!(config.event_capacity, PollConfig::default().event_capacity);
    }
}
