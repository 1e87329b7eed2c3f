//! Timing of proactive announcements.
//!
//! Two independent periods drive re-announcement of the handshake and the
//! document height, so a host that missed an event still converges. DOM
//! mutations push a fresh tree and height; with a non-zero debounce those
//! pushes are coalesced on the trailing edge, and a flush always follows
//! the first mutation of a burst.

use std::time::Duration;

use crate::BridgeConfig;

/// What to do about an observed mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationAction {
    /// Push tree and height now
    PushNow,
    /// Arrange for a flush after this delay
    ScheduleFlush(Duration),
    /// A flush is already pending and will cover this mutation
    Coalesced,
}

/// Periods and mutation coalescing state.
#[derive(Debug, Clone)]
pub struct Scheduler {
    handshake_interval: Duration,
    height_interval: Duration,
    debounce: Duration,
    flush_pending: bool,
}

impl Scheduler {
    /// Timing taken from `config`.
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            handshake_interval: config.handshake_interval(),
            height_interval: config.height_interval(),
            debounce: config.mutation_debounce(),
            flush_pending: false,
        }
    }

    /// Period of the handshake re-announcement.
    pub fn handshake_interval(&self) -> Duration {
        self.handshake_interval
    }

    /// Period of the height re-announcement.
    pub fn height_interval(&self) -> Duration {
        self.height_interval
    }

    /// Record a mutation and decide how to react.
    pub fn on_mutation(&mut self) -> MutationAction {
        if self.debounce.is_zero() {
            return MutationAction::PushNow;
        }
        if self.flush_pending {
            return MutationAction::Coalesced;
        }
        self.flush_pending = true;
        MutationAction::ScheduleFlush(self.debounce)
    }

    /// A scheduled flush fired. Returns whether there was anything to push.
    pub fn take_flush(&mut self) -> bool {
        std::mem::take(&mut self.flush_pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_pushes_every_mutation_without_a_debounce() {
        let mut scheduler = Scheduler::new(&BridgeConfig::default());

        assert_eq!(scheduler.on_mutation(), MutationAction::PushNow);
        assert_eq!(scheduler.on_mutation(), MutationAction::PushNow);
        assert!(!scheduler.take_flush());
    }

    #[test]
    fn it_coalesces_bursts_behind_one_flush() {
        let mut scheduler = Scheduler::new(&BridgeConfig {
            mutation_debounce_ms: 50,
            ..Default::default()
        });

        assert_eq!(
            scheduler.on_mutation(),
            MutationAction::ScheduleFlush(Duration::from_millis(50))
        );
        assert_eq!(scheduler.on_mutation(), MutationAction::Coalesced);
        assert!(scheduler.take_flush());
        assert!(!scheduler.take_flush());
        assert_eq!(
            scheduler.on_mutation(),
            MutationAction::ScheduleFlush(Duration::from_millis(50))
        );
    }

    #[test]
    fn it_reads_its_periods_from_the_config() {
        let scheduler = Scheduler::new(&BridgeConfig::default());

        assert_eq!(scheduler.handshake_interval(), Duration::from_secs(3));
        assert_eq!(scheduler.height_interval(), Duration::from_secs(1));
    }
}
