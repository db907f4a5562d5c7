//! Lifecycle state owned by the booster loop.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;

/// Phase of the booster state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoosterPhase {
    /// Never started.
    Idle,
    Running,
    /// Stop requested, loop still unwinding.
    Stopping,
    Stopped,
}

impl fmt::Display for BoosterPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BoosterPhase::Idle => "idle",
            BoosterPhase::Running => "running",
            BoosterPhase::Stopping => "stopping",
            BoosterPhase::Stopped => "stopped",
        };
        write!(f, "{}", s)
    }
}

/// Volume progress and run flags.
///
/// `current_volume` only grows, except through an explicit reset.
#[derive(Debug, Clone)]
pub struct BoosterState {
    pub phase: BoosterPhase,
    pub should_stop: bool,
    pub current_volume: Decimal,
    pub target_volume: Decimal,
    pub started_at: Option<DateTime<Utc>>,
}

impl BoosterState {
    pub fn new(target_volume: Decimal) -> Self {
        Self {
            phase: BoosterPhase::Idle,
            should_stop: false,
            current_volume: Decimal::ZERO,
            target_volume,
            started_at: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == BoosterPhase::Running
    }

    pub fn target_reached(&self) -> bool {
        self.current_volume >= self.target_volume
    }

    /// Adds traded notional. Negative amounts are ignored.
    pub fn add_volume(&mut self, notional: Decimal) {
        if notional > Decimal::ZERO {
            self.current_volume += notional;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_volume_never_decreases() {
        let mut state = BoosterState::new(Decimal::from(100));
        state.add_volume(Decimal::from(30));
        state.add_volume(Decimal::from(-10));
        assert_eq!(state.current_volume, Decimal::from(30));
        assert!(!state.target_reached());

        state.add_volume(Decimal::from(70));
        assert!(state.target_reached());
    }

    #[test]
    fn test_new_state_is_idle() {
        let state = BoosterState::new(Decimal::ONE);
        assert_eq!(state.phase, BoosterPhase::Idle);
        assert!(!state.is_running());
        assert!(state.started_at.is_none());
    }
}
