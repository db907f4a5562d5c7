//! Status snapshot reported to the host.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use super::state::BoosterState;

/// Point-in-time progress of the booster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub is_running: bool,
    pub current_volume: Decimal,
    pub target_volume: Decimal,
    /// current / target * 100, 0 when the target is not positive.
    pub progress_percent: f64,
    /// max(0, target - current).
    pub remaining_volume: Decimal,
}

impl StatusSnapshot {
    pub fn from_state(state: &BoosterState) -> Self {
        let progress_percent = if state.target_volume > Decimal::ZERO {
            (state.current_volume / state.target_volume * Decimal::ONE_HUNDRED)
                .to_f64()
                .unwrap_or(0.0)
        } else {
            0.0
        };

        Self {
            is_running: state.is_running(),
            current_volume: state.current_volume,
            target_volume: state.target_volume,
            progress_percent,
            remaining_volume: (state.target_volume - state.current_volume).max(Decimal::ZERO),
        }
    }
}
