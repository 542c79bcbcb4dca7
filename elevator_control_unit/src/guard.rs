//! End-stop guard classification.
//!
//! The guard decides, per tick, whether the controller tracks its target
//! or overrides it with a fixed hold voltage near either hard-stop.
//! Evaluation order is fixed and the first match wins:
//!
//! | Zone | Condition | Command |
//! |------|-----------|---------|
//! | `BottomHold` | `target < min + 1` and `measured < min + 2` | 0 V |
//! | `TopHold` | `measured > max - 8` and `target > max - 8` | `kg_top` V |
//! | `Tracking` | otherwise | position command toward `target` |
//!
//! Comparisons are strict. There is no hysteresis: the same inputs always
//! yield the same zone regardless of history.

use elevator_common::elevator::{GuardConfig, GuardZone, TravelRange};

/// Absolute guard thresholds, precomputed from the travel range and margins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuardThresholds {
    /// Target must be strictly below this for `BottomHold`.
    pub bottom_target: f64,
    /// Measured height must be strictly below this for `BottomHold`.
    pub bottom_position: f64,
    /// Both target and measured height must be strictly above this for `TopHold`.
    pub top: f64,
    /// Voltage applied in `TopHold`.
    pub kg_top: f64,
}

impl GuardThresholds {
    /// Derive thresholds from a validated range and guard table.
    pub fn new(travel: &TravelRange, guard: &GuardConfig) -> Self {
        Self {
            bottom_target: travel.min_height + guard.bottom_target_margin,
            bottom_position: travel.min_height + guard.bottom_position_margin,
            top: travel.max_height - guard.top_margin,
            kg_top: guard.kg_top,
        }
    }

    /// Classify one cycle.
    #[inline]
    pub fn classify(&self, target: f64, measured: f64) -> GuardZone {
        if target < self.bottom_target && measured < self.bottom_position {
            GuardZone::BottomHold
        } else if measured > self.top && target > self.top {
            GuardZone::TopHold
        } else {
            GuardZone::Tracking
        }
    }

    /// Voltage the driver receives for a hold zone; `None` while tracking.
    #[inline]
    pub fn hold_voltage(&self, zone: GuardZone) -> Option<f64> {
        match zone {
            GuardZone::BottomHold => Some(0.0),
            GuardZone::TopHold => Some(self.kg_top),
            GuardZone::Tracking => None,
        }
    }
}
