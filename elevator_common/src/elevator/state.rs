//! Guard zone classification.

use serde::{Deserialize, Serialize};

/// Per-cycle classification deciding which command class is issued.
///
/// Recomputed from scratch every tick; never carried between cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum GuardZone {
    /// Normal motion-profile tracking toward the target.
    #[default]
    Tracking = 0,
    /// Near the bottom stop with a bottom target: zero volts.
    BottomHold = 1,
    /// Near the top stop with a top target: fixed hold voltage.
    TopHold = 2,
}

impl GuardZone {
    /// Decode from the `repr(u8)` value; unknown values map to `None`.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Tracking),
            1 => Some(Self::BottomHold),
            2 => Some(Self::TopHold),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repr_round_trips() {
        for zone in [GuardZone::Tracking, GuardZone::BottomHold, GuardZone::TopHold] {
            assert_eq!(GuardZone::from_u8(zone as u8), Some(zone));
        }
        assert_eq!(GuardZone::from_u8(3), None);
    }
}
