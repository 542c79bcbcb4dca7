//! Follower motor simulator.
//!
//! The follower is mechanically coupled to the leader and never commanded
//! per cycle; it mirrors the leader rotor, inverted when mounted opposed.

/// Follower rotor tracking the leader.
#[derive(Debug, Clone, Default)]
pub struct FollowerSimulator {
    /// Mounted opposite to the leader
    opposed: bool,
    /// Rotor position [rotations]
    rotor_position: f64,
}

impl FollowerSimulator {
    /// Create a follower with the given mounting direction.
    pub fn new(opposed: bool) -> Self {
        Self {
            opposed,
            rotor_position: 0.0,
        }
    }

    /// Re-apply the follower relation (driver init).
    pub fn set_opposed(&mut self, opposed: bool) {
        self.opposed = opposed;
    }

    /// Mirror the leader rotor position.
    #[inline]
    pub fn follow(&mut self, leader_rotor: f64) {
        self.rotor_position = if self.opposed {
            -leader_rotor
        } else {
            leader_rotor
        };
    }

    /// Follower rotor position [rotations].
    #[inline]
    pub fn rotor_position(&self) -> f64 {
        self.rotor_position
    }
}
