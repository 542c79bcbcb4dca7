//! Lock-free status board.
//!
//! Written by the loop thread once per cycle, read by any number of
//! observers. Every field is a single atomic, so a reader sees either the
//! previous or the current value of each field, never a torn one. Fields are
//! independent: a snapshot is not guaranteed to come from one cycle.

use elevator_common::elevator::GuardZone;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

/// Shared controller status.
#[derive(Debug, Default)]
pub struct StatusBoard {
    target_bits: AtomicU64,
    height_bits: AtomicU64,
    zone: AtomicU8,
    ticks: AtomicU64,
    skipped: AtomicU64,
}

/// Point-in-time copy of the status board.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StatusSnapshot {
    /// Last accepted target height.
    pub target: f64,
    /// Last successfully measured height.
    pub height: f64,
    /// Zone chosen by the last completed tick.
    pub zone: GuardZone,
    /// Ticks executed.
    pub ticks: u64,
    /// Ticks whose command was skipped on a driver fault.
    pub skipped: u64,
}

impl StatusBoard {
    /// Empty board (all zeros, `Tracking`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the stored target.
    #[inline]
    pub fn publish_target(&self, target: f64) {
        self.target_bits.store(target.to_bits(), Ordering::Release);
    }

    /// Publish a completed tick.
    #[inline]
    pub fn publish_tick(&self, zone: GuardZone, height: f64) {
        self.height_bits.store(height.to_bits(), Ordering::Release);
        self.zone.store(zone as u8, Ordering::Release);
        self.ticks.fetch_add(1, Ordering::AcqRel);
    }

    /// Count a tick that issued no command.
    #[inline]
    pub fn publish_skip(&self) {
        self.ticks.fetch_add(1, Ordering::AcqRel);
        self.skipped.fetch_add(1, Ordering::AcqRel);
    }

    /// Last accepted target.
    pub fn target(&self) -> f64 {
        f64::from_bits(self.target_bits.load(Ordering::Acquire))
    }

    /// Last measured height.
    pub fn height(&self) -> f64 {
        f64::from_bits(self.height_bits.load(Ordering::Acquire))
    }

    /// Last guard zone.
    pub fn zone(&self) -> GuardZone {
        GuardZone::from_u8(self.zone.load(Ordering::Acquire)).unwrap_or_default()
    }

    /// Copy every field.
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            target: self.target(),
            height: self.height(),
            zone: self.zone(),
            ticks: self.ticks.load(Ordering::Acquire),
            skipped: self.skipped.load(Ordering::Acquire),
        }
    }
}
