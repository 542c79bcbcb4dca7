//! Periodic control cycle.
//!
//! Each cycle runs, in order:
//! 1. Take up to [`MAX_REQUESTS_PER_CYCLE`] pending setpoint requests
//!    (non-blocking, resolved in send order) and apply the last one.
//! 2. Advance the driver by one period (`update`).
//! 3. `tick()` the controller.
//! 4. Publish to the status board.
//! 5. Record timing and sleep for the rest of the period.
//!
//! Overruns are counted and logged, never fatal.
//!
//! ## RT Setup
//! With the `rt` feature: `mlockall`, stack prefault, CPU affinity and
//! `SCHED_FIFO`, then absolute-time sleeps on `CLOCK_MONOTONIC`. Without it,
//! the RT calls are no-ops and the loop sleeps with `std::thread::sleep`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use elevator_common::hal::driver::ActuatorDriver;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::command::{SetpointReceiver, SetpointSender, setpoint_channel};
use crate::controller::{ElevatorController, TickOutcome};
use crate::error::ControlError;
use crate::status::StatusBoard;

/// Setpoint requests taken per cycle; the rest wait for later cycles.
pub const MAX_REQUESTS_PER_CYCLE: usize = 32;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Last cycle duration [ns].
    pub last_cycle_ns: u64,
    /// Minimum cycle duration [ns].
    pub min_cycle_ns: u64,
    /// Maximum cycle duration [ns].
    pub max_cycle_ns: u64,
    /// Running sum for the average.
    pub sum_cycle_ns: u64,
    /// Cycles that exceeded the period.
    pub overruns: u64,
    /// Cycles whose command was skipped on a driver fault.
    pub skipped: u64,
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleStats {
    /// Zeroed statistics.
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: u64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
            skipped: 0,
        }
    }

    /// Record one cycle body duration.
    #[inline]
    pub fn record(&mut self, duration_ns: u64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns = self.sum_cycle_ns.saturating_add(duration_ns);
    }

    /// Average cycle time [ns] (0 before the first cycle).
    #[inline]
    pub fn avg_cycle_ns(&self) -> u64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count
        }
    }
}

// ─── RT Setup ───────────────────────────────────────────────────────

/// Errors from RT setup or loop timing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleError {
    /// RT system call failed.
    #[error("RT setup error: {0}")]
    RtSetup(String),
}

#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), CycleError> {
    use nix::sys::mman::{MlockallFlags, mlockall};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), CycleError> {
    Ok(())
}

/// Touch stack pages up front so the loop does not fault them in.
fn prefault_stack() {
    let buf = [0xFFu8; 256 * 1024];
    std::hint::black_box(&buf);
}

#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), CycleError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| CycleError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| CycleError::RtSetup(format!("sched_setaffinity failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), CycleError> {
    Ok(())
}

#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), CycleError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` is a valid sched_param for the duration of the call.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(CycleError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), CycleError> {
    Ok(())
}

/// Lock memory, prefault the stack, pin to `cpu_core` and switch to `SCHED_FIFO`.
///
/// Call once, from the loop thread, before `CycleRunner::run`.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    Ok(())
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// Owns the controller and paces it at a fixed period.
pub struct CycleRunner<D: ActuatorDriver> {
    controller: ElevatorController<D>,
    requests: SetpointReceiver,
    sender: SetpointSender,
    status: Arc<StatusBoard>,
    stats: CycleStats,
    cycle_time: Duration,
    running: Arc<AtomicBool>,
}

impl<D: ActuatorDriver> CycleRunner<D> {
    /// Wrap `controller`, pacing it at `cycle_time`.
    pub fn new(controller: ElevatorController<D>, cycle_time: Duration) -> Self {
        let (sender, requests) = setpoint_channel();
        let status = Arc::new(StatusBoard::new());
        status.publish_target(controller.target_height());
        Self {
            controller,
            requests,
            sender,
            status,
            stats: CycleStats::new(),
            cycle_time,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A new sender feeding this runner.
    pub fn setpoint_sender(&self) -> SetpointSender {
        self.sender.clone()
    }

    /// Status board shared with observers.
    pub fn status(&self) -> Arc<StatusBoard> {
        Arc::clone(&self.status)
    }

    /// Flag that keeps `run` looping; clear it to stop.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Timing statistics so far.
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// The controller driven by this runner.
    pub fn controller(&self) -> &ElevatorController<D> {
        &self.controller
    }

    /// Release the driver through the controller. Idempotent once it succeeds.
    pub fn shutdown(&mut self) -> Result<(), ControlError> {
        self.controller.shutdown()
    }

    /// Control period.
    pub fn cycle_time(&self) -> Duration {
        self.cycle_time
    }

    /// Execute one cycle body without sleeping.
    pub fn step(&mut self) -> TickOutcome {
        let start = Instant::now();
        let outcome = self.cycle_body();
        let elapsed = start.elapsed();
        self.finish_cycle(elapsed, &outcome);
        outcome
    }

    /// Loop until the running flag is cleared or `max_cycles` have run.
    ///
    /// The flag is set on entry; a ctrl-c handler typically clears it.
    pub fn run(&mut self, max_cycles: Option<u64>) -> Result<(), CycleError> {
        self.running.store(true, Ordering::SeqCst);
        info!(
            "Entering control loop (cycle_time={}us, max_cycles={:?})",
            self.cycle_time.as_micros(),
            max_cycles
        );

        #[cfg(feature = "rt")]
        let result = self.run_rt_loop(max_cycles);
        #[cfg(not(feature = "rt"))]
        let result = self.run_sim_loop(max_cycles);

        self.running.store(false, Ordering::SeqCst);
        info!(
            "Control loop stopped after {} cycles (overruns={}, skipped={}, avg={}ns, max={}ns)",
            self.stats.cycle_count,
            self.stats.overruns,
            self.stats.skipped,
            self.stats.avg_cycle_ns(),
            self.stats.max_cycle_ns
        );
        result
    }

    fn keep_running(&self, max_cycles: Option<u64>) -> bool {
        self.running.load(Ordering::SeqCst)
            && max_cycles.is_none_or(|max| self.stats.cycle_count < max)
    }

    #[cfg(not(feature = "rt"))]
    fn run_sim_loop(&mut self, max_cycles: Option<u64>) -> Result<(), CycleError> {
        while self.keep_running(max_cycles) {
            let cycle_start = Instant::now();
            let outcome = self.cycle_body();
            let elapsed = cycle_start.elapsed();
            self.finish_cycle(elapsed, &outcome);

            if let Some(remaining) = self.cycle_time.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }
        Ok(())
    }

    #[cfg(feature = "rt")]
    fn run_rt_loop(&mut self, max_cycles: Option<u64>) -> Result<(), CycleError> {
        use nix::sys::time::TimeSpec;
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let period = TimeSpec::from_duration(self.cycle_time);
        let mut next_wake = clock_gettime(clock)
            .map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))?;

        while self.keep_running(max_cycles) {
            next_wake = next_wake + period;

            let cycle_start = Instant::now();
            let outcome = self.cycle_body();
            self.finish_cycle(cycle_start.elapsed(), &outcome);

            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
        }
        Ok(())
    }

    fn cycle_body(&mut self) -> TickOutcome {
        if let Some(height) = self.take_requests() {
            match self.controller.set_target(height) {
                Ok(accepted) => debug!("Setpoint request {} accepted as {}", height, accepted),
                Err(e) => debug!("Setpoint request {} not fully applied: {}", height, e),
            }
        }
        self.status.publish_target(self.controller.target_height());

        if let Err(e) = self.controller.update_driver(self.cycle_time) {
            debug!("Driver update failed: {e}");
        }

        let outcome = self.controller.tick();
        match &outcome {
            TickOutcome::Applied { zone, measured, .. } => {
                self.status.publish_tick(*zone, *measured)
            }
            TickOutcome::Skipped(_) => self.status.publish_skip(),
        }
        outcome
    }

    /// Resolve up to `MAX_REQUESTS_PER_CYCLE` queued requests in send order
    /// and return the last usable height.
    fn take_requests(&self) -> Option<f64> {
        let mut latest = None;
        let mut taken = 0usize;
        for request in self.requests.drain(MAX_REQUESTS_PER_CYCLE) {
            taken += 1;
            match request.resolve() {
                Some(height) if height.is_nan() => {
                    warn!("Setpoint request dropped: height is NaN")
                }
                Some(height) => latest = Some(height),
                None => warn!("Setpoint request dropped: height source panicked"),
            }
        }
        if taken == MAX_REQUESTS_PER_CYCLE {
            debug!("Setpoint batch full ({taken}), rest deferred to the next cycle");
        }
        latest
    }

    fn finish_cycle(&mut self, elapsed: Duration, outcome: &TickOutcome) {
        let elapsed_ns = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.stats.record(elapsed_ns);
        if !outcome.is_applied() {
            self.stats.skipped += 1;
        }

        if elapsed > self.cycle_time {
            self.stats.overruns += 1;
            if self.stats.overruns <= 10 || self.stats.overruns % 1000 == 0 {
                warn!(
                    "Cycle overrun #{}: {}us (period {}us)",
                    self.stats.overruns,
                    elapsed.as_micros(),
                    self.cycle_time.as_micros()
                );
            }
        }

        if self.stats.cycle_count % 1000 == 0 {
            let snap = self.status.snapshot();
            debug!(
                "Control loop: {} cycles, avg={}ns, max={}ns, target={}, height={:.3}, zone={:?}",
                self.stats.cycle_count,
                self.stats.avg_cycle_ns(),
                self.stats.max_cycle_ns,
                snap.target,
                snap.height,
                snap.zone
            );
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
