//! Deterministic scan cycle: read → process → write.
//!
//! The runner paces [`StateController::cycle`] against a host process image
//! reached through [`CycleIo`].
//!
//! ## RT Setup
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)`.
//! 2. Prefault stack pages.
//! 3. `sched_setaffinity` to the configured core.
//! 4. `sched_setscheduler(SCHED_FIFO, priority)`.
//!
//! ## Cycle Loop
//! With the `rt` feature, absolute-time sleep on `CLOCK_MONOTONIC` and an
//! overrun ends the loop. Without it, `std::thread::sleep` and overruns are
//! only counted.

use std::sync::atomic::{AtomicBool, Ordering};

use evo_common::sequencer::config::SequencerConfig;
use evo_common::sequencer::io::{CycleInputs, CycleStatus};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::LoadedConfig;
use crate::state::controller::StateController;

// ─── Host I/O ───────────────────────────────────────────────────────

/// Process image of the host.
///
/// `read_inputs` fills the record sampled at cycle start; `write_outputs`
/// receives the status latched at cycle end.
pub trait CycleIo {
    fn read_inputs(&mut self, inputs: &mut CycleInputs) -> Result<(), CycleError>;
    fn write_outputs(&mut self, status: &CycleStatus) -> Result<(), CycleError>;
}

/// Errors during RT setup or cycle execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleError {
    /// RT system call failed.
    #[error("RT setup error: {0}")]
    RtSetup(String),

    /// Host process image not reachable.
    #[error("I/O error: {0}")]
    Io(String),

    #[error("cycle overrun: {actual_ns}ns > {budget_ns}ns budget")]
    CycleOverrun { actual_ns: i64, budget_ns: i64 },
}

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Last cycle duration [ns].
    pub last_cycle_ns: i64,
    pub min_cycle_ns: i64,
    pub max_cycle_ns: i64,
    /// Running sum for average computation.
    pub sum_cycle_ns: i64,
    /// Running sum of squares for stddev computation.
    pub sum_sq_cycle_ns: i128,
    pub overruns: u64,
    /// Maximum wake-up latency [ns].
    pub max_latency_ns: i64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            sum_sq_cycle_ns: 0,
            overruns: 0,
            max_latency_ns: 0,
        }
    }

    /// Record a cycle duration. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration_ns: i64, latency_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns += duration_ns;
        self.sum_sq_cycle_ns += i128::from(duration_ns) * i128::from(duration_ns);
        self.max_latency_ns = self.max_latency_ns.max(latency_ns);
    }

    /// Average cycle time [ns] (0 if no cycles).
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }

    /// Standard deviation of the cycle time [ns].
    pub fn stddev_cycle_ns(&self) -> f64 {
        if self.cycle_count == 0 {
            return 0.0;
        }
        let n = self.cycle_count as f64;
        let mean = self.sum_cycle_ns as f64 / n;
        let variance = self.sum_sq_cycle_ns as f64 / n - mean * mean;
        variance.max(0.0).sqrt()
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── RT Setup ───────────────────────────────────────────────────────

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

/// Touch 256 KiB of stack so the loop never faults a page in.
fn prefault_stack() {
    let mut buf = [0u8; 256 * 1024];
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, exclusive reference into `buf`.
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
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
    // SAFETY: `param` outlives the call; pid 0 is the calling thread.
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

/// Full RT setup sequence. All calls are no-ops without the `rt` feature.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    Ok(())
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// Scan loop driving one controller against one host.
pub struct CycleRunner<I: CycleIo> {
    config: SequencerConfig,
    controller: StateController,
    io: I,
    inputs: CycleInputs,
    stats: CycleStats,
    cycle_time_ns: i64,
    status_interval: u64,
}

impl<I: CycleIo> CycleRunner<I> {
    pub fn new(loaded: LoadedConfig, io: I) -> Self {
        let LoadedConfig { config, controller } = loaded;
        let cycle_time_ns = i64::from(config.cycle_time_us) * 1000;
        let status_interval = u64::from(config.status_interval.max(1));
        Self {
            config,
            controller,
            io,
            inputs: CycleInputs::default(),
            stats: CycleStats::new(),
            cycle_time_ns,
            status_interval,
        }
    }

    #[inline]
    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    #[inline]
    pub fn controller(&self) -> &StateController {
        &self.controller
    }

    #[inline]
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    #[inline]
    pub fn io(&self) -> &I {
        &self.io
    }

    #[inline]
    pub fn io_mut(&mut self) -> &mut I {
        &mut self.io
    }

    /// One scan without pacing: read inputs, cycle the controller, write
    /// outputs.
    pub fn run_once(&mut self) -> Result<CycleStatus, CycleError> {
        self.io.read_inputs(&mut self.inputs)?;
        let status = self.controller.cycle(&self.inputs);
        self.io.write_outputs(&status)?;

        if status.cycle % self.status_interval == 0 {
            match serde_json::to_string(&status) {
                Ok(snapshot) => debug!(target: "evo_sequencer::status", %snapshot, "status"),
                Err(e) => warn!("status snapshot not serializable: {e}"),
            }
        }
        Ok(status)
    }

    /// Paced loop until `running` is cleared or `max_cycles` scans ran.
    pub fn run(&mut self, running: &AtomicBool, max_cycles: Option<u64>) -> Result<(), CycleError> {
        info!(
            service = %self.config.shared.service_name,
            cycle_time_us = self.config.cycle_time_us,
            "entering scan loop"
        );

        #[cfg(feature = "rt")]
        let result = self.run_rt_loop(running, max_cycles);

        #[cfg(not(feature = "rt"))]
        let result = self.run_sim_loop(running, max_cycles);

        info!(
            cycles = self.stats.cycle_count,
            avg_ns = self.stats.avg_cycle_ns(),
            max_ns = self.stats.max_cycle_ns,
            overruns = self.stats.overruns,
            state = ?self.controller.state(),
            "scan loop finished"
        );
        result
    }

    fn limit_reached(&self, max_cycles: Option<u64>) -> bool {
        max_cycles.is_some_and(|max| self.stats.cycle_count >= max)
    }

    #[cfg(feature = "rt")]
    fn run_rt_loop(&mut self, running: &AtomicBool, max_cycles: Option<u64>) -> Result<(), CycleError> {
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let now = || {
            clock_gettime(clock).map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))
        };
        let mut next_wake = now()?;

        while running.load(Ordering::Relaxed) && !self.limit_reached(max_cycles) {
            next_wake = timespec_add_ns(next_wake, self.cycle_time_ns);

            let cycle_start = now()?;
            self.run_once()?;
            let cycle_end = now()?;

            let duration_ns = timespec_diff_ns(&cycle_end, &cycle_start);
            self.stats.record(duration_ns, 0);
            if duration_ns > self.cycle_time_ns {
                self.stats.overruns += 1;
                return Err(CycleError::CycleOverrun {
                    actual_ns: duration_ns,
                    budget_ns: self.cycle_time_ns,
                });
            }

            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
            if let Ok(woke) = now() {
                let latency = timespec_diff_ns(&woke, &next_wake).abs();
                self.stats.max_latency_ns = self.stats.max_latency_ns.max(latency);
            }
        }
        Ok(())
    }

    #[cfg(not(feature = "rt"))]
    fn run_sim_loop(&mut self, running: &AtomicBool, max_cycles: Option<u64>) -> Result<(), CycleError> {
        use std::time::{Duration, Instant};

        let cycle_duration = Duration::from_nanos(self.cycle_time_ns as u64);

        while running.load(Ordering::Relaxed) && !self.limit_reached(max_cycles) {
            let cycle_start = Instant::now();
            self.run_once()?;

            let elapsed = cycle_start.elapsed();
            let duration_ns = elapsed.as_nanos() as i64;
            self.stats.record(duration_ns, 0);

            if duration_ns > self.cycle_time_ns {
                self.stats.overruns += 1;
                debug!(duration_ns, budget_ns = self.cycle_time_ns, "cycle overrun");
            }

            if let Some(remaining) = cycle_duration.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }
        Ok(())
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let mut secs = ts.tv_sec();
    let mut nanos = ts.tv_nsec() + ns;
    while nanos >= 1_000_000_000 {
        secs += 1;
        nanos -= 1_000_000_000;
    }
    TimeSpec::new(secs, nanos)
}

/// `a - b` in nanoseconds.
#[cfg(feature = "rt")]
fn timespec_diff_ns(a: &nix::sys::time::TimeSpec, b: &nix::sys::time::TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * 1_000_000_000 + (a.tv_nsec() - b.tv_nsec())
}

// ─── Tests ──────────────────────────────────────────────────────────
