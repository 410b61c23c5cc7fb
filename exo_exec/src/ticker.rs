//! # Ticker
//!
//! Fixed period tick service. A callback is attached once and then run on a
//! dedicated thread at absolute deadlines, `start + k * period`, so the tick
//! rate does not drift with the callback's execution time.
//!
//! If the thread wakes up more than a period late the missed deadlines are
//! skipped rather than replayed in a burst, and counted as overruns.
//!
//! The callback and the main loop share only atomics: the `TickHandoff`
//! counter, the heartbeat indicator, and the ticker's own counters.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use log::debug;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Handle to a running tick thread. Dropping the handle stops the thread.
pub struct Ticker {
    join_handle: Option<JoinHandle<()>>,
    run: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    overruns: Arc<AtomicU64>,
    period: Duration,
}

/// Counter of ticks not yet consumed by the main loop.
///
/// The tick callback only ever increments it, the main loop reads and clears
/// it in one atomic swap.
#[derive(Clone, Default)]
pub struct TickHandoff {
    pending: Arc<AtomicU64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TickerError {
    #[error("The tick period must be greater than zero")]
    InvalidPeriod,

    #[error("Could not start the tick thread: {0}")]
    SpawnError(std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Ticker {
    /// Start calling `callback` every `period`.
    ///
    /// The callback must complete in a small fraction of the period.
    pub fn attach<F>(period: Duration, callback: F) -> Result<Self, TickerError>
    where
        F: FnMut() + Send + 'static,
    {
        if period.as_nanos() == 0 {
            return Err(TickerError::InvalidPeriod);
        }

        let run = Arc::new(AtomicBool::new(true));
        let ticks = Arc::new(AtomicU64::new(0));
        let overruns = Arc::new(AtomicU64::new(0));

        // Clones for the tick thread
        let run_clone = run.clone();
        let ticks_clone = ticks.clone();
        let overruns_clone = overruns.clone();

        let join_handle = thread::Builder::new()
            .name("ticker".into())
            .spawn(move || tick_thread(period, callback, run_clone, ticks_clone, overruns_clone))
            .map_err(TickerError::SpawnError)?;

        debug!("Ticker attached with a period of {:?}", period);

        Ok(Self {
            join_handle: Some(join_handle),
            run,
            ticks,
            overruns,
            period,
        })
    }

    /// Number of times the callback has been run.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Number of deadlines skipped because the thread woke up too late.
    pub fn overruns(&self) -> u64 {
        self.overruns.load(Ordering::Relaxed)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Stop the tick thread and wait for it to finish.
    ///
    /// No callback runs after this returns.
    pub fn detach(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.run.store(false, Ordering::Release);

        if let Some(jh) = self.join_handle.take() {
            jh.join().ok();
            debug!("Ticker detached after {} ticks", self.ticks());
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

impl TickHandoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one tick. Called from the tick callback.
    pub fn notify(&self) {
        self.pending.fetch_add(1, Ordering::Release);
    }

    /// Take all pending ticks, leaving none.
    pub fn take(&self) -> u64 {
        self.pending.swap(0, Ordering::Acquire)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Body of the tick thread.
fn tick_thread<F: FnMut()>(
    period: Duration,
    mut callback: F,
    run: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    overruns: Arc<AtomicU64>,
) {
    let period_ns = period.as_nanos();
    let mut next_deadline = Instant::now() + period;

    loop {
        let now = Instant::now();
        if now < next_deadline {
            thread::sleep(next_deadline - now);
        }

        if !run.load(Ordering::Acquire) {
            break;
        }

        callback();
        ticks.fetch_add(1, Ordering::Relaxed);

        next_deadline += period;

        // Skip whole periods we have already fallen behind by
        let now = Instant::now();
        if now > next_deadline {
            let missed = (now - next_deadline).as_nanos() / period_ns;
            if missed > 0 {
                overruns.fetch_add(missed as u64, Ordering::Relaxed);
                next_deadline += Duration::from_nanos((missed * period_ns) as u64);
            }
        }
    }
}
