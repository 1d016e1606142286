//! Poll loop and cursor tracking.
//!
//! Every tick queries the current window, prints what came back and moves the
//! window forward. The lower bound only advances past records that were
//! printed, so nothing is printed twice as long as the tenant returns records
//! in ascending timestamp order.

use crate::{
    error::FetchError,
    model::{Filter, LogRecord, QueryWindow, SortOrder},
    printer::Printer,
    shutdown::ShutdownSignal,
};
use chrono::Utc;
use log::{debug, error, info, warn};
use rand::Rng;
use std::{io::Write, time::Duration};

/// Anything that can answer a window query.
pub trait LogSource {
    fn fetch(&mut self, window: &QueryWindow, filter: &Filter) -> Result<Vec<LogRecord>, FetchError>;
}

/// Source of "now", in epoch milliseconds.
pub trait Clock {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

#[derive(Clone, Debug)]
pub struct BackoffConfig {
    pub initial: Duration,
    pub max: Duration,
    pub multiplier: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        BackoffConfig {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(60),
            multiplier: 2,
        }
    }
}

/// Exponential backoff with jitter, used between failed fetches.
#[derive(Clone, Debug)]
pub struct Backoff {
    config: BackoffConfig,
    attempt: u32,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Backoff { config, attempt: 0 }
    }

    /// Upper bound of the next delay, before jitter.
    pub fn ceiling(&self) -> Duration {
        let factor = self
            .config
            .multiplier
            .checked_pow(self.attempt)
            .unwrap_or(u32::MAX);
        self.config
            .initial
            .checked_mul(factor)
            .unwrap_or(self.config.max)
            .min(self.config.max)
    }

    /// Delay drawn uniformly from `[ceiling / 2, ceiling]`.
    pub fn next_delay(&mut self) -> Duration {
        let ceiling = self.ceiling().as_millis() as u64;
        self.attempt = self.attempt.saturating_add(1);
        let millis = rand::thread_rng().gen_range(ceiling / 2..=ceiling);
        Duration::from_millis(millis)
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

/// Poll loop settings.
#[derive(Clone, Debug)]
pub struct PollConfig {
    /// Wait between successful ticks, defaults to 10 seconds.
    pub interval: Duration,
    /// How far back the first window reaches, defaults to 30 minutes.
    pub lookback: Duration,
    /// Server-side result limit per query, defaults to 500.
    pub limit: u32,
    pub backoff: BackoffConfig,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            interval: Duration::from_secs(10),
            lookback: Duration::from_secs(30 * 60),
            limit: 500,
            backoff: BackoffConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing printed yet; the next batch carries the table header.
    Bootstrapping,
    /// At least one record has been printed.
    Steady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The fetch failed; the window is unchanged.
    Failed,
    /// The fetch returned no records.
    Empty,
    /// The fetch returned this many records.
    Delivered(usize),
    /// The fetch filled the whole page; the window should be re-queried right away.
    Saturated(usize),
}

pub struct Poller<S, W: Write, C = SystemClock> {
    source: S,
    printer: Printer<W>,
    clock: C,
    filter: Filter,
    window: QueryWindow,
    phase: Phase,
    backoff: Backoff,
    interval: Duration,
}

impl<S: LogSource, W: Write, C: Clock> Poller<S, W, C> {
    pub fn new(source: S, printer: Printer<W>, filter: Filter, config: PollConfig, clock: C) -> Self {
        let now = clock.now_millis();
        let lookback = i64::try_from(config.lookback.as_millis()).unwrap_or(i64::MAX);
        let window = QueryWindow {
            start: now.saturating_sub(lookback),
            end: now,
            limit: config.limit,
            sort: SortOrder::Asc,
        };
        Poller {
            source,
            printer,
            clock,
            filter,
            window,
            phase: Phase::Bootstrapping,
            backoff: Backoff::new(config.backoff),
            interval: config.interval,
        }
    }

    pub fn window(&self) -> &QueryWindow {
        &self.window
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn printer(&self) -> &Printer<W> {
        &self.printer
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// One fetch-and-print step. Does not sleep.
    pub fn tick(&mut self) -> TickOutcome {
        let records = match self.source.fetch(&self.window, &self.filter) {
            Ok(records) => records,
            Err(err) => {
                error!("Unable to get the logs: {}", err);
                return TickOutcome::Failed;
            }
        };
        self.backoff.reset();

        let last = match records.last() {
            Some(last) => last.timestamp,
            None => {
                self.window.end = self.clock.now_millis();
                return TickOutcome::Empty;
            }
        };

        let first_batch = self.phase == Phase::Bootstrapping;
        if let Err(err) = self.printer.print_batch(&records, first_batch) {
            warn!("Unable to write log rows: {}", err);
        }
        self.phase = Phase::Steady;
        self.window.advance_past(last);

        let count = records.len();
        // A full page is re-queried only while the window is still non-empty.
        if count as u64 >= u64::from(self.window.limit) && self.window.start <= self.window.end {
            debug!("Page of {} records is full, re-querying up to {}", count, self.window.end);
            return TickOutcome::Saturated(count);
        }
        self.window.end = self.clock.now_millis();
        TickOutcome::Delivered(count)
    }

    /// How long to wait after `outcome` before the next tick.
    pub fn delay_after(&mut self, outcome: TickOutcome) -> Duration {
        match outcome {
            TickOutcome::Failed => self.backoff.next_delay(),
            TickOutcome::Saturated(_) => Duration::ZERO,
            TickOutcome::Empty | TickOutcome::Delivered(_) => self.interval,
        }
    }

    /// Tick until `shutdown` fires.
    pub fn run(&mut self, shutdown: &ShutdownSignal) {
        info!(
            "Polling for logs from {} every {:?}",
            self.window.start, self.interval
        );
        loop {
            let outcome = self.tick();
            let delay = self.delay_after(outcome);
            if outcome == TickOutcome::Failed {
                debug!(
                    "Retrying in {:?} (attempt {})",
                    delay,
                    self.backoff.attempt()
                );
            }
            if shutdown.wait(delay) {
                info!("Shutdown requested, stopping");
                return;
            }
        }
    }
}
