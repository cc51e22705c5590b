//! Fixed-rate update clock for Colosseum.
//!
//! Countdowns, victory displays and time-limited rounds all advance from
//! update ticks. The engine actor owns one [`UpdateClock`] and, each time
//! it fires, updates every live competition by the time that actually
//! passed, so phase timers follow wall-clock time even when the actor was
//! busy.
//!
//! A rate of 0 Hz makes the clock event-driven: [`UpdateClock::next_tick`]
//! never resolves and competitions only move on joins, leaves and explicit
//! phase changes.
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = commands.recv() => engine.apply(cmd),
//!         tick = clock.next_tick() => {
//!             engine.update(tick.dt);
//!             clock.finish_tick();
//!         }
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

/// Settings for an [`UpdateClock`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClockConfig {
    /// Updates per second. 0 = event-driven.
    pub rate_hz: u32,
    /// Share of the tick period an update may use before it is reported
    /// as slow. Clamped to `0.0..=1.0`.
    pub slow_update_ratio: f64,
    /// Upper bound of a random delay before the first tick, so engines
    /// booted together do not update in lockstep.
    pub start_jitter: Duration,
}

impl ClockConfig {
    /// Phase timers count whole seconds; faster updates only burn CPU.
    pub const MAX_RATE_HZ: u32 = 64;

    pub fn with_rate(rate_hz: u32) -> Self {
        Self {
            rate_hz,
            ..Self::default()
        }
    }

    /// The tick period, or `None` when event-driven.
    pub fn period(&self) -> Option<Duration> {
        (self.rate_hz > 0).then(|| Duration::from_secs(1) / self.rate_hz)
    }

    fn clamped(mut self) -> Self {
        if self.rate_hz > Self::MAX_RATE_HZ {
            tracing::warn!(
                rate_hz = self.rate_hz,
                max = Self::MAX_RATE_HZ,
                "update rate too high, clamping"
            );
            self.rate_hz = Self::MAX_RATE_HZ;
        }
        self.slow_update_ratio = self.slow_update_ratio.clamp(0.0, 1.0);
        self
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            rate_hz: 0,
            slow_update_ratio: 0.8,
            start_jitter: Duration::from_millis(2),
        }
    }
}

/// One firing of the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// 1 for the first tick.
    pub number: u64,
    /// Time since the previous tick (or since the clock started).
    pub dt: Duration,
    /// Whole periods missed because the actor woke up late. Already
    /// included in `dt`.
    pub missed: u64,
}

/// Fixed-rate clock driving phase updates.
pub struct UpdateClock {
    config: ClockConfig,
    period: Option<Duration>,
    first_at: Instant,
    /// Created on the first wait so the clock can be built outside a
    /// runtime.
    interval: Option<Interval>,
    last_at: Instant,
    ticks: u64,
    update_started: Option<std::time::Instant>,
}

impl UpdateClock {
    pub fn new(config: ClockConfig) -> Self {
        let config = config.clamped();
        let period = config.period();
        let now = Instant::now();
        let jitter = match config.start_jitter.as_micros() {
            0 => Duration::ZERO,
            max => Duration::from_micros(rand::rng().random_range(0..max as u64)),
        };
        let first_at = now + jitter + period.unwrap_or_default();

        match period {
            Some(period) => tracing::debug!(rate_hz = config.rate_hz, ?period, "update clock created"),
            None => tracing::debug!("update clock created in event-driven mode"),
        }

        Self {
            config,
            period,
            first_at,
            interval: None,
            last_at: now + jitter,
            ticks: 0,
            update_started: None,
        }
    }

    pub fn with_rate(rate_hz: u32) -> Self {
        Self::new(ClockConfig::with_rate(rate_hz))
    }

    /// Resolves when the next update is due. Never resolves when
    /// event-driven.
    ///
    /// Cancel-safe: dropping the future inside `tokio::select!` loses no
    /// time, the next call picks up where this one stopped.
    pub async fn next_tick(&mut self) -> Tick {
        let Some(period) = self.period else {
            return std::future::pending().await;
        };
        let first_at = self.first_at;
        let interval = self.interval.get_or_insert_with(|| {
            let mut interval = interval_at(first_at, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        interval.tick().await;

        let now = Instant::now();
        let dt = now.saturating_duration_since(self.last_at);
        self.last_at = now;
        self.ticks += 1;
        self.update_started = Some(std::time::Instant::now());

        let missed = (dt.as_nanos() / period.as_nanos()).saturating_sub(1) as u64;
        if missed > 0 {
            tracing::warn!(tick = self.ticks, missed, ?dt, "update clock fell behind");
        }
        tracing::trace!(tick = self.ticks, ?dt, "tick");

        Tick {
            number: self.ticks,
            dt,
            missed,
        }
    }

    /// Marks the end of the update for the current tick, reporting it if
    /// it ran too long.
    pub fn finish_tick(&mut self) {
        let (Some(started), Some(period)) = (self.update_started.take(), self.period) else {
            return;
        };
        let took = started.elapsed();
        if took.as_secs_f64() >= period.as_secs_f64() * self.config.slow_update_ratio {
            tracing::warn!(tick = self.ticks, ?took, ?period, "slow phase update");
        }
    }

    pub fn is_event_driven(&self) -> bool {
        self.period.is_none()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn rate_hz(&self) -> u32 {
        self.config.rate_hz
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }
}

impl std::fmt::Debug for UpdateClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateClock")
            .field("rate_hz", &self.config.rate_hz)
            .field("ticks", &self.ticks)
            .finish()
    }
}
