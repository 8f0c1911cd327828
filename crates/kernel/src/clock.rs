use std::time::Instant;

/// Raw seconds from some monotonic-ish origin.
///
/// Implementations may go backwards or return non-finite values; the
/// [`SimulationClock`] absorbs both.
pub trait TimeSource {
    fn now_seconds(&mut self) -> f64;
}

/// Wall-clock source backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct InstantSource {
    origin: Instant,
}

impl InstantSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for InstantSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for InstantSource {
    fn now_seconds(&mut self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// A source whose reading is set by hand. Used for headless runs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ManualSource {
    now: f64,
}

impl ManualSource {
    pub fn new(start: f64) -> Self {
        Self { now: start }
    }

    pub fn set(&mut self, seconds: f64) {
        self.now = seconds;
    }

    pub fn advance(&mut self, seconds: f64) {
        self.now += seconds;
    }
}

impl TimeSource for ManualSource {
    fn now_seconds(&mut self) -> f64 {
        self.now
    }
}

/// Result of one [`SimulationClock::tick`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClockTick {
    /// Seconds accumulated since the first tick.
    pub elapsed: f64,
    /// Seconds since the previous tick, never negative.
    pub delta: f64,
}

/// Frame clock: elapsed time plus per-tick delta.
///
/// The clock starts on its first `tick`, which always reports a zero delta.
/// A reading that goes backwards rebases the clock without moving elapsed
/// time; a non-finite reading is ignored entirely.
#[derive(Debug, Clone)]
pub struct SimulationClock<S = InstantSource> {
    source: S,
    last_raw: Option<f64>,
    elapsed: f64,
    last_delta: f64,
}

impl SimulationClock<InstantSource> {
    pub fn wall() -> Self {
        Self::new(InstantSource::new())
    }
}

impl<S: TimeSource> SimulationClock<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            last_raw: None,
            elapsed: 0.0,
            last_delta: 0.0,
        }
    }

    pub fn tick(&mut self) -> ClockTick {
        let raw = self.source.now_seconds();
        let delta = if !raw.is_finite() {
            tracing::debug!(raw, "ignoring non-finite clock reading");
            0.0
        } else {
            let delta = match self.last_raw {
                Some(last) if raw < last => {
                    tracing::debug!(from = last, to = raw, "clock source went backwards");
                    0.0
                }
                Some(last) => raw - last,
                None => 0.0,
            };
            self.last_raw = Some(raw);
            delta
        };

        self.elapsed += delta;
        self.last_delta = delta;
        ClockTick {
            elapsed: self.elapsed,
            delta,
        }
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn last_delta(&self) -> f64 {
        self.last_delta
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}
