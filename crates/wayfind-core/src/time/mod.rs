use std::time::{Duration, Instant};

const EPSILON: Duration = Duration::from_nanos(1);

/// Timestamp guaranteed to advance strictly within one sample stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonotonicTimestamp(Duration);

impl MonotonicTimestamp {
    pub fn as_duration(&self) -> Duration {
        self.0
    }

    fn from_duration(duration: Duration) -> Self {
        Self(duration)
    }
}

pub trait Clock {
    fn now(&mut self) -> Duration;
}

#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&mut self) -> Duration {
        self.origin.elapsed()
    }
}

/// Bridges device-reported sample timestamps into a strictly increasing
/// sequence. Sensor stacks occasionally redeliver or reorder samples;
/// downstream debounce logic assumes time never runs backwards.
#[derive(Debug, Clone)]
pub struct SampleTimestampPolicy<C: Clock = SystemClock> {
    clock: C,
    last: Option<MonotonicTimestamp>,
}

impl SampleTimestampPolicy<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock::default())
    }
}

impl Default for SampleTimestampPolicy<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> SampleTimestampPolicy<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock, last: None }
    }

    /// Stamps a device-reported timestamp, substituting the local clock when
    /// the device did not report one.
    pub fn ingest(&mut self, reported: Option<Duration>) -> MonotonicTimestamp {
        let candidate = match reported {
            Some(ts) => ts,
            None => self.clock.now(),
        };
        let next = match self.last {
            Some(prev) if candidate <= prev.0 => MonotonicTimestamp::from_duration(
                prev.0.checked_add(EPSILON).unwrap_or(prev.0),
            ),
            _ => MonotonicTimestamp::from_duration(candidate),
        };
        self.last = Some(next);
        next
    }
}
