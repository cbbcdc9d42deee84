use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use nalgebra::Vector3;
use wayfind_core::time::{Clock, MonotonicTimestamp, SampleTimestampPolicy, SystemClock};

/// Sampling interval requested from the platform sensor stack unless the
/// embedder overrides it.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Raw vector reading as delivered by a platform sensor callback.
#[derive(Debug, Clone, Copy)]
pub struct RawSensorEvent {
    /// Device-reported timestamp; `None` when the platform does not stamp
    /// its callbacks.
    pub timestamp: Option<Duration>,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl RawSensorEvent {
    pub fn new(timestamp: Duration, x: f64, y: f64, z: f64) -> Self {
        Self {
            timestamp: Some(timestamp),
            x,
            y,
            z,
        }
    }
}

/// Acceleration sample in g units with a stream-monotonic timestamp.
#[derive(Debug, Clone, Copy)]
pub struct AccelerometerSample {
    pub timestamp: MonotonicTimestamp,
    pub vector: Vector3<f64>,
}

/// Magnetic-field sample in µT with a stream-monotonic timestamp.
#[derive(Debug, Clone, Copy)]
pub struct MagnetometerSample {
    pub timestamp: MonotonicTimestamp,
    pub vector: Vector3<f64>,
}

/// Stamps raw platform callbacks into monotonic, typed samples. The two
/// streams are independent, so each gets its own timestamp policy.
#[derive(Debug, Clone)]
pub struct MotionSampler<C: Clock = SystemClock> {
    accel_policy: SampleTimestampPolicy<C>,
    mag_policy: SampleTimestampPolicy<C>,
}

impl MotionSampler<SystemClock> {
    pub fn new() -> Self {
        Self {
            accel_policy: SampleTimestampPolicy::new(),
            mag_policy: SampleTimestampPolicy::new(),
        }
    }
}

impl Default for MotionSampler<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock + Clone> MotionSampler<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            accel_policy: SampleTimestampPolicy::with_clock(clock.clone()),
            mag_policy: SampleTimestampPolicy::with_clock(clock),
        }
    }
}

impl<C: Clock> MotionSampler<C> {
    pub fn ingest_accelerometer(&mut self, raw: RawSensorEvent) -> AccelerometerSample {
        AccelerometerSample {
            timestamp: self.accel_policy.ingest(raw.timestamp),
            vector: Vector3::new(raw.x, raw.y, raw.z),
        }
    }

    pub fn ingest_magnetometer(&mut self, raw: RawSensorEvent) -> MagnetometerSample {
        MagnetometerSample {
            timestamp: self.mag_policy.ingest(raw.timestamp),
            vector: Vector3::new(raw.x, raw.y, raw.z),
        }
    }
}

/// Handle for an active sensor listener. Releasing (or dropping) it
/// deregisters the listener exactly once; repeated teardown is safe.
pub struct SensorSubscription {
    release: Option<Box<dyn FnOnce() + Send>>,
    label: &'static str,
}

impl SensorSubscription {
    pub fn new(label: &'static str, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
            label,
        }
    }

    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(release) = self.release.take() {
            debug!(target: "wayfind_providers::sensors", "Releasing {} subscription", self.label);
            release();
        }
    }
}

impl Drop for SensorSubscription {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl std::fmt::Debug for SensorSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorSubscription")
            .field("label", &self.label)
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Capability probing and listener registration for the two motion
/// sensors the engine consumes. Sample delivery itself stays outside this
/// trait: the platform invokes the engine's ingest methods on whatever
/// callback path it owns, and the engine serializes them.
pub trait MotionSensorPlatform {
    fn accelerometer_available(&self) -> bool;
    fn magnetometer_available(&self) -> bool;

    /// Registers an accelerometer listener at `interval`, or `None` when
    /// the sensor is absent.
    fn subscribe_accelerometer(&mut self, interval: Duration) -> Option<SensorSubscription>;

    /// Registers a magnetometer listener at `interval`, or `None` when
    /// the sensor is absent.
    fn subscribe_magnetometer(&mut self, interval: Duration) -> Option<SensorSubscription>;
}

/// Test and replay double with configurable capabilities. Tracks how many
/// listeners are currently registered so teardown discipline is checkable.
#[derive(Debug, Clone)]
pub struct MockSensorPlatform {
    accelerometer: bool,
    magnetometer: bool,
    active: Arc<AtomicUsize>,
}

impl MockSensorPlatform {
    pub fn new(accelerometer: bool, magnetometer: bool) -> Self {
        Self {
            accelerometer,
            magnetometer,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of listeners currently registered.
    pub fn active_subscriptions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    fn register(&self, label: &'static str) -> SensorSubscription {
        self.active.fetch_add(1, Ordering::SeqCst);
        let active = Arc::clone(&self.active);
        SensorSubscription::new(label, move || {
            active.fetch_sub(1, Ordering::SeqCst);
        })
    }
}

impl MotionSensorPlatform for MockSensorPlatform {
    fn accelerometer_available(&self) -> bool {
        self.accelerometer
    }

    fn magnetometer_available(&self) -> bool {
        self.magnetometer
    }

    fn subscribe_accelerometer(&mut self, _interval: Duration) -> Option<SensorSubscription> {
        self.accelerometer.then(|| self.register("accelerometer"))
    }

    fn subscribe_magnetometer(&mut self, _interval: Duration) -> Option<SensorSubscription> {
        self.magnetometer.then(|| self.register("magnetometer"))
    }
}
