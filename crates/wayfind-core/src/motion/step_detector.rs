use log::debug;
use nalgebra::Vector3;
use std::time::Duration;

/// Detection thresholds for acceleration-magnitude step counting.
#[derive(Debug, Clone, Copy)]
pub struct StepDetectorConfig {
    /// Minimum acceleration magnitude (in g) that counts as a footstep.
    /// Tuned to sit above handling and vibration noise; only an actual
    /// gait impact carries the device past this value.
    pub threshold_g: f64,
    /// Minimum interval between two accepted steps. Peaks inside this
    /// window are echoes of the same footfall.
    pub debounce: Duration,
}

impl Default for StepDetectorConfig {
    fn default() -> Self {
        Self {
            threshold_g: 2.5,
            debounce: Duration::from_millis(300),
        }
    }
}

/// One accepted footstep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepDetected {
    pub timestamp: Duration,
    pub magnitude_g: f64,
}

/// Peak detector over acceleration magnitude. Stateful only in the
/// timestamp of the last accepted step.
#[derive(Debug, Clone)]
pub struct StepDetector {
    config: StepDetectorConfig,
    last_step: Option<Duration>,
}

impl StepDetector {
    pub fn new(config: StepDetectorConfig) -> Self {
        assert!(config.threshold_g.is_finite() && config.threshold_g > 0.0);
        Self {
            config,
            last_step: None,
        }
    }

    /// Ingests one accelerometer sample (device coordinates, g units) and
    /// returns the step it completes, if any.
    pub fn update(&mut self, timestamp: Duration, accel_g: Vector3<f64>) -> Option<StepDetected> {
        let magnitude = accel_g.norm();
        if magnitude <= self.config.threshold_g {
            return None;
        }

        if let Some(last) = self.last_step {
            let elapsed = timestamp.checked_sub(last).unwrap_or_default();
            if elapsed < self.config.debounce {
                debug!(target: "wayfind_core::motion",
                    "Peak {:.2} g at {:?} suppressed by debounce ({:?} since last step)",
                    magnitude, timestamp, elapsed
                );
                return None;
            }
        }

        self.last_step = Some(timestamp);
        debug!(target: "wayfind_core::motion",
            "Step accepted at {:?} with magnitude {:.2} g", timestamp, magnitude);
        Some(StepDetected {
            timestamp,
            magnitude_g: magnitude,
        })
    }

    /// Forgets the previous step so the next peak is accepted immediately.
    pub fn reset(&mut self) {
        self.last_step = None;
    }
}

impl Default for StepDetector {
    fn default() -> Self {
        Self::new(StepDetectorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stomp() -> Vector3<f64> {
        Vector3::new(0.4, 2.9, 0.6)
    }

    fn resting() -> Vector3<f64> {
        // Gravity alone: magnitude ~1 g, well under the threshold.
        Vector3::new(0.02, 0.98, 0.05)
    }

    #[test]
    fn quiet_samples_never_count() {
        let mut detector = StepDetector::default();
        for k in 0..50 {
            let ts = Duration::from_millis(100 * k);
            assert!(detector.update(ts, resting()).is_none());
        }
    }

    #[test]
    fn peaks_inside_the_debounce_window_collapse_to_one_step() {
        let mut detector = StepDetector::default();

        let first = detector.update(Duration::from_millis(1_000), stomp());
        assert!(first.is_some());

        // 200 ms later: same footfall still ringing.
        assert!(detector
            .update(Duration::from_millis(1_200), stomp())
            .is_none());
    }

    #[test]
    fn peaks_at_or_past_the_debounce_window_count_separately() {
        let mut detector = StepDetector::default();

        assert!(detector.update(Duration::from_millis(1_000), stomp()).is_some());
        // Exactly the debounce interval apart counts as a second step.
        assert!(detector.update(Duration::from_millis(1_300), stomp()).is_some());
        assert!(detector.update(Duration::from_millis(1_700), stomp()).is_some());
    }

    #[test]
    fn reset_reopens_the_window() {
        let mut detector = StepDetector::default();
        assert!(detector.update(Duration::from_millis(1_000), stomp()).is_some());
        detector.reset();
        assert!(detector.update(Duration::from_millis(1_050), stomp()).is_some());
    }

    #[test]
    fn custom_threshold_is_honored() {
        let mut detector = StepDetector::new(StepDetectorConfig {
            threshold_g: 1.2,
            debounce: Duration::from_millis(300),
        });
        let gentle = Vector3::new(0.1, 1.3, 0.2);
        assert!(detector.update(Duration::from_millis(0), gentle).is_some());
    }
}
