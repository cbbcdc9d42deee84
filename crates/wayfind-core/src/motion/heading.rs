use log::debug;
use nalgebra::Vector3;

/// Device-orientation correction applied to raw magnetic bearings.
#[derive(Debug, Clone, Copy)]
pub struct HeadingConfig {
    /// Offset in degrees for how the device is held. The default assumes
    /// portrait with the top edge forward.
    pub orientation_offset_deg: f64,
}

impl Default for HeadingConfig {
    fn default() -> Self {
        Self {
            orientation_offset_deg: -90.0,
        }
    }
}

/// Converts magnetic-field vectors (µT, device coordinates) into compass
/// bearings in `[0, 360)` degrees.
#[derive(Debug, Clone)]
pub struct HeadingEstimator {
    config: HeadingConfig,
    last_heading: Option<f64>,
}

impl HeadingEstimator {
    pub fn new(config: HeadingConfig) -> Self {
        Self {
            config,
            last_heading: None,
        }
    }

    /// Ingests a magnetometer sample and returns the corrected bearing.
    pub fn update(&mut self, field_ut: Vector3<f64>) -> f64 {
        let mut angle = field_ut.y.atan2(field_ut.x).to_degrees();
        if angle < 0.0 {
            angle += 360.0;
        }
        let heading = (angle + self.config.orientation_offset_deg).rem_euclid(360.0);
        debug!(target: "wayfind_core::motion",
            "Heading {:.1}° (raw {:.1}°, offset {:.1}°)",
            heading, angle, self.config.orientation_offset_deg
        );
        self.last_heading = Some(heading);
        heading
    }

    pub fn last_heading(&self) -> Option<f64> {
        self.last_heading
    }
}

impl Default for HeadingEstimator {
    fn default() -> Self {
        Self::new(HeadingConfig::default())
    }
}

/// Normalizes an arbitrary bearing into `[0, 360)`, used for the manual
/// heading override in degraded mode.
pub fn normalize_bearing(degrees: f64) -> f64 {
    degrees.rem_euclid(360.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cardinal_directions_with_portrait_offset() {
        let mut estimator = HeadingEstimator::default();

        // Field along device +x: raw bearing 0°, portrait-corrected 270°.
        assert_relative_eq!(estimator.update(Vector3::new(30.0, 0.0, -10.0)), 270.0);
        // Field along device +y: raw 90°, corrected 0°.
        assert_relative_eq!(estimator.update(Vector3::new(0.0, 30.0, -10.0)), 0.0);
        // Field along -x: raw 180°, corrected 90°.
        assert_relative_eq!(estimator.update(Vector3::new(-30.0, 0.0, -10.0)), 90.0);
        // Field along -y: raw 270°, corrected 180°.
        assert_relative_eq!(estimator.update(Vector3::new(0.0, -30.0, -10.0)), 180.0);
    }

    #[test]
    fn bearings_always_land_in_range() {
        let mut estimator = HeadingEstimator::new(HeadingConfig {
            orientation_offset_deg: -450.0,
        });
        for k in 0..36 {
            let phase = f64::from(k) * 10.0_f64.to_radians();
            let heading = estimator.update(Vector3::new(phase.cos(), phase.sin(), 0.0));
            assert!((0.0..360.0).contains(&heading), "heading {heading}");
        }
    }

    #[test]
    fn remembers_the_last_bearing() {
        let mut estimator = HeadingEstimator::default();
        assert!(estimator.last_heading().is_none());
        estimator.update(Vector3::new(0.0, 30.0, 0.0));
        assert_eq!(estimator.last_heading(), Some(0.0));
    }
}
