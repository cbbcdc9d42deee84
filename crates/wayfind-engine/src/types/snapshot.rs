use serde::{Deserialize, Serialize};
use wayfind_core::session::{Mode, NavigationStatus};
use wayfind_providers::{MotionSensorPlatform, SpeechSynthesizer};

use crate::NavigationEngine;

/// Immutable view of the session exposed to the presentation layer,
/// rebuilt after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub step_count: u32,
    pub max_steps: u32,
    /// Map-space `[x, y]`, absent until a session has started.
    pub current_position: Option<[f64; 2]>,
    pub heading_degrees: f64,
    pub progress_percentage: f64,
    pub remaining_distance_meters: f64,
    pub mode: Mode,
    pub status: NavigationStatus,
    pub sensors_available: bool,
}

impl SessionSnapshot {
    pub fn from_engine<P: MotionSensorPlatform, S: SpeechSynthesizer>(
        engine: &NavigationEngine<P, S>,
    ) -> Self {
        Self {
            step_count: engine.step_count(),
            max_steps: engine.max_steps(),
            current_position: engine.current_position().map(|point| [point.x, point.y]),
            heading_degrees: engine.heading_degrees(),
            progress_percentage: engine.progress_percentage(),
            remaining_distance_meters: engine.remaining_distance_meters(),
            mode: engine.mode(),
            status: engine.status(),
            sensors_available: engine.sensors_available(),
        }
    }
}
