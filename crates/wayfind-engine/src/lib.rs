pub mod guidance;
pub mod types;

use std::time::Duration;

use log::{debug, info};
use thiserror::Error;
use wayfind_core::motion::{
    normalize_bearing, HeadingConfig, HeadingEstimator, StepDetector, StepDetectorConfig,
};
use wayfind_core::path::{PathDefinition, PathError, PathModel, Waypoint};
use wayfind_core::session::{CommandError, Mode, NavigationStatus};
use wayfind_providers::{
    AccelerometerSample, MagnetometerSample, MotionSensorPlatform, SensorSubscription,
    SpeechSynthesizer, DEFAULT_SAMPLE_INTERVAL,
};

use guidance::{GuidanceEmitter, GuidanceEvent};
pub use types::SessionSnapshot;

/// Tunable parameters grouped into a configuration structure.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub step_detector: StepDetectorConfig,
    pub heading: HeadingConfig,
    /// A distance-covered announcement fires every this many accepted
    /// steps; 0 disables milestone announcements.
    pub milestone_interval_steps: u32,
    pub sample_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            step_detector: StepDetectorConfig::default(),
            heading: HeadingConfig::default(),
            milestone_interval_steps: 20,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }
}

/// Errors starting a session. Path validation failures surface here
/// before any session state is created.
#[derive(Debug, Error)]
pub enum StartError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Single logical owner of one navigation session.
///
/// Every mutation — sensor samples, commands, arrival — goes through
/// `&mut self`, so events apply strictly in the order the embedder
/// delivers them and the engine needs no locking of its own. Platform
/// sensor callbacks must be funneled onto one call path before they
/// reach the ingest methods.
pub struct NavigationEngine<P: MotionSensorPlatform, S: SpeechSynthesizer> {
    config: EngineConfig,
    platform: P,
    guidance: GuidanceEmitter<S>,
    step_detector: StepDetector,
    heading_estimator: HeadingEstimator,
    path: Option<PathModel>,
    status: NavigationStatus,
    mode: Mode,
    step_count: u32,
    heading_degrees: f64,
    current_position: Option<Waypoint>,
    sensors_available: bool,
    heading_available: bool,
    subscriptions: Vec<SensorSubscription>,
    arrival_announced: bool,
}

impl<P: MotionSensorPlatform, S: SpeechSynthesizer> NavigationEngine<P, S> {
    pub fn new(platform: P, speech: S) -> Self {
        Self::with_config(EngineConfig::default(), platform, speech)
    }

    pub fn with_config(config: EngineConfig, platform: P, speech: S) -> Self {
        let step_detector = StepDetector::new(config.step_detector);
        let heading_estimator = HeadingEstimator::new(config.heading);
        Self {
            config,
            platform,
            guidance: GuidanceEmitter::new(speech),
            step_detector,
            heading_estimator,
            path: None,
            status: NavigationStatus::Idle,
            mode: Mode::Auto,
            step_count: 0,
            heading_degrees: 0.0,
            current_position: None,
            sensors_available: false,
            heading_available: false,
            subscriptions: Vec::new(),
            arrival_announced: false,
        }
    }

    /// Starts navigating `definition`, optionally along one of its named
    /// branches. Validates the path and resolves the branch before any
    /// session state is touched; probes sensor capability once and
    /// registers listeners for whatever is present.
    pub fn start(
        &mut self,
        definition: &PathDefinition,
        branch: Option<&str>,
    ) -> Result<(), StartError> {
        let record = definition.resolve(branch)?;
        let model = PathModel::new(record)?;
        self.status = self.status.try_start()?;

        let accelerometer = self.platform.accelerometer_available();
        let magnetometer = self.platform.magnetometer_available();
        self.sensors_available = accelerometer && magnetometer;
        self.heading_available = magnetometer;

        if self.sensors_available {
            self.mode = Mode::Auto;
        } else {
            // Degraded mode: automatic step detection is off, so the
            // manual commands have to carry the session.
            info!(target: "wayfind_engine",
                "Motion sensors unavailable (accelerometer: {accelerometer}, magnetometer: {magnetometer}); starting in manual mode");
            self.mode = Mode::Manual;
        }

        if self.sensors_available {
            if let Some(sub) = self
                .platform
                .subscribe_accelerometer(self.config.sample_interval)
            {
                self.subscriptions.push(sub);
            }
        }
        if magnetometer {
            if let Some(sub) = self
                .platform
                .subscribe_magnetometer(self.config.sample_interval)
            {
                self.subscriptions.push(sub);
            }
        }

        self.step_count = 0;
        self.arrival_announced = false;
        self.step_detector = StepDetector::new(self.config.step_detector);
        self.heading_estimator = HeadingEstimator::new(self.config.heading);
        self.heading_degrees = model
            .record()
            .initial_bearing_deg
            .map(normalize_bearing)
            .unwrap_or(0.0);
        self.current_position = Some(model.position_at_step(0));

        info!(target: "wayfind_engine",
            "Session started on path '{}' ({} steps over {:.1} m)",
            model.record().id, model.max_steps(), model.total_distance_meters());
        self.guidance.announce(GuidanceEvent::SessionStarted {
            guidance_text: &model.record().voice_guidance,
        });

        self.path = Some(model);
        Ok(())
    }

    /// Ingests an accelerometer sample from the platform delivery path.
    /// Only feeds the step detector while navigating in auto mode with
    /// sensors present; everything else is filtered, not unsubscribed.
    pub fn ingest_accelerometer(&mut self, sample: AccelerometerSample) {
        if !self.status.accepts_steps() || !self.sensors_available {
            return;
        }
        if self.mode == Mode::Manual {
            debug!(target: "wayfind_engine", "Discarding sensor step candidate in manual mode");
            return;
        }
        if let Some(step) = self
            .step_detector
            .update(sample.timestamp.as_duration(), sample.vector)
        {
            debug!(target: "wayfind_engine",
                "Sensor step at {:?} ({:.2} g)", step.timestamp, step.magnitude_g);
            self.apply_step();
        }
    }

    /// Ingests a magnetometer sample. Heading does not affect progress,
    /// so it keeps updating while paused and freezes only in terminal
    /// states.
    pub fn ingest_magnetometer(&mut self, sample: MagnetometerSample) {
        if !self.status.accepts_heading() {
            return;
        }
        self.heading_degrees = self.heading_estimator.update(sample.vector);
    }

    /// Manual step command. Only legal in manual mode; ignored without
    /// error once paused or terminal.
    pub fn advance_step(&mut self) -> Result<(), CommandError> {
        match self.status {
            NavigationStatus::Idle => Err(CommandError::InvalidTransition {
                command: "advance_step",
                status: NavigationStatus::Idle,
            }),
            NavigationStatus::Paused
            | NavigationStatus::Arrived
            | NavigationStatus::Stopped => {
                debug!(target: "wayfind_engine",
                    "Dropping advance_step while {:?}", self.status);
                Ok(())
            }
            NavigationStatus::Navigating => {
                if self.mode == Mode::Auto {
                    return Err(CommandError::StepCommandInAutoMode);
                }
                self.apply_step();
                Ok(())
            }
        }
    }

    pub fn pause(&mut self) -> Result<(), CommandError> {
        self.status = self.status.try_pause()?;
        info!(target: "wayfind_engine", "Session paused at step {}", self.step_count);
        self.guidance.announce(GuidanceEvent::Paused);
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), CommandError> {
        self.status = self.status.try_resume()?;
        info!(target: "wayfind_engine", "Session resumed at step {}", self.step_count);
        self.guidance.announce(GuidanceEvent::Resumed);
        Ok(())
    }

    /// Stops the session and releases every sensor subscription. From a
    /// terminal state the status and transcript stay untouched, but
    /// teardown still runs so listeners never outlive an arrived session.
    pub fn stop(&mut self) -> Result<(), CommandError> {
        let next = self.status.try_stop()?;
        if next == self.status {
            debug!(target: "wayfind_engine", "Ignoring repeated stop while {:?}", self.status);
            self.guidance.cancel();
        } else {
            self.status = next;
            info!(target: "wayfind_engine", "Session stopped at step {}", self.step_count);
            self.guidance.announce(GuidanceEvent::Stopped);
        }
        self.release_subscriptions();
        Ok(())
    }

    /// Switches the step source. Takes effect immediately and never
    /// resets the step count. Auto is refused while the session runs
    /// without motion sensors, since nothing could advance it.
    pub fn switch_mode(&mut self, mode: Mode) -> Result<(), CommandError> {
        if self.status.is_terminal() {
            debug!(target: "wayfind_engine", "Ignoring mode switch while {:?}", self.status);
            return Ok(());
        }
        if self.mode == mode {
            return Ok(());
        }
        if mode == Mode::Auto
            && self.status != NavigationStatus::Idle
            && !self.sensors_available
        {
            return Err(CommandError::AutoModeUnavailable);
        }
        self.mode = mode;
        info!(target: "wayfind_engine", "Mode switched to {:?} at step {}", mode, self.step_count);
        self.guidance.announce(GuidanceEvent::ModeChanged(mode));
        Ok(())
    }

    /// Sets the heading by hand. Only available in degraded mode, where
    /// no magnetometer was found at start.
    pub fn set_heading_override(&mut self, degrees: f64) -> Result<(), CommandError> {
        if self.status == NavigationStatus::Idle {
            return Err(CommandError::InvalidTransition {
                command: "set_heading_override",
                status: NavigationStatus::Idle,
            });
        }
        if self.heading_available {
            return Err(CommandError::HeadingOverrideUnavailable);
        }
        if self.status.is_terminal() {
            return Ok(());
        }
        self.heading_degrees = normalize_bearing(degrees);
        Ok(())
    }

    /// Immutable view of the session for the presentation layer.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::from_engine(self)
    }

    pub fn status(&self) -> NavigationStatus {
        self.status
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    pub fn max_steps(&self) -> u32 {
        self.path.as_ref().map(PathModel::max_steps).unwrap_or(0)
    }

    pub fn heading_degrees(&self) -> f64 {
        self.heading_degrees
    }

    pub fn current_position(&self) -> Option<Waypoint> {
        self.current_position
    }

    pub fn sensors_available(&self) -> bool {
        self.sensors_available
    }

    pub fn progress_percentage(&self) -> f64 {
        match &self.path {
            Some(model) => {
                (f64::from(self.step_count) / f64::from(model.max_steps()) * 100.0)
                    .clamp(0.0, 100.0)
            }
            None => 0.0,
        }
    }

    pub fn remaining_distance_meters(&self) -> f64 {
        match &self.path {
            Some(model) => (model.total_distance_meters()
                - f64::from(self.step_count) * model.step_length_meters())
            .max(0.0),
            None => 0.0,
        }
    }

    /// Number of live sensor subscriptions, for teardown verification.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    fn apply_step(&mut self) {
        let Some(model) = &self.path else {
            return;
        };
        if self.step_count >= model.max_steps() {
            return;
        }
        self.step_count += 1;
        self.current_position = Some(model.position_at_step(self.step_count));
        debug!(target: "wayfind_engine",
            "Step {}/{} ({:.1}%)",
            self.step_count, model.max_steps(), self.progress_percentage());

        if self.step_count == model.max_steps() {
            self.status = NavigationStatus::Arrived;
            if !self.arrival_announced {
                self.arrival_announced = true;
                let title = model.record().title.clone();
                info!(target: "wayfind_engine", "Arrived at '{title}'");
                self.guidance.announce(GuidanceEvent::Arrived { title: &title });
            }
            return;
        }

        let interval = self.config.milestone_interval_steps;
        if interval > 0 && self.step_count % interval == 0 {
            let meters_covered = f64::from(self.step_count)
                * self.path.as_ref().map(PathModel::step_length_meters).unwrap_or(0.0);
            self.guidance
                .announce(GuidanceEvent::Milestone { meters_covered });
        }
    }

    fn release_subscriptions(&mut self) {
        // Dropping each handle deregisters its listener exactly once;
        // a second pass over the emptied vec is a no-op.
        self.subscriptions.clear();
    }
}

impl<P: MotionSensorPlatform, S: SpeechSynthesizer> Drop for NavigationEngine<P, S> {
    fn drop(&mut self) {
        self.release_subscriptions();
        self.guidance.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;
    use wayfind_core::path::PathRecord;
    use wayfind_providers::{MockSensorPlatform, RecordingSpeech};

    fn straight_definition() -> PathDefinition {
        PathDefinition::Simple(PathRecord {
            id: "hall".to_string(),
            title: "Lecture Hall".to_string(),
            waypoints: vec![Point2::new(0.0, 0.0), Point2::new(0.0, 10.0)],
            max_steps: 10,
            total_distance_meters: 10.0,
            start_point: Point2::new(0.0, 0.0),
            target_point: Point2::new(0.0, 10.0),
            voice_guidance: "Walk straight ahead.".to_string(),
            initial_bearing_deg: None,
        })
    }

    fn engine_with(
        accelerometer: bool,
        magnetometer: bool,
    ) -> (
        NavigationEngine<MockSensorPlatform, RecordingSpeech>,
        MockSensorPlatform,
        RecordingSpeech,
    ) {
        let platform = MockSensorPlatform::new(accelerometer, magnetometer);
        let speech = RecordingSpeech::new();
        let engine = NavigationEngine::new(platform.clone(), speech.clone());
        (engine, platform, speech)
    }

    #[test]
    fn start_rejects_malformed_paths_without_creating_a_session() {
        let (mut engine, _, speech) = engine_with(true, true);
        let mut record = match straight_definition() {
            PathDefinition::Simple(record) => record,
            _ => unreachable!(),
        };
        record.max_steps = 0;

        let err = engine.start(&PathDefinition::Simple(record), None);
        assert!(matches!(err, Err(StartError::Path(_))));
        assert_eq!(engine.status(), NavigationStatus::Idle);
        assert!(speech.transcript().is_empty());
    }

    #[test]
    fn start_probes_capability_and_subscribes_once() {
        let (mut engine, platform, speech) = engine_with(true, true);
        engine.start(&straight_definition(), None).unwrap();

        assert!(engine.sensors_available());
        assert_eq!(platform.active_subscriptions(), 2);
        assert_eq!(speech.transcript(), vec!["Walk straight ahead."]);
    }

    #[test]
    fn degraded_start_forces_manual_mode() {
        let (mut engine, platform, _) = engine_with(false, false);
        engine.start(&straight_definition(), None).unwrap();

        assert!(!engine.sensors_available());
        assert_eq!(engine.mode(), Mode::Manual);
        assert_eq!(platform.active_subscriptions(), 0);

        // Heading override is the only heading source now.
        engine.set_heading_override(451.0).unwrap();
        assert_eq!(engine.heading_degrees(), 91.0);
    }

    #[test]
    fn heading_override_is_rejected_while_the_magnetometer_works() {
        let (mut engine, _, _) = engine_with(true, true);
        engine.start(&straight_definition(), None).unwrap();
        assert_eq!(
            engine.set_heading_override(10.0),
            Err(CommandError::HeadingOverrideUnavailable)
        );
    }

    #[test]
    fn missing_accelerometer_still_leaves_heading_flowing() {
        let (mut engine, platform, _) = engine_with(false, true);
        engine.start(&straight_definition(), None).unwrap();

        assert!(!engine.sensors_available());
        assert_eq!(engine.mode(), Mode::Manual);
        // Only the magnetometer listener is registered.
        assert_eq!(platform.active_subscriptions(), 1);
    }

    #[test]
    fn stop_releases_subscriptions_exactly_once() {
        let (mut engine, platform, _) = engine_with(true, true);
        engine.start(&straight_definition(), None).unwrap();
        assert_eq!(platform.active_subscriptions(), 2);

        engine.stop().unwrap();
        assert_eq!(platform.active_subscriptions(), 0);
        assert_eq!(engine.status(), NavigationStatus::Stopped);

        // Second stop is a quiet no-op.
        engine.stop().unwrap();
        assert_eq!(platform.active_subscriptions(), 0);
    }

    #[test]
    fn stop_after_arrival_still_releases_listeners() {
        let (mut engine, platform, speech) = engine_with(true, true);
        engine.start(&straight_definition(), None).unwrap();
        engine.switch_mode(Mode::Manual).unwrap();
        for _ in 0..10 {
            engine.advance_step().unwrap();
        }
        assert_eq!(engine.status(), NavigationStatus::Arrived);
        assert_eq!(platform.active_subscriptions(), 2);

        engine.stop().unwrap();
        assert_eq!(engine.status(), NavigationStatus::Arrived);
        assert_eq!(platform.active_subscriptions(), 0);
        // Arrival stays the last word; no stop announcement follows.
        assert!(!speech
            .transcript()
            .contains(&"Navigation stopped".to_string()));
    }

    #[test]
    fn drop_releases_subscriptions_for_unmount_teardown() {
        let platform = MockSensorPlatform::new(true, true);
        {
            let mut engine = NavigationEngine::new(platform.clone(), RecordingSpeech::new());
            engine.start(&straight_definition(), None).unwrap();
            assert_eq!(platform.active_subscriptions(), 2);
        }
        assert_eq!(platform.active_subscriptions(), 0);
    }

    #[test]
    fn repeated_start_stop_cycles_do_not_leak_listeners() {
        let platform = MockSensorPlatform::new(true, true);
        let speech = RecordingSpeech::new();
        for _ in 0..3 {
            let mut engine = NavigationEngine::new(platform.clone(), speech.clone());
            engine.start(&straight_definition(), None).unwrap();
            engine.stop().unwrap();
        }
        assert_eq!(platform.active_subscriptions(), 0);
    }

    #[test]
    fn commands_before_start_are_invalid_transitions() {
        let (mut engine, _, _) = engine_with(true, true);
        assert!(matches!(
            engine.resume(),
            Err(CommandError::InvalidTransition {
                command: "resume",
                ..
            })
        ));
        assert!(matches!(engine.pause(), Err(_)));
        assert!(matches!(engine.stop(), Err(_)));
        assert!(matches!(engine.advance_step(), Err(_)));
    }
}
