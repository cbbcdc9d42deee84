use log::debug;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-step distance assumed for destinations that publish only a step
/// count. Kept configurable at the call site; the measured
/// `total_distance_meters / max_steps` ratio is authoritative whenever a
/// destination carries a surveyed distance.
pub const DEFAULT_STRIDE_METERS: f64 = 0.75;

/// Waypoint in normalized map space (0–100 per axis).
pub type Waypoint = Point2<f64>;

#[derive(Debug, Error)]
pub enum PathError {
    #[error("path '{id}' needs at least 2 waypoints, got {count}")]
    TooFewWaypoints { id: String, count: usize },
    #[error("path '{id}' declares max_steps = 0")]
    InvalidMaxSteps { id: String },
    #[error("path '{id}' declares a non-positive total distance ({meters} m)")]
    InvalidDistance { id: String, meters: f64 },
    #[error("path '{id}' has no branch named '{branch}'")]
    UnknownBranch { id: String, branch: String },
    #[error("malformed waypoint token '{token}' at position {index}")]
    MalformedWaypoint { index: usize, token: String },
}

/// A concrete walking path as supplied by the destination directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathRecord {
    pub id: String,
    pub title: String,
    pub waypoints: Vec<Waypoint>,
    pub max_steps: u32,
    pub total_distance_meters: f64,
    pub start_point: Waypoint,
    pub target_point: Waypoint,
    pub voice_guidance: String,
    /// Initial compass bearing of the path, when the directory provides one.
    /// Lets an embedder orient its map before the first heading sample.
    #[serde(default)]
    pub initial_bearing_deg: Option<f64>,
}

impl PathRecord {
    /// Distance estimate for destinations that publish only a step count.
    pub fn estimate_distance(max_steps: u32, stride_meters: f64) -> f64 {
        f64::from(max_steps) * stride_meters
    }

    fn validate(&self) -> Result<(), PathError> {
        if self.waypoints.len() < 2 {
            return Err(PathError::TooFewWaypoints {
                id: self.id.clone(),
                count: self.waypoints.len(),
            });
        }
        if self.max_steps == 0 {
            return Err(PathError::InvalidMaxSteps {
                id: self.id.clone(),
            });
        }
        if !self.total_distance_meters.is_finite() || self.total_distance_meters <= 0.0 {
            return Err(PathError::InvalidDistance {
                id: self.id.clone(),
                meters: self.total_distance_meters,
            });
        }
        Ok(())
    }
}

/// A named alternate route attached to a branching destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchAlternative {
    pub id: String,
    pub title: String,
    pub waypoints: Vec<Waypoint>,
    pub target_point: Waypoint,
}

/// Destination path, either a single route or a base route with named
/// alternatives. A branching definition must be resolved to a concrete
/// record before a session can start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PathDefinition {
    Simple(PathRecord),
    Branching {
        base: PathRecord,
        alternatives: Vec<BranchAlternative>,
    },
}

impl PathDefinition {
    pub fn record(&self) -> &PathRecord {
        match self {
            PathDefinition::Simple(record) => record,
            PathDefinition::Branching { base, .. } => base,
        }
    }

    /// Resolves to the concrete record that will drive the session.
    /// `branch_id = None` selects the base route.
    pub fn resolve(&self, branch_id: Option<&str>) -> Result<PathRecord, PathError> {
        match (self, branch_id) {
            (PathDefinition::Simple(record), None) => Ok(record.clone()),
            (PathDefinition::Simple(record), Some(branch)) => Err(PathError::UnknownBranch {
                id: record.id.clone(),
                branch: branch.to_string(),
            }),
            (PathDefinition::Branching { base, .. }, None) => Ok(base.clone()),
            (PathDefinition::Branching { base, alternatives }, Some(branch)) => {
                let alt = alternatives.iter().find(|alt| alt.id == branch).ok_or_else(|| {
                    PathError::UnknownBranch {
                        id: base.id.clone(),
                        branch: branch.to_string(),
                    }
                })?;
                let mut record = base.clone();
                record.id = alt.id.clone();
                record.title = alt.title.clone();
                record.waypoints = alt.waypoints.clone();
                record.target_point = alt.target_point;
                Ok(record)
            }
        }
    }
}

/// Parses the directory's `"x,y x,y …"` waypoint encoding.
pub fn parse_waypoints(encoded: &str) -> Result<Vec<Waypoint>, PathError> {
    encoded
        .split_whitespace()
        .enumerate()
        .map(|(index, token)| {
            let malformed = || PathError::MalformedWaypoint {
                index,
                token: token.to_string(),
            };
            let (x, y) = token.split_once(',').ok_or_else(malformed)?;
            let x: f64 = x.trim().parse().map_err(|_| malformed())?;
            let y: f64 = y.trim().parse().map_err(|_| malformed())?;
            Ok(Point2::new(x, y))
        })
        .collect()
}

/// Immutable geometry of a validated walking path. Interpolation is pure
/// and safe to call from any number of readers.
#[derive(Debug, Clone)]
pub struct PathModel {
    record: PathRecord,
    segment_lengths: Vec<f64>,
    polyline_length: f64,
}

impl PathModel {
    pub fn new(record: PathRecord) -> Result<Self, PathError> {
        record.validate()?;
        let segment_lengths: Vec<f64> = record
            .waypoints
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).norm())
            .collect();
        let polyline_length = segment_lengths.iter().sum();
        debug!(target: "wayfind_core::path",
            "Path '{}': {} waypoints, polyline length {:.2} map units for {:.1} m over {} steps",
            record.id, record.waypoints.len(), polyline_length,
            record.total_distance_meters, record.max_steps
        );
        Ok(Self {
            record,
            segment_lengths,
            polyline_length,
        })
    }

    pub fn record(&self) -> &PathRecord {
        &self.record
    }

    pub fn max_steps(&self) -> u32 {
        self.record.max_steps
    }

    pub fn total_distance_meters(&self) -> f64 {
        self.record.total_distance_meters
    }

    /// Constant per-step distance derived from the surveyed path data.
    pub fn step_length_meters(&self) -> f64 {
        self.record.total_distance_meters / f64::from(self.record.max_steps)
    }

    /// Interpolated map-space position after walking `traveled_meters`.
    ///
    /// Traveled meters are mapped proportionally onto the polyline's arc
    /// length, so the result is continuous and piecewise-linear on
    /// `[0, total]`, clamps to the target past the end, and never
    /// extrapolates. Zero-length segments are skipped.
    pub fn position_at_distance(&self, traveled_meters: f64) -> Waypoint {
        if self.polyline_length <= 0.0 || !traveled_meters.is_finite() {
            return self.record.target_point;
        }
        if traveled_meters >= self.record.total_distance_meters {
            return self.record.target_point;
        }
        let fraction = (traveled_meters / self.record.total_distance_meters).clamp(0.0, 1.0);
        let mut remaining = fraction * self.polyline_length;

        for (pair, &length) in self.record.waypoints.windows(2).zip(&self.segment_lengths) {
            if length <= 0.0 {
                continue;
            }
            if remaining <= length {
                let ratio = remaining / length;
                return pair[0] + (pair[1] - pair[0]) * ratio;
            }
            remaining -= length;
        }

        self.record.target_point
    }

    /// Position after `step_count` accepted steps.
    pub fn position_at_step(&self, step_count: u32) -> Waypoint {
        let steps = step_count.min(self.record.max_steps);
        if steps == self.record.max_steps {
            return self.record.target_point;
        }
        self.position_at_distance(f64::from(steps) * self.step_length_meters())
    }
}
