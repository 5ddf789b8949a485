use chrono::{DateTime, Utc};
use sgp4::{Constants, Elements};
use thiserror::Error;

use crate::catalog::Satellite;

/// Per-sample propagation failure (decayed orbit, timestamp out of model
/// range). Recoverable: callers skip the sample or pair, never abort the
/// whole run.
#[derive(Debug, Error)]
pub enum PropagationError {
    #[error("invalid elements: {0}")]
    Elements(String),
    #[error("epoch conversion failed: {0}")]
    Epoch(String),
    #[error("propagation failed: {0}")]
    Model(String),
}

/// Inertial-frame (TEME) state at a timestamp. Always recomputed from the
/// owning TLE, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    pub timestamp: DateTime<Utc>,
    pub position_km: [f64; 3],
    pub velocity_km_s: [f64; 3],
}

impl StateVector {
    pub fn separation_km(&self, other: &StateVector) -> f64 {
        norm(sub(self.position_km, other.position_km))
    }

    pub fn relative_velocity_km_s(&self, other: &StateVector) -> f64 {
        norm(sub(self.velocity_km_s, other.velocity_km_s))
    }
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn norm(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

/// Parsed elements plus SGP4 constants for one satellite, so the pair loop
/// does not reparse the TLE on every sample. Read-only after construction
/// and safe to share across workers.
pub struct PropagationContext {
    pub name: String,
    elements: Elements,
    constants: Constants,
}

impl PropagationContext {
    pub fn from_satellite(satellite: &Satellite) -> Result<Self, PropagationError> {
        let elements = sgp4::Elements::from_tle(
            Some(satellite.name.clone()),
            satellite.tle.line1().as_bytes(),
            satellite.tle.line2().as_bytes(),
        )
        .map_err(|e| PropagationError::Elements(e.to_string()))?;
        let constants = Constants::from_elements(&elements)
            .map_err(|e| PropagationError::Elements(e.to_string()))?;

        Ok(Self {
            name: satellite.name.clone(),
            elements,
            constants,
        })
    }

    /// Pure function of (elements, timestamp): identical inputs yield
    /// identical state vectors.
    pub fn propagate(&self, timestamp: DateTime<Utc>) -> Result<StateVector, PropagationError> {
        let minutes = self
            .elements
            .datetime_to_minutes_since_epoch(&timestamp.naive_utc())
            .map_err(|e| PropagationError::Epoch(e.to_string()))?;

        let prediction = self
            .constants
            .propagate(minutes)
            .map_err(|e| PropagationError::Model(e.to_string()))?;

        Ok(StateVector {
            timestamp,
            position_km: prediction.position,
            velocity_km_s: prediction.velocity,
        })
    }
}
