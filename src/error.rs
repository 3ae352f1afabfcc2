//! The simulation error type.

use crate::simulation::SimulationState;
use crate::vehicle::VehicleId;
use thiserror::Error;

/// An error returned by a simulation command.
///
/// Validation and state errors leave the engine unchanged. Physics edge cases
/// (a missing leader, a non-positive gap) are never reported here.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("lane {lane_id} does not exist (the road has {lane_count} lanes)")]
    LaneOutOfRange { lane_id: usize, lane_count: usize },

    #[error("position {position} m is outside the road (length {length} m)")]
    PositionOutOfRange { position: f64, length: f64 },

    #[error("placement at {position} m in lane {lane_id} overlaps vehicle {other}")]
    PlacementConflict {
        lane_id: usize,
        position: f64,
        other: VehicleId,
    },

    #[error("unknown driver type {0:?}")]
    UnknownDriverType(String),

    #[error("invalid value {value} for setting `{name}`")]
    InvalidSetting { name: &'static str, value: f64 },

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("vehicle {0} not found")]
    VehicleNotFound(VehicleId),

    #[error("cannot {command} while {state}")]
    InvalidTransition {
        command: &'static str,
        state: SimulationState,
    },

    #[error("tick discarded: {0}")]
    Inconsistent(String),
}

/// Shorthand result type for simulation commands.
pub type SimResult<T> = Result<T, SimError>;
