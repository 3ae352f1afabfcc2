//! An immutable, self-contained view of the simulation for external consumers.

use crate::driver::DriverType;
use crate::lane::Lane;
use crate::math::Point2d;
use crate::settings::Settings;
use crate::simulation::SimulationState;
use crate::stats::Statistics;
use crate::vehicle::{LaneChangeDirection, Vehicle, VehicleId};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The state of the whole simulation after a completed step.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Snapshot {
    pub state: SimulationState,
    pub settings: Settings,
    pub stats: Statistics,
    pub lanes: Vec<LaneInfo>,
    pub vehicles: Vec<VehicleInfo>,
    /// Diagnostics from the last step, present in debug mode.
    pub debug: Option<serde_json::Value>,
}

/// Lane metadata.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LaneInfo {
    pub id: usize,
    /// The length in m.
    pub length: f64,
    /// The width in m.
    pub width: f64,
    /// The lateral position of the centre line in m.
    pub y: f64,
    pub vehicle_count: usize,
    /// Vehicles/km.
    pub density: f64,
    /// m/s.
    pub average_speed: f64,
}

/// The state of one vehicle.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VehicleInfo {
    pub id: VehicleId,
    /// The longitudinal position of the vehicle's centre in m.
    pub x: f64,
    /// The lateral position of the vehicle's centre in m, easing between lanes mid change.
    pub y: f64,
    pub velocity: f64,
    pub acceleration: f64,
    pub lane_id: usize,
    pub length: f64,
    pub width: f64,
    pub driver_type: DriverType,
    pub crashed: bool,
    pub is_changing_lane: bool,
    pub lane_change_direction: Option<LaneChangeDirection>,
    /// The fraction of the lane change completed, zero when not changing lanes.
    pub lane_change_progress: f64,
}

impl LaneInfo {
    pub(crate) fn new(lane: &Lane) -> Self {
        Self {
            id: lane.id(),
            length: lane.length(),
            width: lane.width(),
            y: lane.centre_y(),
            vehicle_count: lane.len(),
            density: lane.density(),
            average_speed: lane.average_speed(),
        }
    }
}

impl VehicleInfo {
    pub(crate) fn new(vehicle: &Vehicle, lane: &Lane) -> Self {
        let lane_change = vehicle.lane_change();
        let world = Point2d::new(vehicle.pos_mid(), lane.centre_y() + vehicle.lateral_offset());
        Self {
            id: vehicle.id(),
            x: world.x,
            y: world.y,
            velocity: vehicle.vel(),
            acceleration: vehicle.acc(),
            lane_id: vehicle.lane_id(),
            length: vehicle.length(),
            width: vehicle.width(),
            driver_type: vehicle.driver_type(),
            crashed: vehicle.crashed(),
            is_changing_lane: lane_change.is_some(),
            lane_change_direction: lane_change.map(|lc| lc.direction),
            lane_change_progress: lane_change.map_or(0.0, |lc| lc.progress()),
        }
    }

    /// The position of the vehicle's centre on the road plane.
    pub fn position(&self) -> Point2d {
        Point2d::new(self.x, self.y)
    }
}

impl Snapshot {
    /// Finds the vehicle with the given ID.
    pub fn vehicle(&self, id: VehicleId) -> Option<&VehicleInfo> {
        self.vehicles.iter().find(|v| v.id == id)
    }
}
