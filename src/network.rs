use crate::error::{SimError, SimResult};
use crate::lane::Lane;
use crate::vehicle::{LaneChangeDirection, Vehicle, VehicleId};

/// A straight road made of parallel lanes of equal length.
///
/// Lane 0 is the rightmost (slowest) lane. Every vehicle belongs to exactly one lane.
#[derive(Clone, Debug)]
pub struct RoadNetwork {
    /// The lanes, ordered right to left.
    lanes: Vec<Lane>,
    /// The length of the road in m.
    length: f64,
    /// The width of each lane in m.
    lane_width: f64,
}

impl Default for RoadNetwork {
    fn default() -> Self {
        Self::empty()
    }
}

impl RoadNetwork {
    /// The default lane width in m.
    pub const DEFAULT_LANE_WIDTH: f64 = 3.5;

    /// Creates a road with `num_lanes` empty lanes.
    pub fn new(num_lanes: usize, length: f64, lane_width: f64) -> Self {
        Self {
            lanes: (0..num_lanes)
                .map(|id| Lane::new(id, length, lane_width))
                .collect(),
            length,
            lane_width,
        }
    }

    /// Creates a road with no lanes.
    pub fn empty() -> Self {
        Self::new(0, 0.0, Self::DEFAULT_LANE_WIDTH)
    }

    /// Gets the length of the road in m.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Gets the width of each lane in m.
    pub fn lane_width(&self) -> f64 {
        self.lane_width
    }

    /// The lanes, ordered right to left.
    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    /// The number of lanes.
    pub fn num_lanes(&self) -> usize {
        self.lanes.len()
    }

    /// Gets a reference to the lane with the given index.
    pub fn lane(&self, lane_id: usize) -> Option<&Lane> {
        self.lanes.get(lane_id)
    }

    pub(crate) fn lanes_mut(&mut self) -> &mut [Lane] {
        &mut self.lanes
    }

    /// Gets the lane next to `lane_id` on the given side, if there is one.
    pub fn adjacent(&self, lane_id: usize, direction: LaneChangeDirection) -> Option<&Lane> {
        direction.apply(lane_id).and_then(|id| self.lanes.get(id))
    }

    /// Returns an iterator over all the vehicles on the road.
    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.lanes.iter().flat_map(|lane| lane.vehicles())
    }

    /// The number of vehicles on the road.
    pub fn vehicle_count(&self) -> usize {
        self.lanes.iter().map(Lane::len).sum()
    }

    /// Gets a reference to the vehicle with the given ID.
    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.lanes.iter().find_map(|lane| lane.get(id))
    }

    /// Gets the leader and follower of a vehicle within its lane.
    /// Returns `None` if the vehicle is not in the given lane.
    pub fn neighbors(
        &self,
        lane_id: usize,
        id: VehicleId,
    ) -> Option<(Option<&Vehicle>, Option<&Vehicle>)> {
        self.lanes.get(lane_id).and_then(|lane| lane.neighbors(id))
    }

    /// Gets the vehicles which would lead and follow a vehicle
    /// placed at `pos` in the given lane.
    pub fn neighbors_at(&self, lane_id: usize, pos: f64) -> (Option<&Vehicle>, Option<&Vehicle>) {
        match self.lanes.get(lane_id) {
            Some(lane) => (lane.leader_at(pos), lane.follower_at(pos)),
            None => (None, None),
        }
    }

    /// Checks that a lane index is within the road.
    pub(crate) fn check_lane(&self, lane_id: usize) -> SimResult<()> {
        if lane_id < self.lanes.len() {
            Ok(())
        } else {
            Err(SimError::LaneOutOfRange {
                lane_id,
                lane_count: self.lanes.len(),
            })
        }
    }

    /// Inserts a vehicle into the lane it says it's in.
    pub(crate) fn insert(&mut self, vehicle: Vehicle) -> SimResult<()> {
        self.check_lane(vehicle.lane_id())?;
        self.lanes[vehicle.lane_id()].insert_vehicle(vehicle);
        Ok(())
    }

    /// Removes the vehicle with the given ID from the road.
    pub(crate) fn remove(&mut self, id: VehicleId) -> Option<Vehicle> {
        self.lanes
            .iter_mut()
            .find_map(|lane| lane.remove_vehicle(id))
    }

    /// Moves a vehicle from one lane to another, keeping its position.
    pub(crate) fn move_vehicle(&mut self, id: VehicleId, from: usize, to: usize) -> SimResult<()> {
        self.rehome(id, from, to, |vehicle| vehicle.set_lane_id(to))
    }

    /// Moves a vehicle into the adjacent lane and starts its lane change transition.
    pub(crate) fn change_lane(
        &mut self,
        id: VehicleId,
        from: usize,
        direction: LaneChangeDirection,
    ) -> SimResult<usize> {
        let to = direction.apply(from).ok_or(SimError::LaneOutOfRange {
            lane_id: from,
            lane_count: self.lanes.len(),
        })?;
        let lane_width = self.lane_width;
        self.rehome(id, from, to, |vehicle| {
            vehicle.begin_lane_change(direction, to, lane_width)
        })?;
        Ok(to)
    }

    /// Takes a vehicle out of lane `from`, updates it, then inserts it into lane `to`.
    /// Nothing changes unless both lanes exist and the vehicle is in `from`.
    fn rehome(
        &mut self,
        id: VehicleId,
        from: usize,
        to: usize,
        update: impl FnOnce(&mut Vehicle),
    ) -> SimResult<()> {
        self.check_lane(from)?;
        self.check_lane(to)?;
        let mut vehicle = self.lanes[from]
            .remove_vehicle(id)
            .ok_or(SimError::VehicleNotFound(id))?;
        update(&mut vehicle);
        self.lanes[to].insert_vehicle(vehicle);
        Ok(())
    }

    /// Restores the position ordering of every lane, returning the number of vehicles held back.
    pub(crate) fn resort(&mut self) -> usize {
        self.lanes.iter_mut().map(Lane::resort).sum()
    }

    /// Removes every vehicle from the road, keeping the lanes.
    pub(crate) fn clear_vehicles(&mut self) {
        for lane in &mut self.lanes {
            lane.clear();
        }
    }

    /// Checks the structural invariants of the road, describing the first violation found.
    pub(crate) fn check_consistency(&self) -> Result<(), String> {
        for lane in &self.lanes {
            if !lane.is_sorted() {
                return Err(format!("lane {} is out of order", lane.id()));
            }
            for vehicle in lane.vehicles() {
                if vehicle.lane_id() != lane.id() {
                    return Err(format!(
                        "vehicle {} in lane {} believes it is in lane {}",
                        vehicle.id(),
                        lane.id(),
                        vehicle.lane_id()
                    ));
                }
                if !vehicle.is_finite() {
                    return Err(format!("vehicle {} has a non-finite state", vehicle.id()));
                }
            }
        }
        Ok(())
    }
}
