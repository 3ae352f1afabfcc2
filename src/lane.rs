use crate::util::Interval;
use crate::vehicle::{Vehicle, VehicleId};
use itertools::Itertools;
use smallvec::SmallVec;

/// A single lane of traffic, which owns the vehicles travelling in it.
///
/// Vehicles are kept ordered by ascending position, so a vehicle's leader
/// is the next vehicle in the list and its follower is the previous one.
#[derive(Clone, Debug)]
pub struct Lane {
    /// The lane index; 0 is the rightmost lane.
    id: usize,
    /// The length of the lane in m.
    length: f64,
    /// The width of the lane in m.
    width: f64,
    /// The vehicles in the lane, ordered by position.
    vehicles: Vec<Vehicle>,
}

impl Lane {
    /// Creates a new, empty lane.
    pub(crate) fn new(id: usize, length: f64, width: f64) -> Self {
        Self {
            id,
            length,
            width,
            vehicles: vec![],
        }
    }

    /// The lane index.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Gets the length of the lane in m.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Gets the width of the lane in m.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// The lateral position of the lane's centre line, in m from the centre of lane 0.
    pub fn centre_y(&self) -> f64 {
        self.id as f64 * self.width
    }

    /// The vehicles in the lane, ordered by ascending position.
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    /// The vehicles in the lane, mutably. Membership cannot change through this.
    pub(crate) fn vehicles_mut(&mut self) -> &mut [Vehicle] {
        &mut self.vehicles
    }

    /// The number of vehicles in the lane.
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    /// Whether the lane has no vehicles.
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// Gets the index of the vehicle with the given ID.
    pub fn index_of(&self, id: VehicleId) -> Option<usize> {
        self.vehicles.iter().position(|v| v.id() == id)
    }

    /// Gets the vehicle with the given ID.
    pub fn get(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.id() == id)
    }

    /// Gets the leader and follower of the vehicle at `idx`.
    pub fn neighbors_at(&self, idx: usize) -> (Option<&Vehicle>, Option<&Vehicle>) {
        let leader = self.vehicles.get(idx + 1);
        let follower = idx.checked_sub(1).and_then(|i| self.vehicles.get(i));
        (leader, follower)
    }

    /// Gets the leader and follower of the vehicle with the given ID,
    /// or `None` if it's not in this lane.
    pub fn neighbors(&self, id: VehicleId) -> Option<(Option<&Vehicle>, Option<&Vehicle>)> {
        self.index_of(id).map(|idx| self.neighbors_at(idx))
    }

    /// Gets the nearest vehicle strictly ahead of `pos`.
    pub fn leader_at(&self, pos: f64) -> Option<&Vehicle> {
        let idx = self.vehicles.partition_point(|v| v.pos_mid() <= pos);
        self.vehicles.get(idx)
    }

    /// Gets the nearest vehicle at or behind `pos`.
    pub fn follower_at(&self, pos: f64) -> Option<&Vehicle> {
        let idx = self.vehicles.partition_point(|v| v.pos_mid() <= pos);
        idx.checked_sub(1).and_then(|i| self.vehicles.get(i))
    }

    /// Finds a vehicle whose body overlaps the given longitudinal extent.
    pub fn overlapping(&self, extent: Interval<f64>) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.extent().overlaps(&extent))
    }

    /// Inserts a vehicle into the lane, keeping vehicles ordered by position.
    /// A vehicle level with another is placed ahead of it.
    pub(crate) fn insert_vehicle(&mut self, vehicle: Vehicle) {
        let veh_pos = vehicle.pos_mid();
        let idx = self.vehicles.partition_point(|v| v.pos_mid() <= veh_pos);
        self.vehicles.insert(idx, vehicle);
    }

    /// Removes the vehicle with the given ID from the lane.
    pub(crate) fn remove_vehicle(&mut self, id: VehicleId) -> Option<Vehicle> {
        self.vehicles
            .iter()
            .rposition(|v| v.id() == id)
            .map(|idx| self.vehicles.remove(idx))
    }

    /// Removes every vehicle which satisfies the predicate, returning them.
    pub(crate) fn drain_where(&mut self, mut pred: impl FnMut(&Vehicle) -> bool) -> Vec<Vehicle> {
        let mut removed = vec![];
        let mut idx = 0;
        while idx < self.vehicles.len() {
            if pred(&self.vehicles[idx]) {
                removed.push(self.vehicles.remove(idx));
            } else {
                idx += 1;
            }
        }
        removed
    }

    /// Removes all the vehicles.
    pub(crate) fn clear(&mut self) {
        self.vehicles.clear();
    }

    /// Restores the ordering of vehicles by position after they have moved.
    ///
    /// Vehicles never overtake within a lane, so one which ends a step ahead of
    /// its leader has driven through it. It's held level with the leader and keeps
    /// its place in the list, where the overlap is found as a collision.
    /// Returns the number of vehicles held back.
    pub(crate) fn resort(&mut self) -> usize {
        let mut held = 0;
        let mut limit = f64::INFINITY;
        for vehicle in self.vehicles.iter_mut().rev() {
            if vehicle.pos_mid() > limit {
                vehicle.hold_at(limit);
                held += 1;
            }
            limit = vehicle.pos_mid();
        }
        held
    }

    /// Whether the vehicles are ordered by position.
    pub fn is_sorted(&self) -> bool {
        self.vehicles
            .iter()
            .map(Vehicle::pos_mid)
            .tuple_windows()
            .all(|(rear, front)| rear <= front)
    }

    /// Finds every pair of vehicles whose bodies overlap and marks them as crashed.
    /// Returns the pairs (follower, leader) which were not both crashed already.
    pub(crate) fn mark_collisions(&mut self) -> SmallVec<[(VehicleId, VehicleId); 4]> {
        // No vehicle further ahead than this can reach back over a front
        let reach = self
            .vehicles
            .iter()
            .map(Vehicle::half_length)
            .fold(0.0, f64::max);
        let mut pairs = SmallVec::<[(usize, usize); 4]>::new();
        for i in 0..self.vehicles.len() {
            let (extent, front) = (self.vehicles[i].extent(), self.vehicles[i].pos_front());
            for j in (i + 1)..self.vehicles.len() {
                let other = &self.vehicles[j];
                if other.pos_mid() - reach >= front {
                    break;
                }
                if other.extent().overlaps(&extent)
                    && !(self.vehicles[i].crashed() && other.crashed())
                {
                    pairs.push((i, j));
                }
            }
        }

        pairs
            .into_iter()
            .map(|(i, j)| {
                self.vehicles[i].crash();
                self.vehicles[j].crash();
                (self.vehicles[i].id(), self.vehicles[j].id())
            })
            .collect()
    }

    /// Calculates the traffic density in vehicles/km.
    pub fn density(&self) -> f64 {
        if self.length <= 0.0 {
            return 0.0;
        }
        1000.0 * self.vehicles.len() as f64 / self.length
    }

    /// Gets the average speed of the vehicles in the lane in m/s.
    pub fn average_speed(&self) -> f64 {
        if self.vehicles.is_empty() {
            return 0.0;
        }
        self.vehicles.iter().map(Vehicle::vel).sum::<f64>() / self.vehicles.len() as f64
    }

    /// Estimates the traffic flow in vehicles/h as density times average speed.
    pub fn flow(&self) -> f64 {
        self.density() * self.average_speed() * 3.6
    }
}
