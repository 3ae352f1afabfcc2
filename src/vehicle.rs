use self::acceleration::{limit_acc, AccelerationModel, Leader};
use crate::driver::{DriverParameters, DriverType};
use crate::math::CubicFn;
use crate::util::Interval;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

pub(crate) mod acceleration;
pub(crate) mod dynamics;
pub(crate) mod lane_change;

/// The time taken to move across to a new lane, in s.
pub const LANE_CHANGE_DURATION: f64 = 3.0; // s

/// Unique ID of a [Vehicle]. IDs are allocated in increasing order from zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct VehicleId(pub u64);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A simulated vehicle.
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// The vehicle's ID
    id: VehicleId,
    /// The type of the vehicle's driver.
    driver: DriverType,
    /// Half the vehicle's width in m.
    half_wid: f64,
    /// Half the vehicle's length in m.
    half_len: f64,
    /// The acceleration model
    model: AccelerationModel,
    /// The index of the lane the vehicle is in.
    lane_id: usize,
    /// The longitudinal position of the centre of the vehicle, in m.
    pos: f64,
    /// The velocity in m/s.
    vel: f64,
    /// The most recently computed acceleration in m/s<sup>2</sup>.
    acc: f64,
    /// Whether the vehicle has been in a collision.
    crashed: bool,
    /// The in-progress lane change, if there is one.
    lane_change: Option<LaneChange>,
}

/// The attributes of a simulated vehicle.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VehicleAttributes {
    /// The vehicle width in m.
    pub width: f64,
    /// The vehicle length in m.
    pub length: f64,
}

impl Default for VehicleAttributes {
    fn default() -> Self {
        Self {
            width: 2.0,
            length: 4.5,
        }
    }
}

/// The side a vehicle moves towards when changing lanes.
/// Lane 0 is the rightmost lane, so moving left increases the lane index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum LaneChangeDirection {
    Left,
    Right,
}

impl LaneChangeDirection {
    /// The index of the lane in this direction from `lane_id`, if it can exist.
    pub fn apply(self, lane_id: usize) -> Option<usize> {
        match self {
            LaneChangeDirection::Left => lane_id.checked_add(1),
            LaneChangeDirection::Right => lane_id.checked_sub(1),
        }
    }
}

/// Represents an in-progress lane change.
///
/// The vehicle already belongs to the new lane; the lane change only affects
/// where the vehicle is drawn across the road.
#[derive(Clone, Copy, Debug)]
pub struct LaneChange {
    /// The direction of the lane change.
    pub direction: LaneChangeDirection,
    /// The lane the vehicle left.
    pub from: usize,
    /// The time since the lane change began, in s.
    pub elapsed: f64,
    /// The vehicle's lateral offset from the new lane's centre line as a function of `elapsed`.
    pub offset: CubicFn,
}

impl LaneChange {
    /// The fraction of the lane change completed, in [0, 1].
    pub fn progress(&self) -> f64 {
        f64::min(self.elapsed / LANE_CHANGE_DURATION, 1.0)
    }
}

impl Vehicle {
    /// Creates a new vehicle.
    pub(crate) fn new(
        id: VehicleId,
        driver: DriverType,
        attributes: &VehicleAttributes,
        lane_id: usize,
        pos: f64,
    ) -> Self {
        Self {
            id,
            driver,
            half_wid: 0.5 * attributes.width,
            half_len: 0.5 * attributes.length,
            model: AccelerationModel::new(driver.params()),
            lane_id,
            pos,
            vel: 0.0,
            acc: 0.0,
            crashed: false,
            lane_change: None,
        }
    }

    /// Gets the vehicle's ID.
    pub fn id(&self) -> VehicleId {
        self.id
    }

    /// The type of the vehicle's driver.
    pub fn driver_type(&self) -> DriverType {
        self.driver
    }

    /// The parameters of the vehicle's driver.
    pub fn params(&self) -> &'static DriverParameters {
        self.model.params()
    }

    /// The vehicle's width in m.
    pub fn width(&self) -> f64 {
        2.0 * self.half_wid
    }

    /// The vehicle's length in m.
    pub fn length(&self) -> f64 {
        2.0 * self.half_len
    }

    /// Half the vehicle's length in m.
    pub fn half_length(&self) -> f64 {
        self.half_len
    }

    /// The index of the lane the vehicle is in.
    pub fn lane_id(&self) -> usize {
        self.lane_id
    }

    /// The longitudinal position of the centre of the vehicle in m.
    pub fn pos_mid(&self) -> f64 {
        self.pos
    }

    /// The longitudinal position of the rear of the vehicle in m.
    pub fn pos_rear(&self) -> f64 {
        self.pos - self.half_len
    }

    /// The longitudinal position of the front of the vehicle in m.
    pub fn pos_front(&self) -> f64 {
        self.pos + self.half_len
    }

    /// The longitudinal extent of the vehicle's body.
    pub fn extent(&self) -> Interval<f64> {
        Interval::disc(self.pos, self.half_len)
    }

    /// The vehicle's velocity in m/s.
    pub fn vel(&self) -> f64 {
        self.vel
    }

    /// The vehicle's most recently computed acceleration in m/s<sup>2</sup>.
    pub fn acc(&self) -> f64 {
        self.acc
    }

    /// Whether the vehicle has crashed. A crashed vehicle stays where it is,
    /// though a lane change already under way still eases to the lane centre.
    pub fn crashed(&self) -> bool {
        self.crashed
    }

    /// The in-progress lane change, if there is one.
    pub fn lane_change(&self) -> Option<&LaneChange> {
        self.lane_change.as_ref()
    }

    /// Whether the vehicle is moving across to another lane.
    pub fn is_changing_lane(&self) -> bool {
        self.lane_change.is_some()
    }

    /// The vehicle's lateral offset from the centre of its lane in m.
    pub fn lateral_offset(&self) -> f64 {
        self.lane_change
            .map(|lc| lc.offset.y(lc.elapsed))
            .unwrap_or(0.0)
    }

    /// The desired velocity adjustment factor. [Read more](Self::set_velocity_adjust).
    pub fn velocity_adjust(&self) -> f64 {
        self.model.velocity_adjust()
    }

    /// Set the desired velocity adjustment factor for the vehicle, a scalar which is
    /// multiplied with the driver's desired speed.
    pub fn set_velocity_adjust(&mut self, factor: f64) {
        self.model.set_velocity_adjust(factor);
    }

    /// Computes the net gap between this vehicle's front and the `leader`'s rear, in m.
    pub fn gap_to(&self, leader: &Vehicle) -> f64 {
        leader.pos_rear() - self.pos_front()
    }

    /// Computes the acceleration this vehicle would have behind `leader`,
    /// assuming it were in the same lane.
    pub fn acc_behind(&self, leader: Option<&Vehicle>) -> f64 {
        let leader = leader.map(|leader| Leader {
            gap: self.gap_to(leader),
            vel: leader.vel,
        });
        self.model.acc(self.vel, leader)
    }

    /// Sets the vehicle's acceleration for the next integration.
    pub(crate) fn set_acc(&mut self, acc: f64) {
        self.acc = limit_acc(acc);
    }

    /// Sets the vehicle's velocity in m/s. Negative values are treated as zero.
    pub(crate) fn set_vel(&mut self, vel: f64) {
        self.vel = f64::max(vel, 0.0);
    }

    /// Marks the vehicle as crashed, bringing it to an immediate stop.
    pub(crate) fn crash(&mut self) {
        self.crashed = true;
        self.vel = 0.0;
        self.acc = 0.0;
    }

    /// Moves the vehicle back to `pos`, after it has driven into the vehicle ahead.
    pub(crate) fn hold_at(&mut self, pos: f64) {
        self.pos = pos;
    }

    /// Sets the lane the vehicle belongs to, without any transition.
    pub(crate) fn set_lane_id(&mut self, lane_id: usize) {
        self.lane_id = lane_id;
    }

    /// Moves the vehicle into an adjacent lane.
    ///
    /// # Parameters
    /// * `direction` - The side the vehicle moves towards
    /// * `lane_id` - The lane the vehicle is moving into
    /// * `lane_width` - The distance between the two lane centres, in m
    pub(crate) fn begin_lane_change(
        &mut self,
        direction: LaneChangeDirection,
        lane_id: usize,
        lane_width: f64,
    ) {
        // Start out on the old lane's centre line
        let start = match direction {
            LaneChangeDirection::Left => -lane_width,
            LaneChangeDirection::Right => lane_width,
        } + self.lateral_offset();
        self.lane_change = Some(LaneChange {
            direction,
            from: self.lane_id,
            elapsed: 0.0,
            offset: CubicFn::from_ends(0.0, start, LANE_CHANGE_DURATION, 0.0),
        });
        self.lane_id = lane_id;
    }

    /// Integrates the vehicle's velocity and position
    ///
    /// # Parameters
    /// * `dt` - The time step in seconds
    pub(crate) fn integrate(&mut self, dt: f64) {
        if !self.crashed {
            let (pos, vel) = dynamics::integrate(self.pos, self.vel, self.acc, dt);
            self.pos = pos;
            self.vel = vel;
        }

        // Lane changes finish on time, crashed or not
        if let Some(lc) = self.lane_change.as_mut() {
            lc.elapsed += dt;
        }
        self.lane_change = self.lane_change.filter(|lc| lc.elapsed < LANE_CHANGE_DURATION);
    }

    /// Whether the vehicle's state is made of finite numbers.
    pub(crate) fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.vel.is_finite() && self.acc.is_finite()
    }
}
