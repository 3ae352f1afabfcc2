//! The MOBIL lane changing model.
//!
//! A vehicle considers each adjacent lane in turn. Moving is worthwhile when
//! its own gain in acceleration beats the driver's threshold plus the
//! politeness-weighted loss imposed on the vehicle that would end up behind
//! it, and allowed only if that vehicle would not have to brake harder than
//! the driver's safe deceleration.

use super::acceleration::limit_acc;
use super::{LaneChangeDirection, Vehicle};
use crate::network::RoadNetwork;
use smallvec::SmallVec;

/// The outcome of evaluating a lane change in one direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Evaluation {
    /// There is no lane on that side.
    NoLane,
    /// The vehicle would overlap a vehicle in the target lane.
    Blocked,
    /// The new follower would brake harder than the safe deceleration.
    Unsafe { follower_acc: f64 },
    /// The lane change is safe but not worthwhile.
    NoIncentive { margin: f64 },
    /// The lane change is safe and worthwhile by `margin` m/s<sup>2</sup>.
    Change { margin: f64 },
}

/// A lane change the model has decided to make.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaneChangeDecision {
    /// The side to move towards.
    pub direction: LaneChangeDirection,
    /// The amount by which the incentive criterion was met, in m/s<sup>2</sup>.
    pub margin: f64,
}

/// Evaluates moving `vehicle` into the adjacent lane on the given side.
///
/// # Parameters
/// * `network` - The road the vehicle is on
/// * `vehicle` - The vehicle considering the lane change
/// * `leader` - The vehicle's current leader
/// * `direction` - The side to consider
pub fn evaluate(
    network: &RoadNetwork,
    vehicle: &Vehicle,
    leader: Option<&Vehicle>,
    direction: LaneChangeDirection,
) -> Evaluation {
    let Some(target) = network.adjacent(vehicle.lane_id(), direction) else {
        return Evaluation::NoLane;
    };
    let params = vehicle.params();

    let pos = vehicle.pos_mid();
    let new_leader = target.leader_at(pos);
    let new_follower = target.follower_at(pos);

    // There must be physical room in the target lane
    let leader_clear = new_leader.map_or(true, |l| vehicle.gap_to(l) > 0.0);
    let follower_clear = new_follower.map_or(true, |f| f.gap_to(vehicle) > 0.0);
    if !(leader_clear && follower_clear) {
        return Evaluation::Blocked;
    }

    // A crashed follower can't react, so only its space counts
    let (follower_old, follower_new) = match new_follower.filter(|f| !f.crashed()) {
        Some(follower) => (
            limit_acc(follower.acc_behind(new_leader)),
            limit_acc(follower.acc_behind(Some(vehicle))),
        ),
        None => (0.0, 0.0),
    };

    if follower_new < -params.safe_deceleration {
        return Evaluation::Unsafe {
            follower_acc: follower_new,
        };
    }

    let acc_old = limit_acc(vehicle.acc_behind(leader));
    let acc_new = limit_acc(vehicle.acc_behind(new_leader));
    let threshold = params.lane_change_threshold + params.politeness * (follower_old - follower_new);
    let margin = acc_new - acc_old - threshold;

    if margin > 0.0 {
        Evaluation::Change { margin }
    } else {
        Evaluation::NoIncentive { margin }
    }
}

/// Decides whether `vehicle` should change lanes, and to which side.
///
/// Crashed vehicles and vehicles already changing lanes never change lanes.
/// When both sides qualify, the side with the larger margin wins;
/// on a tie the vehicle moves left.
pub fn decide(
    network: &RoadNetwork,
    vehicle: &Vehicle,
    leader: Option<&Vehicle>,
) -> Option<LaneChangeDecision> {
    if vehicle.crashed() || vehicle.is_changing_lane() {
        return None;
    }

    [LaneChangeDirection::Left, LaneChangeDirection::Right]
        .into_iter()
        .filter_map(|direction| match evaluate(network, vehicle, leader, direction) {
            Evaluation::Change { margin } => Some(LaneChangeDecision { direction, margin }),
            _ => None,
        })
        .collect::<SmallVec<[_; 2]>>()
        .into_iter()
        .reduce(|best, next| if next.margin > best.margin { next } else { best })
}
