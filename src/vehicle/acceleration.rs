use crate::driver::DriverParameters;

/// The smallest gap the car following model will divide by, in m.
const GAP_FLOOR: f64 = 0.1; // m

/// The maximum deceleration of all vehicles in m/s<sup>2</sup>.
pub const MAX_DECEL: f64 = 9.0; // m/s^2

/// The vehicle ahead, as seen by the car following model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Leader {
    /// The net gap between own front bumper and the leader's rear bumper, in m.
    pub gap: f64,
    /// The leader's velocity in m/s.
    pub vel: f64,
}

/// The acceleration model of a vehicle: the Intelligent Driver Model.
#[derive(Clone, Copy, Debug)]
pub struct AccelerationModel {
    params: &'static DriverParameters,
    vel_adj: f64,
}

impl AccelerationModel {
    /// Creates a new acceleration model.
    pub fn new(params: &'static DriverParameters) -> Self {
        Self {
            params,
            vel_adj: 1.0,
        }
    }

    /// The driver parameters feeding the model.
    pub fn params(&self) -> &'static DriverParameters {
        self.params
    }

    /// Set the desired velocity adjustment factor.
    pub fn set_velocity_adjust(&mut self, factor: f64) {
        self.vel_adj = factor;
    }

    /// The desired velocity adjustment factor.
    pub fn velocity_adjust(&self) -> f64 {
        self.vel_adj
    }

    /// The desired speed `v0` after the velocity adjustment, in m/s.
    pub fn desired_speed(&self) -> f64 {
        self.vel_adj * self.params.desired_speed
    }

    /// Computes the acceleration of a vehicle travelling at `vel` behind `leader`.
    ///
    /// # Arguments
    /// * `vel` - The velocity of the simulated vehicle (m/s).
    /// * `leader` - The vehicle ahead, or `None` on a free road.
    pub fn acc(&self, vel: f64, leader: Option<Leader>) -> f64 {
        idm(self.params, self.desired_speed(), vel, leader)
    }
}

/// Clamps an acceleration to what a vehicle can physically achieve.
pub fn limit_acc(acc: f64) -> f64 {
    f64::max(acc, -MAX_DECEL)
}

/// Computes an acceleration using the intelligent driver model.
///
/// The free road term is `a_max (1 - (v / v0)^4)`. With a leader, the interaction
/// term `a_max (s* / s)^2` is subtracted, where the desired gap is
/// `s* = s0 + v T + v dv / (2 sqrt(a_max b))` and the gap `s` is floored at a
/// small positive value so touching or overlapping vehicles brake hard rather
/// than divide by zero.
pub fn idm(params: &DriverParameters, desired_speed: f64, vel: f64, leader: Option<Leader>) -> f64 {
    let max_acc = params.max_acceleration; // m.s^-2
    let comf_dec = params.comf_deceleration; // m.s^-2

    let free = 1. - (vel / desired_speed).powi(4);
    let Some(leader) = leader else {
        return max_acc * free;
    };

    let appr = vel - leader.vel;
    let factor = 1. / (2. * (max_acc * comf_dec).sqrt());
    let ss = params.min_gap + (vel * params.time_headway) + (vel * appr * factor);
    let term = ss / f64::max(leader.gap, GAP_FLOOR);
    max_acc * (free - (term * term))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::driver::DriverType;
    use assert_approx_eq::assert_approx_eq;

    fn model() -> AccelerationModel {
        AccelerationModel::new(DriverType::Idm.params())
    }

    #[test]
    fn equilibrium_at_desired_speed() {
        let acc = model();
        assert_approx_eq!(acc.acc(acc.desired_speed(), None), 0.0);
    }

    #[test]
    fn free_road_from_standstill() {
        let acc = model();
        assert_approx_eq!(acc.acc(0.0, None), acc.params().max_acceleration);
    }

    #[test]
    fn deterministic() {
        let leader = Some(Leader { gap: 23.0, vel: 12.0 });
        let a = model().acc(17.5, leader);
        let b = model().acc(17.5, leader);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn follows_slower_leader() {
        let acc = model();
        let free = acc.acc(20.0, None);
        let following = acc.acc(20.0, Some(Leader { gap: 30.0, vel: 10.0 }));
        assert!(following < free);
        assert!(following < 0.0);
    }

    #[test]
    fn closing_speed_increases_braking() {
        let acc = model();
        let same_speed = acc.acc(20.0, Some(Leader { gap: 40.0, vel: 20.0 }));
        let closing = acc.acc(20.0, Some(Leader { gap: 40.0, vel: 15.0 }));
        assert!(closing < same_speed);
    }

    #[test]
    fn overlapping_gap_is_finite() {
        let acc = model();
        let a = acc.acc(10.0, Some(Leader { gap: -3.0, vel: 0.0 }));
        assert!(a.is_finite());
        assert!(a < -MAX_DECEL);
        assert_approx_eq!(limit_acc(a), -MAX_DECEL);
    }

    #[test]
    fn velocity_adjust_scales_desired_speed() {
        let mut acc = model();
        acc.set_velocity_adjust(0.8);
        assert_approx_eq!(acc.desired_speed(), 0.8 * acc.params().desired_speed);
        assert_approx_eq!(acc.acc(acc.desired_speed(), None), 0.0);
    }
}
