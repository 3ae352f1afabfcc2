/// Advances a vehicle's longitudinal state by one explicit fixed step.
///
/// Uses `v' = max(0, v + a dt)` and `x' = x + v dt + a dt^2 / 2`. When the vehicle
/// would come to a halt part way through the step, the position is that of the
/// stopping point, so a braking vehicle never rolls backwards.
///
/// Returns the new `(pos, vel)`.
pub fn integrate(pos: f64, vel: f64, acc: f64, dt: f64) -> (f64, f64) {
    let next_vel = vel + acc * dt;
    if next_vel >= 0.0 {
        (pos + vel * dt + 0.5 * acc * dt * dt, next_vel)
    } else {
        // acc < 0 here, as vel >= 0
        (pos - 0.5 * vel * vel / acc, 0.0)
    }
}

#[cfg(test)]
mod test {
    use super::integrate;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn constant_acceleration() {
        let (pos, vel) = integrate(10.0, 5.0, 2.0, 0.5);
        assert_approx_eq!(vel, 6.0);
        assert_approx_eq!(pos, 10.0 + 2.5 + 0.25);
    }

    #[test]
    fn stops_within_step() {
        let (pos, vel) = integrate(0.0, 2.0, -8.0, 1.0);
        assert_eq!(vel, 0.0);
        assert_approx_eq!(pos, 0.25);
    }

    #[test]
    fn stopped_vehicle_does_not_reverse() {
        let (pos, vel) = integrate(42.0, 0.0, -3.0, 0.1);
        assert_eq!(vel, 0.0);
        assert_approx_eq!(pos, 42.0);
    }
}
