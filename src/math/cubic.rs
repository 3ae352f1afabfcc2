//! Cubic easing functions.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A cubic function.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CubicFn {
    coeffs: [f64; 4],
    offset: f64,
}

impl CubicFn {
    pub const fn constant(y: f64) -> Self {
        Self {
            coeffs: [0.0, 0.0, 0.0, y],
            offset: 0.0,
        }
    }

    /// Fits a cubic which passes through `(x1, y1)` and `(x2, y2)`
    /// with zero slope at both ends.
    pub fn from_ends(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let (x, y) = (x2 - x1, y2 - y1);
        if x == 0.0 {
            return Self::constant(y2);
        }
        let a = -2.0 * y * x.powi(-3);
        let b = 3.0 * y * x.powi(-2);
        let coeffs = [a, b, 0.0, y1];
        let offset = -x1;
        Self { coeffs, offset }
    }

    pub fn y(&self, x: f64) -> f64 {
        self.y_and_dy(x).0
    }

    pub fn dy(&self, x: f64) -> f64 {
        self.y_and_dy(x).1
    }

    pub fn y_and_dy(&self, x: f64) -> (f64, f64) {
        let c = &self.coeffs;
        let x = x + self.offset;

        let y = c[0] * x * x * x + c[1] * x * x + c[2] * x + c[3];
        let dy = c[0] * 3. * x * x + c[1] * 2. * x + c[2];

        (y, dy)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    pub fn from_ends() {
        let cubic = CubicFn::from_ends(10., 20., 45.0, 5.0);
        assert_approx_eq!(cubic.y(10.), 20., 0.01);
        assert_approx_eq!(cubic.dy(10.), 0., 0.01);
        assert_approx_eq!(cubic.y(27.5), 12.5, 0.01);
        assert_approx_eq!(cubic.y(45.), 5., 0.01);
        assert_approx_eq!(cubic.dy(45.), 0., 0.01);
    }

    #[test]
    pub fn monotonic_between_ends() {
        let cubic = CubicFn::from_ends(0.0, -3.5, 3.0, 0.0);
        let mut prev = cubic.y(0.0);
        for i in 1..=30 {
            let y = cubic.y(0.1 * i as f64);
            assert!(y >= prev);
            prev = y;
        }
    }

    #[test]
    pub fn degenerate_span() {
        let cubic = CubicFn::from_ends(1.0, 4.0, 1.0, 2.0);
        assert_eq!(cubic.y(1.0), 2.0);
    }
}
