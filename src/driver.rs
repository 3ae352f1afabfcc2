//! Driver types and their behavioural parameters.

use crate::error::SimError;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The desired speed of a standard driver, in m/s (about 120 km/h).
const BASE_DESIRED_SPEED: f64 = 33.33; // m/s

/// The type of a driver, which selects its [DriverParameters].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum DriverType {
    /// The reference IDM driver.
    #[default]
    Idm,
    Aggressive,
    Normal,
    Cautious,
}

/// The constants feeding the car following and lane changing models for one driver type.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DriverParameters {
    /// The desired speed `v0` in m/s.
    pub desired_speed: f64,
    /// The safe time headway `T` in s.
    pub time_headway: f64,
    /// The maximum acceleration `a_max` in m/s<sup>2</sup>.
    pub max_acceleration: f64,
    /// The comfortable deceleration `b` in m/s<sup>2</sup>, a positive number.
    pub comf_deceleration: f64,
    /// The minimum gap `s0` kept to the vehicle ahead when stopped, in m.
    pub min_gap: f64,
    /// The MOBIL politeness factor `p`, in [0, 1].
    pub politeness: f64,
    /// The MOBIL acceleration gain threshold `a_thr` in m/s<sup>2</sup>.
    pub lane_change_threshold: f64,
    /// The MOBIL safe deceleration limit `b_safe` in m/s<sup>2</sup>, a positive number.
    pub safe_deceleration: f64,
}

const IDM: DriverParameters = DriverParameters {
    desired_speed: BASE_DESIRED_SPEED,
    time_headway: 1.5,
    max_acceleration: 2.0,
    comf_deceleration: 3.0,
    min_gap: 2.0,
    politeness: 0.5,
    lane_change_threshold: 0.2,
    safe_deceleration: 4.0,
};

const AGGRESSIVE: DriverParameters = DriverParameters {
    desired_speed: 1.1 * BASE_DESIRED_SPEED,
    time_headway: 1.0,
    max_acceleration: 2.5,
    comf_deceleration: 4.0,
    min_gap: 1.5,
    politeness: 0.2,
    lane_change_threshold: 0.1,
    safe_deceleration: 5.0,
};

const CAUTIOUS: DriverParameters = DriverParameters {
    desired_speed: 0.9 * BASE_DESIRED_SPEED,
    time_headway: 2.5,
    max_acceleration: 1.5,
    comf_deceleration: 2.0,
    min_gap: 3.0,
    politeness: 0.8,
    lane_change_threshold: 0.3,
    safe_deceleration: 3.0,
};

impl DriverType {
    /// All the driver types.
    pub const ALL: [DriverType; 4] = [
        DriverType::Idm,
        DriverType::Aggressive,
        DriverType::Normal,
        DriverType::Cautious,
    ];

    /// Gets the parameters of this driver type.
    pub fn params(self) -> &'static DriverParameters {
        match self {
            DriverType::Idm | DriverType::Normal => &IDM,
            DriverType::Aggressive => &AGGRESSIVE,
            DriverType::Cautious => &CAUTIOUS,
        }
    }

    /// The canonical upper case name of the driver type.
    pub fn as_str(self) -> &'static str {
        match self {
            DriverType::Idm => "IDM",
            DriverType::Aggressive => "AGGRESSIVE",
            DriverType::Normal => "NORMAL",
            DriverType::Cautious => "CAUTIOUS",
        }
    }
}

impl fmt::Display for DriverType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriverType {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| SimError::UnknownDriverType(s.to_string()))
    }
}

impl DriverParameters {
    /// Checks that every parameter is strictly positive and the politeness lies in [0, 1].
    pub fn is_valid(&self) -> bool {
        let positive = [
            self.desired_speed,
            self.time_headway,
            self.max_acceleration,
            self.comf_deceleration,
            self.min_gap,
            self.lane_change_threshold,
            self.safe_deceleration,
        ];
        positive.iter().all(|v| v.is_finite() && *v > 0.0)
            && (0.0..=1.0).contains(&self.politeness)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parameter_table_is_valid() {
        for ty in DriverType::ALL {
            assert!(ty.params().is_valid(), "{ty} has invalid parameters");
        }
    }

    #[test]
    fn parse_driver_types() {
        assert_eq!("IDM".parse::<DriverType>(), Ok(DriverType::Idm));
        assert_eq!("cautious".parse::<DriverType>(), Ok(DriverType::Cautious));
        assert_eq!(
            "SUNDAY".parse::<DriverType>(),
            Err(SimError::UnknownDriverType("SUNDAY".into()))
        );
    }

    #[test]
    fn aggressive_drivers_are_faster_and_less_polite() {
        let normal = DriverType::Normal.params();
        let aggressive = DriverType::Aggressive.params();
        assert!(aggressive.desired_speed > normal.desired_speed);
        assert!(aggressive.time_headway < normal.time_headway);
        assert!(aggressive.politeness < normal.politeness);
    }
}
