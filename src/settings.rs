use crate::error::{SimError, SimResult};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The settings of a simulation.
///
/// These only affect how often the simulation is stepped and what diagnostics
/// are reported, never the car following or lane changing models.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Settings {
    /// The simulated time advanced by each step, in s.
    pub time_step: f64,
    /// How much faster than wall clock time the simulation runs when scheduled.
    pub real_time_factor: f64,
    /// Whether per-step diagnostics are recorded and surfaced in snapshots.
    pub debug_mode: bool,
    /// The simulated time after which scheduled stepping stops, in s. Zero disables the limit.
    pub max_simulation_time: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            time_step: 0.1,
            real_time_factor: 1.0,
            debug_mode: false,
            max_simulation_time: 3600.0,
        }
    }
}

impl Settings {
    /// Checks the settings are usable.
    pub fn validate(&self) -> SimResult<()> {
        let positive = |name: &'static str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SimError::InvalidSetting { name, value })
            }
        };
        positive("time_step", self.time_step)?;
        positive("real_time_factor", self.real_time_factor)?;
        if !(self.max_simulation_time.is_finite() && self.max_simulation_time >= 0.0) {
            return Err(SimError::InvalidSetting {
                name: "max_simulation_time",
                value: self.max_simulation_time,
            });
        }
        Ok(())
    }

    /// The wall clock time between scheduled steps.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(self.time_step / self.real_time_factor)
    }

    /// Whether the simulated time `t` has reached the time limit.
    /// The clock is a running sum of time steps, so it may fall a hair short.
    pub fn time_limit_reached(&self, t: f64) -> bool {
        self.max_simulation_time > 0.0 && t >= self.max_simulation_time - 1e-9
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_values() {
        let settings = Settings {
            time_step: 0.0,
            ..Default::default()
        };
        assert_eq!(
            settings.validate(),
            Err(SimError::InvalidSetting {
                name: "time_step",
                value: 0.0
            })
        );

        let settings = Settings {
            real_time_factor: -2.0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn tick_interval_scales_with_real_time_factor() {
        let settings = Settings {
            time_step: 0.1,
            real_time_factor: 4.0,
            ..Default::default()
        };
        assert_eq!(settings.tick_interval(), Duration::from_millis(25));
    }

    #[test]
    fn time_limit() {
        let mut settings = Settings::default();
        assert!(!settings.time_limit_reached(10.0));
        assert!(settings.time_limit_reached(3600.0));
        settings.max_simulation_time = 2.0;
        assert!(settings.time_limit_reached((0..20).map(|_| 0.1).sum()));
        settings.max_simulation_time = 0.0;
        assert!(!settings.time_limit_reached(1e9));
    }
}
