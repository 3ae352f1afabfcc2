use crate::error::{SimError, SimResult};
use crate::network::RoadNetwork;
use crate::settings::Settings;
use crate::simulation::AddVehicle;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A road layout with optional starting traffic and settings.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Scenario {
    /// A short name for the scenario.
    pub name: String,
    /// The number of lanes.
    pub lanes: usize,
    /// The length of the road in m.
    pub length: f64,
    /// The width of each lane in m.
    pub lane_width: f64,
    /// Vehicles placed on the road when the scenario is loaded.
    #[cfg_attr(feature = "serde", serde(default))]
    pub vehicles: Vec<AddVehicle>,
    /// Settings applied when the scenario is loaded.
    #[cfg_attr(feature = "serde", serde(default))]
    pub settings: Option<Settings>,
}

impl Scenario {
    /// A straight three lane highway, 2 km long, with no vehicles.
    pub fn simple() -> Self {
        Self {
            name: "simple".into(),
            lanes: 3,
            length: 2000.0,
            lane_width: 4.0,
            vehicles: vec![],
            settings: None,
        }
    }

    /// Checks the scenario describes a usable road.
    /// The vehicles are validated when they're added.
    pub fn validate(&self) -> SimResult<()> {
        if self.lanes == 0 {
            return Err(SimError::InvalidScenario("a road needs at least one lane".into()));
        }
        if !(self.length.is_finite() && self.length > 0.0) {
            return Err(SimError::InvalidScenario(format!(
                "road length {} m is not positive",
                self.length
            )));
        }
        if !(self.lane_width.is_finite() && self.lane_width > 0.0) {
            return Err(SimError::InvalidScenario(format!(
                "lane width {} m is not positive",
                self.lane_width
            )));
        }
        if let Some(settings) = &self.settings {
            settings.validate()?;
        }
        Ok(())
    }

    /// Builds the empty road described by the scenario.
    pub fn network(&self) -> RoadNetwork {
        RoadNetwork::new(self.lanes, self.length, self.lane_width)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn simple_scenario() {
        let scenario = Scenario::simple();
        assert!(scenario.validate().is_ok());
        let network = scenario.network();
        assert_eq!(network.num_lanes(), 3);
        assert_eq!(network.length(), 2000.0);
        assert_eq!(network.vehicle_count(), 0);
    }

    #[test]
    fn rejects_roads_without_lanes() {
        let scenario = Scenario {
            lanes: 0,
            ..Scenario::simple()
        };
        assert!(matches!(scenario.validate(), Err(SimError::InvalidScenario(_))));
    }

    #[test]
    fn rejects_bad_settings() {
        let scenario = Scenario {
            settings: Some(Settings {
                time_step: -1.0,
                ..Default::default()
            }),
            ..Scenario::simple()
        };
        assert!(matches!(scenario.validate(), Err(SimError::InvalidSetting { .. })));
    }
}
