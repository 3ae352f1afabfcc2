//! Traffic statistics derived from the state of the road.

use crate::network::RoadNetwork;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Aggregate traffic statistics at one instant.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Statistics {
    /// The simulated time in s.
    pub current_time: f64,
    /// The number of vehicles on the road, crashed ones included.
    pub active_vehicles: usize,
    /// The number of vehicles ever added.
    pub total_vehicles: usize,
    /// The number of vehicles which have driven off the end of the road.
    pub completed_vehicles: usize,
    /// The number of crashed vehicles on the road.
    pub crashed_vehicles: usize,
    /// The mean velocity of the vehicles on the road in m/s.
    pub average_speed: f64,
    /// The traffic flow summed over all lanes in vehicles/h.
    pub total_flow: f64,
    /// The traffic density averaged over all lanes in vehicles/km.
    pub average_density: f64,
}

/// Counters which can't be derived from the road itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counters {
    /// The number of vehicles ever added.
    pub total: usize,
    /// The number of vehicles which have left the road.
    pub completed: usize,
}

/// Derives [Statistics] from the road. Never changes the simulation.
#[derive(Clone, Debug, Default)]
pub struct StatisticsAggregator {
    latest: Statistics,
}

impl StatisticsAggregator {
    /// Creates an aggregator with all statistics zeroed.
    pub fn new() -> Self {
        Default::default()
    }

    /// The most recently computed statistics.
    pub fn latest(&self) -> &Statistics {
        &self.latest
    }

    /// Recomputes the statistics.
    pub fn refresh(&mut self, network: &RoadNetwork, time: f64, counters: Counters) -> &Statistics {
        self.latest = Self::compute(network, time, counters);
        &self.latest
    }

    /// Computes the statistics of the road at simulated time `time`.
    pub fn compute(network: &RoadNetwork, time: f64, counters: Counters) -> Statistics {
        let active_vehicles = network.vehicle_count();
        let crashed_vehicles = network.vehicles().filter(|v| v.crashed()).count();

        let average_speed = if active_vehicles > 0 {
            network.vehicles().map(|v| v.vel()).sum::<f64>() / active_vehicles as f64
        } else {
            0.0
        };

        let lanes = network.lanes();
        let total_flow = lanes.iter().map(|lane| lane.flow()).sum();
        let average_density = if lanes.is_empty() {
            0.0
        } else {
            lanes.iter().map(|lane| lane.density()).sum::<f64>() / lanes.len() as f64
        };

        Statistics {
            current_time: time,
            active_vehicles,
            total_vehicles: counters.total,
            completed_vehicles: counters.completed,
            crashed_vehicles,
            average_speed,
            total_flow,
            average_density,
        }
    }
}
