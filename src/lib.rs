pub use cgmath;
pub use driver::{DriverParameters, DriverType};
pub use error::{SimError, SimResult};
pub use generator::{TrafficGenerator, MAX_QUEUED};
pub use lane::Lane;
pub use network::RoadNetwork;
pub use scenario::Scenario;
pub use scheduler::{Scheduler, SharedSimulation};
pub use settings::Settings;
pub use simulation::{AddVehicle, SimulationEngine, SimulationState};
pub use snapshot::{LaneInfo, Snapshot, VehicleInfo};
pub use stats::{Counters, Statistics, StatisticsAggregator};
pub use util::Interval;
pub use vehicle::acceleration::{idm, AccelerationModel, Leader, MAX_DECEL};
pub use vehicle::lane_change::{decide, evaluate, Evaluation, LaneChangeDecision};
pub use vehicle::{
    LaneChange, LaneChangeDirection, Vehicle, VehicleAttributes, VehicleId, LANE_CHANGE_DURATION,
};

mod debug;
mod driver;
mod error;
mod generator;
mod lane;
pub mod math;
mod network;
mod scenario;
mod scheduler;
mod settings;
mod simulation;
mod snapshot;
mod stats;
mod util;
mod vehicle;
