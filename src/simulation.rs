use crate::debug::DebugFrame;
use crate::driver::DriverType;
use crate::error::{SimError, SimResult};
use crate::generator::TrafficGenerator;
use crate::network::RoadNetwork;
use crate::scenario::Scenario;
use crate::settings::Settings;
use crate::snapshot::{LaneInfo, Snapshot, VehicleInfo};
use crate::stats::{Counters, Statistics, StatisticsAggregator};
use crate::util::Interval;
use crate::vehicle::lane_change::{self, Evaluation, LaneChangeDecision};
use crate::vehicle::{Vehicle, VehicleAttributes, VehicleId};
use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// The lifecycle state of a simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum SimulationState {
    #[default]
    Stopped,
    Running,
    Paused,
}

impl fmt::Display for SimulationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
            Self::Paused => "paused",
        })
    }
}

/// A request to place a vehicle on the road.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AddVehicle {
    /// The lane to place the vehicle in.
    pub lane_id: usize,
    /// The longitudinal position of the vehicle's centre in m.
    pub position: f64,
    /// The type of the vehicle's driver.
    #[cfg_attr(feature = "serde", serde(default))]
    pub driver_type: DriverType,
}

impl AddVehicle {
    pub fn new(lane_id: usize, position: f64, driver_type: DriverType) -> Self {
        Self {
            lane_id,
            position,
            driver_type,
        }
    }
}

/// Everything a tick changes. Ticks are applied to a copy of this,
/// which replaces the live state only once the whole tick has succeeded.
#[derive(Clone, Debug, Default)]
struct World {
    /// The road and the vehicles on it.
    network: RoadNetwork,
    /// The sources of new traffic.
    generators: Vec<TrafficGenerator>,
    /// Vehicles added and completed so far.
    counters: Counters,
    /// The ID of the next vehicle to be added.
    next_id: u64,
    /// The simulated time in s.
    time: f64,
}

/// A multi-lane highway traffic simulation.
///
/// The engine is created stopped, on an empty road. Calling [step](Self::step)
/// always advances it by one tick; whether it is stepped automatically is up to
/// whoever drives it, such as the [Scheduler](crate::Scheduler).
#[derive(Clone, Debug, Default)]
pub struct SimulationEngine {
    /// The lifecycle state.
    state: SimulationState,
    settings: Settings,
    world: World,
    /// The statistics as of the last change.
    stats: StatisticsAggregator,
    /// Diagnostics from the previously simulated tick.
    debug: Option<serde_json::Value>,
}

impl SimulationEngine {
    /// Creates a stopped simulation with no lanes.
    pub fn new() -> Self {
        Default::default()
    }

    /// Creates a stopped simulation of the given scenario.
    pub fn with_scenario(scenario: &Scenario) -> SimResult<Self> {
        let mut engine = Self::new();
        engine.load_scenario(scenario)?;
        Ok(engine)
    }

    /// Gets the lifecycle state.
    pub fn state(&self) -> SimulationState {
        self.state
    }

    /// Gets the current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Gets the simulated time in s.
    pub fn time(&self) -> f64 {
        self.world.time
    }

    /// Gets the road being simulated.
    pub fn network(&self) -> &RoadNetwork {
        &self.world.network
    }

    /// Gets the latest statistics.
    pub fn stats(&self) -> &Statistics {
        self.stats.latest()
    }

    /// Gets a reference to the vehicle with the given ID.
    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.world.network.vehicle(id)
    }

    /// Returns an iterator over all the vehicles in the simulation.
    pub fn iter_vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.world.network.vehicles()
    }

    /// Gets the traffic generators.
    pub fn generators(&self) -> &[TrafficGenerator] {
        &self.world.generators
    }

    /// Gets the diagnostics for the previously simulated tick as a JSON array,
    /// if debug mode is on.
    pub fn debug(&self) -> Option<&serde_json::Value> {
        self.debug.as_ref()
    }

    /// Starts or resumes automatic stepping.
    pub fn start(&mut self) -> SimResult<()> {
        match self.state {
            SimulationState::Stopped | SimulationState::Paused => {
                self.transition(SimulationState::Running);
                Ok(())
            }
            state => Err(SimError::InvalidTransition {
                command: "start",
                state,
            }),
        }
    }

    /// Pauses a running simulation.
    pub fn pause(&mut self) -> SimResult<()> {
        match self.state {
            SimulationState::Running => {
                self.transition(SimulationState::Paused);
                Ok(())
            }
            state => Err(SimError::InvalidTransition {
                command: "pause",
                state,
            }),
        }
    }

    /// Resumes a paused simulation.
    pub fn resume(&mut self) -> SimResult<()> {
        match self.state {
            SimulationState::Paused => {
                self.transition(SimulationState::Running);
                Ok(())
            }
            state => Err(SimError::InvalidTransition {
                command: "resume",
                state,
            }),
        }
    }

    /// Stops the simulation, keeping the vehicles and the clock.
    pub fn stop(&mut self) {
        if self.state != SimulationState::Stopped {
            self.transition(SimulationState::Stopped);
        }
    }

    /// Stops the simulation and clears every vehicle and generator,
    /// returning the clock to zero. The lanes are kept.
    pub fn reset(&mut self) {
        self.state = SimulationState::Stopped;
        self.world.network.clear_vehicles();
        self.world.generators.clear();
        self.world.counters = Counters::default();
        self.world.next_id = 0;
        self.world.time = 0.0;
        self.debug = None;
        self.refresh_stats();
        info!("Simulation reset");
    }

    fn transition(&mut self, state: SimulationState) {
        info!("Simulation {} -> {}", self.state, state);
        self.state = state;
    }

    /// Stops the simulation and replaces the road with the given scenario.
    /// Nothing changes if the scenario is invalid.
    pub fn load_scenario(&mut self, scenario: &Scenario) -> SimResult<()> {
        scenario.validate()?;

        let mut loaded = Self {
            settings: scenario.settings.unwrap_or(self.settings),
            world: World {
                network: scenario.network(),
                ..Default::default()
            },
            ..Self::new()
        };
        for request in &scenario.vehicles {
            loaded.add_vehicle(request)?;
        }
        loaded.refresh_stats();

        *self = loaded;
        info!(
            "Loaded scenario {:?}: {} lanes, {} m, {} vehicles",
            scenario.name,
            scenario.lanes,
            scenario.length,
            scenario.vehicles.len()
        );
        Ok(())
    }

    /// Replaces the settings.
    pub fn set_settings(&mut self, settings: Settings) -> SimResult<()> {
        settings.validate()?;
        if !settings.debug_mode {
            self.debug = None;
        }
        self.settings = settings;
        Ok(())
    }

    /// Adds a stationary vehicle of the default size to the road.
    pub fn add_vehicle(&mut self, request: &AddVehicle) -> SimResult<VehicleId> {
        self.add_vehicle_with(request, &VehicleAttributes::default())
    }

    /// Adds a stationary vehicle to the road.
    ///
    /// Fails if the lane doesn't exist, the position is off the road,
    /// or the vehicle would overlap one already in the lane.
    pub fn add_vehicle_with(
        &mut self,
        request: &AddVehicle,
        attributes: &VehicleAttributes,
    ) -> SimResult<VehicleId> {
        let network = &self.world.network;
        network.check_lane(request.lane_id)?;
        for (name, value) in [("width", attributes.width), ("length", attributes.length)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::InvalidSetting { name, value });
            }
        }
        if !(0.0..=network.length()).contains(&request.position) {
            return Err(SimError::PositionOutOfRange {
                position: request.position,
                length: network.length(),
            });
        }
        let extent = Interval::disc(request.position, 0.5 * attributes.length);
        if let Some(other) = network
            .lane(request.lane_id)
            .and_then(|lane| lane.overlapping(extent))
        {
            return Err(SimError::PlacementConflict {
                lane_id: request.lane_id,
                position: request.position,
                other: other.id(),
            });
        }

        let id = self.world.allocate_id();
        let vehicle = Vehicle::new(
            id,
            request.driver_type,
            attributes,
            request.lane_id,
            request.position,
        );
        self.world.network.insert(vehicle)?;
        debug!(
            "Added {} vehicle {} to lane {} at {:.1} m",
            request.driver_type, id, request.lane_id, request.position
        );
        self.refresh_stats();
        Ok(id)
    }

    /// Removes a vehicle from the simulation.
    pub fn remove_vehicle(&mut self, id: VehicleId) -> SimResult<()> {
        self.world
            .network
            .remove(id)
            .ok_or(SimError::VehicleNotFound(id))?;
        debug!("Removed vehicle {}", id);
        self.refresh_stats();
        Ok(())
    }

    /// Adds a source of traffic at the start of one of the lanes.
    pub fn add_generator(&mut self, generator: TrafficGenerator) -> SimResult<()> {
        self.world.network.check_lane(generator.lane_id())?;
        self.world.generators.push(generator);
        Ok(())
    }

    /// Randomly assigns a desired velocity adjustment factor to each vehicle,
    /// which is sampled from a normal distribution with a mean of 1 (no adjustment)
    /// and standard deviation of `stddev`.
    pub fn randomise_velocity_adjusts(&mut self, stddev: f64, seed: u64) -> SimResult<()> {
        let distr = Normal::new(1.0, stddev).map_err(|_| SimError::InvalidSetting {
            name: "stddev",
            value: stddev,
        })?;
        let mut rng = StdRng::seed_from_u64(seed);
        for lane in self.world.network.lanes_mut() {
            for vehicle in lane.vehicles_mut() {
                let factor = distr.sample(&mut rng).clamp(0.75, 1.25);
                vehicle.set_velocity_adjust(factor);
            }
        }
        Ok(())
    }

    /// Advances the simulation by one tick of `time_step` seconds,
    /// whatever the lifecycle state.
    ///
    /// If the tick leaves the road in an inconsistent state it is discarded,
    /// and the simulation is left exactly as it was.
    pub fn step(&mut self) -> SimResult<()> {
        let mut world = self.world.clone();
        let mut frame = DebugFrame::new(self.settings.debug_mode);
        world.tick(self.settings.time_step, &mut frame);

        if let Err(reason) = world.network.check_consistency() {
            warn!("Discarding tick at t = {:.2} s: {}", self.world.time, reason);
            return Err(SimError::Inconsistent(reason));
        }

        self.world = world;
        self.debug = frame.enabled().then(|| frame.take());
        self.refresh_stats();
        trace!(
            "t = {:.2} s: {} vehicles, {:.1} m/s average",
            self.world.time,
            self.stats().active_vehicles,
            self.stats().average_speed
        );
        Ok(())
    }

    /// Performs an automatic step, which only happens while running.
    /// Stops the simulation once the time limit is reached.
    ///
    /// Returns whether a tick was simulated.
    pub fn advance(&mut self) -> SimResult<bool> {
        if self.state != SimulationState::Running {
            return Ok(false);
        }
        self.step()?;
        if self.settings.time_limit_reached(self.world.time) {
            info!("Time limit of {} s reached", self.settings.max_simulation_time);
            self.stop();
        }
        Ok(true)
    }

    /// Takes an immutable copy of the simulation's state.
    pub fn snapshot(&self) -> Snapshot {
        let lanes = self.world.network.lanes();
        let mut vehicles = lanes
            .iter()
            .flat_map(|lane| lane.vehicles().iter().map(move |v| VehicleInfo::new(v, lane)))
            .collect::<Vec<_>>();
        vehicles.sort_by_key(|v| v.id);

        Snapshot {
            state: self.state,
            settings: self.settings,
            stats: *self.stats.latest(),
            lanes: lanes.iter().map(LaneInfo::new).collect(),
            vehicles,
            debug: self.debug.clone(),
        }
    }

    fn refresh_stats(&mut self) {
        self.stats
            .refresh(&self.world.network, self.world.time, self.world.counters);
    }
}

impl World {
    fn allocate_id(&mut self) -> VehicleId {
        let id = VehicleId(self.next_id);
        self.next_id += 1;
        self.counters.total += 1;
        id
    }

    /// Simulates one tick of `dt` seconds.
    fn tick(&mut self, dt: f64, frame: &mut DebugFrame) {
        self.apply_accelerations();
        self.integrate(dt);
        let held = self.network.resort();
        if held > 0 {
            debug!("Held {} vehicles behind the leaders they drove into", held);
        }
        self.remove_exited(frame);
        self.detect_collisions(frame);
        self.change_lanes(frame);
        self.generate_traffic(dt);
        self.time += dt;
    }

    /// Computes every vehicle's acceleration from the state at the start of the tick.
    fn apply_accelerations(&mut self) {
        for lane in self.network.lanes_mut() {
            let accs = (0..lane.len())
                .map(|idx| {
                    let (leader, _) = lane.neighbors_at(idx);
                    lane.vehicles()[idx].acc_behind(leader)
                })
                .collect::<Vec<_>>();
            for (vehicle, acc) in lane.vehicles_mut().iter_mut().zip(accs) {
                if !vehicle.crashed() {
                    vehicle.set_acc(acc);
                }
            }
        }
    }

    /// Integrates the vehicles' velocities and positions.
    fn integrate(&mut self, dt: f64) {
        for lane in self.network.lanes_mut() {
            for vehicle in lane.vehicles_mut() {
                vehicle.integrate(dt);
            }
        }
    }

    /// Removes the vehicles which have driven off the end of the road.
    fn remove_exited(&mut self, frame: &mut DebugFrame) {
        for lane in self.network.lanes_mut() {
            let length = lane.length();
            for vehicle in lane.drain_where(|v| v.pos_mid() > length) {
                debug!("Vehicle {} left the road from lane {}", vehicle.id(), lane.id());
                frame.exit(vehicle.id(), lane.id());
                self.counters.completed += 1;
            }
        }
    }

    /// Marks overlapping vehicles as crashed.
    fn detect_collisions(&mut self, frame: &mut DebugFrame) {
        for lane in self.network.lanes_mut() {
            let lane_id = lane.id();
            for (follower, leader) in lane.mark_collisions() {
                warn!(
                    "Collision in lane {} between vehicles {} and {} at t = {:.2} s",
                    lane_id, follower, leader, self.time
                );
                frame.collision(lane_id, follower, leader);
            }
        }
    }

    /// Evaluates MOBIL for every vehicle against the same road state,
    /// then commits the changes in order of decreasing incentive.
    ///
    /// Each change is checked again just before it's made, so two vehicles
    /// can never move into the same gap.
    fn change_lanes(&mut self, frame: &mut DebugFrame) {
        let mut decisions: Vec<(VehicleId, usize, LaneChangeDecision)> = vec![];
        for lane in self.network.lanes() {
            for (idx, vehicle) in lane.vehicles().iter().enumerate() {
                let (leader, _) = lane.neighbors_at(idx);
                if let Some(decision) = lane_change::decide(&self.network, vehicle, leader) {
                    decisions.push((vehicle.id(), lane.id(), decision));
                }
            }
        }
        decisions.sort_by(|a, b| b.2.margin.total_cmp(&a.2.margin));

        for (id, from, decision) in decisions {
            let Some((vehicle, leader)) = self.network.lane(from).and_then(|lane| {
                let (leader, _) = lane.neighbors(id)?;
                Some((lane.get(id)?, leader))
            }) else {
                continue;
            };

            match lane_change::evaluate(&self.network, vehicle, leader, decision.direction) {
                Evaluation::Change { margin } => {
                    if let Ok(to) = self.network.change_lane(id, from, decision.direction) {
                        debug!(
                            "Vehicle {} changing from lane {} to lane {} (margin {:.2} m/s^2)",
                            id, from, to, margin
                        );
                        frame.lane_change(id, from, to, margin);
                    }
                }
                evaluation => frame.lane_change_rejected(id, decision.direction, evaluation),
            }
        }
    }

    /// Lets queued traffic onto the road where the start of the lane has room.
    ///
    /// A vehicle enters at its desired speed, slowed to its leader's speed if need be,
    /// and only if it wouldn't then have to brake harder than is comfortable.
    fn generate_traffic(&mut self, dt: f64) {
        for generator in &mut self.generators {
            generator.advance(dt);

            while let Some(driver) = generator.next_driver() {
                let Some(lane) = self.network.lane(generator.lane_id()) else {
                    break;
                };

                let attributes = VehicleAttributes::default();
                let mut vehicle = Vehicle::new(
                    VehicleId(self.next_id),
                    driver,
                    &attributes,
                    lane.id(),
                    0.0,
                );
                if lane.overlapping(vehicle.extent()).is_some() {
                    break;
                }
                let leader = lane.leader_at(0.0);
                let comf_decel = vehicle.params().comf_deceleration;
                let desired = vehicle.params().desired_speed * vehicle.velocity_adjust();
                vehicle.set_vel(desired);
                if let Some(leader) = leader {
                    if vehicle.acc_behind(Some(leader)) < -comf_decel {
                        vehicle.set_vel(leader.vel().min(desired));
                    }
                }
                if vehicle.acc_behind(leader) < -comf_decel {
                    break;
                }

                let id = vehicle.id();
                if self.network.insert(vehicle).is_err() {
                    break;
                }
                self.next_id += 1;
                self.counters.total += 1;
                generator.release();
                debug!("Generated {} vehicle {} in lane {}", driver, id, generator.lane_id());
            }
        }
    }
}
