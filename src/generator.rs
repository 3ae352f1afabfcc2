use crate::driver::DriverType;
use crate::error::{SimError, SimResult};
use log::debug;
use rand::distributions::WeightedIndex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Exp};
use std::collections::VecDeque;

/// The most vehicles which can wait to enter a lane. Any more arrivals are turned away.
pub const MAX_QUEUED: usize = 64;

/// Feeds vehicles into the start of a lane at random, with exponentially
/// distributed gaps between arrivals.
///
/// Arrivals are queued when the start of the lane is occupied,
/// and enter as soon as there is room.
#[derive(Clone, Debug)]
pub struct TrafficGenerator {
    /// The lane vehicles enter.
    lane_id: usize,
    /// The distribution of time between arrivals, in s.
    headways: Exp<f64>,
    /// The driver types to choose from.
    drivers: Vec<DriverType>,
    /// The relative frequency of each driver type.
    mix: WeightedIndex<f64>,
    rng: StdRng,
    /// The simulated time until the next arrival, in s.
    until_next: f64,
    /// The driver types of the vehicles waiting to enter.
    queued: VecDeque<DriverType>,
    /// The number of arrivals turned away because the queue was full.
    dropped: u64,
}

impl TrafficGenerator {
    /// Creates a generator of IDM drivers.
    ///
    /// # Parameters
    /// * `lane_id` - The lane vehicles enter
    /// * `rate` - The mean arrival rate in vehicles/h
    /// * `seed` - Seeds the random number generator
    pub fn new(lane_id: usize, rate: f64, seed: u64) -> SimResult<Self> {
        Self::with_mix(lane_id, rate, &[(DriverType::Idm, 1.0)], seed)
    }

    /// Creates a generator which picks driver types with the given relative weights.
    pub fn with_mix(
        lane_id: usize,
        rate: f64,
        mix: &[(DriverType, f64)],
        seed: u64,
    ) -> SimResult<Self> {
        let headways = Exp::new(rate / 3600.0)
            .ok()
            .filter(|_| rate.is_finite() && rate > 0.0)
            .ok_or(SimError::InvalidSetting { name: "rate", value: rate })?;
        let weights = mix.iter().map(|(_, w)| *w);
        let total = weights.clone().sum();
        let weights = WeightedIndex::new(weights).map_err(|_| SimError::InvalidSetting {
            name: "driver_mix",
            value: total,
        })?;

        let mut rng = StdRng::seed_from_u64(seed);
        let until_next = headways.sample(&mut rng);
        Ok(Self {
            lane_id,
            headways,
            drivers: mix.iter().map(|(ty, _)| *ty).collect(),
            mix: weights,
            rng,
            until_next,
            queued: VecDeque::new(),
            dropped: 0,
        })
    }

    /// The lane vehicles enter.
    pub fn lane_id(&self) -> usize {
        self.lane_id
    }

    /// The number of vehicles waiting to enter.
    pub fn queued(&self) -> usize {
        self.queued.len()
    }

    /// The number of arrivals turned away because too many were already waiting.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Advances the generator by `dt` seconds, queueing any arrivals.
    pub(crate) fn advance(&mut self, dt: f64) {
        self.until_next -= dt;
        while self.until_next <= 0.0 {
            let driver = self.drivers[self.mix.sample(&mut self.rng)];
            if self.queued.len() < MAX_QUEUED {
                self.queued.push_back(driver);
            } else {
                self.dropped += 1;
                debug!("Lane {} entry queue is full, turning away a vehicle", self.lane_id);
            }
            self.until_next += self.headways.sample(&mut self.rng);
        }
    }

    /// The driver type of the next vehicle waiting to enter.
    pub(crate) fn next_driver(&self) -> Option<DriverType> {
        self.queued.front().copied()
    }

    /// Marks the next queued vehicle as having entered.
    pub(crate) fn release(&mut self) {
        self.queued.pop_front();
    }
}
