//! The population: every agent, the spatial index they share, the region they live in, and the
//! scheduler that interleaves their processes.
//!
//! External drivers use a small surface:
//! * [`Population::step`] advances the virtual clock, resuming every agent whose wake time falls
//!   in the stepped interval;
//! * [`Population::snapshot`] reads positions, infection states and aggregate statistics;
//! * [`Population::set_parameter`] changes a tunable parameter for every agent at once.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentContext, AgentId, InfectionStatus};
use crate::define_rng;
use crate::error::ContagionError;
use crate::parameters::{AgentParameters, Parameter, MAX_WALK_SPEED};
use crate::plan::Plan;
use crate::random::RandomSource;
use crate::region::{Bounds, Point, Region};
use crate::scheduler::Scheduler;
use crate::spatial::SpatialIndex;

define_rng!(PlacementRng);

/// Everything needed to build a [`Population`]. Missing JSON fields take their default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub bounds: Bounds,
    pub agent_count: usize,
    pub popular_places: Vec<Point>,
    /// Extra popular places drawn uniformly inside the bounds
    pub popular_place_count: usize,
    pub initial_infected_fraction: f64,
    pub cell_size: f64,
    /// Agents draw their walk speed uniformly from `[0, max_walk_speed]`
    pub max_walk_speed: f64,
    pub agent_parameters: AgentParameters,
    pub random_seed: u64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        PopulationConfig {
            bounds: Bounds::default(),
            agent_count: 100,
            popular_places: vec![],
            popular_place_count: 0,
            initial_infected_fraction: 0.05,
            cell_size: 3.0,
            max_walk_speed: MAX_WALK_SPEED,
            agent_parameters: AgentParameters::default(),
            random_seed: 0,
        }
    }
}

impl PopulationConfig {
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid configuration.
    pub fn from_json_file(path: &Path) -> Result<PopulationConfig, ContagionError> {
        let file = File::open(path)?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ContagionError> {
        self.bounds.validate()?;
        if !(0.0..=1.0).contains(&self.initial_infected_fraction) {
            return Err(ContagionError::InvalidConfig(format!(
                "initial infected fraction must lie in [0, 1], got {}",
                self.initial_infected_fraction
            )));
        }
        if let Some(place) = self
            .popular_places
            .iter()
            .find(|place| !self.bounds.contains(**place))
        {
            return Err(ContagionError::InvalidConfig(format!(
                "popular place ({}, {}) lies outside the bounds",
                place.x, place.y
            )));
        }
        Parameter::WalkSpeed.validate(self.max_walk_speed)?;
        self.agent_parameters.validate()
    }
}

/// Explicit start state for one agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub position: Point,
    pub status: InfectionStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AgentSnapshot {
    pub x: f64,
    pub y: f64,
    pub infected: bool,
}

/// What a renderer needs for one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub time: f64,
    pub agents: Vec<AgentSnapshot>,
    pub reproduction_ratio: f64,
    pub infected_percent: f64,
}

pub struct Population {
    agents: Vec<Agent>,
    index: SpatialIndex<AgentId>,
    region: Region,
    random: RandomSource,
    scheduler: Scheduler<AgentId>,
}

impl Population {
    /// Builds a population with default agent parameters and seed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBounds` if an axis has `min >= max` and `InvalidCount`
    /// if `agent_count` is zero.
    pub fn new(
        bounds: Bounds,
        agent_count: usize,
        popular_places: Vec<Point>,
        initial_infected_fraction: f64,
    ) -> Result<Population, ContagionError> {
        Population::from_config(&PopulationConfig {
            bounds,
            agent_count,
            popular_places,
            initial_infected_fraction,
            ..PopulationConfig::default()
        })
    }

    /// Spawns `agent_count` agents at uniformly random positions, each infected
    /// independently with probability `initial_infected_fraction`.
    ///
    /// # Errors
    ///
    /// Returns an error if any part of the configuration is invalid.
    pub fn from_config(config: &PopulationConfig) -> Result<Population, ContagionError> {
        config.validate()?;
        if config.agent_count == 0 {
            return Err(ContagionError::InvalidCount(config.agent_count));
        }

        let random = RandomSource::new(config.random_seed);
        let bounds = config.bounds;
        let placements = (0..config.agent_count)
            .map(|_| {
                let position = bounds.sample_point(&random, PlacementRng);
                let status =
                    if random.sample_bool(PlacementRng, config.initial_infected_fraction) {
                        InfectionStatus::Infected
                    } else {
                        InfectionStatus::Susceptible
                    };
                Placement { position, status }
            })
            .collect();
        Population::build(config, random, placements)
    }

    /// Uses the given start states instead of random ones. `agent_count` and
    /// `initial_infected_fraction` from `config` are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, no placement is given,
    /// or a placement lies outside the bounds.
    pub fn from_placements(
        config: &PopulationConfig,
        placements: impl IntoIterator<Item = Placement>,
    ) -> Result<Population, ContagionError> {
        config.validate()?;
        let placements: Vec<Placement> = placements.into_iter().collect();
        if placements.is_empty() {
            return Err(ContagionError::InvalidCount(0));
        }
        if let Some(outside) = placements
            .iter()
            .find(|placement| !config.bounds.contains(placement.position))
        {
            return Err(ContagionError::InvalidConfig(format!(
                "placement ({}, {}) lies outside the bounds",
                outside.position.x, outside.position.y
            )));
        }
        Population::build(config, RandomSource::new(config.random_seed), placements)
    }

    fn build(
        config: &PopulationConfig,
        random: RandomSource,
        placements: Vec<Placement>,
    ) -> Result<Population, ContagionError> {
        let bounds = config.bounds;
        let mut popular_places = config.popular_places.clone();
        popular_places.extend(
            (0..config.popular_place_count).map(|_| bounds.sample_point(&random, PlacementRng)),
        );

        let mut index = SpatialIndex::new(config.cell_size)?;
        let mut scheduler = Scheduler::new();
        let mut agents = Vec::with_capacity(placements.len());
        for (i, placement) in placements.into_iter().enumerate() {
            let id = AgentId(i);
            let walk_speed = random.sample_range(PlacementRng, 0.0..=config.max_walk_speed);
            let mut agent = Agent::new(id, placement.position, walk_speed, config.agent_parameters);
            if placement.status == InfectionStatus::Infected {
                agent.infect(scheduler.get_current_time());
            }
            index.insert(id, agent.position())?;
            scheduler.add_plan(0.0, id);
            agents.push(agent);
        }

        let population = Population {
            agents,
            index,
            region: Region {
                bounds,
                popular_places,
            },
            random,
            scheduler,
        };
        info!(
            "created population of {} agents ({} infected) with {} popular places",
            population.agents.len(),
            population.infected_count(),
            population.region.popular_places.len()
        );
        Ok(population)
    }

    /// Advances the virtual clock by `n_ticks`, resuming every agent due before the new time.
    #[allow(clippy::cast_precision_loss)]
    pub fn step(&mut self, n_ticks: u64) {
        let until = self.scheduler.get_current_time() + n_ticks as f64;
        while let Some(plan) = self.scheduler.next_plan_before(until) {
            self.resume(plan);
        }
        self.scheduler.advance_to(until);
    }

    /// Jumps to the earliest pending wake time and resumes every agent due then.
    /// Returns the new time, or `None` if nothing is scheduled.
    #[allow(clippy::float_cmp)]
    pub fn step_to_next_event(&mut self) -> Option<f64> {
        let time = self.scheduler.next_plan_time()?;
        while self.scheduler.next_plan_time() == Some(time) {
            if let Some(plan) = self.scheduler.next_plan_before(f64::INFINITY) {
                self.resume(plan);
            }
        }
        Some(time)
    }

    fn resume(&mut self, plan: Plan<AgentId>) {
        let id = plan.data;
        let delay = AgentContext {
            agents: &mut self.agents,
            index: &mut self.index,
            region: &self.region,
            random: &self.random,
            now: plan.time,
        }
        .resume(id);
        self.scheduler.add_plan_after(delay, id);
    }

    /// Stops every agent process. Later steps only move the clock.
    pub fn shutdown(&mut self) {
        info!("stopping population at t={}", self.current_time());
        self.scheduler.shutdown();
    }

    /// Applies `value` to every agent.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameterValue` if `value` is outside the parameter's
    /// domain. No agent is changed in that case.
    pub fn set_parameter(&mut self, parameter: Parameter, value: f64) -> Result<(), ContagionError> {
        let value = parameter.validate(value)?;
        debug!("setting {parameter} to {value} for {} agents", self.agents.len());
        for agent in &mut self.agents {
            agent.set_parameter(parameter, value);
        }
        Ok(())
    }

    /// Like [`Population::set_parameter`], with the parameter given by name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownParameter` if `name` does not name a parameter.
    pub fn set_parameter_by_name(&mut self, name: &str, value: f64) -> Result<(), ContagionError> {
        let parameter = Parameter::from_str(name)
            .map_err(|_| ContagionError::UnknownParameter(name.to_string()))?;
        self.set_parameter(parameter, value)
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            time: self.current_time(),
            agents: self
                .agents
                .iter()
                .map(|agent| AgentSnapshot {
                    x: agent.position().x,
                    y: agent.position().y,
                    infected: agent.is_infected(),
                })
                .collect(),
            reproduction_ratio: self.reproduction_ratio(),
            infected_percent: self.infected_percent(),
        }
    }

    #[must_use]
    pub fn infected_count(&self) -> usize {
        self.agents.iter().filter(|agent| agent.is_infected()).count()
    }

    #[must_use]
    pub fn total_transmissions(&self) -> u64 {
        self.agents
            .iter()
            .map(|agent| u64::from(agent.transmissions()))
            .sum()
    }

    /// Total transmissions divided by the number infected; zero while nobody is infected.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn reproduction_ratio(&self) -> f64 {
        match self.infected_count() {
            0 => 0.0,
            infected => self.total_transmissions() as f64 / infected as f64,
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn infected_percent(&self) -> f64 {
        100.0 * self.infected_count() as f64 / self.agents.len() as f64
    }

    #[must_use]
    pub fn current_time(&self) -> f64 {
        self.scheduler.get_current_time()
    }

    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    #[must_use]
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.index())
    }

    #[must_use]
    pub fn spatial_index(&self) -> &SpatialIndex<AgentId> {
        &self.index
    }

    #[must_use]
    pub fn region(&self) -> &Region {
        &self.region
    }
}
