//! Agents and the process that moves them.
//!
//! Every agent runs an endless cycle driven by the scheduler:
//!
//! 1. pick a destination: a popular place with probability `popular_place_probability`,
//!    otherwise a random point at most `walk_range` away that lies inside the region;
//! 2. walk toward it one step per tick, trying to infect neighbors on every step while infected;
//! 3. rest for a random number of whole ticks below `stop_duration`, then start over.
//!
//! The cycle is an explicit state machine ([`Activity`]). Resuming an agent runs it from its
//! current state up to the next suspension and yields how many ticks it sleeps.

use std::fmt::{self, Display};

use log::trace;
use serde::Serialize;

use crate::define_rng;
use crate::parameters::{AgentParameters, Parameter};
use crate::random::RandomSource;
use crate::region::{Point, Region};
use crate::spatial::SpatialIndex;

/// An agent has arrived once it is closer than this to its destination on both axes.
pub const CLOSE_ENOUGH_THRESHOLD: f64 = 0.5;

/// Resampling attempts for a random destination before the last candidate
/// is pulled back inside the region. The clamped fallback piles destinations
/// onto the region's edges, so once `walk_range` is much larger than the region
/// the destination distribution is no longer uniform over the in-bounds points.
const MAX_TARGET_ATTEMPTS: usize = 1000;

define_rng!(MovementRng);
define_rng!(RestRng);
define_rng!(TransmissionRng);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AgentId(pub(crate) usize);

impl AgentId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "agent {}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum InfectionStatus {
    Susceptible,
    Infected,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Activity {
    SelectingTarget,
    /// `steps` counts the ticks spent walking toward `target` so far
    Walking { target: Point, steps: u32 },
    Resting,
}

#[derive(Clone, Debug)]
pub struct Agent {
    id: AgentId,
    position: Point,
    status: InfectionStatus,
    time_infected: Option<f64>,
    transmissions: u32,
    walk_speed: f64,
    parameters: AgentParameters,
    activity: Activity,
}

impl Agent {
    #[must_use]
    pub fn new(id: AgentId, position: Point, walk_speed: f64, parameters: AgentParameters) -> Agent {
        Agent {
            id,
            position,
            status: InfectionStatus::Susceptible,
            time_infected: None,
            transmissions: 0,
            walk_speed,
            parameters,
            activity: Activity::SelectingTarget,
        }
    }

    #[must_use]
    pub fn id(&self) -> AgentId {
        self.id
    }

    #[must_use]
    pub fn position(&self) -> Point {
        self.position
    }

    #[must_use]
    pub fn status(&self) -> InfectionStatus {
        self.status
    }

    #[must_use]
    pub fn is_infected(&self) -> bool {
        self.status == InfectionStatus::Infected
    }

    /// Virtual time at which the agent became infected
    #[must_use]
    pub fn time_infected(&self) -> Option<f64> {
        self.time_infected
    }

    /// Number of agents this agent has infected
    #[must_use]
    pub fn transmissions(&self) -> u32 {
        self.transmissions
    }

    #[must_use]
    pub fn walk_speed(&self) -> f64 {
        self.walk_speed
    }

    #[must_use]
    pub fn parameters(&self) -> &AgentParameters {
        &self.parameters
    }

    #[must_use]
    pub fn activity(&self) -> Activity {
        self.activity
    }

    /// Marks the agent infected at `time`. Returns `false`, and changes nothing,
    /// if it already was.
    pub fn infect(&mut self, time: f64) -> bool {
        if self.is_infected() {
            return false;
        }
        self.status = InfectionStatus::Infected;
        self.time_infected = Some(time);
        true
    }

    /// The value must already have been validated.
    pub(crate) fn set_parameter(&mut self, parameter: Parameter, value: f64) {
        match parameter {
            Parameter::InfectRange => self.parameters.infect_range = value,
            Parameter::InfectProbability => self.parameters.infect_probability = value,
            Parameter::WalkRange => self.parameters.walk_range = value,
            Parameter::WalkSpeed => self.walk_speed = value,
            Parameter::StopDuration => self.parameters.stop_duration = value,
            Parameter::PopularPlaceProbability => {
                self.parameters.popular_place_probability = value;
            }
        }
    }

    fn has_reached(&self, target: Point) -> bool {
        close_enough(self.position.x, target.x) && close_enough(self.position.y, target.y)
    }

    fn step_toward(&self, target: Point) -> Point {
        Point::new(
            self.position.x + direction(self.position.x, target.x) * self.walk_speed,
            self.position.y + direction(self.position.y, target.y) * self.walk_speed,
        )
    }
}

fn close_enough(current: f64, target: f64) -> bool {
    (current - target).abs() < CLOSE_ENOUGH_THRESHOLD
}

/// Sign of the move needed on one axis, or zero once close enough.
fn direction(current: f64, target: f64) -> f64 {
    if close_enough(current, target) {
        0.0
    } else if current < target {
        1.0
    } else {
        -1.0
    }
}

/// Everything an agent process touches while it runs.
pub(crate) struct AgentContext<'a> {
    pub(crate) agents: &'a mut [Agent],
    pub(crate) index: &'a mut SpatialIndex<AgentId>,
    pub(crate) region: &'a Region,
    pub(crate) random: &'a RandomSource,
    pub(crate) now: f64,
}

impl AgentContext<'_> {
    /// Runs agent `id` until its next suspension and returns the number of ticks to sleep.
    pub(crate) fn resume(&mut self, id: AgentId) -> f64 {
        loop {
            match self.agents[id.0].activity {
                Activity::SelectingTarget => {
                    let target = self.select_target(id);
                    trace!("{id} heading to ({}, {})", target.x, target.y);
                    self.agents[id.0].activity = Activity::Walking { target, steps: 0 };
                }
                Activity::Walking { target, steps } => {
                    if self.agents[id.0].has_reached(target) {
                        self.agents[id.0].activity = Activity::Resting;
                        // An agent that did not move must still let time pass
                        return self.draw_rest(id).max(if steps == 0 { 1.0 } else { 0.0 });
                    }
                    self.walk_step(id, target);
                    self.agents[id.0].activity = Activity::Walking {
                        target,
                        steps: steps + 1,
                    };
                    return 1.0;
                }
                Activity::Resting => {
                    self.agents[id.0].activity = Activity::SelectingTarget;
                }
            }
        }
    }

    fn select_target(&self, id: AgentId) -> Point {
        let agent = &self.agents[id.0];
        let parameters = agent.parameters;
        let places = &self.region.popular_places;

        if !places.is_empty()
            && self
                .random
                .sample_bool(MovementRng, parameters.popular_place_probability)
        {
            return places[self.random.sample_range(MovementRng, 0..places.len())];
        }

        let bounds = self.region.bounds;
        let current = agent.position;
        let range = parameters.walk_range;
        let mut target = Point::new(
            current.x + self.random.sample_range(MovementRng, 0.0..=range),
            current.y + self.random.sample_range(MovementRng, 0.0..=range),
        );
        let mut attempts = 0;
        while !bounds.contains(target) {
            if attempts == MAX_TARGET_ATTEMPTS {
                trace!("{id} gave up resampling its destination");
                return bounds.clamp(target);
            }
            target = Point::new(
                current.x + self.random.sample_range(MovementRng, -range..=range + 1.0),
                current.y + self.random.sample_range(MovementRng, -range..=range + 1.0),
            );
            attempts += 1;
        }
        target
    }

    fn walk_step(&mut self, id: AgentId, target: Point) {
        let agent = &self.agents[id.0];
        let current = agent.position;
        let next = self.region.bounds.clamp(agent.step_toward(target));

        // Neighbors are looked up around the last position written to the index
        if agent.is_infected() {
            self.transmit(id, current);
        }

        self.index
            .move_to(id, next)
            .unwrap_or_else(|error| panic!("spatial index out of sync: {error}"));
        self.agents[id.0].position = next;
    }

    fn transmit(&mut self, id: AgentId, center: Point) {
        let AgentParameters {
            infect_range,
            infect_probability,
            ..
        } = self.agents[id.0].parameters;

        let mut infected = 0;
        for neighbor in self.index.query_radius(center, infect_range) {
            if neighbor == id {
                continue;
            }
            if self.random.sample_bool(TransmissionRng, infect_probability)
                && self.agents[neighbor.0].infect(self.now)
            {
                trace!("{id} infected {neighbor} at t={}", self.now);
                infected += 1;
            }
        }
        self.agents[id.0].transmissions += infected;
    }

    /// Whole ticks drawn uniformly below `stop_duration`
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn draw_rest(&self, id: AgentId) -> f64 {
        let slots = self.agents[id.0].parameters.stop_duration.ceil() as u64;
        if slots == 0 {
            return 0.0;
        }
        self.random.sample_range(RestRng, 0..slots) as f64
    }
}
