//! An agent-based simulation of contagion spreading through a mobile population
//!
//! Agents live in a rectangular region. Each one repeatedly picks a destination (either one of
//! a few popular places or a nearby random point), walks there at its own speed, and rests for a
//! while. An infected agent that walks past susceptible agents may infect each of them with a
//! fixed probability per tick.
//!
//! The central object is the [`Population`] that owns:
//! * every [`Agent`] and its position, infection state and parameters
//! * a uniform-grid [`SpatialIndex`] answering "who is near this point?"
//! * a [`Scheduler`] holding the virtual clock and the time each agent wakes next
//! * a [`RandomSource`] with one seeded stream per concern, so a seed reproduces a run
//!
//! Drivers advance the model with [`Population::step`], read frames with
//! [`Population::snapshot`], and tune the model while it runs with
//! [`Population::set_parameter`]. The [`runner`] module provides a headless command line driver.
//!
//! ```rust
//! use contagion::{Bounds, Population};
//!
//! let mut population =
//!     Population::new(Bounds::new((0.0, 50.0), (0.0, 50.0)), 100, vec![], 0.1).unwrap();
//! population.step(10);
//! let snapshot = population.snapshot();
//! assert_eq!(snapshot.agents.len(), 100);
//! ```
pub mod agent;
pub mod error;
pub mod hashing;
pub mod log;
pub mod parameters;
pub mod plan;
pub mod population;
pub mod prelude;
pub mod random;
pub mod region;
pub mod runner;
pub mod scheduler;
pub mod spatial;

pub use crate::agent::{Activity, Agent, AgentId, InfectionStatus};
pub use crate::error::ContagionError;
pub use crate::log::{debug, error, info, trace, warn};
pub use crate::parameters::{AgentParameters, Parameter};
pub use crate::population::{AgentSnapshot, Placement, Population, PopulationConfig, Snapshot};
pub use crate::random::RandomSource;
pub use crate::region::{Bounds, Point, Region};
pub use crate::runner::{run_with_args, BaseArgs};
pub use crate::scheduler::Scheduler;
pub use crate::spatial::SpatialIndex;

// Re-exports for the `define_rng!` macro
pub use paste;
pub use rand;
