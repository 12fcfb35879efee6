//! Everything a typical driver needs in one import.
//!
//! ```rust
//! use contagion::prelude::*;
//! ```
pub use crate::agent::{AgentId, InfectionStatus};
pub use crate::error::ContagionError;
pub use crate::log::{debug, error, info, trace, warn};
pub use crate::parameters::{AgentParameters, Parameter};
pub use crate::population::{Placement, Population, PopulationConfig, Snapshot};
pub use crate::region::{Bounds, Point};
pub use crate::runner::{run_with_args, BaseArgs};
pub use crate::define_rng;
