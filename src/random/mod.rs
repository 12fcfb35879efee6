//! Seeded, independent random number streams.
//!
//! Each concern of the model draws from its own stream, identified by a zero-sized type created
//! with [`define_rng!`]. Every stream is seeded from a shared base seed plus a hash of the
//! stream's name, so adding draws to one concern does not perturb the sequence seen by another.

mod macros;
mod source;

pub use macros::define_rng;
pub use source::RandomSource;

use crate::rand::SeedableRng;

pub trait RngId: Copy + Clone + 'static {
    type RngType: SeedableRng;
    fn get_name() -> &'static str;
}
