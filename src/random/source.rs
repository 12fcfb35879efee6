use std::any::{Any, TypeId};
use std::cell::{RefCell, RefMut};

use log::trace;

use crate::hashing::{hash_str, HashMap};
use crate::rand::distr::uniform::{SampleRange, SampleUniform};
use crate::rand::{Rng, SeedableRng};
use crate::random::RngId;

// This is a wrapper that allows for future support for different types of
// random number generators (anything that implements SeedableRng is valid).
struct RngHolder {
    rng: Box<dyn Any>,
}

/// Holds the base seed and one lazily created rng per [`RngId`].
///
/// The rng map is stored in a `RefCell` so that sampling only needs a shared
/// reference, which lets agent processes draw numbers while they hold mutable
/// borrows of other parts of the population.
pub struct RandomSource {
    base_seed: u64,
    rng_holders: RefCell<HashMap<TypeId, RngHolder>>,
}

impl RandomSource {
    #[must_use]
    pub fn new(base_seed: u64) -> RandomSource {
        trace!("initializing random source (seed={base_seed})");
        RandomSource {
            base_seed,
            rng_holders: RefCell::new(HashMap::default()),
        }
    }

    #[must_use]
    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    /// Gets a mutable reference to the random number generator associated with the given
    /// [`RngId`]. If the rng has not been used before, one will be created from the base seed.
    fn get_rng<R: RngId>(&self) -> RefMut<'_, R::RngType> {
        let rng_holders = self.rng_holders.borrow_mut();
        RefMut::map(rng_holders, |holders| {
            holders
                .entry(TypeId::of::<R>())
                // Create a new rng holder if it doesn't exist yet
                .or_insert_with(|| {
                    trace!(
                        "creating new RNG (seed={}) for {}",
                        self.base_seed,
                        R::get_name()
                    );
                    let seed_offset = hash_str(R::get_name());
                    RngHolder {
                        rng: Box::new(R::RngType::seed_from_u64(
                            self.base_seed.wrapping_add(seed_offset),
                        )),
                    }
                })
                .rng
                .downcast_mut::<R::RngType>()
                .expect("rng stored under the wrong type id")
        })
    }

    /// Gets a random sample from the rng associated with the given [`RngId`]
    /// by applying the specified sampler function.
    pub fn sample<R: RngId, T>(
        &self,
        _rng_type: R,
        sampler: impl FnOnce(&mut R::RngType) -> T,
    ) -> T {
        let mut rng = self.get_rng::<R>();
        sampler(&mut rng)
    }

    /// Gets a random sample within the range provided by `range`
    /// using the generator associated with the given [`RngId`].
    pub fn sample_range<R: RngId, S, T>(&self, rng_id: R, range: S) -> T
    where
        R::RngType: Rng,
        S: SampleRange<T>,
        T: SampleUniform,
    {
        self.sample(rng_id, |rng| rng.random_range(range))
    }

    /// Gets a random boolean value which is true with probability `p`
    /// using the generator associated with the given [`RngId`].
    ///
    /// # Panics
    ///
    /// Panics if `p` is outside `[0, 1]`.
    pub fn sample_bool<R: RngId>(&self, rng_id: R, p: f64) -> bool
    where
        R::RngType: Rng,
    {
        self.sample(rng_id, |rng| rng.random_bool(p))
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod test {
    use super::RandomSource;
    use crate::define_rng;
    use crate::rand::RngCore;

    define_rng!(FooRng);
    define_rng!(BarRng);

    #[test]
    fn get_rng_basic() {
        let random = RandomSource::new(42);

        assert_ne!(
            random.sample(FooRng, RngCore::next_u64),
            random.sample(FooRng, RngCore::next_u64)
        );
    }

    #[test]
    fn multiple_rng_types() {
        let random = RandomSource::new(42);

        assert_ne!(
            random.sample(FooRng, RngCore::next_u64),
            random.sample(BarRng, RngCore::next_u64)
        );
    }

    #[test]
    fn streams_are_independent() {
        let random = RandomSource::new(42);
        let first = random.sample(FooRng, RngCore::next_u64);

        let interleaved = RandomSource::new(42);
        interleaved.sample(BarRng, RngCore::next_u64);
        assert_eq!(first, interleaved.sample(FooRng, RngCore::next_u64));
    }

    #[test]
    fn same_seed_same_sequence() {
        let first = RandomSource::new(42);
        let second = RandomSource::new(42);
        assert_eq!(first.base_seed(), 42);
        assert_eq!(
            first.sample(FooRng, RngCore::next_u64),
            second.sample(FooRng, RngCore::next_u64)
        );
        assert_ne!(
            first.sample(FooRng, RngCore::next_u64),
            RandomSource::new(88).sample(FooRng, RngCore::next_u64)
        );
    }

    #[test]
    fn sample_range() {
        let random = RandomSource::new(42);
        let result = random.sample_range(FooRng, 0..10);
        assert!((0..10).contains(&result));
        let degenerate: f64 = random.sample_range(FooRng, 0.0..=0.0);
        assert!(degenerate.abs() < f64::EPSILON);
    }

    #[test]
    fn sample_bool_extremes() {
        let random = RandomSource::new(42);
        assert!(random.sample_bool(FooRng, 1.0));
        assert!(!random.sample_bool(FooRng, 0.0));
    }
}
