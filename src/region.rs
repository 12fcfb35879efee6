//! Geometry shared by every agent: the rectangular region they live in and
//! the popular places they travel to.

use serde::{Deserialize, Serialize};

use crate::error::ContagionError;
use crate::rand::Rng;
use crate::random::{RandomSource, RngId};

/// A continuous 2D coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point { x, y }
    }
}

/// An axis-aligned rectangle given as a `(min, max)` pair per axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: (f64, f64),
    pub y: (f64, f64),
}

impl Bounds {
    #[must_use]
    pub const fn new(x: (f64, f64), y: (f64, f64)) -> Bounds {
        Bounds { x, y }
    }

    /// Checks that each axis has `min < max` and a finite width.
    ///
    /// # Errors
    ///
    /// Returns `ContagionError::InvalidBounds` naming the first bad axis.
    pub fn validate(&self) -> Result<(), ContagionError> {
        for (axis, (min, max)) in [('x', self.x), ('y', self.y)] {
            // A finite width also rules out infinite or NaN endpoints
            if !(min < max && (max - min).is_finite()) {
                return Err(ContagionError::InvalidBounds { axis, min, max });
            }
        }
        Ok(())
    }

    /// Inclusive on both ends.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        (self.x.0..=self.x.1).contains(&point.x) && (self.y.0..=self.y.1).contains(&point.y)
    }

    #[must_use]
    pub fn clamp(&self, point: Point) -> Point {
        Point {
            x: point.x.clamp(self.x.0, self.x.1),
            y: point.y.clamp(self.y.0, self.y.1),
        }
    }

    /// A point drawn uniformly inside the bounds from the `rng_id` stream.
    ///
    /// # Panics
    ///
    /// Panics if the bounds have not passed [`Bounds::validate`].
    pub fn sample_point<R: RngId>(&self, random: &RandomSource, rng_id: R) -> Point
    where
        R::RngType: Rng,
    {
        Point {
            x: random.sample_range(rng_id, self.x.0..=self.x.1),
            y: random.sample_range(rng_id, self.y.0..=self.y.1),
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Bounds::new((0.0, 200.0), (0.0, 200.0))
    }
}

/// The read-only surroundings of a population.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub bounds: Bounds,
    pub popular_places: Vec<Point>,
}
