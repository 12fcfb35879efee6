//! A uniform-grid spatial hash.
//!
//! Space is cut into square cells of side `cell_size`; a point `(x, y)` lives in cell
//! `(floor(x / cell_size), floor(y / cell_size))`. The index maps each occupied cell to the keys
//! currently inside it, and remembers which cell every key was last written to, so insertion,
//! removal and moves are all constant time.
//!
//! Radius queries are answered at cell granularity: every key in a cell that overlaps the square
//! `[center - radius, center + radius]` is returned. Callers get a superset of the keys within
//! the Euclidean radius and must filter further if they need an exact circle.

use std::fmt::Debug;
use std::hash::Hash;

use crate::error::ContagionError;
use crate::hashing::HashMap;
use crate::region::Point;

/// Integer coordinates of a grid cell.
pub type CellKey = (i64, i64);

pub struct SpatialIndex<K> {
    cell_size: f64,
    cells: HashMap<CellKey, Vec<K>>,
    locations: HashMap<K, CellKey>,
}

impl<K: Copy + Eq + Hash + Debug> SpatialIndex<K> {
    /// # Errors
    ///
    /// Returns `ContagionError::InvalidConfig` unless `cell_size` is finite and positive.
    pub fn new(cell_size: f64) -> Result<SpatialIndex<K>, ContagionError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(ContagionError::InvalidConfig(format!(
                "cell size must be finite and positive, got {cell_size}"
            )));
        }
        Ok(SpatialIndex {
            cell_size,
            cells: HashMap::default(),
            locations: HashMap::default(),
        })
    }

    #[must_use]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn cell_key(&self, point: Point) -> CellKey {
        (
            (point.x / self.cell_size).floor() as i64,
            (point.y / self.cell_size).floor() as i64,
        )
    }

    /// The cell `key` was last written to
    #[must_use]
    pub fn cell_of(&self, key: K) -> Option<CellKey> {
        self.locations.get(&key).copied()
    }

    #[must_use]
    pub fn contains(&self, key: K) -> bool {
        self.locations.contains_key(&key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Number of cells holding at least one key
    #[must_use]
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Keys in exactly `cell`
    #[must_use]
    pub fn members(&self, cell: CellKey) -> &[K] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or_default()
    }

    /// # Errors
    ///
    /// Returns `ContagionError::DuplicateInsert` if `key` is already indexed.
    pub fn insert(&mut self, key: K, position: Point) -> Result<(), ContagionError> {
        if self.locations.contains_key(&key) {
            return Err(ContagionError::DuplicateInsert(format!("{key:?}")));
        }
        let cell = self.cell_key(position);
        self.locations.insert(key, cell);
        self.cells.entry(cell).or_default().push(key);
        Ok(())
    }

    /// Removes `key` from the cell it was last written to.
    ///
    /// # Errors
    ///
    /// Returns `ContagionError::NotFound` if `key` is not indexed.
    pub fn remove(&mut self, key: K) -> Result<(), ContagionError> {
        let cell = self
            .locations
            .remove(&key)
            .ok_or_else(|| ContagionError::NotFound(format!("{key:?}")))?;
        self.detach(key, cell)
    }

    /// Moves `key` to the cell of `position` in a single step. When the cell does not change the
    /// index is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `ContagionError::NotFound` if `key` is not indexed; the index is unchanged.
    pub fn move_to(&mut self, key: K, position: Point) -> Result<(), ContagionError> {
        let new_cell = self.cell_key(position);
        let old_cell = self
            .locations
            .get_mut(&key)
            .ok_or_else(|| ContagionError::NotFound(format!("{key:?}")))?;
        if *old_cell == new_cell {
            return Ok(());
        }
        let old_cell = std::mem::replace(old_cell, new_cell);
        self.detach(key, old_cell)?;
        self.cells.entry(new_cell).or_default().push(key);
        Ok(())
    }

    fn detach(&mut self, key: K, cell: CellKey) -> Result<(), ContagionError> {
        let members = self
            .cells
            .get_mut(&cell)
            .ok_or_else(|| ContagionError::NotFound(format!("{key:?} in cell {cell:?}")))?;
        let slot = members
            .iter()
            .position(|member| *member == key)
            .ok_or_else(|| ContagionError::NotFound(format!("{key:?} in cell {cell:?}")))?;
        members.swap_remove(slot);
        if members.is_empty() {
            self.cells.remove(&cell);
        }
        Ok(())
    }

    /// All keys in cells overlapping the box `[min, max]`. No ordering is guaranteed.
    #[must_use]
    pub fn query_box(&self, min: Point, max: Point) -> Vec<K> {
        let (x_lo, y_lo) = self.cell_key(min);
        let (x_hi, y_hi) = self.cell_key(max);
        if x_lo > x_hi || y_lo > y_hi {
            return Vec::new();
        }

        #[allow(clippy::cast_sign_loss)]
        let spanned = x_hi
            .saturating_sub(x_lo)
            .saturating_add(1)
            .saturating_mul(y_hi.saturating_sub(y_lo).saturating_add(1)) as u64;
        let mut found = Vec::new();
        if spanned > self.cells.len() as u64 {
            // Sparse grid under a large box: walk the occupied cells instead
            for ((x, y), members) in &self.cells {
                if (x_lo..=x_hi).contains(x) && (y_lo..=y_hi).contains(y) {
                    found.extend_from_slice(members);
                }
            }
        } else {
            for x in x_lo..=x_hi {
                for y in y_lo..=y_hi {
                    found.extend_from_slice(self.members((x, y)));
                }
            }
        }
        found
    }

    /// All keys in cells overlapping the square of half-side `radius` around `center`.
    /// Never misses a key within Euclidean distance `radius`; may return keys farther away.
    #[must_use]
    pub fn query_radius(&self, center: Point, radius: f64) -> Vec<K> {
        self.query_box(
            Point::new(center.x - radius, center.y - radius),
            Point::new(center.x + radius, center.y + radius),
        )
    }
}
