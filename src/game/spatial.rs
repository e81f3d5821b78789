//! Uniform grid broad-phase over all dynamic shapes.
//!
//! The grid is rebuilt from scratch once per physics sub-step; with entity
//! counts in the tens, a full rebuild is cheaper than incremental updates.
//! Queries return candidate shapes from every cell the query circle covers.

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::util::vec2::Vec2;

/// Grid cell key - (x, y) cell coordinates
pub type CellKey = (i32, i32);

/// Default cell size in world units. Large enough that a shape rarely spans
/// more than a 2x2 block of cells.
pub const DEFAULT_CELL_SIZE: f32 = 256.0;

/// Reference to a dynamic shape tracked by the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeRef {
    Ball(usize),
    Projectile(usize),
}

/// Uniform spatial hash grid for broad-phase collision candidates.
pub struct SpatialGrid {
    cell_size: f32,
    inv_cell_size: f32,
    cells: HashMap<CellKey, SmallVec<[ShapeRef; 8]>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            cells: HashMap::with_capacity(64),
        }
    }

    /// Drop all shapes, keeping cell allocations for reuse.
    pub fn clear(&mut self) {
        for cell in self.cells.values_mut() {
            cell.clear();
        }
    }

    #[inline]
    fn cell_range(&self, position: Vec2, radius: f32) -> (i32, i32, i32, i32) {
        let min_x = ((position.x - radius) * self.inv_cell_size).floor() as i32;
        let max_x = ((position.x + radius) * self.inv_cell_size).floor() as i32;
        let min_y = ((position.y - radius) * self.inv_cell_size).floor() as i32;
        let max_y = ((position.y + radius) * self.inv_cell_size).floor() as i32;
        (min_x, max_x, min_y, max_y)
    }

    /// Insert a shape into every cell its bounding circle covers.
    pub fn insert(&mut self, shape: ShapeRef, position: Vec2, radius: f32) {
        let (min_x, max_x, min_y, max_y) = self.cell_range(position, radius);
        for x in min_x..=max_x {
            for y in min_y..=max_y {
                self.cells.entry((x, y)).or_default().push(shape);
            }
        }
    }

    /// Candidate shapes whose cells overlap the query circle. May contain
    /// duplicates for shapes spanning several cells and always contains the
    /// querying shape itself; callers filter both.
    pub fn query_circle(&self, position: Vec2, radius: f32) -> impl Iterator<Item = ShapeRef> + '_ {
        let (min_x, max_x, min_y, max_y) = self.cell_range(position, radius);
        (min_x..=max_x).flat_map(move |x| {
            (min_y..=max_y).flat_map(move |y| {
                self.cells
                    .get(&(x, y))
                    .into_iter()
                    .flat_map(|cell| cell.iter().copied())
            })
        })
    }

    /// Total shapes currently indexed (counting multi-cell duplicates once
    /// per cell).
    pub fn len(&self) -> usize {
        self.cells.values().map(|c| c.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.values().all(|c| c.is_empty())
    }
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}
