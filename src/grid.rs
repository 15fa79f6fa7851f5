use std::fmt;

use bevy::{
    math::{ivec2, uvec2, IVec2, UVec2},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::prelude::{BOARD_HEIGHT, BOARD_WIDTH};

/// Number of generations a [`Grid`] has advanced since it was last cleared or rebuilt.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Generation(pub u64);

impl Generation {
    pub const ZERO: Self = Self(0);

    #[inline]
    fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors raised when building or addressing a [`Grid`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("matrix is {rows} rows of {cols} cells, board is {height} rows of {width} cells")]
    DimensionMismatch {
        width: usize,
        height: usize,
        rows: usize,
        cols: usize,
    },
    #[error("cell ({row}, {col}) is outside the {width}x{height} board")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        width: usize,
        height: usize,
    },
    #[error("flat pattern holds {actual} cells, board needs {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("a {width}x{height} board exceeds the {} cell side limit", MAX_SIDE)]
    TooLarge { width: usize, height: usize },
}

/// Longest side a [`Grid`] may have. Coordinates are handled as `i32` when wrapping.
pub const MAX_SIDE: usize = i32::MAX as usize;

/// A fixed-size Game of Life board whose edges wrap around (a torus).
///
/// Cells are stored row-major. Direct addressing through [`Grid::get`], [`Grid::set`] and
/// [`Grid::toggle`] is bounds-checked; only neighbour lookups wrap.
///
/// Equality compares dimensions and cells; the generation counter is ignored.
#[derive(Resource, Debug, Clone)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<bool>,
    generation: Generation,
}

impl Grid {
    /// An all-dead board at generation zero.
    ///
    /// # Panics
    ///
    /// If either side exceeds [`MAX_SIDE`] or the cell count overflows `usize`. Use
    /// [`Grid::try_new`] for sizes that come from outside the program.
    pub fn new(width: usize, height: usize) -> Self {
        Self::try_new(width, height).unwrap_or_else(|err| panic!("{err}"))
    }

    pub fn try_new(width: usize, height: usize) -> Result<Self, GridError> {
        let len = Self::cell_count(width, height)?;
        Ok(Self::from_cells(width, height, vec![false; len]))
    }

    /// `width * height`, or `TooLarge` when the board cannot be addressed.
    pub(crate) fn cell_count(width: usize, height: usize) -> Result<usize, GridError> {
        width
            .checked_mul(height)
            .filter(|_| width <= MAX_SIDE && height <= MAX_SIDE)
            .ok_or(GridError::TooLarge { width, height })
    }

    /// Builds a board from `height` rows of exactly `width` cells each.
    pub fn from_matrix<R: AsRef<[bool]>>(
        width: usize,
        height: usize,
        matrix: &[R],
    ) -> Result<Self, GridError> {
        Self::cell_count(width, height)?;
        let mismatch = |cols| GridError::DimensionMismatch {
            width,
            height,
            rows: matrix.len(),
            cols,
        };
        if matrix.len() != height {
            return Err(mismatch(matrix.first().map_or(0, |row| row.as_ref().len())));
        }
        if let Some(row) = matrix.iter().find(|row| row.as_ref().len() != width) {
            return Err(mismatch(row.as_ref().len()));
        }

        let cells = matrix
            .iter()
            .flat_map(|row| row.as_ref().iter().copied())
            .collect();
        Ok(Self::from_cells(width, height, cells))
    }

    /// Caller guarantees `cells.len() == width * height`.
    pub(crate) fn from_cells(width: usize, height: usize, cells: Vec<bool>) -> Self {
        debug_assert_eq!(cells.len(), width * height);
        Self {
            width,
            height,
            cells,
            generation: Generation::ZERO,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Row-major view of every cell.
    #[inline]
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    /// Iterates the board one row slice at a time, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        (0..self.height).map(move |row| &self.cells[row * self.width..(row + 1) * self.width])
    }

    pub fn to_matrix(&self) -> Vec<Vec<bool>> {
        self.rows().map(<[bool]>::to_vec).collect()
    }

    /// Flat position of `(row, col)`, or `None` when it lies off the board.
    #[inline]
    pub fn index_of(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.height && col < self.width)
            .then(|| self.cell_coord_to_idx(uvec2(col as u32, row as u32)))
    }

    /// `(row, col)` of a flat position, or `None` when it lies off the board.
    #[inline]
    pub fn coord_of(&self, index: usize) -> Option<(usize, usize)> {
        (index < self.cells.len()).then(|| {
            let cell_coord = self.idx_to_cell_coord(index);
            (cell_coord.y as usize, cell_coord.x as usize)
        })
    }

    pub fn get(&self, row: usize, col: usize) -> Result<bool, GridError> {
        let idx = self.checked_index(row, col)?;
        Ok(self.cells[idx])
    }

    pub fn set(&mut self, row: usize, col: usize, alive: bool) -> Result<(), GridError> {
        let idx = self.checked_index(row, col)?;
        self.cells[idx] = alive;
        Ok(())
    }

    /// Flips a single cell between alive and dead.
    pub fn toggle(&mut self, row: usize, col: usize) -> Result<(), GridError> {
        let idx = self.checked_index(row, col)?;
        self.cells[idx] = !self.cells[idx];
        Ok(())
    }

    /// Flips the cell at a flat row-major position, as reported by a grid view.
    pub fn toggle_index(&mut self, index: usize) -> Result<(), GridError> {
        match self.coord_of(index) {
            Some((row, col)) => self.toggle(row, col),
            None => Err(GridError::IndexOutOfBounds {
                row: index / self.width.max(1),
                col: index % self.width.max(1),
                width: self.width,
                height: self.height,
            }),
        }
    }

    /// Kills every cell and rewinds the generation counter.
    pub fn clear(&mut self) {
        self.cells.fill(false);
        self.generation = Generation::ZERO;
    }

    /// Seeds every cell at random and rewinds the generation counter.
    pub fn randomize(&mut self, rng: &mut fastrand::Rng) {
        self.cells.iter_mut().for_each(|cell| *cell = rng.bool());
        self.generation = Generation::ZERO;
    }

    pub fn alive_count(&self) -> usize {
        self.cells.iter().filter(|alive| **alive).count()
    }

    pub fn dead_count(&self) -> usize {
        self.cells.len() - self.alive_count()
    }

    /// Flat indices of the eight cells surrounding `(row, col)`, wrapping at the edges.
    ///
    /// Order is row by row: the three above, left, right, then the three below.
    pub fn neighbour_indices(&self, row: usize, col: usize) -> Result<[usize; 8], GridError> {
        let idx = self.checked_index(row, col)?;
        Ok(self.wrapped_neighbours(idx))
    }

    /// Live-neighbour count of every cell, read from the current board only.
    ///
    /// Every live cell adds one to each of its eight wrapped neighbours. Each neighbour offset
    /// is a translation of the torus, so a cell never collects more than eight.
    pub fn neighbour_counts(&self) -> Vec<u8> {
        let mut counts = vec![0u8; self.cells.len()];
        for idx in self.alive_indices() {
            for neigh_idx in self.wrapped_neighbours(idx) {
                counts[neigh_idx] += 1;
            }
        }
        counts
    }

    /// Advances the whole board by one generation and returns the new generation number.
    pub fn step(&mut self) -> Generation {
        let counts = self.neighbour_counts();
        let next = self
            .cells
            .iter()
            .zip(&counts)
            .map(|(&alive, &nval)| fate(nval).unwrap_or(alive))
            .collect();

        self.cells = next;
        self.generation = self.generation.next();
        self.generation
    }

    fn alive_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(idx, &alive)| alive.then_some(idx))
    }

    fn checked_index(&self, row: usize, col: usize) -> Result<usize, GridError> {
        self.index_of(row, col).ok_or(GridError::IndexOutOfBounds {
            row,
            col,
            width: self.width,
            height: self.height,
        })
    }

    #[inline]
    fn size(&self) -> IVec2 {
        ivec2(self.width as i32, self.height as i32)
    }

    #[inline]
    fn cell_coord_to_idx(&self, cell_coord: UVec2) -> usize {
        cell_coord.y as usize * self.width + cell_coord.x as usize
    }

    #[inline]
    fn idx_to_cell_coord(&self, idx: usize) -> UVec2 {
        uvec2((idx % self.width) as u32, (idx / self.width) as u32)
    }

    /// `idx` must be on the board.
    fn wrapped_neighbours(&self, idx: usize) -> [usize; 8] {
        let cell_coord = self.idx_to_cell_coord(idx).as_ivec2();
        let size = self.size();

        let mut result = [0; 8];
        for (i, pos_offs) in (-1..=1)
            .flat_map(|y| (-1..=1).map(move |x| ivec2(x, y)))
            .filter(|pos_offs| *pos_offs != IVec2::ZERO)
            .enumerate()
        {
            let neigh_pos = (cell_coord + pos_offs).rem_euclid(size);
            result[i] = self.cell_coord_to_idx(neigh_pos.as_uvec2());
        }
        result
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(BOARD_WIDTH, BOARD_HEIGHT)
    }
}

impl PartialEq for Grid {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.cells == other.cells
    }
}

impl Eq for Grid {}

/// What the rule does to a cell with `neighbours` live neighbours.
///
/// `Some(alive)` forces the next state; `None` keeps the current one. Every count falls in
/// exactly one arm.
#[inline]
pub fn fate(neighbours: u8) -> Option<bool> {
    match neighbours {
        // underpopulation
        0 | 1 => Some(false),
        2 => None,
        // birth, or survival for a cell that is already alive
        3 => Some(true),
        // overcrowding
        _ => Some(false),
    }
}
