use std::collections::BTreeSet;
use std::ops::Index;

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::*;

/// Immutable snapshot of the whole grid. Every operation that changes cells
/// returns a new `Field` and leaves its input untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Field {
    cells: Array2<Cell>,
    mine_count: CellCount,
}

/// Builds a `height` x `width` field with no mines and nothing revealed or flagged.
pub fn create_empty_field(width: Coord, height: Coord) -> Result<Field> {
    if width < 1 || height < 1 {
        return Err(GameError::InvalidDimension);
    }

    let cells = Array2::from_shape_fn((height.into(), width.into()), |(row, column)| {
        // both indices are bounded by `Coord` dimensions
        Cell::empty((row as Coord, column as Coord))
    });

    Ok(Field {
        cells,
        mine_count: 0,
    })
}

/// Reveals `coords`, cascading through orthogonally connected zero cells.
///
/// A target with mines around it (or a mine itself) is revealed alone. Otherwise
/// a depth-first fill reveals the connected region of zero cells together with
/// the numbered cells bordering it. Mines are never revealed by the cascade.
pub fn reveal_cells(field: &Field, coords: Coord2) -> Result<Field> {
    let coords = field.validate_coords(coords)?;
    let mut next = field.clone();

    let target = next[coords];
    if target.adjacent_mines != 0 || target.is_mine {
        next.cell_mut(coords).is_revealed = true;
        return Ok(next);
    }

    let mut stack = vec![coords];
    let mut visited = BTreeSet::new();

    while let Some(pos) = stack.pop() {
        if !visited.insert(pos) {
            continue;
        }
        next.cell_mut(pos).is_revealed = true;

        for neighbor in next.cells.iter_orthogonal(pos) {
            if visited.contains(&neighbor) {
                continue;
            }

            let cell = next.cell_mut(neighbor);
            if cell.is_mine {
                continue;
            }
            cell.is_revealed = true;

            if cell.adjacent_mines == 0 {
                stack.push(neighbor);
            } else {
                visited.insert(neighbor);
            }
        }
    }

    log::trace!("revealed {} cells from {:?}", visited.len(), coords);
    Ok(next)
}

/// True when every cell is either revealed or a correctly flagged mine.
pub fn check_if_game_won(field: &Field) -> bool {
    field.cells.iter().all(Cell::is_cleared)
}

impl Field {
    /// Builds a field with mines at exactly the given positions.
    pub fn from_mine_coords(width: Coord, height: Coord, mine_coords: &[Coord2]) -> Result<Self> {
        let mut field = create_empty_field(width, height)?;
        for &coords in mine_coords {
            let coords = field.validate_coords(coords)?;
            if !field[coords].is_mine {
                field.place_mine(coords);
            }
        }
        Ok(field)
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let (height, width) = self.cells.dim();
        if usize::from(coords.0) < height && usize::from(coords.1) < width {
            Ok(coords)
        } else {
            Err(GameError::OutOfRangeCoordinate)
        }
    }

    pub fn width(&self) -> Coord {
        self.cells.ncols().try_into().unwrap_or(Coord::MAX)
    }

    pub fn height(&self) -> Coord {
        self.cells.nrows().try_into().unwrap_or(Coord::MAX)
    }

    /// `(width, height)`
    pub fn size(&self) -> (Coord, Coord) {
        (self.width(), self.height())
    }

    pub fn total_cells(&self) -> CellCount {
        mult(self.width(), self.height())
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn flag_count(&self) -> CellCount {
        self.cells
            .iter()
            .filter(|cell| cell.is_flagged)
            .count()
            .try_into()
            .unwrap_or(CellCount::MAX)
    }

    pub fn revealed_count(&self) -> CellCount {
        self.cells
            .iter()
            .filter(|cell| cell.is_revealed)
            .count()
            .try_into()
            .unwrap_or(CellCount::MAX)
    }

    pub fn cell(&self, coords: Coord2) -> Option<&Cell> {
        self.cells.get(coords.to_nd_index())
    }

    pub fn rows(&self) -> impl Iterator<Item = ArrayView1<'_, Cell>> {
        self.cells.outer_iter()
    }

    pub fn iter_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// A fresh empty field with the same dimensions.
    pub fn cleared(&self) -> Self {
        Self {
            cells: Array2::from_shape_fn(self.cells.dim(), |(row, column)| {
                Cell::empty((row as Coord, column as Coord))
            }),
            mine_count: 0,
        }
    }

    /// Copy of this field with the flag on `coords` flipped.
    pub fn with_flag_toggled(&self, coords: Coord2) -> Result<Self> {
        let coords = self.validate_coords(coords)?;
        let mut next = self.clone();
        let cell = next.cell_mut(coords);
        cell.is_flagged = !cell.is_flagged;
        Ok(next)
    }

    pub(crate) fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.cells.iter_neighbors(coords)
    }

    /// Marks `coords` as a mine and bumps the counters around it.
    pub(crate) fn place_mine(&mut self, coords: Coord2) {
        self.cell_mut(coords).is_mine = true;
        self.mine_count += 1;
        for neighbor in self.iter_neighbors(coords) {
            self.cell_mut(neighbor).adjacent_mines += 1;
        }
    }

    fn cell_mut(&mut self, coords: Coord2) -> &mut Cell {
        &mut self.cells[coords.to_nd_index()]
    }
}

impl Index<Coord2> for Field {
    type Output = Cell;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.cells[coords.to_nd_index()]
    }
}
