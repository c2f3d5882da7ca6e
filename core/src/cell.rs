use serde::{Deserialize, Serialize};

use crate::{Coord, Coord2};

/// A single square of the field, as handed to the renderer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub row: Coord,
    pub column: Coord,
    pub is_mine: bool,
    pub is_flagged: bool,
    pub is_revealed: bool,
    /// Mines among the up to 8 surrounding cells, fixed once mines are placed.
    pub adjacent_mines: u8,
}

impl Cell {
    pub const fn empty((row, column): Coord2) -> Self {
        Self {
            row,
            column,
            is_mine: false,
            is_flagged: false,
            is_revealed: false,
            adjacent_mines: 0,
        }
    }

    pub const fn coords(&self) -> Coord2 {
        (self.row, self.column)
    }

    pub const fn is_cleared(&self) -> bool {
        (self.is_mine && self.is_flagged) || self.is_revealed
    }
}
