use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

pub use cell::*;
pub use error::*;
pub use field::*;
pub use generator::*;
pub use session::*;
pub use types::*;
pub use viewport::*;

mod cell;
mod error;
mod field;
mod generator;
mod session;
mod types;
mod viewport;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub width: Coord,
    pub height: Coord,
    pub mines: CellCount,
}

impl GameConfig {
    pub const fn new_unchecked(width: Coord, height: Coord, mines: CellCount) -> Self {
        Self {
            width,
            height,
            mines,
        }
    }

    /// Mine counts are kept as requested, generation clamps them to what fits.
    pub fn new(width: Coord, height: Coord, mines: CellCount) -> Result<Self> {
        if width < 1 || height < 1 {
            return Err(GameError::InvalidDimension);
        }
        Ok(Self::new_unchecked(width, height, mines))
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.width, self.height)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Difficulty::default().config()
    }
}

/// Built-in presets, each sized with a fifth of the cells mined.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    #[default]
    Intermediate,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Self::Beginner, Self::Intermediate, Self::Expert];

    pub const fn config(self) -> GameConfig {
        use Difficulty::*;
        match self {
            Beginner => GameConfig::new_unchecked(8, 8, 13),
            Intermediate => GameConfig::new_unchecked(10, 10, 20),
            Expert => GameConfig::new_unchecked(16, 16, 52),
        }
    }

    /// The preset matching `config` exactly, if any.
    pub fn from_config(config: &GameConfig) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|difficulty| difficulty.config() == *config)
    }

    pub const fn name(self) -> &'static str {
        use Difficulty::*;
        match self {
            Beginner => "beginner",
            Intermediate => "intermediate",
            Expert => "expert",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|difficulty| difficulty.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownDifficulty(s.to_owned()))
    }
}
