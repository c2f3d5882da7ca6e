use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Field width and height must be at least 1")]
    InvalidDimension,
    #[error("Coordinates are outside of the field")]
    OutOfRangeCoordinate,
}

pub type Result<T> = core::result::Result<T, GameError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown difficulty {0:?}")]
pub struct UnknownDifficulty(pub String);
