use crate::*;
pub use cluster::*;

mod cluster;

pub trait FieldGenerator {
    fn generate(self, config: GameConfig) -> Result<Field>;
}

/// Builds a mined field of the given size, keeping `origin` and its neighbors clear.
///
/// Requests for more mines than fit are clamped to the number of placeable cells.
pub fn create_field(
    width: Coord,
    height: Coord,
    mines: CellCount,
    origin: Option<Coord2>,
    seed: u64,
) -> Result<Field> {
    let config = GameConfig::new(width, height, mines)?;
    ClusterFieldGenerator::new(seed, origin).generate(config)
}
