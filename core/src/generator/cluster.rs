use std::collections::BTreeSet;

use super::*;

const MINE_CLUSTER_RADIUS: i32 = 2;
const CLUSTER_PLACEMENT_ATTEMPTS: usize = 50;
const MINES_PER_CLUSTER: CellCount = 5;
const MAX_CLUSTERS: CellCount = 8;

/// Generation strategy that groups mines into a handful of pockets instead of spreading them evenly, optionally
/// keeping a starting cell and its neighbors free of mines.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterFieldGenerator {
    seed: u64,
    origin: Option<Coord2>,
}

impl ClusterFieldGenerator {
    pub fn new(seed: u64, origin: Option<Coord2>) -> Self {
        Self { seed, origin }
    }
}

impl FieldGenerator for ClusterFieldGenerator {
    fn generate(self, config: GameConfig) -> Result<Field> {
        use rand::prelude::*;

        let mut field = create_empty_field(config.width, config.height)?;

        let forbidden: BTreeSet<Coord2> = match self.origin {
            Some(origin) => {
                let origin = field.validate_coords(origin)?;
                field
                    .iter_neighbors(origin)
                    .chain(core::iter::once(origin))
                    .collect()
            }
            None => BTreeSet::new(),
        };

        let forbidden_count = CellCount::try_from(forbidden.len()).unwrap_or(CellCount::MAX);
        let placeable = config.total_cells().saturating_sub(forbidden_count);
        let mines = if config.mines > placeable {
            log::warn!(
                "Too many mines requested, clamped: requested {} but only {} fit",
                config.mines,
                placeable
            );
            placeable
        } else {
            config.mines
        };

        if mines == 0 {
            return Ok(field);
        }

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let centers = pick_cluster_centers(&mut rng, config, mines);

        for _ in 0..mines {
            let coords = pick_clustered(&mut rng, &centers, &field, &forbidden)
                .or_else(|| pick_uniform(&mut rng, &field, &forbidden));
            match coords {
                Some(coords) => field.place_mine(coords),
                None => break,
            }
        }

        // double check mine count
        if field.mine_count() != mines {
            log::warn!(
                "Generated field count mismatch, actual: {}, requested: {}",
                field.mine_count(),
                mines
            );
        }
        log::debug!(
            "generated {}x{} field with {} mines in {} clusters",
            config.width,
            config.height,
            field.mine_count(),
            centers.len()
        );
        Ok(field)
    }
}

fn is_free(field: &Field, forbidden: &BTreeSet<Coord2>, coords: Coord2) -> bool {
    !field[coords].is_mine && !forbidden.contains(&coords)
}

fn pick_cluster_centers(rng: &mut impl rand::Rng, config: GameConfig, mines: CellCount) -> Vec<Coord2> {
    let count = mines.div_ceil(MINES_PER_CLUSTER).clamp(1, MAX_CLUSTERS);
    (0..count)
        .map(|_| {
            (
                rng.random_range(0..config.height),
                rng.random_range(0..config.width),
            )
        })
        .collect()
}

/// Offsets a random cluster center by up to the cluster radius on each axis, clamped to the field.
fn pick_clustered(
    rng: &mut impl rand::Rng,
    centers: &[Coord2],
    field: &Field,
    forbidden: &BTreeSet<Coord2>,
) -> Option<Coord2> {
    let max_row = i32::from(field.height()) - 1;
    let max_column = i32::from(field.width()) - 1;

    for _ in 0..CLUSTER_PLACEMENT_ATTEMPTS {
        let (center_row, center_column) = centers[rng.random_range(0..centers.len())];
        let d_row = rng.random_range(-MINE_CLUSTER_RADIUS..=MINE_CLUSTER_RADIUS);
        let d_column = rng.random_range(-MINE_CLUSTER_RADIUS..=MINE_CLUSTER_RADIUS);

        let row = (i32::from(center_row) + d_row).clamp(0, max_row);
        let column = (i32::from(center_column) + d_column).clamp(0, max_column);
        // clamped into the field, so both fit a `Coord`
        let coords = (row as Coord, column as Coord);

        if is_free(field, forbidden, coords) {
            return Some(coords);
        }
    }

    None
}

/// Uniformly picks one of the remaining free cells.
fn pick_uniform(
    rng: &mut impl rand::Rng,
    field: &Field,
    forbidden: &BTreeSet<Coord2>,
) -> Option<Coord2> {
    let free: Vec<Coord2> = field
        .iter_cells()
        .map(Cell::coords)
        .filter(|&coords| is_free(field, forbidden, coords))
        .collect();

    if free.is_empty() {
        return None;
    }
    Some(free[rng.random_range(0..free.len())])
}
