use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    #[default]
    Idle,
    Playing,
    GameOver,
    GameWon,
}

impl GamePhase {
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::GameOver | Self::GameWon)
    }
}

/// Whether mines exist yet. They are only placed on the first trigger so that it can never hit one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MineState {
    Unseeded,
    Seeded { seed: u64 },
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TriggerOutcome {
    NoChange,
    Started,
    Revealed,
    HitMine,
    Won,
}

impl TriggerOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FlagOutcome {
    NoChange,
    Changed,
    Won,
}

impl FlagOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

/// Owns the current field and game phase. The command methods are the only way to change either, and the field
/// handed out by [`Session::field`] is an immutable snapshot.
#[derive(Clone, Debug)]
pub struct Session {
    config: GameConfig,
    field: Field,
    phase: GamePhase,
    mine_state: MineState,
    triggered_mine: Option<Coord2>,
    seeder: SmallRng,
}

impl Session {
    /// Creates an idle session; `seed` drives every field this session generates.
    pub fn new(config: GameConfig, seed: u64) -> Result<Self> {
        let config = GameConfig::new(config.width, config.height, config.mines)?;
        let field = create_empty_field(config.width, config.height)?;
        Ok(Self {
            config,
            field,
            phase: GamePhase::Idle,
            mine_state: MineState::Unseeded,
            triggered_mine: None,
            seeder: SmallRng::seed_from_u64(seed),
        })
    }

    /// Resumes play on an already mined field.
    #[cfg(test)]
    pub(crate) fn from_field(field: Field, seed: u64) -> Self {
        let (width, height) = field.size();
        let phase = if check_if_game_won(&field) {
            GamePhase::GameWon
        } else {
            GamePhase::Playing
        };
        Self {
            config: GameConfig::new_unchecked(width, height, field.mine_count()),
            field,
            phase,
            mine_state: MineState::Seeded { seed },
            triggered_mine: None,
            seeder: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn width(&self) -> Coord {
        self.config.width
    }

    pub fn height(&self) -> Coord {
        self.config.height
    }

    pub fn mines(&self) -> CellCount {
        self.config.mines
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn mine_state(&self) -> MineState {
        self.mine_state
    }

    /// The mine that ended the game, if it was lost.
    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    /// Mines minus flags, negative when over-flagged.
    pub fn mines_left(&self) -> i64 {
        let mines = match self.mine_state {
            MineState::Unseeded => self.config.mines,
            MineState::Seeded { .. } => self.field.mine_count(),
        };
        i64::from(mines) - i64::from(self.field.flag_count())
    }

    /// Whether the view should recenter the field, true after every reset.
    pub fn wants_auto_fit(&self) -> bool {
        self.phase.is_idle() && self.config.width > 0 && self.config.height > 0
    }

    /// Reveals `coords`. The first trigger of a game places the mines around it.
    pub fn trigger_cell(&mut self, coords: Coord2) -> Result<TriggerOutcome> {
        use GamePhase::*;
        use TriggerOutcome::*;

        let coords = self.field.validate_coords(coords)?;

        match self.phase {
            GameOver | GameWon => Ok(NoChange),
            Idle => {
                let seed = self.seeder.random::<u64>();
                let field = ClusterFieldGenerator::new(seed, Some(coords)).generate(self.config)?;
                self.field = reveal_cells(&field, coords)?;
                self.mine_state = MineState::Seeded { seed };
                self.set_phase(Playing);

                if check_if_game_won(&self.field) {
                    self.set_phase(GameWon);
                    Ok(Won)
                } else {
                    Ok(Started)
                }
            }
            Playing => {
                if self.field[coords].is_mine {
                    self.triggered_mine = Some(coords);
                    self.set_phase(GameOver);
                    return Ok(HitMine);
                }

                let next = reveal_cells(&self.field, coords)?;
                let changed = next != self.field;
                self.field = next;

                if check_if_game_won(&self.field) {
                    self.set_phase(GameWon);
                    Ok(Won)
                } else if changed {
                    Ok(Revealed)
                } else {
                    Ok(NoChange)
                }
            }
        }
    }

    /// Toggles the flag on an unrevealed cell. Only accepted while playing, before the first trigger there are no
    /// mines to mark and finished games are frozen.
    pub fn flag_cell(&mut self, coords: Coord2) -> Result<FlagOutcome> {
        let coords = self.field.validate_coords(coords)?;

        if self.phase != GamePhase::Playing || self.field[coords].is_revealed {
            return Ok(FlagOutcome::NoChange);
        }

        self.field = self.field.with_flag_toggled(coords)?;

        if check_if_game_won(&self.field) {
            self.set_phase(GamePhase::GameWon);
            Ok(FlagOutcome::Won)
        } else {
            Ok(FlagOutcome::Changed)
        }
    }

    pub fn reset_game(&mut self) {
        self.field = self.field.cleared();
        self.mine_state = MineState::Unseeded;
        self.triggered_mine = None;
        self.set_phase(GamePhase::Idle);
    }

    pub fn set_config(&mut self, width: Coord, height: Coord, mines: CellCount) -> Result<()> {
        let config = GameConfig::new(width, height, mines)?;
        self.field = create_empty_field(width, height)?;
        self.config = config;
        self.mine_state = MineState::Unseeded;
        self.triggered_mine = None;
        log::debug!("config: {:?}", config);
        self.set_phase(GamePhase::Idle);
        Ok(())
    }

    fn set_phase(&mut self, phase: GamePhase) {
        if self.phase != phase {
            log::debug!("phase: {:?} -> {:?}", self.phase, phase);
        }
        self.phase = phase;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(width: Coord, height: Coord, mines: &[Coord2]) -> Session {
        Session::from_field(Field::from_mine_coords(width, height, mines).unwrap(), 0)
    }

    #[test]
    fn new_session_is_idle_and_empty() {
        let session = Session::new(GameConfig::default(), 1).unwrap();

        assert_eq!(session.phase(), GamePhase::Idle);
        assert_eq!(session.mine_state(), MineState::Unseeded);
        assert_eq!(session.field(), &create_empty_field(10, 10).unwrap());
        assert_eq!(session.mines_left(), 20);
        assert!(session.wants_auto_fit());
    }

    #[test]
    fn first_trigger_never_hits_a_mine() {
        for seed in 0..50 {
            let mut session = Session::new(Difficulty::Expert.config(), seed).unwrap();

            let outcome = session.trigger_cell((7, 9)).unwrap();

            assert_eq!(outcome, TriggerOutcome::Started);
            assert_eq!(session.phase(), GamePhase::Playing);
            assert!(!session.field()[(7, 9)].is_mine);
            assert!(session.field()[(7, 9)].is_revealed);
            assert_eq!(session.field().mine_count(), 52);
            assert!(matches!(session.mine_state(), MineState::Seeded { .. }));
        }
    }

    #[test]
    fn single_cell_without_mines_is_won_immediately() {
        let mut session = Session::new(GameConfig::new(1, 1, 0).unwrap(), 0).unwrap();

        assert_eq!(session.trigger_cell((0, 0)).unwrap(), TriggerOutcome::Won);
        assert_eq!(session.phase(), GamePhase::GameWon);
    }

    #[test]
    fn hitting_a_mine_ends_the_game_without_touching_the_field() {
        let mut session = playing(3, 3, &[(0, 0)]);
        let before = session.field().clone();

        assert_eq!(session.trigger_cell((0, 0)).unwrap(), TriggerOutcome::HitMine);
        assert_eq!(session.phase(), GamePhase::GameOver);
        assert_eq!(session.triggered_mine(), Some((0, 0)));
        assert_eq!(session.field(), &before);

        assert_eq!(session.trigger_cell((2, 2)).unwrap(), TriggerOutcome::NoChange);
        assert_eq!(session.flag_cell((2, 2)).unwrap(), FlagOutcome::NoChange);
        assert_eq!(session.phase(), GamePhase::GameOver);
    }

    #[test]
    fn win_needs_every_mine_flagged() {
        let mut session = playing(3, 3, &[(0, 0)]);

        assert_eq!(session.trigger_cell((1, 1)).unwrap(), TriggerOutcome::Revealed);
        assert_eq!(session.trigger_cell((1, 1)).unwrap(), TriggerOutcome::NoChange);
        assert_eq!(session.trigger_cell((2, 2)).unwrap(), TriggerOutcome::Revealed);
        assert_eq!(session.field().revealed_count(), 8);
        assert_eq!(session.phase(), GamePhase::Playing);

        assert_eq!(session.flag_cell((0, 0)).unwrap(), FlagOutcome::Won);
        assert_eq!(session.phase(), GamePhase::GameWon);
    }

    #[test]
    fn flagged_mines_count_towards_the_win() {
        let mut session = playing(3, 1, &[(0, 0)]);

        assert_eq!(session.trigger_cell((0, 1)).unwrap(), TriggerOutcome::Revealed);
        assert_eq!(session.phase(), GamePhase::Playing);
        assert_eq!(session.flag_cell((0, 0)).unwrap(), FlagOutcome::Changed);
        assert_eq!(session.mines_left(), 0);

        assert_eq!(session.trigger_cell((0, 2)).unwrap(), TriggerOutcome::Won);
    }

    #[test]
    fn flag_toggles_back_and_forth() {
        let mut session = playing(4, 4, &[(0, 0), (3, 3)]);

        assert_eq!(session.flag_cell((1, 2)).unwrap(), FlagOutcome::Changed);
        assert!(session.field()[(1, 2)].is_flagged);
        assert_eq!(session.mines_left(), 1);

        assert_eq!(session.flag_cell((1, 2)).unwrap(), FlagOutcome::Changed);
        assert!(!session.field()[(1, 2)].is_flagged);
        assert_eq!(session.mines_left(), 2);
    }

    #[test]
    fn flag_is_ignored_before_first_trigger_and_on_revealed_cells() {
        let mut session = Session::new(GameConfig::new(5, 5, 3).unwrap(), 3).unwrap();
        assert_eq!(session.flag_cell((0, 0)).unwrap(), FlagOutcome::NoChange);
        assert_eq!(session.field().flag_count(), 0);

        session.trigger_cell((2, 2)).unwrap();
        assert_eq!(session.flag_cell((2, 2)).unwrap(), FlagOutcome::NoChange);
    }

    #[test]
    fn out_of_range_commands_are_rejected() {
        let mut session = Session::new(GameConfig::new(2, 2, 1).unwrap(), 0).unwrap();

        assert_eq!(session.trigger_cell((2, 0)), Err(GameError::OutOfRangeCoordinate));
        assert_eq!(session.flag_cell((0, 2)), Err(GameError::OutOfRangeCoordinate));
        assert_eq!(session.phase(), GamePhase::Idle);
    }

    #[test]
    fn reset_returns_to_idle_with_an_empty_field() {
        let mut session = Session::new(GameConfig::default(), 5).unwrap();
        session.trigger_cell((0, 0)).unwrap();
        assert_eq!(session.phase(), GamePhase::Playing);

        session.reset_game();

        assert_eq!(session.phase(), GamePhase::Idle);
        assert_eq!(session.mine_state(), MineState::Unseeded);
        assert!(session.field().iter_cells().all(|cell| *cell == Cell::empty(cell.coords())));
        assert!(session.wants_auto_fit());
    }

    #[test]
    fn set_config_replaces_dimensions() {
        let mut session = Session::new(GameConfig::default(), 5).unwrap();
        session.trigger_cell((3, 3)).unwrap();

        session.set_config(8, 8, 10).unwrap();

        assert_eq!(session.width(), 8);
        assert_eq!(session.height(), 8);
        assert_eq!(session.mines(), 10);
        assert_eq!(session.phase(), GamePhase::Idle);
        assert_eq!(session.field(), &create_empty_field(8, 8).unwrap());
    }

    #[test]
    fn set_config_rejects_zero_dimensions() {
        let mut session = Session::new(GameConfig::default(), 5).unwrap();

        assert_eq!(session.set_config(0, 8, 10), Err(GameError::InvalidDimension));
        assert_eq!(session.config(), GameConfig::default());
    }

    #[test]
    fn new_games_get_different_fields() {
        let mut session = Session::new(GameConfig::default(), 11).unwrap();
        session.trigger_cell((0, 0)).unwrap();
        let first = session.field().clone();

        session.reset_game();
        session.trigger_cell((0, 0)).unwrap();

        assert_ne!(session.field(), &first);
    }
}
