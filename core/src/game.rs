use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::*;

/// Default pixel size of a cell, matches the classic sprite sheet.
pub const DEFAULT_CELL_SIZE: u16 = 16;

/// Fixed difficulty presets.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Easy,
    Medium,
    Difficult,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Easy, Mode::Medium, Mode::Difficult];

    pub const fn config(self) -> GameConfig {
        match self {
            Self::Easy => GameConfig::new_unchecked((9, 9), 10),
            Self::Medium => GameConfig::new_unchecked((16, 16), 40),
            Self::Difficult => GameConfig::new_unchecked((30, 16), 99),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Difficult => "difficult",
        }
    }
}

impl FromStr for Mode {
    type Err = GameError;

    fn from_str(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.name() == name)
            .ok_or(GameError::UnknownMode)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Valid transitions:
/// - Active -> Won
/// - Active -> Lost
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    #[default]
    Active,
    /// Every safe cell was revealed
    Won,
    /// A mine was revealed
    Lost,
}

impl GameState {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// Pointer buttons the game cares about, independent of device numbering.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerButton {
    Primary,
    Auxiliary,
    Secondary,
}

impl PointerButton {
    /// Maps a DOM-style button code (0 primary, 1 auxiliary, 2 secondary).
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Self::Primary),
            1 => Some(Self::Auxiliary),
            2 => Some(Self::Secondary),
            _ => None,
        }
    }

    const fn slot(self) -> usize {
        match self {
            Self::Primary => 0,
            Self::Auxiliary => 1,
            Self::Secondary => 2,
        }
    }
}

/// Which buttons are currently held down, and over which cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldButtons([Option<Coord2>; 3]);

impl HeldButtons {
    pub fn get(&self, button: PointerButton) -> Option<Coord2> {
        self.0[button.slot()]
    }

    pub fn set(&mut self, button: PointerButton, coords: Option<Coord2>) {
        self.0[button.slot()] = coords;
    }

    pub fn is_held_at(&self, button: PointerButton, coords: Coord2) -> bool {
        self.get(button) == Some(coords)
    }
}

/// Represents a game from start to finish
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Game {
    mode: Mode,
    grid: Grid,
    state: GameState,
    held: HeldButtons,
    cell_size: u16,
}

impl Game {
    pub fn new(mode: Mode, generator: impl MineGenerator) -> Result<Self> {
        let grid = Grid::generate(mode.config(), generator)?;
        log::debug!("New {} game", mode);
        Ok(Self {
            mode,
            grid,
            state: Default::default(),
            held: Default::default(),
            cell_size: DEFAULT_CELL_SIZE,
        })
    }

    /// Overrides the pixel size used to translate pointer positions, zero is ignored.
    pub fn with_cell_size(mut self, cell_size: u16) -> Self {
        if cell_size == 0 {
            log::warn!("Ignoring zero cell size, keeping {}", self.cell_size);
        } else {
            self.cell_size = cell_size;
        }
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self.state, GameState::Lost)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn size(&self) -> Coord2 {
        self.grid.size()
    }

    pub fn cell_size(&self) -> u16 {
        self.cell_size
    }

    pub fn held_buttons(&self) -> HeldButtons {
        self.held
    }

    pub fn cell_view(&self, coords: Coord2) -> Result<CellView> {
        let coords = self.grid.validate_coords(coords)?;
        Ok(self.grid.view(coords))
    }

    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.grid.triggered_mine()
    }

    /// How many mines have not been flagged yet, negative when over-flagged.
    pub fn mines_left(&self) -> i32 {
        i32::from(self.grid.total_mines()) - i32::from(self.grid.flagged_count())
    }

    /// Translates a pixel position into grid coordinates, rejecting anything off the board.
    pub fn grid_coords(&self, (px, py): PixelPos) -> Result<Coord2> {
        let size = i32::from(self.cell_size);
        let x = px.div_euclid(size);
        let y = py.div_euclid(size);
        let coords = (
            Coord::try_from(x).map_err(|_| GameError::InvalidCoords)?,
            Coord::try_from(y).map_err(|_| GameError::InvalidCoords)?,
        );
        self.grid.validate_coords(coords)
    }

    pub fn pressed(&mut self, pos: PixelPos, button: PointerButton) {
        let coords = self.grid_coords(pos).ok();
        log::trace!("{:?} pressed over {:?}", button, coords);
        self.held.set(button, coords);
    }

    pub fn released(&mut self, _pos: PixelPos, button: PointerButton) {
        log::trace!("{:?} released", button);
        self.held.set(button, None);
    }

    /// Primary click: reveals a cell, or chord-reveals when the secondary button is held over the same cell.
    pub fn click(&mut self, pos: PixelPos) -> Result<RevealOutcome> {
        let coords = self.checked_coords(pos)?;

        let outcome = if self.held.is_held_at(PointerButton::Secondary, coords) {
            self.grid.reveal_neighbors(coords)
        } else {
            self.grid.reveal(coords)
        };

        match outcome {
            RevealOutcome::HitMine => self.end_game(GameState::Lost),
            RevealOutcome::Won => self.end_game(GameState::Won),
            RevealOutcome::NoChange | RevealOutcome::Revealed => {}
        }
        Ok(outcome)
    }

    /// Secondary click: cycles the mark on a hidden cell.
    pub fn right_click(&mut self, pos: PixelPos) -> Result<MarkOutcome> {
        let coords = self.checked_coords(pos)?;
        Ok(self.grid.mark(coords))
    }

    fn checked_coords(&self, pos: PixelPos) -> Result<Coord2> {
        if self.state.is_finished() {
            return Err(GameError::AlreadyEnded);
        }
        self.grid_coords(pos).inspect_err(|_| {
            log::warn!("Rejected input outside the board at {:?}", pos);
        })
    }

    fn end_game(&mut self, state: GameState) {
        if self.state.is_finished() {
            return;
        }
        log::debug!("Game ended: {:?}", state);
        self.state = state;
    }
}
