use serde::{Deserialize, Serialize};

use crate::*;

/// What a cell holds, fixed once the grid is built.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellValue {
    /// Number of mines among the neighbors, `0..=8`.
    Count(u8),
    Mine,
}

impl CellValue {
    pub const fn is_mine(self) -> bool {
        matches!(self, Self::Mine)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Hidden,
    Revealed,
}

/// Player marking on a hidden cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    #[default]
    Blank,
    Flagged,
    Questioned,
}

impl Mark {
    /// Next state in the `Blank -> Flagged -> Questioned -> Blank` cycle.
    pub const fn next(self) -> Self {
        match self {
            Self::Blank => Self::Flagged,
            Self::Flagged => Self::Questioned,
            Self::Questioned => Self::Blank,
        }
    }
}

/// Display override applied when the game is lost.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Emphasis {
    /// The mine that ended the game.
    Triggered,
    /// A flag placed on a cell without a mine.
    WrongFlag,
}

/// Resolved value of a revealed cell, as the renderer should draw it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Display {
    Count(u8),
    Mine,
    MineTriggered,
    WrongFlag,
}

/// Everything a renderer needs to know about a single cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellView {
    Hidden(Mark),
    Revealed(Display),
}

impl CellView {
    // whether the cell is visually closed
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Hidden(_))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pos: Coord2,
    value: CellValue,
    visibility: Visibility,
    mark: Mark,
    emphasis: Option<Emphasis>,
}

impl Cell {
    pub const fn new(pos: Coord2, value: CellValue) -> Self {
        Self {
            pos,
            value,
            visibility: Visibility::Hidden,
            mark: Mark::Blank,
            emphasis: None,
        }
    }

    pub const fn pos(&self) -> Coord2 {
        self.pos
    }

    pub const fn value(&self) -> CellValue {
        self.value
    }

    pub const fn is_mine(&self) -> bool {
        self.value.is_mine()
    }

    pub const fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub const fn is_revealed(&self) -> bool {
        matches!(self.visibility, Visibility::Revealed)
    }

    pub const fn mark(&self) -> Mark {
        self.mark
    }

    pub const fn is_flagged(&self) -> bool {
        matches!(self.mark, Mark::Flagged)
    }

    /// Advances the mark cycle, unless the cell is already revealed.
    pub fn cycle_mark(&mut self) -> MarkOutcome {
        if self.is_revealed() {
            return MarkOutcome::NoChange;
        }
        self.mark = self.mark.next();
        MarkOutcome::Changed
    }

    /// Opens the cell and returns what it holds.
    ///
    /// Repeat calls only return the value again; the grid is responsible for not revisiting cells.
    pub fn reveal(&mut self) -> CellValue {
        self.visibility = Visibility::Revealed;
        self.mark = Mark::Blank;
        self.value
    }

    pub(crate) fn emphasize(&mut self, emphasis: Emphasis) {
        self.emphasis = Some(emphasis);
    }

    pub fn view(&self) -> CellView {
        match self.visibility {
            Visibility::Hidden => CellView::Hidden(self.mark),
            Visibility::Revealed => CellView::Revealed(match (self.emphasis, self.value) {
                (Some(Emphasis::Triggered), _) => Display::MineTriggered,
                (Some(Emphasis::WrongFlag), _) => Display::WrongFlag,
                (None, CellValue::Mine) => Display::Mine,
                (None, CellValue::Count(count)) => Display::Count(count),
            }),
        }
    }
}
