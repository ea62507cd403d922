use alloc::collections::{BTreeSet, VecDeque};
use core::ops::BitOr;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// The board: every cell owned by value, addressed by `(x, y)`.
///
/// Coordinates passed to the grid are expected to be in bounds, out of range access panics. Callers taking user
/// input should go through [`Grid::validate_coords`] first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    cells: Array2<Cell>,
    mine_count: CellCount,
    revealed_count: CellCount,
    flagged_count: CellCount,
    triggered_mine: Option<Coord2>,
}

impl Grid {
    pub fn new(mine_layout: MineLayout) -> Self {
        let cells = Array2::from_shape_fn(mine_layout.size().to_nd_index(), |(x, y)| {
            let pos = (x as Coord, y as Coord);
            Cell::new(pos, mine_layout.value_at(pos))
        });
        Self {
            cells,
            mine_count: mine_layout.mine_count(),
            revealed_count: 0,
            flagged_count: 0,
            triggered_mine: None,
        }
    }

    /// Builds a grid for `config` with mines placed by `generator`.
    pub fn generate(config: GameConfig, generator: impl MineGenerator) -> Result<Self> {
        let config = config.validate()?;
        Ok(Self::new(generator.generate(config)?))
    }

    pub fn size(&self) -> Coord2 {
        let (x, y) = self.cells.dim();
        (x as Coord, y as Coord)
    }

    pub fn config(&self) -> GameConfig {
        GameConfig::new_unchecked(self.size(), self.mine_count)
    }

    pub fn total_mines(&self) -> CellCount {
        self.mine_count
    }

    pub fn revealed_count(&self) -> CellCount {
        self.revealed_count
    }

    pub fn flagged_count(&self) -> CellCount {
        self.flagged_count
    }

    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    /// Whether every cell without a mine has been revealed.
    pub fn is_cleared(&self) -> bool {
        self.revealed_count == self.config().safe_cells()
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let size = self.size();
        if coords.0 < size.0 && coords.1 < size.1 {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn cell_at(&self, coords: Coord2) -> &Cell {
        &self.cells[coords.to_nd_index()]
    }

    pub fn view(&self, coords: Coord2) -> CellView {
        self.cell_at(coords).view()
    }

    pub fn iter_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn neighbors(&self, coords: Coord2) -> NeighborIter {
        self.cells.iter_neighbors(coords)
    }

    /// Cycles the mark on a hidden cell.
    pub fn mark(&mut self, coords: Coord2) -> MarkOutcome {
        let cell = &mut self.cells[coords.to_nd_index()];
        let was_flagged = cell.is_flagged();
        let outcome = cell.cycle_mark();

        match (was_flagged, cell.is_flagged()) {
            (false, true) => self.flagged_count += 1,
            (true, false) => self.flagged_count -= 1,
            _ => {}
        }
        outcome
    }

    /// Reveals a cell, flooding through connected zero cells.
    ///
    /// Revealed and flagged cells are left alone. Revealing a mine explodes the board.
    pub fn reveal(&mut self, coords: Coord2) -> RevealOutcome {
        let cell = self.cell_at(coords);
        if cell.is_revealed() || cell.is_flagged() {
            return RevealOutcome::NoChange;
        }

        match self.open_cell(coords) {
            CellValue::Mine => {
                self.explode(coords);
                return RevealOutcome::HitMine;
            }
            CellValue::Count(0) => self.flood_from(coords),
            CellValue::Count(count) => {
                log::debug!("Revealed cell at {:?}, mine count: {}", coords, count);
            }
        }

        if self.is_cleared() {
            log::debug!("All {} safe cells revealed", self.revealed_count);
            RevealOutcome::Won
        } else {
            RevealOutcome::Revealed
        }
    }

    /// Chord reveal: opens all neighbors of a revealed cell once its flags account for its count.
    pub fn reveal_neighbors(&mut self, coords: Coord2) -> RevealOutcome {
        let cell = self.cell_at(coords);
        if !cell.is_revealed() {
            return RevealOutcome::NoChange;
        }
        let CellValue::Count(count) = cell.value() else {
            return RevealOutcome::NoChange;
        };

        let flagged = self.count_flagged_neighbors(coords);
        if flagged != count {
            log::debug!(
                "Chord at {:?} skipped, {} flags around a {}",
                coords,
                flagged,
                count
            );
            return RevealOutcome::NoChange;
        }

        self.neighbors(coords)
            .map(|pos| self.reveal(pos))
            .reduce(BitOr::bitor)
            .unwrap_or(RevealOutcome::NoChange)
    }

    fn open_cell(&mut self, coords: Coord2) -> CellValue {
        let value = self.cells[coords.to_nd_index()].reveal();
        if !value.is_mine() {
            self.revealed_count += 1;
        }
        value
    }

    fn flood_from(&mut self, coords: Coord2) {
        let mut visited = BTreeSet::from([coords]);
        let mut to_visit: VecDeque<_> = self.neighbors(coords).collect();
        log::trace!("Starting flood-fill from {:?}", coords);

        while let Some(visit_coords) = to_visit.pop_front() {
            if !visited.insert(visit_coords) {
                continue;
            }

            let cell = self.cell_at(visit_coords);
            if cell.is_revealed() || cell.is_flagged() {
                log::trace!("Skipping cell at {:?}", visit_coords);
                continue;
            }

            let value = self.open_cell(visit_coords);
            log::trace!("Flood opened cell at {:?}: {:?}", visit_coords, value);

            if value == CellValue::Count(0) {
                to_visit.extend(
                    self.neighbors(visit_coords)
                        .filter(|pos| !visited.contains(pos)),
                );
            }
        }
    }

    fn explode(&mut self, coords: Coord2) {
        if self.triggered_mine.is_some() {
            return;
        }

        log::debug!("Mine triggered at {:?}", coords);
        self.cells[coords.to_nd_index()].emphasize(Emphasis::Triggered);
        self.triggered_mine = Some(coords);
        self.reveal_all();
    }

    /// Shows wrong flags and missed mines. Correct flags and question marks stay hidden.
    fn reveal_all(&mut self) {
        for cell in self.cells.iter_mut() {
            if cell.is_revealed() {
                continue;
            }
            match (cell.mark(), cell.is_mine()) {
                (Mark::Flagged, false) => {
                    cell.emphasize(Emphasis::WrongFlag);
                    cell.reveal();
                    self.flagged_count -= 1;
                }
                (Mark::Blank, true) => {
                    cell.reveal();
                }
                _ => {}
            }
        }
    }

    fn count_flagged_neighbors(&self, coords: Coord2) -> u8 {
        // at most 8 neighbors
        self.neighbors(coords)
            .filter(|&pos| self.cell_at(pos).is_flagged())
            .count() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(size: Coord2, mines: &[Coord2]) -> Grid {
        Grid::new(MineLayout::from_mine_coords(size, mines).unwrap())
    }

    fn revealed(grid: &Grid) -> usize {
        grid.iter_cells().filter(|cell| cell.is_revealed()).count()
    }

    #[test]
    fn generated_grid_matches_config() {
        let config = GameConfig::new((16, 16), 40).unwrap();
        let grid = Grid::generate(config, RandomMineGenerator::new(42)).unwrap();

        assert_eq!(grid.iter_cells().filter(|cell| cell.is_mine()).count(), 40);
        for cell in grid.iter_cells() {
            if let CellValue::Count(count) = cell.value() {
                let mines = grid
                    .neighbors(cell.pos())
                    .filter(|&pos| grid.cell_at(pos).is_mine())
                    .count();
                assert_eq!(usize::from(count), mines);
            }
        }
    }

    #[test]
    fn cells_know_their_position() {
        let grid = grid((4, 3), &[]);

        assert_eq!(grid.cell_at((3, 2)).pos(), (3, 2));
        assert_eq!(grid.cell_at((1, 0)).pos(), (1, 0));
    }

    #[test]
    fn reveal_next_to_mine_does_not_cascade() {
        let mut grid = grid((3, 3), &[(1, 1)]);

        assert_eq!(grid.reveal((0, 0)), RevealOutcome::Revealed);
        assert_eq!(grid.view((0, 0)), CellView::Revealed(Display::Count(1)));
        assert_eq!(revealed(&grid), 1);
    }

    #[test]
    fn reveal_floods_zero_region_and_its_border() {
        let mut grid = grid((4, 4), &[(0, 3), (3, 3)]);

        assert_eq!(grid.reveal((0, 0)), RevealOutcome::Revealed);

        for x in 0..4 {
            assert_eq!(grid.view((x, 0)), CellView::Revealed(Display::Count(0)));
            assert_eq!(grid.view((x, 1)), CellView::Revealed(Display::Count(0)));
            assert_eq!(grid.view((x, 2)), CellView::Revealed(Display::Count(1)));
        }
        assert_eq!(grid.view((1, 3)), CellView::Hidden(Mark::Blank));
        assert_eq!(grid.view((2, 3)), CellView::Hidden(Mark::Blank));
        assert_eq!(grid.revealed_count(), 12);
        assert_eq!(revealed(&grid), 12);
    }

    #[test]
    fn flood_skips_flags_but_opens_question_marks() {
        let mut grid = grid((4, 4), &[(0, 3), (3, 3)]);
        grid.mark((0, 1));
        grid.mark((2, 1));
        grid.mark((2, 1));

        grid.reveal((0, 0));

        assert_eq!(grid.view((0, 1)), CellView::Hidden(Mark::Flagged));
        assert_eq!(grid.view((2, 1)), CellView::Revealed(Display::Count(0)));
        assert_eq!(grid.view((0, 2)), CellView::Revealed(Display::Count(1)));
        assert_eq!(grid.revealed_count(), 11);
    }

    #[test]
    fn reveal_clears_board_and_wins() {
        let mut grid = grid((3, 3), &[(2, 2)]);

        assert_eq!(grid.reveal((0, 0)), RevealOutcome::Won);
        assert!(grid.is_cleared());
        assert_eq!(grid.view((2, 2)), CellView::Hidden(Mark::Blank));
    }

    #[test]
    fn reveal_flagged_or_revealed_is_noop() {
        let mut grid = grid((3, 3), &[(1, 1)]);
        grid.mark((0, 0));

        assert_eq!(grid.reveal((0, 0)), RevealOutcome::NoChange);
        assert_eq!(grid.view((0, 0)), CellView::Hidden(Mark::Flagged));

        grid.reveal((2, 0));
        let before = grid.clone();
        assert_eq!(grid.reveal((2, 0)), RevealOutcome::NoChange);
        assert_eq!(grid, before);
    }

    #[test]
    fn mark_tracks_flag_count() {
        let mut grid = grid((3, 3), &[(1, 1)]);

        assert_eq!(grid.mark((1, 1)), MarkOutcome::Changed);
        assert_eq!(grid.flagged_count(), 1);
        grid.mark((1, 1));
        assert_eq!(grid.view((1, 1)), CellView::Hidden(Mark::Questioned));
        assert_eq!(grid.flagged_count(), 0);
        grid.mark((1, 1));
        assert_eq!(grid.view((1, 1)), CellView::Hidden(Mark::Blank));

        grid.reveal((0, 0));
        assert_eq!(grid.mark((0, 0)), MarkOutcome::NoChange);
        assert_eq!(grid.view((0, 0)), CellView::Revealed(Display::Count(1)));
    }

    #[test]
    fn chord_requires_matching_flags() {
        let mut grid = grid((3, 3), &[(0, 0)]);
        grid.reveal((1, 1));

        assert_eq!(grid.reveal_neighbors((1, 1)), RevealOutcome::NoChange);
        assert_eq!(revealed(&grid), 1);

        grid.mark((0, 0));
        grid.mark((2, 2));
        assert_eq!(grid.reveal_neighbors((1, 1)), RevealOutcome::NoChange);
        assert_eq!(revealed(&grid), 1);
    }

    #[test]
    fn chord_on_hidden_cell_is_noop() {
        let mut grid = grid((3, 3), &[(0, 0)]);
        grid.mark((0, 0));

        assert_eq!(grid.reveal_neighbors((1, 1)), RevealOutcome::NoChange);
        assert_eq!(revealed(&grid), 0);
    }

    #[test]
    fn chord_opens_neighbors_when_flags_match() {
        let mut grid = grid((3, 3), &[(0, 0)]);
        grid.reveal((1, 1));
        grid.mark((0, 0));

        assert_eq!(grid.reveal_neighbors((1, 1)), RevealOutcome::Won);
        assert_eq!(grid.view((2, 2)), CellView::Revealed(Display::Count(0)));
        assert_eq!(grid.view((0, 0)), CellView::Hidden(Mark::Flagged));
    }

    #[test]
    fn chord_with_wrong_flag_hits_mine() {
        let mut grid = grid((3, 3), &[(0, 0)]);
        grid.reveal((1, 1));
        grid.mark((2, 2));

        assert_eq!(grid.reveal_neighbors((1, 1)), RevealOutcome::HitMine);
        assert_eq!(grid.triggered_mine(), Some((0, 0)));
        assert_eq!(grid.view((0, 0)), CellView::Revealed(Display::MineTriggered));
        assert_eq!(grid.view((2, 2)), CellView::Revealed(Display::WrongFlag));
    }

    #[test]
    fn losing_chord_still_opens_every_safe_neighbor() {
        let mut grid = grid((3, 3), &[(0, 0)]);
        grid.reveal((1, 1));
        grid.mark((2, 2));

        assert_eq!(grid.reveal_neighbors((1, 1)), RevealOutcome::HitMine);

        for pos in [(0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1)] {
            assert!(grid.cell_at(pos).is_revealed(), "{:?} left hidden", pos);
        }
        assert_eq!(grid.view((0, 1)), CellView::Revealed(Display::Count(1)));
        assert_eq!(grid.view((2, 1)), CellView::Revealed(Display::Count(0)));
        assert_eq!(grid.triggered_mine(), Some((0, 0)));
    }

    #[test]
    fn losing_chord_explodes_once() {
        // two unflagged mines around the chorded cell, only the first one is the trigger
        let mut grid = grid((3, 3), &[(0, 0), (2, 2)]);
        grid.reveal((1, 1));
        grid.mark((2, 0));
        grid.mark((0, 2));
        grid.mark((2, 2));
        grid.mark((2, 2));

        assert_eq!(grid.reveal_neighbors((1, 1)), RevealOutcome::HitMine);

        assert_eq!(grid.triggered_mine(), Some((0, 0)));
        assert_eq!(grid.view((0, 0)), CellView::Revealed(Display::MineTriggered));
        assert_eq!(grid.view((2, 2)), CellView::Revealed(Display::Mine));
    }

    #[test]
    fn explosion_reveals_board() {
        let mut grid = grid((3, 3), &[(0, 0), (2, 0), (0, 2), (2, 2)]);
        grid.mark((2, 2));
        grid.mark((1, 0));
        grid.mark((0, 2));
        grid.mark((0, 2));

        assert_eq!(grid.reveal((0, 0)), RevealOutcome::HitMine);

        assert_eq!(grid.view((0, 0)), CellView::Revealed(Display::MineTriggered));
        assert_eq!(grid.view((2, 0)), CellView::Revealed(Display::Mine));
        assert_eq!(grid.view((1, 0)), CellView::Revealed(Display::WrongFlag));
        assert_eq!(grid.view((2, 2)), CellView::Hidden(Mark::Flagged));
        assert_eq!(grid.view((0, 2)), CellView::Hidden(Mark::Questioned));
        assert_eq!(grid.view((1, 1)), CellView::Hidden(Mark::Blank));
        assert_eq!(grid.flagged_count(), 1);
    }
}
