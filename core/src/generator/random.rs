use ndarray::Array2;
use rand::{SeedableRng, rngs::SmallRng, seq::index};

use super::*;

/// Purely random generation, every mine placement is equally likely for a given seed.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomMineGenerator {
    seed: u64,
}

impl RandomMineGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl MineGenerator for RandomMineGenerator {
    fn generate(self, config: GameConfig) -> Result<MineLayout> {
        let config = config.validate()?;
        let total_cells = usize::from(config.total_cells());
        let mut mine_mask: Array2<bool> = Array2::default(config.size.to_nd_index());

        let mut rng = SmallRng::seed_from_u64(self.seed);
        // sampling without replacement never collides, so it terminates even on nearly full boards
        let picked = index::sample(&mut rng, total_cells, config.mines.into());
        {
            let cells = mine_mask.as_slice_mut().ok_or(GameError::InvalidSize)?;
            for i in picked.iter() {
                cells[i] = true;
            }
        }

        let layout = MineLayout::from_mine_mask(mine_mask)?;
        log::debug!(
            "Generated {}x{} minefield with {} mines from seed {}",
            config.size.0,
            config.size.1,
            layout.mine_count(),
            self.seed
        );
        Ok(layout)
    }
}
