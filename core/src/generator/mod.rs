use crate::*;
pub use random::*;

mod random;

/// Strategy for placing mines on a board described by a [`GameConfig`].
pub trait MineGenerator {
    fn generate(self, config: GameConfig) -> Result<MineLayout>;
}

/// A fixed layout is its own generator, used to replay a known board.
impl MineGenerator for MineLayout {
    fn generate(self, config: GameConfig) -> Result<MineLayout> {
        if self.game_config() == config {
            Ok(self)
        } else {
            log::warn!(
                "Fixed layout {:?} does not match requested config {:?}",
                self.game_config(),
                config
            );
            Err(GameError::InvalidBoardShape)
        }
    }
}
