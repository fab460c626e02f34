use serde::{Deserialize, Serialize};
use crate::vecmath::GridPos;

/// Model parameters derived from the configuration, read on every step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelParams {
    // Grid
    pub width: u32,
    pub height: u32,
    pub torus: bool,
    pub base: GridPos,

    // Population
    pub num_food: u32,
    pub num_agents: u32,
    pub initial_energy: u32, // Restored whenever food is delivered

    pub seed: u64,
}

impl ModelParams {
    pub fn num_cells(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Row-major index of a cell; `pos` must be in bounds.
    #[inline(always)]
    pub fn cell_idx(&self, pos: GridPos) -> usize {
        pos.y as usize * self.width as usize + pos.x as usize
    }
}
