use crate::agent::{Action, Forager};
use crate::grid::{Cell, CellGrid};
use anyhow::Result;
use forage_common::{AgentId, EngineConfig, FoodItem, GridPos, ModelParams, Snapshot};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Food collection simulation: agents wander a grid, pick up food and return it to the base.
pub struct ForageModel {
    grid: CellGrid,
    /// Agents in id order; this is also the order reported in snapshots.
    agents: Vec<Forager>,
    rng: StdRng,
    steps: u64,
    delivered: u64,
}

impl ForageModel {
    /// Creates a model with food and agents placed at random, seeded from the config.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let params = config.model_params();
        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut grid = CellGrid::new(params.clone());

        let food = place_food(&mut grid, &mut rng)?;
        let agents = place_agents(&mut grid, &mut rng)?;
        info!(
            "Placed {} food items and {} agents on a {}x{} grid (base at {}, {}).",
            food, agents.len(), params.width, params.height, params.base.x, params.base.y
        );

        Ok(Self { grid, agents, rng, steps: 0, delivered: 0 })
    }

    /// Advances every agent once, in a freshly shuffled order.
    pub fn step(&mut self) {
        let mut order: Vec<usize> = (0..self.agents.len()).collect();
        order.shuffle(&mut self.rng);
        for idx in order {
            let action = self.agents[idx].step(&mut self.grid, &mut self.rng);
            if action == Action::Delivered {
                self.delivered += 1;
            }
        }
        self.steps += 1;
        debug!(
            "Step {} | food left: {} | delivered: {}",
            self.steps, self.grid.food_left(), self.delivered
        );
    }

    /// The run is over once no food is left lying on the grid.
    pub fn is_finished(&self) -> bool {
        self.grid.food_left() == 0
    }

    /// Captures the current world state in wire format.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            finished: self.is_finished(),
            agents: self.agents.iter().map(Forager::state).collect(),
            food: self
                .grid
                .food_positions()
                .into_iter()
                .map(|p| FoodItem { x: p.x, y: p.y })
                .collect(),
        }
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn agents(&self) -> &[Forager] {
        &self.agents
    }

    pub fn params(&self) -> &ModelParams {
        &self.grid.params
    }

    #[cfg(test)]
    pub fn grid(&self) -> &CellGrid {
        &self.grid
    }
}

/// Scatters food over random empty cells (never the base).
fn place_food(grid: &mut CellGrid, rng: &mut StdRng) -> Result<usize> {
    let count = grid.params.num_food as usize;
    let mut candidates: Vec<GridPos> = grid.positions().filter(|&p| grid.cell(p) == Cell::Empty).collect();
    if candidates.len() < count {
        anyhow::bail!("Not enough empty cells for {} food items", count);
    }
    candidates.shuffle(rng);
    for &pos in candidates.iter().take(count) {
        grid.set_cell(pos, Cell::Food);
    }
    Ok(count)
}

/// Places agents on random cells holding neither food nor the base.
fn place_agents(grid: &mut CellGrid, rng: &mut StdRng) -> Result<Vec<Forager>> {
    let count = grid.params.num_agents as usize;
    let energy = grid.params.initial_energy;
    let mut candidates: Vec<GridPos> = grid
        .positions()
        .filter(|&p| grid.cell(p) == Cell::Empty && grid.is_unoccupied(p))
        .collect();
    if candidates.len() < count {
        anyhow::bail!("Not enough free cells for {} agents", count);
    }
    candidates.shuffle(rng);
    let mut agents = Vec::with_capacity(count);
    for (id, &pos) in candidates.iter().take(count).enumerate() {
        let id = id as AgentId;
        grid.place_agent(id, pos)?;
        agents.push(Forager::new(id, pos, energy));
    }
    Ok(agents)
}
