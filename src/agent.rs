use crate::grid::{Cell, CellGrid};
use forage_common::{AgentId, AgentState, GridPos};
use log::trace;
use rand::seq::SliceRandom;
use rand::Rng;

/// What an agent did during its step.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    Delivered,
    PickedUp,
    Moved(GridPos),
    /// Every candidate cell was occupied.
    Blocked,
}

/// A food-collecting agent. Wanders until it stands on food, then carries it to the base.
#[derive(Debug, Clone)]
pub struct Forager {
    pub id: AgentId,
    pub pos: GridPos,
    pub energy: u32,
    pub has_food: bool,
}

impl Forager {
    pub fn new(id: AgentId, pos: GridPos, energy: u32) -> Self {
        Forager { id, pos, energy, has_food: false }
    }

    /// Advances this agent by one step.
    pub fn step<R: Rng + ?Sized>(&mut self, grid: &mut CellGrid, rng: &mut R) -> Action {
        let action = if self.has_food {
            if self.pos == grid.params.base {
                self.has_food = false;
                self.energy = grid.params.initial_energy;
                Action::Delivered
            } else {
                self.head_home(grid, rng)
            }
        } else if grid.cell(self.pos) == Cell::Food {
            grid.set_cell(self.pos, Cell::Empty);
            self.has_food = true;
            Action::PickedUp
        } else {
            self.wander(grid, rng)
        };
        trace!("agent {} at ({}, {}): {:?}", self.id, self.pos.x, self.pos.y, action);
        action
    }

    /// Moves to the first free orthogonal neighbor, trying them in random order.
    fn wander<R: Rng + ?Sized>(&mut self, grid: &mut CellGrid, rng: &mut R) -> Action {
        let mut options = grid.neighbors(self.pos);
        options.shuffle(rng);
        for target in options {
            if self.try_move(grid, target) {
                return Action::Moved(target);
            }
        }
        Action::Blocked
    }

    /// Takes one step towards the base, falling back to a random move if that cell is taken.
    fn head_home<R: Rng + ?Sized>(&mut self, grid: &mut CellGrid, rng: &mut R) -> Action {
        let target = self.pos.step_towards(grid.params.base);
        if self.try_move(grid, target) {
            Action::Moved(target)
        } else {
            self.wander(grid, rng)
        }
    }

    fn try_move(&mut self, grid: &mut CellGrid, target: GridPos) -> bool {
        if grid.move_agent(self.id, self.pos, target) {
            self.pos = target;
            self.energy = self.energy.saturating_sub(1);
            true
        } else {
            false
        }
    }

    pub fn state(&self) -> AgentState {
        AgentState { id: self.id, x: self.pos.x, y: self.pos.y, carrying_food: self.has_food }
    }
}
