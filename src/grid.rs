use anyhow::Result;
use forage_common::{AgentId, GridPos, ModelParams};

/// What lies on a grid cell, independent of any agent standing on it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Food,
    Base,
}

/// The world grid: cell contents plus which agent (at most one) occupies each cell.
#[derive(Debug)]
pub struct CellGrid {
    pub params: ModelParams,
    cells: Vec<Cell>,
    occupants: Vec<Option<AgentId>>,
}

impl CellGrid {
    /// Creates an empty grid with the base placed.
    pub fn new(params: ModelParams) -> Self {
        let num_cells = params.num_cells();
        let mut grid = CellGrid {
            cells: vec![Cell::Empty; num_cells],
            occupants: vec![None; num_cells],
            params,
        };
        let base = grid.params.base;
        grid.set_cell(base, Cell::Base);
        grid
    }

    #[inline(always)]
    pub fn cell(&self, pos: GridPos) -> Cell {
        self.cells[self.params.cell_idx(pos)]
    }

    pub fn set_cell(&mut self, pos: GridPos, cell: Cell) {
        let idx = self.params.cell_idx(pos);
        self.cells[idx] = cell;
    }

    #[inline(always)]
    pub fn is_unoccupied(&self, pos: GridPos) -> bool {
        self.occupants[self.params.cell_idx(pos)].is_none()
    }

    #[cfg(test)]
    pub fn occupant(&self, pos: GridPos) -> Option<AgentId> {
        self.occupants[self.params.cell_idx(pos)]
    }

    /// Puts an agent on a free cell.
    pub fn place_agent(&mut self, id: AgentId, pos: GridPos) -> Result<()> {
        if !pos.in_bounds(self.params.width, self.params.height) {
            anyhow::bail!("Cannot place agent {} at ({}, {}): out of bounds", id, pos.x, pos.y);
        }
        let idx = self.params.cell_idx(pos);
        if let Some(other) = self.occupants[idx] {
            anyhow::bail!("Cannot place agent {} at ({}, {}): occupied by agent {}", id, pos.x, pos.y, other);
        }
        self.occupants[idx] = Some(id);
        Ok(())
    }

    /// Moves an agent between cells. Returns false (and changes nothing) if `to` is taken.
    pub fn move_agent(&mut self, id: AgentId, from: GridPos, to: GridPos) -> bool {
        if !self.is_unoccupied(to) {
            return false;
        }
        let from_idx = self.params.cell_idx(from);
        debug_assert_eq!(self.occupants[from_idx], Some(id));
        self.occupants[from_idx] = None;
        let to_idx = self.params.cell_idx(to);
        self.occupants[to_idx] = Some(id);
        true
    }

    pub fn neighbors(&self, pos: GridPos) -> Vec<GridPos> {
        pos.von_neumann(self.params.width, self.params.height, self.params.torus)
    }

    /// All cell positions, x-major then y.
    pub fn positions(&self) -> impl Iterator<Item = GridPos> {
        let (w, h) = (self.params.width as i32, self.params.height as i32);
        (0..w).flat_map(move |x| (0..h).map(move |y| GridPos::new(x, y)))
    }

    /// Positions still holding food, x-major then y.
    pub fn food_positions(&self) -> Vec<GridPos> {
        self.positions().filter(|&p| self.cell(p) == Cell::Food).collect()
    }

    pub fn food_left(&self) -> usize {
        self.cells.iter().filter(|&&c| c == Cell::Food).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(width: u32, height: u32) -> ModelParams {
        ModelParams {
            width,
            height,
            torus: true,
            base: GridPos::new(1, 1),
            num_food: 0,
            num_agents: 0,
            initial_energy: 100,
            seed: 1,
        }
    }

    #[test]
    fn base_is_placed() {
        let grid = CellGrid::new(params(3, 3));
        assert_eq!(grid.cell(GridPos::new(1, 1)), Cell::Base);
        assert_eq!(grid.food_left(), 0);
    }

    #[test]
    fn single_occupancy() {
        let mut grid = CellGrid::new(params(3, 3));
        grid.place_agent(0, GridPos::new(0, 0)).unwrap();
        assert!(grid.place_agent(1, GridPos::new(0, 0)).is_err());
        grid.place_agent(1, GridPos::new(0, 1)).unwrap();
        assert!(!grid.move_agent(0, GridPos::new(0, 0), GridPos::new(0, 1)));
        assert!(grid.move_agent(0, GridPos::new(0, 0), GridPos::new(2, 2)));
        assert!(grid.is_unoccupied(GridPos::new(0, 0)));
        assert_eq!(grid.occupant(GridPos::new(2, 2)), Some(0));
    }

    #[test]
    fn food_positions_are_x_major() {
        let mut grid = CellGrid::new(params(3, 3));
        grid.set_cell(GridPos::new(2, 0), Cell::Food);
        grid.set_cell(GridPos::new(0, 2), Cell::Food);
        grid.set_cell(GridPos::new(0, 1), Cell::Food);
        assert_eq!(
            grid.food_positions(),
            vec![GridPos::new(0, 1), GridPos::new(0, 2), GridPos::new(2, 0)]
        );
    }
}
