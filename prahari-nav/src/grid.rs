//! Occupancy grid over the patrol area
//!
//! A fixed-size grid of cell beliefs plus the robot's current cell. The grid
//! is owned by the patrol loop; cells are mutated only through [`OccupancyGrid::update`]
//! and [`OccupancyGrid::select_move`], which keeps the position invariant
//! (the current cell is always in-bounds and Free) local to this module.

/// Default grid side length
pub const DEFAULT_GRID_SIZE: usize = 10;

/// Belief about one grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CellState {
    /// Never observed, or sensor out of range
    #[default]
    Unknown,
    Free,
    Occupied,
}

/// The four sensing/movement directions, fixed to the grid axes.
///
/// Offsets are grid offsets, not headings: the model assumes the robot's
/// front stays aligned with the +x axis for the whole run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Front,
    Back,
    Left,
    Right,
}

impl Direction {
    /// All directions, in declaration order.
    pub const ALL: [Direction; 4] = [
        Direction::Front,
        Direction::Back,
        Direction::Left,
        Direction::Right,
    ];

    /// Candidate order for move selection. Deterministic so runs replay.
    pub const MOVE_PRIORITY: [Direction; 4] = [
        Direction::Front,
        Direction::Left,
        Direction::Right,
        Direction::Back,
    ];

    /// Grid offset (dx, dy) of the adjacent cell.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Front => (1, 0),
            Direction::Back => (-1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    fn index(self) -> usize {
        match self {
            Direction::Front => 0,
            Direction::Back => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }
}

/// Exhaustive per-direction storage.
///
/// A fixed array indexed by [`Direction`], so a value exists for every
/// direction by construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DirectionMap<T>([T; 4]);

impl<T> DirectionMap<T> {
    /// Build a map by evaluating `f` once per direction.
    pub fn from_fn(mut f: impl FnMut(Direction) -> T) -> Self {
        Self(Direction::ALL.map(&mut f))
    }

    pub fn get(&self, dir: Direction) -> &T {
        &self.0[dir.index()]
    }

    pub fn get_mut(&mut self, dir: Direction) -> &mut T {
        &mut self.0[dir.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Direction, &T)> {
        Direction::ALL.iter().map(move |&dir| (dir, self.get(dir)))
    }
}

impl<T> std::ops::Index<Direction> for DirectionMap<T> {
    type Output = T;

    fn index(&self, dir: Direction) -> &T {
        self.get(dir)
    }
}

impl<T> std::ops::IndexMut<Direction> for DirectionMap<T> {
    fn index_mut(&mut self, dir: Direction) -> &mut T {
        self.get_mut(dir)
    }
}

/// Fixed-size occupancy grid with the robot's current cell.
#[derive(Clone, Debug)]
pub struct OccupancyGrid {
    size: usize,
    cells: Vec<CellState>,
    position: (i32, i32),
}

impl OccupancyGrid {
    /// Create a grid with the robot at the center, center marked Free.
    pub fn new(size: usize) -> Self {
        debug_assert!(size > 0);

        let center = ((size / 2) as i32, (size / 2) as i32);
        let mut grid = Self {
            size,
            cells: vec![CellState::Unknown; size * size],
            position: center,
        };
        grid.set(center, CellState::Free);
        grid
    }

    /// Robot's current cell.
    pub fn position(&self) -> (i32, i32) {
        self.position
    }

    /// Side length.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether (x, y) indexes a cell.
    pub fn is_valid(&self, (x, y): (i32, i32)) -> bool {
        let n = self.size as i32;
        (0..n).contains(&x) && (0..n).contains(&y)
    }

    /// Stored belief at a coordinate, None when off-grid.
    pub fn cell(&self, pos: (i32, i32)) -> Option<CellState> {
        self.is_valid(pos).then(|| self.cells[self.index(pos)])
    }

    fn index(&self, (x, y): (i32, i32)) -> usize {
        x as usize * self.size + y as usize
    }

    fn set(&mut self, pos: (i32, i32), state: CellState) {
        let idx = self.index(pos);
        self.cells[idx] = state;
    }

    /// Write the latest per-direction classifications into the cells
    /// adjacent to the current position. Neighbors past the boundary are
    /// skipped; their classifications are simply dropped.
    pub fn update(&mut self, neighbors: &DirectionMap<CellState>) {
        let (x, y) = self.position;
        for dir in Direction::ALL {
            let (dx, dy) = dir.offset();
            let target = (x + dx, y + dy);
            if self.is_valid(target) {
                self.set(target, neighbors[dir]);
            }
        }
    }

    /// Pick the next move and commit it.
    ///
    /// Candidates are tried in [`Direction::MOVE_PRIORITY`] order; the first
    /// in-bounds, non-Occupied cell wins. Unknown counts as passable since
    /// exploration has to step into unseen cells. The bounds check runs
    /// before the cell is read. On a commit the position moves to the target
    /// and the target is marked Free. Returns None when every direction is
    /// blocked or off-grid, which means "hold position".
    pub fn select_move(&mut self) -> Option<Direction> {
        for dir in Direction::MOVE_PRIORITY {
            let (dx, dy) = dir.offset();
            let target = (self.position.0 + dx, self.position.1 + dy);

            if !self.is_valid(target) {
                continue;
            }
            if self.cells[self.index(target)] == CellState::Occupied {
                continue;
            }

            self.position = target;
            self.set(target, CellState::Free);
            return Some(dir);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neighbors(
        front: CellState,
        back: CellState,
        left: CellState,
        right: CellState,
    ) -> DirectionMap<CellState> {
        let mut map = DirectionMap::default();
        map[Direction::Front] = front;
        map[Direction::Back] = back;
        map[Direction::Left] = left;
        map[Direction::Right] = right;
        map
    }

    #[test]
    fn test_new_grid_starts_centered_and_free() {
        let grid = OccupancyGrid::new(10);

        assert_eq!(grid.position(), (5, 5));
        assert_eq!(grid.cell((5, 5)), Some(CellState::Free));
        assert_eq!(grid.cell((4, 5)), Some(CellState::Unknown));
    }

    #[test]
    fn test_update_writes_neighbor_cells() {
        let mut grid = OccupancyGrid::new(10);

        grid.update(&neighbors(
            CellState::Occupied,
            CellState::Unknown,
            CellState::Unknown,
            CellState::Unknown,
        ));

        assert_eq!(grid.cell((6, 5)), Some(CellState::Occupied));
        assert_eq!(grid.cell((4, 5)), Some(CellState::Unknown));
        assert_eq!(grid.cell((5, 4)), Some(CellState::Unknown));
        assert_eq!(grid.cell((5, 6)), Some(CellState::Unknown));
    }

    #[test]
    fn test_update_is_idempotent() {
        let mut grid = OccupancyGrid::new(10);
        let reading = neighbors(
            CellState::Occupied,
            CellState::Free,
            CellState::Free,
            CellState::Occupied,
        );

        grid.update(&reading);
        let after_one = grid.clone();
        grid.update(&reading);

        assert_eq!(grid.cells, after_one.cells);
        assert_eq!(grid.position(), after_one.position());
    }

    #[test]
    fn test_update_skips_out_of_bounds_neighbors() {
        // A 1x1 grid has no valid neighbors at all
        let mut grid = OccupancyGrid::new(1);

        grid.update(&neighbors(
            CellState::Occupied,
            CellState::Occupied,
            CellState::Occupied,
            CellState::Occupied,
        ));

        assert_eq!(grid.cell((0, 0)), Some(CellState::Free));
    }

    #[test]
    fn test_select_move_prefers_front() {
        let mut grid = OccupancyGrid::new(10);

        assert_eq!(grid.select_move(), Some(Direction::Front));
        assert_eq!(grid.position(), (6, 5));
    }

    #[test]
    fn test_select_move_blocked_front_returns_left() {
        let mut grid = OccupancyGrid::new(10);
        grid.update(&neighbors(
            CellState::Occupied,
            CellState::Free,
            CellState::Free,
            CellState::Free,
        ));

        assert_eq!(grid.select_move(), Some(Direction::Left));
        assert_eq!(grid.position(), (5, 4));
    }

    #[test]
    fn test_select_move_marks_destination_free() {
        let mut grid = OccupancyGrid::new(10);
        // Front is merely Unknown, still passable
        let dir = grid.select_move().unwrap();

        let (dx, dy) = dir.offset();
        assert_eq!(grid.position(), (5 + dx, 5 + dy));
        assert_eq!(grid.cell(grid.position()), Some(CellState::Free));
    }

    #[test]
    fn test_select_move_surrounded_returns_none() {
        let mut grid = OccupancyGrid::new(10);
        grid.update(&neighbors(
            CellState::Occupied,
            CellState::Occupied,
            CellState::Occupied,
            CellState::Occupied,
        ));

        assert_eq!(grid.select_move(), None);
        assert_eq!(grid.position(), (5, 5));
    }

    #[test]
    fn test_select_move_never_leaves_grid() {
        // No obstacles: the walk is bounded only by the edges. Every commit
        // must stay in-bounds and land on a Free cell.
        let mut grid = OccupancyGrid::new(4);

        for _ in 0..100 {
            let before = grid.position();
            match grid.select_move() {
                Some(dir) => {
                    let (dx, dy) = dir.offset();
                    assert_eq!(grid.position(), (before.0 + dx, before.1 + dy));
                }
                None => assert_eq!(grid.position(), before),
            }
            assert!(grid.is_valid(grid.position()));
            assert_eq!(grid.cell(grid.position()), Some(CellState::Free));
        }
    }

    #[test]
    fn test_select_move_at_corner_skips_off_grid_candidates() {
        let mut grid = OccupancyGrid::new(3);
        // Walk to the (2, 0) corner: Front then Left
        assert_eq!(grid.select_move(), Some(Direction::Front));
        assert_eq!(grid.select_move(), Some(Direction::Left));
        assert_eq!(grid.position(), (2, 0));

        // Front and Left now point off-grid; Right is next in priority
        assert_eq!(grid.select_move(), Some(Direction::Right));
        assert_eq!(grid.position(), (2, 1));
    }

    #[test]
    fn test_direction_map_round_trip() {
        let map = DirectionMap::from_fn(|dir| dir.offset());

        assert_eq!(map[Direction::Front], (1, 0));
        assert_eq!(map[Direction::Back], (-1, 0));
        assert_eq!(map[Direction::Left], (0, -1));
        assert_eq!(map[Direction::Right], (0, 1));
        assert_eq!(map.iter().count(), 4);
    }
}
