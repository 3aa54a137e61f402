//! Playing field representation and gravity

use std::fmt;

/// Field dimensions
pub const WIDTH: usize = 6;
pub const HEIGHT: usize = 18;
/// Playable rows plus the sentinel floor row
pub const TOTAL_HEIGHT: usize = HEIGHT + 1;
/// Index of the sentinel floor row
pub const FLOOR_ROW: usize = HEIGHT;

/// Number of distinct block colors
pub const COLOR_COUNT: u8 = 6;

/// A block color, always in `1..=COLOR_COUNT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Color(u8);

impl Color {
    pub fn new(value: u8) -> Option<Self> {
        (1..=COLOR_COUNT).contains(&value).then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// All colors in ascending order
    #[cfg(test)]
    pub fn all() -> impl Iterator<Item = Color> {
        (1..=COLOR_COUNT).map(Color)
    }
}

/// A cell on the field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Filled(Color),
    /// Sentinel below the playable area
    Floor,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn color(&self) -> Option<Color> {
        match self {
            Cell::Filled(color) => Some(*color),
            _ => None,
        }
    }
}

/// The playing field
#[derive(Clone, PartialEq, Eq)]
pub struct Grid {
    /// Stored as [row][col], row 0 is the top, the last row is the floor
    cells: [[Cell; WIDTH]; TOTAL_HEIGHT],
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl Grid {
    /// Create an empty field with its floor row in place
    pub fn new() -> Self {
        let mut cells = [[Cell::Empty; WIDTH]; TOTAL_HEIGHT];
        cells[FLOOR_ROW] = [Cell::Floor; WIDTH];
        Self { cells }
    }

    /// Build a field from text rows. `.` is empty, `1`-`6` are colors.
    /// Rows are aligned to the bottom of the field.
    #[cfg(test)]
    pub fn from_rows(rows: &[&str]) -> Self {
        assert!(rows.len() <= HEIGHT, "too many rows");
        let mut grid = Self::new();
        let top = HEIGHT - rows.len();
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), WIDTH, "row {i} has the wrong width");
            for (x, ch) in row.chars().enumerate() {
                if let Some(color) = ch.to_digit(10).and_then(|d| Color::new(d as u8)) {
                    grid.cells[top + i][x] = Cell::Filled(color);
                }
            }
        }
        grid
    }

    /// Get the cell at (x, y), `None` if out of bounds
    pub fn get(&self, x: i32, y: i32) -> Option<Cell> {
        if x < 0 || y < 0 {
            return None;
        }
        self.cells
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
    }

    /// Get the cell at (x, y). Panics when out of bounds.
    pub fn cell(&self, x: usize, y: usize) -> Cell {
        self.cells[y][x]
    }

    /// Set a playable cell. Writes to the floor or out of bounds are ignored.
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) -> bool {
        if x >= WIDTH || y >= TOTAL_HEIGHT || self.is_floor(y) || cell == Cell::Floor {
            return false;
        }
        self.cells[y][x] = cell;
        true
    }

    pub fn is_floor(&self, y: usize) -> bool {
        y == FLOOR_ROW
    }

    /// Check if every cell of a row holds `value`
    pub fn is_row_all(&self, value: Cell, row: usize) -> bool {
        self.cells
            .get(row)
            .is_some_and(|cells| cells.iter().all(|&cell| cell == value))
    }

    /// First non-empty row in a lane, scanning top to bottom.
    /// An empty lane returns the floor row.
    pub fn find_lowest_occupied(&self, lane: usize) -> usize {
        (0..TOTAL_HEIGHT)
            .find(|&y| !self.cells[y][lane].is_empty())
            .unwrap_or(FLOOR_ROW)
    }

    /// Number of filled cells stacked in a lane
    pub fn column_height(&self, lane: usize) -> usize {
        FLOOR_ROW - self.find_lowest_occupied(lane)
    }

    /// Check if the playable area holds no blocks
    pub fn is_empty(&self) -> bool {
        self.cells[..HEIGHT]
            .iter()
            .all(|row| row.iter().all(|cell| cell.is_empty()))
    }

    /// Playable rows, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = (usize, &[Cell; WIDTH])> {
        self.cells[..HEIGHT].iter().enumerate()
    }

    /// Drop every floating block onto whatever is beneath it.
    ///
    /// Columns are walked bottom to top so a block always lands on an
    /// already settled one. Returns true if anything moved.
    pub fn settle(&mut self) -> bool {
        let mut moved = false;
        for x in 0..WIDTH {
            for y in (0..HEIGHT).rev() {
                let Cell::Filled(color) = self.cells[y][x] else {
                    continue;
                };
                if !self.cells[y + 1][x].is_empty() {
                    continue;
                }
                let mut rest = y + 1;
                while self.cells[rest + 1][x].is_empty() {
                    rest += 1;
                }
                self.cells[y][x] = Cell::Empty;
                self.cells[rest][x] = Cell::Filled(color);
                moved = true;
            }
        }
        moved
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        for row in &self.cells {
            for cell in row {
                let ch = match cell {
                    Cell::Empty => '.',
                    Cell::Filled(color) => char::from(b'0' + color.value()),
                    Cell::Floor => '#',
                };
                write!(f, "{ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color(value: u8) -> Color {
        Color::new(value).unwrap()
    }

    #[test]
    fn test_new_grid_is_empty() {
        let grid = Grid::new();
        assert!(grid.is_empty());
        assert!(grid.is_row_all(Cell::Floor, FLOOR_ROW));
        assert!(grid.is_row_all(Cell::Empty, 0));
    }

    #[test]
    fn test_color_range() {
        assert_eq!(Color::new(0), None);
        assert_eq!(Color::new(7), None);
        assert_eq!(Color::new(6).map(Color::value), Some(6));
        assert_eq!(Color::all().count(), 6);
    }

    #[test]
    fn test_set_and_get() {
        let mut grid = Grid::new();
        assert!(grid.set(3, 5, Cell::Filled(color(2))));
        assert_eq!(grid.get(3, 5), Some(Cell::Filled(color(2))));
        assert_eq!(grid.cell(3, 5), Cell::Filled(color(2)));
    }

    #[test]
    fn test_out_of_bounds() {
        let grid = Grid::new();
        assert_eq!(grid.get(-1, 0), None);
        assert_eq!(grid.get(0, -1), None);
        assert_eq!(grid.get(WIDTH as i32, 0), None);
        assert_eq!(grid.get(0, TOTAL_HEIGHT as i32), None);
        assert_eq!(grid.get(0, FLOOR_ROW as i32), Some(Cell::Floor));
    }

    #[test]
    #[should_panic]
    fn test_indexed_access_out_of_bounds_panics() {
        Grid::new().cell(WIDTH, 0);
    }

    #[test]
    fn test_floor_is_immutable() {
        let mut grid = Grid::new();
        assert!(!grid.set(0, FLOOR_ROW, Cell::Empty));
        assert!(!grid.set(0, 0, Cell::Floor));
        assert!(grid.is_floor(FLOOR_ROW));
        assert!(grid.is_row_all(Cell::Floor, FLOOR_ROW));
    }

    #[test]
    fn test_find_lowest_occupied() {
        let grid = Grid::from_rows(&["..1...", "..2..."]);
        assert_eq!(grid.find_lowest_occupied(2), HEIGHT - 2);
        assert_eq!(grid.find_lowest_occupied(0), FLOOR_ROW);
        assert_eq!(grid.column_height(2), 2);
        assert_eq!(grid.column_height(5), 0);
    }

    #[test]
    fn test_settle_drops_to_floor_and_stacks() {
        let mut grid = Grid::from_rows(&["1.....", "2.....", "......", "3....."]);
        assert!(grid.settle());
        assert_eq!(grid, Grid::from_rows(&["1.....", "2.....", "3....."]));
    }

    #[test]
    fn test_settle_chained_gaps() {
        let mut grid = Grid::from_rows(&[".4....", "......", ".5....", "......", "......"]);
        grid.settle();
        assert_eq!(grid, Grid::from_rows(&[".4....", ".5...."]));
    }

    #[test]
    fn test_settle_is_idempotent() {
        let mut grid = Grid::from_rows(&["1.2...", "..3.4.", "5.....", "...6.."]);
        grid.settle();
        let once = grid.clone();
        assert!(!grid.settle());
        assert_eq!(grid, once);
    }
}
