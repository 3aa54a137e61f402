//! Same-color run detection
//!
//! Every filled cell is used as an anchor and walked in four directions.
//! A run longer than three is therefore found once from its true start and
//! again, shorter, from each interior cell; those sub-runs are pruned so that
//! each ray keeps only its longest run. Runs that cross in different
//! directions are kept side by side and score independently.

use crate::grid::{Cell, Grid, HEIGHT, WIDTH};

/// Minimum number of same-colored cells that collapse
pub const MIN_RUN: usize = 3;

/// Scan direction for runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Down,
    DownLeft,
    DownRight,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Down,
        Direction::DownLeft,
        Direction::DownRight,
        Direction::Right,
    ];

    /// (dx, dy) step, y grows downward
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Down => (0, 1),
            Direction::DownLeft => (-1, 1),
            Direction::DownRight => (1, 1),
            Direction::Right => (1, 0),
        }
    }
}

/// A line of same-colored cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    /// (x, y) of the first cell
    pub anchor: (usize, usize),
    pub direction: Direction,
    pub count: usize,
}

impl Run {
    /// Cells covered by the run, starting at the anchor
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> {
        let (dx, dy) = self.direction.delta();
        let (x, y) = (self.anchor.0 as i32, self.anchor.1 as i32);
        (0..self.count as i32).map(move |i| ((x + i * dx) as usize, (y + i * dy) as usize))
    }

    /// Cell halfway along the run
    pub fn center(&self) -> (usize, usize) {
        let (dx, dy) = self.direction.delta();
        let half = (self.count / 2) as i32;
        (
            (self.anchor.0 as i32 + half * dx) as usize,
            (self.anchor.1 as i32 + half * dy) as usize,
        )
    }

    /// Check if `other` starts on this run's ray
    fn covers_anchor_of(&self, other: &Run) -> bool {
        self.direction == other.direction && self.cells().any(|cell| cell == other.anchor)
    }
}

/// Find every collapsing run on the field
pub fn find_runs(grid: &Grid) -> Vec<Run> {
    let mut runs = Vec::new();

    for y in 0..HEIGHT {
        if grid.is_row_all(Cell::Empty, y) {
            continue;
        }
        for x in 0..WIDTH {
            if grid.cell(x, y).color().is_none() {
                continue;
            }
            for direction in Direction::ALL {
                let count = run_length(grid, x, y, direction);
                if count >= MIN_RUN {
                    runs.push(Run {
                        anchor: (x, y),
                        direction,
                        count,
                    });
                }
            }
        }
    }

    prune_overlapping(&mut runs);
    runs
}

/// Number of same-colored cells from (x, y) along a direction
fn run_length(grid: &Grid, x: usize, y: usize, direction: Direction) -> usize {
    let start = grid.cell(x, y);
    let (dx, dy) = direction.delta();
    let (mut cx, mut cy) = (x as i32, y as i32);
    let mut count = 1;
    while grid.get(cx + dx, cy + dy) == Some(start) {
        count += 1;
        cx += dx;
        cy += dy;
    }
    count
}

/// Drop runs that lie on the same ray as a longer one, until none remain
fn prune_overlapping(runs: &mut Vec<Run>) {
    let mut changed = true;
    while changed {
        changed = false;
        'scan: for i in 0..runs.len() {
            for j in 0..runs.len() {
                if i == j || !runs[i].covers_anchor_of(&runs[j]) {
                    continue;
                }
                let shorter = if runs[i].count > runs[j].count { j } else { i };
                runs.remove(shorter);
                changed = true;
                break 'scan;
            }
        }
    }
}
