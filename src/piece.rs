//! Active falling piece logic

use crate::grid::{Cell, Color, Grid, HEIGHT, WIDTH};

/// Field units per cell row
pub const CELL: f32 = 32.0;
/// Number of segments in a piece
pub const PIECE_HEIGHT: usize = 3;
/// Lane a new piece enters the field in
pub const SPAWN_LANE: usize = 2;
/// Extra fall speed while soft drop is held (units per second)
pub const SPEEDUP: f32 = 250.0;
/// Distance under which a falling piece snaps onto its target
const SNAP_EPSILON: f32 = 0.5;

/// Lateral shift direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    Left,
    Right,
}

/// Color rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// Front (top) color moves to the back
    Forward,
    /// Back (bottom) color moves to the front
    Backward,
}

/// Vertical motion state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Falling,
    Locked,
}

/// A 3-segment piece, top color first
#[derive(Debug, Clone)]
pub struct Piece {
    pub colors: [Color; PIECE_HEIGHT],
    /// Horizontal lane (0..WIDTH)
    pub lane: usize,
    /// Top edge of the piece in field units
    pub pos_y: f32,
    /// Resting top edge for the current lane
    pub target_y: f32,
    pub motion: Motion,
    /// Base fall speed in units per second
    pub speed: f32,
    /// Speed added while soft drop is held
    pub boost: f32,
    /// Soft drop asserted for the current tick
    speedup: bool,
}

impl Piece {
    /// Create a piece waiting off-field
    pub fn new(colors: [Color; PIECE_HEIGHT], speed: f32) -> Self {
        Self {
            colors,
            lane: SPAWN_LANE,
            pos_y: -CELL,
            target_y: -CELL,
            motion: Motion::Falling,
            speed,
            boost: SPEEDUP,
            speedup: false,
        }
    }

    /// Place the piece above the field in the spawn lane
    pub fn spawn(&mut self, grid: &Grid) {
        self.lane = SPAWN_LANE;
        self.pos_y = -CELL;
        self.target_y = target_for(grid, self.lane);
        self.motion = Motion::Falling;
        self.speedup = false;
    }

    pub fn is_locked(&self) -> bool {
        self.motion == Motion::Locked
    }

    /// Assert soft drop for this tick only
    pub fn set_speedup(&mut self) {
        self.speedup = true;
    }

    /// Move toward the target. Returns true on the tick the piece locks.
    pub fn advance(&mut self, dt: f32) -> bool {
        let speedup = std::mem::take(&mut self.speedup);
        if self.is_locked() {
            return false;
        }

        let speed = if speedup { self.speed + self.boost } else { self.speed };
        let remaining = (self.target_y - self.pos_y).max(0.0);
        let travel = remaining.min(dt * speed);

        // Snap on what is left to fall, never on how far one frame moves
        if remaining - travel < SNAP_EPSILON {
            self.pos_y = self.target_y;
            self.motion = Motion::Locked;
            true
        } else {
            self.pos_y += travel;
            false
        }
    }

    /// Try to move one lane sideways, returns true if successful
    pub fn shift(&mut self, direction: Shift, grid: &Grid) -> bool {
        if self.is_locked() {
            return false;
        }
        let lane = match direction {
            Shift::Left if self.lane > 0 => self.lane - 1,
            Shift::Right if self.lane + 1 < WIDTH => self.lane + 1,
            _ => return false,
        };
        if grid.cell(lane, self.lower_edge_row()) != Cell::Empty {
            return false;
        }
        self.lane = lane;
        self.target_y = target_for(grid, lane);
        true
    }

    /// Cycle the colors by one position
    pub fn rotate(&mut self, direction: Rotation) {
        match direction {
            Rotation::Forward => self.colors.rotate_left(1),
            Rotation::Backward => self.colors.rotate_right(1),
        }
    }

    /// Row holding the piece's lower edge, checked against neighbouring lanes
    fn lower_edge_row(&self) -> usize {
        let bottom = (self.pos_y + PIECE_HEIGHT as f32 * CELL) as i32 / CELL as i32;
        bottom.clamp(0, HEIGHT as i32) as usize
    }

    /// Row of the top segment once resting on the target
    pub fn target_row(&self) -> i32 {
        (self.target_y / CELL).round() as i32
    }

    /// Rows the three segments occupy after landing, top first
    pub fn landing_rows(&self) -> [i32; PIECE_HEIGHT] {
        let top = self.target_row();
        [top, top + 1, top + 2]
    }

    /// Segment positions in fractional rows for rendering, top first
    pub fn segments(&self) -> [(usize, f32, Color); PIECE_HEIGHT] {
        let top = self.pos_y / CELL;
        [0, 1, 2].map(|i| (self.lane, top + i as f32, self.colors[i]))
    }
}

/// Resting top edge of a piece in a lane
pub fn target_for(grid: &Grid, lane: usize) -> f32 {
    (grid.find_lowest_occupied(lane) as f32 - PIECE_HEIGHT as f32) * CELL
}
