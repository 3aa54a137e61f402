//! Collapse scoring with a quadratic combo multiplier

/// Points for each cell of a run beyond the first two
const BASE_POINTS: u64 = 300;

/// Score for one collapsing run at a given combo depth.
///
/// `300 * (count - 2) * (combo + 1)^2`, rounded to the nearest ten.
pub fn run_score(count: usize, combo: u32) -> u64 {
    let base = BASE_POINTS * count.saturating_sub(2) as u64;
    let multiplier = (combo as u64 + 1).pow(2);
    (base * multiplier + 5) / 10 * 10
}

/// Floating text shown for a scored run
pub fn score_text(amount: u64, combo: u32) -> String {
    if combo > 0 {
        format!("{} combo! +{}", combo + 1, amount)
    } else {
        format!("+{}", amount)
    }
}

/// Score and combo tracking for one player
#[derive(Debug, Clone, Default)]
pub struct Score {
    /// Accumulated points
    pub points: u64,
    /// Collapses so far in the current lock phase
    pub combo: u32,
    /// Deepest combo reached this game
    pub best_combo: u32,
    /// Collapse iterations this game
    pub collapses: u32,
    /// Cells removed this game
    pub cells_cleared: u32,
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score a run at the current combo depth, returns the amount added
    pub fn add_run(&mut self, count: usize) -> u64 {
        let amount = run_score(count, self.combo);
        self.points += amount;
        self.cells_cleared += count as u32;
        amount
    }

    /// Close one collapse iteration; later runs in this phase score higher
    pub fn advance_combo(&mut self) {
        self.combo += 1;
        self.collapses += 1;
        self.best_combo = self.best_combo.max(self.combo);
    }

    /// Reset combo (called when a new piece locks)
    pub fn reset_combo(&mut self) {
        self.combo = 0;
    }
}
