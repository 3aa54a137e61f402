//! Collapse resolution: remove runs, score them, let the rest fall

use crate::grid::{Cell, Grid};
use crate::matcher::{Run, find_runs};
use crate::score::{Score, score_text};

/// A scored run, anchored at the run's center for the popup text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreEvent {
    pub text: String,
    pub lane: usize,
    pub row: usize,
    pub amount: u64,
    pub combo: u32,
}

/// Outcome of a full cascade
#[derive(Debug, Clone, Default)]
pub struct PhaseReport {
    pub score_delta: u64,
    pub collapses: u32,
    pub events: Vec<ScoreEvent>,
}

/// Perform one collapse iteration for the runs found on the field
pub fn collapse_step(grid: &mut Grid, runs: &[Run], score: &mut Score) -> Vec<ScoreEvent> {
    let combo = score.combo;
    let mut events = Vec::with_capacity(runs.len());

    for run in runs {
        let amount = score.add_run(run.count);
        let (lane, row) = run.center();
        events.push(ScoreEvent {
            text: score_text(amount, combo),
            lane,
            row,
            amount,
            combo,
        });
        // Crossing runs may share a cell
        for (x, y) in run.cells() {
            grid.set(x, y, Cell::Empty);
        }
    }

    score.advance_combo();
    grid.settle();
    events
}

/// Resolve a whole lock phase: collapse and settle until no runs remain
pub fn resolve_phase(grid: &mut Grid, score: &mut Score) -> PhaseReport {
    score.reset_combo();
    let mut report = PhaseReport::default();
    let before = score.points;

    loop {
        let runs = find_runs(grid);
        if runs.is_empty() {
            break;
        }
        tracing::debug!(runs = runs.len(), combo = score.combo, "collapse");
        report.events.extend(collapse_step(grid, &runs, score));
        report.collapses += 1;
    }

    report.score_delta = score.points - before;
    report
}
