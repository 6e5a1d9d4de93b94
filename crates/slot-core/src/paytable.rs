//! Paylines and win evaluation

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{SlotError, SlotResult};
use crate::reels::{Grid, Position, REEL_COUNT, ROW_COUNT};
use crate::symbols::SymbolTable;

/// Shortest run that can pay
pub const MIN_RUN: u8 = 3;

/// A payline definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payline {
    /// Payline index (0-based)
    pub index: u8,
    /// Row for each reel (e.g., [0, 1, 2, 1, 0] for a "V" shape)
    pub rows: [u8; REEL_COUNT],
}

impl Payline {
    pub fn new(index: u8, rows: [u8; REEL_COUNT]) -> Self {
        Self { index, rows }
    }

    /// Same row across all reels
    pub fn straight(index: u8, row: u8) -> Self {
        Self {
            index,
            rows: [row; REEL_COUNT],
        }
    }

    /// Cells this line passes through, reel 0 first
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.rows
            .iter()
            .enumerate()
            .map(|(reel, &row)| Position::new(reel as u8, row))
    }

    /// All rows inside the visible window
    pub fn is_valid(&self) -> bool {
        self.rows.iter().all(|&row| (row as usize) < ROW_COUNT)
    }
}

/// The 15 payline shapes of the 5×3 game
pub fn standard_15_paylines() -> Vec<Payline> {
    vec![
        // Straight lines
        Payline::straight(0, 1), // Middle
        Payline::straight(1, 0), // Top
        Payline::straight(2, 2), // Bottom
        // V shapes
        Payline::new(3, [0, 1, 2, 1, 0]),
        Payline::new(4, [2, 1, 0, 1, 2]),
        // W shapes
        Payline::new(5, [1, 0, 1, 0, 1]),
        Payline::new(6, [1, 2, 1, 2, 1]),
        // Dips
        Payline::new(7, [0, 0, 1, 0, 0]),
        Payline::new(8, [2, 2, 1, 2, 2]),
        Payline::new(9, [0, 1, 1, 1, 0]),
        Payline::new(10, [2, 1, 1, 1, 2]),
        Payline::new(11, [1, 0, 0, 0, 1]),
        Payline::new(12, [1, 2, 2, 2, 1]),
        // Zigzag
        Payline::new(13, [0, 2, 0, 2, 0]),
        Payline::new(14, [2, 0, 2, 0, 2]),
    ]
}

/// Run-length multipliers applied to a symbol's base value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayMultipliers(BTreeMap<u8, f64>);

impl PayMultipliers {
    pub fn new(multipliers: BTreeMap<u8, f64>) -> Self {
        Self(multipliers)
    }

    /// Multiplier for a run of `count`, if that run pays
    pub fn for_run(&self, count: u8) -> Option<f64> {
        self.0.get(&count).copied()
    }

    pub fn entries(&self) -> &BTreeMap<u8, f64> {
        &self.0
    }
}

impl Default for PayMultipliers {
    fn default() -> Self {
        Self(BTreeMap::from([(3, 1.0), (4, 5.0), (5, 25.0)]))
    }
}

/// Result of one payline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineResult {
    /// Payline index
    pub line_index: u8,
    /// Run length, 0 when the line does not pay
    pub match_count: u8,
    /// Win amount (value × multiplier × bet)
    pub payout: f64,
    /// Symbol anchoring the run on reel 0
    pub symbol_name: String,
}

impl LineResult {
    pub fn is_win(&self) -> bool {
        self.match_count > 0 && self.payout > 0.0
    }
}

/// Evaluation of one grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinResult {
    pub grid: Grid,
    /// Bet the grid was evaluated at
    pub bet: f64,
    /// Sum of all paying lines
    pub total_win: f64,
    /// Cells on any paying line, each at most once
    pub winning_positions: BTreeSet<Position>,
    /// Scatters anywhere on the grid
    pub scatter_count: u8,
    /// Paying lines only
    pub line_wins: Vec<LineResult>,
}

impl SpinResult {
    pub fn is_win(&self) -> bool {
        self.total_win > 0.0
    }
}

/// Evaluates paylines against a grid
#[derive(Debug, Clone)]
pub struct PaylineEvaluator {
    table: Arc<SymbolTable>,
    paylines: Vec<Payline>,
    multipliers: PayMultipliers,
}

impl PaylineEvaluator {
    /// Evaluator over `paylines`; every line must stay inside the grid
    pub fn new(
        table: Arc<SymbolTable>,
        paylines: Vec<Payline>,
        multipliers: PayMultipliers,
    ) -> SlotResult<Self> {
        if let Some(line) = paylines.iter().find(|line| !line.is_valid()) {
            return Err(SlotError::Config(format!(
                "payline {} has a row outside the grid: {:?}",
                line.index, line.rows
            )));
        }

        Ok(Self {
            table,
            paylines,
            multipliers,
        })
    }

    /// Reference table, 15 lines, default multipliers
    pub fn standard(table: Arc<SymbolTable>) -> Self {
        Self {
            table,
            paylines: standard_15_paylines(),
            multipliers: PayMultipliers::default(),
        }
    }

    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    pub fn paylines(&self) -> &[Payline] {
        &self.paylines
    }

    /// Evaluate every payline plus the scatter count
    pub fn evaluate(&self, grid: &Grid, bet: f64) -> SpinResult {
        let mut total_win = 0.0;
        let mut winning_positions = BTreeSet::new();
        let mut line_wins = Vec::new();

        for payline in &self.paylines {
            let line = self.evaluate_line(grid, payline, bet);
            if !line.is_win() {
                continue;
            }

            total_win += line.payout;
            winning_positions.extend(payline.positions().take(line.match_count as usize));
            line_wins.push(line);
        }

        SpinResult {
            grid: grid.clone(),
            bet,
            total_win,
            winning_positions,
            scatter_count: self.count_scatters(grid),
            line_wins,
        }
    }

    /// Run anchored at reel 0, broken at the first mismatch
    ///
    /// Runs shorter than [`MIN_RUN`] and scatter-led lines report
    /// `match_count = 0` and no payout.
    pub fn evaluate_line(&self, grid: &Grid, payline: &Payline, bet: f64) -> LineResult {
        let first = grid.get(0, payline.rows[0] as usize);
        let symbol = self.table.symbol(first);

        let run = payline
            .positions()
            .take_while(|&position| self.table.symbol(grid.at(position)).name == symbol.name)
            .count() as u8;

        let multiplier = if symbol.is_scatter() || run < MIN_RUN {
            None
        } else {
            self.multipliers.for_run(run)
        };

        match multiplier {
            Some(multiplier) => LineResult {
                line_index: payline.index,
                match_count: run,
                payout: symbol.value * multiplier * bet,
                symbol_name: symbol.name.clone(),
            },
            None => LineResult {
                line_index: payline.index,
                match_count: 0,
                payout: 0.0,
                symbol_name: symbol.name.clone(),
            },
        }
    }

    /// Scatters anywhere on the grid, independent of paylines
    pub fn count_scatters(&self, grid: &Grid) -> u8 {
        grid.count(self.table.scatter_id()) as u8
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn evaluator() -> PaylineEvaluator {
        PaylineEvaluator::standard(Arc::new(SymbolTable::standard()))
    }

    fn grid(reels: [[&str; ROW_COUNT]; REEL_COUNT]) -> Grid {
        Grid::from_names(&SymbolTable::standard(), reels).unwrap()
    }

    #[test]
    fn test_standard_paylines_are_valid() {
        let lines = standard_15_paylines();
        assert_eq!(lines.len(), 15);
        for (i, line) in lines.iter().enumerate() {
            assert_eq!(line.index as usize, i);
            assert!(line.is_valid());
        }
    }

    #[test]
    fn test_rejects_payline_outside_grid() {
        let lines = vec![Payline::straight(0, 1), Payline::new(1, [0, 1, 3, 1, 0])];
        let err = PaylineEvaluator::new(
            Arc::new(SymbolTable::standard()),
            lines,
            PayMultipliers::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SlotError::Config(msg) if msg.contains("payline 1")));
    }

    #[test]
    fn test_three_of_a_kind_on_middle_line() {
        let grid = grid([
            ["symbol-k", "symbol-a", "symbol-q"],
            ["symbol-j", "symbol-a", "symbol-q"],
            ["symbol-k", "symbol-a", "symbol-j"],
            ["symbol-j", "symbol-10", "symbol-k"],
            ["symbol-q", "symbol-dog1", "symbol-j"],
        ]);

        let result = evaluator().evaluate(&grid, 1.0);
        assert_relative_eq!(result.total_win, 5.0);
        assert_eq!(result.line_wins.len(), 1);
        assert_eq!(result.line_wins[0].line_index, 0);
        assert_eq!(result.line_wins[0].match_count, 3);
        assert_eq!(result.winning_positions.len(), 3);
        assert!(result.winning_positions.contains(&Position::new(2, 1)));
    }

    #[test]
    fn test_four_of_a_kind_scales_with_bet() {
        let grid = grid([
            ["symbol-k", "symbol-a", "symbol-q"],
            ["symbol-j", "symbol-a", "symbol-q"],
            ["symbol-k", "symbol-a", "symbol-j"],
            ["symbol-j", "symbol-a", "symbol-k"],
            ["symbol-q", "symbol-dog1", "symbol-j"],
        ]);

        let result = evaluator().evaluate(&grid, 2.0);
        assert_relative_eq!(result.total_win, 50.0);
        assert_eq!(result.line_wins[0].match_count, 4);
    }

    #[test]
    fn test_short_and_scatter_runs_do_not_pay() {
        let evaluator = evaluator();
        let grid = grid([
            ["symbol-bone", "symbol-a", "symbol-q"],
            ["symbol-bone", "symbol-a", "symbol-k"],
            ["symbol-bone", "symbol-j", "symbol-j"],
            ["symbol-j", "symbol-10", "symbol-k"],
            ["symbol-q", "symbol-dog1", "symbol-j"],
        ]);

        let top = evaluator.evaluate_line(&grid, &Payline::straight(1, 0), 1.0);
        assert_eq!(top.match_count, 0);
        assert_eq!(top.payout, 0.0);

        let middle = evaluator.evaluate_line(&grid, &Payline::straight(0, 1), 1.0);
        assert_eq!(middle.match_count, 0);

        let result = evaluator.evaluate(&grid, 1.0);
        assert_eq!(result.total_win, 0.0);
        assert_eq!(result.scatter_count, 3);
        assert!(result.winning_positions.is_empty());
    }

    #[test]
    fn test_shared_cells_are_counted_once() {
        // Whole grid is symbol-a: all 15 lines pay 5-of-a-kind
        let grid = grid([["symbol-a"; ROW_COUNT]; REEL_COUNT]);
        let result = evaluator().evaluate(&grid, 1.0);

        assert_eq!(result.line_wins.len(), 15);
        assert_relative_eq!(result.total_win, 15.0 * 5.0 * 25.0);
        assert_eq!(result.winning_positions.len(), 15);
    }

    #[test]
    fn test_scatter_count_is_independent_of_lines() {
        let grid = grid([
            ["symbol-bone", "symbol-dog4", "symbol-bone"],
            ["symbol-a", "symbol-dog4", "symbol-bone"],
            ["symbol-bone", "symbol-dog4", "symbol-a"],
            ["symbol-j", "symbol-k", "symbol-bone"],
            ["symbol-q", "symbol-10", "symbol-j"],
        ]);

        let result = evaluator().evaluate(&grid, 1.0);
        assert_eq!(result.scatter_count, 5);
        assert_relative_eq!(result.total_win, 100.0);
    }
}
