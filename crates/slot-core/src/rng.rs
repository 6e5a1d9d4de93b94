//! Random sources for reel draws
//!
//! Any `rand` generator works as a source. [`ScriptedSource`] replays a fixed
//! sequence so grids can be reproduced exactly.

use std::collections::VecDeque;

use rand::{Rng, RngCore};

use crate::reels::Grid;
use crate::symbols::SymbolTable;

/// Supplier of uniform values for weighted symbol draws
pub trait RandomSource: Send {
    /// Next value in [0, 1), `None` when the source cannot supply one
    fn next_unit(&mut self) -> Option<f64>;
}

impl<R: RngCore + Send> RandomSource for R {
    fn next_unit(&mut self) -> Option<f64> {
        Some(self.random::<f64>())
    }
}

/// Fixed sequence of draw values
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    values: VecDeque<f64>,
    script: Vec<f64>,
    repeat: bool,
}

impl ScriptedSource {
    /// Replays `values` once, then reports exhaustion
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        let script: Vec<f64> = values.into_iter().collect();
        Self {
            values: script.iter().copied().collect(),
            script,
            repeat: false,
        }
    }

    /// Replays `values` forever
    pub fn cycling(values: impl IntoIterator<Item = f64>) -> Self {
        Self::new(values).repeating()
    }

    /// Wrap around instead of running out
    pub fn repeating(mut self) -> Self {
        self.repeat = true;
        self
    }

    /// Values that draw exactly `grid` from `table`
    ///
    /// Each value sits halfway into its symbol's cumulative probability band.
    pub fn replaying(table: &SymbolTable, grid: &Grid) -> Self {
        let mut starts = Vec::with_capacity(table.len());
        let mut total = 0.0;
        for symbol in table.symbols() {
            starts.push(total);
            total += symbol.probability;
        }

        Self::new(
            grid.cells()
                .map(|(_, id)| starts[id] + table.symbol(id).probability / 2.0),
        )
    }

    /// Values left before the script wraps or runs out
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl RandomSource for ScriptedSource {
    fn next_unit(&mut self) -> Option<f64> {
        if self.values.is_empty() && self.repeat {
            self.values.extend(self.script.iter().copied());
        }
        self.values.pop_front()
    }
}
