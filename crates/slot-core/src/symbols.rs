//! Symbol definitions and the weighted symbol table

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{SlotError, SlotResult};

/// Allowed drift of the probability sum away from 1.0
pub const PROBABILITY_TOLERANCE: f64 = 0.01;

/// Index of a symbol in its table (declaration order)
pub type SymbolId = usize;

/// Symbol category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum SymbolCategory {
    Low = 0,
    Medium = 1,
    High = 2,
    Premium = 3,
    /// Triggers the bonus regardless of position, never pays on a line
    Scatter = 4,
}

/// A symbol definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    /// Symbol name (e.g., "symbol-dog1", "symbol-bone")
    pub name: String,
    /// Base pay value for a 3-symbol run
    pub value: f64,
    /// Draw probability per cell
    pub probability: f64,
    /// Category
    pub category: SymbolCategory,
    /// Display text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Symbol {
    pub fn new(
        name: impl Into<String>,
        value: f64,
        probability: f64,
        category: SymbolCategory,
    ) -> Self {
        Self {
            name: name.into(),
            value,
            probability,
            category,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_scatter(&self) -> bool {
        self.category == SymbolCategory::Scatter
    }
}

/// Weighted symbol catalog
///
/// Construction validates the table: probabilities in (0, 1] summing to 1
/// within [`PROBABILITY_TOLERANCE`], non-negative values, unique names and
/// exactly one scatter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Symbol>", into = "Vec<Symbol>")]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    scatter: SymbolId,
}

impl SymbolTable {
    /// Build a validated table
    pub fn new(symbols: Vec<Symbol>) -> SlotResult<Self> {
        if symbols.is_empty() {
            return Err(SlotError::Config("symbol table is empty".into()));
        }

        let mut names = HashSet::with_capacity(symbols.len());
        for symbol in &symbols {
            if !names.insert(symbol.name.as_str()) {
                return Err(SlotError::Config(format!(
                    "duplicate symbol name: {}",
                    symbol.name
                )));
            }
            if !symbol.value.is_finite() || symbol.value < 0.0 {
                return Err(SlotError::Config(format!(
                    "symbol {} has invalid value {}",
                    symbol.name, symbol.value
                )));
            }
            if !(symbol.probability > 0.0 && symbol.probability <= 1.0) {
                return Err(SlotError::Config(format!(
                    "symbol {} has probability {} outside (0, 1]",
                    symbol.name, symbol.probability
                )));
            }
        }

        let total: f64 = symbols.iter().map(|s| s.probability).sum();
        if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(SlotError::Config(format!(
                "symbol probabilities sum to {total:.4}, expected 1"
            )));
        }

        let scatters: Vec<SymbolId> = symbols
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_scatter())
            .map(|(id, _)| id)
            .collect();
        let &[scatter] = scatters.as_slice() else {
            return Err(SlotError::Config(format!(
                "expected exactly one scatter symbol, found {}",
                scatters.len()
            )));
        };

        Ok(Self { symbols, scatter })
    }

    /// Reference table of the running game
    ///
    /// Low symbols carry most of the weight; the bone scatter appears in 1%
    /// of cells.
    pub fn standard() -> Self {
        use SymbolCategory::*;

        let symbols = vec![
            Symbol::new("symbol-a", 5.0, 0.25, Low).with_description("A"),
            Symbol::new("symbol-10", 5.0, 0.20, Low).with_description("10"),
            Symbol::new("symbol-j", 8.0, 0.18, Low).with_description("J"),
            Symbol::new("symbol-k", 8.0, 0.15, Low).with_description("K"),
            Symbol::new("symbol-q", 12.0, 0.10, Medium).with_description("Q"),
            Symbol::new("symbol-dog1", 20.0, 0.05, Medium).with_description("Dog 1"),
            Symbol::new("symbol-dog2", 30.0, 0.03, High).with_description("Dog 2"),
            Symbol::new("symbol-dog3", 50.0, 0.02, High).with_description("Dog 3"),
            Symbol::new("symbol-dog4", 100.0, 0.01, Premium).with_description("Dog 4"),
            Symbol::new("symbol-bone", 0.0, 0.01, Scatter).with_description("Bone (scatter)"),
        ];
        let scatter = symbols.len() - 1;

        Self { symbols, scatter }
    }

    /// Weighted pick for a uniform value `r` in [0, 1)
    ///
    /// Walks the table in declaration order and returns the first symbol
    /// whose cumulative probability reaches `r`. Falls back to the first
    /// entry when the running total never gets there.
    pub fn pick(&self, r: f64) -> SymbolId {
        let mut total = 0.0;
        for (id, symbol) in self.symbols.iter().enumerate() {
            total += symbol.probability;
            if total >= r {
                return id;
            }
        }

        log::warn!(
            "Weighted draw {r} exceeded cumulative probability {total}, using {}",
            self.symbols[0].name
        );
        0
    }

    /// All symbols in declaration order
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Get symbol by ID
    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id)
    }

    /// Get symbol by ID (IDs produced by this table are always valid)
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id]
    }

    /// Find a symbol ID by name
    pub fn id_of(&self, name: &str) -> Option<SymbolId> {
        self.symbols.iter().position(|s| s.name == name)
    }

    pub fn scatter_id(&self) -> SymbolId {
        self.scatter
    }

    pub fn scatter(&self) -> &Symbol {
        &self.symbols[self.scatter]
    }

    /// Symbol names in declaration order
    pub fn names(&self) -> Vec<String> {
        self.symbols.iter().map(|s| s.name.clone()).collect()
    }

    pub fn total_probability(&self) -> f64 {
        self.symbols.iter().map(|s| s.probability).sum()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<Vec<Symbol>> for SymbolTable {
    type Error = SlotError;

    fn try_from(symbols: Vec<Symbol>) -> SlotResult<Self> {
        Self::new(symbols)
    }
}

impl From<SymbolTable> for Vec<Symbol> {
    fn from(table: SymbolTable) -> Self {
        table.symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_is_valid() {
        let table = SymbolTable::standard();
        assert!((table.total_probability() - 1.0).abs() <= PROBABILITY_TOLERANCE);
        assert_eq!(table.scatter().name, "symbol-bone");

        let rebuilt = SymbolTable::new(table.symbols().to_vec()).unwrap();
        assert_eq!(rebuilt, table);
    }

    #[test]
    fn test_pick_walks_cumulative_weights() {
        let table = SymbolTable::standard();
        assert_eq!(table.pick(0.0), 0);
        assert_eq!(table.pick(0.25), 0); // cumulative total reaches r exactly
        assert_eq!(table.pick(0.2501), 1);
        assert_eq!(table.pick(0.995), table.scatter_id());
    }

    #[test]
    fn test_pick_falls_back_to_first_symbol() {
        // Under-normalized but inside tolerance
        let table = SymbolTable::new(vec![
            Symbol::new("low", 1.0, 0.5, SymbolCategory::Low),
            Symbol::new("high", 10.0, 0.492, SymbolCategory::High),
            Symbol::new("scatter", 0.0, 0.005, SymbolCategory::Scatter),
        ])
        .unwrap();

        assert_eq!(table.pick(0.999), 0);
    }

    #[test]
    fn test_rejects_bad_probability_sum() {
        let err = SymbolTable::new(vec![
            Symbol::new("low", 1.0, 0.5, SymbolCategory::Low),
            Symbol::new("scatter", 0.0, 0.3, SymbolCategory::Scatter),
        ])
        .unwrap_err();
        assert!(matches!(err, SlotError::Config(_)));
    }

    #[test]
    fn test_requires_exactly_one_scatter() {
        let none = SymbolTable::new(vec![Symbol::new("low", 1.0, 1.0, SymbolCategory::Low)]);
        assert!(none.is_err());

        let two = SymbolTable::new(vec![
            Symbol::new("s1", 0.0, 0.5, SymbolCategory::Scatter),
            Symbol::new("s2", 0.0, 0.5, SymbolCategory::Scatter),
        ]);
        assert!(two.is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"[
            {"name": "a", "value": 5, "probability": 0.9, "category": "low"},
            {"name": "bone", "value": 0, "probability": 0.1, "category": "scatter"}
        ]"#;
        let table: SymbolTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.scatter_id(), 1);

        let bad = r#"[{"name": "a", "value": 5, "probability": 0.4, "category": "low"}]"#;
        assert!(serde_json::from_str::<SymbolTable>(bad).is_err());
    }
}
