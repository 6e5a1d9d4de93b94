//! Game configuration

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SlotError, SlotResult};
use crate::ledger::{AchievementDefinition, default_achievements};
use crate::paytable::{MIN_RUN, PayMultipliers, Payline, standard_15_paylines};
use crate::reels::REEL_COUNT;
use crate::symbols::SymbolTable;
use crate::timing::TimingConfig;

/// Bet and deposit limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameLimits {
    pub min_bet: f64,
    pub max_bet: f64,
    /// Bet selected when a session starts
    pub default_bet: f64,
    /// Largest single deposit
    pub max_deposit: f64,
}

impl GameLimits {
    /// Reject bets that are not finite, not positive, or outside the limits
    pub fn validate_bet(&self, bet: f64) -> SlotResult<()> {
        if !bet.is_finite() || bet <= 0.0 {
            return Err(SlotError::Validation(format!("bet must be positive, got {bet}")));
        }
        if bet < self.min_bet || bet > self.max_bet {
            return Err(SlotError::Validation(format!(
                "bet {bet} outside [{}, {}]",
                self.min_bet, self.max_bet
            )));
        }
        Ok(())
    }

    pub fn clamp_bet(&self, bet: f64) -> f64 {
        if bet.is_nan() {
            return self.min_bet;
        }
        bet.clamp(self.min_bet, self.max_bet)
    }

    /// Deposits must lie in (0, max_deposit]
    pub fn validate_deposit(&self, amount: f64) -> SlotResult<()> {
        if !amount.is_finite() || amount <= 0.0 || amount > self.max_deposit {
            return Err(SlotError::Validation(format!(
                "deposit {amount} outside (0, {}]",
                self.max_deposit
            )));
        }
        Ok(())
    }
}

impl Default for GameLimits {
    fn default() -> Self {
        Self {
            min_bet: 1.0,
            max_bet: 100.0,
            default_bet: 1.0,
            max_deposit: 10_000.0,
        }
    }
}

/// Scatter bonus configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BonusConfig {
    /// Scatters needed to trigger free spins
    pub scatter_trigger: u8,
    /// Free spins awarded per scatter count
    pub awards: BTreeMap<u8, u32>,
}

impl BonusConfig {
    /// Free spins for `scatter_count` scatters
    ///
    /// Counts between or above the configured keys get the award of the
    /// largest key not exceeding them.
    pub fn award_for(&self, scatter_count: u8) -> u32 {
        if scatter_count < self.scatter_trigger {
            return 0;
        }
        self.awards
            .range(..=scatter_count)
            .next_back()
            .map(|(_, &spins)| spins)
            .unwrap_or(0)
    }
}

impl Default for BonusConfig {
    fn default() -> Self {
        Self {
            scatter_trigger: 3,
            awards: BTreeMap::from([(3, 12), (4, 15), (5, 20)]),
        }
    }
}

/// Statistics ledger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// History entries kept, newest first
    pub history_limit: usize,
    /// Achievement catalog
    pub achievements: Vec<AchievementDefinition>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            history_limit: 1000,
            achievements: default_achievements(),
        }
    }
}

/// Complete game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotConfig {
    pub game: GameLimits,
    pub symbols: SymbolTable,
    pub paylines: Vec<Payline>,
    pub multipliers: PayMultipliers,
    pub bonus: BonusConfig,
    pub timing: TimingConfig,
    pub ledger: LedgerConfig,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl SlotConfig {
    /// Reference game: standard symbol table and 15 paylines
    pub fn standard() -> Self {
        Self {
            game: GameLimits::default(),
            symbols: SymbolTable::standard(),
            paylines: standard_15_paylines(),
            multipliers: PayMultipliers::default(),
            bonus: BonusConfig::default(),
            timing: TimingConfig::default(),
            ledger: LedgerConfig::default(),
        }
    }

    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    pub fn from_json_str(json: &str) -> SlotResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> SlotResult<Self> {
        let config: Self = serde_yml::from_str(yaml)
            .map_err(|e| SlotError::Config(format!("YAML parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn load(path: impl AsRef<Path>) -> SlotResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Self::from_json_str(&text),
            Some("yaml" | "yml") => Self::from_yaml_str(&text),
            _ => Err(SlotError::Config(format!(
                "unsupported config format: {}",
                path.display()
            ))),
        }
    }

    pub fn to_json(&self) -> SlotResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every section for consistency
    pub fn validate(&self) -> SlotResult<()> {
        // Re-run table validation for tables built in code
        SymbolTable::new(self.symbols.symbols().to_vec())?;

        let game = &self.game;
        if !(game.min_bet > 0.0 && game.min_bet <= game.max_bet && game.max_bet.is_finite()) {
            return Err(SlotError::Config(format!(
                "invalid bet range [{}, {}]",
                game.min_bet, game.max_bet
            )));
        }
        if !(game.min_bet..=game.max_bet).contains(&game.default_bet) {
            return Err(SlotError::Config(format!(
                "default bet {} outside [{}, {}]",
                game.default_bet, game.min_bet, game.max_bet
            )));
        }
        if !(game.max_deposit > 0.0 && game.max_deposit.is_finite()) {
            return Err(SlotError::Config("max_deposit must be positive".into()));
        }

        if self.paylines.is_empty() {
            return Err(SlotError::Config("no paylines configured".into()));
        }
        let mut indices = HashSet::new();
        for line in &self.paylines {
            if !line.is_valid() {
                return Err(SlotError::Config(format!(
                    "payline {} has a row outside the grid: {:?}",
                    line.index, line.rows
                )));
            }
            if !indices.insert(line.index) {
                return Err(SlotError::Config(format!("duplicate payline index {}", line.index)));
            }
        }

        if self.multipliers.entries().is_empty() {
            return Err(SlotError::Config("no pay multipliers configured".into()));
        }
        for (&run, &multiplier) in self.multipliers.entries() {
            if run < MIN_RUN || run as usize > REEL_COUNT {
                return Err(SlotError::Config(format!(
                    "multiplier for run {run} outside {MIN_RUN}..={REEL_COUNT}"
                )));
            }
            if !multiplier.is_finite() || multiplier < 0.0 {
                return Err(SlotError::Config(format!(
                    "multiplier for run {run} is invalid: {multiplier}"
                )));
            }
        }

        if self.bonus.scatter_trigger == 0 {
            return Err(SlotError::Config("scatter trigger must be at least 1".into()));
        }
        if self.bonus.awards.keys().any(|&count| count < self.bonus.scatter_trigger) {
            return Err(SlotError::Config(
                "bonus award configured below the scatter trigger".into(),
            ));
        }

        if self.ledger.history_limit == 0 {
            return Err(SlotError::Config("history limit must be positive".into()));
        }
        let mut ids = HashSet::new();
        for achievement in &self.ledger.achievements {
            if !ids.insert(achievement.id.as_str()) {
                return Err(SlotError::Config(format!(
                    "duplicate achievement id: {}",
                    achievement.id
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::TimingProfile;

    #[test]
    fn test_standard_config_is_valid() {
        let config = SlotConfig::standard();
        config.validate().unwrap();
        assert_eq!(config.paylines.len(), 15);
        assert_eq!(config.ledger.history_limit, 1000);
    }

    #[test]
    fn test_bonus_awards() {
        let bonus = BonusConfig::default();
        assert_eq!(bonus.award_for(2), 0);
        assert_eq!(bonus.award_for(3), 12);
        assert_eq!(bonus.award_for(4), 15);
        assert_eq!(bonus.award_for(5), 20);
        assert_eq!(bonus.award_for(9), 20);
    }

    #[test]
    fn test_bet_limits() {
        let limits = GameLimits::default();
        assert!(limits.validate_bet(1.0).is_ok());
        assert!(limits.validate_bet(100.0).is_ok());
        assert!(limits.validate_bet(0.0).is_err());
        assert!(limits.validate_bet(f64::NAN).is_err());
        assert!(limits.validate_bet(101.0).is_err());
        assert_eq!(limits.clamp_bet(250.0), 100.0);
        assert_eq!(limits.clamp_bet(-3.0), 1.0);

        assert!(limits.validate_deposit(10_000.0).is_ok());
        assert!(limits.validate_deposit(10_000.01).is_err());
        assert!(limits.validate_deposit(0.0).is_err());
    }

    #[test]
    fn test_json_round_trip_keeps_config() {
        let config = SlotConfig::standard();
        let json = config.to_json().unwrap();
        assert_eq!(SlotConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_yaml_partial_config_uses_defaults() {
        let yaml = r#"
game:
  max_bet: 50
timing:
  profile: turbo
  spin_duration_ms: 300
bonus:
  awards:
    3: 10
    5: 30
"#;
        let config = SlotConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.game.max_bet, 50.0);
        assert_eq!(config.game.min_bet, 1.0);
        assert_eq!(config.timing.profile, TimingProfile::Turbo);
        assert_eq!(config.timing.auto_spin_interval_ms, 500);
        assert_eq!(config.bonus.award_for(4), 10);
        assert_eq!(config.paylines.len(), 15);
    }

    #[test]
    fn test_rejects_bad_payline_row() {
        let mut config = SlotConfig::standard();
        config.paylines.push(Payline::new(15, [0, 1, 3, 1, 0]));
        assert!(matches!(config.validate(), Err(SlotError::Config(_))));
    }

    #[test]
    fn test_rejects_bad_multiplier_key() {
        let json = r#"{"multipliers": {"2": 1.0, "3": 1.0}}"#;
        assert!(SlotConfig::from_json_str(json).is_err());
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("game.json");
        std::fs::write(&json_path, r#"{"game": {"default_bet": 5}}"#).unwrap();
        assert_eq!(SlotConfig::load(&json_path).unwrap().game.default_bet, 5.0);

        let toml_path = dir.path().join("game.toml");
        std::fs::write(&toml_path, "").unwrap();
        assert!(SlotConfig::load(&toml_path).is_err());
    }
}
