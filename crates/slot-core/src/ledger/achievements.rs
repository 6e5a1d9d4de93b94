//! Achievement catalog and unlock rules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::SpinRecord;
use super::stats::Statistics;

/// Condition checked after each recorded spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AchievementRule {
    /// The spin paid anything
    AnyWin,
    /// The spin paid at least `min_win`
    SingleWin { min_win: f64 },
    /// Lifetime bonus triggers
    TotalBonuses { count: u64 },
    /// Current win streak
    WinStreak { length: u64 },
    /// Lifetime spins
    TotalSpins { count: u64 },
}

impl AchievementRule {
    /// `stats` already include `record`
    pub fn is_met(&self, record: &SpinRecord, stats: &Statistics) -> bool {
        match *self {
            Self::AnyWin => record.is_win,
            Self::SingleWin { min_win } => record.win >= min_win,
            Self::TotalBonuses { count } => stats.total_bonuses >= count,
            Self::WinStreak { length } => stats.current_win_streak >= length,
            Self::TotalSpins { count } => stats.total_spins >= count,
        }
    }
}

/// Catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub rule: AchievementRule,
}

impl AchievementDefinition {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        rule: AchievementRule,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            rule,
        }
    }
}

/// Built-in catalog
pub fn default_achievements() -> Vec<AchievementDefinition> {
    vec![
        AchievementDefinition::new(
            "first_win",
            "First Win",
            "Win for the first time",
            AchievementRule::AnyWin,
        ),
        AchievementDefinition::new(
            "big_win",
            "Big Win",
            "Win 100 coins or more in a single spin",
            AchievementRule::SingleWin { min_win: 100.0 },
        ),
        AchievementDefinition::new(
            "bonus_hunter",
            "Bonus Hunter",
            "Trigger 10 bonuses",
            AchievementRule::TotalBonuses { count: 10 },
        ),
        AchievementDefinition::new(
            "lucky_seven",
            "Lucky Seven",
            "Win 7 times in a row",
            AchievementRule::WinStreak { length: 7 },
        ),
        AchievementDefinition::new(
            "marathon",
            "Marathon",
            "Play 1000 spins",
            AchievementRule::TotalSpins { count: 1000 },
        ),
    ]
}

/// An unlocked achievement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub description: String,
    pub unlocked_at: DateTime<Utc>,
    pub user_id: String,
}

/// Newly met achievements, skipping any id already in `unlocked`
pub fn evaluate(
    catalog: &[AchievementDefinition],
    unlocked: &[Achievement],
    record: &SpinRecord,
    stats: &Statistics,
) -> Vec<Achievement> {
    catalog
        .iter()
        .filter(|definition| !unlocked.iter().any(|a| a.id == definition.id))
        .filter(|definition| definition.rule.is_met(record, stats))
        .map(|definition| Achievement {
            id: definition.id.clone(),
            name: definition.name.clone(),
            description: definition.description.clone(),
            unlocked_at: record.timestamp,
            user_id: record.user_id.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_big_win_unlocks_first_win_too() {
        let record = SpinRecord::new("p", "s", 1.0, 125.0);
        let mut stats = Statistics::default();
        stats.apply(&record, &[]);

        let unlocked = evaluate(&default_achievements(), &[], &record, &stats);
        let ids: Vec<&str> = unlocked.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["first_win", "big_win"]);
        assert_eq!(unlocked[0].user_id, "p");
    }

    #[test]
    fn test_already_unlocked_is_skipped() {
        let record = SpinRecord::new("p", "s", 1.0, 5.0);
        let mut stats = Statistics::default();
        stats.apply(&record, &[]);

        let first = evaluate(&default_achievements(), &[], &record, &stats);
        assert_eq!(first.len(), 1);
        let again = evaluate(&default_achievements(), &first, &record, &stats);
        assert!(again.is_empty());
    }

    #[test]
    fn test_rule_deserializes_from_tagged_form() {
        let json = r#"{
            "id": "x",
            "name": "X",
            "description": "",
            "rule": {"kind": "win_streak", "length": 3}
        }"#;
        let definition: AchievementDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(definition.rule, AchievementRule::WinStreak { length: 3 });
    }
}
