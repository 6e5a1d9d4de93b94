//! Timing profiles for the reveal delay and auto-spin cadence

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SlotError;

/// Timing profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimingProfile {
    /// Normal gameplay timing
    Normal,
    /// Fast/Turbo mode
    Turbo,
    /// Studio mode (instant for testing and batch runs)
    Studio,
    /// Custom timing
    Custom,
}

impl Default for TimingProfile {
    fn default() -> Self {
        Self::Normal
    }
}

impl FromStr for TimingProfile {
    type Err = SlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "turbo" => Ok(Self::Turbo),
            "studio" => Ok(Self::Studio),
            "custom" => Ok(Self::Custom),
            other => Err(SlotError::Config(format!("unknown timing profile: {other}"))),
        }
    }
}

/// Timing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Profile type
    pub profile: TimingProfile,

    /// Reel animation time between debit and reveal (ms)
    pub spin_duration_ms: u64,

    /// Pause between auto-spins (ms)
    pub auto_spin_interval_ms: u64,
}

impl TimingConfig {
    /// Normal gameplay timing
    pub fn normal() -> Self {
        Self {
            profile: TimingProfile::Normal,
            spin_duration_ms: 1200,
            auto_spin_interval_ms: 500,
        }
    }

    /// Turbo mode
    pub fn turbo() -> Self {
        Self {
            profile: TimingProfile::Turbo,
            spin_duration_ms: 400,
            auto_spin_interval_ms: 150,
        }
    }

    /// Studio mode (no waits)
    pub fn studio() -> Self {
        Self {
            profile: TimingProfile::Studio,
            spin_duration_ms: 0,
            auto_spin_interval_ms: 0,
        }
    }

    /// Get config for profile
    pub fn from_profile(profile: TimingProfile) -> Self {
        match profile {
            TimingProfile::Normal => Self::normal(),
            TimingProfile::Turbo => Self::turbo(),
            TimingProfile::Studio => Self::studio(),
            TimingProfile::Custom => Self {
                profile: TimingProfile::Custom,
                ..Self::normal()
            },
        }
    }

    /// Scale timing by factor (< 1.0 = faster)
    pub fn scaled(&self, factor: f64) -> Self {
        let scale = |ms: u64| (ms as f64 * factor.max(0.0)).round() as u64;
        Self {
            profile: TimingProfile::Custom,
            spin_duration_ms: scale(self.spin_duration_ms),
            auto_spin_interval_ms: scale(self.auto_spin_interval_ms),
        }
    }

    /// Reel animation wait
    pub fn spin_delay(&self) -> Duration {
        Duration::from_millis(self.spin_duration_ms)
    }

    /// Auto-spin cadence
    pub fn auto_spin_interval(&self) -> Duration {
        Duration::from_millis(self.auto_spin_interval_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::normal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_matches_game_cadence() {
        let timing = TimingConfig::default();
        assert_eq!(timing.spin_delay(), Duration::from_millis(1200));
        assert_eq!(timing.auto_spin_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_profile_from_str() {
        assert_eq!("Turbo".parse::<TimingProfile>().unwrap(), TimingProfile::Turbo);
        assert_eq!(
            TimingConfig::from_profile("studio".parse().unwrap()).spin_duration_ms,
            0
        );
        assert!("warp".parse::<TimingProfile>().is_err());
    }

    #[test]
    fn test_scaled_is_custom() {
        let half = TimingConfig::normal().scaled(0.5);
        assert_eq!(half.profile, TimingProfile::Custom);
        assert_eq!(half.spin_duration_ms, 600);
        assert_eq!(half.auto_spin_interval_ms, 250);
    }
}
