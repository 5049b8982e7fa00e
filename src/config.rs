//! Application-level configuration loading, including per-game tuning knobs.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::games::{
    DelayRange, GameTunings, arithmetic::ArithmeticTuning, quickdraw::QuickdrawTuning,
    rhythm::RhythmTuning, stroop::StroopTuning,
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "DUELPAD_BACK_CONFIG_PATH";

/// Immutable runtime configuration shared across the application.
///
/// Every tuning knob defaults to the shipped game constants; the config file
/// only needs to name the values it wants to override.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    tunings: GameTunings,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// built-in tuning defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded game tuning overrides from config");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Per-variant tuning blocks.
    pub fn tunings(&self) -> &GameTunings {
        &self.tunings
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    quickdraw: Option<RawQuickdraw>,
    #[serde(default)]
    stroop: Option<RawStroop>,
    #[serde(default)]
    arithmetic: Option<RawArithmetic>,
    #[serde(default)]
    rhythm: Option<RawRhythm>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let mut tunings = GameTunings::default();
        if let Some(overrides) = raw.quickdraw {
            overrides.apply(&mut tunings.quickdraw);
        }
        if let Some(overrides) = raw.stroop {
            overrides.apply(&mut tunings.stroop);
        }
        if let Some(overrides) = raw.arithmetic {
            overrides.apply(&mut tunings.arithmetic);
        }
        if let Some(overrides) = raw.rhythm {
            overrides.apply(&mut tunings.rhythm);
        }
        Self { tunings }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of a randomized delay interval.
struct RawRange {
    min_ms: u64,
    max_ms: u64,
}

impl From<RawRange> for DelayRange {
    fn from(value: RawRange) -> Self {
        DelayRange::new(value.min_ms, value.max_ms)
    }
}

#[derive(Debug, Deserialize)]
/// Reaction duel overrides.
struct RawQuickdraw {
    rounds: Option<u32>,
    draw_delay: Option<RawRange>,
    first_false_cue: Option<RawRange>,
    false_cue_gap: Option<RawRange>,
    false_cue_cutoff_ms: Option<u64>,
    round_pause_ms: Option<u64>,
    end_delay_ms: Option<u64>,
}

impl RawQuickdraw {
    fn apply(self, tuning: &mut QuickdrawTuning) {
        if let Some(rounds) = self.rounds {
            tuning.rounds = rounds;
        }
        if let Some(range) = self.draw_delay {
            tuning.draw_delay = range.into();
        }
        if let Some(range) = self.first_false_cue {
            tuning.first_false_cue = range.into();
        }
        if let Some(range) = self.false_cue_gap {
            tuning.false_cue_gap = range.into();
        }
        if let Some(value) = self.false_cue_cutoff_ms {
            tuning.false_cue_cutoff_ms = value;
        }
        if let Some(value) = self.round_pause_ms {
            tuning.round_pause_ms = value;
        }
        if let Some(value) = self.end_delay_ms {
            tuning.end_delay_ms = value;
        }
    }
}

#[derive(Debug, Deserialize)]
/// Word/ink match overrides.
struct RawStroop {
    winning_score: Option<u32>,
    reveal_delay: Option<RawRange>,
    fakeout_visible_ms: Option<u64>,
    interstitial_ms: Option<u64>,
    end_delay_ms: Option<u64>,
}

impl RawStroop {
    fn apply(self, tuning: &mut StroopTuning) {
        if let Some(value) = self.winning_score {
            tuning.winning_score = value;
        }
        if let Some(range) = self.reveal_delay {
            tuning.reveal_delay = range.into();
        }
        if let Some(value) = self.fakeout_visible_ms {
            tuning.fakeout_visible_ms = value;
        }
        if let Some(value) = self.interstitial_ms {
            tuning.interstitial_ms = value;
        }
        if let Some(value) = self.end_delay_ms {
            tuning.end_delay_ms = value;
        }
    }
}

#[derive(Debug, Deserialize)]
/// Arithmetic race overrides.
struct RawArithmetic {
    winning_score: Option<u32>,
    freeze_ms: Option<u64>,
    end_delay_ms: Option<u64>,
}

impl RawArithmetic {
    fn apply(self, tuning: &mut ArithmeticTuning) {
        if let Some(value) = self.winning_score {
            tuning.winning_score = value;
        }
        if let Some(value) = self.freeze_ms {
            tuning.freeze_ms = value;
        }
        if let Some(value) = self.end_delay_ms {
            tuning.end_delay_ms = value;
        }
    }
}

#[derive(Debug, Deserialize)]
/// Rhythm race overrides.
struct RawRhythm {
    goal: Option<u32>,
    beat_period: Option<RawRange>,
    perfect_window: Option<f64>,
    good_window: Option<f64>,
    perfect_gain: Option<u32>,
    good_gain: Option<u32>,
    tick_interval_ms: Option<u64>,
    end_delay_ms: Option<u64>,
}

impl RawRhythm {
    fn apply(self, tuning: &mut RhythmTuning) {
        if let Some(value) = self.goal {
            tuning.goal = value;
        }
        if let Some(range) = self.beat_period {
            tuning.beat_period = range.into();
        }
        if let Some(value) = self.perfect_window {
            tuning.perfect_window = value;
        }
        if let Some(value) = self.good_window {
            tuning.good_window = value;
        }
        if let Some(value) = self.perfect_gain {
            tuning.perfect_gain = value;
        }
        if let Some(value) = self.good_gain {
            tuning.good_gain = value;
        }
        if let Some(value) = self.tick_interval_ms {
            tuning.tick_interval_ms = value;
        }
        if let Some(value) = self.end_delay_ms {
            tuning.end_delay_ms = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_overrides_leave_other_defaults_untouched() {
        let raw: RawConfig = serde_json::from_str(
            r#"{
                "quickdraw": { "rounds": 3, "draw_delay": { "min_ms": 1000, "max_ms": 2000 } },
                "rhythm": { "goal": 50 }
            }"#,
        )
        .expect("parse raw config");
        let config: AppConfig = raw.into();

        assert_eq!(config.tunings().quickdraw.rounds, 3);
        assert_eq!(
            config.tunings().quickdraw.draw_delay,
            DelayRange::new(1000, 2000)
        );
        assert_eq!(config.tunings().quickdraw.round_pause_ms, 2000);
        assert_eq!(config.tunings().rhythm.goal, 50);
        assert_eq!(config.tunings().stroop.winning_score, 5);
    }

    #[test]
    fn empty_config_equals_defaults() {
        let raw: RawConfig = serde_json::from_str("{}").expect("parse raw config");
        let config: AppConfig = raw.into();
        assert_eq!(config.tunings().arithmetic.winning_score, 5);
        assert_eq!(config.tunings().quickdraw.rounds, 5);
    }
}
