/// Runtime configuration, read from the environment
use std::path::PathBuf;

use crate::selector::ExhaustionPolicy;

pub const DATA_DIR_VAR: &str = "IDEA_ROULETTE_DATA_DIR";
pub const ON_EXHAUSTED_VAR: &str = "IDEA_ROULETTE_ON_EXHAUSTED";
pub const SEED_VAR: &str = "IDEA_ROULETTE_SEED";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory holding one JSON file per chat
    pub data_dir: PathBuf,
    pub on_exhausted: ExhaustionPolicy,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; unparsable values fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = lookup(DATA_DIR_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let on_exhausted = match lookup(ON_EXHAUSTED_VAR) {
            Some(raw) => raw.parse::<ExhaustionPolicy>().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "ignoring {}", ON_EXHAUSTED_VAR);
                ExhaustionPolicy::default()
            }),
            None => ExhaustionPolicy::default(),
        };

        let seed = lookup(SEED_VAR).and_then(|v| v.trim().parse::<u64>().ok());

        Config {
            data_dir,
            on_exhausted,
            seed,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("idea-roulette"))
        .unwrap_or_else(|| PathBuf::from("data"))
}
