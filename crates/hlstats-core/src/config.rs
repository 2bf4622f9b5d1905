//! Configuration types and runtime feature flags.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

/// Top-level configuration for hlstats.
///
/// ```toml
/// [experiments]
/// unresolved-resource-stats-enabled = true
/// workspace-resources-enabled = false
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Experiment overrides, keyed by [`Experiment::key`].
    #[serde(default)]
    pub experiments: BTreeMap<String, bool>,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Value configured for `experiment`, if any.
    #[must_use]
    pub fn experiment(&self, experiment: Experiment) -> Option<bool> {
        self.experiments.get(experiment.key()).copied()
    }
}

const EXPERIMENT_COUNT: usize = 4;

/// Boolean experiments gating optional behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Experiment {
    /// Whether the highlight visitor forwards diagnostics at all.
    HighlightVisitor,
    /// Whether unresolved `R.<type>.<name>` references are collected.
    UnresolvedResourceStats,
    /// Whether the workspace module gets lazily created R classes.
    WorkspaceResources,
    /// Whether every prefix of a resource package becomes a light package.
    CreateStubResourcePackages,
}

impl Experiment {
    /// All experiments, in declaration order.
    pub const ALL: [Self; EXPERIMENT_COUNT] = [
        Self::HighlightVisitor,
        Self::UnresolvedResourceStats,
        Self::WorkspaceResources,
        Self::CreateStubResourcePackages,
    ];

    /// Configuration key of this experiment.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::HighlightVisitor => "highlight-visitor-enabled",
            Self::UnresolvedResourceStats => "unresolved-resource-stats-enabled",
            Self::WorkspaceResources => "workspace-resources-enabled",
            Self::CreateStubResourcePackages => "create-stub-resource-packages",
        }
    }

    /// Looks an experiment up by its configuration key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.key() == key)
    }

    /// Value used when nothing overrides the experiment.
    #[must_use]
    pub fn default_value(self) -> bool {
        true
    }

    fn index(self) -> usize {
        match self {
            Self::HighlightVisitor => 0,
            Self::UnresolvedResourceStats => 1,
            Self::WorkspaceResources => 2,
            Self::CreateStubResourcePackages => 3,
        }
    }
}

impl std::fmt::Display for Experiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Live experiment values, read every time a gate is evaluated.
#[derive(Debug)]
pub struct FeatureFlags {
    values: [AtomicBool; EXPERIMENT_COUNT],
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            values: Experiment::ALL.map(|e| AtomicBool::new(e.default_value())),
        }
    }
}

impl FeatureFlags {
    /// Creates flags with every experiment at its default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates flags from the `[experiments]` table of `config`.
    ///
    /// Unknown keys are ignored with a warning.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let flags = Self::new();
        flags.apply(config);
        flags
    }

    /// Overwrites the experiments configured in `config`.
    pub fn apply(&self, config: &Config) {
        for (key, &value) in &config.experiments {
            match Experiment::from_key(key) {
                Some(experiment) => self.set(experiment, value),
                None => warn!("Unknown experiment in config: {}", key),
            }
        }
    }

    /// Current value of `experiment`.
    #[must_use]
    pub fn is_enabled(&self, experiment: Experiment) -> bool {
        self.values[experiment.index()].load(Ordering::Acquire)
    }

    /// Flips `experiment` at runtime.
    pub fn set(&self, experiment: Experiment, enabled: bool) {
        self.values[experiment.index()].store(enabled, Ordering::Release);
    }

    /// Current values of all experiments.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(Experiment, bool)> {
        Experiment::ALL
            .into_iter()
            .map(|e| (e, self.is_enabled(e)))
            .collect()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_flags() {
        let flags = FeatureFlags::new();
        for experiment in Experiment::ALL {
            assert!(flags.is_enabled(experiment), "{experiment} should default on");
        }
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[experiments]
workspace-resources-enabled = false
create-stub-resource-packages = true
"#;

        let config = Config::parse(toml).expect("Failed to parse");
        assert_eq!(config.experiment(Experiment::WorkspaceResources), Some(false));
        assert_eq!(config.experiment(Experiment::HighlightVisitor), None);

        let flags = FeatureFlags::from_config(&config);
        assert!(!flags.is_enabled(Experiment::WorkspaceResources));
        assert!(flags.is_enabled(Experiment::CreateStubResourcePackages));
        assert!(flags.is_enabled(Experiment::UnresolvedResourceStats));
    }

    #[test]
    fn test_unknown_experiment_is_ignored() {
        let config = Config::parse("[experiments]\nno-such-flag = false\n").unwrap();
        let flags = FeatureFlags::from_config(&config);
        assert!(flags.snapshot().iter().all(|(_, on)| *on));
    }

    #[test]
    fn test_invalid_config() {
        let err = Config::parse("[experiments]\nworkspace-resources-enabled = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[experiments]\nhighlight-visitor-enabled = false").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.experiment(Experiment::HighlightVisitor), Some(false));

        let missing = Config::from_file(std::path::Path::new("/nonexistent/hlstats.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_runtime_toggle() {
        let flags = FeatureFlags::new();
        flags.set(Experiment::UnresolvedResourceStats, false);
        assert!(!flags.is_enabled(Experiment::UnresolvedResourceStats));
        flags.set(Experiment::UnresolvedResourceStats, true);
        assert!(flags.is_enabled(Experiment::UnresolvedResourceStats));
    }

    #[test]
    fn test_experiment_keys_round_trip() {
        for experiment in Experiment::ALL {
            assert_eq!(Experiment::from_key(experiment.key()), Some(experiment));
        }
    }
}
