//! Configuration file resolution.
//!
//! Resolves the configuration file path in priority order:
//!
//! 1. `--config` flag or `HLSTATS_CONFIG` (explicit path)
//! 2. `{dir}/hlstats.toml` or `{dir}/.hlstats.toml`
//! 3. No config found → defaults

use std::path::{Path, PathBuf};

/// Where the configuration was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly specified via `--config`.
    Explicit(PathBuf),
    /// Found in the working directory.
    Project(PathBuf),
    /// No config found; defaults will be used.
    Default,
}

impl ConfigSource {
    /// Returns the resolved path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Project(p) => Some(p),
            Self::Default => None,
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Explicit(p) | Self::Project(p) => write!(f, "{}", p.display()),
            Self::Default => write!(f, "defaults"),
        }
    }
}

/// Config file names looked up in the working directory, in order.
pub const PROJECT_CONFIG_NAMES: &[&str] = &["hlstats.toml", ".hlstats.toml"];

/// Resolves the configuration file path.
///
/// An explicit path is returned as-is; loading reports it if missing.
#[must_use]
pub fn resolve(dir: &Path, explicit: Option<&Path>) -> ConfigSource {
    if let Some(p) = explicit {
        return ConfigSource::Explicit(p.to_path_buf());
    }

    for name in PROJECT_CONFIG_NAMES {
        let candidate = dir.join(name);
        if candidate.exists() {
            tracing::debug!("Found project config: {}", candidate.display());
            return ConfigSource::Project(candidate);
        }
    }

    ConfigSource::Default
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn explicit_takes_priority_over_project() {
        let tmp = TempDir::new().unwrap();
        let explicit = tmp.path().join("custom.toml");
        fs::write(&explicit, "").unwrap();
        fs::write(tmp.path().join("hlstats.toml"), "").unwrap();

        let result = resolve(tmp.path(), Some(&explicit));
        assert_eq!(result, ConfigSource::Explicit(explicit));
    }

    #[test]
    fn explicit_does_not_check_existence() {
        let result = resolve(Path::new("/tmp"), Some(Path::new("/nonexistent.toml")));
        assert_eq!(
            result,
            ConfigSource::Explicit(PathBuf::from("/nonexistent.toml"))
        );
    }

    #[test]
    fn project_config_found() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".hlstats.toml"), "").unwrap();

        let result = resolve(tmp.path(), None);
        assert_eq!(
            result,
            ConfigSource::Project(tmp.path().join(".hlstats.toml"))
        );
    }

    #[test]
    fn plain_name_preferred_over_dot_prefix() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("hlstats.toml"), "").unwrap();
        fs::write(tmp.path().join(".hlstats.toml"), "").unwrap();

        let result = resolve(tmp.path(), None);
        assert_eq!(result, ConfigSource::Project(tmp.path().join("hlstats.toml")));
    }

    #[test]
    fn no_config_returns_default() {
        let tmp = TempDir::new().unwrap();
        let result = resolve(tmp.path(), None);
        assert_eq!(result, ConfigSource::Default);
        assert!(result.path().is_none());
        assert_eq!(result.to_string(), "defaults");
    }
}
