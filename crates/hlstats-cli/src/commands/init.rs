//! Init command implementation.

use anyhow::{bail, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# hlstats configuration

# Experiments default to true; uncomment to override.
[experiments]
# highlight-visitor-enabled = true
# unresolved-resource-stats-enabled = true
# workspace-resources-enabled = true
# create-stub-resource-packages = true
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    let config_path = Path::new("hlstats.toml");

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(config_path, DEFAULT_CONFIG)?;

    println!("Created hlstats.toml");
    println!("\nNext steps:");
    println!("  1. Edit hlstats.toml to override experiments");
    println!("  2. Run: hlstats flags");

    Ok(())
}
