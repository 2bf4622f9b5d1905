//! Flags command implementation.

use hlstats::{Experiment, FeatureFlags};

use crate::config_resolver::ConfigSource;

/// Runs the flags command.
pub fn run(source: &ConfigSource, flags: &FeatureFlags) {
    println!("Experiments ({source}):\n");
    println!("{:<36} {:<8} Default", "Key", "Value");
    println!("{}", "-".repeat(56));

    for (experiment, enabled) in flags.snapshot() {
        println!(
            "{:<36} {:<8} {}",
            experiment.key(),
            enabled,
            experiment.default_value()
        );
    }

    let overridden = Experiment::ALL
        .into_iter()
        .filter(|e| flags.is_enabled(*e) != e.default_value())
        .count();
    println!("\n{overridden} experiment(s) overridden");
}
