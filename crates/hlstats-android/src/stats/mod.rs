//! Unresolved resource reference statistics.

mod collector;
mod project;

pub use collector::UnresolvedResourceStatsCollector;
pub use project::ProjectUnresolvedResourceStats;
