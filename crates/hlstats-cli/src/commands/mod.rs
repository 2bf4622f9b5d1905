//! Subcommand implementations.

pub mod flags;
pub mod init;
pub mod output;
pub mod replay;
