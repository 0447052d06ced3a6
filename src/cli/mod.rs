//! CLI argument parsing and command dispatch.

pub mod args;
pub mod env;
pub mod sleep;

pub use args::{Cli, Commands, OutputFormat};
