//! Utility functions.

pub mod env;

pub use env::{Environment, MapEnv, ProcessEnv};
