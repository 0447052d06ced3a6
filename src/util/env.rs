//! Environment access and terminal detection.

use std::collections::HashMap;
use std::io::IsTerminal;

/// Source of environment variables.
///
/// Fixtures read configuration through this trait so tests can substitute a
/// fixed map for the process environment.
pub trait Environment: Send + Sync {
    /// Value of `name`, or `None` if unset or not valid UTF-8.
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// A fixed set of variables.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.vars.insert(name.to_string(), value.to_string());
        self
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.vars.insert(name.to_string(), value.to_string());
    }

    pub fn remove(&mut self, name: &str) {
        self.vars.remove(name);
    }
}

impl Environment for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// Check if stderr is a TTY.
#[must_use]
pub fn stderr_is_tty() -> bool {
    std::io::stderr().is_terminal()
}

/// Check if color should be enabled for stderr output.
#[must_use]
pub fn should_use_color(env: &dyn Environment) -> bool {
    // Check NO_COLOR environment variable
    if env.var("NO_COLOR").is_some() {
        return false;
    }

    // Check TERM=dumb
    if env.var("TERM").is_some_and(|t| t == "dumb") {
        return false;
    }

    stderr_is_tty()
}
