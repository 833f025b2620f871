use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Process-wide interpreter state.
///
/// Holds a snapshot of the environment variables, the working directory the
/// shell believes it is in, the identity used for prompt rendering, and the
/// flag the `exit` builtin raises to end the loop. Everything else the
/// interpreter touches is scoped to a single line of input.
#[derive(Debug, Clone)]
pub struct Environment {
    pub vars: HashMap<String, String>,
    pub current_dir: PathBuf,
    pub user: String,
    pub host: String,
    pub should_exit: bool,
}

impl Environment {
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            user: whoami::username(),
            host: whoami::fallible::hostname().unwrap_or_else(|_| String::from("localhost")),
            should_exit: false,
        }
    }

    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// The directory `cd` falls back to when given no target.
    pub fn home(&self) -> Option<PathBuf> {
        self.get_var("HOME").map(PathBuf::from)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_snapshots_process_env() {
        let env = Environment::new();
        assert!(!env.should_exit);
        // PATH exists in any reasonable test environment and must survive
        // the snapshot, since command resolution depends on it.
        assert!(env.get_var("PATH").is_some());
    }

    #[test]
    fn set_var_overrides_snapshot() {
        let mut env = Environment::new();
        env.set_var("PIPESH_TEST_VAR", "42");
        assert_eq!(env.get_var("PIPESH_TEST_VAR").as_deref(), Some("42"));
    }

    #[test]
    fn home_follows_home_var() {
        let mut env = Environment::new();
        env.set_var("HOME", "/tmp/somewhere");
        assert_eq!(env.home(), Some(PathBuf::from("/tmp/somewhere")));
    }
}
