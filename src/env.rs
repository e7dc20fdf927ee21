//! Environment variable abstraction for testability.
//!
//! Production code uses [`Env::real()`] which delegates to [`std::env::var`].
//! Tests use [`Env::mock()`] backed by a `HashMap`, avoiding `unsafe`
//! [`std::env::set_var`] calls in parallel test runs.

use std::collections::HashMap;

/// Environment variable reader.
#[derive(Clone, Debug)]
pub struct Env {
    overrides: Option<HashMap<String, String>>,
}

impl Env {
    /// Create an `Env` that reads from the real process environment.
    pub fn real() -> Self {
        Self { overrides: None }
    }

    /// Create an `Env` backed by explicit key-value pairs.
    pub fn mock(vars: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        Self {
            overrides: Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
        }
    }

    /// Look up an environment variable by name.
    pub fn var(&self, name: &str) -> Result<String, std::env::VarError> {
        match &self.overrides {
            Some(map) => map.get(name).cloned().ok_or(std::env::VarError::NotPresent),
            None => std::env::var(name),
        }
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::real()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_env_returns_set_values() {
        let env = Env::mock([("CRITIQUE_BASE_URL", "http://test:1234/v1")]);
        assert_eq!(env.var("CRITIQUE_BASE_URL").unwrap(), "http://test:1234/v1");
    }

    #[test]
    fn mock_env_missing_is_not_present() {
        let env = Env::mock(Vec::<(&str, &str)>::new());
        assert!(env.var("CRITIQUE_BASE_URL").is_err());
    }

    #[test]
    fn real_env_reads_cargo_manifest_dir() {
        assert!(Env::real().var("CARGO_MANIFEST_DIR").is_ok());
    }
}
