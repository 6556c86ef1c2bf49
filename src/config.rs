use std::env;

use thiserror::Error;

use crate::depth::DEFAULT_MAX_DEPTH;

/// Configuration-related errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid value for environment variable
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings of the query pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Deepest accepted field nesting; root fields are depth 0.
    pub max_depth: usize,
    /// Leave `__` introspection fields out of the depth count.
    pub ignore_introspection: bool,
    /// Run the selection-aware prefetch on the `users` list.
    pub prefetch: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH, ignore_introspection: true, prefetch: true }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults for unset ones.
    ///
    /// - `GRAPHQL_MAX_DEPTH`
    /// - `GRAPHQL_IGNORE_INTROSPECTION`
    /// - `GRAPHQL_PREFETCH`
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            max_depth: parse_var(&lookup, "GRAPHQL_MAX_DEPTH", defaults.max_depth, |v| {
                v.parse().ok()
            })?,
            ignore_introspection: parse_var(
                &lookup,
                "GRAPHQL_IGNORE_INTROSPECTION",
                defaults.ignore_introspection,
                parse_bool,
            )?,
            prefetch: parse_var(&lookup, "GRAPHQL_PREFETCH", defaults.prefetch, parse_bool)?,
        })
    }
}

fn parse_var<F, T, P>(lookup: &F, name: &str, default: T, parse: P) -> ConfigResult<T>
where
    F: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Option<T>,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => {
            parse(raw.trim()).ok_or_else(|| ConfigError::InvalidValue(name.to_string(), raw))
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
