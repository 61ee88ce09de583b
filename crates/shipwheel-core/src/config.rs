use std::collections::HashMap;
use std::env;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalOptions {
    pub quiet: bool,
    pub verbose: u8,
    pub trace: bool,
    pub json: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub(crate) fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    pub(crate) fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    #[cfg(test)]
    pub(crate) fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

#[derive(Debug)]
pub struct Config {
    pub(crate) dist: DistConfig,
}

#[derive(Debug)]
pub struct DistConfig {
    /// Directory name (relative to the project root) that receives built
    /// artifacts and gets removed by the clean step.
    pub dir: String,
}

impl Config {
    /// Builds a configuration snapshot from the current process environment.
    pub fn from_env() -> Self {
        Self::from_snapshot(&EnvSnapshot::capture())
    }

    pub(crate) fn from_snapshot(snapshot: &EnvSnapshot) -> Self {
        Self {
            dist: DistConfig {
                dir: match snapshot.var("SHIPWHEEL_DIST") {
                    Some(value) if !value.trim().is_empty() => value.to_string(),
                    _ => "dist".to_string(),
                },
            },
        }
    }

    #[must_use]
    pub fn dist(&self) -> &DistConfig {
        &self.dist
    }
}
