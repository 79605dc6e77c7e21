//! PC-005: Chef configuration — statement delimiter, threshold policy, nesting limit.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// When a `sort` statement gets an implied threshold seasoning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdPolicy {
    /// Only when `-l` or `-u` was supplied.
    #[default]
    Explicit,
    /// On every sort, bounds taken from defaults when absent.
    Always,
}

/// Interpreter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChefConfig {
    /// Statement separator
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Implied-threshold rule for sort
    #[serde(default)]
    pub threshold: ThresholdPolicy,

    /// Maximum nesting of `recipe` statements
    #[serde(default = "default_max_recipe_depth")]
    pub max_recipe_depth: usize,
}

impl Default for ChefConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            threshold: ThresholdPolicy::default(),
            max_recipe_depth: default_max_recipe_depth(),
        }
    }
}

fn default_delimiter() -> char {
    ';'
}

fn default_max_recipe_depth() -> usize {
    16
}

/// Parse a config from YAML.
pub fn parse_config(yaml: &str) -> Result<ChefConfig, String> {
    let config: ChefConfig =
        serde_yaml_ng::from_str(yaml).map_err(|e| format!("config parse error: {}", e))?;
    if config.delimiter.is_whitespace() && config.delimiter != '\n' {
        return Err(format!(
            "delimiter {:?} would be swallowed by tokenizing",
            config.delimiter
        ));
    }
    Ok(config)
}

/// Load a config file, or defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<ChefConfig, String> {
    let Some(path) = path else {
        return Ok(ChefConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read config {}: {}", path.display(), e))?;
    parse_config(&content)
}
