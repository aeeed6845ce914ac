use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::engine::session::RewardPolicy;
use crate::engine::width::WidthPolicy;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_lines_per_block")]
    pub lines_per_block: usize,
    #[serde(default = "default_min_columns")]
    pub min_columns: usize,
    #[serde(default = "default_max_columns")]
    pub max_columns: usize,
    #[serde(default = "default_column_margin")]
    pub column_margin: usize,
    #[serde(default = "default_coins_per_line")]
    pub coins_per_line: u32,
    #[serde(default = "default_coins_per_penalty")]
    pub coins_per_penalty: u32,
    #[serde(default = "default_penalty_threshold")]
    pub penalty_threshold: u32,
}

fn default_theme() -> String {
    "catppuccin-mocha".to_string()
}
fn default_lines_per_block() -> usize {
    3
}
fn default_min_columns() -> usize {
    20
}
fn default_max_columns() -> usize {
    80
}
fn default_column_margin() -> usize {
    2
}
fn default_coins_per_line() -> u32 {
    1
}
fn default_coins_per_penalty() -> u32 {
    1
}
fn default_penalty_threshold() -> u32 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            lines_per_block: default_lines_per_block(),
            min_columns: default_min_columns(),
            max_columns: default_max_columns(),
            column_margin: default_column_margin(),
            coins_per_line: default_coins_per_line(),
            coins_per_penalty: default_coins_per_penalty(),
            penalty_threshold: default_penalty_threshold(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.normalize();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("copytype")
            .join("config.toml")
    }

    /// Clamp hand-edited values into ranges the engine can work with.
    /// Call after deserialization.
    pub fn normalize(&mut self) {
        self.lines_per_block = self.lines_per_block.clamp(1, 10);
        self.min_columns = self.min_columns.clamp(10, 120);
        self.max_columns = self.max_columns.clamp(self.min_columns, 200);
        self.column_margin = self.column_margin.min(10);
        self.penalty_threshold = self.penalty_threshold.max(1);
    }

    pub fn width_policy(&self) -> WidthPolicy {
        WidthPolicy {
            margin: self.column_margin,
            min_columns: self.min_columns,
            max_columns: self.max_columns,
        }
    }

    pub fn reward_policy(&self) -> RewardPolicy {
        RewardPolicy {
            coins_per_line: self.coins_per_line,
            coins_per_penalty: self.coins_per_penalty,
            penalty_threshold: self.penalty_threshold,
        }
    }
}
