use serde::Deserialize;
use std::path::PathBuf;

use crate::services::{
    neighbors::DEFAULT_NEIGHBOR_COUNT, recommendations::DEFAULT_RECOMMENDATION_LIMIT,
    RecommenderSettings, ResultOrder,
};

/// Log output style
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Directory holding the catalog, roster and like-log CSV files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Neighbors considered per recommendation (K)
    #[serde(default = "default_neighbor_count")]
    pub neighbor_count: usize,

    /// Items returned per recommendation (N)
    #[serde(default = "default_recommendation_limit")]
    pub recommendation_limit: usize,

    /// Order of collaborative results
    #[serde(default)]
    pub result_order: ResultOrder,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_neighbor_count() -> usize {
    DEFAULT_NEIGHBOR_COUNT
}

fn default_recommendation_limit() -> usize {
    DEFAULT_RECOMMENDATION_LIMIT
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.neighbor_count == 0 {
            anyhow::bail!("NEIGHBOR_COUNT must be at least 1");
        }
        if self.recommendation_limit == 0 {
            anyhow::bail!("RECOMMENDATION_LIMIT must be at least 1");
        }
        Ok(())
    }

    pub fn recommender_settings(&self) -> RecommenderSettings {
        RecommenderSettings {
            neighbor_count: self.neighbor_count,
            limit: self.recommendation_limit,
            order: self.result_order,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
