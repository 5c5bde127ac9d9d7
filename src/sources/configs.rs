use crate::dialect::DialectSpec;
use crate::error::IngestError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "dialects.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DialectsConfig {
    pub dialects: Vec<DialectSpec>,
}

impl DialectsConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, IngestError> {
        let content = fs::read_to_string(path)
            .map_err(|e| IngestError::Config(format!("Failed to read {CONFIG_FILE}: {e}")))?;
        let config: DialectsConfig = serde_json::from_str(&content)
            .map_err(|e| IngestError::Config(format!("Failed to parse {CONFIG_FILE}: {e}")))?;
        Ok(config)
    }

    pub fn load_default() -> Result<Self, IngestError> {
        Self::load_from_file(default_config_path())
    }

    pub fn get(&self, name: &str) -> Option<&DialectSpec> {
        self.dialects
            .iter()
            .find(|spec| spec.name.eq_ignore_ascii_case(name))
    }
}

pub fn default_config_path() -> PathBuf {
    let dir = std::env::var("CONFIGS_PATH").unwrap_or_else(|_| "configs".to_string());
    Path::new(&dir).join(CONFIG_FILE)
}
