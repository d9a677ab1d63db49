use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub chain: ChainParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub db_file: String,
}

/// Parameters a chain is created and extended with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainParams {
    pub difficulty: u32, // leading zero bits
    pub coinbase_reward: u64,
    pub genesis_data: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                data_dir: Self::home_dir().join(".utxo-ledger"),
                db_file: "chain.db".to_string(),
            },
            chain: ChainParams::default(),
        }
    }
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            difficulty: 12,
            coinbase_reward: 100,
            genesis_data: "First Transaction from Genesis".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file)
    }
}

impl Config {
    /// Loads the config from the default location, writing the defaults there
    /// on first use.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    fn config_path() -> PathBuf {
        Self::home_dir().join(".utxo-ledger").join("config.json")
    }

    fn home_dir() -> PathBuf {
        PathBuf::from(env::var("HOME").unwrap_or_else(|_| ".".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_writes_defaults_on_first_use() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");

        let config = Config::load_from(&path).unwrap();

        assert!(path.exists());
        assert_eq!(config.chain, ChainParams::default());
        assert_eq!(config.storage.db_file, "chain.db");
    }

    #[test]
    fn test_saved_config_is_loaded_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");

        let mut config = Config::default();
        config.chain.difficulty = 4;
        config.storage.data_dir = temp_dir.path().to_path_buf();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.chain.difficulty, 4);
        assert_eq!(loaded.storage.db_path(), temp_dir.path().join("chain.db"));
    }
}
