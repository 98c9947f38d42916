use std::path::{Path, PathBuf};

use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// CLI configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DotationConfig {
    /// Directory holding products.json, services.json, dotations.json and dotations_order.json
    pub catalog_dir: PathBuf,
    /// SQLite file with workflow state and the consumption log
    pub database_path: PathBuf,
    /// Default tracing filter, overridden by RUST_LOG
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Default for DotationConfig {
    fn default() -> Self {
        Self {
            catalog_dir: PathBuf::from("."),
            database_path: PathBuf::from("dotation.db"),
            log_level: "warn".to_string(),
            log_json: false,
        }
    }
}

impl DotationConfig {
    /// Load configuration with precedence:
    /// 1. Default values
    /// 2. `dotation.toml` (or the file given explicitly)
    /// 3. Environment variables prefixed with `DOTATION_`
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let defaults = DotationConfig::default();
        let mut builder = Config::builder()
            .set_default("catalog_dir", defaults.catalog_dir.display().to_string())?
            .set_default("database_path", defaults.database_path.display().to_string())?
            .set_default("log_level", defaults.log_level)?
            .set_default("log_json", defaults.log_json)?;

        match file {
            Some(path) => {
                builder = builder.add_source(File::from(path));
            }
            None if Path::new("dotation.toml").exists() => {
                builder = builder.add_source(File::with_name("dotation"));
            }
            None => {}
        }

        builder = builder.add_source(Environment::with_prefix("DOTATION").try_parsing(true));

        Ok(builder.build()?.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "catalog_dir = \"/srv/catalog\"\nlog_json = true\n").unwrap();

        let config = DotationConfig::load(Some(&path)).unwrap();
        assert_eq!(config.catalog_dir, PathBuf::from("/srv/catalog"));
        assert!(config.log_json);
        assert_eq!(config.database_path, PathBuf::from("dotation.db"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(DotationConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
