use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PhyStatusConfig {
    /// Path to the status database
    pub database: Option<String>,
    /// Default tracing filter, e.g. "info" or "phystatus=debug"
    pub log_level: Option<String>,
}

impl PhyStatusConfig {
    /// Database path from the config, or the default under `base`
    pub fn database_path_in(&self, base: &Path) -> PathBuf {
        self.database
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| default_database_path_in(base))
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("phystatus.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".phystatus").join("phystatus.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<PhyStatusConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: PhyStatusConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &PhyStatusConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phystatus.toml");
        let config = PhyStatusConfig {
            database: Some("/var/run/ChannelTable.db".to_string()),
            log_level: Some("debug".to_string()),
        };

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();

        let loaded = load_config(Some(path.as_path())).unwrap().unwrap();
        assert_eq!(loaded.database.as_deref(), Some("/var/run/ChannelTable.db"));
        assert_eq!(loaded.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(dir.path().join("nope.toml").as_path())).unwrap().is_none());
    }

    #[test]
    fn test_default_database_path() {
        let config = PhyStatusConfig::default();
        let base = Path::new("/srv/bts");
        assert_eq!(config.database_path_in(base), PathBuf::from("/srv/bts/.phystatus/phystatus.db"));
    }

    #[test]
    fn test_ensure_db_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("a").join("b").join("status.db");
        ensure_db_dir(&db).unwrap();
        assert!(db.parent().unwrap().is_dir());
    }
}
