//! Where SnapVault keeps its files
//!
//! Everything lives under one base directory: `config.json`, `audit.log`,
//! `data/` (one JSON file per tracked collection) and `store/` (the
//! snapshot and version indexes). The base directory is
//! `$SNAPVAULT_DATA_DIR` when set, otherwise `snapvault` under
//! `$XDG_CONFIG_HOME`, falling back to `$HOME/.config`.

use std::path::PathBuf;

use crate::error::VaultError;

/// Environment variable overriding the base directory
pub const DATA_DIR_ENV: &str = "SNAPVAULT_DATA_DIR";

/// Manages all paths used by SnapVault
#[derive(Debug, Clone)]
pub struct VaultPaths {
    base_dir: PathBuf,
}

impl VaultPaths {
    /// Resolve the base directory from the process environment
    pub fn new() -> Result<Self, VaultError> {
        let base_dir = default_base_dir(|key| std::env::var(key).ok())?;
        Ok(Self { base_dir })
    }

    /// Create VaultPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.config/snapvault/ or equivalent)
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory holding one JSON file per tracked collection
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the directory backing the persistence port
    pub fn store_dir(&self) -> PathBuf {
        self.base_dir.join("store")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the failure audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Get the path of a tracked collection file (e.g. `data/students.json`)
    pub fn collection_file(&self, collection: &str) -> PathBuf {
        self.data_dir().join(format!("{}.json", collection))
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<(), VaultError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| VaultError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| VaultError::Io(format!("Failed to create data directory: {}", e)))?;

        std::fs::create_dir_all(self.store_dir())
            .map_err(|e| VaultError::Io(format!("Failed to create store directory: {}", e)))?;

        Ok(())
    }
}

/// Base directory from environment lookups, in override order
fn default_base_dir(lookup: impl Fn(&str) -> Option<String>) -> Result<PathBuf, VaultError> {
    if let Some(custom) = lookup(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(custom));
    }
    let config_home = match lookup("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => lookup("HOME")
            .map(|home| PathBuf::from(home).join(".config"))
            .ok_or_else(|| VaultError::Config("HOME environment variable not set".into()))?,
    };
    Ok(config_home.join("snapvault"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_custom_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.base_dir(), temp_dir.path());
        assert_eq!(paths.data_dir(), temp_dir.path().join("data"));
        assert_eq!(paths.store_dir(), temp_dir.path().join("store"));
    }

    #[test]
    fn test_ensure_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());

        paths.ensure_directories().unwrap();

        assert!(paths.data_dir().exists());
        assert!(paths.store_dir().exists());
    }

    fn env<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_data_dir_override_wins() {
        let vars = [
            (DATA_DIR_ENV, "/srv/vault"),
            ("XDG_CONFIG_HOME", "/xdg"),
            ("HOME", "/home/ada"),
        ];
        assert_eq!(default_base_dir(env(&vars)).unwrap(), PathBuf::from("/srv/vault"));
    }

    #[test]
    fn test_xdg_then_home() {
        let xdg = [("XDG_CONFIG_HOME", "/xdg"), ("HOME", "/home/ada")];
        assert_eq!(default_base_dir(env(&xdg)).unwrap(), PathBuf::from("/xdg/snapvault"));

        let home = [("XDG_CONFIG_HOME", ""), ("HOME", "/home/ada")];
        assert_eq!(
            default_base_dir(env(&home)).unwrap(),
            PathBuf::from("/home/ada/.config/snapvault")
        );
    }

    #[test]
    fn test_no_home_is_config_error() {
        assert!(matches!(default_base_dir(env(&[])), Err(VaultError::Config(_))));
    }

    #[test]
    fn test_file_paths() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.settings_file(), temp_dir.path().join("config.json"));
        assert_eq!(
            paths.collection_file("students"),
            temp_dir.path().join("data").join("students.json")
        );
    }
}
