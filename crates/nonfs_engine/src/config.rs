use std::path::{Path, PathBuf};

use nonfs_base::{NonfsError, NonfsResult, ResultExt, err};
use serde::Deserialize;

use crate::platform::Platform;

/// Storage configuration, usually read from `nonfs.toml`.
///
/// Every root is optional; the platform profile supplies defaults for the ones left out.
/// Relative paths are resolved against the current directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Which platform profile builds the storage roots.
    #[serde(default)]
    pub platform: Platform,
    /// Root of External files.
    pub external_root: Option<PathBuf>,
    /// Root of Local files.
    pub local_root: Option<PathBuf>,
    /// Directory holding Internal files on desktop and ios.
    pub bundle_root: Option<PathBuf>,
    /// Directory serving packaged (Classpath) resources.
    pub resource_root: Option<PathBuf>,
    /// Directory serving the android asset store.
    pub asset_root: Option<PathBuf>,
    pub temp_dir: Option<PathBuf>,
    /// Android only. Defaults to whether the external root exists.
    pub external_available: Option<bool>,
}

impl Config {
    pub fn from_toml_str(text: &str) -> NonfsResult<Self> {
        toml::from_str(text).map_err(|e| err!("Invalid configuration: {}", e))
    }
}

/// Load a configuration file.
pub fn load_config(path: &Path) -> NonfsResult<Config> {
    let text = std::fs::read_to_string(path).map_err(|e| Box::new(NonfsError::io(path, e)))?;
    Config::from_toml_str(&text).with_context(|| format!("Failed to load config from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;
    use tempfile::TempDir;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.platform, Platform::Desktop);
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_toml_str(
            r#"
            platform = "android"
            external_root = "/sdcard"
            local_root = "/data/local"
            asset_root = "assets"
            resource_root = "resources"
            temp_dir = "/tmp"
            external_available = false
            "#,
        )
        .unwrap();
        assert_eq!(config.platform, Platform::Android);
        assert_eq!(config.external_root, Some(PathBuf::from("/sdcard")));
        assert_eq!(config.asset_root, Some(PathBuf::from("assets")));
        assert_eq!(config.external_available, Some(false));
        assert_eq!(config.bundle_root, None);
    }

    #[test]
    fn test_unknown_platform_is_rejected() {
        let err = Config::from_toml_str(r#"platform = "amiga""#).unwrap_err();
        assert!(err.to_string().starts_with("Invalid configuration"), "{}", err);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(Config::from_toml_str("extrnal_root = \"/x\"").is_err());
    }

    #[test]
    fn test_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nonfs.toml");
        std::fs::write(&path, "platform = \"ios\"\nbundle_root = \"/app\"\n").unwrap();
        let config = load_config(&path).unwrap();
        expect![[r#"
            Config {
                platform: Ios,
                external_root: None,
                local_root: None,
                bundle_root: Some(
                    "/app",
                ),
                resource_root: None,
                asset_root: None,
                temp_dir: None,
                external_available: None,
            }
        "#]]
        .assert_eq(&format!("{:#?}\n", config));
    }

    #[test]
    fn test_load_missing_config() {
        let temp_dir = TempDir::new().unwrap();
        let err = load_config(&temp_dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err.kind(), nonfs_base::ErrorKind::IoFailure { .. }));
    }
}
