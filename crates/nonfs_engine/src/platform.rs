/* 📖 # What does a platform profile decide?

Only where the storage roots are. Every profile produces a RealPal; the handle layer
never asks which platform it is running on.

- desktop: External is the home directory, Local the current directory, Internal files
  live in a bundle directory next to the application.
- android: External is the shared storage mount, Internal files come from an asset store
  and have no filesystem presence.
- ios: everything lives inside the application sandbox; the Documents and Library/local
  directories are created on startup.
*/

use std::path::{Path, PathBuf};
use std::sync::Arc;

use nonfs_base::{
    DirectoryResources, EmbeddedResources, InternalStorage, NonfsError, NonfsResult, Pal,
    RealPal, ResourceStore, ResultExt, StorageRoot,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::Config;

const ANDROID_EXTERNAL_ROOT: &str = "/sdcard";
const ANDROID_ASSET_ROOT: &str = "assets";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Desktop,
    Android,
    Ios,
}

/// Facts about the host process that the profiles derive their defaults from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEnvironment {
    pub home_dir: Option<PathBuf>,
    pub current_dir: PathBuf,
    pub executable_dir: Option<PathBuf>,
}

impl HostEnvironment {
    /// Inspect the running process.
    pub fn detect() -> NonfsResult<Self> {
        let current_dir = std::env::current_dir()
            .map_err(|e| Box::new(NonfsError::io(".", e).context("Unable to determine the current directory")))?;
        let home_dir = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .filter(|home| !home.is_empty())
            .map(PathBuf::from);
        let executable_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        Ok(Self {
            home_dir,
            current_dir,
            executable_dir,
        })
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        self.current_dir.join(path)
    }

    fn home_or_current(&self) -> PathBuf {
        self.home_dir.clone().unwrap_or_else(|| self.current_dir.clone())
    }
}

/// Build the PAL for the platform named in `config`.
pub fn build_pal(config: &Config, env: &HostEnvironment) -> NonfsResult<RealPal> {
    let pal = match config.platform {
        Platform::Desktop => desktop(config, env),
        Platform::Android => android(config, env),
        Platform::Ios => ios(config, env)?,
    };
    let temp_dir = config
        .temp_dir
        .as_deref()
        .map_or_else(std::env::temp_dir, |dir| env.absolute(dir));
    let pal = pal.with_temp_dir(temp_dir);
    info!(
        platform = ?config.platform,
        external = %pal.external_storage_path().display(),
        local = %pal.local_storage_path().display(),
        "storage roots configured"
    );
    Ok(pal)
}

fn override_or(env: &HostEnvironment, path: &Option<PathBuf>, default: impl FnOnce() -> PathBuf) -> PathBuf {
    path.as_deref().map_or_else(default, |path| env.absolute(path))
}

fn packaged_resources(config: &Config, env: &HostEnvironment) -> Arc<dyn ResourceStore> {
    match &config.resource_root {
        Some(root) => Arc::new(DirectoryResources::new(env.absolute(root))),
        None => Arc::new(EmbeddedResources::new()),
    }
}

fn desktop(config: &Config, env: &HostEnvironment) -> RealPal {
    let external = override_or(env, &config.external_root, || env.home_or_current());
    let local = override_or(env, &config.local_root, || env.current_dir.clone());
    let bundle = override_or(env, &config.bundle_root, || env.current_dir.clone());
    RealPal::new(
        StorageRoot::new(external, true),
        StorageRoot::new(local, true),
        InternalStorage::Directory(bundle),
    )
    .with_resources(packaged_resources(config, env))
}

fn android(config: &Config, env: &HostEnvironment) -> RealPal {
    let external = override_or(env, &config.external_root, || PathBuf::from(ANDROID_EXTERNAL_ROOT));
    let available = config.external_available.unwrap_or_else(|| external.is_dir());
    let local = override_or(env, &config.local_root, || external.clone());
    let assets = override_or(env, &config.asset_root, || env.absolute(Path::new(ANDROID_ASSET_ROOT)));
    debug!(assets = %assets.display(), available, "android storage");
    RealPal::new(
        StorageRoot::new(external, available),
        StorageRoot::new(local, true),
        InternalStorage::Assets(Arc::new(DirectoryResources::new(assets))),
    )
    .with_resources(packaged_resources(config, env))
}

fn ios(config: &Config, env: &HostEnvironment) -> NonfsResult<RealPal> {
    let app_dir = env.home_or_current();
    let external = override_or(env, &config.external_root, || app_dir.join("Documents"));
    let local = override_or(env, &config.local_root, || app_dir.join("Library").join("local"));
    let bundle = override_or(env, &config.bundle_root, || {
        env.executable_dir.clone().unwrap_or_else(|| env.current_dir.clone())
    });
    let pal = RealPal::new(
        StorageRoot::new(external, true),
        StorageRoot::new(local, true),
        InternalStorage::Directory(bundle),
    )
    .with_resources(packaged_resources(config, env));
    for root in [pal.external_storage_path(), pal.local_storage_path()] {
        pal.create_dir_all(root)
            .with_context(|| format!("Unable to create storage root {}", root.display()))?;
    }
    Ok(pal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn host(temp_dir: &TempDir) -> HostEnvironment {
        HostEnvironment {
            home_dir: Some(temp_dir.path().join("home")),
            current_dir: temp_dir.path().join("cwd"),
            executable_dir: Some(temp_dir.path().join("bin")),
        }
    }

    fn internal_dir(pal: &RealPal) -> Option<&Path> {
        match pal.internal_storage() {
            InternalStorage::Directory(dir) => Some(dir),
            InternalStorage::Assets(_) => None,
        }
    }

    #[test]
    fn test_desktop_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let env = host(&temp_dir);
        let pal = build_pal(&Config::default(), &env).unwrap();
        assert_eq!(pal.external_storage_path(), temp_dir.path().join("home"));
        assert_eq!(pal.local_storage_path(), env.current_dir);
        assert_eq!(internal_dir(&pal), Some(env.current_dir.as_path()));
        assert!(pal.is_external_storage_available());
    }

    #[test]
    fn test_desktop_without_home_uses_current_dir() {
        let temp_dir = TempDir::new().unwrap();
        let env = HostEnvironment {
            home_dir: None,
            ..host(&temp_dir)
        };
        let pal = build_pal(&Config::default(), &env).unwrap();
        assert_eq!(pal.external_storage_path(), env.current_dir);
    }

    #[test]
    fn test_relative_overrides_resolve_against_current_dir() {
        let temp_dir = TempDir::new().unwrap();
        let env = host(&temp_dir);
        let config = Config {
            local_root: Some(PathBuf::from("saves")),
            external_root: Some(PathBuf::from("/elsewhere")),
            temp_dir: Some(PathBuf::from("scratch")),
            ..Config::default()
        };
        let pal = build_pal(&config, &env).unwrap();
        assert_eq!(pal.local_storage_path(), env.current_dir.join("saves"));
        assert_eq!(pal.external_storage_path(), Path::new("/elsewhere"));
        assert_eq!(pal.temp_directory(), env.current_dir.join("scratch"));
    }

    #[test]
    fn test_android_profile() {
        let temp_dir = TempDir::new().unwrap();
        let env = host(&temp_dir);
        let config = Config {
            platform: Platform::Android,
            external_root: Some(temp_dir.path().join("missing-sdcard")),
            ..Config::default()
        };
        let pal = build_pal(&config, &env).unwrap();
        assert!(!pal.is_external_storage_available());
        assert_eq!(pal.local_storage_path(), temp_dir.path().join("missing-sdcard"));
        assert!(internal_dir(&pal).is_none());

        let config = Config {
            external_available: Some(true),
            ..config
        };
        assert!(build_pal(&config, &env).unwrap().is_external_storage_available());
    }

    #[test]
    fn test_ios_profile_creates_sandbox_roots() {
        let temp_dir = TempDir::new().unwrap();
        let env = host(&temp_dir);
        let config = Config {
            platform: Platform::Ios,
            ..Config::default()
        };
        let pal = build_pal(&config, &env).unwrap();
        let home = temp_dir.path().join("home");
        assert_eq!(pal.external_storage_path(), home.join("Documents"));
        assert_eq!(pal.local_storage_path(), home.join("Library/local"));
        assert!(home.join("Documents").is_dir());
        assert!(home.join("Library/local").is_dir());
        assert_eq!(internal_dir(&pal), Some(temp_dir.path().join("bin").as_path()));
    }

    #[test]
    fn test_resource_root_serves_packaged_resources() {
        let temp_dir = TempDir::new().unwrap();
        let env = host(&temp_dir);
        std::fs::create_dir_all(temp_dir.path().join("res")).unwrap();
        std::fs::write(temp_dir.path().join("res/logo.txt"), "logo").unwrap();
        let config = Config {
            resource_root: Some(temp_dir.path().join("res")),
            ..Config::default()
        };
        let pal = build_pal(&config, &env).unwrap();
        assert!(pal.resources().exists(relative_path::RelativePath::new("logo.txt")));
    }
}
