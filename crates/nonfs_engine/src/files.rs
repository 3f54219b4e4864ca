use std::path::Path;

use nonfs_base::{FileType, NonfsResult, PalHandle, ResultExt};
use tracing::{debug, instrument};

use crate::config::Config;
use crate::handle::FileHandle;
use crate::platform::{HostEnvironment, build_pal};

/// Entry point for creating file handles on one platform.
///
/// # Examples
///
/// ```
/// use nonfs_base::{FileType, MockPal, PalHandle};
/// use nonfs_engine::Files;
///
/// let files = Files::new(PalHandle::new(MockPal::new()));
/// let save = files.local("saves/slot1.json");
/// save.write_string("{}", false).unwrap();
/// assert_eq!(files.get_file_handle("saves/slot1.json", FileType::Local), save);
/// assert_eq!(save.read_string().unwrap(), "{}");
/// ```
#[derive(Debug, Clone)]
pub struct Files {
    pal: PalHandle,
}

impl Files {
    pub fn new(pal: PalHandle) -> Self {
        Self { pal }
    }

    /// Build the platform profile named in `config` for the running process.
    pub fn from_config(config: &Config) -> NonfsResult<Self> {
        let env = HostEnvironment::detect()?;
        let pal = build_pal(config, &env)?;
        Ok(Self::new(PalHandle::new(pal)))
    }

    pub fn pal(&self) -> &PalHandle {
        &self.pal
    }

    pub fn get_file_handle(&self, path: &str, file_type: FileType) -> FileHandle {
        FileHandle::new(self.pal.clone(), path, file_type)
    }

    /// Shorthand for an Internal handle.
    pub fn get(&self, path: &str) -> FileHandle {
        self.internal(path)
    }

    pub fn classpath(&self, path: &str) -> FileHandle {
        self.get_file_handle(path, FileType::Classpath)
    }

    pub fn internal(&self, path: &str) -> FileHandle {
        self.get_file_handle(path, FileType::Internal)
    }

    pub fn external(&self, path: &str) -> FileHandle {
        self.get_file_handle(path, FileType::External)
    }

    pub fn absolute(&self, path: &str) -> FileHandle {
        self.get_file_handle(path, FileType::Absolute)
    }

    pub fn local(&self, path: &str) -> FileHandle {
        self.get_file_handle(path, FileType::Local)
    }

    pub fn external_storage_path(&self) -> &Path {
        self.pal.external_storage_path()
    }

    pub fn is_external_storage_available(&self) -> bool {
        self.pal.is_external_storage_available()
    }

    pub fn local_storage_path(&self) -> &Path {
        self.pal.local_storage_path()
    }

    pub fn is_local_storage_available(&self) -> bool {
        self.pal.is_local_storage_available()
    }

    /// Create a new empty file with a unique name in the temp directory.
    #[instrument(skip(self))]
    pub fn temp_file(&self, prefix: &str) -> NonfsResult<FileHandle> {
        let location = self
            .pal
            .create_temp_file(prefix)
            .with_context(|| format!("Unable to create temp file with prefix '{}'", prefix))?;
        debug!(location = %location.display(), "temp file created");
        Ok(self.absolute(&location.to_string_lossy()))
    }

    /// Create a new empty directory with a unique name in the temp directory.
    #[instrument(skip(self))]
    pub fn temp_directory(&self, prefix: &str) -> NonfsResult<FileHandle> {
        let location = self
            .pal
            .create_temp_file(prefix)
            .and_then(|location| self.pal.remove_file(&location).map(|()| location))
            .and_then(|location| self.pal.create_dir(&location).map(|()| location))
            .with_context(|| format!("Unable to create temp directory with prefix '{}'", prefix))?;
        debug!(location = %location.display(), "temp directory created");
        Ok(self.absolute(&location.to_string_lossy()))
    }
}
