use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::{NonfsError, NonfsResult};

use super::resources::EmbeddedResources;
use super::traits::{FileMetadata, InternalStorage, Pal, ResourceStore};

/* 📖 # Why use std::fs instead of async or other crates?

All nonfs operations are synchronous and blocking; callers wrap them in threads or async
tasks as they see fit. std::fs is:
- Sufficient for synchronous file operations
- Requires no external dependencies beyond what we already use
- Well-tested and reliable
*/

/// A storage root together with its availability flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRoot {
    pub path: PathBuf,
    pub available: bool,
}

impl StorageRoot {
    pub fn new(path: impl Into<PathBuf>, available: bool) -> Self {
        Self {
            path: path.into(),
            available,
        }
    }
}

/// Concrete PAL implementation using the real filesystem via std::fs.
///
/// The roots are supplied at construction by a platform profile; RealPal itself knows
/// nothing about which platform it runs on.
#[derive(Debug)]
pub struct RealPal {
    external: StorageRoot,
    local: StorageRoot,
    internal: InternalStorage,
    resources: Arc<dyn ResourceStore>,
    temp_dir: PathBuf,
}

impl RealPal {
    /// Create a new RealPal.
    ///
    /// # Arguments
    /// * `external` - Root and availability of external storage
    /// * `local` - Root and availability of local storage
    /// * `internal` - Bundle directory or asset store for Internal files
    pub fn new(external: StorageRoot, local: StorageRoot, internal: InternalStorage) -> Self {
        Self {
            external,
            local,
            internal,
            resources: Arc::new(EmbeddedResources::new()),
            temp_dir: std::env::temp_dir(),
        }
    }

    /// Use the given store for packaged (classpath) resources.
    pub fn with_resources(mut self, resources: Arc<dyn ResourceStore>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> Box<NonfsError> + '_ {
    move |e| {
        debug!(path = %path.display(), error = %e, "filesystem primitive failed");
        Box::new(NonfsError::io(path, e))
    }
}

impl Pal for RealPal {
    fn external_storage_path(&self) -> &Path {
        &self.external.path
    }

    fn is_external_storage_available(&self) -> bool {
        self.external.available
    }

    fn local_storage_path(&self) -> &Path {
        &self.local.path
    }

    fn is_local_storage_available(&self) -> bool {
        self.local.available
    }

    fn internal_storage(&self) -> &InternalStorage {
        &self.internal
    }

    fn resources(&self) -> &dyn ResourceStore {
        &*self.resources
    }

    fn temp_directory(&self) -> &Path {
        &self.temp_dir
    }

    fn metadata(&self, path: &Path) -> Option<FileMetadata> {
        let meta = fs::metadata(path).ok()?;
        Some(FileMetadata {
            is_dir: meta.is_dir(),
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    fn open_read(&self, path: &Path) -> NonfsResult<Box<dyn Read + Send>> {
        let file = fs::File::open(path).map_err(io_error(path))?;
        debug!("file opened for reading");
        Ok(Box::new(file))
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    fn open_write(&self, path: &Path, append: bool) -> NonfsResult<Box<dyn Write + Send>> {
        let file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .append(append)
            .truncate(!append)
            .open(path)
            .map_err(io_error(path))?;
        debug!("file opened for writing");
        Ok(Box::new(file))
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    fn read_dir(&self, path: &Path) -> NonfsResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(path).map_err(io_error(path))? {
            let entry = entry.map_err(io_error(path))?;
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(name) => warn!(?name, "skipping entry with non UTF-8 name"),
            }
        }
        names.sort();
        debug!(count = names.len(), "directory listed");
        Ok(names)
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    fn create_dir(&self, path: &Path) -> NonfsResult<()> {
        fs::create_dir(path).map_err(io_error(path))
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    fn create_dir_all(&self, path: &Path) -> NonfsResult<()> {
        fs::create_dir_all(path).map_err(io_error(path))
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    fn remove_file(&self, path: &Path) -> NonfsResult<()> {
        fs::remove_file(path).map_err(io_error(path))
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    fn remove_dir(&self, path: &Path) -> NonfsResult<()> {
        fs::remove_dir(path).map_err(io_error(path))
    }

    #[instrument(skip(self))]
    fn create_temp_file(&self, prefix: &str) -> NonfsResult<PathBuf> {
        // A name collision only happens if another file took the same random suffix.
        let mut last_error = None;
        for _ in 0..8 {
            let path = self
                .temp_dir
                .join(format!("{}{}.tmp", prefix, nanoid::nanoid!(12)));
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(_) => {
                    debug!(path = %path.display(), "created temp file");
                    return Ok(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => last_error = Some(e),
                Err(e) => return Err(Box::new(NonfsError::io(path, e))),
            }
        }
        Err(Box::new(NonfsError::io(
            self.temp_dir.clone(),
            last_error.unwrap_or_else(|| std::io::Error::other("no unique temp file name")),
        )))
    }
}
