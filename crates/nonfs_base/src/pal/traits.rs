use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use relative_path::RelativePath;

use crate::NonfsResult;

/* 📖 # What is the Platform Abstraction Layer (PAL)?

The PAL is the per-platform backend that the rest of nonfs resolves logical paths against.
It provides two things:
- The physical roots: external storage, local storage and where Internal files live
  (a bundle directory or a non-filesystem asset store), plus the packaged resources
- The primitive I/O calls on physical paths (open, list, create, remove)

Everything above the PAL (resolution policy, handles, recursive algorithms) is written
once against this trait. Platform differences are data handed to the PAL, not subclasses.
*/

/// Metadata of a physical filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    pub is_dir: bool,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

/// Where Internal files live on a platform.
#[derive(Debug, Clone)]
pub enum InternalStorage {
    /// Read-only subtree of the filesystem, e.g. the application bundle.
    Directory(PathBuf),
    /// A packaged asset store that is not reachable through filesystem paths.
    Assets(Arc<dyn ResourceStore>),
}

/* 📖 # Why is ResourceStore a separate trait from Pal?

Packaged resources are addressed by a relative resource name, never by a physical path,
and the same lookup contract serves two roles: the classpath-style packaged resources every
platform has, and the asset store that replaces the bundle directory on some platforms.
*/

/// Read-only lookup of packaged resources by relative name.
pub trait ResourceStore: std::fmt::Debug + Send + Sync + 'static {
    /// Open a resource for reading.
    fn open(&self, path: &RelativePath) -> NonfsResult<Box<dyn Read + Send>>;

    /// List the names of the immediate children of a resource directory.
    ///
    /// Unknown paths and plain resources yield an empty list.
    fn list(&self, path: &RelativePath) -> NonfsResult<Vec<String>>;

    /// Size of a resource in bytes, if the store can tell without reading it.
    fn length(&self, path: &RelativePath) -> Option<u64>;

    /// Check whether a resource can be opened.
    fn exists(&self, path: &RelativePath) -> bool {
        self.open(path).is_ok()
    }
}

/// Platform Abstraction Layer trait: storage roots plus physical I/O primitives.
///
/// Two implementations are provided:
/// - `RealPal`: Uses the real filesystem via `std::fs`
/// - `MockPal`: In-memory implementation for testing
///
/// Implementations perform no locking across calls. Concurrent mutation of the same
/// subtree through two callers is unsynchronized and may race.
pub trait Pal: std::fmt::Debug + Send + Sync + 'static {
    /// Root directory for External files.
    fn external_storage_path(&self) -> &Path;

    /// Whether external storage is ready for I/O.
    fn is_external_storage_available(&self) -> bool;

    /// Root directory for Local files.
    fn local_storage_path(&self) -> &Path;

    /// Whether local storage is ready for I/O.
    fn is_local_storage_available(&self) -> bool;

    /// Where Internal files are looked up.
    fn internal_storage(&self) -> &InternalStorage;

    /// Packaged (classpath) resources.
    fn resources(&self) -> &dyn ResourceStore;

    /// Directory in which temp files are created.
    fn temp_directory(&self) -> &Path;

    /// Metadata of a physical path, `None` if it does not exist or cannot be inspected.
    fn metadata(&self, path: &Path) -> Option<FileMetadata>;

    /// Open a physical file for reading.
    fn open_read(&self, path: &Path) -> NonfsResult<Box<dyn Read + Send>>;

    /// Open a physical file for writing, truncating or appending. The parent must exist.
    fn open_write(&self, path: &Path, append: bool) -> NonfsResult<Box<dyn Write + Send>>;

    /// Names of the immediate children of a physical directory, sorted.
    fn read_dir(&self, path: &Path) -> NonfsResult<Vec<String>>;

    /// Create a single directory. The parent must exist.
    fn create_dir(&self, path: &Path) -> NonfsResult<()>;

    /// Create a directory and all missing parents. Succeeds if it already exists.
    fn create_dir_all(&self, path: &Path) -> NonfsResult<()>;

    /// Remove a file.
    fn remove_file(&self, path: &Path) -> NonfsResult<()>;

    /// Remove an empty directory.
    fn remove_dir(&self, path: &Path) -> NonfsResult<()>;

    /// Create a new, uniquely named empty file in the temp directory.
    fn create_temp_file(&self, prefix: &str) -> NonfsResult<PathBuf>;

    /// Check if a physical path exists.
    fn exists(&self, path: &Path) -> bool {
        self.metadata(path).is_some()
    }
}

/// Handle to a PAL implementation, enabling shared ownership.
///
/// Internally wraps `Arc<dyn Pal>` for cheap cloning and thread-safe sharing.
///
/// # Examples
///
/// ```
/// use nonfs_base::{MockPal, PalHandle};
///
/// let pal = PalHandle::new(MockPal::new());
/// let pal_clone = pal.clone(); // Cheap clone, shares the same implementation
/// assert!(pal_clone.is_local_storage_available());
/// ```
#[derive(Debug, Clone)]
pub struct PalHandle(Arc<dyn Pal>);

impl PalHandle {
    /// Create a new PalHandle from a Pal implementation.
    pub fn new(pal: impl Pal + 'static) -> Self {
        Self(Arc::new(pal))
    }
}

impl std::ops::Deref for PalHandle {
    type Target = dyn Pal;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pal::MockPal;

    #[test]
    fn test_pal_handle_clone_shares_state() {
        let mock = MockPal::new();
        let pal = PalHandle::new(mock.clone());
        let pal_clone = pal.clone();

        mock.add_file("/mock/local/a.txt", b"a".to_vec());
        assert!(pal.exists(Path::new("/mock/local/a.txt")));
        assert!(pal_clone.exists(Path::new("/mock/local/a.txt")));
    }

    #[test]
    fn test_resource_store_exists_default_impl() {
        let mock = MockPal::new();
        mock.add_resource("icons/app.png", b"png".to_vec());

        let resources = mock.resources();
        assert!(resources.exists(RelativePath::new("icons/app.png")));
        assert!(!resources.exists(RelativePath::new("icons/missing.png")));
    }
}
