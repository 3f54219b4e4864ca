use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use arcstr::ArcStr;
use nonfs_base::{ErrorKind, FileType, InternalStorage, NonfsError, NonfsResult, PalHandle};

use crate::logical_path;
use crate::resolver::{self, Resolution};

/* 📖 # Why is FileHandle an immutable value?

A handle is only a name: a file type plus a normalized logical path, together with the
PAL it will be resolved against. It does not open anything and does not remember where it
resolved to last time, so the same handle can be cloned, stored and shared across threads
freely. Every derivation (child, sibling, parent) produces a new handle.

The path is an ArcStr so clones and derivation-heavy traversals stay cheap.
*/

/// Logical reference to a file or directory, resolved against a PAL on every operation.
///
/// Equality and hashing use only the file type and the normalized path, never the PAL.
///
/// All operations are synchronous and may block on the underlying storage. No operation
/// takes a lock: concurrent mutation of the same physical subtree from two callers (for
/// example `delete_directory` racing with `list`) is unsynchronized and may observe a
/// partially modified tree.
///
/// # Examples
///
/// ```
/// use nonfs_base::{FileType, MockPal, PalHandle};
/// use nonfs_engine::FileHandle;
///
/// let pal = PalHandle::new(MockPal::new());
/// let handle = FileHandle::new(pal, "saves\\slot1.json", FileType::Local);
/// assert_eq!(handle.path(), "saves/slot1.json");
/// assert_eq!(handle.extension(), "json");
/// assert_eq!(handle.parent().path(), "saves");
/// ```
#[derive(Clone)]
pub struct FileHandle {
    path: ArcStr,
    file_type: FileType,
    pal: PalHandle,
}

impl FileHandle {
    /// Create a handle; the path is normalized.
    pub fn new(pal: PalHandle, path: &str, file_type: FileType) -> Self {
        Self {
            path: ArcStr::from(logical_path::normalize(path)),
            file_type,
            pal,
        }
    }

    /// Handle of the same type and PAL over an already normalized path.
    fn derive(&self, path: String) -> Self {
        Self {
            path: ArcStr::from(path),
            file_type: self.file_type,
            pal: self.pal.clone(),
        }
    }

    /// The normalized logical path, forward-slash separated.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        logical_path::name(&self.path)
    }

    pub fn extension(&self) -> &str {
        logical_path::extension(&self.path)
    }

    pub fn name_without_extension(&self) -> &str {
        logical_path::name_without_extension(&self.path)
    }

    pub fn path_without_extension(&self) -> &str {
        logical_path::path_without_extension(&self.path)
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    pub fn pal(&self) -> &PalHandle {
        &self.pal
    }

    /// Handle to a child of this directory. On an empty path the child is `name` alone.
    pub fn child(&self, name: &str) -> FileHandle {
        self.derive(logical_path::join(&self.path, name))
    }

    /// Handle to a file in the same directory.
    ///
    /// Fails with `InvalidOperation` on an empty path, the root has no siblings.
    pub fn sibling(&self, name: &str) -> NonfsResult<FileHandle> {
        if self.path.is_empty() {
            return Err(Box::new(NonfsError::new(ErrorKind::InvalidOperation {
                message: format!("Cannot get the sibling of the root ({})", self.file_type),
            })));
        }
        let path = match logical_path::parent(&self.path) {
            Some(parent) => logical_path::join(parent, name),
            None => logical_path::normalize(name),
        };
        Ok(self.derive(path))
    }

    /// Handle to the parent directory: `/` for a top-level Absolute path, `""` otherwise.
    pub fn parent(&self) -> FileHandle {
        let path = match logical_path::parent(&self.path) {
            Some(parent) => parent.to_string(),
            None if self.file_type == FileType::Absolute => "/".to_string(),
            None => String::new(),
        };
        self.derive(path)
    }

    /// Physical location of this handle, `None` for packaged resources and asset stores.
    pub fn resolved_location(&self) -> Option<PathBuf> {
        resolver::physical_location(&*self.pal, self.file_type, &self.path)
    }

    pub(crate) fn resolve_for_read(&self) -> Resolution {
        resolver::resolve_for_read(&*self.pal, self.file_type, &self.path)
    }

    pub(crate) fn resolve_for_write(&self, operation: &'static str) -> NonfsResult<PathBuf> {
        resolver::resolve_for_write(&*self.pal, self.file_type, &self.path, operation)
    }

    /// Whether the file exists. Internal files also count as existing when only the
    /// packaged resource is present.
    pub fn exists(&self) -> bool {
        let resource = resolver::resource_path(&self.path);
        match (self.file_type, self.pal.internal_storage()) {
            (FileType::Classpath, _) => self.pal.resources().exists(&resource),
            (FileType::Internal, InternalStorage::Assets(store)) => {
                store.exists(&resource)
                    || store.list(&resource).is_ok_and(|names| !names.is_empty())
            }
            (FileType::Internal, InternalStorage::Directory(_)) => {
                self.physical_exists() || self.pal.resources().exists(&resource)
            }
            _ => self.physical_exists(),
        }
    }

    fn physical_exists(&self) -> bool {
        self.resolved_location()
            .is_some_and(|location| self.pal.exists(&location))
    }

    /// Always false for Classpath. Asset-store directories count as directories when
    /// they list at least one entry.
    pub fn is_directory(&self) -> bool {
        match (self.file_type, self.pal.internal_storage()) {
            (FileType::Classpath, _) => false,
            (FileType::Internal, InternalStorage::Assets(store)) => store
                .list(&resolver::resource_path(&self.path))
                .is_ok_and(|names| !names.is_empty()),
            _ => self
                .resolved_location()
                .and_then(|location| self.pal.metadata(&location))
                .is_some_and(|meta| meta.is_dir),
        }
    }

    /// Size in bytes, 0 for directories or when the size cannot be determined.
    ///
    /// Classpath files, and Internal files without a physical file, report what their
    /// resource store knows, which may be inaccurate for compressed containers. Other types
    /// only ever report the physical size.
    pub fn length(&self) -> u64 {
        match self.resolve_for_read() {
            Resolution::Found(location) => self
                .pal
                .metadata(&location)
                .filter(|meta| !meta.is_dir)
                .map_or(0, |meta| meta.len),
            Resolution::ResourceLookup { source, path } if self.file_type.is_read_only() => {
                resolver::resource_store(&*self.pal, source)
                    .length(&path)
                    .unwrap_or(0)
            }
            Resolution::ResourceLookup { .. } | Resolution::Missing(_) => 0,
        }
    }

    /// Modification time in milliseconds since the Unix epoch, 0 if unavailable.
    pub fn last_modified(&self) -> u64 {
        self.resolved_location()
            .and_then(|location| self.pal.metadata(&location))
            .and_then(|meta| meta.modified)
            .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |duration| duration.as_millis() as u64)
    }

    pub(crate) fn not_found(&self) -> NonfsError {
        NonfsError::new(ErrorKind::NotFound {
            path: self.path.to_string(),
            file_type: self.file_type,
        })
    }

    pub(crate) fn is_a_directory(&self) -> Box<NonfsError> {
        Box::new(NonfsError::new(ErrorKind::IsADirectory {
            path: self.path.to_string(),
            file_type: self.file_type,
        }))
    }

    /// Whether both handles resolve to the same physical location.
    pub(crate) fn same_location(&self, other: &FileHandle) -> bool {
        match (self.resolved_location(), other.resolved_location()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq for FileHandle {
    fn eq(&self, other: &Self) -> bool {
        self.file_type == other.file_type && self.path == other.path
    }
}

impl Eq for FileHandle {}

impl Hash for FileHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.file_type.hash(state);
        self.path.hash(state);
    }
}

impl fmt::Display for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path, self.file_type)
    }
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("path", &self.path.as_str())
            .field("file_type", &self.file_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nonfs_base::MockPal;
    use std::collections::HashSet;

    fn handle(path: &str, file_type: FileType) -> FileHandle {
        FileHandle::new(PalHandle::new(MockPal::new()), path, file_type)
    }

    #[test]
    fn test_path_derivations() {
        let h = handle("maps\\world\\level1.tmx", FileType::Internal);
        assert_eq!(h.path(), "maps/world/level1.tmx");
        assert_eq!(h.name(), "level1.tmx");
        assert_eq!(h.extension(), "tmx");
        assert_eq!(h.name_without_extension(), "level1");
        assert_eq!(h.path_without_extension(), "maps/world/level1");
        assert_eq!(h.file_type(), FileType::Internal);
    }

    #[test]
    fn test_child_chain_from_empty_path() {
        let root = handle("", FileType::Local);
        assert_eq!(root.child("x").path(), "x");
        assert_eq!(root.child("x").child("y").path(), "x/y");
        assert_eq!(root.child("x").file_type(), FileType::Local);

        let abs_root = handle("/", FileType::Absolute);
        assert_eq!(abs_root.child("tmp").path(), "/tmp");
    }

    #[test]
    fn test_sibling() {
        assert_eq!(
            handle("a/b.txt", FileType::Local).sibling("c.txt").unwrap().path(),
            "a/c.txt"
        );
        assert_eq!(
            handle("b.txt", FileType::Local).sibling("c.txt").unwrap().path(),
            "c.txt"
        );
        assert_eq!(
            handle("/b.txt", FileType::Absolute).sibling("c.txt").unwrap().path(),
            "/c.txt"
        );
    }

    #[test]
    fn test_sibling_of_root_fails_for_every_type() {
        for file_type in FileType::ALL {
            let err = handle("", file_type).sibling("x").unwrap_err();
            assert!(
                matches!(err.kind(), ErrorKind::InvalidOperation { .. }),
                "{:?}",
                err
            );
        }
    }

    #[test]
    fn test_parent() {
        assert_eq!(handle("a/b/c", FileType::External).parent().path(), "a/b");
        assert_eq!(handle("a", FileType::External).parent().path(), "");
        assert_eq!(handle("a", FileType::Absolute).parent().path(), "/");
        assert_eq!(handle("/a", FileType::Absolute).parent().path(), "/");
        assert_eq!(handle("/", FileType::Absolute).parent().path(), "/");
        assert_eq!(handle("", FileType::Classpath).parent().path(), "");
    }

    #[test]
    fn test_parent_child_round_trip() {
        let cases = [
            ("a/b/c.txt", FileType::Local),
            ("top.txt", FileType::Internal),
            ("x/y", FileType::Classpath),
            ("/usr/share/doc", FileType::Absolute),
            ("/etc", FileType::Absolute),
            ("docs/readme.md", FileType::External),
        ];
        for (path, file_type) in cases {
            let h = handle(path, file_type);
            assert_eq!(h.parent().child(h.name()), h, "round trip of {}", h);
        }
    }

    #[test]
    fn test_equality_is_normalization_insensitive() {
        let a = handle("a\\b.txt", FileType::Local);
        let b = handle("a/b.txt", FileType::Local);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));

        assert_ne!(handle("a/b.txt", FileType::External), b);
    }

    #[test]
    fn test_equality_ignores_pal() {
        let a = FileHandle::new(PalHandle::new(MockPal::new()), "x", FileType::Local);
        let b = FileHandle::new(PalHandle::new(MockPal::new()), "x/", FileType::Local);
        assert_eq!(a, b);
    }

    #[test]
    fn test_display_and_debug() {
        let h = handle("data/level.json", FileType::Internal);
        assert_eq!(h.to_string(), "data/level.json (Internal)");
        assert_eq!(
            format!("{:?}", h),
            r#"FileHandle { path: "data/level.json", file_type: Internal }"#
        );
    }

    #[test]
    fn test_resolved_location() {
        let h = handle("saves/1.sav", FileType::Local);
        assert_eq!(h.resolved_location(), Some(PathBuf::from("/mock/local/saves/1.sav")));
        assert_eq!(handle("saves/1.sav", FileType::Classpath).resolved_location(), None);
    }

    #[test]
    fn test_handles_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FileHandle>();
    }
}
