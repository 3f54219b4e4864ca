/* 📖 # How is a logical path resolved?

| type      | physical root              | writable          | read falls back to resources     |
|-----------|----------------------------|-------------------|----------------------------------|
| Absolute  | none, path is physical     | yes               | no                               |
| External  | external storage root      | if available      | no                               |
| Local     | local storage root         | yes               | when the physical file is absent |
| Internal  | bundle root or asset store | no                | when the physical file is absent |
| Classpath | none, resource lookup only | no                | always                           |

Resolution is recomputed on every call and never cached. Instead of falling through
from a failed physical open into a resource lookup, the resolver returns a `Resolution`
and callers branch on it.
*/

use std::path::{Path, PathBuf};

use nonfs_base::{ErrorKind, FileType, InternalStorage, NonfsError, NonfsResult, Pal, ResourceStore};
use relative_path::RelativePathBuf;
use tracing::debug;

/// Which resource store a lookup goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceSource {
    /// The packaged (classpath) resources.
    Packaged,
    /// The platform asset store serving Internal files.
    Assets,
}

/// Outcome of resolving a handle for reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// An existing physical entry.
    Found(PathBuf),
    /// Must be read through a resource store.
    ResourceLookup {
        source: ResourceSource,
        path: RelativePathBuf,
    },
    /// The physical entry does not exist and there is no fallback.
    Missing(PathBuf),
}

/// Resource name for a logical path; leading separators are not part of resource names.
pub fn resource_path(path: &str) -> RelativePathBuf {
    RelativePathBuf::from(path.trim_start_matches('/'))
}

fn under_root(root: &Path, path: &str) -> PathBuf {
    let relative = path.trim_start_matches('/');
    if relative.is_empty() {
        root.to_path_buf()
    } else {
        root.join(relative)
    }
}

/// The physical location of a handle, `None` if the type has no filesystem presence.
pub fn physical_location(pal: &dyn Pal, file_type: FileType, path: &str) -> Option<PathBuf> {
    match file_type {
        FileType::Classpath => None,
        FileType::Internal => match pal.internal_storage() {
            InternalStorage::Directory(root) => Some(under_root(root, path)),
            InternalStorage::Assets(_) => None,
        },
        FileType::External => Some(under_root(pal.external_storage_path(), path)),
        FileType::Local => Some(under_root(pal.local_storage_path(), path)),
        FileType::Absolute => Some(PathBuf::from(path)),
    }
}

/// Decide where a read of `path` has to go.
pub fn resolve_for_read(pal: &dyn Pal, file_type: FileType, path: &str) -> Resolution {
    let lookup = |source| Resolution::ResourceLookup {
        source,
        path: resource_path(path),
    };
    let resolution = match (file_type, physical_location(pal, file_type, path)) {
        (FileType::Classpath, _) => lookup(ResourceSource::Packaged),
        (FileType::Internal, None) => lookup(ResourceSource::Assets),
        (_, Some(location)) if pal.exists(&location) => Resolution::Found(location),
        (FileType::Internal | FileType::Local, Some(_)) => lookup(ResourceSource::Packaged),
        (_, Some(location)) => Resolution::Missing(location),
        (_, None) => lookup(ResourceSource::Packaged),
    };
    debug!(%path, %file_type, ?resolution, "resolved for read");
    resolution
}

/// The physical location to write to, rejecting read-only types and unavailable storage.
pub fn resolve_for_write(
    pal: &dyn Pal,
    file_type: FileType,
    path: &str,
    operation: &'static str,
) -> NonfsResult<PathBuf> {
    if file_type.is_read_only() {
        return Err(unsupported(operation, file_type, path));
    }
    let location = physical_location(pal, file_type, path)
        .ok_or_else(|| unsupported(operation, file_type, path))?;
    if file_type == FileType::External && !pal.is_external_storage_available() {
        return Err(Box::new(NonfsError::io(
            location,
            std::io::Error::other("external storage is not available"),
        )));
    }
    Ok(location)
}

/// The store serving a resource lookup.
pub fn resource_store(pal: &dyn Pal, source: ResourceSource) -> &dyn ResourceStore {
    match (source, pal.internal_storage()) {
        (ResourceSource::Assets, InternalStorage::Assets(store)) => store.as_ref(),
        _ => pal.resources(),
    }
}

pub(crate) fn unsupported(operation: &'static str, file_type: FileType, path: &str) -> Box<NonfsError> {
    Box::new(NonfsError::new(ErrorKind::UnsupportedOperation {
        operation,
        path: path.to_string(),
        file_type,
    }))
}
