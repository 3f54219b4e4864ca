use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{Cursor, Read};
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use relative_path::{RelativePath, RelativePathBuf};
use tracing::{debug, instrument, warn};

use crate::{NonfsError, NonfsResult};

use super::traits::ResourceStore;

/// Resource names are compared without leading separators or `.` segments.
fn resource_key(path: &RelativePath) -> RelativePathBuf {
    RelativePath::new(path.as_str().trim_start_matches('/')).normalize()
}

fn not_found(path: &RelativePath) -> Box<NonfsError> {
    Box::new(NonfsError::io(
        path.as_str(),
        std::io::Error::new(std::io::ErrorKind::NotFound, "resource not found"),
    ))
}

/// Resource store backed by a read-only directory tree, e.g. an unpacked asset folder.
#[derive(Debug, Clone)]
pub struct DirectoryResources {
    root: PathBuf,
}

impl DirectoryResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    fn physical(&self, path: &RelativePath) -> PathBuf {
        resource_key(path).to_path(&self.root)
    }
}

impl ResourceStore for DirectoryResources {
    #[instrument(skip(self), fields(path = %path))]
    fn open(&self, path: &RelativePath) -> NonfsResult<Box<dyn Read + Send>> {
        let resolved = self.physical(path);
        match fs::metadata(&resolved) {
            Ok(meta) if meta.is_file() => {}
            _ => {
                debug!(resolved = %resolved.display(), "resource is not a file");
                return Err(not_found(path));
            }
        }
        let file = fs::File::open(&resolved).map_err(|e| {
            debug!(error = %e, "failed to open resource");
            Box::new(NonfsError::io(resolved.clone(), e))
        })?;
        Ok(Box::new(file))
    }

    #[instrument(skip(self), fields(path = %path))]
    fn list(&self, path: &RelativePath) -> NonfsResult<Vec<String>> {
        let resolved = self.physical(path);
        if !resolved.is_dir() {
            return Ok(vec![]);
        }
        let entries =
            fs::read_dir(&resolved).map_err(|e| Box::new(NonfsError::io(resolved.clone(), e)))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Box::new(NonfsError::io(resolved.clone(), e)))?;
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(name) => warn!(?name, "skipping resource with non UTF-8 name"),
            }
        }
        names.sort();
        Ok(names)
    }

    fn length(&self, path: &RelativePath) -> Option<u64> {
        fs::metadata(self.physical(path))
            .ok()
            .filter(|meta| meta.is_file())
            .map(|meta| meta.len())
    }
}

/* 📖 # Why does EmbeddedResources use shared interior state?

EmbeddedResources stands in for resources compiled into the binary (`include_bytes!`) and
for test fixtures. Clones share the same map, so a store can be handed to a PAL and still
be populated afterwards, which keeps test setup short.
*/

/// In-memory resource store, typically filled from `include_bytes!` data.
///
/// # Examples
///
/// ```
/// use nonfs_base::{EmbeddedResources, ResourceStore};
/// use relative_path::RelativePath;
///
/// let resources = EmbeddedResources::new().with("shaders/basic.vert", b"void main() {}".to_vec());
/// assert!(resources.exists(RelativePath::new("shaders/basic.vert")));
/// assert_eq!(resources.list(RelativePath::new("shaders")).unwrap(), vec!["basic.vert"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EmbeddedResources {
    entries: Arc<RwLock<BTreeMap<RelativePathBuf, Arc<[u8]>>>>,
}

impl EmbeddedResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(self, path: impl AsRef<str>, content: impl Into<Vec<u8>>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&self, path: impl AsRef<str>, content: impl Into<Vec<u8>>) {
        let key = resource_key(RelativePath::new(path.as_ref()));
        let content: Vec<u8> = content.into();
        self.entries.write().insert(key, Arc::from(content));
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl ResourceStore for EmbeddedResources {
    fn open(&self, path: &RelativePath) -> NonfsResult<Box<dyn Read + Send>> {
        let content = self
            .entries
            .read()
            .get(&resource_key(path))
            .cloned()
            .ok_or_else(|| not_found(path))?;
        Ok(Box::new(Cursor::new(content)))
    }

    fn list(&self, path: &RelativePath) -> NonfsResult<Vec<String>> {
        let dir = resource_key(path);
        let dir = dir.as_str();
        let entries = self.entries.read();
        let names: BTreeSet<String> = entries
            .keys()
            .filter_map(|key| {
                let key = key.as_str();
                let rest = if dir.is_empty() {
                    key
                } else {
                    key.strip_prefix(dir)?.strip_prefix('/')?
                };
                rest.split('/').next().map(str::to_string)
            })
            .filter(|name| !name.is_empty())
            .collect();
        Ok(names.into_iter().collect())
    }

    fn length(&self, path: &RelativePath) -> Option<u64> {
        self.entries
            .read()
            .get(&resource_key(path))
            .map(|content| content.len() as u64)
    }
}
