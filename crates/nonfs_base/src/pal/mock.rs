use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::SystemTime;

use parking_lot::Mutex;

use crate::{NonfsError, NonfsResult};

use super::resources::EmbeddedResources;
use super::traits::{FileMetadata, InternalStorage, Pal, ResourceStore};

/* 📖 # Why an in-memory tree for MockPal storage?

MockPal keeps a map from physical path to entry behind Arc<Mutex<T>>:
1. **Speed**: No filesystem I/O, deterministic and fast for unit tests
2. **Isolation**: No side effects on the real filesystem
3. **Observability**: Tests can count primitive calls to prove an operation did no I/O

It enforces the same rules the real filesystem does (parents must exist, only empty
directories can be removed), so algorithms built on the Pal behave identically on both.
*/

#[derive(Debug, Clone)]
enum MockEntry {
    Directory,
    File {
        content: Vec<u8>,
        modified: SystemTime,
    },
}

type Entries = Arc<Mutex<BTreeMap<PathBuf, MockEntry>>>;

/// In-memory PAL implementation for testing.
///
/// Roots: external `/mock/external`, local `/mock/local`, bundle `/mock/bundle`,
/// temp `/mock/tmp`. All of them exist initially.
///
/// # Examples
///
/// ```
/// use nonfs_base::{MockPal, Pal};
/// use std::path::Path;
///
/// let mock = MockPal::new();
/// mock.add_file("/mock/local/test.txt", b"content".to_vec());
/// assert!(mock.exists(Path::new("/mock/local/test.txt")));
/// assert_eq!(mock.file_content("/mock/local/test.txt").unwrap(), b"content");
/// ```
#[derive(Debug, Clone)]
pub struct MockPal {
    entries: Entries,
    resources: EmbeddedResources,
    assets: EmbeddedResources,
    internal: InternalStorage,
    external_available: bool,
    io_calls: Arc<AtomicUsize>,
    open_streams: Arc<AtomicUsize>,
    next_temp: Arc<AtomicU64>,
}

pub const MOCK_EXTERNAL_ROOT: &str = "/mock/external";
pub const MOCK_LOCAL_ROOT: &str = "/mock/local";
pub const MOCK_BUNDLE_ROOT: &str = "/mock/bundle";
pub const MOCK_TEMP_ROOT: &str = "/mock/tmp";

fn io_err(path: &Path, kind: std::io::ErrorKind, message: &str) -> Box<NonfsError> {
    Box::new(NonfsError::io(path, std::io::Error::new(kind, message.to_string())))
}

impl MockPal {
    /// Create a MockPal whose Internal files live under the bundle root.
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        for root in ["/", "/mock", MOCK_EXTERNAL_ROOT, MOCK_LOCAL_ROOT, MOCK_BUNDLE_ROOT, MOCK_TEMP_ROOT] {
            entries.insert(PathBuf::from(root), MockEntry::Directory);
        }
        Self {
            entries: Arc::new(Mutex::new(entries)),
            resources: EmbeddedResources::new(),
            assets: EmbeddedResources::new(),
            internal: InternalStorage::Directory(PathBuf::from(MOCK_BUNDLE_ROOT)),
            external_available: true,
            io_calls: Arc::new(AtomicUsize::new(0)),
            open_streams: Arc::new(AtomicUsize::new(0)),
            next_temp: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Serve Internal files from an asset store instead of the bundle directory.
    pub fn with_asset_store(mut self) -> Self {
        self.internal = InternalStorage::Assets(Arc::new(self.assets.clone()));
        self
    }

    pub fn with_external_available(mut self, available: bool) -> Self {
        self.external_available = available;
        self
    }

    /// Add a file, creating missing parent directories.
    pub fn add_file(&self, path: impl AsRef<Path>, content: Vec<u8>) {
        let path = path.as_ref();
        let mut entries = self.entries.lock();
        if let Some(parent) = path.parent() {
            for ancestor in parent.ancestors() {
                entries
                    .entry(ancestor.to_path_buf())
                    .or_insert(MockEntry::Directory);
            }
        }
        entries.insert(
            path.to_path_buf(),
            MockEntry::File {
                content,
                modified: SystemTime::now(),
            },
        );
    }

    /// Add a directory, creating missing parents.
    pub fn add_directory(&self, path: impl AsRef<Path>) {
        let mut entries = self.entries.lock();
        for ancestor in path.as_ref().ancestors() {
            entries
                .entry(ancestor.to_path_buf())
                .or_insert(MockEntry::Directory);
        }
    }

    /// Add a packaged (classpath) resource.
    pub fn add_resource(&self, path: &str, content: Vec<u8>) {
        self.resources.insert(path, content);
    }

    /// Add an entry to the asset store used after `with_asset_store`.
    pub fn add_asset(&self, path: &str, content: Vec<u8>) {
        self.assets.insert(path, content);
    }

    pub fn file_content(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.entries.lock().get(path.as_ref()) {
            Some(MockEntry::File { content, .. }) => Some(content.clone()),
            _ => None,
        }
    }

    pub fn is_directory(&self, path: impl AsRef<Path>) -> bool {
        matches!(
            self.entries.lock().get(path.as_ref()),
            Some(MockEntry::Directory)
        )
    }

    /// Number of physical primitive calls made so far.
    pub fn io_calls(&self) -> usize {
        self.io_calls.load(Ordering::SeqCst)
    }

    /// Number of readers and writers handed out by `open_read`/`open_write` that have not
    /// been dropped yet.
    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.io_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn require_parent_directory(entries: &BTreeMap<PathBuf, MockEntry>, path: &Path) -> NonfsResult<()> {
        match path.parent().map(|parent| entries.get(parent)) {
            Some(Some(MockEntry::Directory)) => Ok(()),
            _ => Err(io_err(path, std::io::ErrorKind::NotFound, "parent directory not found")),
        }
    }
}

impl Default for MockPal {
    fn default() -> Self {
        Self::new()
    }
}

impl Pal for MockPal {
    fn external_storage_path(&self) -> &Path {
        Path::new(MOCK_EXTERNAL_ROOT)
    }

    fn is_external_storage_available(&self) -> bool {
        self.external_available
    }

    fn local_storage_path(&self) -> &Path {
        Path::new(MOCK_LOCAL_ROOT)
    }

    fn is_local_storage_available(&self) -> bool {
        true
    }

    fn internal_storage(&self) -> &InternalStorage {
        &self.internal
    }

    fn resources(&self) -> &dyn ResourceStore {
        &self.resources
    }

    fn temp_directory(&self) -> &Path {
        Path::new(MOCK_TEMP_ROOT)
    }

    fn metadata(&self, path: &Path) -> Option<FileMetadata> {
        self.record_call();
        match self.entries.lock().get(path)? {
            MockEntry::Directory => Some(FileMetadata {
                is_dir: true,
                len: 0,
                modified: None,
            }),
            MockEntry::File { content, modified } => Some(FileMetadata {
                is_dir: false,
                len: content.len() as u64,
                modified: Some(*modified),
            }),
        }
    }

    fn open_read(&self, path: &Path) -> NonfsResult<Box<dyn Read + Send>> {
        self.record_call();
        match self.entries.lock().get(path) {
            Some(MockEntry::File { content, .. }) => Ok(Box::new(MockFileReader {
                cursor: Cursor::new(content.clone()),
                _open: OpenStream::new(&self.open_streams),
            })),
            Some(MockEntry::Directory) => Err(io_err(path, std::io::ErrorKind::IsADirectory, "is a directory")),
            None => Err(io_err(path, std::io::ErrorKind::NotFound, "file not found")),
        }
    }

    fn open_write(&self, path: &Path, append: bool) -> NonfsResult<Box<dyn Write + Send>> {
        self.record_call();
        let mut entries = self.entries.lock();
        Self::require_parent_directory(&entries, path)?;
        let buffer = match entries.get(path) {
            Some(MockEntry::Directory) => {
                return Err(io_err(path, std::io::ErrorKind::IsADirectory, "is a directory"));
            }
            Some(MockEntry::File { content, .. }) if append => content.clone(),
            _ => Vec::new(),
        };
        entries.insert(
            path.to_path_buf(),
            MockEntry::File {
                content: buffer.clone(),
                modified: SystemTime::now(),
            },
        );
        Ok(Box::new(MockFileWriter {
            path: path.to_path_buf(),
            entries: Arc::clone(&self.entries),
            buffer,
            _open: OpenStream::new(&self.open_streams),
        }))
    }

    fn read_dir(&self, path: &Path) -> NonfsResult<Vec<String>> {
        self.record_call();
        let entries = self.entries.lock();
        match entries.get(path) {
            Some(MockEntry::Directory) => {}
            Some(MockEntry::File { .. }) => {
                return Err(io_err(path, std::io::ErrorKind::NotADirectory, "not a directory"));
            }
            None => return Err(io_err(path, std::io::ErrorKind::NotFound, "directory not found")),
        }
        Ok(entries
            .keys()
            .filter(|child| child.parent() == Some(path))
            .filter_map(|child| child.file_name()?.to_str().map(str::to_string))
            .collect())
    }

    fn create_dir(&self, path: &Path) -> NonfsResult<()> {
        self.record_call();
        let mut entries = self.entries.lock();
        Self::require_parent_directory(&entries, path)?;
        if entries.contains_key(path) {
            return Err(io_err(path, std::io::ErrorKind::AlreadyExists, "already exists"));
        }
        entries.insert(path.to_path_buf(), MockEntry::Directory);
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> NonfsResult<()> {
        self.record_call();
        let mut entries = self.entries.lock();
        for ancestor in path.ancestors() {
            if let Some(MockEntry::File { .. }) = entries.get(ancestor) {
                return Err(io_err(ancestor, std::io::ErrorKind::AlreadyExists, "file exists"));
            }
        }
        for ancestor in path.ancestors() {
            entries
                .entry(ancestor.to_path_buf())
                .or_insert(MockEntry::Directory);
        }
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> NonfsResult<()> {
        self.record_call();
        let mut entries = self.entries.lock();
        match entries.get(path) {
            Some(MockEntry::File { .. }) => {
                entries.remove(path);
                Ok(())
            }
            Some(MockEntry::Directory) => Err(io_err(path, std::io::ErrorKind::IsADirectory, "is a directory")),
            None => Err(io_err(path, std::io::ErrorKind::NotFound, "file not found")),
        }
    }

    fn remove_dir(&self, path: &Path) -> NonfsResult<()> {
        self.record_call();
        let mut entries = self.entries.lock();
        match entries.get(path) {
            Some(MockEntry::Directory) => {}
            Some(MockEntry::File { .. }) => {
                return Err(io_err(path, std::io::ErrorKind::NotADirectory, "not a directory"));
            }
            None => return Err(io_err(path, std::io::ErrorKind::NotFound, "directory not found")),
        }
        if entries.keys().any(|child| child.parent() == Some(path)) {
            return Err(io_err(path, std::io::ErrorKind::DirectoryNotEmpty, "directory not empty"));
        }
        entries.remove(path);
        Ok(())
    }

    fn create_temp_file(&self, prefix: &str) -> NonfsResult<PathBuf> {
        self.record_call();
        let id = self.next_temp.fetch_add(1, Ordering::SeqCst);
        let path = Path::new(MOCK_TEMP_ROOT).join(format!("{}{}.tmp", prefix, id));
        self.entries.lock().insert(
            path.clone(),
            MockEntry::File {
                content: Vec::new(),
                modified: SystemTime::now(),
            },
        );
        Ok(path)
    }
}

/// Counts one open stream for as long as it lives.
struct OpenStream(Arc<AtomicUsize>);

impl OpenStream {
    fn new(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for OpenStream {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

struct MockFileReader {
    cursor: Cursor<Vec<u8>>,
    _open: OpenStream,
}

impl Read for MockFileReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.cursor.read(buf)
    }
}

/// Writer that stores its buffer in the mock tree on flush and when dropped.
struct MockFileWriter {
    path: PathBuf,
    entries: Entries,
    buffer: Vec<u8>,
    _open: OpenStream,
}

impl MockFileWriter {
    fn commit(&self) {
        self.entries.lock().insert(
            self.path.clone(),
            MockEntry::File {
                content: self.buffer.clone(),
                modified: SystemTime::now(),
            },
        );
    }
}

impl Write for MockFileWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.commit();
        Ok(())
    }
}

impl Drop for MockFileWriter {
    fn drop(&mut self) {
        self.commit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relative_path::RelativePath;

    fn local(name: &str) -> PathBuf {
        Path::new(MOCK_LOCAL_ROOT).join(name)
    }

    #[test]
    fn test_roots_exist() {
        let pal = MockPal::new();
        assert!(pal.metadata(pal.external_storage_path()).unwrap().is_dir);
        assert!(pal.metadata(pal.local_storage_path()).unwrap().is_dir);
        assert!(pal.metadata(pal.temp_directory()).unwrap().is_dir);
    }

    #[test]
    fn test_write_then_read() {
        let pal = MockPal::new();
        {
            let mut writer = pal.open_write(&local("new.txt"), false).unwrap();
            writer.write_all(b"test content").unwrap();
        }
        let mut content = String::new();
        pal.open_read(&local("new.txt"))
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "test content");
    }

    #[test]
    fn test_append_keeps_content() {
        let pal = MockPal::new();
        pal.add_file(local("log.txt"), b"one".to_vec());
        pal.open_write(&local("log.txt"), true)
            .unwrap()
            .write_all(b" two")
            .unwrap();
        assert_eq!(pal.file_content(local("log.txt")).unwrap(), b"one two");
    }

    #[test]
    fn test_open_write_requires_parent() {
        let pal = MockPal::new();
        assert!(pal.open_write(&local("missing/new.txt"), false).is_err());
        assert!(pal.open_write(Path::new(MOCK_LOCAL_ROOT), false).is_err());
    }

    #[test]
    fn test_read_dir_lists_immediate_children() {
        let pal = MockPal::new();
        pal.add_file(local("dir/b.txt"), vec![]);
        pal.add_file(local("dir/a.txt"), vec![]);
        pal.add_file(local("dir/sub/c.txt"), vec![]);

        assert_eq!(pal.read_dir(&local("dir")).unwrap(), vec!["a.txt", "b.txt", "sub"]);
        assert!(pal.read_dir(&local("dir/a.txt")).is_err());
        assert!(pal.read_dir(&local("nope")).is_err());
    }

    #[test]
    fn test_create_dir_all_and_remove_dir() {
        let pal = MockPal::new();
        pal.create_dir_all(&local("a/b/c")).unwrap();
        pal.create_dir_all(&local("a/b/c")).unwrap();
        assert!(pal.is_directory(local("a/b")));

        assert!(pal.remove_dir(&local("a/b")).is_err());
        pal.remove_dir(&local("a/b/c")).unwrap();
        pal.remove_dir(&local("a/b")).unwrap();
        assert!(!pal.exists(&local("a/b")));
    }

    #[test]
    fn test_create_dir_all_through_file_fails() {
        let pal = MockPal::new();
        pal.add_file(local("file"), vec![]);
        assert!(pal.create_dir_all(&local("file/sub")).is_err());
    }

    #[test]
    fn test_remove_file() {
        let pal = MockPal::new();
        pal.add_file(local("gone.txt"), b"x".to_vec());
        pal.remove_file(&local("gone.txt")).unwrap();
        assert!(pal.file_content(local("gone.txt")).is_none());
        assert!(pal.remove_file(&local("gone.txt")).is_err());
    }

    #[test]
    fn test_temp_files_are_unique() {
        let pal = MockPal::new();
        let first = pal.create_temp_file("t").unwrap();
        let second = pal.create_temp_file("t").unwrap();
        assert_ne!(first, second);
        assert!(pal.exists(&first));
    }

    #[test]
    fn test_asset_store() {
        let pal = MockPal::new().with_asset_store();
        pal.add_asset("levels/1.json", b"{}".to_vec());
        match pal.internal_storage() {
            InternalStorage::Assets(store) => {
                assert!(store.exists(RelativePath::new("levels/1.json")));
            }
            InternalStorage::Directory(_) => panic!("Expected asset store"),
        }
    }

    #[test]
    fn test_io_calls_counted() {
        let pal = MockPal::new();
        let before = pal.io_calls();
        pal.metadata(&local("x"));
        pal.read_dir(pal.local_storage_path()).unwrap();
        assert_eq!(pal.io_calls(), before + 2);
    }

    #[test]
    fn test_open_streams_counted_until_dropped() {
        let pal = MockPal::new();
        pal.add_file(local("a.txt"), b"a".to_vec());
        let reader = pal.open_read(&local("a.txt")).unwrap();
        let writer = pal.open_write(&local("b.txt"), false).unwrap();
        assert_eq!(pal.open_streams(), 2);

        drop(reader);
        assert_eq!(pal.open_streams(), 1);
        drop(writer);
        assert_eq!(pal.open_streams(), 0);

        assert!(pal.open_read(&local("missing.txt")).is_err());
        assert_eq!(pal.open_streams(), 0);
    }
}
