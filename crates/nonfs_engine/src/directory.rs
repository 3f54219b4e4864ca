use globset::Glob;
use nonfs_base::{ErrorKind, FileType, InternalStorage, NonfsError, NonfsResult, ResultExt, err};
use tracing::{debug, instrument};

use crate::handle::FileHandle;
use crate::resolver;

/* 📖 # How do the recursive directory algorithms fail?

They are written once against the Pal primitives and behave the same on every platform.
None of them is transactional: the first error stops the walk and is returned, and
whatever was already copied or deleted stays that way. Entries whose names are not valid
UTF-8 are skipped by the listing itself, with a warning.
*/

impl FileHandle {
    /// Immediate children of this directory, sorted by name.
    ///
    /// Returns an empty list when the handle is not a directory. Classpath handles cannot be
    /// listed.
    pub fn list(&self) -> NonfsResult<Vec<FileHandle>> {
        let names = self.list_names()?;
        Ok(names.iter().map(|name| self.child(name)).collect())
    }

    /// Children accepted by `filter`.
    pub fn list_filtered(&self, filter: impl Fn(&FileHandle) -> bool) -> NonfsResult<Vec<FileHandle>> {
        Ok(self.list()?.into_iter().filter(|child| filter(child)).collect())
    }

    /// Children whose name is accepted by `filter`.
    pub fn list_by_name(&self, filter: impl Fn(&str) -> bool) -> NonfsResult<Vec<FileHandle>> {
        self.list_filtered(|child| filter(child.name()))
    }

    /// Children whose name ends with `suffix`.
    pub fn list_with_suffix(&self, suffix: &str) -> NonfsResult<Vec<FileHandle>> {
        self.list_by_name(|name| name.ends_with(suffix))
    }

    /// Children whose name matches the glob `pattern`, e.g. `*.{png,jpg}`.
    pub fn list_glob(&self, pattern: &str) -> NonfsResult<Vec<FileHandle>> {
        let matcher = Glob::new(pattern)
            .map_err(|e| err!("Invalid glob pattern '{}': {}", pattern, e))?
            .compile_matcher();
        self.list_by_name(|name| matcher.is_match(name))
    }

    fn list_names(&self) -> NonfsResult<Vec<String>> {
        match (self.file_type(), self.pal().internal_storage()) {
            (FileType::Classpath, _) => Err(resolver::unsupported("list", self.file_type(), self.path())),
            (FileType::Internal, InternalStorage::Assets(store)) => store
                .list(&resolver::resource_path(self.path()))
                .with_context(|| format!("Error listing directory: {}", self)),
            _ => match self.resolved_location() {
                Some(location) if self.pal().metadata(&location).is_some_and(|meta| meta.is_dir) => self
                    .pal()
                    .read_dir(&location)
                    .with_context(|| format!("Error listing directory: {}", self)),
                _ => Ok(Vec::new()),
            },
        }
    }

    /// Creates this directory and any missing parents.
    #[instrument(skip(self), fields(handle = %self))]
    pub fn mkdirs(&self) -> NonfsResult<()> {
        let location = self.resolve_for_write("mkdirs with")?;
        self.pal()
            .create_dir_all(&location)
            .with_context(|| format!("Error creating directory: {}", self))
    }

    /// Deletes a file or an empty directory.
    ///
    /// Returns `false` when nothing was deleted because the entry does not exist or is a
    /// non-empty directory.
    #[instrument(skip(self), fields(handle = %self))]
    pub fn delete(&self) -> NonfsResult<bool> {
        let location = self.resolve_for_write("delete")?;
        match self.pal().metadata(&location) {
            None => Ok(false),
            Some(meta) if meta.is_dir => {
                if !self.pal().read_dir(&location)?.is_empty() {
                    debug!("directory not empty, not deleted");
                    return Ok(false);
                }
                self.pal().remove_dir(&location)?;
                Ok(true)
            }
            Some(_) => {
                self.pal().remove_file(&location)?;
                Ok(true)
            }
        }
    }

    /// Deletes this directory and everything below it. A plain file is simply deleted.
    #[instrument(skip(self), fields(handle = %self))]
    pub fn delete_directory(&self) -> NonfsResult<bool> {
        self.resolve_for_write("delete")?;
        self.empty_directory(false)?;
        self.delete()
    }

    /// Deletes the contents of this directory but not the directory itself.
    ///
    /// With `preserve_tree` only files are removed and all subdirectories stay in place.
    pub fn empty_directory(&self, preserve_tree: bool) -> NonfsResult<()> {
        self.resolve_for_write("delete")?;
        for child in self.list()? {
            if !child.is_directory() {
                child.delete()?;
            } else if preserve_tree {
                child.empty_directory(true)?;
            } else {
                child.delete_directory()?;
            }
        }
        Ok(())
    }

    /// Copies this file or directory to `dest`.
    ///
    /// A file copied onto an existing directory lands inside it under its own name. The
    /// children of a directory are copied directly into `dest`, which is created when
    /// missing and must not be an existing file.
    #[instrument(skip_all, fields(from = %self, to = %dest))]
    pub fn copy_to(&self, dest: &FileHandle) -> NonfsResult<()> {
        if !self.is_directory() {
            let target = if dest.is_directory() {
                dest.child(self.name())
            } else {
                dest.clone()
            };
            return self.copy_file(&target);
        }
        if dest.exists() && !dest.is_directory() {
            return Err(self.destination_conflict(dest));
        }
        if let (Some(from), Some(to)) = (self.resolved_location(), dest.resolved_location()) {
            if to.starts_with(&from) {
                return Err(Box::new(NonfsError::new(ErrorKind::InvalidOperation {
                    message: format!("Cannot copy directory {} into itself ({})", self, dest),
                })));
            }
        }
        dest.mkdirs()?;
        self.copy_directory_contents(dest)
    }

    fn copy_directory_contents(&self, dest: &FileHandle) -> NonfsResult<()> {
        for child in self.list()? {
            let target = dest.child(child.name());
            if child.is_directory() {
                if target.exists() && !target.is_directory() {
                    return Err(child.destination_conflict(&target));
                }
                target.mkdirs()?;
                child.copy_directory_contents(&target)?;
            } else {
                child.copy_file(&target)?;
            }
        }
        Ok(())
    }

    fn copy_file(&self, dest: &FileHandle) -> NonfsResult<()> {
        if self.same_location(dest) {
            debug!(handle = %self, "source and destination are the same file");
            return Ok(());
        }
        let mut input = self.read()?;
        dest.write_stream(&mut input, false)
            .with_context(|| format!("Error copying source file: {} to {}", self, dest))?;
        Ok(())
    }

    /// Moves this file or directory to `dest` by copying and then deleting the source.
    ///
    /// Classpath and Internal sources are rejected before anything is copied.
    #[instrument(skip_all, fields(from = %self, to = %dest))]
    pub fn move_to(&self, dest: &FileHandle) -> NonfsResult<()> {
        if self.file_type().is_read_only() {
            return Err(resolver::unsupported("move", self.file_type(), self.path()));
        }
        let target = if !self.is_directory() && dest.is_directory() {
            dest.child(self.name())
        } else {
            dest.clone()
        };
        if self.same_location(&target) {
            return Ok(());
        }
        self.copy_to(dest)?;
        if self.is_directory() {
            self.delete_directory()?;
        } else {
            self.delete()?;
        }
        Ok(())
    }

    fn destination_conflict(&self, dest: &FileHandle) -> Box<NonfsError> {
        Box::new(NonfsError::new(ErrorKind::DestinationConflict {
            from: self.to_string(),
            to: dest.to_string(),
        }))
    }
}
