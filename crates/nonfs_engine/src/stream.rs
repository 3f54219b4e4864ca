use std::io::{self, Read, Write};
use std::path::PathBuf;

use encoding_rs::Encoding;
use nonfs_base::{NonfsError, NonfsResult, ResultExt, err};
use tracing::{debug, instrument};

use crate::handle::FileHandle;
use crate::resolver::{self, Resolution};

/// Buffer size used when the length of a file is unknown.
const DEFAULT_ESTIMATED_LENGTH: usize = 512;

/// Upper bound for the up-front buffer of `read_bytes`; larger files grow it while reading.
const MAX_PREALLOCATION: usize = 64 * 1024;

impl FileHandle {
    /// Opens a reader on this file.
    ///
    /// Local and Internal files fall back to packaged resources when the physical file is
    /// absent. Fails with `NotFound` when nothing can be opened and with `IsADirectory` when
    /// the path names a directory.
    #[instrument(skip(self), fields(handle = %self))]
    pub fn read(&self) -> NonfsResult<Box<dyn Read + Send>> {
        match self.resolve_for_read() {
            Resolution::ResourceLookup { source, path } => {
                resolver::resource_store(&**self.pal(), source)
                    .open(&path)
                    .map_err(|cause| Box::new(self.not_found().caused_by(cause)))
            }
            Resolution::Found(location) => {
                if self.pal().metadata(&location).is_some_and(|meta| meta.is_dir) {
                    return Err(self.is_a_directory());
                }
                self.pal()
                    .open_read(&location)
                    .with_context(|| format!("Error reading file: {}", self))
            }
            Resolution::Missing(_) => Err(Box::new(self.not_found())),
        }
    }

    /// Reads the whole file.
    pub fn read_bytes(&self) -> NonfsResult<Vec<u8>> {
        let mut reader = self.read()?;
        let mut bytes = Vec::with_capacity(self.estimate_length());
        reader
            .read_to_end(&mut bytes)
            .map_err(|source| self.stream_failure(source, "reading"))?;
        Ok(bytes)
    }

    /// Reads the whole file as UTF-8 text.
    pub fn read_string(&self) -> NonfsResult<String> {
        self.read_string_with(encoding_rs::UTF_8)
    }

    /// Reads the whole file as text in `encoding`. A byte order mark is kept as content and
    /// malformed input fails instead of being replaced.
    pub fn read_string_with(&self, encoding: &'static Encoding) -> NonfsResult<String> {
        let bytes = self.read_bytes()?;
        encoding
            .decode_without_bom_handling_and_without_replacement(&bytes)
            .map(|text| text.into_owned())
            .ok_or_else(|| err!("File is not valid {}: {}", encoding.name(), self))
    }

    /// Reads into `buffer` until it is full or the file ends. Returns the number of bytes
    /// read.
    pub fn read_bytes_into(&self, buffer: &mut [u8]) -> NonfsResult<usize> {
        let mut reader = self.read()?;
        let mut filled = 0;
        while filled < buffer.len() {
            match reader.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(count) => filled += count,
                Err(source) if source.kind() == io::ErrorKind::Interrupted => {}
                Err(source) => return Err(self.stream_failure(source, "reading")),
            }
        }
        Ok(filled)
    }

    /// Opens a writer, creating parent directories as needed. With `append` the existing
    /// content is kept.
    #[instrument(skip(self), fields(handle = %self))]
    pub fn write(&self, append: bool) -> NonfsResult<Box<dyn Write + Send>> {
        let location = self.resolve_for_write("write to")?;
        if let Some(parent) = location.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.pal()
                .create_dir_all(parent)
                .with_context(|| format!("Error creating parent directories for: {}", self))?;
        }
        if self.pal().metadata(&location).is_some_and(|meta| meta.is_dir) {
            return Err(self.is_a_directory());
        }
        debug!(location = %location.display(), append, "opening for write");
        self.pal()
            .open_write(&location, append)
            .with_context(|| format!("Error writing file: {}", self))
    }

    pub fn write_bytes(&self, bytes: &[u8], append: bool) -> NonfsResult<()> {
        let mut writer = self.write(append)?;
        writer
            .write_all(bytes)
            .and_then(|()| writer.flush())
            .map_err(|source| self.stream_failure(source, "writing"))
    }

    /// Writes `text` as UTF-8.
    pub fn write_string(&self, text: &str, append: bool) -> NonfsResult<()> {
        self.write_bytes(text.as_bytes(), append)
    }

    /// Writes `text` in `encoding`. Fails without touching the file when `text` has
    /// characters the encoding cannot represent, or when `encoding` is decode-only
    /// (UTF-16 and replacement).
    pub fn write_string_with(
        &self,
        text: &str,
        append: bool,
        encoding: &'static Encoding,
    ) -> NonfsResult<()> {
        let (bytes, used, unmappable) = encoding.encode(text);
        if used != encoding {
            return Err(err!("Cannot encode text as {}: {}", encoding.name(), self));
        }
        if unmappable {
            return Err(err!(
                "Text has characters not representable in {}: {}",
                encoding.name(),
                self
            ));
        }
        self.write_bytes(&bytes, append)
    }

    /// Copies everything from `input` into this file. Returns the number of bytes written.
    pub fn write_stream(&self, input: &mut dyn Read, append: bool) -> NonfsResult<u64> {
        let mut writer = self.write(append)?;
        let written = io::copy(input, &mut writer)
            .and_then(|written| writer.flush().map(|()| written))
            .map_err(|source| self.stream_failure(source, "writing"))?;
        Ok(written)
    }

    fn estimate_length(&self) -> usize {
        match self.length() {
            0 => DEFAULT_ESTIMATED_LENGTH,
            length => usize::try_from(length)
                .unwrap_or(MAX_PREALLOCATION)
                .min(MAX_PREALLOCATION),
        }
    }

    fn stream_failure(&self, source: io::Error, action: &str) -> Box<NonfsError> {
        let location = self
            .resolved_location()
            .unwrap_or_else(|| PathBuf::from(self.path()));
        Box::new(NonfsError::io(location, source).context(format!("Error {} file: {}", action, self)))
    }
}
