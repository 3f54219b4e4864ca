use std::fmt;

/* 📖 # Why is FileType a resolution policy and not a location?

A FileType does not name a directory. It names the rule used to turn a logical path
into something openable: a packaged resource lookup, a path under one of the
platform roots, or the path itself. The same logical path resolves to different
physical locations on different platforms, but the rule stays the same.
*/

/// Determines how a logical path is resolved to a readable/writable location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileType {
    /// Packaged read-only resource, only reachable through resource lookup.
    Classpath,
    /// Path under the bundle root (or platform asset store). Read-only.
    /// Falls back to packaged resources when no physical file exists.
    Internal,
    /// Path under the external storage root.
    External,
    /// Fully qualified path, used verbatim.
    Absolute,
    /// Path under the process-private local storage root.
    Local,
}

impl FileType {
    pub const ALL: [FileType; 5] = [
        FileType::Classpath,
        FileType::Internal,
        FileType::External,
        FileType::Absolute,
        FileType::Local,
    ];

    /// Classpath and Internal files can never be written, created or deleted.
    pub fn is_read_only(self) -> bool {
        matches!(self, FileType::Classpath | FileType::Internal)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileType::Classpath => "Classpath",
            FileType::Internal => "Internal",
            FileType::External => "External",
            FileType::Absolute => "Absolute",
            FileType::Local => "Local",
        };
        f.write_str(name)
    }
}
