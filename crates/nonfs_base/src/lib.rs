/* 📖 # Why have nonfs_base as a core library?
nonfs_base provides the error handling, the FileType policy enum and the platform
abstraction layer used by the engine and the CLI. Keeping them here lets platform
backends be implemented without depending on the handle layer.
*/

pub mod error;
mod error_tests;
pub mod file_type;
pub mod pal;
pub mod tracing;

// Re-export commonly used types for convenience
pub use error::{ErrorKind, NonfsError, NonfsResult, ResultExt};
pub use file_type::FileType;
pub use pal::{
    DirectoryResources, EmbeddedResources, FileMetadata, InternalStorage, MockPal, Pal,
    PalHandle, RealPal, ResourceStore, StorageRoot,
};
