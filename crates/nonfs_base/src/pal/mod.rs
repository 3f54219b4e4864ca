/* 📖 # What is the Platform Abstraction Layer?

The PAL supplies everything that differs between platforms: the storage roots, where
Internal files live, the packaged resources, and the physical I/O primitives.
Key benefits:
- Testability: MockPal allows deterministic unit tests without filesystem access
- One code path: resolution and the recursive algorithms are written once against the trait
- Consistency: All filesystem operations use the same error handling
*/

pub mod mock;
pub mod real_pal;
pub mod resources;
mod traits;

pub use mock::MockPal;
pub use real_pal::{RealPal, StorageRoot};
pub use resources::{DirectoryResources, EmbeddedResources};
pub use traits::{FileMetadata, InternalStorage, Pal, PalHandle, ResourceStore};
