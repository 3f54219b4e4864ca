/* 📖 # What does nonfs_engine contain?

The handle layer: logical paths, their resolution against the PAL, the FileHandle
operations, and the Files factory together with the configuration and platform profiles
that build a RealPal.
*/

pub mod config;
mod directory;
pub mod files;
pub mod handle;
pub mod logical_path;
pub mod platform;
pub mod resolver;
mod stream;

pub use config::{Config, load_config};
pub use files::Files;
pub use handle::FileHandle;
pub use platform::{HostEnvironment, Platform, build_pal};
pub use resolver::{Resolution, ResourceSource};
