//! procdoc Storage
//!
//! Object storage for generated artifacts.
//!
//! - [`ObjectStore`]: upload/download/list/exists/delete by relative path
//! - [`MemoryObjectStore`]: in-process store for tests and dry runs
//! - [`LocalObjectStore`]: files under a root directory
//! - [`ArtifactLocator`]: reads from the first existing candidate location,
//!   writes to the canonical one

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod local;
mod locator;
mod memory;
mod object;

pub use error::{validate_path, StorageError, StorageResult};
pub use local::LocalObjectStore;
pub use locator::{ArtifactLocator, LocatedArtifact};
pub use memory::MemoryObjectStore;
pub use object::{content_type_for, ObjectEntry, ObjectStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
