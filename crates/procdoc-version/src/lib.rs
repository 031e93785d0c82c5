//! procdoc Version Store
//!
//! Append-only, content-addressed history of BPMN files. Every upload is
//! hashed after whitespace normalization; identical content under the same
//! file name resolves to the same version, anything else becomes the next
//! version and the file's current one.
//!
//! # Backends
//!
//! - [`MemoryMetadataStore`]: in-process, for tests and tooling
//! - [`SqliteMetadataStore`]: SQLite via `sqlx`
//!
//! Both implement [`MetadataStore`]; [`VersionStore`] adds per-file write
//! serialization and the invariant checks.
//!
//! # Example
//!
//! ```rust
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), procdoc_version::VersionError> {
//! use procdoc_version::{Upload, VersionStore};
//!
//! let store = VersionStore::in_memory();
//! let (v1, is_new) = store
//!     .create_or_get_version(Upload::new("order.bpmn", "<definitions/>"))
//!     .await?;
//! assert!(is_new);
//! assert_eq!(v1.version_number, 1);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod memory;
mod metadata;
mod model;
mod sqlite;
mod store;

pub use error::{MetadataError, MetadataResult, VersionError, VersionResult};
pub use memory::MemoryMetadataStore;
pub use metadata::MetadataStore;
pub use model::{FileVersion, NewVersion, Upload};
pub use sqlite::SqliteMetadataStore;
pub use store::VersionStore;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
