//! Interfaces to the hosted services the studio depends on.
//!
//! ```text
//! Studio
//!   |-- TextModel::generate(prompt) ------------> raw text
//!   |-- ImageModel::generate_images(prompt, n) -> Vec<image bytes>
//!   `-- ObjectStore::put(key, bytes)
//!       ObjectStore::signed_url(key, ttl) ------> URL
//! ```
//!
//! Concrete Google Cloud implementations live in the `atelier-cloud` crate;
//! in-memory fakes live in `atelier-test-utils`.

pub mod error;
pub mod trait_def;

pub use error::{GenerationError, StorageError};
pub use trait_def::{AspectRatio, ImageModel, ObjectStore, TextModel};
