//! Core orchestration for the atelier generation backend.
//!
//! ```text
//! StageContext --prompt--> TextModel --normalize--> StageOutcome
//!      |
//!      `--product ideas--> ImageModel --> ObjectStore --> GeneratedImageSet
//! ```
//!
//! This crate contains no network code; the upstream services are reached
//! through the traits in [`upstream`].

pub mod envelope;
pub mod images;
pub mod prompt;
pub mod stage;
pub mod studio;
pub mod upstream;

pub use stage::{ProductIdea, Stage, StageContext};
pub use studio::{Studio, StudioError};
