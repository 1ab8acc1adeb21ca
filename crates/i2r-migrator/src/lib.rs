//! Drivers for the two platform-facing migration passes.
//!
//! - [`EntityMigrator`] moves inline entities (pipelines, input sets,
//!   templates, services, environments, infrastructure definitions,
//!   overrides) to git, one project and one kind at a time.
//! - [`ManifestRewriter`] repoints file store manifests at the published
//!   mirror once the file store has been pushed.
//!
//! Both drivers are generic over [`i2r_platform::PlatformApi`] and never
//! abort on a single entity's failure; see [`error`] for what does abort.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod entity;
pub mod error;
pub mod projects;
pub mod rewrite;
pub mod summary;

pub use entity::EntityMigrator;
pub use error::MigrateError;
pub use projects::resolve_projects;
pub use rewrite::{ManifestRewriter, RewriteReport};
pub use summary::{log_outcome, log_rewrite};
