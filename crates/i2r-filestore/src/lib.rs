//! File store mirroring for the inline-to-remote migration.
//!
//! The file store is migrated in two strictly ordered phases:
//!
//! 1. [`FileStoreDownloader`] copies every file store entry of the account,
//!    its organizations, and the in-scope projects into a staging tree.
//! 2. [`GitPublisher`] turns the staging directory into a git repository
//!    and pushes it to the publish branch, tolerating the benign outcomes
//!    listed in [`GIT_STEPS`] so a second run is a no-op.
//!
//! Manifests are rewritten to point at the pushed paths only after both
//! phases complete.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod download;
pub mod error;
pub mod git;
pub mod publish;

pub use download::{DownloadReport, FailedFile, FileStoreDownloader, MIRROR_DIR};
pub use error::FileStoreError;
pub use git::{GIT_STEPS, GitOutput, GitRunner, GitStep, StepOutcome, StepSpec, SystemGit};
pub use publish::{GitPublisher, PUBLISH_COMMIT_MESSAGE, PublishReport, resolve_remote_url};
