//! Error types for the i2r-filestore crate.
//!
//! # Error Recovery Strategy
//!
//! - **Listing** ([`FileStoreError::Listing`]): Fatal for the account and
//!   the organization list; recorded and skipped for a single org/project
//! - **Download / write** ([`FileStoreError::Download`],
//!   [`FileStoreError::Io`], [`FileStoreError::UnsafePath`]): Recoverable -
//!   recorded per file, the phase continues
//! - **Git** ([`FileStoreError::Git`], [`FileStoreError::Spawn`]): Fatal -
//!   the publish phase stops at the failing step
//! - **Remote** ([`FileStoreError::Remote`]): Fatal - nothing can be pushed

use camino::Utf8PathBuf;
use i2r_platform::PlatformError;

use crate::git::GitStep;

/// Errors raised while mirroring or publishing the file store.
#[derive(Debug, thiserror::Error)]
pub enum FileStoreError {
    /// A file store listing call failed.
    #[error("failed to list file store at {scope}: {source}")]
    Listing {
        /// Scope label.
        scope: String,
        /// Platform failure.
        #[source]
        source: PlatformError,
    },

    /// A file could not be downloaded.
    #[error("failed to download {path}: {source}")]
    Download {
        /// File store path of the entry.
        path: String,
        /// Platform failure.
        #[source]
        source: PlatformError,
    },

    /// A file store path would escape the staging tree.
    #[error("refusing to write outside the staging tree: {0}")]
    UnsafePath(String),

    /// The staging tree could not be written.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being written.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The remote repository URL could not be resolved.
    #[error("cannot resolve publish remote: {0}")]
    Remote(String),

    /// The connector backing the publish remote could not be fetched.
    #[error("failed to look up connector '{reference}': {source}")]
    Connector {
        /// Connector reference.
        reference: String,
        /// Platform failure.
        #[source]
        source: PlatformError,
    },

    /// `git` could not be started.
    #[error("failed to run git {step}: {source}")]
    Spawn {
        /// The step being run.
        step: GitStep,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A git step failed with an output that is not a benign outcome.
    #[error("git {step} failed: {output}")]
    Git {
        /// The failing step.
        step: GitStep,
        /// Combined stdout and stderr.
        output: String,
    },
}

impl FileStoreError {
    /// Creates a new [`FileStoreError::Io`] error.
    #[inline]
    pub fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if the phase can continue past this error.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Download { .. } | Self::UnsafePath(_) | Self::Io { .. }
        )
    }

    /// Returns `true` if this error stops the phase.
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }
}
