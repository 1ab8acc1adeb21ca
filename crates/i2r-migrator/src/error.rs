//! Error types for the i2r-migrator crate.
//!
//! Everything here aborts the run. Per-entity failures (a rejected move, a
//! document that cannot be re-serialized, a rejected update) are not
//! errors: they are recorded in the outcome and the driver moves on.

use i2r_core::{EntityKind, PathError};
use i2r_platform::PlatformError;

/// Errors that stop a migration or rewrite pass.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// A listing call the pass depends on failed.
    #[error("failed to list {what} in {scope}: {source}")]
    Listing {
        /// What was being listed.
        what: String,
        /// Scope label.
        scope: String,
        /// Platform failure.
        #[source]
        source: PlatformError,
    },

    /// A path could not be derived for an entity.
    #[error("cannot derive path for {kind} '{entity}': {source}")]
    Path {
        /// Entity kind.
        kind: EntityKind,
        /// Entity identifier.
        entity: String,
        /// Derivation failure.
        #[source]
        source: PathError,
    },

    /// The connector the rewritten manifests point at could not be fetched.
    #[error("failed to look up connector '{reference}': {source}")]
    Connector {
        /// Connector reference.
        reference: String,
        /// Platform failure.
        #[source]
        source: PlatformError,
    },
}

impl MigrateError {
    /// Creates a new [`MigrateError::Listing`] error.
    #[inline]
    pub fn listing(what: impl Into<String>, scope: impl Into<String>, source: PlatformError) -> Self {
        Self::Listing {
            what: what.into(),
            scope: scope.into(),
            source,
        }
    }
}
