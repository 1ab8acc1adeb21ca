//! Typed manifest documents and the file store rewrite rule.
//!
//! Services, service overrides (v1), and overrides (v2) all carry a list of
//! manifest entries whose store may point at the platform's internal file
//! store. After the file store has been mirrored into git, [`rewrite_manifests`]
//! repoints those entries at the published paths.
//!
//! # Module Organization
//!
//! - [`document`] - The manifest tree and the three documents that embed it
//! - [`rewrite`] - The pure rewrite rule
//! - [`error`] - Parse and serialization errors
//!
//! Every node keeps the fields this crate does not model in a flattened
//! remainder map, so a parse/serialize round trip never drops data.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod document;
pub mod error;
pub mod rewrite;

pub use document::{
    Manifest, ManifestEntry, ManifestList, ManifestSpec, OverrideV2Spec, ServiceDocument,
    ServiceOverrideDocument, Store, StoreSpec,
};
pub use error::ManifestError;
pub use rewrite::{
    map_reference, normalize_store_type, rewrite_manifests, RewriteSummary, RewriteTarget,
    INTERNAL_STORE,
};
