//! Core types, policy, and pure rules for the inline-to-remote migration tool.
//!
//! This crate provides the foundational pieces shared across the workspace:
//!
//! - Error types for configuration and path derivation
//! - The immutable [`MigrationPolicy`] built once at startup
//! - Domain types (`Project`, `Scope`, `Entity`, `FileStoreEntry`, `MigrationOutcome`)
//! - The [`scope`] resolver that decides which projects and services are in scope
//! - The [`paths`] deriver that computes canonical remote file locations
//!
//! Nothing in this crate performs I/O other than reading the configuration
//! document in [`ConfigFile::load`].

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod paths;
pub mod scope;
pub mod types;

pub use config::{
    ApiKey, ConfigFile, FileStoreConfig, GitPublishDetails, GitTarget, KindSelection,
    MigrationPolicy, NamingPolicy, ServiceSelector,
};
pub use error::{ConfigError, PathError};
pub use paths::derive_path;
pub use scope::{ProjectFilter, ServiceFilter};
pub use types::{
    Connector, ConnectorSpec, Entity, EntityKind, EntityState, Environment, EnvironmentType,
    FileStoreEntry, InputSet, Infrastructure, KindOutcome, MigrationOutcome, Organization,
    OverrideScope, OverrideV2, Pipeline, Project, Scope, Service, ServiceOverride, StoreType,
    Template,
};
