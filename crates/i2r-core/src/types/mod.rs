//! Domain types for the inline-to-remote migration tool.
//!
//! # Module Organization
//!
//! - [`project`] - Projects, organizations, and the explicit [`Scope`] enum
//! - [`store`] - The inline/remote [`StoreType`] marker
//! - [`entity`] - Entity records and the closed [`Entity`] variant set
//! - [`filestore`] - File store entries
//! - [`connector`] - Git connectors registered on the platform
//! - [`outcome`] - Per-kind migration outcomes
//!
//! All public types are re-exported at this module level and at the crate
//! root:
//!
//! ```
//! use i2r_core::{Entity, EntityKind, Project, Scope, StoreType};
//! ```

mod connector;
mod entity;
mod filestore;
mod outcome;
mod project;
mod store;

pub use connector::{Connector, ConnectorSpec};
pub use entity::{
    Entity, EntityKind, Environment, EnvironmentType, InputSet, Infrastructure, OverrideScope,
    OverrideV2, Pipeline, Service, ServiceOverride, Template,
};
pub use filestore::FileStoreEntry;
pub use outcome::{EntityState, KindOutcome, MigrationOutcome};
pub use project::{Organization, Project, Scope};
pub use store::StoreType;
