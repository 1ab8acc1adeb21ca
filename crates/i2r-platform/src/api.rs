//! The platform REST contract the migration engine depends on.

use async_trait::async_trait;
use i2r_core::{
    Connector, Entity, Environment, FileStoreEntry, GitTarget, InputSet, Infrastructure,
    Organization, OverrideScope, OverrideV2, Pipeline, Project, Scope, Service, ServiceOverride,
    Template,
};

use crate::error::PlatformError;

/// Result type for platform calls.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Everything the engine asks of the platform.
///
/// Listing calls return the full first page the platform serves (page
/// sizes are set high enough for realistic accounts). Mutating calls
/// return `Ok(())` on any 2xx response.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Lists every project in the account.
    async fn list_projects(&self) -> PlatformResult<Vec<Project>>;

    /// Lists every organization in the account.
    async fn list_organizations(&self) -> PlatformResult<Vec<Organization>>;

    /// Lists the pipelines of `project`.
    async fn list_pipelines(&self, project: &Project) -> PlatformResult<Vec<Pipeline>>;

    /// Lists the input sets of one pipeline.
    async fn list_input_sets(
        &self,
        project: &Project,
        pipeline: &str,
    ) -> PlatformResult<Vec<InputSet>>;

    /// Lists every template version in `project`.
    async fn list_templates(&self, project: &Project) -> PlatformResult<Vec<Template>>;

    /// Lists the services of `project`, including their YAML.
    async fn list_services(&self, project: &Project) -> PlatformResult<Vec<Service>>;

    /// Lists the environments defined at exactly `scope`.
    async fn list_environments(&self, scope: &Scope) -> PlatformResult<Vec<Environment>>;

    /// Lists the infrastructure definitions of one environment.
    async fn list_infrastructures(
        &self,
        project: &Project,
        environment: &str,
    ) -> PlatformResult<Vec<Infrastructure>>;

    /// Lists the overrides (v2) of one scope type in `project`.
    async fn list_overrides_v2(
        &self,
        project: &Project,
        scope: &OverrideScope,
    ) -> PlatformResult<Vec<OverrideV2>>;

    /// Lists the service overrides (v1) attached to `environment`.
    async fn list_service_overrides(
        &self,
        environment: &Environment,
    ) -> PlatformResult<Vec<ServiceOverride>>;

    /// Moves an inline entity of `project` to `target`.
    async fn move_to_remote(
        &self,
        entity: &Entity,
        project: &Project,
        target: &GitTarget<'_>,
    ) -> PlatformResult<()>;

    /// Replaces a service definition.
    async fn update_service(&self, service: &Service) -> PlatformResult<()>;

    /// Replaces a service override (v1).
    async fn update_service_override(&self, service_override: &ServiceOverride)
    -> PlatformResult<()>;

    /// Replaces an override (v2).
    async fn update_override_v2(&self, override_v2: &OverrideV2) -> PlatformResult<()>;

    /// Looks up a connector visible from `scope`.
    ///
    /// `reference` may carry an `org.`/`account.` prefix.
    async fn get_connector(&self, scope: &Scope, reference: &str) -> PlatformResult<Connector>;

    /// Lists the file store entries stored at exactly `scope`.
    async fn list_file_store(&self, scope: &Scope) -> PlatformResult<Vec<FileStoreEntry>>;

    /// Downloads one file store entry.
    async fn download_file(&self, entry: &FileStoreEntry) -> PlatformResult<Vec<u8>>;
}
