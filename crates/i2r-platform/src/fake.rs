//! In-memory [`PlatformApi`] for driver tests.
//!
//! Entities are seeded per project; a successful move flips the stored
//! entity to `REMOTE`, so a second pass over the same fake sees what a
//! second run against the real platform would see.

use async_trait::async_trait;
use i2r_core::{
    Connector, Entity, EntityKind, Environment, FileStoreEntry, GitTarget, InputSet,
    Infrastructure, Organization, OverrideScope, OverrideV2, Pipeline, Project, Scope, Service,
    ServiceOverride, StoreType, Template,
};
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::api::{PlatformApi, PlatformResult};
use crate::error::{ErrorEnvelope, PlatformError};

/// A move the fake accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedMove {
    /// Kind of the moved entity.
    pub kind: EntityKind,
    /// Identifier of the moved entity.
    pub identifier: String,
    /// Path the entity was written to.
    pub file_path: String,
}

/// Everything the fake knows. Edit it through [`FakePlatform::edit`].
#[derive(Debug, Default)]
pub struct FakeState {
    /// Projects returned by `list_projects`.
    pub projects: Vec<Project>,
    /// Organizations returned by `list_organizations`.
    pub organizations: Vec<Organization>,
    /// Pipelines keyed by project identifier.
    pub pipelines: FxHashMap<String, Vec<Pipeline>>,
    /// Input sets keyed by (project, pipeline).
    pub input_sets: FxHashMap<(String, String), Vec<InputSet>>,
    /// Templates keyed by project identifier.
    pub templates: FxHashMap<String, Vec<Template>>,
    /// Services keyed by project identifier.
    pub services: FxHashMap<String, Vec<Service>>,
    /// Environments keyed by the scope they are defined at.
    pub environments: FxHashMap<Scope, Vec<Environment>>,
    /// Infrastructure keyed by (project, environment).
    pub infrastructures: FxHashMap<(String, String), Vec<Infrastructure>>,
    /// Overrides (v2) keyed by project identifier, all scopes mixed.
    pub overrides_v2: FxHashMap<String, Vec<OverrideV2>>,
    /// Service overrides (v1) keyed by environment identifier.
    pub service_overrides: FxHashMap<String, Vec<ServiceOverride>>,
    /// Connectors keyed by bare identifier.
    pub connectors: FxHashMap<String, Connector>,
    /// File store entries keyed by scope.
    pub files: FxHashMap<Scope, Vec<FileStoreEntry>>,
    /// File contents keyed by entry identifier.
    pub contents: FxHashMap<String, Vec<u8>>,
    /// Moves that fail with the given envelope, keyed by identifier.
    pub move_failures: FxHashMap<String, ErrorEnvelope>,
    /// Update calls that fail, keyed by identifier.
    pub update_failures: FxHashSet<String>,
    /// Listing calls that fail, by method name (`"list_pipelines"`, ...).
    pub failing_listings: FxHashSet<&'static str>,
    /// Accepted moves, in call order.
    pub moves: Vec<RecordedMove>,
    /// Services passed to `update_service`.
    pub updated_services: Vec<Service>,
    /// Overrides passed to `update_service_override`.
    pub updated_service_overrides: Vec<ServiceOverride>,
    /// Overrides passed to `update_override_v2`.
    pub updated_overrides_v2: Vec<OverrideV2>,
    /// Identifiers passed to `download_file`.
    pub downloads: Vec<String>,
    /// Number of `get_connector` calls.
    pub connector_lookups: usize,
}

/// In-memory [`PlatformApi`].
#[derive(Debug, Default)]
pub struct FakePlatform {
    state: Mutex<FakeState>,
}

impl FakePlatform {
    /// Creates an empty fake.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutates the fake's state.
    pub fn edit(&self, f: impl FnOnce(&mut FakeState)) {
        f(&mut self.state.lock());
    }

    /// Reads from the fake's state.
    pub fn inspect<R>(&self, f: impl FnOnce(&FakeState) -> R) -> R {
        f(&self.state.lock())
    }

    /// Returns the accepted moves.
    #[must_use]
    pub fn moves(&self) -> Vec<RecordedMove> {
        self.state.lock().moves.clone()
    }

    fn listing<T: Clone>(
        &self,
        name: &'static str,
        read: impl FnOnce(&FakeState) -> Option<&Vec<T>>,
    ) -> PlatformResult<Vec<T>> {
        let state = self.state.lock();
        if state.failing_listings.contains(name) {
            return Err(PlatformError::api(
                name,
                500,
                ErrorEnvelope::single("UNEXPECTED", "listing unavailable"),
            ));
        }
        Ok(read(&state).cloned().unwrap_or_default())
    }

    fn update(&self, identifier: &str, record: impl FnOnce(&mut FakeState)) -> PlatformResult<()> {
        let mut state = self.state.lock();
        if state.update_failures.contains(identifier) {
            return Err(PlatformError::api(
                identifier,
                400,
                ErrorEnvelope::single("INVALID_REQUEST", "update rejected"),
            ));
        }
        record(&mut state);
        Ok(())
    }
}

fn mark_remote<T>(
    items: Option<&mut Vec<T>>,
    matches: impl Fn(&T) -> bool,
    store: impl Fn(&mut T) -> &mut StoreType,
) {
    for item in items.into_iter().flatten().filter(|i| matches(i)) {
        *store(item) = StoreType::Remote;
    }
}

impl FakeState {
    fn mark_moved(&mut self, entity: &Entity, project: &Project) {
        let key = project.identifier.clone();
        let id = entity.identifier().to_owned();
        match entity {
            Entity::Pipeline(_) => mark_remote(
                self.pipelines.get_mut(&key),
                |p| p.identifier == id,
                |p| &mut p.store_type,
            ),
            Entity::InputSet(is) => mark_remote(
                self.input_sets
                    .get_mut(&(key, is.pipeline_identifier.clone())),
                |i| i.identifier == id,
                |i| &mut i.store_type,
            ),
            Entity::Template(t) => mark_remote(
                self.templates.get_mut(&key),
                |x| x.identifier == id && x.version_label == t.version_label,
                |x| &mut x.store_type,
            ),
            Entity::Service(_) => mark_remote(
                self.services.get_mut(&key),
                |s| s.identifier == id,
                |s| &mut s.store_type,
            ),
            Entity::Environment(_) => mark_remote(
                self.environments.get_mut(&project.scope()),
                |e| e.identifier == id,
                |e| &mut e.store_type,
            ),
            Entity::Infrastructure(infra) => mark_remote(
                self.infrastructures
                    .get_mut(&(key, infra.environment_ref.clone())),
                |i| i.identifier == id,
                |i| &mut i.store_type,
            ),
            Entity::OverrideV2(_) => mark_remote(
                self.overrides_v2.get_mut(&key),
                |o| o.identifier == id,
                |o| &mut o.store_type,
            ),
        }
    }
}

#[async_trait]
impl PlatformApi for FakePlatform {
    async fn list_projects(&self) -> PlatformResult<Vec<Project>> {
        self.listing("list_projects", |s| Some(&s.projects))
    }

    async fn list_organizations(&self) -> PlatformResult<Vec<Organization>> {
        self.listing("list_organizations", |s| Some(&s.organizations))
    }

    async fn list_pipelines(&self, project: &Project) -> PlatformResult<Vec<Pipeline>> {
        self.listing("list_pipelines", |s| s.pipelines.get(&project.identifier))
    }

    async fn list_input_sets(
        &self,
        project: &Project,
        pipeline: &str,
    ) -> PlatformResult<Vec<InputSet>> {
        let key = (project.identifier.clone(), pipeline.to_owned());
        self.listing("list_input_sets", |s| s.input_sets.get(&key))
    }

    async fn list_templates(&self, project: &Project) -> PlatformResult<Vec<Template>> {
        self.listing("list_templates", |s| s.templates.get(&project.identifier))
    }

    async fn list_services(&self, project: &Project) -> PlatformResult<Vec<Service>> {
        self.listing("list_services", |s| s.services.get(&project.identifier))
    }

    async fn list_environments(&self, scope: &Scope) -> PlatformResult<Vec<Environment>> {
        self.listing("list_environments", |s| s.environments.get(scope))
    }

    async fn list_infrastructures(
        &self,
        project: &Project,
        environment: &str,
    ) -> PlatformResult<Vec<Infrastructure>> {
        let key = (project.identifier.clone(), environment.to_owned());
        self.listing("list_infrastructures", |s| s.infrastructures.get(&key))
    }

    async fn list_overrides_v2(
        &self,
        project: &Project,
        scope: &OverrideScope,
    ) -> PlatformResult<Vec<OverrideV2>> {
        let all = self.listing("list_overrides_v2", |s| {
            s.overrides_v2.get(&project.identifier)
        })?;
        Ok(all.into_iter().filter(|o| &o.scope == scope).collect())
    }

    async fn list_service_overrides(
        &self,
        environment: &Environment,
    ) -> PlatformResult<Vec<ServiceOverride>> {
        self.listing("list_service_overrides", |s| {
            s.service_overrides.get(&environment.identifier)
        })
    }

    async fn move_to_remote(
        &self,
        entity: &Entity,
        project: &Project,
        target: &GitTarget<'_>,
    ) -> PlatformResult<()> {
        let mut state = self.state.lock();
        if let Some(envelope) = state.move_failures.get(entity.identifier()) {
            return Err(PlatformError::api("move-config", 400, envelope.clone()));
        }
        state.mark_moved(entity, project);
        state.moves.push(RecordedMove {
            kind: entity.kind(),
            identifier: entity.identifier().to_owned(),
            file_path: target.file_path.clone(),
        });
        Ok(())
    }

    async fn update_service(&self, service: &Service) -> PlatformResult<()> {
        self.update(&service.identifier, |s| {
            s.updated_services.push(service.clone());
        })
    }

    async fn update_service_override(
        &self,
        service_override: &ServiceOverride,
    ) -> PlatformResult<()> {
        self.update(&service_override.service_ref, |s| {
            s.updated_service_overrides.push(service_override.clone());
        })
    }

    async fn update_override_v2(&self, override_v2: &OverrideV2) -> PlatformResult<()> {
        self.update(&override_v2.identifier, |s| {
            s.updated_overrides_v2.push(override_v2.clone());
        })
    }

    async fn get_connector(&self, _scope: &Scope, reference: &str) -> PlatformResult<Connector> {
        let mut state = self.state.lock();
        state.connector_lookups += 1;
        let identifier = reference
            .split_once('.')
            .map_or(reference, |(_, identifier)| identifier);
        state
            .connectors
            .get(identifier)
            .cloned()
            .ok_or_else(|| PlatformError::InvalidConnector(reference.to_owned()))
    }

    async fn list_file_store(&self, scope: &Scope) -> PlatformResult<Vec<FileStoreEntry>> {
        self.listing("list_file_store", |s| s.files.get(scope))
    }

    async fn download_file(&self, entry: &FileStoreEntry) -> PlatformResult<Vec<u8>> {
        let mut state = self.state.lock();
        state.downloads.push(entry.identifier.clone());
        state.contents.get(&entry.identifier).cloned().ok_or_else(|| {
            PlatformError::api(
                "download",
                404,
                ErrorEnvelope::single("RESOURCE_NOT_FOUND", "file not found"),
            )
        })
    }
}
