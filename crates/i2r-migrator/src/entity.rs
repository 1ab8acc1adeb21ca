//! The move-to-remote driver.
//!
//! One loop serves every entity kind: projects in resolved order on the
//! outside, selected kinds in [`EntityKind::ALL`] order inside. Each entity
//! goes `Discovered -> AlreadyRemote` when the platform already reports it
//! as remote, otherwise `Discovered -> MovePending -> Moved | Failed`.

use i2r_core::{
    Entity, EntityKind, EntityState, Environment, MigrationOutcome, MigrationPolicy, OverrideScope,
    Project, derive_path,
};
use i2r_platform::PlatformApi;
use tracing::Instrument;

use crate::error::MigrateError;

/// Moves inline entities to git, one project and one kind at a time.
#[derive(Debug)]
pub struct EntityMigrator<'a, P: ?Sized> {
    platform: &'a P,
    policy: &'a MigrationPolicy,
}

impl<'a, P: PlatformApi + ?Sized> EntityMigrator<'a, P> {
    /// Creates a migrator.
    pub fn new(platform: &'a P, policy: &'a MigrationPolicy) -> Self {
        Self { platform, policy }
    }

    /// Runs every selected kind over `projects`.
    ///
    /// # Errors
    ///
    /// Any listing failure, or an entity whose path cannot be derived,
    /// aborts the pass. Rejected moves are recorded in the outcome.
    pub async fn run(&self, projects: &[Project]) -> Result<MigrationOutcome, MigrateError> {
        let mut outcome = MigrationOutcome::new();
        for kind in self.policy.kinds.kinds() {
            outcome.kind_mut(kind);
        }
        for project in projects {
            let span = tracing::info_span!(
                "project",
                project = %project.identifier,
                org = %project.org_identifier
            );
            self.run_project(project, &mut outcome).instrument(span).await?;
        }
        Ok(outcome)
    }

    async fn run_project(
        &self,
        project: &Project,
        outcome: &mut MigrationOutcome,
    ) -> Result<(), MigrateError> {
        for kind in self.policy.kinds.kinds() {
            let entities = self.discover(kind, project).await?;
            tracing::info!(%kind, count = entities.len(), "discovered entities");
            for entity in entities {
                let state = self.migrate(&entity, project).await?;
                outcome.kind_mut(kind).record(entity.display_name(), state);
            }
        }
        Ok(())
    }

    /// Moves one entity, unless it is already remote.
    ///
    /// # Errors
    ///
    /// Only path derivation failures are errors; a rejected move yields
    /// [`EntityState::Failed`].
    pub async fn migrate(
        &self,
        entity: &Entity,
        project: &Project,
    ) -> Result<EntityState, MigrateError> {
        let kind = entity.kind();
        let name = entity.display_name();
        if entity.store_type().is_remote() {
            tracing::info!(%kind, entity = %name, project = %project.identifier, "already remote");
            return Ok(EntityState::AlreadyRemote);
        }

        let path = derive_path(entity, &self.policy.naming, project).map_err(|source| {
            MigrateError::Path {
                kind,
                entity: entity.identifier().to_owned(),
                source,
            }
        })?;
        let target = self.policy.git.target(path);

        match self.platform.move_to_remote(entity, project, &target).await {
            Ok(()) => {
                tracing::info!(
                    %kind,
                    entity = %name,
                    project = %project.identifier,
                    path = %target.file_path,
                    "moved to remote"
                );
                Ok(EntityState::Moved)
            }
            Err(err) if kind == EntityKind::Service && err.is_already_remote() => {
                tracing::info!(%kind, entity = %name, project = %project.identifier, "already remote");
                Ok(EntityState::AlreadyRemote)
            }
            Err(err) => {
                tracing::error!(
                    %kind,
                    entity = %name,
                    project = %project.identifier,
                    path = %target.file_path,
                    error = %err,
                    "move failed"
                );
                Ok(EntityState::Failed)
            }
        }
    }

    /// Lists the entities of `kind` in `project`.
    ///
    /// Input sets are only listed for remote pipelines, infrastructure
    /// only for remote environments.
    pub async fn discover(
        &self,
        kind: EntityKind,
        project: &Project,
    ) -> Result<Vec<Entity>, MigrateError> {
        let scope = project.scope().label();
        let listing = |what: &str| {
            let scope = scope.clone();
            let what = what.to_owned();
            move |source| MigrateError::listing(what, scope, source)
        };

        let entities: Vec<Entity> = match kind {
            EntityKind::Pipeline => self
                .platform
                .list_pipelines(project)
                .await
                .map_err(listing("pipelines"))?
                .into_iter()
                .map(Entity::Pipeline)
                .collect(),
            EntityKind::InputSet => {
                let pipelines = self
                    .platform
                    .list_pipelines(project)
                    .await
                    .map_err(listing("pipelines"))?;
                let mut entities = Vec::new();
                for pipeline in pipelines.iter().filter(|p| p.store_type.is_remote()) {
                    let input_sets = self
                        .platform
                        .list_input_sets(project, &pipeline.identifier)
                        .await
                        .map_err(listing(&format!("input sets of {}", pipeline.identifier)))?;
                    entities.extend(input_sets.into_iter().map(|mut input_set| {
                        if input_set.pipeline_identifier.is_empty() {
                            input_set.pipeline_identifier.clone_from(&pipeline.identifier);
                        }
                        Entity::InputSet(input_set)
                    }));
                }
                entities
            }
            EntityKind::Template => self
                .platform
                .list_templates(project)
                .await
                .map_err(listing("templates"))?
                .into_iter()
                .map(Entity::Template)
                .collect(),
            EntityKind::Service => self
                .platform
                .list_services(project)
                .await
                .map_err(listing("services"))?
                .into_iter()
                .map(Entity::Service)
                .collect(),
            EntityKind::Environment => self
                .project_environments(project)
                .await?
                .into_iter()
                .map(Entity::Environment)
                .collect(),
            EntityKind::Infrastructure => {
                let environments = self.project_environments(project).await?;
                let mut entities = Vec::new();
                for environment in environments.iter().filter(|e| e.store_type.is_remote()) {
                    let infras = self
                        .platform
                        .list_infrastructures(project, &environment.identifier)
                        .await
                        .map_err(listing(&format!(
                            "infrastructure of {}",
                            environment.identifier
                        )))?;
                    entities.extend(infras.into_iter().map(|mut infra| {
                        if infra.environment_ref.is_empty() {
                            infra.environment_ref.clone_from(&environment.identifier);
                        }
                        infra.environment_type = environment.environment_type.clone();
                        Entity::Infrastructure(infra)
                    }));
                }
                entities
            }
            EntityKind::OverrideV2 => {
                let mut entities = Vec::new();
                for override_scope in &OverrideScope::KNOWN {
                    let overrides = self
                        .platform
                        .list_overrides_v2(project, override_scope)
                        .await
                        .map_err(listing(&format!("{override_scope} overrides")))?;
                    entities.extend(overrides.into_iter().map(Entity::OverrideV2));
                }
                entities
            }
        };
        Ok(entities)
    }

    async fn project_environments(
        &self,
        project: &Project,
    ) -> Result<Vec<Environment>, MigrateError> {
        let scope = project.scope();
        self.platform
            .list_environments(&scope)
            .await
            .map_err(|source| MigrateError::listing("environments", scope.label(), source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{PROJECT, policy};
    use i2r_core::{
        EnvironmentType, InputSet, Infrastructure, KindSelection, OverrideV2, Pipeline, Service,
        StoreType, Template,
    };
    use i2r_platform::ErrorEnvelope;
    use i2r_platform::fake::FakePlatform;

    fn project() -> Project {
        Project::new("orgId", PROJECT, "Project One")
    }

    fn pipeline(id: &str, store_type: StoreType) -> Pipeline {
        Pipeline {
            identifier: id.to_owned(),
            name: String::new(),
            store_type,
        }
    }

    fn service(id: &str) -> Service {
        Service {
            identifier: id.to_owned(),
            name: id.to_owned(),
            org: "orgId".to_owned(),
            project: PROJECT.to_owned(),
            description: None,
            tags: None,
            yaml: String::new(),
            store_type: StoreType::Inline,
        }
    }

    fn only(kinds: KindSelection) -> MigrationPolicy {
        let mut policy = policy();
        policy.kinds = kinds;
        policy
    }

    #[tokio::test]
    async fn test_single_pipeline_end_to_end() {
        let fake = FakePlatform::new();
        fake.edit(|s| {
            s.pipelines
                .insert(PROJECT.to_owned(), vec![pipeline("pipe1", StoreType::Inline)]);
        });
        let policy = only(KindSelection {
            pipelines: true,
            ..KindSelection::default()
        });

        let outcome = EntityMigrator::new(&fake, &policy)
            .run(&[project()])
            .await
            .unwrap();

        let pipelines = outcome.get(EntityKind::Pipeline).unwrap();
        assert_eq!(pipelines.processed, 1);
        assert!(pipelines.failed.is_empty());
        let moves = fake.moves();
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].file_path, "pipelines/orgId/P1/pipe1.yaml");
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let fake = FakePlatform::new();
        fake.edit(|s| {
            s.pipelines.insert(
                PROJECT.to_owned(),
                vec![
                    pipeline("a", StoreType::Inline),
                    pipeline("b", StoreType::Remote),
                ],
            );
        });
        let policy = only(KindSelection {
            pipelines: true,
            ..KindSelection::default()
        });
        let migrator = EntityMigrator::new(&fake, &policy);

        let first = migrator.run(&[project()]).await.unwrap();
        assert_eq!(first.get(EntityKind::Pipeline).unwrap().moved, vec!["a"]);

        let second = migrator.run(&[project()]).await.unwrap();
        let pipelines = second.get(EntityKind::Pipeline).unwrap();
        assert!(pipelines.moved.is_empty());
        assert_eq!(pipelines.already_remote, vec!["a", "b"]);
        assert_eq!(fake.moves().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_move_is_recorded_and_run_continues() {
        let fake = FakePlatform::new();
        fake.edit(|s| {
            s.pipelines.insert(
                PROJECT.to_owned(),
                vec![
                    pipeline("bad", StoreType::Inline),
                    pipeline("good", StoreType::Inline),
                ],
            );
            s.move_failures.insert(
                "bad".to_owned(),
                ErrorEnvelope::single("INVALID_REQUEST", "connector not found"),
            );
        });
        let policy = only(KindSelection {
            pipelines: true,
            ..KindSelection::default()
        });
        let outcome = EntityMigrator::new(&fake, &policy)
            .run(&[project()])
            .await
            .unwrap();
        let pipelines = outcome.get(EntityKind::Pipeline).unwrap();
        assert_eq!(pipelines.failed, vec!["bad"]);
        assert_eq!(pipelines.moved, vec!["good"]);
        assert_eq!(outcome.failed_count(), 1);
    }

    #[tokio::test]
    async fn test_service_already_remote_is_reclassified() {
        let fake = FakePlatform::new();
        fake.edit(|s| {
            s.services
                .insert(PROJECT.to_owned(), vec![service("web"), service("api")]);
            s.move_failures.insert(
                "web".to_owned(),
                ErrorEnvelope::single("INVALID_REQUEST", "Service [web] is already remote"),
            );
            s.move_failures.insert(
                "api".to_owned(),
                ErrorEnvelope::single("INVALID_REQUEST", "Git connector unreachable"),
            );
        });
        let policy = only(KindSelection {
            services: true,
            ..KindSelection::default()
        });
        let outcome = EntityMigrator::new(&fake, &policy)
            .run(&[project()])
            .await
            .unwrap();
        let services = outcome.get(EntityKind::Service).unwrap();
        assert_eq!(services.already_remote, vec!["web"]);
        assert_eq!(services.failed, vec!["api"]);
    }

    #[tokio::test]
    async fn test_already_remote_message_is_not_reclassified_for_other_kinds() {
        let fake = FakePlatform::new();
        fake.edit(|s| {
            s.pipelines
                .insert(PROJECT.to_owned(), vec![pipeline("p", StoreType::Inline)]);
            s.move_failures.insert(
                "p".to_owned(),
                ErrorEnvelope::single("INVALID_REQUEST", "Pipeline p is already remote"),
            );
        });
        let policy = only(KindSelection {
            pipelines: true,
            ..KindSelection::default()
        });
        let outcome = EntityMigrator::new(&fake, &policy)
            .run(&[project()])
            .await
            .unwrap();
        assert_eq!(outcome.get(EntityKind::Pipeline).unwrap().failed, vec!["p"]);
    }

    #[tokio::test]
    async fn test_input_sets_only_for_remote_pipelines() {
        let fake = FakePlatform::new();
        let input_set = |id: &str| InputSet {
            identifier: id.to_owned(),
            name: String::new(),
            pipeline_identifier: String::new(),
            store_type: StoreType::Inline,
        };
        fake.edit(|s| {
            s.pipelines.insert(
                PROJECT.to_owned(),
                vec![
                    pipeline("remote", StoreType::Remote),
                    pipeline("inline", StoreType::Inline),
                ],
            );
            s.input_sets.insert(
                (PROJECT.to_owned(), "remote".to_owned()),
                vec![input_set("is1")],
            );
            s.input_sets.insert(
                (PROJECT.to_owned(), "inline".to_owned()),
                vec![input_set("is2")],
            );
        });
        let mut policy = only(KindSelection {
            input_sets: true,
            ..KindSelection::default()
        });
        policy.naming.git_experience = true;

        EntityMigrator::new(&fake, &policy)
            .run(&[project()])
            .await
            .unwrap();
        let moves = fake.moves();
        assert_eq!(moves.len(), 1);
        insta::assert_snapshot!(
            moves[0].file_path,
            @".harness/orgs/orgId/projects/P1/pipelines/remote/input_sets/is1.yaml"
        );
    }

    #[tokio::test]
    async fn test_infrastructure_inherits_environment_type() {
        let fake = FakePlatform::new();
        let project = project();
        fake.edit(|s| {
            s.environments.insert(
                project.scope(),
                vec![Environment {
                    identifier: "envId".to_owned(),
                    name: "Staging".to_owned(),
                    org_identifier: Some("orgId".to_owned()),
                    project_identifier: Some(PROJECT.to_owned()),
                    environment_type: EnvironmentType::PreProduction,
                    store_type: StoreType::Remote,
                }],
            );
            s.infrastructures.insert(
                (PROJECT.to_owned(), "envId".to_owned()),
                vec![Infrastructure {
                    identifier: "infraId".to_owned(),
                    name: String::new(),
                    environment_ref: String::new(),
                    store_type: StoreType::Inline,
                    environment_type: EnvironmentType::default(),
                }],
            );
        });
        let mut policy = only(KindSelection {
            environments: true,
            infrastructure: true,
            ..KindSelection::default()
        });
        policy.naming.git_experience = true;

        let outcome = EntityMigrator::new(&fake, &policy)
            .run(std::slice::from_ref(&project))
            .await
            .unwrap();
        assert_eq!(
            outcome.get(EntityKind::Environment).unwrap().already_remote,
            vec!["Staging"]
        );
        insta::assert_snapshot!(
            fake.moves()[0].file_path,
            @".harness/orgs/orgId/projects/P1/envs/pre_production/envId/infras/infraId.yaml"
        );
    }

    #[tokio::test]
    async fn test_overrides_listed_per_scope_type() {
        let fake = FakePlatform::new();
        let ov = |id: &str, scope: OverrideScope, service: Option<&str>| OverrideV2 {
            identifier: id.to_owned(),
            org_identifier: Some("orgId".to_owned()),
            project_identifier: Some(PROJECT.to_owned()),
            environment_ref: "prod".to_owned(),
            service_ref: service.map(str::to_owned),
            infra_identifier: None,
            scope,
            store_type: StoreType::Inline,
            yaml: None,
            spec: None,
        };
        fake.edit(|s| {
            s.overrides_v2.insert(
                PROJECT.to_owned(),
                vec![
                    ov("svc", OverrideScope::EnvService, Some("web")),
                    ov("global", OverrideScope::EnvGlobal, None),
                ],
            );
        });
        let mut policy = only(KindSelection {
            overrides_v2: true,
            ..KindSelection::default()
        });
        policy.naming.git_experience = true;

        EntityMigrator::new(&fake, &policy)
            .run(&[project()])
            .await
            .unwrap();
        let paths: Vec<_> = fake.moves().into_iter().map(|m| m.file_path).collect();
        assert_eq!(
            paths,
            vec![
                ".harness/orgs/orgId/projects/P1/overrides/prod/overrides.yaml",
                ".harness/orgs/orgId/projects/P1/overrides/prod/services/web/overrides.yaml",
            ]
        );
    }

    #[tokio::test]
    async fn test_service_override_without_service_ref_is_fatal_in_git_layout() {
        let fake = FakePlatform::new();
        fake.edit(|s| {
            s.overrides_v2.insert(
                PROJECT.to_owned(),
                vec![OverrideV2 {
                    identifier: "broken".to_owned(),
                    org_identifier: None,
                    project_identifier: None,
                    environment_ref: "prod".to_owned(),
                    service_ref: None,
                    infra_identifier: None,
                    scope: OverrideScope::EnvService,
                    store_type: StoreType::Inline,
                    yaml: None,
                    spec: None,
                }],
            );
        });
        let mut policy = only(KindSelection {
            overrides_v2: true,
            ..KindSelection::default()
        });
        policy.naming.git_experience = true;
        let err = EntityMigrator::new(&fake, &policy)
            .run(&[project()])
            .await
            .unwrap_err();
        assert!(matches!(err, MigrateError::Path { .. }));
    }

    #[tokio::test]
    async fn test_listing_failure_is_fatal() {
        let fake = FakePlatform::new();
        fake.edit(|s| {
            s.failing_listings.insert("list_templates");
        });
        let policy = only(KindSelection {
            pipelines: true,
            templates: true,
            ..KindSelection::default()
        });
        let err = EntityMigrator::new(&fake, &policy)
            .run(&[project()])
            .await
            .unwrap_err();
        assert!(matches!(err, MigrateError::Listing { .. }));
    }

    #[tokio::test]
    async fn test_kinds_run_in_order_within_project() {
        let fake = FakePlatform::new();
        fake.edit(|s| {
            s.services.insert(PROJECT.to_owned(), vec![service("web")]);
            s.templates.insert(
                PROJECT.to_owned(),
                vec![Template {
                    identifier: "t".to_owned(),
                    name: "T".to_owned(),
                    org: "orgId".to_owned(),
                    project: PROJECT.to_owned(),
                    version_label: "v1".to_owned(),
                    store_type: StoreType::Inline,
                }],
            );
            s.pipelines
                .insert(PROJECT.to_owned(), vec![pipeline("p", StoreType::Inline)]);
        });
        let policy = only(KindSelection {
            pipelines: true,
            templates: true,
            services: true,
            ..KindSelection::default()
        });
        let outcome = EntityMigrator::new(&fake, &policy)
            .run(&[project()])
            .await
            .unwrap();
        let kinds: Vec<_> = fake.moves().into_iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            vec![EntityKind::Pipeline, EntityKind::Template, EntityKind::Service]
        );
        assert_eq!(
            outcome.get(EntityKind::Template).unwrap().moved,
            vec!["T (v1)"]
        );
        assert_eq!(fake.moves()[1].file_path, "templates/orgId/P1/t-v1.yaml");
    }
}
