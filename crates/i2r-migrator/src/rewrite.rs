//! Drivers that repoint manifests at the published file store mirror.
//!
//! Three document families carry manifests: service definitions, service
//! overrides (v1, attached to environments), and overrides (v2). Each
//! driver lists its documents, applies [`rewrite_manifests`], and submits
//! the documents that changed. A document that cannot be parsed,
//! re-serialized, or updated is recorded as failed and the driver moves
//! on.

use i2r_core::{
    Environment, MigrationPolicy, OverrideScope, OverrideV2, Project, Scope, Service,
    ServiceFilter, ServiceOverride,
};
use i2r_manifest::{
    ManifestList, RewriteSummary, RewriteTarget, ServiceDocument, ServiceOverrideDocument,
    rewrite_manifests,
};
use i2r_platform::PlatformApi;

use crate::error::MigrateError;

/// Which documents a rewrite pass touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteReport {
    /// Document family label for summaries.
    pub label: &'static str,
    /// Documents examined.
    pub processed: usize,
    /// Documents rewritten and submitted.
    pub updated: Vec<String>,
    /// Documents with nothing to rewrite.
    pub unchanged: Vec<String>,
    /// Documents that could not be rewritten or submitted.
    pub failed: Vec<String>,
}

enum Disposition {
    Updated,
    Unchanged,
}

impl RewriteReport {
    fn new(label: &'static str) -> Self {
        Self {
            label,
            ..Self::default()
        }
    }

    fn record(&mut self, name: String, result: Result<Disposition, String>) {
        self.processed += 1;
        match result {
            Ok(Disposition::Updated) => {
                tracing::info!(document = %name, "rewrote manifests");
                self.updated.push(name);
            }
            Ok(Disposition::Unchanged) => self.unchanged.push(name),
            Err(error) => {
                tracing::error!(document = %name, %error, "manifest rewrite failed");
                self.failed.push(name);
            }
        }
    }
}

fn log_already_remote(document: &str, summary: &RewriteSummary) {
    for manifest in &summary.already_remote {
        tracing::info!(document, manifest = %manifest, "manifest already remote");
    }
}

/// Rewrites manifests against one connector, looked up once per pass.
#[derive(Debug)]
pub struct ManifestRewriter<'a, P: ?Sized> {
    platform: &'a P,
    policy: &'a MigrationPolicy,
    connector_type: String,
}

impl<'a, P: PlatformApi + ?Sized> ManifestRewriter<'a, P> {
    /// Looks up the publish connector at the file store's org/project.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Connector`] if the connector cannot be
    /// fetched; no document can be rewritten without its type.
    pub async fn connect(
        platform: &'a P,
        policy: &'a MigrationPolicy,
    ) -> Result<Self, MigrateError> {
        let reference = policy.filestore.connector_ref(&policy.git);
        let scope = Scope::from_parts(
            Some(&policy.filestore.organization),
            Some(&policy.filestore.project),
        );
        let connector = platform
            .get_connector(&scope, reference)
            .await
            .map_err(|source| MigrateError::Connector {
                reference: reference.to_owned(),
                source,
            })?;
        tracing::debug!(
            connector = %connector.identifier,
            connector_type = %connector.connector_type,
            "resolved rewrite connector"
        );
        Ok(Self {
            platform,
            policy,
            connector_type: connector.connector_type,
        })
    }

    fn target(&self) -> RewriteTarget<'_> {
        RewriteTarget::new(
            &self.connector_type,
            &self.policy.git.branch_name,
            self.policy.filestore.connector_ref(&self.policy.git),
        )
    }

    /// Rewrites the manifests of every in-scope service.
    ///
    /// # Errors
    ///
    /// Fails if a project's services cannot be listed.
    pub async fn rewrite_services(
        &self,
        projects: &[Project],
    ) -> Result<RewriteReport, MigrateError> {
        let filter = ServiceFilter::from_policy(self.policy);
        if filter.is_ambiguous() {
            tracing::warn!(
                "both target and exclude service lists are set; only the target list is applied"
            );
        }
        let mut report = RewriteReport::new("Service Manifests");
        for project in projects {
            let services = self
                .platform
                .list_services(project)
                .await
                .map_err(|source| {
                    MigrateError::listing("services", project.scope().label(), source)
                })?;
            for service in services {
                if !filter.allows(&service.identifier, &project.identifier) {
                    tracing::debug!(service = %service.identifier, "service not in scope");
                    continue;
                }
                if service.yaml.trim().is_empty() {
                    tracing::debug!(service = %service.identifier, "service has no definition");
                    continue;
                }
                let name = if service.name.is_empty() {
                    service.identifier.clone()
                } else {
                    service.name.clone()
                };
                let result = self.rewrite_service(service, &project.scope()).await;
                report.record(name, result);
            }
        }
        Ok(report)
    }

    async fn rewrite_service(
        &self,
        mut service: Service,
        scope: &Scope,
    ) -> Result<Disposition, String> {
        let mut document = ServiceDocument::from_yaml(&service.yaml).map_err(|e| e.to_string())?;
        let summary = rewrite_manifests(
            document.manifests_mut(),
            &self.target(),
            scope,
            self.policy.force_update,
        );
        log_already_remote(&service.identifier, &summary);
        if !summary.updated() {
            return Ok(Disposition::Unchanged);
        }
        service.yaml = document.to_yaml().map_err(|e| e.to_string())?;
        self.platform
            .update_service(&service)
            .await
            .map_err(|e| e.to_string())?;
        Ok(Disposition::Updated)
    }

    /// Rewrites the service overrides (v1) of every environment at account
    /// level, in every organization, and in every project of `projects`.
    ///
    /// # Errors
    ///
    /// Fails if environments, organizations, or an environment's
    /// overrides cannot be listed.
    pub async fn rewrite_service_overrides(
        &self,
        projects: &[Project],
    ) -> Result<RewriteReport, MigrateError> {
        let mut report = RewriteReport::new("Service Overrides");
        for environment in self.all_environments(projects).await? {
            let scope = Scope::from_parts(
                environment.org_identifier.as_deref(),
                environment.project_identifier.as_deref(),
            );
            let overrides = self
                .platform
                .list_service_overrides(&environment)
                .await
                .map_err(|source| {
                    MigrateError::listing(
                        format!("service overrides of {}", environment.identifier),
                        scope.label(),
                        source,
                    )
                })?;
            for service_override in overrides {
                let name = format!("{}/{}", environment.identifier, service_override.service_ref);
                let result = self.rewrite_service_override(service_override, &scope).await;
                report.record(name, result);
            }
        }
        Ok(report)
    }

    async fn all_environments(&self, projects: &[Project]) -> Result<Vec<Environment>, MigrateError> {
        let organizations = self
            .platform
            .list_organizations()
            .await
            .map_err(|source| MigrateError::listing("organizations", "account", source))?;
        let scopes = std::iter::once(Scope::Account)
            .chain(
                organizations
                    .into_iter()
                    .map(|org| Scope::Org { org: org.identifier }),
            )
            .chain(projects.iter().map(Project::scope));

        let mut environments = Vec::new();
        for scope in scopes {
            let found = self
                .platform
                .list_environments(&scope)
                .await
                .map_err(|source| MigrateError::listing("environments", scope.label(), source))?;
            tracing::debug!(scope = %scope.label(), count = found.len(), "listed environments");
            environments.extend(found);
        }
        Ok(environments)
    }

    async fn rewrite_service_override(
        &self,
        mut service_override: ServiceOverride,
        scope: &Scope,
    ) -> Result<Disposition, String> {
        let mut document = ServiceOverrideDocument::from_yaml(&service_override.yaml)
            .map_err(|e| e.to_string())?;
        let summary = rewrite_manifests(
            document.manifests_mut(),
            &self.target(),
            scope,
            self.policy.force_update,
        );
        log_already_remote(&service_override.environment_ref, &summary);
        if !summary.updated() {
            return Ok(Disposition::Unchanged);
        }
        service_override.yaml = document.to_yaml().map_err(|e| e.to_string())?;
        self.platform
            .update_service_override(&service_override)
            .await
            .map_err(|e| e.to_string())?;
        Ok(Disposition::Updated)
    }

    /// Rewrites the manifests of every override (v2) in `projects`.
    ///
    /// # Errors
    ///
    /// Fails if any override scope type cannot be listed.
    pub async fn rewrite_overrides_v2(
        &self,
        projects: &[Project],
    ) -> Result<RewriteReport, MigrateError> {
        let mut report = RewriteReport::new("Overrides V2");
        for project in projects {
            for override_scope in &OverrideScope::KNOWN {
                let overrides = self
                    .platform
                    .list_overrides_v2(project, override_scope)
                    .await
                    .map_err(|source| {
                        MigrateError::listing(
                            format!("{override_scope} overrides"),
                            project.scope().label(),
                            source,
                        )
                    })?;
                for override_v2 in overrides {
                    let name = override_v2.identifier.clone();
                    let result = self.rewrite_override_v2(override_v2, project).await;
                    report.record(name, result);
                }
            }
        }
        Ok(report)
    }

    async fn rewrite_override_v2(
        &self,
        mut override_v2: OverrideV2,
        project: &Project,
    ) -> Result<Disposition, String> {
        let Some(spec) = override_v2.spec.take() else {
            return Ok(Disposition::Unchanged);
        };
        let mut list = ManifestList::from_value(spec).map_err(|e| e.to_string())?;
        let scope = Scope::from_parts(
            override_v2
                .org_identifier
                .as_deref()
                .or(Some(project.org_identifier.as_str())),
            override_v2
                .project_identifier
                .as_deref()
                .or(Some(project.identifier.as_str())),
        );
        let summary = rewrite_manifests(
            list.manifests_mut(),
            &self.target(),
            &scope,
            self.policy.force_update,
        );
        log_already_remote(&override_v2.identifier, &summary);
        if !summary.updated() {
            return Ok(Disposition::Unchanged);
        }
        override_v2.spec = Some(list.to_value().map_err(|e| e.to_string())?);
        override_v2.yaml = None;
        self.platform
            .update_override_v2(&override_v2)
            .await
            .map_err(|e| e.to_string())?;
        Ok(Disposition::Updated)
    }
}
