//! [`PlatformApi`] over HTTPS.

use std::time::Duration;

use async_trait::async_trait;
use i2r_core::{
    ApiKey, Connector, Entity, Environment, FileStoreEntry, GitTarget, InputSet, Infrastructure,
    Organization, OverrideScope, OverrideV2, Pipeline, Project, Scope, Service, ServiceOverride,
    Template,
};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::api::{PlatformApi, PlatformResult};
use crate::error::{ErrorEnvelope, PlatformError};
use crate::wire::{
    ConnectorItem, Envelope, EnvironmentItem, FileStoreItem, GitDetailsBody, InfrastructureItem,
    InputSetPage, NgPage, OrgItem, OverrideV2Page, PipelineMoveBody, PipelinePage, ProjectItem,
    ServiceItem, ServiceOverridePage, ServiceOverrideUpdateBody, ServiceUpdateBody,
};

const API_KEY_HEADER: &str = "x-api-key";
const ACCOUNT_HEADER: &str = "Harness-Account";
const MOVE_INLINE_TO_REMOTE: &str = "INLINE_TO_REMOTE";

/// Connection settings for [`HttpPlatform`].
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Base URL, without a trailing slash.
    pub base_url: String,
    /// Account identifier sent with every call.
    pub account: String,
    /// API key sent with every call.
    pub api_key: ApiKey,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// The production [`PlatformApi`] implementation.
#[derive(Debug, Clone)]
pub struct HttpPlatform {
    client: Client,
    settings: ClientSettings,
}

impl HttpPlatform {
    /// Builds a client with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Client`] if the TLS backend cannot be
    /// initialized.
    pub fn new(mut settings: ClientSettings) -> PlatformResult<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("inline-to-remote/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(PlatformError::Client)?;
        settings.base_url = settings.base_url.trim_end_matches('/').to_owned();
        Ok(Self { client, settings })
    }

    fn account(&self) -> &str {
        &self.settings.account
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        tracing::trace!(%method, path, "platform request");
        self.client
            .request(method, format!("{}{path}", self.settings.base_url))
            .header(API_KEY_HEADER, self.settings.api_key.expose())
    }

    /// A request carrying `accountIdentifier` and the scope's org/project.
    fn scoped(&self, method: Method, path: &str, scope: &Scope) -> RequestBuilder {
        self.request(method, path)
            .query(&[("accountIdentifier", self.account())])
            .query(&scope.query_params())
    }

    async fn send(request: RequestBuilder, endpoint: &str) -> PlatformResult<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|source| PlatformError::Transport {
                endpoint: endpoint.to_owned(),
                source,
            })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .map_err(|source| PlatformError::Transport {
                endpoint: endpoint.to_owned(),
                source,
            })?;
        let envelope = ErrorEnvelope::from_body(&body);
        tracing::debug!(endpoint, status = status.as_u16(), error = %envelope.joined(), "platform error");
        Err(PlatformError::api(endpoint, status.as_u16(), envelope))
    }

    async fn send_json<T: DeserializeOwned>(
        request: RequestBuilder,
        endpoint: &str,
    ) -> PlatformResult<T> {
        let response = Self::send(request, endpoint).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| PlatformError::Transport {
                endpoint: endpoint.to_owned(),
                source,
            })?;
        serde_json::from_slice(&bytes).map_err(|source| PlatformError::Decode {
            endpoint: endpoint.to_owned(),
            source,
        })
    }

    async fn send_unit(request: RequestBuilder, endpoint: &str) -> PlatformResult<()> {
        Self::send(request, endpoint).await.map(drop)
    }

    /// Move-config call shared by every kind except pipelines.
    async fn move_config(
        &self,
        endpoint: &str,
        scope: &Scope,
        extra: &[(&str, &str)],
        target: &GitTarget<'_>,
    ) -> PlatformResult<()> {
        let request = self
            .scoped(Method::POST, endpoint, scope)
            .header(ACCOUNT_HEADER, self.account())
            .query(&git_query(target))
            .query(extra);
        Self::send_unit(request, endpoint).await
    }

    async fn move_pipeline(
        &self,
        pipeline: &Pipeline,
        project: &Project,
        target: &GitTarget<'_>,
    ) -> PlatformResult<()> {
        let org = project.org_identifier.as_str();
        let proj = project.identifier.as_str();
        let endpoint = format!(
            "/v1/orgs/{org}/projects/{proj}/pipelines/{}/move-config",
            pipeline.identifier
        );
        let details = target.details;
        let body = PipelineMoveBody {
            git_details: GitDetailsBody {
                branch_name: &details.branch_name,
                file_path: &target.file_path,
                commit_message: &details.commit_message,
                connector_ref: &details.connector_ref,
                repo_name: &details.repo_name,
            },
            pipeline_identifier: &pipeline.identifier,
            move_config_operation_type: MOVE_INLINE_TO_REMOTE,
        };
        let request = self
            .request(Method::POST, &endpoint)
            .header(ACCOUNT_HEADER, self.account())
            .query(&[
                ("org", org),
                ("project", proj),
                ("pipeline", pipeline.identifier.as_str()),
            ])
            .json(&body);
        Self::send_unit(request, &endpoint).await
    }
}

/// Git coordinates as the move-config query parameters.
fn git_query<'a>(target: &'a GitTarget<'_>) -> [(&'static str, &'a str); 7] {
    let details = target.details;
    [
        ("connectorRef", details.connector_ref.as_str()),
        ("repoName", details.repo_name.as_str()),
        ("branch", details.branch_name.as_str()),
        ("isNewBranch", "false"),
        ("filePath", target.file_path.as_str()),
        ("commitMsg", details.commit_message.as_str()),
        ("moveConfigType", MOVE_INLINE_TO_REMOTE),
    ]
}

/// Strips an `org.`/`account.` scope prefix from a connector reference.
fn connector_identifier(reference: &str) -> &str {
    reference
        .split_once('.')
        .map_or(reference, |(_, identifier)| identifier)
}

#[async_trait]
impl PlatformApi for HttpPlatform {
    async fn list_projects(&self) -> PlatformResult<Vec<Project>> {
        let endpoint = "/ng/api/projects";
        let request = self
            .scoped(Method::GET, endpoint, &Scope::Account)
            .query(&[("hasModule", "true"), ("pageSize", "500")]);
        let page: NgPage<ProjectItem> = Self::send_json(request, endpoint).await?;
        Ok(page.data.content.into_iter().map(|i| i.project).collect())
    }

    async fn list_organizations(&self) -> PlatformResult<Vec<Organization>> {
        let endpoint = "/v1/orgs";
        let request = self
            .request(Method::GET, endpoint)
            .header(ACCOUNT_HEADER, self.account())
            .query(&[("limit", "1000")]);
        let orgs: Vec<OrgItem> = Self::send_json(request, endpoint).await?;
        Ok(orgs.into_iter().map(|i| i.org).collect())
    }

    async fn list_pipelines(&self, project: &Project) -> PlatformResult<Vec<Pipeline>> {
        let endpoint = "/pipeline/api/pipelines/list";
        let request = self
            .scoped(Method::POST, endpoint, &project.scope())
            .query(&[("size", "1000")])
            .json(&serde_json::json!({ "filterType": "PipelineSetup" }));
        let page: PipelinePage = Self::send_json(request, endpoint).await?;
        Ok(page.data.content)
    }

    async fn list_input_sets(
        &self,
        project: &Project,
        pipeline: &str,
    ) -> PlatformResult<Vec<InputSet>> {
        let endpoint = "/gateway/pipeline/api/inputSets";
        let request = self
            .scoped(Method::GET, endpoint, &project.scope())
            .query(&[
                ("routingId", self.account()),
                ("pipelineIdentifier", pipeline),
                ("size", "1000"),
            ]);
        let page: InputSetPage = Self::send_json(request, endpoint).await?;
        Ok(page.data.content)
    }

    async fn list_templates(&self, project: &Project) -> PlatformResult<Vec<Template>> {
        let endpoint = format!(
            "/v1/orgs/{}/projects/{}/templates",
            project.org_identifier, project.identifier
        );
        let request = self
            .request(Method::GET, &endpoint)
            .header(ACCOUNT_HEADER, self.account())
            .query(&[("limit", "1000")]);
        Self::send_json(request, &endpoint).await
    }

    async fn list_services(&self, project: &Project) -> PlatformResult<Vec<Service>> {
        let endpoint = format!(
            "/v1/orgs/{}/projects/{}/services",
            project.org_identifier, project.identifier
        );
        let request = self
            .request(Method::GET, &endpoint)
            .header(ACCOUNT_HEADER, self.account())
            .query(&[("limit", "1000")]);
        let services: Vec<ServiceItem> = Self::send_json(request, &endpoint).await?;
        Ok(services.into_iter().map(|i| i.service).collect())
    }

    async fn list_environments(&self, scope: &Scope) -> PlatformResult<Vec<Environment>> {
        let endpoint = "/ng/api/environmentsV2";
        let request = self
            .scoped(Method::GET, endpoint, scope)
            .query(&[("size", "1000")]);
        let page: NgPage<EnvironmentItem> = Self::send_json(request, endpoint).await?;
        Ok(page.data.content.into_iter().map(|i| i.environment).collect())
    }

    async fn list_infrastructures(
        &self,
        project: &Project,
        environment: &str,
    ) -> PlatformResult<Vec<Infrastructure>> {
        let endpoint = "/ng/api/infrastructures";
        let request = self
            .scoped(Method::GET, endpoint, &project.scope())
            .query(&[("environmentIdentifier", environment), ("size", "1000")]);
        let page: NgPage<InfrastructureItem> = Self::send_json(request, endpoint).await?;
        Ok(page
            .data
            .content
            .into_iter()
            .map(|i| i.infrastructure)
            .collect())
    }

    async fn list_overrides_v2(
        &self,
        project: &Project,
        scope: &OverrideScope,
    ) -> PlatformResult<Vec<OverrideV2>> {
        let endpoint = "/ng/api/serviceOverrides/v2/list";
        let request = self
            .scoped(Method::POST, endpoint, &project.scope())
            .query(&[("page", "0"), ("size", "1000"), ("type", scope.as_wire())]);
        let page: OverrideV2Page = Self::send_json(request, endpoint).await?;
        Ok(page.data.content)
    }

    async fn list_service_overrides(
        &self,
        environment: &Environment,
    ) -> PlatformResult<Vec<ServiceOverride>> {
        let endpoint = "/ng/api/environmentsV2/serviceOverrides";
        let scope = Scope::from_parts(
            environment.org_identifier.as_deref(),
            environment.project_identifier.as_deref(),
        );
        let request = self
            .scoped(Method::GET, endpoint, &scope)
            .query(&[("environmentIdentifier", environment.identifier.as_str())]);
        let page: ServiceOverridePage = Self::send_json(request, endpoint).await?;
        Ok(page.data.content)
    }

    async fn move_to_remote(
        &self,
        entity: &Entity,
        project: &Project,
        target: &GitTarget<'_>,
    ) -> PlatformResult<()> {
        let scope = project.scope();
        match entity {
            Entity::Pipeline(pipeline) => self.move_pipeline(pipeline, project, target).await,
            Entity::Template(template) => {
                let endpoint = format!(
                    "/template/api/templates/move-config/{}",
                    template.identifier
                );
                let extra = [("versionLabel", template.version_label.as_str())];
                self.move_config(&endpoint, &scope, &extra, target).await
            }
            Entity::Service(service) => {
                let endpoint = format!(
                    "/gateway/ng/api/servicesV2/move-config/{}",
                    service.identifier
                );
                self.move_config(&endpoint, &scope, &[], target).await
            }
            Entity::Environment(environment) => {
                let endpoint = format!(
                    "/gateway/ng/api/environmentsV2/move-config/{}",
                    environment.identifier
                );
                let extra = [("isHarnessCodeRepo", "false")];
                self.move_config(&endpoint, &scope, &extra, target).await
            }
            Entity::InputSet(input_set) => {
                let endpoint = format!(
                    "/gateway/pipeline/api/inputSets/move-config/{}",
                    input_set.identifier
                );
                let extra = [
                    ("isHarnessCodeRepo", "false"),
                    ("pipelineIdentifier", input_set.pipeline_identifier.as_str()),
                    ("inputSetIdentifier", input_set.identifier.as_str()),
                ];
                self.move_config(&endpoint, &scope, &extra, target).await
            }
            Entity::Infrastructure(infra) => {
                let endpoint = format!(
                    "/gateway/ng/api/infrastructures/move-config/{}",
                    infra.identifier
                );
                let extra = [
                    ("isHarnessCodeRepo", "false"),
                    ("environmentIdentifier", infra.environment_ref.as_str()),
                ];
                self.move_config(&endpoint, &scope, &extra, target).await
            }
            Entity::OverrideV2(ov) => {
                let endpoint = "/gateway/ng/api/serviceOverrides/move-config";
                let mut extra = vec![
                    ("isHarnessCodeRepo", "false"),
                    ("serviceOverridesType", ov.scope.as_wire()),
                    ("identifier", ov.identifier.as_str()),
                ];
                if !ov.environment_ref.is_empty() {
                    extra.push(("environmentRef", ov.environment_ref.as_str()));
                }
                if let Some(service) = ov.service() {
                    extra.push(("serviceRef", service));
                }
                if let Some(infra) = ov.infra() {
                    extra.push(("infraIdentifier", infra));
                }
                self.move_config(endpoint, &scope, &extra, target).await
            }
        }
    }

    async fn update_service(&self, service: &Service) -> PlatformResult<()> {
        let endpoint = "/ng/api/servicesV2";
        let body = ServiceUpdateBody {
            identifier: &service.identifier,
            org_identifier: &service.org,
            project_identifier: &service.project,
            name: &service.name,
            description: service.description.as_deref(),
            tags: service.tags.as_ref(),
            yaml: &service.yaml,
        };
        let request = self
            .scoped(Method::PUT, endpoint, &Scope::Account)
            .json(&body);
        Self::send_unit(request, endpoint).await
    }

    async fn update_service_override(
        &self,
        service_override: &ServiceOverride,
    ) -> PlatformResult<()> {
        let endpoint = "/ng/api/environmentsV2/serviceOverrides";
        let body = ServiceOverrideUpdateBody {
            org_identifier: service_override.org_identifier.as_deref(),
            project_identifier: service_override.project_identifier.as_deref(),
            environment_identifier: &service_override.environment_ref,
            service_identifier: &service_override.service_ref,
            yaml: &service_override.yaml,
        };
        let request = self
            .scoped(Method::PUT, endpoint, &Scope::Account)
            .json(&body);
        Self::send_unit(request, endpoint).await
    }

    async fn update_override_v2(&self, override_v2: &OverrideV2) -> PlatformResult<()> {
        let endpoint = "/ng/api/serviceOverrides";
        let request = self
            .scoped(Method::PUT, endpoint, &Scope::Account)
            .json(override_v2);
        Self::send_unit(request, endpoint).await
    }

    async fn get_connector(&self, scope: &Scope, reference: &str) -> PlatformResult<Connector> {
        let identifier = connector_identifier(reference);
        let endpoint = format!("/ng/api/connectors/{identifier}");
        let request = self.scoped(Method::GET, &endpoint, scope);
        let response: Envelope<Option<ConnectorItem>> =
            Self::send_json(request, &endpoint).await?;
        response
            .data
            .map(|item| item.connector)
            .filter(|c| !c.identifier.is_empty())
            .ok_or_else(|| PlatformError::InvalidConnector(reference.to_owned()))
    }

    async fn list_file_store(&self, scope: &Scope) -> PlatformResult<Vec<FileStoreEntry>> {
        let endpoint = "/ng/api/file-store";
        let request = self
            .scoped(Method::GET, endpoint, scope)
            .query(&[("pageSize", "2000")]);
        let page: NgPage<FileStoreItem> = Self::send_json(request, endpoint).await?;
        Ok(page
            .data
            .content
            .into_iter()
            .map(|item| FileStoreEntry::new(scope.clone(), item.identifier, item.name, item.path))
            .collect())
    }

    async fn download_file(&self, entry: &FileStoreEntry) -> PlatformResult<Vec<u8>> {
        let endpoint = format!("/ng/api/file-store/files/{}/download", entry.identifier);
        let request = self.scoped(Method::GET, &endpoint, &entry.scope);
        let response = Self::send(request, &endpoint).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| PlatformError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;
        Ok(bytes.to_vec())
    }
}
