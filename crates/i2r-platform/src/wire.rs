//! Response wrappers and request bodies.
//!
//! The NG endpoints wrap results in `{data: {content: [...]}}`, often with
//! a per-item wrapper object; the v1 endpoints return bare arrays of
//! wrapper objects. These types peel the wrappers off.

use i2r_core::{
    Connector, Environment, Infrastructure, InputSet, Organization, OverrideV2, Pipeline, Project,
    Service, ServiceOverride,
};
use serde::{Deserialize, Serialize};

/// `{ "data": T }`
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

/// `{ "content": [T] }`
#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
}

/// NG listing response: `{ "data": { "content": [T] } }`.
pub(crate) type NgPage<T> = Envelope<Page<T>>;

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectItem {
    pub project: Project,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrgItem {
    pub org: Organization,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServiceItem {
    pub service: Service,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnvironmentItem {
    pub environment: Environment,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InfrastructureItem {
    pub infrastructure: Infrastructure,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConnectorItem {
    pub connector: Connector,
}

/// A file store listing entry.
#[derive(Debug, Deserialize)]
pub(crate) struct FileStoreItem {
    pub identifier: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
}

pub(crate) type PipelinePage = NgPage<Pipeline>;
pub(crate) type InputSetPage = NgPage<InputSet>;
pub(crate) type OverrideV2Page = NgPage<OverrideV2>;
pub(crate) type ServiceOverridePage = NgPage<ServiceOverride>;

/// Body of the v1 pipeline move call.
#[derive(Debug, Serialize)]
pub(crate) struct PipelineMoveBody<'a> {
    pub git_details: GitDetailsBody<'a>,
    pub pipeline_identifier: &'a str,
    pub move_config_operation_type: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct GitDetailsBody<'a> {
    pub branch_name: &'a str,
    pub file_path: &'a str,
    pub commit_message: &'a str,
    pub connector_ref: &'a str,
    pub repo_name: &'a str,
}

/// Body of the service upsert call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ServiceUpdateBody<'a> {
    pub identifier: &'a str,
    pub org_identifier: &'a str,
    pub project_identifier: &'a str,
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<&'a serde_json::Value>,
    pub yaml: &'a str,
}

/// Body of the service override (v1) upsert call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ServiceOverrideUpdateBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_identifier: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_identifier: Option<&'a str>,
    pub environment_identifier: &'a str,
    pub service_identifier: &'a str,
    pub yaml: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use i2r_core::{EnvironmentType, StoreType, Template};

    #[test]
    fn test_project_page() {
        let body = r#"{"status":"SUCCESS","data":{"totalItems":1,"content":[
            {"project":{"orgIdentifier":"default","identifier":"P1","name":"One","modules":["CD"]}}
        ]}}"#;
        let page: NgPage<ProjectItem> = serde_json::from_str(body).unwrap();
        assert_eq!(page.data.content[0].project, Project::new("default", "P1", "One"));
    }

    #[test]
    fn test_empty_content_defaults() {
        let page: PipelinePage = serde_json::from_str(r#"{"data":{}}"#).unwrap();
        assert!(page.data.content.is_empty());
    }

    #[test]
    fn test_v1_arrays() {
        let orgs: Vec<OrgItem> =
            serde_json::from_str(r#"[{"org":{"identifier":"default","name":"Default"}}]"#).unwrap();
        assert_eq!(orgs[0].org.identifier, "default");

        let templates: Vec<Template> = serde_json::from_str(
            r#"[{"identifier":"t","name":"T","org":"o","project":"p","version_label":"1","store_type":"INLINE"}]"#,
        )
        .unwrap();
        assert_eq!(templates[0].store_type, StoreType::Inline);
    }

    #[test]
    fn test_environment_and_infra_items() {
        let envs: NgPage<EnvironmentItem> = serde_json::from_str(
            r#"{"data":{"content":[{"environment":{"identifier":"prod","type":"Production","storeType":"REMOTE"}}]}}"#,
        )
        .unwrap();
        let env = &envs.data.content[0].environment;
        assert_eq!(env.environment_type, EnvironmentType::Production);
        assert!(env.store_type.is_remote());

        let infras: NgPage<InfrastructureItem> = serde_json::from_str(
            r#"{"data":{"content":[{"infrastructure":{"identifier":"k8s","environmentRef":"prod"}}]}}"#,
        )
        .unwrap();
        assert_eq!(infras.data.content[0].infrastructure.environment_ref, "prod");
    }

    #[test]
    fn test_pipeline_move_body_shape() {
        let body = PipelineMoveBody {
            git_details: GitDetailsBody {
                branch_name: "migration",
                file_path: "pipelines/o/p/x.yaml",
                commit_message: "msg",
                connector_ref: "gh",
                repo_name: "repo",
            },
            pipeline_identifier: "x",
            move_config_operation_type: "INLINE_TO_REMOTE",
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["git_details"]["file_path"], "pipelines/o/p/x.yaml");
        assert_eq!(value["move_config_operation_type"], "INLINE_TO_REMOTE");
    }
}
