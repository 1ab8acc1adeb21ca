//! Entity records and the closed set of migratable kinds.
//!
//! Each record mirrors the fields the platform's listing endpoints return
//! that the migration actually reads. Unread fields are dropped on
//! deserialization; these records are never written back wholesale.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::store::StoreType;

/// The kinds of entity the migrator can move to remote storage.
///
/// # Examples
///
/// ```
/// use i2r_core::EntityKind;
///
/// assert_eq!(EntityKind::Pipeline.plural(), "pipelines");
/// assert_eq!(EntityKind::ALL.len(), 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Pipelines.
    Pipeline,
    /// Input sets of remote pipelines.
    InputSet,
    /// Templates (one entity per version label).
    Template,
    /// Services.
    Service,
    /// Environments.
    Environment,
    /// Infrastructure definitions of remote environments.
    Infrastructure,
    /// Service overrides (v2).
    OverrideV2,
}

impl EntityKind {
    /// Every kind, in the order a run processes them within a project.
    pub const ALL: [Self; 7] = [
        Self::Pipeline,
        Self::InputSet,
        Self::Template,
        Self::Service,
        Self::Environment,
        Self::Infrastructure,
        Self::OverrideV2,
    ];

    /// Returns the directory segment used by the flat layouts.
    #[must_use]
    pub const fn plural(self) -> &'static str {
        match self {
            Self::Pipeline => "pipelines",
            Self::InputSet => "inputsets",
            Self::Template => "templates",
            Self::Service => "services",
            Self::Environment => "environments",
            Self::Infrastructure => "infrastructures",
            Self::OverrideV2 => "overrides",
        }
    }

    /// Returns a human-readable label for log output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pipeline => "Pipelines",
            Self::InputSet => "Input Sets",
            Self::Template => "Templates",
            Self::Service => "Services",
            Self::Environment => "Environments",
            Self::Infrastructure => "Infrastructure Definitions",
            Self::OverrideV2 => "Overrides V2",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Declared type of an environment.
///
/// Anything other than `Production`/`PreProduction` is kept verbatim in
/// [`EnvironmentType::Other`] and lays out under the `unknown` segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EnvironmentType {
    /// A production environment.
    Production,
    /// A pre-production environment.
    PreProduction,
    /// Any other (or missing) declared type.
    Other(String),
}

impl Default for EnvironmentType {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl EnvironmentType {
    /// Parses the platform's wire representation.
    #[must_use]
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "Production" => Self::Production,
            "PreProduction" => Self::PreProduction,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Returns the platform's wire representation.
    #[must_use]
    pub fn as_wire(&self) -> &str {
        match self {
            Self::Production => "Production",
            Self::PreProduction => "PreProduction",
            Self::Other(raw) => raw,
        }
    }

    /// Returns the git-experience directory segment for this type.
    ///
    /// # Examples
    ///
    /// ```
    /// use i2r_core::EnvironmentType;
    ///
    /// assert_eq!(EnvironmentType::PreProduction.path_segment(), "pre_production");
    /// assert_eq!(EnvironmentType::from_wire("QA").path_segment(), "unknown");
    /// ```
    #[must_use]
    pub const fn path_segment(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::PreProduction => "pre_production",
            Self::Other(_) => "unknown",
        }
    }
}

impl Serialize for EnvironmentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for EnvironmentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map_or_else(Self::default, Self::from_wire))
    }
}

/// The granularity an override v2 document applies at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OverrideScope {
    /// Applies to every service in an environment.
    EnvGlobal,
    /// Applies to one service in an environment.
    EnvService,
    /// Applies to every service on one infrastructure.
    InfraGlobal,
    /// Applies to one service on one infrastructure.
    InfraService,
    /// A scope this tool does not recognize, kept verbatim.
    Unknown(String),
}

impl OverrideScope {
    /// The four known scopes, in the order they are listed during a run.
    pub const KNOWN: [Self; 4] = [
        Self::EnvGlobal,
        Self::EnvService,
        Self::InfraGlobal,
        Self::InfraService,
    ];

    /// Parses the platform's wire representation.
    #[must_use]
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "ENV_GLOBAL_OVERRIDE" => Self::EnvGlobal,
            "ENV_SERVICE_OVERRIDE" => Self::EnvService,
            "INFRA_GLOBAL_OVERRIDE" => Self::InfraGlobal,
            "INFRA_SERVICE_OVERRIDE" => Self::InfraService,
            other => Self::Unknown(other.to_owned()),
        }
    }

    /// Returns the platform's wire representation.
    #[must_use]
    pub fn as_wire(&self) -> &str {
        match self {
            Self::EnvGlobal => "ENV_GLOBAL_OVERRIDE",
            Self::EnvService => "ENV_SERVICE_OVERRIDE",
            Self::InfraGlobal => "INFRA_GLOBAL_OVERRIDE",
            Self::InfraService => "INFRA_SERVICE_OVERRIDE",
            Self::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for OverrideScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl Serialize for OverrideScope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for OverrideScope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&raw))
    }
}

/// A pipeline as returned by the pipeline listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    /// Pipeline identifier.
    pub identifier: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Current storage.
    #[serde(default)]
    pub store_type: StoreType,
}

/// A single template version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Template identifier.
    pub identifier: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Owning organization.
    #[serde(default, alias = "orgIdentifier")]
    pub org: String,
    /// Owning project.
    #[serde(default, alias = "projectIdentifier")]
    pub project: String,
    /// Version label of this template version.
    #[serde(default, alias = "versionLabel")]
    pub version_label: String,
    /// Current storage.
    #[serde(default, alias = "storeType")]
    pub store_type: StoreType,
}

/// A service, including its YAML definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// Service identifier.
    pub identifier: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Owning organization.
    #[serde(default, alias = "orgIdentifier")]
    pub org: String,
    /// Owning project.
    #[serde(default, alias = "projectIdentifier")]
    pub project: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Tags as reported by the platform.
    #[serde(default)]
    pub tags: Option<serde_json::Value>,
    /// The service definition document.
    #[serde(default)]
    pub yaml: String,
    /// Current storage.
    #[serde(default, alias = "storeType")]
    pub store_type: StoreType,
}

/// An environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    /// Environment identifier.
    pub identifier: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Owning organization (empty at account level).
    #[serde(default)]
    pub org_identifier: Option<String>,
    /// Owning project (empty at account/org level).
    #[serde(default)]
    pub project_identifier: Option<String>,
    /// Declared environment type.
    #[serde(default, rename = "type")]
    pub environment_type: EnvironmentType,
    /// Current storage.
    #[serde(default)]
    pub store_type: StoreType,
}

/// An infrastructure definition inside an environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Infrastructure {
    /// Infrastructure identifier.
    pub identifier: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Owning environment identifier.
    #[serde(default)]
    pub environment_ref: String,
    /// Current storage.
    #[serde(default)]
    pub store_type: StoreType,
    /// Type of the owning environment.
    ///
    /// Not part of the listing response; filled in from the parent
    /// environment so the git layout can place the file.
    #[serde(skip)]
    pub environment_type: EnvironmentType,
}

/// An input set of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSet {
    /// Input set identifier.
    pub identifier: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Identifier of the owning pipeline.
    #[serde(default)]
    pub pipeline_identifier: String,
    /// Current storage.
    #[serde(default)]
    pub store_type: StoreType,
}

/// A service override (v2) document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideV2 {
    /// Override identifier.
    pub identifier: String,
    /// Owning organization.
    #[serde(default)]
    pub org_identifier: Option<String>,
    /// Owning project.
    #[serde(default)]
    pub project_identifier: Option<String>,
    /// Environment the override applies to.
    #[serde(default)]
    pub environment_ref: String,
    /// Service the override applies to, for service scopes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_ref: Option<String>,
    /// Infrastructure the override applies to, for infra scopes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infra_identifier: Option<String>,
    /// Override granularity.
    #[serde(rename = "type")]
    pub scope: OverrideScope,
    /// Current storage.
    #[serde(default, skip_serializing)]
    pub store_type: StoreType,
    /// Inline YAML rendering, if the platform returned one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaml: Option<String>,
    /// Structured override specification (manifests, variables, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<serde_json::Value>,
}

impl OverrideV2 {
    /// Returns the service reference if present and non-empty.
    #[must_use]
    pub fn service(&self) -> Option<&str> {
        self.service_ref.as_deref().filter(|s| !s.is_empty())
    }

    /// Returns the infrastructure identifier if present and non-empty.
    #[must_use]
    pub fn infra(&self) -> Option<&str> {
        self.infra_identifier.as_deref().filter(|s| !s.is_empty())
    }
}

/// A service override (v1) attached to an environment.
///
/// Only used by the manifest rewriter; v1 overrides are never moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOverride {
    /// Owning organization.
    #[serde(default)]
    pub org_identifier: Option<String>,
    /// Owning project.
    #[serde(default)]
    pub project_identifier: Option<String>,
    /// Environment the override applies to.
    #[serde(default)]
    pub environment_ref: String,
    /// Service the override applies to.
    #[serde(default)]
    pub service_ref: String,
    /// The override document.
    #[serde(default)]
    pub yaml: String,
}

/// A migratable entity: the closed set of kinds the driver iterates.
///
/// # Examples
///
/// ```
/// use i2r_core::{Entity, EntityKind, Pipeline, StoreType};
///
/// let entity = Entity::Pipeline(Pipeline {
///     identifier: "pipe1".to_owned(),
///     name: String::new(),
///     store_type: StoreType::Inline,
/// });
/// assert_eq!(entity.kind(), EntityKind::Pipeline);
/// assert_eq!(entity.display_name(), "pipe1");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    /// A pipeline.
    Pipeline(Pipeline),
    /// A template version.
    Template(Template),
    /// A service.
    Service(Service),
    /// An environment.
    Environment(Environment),
    /// An infrastructure definition.
    Infrastructure(Infrastructure),
    /// An input set.
    InputSet(InputSet),
    /// A service override (v2).
    OverrideV2(OverrideV2),
}

impl Entity {
    /// Returns the kind of this entity.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Pipeline(_) => EntityKind::Pipeline,
            Self::Template(_) => EntityKind::Template,
            Self::Service(_) => EntityKind::Service,
            Self::Environment(_) => EntityKind::Environment,
            Self::Infrastructure(_) => EntityKind::Infrastructure,
            Self::InputSet(_) => EntityKind::InputSet,
            Self::OverrideV2(_) => EntityKind::OverrideV2,
        }
    }

    /// Returns the entity identifier.
    #[must_use]
    pub fn identifier(&self) -> &str {
        match self {
            Self::Pipeline(p) => &p.identifier,
            Self::Template(t) => &t.identifier,
            Self::Service(s) => &s.identifier,
            Self::Environment(e) => &e.identifier,
            Self::Infrastructure(i) => &i.identifier,
            Self::InputSet(i) => &i.identifier,
            Self::OverrideV2(o) => &o.identifier,
        }
    }

    /// Returns the name used in logs and failure summaries.
    ///
    /// Falls back to the identifier when the display name is empty.
    /// Template versions are suffixed with their version label.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = match self {
            Self::Pipeline(p) => &p.name,
            Self::Template(t) => &t.name,
            Self::Service(s) => &s.name,
            Self::Environment(e) => &e.name,
            Self::Infrastructure(i) => &i.name,
            Self::InputSet(i) => &i.name,
            Self::OverrideV2(_) => "",
        };
        let base = if name.is_empty() {
            self.identifier()
        } else {
            name
        };
        match self {
            Self::Template(t) if !t.version_label.is_empty() => {
                format!("{base} ({})", t.version_label)
            }
            _ => base.to_owned(),
        }
    }

    /// Returns the storage the platform reported for this entity.
    #[must_use]
    pub const fn store_type(&self) -> StoreType {
        match self {
            Self::Pipeline(p) => p.store_type,
            Self::Template(t) => t.store_type,
            Self::Service(s) => s.store_type,
            Self::Environment(e) => e.store_type,
            Self::Infrastructure(i) => i.store_type,
            Self::InputSet(i) => i.store_type,
            Self::OverrideV2(o) => o.store_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_type_segments() {
        assert_eq!(EnvironmentType::Production.path_segment(), "production");
        assert_eq!(
            EnvironmentType::PreProduction.path_segment(),
            "pre_production"
        );
        assert_eq!(EnvironmentType::default().path_segment(), "unknown");
        assert_eq!(
            EnvironmentType::from_wire("Staging").path_segment(),
            "unknown"
        );
    }

    #[test]
    fn test_environment_deserialize() {
        let json = r#"{
            "identifier": "envId",
            "name": "Env",
            "orgIdentifier": "orgId",
            "projectIdentifier": "pId",
            "type": "PreProduction",
            "storeType": "INLINE",
            "yaml": "environment: {}"
        }"#;
        let env: Environment = serde_json::from_str(json).unwrap();
        assert_eq!(env.environment_type, EnvironmentType::PreProduction);
        assert_eq!(env.store_type, StoreType::Inline);
        assert_eq!(env.org_identifier.as_deref(), Some("orgId"));
    }

    #[test]
    fn test_template_accepts_both_spellings() {
        let snake = r#"{"identifier":"t","org":"o","project":"p","version_label":"v1","store_type":"REMOTE"}"#;
        let camel = r#"{"identifier":"t","orgIdentifier":"o","projectIdentifier":"p","versionLabel":"v1","storeType":"REMOTE"}"#;
        let a: Template = serde_json::from_str(snake).unwrap();
        let b: Template = serde_json::from_str(camel).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.version_label, "v1");
        assert!(a.store_type.is_remote());
    }

    #[test]
    fn test_override_scope_round_trip_unknown() {
        let json = r#"{"identifier":"ov","environmentRef":"env","type":"CLUSTER_OVERRIDE"}"#;
        let ov: OverrideV2 = serde_json::from_str(json).unwrap();
        assert_eq!(ov.scope, OverrideScope::Unknown("CLUSTER_OVERRIDE".to_owned()));
        assert_eq!(ov.store_type, StoreType::Unknown);
    }

    #[test]
    fn test_override_refs_ignore_empty() {
        let ov = OverrideV2 {
            identifier: "ov".to_owned(),
            org_identifier: None,
            project_identifier: None,
            environment_ref: "env".to_owned(),
            service_ref: Some(String::new()),
            infra_identifier: Some("infra".to_owned()),
            scope: OverrideScope::InfraGlobal,
            store_type: StoreType::Inline,
            yaml: None,
            spec: None,
        };
        assert_eq!(ov.service(), None);
        assert_eq!(ov.infra(), Some("infra"));
    }

    #[test]
    fn test_entity_display_name() {
        let template = Entity::Template(Template {
            identifier: "tpl".to_owned(),
            name: "Deploy Stage".to_owned(),
            org: "o".to_owned(),
            project: "p".to_owned(),
            version_label: "v2".to_owned(),
            store_type: StoreType::Inline,
        });
        assert_eq!(template.display_name(), "Deploy Stage (v2)");
        assert_eq!(template.kind(), EntityKind::Template);
    }

    #[test]
    fn test_kind_order_starts_with_pipelines() {
        assert_eq!(EntityKind::ALL[0], EntityKind::Pipeline);
        assert_eq!(EntityKind::ALL[1], EntityKind::InputSet);
        assert_eq!(EntityKind::ALL[6], EntityKind::OverrideV2);
    }
}
