//! The manifest tree and the documents that embed it.
//!
//! Only the fields the rewrite touches are modeled. Everything else lands
//! in the `extra` map of the nearest node and is written back unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ManifestError;

/// Fields of a node that are not modeled explicitly.
pub type Remainder = Map<String, Value>;

/// One element of a `manifests` list: `{ manifest: {...} }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// The manifest itself.
    pub manifest: Manifest,
    /// Unmodeled fields.
    #[serde(flatten)]
    pub extra: Remainder,
}

/// A manifest definition (K8s manifest, Helm chart, values file, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest identifier.
    #[serde(default)]
    pub identifier: String,
    /// Manifest type.
    #[serde(rename = "type", default)]
    pub manifest_type: String,
    /// Manifest settings.
    #[serde(default)]
    pub spec: ManifestSpec,
    /// Unmodeled fields.
    #[serde(flatten)]
    pub extra: Remainder,
}

/// Settings of a manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestSpec {
    /// Where the manifest's files live.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<Store>,
    /// Additional values files.
    #[serde(rename = "valuesPaths", default, skip_serializing_if = "Option::is_none")]
    pub values_paths: Option<Vec<String>>,
    /// Unmodeled fields.
    #[serde(flatten)]
    pub extra: Remainder,
}

/// A manifest store reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    /// Store type: `Harness` for the internal file store, otherwise a git
    /// provider.
    #[serde(rename = "type", default)]
    pub store_type: String,
    /// Store settings.
    #[serde(default)]
    pub spec: StoreSpec,
    /// Unmodeled fields.
    #[serde(flatten)]
    pub extra: Remainder,
}

/// Settings of a store reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSpec {
    /// Git connector reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector_ref: Option<String>,
    /// `Branch` or `Commit`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_fetch_type: Option<String>,
    /// Git branch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Repository-relative paths (git stores).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paths: Option<Vec<String>>,
    /// File store references (internal store).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
    /// Unmodeled fields.
    #[serde(flatten)]
    pub extra: Remainder,
}

/// A node holding a `manifests` list next to arbitrary siblings.
///
/// This is the shape of a service definition's `spec`, of a v1
/// `serviceOverrides` body, and of a v2 override's `spec`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestList {
    /// The manifests. `None` when the key is absent, so an explicit empty
    /// list is written back as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifests: Option<Vec<ManifestEntry>>,
    /// Unmodeled fields.
    #[serde(flatten)]
    pub extra: Remainder,
}

/// The structured `spec` of an override (v2).
pub type OverrideV2Spec = ManifestList;

impl ManifestList {
    /// Parses an override v2 spec.
    pub fn from_value(value: Value) -> Result<Self, ManifestError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Serializes back to a JSON value.
    pub fn to_value(&self) -> Result<Value, ManifestError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Returns the manifests, empty if the key is absent.
    pub fn manifests_mut(&mut self) -> &mut [ManifestEntry] {
        self.manifests.as_deref_mut().unwrap_or_default()
    }
}

/// `service.serviceDefinition`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    /// Definition settings, including the manifests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<ManifestList>,
    /// Unmodeled fields (`type`, ...).
    #[serde(flatten)]
    pub extra: Remainder,
}

/// `service`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceBody {
    /// The deployment definition.
    #[serde(
        rename = "serviceDefinition",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub service_definition: Option<ServiceDefinition>,
    /// Unmodeled fields (`name`, `identifier`, `tags`, ...).
    #[serde(flatten)]
    pub extra: Remainder,
}

/// A service definition document.
///
/// # Examples
///
/// ```
/// use i2r_manifest::ServiceDocument;
///
/// let yaml = "
/// service:
///   name: web
///   identifier: web
///   serviceDefinition:
///     type: Kubernetes
///     spec:
///       manifests:
///         - manifest:
///             identifier: m1
///             type: K8sManifest
///             spec:
///               store:
///                 type: Harness
///                 spec:
///                   files:
///                     - /charts/web.yaml
/// ";
/// let mut doc = ServiceDocument::from_yaml(yaml).unwrap();
/// assert_eq!(doc.manifests_mut().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDocument {
    /// The service.
    pub service: ServiceBody,
    /// Unmodeled top-level fields.
    #[serde(flatten)]
    pub extra: Remainder,
}

impl ServiceDocument {
    /// Parses a service YAML document.
    pub fn from_yaml(raw: &str) -> Result<Self, ManifestError> {
        if raw.trim().is_empty() {
            return Err(ManifestError::MissingSection("service"));
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Serializes back to YAML.
    pub fn to_yaml(&self) -> Result<String, ManifestError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Returns the manifests of the service definition, if any.
    pub fn manifests_mut(&mut self) -> &mut [ManifestEntry] {
        match self
            .service
            .service_definition
            .as_mut()
            .and_then(|def| def.spec.as_mut())
        {
            Some(spec) => spec.manifests_mut(),
            None => &mut [],
        }
    }
}

/// A service override (v1) document: `serviceOverrides: {...}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceOverrideDocument {
    /// The override body (`environmentRef`, `serviceRef`, `manifests`, ...).
    #[serde(rename = "serviceOverrides")]
    pub service_overrides: ManifestList,
    /// Unmodeled top-level fields.
    #[serde(flatten)]
    pub extra: Remainder,
}

impl ServiceOverrideDocument {
    /// Parses a service override YAML document.
    pub fn from_yaml(raw: &str) -> Result<Self, ManifestError> {
        if raw.trim().is_empty() {
            return Err(ManifestError::MissingSection("serviceOverrides"));
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Serializes back to YAML.
    pub fn to_yaml(&self) -> Result<String, ManifestError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Returns the override's manifests.
    pub fn manifests_mut(&mut self) -> &mut [ManifestEntry] {
        self.service_overrides.manifests_mut()
    }
}
