//! Projects, organizations, and hierarchical scopes.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// A project on the platform.
///
/// Fetched once at the start of a run and never mutated afterwards.
///
/// # Examples
///
/// ```
/// use i2r_core::Project;
///
/// let project = Project::new("orgId", "P1", "Payments");
/// assert_eq!(project.org_identifier, "orgId");
/// assert!(project.matches("Payments"));
/// assert!(project.matches("P1"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Owning organization identifier.
    #[serde(default)]
    pub org_identifier: String,

    /// Project identifier.
    pub identifier: String,

    /// Display name.
    #[serde(default)]
    pub name: String,
}

impl Project {
    /// Creates a new project record.
    #[must_use]
    pub fn new(
        org_identifier: impl Into<String>,
        identifier: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            org_identifier: org_identifier.into(),
            identifier: identifier.into(),
            name: name.into(),
        }
    }

    /// Returns `true` if `needle` equals this project's name or identifier.
    #[inline]
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        self.name == needle || self.identifier == needle
    }

    /// Returns the project-level [`Scope`] for this project.
    #[must_use]
    pub fn scope(&self) -> Scope {
        Scope::Project {
            org: self.org_identifier.clone(),
            project: self.identifier.clone(),
        }
    }
}

/// An organization on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Organization {
    /// Organization identifier.
    pub identifier: String,

    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// Where a platform resource lives in the account/org/project hierarchy.
///
/// Replaces empty-string sentinels: an account-level call is
/// [`Scope::Account`], never "a project call with an empty org".
///
/// # Examples
///
/// ```
/// use i2r_core::Scope;
///
/// let scope = Scope::Org { org: "default".to_owned() };
/// assert_eq!(scope.staging_prefix(), "default");
/// assert_eq!(scope.org(), Some("default"));
/// assert_eq!(scope.project(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Account-level resource.
    Account,
    /// Organization-level resource.
    Org {
        /// Organization identifier.
        org: String,
    },
    /// Project-level resource.
    Project {
        /// Organization identifier.
        org: String,
        /// Project identifier.
        project: String,
    },
}

impl Scope {
    /// Builds a scope from optional org/project identifiers.
    ///
    /// Empty strings are treated as absent. A project without an org falls
    /// back to account scope, since the platform cannot address it.
    #[must_use]
    pub fn from_parts(org: Option<&str>, project: Option<&str>) -> Self {
        let org = org.filter(|o| !o.is_empty());
        let project = project.filter(|p| !p.is_empty());
        match (org, project) {
            (Some(org), Some(project)) => Self::Project {
                org: org.to_owned(),
                project: project.to_owned(),
            },
            (Some(org), None) => Self::Org {
                org: org.to_owned(),
            },
            (None, _) => Self::Account,
        }
    }

    /// Returns the organization identifier, if any.
    #[must_use]
    pub fn org(&self) -> Option<&str> {
        match self {
            Self::Account => None,
            Self::Org { org } | Self::Project { org, .. } => Some(org),
        }
    }

    /// Returns the project identifier, if any.
    #[must_use]
    pub fn project(&self) -> Option<&str> {
        match self {
            Self::Project { project, .. } => Some(project),
            Self::Account | Self::Org { .. } => None,
        }
    }

    /// Returns the directory prefix used for this scope in the staging tree.
    ///
    /// `account`, `<org>`, or `<org>/<project>`.
    #[must_use]
    pub fn staging_prefix(&self) -> Utf8PathBuf {
        match self {
            Self::Account => Utf8PathBuf::from("account"),
            Self::Org { org } => Utf8PathBuf::from(org),
            Self::Project { org, project } => Utf8PathBuf::from(org).join(project),
        }
    }

    /// Returns the scoping query parameters for a platform call.
    ///
    /// The account identifier is added by the client; this only yields the
    /// org/project pair that the scope pins down.
    #[must_use]
    pub fn query_params(&self) -> Vec<(&'static str, &str)> {
        let mut params = Vec::with_capacity(2);
        if let Some(org) = self.org() {
            params.push(("orgIdentifier", org));
        }
        if let Some(project) = self.project() {
            params.push(("projectIdentifier", project));
        }
        params
    }

    /// Returns a short label for log output.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Account => "account".to_owned(),
            Self::Org { org } => format!("org {org}"),
            Self::Project { org, project } => format!("project {org}/{project}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_matches_name_or_identifier() {
        let project = Project::new("orgId", "pId", "Project Name");
        assert!(project.matches("pId"));
        assert!(project.matches("Project Name"));
        assert!(!project.matches("orgId"));
    }

    #[test]
    fn test_project_deserialize_camel_case() {
        let json = r##"{"orgIdentifier":"default","identifier":"P1","name":"Payments","color":"#fff"}"##;
        let project: Project = serde_json::from_str(json).unwrap();
        assert_eq!(project, Project::new("default", "P1", "Payments"));
    }

    #[test]
    fn test_scope_from_parts() {
        assert_eq!(Scope::from_parts(None, None), Scope::Account);
        assert_eq!(Scope::from_parts(Some(""), Some("")), Scope::Account);
        assert_eq!(
            Scope::from_parts(Some("o"), None),
            Scope::Org { org: "o".to_owned() }
        );
        assert_eq!(
            Scope::from_parts(Some("o"), Some("p")),
            Scope::Project {
                org: "o".to_owned(),
                project: "p".to_owned()
            }
        );
        assert_eq!(Scope::from_parts(None, Some("p")), Scope::Account);
    }

    #[test]
    fn test_scope_staging_prefix() {
        assert_eq!(Scope::Account.staging_prefix(), "account");
        assert_eq!(
            Project::new("orgId", "P1", "").scope().staging_prefix(),
            "orgId/P1"
        );
    }

    #[test]
    fn test_scope_query_params() {
        assert!(Scope::Account.query_params().is_empty());
        let scope = Project::new("o", "p", "").scope();
        assert_eq!(
            scope.query_params(),
            vec![("orgIdentifier", "o"), ("projectIdentifier", "p")]
        );
    }
}
