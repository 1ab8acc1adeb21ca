//! Canonical remote file locations.
//!
//! [`derive_path`] maps an entity to the repository-relative path the
//! platform should commit it to. It is a pure function of the naming policy,
//! the owning project, and the entity's identifiers: the same inputs always
//! give the same path, so an interrupted run recomputes identical targets.
//!
//! Layouts, highest precedence first:
//!
//! | Policy | Shape |
//! |---|---|
//! | custom path | `<custom>/<flat>` |
//! | URL encoded | default layout with `/` replaced by `%2F` |
//! | alt layout | `account/<org>/<project>/<kind>/<flat>` |
//! | git experience | `.harness/orgs/<org>/projects/<project>/<git suffix>` |
//! | default | `<kind>/<org>/<project>/<flat>` |

use crate::config::NamingPolicy;
use crate::error::PathError;
use crate::types::{Entity, OverrideScope, OverrideV2, Project};

/// Computes the repository-relative path for `entity` in `project`.
///
/// # Errors
///
/// Returns [`PathError::UnknownOverrideScope`] when the git-experience layout
/// is selected for an override whose scope type has no known layout.
///
/// # Examples
///
/// ```
/// use i2r_core::{derive_path, Entity, NamingPolicy, Pipeline, Project, StoreType};
///
/// let project = Project::new("orgId", "P1", "Project One");
/// let pipeline = Entity::Pipeline(Pipeline {
///     identifier: "pipe1".to_owned(),
///     name: "Pipe 1".to_owned(),
///     store_type: StoreType::Inline,
/// });
///
/// let path = derive_path(&pipeline, &NamingPolicy::default(), &project).unwrap();
/// assert_eq!(path, "pipelines/orgId/P1/pipe1.yaml");
/// ```
pub fn derive_path(
    entity: &Entity,
    naming: &NamingPolicy,
    project: &Project,
) -> Result<String, PathError> {
    let org = project.org_identifier.as_str();
    let proj = project.identifier.as_str();
    let plural = entity.kind().plural();
    let flat = flat_suffix(entity);

    if let Some(custom) = naming.custom_path() {
        return Ok(format!("{custom}/{flat}"));
    }
    if naming.url_encode {
        return Ok(format!("{plural}/{org}/{proj}/{flat}").replace('/', "%2F"));
    }
    if naming.alt_layout {
        return Ok(format!("account/{org}/{proj}/{plural}/{flat}"));
    }
    if naming.git_experience {
        let suffix = git_suffix(entity)?;
        return Ok(format!(".harness/orgs/{org}/projects/{proj}/{suffix}"));
    }
    Ok(format!("{plural}/{org}/{proj}/{flat}"))
}

/// The file name (plus any parent segment) shared by every flat layout.
fn flat_suffix(entity: &Entity) -> String {
    match entity {
        Entity::Template(t) => format!("{}-{}.yaml", t.identifier, t.version_label),
        Entity::InputSet(i) => format!("{}/{}.yaml", i.pipeline_identifier, i.identifier),
        Entity::Infrastructure(i) => format!("{}/{}.yaml", i.environment_ref, i.identifier),
        other => format!("{}.yaml", other.identifier()),
    }
}

fn git_suffix(entity: &Entity) -> Result<String, PathError> {
    let suffix = match entity {
        Entity::Pipeline(p) => format!("pipelines/{}.yaml", p.identifier),
        Entity::Template(t) => format!("templates/{}/{}.yaml", t.identifier, t.version_label),
        Entity::Service(s) => format!("services/{}.yaml", s.identifier),
        Entity::Environment(e) => format!(
            "envs/{}/{}.yaml",
            e.environment_type.path_segment(),
            e.identifier
        ),
        Entity::Infrastructure(i) => format!(
            "envs/{}/{}/infras/{}.yaml",
            i.environment_type.path_segment(),
            i.environment_ref,
            i.identifier
        ),
        Entity::InputSet(i) => format!(
            "pipelines/{}/input_sets/{}.yaml",
            i.pipeline_identifier, i.identifier
        ),
        Entity::OverrideV2(o) => override_suffix(o)?,
    };
    Ok(suffix)
}

fn override_suffix(ov: &OverrideV2) -> Result<String, PathError> {
    let env = &ov.environment_ref;
    let unknown = || PathError::UnknownOverrideScope {
        identifier: ov.identifier.clone(),
        scope: ov.scope.to_string(),
    };
    let suffix = match &ov.scope {
        OverrideScope::EnvGlobal => format!("overrides/{env}/overrides.yaml"),
        OverrideScope::EnvService => {
            let service = ov.service().ok_or_else(unknown)?;
            format!("overrides/{env}/services/{service}/overrides.yaml")
        }
        OverrideScope::InfraGlobal => {
            let infra = ov.infra().ok_or_else(unknown)?;
            format!("overrides/{env}/infras/{infra}/overrides.yaml")
        }
        OverrideScope::InfraService => {
            let infra = ov.infra().ok_or_else(unknown)?;
            let service = ov.service().ok_or_else(unknown)?;
            format!("overrides/{env}/infras/{infra}/services/{service}/overrides.yaml")
        }
        OverrideScope::Unknown(_) => return Err(unknown()),
    };
    Ok(suffix)
}
