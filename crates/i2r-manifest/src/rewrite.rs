//! Repointing file store references at the published git mirror.
//!
//! The file store publisher lays out files as
//! `filestore/{account,<org>,<org>/<project>}/<path>` in the mirror
//! repository. A manifest owned by scope `S` references a file either by a
//! path in its own scope (`/charts/app.yaml`) or by an explicit scope prefix
//! (`account:/charts/app.yaml`, `org:/charts/app.yaml`). [`map_reference`]
//! turns each form into its mirror path.

use i2r_core::Scope;

use crate::document::{ManifestEntry, Store};

/// Store type of the platform's internal file store.
pub const INTERNAL_STORE: &str = "Harness";

/// Fetch type written into every rewritten store.
const FETCH_BY_BRANCH: &str = "Branch";

/// Root directory of the mirror inside the publish repository.
const MIRROR_ROOT: &str = "filestore";

/// Maps a connector type to the store type manifests expect.
///
/// # Examples
///
/// ```
/// use i2r_manifest::normalize_store_type;
///
/// assert_eq!(normalize_store_type("Gitlab"), "GitLab");
/// assert_eq!(normalize_store_type("Github"), "Github");
/// ```
#[must_use]
pub fn normalize_store_type(connector_type: &str) -> String {
    match connector_type {
        "Gitlab" => "GitLab".to_owned(),
        other => other.to_owned(),
    }
}

/// Maps a file store reference owned by `scope` to its mirror path.
///
/// References already under the mirror root are returned unchanged, so
/// rewriting a document twice is a no-op.
///
/// # Examples
///
/// ```
/// use i2r_core::Scope;
/// use i2r_manifest::map_reference;
///
/// let scope = Scope::Project { org: "o".to_owned(), project: "p".to_owned() };
/// assert_eq!(map_reference("/charts/a.yaml", &scope), "filestore/o/p/charts/a.yaml");
/// assert_eq!(map_reference("account:/a.yaml", &scope), "filestore/account/a.yaml");
/// assert_eq!(map_reference("org:/a.yaml", &scope), "filestore/o/a.yaml");
/// ```
#[must_use]
pub fn map_reference(reference: &str, scope: &Scope) -> String {
    if reference.starts_with("filestore/") {
        return reference.to_owned();
    }
    let (prefix, rest) = if let Some(rest) = reference.strip_prefix("account:") {
        (Scope::Account.staging_prefix(), rest)
    } else if let Some(rest) = reference.strip_prefix("org:") {
        let org_scope = scope
            .org()
            .map_or(Scope::Account, |org| Scope::Org { org: org.to_owned() });
        (org_scope.staging_prefix(), rest)
    } else {
        (scope.staging_prefix(), reference)
    };
    format!("{MIRROR_ROOT}/{prefix}/{}", rest.trim_start_matches('/'))
}

/// Where rewritten manifests should point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteTarget<'a> {
    /// Store type (normalized connector type).
    pub store_type: String,
    /// Branch the mirror was pushed to.
    pub branch: &'a str,
    /// Connector used to read the mirror.
    pub connector_ref: &'a str,
}

impl<'a> RewriteTarget<'a> {
    /// Creates a target, normalizing `connector_type`.
    #[must_use]
    pub fn new(connector_type: &str, branch: &'a str, connector_ref: &'a str) -> Self {
        Self {
            store_type: normalize_store_type(connector_type),
            branch,
            connector_ref,
        }
    }
}

/// What [`rewrite_manifests`] did to a manifest list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteSummary {
    /// Identifiers of rewritten manifests.
    pub rewritten: Vec<String>,
    /// Identifiers of manifests left alone because they already use git.
    pub already_remote: Vec<String>,
}

impl RewriteSummary {
    /// Returns `true` if the owning document must be re-submitted.
    #[inline]
    #[must_use]
    pub fn updated(&self) -> bool {
        !self.rewritten.is_empty()
    }
}

/// Repoints internal-store manifests at the mirror.
///
/// Every entry whose store is [`INTERNAL_STORE`] is rewritten: its files
/// become git paths under the mirror, `files` is cleared, and branch,
/// connector, and fetch type come from `target`. With `force`, entries
/// already on git are rewritten as well, taking their existing files (or
/// paths, if there are no files) as the source.
///
/// Entries without a store are ignored.
pub fn rewrite_manifests(
    entries: &mut [ManifestEntry],
    target: &RewriteTarget<'_>,
    scope: &Scope,
    force: bool,
) -> RewriteSummary {
    let mut summary = RewriteSummary::default();
    for entry in entries {
        let manifest = &mut entry.manifest;
        let Some(store) = manifest.spec.store.as_mut() else {
            continue;
        };
        let internal = store.store_type == INTERNAL_STORE;
        if !internal && !force {
            tracing::debug!(manifest = %manifest.identifier, "manifest already uses git");
            summary.already_remote.push(manifest.identifier.clone());
            continue;
        }

        let sources = take_sources(store, internal);
        let paths = sources.iter().map(|r| map_reference(r, scope)).collect();
        store.store_type.clone_from(&target.store_type);
        store.spec.paths = Some(paths);
        store.spec.files = None;
        store.spec.branch = Some(target.branch.to_owned());
        store.spec.connector_ref = Some(target.connector_ref.to_owned());
        store.spec.git_fetch_type = Some(FETCH_BY_BRANCH.to_owned());

        if let Some(values) = manifest.spec.values_paths.as_mut() {
            for value in values.iter_mut() {
                *value = map_reference(value, scope);
            }
        }
        tracing::debug!(
            manifest = %manifest.identifier,
            paths = ?store.spec.paths,
            "rewrote manifest store"
        );
        summary.rewritten.push(manifest.identifier.clone());
    }
    summary
}

fn take_sources(store: &mut Store, internal: bool) -> Vec<String> {
    let files = store.spec.files.take().unwrap_or_default();
    if internal || !files.is_empty() {
        files
    } else {
        store.spec.paths.take().unwrap_or_default()
    }
}
