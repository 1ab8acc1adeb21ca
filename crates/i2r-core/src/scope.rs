//! Deciding which projects and services a run touches.
//!
//! Both filters use the same priority rule: a non-empty target list keeps
//! exactly its matches and the exclude list is ignored; otherwise a
//! non-empty exclude list drops its matches; otherwise everything is kept.
//! Empty strings in either list are ignored.

use rustc_hash::FxHashSet;

use crate::config::{MigrationPolicy, ServiceSelector};
use crate::types::Project;

/// Filters the discovered project list by name or identifier.
///
/// # Examples
///
/// ```
/// use i2r_core::{Project, ProjectFilter};
///
/// let projects = vec![
///     Project::new("o", "P1", "One"),
///     Project::new("o", "P2", "Two"),
///     Project::new("o", "P3", "Three"),
/// ];
/// let target = vec!["Three".to_owned(), "P1".to_owned()];
/// let kept = ProjectFilter::new(&target, &[]).apply(projects);
/// let ids: Vec<_> = kept.iter().map(|p| p.identifier.as_str()).collect();
/// assert_eq!(ids, ["P1", "P3"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter<'a> {
    target: FxHashSet<&'a str>,
    exclude: FxHashSet<&'a str>,
}

fn non_empty(entries: &[String]) -> FxHashSet<&str> {
    entries
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .collect()
}

impl<'a> ProjectFilter<'a> {
    /// Creates a filter from target and exclude lists.
    #[must_use]
    pub fn new(target: &'a [String], exclude: &'a [String]) -> Self {
        Self {
            target: non_empty(target),
            exclude: non_empty(exclude),
        }
    }

    /// Creates a filter from the policy's project lists.
    #[must_use]
    pub fn from_policy(policy: &'a MigrationPolicy) -> Self {
        Self::new(&policy.target_projects, &policy.exclude_projects)
    }

    /// Returns `true` if both lists are set, so the exclude list is ignored.
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        !self.target.is_empty() && !self.exclude.is_empty()
    }

    /// Returns `true` if `project` survives the filter.
    #[must_use]
    pub fn allows(&self, project: &Project) -> bool {
        let hit = |set: &FxHashSet<&str>| {
            set.contains(project.identifier.as_str()) || set.contains(project.name.as_str())
        };
        if !self.target.is_empty() {
            hit(&self.target)
        } else if !self.exclude.is_empty() {
            !hit(&self.exclude)
        } else {
            true
        }
    }

    /// Keeps the projects in scope, preserving their order.
    #[must_use]
    pub fn apply(&self, projects: Vec<Project>) -> Vec<Project> {
        if self.is_ambiguous() {
            tracing::warn!(
                "both target and exclude project lists are set; only the target list is applied"
            );
        }
        let total = projects.len();
        let kept: Vec<Project> = projects.into_iter().filter(|p| self.allows(p)).collect();
        tracing::debug!(total, kept = kept.len(), "resolved project scope");
        kept
    }
}

/// Filters services by `{serviceId: projectId}` selectors.
///
/// # Examples
///
/// ```
/// use i2r_core::{ServiceFilter, ServiceSelector};
///
/// let exclude = vec![ServiceSelector::new("svc1", "P1")];
/// let filter = ServiceFilter::new(&[], &exclude);
/// assert!(!filter.allows("svc1", "P1"));
/// assert!(filter.allows("svc1", "P2"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceFilter<'a> {
    target: &'a [ServiceSelector],
    exclude: &'a [ServiceSelector],
}

impl<'a> ServiceFilter<'a> {
    /// Creates a filter from target and exclude selectors.
    #[must_use]
    pub const fn new(target: &'a [ServiceSelector], exclude: &'a [ServiceSelector]) -> Self {
        Self { target, exclude }
    }

    /// Creates a filter from the policy's service selectors.
    #[must_use]
    pub fn from_policy(policy: &'a MigrationPolicy) -> Self {
        Self::new(&policy.target_services, &policy.exclude_services)
    }

    /// Returns `true` if both lists are set, so the exclude list is ignored.
    #[must_use]
    pub const fn is_ambiguous(&self) -> bool {
        !self.target.is_empty() && !self.exclude.is_empty()
    }

    /// Returns `true` if service `service` in project `project` is in scope.
    #[must_use]
    pub fn allows(&self, service: &str, project: &str) -> bool {
        let hit = |set: &[ServiceSelector]| set.iter().any(|s| s.matches(service, project));
        if !self.target.is_empty() {
            hit(self.target)
        } else if !self.exclude.is_empty() {
            !hit(self.exclude)
        } else {
            true
        }
    }
}
