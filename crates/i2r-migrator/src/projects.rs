//! Project discovery.

use i2r_core::{MigrationPolicy, Project, ProjectFilter};
use i2r_platform::PlatformApi;

use crate::error::MigrateError;

/// Lists the account's projects and keeps the ones the policy selects.
///
/// Ordering follows the platform listing. When both a target and an
/// exclude list are configured only the target list applies.
///
/// # Errors
///
/// Fails if the project listing fails.
pub async fn resolve_projects<P: PlatformApi + ?Sized>(
    platform: &P,
    policy: &MigrationPolicy,
) -> Result<Vec<Project>, MigrateError> {
    let all = platform
        .list_projects()
        .await
        .map_err(|source| MigrateError::listing("projects", "account", source))?;
    let discovered = all.len();
    let projects = ProjectFilter::from_policy(policy).apply(all);
    tracing::info!(discovered, selected = projects.len(), "resolved projects");
    Ok(projects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::policy;
    use i2r_platform::fake::FakePlatform;

    fn fake() -> FakePlatform {
        let fake = FakePlatform::new();
        fake.edit(|s| {
            s.projects = vec![
                Project::new("o", "P1", "Alpha"),
                Project::new("o", "P2", "Beta"),
                Project::new("o", "P3", "Gamma"),
            ];
        });
        fake
    }

    fn ids(projects: &[Project]) -> Vec<&str> {
        projects.iter().map(|p| p.identifier.as_str()).collect()
    }

    #[tokio::test]
    async fn test_no_lists_keeps_everything() {
        let projects = resolve_projects(&fake(), &policy()).await.unwrap();
        assert_eq!(ids(&projects), vec!["P1", "P2", "P3"]);
    }

    #[tokio::test]
    async fn test_target_list_wins_over_exclude() {
        let mut policy = policy();
        policy.target_projects = vec!["P2".to_owned()];
        policy.exclude_projects = vec!["P2".to_owned()];
        let projects = resolve_projects(&fake(), &policy).await.unwrap();
        assert_eq!(ids(&projects), vec!["P2"]);
    }

    #[tokio::test]
    async fn test_listing_failure_is_fatal() {
        let fake = fake();
        fake.edit(|s| {
            s.failing_listings.insert("list_projects");
        });
        let err = resolve_projects(&fake, &policy()).await.unwrap_err();
        assert!(matches!(err, MigrateError::Listing { .. }));
    }
}
