//! CLI entry point for the inline-to-remote migration tool.
//!
//! Moves inline pipelines, input sets, templates, services, environments,
//! infrastructure definitions, and overrides to git, mirrors the file store
//! into a git branch, and repoints service manifests at the mirror.
//!
//! # Usage
//!
//! ```bash
//! # Move pipelines and their input sets in two projects
//! inline-to-remote --config config.yaml --pipelines --inputsets --target-projects P1,P2
//!
//! # Everything, against prod3
//! inline-to-remote --config config.yaml --all --prod3
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod cli;

use clap::Parser;
use color_eyre::eyre::WrapErr;
use i2r_core::{MigrationPolicy, Project};
use i2r_filestore::{
    DownloadReport, FileStoreDownloader, GitPublisher, SystemGit, resolve_remote_url,
};
use i2r_migrator::{EntityMigrator, ManifestRewriter, log_outcome, log_rewrite, resolve_projects};
use i2r_platform::{ClientSettings, HttpPlatform};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `info` level by default.
/// The HTTP stack is filtered to `warn` level.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn"))
    });

    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_ansi(use_ansi))
        .with(filter)
        .init();
}

fn platform(policy: &MigrationPolicy) -> color_eyre::Result<HttpPlatform> {
    HttpPlatform::new(ClientSettings {
        base_url: policy.base_url.clone(),
        account: policy.account.clone(),
        api_key: policy.api_key.clone(),
        timeout: policy.http_timeout,
    })
    .wrap_err("failed to build the platform client")
}

// =============================================================================
// PHASES
// =============================================================================

/// Mirrors the file store and pushes it to the publish branch.
async fn publish_filestore(
    platform: &HttpPlatform,
    policy: &MigrationPolicy,
    projects: &[Project],
) -> color_eyre::Result<()> {
    let config = &policy.filestore;
    let remote_url = resolve_remote_url(platform, config, &policy.git).await?;
    info!(staging = %config.staging_dir, "downloading file store");

    let report = FileStoreDownloader::new(platform, config.staging_dir.clone())
        .download(projects)
        .await?;
    log_download(&report);

    let publisher = GitPublisher::new(SystemGit, config.staging_dir.clone());
    let branch = config.branch.clone();
    let publish = tokio::task::spawn_blocking(move || publisher.publish(&remote_url, &branch))
        .await
        .wrap_err("git publish task panicked")??;
    info!(
        steps = publish.steps.len(),
        created_branch = publish.created_branch,
        "file store published"
    );
    Ok(())
}

fn log_download(report: &DownloadReport) {
    info!(
        written = report.written.len(),
        folders_skipped = report.folders_skipped,
        failed = report.failed.len(),
        "file store download summary"
    );
    for failed in &report.failed {
        tracing::warn!(scope = %failed.scope, path = %failed.path, reason = %failed.reason, "file not mirrored");
    }
    for scope in &report.failed_scopes {
        tracing::warn!(%scope, "file store scope not mirrored");
    }
}

/// Repoints manifests at the published mirror.
async fn rewrite_manifests(
    platform: &HttpPlatform,
    policy: &MigrationPolicy,
    projects: &[Project],
) -> color_eyre::Result<usize> {
    let rewriter = ManifestRewriter::connect(platform, policy).await?;
    let mut reports = Vec::new();
    if policy.kinds.service_manifests {
        reports.push(rewriter.rewrite_services(projects).await?);
    }
    if policy.kinds.service_overrides {
        reports.push(rewriter.rewrite_service_overrides(projects).await?);
        reports.push(rewriter.rewrite_overrides_v2(projects).await?);
    }
    for report in &reports {
        log_rewrite(report);
    }
    Ok(reports.iter().map(|r| r.failed.len()).sum())
}

async fn run(policy: MigrationPolicy) -> color_eyre::Result<()> {
    let platform = platform(&policy)?;
    let projects = resolve_projects(&platform, &policy).await?;
    if projects.is_empty() {
        tracing::warn!("no projects in scope");
    }

    let mut failures = 0;
    if policy.kinds.kinds().next().is_some() {
        let outcome = EntityMigrator::new(&platform, &policy).run(&projects).await?;
        log_outcome(&outcome);
        failures += outcome.failed_count();
    }

    if policy.kinds.filestore {
        publish_filestore(&platform, &policy, &projects).await?;
    }

    if policy.kinds.rewrites() {
        failures += rewrite_manifests(&platform, &policy, &projects).await?;
    }

    if failures > 0 {
        tracing::warn!(failures, "migration finished with failures");
    } else {
        info!("migration finished");
    }
    Ok(())
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Resolve and validate the policy
    let policy = cli.policy()?;
    info!(
        account = %policy.account,
        base_url = %policy.base_url,
        "starting migration"
    );

    run(policy).await
}
