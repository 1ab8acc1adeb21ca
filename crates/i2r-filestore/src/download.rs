//! Phase 1: mirroring the platform file store into the staging tree.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use i2r_core::{FileStoreEntry, Project, Scope};
use i2r_platform::PlatformApi;

use crate::error::FileStoreError;

/// Directory under the staging root that holds the mirror.
pub const MIRROR_DIR: &str = "filestore";

/// One file that could not be mirrored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedFile {
    /// Scope label of the entry.
    pub scope: String,
    /// File store path of the entry.
    pub path: String,
    /// Why it failed.
    pub reason: String,
}

/// What the download phase did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    /// Local paths of the files written.
    pub written: Vec<Utf8PathBuf>,
    /// Folder markers skipped without a fetch.
    pub folders_skipped: usize,
    /// Files that could not be downloaded or written.
    pub failed: Vec<FailedFile>,
    /// Org/project scopes whose listing failed.
    pub failed_scopes: Vec<String>,
}

impl DownloadReport {
    /// Returns `true` if every listed file was mirrored.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.failed_scopes.is_empty()
    }
}

/// Downloads every file store entry into `<staging>/filestore/<scope>/<path>`.
#[derive(Debug)]
pub struct FileStoreDownloader<'a, P: ?Sized> {
    platform: &'a P,
    staging_dir: Utf8PathBuf,
}

impl<'a, P: PlatformApi + ?Sized> FileStoreDownloader<'a, P> {
    /// Creates a downloader writing below `staging_dir`.
    pub fn new(platform: &'a P, staging_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            platform,
            staging_dir: staging_dir.into(),
        }
    }

    /// Returns the local path an entry is written to.
    ///
    /// # Errors
    ///
    /// Returns [`FileStoreError::UnsafePath`] if the entry's path would
    /// leave its scope directory.
    pub fn local_path(&self, entry: &FileStoreEntry) -> Result<Utf8PathBuf, FileStoreError> {
        let relative = Utf8Path::new(entry.relative_path());
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Utf8Component::Normal(_) | Utf8Component::CurDir));
        if escapes || relative.as_str().is_empty() {
            return Err(FileStoreError::UnsafePath(entry.path.clone()));
        }
        Ok(self
            .staging_dir
            .join(MIRROR_DIR)
            .join(entry.scope.staging_prefix())
            .join(relative))
    }

    /// Mirrors the account, every organization, and every project in
    /// `projects`.
    ///
    /// # Errors
    ///
    /// Fails if the account-level file store or the organization list
    /// cannot be listed. Listing failures for a single organization or
    /// project, and per-file failures, are recorded in the report.
    pub async fn download(&self, projects: &[Project]) -> Result<DownloadReport, FileStoreError> {
        let mut report = DownloadReport::default();

        let account = self.list(&Scope::Account).await?;
        self.mirror(&account, &mut report).await;

        let organizations = self
            .platform
            .list_organizations()
            .await
            .map_err(|source| FileStoreError::Listing {
                scope: "organizations".to_owned(),
                source,
            })?;

        let nested = organizations
            .into_iter()
            .map(|org| Scope::Org {
                org: org.identifier,
            })
            .chain(projects.iter().map(Project::scope));
        for scope in nested {
            match self.list(&scope).await {
                Ok(entries) => self.mirror(&entries, &mut report).await,
                Err(err) => {
                    tracing::error!(scope = %scope.label(), error = %err, "skipping file store scope");
                    report.failed_scopes.push(scope.label());
                }
            }
        }

        tracing::info!(
            written = report.written.len(),
            folders = report.folders_skipped,
            failed = report.failed.len(),
            "file store download finished"
        );
        Ok(report)
    }

    async fn list(&self, scope: &Scope) -> Result<Vec<FileStoreEntry>, FileStoreError> {
        self.platform
            .list_file_store(scope)
            .await
            .map_err(|source| FileStoreError::Listing {
                scope: scope.label(),
                source,
            })
    }

    async fn mirror(&self, entries: &[FileStoreEntry], report: &mut DownloadReport) {
        for entry in entries {
            if !entry.is_file() {
                tracing::debug!(path = %entry.path, "skipping folder");
                report.folders_skipped += 1;
                continue;
            }
            match self.fetch(entry).await {
                Ok(path) => {
                    tracing::debug!(%path, "downloaded file");
                    report.written.push(path);
                }
                Err(err) => {
                    tracing::error!(path = %entry.path, error = %err, "file download failed");
                    report.failed.push(FailedFile {
                        scope: entry.scope.label(),
                        path: entry.path.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }
    }

    async fn fetch(&self, entry: &FileStoreEntry) -> Result<Utf8PathBuf, FileStoreError> {
        let target = self.local_path(entry)?;
        let bytes = self
            .platform
            .download_file(entry)
            .await
            .map_err(|source| FileStoreError::Download {
                path: entry.path.clone(),
                source,
            })?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| FileStoreError::io(parent, source))?;
        }
        tokio::fs::write(&target, bytes)
            .await
            .map_err(|source| FileStoreError::io(target.clone(), source))?;
        Ok(target)
    }
}
