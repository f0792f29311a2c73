//! Reconciliation of a remote listing against the local package index.
//!
//! The pipeline is split into pure stages so each can be tested on its own:
//!
//! 1. [`select`] applies the dev / release-candidate / platform gates, then the wheel
//!    filter, then source archive deduplication. Gates always run before filters.
//! 2. [`plan`] diffs the selection against the local index: what to download, and which
//!    local entries no longer appear remotely (orphans, reported but never deleted).
//! 3. [`Reconciler::reconcile`] drives the fetcher over the plan, writing each artifact
//!    before its anchor is appended, in selection order.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use pickup_schema::{
    ArtifactEntry, ArtifactKind, IndexDocument, MirrorConfig, has_wheel_extension,
    is_dev_release, is_platform_specific_wheel, is_release_candidate,
};
use reqwest::Url;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::dedup::SourceArchiveDeduplicator;
use crate::fetch::{Fetch, FetchError};
use crate::filter::wheel_included;
use crate::reporter::Reporter;

/// Failures that stop a reconciliation before any download starts.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// The listing URL cannot serve as a base for artifact links.
    #[error("Invalid listing URL '{url}': {message}")]
    ListingUrl {
        /// The URL as given.
        url: String,
        /// Parser detail.
        message: String,
    },

    /// The package directory could not be created.
    #[error("Cannot prepare package directory {}: {source}", path.display())]
    PackageDir {
        /// Directory that was being created.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Why a single artifact was not mirrored.
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// The anchor's href could not be resolved against the listing URL.
    #[error("Invalid link '{href}': {message}")]
    Link {
        /// The href as listed.
        href: String,
        /// Parser detail.
        message: String,
    },

    /// The download failed after retries.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The downloaded bytes could not be written.
    #[error("Cannot write {}: {source}", path.display())]
    Write {
        /// Destination file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// A per-artifact failure recorded in the report.
#[derive(Debug)]
pub struct ArtifactFailure {
    /// Artifact filename.
    pub filename: String,
    /// What went wrong.
    pub error: ArtifactError,
}

/// The remote listing after gates, filters and deduplication.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Kept entries: wheels in listing order, then source archive winners.
    pub entries: Vec<ArtifactEntry>,
    /// Entries dropped by the dev / rc / platform gates.
    pub gated: usize,
    /// Wheels dropped by the wheel filter or by sources-only mode.
    pub filtered: usize,
    /// Source archives that lost deduplication.
    pub duplicates: usize,
    /// Names that are neither wheels nor source archives.
    pub unrecognized: usize,
}

/// Select the remote entries to mirror.
pub fn select(remote: &IndexDocument, config: &MirrorConfig) -> Selection {
    let mut selection = Selection::default();
    let mut dedup = SourceArchiveDeduplicator::new();
    let mut sources = 0usize;

    for entry in remote.entries() {
        let name = entry.filename.as_str();

        if (!config.include_devs && is_dev_release(name))
            || (!config.include_rcs && is_release_candidate(name))
            || (!config.include_platform_specific && is_platform_specific_wheel(name))
        {
            debug!(name, "dropped by release gates");
            selection.gated += 1;
            continue;
        }

        match entry.kind() {
            ArtifactKind::Wheel(wheel) => {
                if !config.only_sources && wheel_included(&wheel, config) {
                    selection.entries.push(entry.clone());
                } else {
                    debug!(name, "wheel filtered out");
                    selection.filtered += 1;
                }
            }
            ArtifactKind::SourceArchive(archive) => {
                sources += 1;
                dedup.push(&archive, entry.clone());
            }
            ArtifactKind::Unrecognized => {
                debug!(name, "unrecognized artifact name, skipping");
                selection.unrecognized += 1;
            }
        }
    }

    selection.duplicates = sources - dedup.len();
    selection.entries.extend(dedup.winners());
    selection
}

/// What a reconciliation has to do.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Plan {
    /// Selected entries missing locally, in selection order.
    pub to_download: Vec<ArtifactEntry>,
    /// Local names absent from the selection.
    pub orphans: Vec<String>,
}

/// Diff a selection against the local index.
///
/// With `only_sources`, local wheels are expected to be missing from the selection and
/// are not reported as orphans.
pub fn plan(selected: &[ArtifactEntry], local: &IndexDocument, only_sources: bool) -> Plan {
    let to_download = selected
        .iter()
        .filter(|entry| !local.contains(&entry.filename))
        .cloned()
        .collect();

    let remote: HashSet<&str> = selected.iter().map(|e| e.filename.as_str()).collect();
    let orphans = local
        .names()
        .filter(|name| !remote.contains(name))
        .filter(|name| !(only_sources && has_wheel_extension(name)))
        .map(str::to_string)
        .collect();

    Plan {
        to_download,
        orphans,
    }
}

/// Outcome of a reconciliation.
#[derive(Debug, Default)]
pub struct ReconciliationReport {
    /// Downloads attempted.
    pub attempted: usize,
    /// Downloads written and indexed.
    pub succeeded: usize,
    /// Local entries no longer offered remotely.
    pub orphan_local_names: Vec<String>,
    /// Per-artifact failures, in attempt order.
    pub failures: Vec<ArtifactFailure>,
}

impl ReconciliationReport {
    /// Whether every attempted download succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives a reconciliation for one package.
#[derive(Debug)]
pub struct Reconciler<'a, F, R> {
    fetcher: &'a F,
    reporter: &'a R,
    config: &'a MirrorConfig,
}

impl<'a, F: Fetch, R: Reporter> Reconciler<'a, F, R> {
    /// Borrow the collaborators for one or more reconciliations.
    pub fn new(fetcher: &'a F, reporter: &'a R, config: &'a MirrorConfig) -> Self {
        Self {
            fetcher,
            reporter,
            config,
        }
    }

    /// Bring `local` up to date with the listing fetched from `listing_url`.
    ///
    /// Artifacts are written into `package_dir` and appended to the document in selection
    /// order. A failed artifact is reported and skipped; it never aborts the rest.
    ///
    /// # Errors
    ///
    /// Only when the listing URL is unusable or the package directory cannot be created.
    pub async fn reconcile(
        &self,
        listing_html: &str,
        listing_url: &str,
        mut local: IndexDocument,
        package_dir: &Path,
    ) -> Result<(IndexDocument, ReconciliationReport), ReconcileError> {
        let base = link_base(listing_url)?;

        let remote = IndexDocument::parse(listing_html);
        let selection = select(&remote, self.config);
        debug!(
            listed = remote.len(),
            selected = selection.entries.len(),
            gated = selection.gated,
            filtered = selection.filtered,
            duplicates = selection.duplicates,
            unrecognized = selection.unrecognized,
            "listing selected"
        );

        let plan = plan(&selection.entries, &local, self.config.only_sources);
        for orphan in &plan.orphans {
            warn!(name = %orphan, "local artifact is no longer offered remotely");
        }

        let mut report = ReconciliationReport {
            orphan_local_names: plan.orphans,
            ..ReconciliationReport::default()
        };

        if plan.to_download.is_empty() {
            return Ok((local, report));
        }

        fs::create_dir_all(package_dir)
            .await
            .map_err(|source| ReconcileError::PackageDir {
                path: package_dir.to_path_buf(),
                source,
            })?;

        let total = plan.to_download.len();
        for (i, entry) in plan.to_download.into_iter().enumerate() {
            report.attempted += 1;
            self.reporter.downloading(&entry.filename, i + 1, total);

            match self.download(&base, &entry, package_dir).await {
                Ok(size) => {
                    self.reporter.done(&entry.filename, Some(size));
                    local.insert(ArtifactEntry::local(entry.filename));
                    report.succeeded += 1;
                }
                Err(error) => {
                    warn!(name = %entry.filename, "download failed: {error}");
                    self.reporter.failed(&entry.filename, &error.to_string());
                    report.failures.push(ArtifactFailure {
                        filename: entry.filename,
                        error,
                    });
                }
            }
        }

        info!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            "reconciliation finished"
        );
        Ok((local, report))
    }

    async fn download(
        &self,
        base: &Url,
        entry: &ArtifactEntry,
        package_dir: &Path,
    ) -> Result<u64, ArtifactError> {
        let mut url = base.join(&entry.href).map_err(|e| ArtifactError::Link {
            href: entry.href.clone(),
            message: e.to_string(),
        })?;
        // Digest fragments (`#sha256=...`) are never sent.
        url.set_fragment(None);

        let fetched = self.fetcher.fetch(url.as_str()).await?;

        let dest = package_dir.join(&entry.filename);
        fs::write(&dest, &fetched.body)
            .await
            .map_err(|source| ArtifactError::Write { path: dest, source })?;

        Ok(fetched.body.len() as u64)
    }
}

/// Base URL for a listing's links. The listing is a directory page, so a URL without a
/// trailing slash still resolves `name.tar.gz` inside it.
fn link_base(listing_url: &str) -> Result<Url, ReconcileError> {
    let mut base = Url::parse(listing_url).map_err(|e| ReconcileError::ListingUrl {
        url: listing_url.to_string(),
        message: e.to_string(),
    })?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bytes::Bytes;
    use pickup_schema::{FilterSettings, SelectionFlags};
    use tempfile::TempDir;

    use super::*;
    use crate::fetch::{FailureKind, Fetched};
    use crate::reporter::NullReporter;

    const LISTING_URL: &str = "https://repo.example/simple/pkg/";

    /// Serves canned bodies keyed by URL and records every request.
    #[derive(Default)]
    struct FakeFetcher {
        bodies: HashMap<String, Bytes>,
        requests: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        /// Serves each name's own bytes at `<listing>/<name>`.
        fn serving(names: &[&str]) -> Self {
            let bodies = names
                .iter()
                .map(|n| (format!("{LISTING_URL}{n}"), Bytes::from(n.to_string())))
                .collect();
            Self {
                bodies,
                requests: Mutex::default(),
            }
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetch for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<Fetched, FetchError> {
            self.requests.lock().unwrap().push(url.to_string());
            match self.bodies.get(url) {
                Some(body) => Ok(Fetched {
                    body: body.clone(),
                    status: "200 OK".to_string(),
                    url: url.to_string(),
                }),
                None => Err(FetchError {
                    kind: FailureKind::Http,
                    url: url.to_string(),
                    status: Some(404),
                    message: "not found".to_string(),
                }),
            }
        }
    }

    fn listing(names: &[&str]) -> String {
        let mut doc = IndexDocument::new();
        for name in names {
            doc.insert(ArtifactEntry::new(*name, format!("./{name}#sha256=00")));
        }
        doc.render()
    }

    fn local(names: &[&str]) -> IndexDocument {
        let mut doc = IndexDocument::for_package("pkg");
        for name in names {
            doc.insert(ArtifactEntry::local(*name));
        }
        doc
    }

    fn names(entries: &[ArtifactEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.filename.as_str()).collect()
    }

    fn sources_only() -> MirrorConfig {
        MirrorConfig::with_flags(SelectionFlags {
            only_sources: true,
            ..SelectionFlags::default()
        })
    }

    #[test]
    fn test_select_keeps_wheels_then_source_winners() {
        let remote = IndexDocument::parse(&listing(&[
            "pkg-1.0.tar.gz",
            "pkg-1.0-py3-none-any.whl",
            "pkg-1.0.zip",
            "pkg-1.1.tar.gz",
            "README.txt",
        ]));
        let selection = select(&remote, &MirrorConfig::default());
        assert_eq!(
            names(&selection.entries),
            ["pkg-1.0-py3-none-any.whl", "pkg-1.0.zip", "pkg-1.1.tar.gz"]
        );
        assert_eq!(selection.duplicates, 1);
        assert_eq!(selection.unrecognized, 1);
    }

    #[test]
    fn test_select_gates() {
        let remote = IndexDocument::parse(&listing(&[
            "pkg-1.0.dev1.tar.gz",
            "pkg-1.0rc1.tar.gz",
            "pkg-1.0-cp39-cp39-manylinux1_x86_64.whl",
            "pkg-1.0.tar.gz",
        ]));

        let selection = select(&remote, &MirrorConfig::default());
        assert_eq!(names(&selection.entries), ["pkg-1.0.tar.gz"]);
        assert_eq!(selection.gated, 3);

        let everything = MirrorConfig::with_flags(SelectionFlags {
            include_devs: true,
            include_rcs: true,
            include_platform_specific: true,
            ..SelectionFlags::default()
        });
        assert_eq!(select(&remote, &everything).entries.len(), 4);
    }

    #[test]
    fn test_flags_apply_before_filters() {
        let remote = IndexDocument::parse(&listing(&[
            "pkg-2.0rc1-py3-none-any.whl",
            "pkg-1.0-py3-none-any.whl",
        ]));
        let settings: FilterSettings = toml::from_str(
            r#"
            enabled = true
            mode = "out"
            [fields.version]
            rules = ["~rc"]
            "#,
        )
        .unwrap();
        let config = MirrorConfig::new(
            SelectionFlags {
                include_rcs: true,
                ..SelectionFlags::default()
            },
            &settings,
        )
        .unwrap();

        // The rc passes the gate because of the flag, then the filter drops it anyway.
        let selection = select(&remote, &config);
        assert_eq!(names(&selection.entries), ["pkg-1.0-py3-none-any.whl"]);
        assert_eq!(selection.gated, 0);
        assert_eq!(selection.filtered, 1);
    }

    #[test]
    fn test_only_sources_drops_wheels() {
        let remote = IndexDocument::parse(&listing(&[
            "pkg-1.0-py3-none-any.whl",
            "pkg-1.0.tar.gz",
        ]));
        let selection = select(&remote, &sources_only());
        assert_eq!(names(&selection.entries), ["pkg-1.0.tar.gz"]);
    }

    #[test]
    fn test_plan_diff_and_orphans() {
        let selected = vec![
            ArtifactEntry::local("a"),
            ArtifactEntry::local("b"),
            ArtifactEntry::local("c"),
        ];
        let plan = plan(&selected, &local(&["b", "gone"]), false);
        assert_eq!(names(&plan.to_download), ["a", "c"]);
        assert_eq!(plan.orphans, ["gone"]);
    }

    #[test]
    fn test_plan_ignores_local_wheels_in_sources_mode() {
        let selected = vec![ArtifactEntry::local("pkg-1.0.tar.gz")];
        let existing = local(&["pkg-1.0.tar.gz", "pkg-1.0-py3-none-any.whl"]);
        assert!(plan(&selected, &existing, true).orphans.is_empty());
        assert_eq!(
            plan(&selected, &existing, false).orphans,
            ["pkg-1.0-py3-none-any.whl"]
        );
    }

    #[tokio::test]
    async fn test_reconcile_appends_in_scan_order() {
        let tmp = TempDir::new().unwrap();
        let names_remote = ["pkg-1.0.tar.gz", "pkg-1.1.tar.gz", "pkg-1.2.tar.gz"];
        let fetcher = FakeFetcher::serving(&names_remote);
        let config = MirrorConfig::default();
        let reconciler = Reconciler::new(&fetcher, &NullReporter, &config);

        let (doc, report) = reconciler
            .reconcile(
                &listing(&names_remote),
                LISTING_URL,
                local(&["pkg-1.1.tar.gz"]),
                tmp.path(),
            )
            .await
            .unwrap();

        assert_eq!(
            fetcher.requests(),
            [
                format!("{LISTING_URL}pkg-1.0.tar.gz"),
                format!("{LISTING_URL}pkg-1.2.tar.gz"),
            ]
        );
        assert_eq!(
            doc.names().collect::<Vec<_>>(),
            ["pkg-1.1.tar.gz", "pkg-1.0.tar.gz", "pkg-1.2.tar.gz"]
        );
        assert_eq!(doc.get("pkg-1.0.tar.gz").unwrap().href, "./pkg-1.0.tar.gz");
        assert_eq!(report.attempted, 2);
        assert_eq!(report.succeeded, 2);
        assert!(report.orphan_local_names.is_empty());
        assert_eq!(
            std::fs::read(tmp.path().join("pkg-1.2.tar.gz")).unwrap(),
            b"pkg-1.2.tar.gz"
        );
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let names_remote = ["pkg-1.0.tar.gz", "pkg-1.0-py3-none-any.whl"];
        let fetcher = FakeFetcher::serving(&names_remote);
        let config = MirrorConfig::default();
        let reconciler = Reconciler::new(&fetcher, &NullReporter, &config);
        let html = listing(&names_remote);

        let (first, _) = reconciler
            .reconcile(&html, LISTING_URL, local(&[]), tmp.path())
            .await
            .unwrap();
        let (second, report) = reconciler
            .reconcile(&html, LISTING_URL, first.clone(), tmp.path())
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(report.attempted, 0);
        assert_eq!(fetcher.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_download_does_not_abort_others() {
        let tmp = TempDir::new().unwrap();
        // Only the second artifact is served; the first one 404s.
        let fetcher = FakeFetcher::serving(&["pkg-1.1.tar.gz"]);
        let config = MirrorConfig::default();
        let reconciler = Reconciler::new(&fetcher, &NullReporter, &config);

        let (doc, report) = reconciler
            .reconcile(
                &listing(&["pkg-1.0.tar.gz", "pkg-1.1.tar.gz"]),
                LISTING_URL,
                local(&[]),
                tmp.path(),
            )
            .await
            .unwrap();

        assert_eq!(doc.names().collect::<Vec<_>>(), ["pkg-1.1.tar.gz"]);
        assert_eq!(report.attempted, 2);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].filename, "pkg-1.0.tar.gz");
        assert!(matches!(
            report.failures[0].error,
            ArtifactError::Fetch(FetchError {
                kind: FailureKind::Http,
                ..
            })
        ));
        assert!(!tmp.path().join("pkg-1.0.tar.gz").exists());
    }

    #[tokio::test]
    async fn test_sources_only_keeps_local_wheels_quietly() {
        let tmp = TempDir::new().unwrap();
        let fetcher = FakeFetcher::default();
        let config = sources_only();
        let reconciler = Reconciler::new(&fetcher, &NullReporter, &config);
        let existing = local(&["pkg-1.0.tar.gz", "pkg-1.0-py3-none-any.whl"]);

        let (doc, report) = reconciler
            .reconcile(
                &listing(&["pkg-1.0.tar.gz", "pkg-1.0-py3-none-any.whl"]),
                LISTING_URL,
                existing.clone(),
                tmp.path(),
            )
            .await
            .unwrap();

        assert_eq!(doc, existing);
        assert!(report.orphan_local_names.is_empty());
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_listing_url() {
        let tmp = TempDir::new().unwrap();
        let fetcher = FakeFetcher::default();
        let config = MirrorConfig::default();
        let reconciler = Reconciler::new(&fetcher, &NullReporter, &config);
        let err = reconciler
            .reconcile("", "not a url", local(&[]), tmp.path())
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::ListingUrl { .. }));
    }

    #[tokio::test]
    async fn test_relative_links_resolve_inside_unslashed_listing() {
        let tmp = TempDir::new().unwrap();
        let fetcher = FakeFetcher::serving(&["pkg-1.0.tar.gz", "pkg-1.0-py3-none-any.whl"]);
        let config = MirrorConfig::default();
        let reconciler = Reconciler::new(&fetcher, &NullReporter, &config);
        let html = r#"<!DOCTYPE html>
<html><body>
<a href="pkg-1.0.tar.gz#sha256=00">pkg-1.0.tar.gz</a>
<a href="./pkg-1.0-py3-none-any.whl">pkg-1.0-py3-none-any.whl</a>
</body></html>
"#;

        let (_, report) = reconciler
            .reconcile(
                html,
                LISTING_URL.trim_end_matches('/'),
                local(&[]),
                tmp.path(),
            )
            .await
            .unwrap();

        assert_eq!(report.succeeded, 2);
        assert_eq!(
            fetcher.requests(),
            [
                format!("{LISTING_URL}pkg-1.0-py3-none-any.whl"),
                format!("{LISTING_URL}pkg-1.0.tar.gz"),
            ]
        );
    }

    #[test]
    fn test_link_base_keeps_absolute_links() {
        let base = link_base("https://repo.example/simple/pkg").unwrap();
        assert_eq!(base.as_str(), LISTING_URL);
        assert_eq!(
            base.join("https://files.example.org/pkg-1.0.zip").unwrap().as_str(),
            "https://files.example.org/pkg-1.0.zip"
        );
        assert_eq!(link_base(LISTING_URL).unwrap().as_str(), LISTING_URL);
    }
}
