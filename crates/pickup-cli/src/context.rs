//! Shared state for the syncing commands.
//!
//! `add` and `update` need the same things: the mirror store, the remote base, the
//! invocation's [`MirrorConfig`], an HTTP fetcher and a reporter. [`Context`] groups them
//! and owns the per-package reconcile-and-persist step both commands end with.

use std::fmt;
use std::path::Path;

use anyhow::{Context as _, Result};
use pickup_core::{
    Fetch, Fetched, HttpFetcher, MirrorStore, Reconciler, ReconciliationReport, Reporter,
    listing_url,
};
use pickup_schema::{IndexDocument, MirrorConfig, PackageName};
use tracing::debug;

use crate::SyncArgs;
use crate::settings::load_mirror_config;
use crate::ui::Output;

pub struct Context {
    pub store: MirrorStore,
    pub remote: String,
    pub config: MirrorConfig,
    pub fetcher: HttpFetcher,
    pub reporter: Output,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("root", &self.store.root())
            .field("remote", &self.remote)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Validate the wheel filter settings and build the fetcher. Never touches the network.
    pub fn new(index_path: &Path, args: &SyncArgs) -> Result<Self> {
        let filters_path = args.filters_path(index_path);
        let config = load_mirror_config(args.flags(), &filters_path)?;
        debug!(
            filters = %filters_path.display(),
            enabled = config.filters_enabled,
            "loaded mirror configuration"
        );

        let fetcher = HttpFetcher::new(args.policy()).context("Failed to build HTTP client")?;

        Ok(Self {
            store: MirrorStore::new(index_path),
            remote: args.remote.clone(),
            config,
            fetcher,
            reporter: Output::new(),
        })
    }

    /// Warn when `--dev`/`--rc` may be undone by wheel filters.
    pub fn warn_flag_order(&self) {
        if self.config.filters_may_override_flags() {
            self.reporter.warning(
                "--dev/--rc are applied before wheel filters; \
                 filtered-out wheels stay excluded even if they are dev or rc releases.",
            );
        }
    }

    /// Fetch the remote listing of a package.
    pub async fn fetch_listing(&self, package: &PackageName) -> Result<Fetched> {
        let url = listing_url(&self.remote, package);
        self.fetcher.fetch(&url).await.with_context(|| {
            format!(
                "Package '{package}' was not found in the remote repository ({})",
                self.remote
            )
        })
    }

    /// Reconcile a package's local index with its listing and persist the result.
    pub async fn sync_package(
        &self,
        package: &PackageName,
        listing: &Fetched,
        local: IndexDocument,
    ) -> Result<ReconciliationReport> {
        let reconciler = Reconciler::new(&self.fetcher, &self.reporter, &self.config);
        let (doc, report) = reconciler
            .reconcile(
                &listing.text(),
                &listing.url,
                local,
                &self.store.package_dir(package),
            )
            .await?;

        self.store
            .persist_package_index(package, &doc)
            .await
            .with_context(|| format!("Failed to write the index of '{package}'"))?;

        for orphan in &report.orphan_local_names {
            self.reporter
                .warning(&format!("{orphan} is mirrored locally but no longer offered remotely"));
        }

        if report.attempted == 0 {
            self.reporter.info(&format!("'{package}' is up to date"));
        } else {
            self.reporter
                .summary_plain(report.succeeded, report.attempted, "files downloaded");
        }

        Ok(report)
    }
}

/// Print the closing line of a batch command and turn package failures into an error
/// so the process exits non-zero.
pub fn finish(reporter: &Output, total: usize, failed: usize, action: &str) -> Result<()> {
    if total > 1 {
        reporter.summary_plain(total - failed, total, action);
    }
    if failed > 0 {
        anyhow::bail!(
            "{failed} package{} failed",
            if failed == 1 { "" } else { "s" }
        );
    }
    Ok(())
}
