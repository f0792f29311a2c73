//! Add command

use std::path::Path;

use anyhow::{Context as _, Result};
use pickup_core::Reporter;
use pickup_schema::PackageName;

use crate::SyncArgs;
use crate::context::{Context, finish};

/// Start mirroring one or more packages
pub async fn add(index_path: &Path, packages: &[String], args: &SyncArgs) -> Result<()> {
    let ctx = Context::new(index_path, args)?;
    ctx.warn_flag_order();

    let mut failed = 0;
    for raw in packages {
        ctx.reporter.section(&format!("Adding '{raw}'"));
        if let Err(e) = add_one(&ctx, raw).await {
            ctx.reporter.error(&format!("{e:#}"));
            failed += 1;
        }
    }

    finish(&ctx.reporter, packages.len(), failed, "packages added")
}

async fn add_one(ctx: &Context, raw: &str) -> Result<()> {
    let package = PackageName::new(raw)?;

    // The listing is fetched first: a package the remote does not know is never tracked.
    let listing = ctx.fetch_listing(&package).await?;

    ctx.store
        .init()
        .await
        .context("Failed to initialize the local repository")?;

    if ctx.store.add_package_anchor(&package).await? {
        ctx.reporter.info(&format!(
            "'{package}' is already in the local repository. Run 'pypickup update {package}' to synchronize it with the remote."
        ));
        return Ok(());
    }

    let local = ctx.store.load_package_index(&package).await?;
    ctx.sync_package(&package, &listing, local).await?;
    Ok(())
}
