//! Update command

use std::path::Path;

use anyhow::Result;
use pickup_core::Reporter;
use pickup_schema::PackageName;

use crate::SyncArgs;
use crate::context::{Context, finish};

/// Download what is new in the remote for already tracked packages
pub async fn update(index_path: &Path, packages: &[String], args: &SyncArgs) -> Result<()> {
    let ctx = Context::new(index_path, args)?;
    ctx.warn_flag_order();

    let mut failed = 0;
    for raw in packages {
        ctx.reporter.section(&format!("Updating '{raw}'"));
        if let Err(e) = update_one(&ctx, raw).await {
            ctx.reporter.error(&format!("{e:#}"));
            failed += 1;
        }
    }

    finish(&ctx.reporter, packages.len(), failed, "packages updated")
}

async fn update_one(ctx: &Context, raw: &str) -> Result<()> {
    let package = PackageName::new(raw)?;

    if !ctx.store.package_exists(&package).await? {
        ctx.reporter.warning(&format!(
            "'{package}' has not been added to the local repository yet. Run 'pypickup add {package}' first."
        ));
        return Ok(());
    }

    let listing = ctx.fetch_listing(&package).await?;
    let local = ctx.store.load_package_index(&package).await?;
    ctx.sync_package(&package, &listing, local).await?;
    Ok(())
}
