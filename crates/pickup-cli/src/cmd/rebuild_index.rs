//! Rebuild-index command

use std::path::Path;

use anyhow::{Context as _, Result};
use pickup_core::{MirrorStore, Reporter};
use pickup_schema::PackageName;

use crate::ui::Output;

/// Regenerate index files from the artifacts present on disk
pub async fn rebuild_index(index_path: &Path, package: Option<&str>) -> Result<()> {
    let store = MirrorStore::new(index_path);
    let output = Output::new();

    if !tokio::fs::try_exists(store.root_index_path()).await? {
        output.warning("No local repository has been initialized yet.");
        output.info("Run 'pypickup add <package>' to create one.");
        return Ok(());
    }

    match package {
        Some(raw) => {
            let package = PackageName::new(raw)?;
            if !store.package_exists(&package).await? {
                output.warning(&format!(
                    "'{package}' has not been added to the local repository yet. Run 'pypickup add {package}' first."
                ));
                return Ok(());
            }
            let doc = store
                .rebuild_package_index(&package)
                .await
                .with_context(|| format!("Failed to rebuild the index of '{package}'"))?;
            output.success(&format!(
                "Rebuilt '{package}' index with {} file{}",
                doc.len(),
                if doc.len() == 1 { "" } else { "s" }
            ));
        }
        None => {
            let packages = store
                .rebuild_all()
                .await
                .context("Failed to rebuild the local repository")?;
            output.success(&format!(
                "Rebuilt the root index and {} package index{}",
                packages.len(),
                if packages.len() == 1 { "" } else { "es" }
            ));
        }
    }
    Ok(())
}
