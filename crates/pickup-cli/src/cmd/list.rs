//! List command

use std::path::Path;

use anyhow::{Context as _, Result};
use chrono::{DateTime, Local};
use pickup_core::{MirrorStore, Reporter};
use pickup_schema::PackageName;

use crate::ui::Output;
use crate::ui::theme::format_size;

/// List tracked packages, or the mirrored files of one package
pub async fn list(index_path: &Path, package: Option<&str>) -> Result<()> {
    let store = MirrorStore::new(index_path);
    let output = Output::new();

    match package {
        None => list_packages(&store, &output).await,
        Some(raw) => list_files(&store, &output, &PackageName::new(raw)?).await,
    }
}

async fn list_packages(store: &MirrorStore, output: &Output) -> Result<()> {
    let packages = store
        .list_packages()
        .await
        .context("Failed to read the root index")?;

    if packages.is_empty() {
        output.info("No packages in the local repository.");
        output.info("Run 'pypickup add <package>' to get started.");
        return Ok(());
    }

    for name in &packages {
        output.item(name);
    }
    println!();
    output.info(&format!(
        "{} package{} in {}",
        packages.len(),
        if packages.len() == 1 { "" } else { "s" },
        store.root().display()
    ));
    Ok(())
}

async fn list_files(store: &MirrorStore, output: &Output, package: &PackageName) -> Result<()> {
    if !store.package_exists(package).await? {
        output.warning(&format!(
            "'{package}' has not been added to the local repository yet. Run 'pypickup add {package}' first."
        ));
        return Ok(());
    }

    let doc = store.load_package_index(package).await?;
    if doc.is_empty() {
        output.info(&format!("No files mirrored for '{package}'."));
        return Ok(());
    }

    let dir = store.package_dir(package);
    let mut total_size: u64 = 0;
    for entry in doc.entries() {
        let detail = match tokio::fs::metadata(dir.join(&entry.filename)).await {
            Ok(meta) => {
                total_size += meta.len();
                let modified = meta
                    .modified()
                    .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                format!("{:>10}  {modified}", format_size(meta.len()))
            }
            Err(_) => "missing".to_string(),
        };
        output.row(&entry.filename, &detail);
    }

    println!();
    output.info(&format!(
        "{} file{}, {}",
        doc.len(),
        if doc.len() == 1 { "" } else { "s" },
        format_size(total_size)
    ));
    Ok(())
}
