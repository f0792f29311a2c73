//! Remove command

use std::path::Path;

use anyhow::Result;
use pickup_core::{MirrorStore, Reporter};
use pickup_schema::PackageName;

use crate::context::finish;
use crate::ui::Output;

/// Stop mirroring packages and delete their directories
pub async fn remove(index_path: &Path, packages: &[String]) -> Result<()> {
    let store = MirrorStore::new(index_path);
    let reporter = Output::new();

    let mut failed = 0;
    for raw in packages {
        let result = async {
            let package = PackageName::new(raw)?;
            let existed = store.remove_package_anchor(&package).await?;
            anyhow::Ok((package, existed))
        }
        .await;

        match result {
            Ok((package, true)) => reporter.success(&format!("Removed '{package}'")),
            Ok((package, false)) => reporter.warning(&format!(
                "'{package}' is not in the local repository. Run 'pypickup add {package}' to start mirroring it."
            )),
            Err(e) => {
                reporter.error(&format!("{raw}: {e:#}"));
                failed += 1;
            }
        }
    }

    finish(&reporter, packages.len(), failed, "packages removed")
}
