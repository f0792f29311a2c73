//! On-disk mirror layout.
//!
//! ```text
//! <root>/index.html              root index, one anchor per tracked package
//! <root>/<name>/index.html       package index
//! <root>/<name>/<artifact>       downloaded artifacts
//! <root>/settings/               user settings (never a package)
//! ```
//!
//! Every index write goes to `<file>.tmp` first and is renamed over the target.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use pickup_schema::{ArtifactEntry, INDEX_FILE_NAME, IndexDocument, PackageName};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

use crate::paths::{SETTINGS_DIR, package_index_path, root_index_path};

/// Errors raised while reading or writing the mirror.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A filesystem operation failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path the operation touched.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The package name collides with a mirror-internal directory.
    #[error("'{0}' is reserved for mirror settings and cannot be tracked as a package")]
    Reserved(PackageName),
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// The local mirror rooted at one directory.
#[derive(Debug, Clone)]
pub struct MirrorStore {
    root: PathBuf,
}

impl MirrorStore {
    /// A store rooted at `root`. Nothing is touched until [`MirrorStore::init`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The mirror root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/index.html`
    pub fn root_index_path(&self) -> PathBuf {
        root_index_path(&self.root)
    }

    /// `<root>/<name>/`
    pub fn package_dir(&self, package: &PackageName) -> PathBuf {
        self.root.join(package)
    }

    /// `<root>/<name>/index.html`
    pub fn package_index_path(&self, package: &PackageName) -> PathBuf {
        package_index_path(&self.root, package)
    }

    /// Create the mirror root and an empty root index if they are missing.
    pub async fn init(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(io_err(&self.root))?;

        let index = self.root_index_path();
        if !fs::try_exists(&index).await.map_err(io_err(&index))? {
            debug!(path = %index.display(), "creating root index");
            persist(&index, &IndexDocument::new()).await?;
        }
        Ok(())
    }

    /// Whether the root index has an anchor for this package.
    pub async fn package_exists(&self, package: &PackageName) -> Result<bool, StoreError> {
        let root = load_index_document(&self.root_index_path()).await?;
        Ok(root.contains(package.as_str()))
    }

    /// Track a package: anchor it in the root index and create its directory and an empty
    /// package index.
    ///
    /// Returns `true` (without writing anything) if the package was already tracked.
    pub async fn add_package_anchor(&self, package: &PackageName) -> Result<bool, StoreError> {
        if package.as_str() == SETTINGS_DIR {
            return Err(StoreError::Reserved(package.clone()));
        }

        let index_path = self.root_index_path();
        let mut root = load_index_document(&index_path).await?;
        if root.contains(package.as_str()) {
            return Ok(true);
        }

        let dir = self.package_dir(package);
        fs::create_dir_all(&dir).await.map_err(io_err(&dir))?;

        let package_index = self.package_index_path(package);
        if !fs::try_exists(&package_index)
            .await
            .map_err(io_err(&package_index))?
        {
            persist(&package_index, &IndexDocument::for_package(package)).await?;
        }

        root.insert(ArtifactEntry::local(package.as_str()));
        persist(&index_path, &root).await?;
        Ok(false)
    }

    /// Stop tracking a package: drop its root anchor and delete its directory.
    ///
    /// Returns whether the package was tracked.
    pub async fn remove_package_anchor(&self, package: &PackageName) -> Result<bool, StoreError> {
        let index_path = self.root_index_path();
        let mut root = load_index_document(&index_path).await?;
        if root.remove(package.as_str()).is_none() {
            return Ok(false);
        }
        persist(&index_path, &root).await?;

        let dir = self.package_dir(package);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %dir.display(), "package directory was already gone");
            }
            Err(e) => return Err(io_err(&dir)(e)),
        }
        Ok(true)
    }

    /// Names of tracked packages, in root index order.
    pub async fn list_packages(&self) -> Result<Vec<String>, StoreError> {
        let root = load_index_document(&self.root_index_path()).await?;
        Ok(root.names().map(str::to_string).collect())
    }

    /// Load a package index. A missing or blank file yields the package's empty index,
    /// heading included.
    pub async fn load_package_index(
        &self,
        package: &PackageName,
    ) -> Result<IndexDocument, StoreError> {
        let doc = load_index_document(&self.package_index_path(package)).await?;
        if doc.is_empty() && doc.heading().is_none() {
            return Ok(IndexDocument::for_package(package));
        }
        Ok(doc)
    }

    /// Atomically rewrite a package index.
    pub async fn persist_package_index(
        &self,
        package: &PackageName,
        doc: &IndexDocument,
    ) -> Result<(), StoreError> {
        persist(&self.package_index_path(package), doc).await
    }

    /// Regenerate a package index from the files in its directory, sorted by filename.
    pub async fn rebuild_package_index(
        &self,
        package: &PackageName,
    ) -> Result<IndexDocument, StoreError> {
        let dir = self.package_dir(package);
        let mut files = Vec::new();
        let mut entries = fs::read_dir(&dir).await.map_err(io_err(&dir))?;
        while let Some(entry) = entries.next_entry().await.map_err(io_err(&dir))? {
            let file_type = entry.file_type().await.map_err(io_err(&entry.path()))?;
            if !file_type.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                warn!(path = %entry.path().display(), "skipping non UTF-8 file name");
                continue;
            };
            if name == INDEX_FILE_NAME || name.ends_with(".tmp") {
                continue;
            }
            files.push(name);
        }
        files.sort();

        let mut doc = IndexDocument::for_package(package);
        for name in files {
            doc.insert(ArtifactEntry::local(name));
        }
        self.persist_package_index(package, &doc).await?;
        Ok(doc)
    }

    /// Rebuild every package index and the root index from the package directories
    /// present under the mirror root. Returns the packages found, sorted.
    pub async fn rebuild_all(&self) -> Result<Vec<PackageName>, StoreError> {
        let mut packages = Vec::new();
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(io_err(&self.root))?;
        while let Some(entry) = entries.next_entry().await.map_err(io_err(&self.root))? {
            let file_type = entry.file_type().await.map_err(io_err(&entry.path()))?;
            if !file_type.is_dir() {
                continue;
            }
            let raw = entry.file_name().to_string_lossy().into_owned();
            if raw == SETTINGS_DIR {
                continue;
            }
            match PackageName::new(&raw) {
                Ok(name) if name.as_str() == raw => packages.push(name),
                _ => debug!(dir = %raw, "skipping directory that is not a package"),
            }
        }
        packages.sort();

        let mut root = IndexDocument::new();
        for package in &packages {
            self.rebuild_package_index(package).await?;
            root.insert(ArtifactEntry::local(package.as_str()));
        }
        persist(&self.root_index_path(), &root).await?;
        Ok(packages)
    }
}

/// Load an index document. A missing or blank file yields an empty shell.
pub async fn load_index_document(path: &Path) -> Result<IndexDocument, StoreError> {
    match fs::read_to_string(path).await {
        Ok(text) if text.trim().is_empty() => Ok(IndexDocument::new()),
        Ok(text) => Ok(IndexDocument::parse(&text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(IndexDocument::new()),
        Err(e) => Err(io_err(path)(e)),
    }
}

/// Rewrite an index document in full via a temporary sibling and a rename.
pub async fn persist(path: &Path, doc: &IndexDocument) -> Result<(), StoreError> {
    let temp_path = path.with_extension("html.tmp");
    fs::write(&temp_path, doc.render())
        .await
        .map_err(io_err(&temp_path))?;
    fs::rename(&temp_path, path).await.map_err(io_err(path))?;
    Ok(())
}
