//! Mirror layout and command-line defaults.

use std::path::{Path, PathBuf};

use pickup_schema::{INDEX_FILE_NAME, PackageName};

/// Environment variable overriding the mirror root.
pub const INDEX_PATH_ENV: &str = "PYPICKUP_INDEX_PATH";

/// Mirror root used when neither a flag nor the environment names one.
pub const DEFAULT_INDEX_PATH: &str = "./.pypickup/";

/// Environment variable overriding the remote simple repository.
pub const REMOTE_ENV: &str = "PYPICKUP_REMOTE";

/// The public simple repository.
pub const DEFAULT_REMOTE: &str = "https://pypi.org/simple";

/// Directory (under the mirror root) holding user settings.
pub const SETTINGS_DIR: &str = "settings";

/// Wheel filter settings file name inside [`SETTINGS_DIR`].
pub const FILTER_SETTINGS_FILE: &str = "wheel-filters.toml";

/// Default wheel filter settings path for a mirror root.
pub fn filter_settings_path(root: &Path) -> PathBuf {
    root.join(SETTINGS_DIR).join(FILTER_SETTINGS_FILE)
}

/// URL of a distribution's listing on the remote: `<base>/<name>`.
pub fn listing_url(remote: &str, package: &PackageName) -> String {
    format!("{}/{}", remote.trim_end_matches('/'), package)
}

/// Root index path: `<root>/index.html`.
pub fn root_index_path(root: &Path) -> PathBuf {
    root.join(INDEX_FILE_NAME)
}

/// Package index path: `<root>/<name>/index.html`.
pub fn package_index_path(root: &Path, package: &PackageName) -> PathBuf {
    root.join(package).join(INDEX_FILE_NAME)
}
