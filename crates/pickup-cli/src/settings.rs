//! Wheel filter settings file.
//!
//! ```toml
//! enabled = true
//! mode = "out"          # "in" keeps matching wheels, "out" drops them
//! combinator = "or"     # how field results combine
//!
//! [fields.python_tags]
//! combinator = "or"     # how this field's rules combine
//! rules = ["~pp", "~cp2", "<3.5"]
//!
//! [fields.abi_tags]
//! rules = ["~mu"]
//! ```
//!
//! A missing file disables filtering. A file that exists but does not parse, or that
//! holds an invalid rule, aborts the command before anything is fetched.

use std::path::{Path, PathBuf};

use pickup_schema::{ConfigError, FilterSettings, MirrorConfig, SelectionFlags};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid wheel filter in {}: {source}", path.display())]
    Rule {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },
}

/// Read wheel filter settings. `Ok(None)` when the file does not exist.
pub fn load_filter_settings(path: &Path) -> Result<Option<FilterSettings>, SettingsError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    toml::from_str(&text)
        .map(Some)
        .map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Build the per-invocation configuration from command flags and the settings file.
pub fn load_mirror_config(
    flags: SelectionFlags,
    filters_path: &Path,
) -> Result<MirrorConfig, SettingsError> {
    match load_filter_settings(filters_path)? {
        Some(settings) => {
            MirrorConfig::new(flags, &settings).map_err(|source| SettingsError::Rule {
                path: filters_path.to_path_buf(),
                source,
            })
        }
        None => Ok(MirrorConfig::with_flags(flags)),
    }
}
