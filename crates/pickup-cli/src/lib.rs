//! pypickup - a filtered local mirror of a Python simple index
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Keeps a reproducible subset of a remote simple repository on disk for offline or
//! restricted-network builds.
//!
//! # Directory Layout
//!
//! ```text
//! ./.pypickup/
//! ├── index.html              # One anchor per tracked package
//! ├── settings/
//! │   └── wheel-filters.toml  # Optional wheel filter rules
//! └── <package>/
//!     ├── index.html          # "Links for <package>" + one anchor per artifact
//!     └── <artifacts>         # Downloaded wheels and source archives
//! ```
//!
//! Point pip at the mirror with `--index-url file:///path/to/.pypickup/`.

pub mod cmd;
pub mod context;
pub mod settings;
pub mod ui;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use pickup_core::{
    DEFAULT_INDEX_PATH, DEFAULT_REMOTE, FetchPolicy, INDEX_PATH_ENV, REMOTE_ENV,
    filter_settings_path,
};
use pickup_schema::SelectionFlags;

pub use pickup_core::USER_AGENT;

#[derive(Debug, Parser)]
#[command(name = "pypickup")]
#[command(author, version, about = "pypickup - a filtered local mirror of a Python simple index")]
pub struct Cli {
    /// Show debug logs (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Local root path of the mirror
    #[arg(
        short = 'p',
        long,
        global = true,
        env = INDEX_PATH_ENV,
        default_value = DEFAULT_INDEX_PATH
    )]
    pub index_path: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start mirroring packages
    Add {
        /// Package name(s)
        #[arg(required = true)]
        packages: Vec<String>,
        #[command(flatten)]
        sync: SyncArgs,
    },
    /// Download what is new in the remote for tracked packages
    Update {
        /// Package name(s)
        #[arg(required = true)]
        packages: Vec<String>,
        #[command(flatten)]
        sync: SyncArgs,
    },
    /// Stop mirroring packages and delete their files
    Remove {
        /// Package name(s)
        #[arg(required = true)]
        packages: Vec<String>,
    },
    /// List tracked packages, or the files of one package
    List {
        /// Package whose mirrored files are listed
        package: Option<String>,
    },
    /// Inspect the wheel filter settings
    Config {
        /// Print the effective wheel filter settings
        #[arg(short, long)]
        show: bool,
        /// Wheel filter settings file [default: <index-path>/settings/wheel-filters.toml]
        #[arg(long, value_name = "FILE")]
        filters: Option<PathBuf>,
    },
    /// Regenerate index files from the artifacts on disk
    RebuildIndex {
        /// Package to rebuild (all packages and the root index if omitted)
        package: Option<String>,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

/// Selection, remote and network options shared by `add` and `update`.
#[derive(Debug, Clone, Args)]
pub struct SyncArgs {
    /// Remote simple repository
    #[arg(long, env = REMOTE_ENV, default_value = DEFAULT_REMOTE)]
    pub remote: String,

    /// Mirror source archives only (.zip, .tar.gz, ...), never wheels
    #[arg(short = 's', long = "only-src")]
    pub only_sources: bool,

    /// Also mirror development releases (.devN)
    #[arg(long = "dev")]
    pub include_devs: bool,

    /// Also mirror release candidates
    #[arg(long = "rc")]
    pub include_rcs: bool,

    /// Also mirror platform-specific wheels (only `any` wheels otherwise)
    #[arg(long = "platform-specific", visible_alias = "ps")]
    pub include_platform_specific: bool,

    /// Wheel filter settings file [default: <index-path>/settings/wheel-filters.toml]
    #[arg(long, value_name = "FILE")]
    pub filters: Option<PathBuf>,

    /// Retries before the final attempt of each request
    #[arg(long, default_value_t = pickup_core::fetch::DEFAULT_RETRIES)]
    pub retries: u32,

    /// Pause between retries, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 500)]
    pub retry_interval_ms: u64,

    /// Per-request timeout, in seconds
    #[arg(long, value_name = "SECS", default_value_t = 5)]
    pub timeout_secs: u64,
}

impl SyncArgs {
    pub fn flags(&self) -> SelectionFlags {
        SelectionFlags {
            only_sources: self.only_sources,
            include_devs: self.include_devs,
            include_rcs: self.include_rcs,
            include_platform_specific: self.include_platform_specific,
        }
    }

    pub fn policy(&self) -> FetchPolicy {
        FetchPolicy {
            retries: self.retries,
            timeout: Duration::from_secs(self.timeout_secs),
            retry_interval: Duration::from_millis(self.retry_interval_ms),
        }
    }

    /// The settings file to read, falling back to the one inside the mirror.
    pub fn filters_path(&self, index_path: &Path) -> PathBuf {
        resolve_filters_path(self.filters.as_deref(), index_path)
    }
}

pub fn resolve_filters_path(explicit: Option<&Path>, index_path: &Path) -> PathBuf {
    explicit.map_or_else(|| filter_settings_path(index_path), Path::to_path_buf)
}
