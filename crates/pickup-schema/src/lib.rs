//! Shared types and on-disk index format for the pypickup mirror.
//!
//! Nothing in this crate performs I/O: it names artifacts, classifies filenames, models
//! the anchor-list index documents and compiles wheel filter settings. The engines that
//! fetch, select and persist live in `pickup-core`.

pub mod artifact;
pub mod config;
pub mod filter;
pub mod index;
pub mod name;

// Re-exports
pub use artifact::{
    ArtifactEntry, ArtifactKind, SourceArchive, SourceExt, WheelName, classify,
    has_wheel_extension, is_dev_release, is_platform_specific_wheel, is_release_candidate,
    is_wheel, source_archive,
};
pub use config::{MirrorConfig, SelectionFlags};
pub use filter::{
    Combinator, ConfigError, FieldSettings, FilterField, FilterGroup, FilterMode, FilterOp,
    FilterRule, FilterSet, FilterSettings, GroupSettings,
};
pub use index::IndexDocument;
pub use name::{NameError, PackageName};

/// File name of every index document in the mirror.
pub const INDEX_FILE_NAME: &str = "index.html";
