//! Selection, fetch and reconciliation engine for the pypickup mirror.
//!
//! Everything here runs sequentially: one package is fetched, selected, diffed,
//! downloaded and persisted before the caller moves on to the next.

pub mod dedup;
pub mod fetch;
pub mod filter;
pub mod paths;
pub mod reconcile;
pub mod reporter;
pub mod store;

pub use dedup::SourceArchiveDeduplicator;
pub use fetch::{FailureKind, Fetch, FetchError, FetchPolicy, Fetched, HttpFetcher};
pub use filter::{ScalarOrSet, include, wheel_included};
pub use paths::*;
pub use reconcile::{
    ArtifactError, ArtifactFailure, Plan, ReconcileError, Reconciler, ReconciliationReport,
    Selection, plan, select,
};
pub use reporter::{NullReporter, Reporter};
pub use store::{MirrorStore, StoreError, load_index_document, persist};

/// User Agent string for every request the mirror makes.
pub const USER_AGENT: &str = concat!("pypickup/", env!("CARGO_PKG_VERSION"));
