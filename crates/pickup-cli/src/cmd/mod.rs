//! Command modules - one file per CLI command

pub mod add;
pub mod completions;
pub mod config;
pub mod list;
pub mod rebuild_index;
pub mod remove;
pub mod update;
