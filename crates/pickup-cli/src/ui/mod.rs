//! Terminal output.
//!
//! Commands talk to the console through [`Output`], which implements the core
//! [`Reporter`](pickup_core::Reporter) so the reconciliation engine can report progress
//! without knowing about the terminal. Styling constants live in [`theme`].

pub mod output;
pub mod theme;

pub use output::Output;
pub use theme::Theme;
