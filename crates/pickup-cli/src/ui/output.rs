//! Console reporter.
//!
//! Everything is printed synchronously, in call order: packages are processed one at a
//! time, so there is never more than one line of progress in flight.

use crossterm::style::Stylize;
use pickup_core::Reporter;

use super::theme::{Theme, format_size};

/// Prints progress and status lines to stdout (errors and warnings to stderr).
#[derive(Debug, Clone, Default)]
pub struct Output {
    theme: Theme,
}

impl Output {
    /// Create a console reporter with the default theme.
    pub fn new() -> Self {
        Self::default()
    }

    /// Print one `name  detail` row, as used by `list`.
    pub fn row(&self, name: &str, detail: &str) {
        println!(
            "  {} {}",
            format!("{name:<48}").with(self.theme.colors.name),
            detail.with(self.theme.colors.secondary)
        );
    }

    /// Print a row with no detail column.
    pub fn item(&self, name: &str) {
        println!("  {}", name.with(self.theme.colors.name));
    }
}

impl Reporter for Output {
    fn section(&self, title: &str) {
        println!();
        println!(
            "{} {}",
            title.bold(),
            "─".repeat(40).with(self.theme.colors.header)
        );
    }

    fn downloading(&self, filename: &str, position: usize, total: usize) {
        println!(
            "  {} {} {}",
            self.theme.icons.active.with(self.theme.colors.secondary),
            filename.with(self.theme.colors.name),
            format!("[{position}/{total}]").with(self.theme.colors.secondary)
        );
    }

    fn done(&self, filename: &str, size: Option<u64>) {
        let size = size.map(format_size).unwrap_or_default();
        println!(
            "  {} {} {}",
            self.theme.icons.success.with(self.theme.colors.success),
            filename,
            size.with(self.theme.colors.secondary)
        );
    }

    fn failed(&self, filename: &str, reason: &str) {
        eprintln!(
            "  {} {} {}",
            self.theme.icons.error.with(self.theme.colors.error),
            filename,
            reason.with(self.theme.colors.error)
        );
    }

    fn info(&self, msg: &str) {
        println!("  {} {}", self.theme.icons.info, msg);
    }

    fn success(&self, msg: &str) {
        println!(
            "  {} {}",
            self.theme.icons.success.with(self.theme.colors.success),
            msg
        );
    }

    fn warning(&self, msg: &str) {
        eprintln!(
            "  {} {}",
            self.theme.icons.warning.with(self.theme.colors.warning),
            msg.with(self.theme.colors.warning)
        );
    }

    fn error(&self, msg: &str) {
        eprintln!(
            "  {} {}",
            self.theme.icons.error.with(self.theme.colors.error),
            msg.with(self.theme.colors.error)
        );
    }

    fn summary_plain(&self, count: usize, total: usize, status: &str) {
        let msg = format!("{count}/{total} {status}");
        if count == total {
            self.success(&msg);
        } else {
            self.warning(&msg);
        }
    }
}
