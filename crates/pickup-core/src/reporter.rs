//! Reporter trait for dependency injection
//!
//! This trait allows core logic to report progress and status without
//! being coupled to a specific terminal implementation.

/// Sink for user-facing progress and status lines.
pub trait Reporter: Send + Sync {
    /// Indicates a new section has started (e.g. "Adding 'requests'").
    fn section(&self, title: &str);

    /// An artifact download is starting; `position` is 1-based within `total`.
    fn downloading(&self, filename: &str, position: usize, total: usize);

    /// Marks an artifact as downloaded and stored.
    fn done(&self, filename: &str, size: Option<u64>);

    /// Marks an artifact as failed with a specific reason.
    fn failed(&self, filename: &str, reason: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a success message.
    fn success(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Log an error message.
    fn error(&self, msg: &str);

    /// Display a final `count/total` summary line.
    fn summary_plain(&self, count: usize, total: usize, status: &str);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, title: &str) {
        (**self).section(title);
    }
    fn downloading(&self, filename: &str, position: usize, total: usize) {
        (**self).downloading(filename, position, total);
    }
    fn done(&self, filename: &str, size: Option<u64>) {
        (**self).done(filename, size);
    }
    fn failed(&self, filename: &str, reason: &str) {
        (**self).failed(filename, reason);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn success(&self, msg: &str) {
        (**self).success(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
    fn error(&self, msg: &str) {
        (**self).error(msg);
    }
    fn summary_plain(&self, count: usize, total: usize, status: &str) {
        (**self).summary_plain(count, total, status);
    }
}

/// A no-op reporter for silent operations (e.g., testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn downloading(&self, _: &str, _: usize, _: usize) {}
    fn done(&self, _: &str, _: Option<u64>) {}
    fn failed(&self, _: &str, _: &str) {}
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn error(&self, _: &str) {}
    fn summary_plain(&self, _: usize, _: usize, _: &str) {}
}
