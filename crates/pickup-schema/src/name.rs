//! Distribution names as they appear in the mirror layout.

use serde::{Deserialize, Serialize};

/// Errors raised when a distribution name cannot be used as a mirror key.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// The name is empty (or only separators).
    #[error("Empty package name")]
    Empty,

    /// The name would escape the mirror root once used as a directory.
    #[error("Invalid package name '{0}': must not contain path separators")]
    PathLike(String),
}

/// A normalized distribution name.
///
/// Normalization follows the simple-repository convention: lowercase, with every run
/// of `-`, `_` and `.` collapsed into a single `-`. The normalized form doubles as the
/// package directory name and the root index anchor text.
///
/// ```
/// use pickup_schema::PackageName;
///
/// let name = PackageName::new("Zope.Interface").unwrap();
/// assert_eq!(name.as_str(), "zope-interface");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageName(String);

impl PackageName {
    /// Validate and normalize a raw distribution name.
    ///
    /// # Errors
    ///
    /// Returns [`NameError::Empty`] for empty input and [`NameError::PathLike`] when the
    /// name contains `/`, `\` or other characters that cannot live in a single path segment.
    pub fn new(raw: &str) -> Result<Self, NameError> {
        let raw = raw.trim();
        if raw.contains(['/', '\\', ':']) || raw.chars().any(char::is_control) {
            return Err(NameError::PathLike(raw.to_string()));
        }

        let mut normalized = String::with_capacity(raw.len());
        let mut pending_sep = false;
        for c in raw.chars() {
            if matches!(c, '-' | '_' | '.') {
                pending_sep = true;
                continue;
            }
            if pending_sep && !normalized.is_empty() {
                normalized.push('-');
            }
            pending_sep = false;
            normalized.extend(c.to_lowercase());
        }

        if normalized.is_empty() {
            return Err(NameError::Empty);
        }
        Ok(Self(normalized))
    }

    /// Return the normalized name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PackageName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<PackageName> for String {
    fn from(name: PackageName) -> Self {
        name.0
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for PackageName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<std::path::Path> for PackageName {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}
