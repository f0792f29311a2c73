//! Artifact filenames: classification and wheel metadata.
//!
//! Every classifier here is a pure function over a filename. Anything that is neither a
//! well-formed wheel nor a recognized source archive is [`ArtifactKind::Unrecognized`];
//! callers log and drop those rather than failing.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static WHEEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<dist>[A-Za-z0-9](?:[A-Za-z0-9._]*[A-Za-z0-9])?)-(?P<version>[A-Za-z0-9_.!+]+)(?:-(?P<build>[0-9][A-Za-z0-9_.]*))?-(?P<py>[A-Za-z0-9_]+(?:\.[A-Za-z0-9_]+)*)-(?P<abi>[A-Za-z0-9_]+(?:\.[A-Za-z0-9_]+)*)-(?P<plat>[A-Za-z0-9_]+(?:\.[A-Za-z0-9_]+)*)\.[Ww][Hh][Ll]$",
    )
    .expect("wheel filename pattern is valid")
});

static SOURCE_ARCHIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*)\.(zip|tar\.gz|tar\.bz2|tar\.xz|tar\.Z|tar)$")
        .expect("source archive pattern is valid")
});

static DEV_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.dev\d+").expect("dev release pattern is valid"));

static RC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+rc\d+").expect("release candidate pattern is valid"));

/// The platform tag of a pure, platform-independent wheel.
pub const ANY_PLATFORM: &str = "any";

/// One anchor of an index document: a display name and the link it points to.
///
/// In a package index the name is an artifact filename; in the root index it is a
/// tracked package name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactEntry {
    /// Anchor text: the artifact filename (or package name in the root index).
    pub filename: String,
    /// Anchor target as written in the document.
    pub href: String,
}

impl ArtifactEntry {
    /// Create an entry from its name and link.
    pub fn new(filename: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            href: href.into(),
        }
    }

    /// Create an entry whose link is relative to the document: `./<name>`.
    pub fn local(filename: impl Into<String>) -> Self {
        let filename = filename.into();
        let href = format!("./{filename}");
        Self { filename, href }
    }

    /// Classify this entry's filename.
    pub fn kind(&self) -> ArtifactKind {
        classify(&self.filename)
    }

    /// Wheel metadata, derived on demand from the filename.
    pub fn wheel(&self) -> Option<WheelName> {
        WheelName::parse(&self.filename)
    }
}

/// Metadata encoded in a wheel filename.
///
/// `{distribution}-{version}(-{build})?-{python tags}-{abi tags}-{platform tags}.whl`,
/// where each tag segment may be a `.`-separated compressed set (`py2.py3`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelName {
    /// Distribution name as spelled in the filename.
    pub distribution: String,
    /// Version string.
    pub version: String,
    /// Optional build tag.
    pub build: Option<String>,
    /// Python implementation/version tags (e.g. `cp39`, `py3`).
    pub python_tags: Vec<String>,
    /// ABI tags (e.g. `cp39`, `abi3`, `none`).
    pub abi_tags: Vec<String>,
    /// Platform tags (e.g. `manylinux2014_x86_64`, `any`).
    pub platform_tags: Vec<String>,
}

impl WheelName {
    /// Parse a wheel filename. Returns `None` when the name is not a well-formed wheel.
    pub fn parse(filename: &str) -> Option<Self> {
        let caps = WHEEL_RE.captures(filename)?;
        let tags = |group: &str| -> Vec<String> {
            caps[group].split('.').map(str::to_string).collect()
        };

        Some(Self {
            distribution: caps["dist"].to_string(),
            version: caps["version"].to_string(),
            build: caps.name("build").map(|m| m.as_str().to_string()),
            python_tags: tags("py"),
            abi_tags: tags("abi"),
            platform_tags: tags("plat"),
        })
    }

    /// Whether the wheel targets specific platforms rather than `any`.
    pub fn is_platform_specific(&self) -> bool {
        self.platform_tags.iter().any(|tag| tag != ANY_PLATFORM)
    }
}

/// Extension of a recognized source archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceExt {
    /// `.zip`
    Zip,
    /// `.tar.gz`
    TarGz,
    /// `.tar.bz2`
    TarBz2,
    /// `.tar.xz`
    TarXz,
    /// `.tar.Z`
    TarZ,
    /// `.tar`
    Tar,
}

impl SourceExt {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "zip" => Some(Self::Zip),
            "tar.gz" => Some(Self::TarGz),
            "tar.bz2" => Some(Self::TarBz2),
            "tar.xz" => Some(Self::TarXz),
            "tar.Z" => Some(Self::TarZ),
            "tar" => Some(Self::Tar),
            _ => None,
        }
    }

    /// The extension without its leading dot, as it appears in filenames.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::TarGz => "tar.gz",
            Self::TarBz2 => "tar.bz2",
            Self::TarXz => "tar.xz",
            Self::TarZ => "tar.Z",
            Self::Tar => "tar",
        }
    }

    /// Whether this is one of the tar-family extensions.
    pub fn is_tar_family(self) -> bool {
        !matches!(self, Self::Zip)
    }
}

impl std::fmt::Display for SourceExt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source archive filename split into its base name and extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceArchive {
    /// Everything before the archive extension (e.g. `pkg-1.0`).
    pub base: String,
    /// The archive extension.
    pub ext: SourceExt,
}

/// What a listing filename turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactKind {
    /// A well-formed wheel.
    Wheel(WheelName),
    /// A zip or tar-family source archive.
    SourceArchive(SourceArchive),
    /// Neither; dropped from consideration.
    Unrecognized,
}

/// Whether the name can safely be used as a single file inside a package directory.
fn is_plain_filename(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// Classify a listing filename.
pub fn classify(name: &str) -> ArtifactKind {
    if !is_plain_filename(name) {
        return ArtifactKind::Unrecognized;
    }
    if let Some(wheel) = WheelName::parse(name) {
        return ArtifactKind::Wheel(wheel);
    }
    match source_archive(name) {
        Some(archive) => ArtifactKind::SourceArchive(archive),
        None => ArtifactKind::Unrecognized,
    }
}

/// Whether the filename carries the wheel extension, regardless of whether it parses.
pub fn has_wheel_extension(name: &str) -> bool {
    std::path::Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("whl"))
}

/// True iff the name has the wheel extension and parses into wheel segments.
pub fn is_wheel(name: &str) -> bool {
    is_plain_filename(name) && WheelName::parse(name).is_some()
}

/// Split a source archive name into base name and extension.
pub fn source_archive(name: &str) -> Option<SourceArchive> {
    if !is_plain_filename(name) {
        return None;
    }
    let caps = SOURCE_ARCHIVE_RE.captures(name)?;
    Some(SourceArchive {
        base: caps[1].to_string(),
        ext: SourceExt::from_suffix(&caps[2])?,
    })
}

/// True iff the name contains a `.dev<digits>` segment.
pub fn is_dev_release(name: &str) -> bool {
    DEV_RE.is_match(name)
}

/// True iff the name contains `<digits>rc<digits>`.
pub fn is_release_candidate(name: &str) -> bool {
    RC_RE.is_match(name)
}

/// True iff the name is a wheel whose platform tag is not `any`.
pub fn is_platform_specific_wheel(name: &str) -> bool {
    is_plain_filename(name)
        && WheelName::parse(name).is_some_and(|wheel| wheel.is_platform_specific())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wheel_parsing() {
        let wheel = WheelName::parse(
            "numpy-1.21.0-cp39-cp39-manylinux_2_17_x86_64.manylinux2014_x86_64.whl",
        )
        .unwrap();
        assert_eq!(wheel.distribution, "numpy");
        assert_eq!(wheel.version, "1.21.0");
        assert_eq!(wheel.build, None);
        assert_eq!(wheel.python_tags, vec!["cp39"]);
        assert_eq!(wheel.abi_tags, vec!["cp39"]);
        assert_eq!(
            wheel.platform_tags,
            vec!["manylinux_2_17_x86_64", "manylinux2014_x86_64"]
        );
        assert!(wheel.is_platform_specific());
    }

    #[test]
    fn test_wheel_with_build_tag_and_compressed_tags() {
        let wheel = WheelName::parse("six-1.16.0-1-py2.py3-none-any.whl").unwrap();
        assert_eq!(wheel.build.as_deref(), Some("1"));
        assert_eq!(wheel.python_tags, vec!["py2", "py3"]);
        assert_eq!(wheel.abi_tags, vec!["none"]);
        assert!(!wheel.is_platform_specific());
    }

    #[test]
    fn test_malformed_wheel_is_not_a_wheel() {
        assert!(has_wheel_extension("broken-wheel.whl"));
        assert!(!is_wheel("broken-wheel.whl"));
        assert_eq!(classify("broken-wheel.whl"), ArtifactKind::Unrecognized);
        assert!(!is_platform_specific_wheel("broken-wheel.whl"));
    }

    #[test]
    fn test_source_archive_split() {
        let archive = source_archive("pkg-1.0.tar.gz").unwrap();
        assert_eq!(archive.base, "pkg-1.0");
        assert_eq!(archive.ext, SourceExt::TarGz);

        let archive = source_archive("pkg-1.0.zip").unwrap();
        assert_eq!(archive.ext, SourceExt::Zip);
        assert!(!archive.ext.is_tar_family());

        assert_eq!(source_archive("pkg-1.0.tar.Z").unwrap().ext, SourceExt::TarZ);
        assert_eq!(source_archive("pkg-1.0.tar").unwrap().base, "pkg-1.0");
        assert!(source_archive("pkg-1.0.exe").is_none());
        assert!(source_archive("pkg-1.0.tgz").is_none());
    }

    #[test]
    fn test_release_markers() {
        assert!(is_dev_release("pkg-1.0.dev3.tar.gz"));
        assert!(!is_dev_release("pkg-1.0.devel.tar.gz"));
        assert!(is_release_candidate("pkg-2.0rc1.tar.gz"));
        assert!(!is_release_candidate("pkg-rc.tar.gz"));
    }

    #[test]
    fn test_platform_specific_wheel() {
        assert!(is_platform_specific_wheel(
            "pkg-1.0-cp39-cp39-win_amd64.whl"
        ));
        assert!(!is_platform_specific_wheel("pkg-1.0-py3-none-any.whl"));
        assert!(!is_platform_specific_wheel("pkg-1.0.tar.gz"));
    }

    #[test]
    fn test_empty_and_path_like_names_are_unrecognized() {
        for name in ["", "..", "../evil-1.0.tar.gz", "a/b-1.0-py3-none-any.whl"] {
            assert_eq!(classify(name), ArtifactKind::Unrecognized, "{name}");
            assert!(!is_wheel(name));
            assert!(source_archive(name).is_none());
        }
        assert!(!is_dev_release(""));
        assert!(!is_release_candidate(""));
    }
}
