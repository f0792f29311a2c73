//! Index documents: the anchor-list pages a simple repository is made of.
//!
//! The mirror keeps two kinds of documents on disk:
//!
//! ```text
//! <root>/index.html          # root: one anchor per tracked package, href "./<name>"
//! <root>/<name>/index.html   # package: "Links for <name>" + one anchor per artifact
//! ```
//!
//! Both are an ordered, name-unique list of [`ArtifactEntry`]. Insertion order is the
//! serialization order, and rendering is deterministic so a parse/render cycle is stable.

use scraper::{Html, Selector};

use crate::artifact::ArtifactEntry;

/// Prefix of the heading written at the top of a package index.
pub const HEADING_PREFIX: &str = "Links for ";

/// An ordered collection of anchors, unique by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexDocument {
    heading: Option<String>,
    entries: Vec<ArtifactEntry>,
}

impl IndexDocument {
    /// An empty document shell (the root index).
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty package index carrying the `Links for <package>` heading.
    pub fn for_package(package: &str) -> Self {
        Self {
            heading: Some(format!("{HEADING_PREFIX}{package}")),
            entries: Vec::new(),
        }
    }

    /// Parse a document from HTML text.
    ///
    /// Every `<a>` carrying an `href` becomes an entry named by its (trimmed) text. When
    /// two anchors share a name the first one wins. The first `<h1>` is kept as heading.
    /// Text that contains no anchors (including an empty string) parses to an empty shell.
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        let anchors = Selector::parse("a[href]").expect("anchor selector is valid");
        let headings = Selector::parse("h1").expect("heading selector is valid");

        let heading = document
            .select(&headings)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty());

        let mut doc = Self {
            heading,
            entries: Vec::new(),
        };
        for el in document.select(&anchors) {
            let name = el.text().collect::<String>().trim().to_string();
            if name.is_empty() {
                continue;
            }
            let href = el.value().attr("href").unwrap_or_default();
            doc.insert(ArtifactEntry::new(name, href));
        }
        doc
    }

    /// The document heading, if any.
    pub fn heading(&self) -> Option<&str> {
        self.heading.as_deref()
    }

    /// Entries in document order.
    pub fn entries(&self) -> &[ArtifactEntry] {
        &self.entries
    }

    /// Entry names in document order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.filename.as_str())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the document has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether an entry with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&ArtifactEntry> {
        self.entries.iter().find(|e| e.filename == name)
    }

    /// Append an entry unless one with the same name exists.
    ///
    /// Returns `true` if the entry was inserted, `false` if the name was already present
    /// (the existing entry is left untouched).
    pub fn insert(&mut self, entry: ArtifactEntry) -> bool {
        if self.contains(&entry.filename) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Remove the entry with this name, returning it if it existed.
    pub fn remove(&mut self, name: &str) -> Option<ArtifactEntry> {
        let pos = self.entries.iter().position(|e| e.filename == name)?;
        Some(self.entries.remove(pos))
    }

    /// Render the document as HTML.
    pub fn render(&self) -> String {
        let mut out = String::from("<!DOCTYPE html>\n<html>\n <body>\n");
        if let Some(heading) = &self.heading {
            out.push_str("  <h1>");
            out.push_str(&html_escape::encode_text(heading));
            out.push_str("</h1>\n");
        }
        for entry in &self.entries {
            out.push_str("  <a href=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(&entry.href));
            out.push_str("\">");
            out.push_str(&html_escape::encode_text(&entry.filename));
            out.push_str("</a>\n");
        }
        out.push_str(" </body>\n</html>\n");
        out
    }
}

impl std::fmt::Display for IndexDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_single_entry() {
        let mut doc = IndexDocument::new();
        assert!(doc.insert(ArtifactEntry::local("x")));

        let parsed = IndexDocument::parse(&doc.render());
        assert_eq!(parsed.entries(), &[ArtifactEntry::new("x", "./x")]);
        assert_eq!(parsed.heading(), None);
    }

    #[test]
    fn test_render_layout() {
        let mut doc = IndexDocument::for_package("bs4");
        doc.insert(ArtifactEntry::local("bs4-0.0.1.tar.gz"));
        doc.insert(ArtifactEntry::local("bs4-0.0.0.tar.gz"));

        let expected = "<!DOCTYPE html>\n<html>\n <body>\n  <h1>Links for bs4</h1>\n  \
            <a href=\"./bs4-0.0.1.tar.gz\">bs4-0.0.1.tar.gz</a>\n  \
            <a href=\"./bs4-0.0.0.tar.gz\">bs4-0.0.0.tar.gz</a>\n </body>\n</html>\n";
        assert_eq!(doc.render(), expected);
    }

    #[test]
    fn test_parse_remote_listing() {
        let html = r#"<!DOCTYPE html>
<html>
  <head><title>Links for demo</title></head>
  <body>
    <h1>Links for demo</h1>
    <a href="https://files.example.org/demo-1.0.tar.gz#sha256=abc" data-requires-python="&gt;=3.7">
      demo-1.0.tar.gz
    </a><br/>
    <a href="../../packages/demo-1.0-py3-none-any.whl">demo-1.0-py3-none-any.whl</a><br/>
    <a href="https://elsewhere/demo-1.0.tar.gz">demo-1.0.tar.gz</a>
    <a>no-href</a>
  </body>
</html>"#;
        let doc = IndexDocument::parse(html);
        assert_eq!(doc.heading(), Some("Links for demo"));
        assert_eq!(doc.len(), 2);
        assert_eq!(
            doc.get("demo-1.0.tar.gz").unwrap().href,
            "https://files.example.org/demo-1.0.tar.gz#sha256=abc"
        );
        assert!(doc.contains("demo-1.0-py3-none-any.whl"));
        assert!(!doc.contains("no-href"));
    }

    #[test]
    fn test_insert_is_unique_and_ordered() {
        let mut doc = IndexDocument::new();
        assert!(doc.insert(ArtifactEntry::local("b")));
        assert!(doc.insert(ArtifactEntry::local("a")));
        assert!(!doc.insert(ArtifactEntry::new("b", "elsewhere")));
        assert_eq!(doc.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(doc.get("b").unwrap().href, "./b");
    }

    #[test]
    fn test_remove() {
        let mut doc = IndexDocument::new();
        doc.insert(ArtifactEntry::local("a"));
        doc.insert(ArtifactEntry::local("b"));
        assert_eq!(doc.remove("a"), Some(ArtifactEntry::local("a")));
        assert_eq!(doc.remove("a"), None);
        assert_eq!(doc.names().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_empty_text_is_empty_shell() {
        let doc = IndexDocument::parse("");
        assert!(doc.is_empty());
        assert_eq!(doc, IndexDocument::new());
    }

    #[test]
    fn test_escaping_survives_round_trip() {
        let mut doc = IndexDocument::new();
        doc.insert(ArtifactEntry::new("a&b<c>", "./q?x=1&y=\"2\""));
        let parsed = IndexDocument::parse(&doc.render());
        assert_eq!(parsed.entries(), doc.entries());
    }
}
