//! One source archive per base name.
//!
//! Releases are often published as both `.zip` and `.tar.gz`. For each base name the
//! first tar-family archive is kept unless a `.zip` shows up, which always wins.

use pickup_schema::{ArtifactEntry, SourceArchive, SourceExt};

/// Collects source archives in listing order and yields one winner per base name.
#[derive(Debug, Default)]
pub struct SourceArchiveDeduplicator {
    slots: Vec<Slot>,
}

#[derive(Debug)]
struct Slot {
    base: String,
    ext: SourceExt,
    entry: ArtifactEntry,
}

impl SourceArchiveDeduplicator {
    /// Create an empty deduplicator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a source archive. Returns true if it became (or replaced) its base's winner.
    pub fn push(&mut self, archive: &SourceArchive, entry: ArtifactEntry) -> bool {
        match self.slots.iter_mut().find(|slot| slot.base == archive.base) {
            Some(slot) => {
                if slot.ext.is_tar_family() && archive.ext == SourceExt::Zip {
                    slot.ext = archive.ext;
                    slot.entry = entry;
                    true
                } else {
                    false
                }
            }
            None => {
                self.slots.push(Slot {
                    base: archive.base.clone(),
                    ext: archive.ext,
                    entry,
                });
                true
            }
        }
    }

    /// Number of distinct base names seen.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether nothing has been pushed.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Winners, ordered by the first appearance of their base name.
    pub fn winners(self) -> impl Iterator<Item = ArtifactEntry> {
        self.slots.into_iter().map(|slot| slot.entry)
    }
}
