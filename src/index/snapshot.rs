//! Immutable per-job copy of the tile index.

use crate::color::Color3;

/// One indexed tile: its identifier and average color.
#[derive(Debug, Clone, PartialEq)]
pub struct TileEntry {
    pub id: String,
    pub color: Color3,
}

impl TileEntry {
    pub fn new(id: impl Into<String>, color: Color3) -> Self {
        Self {
            id: id.into(),
            color,
        }
    }
}

/// Point-in-time copy of a [`TileIndex`](super::TileIndex).
///
/// A snapshot is created once per mosaic job and never mutated afterwards, so
/// any number of renderers can read it at the same time without locking.
/// Entries are kept sorted by identifier.
#[derive(Debug, Clone, Default)]
pub struct TileIndexSnapshot {
    entries: Vec<TileEntry>,

    /// Index generation the entries were copied from
    generation: u64,
}

impl TileIndexSnapshot {
    pub fn new(mut entries: Vec<TileEntry>) -> Self {
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            entries,
            generation: 0,
        }
    }

    /// Tag the snapshot with the index generation it was taken from.
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Generation of the index contents this snapshot copies. Increases by
    /// one on every rebuild.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[TileEntry] {
        &self.entries
    }

    /// Find the tile whose average color is closest to `target`.
    ///
    /// Linear scan over every entry by Euclidean distance. On a tie the entry
    /// with the smallest identifier wins. Returns `None` when the snapshot is
    /// empty.
    pub fn nearest(&self, target: Color3) -> Option<&TileEntry> {
        let mut best: Option<(&TileEntry, f64)> = None;

        for entry in &self.entries {
            let distance = target.distance(&entry.color);
            match best {
                Some((_, smallest)) if distance >= smallest => {}
                _ => best = Some((entry, distance)),
            }
        }

        best.map(|(entry, _)| entry)
    }
}

impl<S: Into<String>> FromIterator<(S, Color3)> for TileIndexSnapshot {
    fn from_iter<I: IntoIterator<Item = (S, Color3)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(id, color)| TileEntry::new(id, color))
                .collect(),
        )
    }
}
