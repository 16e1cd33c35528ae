//! Opening book: a little-endian binary file of weighted (position, move)
//! records.
//!
//! Layout: `u64 entry_count`, `u32 cardinality`, then `entry_count` records
//! of `{u64 hash, i8 from, i8 to, i32 count}`. Entries sharing (hash, from,
//! to) accumulate their counts on load. `cardinality` is the maximum
//! half-move count at which the book is consulted; merging files keeps the
//! larger one.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use rand::Rng;

use crate::board::types::Square;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BookEntry {
    pub hash: u64,
    pub from: Square,
    pub to: Square,
    pub count: i32,
}

#[derive(Clone, Debug, Default)]
struct EntryCollection {
    entries: Vec<BookEntry>,
    total_count: i64,
}

#[derive(Default)]
pub struct OpeningBook {
    entries: HashMap<u64, EntryCollection>,
    entry_count: u64,
    cardinality: u32,
}

impl OpeningBook {
    #[must_use]
    pub fn new() -> Self {
        OpeningBook::default()
    }

    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Maximum game half-move count at which probing makes sense.
    #[must_use]
    pub fn cardinality(&self) -> u32 {
        self.cardinality
    }

    pub fn set_cardinality(&mut self, cardinality: u32) {
        self.cardinality = cardinality;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.entry_count = 0;
        self.cardinality = 0;
    }

    /// Add one record, merging counts with an existing (hash, from, to).
    pub fn append_entry(&mut self, entry: BookEntry) {
        if self.cardinality < 1 {
            self.cardinality = 1;
        }
        let collection = self.entries.entry(entry.hash).or_default();
        collection.total_count += i64::from(entry.count);
        for existing in &mut collection.entries {
            if existing.from == entry.from && existing.to == entry.to {
                existing.count += entry.count;
                return;
            }
        }
        collection.entries.push(entry);
        self.entry_count += 1;
    }

    /// Load a book file, merging into the current contents. Returns false if
    /// the file could not be opened.
    pub fn append_from_file(&mut self, path: &Path) -> bool {
        let Ok(mut file) = File::open(path) else {
            return false;
        };
        let mut buffer = Vec::new();
        if file.read_to_end(&mut buffer).is_err() {
            return false;
        }
        match self.parse(&buffer) {
            Ok(loaded) => {
                log::info!(
                    "loaded {loaded} book entries from {} (cardinality {})",
                    path.display(),
                    self.cardinality
                );
                true
            }
            Err(err) => {
                log::warn!("failed to parse book {}: {err}", path.display());
                true
            }
        }
    }

    fn parse(&mut self, buffer: &[u8]) -> Result<u64, String> {
        const HEADER: usize = 8 + 4;
        const RECORD: usize = 8 + 1 + 1 + 4;
        if buffer.len() < HEADER {
            return Err("file too small".to_string());
        }
        let entry_count = u64::from_le_bytes(buffer[0..8].try_into().unwrap());
        let cardinality = u32::from_le_bytes(buffer[8..12].try_into().unwrap());
        let expected = HEADER + entry_count as usize * RECORD;
        if expected != buffer.len() {
            return Err(format!(
                "size mismatch: expected {expected} bytes, got {}",
                buffer.len()
            ));
        }
        let mut offset = HEADER;
        for _ in 0..entry_count {
            let hash = u64::from_le_bytes(buffer[offset..offset + 8].try_into().unwrap());
            let from = buffer[offset + 8] as i8;
            let to = buffer[offset + 9] as i8;
            let count =
                i32::from_le_bytes(buffer[offset + 10..offset + 14].try_into().unwrap());
            offset += RECORD;
            if !(0..64).contains(&from) || !(0..64).contains(&to) {
                return Err(format!("square out of range in record ({from}, {to})"));
            }
            self.append_entry(BookEntry {
                hash,
                from: Square::from_index(from as usize),
                to: Square::from_index(to as usize),
                count,
            });
        }
        // Multi-file merges keep the largest cardinality
        if self.cardinality < cardinality {
            self.cardinality = cardinality;
        }
        Ok(entry_count)
    }

    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let mut buffer = Vec::with_capacity(12 + self.entry_count as usize * 14);
        buffer.extend_from_slice(&self.entry_count.to_le_bytes());
        buffer.extend_from_slice(&self.cardinality.to_le_bytes());
        for collection in self.entries.values() {
            for entry in &collection.entries {
                buffer.extend_from_slice(&entry.hash.to_le_bytes());
                buffer.push(entry.from.index() as u8);
                buffer.push(entry.to.index() as u8);
                buffer.extend_from_slice(&entry.count.to_le_bytes());
            }
        }
        File::create(path)?.write_all(&buffer)
    }

    /// All stored moves for a position hash.
    #[must_use]
    pub fn probe(&self, hash: u64) -> Option<&[BookEntry]> {
        self.entries
            .get(&hash)
            .map(|collection| collection.entries.as_slice())
    }

    /// Pick one entry for `hash` with probability proportional to its count.
    #[must_use]
    pub fn pick(&self, hash: u64) -> Option<BookEntry> {
        let collection = self.entries.get(&hash)?;
        if collection.entries.is_empty() || collection.total_count <= 0 {
            return None;
        }
        let mut remaining = rand::thread_rng().gen_range(0..collection.total_count);
        for entry in &collection.entries {
            remaining -= i64::from(entry.count);
            if remaining < 0 {
                return Some(*entry);
            }
        }
        collection.entries.last().copied()
    }
}
