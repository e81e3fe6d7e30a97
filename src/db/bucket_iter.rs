//! Implements the iterator for a buckets elements.  Buckets fill front to back and are rewritten
//! compacted on a split so the first empty slot ends the bucket.

use crate::db::index_entry::{IndexEntry, ENTRY_SIZE};

/// Iterates over the filled entries contained in a bucket buffer.
#[derive(Debug)]
pub struct BucketIter {
    buffer: Vec<u8>,
    slot: usize,
    elements: usize,
}

impl BucketIter {
    pub(crate) fn new(buffer: Vec<u8>, elements: u16) -> Self {
        let elements = (elements as usize).min(buffer.len() / ENTRY_SIZE);
        Self {
            buffer,
            slot: 0,
            elements,
        }
    }

    /// Index of the first empty slot, None if the bucket is full.
    pub(crate) fn first_empty(buffer: &[u8], elements: u16) -> Option<usize> {
        (0..elements as usize).find(|slot| {
            let pos = slot * ENTRY_SIZE;
            IndexEntry::read_from(&buffer[pos..(pos + ENTRY_SIZE)]).is_empty()
        })
    }
}

impl Iterator for BucketIter {
    type Item = IndexEntry;

    fn next(&mut self) -> Option<Self::Item> {
        if self.slot >= self.elements {
            return None;
        }
        let pos = self.slot * ENTRY_SIZE;
        let entry = IndexEntry::read_from(&self.buffer[pos..(pos + ENTRY_SIZE)]);
        if entry.is_empty() {
            self.slot = self.elements;
            None
        } else {
            self.slot += 1;
            Some(entry)
        }
    }
}
