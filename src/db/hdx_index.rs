//! Contains the linear hash index (HDX) structure and code.
//!
//! The index file is a run of buckets, each `bucket_elements` slots of (key, offset), followed
//! (once a build is finished) by the level as a big endian i32.  A key lives in bucket
//! `key % 2^(level + 1)`.  When an insert finds its bucket full the table splits: the level goes up
//! by one, the bucket count doubles and every bucket `b` is divided between `b` and
//! `b + old_buckets`.  The insert then retries, possibly splitting again.

use crate::db::bucket_iter::BucketIter;
use crate::db::index_entry::{IndexEntry, ENTRY_SIZE};
use crate::error::insert::InsertError;
use crate::error::LoadHeaderError;
use std::fs::File;
use std::io;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use tracing::{debug, trace};

/// Level of a new index, 2 buckets.
pub const INITIAL_LEVEL: u32 = 0;

/// Highest level, 2^31 buckets addresses every non-negative i32 key on its own.
pub const MAX_LEVEL: u32 = 30;

/// Size of the trailing level marker.
const LEVEL_BYTES: u64 = 4;

/// Storage that can hold the bucket region of an index.
pub trait BucketStore: Read + Write + Seek {
    /// Set the stores length by truncating or extending.
    fn set_len(&mut self, len: u64) -> io::Result<()>;

    /// Make sure all writes are durable.
    fn sync(&mut self) -> io::Result<()>;
}

impl BucketStore for File {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

impl BucketStore for Cursor<Vec<u8>> {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        self.get_mut().resize(len as usize, 0);
        Ok(())
    }

    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Shape and fill of an index.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IndexStats {
    /// Current level.
    pub level: u32,
    /// Number of buckets, always 2^(level + 1).
    pub buckets: u64,
    /// Slots in each bucket.
    pub bucket_elements: u16,
    /// Filled slots in the whole table.
    pub values: u64,
    /// Most entries held by any one bucket.
    pub fullest_bucket: u16,
    /// Buckets with no entries.
    pub empty_buckets: u64,
}

/// A linear hash index mapping record keys to data file offsets.
#[derive(Debug)]
pub struct LinearHashIndex<S: BucketStore> {
    store: S,
    level: u32,
    buckets: u64,
    bucket_elements: u16,
    values: u64,
    splits: u64,
    write: bool,
}

impl<S: BucketStore> LinearHashIndex<S> {
    /// Create a new empty index in store (any existing content is discarded).
    /// Starts at level 0 with two empty buckets.
    pub fn create(mut store: S, bucket_elements: u16) -> Result<Self, io::Error> {
        if bucket_elements == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "bucket elements must be at least 1",
            ));
        }
        store.set_len(0)?;
        let mut index = Self {
            store,
            level: INITIAL_LEVEL,
            buckets: 1 << (INITIAL_LEVEL + 1),
            bucket_elements,
            values: 0,
            splits: 0,
            write: true,
        };
        let buffer = index.empty_bucket();
        for bucket in 0..index.buckets {
            index.write_bucket(bucket, &buffer)?;
        }
        Ok(index)
    }

    /// Open a finished index read-only.  Reads the trailing level and checks the store holds
    /// exactly the buckets that level implies.
    pub fn open(mut store: S, bucket_elements: u16) -> Result<Self, LoadHeaderError> {
        let length = store.seek(SeekFrom::End(0))?;
        if length < LEVEL_BYTES {
            return Err(LoadHeaderError::InvalidIndexLength(
                length,
                INITIAL_LEVEL,
                bucket_elements,
            ));
        }
        store.seek(SeekFrom::Start(length - LEVEL_BYTES))?;
        let mut buf32 = [0_u8; 4];
        store.read_exact(&mut buf32)?;
        let raw_level = i32::from_be_bytes(buf32);
        if raw_level < 0 || raw_level as u32 > MAX_LEVEL {
            return Err(LoadHeaderError::InvalidLevel(raw_level));
        }
        let level = raw_level as u32;
        let buckets = 1_u64 << (level + 1);
        let bucket_size = bucket_elements as u64 * ENTRY_SIZE as u64;
        if bucket_elements == 0 || length != buckets * bucket_size + LEVEL_BYTES {
            return Err(LoadHeaderError::InvalidIndexLength(
                length,
                level,
                bucket_elements,
            ));
        }
        Ok(Self {
            store,
            level,
            buckets,
            bucket_elements,
            values: 0,
            splits: 0,
            write: false,
        })
    }

    /// Current level.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Number of buckets in the index.
    pub fn buckets(&self) -> u64 {
        self.buckets
    }

    /// Number of slots in each bucket.
    pub fn bucket_elements(&self) -> u16 {
        self.bucket_elements
    }

    /// Entries inserted through this handle (0 for an index opened read-only).
    pub fn values(&self) -> u64 {
        self.values
    }

    /// Splits performed through this handle.
    pub fn splits(&self) -> u64 {
        self.splits
    }

    /// Size in bytes of a bucket.
    pub fn bucket_size(&self) -> usize {
        self.bucket_elements as usize * ENTRY_SIZE
    }

    /// Return the bucket that key lives in at the current level.
    /// Only valid until the next split, never hold on to it across an insert.
    pub fn bucket_of(&self, key: i32) -> u64 {
        key as u64 % self.buckets
    }

    /// Iterate the entries in bucket.
    pub fn bucket_entries(&mut self, bucket: u64) -> Result<BucketIter, io::Error> {
        let buffer = self.read_bucket(bucket)?;
        Ok(BucketIter::new(buffer, self.bucket_elements))
    }

    /// Save (key, offset) to the first empty slot of keys bucket, splitting until there is one.
    pub fn insert(&mut self, key: i32, offset: i32) -> Result<(), InsertError> {
        if !self.write {
            return Err(InsertError::ReadOnly);
        }
        let entry = IndexEntry::new(key, offset);
        if !entry.is_valid() {
            return Err(InsertError::InvalidEntry(key, offset));
        }
        loop {
            let bucket = self.bucket_of(key);
            let buffer = self.read_bucket(bucket)?;
            if let Some(slot) = BucketIter::first_empty(&buffer, self.bucket_elements) {
                let mut slot_buf = [0_u8; ENTRY_SIZE];
                entry.write_to(&mut slot_buf);
                let slot_pos = self.bucket_pos(bucket) + (slot * ENTRY_SIZE) as u64;
                self.store.seek(SeekFrom::Start(slot_pos))?;
                self.store.write_all(&slot_buf)?;
                self.values += 1;
                return Ok(());
            }
            if BucketIter::new(buffer, self.bucket_elements).all(|e| e.key() == key) {
                // No number of splits will separate copies of one key.
                return Err(InsertError::Unsplittable(key));
            }
            self.split()?;
        }
    }

    /// Return the offset stored for key or None if it is not in the index.
    pub fn lookup(&mut self, key: i32) -> Result<Option<i32>, io::Error> {
        if key < 0 {
            // Negative keys are never stored (and -1 would match empty slots).
            return Ok(None);
        }
        let bucket = self.bucket_of(key);
        let found = self
            .bucket_entries(bucket)?
            .find(|entry| entry.key() == key)
            .map(|entry| entry.offset());
        trace!(key, bucket, found = found.is_some(), "lookup");
        Ok(found)
    }

    /// Scan every bucket and report the shape of the table.
    pub fn stats(&mut self) -> Result<IndexStats, io::Error> {
        let mut values = 0;
        let mut fullest_bucket = 0;
        let mut empty_buckets = 0;
        for bucket in 0..self.buckets {
            let count = self.bucket_entries(bucket)?.count() as u16;
            values += count as u64;
            fullest_bucket = fullest_bucket.max(count);
            if count == 0 {
                empty_buckets += 1;
            }
        }
        Ok(IndexStats {
            level: self.level,
            buckets: self.buckets,
            bucket_elements: self.bucket_elements,
            values,
            fullest_bucket,
            empty_buckets,
        })
    }

    /// Append the level marker and sync.  Returns the store, the index is done after this.
    pub fn finish(mut self) -> Result<S, io::Error> {
        let end = self.buckets * self.bucket_size() as u64;
        if self.write {
            self.store.seek(SeekFrom::Start(end))?;
            self.store.write_all(&(self.level as i32).to_be_bytes())?;
            self.store.flush()?;
            self.store.sync()?;
        }
        Ok(self.store)
    }

    /// Double the table.  Every bucket b is read once and its entries written compacted to b (if
    /// they still address b) or to the new bucket b + old_buckets.
    fn split(&mut self) -> Result<(), InsertError> {
        if self.level >= MAX_LEVEL {
            return Err(InsertError::LevelOverflow(self.level));
        }
        let old_buckets = self.buckets;
        self.level += 1;
        self.buckets *= 2;

        let mut moved = 0_u64;
        for bucket in 0..old_buckets {
            let mut low = self.empty_bucket();
            let mut high = self.empty_bucket();
            let mut low_pos = 0;
            let mut high_pos = 0;
            for entry in self.bucket_entries(bucket)? {
                let new_bucket = self.bucket_of(entry.key());
                debug_assert!(new_bucket == bucket || new_bucket == bucket + old_buckets);
                if new_bucket == bucket {
                    entry.write_to(&mut low[low_pos..]);
                    low_pos += ENTRY_SIZE;
                } else {
                    entry.write_to(&mut high[high_pos..]);
                    high_pos += ENTRY_SIZE;
                    moved += 1;
                }
            }
            self.write_bucket(bucket, &low)?;
            // Seeking and writing past the end extends the store.
            self.write_bucket(bucket + old_buckets, &high)?;
        }
        self.store
            .set_len(self.buckets * self.bucket_size() as u64)?;
        self.splits += 1;
        debug!(
            level = self.level,
            buckets = self.buckets,
            moved,
            "split index buckets"
        );
        Ok(())
    }

    /// A bucket full of empty slots.
    fn empty_bucket(&self) -> Vec<u8> {
        let mut buffer = vec![0_u8; self.bucket_size()];
        for slot in buffer.chunks_exact_mut(ENTRY_SIZE) {
            IndexEntry::EMPTY.write_to(slot);
        }
        buffer
    }

    fn bucket_pos(&self, bucket: u64) -> u64 {
        bucket * self.bucket_size() as u64
    }

    fn read_bucket(&mut self, bucket: u64) -> Result<Vec<u8>, io::Error> {
        let mut buffer = vec![0_u8; self.bucket_size()];
        self.store.seek(SeekFrom::Start(self.bucket_pos(bucket)))?;
        self.store.read_exact(&mut buffer[..])?;
        Ok(buffer)
    }

    fn write_bucket(&mut self, bucket: u64, buffer: &[u8]) -> Result<(), io::Error> {
        self.store.seek(SeekFrom::Start(self.bucket_pos(bucket)))?;
        self.store.write_all(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;

    type MemIndex = LinearHashIndex<Cursor<Vec<u8>>>;

    fn new_index(bucket_elements: u16) -> MemIndex {
        LinearHashIndex::create(Cursor::new(Vec::new()), bucket_elements).unwrap()
    }

    #[test]
    fn test_create() {
        let index = new_index(20);
        assert_eq!(index.level(), 0);
        assert_eq!(index.buckets(), 2);
        let store = index.finish().unwrap().into_inner();
        // Two buckets of 20 (-1, -1) slots then the level.
        assert_eq!(store.len(), 2 * 20 * 8 + 4);
        assert!(store[..320].iter().all(|b| *b == 0xff));
        assert_eq!(&store[320..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_three_keys_no_split() {
        let mut index = new_index(20);
        index.insert(5, 16).unwrap();
        index.insert(17, 76).unwrap();
        index.insert(33, 136).unwrap();
        assert_eq!(index.level(), 0);
        assert_eq!(index.buckets(), 2);
        assert_eq!(index.splits(), 0);
        assert_eq!(index.lookup(17).unwrap(), Some(76));
        assert_eq!(index.lookup(5).unwrap(), Some(16));
        assert_eq!(index.lookup(33).unwrap(), Some(136));
        assert_eq!(index.lookup(9).unwrap(), None);
        let entries: Vec<IndexEntry> = index.bucket_entries(1).unwrap().collect();
        assert_eq!(
            entries,
            vec![
                IndexEntry::new(5, 16),
                IndexEntry::new(17, 76),
                IndexEntry::new(33, 136)
            ]
        );
        assert_eq!(index.bucket_entries(0).unwrap().count(), 0);
    }

    #[test]
    fn test_twenty_first_key_splits_once() {
        let mut index = new_index(20);
        // All odd, all in bucket 1 at level 0.
        let keys: Vec<i32> = (0..21).map(|i| i * 2 + 1).collect();
        for (i, key) in keys.iter().enumerate() {
            index.insert(*key, i as i32 * 100).unwrap();
            if i < 20 {
                assert_eq!(index.level(), 0);
            }
        }
        assert_eq!(index.level(), 1);
        assert_eq!(index.buckets(), 4);
        assert_eq!(index.splits(), 1);
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(index.bucket_of(*key), *key as u64 % 4);
            assert_eq!(index.lookup(*key).unwrap(), Some(i as i32 * 100));
        }
        let stats = index.stats().unwrap();
        assert_eq!(stats.values, 21);
        assert_eq!(stats.empty_buckets, 2);
        assert_eq!(stats.fullest_bucket, 11);
        let store = index.finish().unwrap().into_inner();
        assert_eq!(store.len(), 4 * 20 * 8 + 4);
        assert_eq!(&store[store.len() - 4..], &1_i32.to_be_bytes());
    }

    #[test]
    fn test_skewed_keys_split_repeatedly() {
        let mut index = new_index(20);
        // Multiples of 4 stay together in bucket 0 after the first split.
        for i in 0..21 {
            index.insert(i * 4, i).unwrap();
        }
        assert_eq!(index.level(), 2);
        assert_eq!(index.buckets(), 8);
        assert_eq!(index.splits(), 2);
        for i in 0..21 {
            assert_eq!(index.lookup(i * 4).unwrap(), Some(i));
        }
        let stats = index.stats().unwrap();
        assert_eq!(stats.values, 21);
        assert!(stats.fullest_bucket <= 20);
    }

    #[test]
    fn test_invalid_entries() {
        let mut index = new_index(4);
        assert!(matches!(
            index.insert(-1, -1),
            Err(InsertError::InvalidEntry(-1, -1))
        ));
        assert!(matches!(
            index.insert(3, -1),
            Err(InsertError::InvalidEntry(3, -1))
        ));
        assert!(matches!(
            index.insert(-7, 16),
            Err(InsertError::InvalidEntry(-7, 16))
        ));
        assert_eq!(index.lookup(-1).unwrap(), None);
        assert_eq!(index.values(), 0);
    }

    #[test]
    fn test_zero_bucket_elements() {
        assert!(LinearHashIndex::create(Cursor::new(Vec::new()), 0).is_err());
    }

    #[test]
    fn test_duplicate_keys_fill_bucket() {
        let mut index = new_index(2);
        index.insert(9, 16).unwrap();
        index.insert(9, 32).unwrap();
        match index.insert(9, 48) {
            Err(InsertError::Unsplittable(key)) => assert_eq!(key, 9),
            other => panic!("expected unsplittable bucket, got {:?}", other),
        }
        assert_eq!(index.level(), 0);
        // A different key in the same bucket still splits.
        index.insert(11, 64).unwrap();
        assert_eq!(index.level(), 1);
        assert_eq!(index.lookup(11).unwrap(), Some(64));
        assert_eq!(index.lookup(9).unwrap(), Some(16));
    }

    #[test]
    fn test_reopen_read_only() {
        let mut index = new_index(3);
        for key in 0..50 {
            index.insert(key, key * 10).unwrap();
        }
        let level = index.level();
        let store = index.finish().unwrap();
        let mut index = LinearHashIndex::open(store, 3).unwrap();
        assert_eq!(index.level(), level);
        assert_eq!(index.buckets(), 1 << (level + 1));
        for key in 0..50 {
            assert_eq!(index.lookup(key).unwrap(), Some(key * 10));
        }
        assert_eq!(index.lookup(50).unwrap(), None);
        assert!(matches!(index.insert(51, 0), Err(InsertError::ReadOnly)));
        assert_eq!(index.stats().unwrap().values, 50);
    }

    #[test]
    fn test_open_bad_length() {
        let index = new_index(20);
        let mut bytes = index.finish().unwrap().into_inner();
        // Wrong blocking factor.
        let res = LinearHashIndex::open(Cursor::new(bytes.clone()), 10);
        assert!(matches!(
            res,
            Err(LoadHeaderError::InvalidIndexLength(324, 0, 10))
        ));
        // Level claims more buckets than exist.
        let len = bytes.len();
        bytes[len - 4..].copy_from_slice(&3_i32.to_be_bytes());
        let res = LinearHashIndex::open(Cursor::new(bytes.clone()), 20);
        assert!(matches!(
            res,
            Err(LoadHeaderError::InvalidIndexLength(_, 3, 20))
        ));
        bytes[len - 4..].copy_from_slice(&(-2_i32).to_be_bytes());
        let res = LinearHashIndex::open(Cursor::new(bytes), 20);
        assert!(matches!(res, Err(LoadHeaderError::InvalidLevel(-2))));
        let res = LinearHashIndex::open(Cursor::new(vec![0_u8; 2]), 20);
        assert!(matches!(res, Err(LoadHeaderError::InvalidIndexLength(2, 0, 20))));
    }

    #[test]
    fn test_random_keys() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(0x5eed);
        let mut keys: HashSet<i32> = HashSet::new();
        while keys.len() < 5_000 {
            keys.insert(rng.gen_range(0..i32::MAX));
        }
        let mut keys: Vec<i32> = keys.into_iter().collect();
        keys.shuffle(&mut rng);
        let mut index = new_index(20);
        let mut buckets = index.buckets();
        for (i, key) in keys.iter().enumerate() {
            index.insert(*key, i as i32).unwrap();
            // Never shrinks, always a power of two.
            assert!(index.buckets() >= buckets);
            assert!(index.buckets().is_power_of_two());
            assert_eq!(index.buckets(), 1 << (index.level() + 1));
            buckets = index.buckets();
            // Found right after insert.
            assert_eq!(index.lookup(*key).unwrap(), Some(i as i32));
        }
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(index.lookup(*key).unwrap(), Some(i as i32));
            assert_eq!(index.lookup(*key).unwrap(), Some(i as i32));
        }
        let stats = index.stats().unwrap();
        assert_eq!(stats.values, keys.len() as u64);
        assert!(stats.fullest_bucket <= 20);
        assert_eq!(index.values(), keys.len() as u64);
    }
}
