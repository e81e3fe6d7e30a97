//! The (key, offset) pair stored in each index slot.

/// Size of a slot, (i32, i32)- (key, record_offset).
pub const ENTRY_SIZE: usize = 8;

/// One slot of an index bucket.
///
/// An empty slot holds key -1 and offset -1.  Using a sentinel instead of a tag byte keeps a slot
/// at eight bytes; the price is that -1 can never be a real key or offset, inserts reject them.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    key: i32,
    offset: i32,
}

impl IndexEntry {
    /// The empty slot.
    pub const EMPTY: IndexEntry = IndexEntry {
        key: -1,
        offset: -1,
    };

    /// Create a new entry.
    pub fn new(key: i32, offset: i32) -> Self {
        Self { key, offset }
    }

    /// The records key.
    pub fn key(&self) -> i32 {
        self.key
    }

    /// Byte offset of the record in the data file.
    pub fn offset(&self) -> i32 {
        self.offset
    }

    /// Is this the empty slot sentinel?
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    /// True if this entry may be stored, neither field can be negative.
    pub fn is_valid(&self) -> bool {
        self.key >= 0 && self.offset >= 0
    }

    /// Read an entry from the first ENTRY_SIZE bytes of buffer.
    pub fn read_from(buffer: &[u8]) -> Self {
        let mut buf32 = [0_u8; 4];
        buf32.copy_from_slice(&buffer[0..4]);
        let key = i32::from_be_bytes(buf32);
        buf32.copy_from_slice(&buffer[4..8]);
        let offset = i32::from_be_bytes(buf32);
        Self { key, offset }
    }

    /// Write this entry into the first ENTRY_SIZE bytes of buffer.
    pub fn write_to(&self, buffer: &mut [u8]) {
        buffer[0..4].copy_from_slice(&self.key.to_be_bytes());
        buffer[4..8].copy_from_slice(&self.offset.to_be_bytes());
    }
}
