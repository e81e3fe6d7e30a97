//! Define and manage a data file header.

use crate::db_record::FieldWidths;
use crate::error::LoadHeaderError;
use std::io;
use std::io::{Read, Seek, SeekFrom, Write};

/// Header is four i32s- (record_count, name_width, code_width, state_width).
pub const DATA_HEADER_BYTES: usize = 16;

/// Struct that contains the header for a data file.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DataHeader {
    record_count: u32,
    widths: FieldWidths,
}

impl DataHeader {
    /// Create a new header.
    pub fn new(record_count: u32, widths: FieldWidths) -> Self {
        Self {
            record_count,
            widths,
        }
    }

    /// Load a DataHeader from source.
    pub fn load_header<R: Read + Seek>(source: &mut R) -> Result<Self, LoadHeaderError> {
        source.seek(SeekFrom::Start(0))?;
        let mut buffer = [0_u8; DATA_HEADER_BYTES];
        source.read_exact(&mut buffer[..])?;
        let mut values = [0_u32; 4];
        for (i, (field, value)) in ["record_count", "name_width", "code_width", "state_width"]
            .iter()
            .zip(values.iter_mut())
            .enumerate()
        {
            let pos = i * 4;
            let mut buf32 = [0_u8; 4];
            buf32.copy_from_slice(&buffer[pos..(pos + 4)]);
            let raw = i32::from_be_bytes(buf32);
            if raw < 0 {
                return Err(LoadHeaderError::InvalidField(*field, raw));
            }
            *value = raw as u32;
        }
        Ok(Self {
            record_count: values[0],
            widths: FieldWidths::new(values[1], values[2], values[3]),
        })
    }

    /// Write this header to sync at current seek position.
    pub fn write_header<W: Write>(&self, sync: &mut W) -> Result<(), io::Error> {
        let mut buffer = [0_u8; DATA_HEADER_BYTES];
        let mut pos = 0;
        for value in [
            self.record_count,
            self.widths.name,
            self.widths.code,
            self.widths.state,
        ] {
            let value = i32::try_from(value).map_err(|_| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("header value {value} does not fit an i32"),
                )
            })?;
            buffer[pos..(pos + 4)].copy_from_slice(&value.to_be_bytes());
            pos += 4;
        }
        sync.write_all(&buffer)
    }

    /// Number of records following the header.
    pub fn record_count(&self) -> u32 {
        self.record_count
    }

    /// Widths of the padded text fields of every record.
    pub fn widths(&self) -> &FieldWidths {
        &self.widths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_round_trip() {
        let header = DataHeader::new(3, FieldWidths::new(45, 10, 2));
        let mut cursor = Cursor::new(Vec::new());
        header.write_header(&mut cursor).unwrap();
        assert_eq!(cursor.get_ref().len(), DATA_HEADER_BYTES);
        assert_eq!(&cursor.get_ref()[0..8], &[0, 0, 0, 3, 0, 0, 0, 45]);
        let loaded = DataHeader::load_header(&mut cursor).unwrap();
        assert_eq!(loaded, header);
        assert_eq!(loaded.record_count(), 3);
        assert_eq!(loaded.widths().state, 2);
    }

    #[test]
    fn test_negative_width() {
        let mut bytes = Vec::new();
        for v in [1_i32, 10, -4, 2] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        let res = DataHeader::load_header(&mut Cursor::new(bytes));
        assert!(matches!(
            res,
            Err(LoadHeaderError::InvalidField("code_width", -4))
        ));
    }

    #[test]
    fn test_short_header() {
        let res = DataHeader::load_header(&mut Cursor::new(vec![0_u8; 10]));
        assert!(matches!(res, Err(LoadHeaderError::IO(_))));
    }
}
