//! Read and write data files, a header followed by fixed length records.
//! Because every record has the same length the i'th record starts at
//! `DATA_HEADER_BYTES + i * record_length`, no scanning required.

use crate::db::data_header::{DataHeader, DATA_HEADER_BYTES};
use crate::db_record::{FieldWidths, FixedRecord, KEY_BYTES};
use crate::error::{FetchError, LoadHeaderError};
use std::fs::{File, OpenOptions};
use std::io;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::Path;

/// A data file opened read-only.
#[derive(Debug)]
pub struct DataFile<R: FixedRecord> {
    data_file: BufReader<File>,
    header: DataHeader,
    record_length: usize,
    buffer: Vec<u8>,
    _record: PhantomData<R>,
}

impl<R: FixedRecord> DataFile<R> {
    /// Open the data file at path and load its header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadHeaderError> {
        let mut data_file = OpenOptions::new().read(true).open(path)?;
        let header = DataHeader::load_header(&mut data_file)?;
        let record_length = R::record_length(header.widths());
        Ok(Self {
            data_file: BufReader::new(data_file),
            header,
            record_length,
            buffer: Vec::with_capacity(record_length),
            _record: PhantomData,
        })
    }

    /// The files header.
    pub fn header(&self) -> &DataHeader {
        &self.header
    }

    /// Number of records in the file (per the header).
    pub fn len(&self) -> u32 {
        self.header.record_count()
    }

    /// Does the file hold no records?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length of every record in this file.
    pub fn record_length(&self) -> usize {
        self.record_length
    }

    /// Byte offset of record number index.
    pub fn record_offset(&self, index: u32) -> u64 {
        DATA_HEADER_BYTES as u64 + index as u64 * self.record_length as u64
    }

    /// Read just the key of the record at offset.
    pub fn read_key_at(&mut self, offset: u64) -> Result<i32, io::Error> {
        self.data_file.seek(SeekFrom::Start(offset))?;
        let mut buf32 = [0_u8; KEY_BYTES];
        self.data_file.read_exact(&mut buf32)?;
        Ok(i32::from_be_bytes(buf32))
    }

    /// Read and decode the record at offset.
    /// A record cut short by the end of the file is a TruncatedRecord decode error.
    pub fn read_record_at(&mut self, offset: u64) -> Result<R, FetchError> {
        self.data_file.seek(SeekFrom::Start(offset))?;
        self.buffer.clear();
        (&mut self.data_file)
            .take(self.record_length as u64)
            .read_to_end(&mut self.buffer)?;
        Ok(R::decode(&self.buffer, self.header.widths())?)
    }

    /// Iterate (index, key, offset) for every record in storage order.
    pub fn records(&mut self) -> RecordIter<'_, R> {
        RecordIter {
            data_file: self,
            index: 0,
        }
    }
}

/// Iterator over the keys and offsets of a data file, see [`DataFile::records`].
#[derive(Debug)]
pub struct RecordIter<'file, R: FixedRecord> {
    data_file: &'file mut DataFile<R>,
    index: u32,
}

impl<'file, R: FixedRecord> Iterator for RecordIter<'file, R> {
    type Item = Result<(u32, i32, u64), io::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.data_file.len() {
            return None;
        }
        let index = self.index;
        self.index += 1;
        let offset = self.data_file.record_offset(index);
        Some(
            self.data_file
                .read_key_at(offset)
                .map(|key| (index, key, offset)),
        )
    }
}

/// Write a new data file at path (replacing any existing file) holding records.
/// Records are sorted by ascending key and text widths are the widest seen in records.
pub fn write_data_file<R, P>(path: P, mut records: Vec<R>) -> Result<DataHeader, io::Error>
where
    R: FixedRecord,
    P: AsRef<Path>,
{
    let widths = records
        .iter()
        .fold(FieldWidths::default(), |widths, rec| {
            widths.max(rec.text_widths())
        });
    records.sort_by_key(|rec| rec.key());
    let record_count = u32::try_from(records.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many records"))?;
    let header = DataHeader::new(record_count, widths);
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    let mut writer = BufWriter::new(file);
    header.write_header(&mut writer)?;
    let mut buffer = Vec::with_capacity(R::record_length(&widths));
    for rec in &records {
        rec.encode(&widths, &mut buffer);
        writer.write_all(&buffer)?;
    }
    writer.flush()?;
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_record::SolarRecord;
    use crate::error::DecodeError;

    fn records() -> Vec<SolarRecord> {
        vec![
            SolarRecord::new(33, "Gamma Solar Ranch"),
            SolarRecord::new(5, "Alpha"),
            SolarRecord {
                state: "NM".to_string(),
                capacity_ac: 12.5,
                ..SolarRecord::new(17, "Beta Farm")
            },
        ]
    }

    #[test]
    fn test_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solar.bin");
        let header = write_data_file(&path, records()).unwrap();
        assert_eq!(header.record_count(), 3);
        assert_eq!(*header.widths(), FieldWidths::new(17, 0, 2));

        let mut data: DataFile<SolarRecord> = DataFile::open(&path).unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data.record_length(), 4 + 17 + 2 + 40);
        assert_eq!(data.record_offset(0), 16);
        assert_eq!(data.record_offset(2), 16 + 2 * 63);
        let file_len = std::fs::metadata(&path).unwrap().len();
        assert_eq!(file_len, data.record_offset(3));

        let keys: Vec<(u32, i32, u64)> = data.records().map(|r| r.unwrap()).collect();
        assert_eq!(keys, vec![(0, 5, 16), (1, 17, 79), (2, 33, 142)]);
        let rec = data.read_record_at(79).unwrap();
        assert_eq!(rec.key, 17);
        assert_eq!(rec.name, "Beta Farm");
        assert_eq!(rec.state, "NM");
        assert_eq!(rec.capacity_ac, 12.5);
    }

    #[test]
    fn test_truncated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.bin");
        write_data_file(&path, records()).unwrap();
        let len = std::fs::metadata(&path).unwrap().len();
        let file = OpenOptions::new().write(true).open(&path).unwrap();
        file.set_len(len - 10).unwrap();
        drop(file);

        let mut data: DataFile<SolarRecord> = DataFile::open(&path).unwrap();
        let offset = data.record_offset(2);
        match data.read_record_at(offset) {
            Err(FetchError::Decode(DecodeError::TruncatedRecord(needed, available))) => {
                assert_eq!(needed, 63);
                assert_eq!(available, 53);
            }
            other => panic!("expected truncated record, got {:?}", other),
        }
        // Keys are still readable.
        assert_eq!(data.read_key_at(offset).unwrap(), 33);
    }

    #[test]
    fn test_open_missing() {
        let dir = tempfile::tempdir().unwrap();
        let res: Result<DataFile<SolarRecord>, _> = DataFile::open(dir.path().join("nope.bin"));
        assert!(matches!(res, Err(LoadHeaderError::IO(_))));
    }
}
