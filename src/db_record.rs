//! Contains the trait that must be implemented for anything stored as a fixed length record, and
//! the solar project record the data files hold.

use crate::error::DecodeError;
use std::fmt::Debug;

/// Size of the key at the start of every record (a big endian i32).
pub const KEY_BYTES: usize = 4;

/// Bytes in a SolarRecord that do not depend on the field widths, the key and five f64s.
const SOLAR_FIXED_BYTES: usize = KEY_BYTES + 8 * 5;

/// Widths in bytes of the padded text fields of a record.
/// These are fixed when a data file is written and recorded in its header.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct FieldWidths {
    /// Width of the display name.
    pub name: u32,
    /// Width of the secondary (operation date) code.
    pub code: u32,
    /// Width of the location (state) code.
    pub state: u32,
}

impl FieldWidths {
    /// Create a new set of field widths.
    pub fn new(name: u32, code: u32, state: u32) -> Self {
        Self { name, code, state }
    }

    /// Widths wide enough for both self and other.
    pub fn max(self, other: FieldWidths) -> Self {
        Self {
            name: self.name.max(other.name),
            code: self.code.max(other.code),
            state: self.state.max(other.state),
        }
    }

    /// Sum of the text widths.
    pub fn total(&self) -> usize {
        self.name as usize + self.code as usize + self.state as usize
    }
}

/// Trait for records with a uniform on-disk length for a given set of field widths.
/// The key MUST be the first KEY_BYTES of the encoding (big endian) so an index can be built by
/// reading keys only.
pub trait FixedRecord: Debug + Sized {
    /// The records key.
    fn key(&self) -> i32;

    /// Encoded length of every record written with widths.
    fn record_length(widths: &FieldWidths) -> usize;

    /// Smallest widths that hold this records text fields without truncation.
    fn text_widths(&self) -> FieldWidths;

    /// Encode into buffer, buffer will contain exactly record_length(widths) bytes after.
    fn encode(&self, widths: &FieldWidths, buffer: &mut Vec<u8>);

    /// Decode a record from the front of buffer.
    fn decode(buffer: &[u8], widths: &FieldWidths) -> Result<Self, DecodeError>;
}

/// One solar project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolarRecord {
    /// Project ID, the key.
    pub key: i32,
    /// Project display name.
    pub name: String,
    /// Commercial operation date code.
    pub code: String,
    /// State the project is in.
    pub state: String,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// Average irradiance.
    pub irradiance: f64,
    /// DC capacity.
    pub capacity_dc: f64,
    /// AC capacity.
    pub capacity_ac: f64,
}

impl SolarRecord {
    /// Create a record with key and name, all other fields empty or zero.
    pub fn new<S: Into<String>>(key: i32, name: S) -> Self {
        Self {
            key,
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Write text into buffer padded with NULs to width.  Text longer than width is cut.
fn put_text(buffer: &mut Vec<u8>, text: &str, width: u32) {
    let width = width as usize;
    let bytes = text.as_bytes();
    let len = bytes.len().min(width);
    buffer.extend_from_slice(&bytes[..len]);
    buffer.resize(buffer.len() + (width - len), 0);
}

/// Read a padded text field, the padding is not guaranteed to be NUL so trim whitespace as well.
fn get_text(buffer: &[u8], pos: &mut usize, width: u32) -> String {
    let width = width as usize;
    let text = String::from_utf8_lossy(&buffer[*pos..(*pos + width)])
        .trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string();
    *pos += width;
    text
}

fn get_f64(buffer: &[u8], pos: &mut usize) -> f64 {
    let mut buf64 = [0_u8; 8];
    buf64.copy_from_slice(&buffer[*pos..(*pos + 8)]);
    *pos += 8;
    f64::from_be_bytes(buf64)
}

impl FixedRecord for SolarRecord {
    fn key(&self) -> i32 {
        self.key
    }

    fn record_length(widths: &FieldWidths) -> usize {
        SOLAR_FIXED_BYTES + widths.total()
    }

    fn text_widths(&self) -> FieldWidths {
        FieldWidths::new(
            self.name.len() as u32,
            self.code.len() as u32,
            self.state.len() as u32,
        )
    }

    fn encode(&self, widths: &FieldWidths, buffer: &mut Vec<u8>) {
        buffer.clear();
        buffer.reserve(Self::record_length(widths));
        buffer.extend_from_slice(&self.key.to_be_bytes());
        put_text(buffer, &self.name, widths.name);
        put_text(buffer, &self.code, widths.code);
        put_text(buffer, &self.state, widths.state);
        for val in [
            self.latitude,
            self.longitude,
            self.irradiance,
            self.capacity_dc,
            self.capacity_ac,
        ] {
            buffer.extend_from_slice(&val.to_be_bytes());
        }
    }

    fn decode(buffer: &[u8], widths: &FieldWidths) -> Result<Self, DecodeError> {
        let needed = Self::record_length(widths);
        if buffer.len() < needed {
            return Err(DecodeError::TruncatedRecord(needed, buffer.len()));
        }
        let mut buf32 = [0_u8; 4];
        buf32.copy_from_slice(&buffer[0..KEY_BYTES]);
        let key = i32::from_be_bytes(buf32);
        let mut pos = KEY_BYTES;
        let name = get_text(buffer, &mut pos, widths.name);
        let code = get_text(buffer, &mut pos, widths.code);
        let state = get_text(buffer, &mut pos, widths.state);
        Ok(Self {
            key,
            name,
            code,
            state,
            latitude: get_f64(buffer, &mut pos),
            longitude: get_f64(buffer, &mut pos),
            irradiance: get_f64(buffer, &mut pos),
            capacity_dc: get_f64(buffer, &mut pos),
            capacity_ac: get_f64(buffer, &mut pos),
        })
    }
}
