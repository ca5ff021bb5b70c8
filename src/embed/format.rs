#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

/// Must already be present in a host executable built with embedding support.
pub const DETECTION_SIGNATURE: &[u8] = b"2E23E563-31FA-4C24-B7B3-90BE720C6B1A";

/// Opens the appended segment. Offsets in the table are relative to the byte after it.
pub const START_MARKER: &[u8] = b"DXGBD7F1BE4-9FCF-4E3A-ABA7-3443D11AB362";

/// Closes the appended segment.
pub const END_MARKER: &[u8] = b"DXG1C58841C-D8A0-4457-BF54-D8315D4CF49D";

/// Fill byte for alignment padding.
pub(crate) const PAD_BYTE: u8 = 0x20;

/// `next_pointer` value marking the last record of the table.
///
/// The last record carries it in its own `next_pointer` field. Some older
/// packers instead pointed the last record at a standalone i64 `0` written
/// just before the end marker, so a reader built for those images stops when
/// the value *at* a next pointer is zero rather than when the pointer is.
pub const TERMINATOR: i64 = 0;

/// Fixed part of a table record: next pointer, relative offset, size.
pub(crate) const RECORD_HEADER_LEN: u64 = 8 * 3;

/// The three byte patterns that tag a host executable and bound the segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMarkers {
    pub detection: Vec<u8>,
    pub start: Vec<u8>,
    pub end: Vec<u8>,
}

impl Default for ArchiveMarkers {
    fn default() -> Self {
        Self {
            detection: DETECTION_SIGNATURE.to_vec(),
            start: START_MARKER.to_vec(),
            end: END_MARKER.to_vec(),
        }
    }
}

/// Padding boundary applied after each payload and each table record.
///
/// Boundaries are measured from the base offset, so the segment bytes do not
/// depend on the length of the executable they are appended to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    None,
    X16,
    X256,
}

impl Alignment {
    pub fn boundary(self) -> u64 {
        match self {
            Alignment::None => 1,
            Alignment::X16 => 16,
            Alignment::X256 => 256,
        }
    }

    /// Bytes of padding needed to bring `relative_pos` up to the boundary.
    pub fn padding_for(self, relative_pos: u64) -> u64 {
        let b = self.boundary();
        (b - relative_pos % b) % b
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alignment::None => f.write_str("none"),
            Alignment::X16 => f.write_str("16"),
            Alignment::X256 => f.write_str("256"),
        }
    }
}

impl FromStr for Alignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "none" | "0" | "1" => Ok(Alignment::None),
            "16" => Ok(Alignment::X16),
            "256" => Ok(Alignment::X256),
            other => Err(format!("unsupported alignment '{other}' (expected none, 16 or 256)")),
        }
    }
}

/// One embedded file, known once its payload has been placed in the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Base-relative path with `/` separators.
    pub path: String,
    /// Absolute stream position of the payload's first byte.
    pub payload_offset: u64,
    pub size: u64,
}

impl FileEntry {
    pub fn relative_offset(&self, base_offset: u64) -> u64 {
        self.payload_offset - base_offset
    }
}

/// Encoded length of a table record for `path`, including trailing padding.
pub(crate) fn record_len(path: &str, relative_start: u64, align: Alignment) -> u64 {
    let unpadded = RECORD_HEADER_LEN + path.len() as u64 + 1;
    unpadded + align.padding_for(relative_start + unpadded)
}
