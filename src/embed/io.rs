#![forbid(unsafe_code)]

use crate::embed::format::{Alignment, PAD_BYTE};

pub fn put_i64(buf: &mut Vec<u8>, v: i64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Pads `buf` so that its length, counted from `origin`, lands on the boundary.
pub fn pad_to(buf: &mut Vec<u8>, origin: usize, align: Alignment) {
    pad_before(buf, origin, align, 0);
}

/// Pads `buf` so that the boundary falls `trailer` bytes after the padding.
pub fn pad_before(buf: &mut Vec<u8>, origin: usize, align: Alignment, trailer: u64) {
    let rel = (buf.len() - origin) as u64;
    let n = align.padding_for(rel + trailer) as usize;
    buf.resize(buf.len() + n, PAD_BYTE);
}

/// Little-endian i64 at `at`, as stored in table records. Public for readers
/// that walk the table of a packed executable.
pub fn read_i64(buf: &[u8], at: usize) -> Option<i64> {
    let bytes: [u8; 8] = buf.get(at..at + 8)?.try_into().ok()?;
    Some(i64::from_le_bytes(bytes))
}

pub fn hex32(v: &[u8; 32]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = [0u8; 64];
    for (i, b) in v.iter().copied().enumerate() {
        out[i * 2] = HEX[(b >> 4) as usize];
        out[i * 2 + 1] = HEX[(b & 0xF) as usize];
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i64_is_little_endian() {
        let mut buf = Vec::new();
        put_i64(&mut buf, 0x0102);
        assert_eq!(buf, [2, 1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(read_i64(&buf, 0), Some(0x0102));
        assert_eq!(read_i64(&buf, 1), None);
    }

    #[test]
    fn pad_is_relative_to_origin() {
        let mut buf = vec![0u8; 5];
        buf.extend_from_slice(b"abc");
        pad_to(&mut buf, 5, Alignment::X16);
        assert_eq!(buf.len(), 5 + 16);
        assert!(buf[8..].iter().all(|&b| b == PAD_BYTE));
    }

    #[test]
    fn pad_before_leaves_room_for_trailer() {
        let mut buf = vec![0u8; 16];
        pad_before(&mut buf, 0, Alignment::X16, 8);
        assert_eq!(buf.len(), 24);
        pad_before(&mut buf, 0, Alignment::None, 8);
        assert_eq!(buf.len(), 24);
    }

    #[test]
    fn hex_encodes_lowercase() {
        let mut v = [0u8; 32];
        v[0] = 0xab;
        v[31] = 0x01;
        let s = hex32(&v);
        assert!(s.starts_with("ab00"));
        assert!(s.ends_with("01"));
        assert_eq!(s.len(), 64);
    }
}
