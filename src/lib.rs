#![forbid(unsafe_code)]

//! Appends a directory of resource files to the tail of a built executable.
//!
//! The appended segment is `[start marker][payloads][offset table][end marker]`.
//! Every table offset is relative to the byte after the start marker, so a
//! reader can find the files without knowing the size of the executable.

pub mod embed;

pub use embed::{pack, Alignment, PackError, PackOptions, PackOutcome, PackReport, PackResult};
