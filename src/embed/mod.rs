#![forbid(unsafe_code)]

mod enumerate;
mod error;
mod format;
mod handle;
mod io;
mod pack;
mod path;
mod scan;

pub use enumerate::{enumerate, SourceFile};
pub use error::{PackError, PackResult};
pub use format::{
    Alignment, ArchiveMarkers, FileEntry, DETECTION_SIGNATURE, END_MARKER, START_MARKER,
    TERMINATOR,
};
pub use handle::{open, open_with, ExecutableHandle, RetryPolicy};
pub use io::read_i64;
pub use pack::{pack, pack_with, PackOptions, PackOutcome, PackReport};
pub use scan::{guard, locate, read_stream};
