#![forbid(unsafe_code)]

use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use memchr::memmem;
use tracing::debug;

use crate::embed::error::{PackError, PackResult};
use crate::embed::format::ArchiveMarkers;

/// Index of the first occurrence of `pattern` in `buffer`.
pub fn locate(pattern: &[u8], buffer: &[u8]) -> Option<usize> {
    memmem::find(buffer, pattern)
}

/// Reads the whole stream from the start; the cursor is left at the end.
pub fn read_stream<R: Read + Seek>(stream: &mut R) -> PackResult<Vec<u8>> {
    stream.seek(SeekFrom::Start(0))?;
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Preconditions for embedding: the host carries the detection signature and
/// no segment has been appended yet.
pub fn guard(path: &Path, buffer: &[u8], markers: &ArchiveMarkers) -> PackResult<()> {
    if locate(&markers.detection, buffer).is_none() {
        debug!(target: "exepak::scan", path = %path.display(), "detection signature absent");
        return Err(PackError::UnsupportedExecutable {
            path: path.to_path_buf(),
        });
    }

    for (name, marker) in [("start", &markers.start), ("end", &markers.end)] {
        if let Some(at) = locate(marker, buffer) {
            debug!(target: "exepak::scan", path = %path.display(), marker = name, at, "segment marker present");
            return Err(PackError::AlreadyEmbedded {
                path: path.to_path_buf(),
                marker: name,
            });
        }
    }

    Ok(())
}
