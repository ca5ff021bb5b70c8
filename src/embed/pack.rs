#![forbid(unsafe_code)]

use std::fs::{self, File};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use blake3::Hasher;
use tracing::{debug, info, warn};

use crate::embed::enumerate::{enumerate, SourceFile};
use crate::embed::error::{PackError, PackResult};
use crate::embed::format::{record_len, Alignment, ArchiveMarkers, FileEntry, TERMINATOR};
use crate::embed::handle::{self, ExecutableHandle, RetryPolicy};
use crate::embed::io::{hex32, pad_before, pad_to, put_i64};
use crate::embed::scan::{guard, locate, read_stream};

/// What to embed, and where.
#[derive(Debug, Clone)]
pub struct PackOptions {
    pub executable: PathBuf,
    /// Defaults to the directory holding the executable.
    pub base_dir: Option<PathBuf>,
    /// File-name suffix; `*` matches everything.
    pub filemask: String,
    pub alignment: Alignment,
    /// Store `table_start - base_offset` as an i64 just before the end marker.
    pub table_pointer: bool,
    pub markers: ArchiveMarkers,
    pub retry: RetryPolicy,
}

impl PackOptions {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            base_dir: None,
            filemask: "*".to_string(),
            alignment: Alignment::None,
            table_pointer: false,
            markers: ArchiveMarkers::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn with_filemask(mut self, mask: impl Into<String>) -> Self {
        self.filemask = mask.into();
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_table_pointer(mut self, on: bool) -> Self {
        self.table_pointer = on;
        self
    }

    pub fn with_markers(mut self, markers: ArchiveMarkers) -> Self {
        self.markers = markers;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The configured base directory, or the executable's parent.
    pub fn resolved_base_dir(&self) -> PathBuf {
        match &self.base_dir {
            Some(dir) => dir.clone(),
            None => match self.executable.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => PathBuf::from("."),
            },
        }
    }
}

/// Where the segment landed in the executable. All offsets are absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackReport {
    pub executable: PathBuf,
    /// First byte after the start marker; zero point of every table offset.
    pub base_offset: u64,
    pub table_start: u64,
    /// Length of the executable after packing.
    pub end_offset: u64,
    pub entries: Vec<FileEntry>,
    /// blake3 of the appended bytes, start marker through end marker.
    pub segment_digest: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackOutcome {
    Embedded(PackReport),
    /// Nothing matched the filter; the executable was not opened.
    NoMatchingFiles { base_dir: PathBuf, filemask: String },
}

impl PackOutcome {
    pub fn file_count(&self) -> usize {
        match self {
            PackOutcome::Embedded(r) => r.entries.len(),
            PackOutcome::NoMatchingFiles { .. } => 0,
        }
    }
}

/// Appends every matching file under the base directory to the executable,
/// followed by the offset table.
pub fn pack(opts: &PackOptions) -> PackResult<PackOutcome> {
    pack_with(opts, handle::open)
}

/// [`pack`] with a caller-supplied way of acquiring the executable handle.
pub fn pack_with<F>(opts: &PackOptions, open: F) -> PackResult<PackOutcome>
where
    F: FnOnce(&Path, &RetryPolicy) -> PackResult<ExecutableHandle>,
{
    if opts.executable.as_os_str().is_empty() {
        return Err(PackError::Invalid("no executable specified".into()));
    }
    let base_dir = opts.resolved_base_dir();

    let mut files = enumerate(&base_dir, &opts.filemask)?;
    exclude_self(&mut files, &opts.executable);

    if files.is_empty() {
        info!(
            target: "exepak::pack",
            base_dir = %base_dir.display(),
            filemask = %opts.filemask,
            "no matching files, leaving executable unchanged"
        );
        return Ok(PackOutcome::NoMatchingFiles {
            base_dir,
            filemask: opts.filemask.clone(),
        });
    }

    let mut handle = open(&opts.executable, &opts.retry)?;
    let image = read_stream(handle.file())?;
    guard(handle.path(), &image, &opts.markers)?;
    let original_len = image.len() as u64;
    drop(image);

    let segment = build_segment(&files, original_len, opts)?;
    write_segment(&mut handle, original_len, &segment.bytes)?;

    let mut hasher = Hasher::new();
    hasher.update(&segment.bytes);
    let digest: [u8; 32] = hasher.finalize().into();

    let report = PackReport {
        executable: opts.executable.clone(),
        base_offset: segment.base_offset,
        table_start: segment.table_start,
        end_offset: original_len + segment.bytes.len() as u64,
        entries: segment.entries,
        segment_digest: hex32(&digest),
    };

    info!(
        target: "exepak::pack",
        executable = %report.executable.display(),
        files = report.entries.len(),
        base_offset = report.base_offset,
        table_start = report.table_start,
        bytes = segment.bytes.len(),
        digest = %report.segment_digest,
        "embedded archive"
    );

    Ok(PackOutcome::Embedded(report))
}

/// Keeps the executable out of its own payload set when it lives under the base directory.
fn exclude_self(files: &mut Vec<SourceFile>, executable: &Path) {
    let Ok(exe) = fs::canonicalize(executable) else {
        return;
    };
    files.retain(|f| match fs::canonicalize(&f.path) {
        Ok(p) if p == exe => {
            debug!(target: "exepak::pack", path = %f.rel, "skipping the executable itself");
            false
        }
        _ => true,
    });
}

struct Segment {
    bytes: Vec<u8>,
    base_offset: u64,
    table_start: u64,
    entries: Vec<FileEntry>,
}

/// Lays out `[start][payloads][records][table ptr?][end]` in memory.
///
/// `origin` is the executable's current length; absolute offsets in the
/// returned entries are computed from it.
fn build_segment(files: &[SourceFile], origin: u64, opts: &PackOptions) -> PackResult<Segment> {
    let align = opts.alignment;
    let markers = &opts.markers;

    let mut buf: Vec<u8> = Vec::new();
    buf.extend_from_slice(&markers.start);
    let base = buf.len();
    let base_offset = origin + base as u64;

    let mut entries: Vec<FileEntry> = Vec::with_capacity(files.len());
    for file in files {
        let payload_offset = origin + buf.len() as u64;
        let raw = fs::read(&file.path)?;

        if locate(&markers.start, &raw).is_some() || locate(&markers.end, &raw).is_some() {
            warn!(
                target: "exepak::pack",
                path = %file.rel,
                "payload contains a segment marker; later scans will see this executable as already embedded"
            );
        }

        buf.extend_from_slice(&raw);
        pad_to(&mut buf, base, align);
        debug!(target: "exepak::pack", path = %file.rel, offset = payload_offset, size = raw.len(), "added file");

        entries.push(FileEntry {
            path: file.rel.clone(),
            payload_offset,
            size: raw.len() as u64,
        });
    }

    let table_start = origin + buf.len() as u64;

    for (i, e) in entries.iter().enumerate() {
        let rel_start = (buf.len() - base) as u64;
        let next = if i + 1 == entries.len() {
            TERMINATOR
        } else {
            to_i64(rel_start + record_len(&e.path, rel_start, align))?
        };

        put_i64(&mut buf, next);
        put_i64(&mut buf, to_i64(e.relative_offset(base_offset))?);
        put_i64(&mut buf, to_i64(e.size)?);
        buf.extend_from_slice(e.path.as_bytes());
        buf.push(0);
        pad_to(&mut buf, base, align);
    }

    // The pointer sits directly against the end marker, which stays on a boundary.
    if opts.table_pointer {
        pad_before(&mut buf, base, align, 8);
        put_i64(&mut buf, to_i64(table_start - base_offset)?);
    }
    buf.extend_from_slice(&markers.end);

    Ok(Segment {
        bytes: buf,
        base_offset,
        table_start,
        entries,
    })
}

fn to_i64(v: u64) -> PackResult<i64> {
    i64::try_from(v).map_err(|_| PackError::Invalid(format!("offset {v} does not fit in i64")))
}

/// Appends `segment` at `original_len`. On failure the file is cut back to
/// its original length if possible; a file that never grew counts as intact.
fn write_segment(handle: &mut ExecutableHandle, original_len: u64, segment: &[u8]) -> PackResult<()> {
    let res = append_at(handle.file(), original_len, segment);
    let Err(source) = res else {
        return Ok(());
    };

    let file = handle.file();
    let truncated = file.set_len(original_len).and_then(|_| file.sync_all()).is_ok();
    let rolled_back = truncated
        || file
            .metadata()
            .map(|m| m.len() == original_len)
            .unwrap_or(false);
    warn!(
        target: "exepak::pack",
        path = %handle.path().display(),
        rolled_back,
        error = %source,
        "segment write failed"
    );
    Err(PackError::PartialWrite {
        path: handle.path().to_path_buf(),
        rolled_back,
        source,
    })
}

fn append_at(file: &mut File, at: u64, data: &[u8]) -> std::io::Result<()> {
    file.seek(SeekFrom::Start(at))?;
    file.write_all(data)?;
    file.flush()?;
    file.sync_all()
}
