#![forbid(unsafe_code)]

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::embed::error::{PackError, PackResult};

/// Bounded, fixed-delay retry for opening an executable another process may
/// still hold (virus scanners, linkers, a running instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_secs(1),
        }
    }
}

/// Read-write handle on the target executable. Closed on drop.
#[derive(Debug)]
pub struct ExecutableHandle {
    path: PathBuf,
    file: File,
}

impl ExecutableHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&mut self) -> &mut File {
        &mut self.file
    }
}

impl Drop for ExecutableHandle {
    fn drop(&mut self) {
        debug!(target: "exepak::handle", path = %self.path.display(), "released executable");
    }
}

fn open_rw(path: &Path) -> io::Result<File> {
    OpenOptions::new().read(true).write(true).open(path)
}

/// Opens `path` read-write, sleeping between failed attempts.
pub fn open(path: &Path, policy: &RetryPolicy) -> PackResult<ExecutableHandle> {
    open_with(path, policy, open_rw, thread::sleep)
}

/// [`open`] with the open and sleep primitives supplied by the caller.
pub fn open_with<O, S>(
    path: &Path,
    policy: &RetryPolicy,
    mut opener: O,
    mut sleeper: S,
) -> PackResult<ExecutableHandle>
where
    O: FnMut(&Path) -> io::Result<File>,
    S: FnMut(Duration),
{
    let max = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match opener(path) {
            Ok(file) => {
                debug!(target: "exepak::handle", path = %path.display(), attempt, "opened executable");
                return Ok(ExecutableHandle {
                    path: path.to_path_buf(),
                    file,
                });
            }
            // A missing file will not appear by waiting for it.
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(PackError::Io(e)),
            Err(e) if attempt >= max => {
                return Err(PackError::ExclusiveAccessTimeout {
                    path: path.to_path_buf(),
                    attempts: attempt,
                    source: e,
                });
            }
            Err(e) => {
                warn!(
                    target: "exepak::handle",
                    path = %path.display(),
                    attempt,
                    max_attempts = max,
                    error = %e,
                    "executable busy, retrying"
                );
                sleeper(policy.delay);
                attempt += 1;
            }
        }
    }
}
