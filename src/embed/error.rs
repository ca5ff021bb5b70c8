#![forbid(unsafe_code)]

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid input: {0}")]
    Invalid(String),

    #[error(
        "detection signature not found in {}; the executable was not built with embedding support",
        .path.display()
    )]
    UnsupportedExecutable { path: PathBuf },

    #[error(
        "{} already carries an embedded archive ({marker} marker present); rebuild the executable first",
        .path.display()
    )]
    AlreadyEmbedded { path: PathBuf, marker: &'static str },

    #[error("could not open {} for writing after {attempts} attempts: {source}", .path.display())]
    ExclusiveAccessTimeout {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "write into {} failed ({}): {source}",
        .path.display(),
        rollback_note(.rolled_back)
    )]
    PartialWrite {
        path: PathBuf,
        rolled_back: bool,
        #[source]
        source: std::io::Error,
    },
}

fn rollback_note(rolled_back: &bool) -> &'static str {
    if *rolled_back {
        "original length restored"
    } else {
        "executable left corrupted"
    }
}

pub type PackResult<T> = Result<T, PackError>;

impl From<walkdir::Error> for PackError {
    fn from(e: walkdir::Error) -> Self {
        let msg = e.to_string();
        let io = e
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, msg));
        PackError::Io(io)
    }
}
