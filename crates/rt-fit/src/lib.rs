//! FIT activity file decoding.
//!
//! Reads a Garmin FIT file and pushes its session, record and activity
//! messages into a [`MessageVisitor`]. The usual entry point is
//! [`extract_run`], which drains one file through a fresh
//! [`RunAggregator`] and resolves the result into a [`Run`] summary:
//!
//! ```no_run
//! # fn main() -> Result<(), rt_fit::FitError> {
//! let run = rt_fit::extract_run(std::path::Path::new("activity.fit"))?;
//! if let Some(run) = run {
//!     println!("{:.2} km", run.distance_km);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Decoding is synchronous and whole-file: the stream is drained to
//! completion (or to the first format error) before control returns, and
//! the file handle is released on every exit path.

pub mod crc;
mod decode;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use rt_core::{MessageVisitor, Run, RunAggregator, summarize};

/// Failures while reading or decoding a FIT file.
///
/// `Io` with [`io::ErrorKind::NotFound`] distinguishes a missing file from
/// the format failures; an activity file that decodes cleanly but lacks a
/// usable session is not an error (see [`extract_run`]).
#[derive(Debug, Error)]
pub enum FitError {
    /// The path could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file does not carry a FIT header signature.
    #[error("Not a valid FIT file")]
    InvalidSignature,

    /// The file ended before its declared contents did.
    #[error("truncated FIT file at byte {offset}")]
    Truncated { offset: usize },

    /// A data message referenced a local type with no prior definition.
    #[error("data message references undefined local type {local}")]
    UndefinedLocalType { local: u8 },

    /// A definition message declared an architecture this decoder does not
    /// know.
    #[error("unknown architecture {raw:#04x} in definition message")]
    UnknownArchitecture { raw: u8 },

    /// Stored and computed checksums disagree.
    #[error("CRC mismatch: stored {stored:#06x}, computed {computed:#06x}")]
    CrcMismatch { stored: u16, computed: u16 },
}

/// Decodes the file at `path`, pushing each message into `visitor`.
///
/// Messages arrive in file order; `visitor.on_complete()` is invoked
/// exactly once, after every other callback, and only when the whole file
/// decoded successfully.
pub fn extract_messages<V: MessageVisitor>(path: &Path, visitor: &mut V) -> Result<(), FitError> {
    let data = std::fs::read(path).map_err(|source| FitError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "decoding FIT file");
    decode::decode(&data, visitor)
}

/// Extracts the run summary from the activity file at `path`.
///
/// A fresh aggregator is created per call, so concurrent extractions never
/// share state. Returns `Ok(None)` when the file is structurally valid but
/// never produced both a session and an activity message.
pub fn extract_run(path: &Path) -> Result<Option<Run>, FitError> {
    let mut aggregator = RunAggregator::new();
    extract_messages(path, &mut aggregator)?;
    Ok(summarize(&aggregator))
}
