//! Error types for split-stream operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when working with a volume-split stream, along with a
//! convenient [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! All fallible operations in this crate return `Result<T, Error>`. Usage
//! errors (wrong mode, closed stream, bad seek) are reported immediately and
//! leave the stream usable. Filesystem errors carry the volume number, its
//! path and the operation that failed:
//!
//! ```rust,no_run
//! use volsplit::{Error, OpenMode, VolumeConfig, SplitFile};
//!
//! fn open_for_reading(path: &str) -> volsplit::Result<SplitFile> {
//!     match SplitFile::open(VolumeConfig::new(path, 0).mode(OpenMode::ReadOnly)) {
//!         Ok(stream) => Ok(stream),
//!         Err(Error::VolumeMissing { path, .. }) => {
//!             eprintln!("No stream at {}", path);
//!             Err(Error::Unsupported("nothing to read"))
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! ```

use std::fmt;
use std::io;

/// The filesystem operation that failed on a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum VolumeOp {
    /// Opening an existing volume.
    Open,
    /// Creating a new volume.
    Create,
    /// Reading from a volume.
    Read,
    /// Writing to a volume.
    Write,
    /// Repositioning within a volume.
    Seek,
    /// Setting the length of a volume.
    Truncate,
    /// Flushing a volume.
    Flush,
    /// Deleting a volume.
    Remove,
    /// Querying a volume's existence or length.
    Stat,
}

impl fmt::Display for VolumeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Open => "open",
            Self::Create => "create",
            Self::Read => "read",
            Self::Write => "write",
            Self::Seek => "seek",
            Self::Truncate => "truncate",
            Self::Flush => "flush",
            Self::Remove => "remove",
            Self::Stat => "stat",
        };
        f.write_str(name)
    }
}

/// The main error type for split-stream operations.
///
/// # Error Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | Usage | [`Unsupported`][Self::Unsupported], [`Closed`][Self::Closed], [`InvalidMode`][Self::InvalidMode], [`InvalidWhence`][Self::InvalidWhence], [`NegativeSeek`][Self::NegativeSeek] | Caller mistakes |
/// | Existence | [`VolumeMissing`][Self::VolumeMissing] | First volume absent at open |
/// | Filesystem | [`Io`][Self::Io], [`Volume`][Self::Volume], [`VolumeCorrupted`][Self::VolumeCorrupted] | Disk and permission failures |
/// | Transform | [`InvalidFormat`][Self::InvalidFormat], [`CryptoError`][Self::CryptoError] | Compression or cipher layers |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred outside of any particular volume.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A filesystem call on a specific volume failed.
    #[error("Failed to {operation} volume {volume} ('{path}'): {source}")]
    Volume {
        /// Volume number (1-indexed).
        volume: u32,
        /// Path or description of the volume.
        path: String,
        /// The operation that failed.
        operation: VolumeOp,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The first volume does not exist and the open mode requires it.
    #[error("Volume {volume} missing: expected at '{path}'")]
    VolumeMissing {
        /// Volume number (1-indexed).
        volume: u32,
        /// Expected path of the volume.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A volume holds fewer bytes than the volume table records.
    ///
    /// This happens when a volume file is modified by someone else while the
    /// stream is open.
    #[error("Volume {volume} corrupted: {details}")]
    VolumeCorrupted {
        /// Volume number (1-indexed).
        volume: u32,
        /// Description of the inconsistency.
        details: String,
    },

    /// The operation is not permitted by the stream's open mode.
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    /// The stream has already been closed.
    #[error("I/O operation on closed stream")]
    Closed,

    /// The mode string could not be parsed.
    #[error("Invalid open mode '{0}': expected rb, wb, r+b or w+b")]
    InvalidMode(String),

    /// A numeric seek origin outside 0 (start), 1 (current) or 2 (end).
    #[error("Invalid whence {0}: expected 0, 1 or 2")]
    InvalidWhence(i32),

    /// A seek resolved to a position before the start of the stream.
    #[error("Cannot seek to negative position {0}")]
    NegativeSeek(i128),

    /// A transform header is malformed.
    #[error("Invalid stream format: {0}")]
    InvalidFormat(String),

    /// Cipher setup failed.
    #[error("Cryptographic error: {0}")]
    CryptoError(String),
}

impl Error {
    /// Wraps an I/O error with the volume and operation it came from.
    pub(crate) fn volume(
        volume: u32,
        path: impl Into<String>,
        operation: VolumeOp,
        source: io::Error,
    ) -> Self {
        Self::Volume {
            volume,
            path: path.into(),
            operation,
            source,
        }
    }

    /// Returns true if this is a usage error (a caller mistake that is never retried).
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::Unsupported(_)
                | Self::Closed
                | Self::InvalidMode(_)
                | Self::InvalidWhence(_)
                | Self::NegativeSeek(_)
        )
    }

    /// Returns the volume number associated with this error, if any.
    pub fn volume_number(&self) -> Option<u32> {
        match self {
            Self::Volume { volume, .. }
            | Self::VolumeMissing { volume, .. }
            | Self::VolumeCorrupted { volume, .. } => Some(*volume),
            _ => None,
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        let kind = match &err {
            Error::Io(e) => e.kind(),
            Error::Volume { source, .. } => source.kind(),
            Error::VolumeMissing { .. } => io::ErrorKind::NotFound,
            Error::Unsupported(_) => io::ErrorKind::Unsupported,
            Error::InvalidMode(_) | Error::InvalidWhence(_) | Error::NegativeSeek(_) => {
                io::ErrorKind::InvalidInput
            }
            Error::VolumeCorrupted { .. } | Error::InvalidFormat(_) => io::ErrorKind::InvalidData,
            _ => io::ErrorKind::Other,
        };
        match err {
            Error::Io(e) => e,
            other => io::Error::new(kind, other),
        }
    }
}

/// A specialized Result type for split-stream operations.
pub type Result<T> = std::result::Result<T, Error>;
