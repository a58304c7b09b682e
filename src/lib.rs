//! # volsplit
//!
//! A random-access byte stream stored across fixed-capacity volume files.
//!
//! A split stream looks like one ordinary file to its caller: it can be read,
//! written, seeked and truncated. Underneath, the bytes live in a sequence of
//! volumes (`data.bin`, `data.bin.2`, `data.bin.3`, ...), each holding at most
//! a configured number of bytes. New volumes are created as writes cross
//! capacity boundaries, and volumes are deleted when the stream shrinks.
//!
//! ## Quick Start
//!
//! ### Writing a Split Stream
//!
//! ```rust,no_run
//! use volsplit::{OpenMode, Result, SplitFile, VolumeConfig};
//!
//! fn main() -> Result<()> {
//!     // Split into 4 GiB - 1 volumes so every piece fits on FAT32
//!     let config = VolumeConfig::fat32("capture.bin").mode(OpenMode::WriteCreate);
//!     let mut stream = SplitFile::open(config)?;
//!     stream.write(b"hello")?;
//!     stream.close()?;
//!     Ok(())
//! }
//! ```
//!
//! ### Reading It Back
//!
//! ```rust,no_run
//! use std::io::SeekFrom;
//!
//! fn main() -> volsplit::Result<()> {
//!     let mut stream = volsplit::open("capture.bin", "rb", 0)?;
//!     stream.seek(SeekFrom::Start(3))?;
//!     let tail = stream.read_to_end_of_stream()?;
//!     assert_eq!(tail, b"lo");
//!     for line in volsplit::open("notes.txt", "rb", 0)?.lines() {
//!         println!("{}", String::from_utf8_lossy(&line?));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Updating in Place
//!
//! Opening with [`OpenMode::ReadWriteExisting`] keeps existing volumes.
//! With [`VolumeConfig::append_to_partial`], a short last volume is filled
//! up to the configured capacity before a new volume is started:
//!
//! ```rust,no_run
//! use std::io::SeekFrom;
//! use volsplit::{OpenMode, SplitFile, VolumeConfig};
//!
//! # fn main() -> volsplit::Result<()> {
//! let config = VolumeConfig::new("log.bin", 10 * 1024 * 1024)
//!     .mode(OpenMode::ReadWriteExisting)
//!     .append_to_partial(true);
//! let mut stream = SplitFile::open(config)?;
//! stream.seek(SeekFrom::End(0))?;
//! stream.write(b"another record\n")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Standard I/O Traits
//!
//! [`SplitFile`] implements [`std::io::Read`], [`std::io::Write`] and
//! [`std::io::Seek`], so it plugs into anything that takes a file.
//!
//! ## Storage Backends
//!
//! Volumes live in a [`VolumeStore`](volume::VolumeStore).
//! [`FsStore`](volume::FsStore) keeps them on the local filesystem, and
//! [`MemoryStore`](volume::MemoryStore) keeps them in memory, which is handy
//! in tests.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `lzma` | Yes | LZMA2 compression transform |
//! | `aes` | Yes | AES-256 encryption transform |
//! | `cli` | No | Command-line interface tool |
//!
//! ### Disabling Default Features
//!
//! To create a minimal build, disable default features:
//!
//! ```toml
//! [dependencies]
//! volsplit = { version = "1.0", default-features = false }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod error;
pub mod stream;
pub mod volume;

#[cfg(any(feature = "lzma", feature = "aes"))]
#[cfg_attr(docsrs, doc(cfg(any(feature = "lzma", feature = "aes"))))]
pub mod transform;

use std::path::Path;

pub use error::{Error, Result, VolumeOp};
pub use stream::{BLOCK_SIZE, Lines, ReadMode, SplitFile, Whence};
pub use volume::{OpenMode, UNBOUNDED, VolumeConfig};

/// Opens a split stream on the local filesystem.
///
/// `mode` is one of `rb`, `wb`, `r+b`, `w+b`, `ab` or `ab+` (the `b` is
/// optional). The append modes keep existing volumes, create the stream if
/// it is missing and start at its end. `volume_size` is the capacity of each
/// volume in bytes; 0 disables splitting. A short last volume is filled up
/// to `volume_size` before a new one is started; use [`VolumeConfig`] to
/// turn that off.
///
/// # Errors
///
/// Returns [`Error::InvalidMode`] for an unknown mode string and
/// [`Error::VolumeMissing`] if `rb` or `r+b` finds no first volume.
pub fn open(path: impl AsRef<Path>, mode: &str, volume_size: u64) -> Result<SplitFile> {
    SplitFile::open_path(path, mode, volume_size)
}
