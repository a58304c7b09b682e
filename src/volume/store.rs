//! Per-volume storage backends.
//!
//! A split stream never touches the filesystem directly. It asks a
//! [`VolumeStore`] for numbered volumes and drives the returned
//! [`VolumeHandle`]s. [`FsStore`] maps volumes to files next to each other on
//! the local filesystem; [`MemoryStore`](super::MemoryStore) keeps them in
//! process memory.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, Write};
use std::path::{Path, PathBuf};

use super::config::volume_path;

/// How a volume should be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Open an existing volume for reading only.
    Read,
    /// Open an existing volume for reading and writing, keeping its contents.
    Update,
    /// Create a volume (or empty an existing one) for reading and writing.
    Create,
}

/// An open volume.
///
/// Reads and writes happen at the handle's own position, which the stream
/// sets with [`Seek`] whenever it activates a volume.
pub trait VolumeHandle: Read + Write + Seek {
    /// Truncates or extends the volume to exactly `len` bytes.
    fn set_len(&mut self, len: u64) -> io::Result<()>;

    /// Returns the current length of the volume in bytes.
    fn len(&self) -> io::Result<u64>;
}

/// A numbered collection of volumes, starting at 1.
pub trait VolumeStore {
    /// Handle type returned by [`open`](Self::open).
    type Handle: VolumeHandle;

    /// Returns the length of a volume, or `None` if it does not exist.
    fn probe(&self, volume: u32) -> io::Result<Option<u64>>;

    /// Opens a volume with the requested access.
    fn open(&mut self, volume: u32, access: Access) -> io::Result<Self::Handle>;

    /// Deletes a volume.
    fn remove(&mut self, volume: u32) -> io::Result<()>;

    /// Human-readable location of a volume, used in error messages.
    fn describe(&self, volume: u32) -> String;
}

/// Volumes stored as sibling files: `base`, `base.2`, `base.3`, ...
#[derive(Debug, Clone)]
pub struct FsStore {
    base_path: PathBuf,
}

impl FsStore {
    /// Creates a store rooted at the path of the first volume.
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Returns the path of the first volume.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Returns the path of a specific volume.
    pub fn volume_path(&self, volume: u32) -> PathBuf {
        volume_path(&self.base_path, volume)
    }
}

impl VolumeStore for FsStore {
    type Handle = File;

    fn probe(&self, volume: u32) -> io::Result<Option<u64>> {
        match fs::metadata(self.volume_path(volume)) {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn open(&mut self, volume: u32, access: Access) -> io::Result<File> {
        let mut options = OpenOptions::new();
        match access {
            Access::Read => options.read(true),
            Access::Update => options.read(true).write(true),
            Access::Create => options.read(true).write(true).create(true).truncate(true),
        };
        options.open(self.volume_path(volume))
    }

    fn remove(&mut self, volume: u32) -> io::Result<()> {
        fs::remove_file(self.volume_path(volume))
    }

    fn describe(&self, volume: u32) -> String {
        self.volume_path(volume).display().to_string()
    }
}

impl VolumeHandle for File {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }

    fn len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }
}
