//! The split stream: one seekable byte stream spread over many volumes.
//!
//! [`SplitFile`] ties the pieces together. The [`VolumeTable`] translates
//! logical offsets into `(volume, offset)` pairs, the lifecycle manager keeps
//! exactly one volume open, and the read and write engines move bytes across
//! volume boundaries.
//!
//! The stream tracks two cursors. The logical position is what callers see
//! through [`SplitFile::tell`]. The physical cursor is where the next volume
//! read or write happens; after reads it runs ahead of the logical position
//! by the number of bytes sitting in the read-ahead buffer. Switching between
//! reading and writing discards the buffer and brings both back in line.

mod buffer;
mod position;
mod read;
mod write;

use std::fmt;
use std::io;
use std::path::Path;

use crate::volume::lifecycle::{Activation, Lifecycle};
use crate::volume::{FsStore, Location, OpenMode, UNBOUNDED, VolumeConfig, VolumeStore, VolumeTable};
use crate::{Error, Result};

use buffer::ReadBuffer;

pub use position::Whence;
pub use read::{BLOCK_SIZE, Lines, ReadMode};

/// The last kind of data transfer, used to detect read/write switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum LastOp {
    #[default]
    None,
    Read,
    Write,
}

#[derive(Debug, Default)]
struct Cursor {
    /// Logical position reported to callers.
    position: u64,
    /// Volume the next physical transfer uses.
    volume: u32,
    /// Offset inside `volume` of the next physical transfer.
    volume_offset: u64,
    last_op: LastOp,
    eof: bool,
    closed: bool,
}

/// A byte stream stored across numbered volumes.
///
/// Reads and writes cross volume boundaries transparently; seeking works on
/// logical offsets over the concatenation of all volumes.
///
/// # Example
///
/// ```rust,no_run
/// use volsplit::{OpenMode, SplitFile, VolumeConfig};
///
/// let config = VolumeConfig::new("capture.bin", 1024 * 1024).mode(OpenMode::WriteCreate);
/// let mut stream = SplitFile::open(config)?;
/// stream.write(&vec![0u8; 3 * 1024 * 1024])?;
/// stream.close()?;
/// # Ok::<(), volsplit::Error>(())
/// ```
pub struct SplitFile<S: VolumeStore = FsStore> {
    volumes: Lifecycle<S>,
    table: VolumeTable,
    cursor: Cursor,
    buffer: ReadBuffer,
    mode: OpenMode,
    /// Capacity given to newly created volumes.
    capacity: u64,
}

impl SplitFile<FsStore> {
    /// Opens a split stream on the local filesystem.
    pub fn open(config: VolumeConfig) -> Result<Self> {
        let store = FsStore::new(config.base_path());
        Self::open_in(store, &config)
    }

    /// Opens a split stream at `path` with a mode string (`rb`, `wb`, `r+b`,
    /// `w+b`, or `ab`/`ab+` for appending).
    ///
    /// A `volume_size` of 0 disables splitting. Append-to-partial is on, so
    /// a short last volume is filled before a new one is started.
    pub fn open_path(path: impl AsRef<Path>, mode: &str, volume_size: u64) -> Result<Self> {
        let config = VolumeConfig::new(path, volume_size)
            .append_to_partial(true)
            .mode_str(mode)?;
        Self::open(config)
    }
}

impl<S: VolumeStore> SplitFile<S> {
    /// Opens a split stream whose volumes live in `store`.
    ///
    /// Creating modes delete any existing volumes and start over with an
    /// empty first volume. The other modes require the first volume to exist
    /// and scan every consecutive volume after it, except when appending,
    /// where a missing stream is created and the cursor starts at the end.
    pub fn open_in(mut store: S, config: &VolumeConfig) -> Result<Self> {
        let mode = config.open_mode();
        let append = config.appends() && mode == OpenMode::ReadWriteExisting;
        let capacity = if config.is_unbounded() {
            UNBOUNDED
        } else {
            config.volume_size()
        };

        let mut table = if mode.creates() {
            VolumeTable::wipe(&mut store)?;
            let mut table = VolumeTable::new();
            table.extend(1, capacity);
            table
        } else {
            let mut table = VolumeTable::scan(&store)?;
            if table.is_empty() {
                if !append {
                    return Err(missing_first_volume(&store));
                }
                table.extend(1, capacity);
            }
            table
        };

        let mut volumes = Lifecycle::new(store, mode.writable());
        if mode == OpenMode::ReadWriteExisting {
            volumes.trim_empty_tail(&mut table);
            // An empty stream has no partial data to protect.
            if config.appends_to_partial() || table.total_size() == 0 {
                table.widen_last(capacity);
            }
        }

        if volumes.activate(1, mode.creates() || append, &mut table)? == Activation::Missing {
            return Err(missing_first_volume(volumes.store()));
        }
        log::debug!(
            "opened split stream {} ({}) with {} volume(s), {} bytes",
            volumes.store().describe(1),
            mode,
            table.volume_count(),
            table.total_size()
        );

        let mut stream = Self {
            volumes,
            table,
            cursor: Cursor {
                volume: 1,
                ..Cursor::default()
            },
            buffer: ReadBuffer::default(),
            mode,
            capacity,
        };
        if append {
            let end = stream.table.total_size();
            stream.reposition(end)?;
        }
        Ok(stream)
    }

    /// Returns the store holding the volumes.
    pub fn store(&self) -> &S {
        self.volumes.store()
    }

    /// Returns the open mode.
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Returns true if the stream was opened for reading.
    ///
    /// Fails with [`Error::Closed`] after [`close`](Self::close).
    pub fn readable(&self) -> Result<bool> {
        self.check_open()?;
        Ok(self.mode.readable())
    }

    /// Returns true if the stream was opened for writing.
    ///
    /// Fails with [`Error::Closed`] after [`close`](Self::close).
    pub fn writable(&self) -> Result<bool> {
        self.check_open()?;
        Ok(self.mode.writable())
    }

    /// Split streams are always seekable while open.
    pub fn seekable(&self) -> Result<bool> {
        self.check_open()?;
        Ok(true)
    }

    /// Returns true once [`close`](Self::close) has been called.
    pub fn closed(&self) -> bool {
        self.cursor.closed
    }

    /// Returns true if the last read hit the end of the stream, or the
    /// cursor was moved past it.
    pub fn at_eof(&self) -> bool {
        self.cursor.eof
    }

    /// Returns the logical size of the stream.
    pub fn size(&self) -> Result<u64> {
        self.check_open()?;
        Ok(self.table.total_size())
    }

    /// Returns the number of volumes.
    ///
    /// This and the other layout queries ([`volume_sizes`](Self::volume_sizes),
    /// [`table`](Self::table), [`location`](Self::location)) keep answering
    /// after [`close`](Self::close), describing the volumes as they were left.
    pub fn volume_count(&self) -> u32 {
        self.table.volume_count()
    }

    /// Returns the number of bytes in each volume.
    pub fn volume_sizes(&self) -> Vec<u64> {
        self.table.volume_sizes()
    }

    /// Returns the volume table.
    pub fn table(&self) -> &VolumeTable {
        &self.table
    }

    /// Returns the `(volume, offset)` pair of the logical position, or `None`
    /// if the position lies past the end of the stream.
    pub fn location(&self) -> Option<(u32, u64)> {
        match self.table.locate(self.cursor.position) {
            Location::Within { volume, offset } => Some((volume, offset)),
            Location::BeyondEnd => None,
        }
    }

    /// Flushes the open volume.
    pub fn flush(&mut self) -> Result<()> {
        self.check_open()?;
        self.volumes.flush()
    }

    /// Closes the stream.
    ///
    /// Flushes and closes the open volume, deleting it if it is an empty
    /// trailing volume. Closing an already closed stream does nothing.
    pub fn close(&mut self) -> Result<()> {
        if self.cursor.closed {
            return Ok(());
        }
        self.cursor.closed = true;
        self.buffer.clear();
        let result = self.volumes.release(&mut self.table);
        log::debug!(
            "closed split stream {} at {} bytes in {} volume(s)",
            self.volumes.store().describe(1),
            self.table.total_size(),
            self.table.volume_count()
        );
        result
    }

    fn check_open(&self) -> Result<()> {
        if self.cursor.closed {
            Err(Error::Closed)
        } else {
            Ok(())
        }
    }

    fn check_readable(&self) -> Result<()> {
        self.check_open()?;
        if self.mode.readable() {
            Ok(())
        } else {
            Err(Error::Unsupported("stream not opened for reading"))
        }
    }

    fn check_writable(&self) -> Result<()> {
        self.check_open()?;
        if self.mode.writable() {
            Ok(())
        } else {
            Err(Error::Unsupported("stream not opened for writing"))
        }
    }

    /// Moves the physical cursor to `offset` inside `volume`.
    ///
    /// Returns false if the volume does not exist and may not be created.
    fn move_to(&mut self, volume: u32, offset: u64, create: bool) -> Result<bool> {
        if self.volumes.activate(volume, create, &mut self.table)? == Activation::Missing {
            return Ok(false);
        }
        self.volumes.seek(offset)?;
        self.cursor.volume = volume;
        self.cursor.volume_offset = offset;
        Ok(true)
    }

    /// Discards buffered data and points both cursors at logical `position`.
    ///
    /// A position past the end only sets the end-of-stream flag; no volume
    /// is opened until data is written there.
    fn reposition(&mut self, position: u64) -> Result<()> {
        self.buffer.clear();
        self.cursor.position = position;
        match self.table.locate(position) {
            Location::BeyondEnd => {
                self.cursor.eof = true;
                Ok(())
            }
            Location::Within { volume, offset } => {
                self.cursor.eof = false;
                if self.move_to(volume, offset, false)? {
                    Ok(())
                } else {
                    Err(Error::VolumeCorrupted {
                        volume,
                        details: "volume listed in the table no longer exists".into(),
                    })
                }
            }
        }
    }

    /// Prepares for a transfer of kind `op`, resynchronising on a switch.
    fn switch_to(&mut self, op: LastOp) -> Result<()> {
        if self.cursor.last_op != op {
            let position = self.cursor.position;
            self.reposition(position)?;
            self.cursor.last_op = op;
        }
        Ok(())
    }
}

fn missing_first_volume<S: VolumeStore>(store: &S) -> Error {
    Error::VolumeMissing {
        volume: 1,
        path: store.describe(1),
        source: io::Error::new(io::ErrorKind::NotFound, "first volume not found"),
    }
}

impl<S: VolumeStore> Drop for SplitFile<S> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("error closing split stream: {}", e);
        }
    }
}

impl<S: VolumeStore> fmt::Debug for SplitFile<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitFile")
            .field("mode", &self.mode)
            .field("position", &self.cursor.position)
            .field("volumes", &self.table.volume_count())
            .field("size", &self.table.total_size())
            .field("closed", &self.cursor.closed)
            .finish()
    }
}

impl<S: VolumeStore> io::Read for SplitFile<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let data = self.read_with(Some(buf.len()), ReadMode::Bytes)?;
        buf[..data.len()].copy_from_slice(&data);
        Ok(data.len())
    }
}

impl<S: VolumeStore> io::Write for SplitFile<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_data(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(SplitFile::flush(self)?)
    }
}

impl<S: VolumeStore> io::Seek for SplitFile<S> {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        Ok(self.seek_to(pos)?)
    }
}
