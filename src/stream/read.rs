//! Read engine: buffered reads that cross volume boundaries.

use super::{LastOp, SplitFile};
use crate::volume::VolumeStore;
use crate::{Error, Result};

/// Size of a single volume read: 20 tar records of 512 bytes.
pub const BLOCK_SIZE: usize = 20 * 512;

/// How [`SplitFile::read_with`] decides where a chunk ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// Return exactly the requested number of bytes, fewer only at end of stream.
    #[default]
    Bytes,
    /// Stop just after the first newline.
    Line,
}

impl<S: VolumeStore> SplitFile<S> {
    /// Reads up to `limit` bytes, or to the end of the stream if `limit` is `None`.
    ///
    /// An empty result means the end of the stream was reached.
    pub fn read_bytes(&mut self, limit: Option<usize>) -> Result<Vec<u8>> {
        self.read_with(limit, ReadMode::Bytes)
    }

    /// Reads everything from the current position to the end.
    pub fn read_to_end_of_stream(&mut self) -> Result<Vec<u8>> {
        self.read_with(None, ReadMode::Bytes)
    }

    /// Reads one line, including its trailing newline.
    ///
    /// The last line of a stream may lack the newline. Returns an empty
    /// vector at end of stream.
    pub fn read_line(&mut self) -> Result<Vec<u8>> {
        self.read_with(None, ReadMode::Line)
    }

    /// Reads one line, stopping after `limit` bytes if no newline comes first.
    pub fn read_line_limited(&mut self, limit: usize) -> Result<Vec<u8>> {
        self.read_with(Some(limit), ReadMode::Line)
    }

    /// Reads all remaining lines.
    pub fn read_lines(&mut self) -> Result<Vec<Vec<u8>>> {
        self.lines().collect()
    }

    /// Returns an iterator over the remaining lines.
    pub fn lines(&mut self) -> Lines<'_, S> {
        Lines { stream: self }
    }

    /// Reads a chunk according to `mode`, stopping after `limit` bytes if given.
    ///
    /// Volumes are fetched in blocks of at most [`BLOCK_SIZE`] bytes until the
    /// request is satisfied. When the last volume is exhausted, whatever is
    /// buffered is returned and the stream is marked as at end.
    pub fn read_with(&mut self, limit: Option<usize>, mode: ReadMode) -> Result<Vec<u8>> {
        self.check_readable()?;
        if limit == Some(0) {
            return Ok(Vec::new());
        }
        self.switch_to(LastOp::Read)?;
        if self.cursor.eof {
            return Ok(Vec::new());
        }

        let line = mode == ReadMode::Line;
        loop {
            if let Some(chunk) = self.buffer.take(limit, line) {
                self.cursor.position += chunk.len() as u64;
                return Ok(chunk);
            }
            let want = match limit {
                Some(n) => n.saturating_sub(self.buffer.len()).clamp(1, BLOCK_SIZE),
                None => BLOCK_SIZE,
            };
            if self.fetch(want)? == 0 {
                let chunk = self.buffer.take_all();
                self.cursor.position += chunk.len() as u64;
                self.cursor.eof = true;
                return Ok(chunk);
            }
        }
    }

    /// Appends up to `want` bytes from the volumes to the read buffer.
    ///
    /// Returns 0 only when no volume has data left.
    fn fetch(&mut self, want: usize) -> Result<usize> {
        loop {
            let volume = self.cursor.volume;
            if volume == 0 || volume > self.table.volume_count() {
                return Ok(0);
            }
            let offset = self.cursor.volume_offset;
            let remaining = self.table.size_of(volume).saturating_sub(offset);
            if remaining == 0 {
                let next = volume + 1;
                if next > self.table.volume_count() || !self.move_to(next, 0, false)? {
                    return Ok(0);
                }
                log::trace!("read crossed into volume {}", next);
                continue;
            }

            let n = remaining.min(want as u64) as usize;
            let volumes = &mut self.volumes;
            let got = self.buffer.fill_from(n, |buf| volumes.read(buf))?;
            if got == 0 {
                return Err(Error::VolumeCorrupted {
                    volume,
                    details: format!(
                        "expected {} more bytes at offset {}, found end of volume",
                        remaining, offset
                    ),
                });
            }
            self.cursor.volume_offset += got as u64;
            return Ok(got);
        }
    }
}

/// Iterator over the lines of a [`SplitFile`], created by [`SplitFile::lines`].
///
/// Each item includes its trailing newline, except possibly the last.
#[derive(Debug)]
pub struct Lines<'a, S: VolumeStore> {
    stream: &'a mut SplitFile<S>,
}

impl<S: VolumeStore> Iterator for Lines<'_, S> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.stream.read_line() {
            Ok(line) if line.is_empty() => None,
            Ok(line) => Some(Ok(line)),
            Err(e) => Some(Err(e)),
        }
    }
}
