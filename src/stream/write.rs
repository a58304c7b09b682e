//! Write engine: splitting writes at volume capacity.

use super::read::BLOCK_SIZE;
use super::{LastOp, SplitFile};
use crate::volume::{Location, VolumeStore};
use crate::{Error, Result};

static ZERO_BLOCK: [u8; BLOCK_SIZE] = [0; BLOCK_SIZE];

impl<S: VolumeStore> SplitFile<S> {
    /// Writes all of `data` at the current position and returns its length.
    ///
    /// Data that does not fit in the current volume continues in the next
    /// one, which is created when needed. Writing past the end of the stream
    /// first fills the gap with zeros.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.write_data(data)
    }

    /// Writes each item in turn, returning the total number of bytes written.
    pub fn write_lines<I, B>(&mut self, lines: I) -> Result<usize>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut total = 0;
        for line in lines {
            total += self.write_data(line.as_ref())?;
        }
        Ok(total)
    }

    pub(super) fn write_data(&mut self, data: &[u8]) -> Result<usize> {
        self.check_writable()?;
        self.switch_to(LastOp::Write)?;
        if self.cursor.position > self.table.total_size() {
            self.zero_fill_to(self.cursor.position)?;
        }
        self.cursor.eof = false;
        self.write_at_cursor(data)?;
        self.cursor.position += data.len() as u64;
        Ok(data.len())
    }

    /// Appends zeros from the current end of the stream up to `target`.
    ///
    /// Leaves the physical cursor at `target`; the logical position is not
    /// touched.
    pub(super) fn zero_fill_to(&mut self, target: u64) -> Result<()> {
        let total = self.table.total_size();
        let Location::Within { volume, offset } = self.table.locate(total) else {
            return Err(Error::VolumeCorrupted {
                volume: self.table.volume_count(),
                details: "end of stream is outside the volume table".into(),
            });
        };
        self.move_to(volume, offset, true)?;
        log::trace!("zero-filling {} bytes after offset {}", target - total, total);

        let mut remaining = target - total;
        while remaining > 0 {
            let n = remaining.min(BLOCK_SIZE as u64) as usize;
            self.write_at_cursor(&ZERO_BLOCK[..n])?;
            remaining -= n as u64;
        }
        Ok(())
    }

    /// Writes `data` at the physical cursor, moving to the next volume each
    /// time the current one reaches its capacity.
    fn write_at_cursor(&mut self, data: &[u8]) -> Result<()> {
        let mut rest = data;
        while !rest.is_empty() {
            let volume = self.cursor.volume;
            let room = self
                .table
                .capacity(volume)
                .saturating_sub(self.cursor.volume_offset);

            if room == 0 {
                let next = volume + 1;
                if next > self.table.volume_count() {
                    self.table.extend(next, self.capacity);
                }
                if !self.move_to(next, 0, true)? {
                    return Err(Error::Unsupported("stream not opened for writing"));
                }
                log::trace!("write crossed into volume {}", next);
                continue;
            }

            let n = room.min(rest.len() as u64) as usize;
            self.volumes.write_all(&rest[..n])?;
            self.cursor.volume_offset += n as u64;
            let end = self.table.start_of(volume) + self.cursor.volume_offset;
            self.table.grow(volume, end);
            rest = &rest[n..];
        }
        Ok(())
    }
}
