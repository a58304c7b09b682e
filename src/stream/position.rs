//! Position translation: seek, tell and truncate.

use std::io::{self, SeekFrom};

use super::SplitFile;
use crate::volume::{Location, VolumeStore};
use crate::{Error, Result};

/// Origin of a numeric seek, as used by `lseek`-style APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// Relative to the start of the stream (0).
    Start,
    /// Relative to the current position (1).
    Current,
    /// Relative to the end of the stream (2).
    End,
}

impl TryFrom<i32> for Whence {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Self::Start),
            1 => Ok(Self::Current),
            2 => Ok(Self::End),
            other => Err(Error::InvalidWhence(other)),
        }
    }
}

impl<S: VolumeStore> SplitFile<S> {
    /// Moves the logical position and returns it.
    ///
    /// Seeking past the end is allowed; a later write fills the gap with
    /// zeros. Seeking before the start fails with [`Error::NegativeSeek`].
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.seek_to(pos)
    }

    /// Moves the logical position by `offset` relative to a numeric `whence`
    /// (0 start, 1 current, 2 end).
    pub fn seek_whence(&mut self, offset: i64, whence: i32) -> Result<u64> {
        let pos = match Whence::try_from(whence)? {
            Whence::Start => {
                if offset < 0 {
                    return Err(Error::NegativeSeek(offset as i128));
                }
                SeekFrom::Start(offset as u64)
            }
            Whence::Current => SeekFrom::Current(offset),
            Whence::End => SeekFrom::End(offset),
        };
        self.seek_to(pos)
    }

    /// Returns the logical position.
    pub fn tell(&self) -> Result<u64> {
        self.check_open()?;
        Ok(self.cursor.position)
    }

    pub(super) fn seek_to(&mut self, pos: SeekFrom) -> Result<u64> {
        self.check_open()?;
        let target = match pos {
            SeekFrom::Start(p) => p as i128,
            SeekFrom::Current(d) => self.cursor.position as i128 + d as i128,
            SeekFrom::End(d) => self.table.total_size() as i128 + d as i128,
        };
        if target < 0 {
            return Err(Error::NegativeSeek(target));
        }
        let target = u64::try_from(target).map_err(|_| {
            Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek position overflows u64",
            ))
        })?;
        self.reposition(target)?;
        Ok(target)
    }

    /// Resizes the stream to `size` bytes, defaulting to the current position.
    ///
    /// Growing appends zeros. Shrinking cuts the volume holding the new end
    /// and deletes every volume after it. The position is kept, clamped to
    /// the new size. Returns the new size.
    pub fn truncate(&mut self, size: Option<u64>) -> Result<u64> {
        self.check_writable()?;
        let saved = self.cursor.position;
        let size = size.unwrap_or(saved);
        let total = self.table.total_size();

        if size > total {
            self.zero_fill_to(size)?;
            self.reposition(saved)?;
        } else if size < total {
            self.shrink_to(size)?;
            self.reposition(saved.min(size))?;
        }
        log::debug!(
            "truncated split stream from {} to {} bytes ({} volume(s))",
            total,
            size,
            self.table.volume_count()
        );
        Ok(size)
    }

    fn shrink_to(&mut self, size: u64) -> Result<()> {
        let Location::Within { volume, offset } = self.table.locate(size) else {
            return Err(Error::VolumeCorrupted {
                volume: self.table.volume_count(),
                details: format!("offset {} is outside the volume table", size),
            });
        };
        self.move_to(volume, offset, false)?;

        for doomed in (volume + 1..=self.table.volume_count()).rev() {
            self.volumes.remove(doomed)?;
            self.table.shrink_to(doomed - 1);
        }
        self.volumes.set_len(offset)?;
        self.table.set_end(volume, size);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::{MemoryStore, OpenMode, VolumeConfig};

    fn filled(store: &MemoryStore, capacity: u64, len: usize) -> SplitFile<MemoryStore> {
        let config = VolumeConfig::new("mem", capacity).mode(OpenMode::WriteCreateUpdate);
        let mut stream = SplitFile::open_in(store.clone(), &config).unwrap();
        let data: Vec<u8> = (0..len).map(|i| b'a' + (i % 26) as u8).collect();
        stream.write(&data).unwrap();
        stream
    }

    #[test]
    fn test_whence_conversion() {
        assert_eq!(Whence::try_from(0).unwrap(), Whence::Start);
        assert_eq!(Whence::try_from(2).unwrap(), Whence::End);
        assert!(matches!(Whence::try_from(3), Err(Error::InvalidWhence(3))));
    }

    #[test]
    fn test_seek_whence() {
        let store = MemoryStore::new();
        let mut stream = filled(&store, 4, 10);
        assert_eq!(stream.seek_whence(-3, 2).unwrap(), 7);
        assert_eq!(stream.seek_whence(1, 1).unwrap(), 8);
        assert_eq!(stream.seek_whence(2, 0).unwrap(), 2);
        assert!(matches!(stream.seek_whence(0, 9), Err(Error::InvalidWhence(9))));
        assert!(matches!(stream.seek_whence(-1, 0), Err(Error::NegativeSeek(-1))));
        assert_eq!(stream.tell().unwrap(), 2, "failed seeks leave the position alone");
    }

    #[test]
    fn test_negative_seek() {
        let store = MemoryStore::new();
        let mut stream = filled(&store, 4, 10);
        let err = stream.seek(SeekFrom::Current(-11)).unwrap_err();
        assert!(matches!(err, Error::NegativeSeek(-1)));
    }

    #[test]
    fn test_seek_to_end_then_read() {
        let store = MemoryStore::new();
        let mut stream = filled(&store, 4, 10);
        assert_eq!(stream.seek(SeekFrom::End(0)).unwrap(), 10);
        assert_eq!(stream.read_bytes(None).unwrap(), b"");
        assert!(stream.at_eof());
    }

    #[test]
    fn test_seek_past_end_opens_nothing() {
        let store = MemoryStore::new();
        let mut stream = filled(&store, 4, 10);
        stream.seek(SeekFrom::Start(100)).unwrap();
        assert_eq!(stream.tell().unwrap(), 100);
        assert_eq!(stream.location(), None);
        assert_eq!(stream.size().unwrap(), 10);
        assert_eq!(stream.read_bytes(Some(4)).unwrap(), b"");
    }

    #[test]
    fn test_truncate_shrink_deletes_later_volumes() {
        let store = MemoryStore::new();
        let mut stream = filled(&store, 4, 10);
        assert_eq!(stream.truncate(Some(5)).unwrap(), 5);
        assert_eq!(stream.volume_sizes(), vec![4, 1]);
        assert_eq!(stream.tell().unwrap(), 5, "position clamped to the new size");
        assert_eq!(store.volume_sizes(), vec![4, 1]);

        stream.seek(SeekFrom::Start(0)).unwrap();
        assert_eq!(stream.read_to_end_of_stream().unwrap(), b"abcde");
    }

    #[test]
    fn test_truncate_on_boundary() {
        let store = MemoryStore::new();
        let mut stream = filled(&store, 4, 10);
        stream.truncate(Some(4)).unwrap();
        assert_eq!(store.volume_sizes(), vec![4]);
        stream.write(b"xy").unwrap();
        assert_eq!(store.volume_sizes(), vec![4, 2]);
    }

    #[test]
    fn test_truncate_grow_zero_fills() {
        let store = MemoryStore::new();
        let mut stream = filled(&store, 4, 3);
        stream.seek(SeekFrom::Start(1)).unwrap();
        stream.truncate(Some(9)).unwrap();
        assert_eq!(stream.tell().unwrap(), 1);
        assert_eq!(stream.size().unwrap(), 9);
        assert_eq!(store.volume_sizes(), vec![4, 4, 1]);
        assert_eq!(store.contents(), b"abc\0\0\0\0\0\0");
    }

    #[test]
    fn test_truncate_defaults_to_position() {
        let store = MemoryStore::new();
        let mut stream = filled(&store, 4, 10);
        stream.seek(SeekFrom::Start(6)).unwrap();
        assert_eq!(stream.truncate(None).unwrap(), 6);
        assert_eq!(stream.volume_sizes(), vec![4, 2]);
        assert_eq!(stream.tell().unwrap(), 6);
    }

    #[test]
    fn test_truncate_to_zero_keeps_first_volume() {
        let store = MemoryStore::new();
        let mut stream = filled(&store, 4, 10);
        stream.truncate(Some(0)).unwrap();
        assert_eq!(stream.tell().unwrap(), 0);
        stream.close().unwrap();
        assert_eq!(store.volume_sizes(), vec![0]);
    }

    #[test]
    fn test_truncate_surfaces_removal_failure() {
        let store = MemoryStore::new();
        let mut stream = filled(&store, 4, 10);
        store.deny_removal(3);
        let err = stream.truncate(Some(2)).unwrap_err();
        assert_eq!(err.volume_number(), Some(3));
        assert_eq!(stream.volume_sizes(), vec![4, 4, 2], "table still mirrors the volumes");
    }
}
