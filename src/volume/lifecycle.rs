//! Volume lifecycle: which volume is open, and how.
//!
//! At most one volume handle is open at a time. Switching volumes always
//! flushes and closes the previous handle before the next one is opened, so a
//! stream holds a single file descriptor no matter how many volumes it spans.

use std::io::{self, Read, Seek, SeekFrom, Write};

use super::store::{Access, VolumeHandle, VolumeStore};
use super::table::VolumeTable;
use crate::{Error, Result, VolumeOp};

/// Outcome of [`Lifecycle::activate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Activation {
    /// The requested volume was already open; its position is unchanged.
    Reused,
    /// The requested volume was opened; its position is 0.
    Opened,
    /// The volume does not exist and may not be created.
    Missing,
}

struct ActiveVolume<H> {
    volume: u32,
    handle: H,
}

/// Opens, creates, closes and cleans up individual volumes.
pub(crate) struct Lifecycle<S: VolumeStore> {
    store: S,
    writable: bool,
    active: Option<ActiveVolume<S::Handle>>,
}

impl<S: VolumeStore> Lifecycle<S> {
    pub(crate) fn new(store: S, writable: bool) -> Self {
        Self {
            store,
            writable,
            active: None,
        }
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    /// Returns the number of the open volume, if any.
    pub(crate) fn active_volume(&self) -> Option<u32> {
        self.active.as_ref().map(|a| a.volume)
    }

    pub(crate) fn error(&self, volume: u32, operation: VolumeOp, source: io::Error) -> Error {
        Error::volume(volume, self.store.describe(volume), operation, source)
    }

    /// Makes `volume` the open volume.
    ///
    /// Existing volumes open read-only in read-only sessions and for update
    /// (never truncated) otherwise. A missing volume is created only when
    /// `create` is set and the session is writable; otherwise
    /// [`Activation::Missing`] is returned and nothing is open afterwards.
    pub(crate) fn activate(
        &mut self,
        volume: u32,
        create: bool,
        table: &mut VolumeTable,
    ) -> Result<Activation> {
        if self.active_volume() == Some(volume) {
            return Ok(Activation::Reused);
        }
        self.release(table)?;

        let exists = self
            .store
            .probe(volume)
            .map_err(|e| self.error(volume, VolumeOp::Stat, e))?
            .is_some();
        let access = match (exists, self.writable) {
            (true, false) => Access::Read,
            (true, true) => Access::Update,
            (false, true) if create => Access::Create,
            (false, _) => return Ok(Activation::Missing),
        };
        let operation = if access == Access::Create {
            VolumeOp::Create
        } else {
            VolumeOp::Open
        };

        let handle = self
            .store
            .open(volume, access)
            .map_err(|e| self.error(volume, operation, e))?;
        log::debug!(
            "opened volume {} ({:?}) at {}",
            volume,
            access,
            self.store.describe(volume)
        );
        self.active = Some(ActiveVolume { volume, handle });
        Ok(Activation::Opened)
    }

    /// Flushes and closes the open volume, if any.
    ///
    /// In writable sessions, a trailing volume (other than the first) that is
    /// empty when closed is deleted and dropped from `table`. Failing to
    /// delete it is only logged.
    pub(crate) fn release(&mut self, table: &mut VolumeTable) -> Result<()> {
        let Some(mut active) = self.active.take() else {
            return Ok(());
        };
        let volume = active.volume;
        let flushed = active
            .handle
            .flush()
            .map_err(|e| self.error(volume, VolumeOp::Flush, e));
        let empty = matches!(active.handle.len(), Ok(0));
        drop(active);
        log::trace!("closed volume {}", volume);
        flushed?;

        if empty && volume > 1 && self.writable {
            self.discard_empty(volume, table);
        }
        Ok(())
    }

    /// Deletes empty volumes at the end of `table`, keeping volume 1.
    ///
    /// Stops at the first volume that cannot be removed.
    pub(crate) fn trim_empty_tail(&mut self, table: &mut VolumeTable) {
        loop {
            let last = table.volume_count();
            if last <= 1 || table.size_of(last) != 0 || self.active_volume() == Some(last) {
                return;
            }
            self.discard_empty(last, table);
            if table.volume_count() == last {
                return;
            }
        }
    }

    fn discard_empty(&mut self, volume: u32, table: &mut VolumeTable) {
        if volume != table.volume_count() {
            log::warn!(
                "volume {} is empty but not the last of {}; leaving it in place",
                volume,
                table.volume_count()
            );
            return;
        }
        match self.store.remove(volume) {
            Ok(()) => {
                log::debug!("removed empty trailing volume {}", self.store.describe(volume));
                table.shrink_to(volume - 1);
            }
            Err(e) => log::warn!(
                "failed to remove empty volume {}: {}",
                self.store.describe(volume),
                e
            ),
        }
    }

    /// Deletes a volume that is not open, reporting any failure.
    pub(crate) fn remove(&mut self, volume: u32) -> Result<()> {
        debug_assert_ne!(self.active_volume(), Some(volume));
        self.store
            .remove(volume)
            .map_err(|e| self.error(volume, VolumeOp::Remove, e))?;
        log::debug!("removed volume {}", self.store.describe(volume));
        Ok(())
    }

    fn active_mut(&mut self) -> Result<(u32, &mut S::Handle)> {
        match self.active.as_mut() {
            Some(a) => Ok((a.volume, &mut a.handle)),
            None => Err(Error::Io(io::Error::other("no volume is open"))),
        }
    }

    pub(crate) fn seek(&mut self, offset: u64) -> Result<()> {
        let (volume, handle) = self.active_mut()?;
        match handle.seek(SeekFrom::Start(offset)) {
            Ok(_) => Ok(()),
            Err(e) => Err(self.error(volume, VolumeOp::Seek, e)),
        }
    }

    pub(crate) fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let (volume, handle) = self.active_mut()?;
        loop {
            match handle.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.error(volume, VolumeOp::Read, e)),
            }
        }
    }

    pub(crate) fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        let (volume, handle) = self.active_mut()?;
        match handle.write_all(buf) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.error(volume, VolumeOp::Write, e)),
        }
    }

    pub(crate) fn set_len(&mut self, len: u64) -> Result<()> {
        let (volume, handle) = self.active_mut()?;
        match handle.set_len(len) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.error(volume, VolumeOp::Truncate, e)),
        }
    }

    pub(crate) fn flush(&mut self) -> Result<()> {
        let Some(active) = self.active.as_mut() else {
            return Ok(());
        };
        let volume = active.volume;
        match active.handle.flush() {
            Ok(()) => Ok(()),
            Err(e) => Err(self.error(volume, VolumeOp::Flush, e)),
        }
    }
}

impl<S: VolumeStore> std::fmt::Debug for Lifecycle<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("writable", &self.writable)
            .field("active_volume", &self.active_volume())
            .finish()
    }
}
