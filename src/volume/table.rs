//! Volume table: offset-to-volume translation.
//!
//! The table records, for every volume, how much it may hold and the logical
//! offset just past its last byte. It is the only structure that has to stay
//! in lock-step with the volumes on disk.

use super::store::VolumeStore;
use crate::{Error, Result, VolumeOp};

/// Capacity value of a volume that is never split.
pub const UNBOUNDED: u64 = u64::MAX;

/// One volume's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VolumeEntry {
    /// Maximum number of bytes the volume may hold.
    pub capacity: u64,
    /// Logical bytes in this volume and all preceding ones.
    pub cumulative_size: u64,
}

/// Result of a [`locate`] lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// The offset lies in (or at the end of) `volume`, `offset` bytes in.
    Within {
        /// Volume number (1-indexed).
        volume: u32,
        /// Offset inside the volume.
        offset: u64,
    },
    /// The offset lies past the end of the stream.
    BeyondEnd,
}

/// Finds the volume holding logical `offset`.
///
/// `entries[0]` must be the zero sentinel. Returns the lowest volume `i` with
/// `cumulative_size[i - 1] <= offset <= cumulative_size[i]`, so an offset on
/// a boundary resolves to the end of the earlier volume. The search starts
/// from a proportional guess and walks from there, which is constant time
/// for evenly sized volumes.
pub fn locate(entries: &[VolumeEntry], offset: u64) -> Location {
    let count = entries.len().saturating_sub(1);
    if count == 0 {
        return if offset == 0 {
            Location::Within {
                volume: 1,
                offset: 0,
            }
        } else {
            Location::BeyondEnd
        };
    }

    let total = entries[count].cumulative_size;
    if offset > total {
        return Location::BeyondEnd;
    }

    let mut i = if total == 0 {
        1
    } else {
        ((offset as u128 * count as u128) / total as u128) as usize
    }
    .clamp(1, count);

    while i > 1 && offset <= entries[i - 1].cumulative_size {
        i -= 1;
    }
    while offset > entries[i].cumulative_size {
        i += 1;
    }

    Location::Within {
        volume: i as u32,
        offset: offset - entries[i - 1].cumulative_size,
    }
}

/// Ordered record of every volume's capacity and cumulative size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeTable {
    /// Index 0 is a zero sentinel; volume `n` lives at index `n`.
    entries: Vec<VolumeEntry>,
}

impl Default for VolumeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl VolumeTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            entries: vec![VolumeEntry::default()],
        }
    }

    /// Builds a table from existing volumes `1, 2, 3, ...` until one is missing.
    ///
    /// Each volume's capacity is its current size.
    pub fn scan<S: VolumeStore>(store: &S) -> Result<Self> {
        let mut table = Self::new();
        let mut volume = 1u32;
        loop {
            let size = store
                .probe(volume)
                .map_err(|e| Error::volume(volume, store.describe(volume), VolumeOp::Stat, e))?;
            let Some(size) = size else { break };
            table.extend(volume, size);
            table.grow(volume, table.start_of(volume) + size);
            volume += 1;
        }
        log::debug!(
            "scanned {} volume(s), {} bytes total",
            table.volume_count(),
            table.total_size()
        );
        Ok(table)
    }

    /// Deletes volumes `1, 2, 3, ...` until one is missing.
    ///
    /// Used before creating a fresh stream. Any failed removal is returned.
    pub fn wipe<S: VolumeStore>(store: &mut S) -> Result<()> {
        let mut volume = 1u32;
        loop {
            let present = store
                .probe(volume)
                .map_err(|e| Error::volume(volume, store.describe(volume), VolumeOp::Stat, e))?;
            if present.is_none() {
                break;
            }
            store
                .remove(volume)
                .map_err(|e| Error::volume(volume, store.describe(volume), VolumeOp::Remove, e))?;
            log::debug!("removed stale volume {}", store.describe(volume));
            volume += 1;
        }
        Ok(())
    }

    /// Returns the entries including the sentinel at index 0.
    pub fn entries(&self) -> &[VolumeEntry] {
        &self.entries
    }

    /// Returns the number of volumes.
    pub fn volume_count(&self) -> u32 {
        (self.entries.len() - 1) as u32
    }

    /// Returns true if the table has no volumes.
    pub fn is_empty(&self) -> bool {
        self.entries.len() == 1
    }

    /// Returns the logical size of the whole stream.
    pub fn total_size(&self) -> u64 {
        self.entries[self.entries.len() - 1].cumulative_size
    }

    /// Returns the entry of `volume`, if it exists.
    pub fn entry(&self, volume: u32) -> Option<&VolumeEntry> {
        if volume == 0 {
            return None;
        }
        self.entries.get(volume as usize)
    }

    /// Returns the capacity of `volume`, or 0 if it does not exist.
    pub fn capacity(&self, volume: u32) -> u64 {
        self.entry(volume).map_or(0, |e| e.capacity)
    }

    /// Logical offset of the first byte of `volume`.
    pub fn start_of(&self, volume: u32) -> u64 {
        let prev = (volume as usize).saturating_sub(1);
        self.entries
            .get(prev)
            .map_or_else(|| self.total_size(), |e| e.cumulative_size)
    }

    /// Number of bytes currently in `volume`.
    pub fn size_of(&self, volume: u32) -> u64 {
        match self.entry(volume) {
            Some(e) => e.cumulative_size - self.start_of(volume),
            None => 0,
        }
    }

    /// Returns the sizes of all volumes.
    pub fn volume_sizes(&self) -> Vec<u64> {
        (1..=self.volume_count()).map(|v| self.size_of(v)).collect()
    }

    /// Finds the volume holding logical `offset`. See [`locate`].
    pub fn locate(&self, offset: u64) -> Location {
        locate(&self.entries, offset)
    }

    /// Appends volume `volume` with the given capacity.
    ///
    /// The new entry starts empty. `volume` must be exactly one past the
    /// current last volume.
    pub fn extend(&mut self, volume: u32, capacity: u64) {
        debug_assert_eq!(volume, self.volume_count() + 1, "volumes are appended in order");
        let cumulative_size = self.total_size();
        self.entries.push(VolumeEntry {
            capacity,
            cumulative_size,
        });
    }

    /// Raises the cumulative size of `volume` to `end` if it is larger.
    pub fn grow(&mut self, volume: u32, end: u64) {
        if let Some(e) = self.entries.get_mut(volume as usize) {
            e.cumulative_size = e.cumulative_size.max(end);
        }
    }

    /// Sets the cumulative size of `volume` to exactly `end`.
    pub fn set_end(&mut self, volume: u32, end: u64) {
        if let Some(e) = self.entries.get_mut(volume as usize) {
            e.cumulative_size = end;
        }
    }

    /// Drops every volume after `volume`.
    pub fn shrink_to(&mut self, volume: u32) {
        self.entries.truncate(volume as usize + 1);
    }

    /// Widens the last volume's capacity to `target` if it is smaller.
    ///
    /// Interior volumes are never touched: their logical ranges are fixed by
    /// the volumes that follow them.
    pub fn widen_last(&mut self, target: u64) -> bool {
        let last = self.entries.len() - 1;
        if last == 0 {
            return false;
        }
        let entry = &mut self.entries[last];
        if entry.capacity < target {
            log::debug!(
                "widening volume {} capacity from {} to {}",
                last,
                entry.capacity,
                target
            );
            entry.capacity = target;
            true
        } else {
            false
        }
    }
}
