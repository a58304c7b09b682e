//! In-memory volume store.
//!
//! [`MemoryStore`] keeps every volume in a shared buffer. Clones of a store
//! share the same volumes, so a test can hand one clone to a
//! [`SplitFile`](crate::SplitFile) and inspect the volumes through another.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use super::store::{Access, VolumeHandle, VolumeStore};

/// Acquires a mutex lock, recovering from poisoned state if necessary.
///
/// Volume buffers hold plain bytes with no cross-field invariants.
fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        log::warn!("MemoryStore mutex was poisoned, recovering");
        poisoned.into_inner()
    })
}

type Buffer = Arc<Mutex<Vec<u8>>>;

#[derive(Debug, Default)]
struct Volumes {
    data: BTreeMap<u32, Buffer>,
    deny_removal: BTreeSet<u32>,
}

/// Volumes held in process memory.
///
/// # Example
///
/// ```rust
/// use volsplit::volume::MemoryStore;
/// use volsplit::{OpenMode, SplitFile, VolumeConfig};
///
/// let store = MemoryStore::new();
/// let config = VolumeConfig::new("mem", 4).mode(OpenMode::WriteCreate);
/// let mut stream = SplitFile::open_in(store.clone(), &config)?;
/// stream.write(b"0123456789")?;
/// stream.close()?;
///
/// assert_eq!(store.volume_sizes(), vec![4, 4, 2]);
/// assert_eq!(store.contents(), b"0123456789");
/// # Ok::<(), volsplit::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Volumes>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given volumes, numbered from 1.
    pub fn with_volumes<I, V>(volumes: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Vec<u8>>,
    {
        let store = Self::new();
        {
            let mut inner = lock_or_recover(&store.inner);
            for (i, v) in volumes.into_iter().enumerate() {
                inner
                    .data
                    .insert(i as u32 + 1, Arc::new(Mutex::new(v.into())));
            }
        }
        store
    }

    /// Returns a copy of one volume's bytes.
    pub fn volume(&self, volume: u32) -> Option<Vec<u8>> {
        let inner = lock_or_recover(&self.inner);
        inner.data.get(&volume).map(|b| lock_or_recover(b).clone())
    }

    /// Returns the number of consecutive volumes starting at 1.
    pub fn volume_count(&self) -> u32 {
        let inner = lock_or_recover(&self.inner);
        let mut n = 0;
        while inner.data.contains_key(&(n + 1)) {
            n += 1;
        }
        n
    }

    /// Returns the sizes of the consecutive volumes starting at 1.
    pub fn volume_sizes(&self) -> Vec<u64> {
        (1..=self.volume_count())
            .filter_map(|n| self.volume(n))
            .map(|v| v.len() as u64)
            .collect()
    }

    /// Returns the concatenation of the consecutive volumes starting at 1.
    pub fn contents(&self) -> Vec<u8> {
        (1..=self.volume_count())
            .filter_map(|n| self.volume(n))
            .flatten()
            .collect()
    }

    /// Makes removal of `volume` fail with `PermissionDenied`.
    pub fn deny_removal(&self, volume: u32) {
        lock_or_recover(&self.inner).deny_removal.insert(volume);
    }

    /// Lifts a previous [`deny_removal`](Self::deny_removal).
    pub fn allow_removal(&self, volume: u32) {
        lock_or_recover(&self.inner).deny_removal.remove(&volume);
    }
}

impl VolumeStore for MemoryStore {
    type Handle = MemoryHandle;

    fn probe(&self, volume: u32) -> io::Result<Option<u64>> {
        let inner = lock_or_recover(&self.inner);
        Ok(inner
            .data
            .get(&volume)
            .map(|b| lock_or_recover(b).len() as u64))
    }

    fn open(&mut self, volume: u32, access: Access) -> io::Result<MemoryHandle> {
        let mut inner = lock_or_recover(&self.inner);
        let data = match access {
            Access::Create => {
                let buffer = inner
                    .data
                    .entry(volume)
                    .or_insert_with(|| Arc::new(Mutex::new(Vec::new())));
                lock_or_recover(buffer).clear();
                Arc::clone(buffer)
            }
            Access::Read | Access::Update => match inner.data.get(&volume) {
                Some(buffer) => Arc::clone(buffer),
                None => {
                    return Err(io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("memory volume {} not found", volume),
                    ));
                }
            },
        };
        Ok(MemoryHandle {
            data,
            pos: 0,
            writable: access != Access::Read,
        })
    }

    fn remove(&mut self, volume: u32) -> io::Result<()> {
        let mut inner = lock_or_recover(&self.inner);
        if inner.deny_removal.contains(&volume) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("removal of memory volume {} denied", volume),
            ));
        }
        match inner.data.remove(&volume) {
            Some(_) => Ok(()),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("memory volume {} not found", volume),
            )),
        }
    }

    fn describe(&self, volume: u32) -> String {
        format!("memory:{}", volume)
    }
}

/// Handle to a volume in a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryHandle {
    data: Buffer,
    pos: u64,
    writable: bool,
}

impl MemoryHandle {
    fn check_writable(&self) -> io::Result<()> {
        if self.writable {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "memory volume opened read-only",
            ))
        }
    }
}

impl Read for MemoryHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let data = lock_or_recover(&self.data);
        let start = (self.pos as usize).min(data.len());
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        self.pos += n as u64;
        Ok(n)
    }
}

impl Write for MemoryHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.check_writable()?;
        let mut data = lock_or_recover(&self.data);
        let start = self.pos as usize;
        let end = start + buf.len();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(buf);
        self.pos = end as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for MemoryHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = lock_or_recover(&self.data).len() as i128;
        let target = match pos {
            SeekFrom::Start(p) => p as i128,
            SeekFrom::Current(d) => self.pos as i128 + d as i128,
            SeekFrom::End(d) => len + d as i128,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of memory volume",
            ));
        }
        self.pos = target as u64;
        Ok(self.pos)
    }
}

impl VolumeHandle for MemoryHandle {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        self.check_writable()?;
        lock_or_recover(&self.data).resize(len as usize, 0);
        Ok(())
    }

    fn len(&self) -> io::Result<u64> {
        Ok(lock_or_recover(&self.data).len() as u64)
    }
}
