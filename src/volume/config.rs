//! Configuration for split streams.

use std::path::{Path, PathBuf};

use super::OpenMode;
use crate::Result;

/// Configuration for opening a split stream.
///
/// Defines the base path, the capacity of each volume, the open mode and the
/// append-to-partial policy.
///
/// # Example
///
/// ```rust
/// use volsplit::{OpenMode, VolumeConfig};
///
/// // 100 MB volumes, opened for update, refilling a short last volume
/// let config = VolumeConfig::new("backup.bin", 100 * 1024 * 1024)
///     .mode(OpenMode::ReadWriteExisting)
///     .append_to_partial(true);
///
/// assert_eq!(config.volume_path(1).to_str().unwrap(), "backup.bin");
/// assert_eq!(config.volume_path(2).to_str().unwrap(), "backup.bin.2");
/// ```
#[derive(Debug, Clone)]
pub struct VolumeConfig {
    /// Maximum size of each volume in bytes; 0 disables splitting.
    volume_size: u64,
    /// Path of the first volume; later volumes append `.N`.
    base_path: PathBuf,
    /// Open mode.
    mode: OpenMode,
    /// Widen a short last volume up to `volume_size` when updating.
    append_to_partial: bool,
    /// Create a missing stream and start at its end.
    append: bool,
}

impl VolumeConfig {
    /// Creates a new configuration in [`OpenMode::ReadOnly`].
    ///
    /// # Arguments
    ///
    /// * `base_path` - Path of the first volume (e.g., "data.bin")
    /// * `volume_size` - Maximum size of each volume in bytes, 0 for unbounded
    pub fn new(base_path: impl AsRef<Path>, volume_size: u64) -> Self {
        Self {
            volume_size,
            base_path: base_path.as_ref().to_path_buf(),
            mode: OpenMode::ReadOnly,
            append_to_partial: false,
            append: false,
        }
    }

    /// Sets the open mode.
    pub fn mode(mut self, mode: OpenMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the append-to-partial policy.
    ///
    /// Only meaningful for [`OpenMode::ReadWriteExisting`]: if the last
    /// existing volume is smaller than the configured volume size, writes at
    /// the end of the stream extend it in place instead of starting a new
    /// volume.
    pub fn append_to_partial(mut self, enabled: bool) -> Self {
        self.append_to_partial = enabled;
        self
    }

    /// Opens for appending.
    ///
    /// Sets the mode to [`OpenMode::ReadWriteExisting`] and turns on
    /// append-to-partial. Existing volumes are kept, a missing first volume
    /// is created instead of failing, and the stream starts positioned at
    /// its end.
    pub fn append(mut self, enabled: bool) -> Self {
        self.append = enabled;
        if enabled {
            self.mode = OpenMode::ReadWriteExisting;
            self.append_to_partial = true;
        }
        self
    }

    /// Applies a mode string.
    ///
    /// Accepts everything [`OpenMode`] parses plus the append forms `a`,
    /// `ab`, `a+`, `ab+` and `a+b`, which map to [`append`](Self::append).
    ///
    /// ```rust
    /// use volsplit::{OpenMode, VolumeConfig};
    ///
    /// let config = VolumeConfig::new("log.bin", 1024).mode_str("ab")?;
    /// assert_eq!(config.open_mode(), OpenMode::ReadWriteExisting);
    /// assert!(config.appends() && config.appends_to_partial());
    /// # Ok::<(), volsplit::Error>(())
    /// ```
    pub fn mode_str(self, mode: &str) -> Result<Self> {
        match mode {
            "a" | "ab" | "a+" | "ab+" | "a+b" => Ok(self.append(true)),
            other => Ok(self.append(false).mode(other.parse()?)),
        }
    }

    /// Returns true if the stream is opened for appending.
    pub fn appends(&self) -> bool {
        self.append
    }

    /// Returns the base path (the path of the first volume).
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Returns the open mode.
    pub fn open_mode(&self) -> OpenMode {
        self.mode
    }

    /// Returns true if append-to-partial is enabled.
    pub fn appends_to_partial(&self) -> bool {
        self.append_to_partial
    }

    /// Generates the path for a specific volume number.
    ///
    /// Volume 1 is the base path itself; volume `n > 1` is `base.n`.
    ///
    /// ```rust
    /// use volsplit::VolumeConfig;
    ///
    /// let config = VolumeConfig::new("data.bin", 1024 * 1024);
    /// assert_eq!(config.volume_path(1).to_str().unwrap(), "data.bin");
    /// assert_eq!(config.volume_path(10).to_str().unwrap(), "data.bin.10");
    /// ```
    pub fn volume_path(&self, volume_number: u32) -> PathBuf {
        volume_path(&self.base_path, volume_number)
    }

    /// Returns the volume size in bytes.
    pub fn volume_size(&self) -> u64 {
        self.volume_size
    }

    /// Returns true if the stream is never split.
    pub fn is_unbounded(&self) -> bool {
        self.volume_size == 0
    }

    /// Creates a config with the default volume size (100 MB).
    pub fn with_default_size(base_path: impl AsRef<Path>) -> Self {
        Self::new(base_path, 100 * 1024 * 1024)
    }

    /// Creates a config for DVD-sized volumes (~4.7 GB).
    pub fn dvd(base_path: impl AsRef<Path>) -> Self {
        Self::new(base_path, 4700 * 1024 * 1024) // 4700 MiB
    }

    /// Creates a config for CD-sized volumes (~700 MB).
    pub fn cd(base_path: impl AsRef<Path>) -> Self {
        Self::new(base_path, 700 * 1024 * 1024)
    }

    /// Creates a config for FAT32-compatible volumes (~4 GB).
    pub fn fat32(base_path: impl AsRef<Path>) -> Self {
        // FAT32 max file size is 4 GB - 1 byte
        Self::new(base_path, 4 * 1024 * 1024 * 1024 - 1)
    }
}

/// Path of volume `volume_number` for a stream rooted at `base`.
pub(crate) fn volume_path(base: &Path, volume_number: u32) -> PathBuf {
    if volume_number <= 1 {
        return base.to_path_buf();
    }
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{}", volume_number));
    PathBuf::from(name)
}
