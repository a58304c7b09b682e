//! Volume management for split streams.
//!
//! A split stream stores one logical byte sequence across several files
//! ("volumes"), each holding at most a fixed number of bytes.
//!
//! # Overview
//!
//! Split volumes are useful for:
//! - Storing large outputs on media with size limits (USB drives, DVDs)
//! - Working around file system limits such as FAT32's 4 GiB ceiling
//! - Splitting data for easier transfer or upload
//!
//! # Volume Naming Convention
//!
//! The first volume uses the base path unchanged; later volumes append the
//! volume number:
//! - `data.bin` - First volume
//! - `data.bin.2` - Second volume
//! - `data.bin.3` - Third volume
//!
//! There is no padding, and the naming is part of the on-disk format: a
//! stream written today must be readable by any later version.
//!
//! # Building Blocks
//!
//! - [`VolumeConfig`] and [`OpenMode`] describe how to open a stream.
//! - [`VolumeStore`] abstracts where volumes live. [`FsStore`] keeps them on
//!   disk, [`MemoryStore`] in memory.
//! - [`VolumeTable`] maps logical offsets to volumes.

mod config;
pub(crate) mod lifecycle;
mod memory;
mod mode;
mod store;
mod table;

pub use config::VolumeConfig;
pub use memory::{MemoryHandle, MemoryStore};
pub use mode::OpenMode;
pub use store::{Access, FsStore, VolumeHandle, VolumeStore};
pub use table::{Location, UNBOUNDED, VolumeEntry, VolumeTable, locate};
