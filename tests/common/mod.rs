//! Shared test utilities for integration tests.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use volsplit::{OpenMode, SplitFile, VolumeConfig};

/// A temporary directory holding one split stream rooted at `stream.bin`.
pub struct Fixture {
    pub dir: TempDir,
    pub base: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let base = dir.path().join("stream.bin");
        Self { dir, base }
    }

    /// Opens the stream with the given capacity and mode.
    pub fn open(&self, volume_size: u64, mode: OpenMode) -> volsplit::Result<SplitFile> {
        SplitFile::open(VolumeConfig::new(&self.base, volume_size).mode(mode))
    }

    /// Path of volume `n`.
    pub fn volume_path(&self, n: u32) -> PathBuf {
        VolumeConfig::new(&self.base, 0).volume_path(n)
    }

    /// Sizes of the consecutive volume files on disk, starting at 1.
    pub fn volume_sizes(&self) -> Vec<u64> {
        (1..)
            .map(|n| self.volume_path(n))
            .map_while(|p| fs::metadata(p).ok())
            .map(|m| m.len())
            .collect()
    }

    /// Concatenated contents of the consecutive volume files.
    pub fn contents(&self) -> Vec<u8> {
        (1..)
            .map(|n| self.volume_path(n))
            .map_while(|p| fs::read(p).ok())
            .flatten()
            .collect()
    }

    /// Writes the given volumes directly, bypassing the stream.
    pub fn write_volumes(&self, volumes: &[&[u8]]) {
        for (i, data) in volumes.iter().enumerate() {
            fs::write(self.volume_path(i as u32 + 1), data).expect("Failed to write volume");
        }
    }

    pub fn exists(&self, n: u32) -> bool {
        Path::exists(&self.volume_path(n))
    }
}

/// Creates deterministic test data of the given length.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 251) as u8).collect()
}

/// Writes `data` to a fresh stream and closes it.
pub fn create_stream(fixture: &Fixture, volume_size: u64, data: &[u8]) {
    let mut stream = fixture
        .open(volume_size, OpenMode::WriteCreate)
        .expect("Failed to create stream");
    stream.write(data).expect("Failed to write stream");
    stream.close().expect("Failed to close stream");
}
