//! Fuzz target driving a split stream with arbitrary operations.
//!
//! Every operation is mirrored on a flat `Vec<u8>` and the two must agree
//! on contents, size and position after each step.
//!
//! Run with: cargo +nightly fuzz run stream_ops

#![no_main]

use std::io::SeekFrom;

use libfuzzer_sys::fuzz_target;
use volsplit::volume::MemoryStore;
use volsplit::{OpenMode, SplitFile, VolumeConfig};

const MAX_OFFSET: u64 = 4096;

fuzz_target!(|data: &[u8]| {
    let Some((&size, ops)) = data.split_first() else {
        return;
    };
    let store = MemoryStore::new();
    let config = VolumeConfig::new("fuzz", u64::from(size % 32)).mode(OpenMode::WriteCreateUpdate);
    let Ok(mut stream) = SplitFile::open_in(store.clone(), &config) else {
        return;
    };

    let mut model: Vec<u8> = Vec::new();
    let mut pos: u64 = 0;

    for op in ops.chunks_exact(3) {
        let arg = u64::from(u16::from_le_bytes([op[1], op[2]])) % MAX_OFFSET;
        match op[0] % 4 {
            0 => {
                let len = (arg % 64) as usize + 1;
                let chunk = vec![op[1]; len];
                stream.write(&chunk).expect("write");
                let end = pos as usize + len;
                if model.len() < end {
                    model.resize(end, 0);
                }
                model[pos as usize..end].copy_from_slice(&chunk);
                pos = end as u64;
            }
            1 => {
                pos = stream.seek(SeekFrom::Start(arg)).expect("seek");
            }
            2 => {
                let got = stream.read_bytes(Some(arg as usize)).expect("read");
                let start = (pos as usize).min(model.len());
                let end = (start + arg as usize).min(model.len());
                assert_eq!(got, &model[start..end]);
                pos += got.len() as u64;
            }
            _ => {
                stream.truncate(Some(arg)).expect("truncate");
                if arg < model.len() as u64 {
                    pos = pos.min(arg);
                }
                model.resize(arg as usize, 0);
            }
        }
        assert_eq!(stream.tell().expect("tell"), pos);
        assert_eq!(stream.size().expect("size"), model.len() as u64);
    }

    stream.close().expect("close");
    assert_eq!(store.contents(), model);
});
