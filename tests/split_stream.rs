//! Split stream tests against real volume files.

use std::fs;
use std::io::{self, Read, Seek, SeekFrom, Write};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use volsplit::{Error, OpenMode, SplitFile, VolumeConfig};

mod common;
use common::{Fixture, create_stream, pattern};

// =============================================================================
// Volume layout
// =============================================================================

#[test]
fn test_write_splits_into_volume_files() {
    let fixture = Fixture::new();
    create_stream(&fixture, 10, &pattern(25));

    assert_eq!(fixture.volume_sizes(), vec![10, 10, 5]);
    assert!(fixture.volume_path(2).ends_with("stream.bin.2"));
    assert_eq!(fixture.contents(), pattern(25));
}

#[test]
fn test_exact_multiple_leaves_no_empty_volume() {
    let fixture = Fixture::new();
    create_stream(&fixture, 10, &pattern(20));

    assert_eq!(fixture.volume_sizes(), vec![10, 10]);
    assert!(!fixture.exists(3));
}

#[test]
fn test_unbounded_volume_size() {
    let fixture = Fixture::new();
    create_stream(&fixture, 0, &pattern(100_000));

    assert_eq!(fixture.volume_sizes(), vec![100_000]);
}

#[test]
fn test_create_removes_previous_volumes() {
    let fixture = Fixture::new();
    create_stream(&fixture, 10, &pattern(45));
    assert_eq!(fixture.volume_sizes().len(), 5);

    create_stream(&fixture, 10, b"short");
    assert_eq!(fixture.volume_sizes(), vec![5]);
    assert!(!fixture.exists(2));
    assert!(!fixture.exists(5));
}

#[test]
fn test_scan_stops_at_first_gap() {
    let fixture = Fixture::new();
    create_stream(&fixture, 10, &pattern(35));
    fs::remove_file(fixture.volume_path(3)).unwrap();

    let stream = fixture.open(10, OpenMode::ReadOnly).unwrap();
    assert_eq!(stream.volume_count(), 2);
    assert_eq!(stream.size().unwrap(), 20);
}

// =============================================================================
// Reading
// =============================================================================

#[test]
fn test_seek_and_read_across_volumes() {
    let fixture = Fixture::new();
    let data = pattern(25);
    create_stream(&fixture, 10, &data);

    let mut stream = fixture.open(10, OpenMode::ReadOnly).unwrap();
    assert_eq!(stream.volume_sizes(), vec![10, 10, 5]);

    stream.seek(SeekFrom::Start(12)).unwrap();
    assert_eq!(stream.read_bytes(Some(5)).unwrap(), &data[12..17]);
    assert_eq!(stream.tell().unwrap(), 17);
    assert_eq!(stream.location(), Some((2, 7)));

    stream.seek(SeekFrom::Start(8)).unwrap();
    assert_eq!(stream.read_bytes(Some(15)).unwrap(), &data[8..23]);
}

#[test]
fn test_read_to_end_with_std_io() {
    let fixture = Fixture::new();
    let data = pattern(50_000);
    create_stream(&fixture, 4096, &data);

    let mut stream = fixture.open(4096, OpenMode::ReadOnly).unwrap();
    let mut restored = Vec::new();
    stream.read_to_end(&mut restored).unwrap();
    assert_eq!(restored, data);
    assert!(stream.at_eof());
}

#[test]
fn test_read_lines_across_volume_boundaries() {
    let fixture = Fixture::new();
    create_stream(&fixture, 4, b"alpha\nbeta\ngamma");

    let mut stream = fixture.open(4, OpenMode::ReadOnly).unwrap();
    assert_eq!(stream.read_line().unwrap(), b"alpha\n");
    assert_eq!(stream.location(), Some((2, 2)));
    assert_eq!(
        stream.read_lines().unwrap(),
        vec![b"beta\n".to_vec(), b"gamma".to_vec()]
    );
    assert!(stream.read_line().unwrap().is_empty());
}

#[test]
fn test_lines_iterator() {
    let fixture = Fixture::new();
    create_stream(&fixture, 3, b"one\ntwo\nthree\n");

    let mut stream = fixture.open(3, OpenMode::ReadOnly).unwrap();
    let lines: Vec<Vec<u8>> = stream.lines().collect::<Result<_, _>>().unwrap();
    assert_eq!(lines, vec![b"one\n".to_vec(), b"two\n".to_vec(), b"three\n".to_vec()]);
}

#[test]
fn test_read_past_end_is_empty() {
    let fixture = Fixture::new();
    create_stream(&fixture, 10, &pattern(15));

    let mut stream = fixture.open(10, OpenMode::ReadOnly).unwrap();
    stream.seek(SeekFrom::Start(100)).unwrap();
    assert!(stream.at_eof());
    assert!(stream.read_bytes(Some(10)).unwrap().is_empty());
    assert_eq!(stream.location(), None);
}

#[test]
fn test_shortened_volume_reports_corruption() {
    let fixture = Fixture::new();
    create_stream(&fixture, 10, &pattern(25));

    let mut stream = fixture.open(10, OpenMode::ReadOnly).unwrap();
    fs::File::options()
        .write(true)
        .open(fixture.volume_path(2))
        .unwrap()
        .set_len(3)
        .unwrap();

    let err = stream.read_to_end_of_stream().unwrap_err();
    assert!(matches!(err, Error::VolumeCorrupted { volume: 2, .. }), "{err}");
}

#[test]
fn test_random_access_reads_match_source() {
    let fixture = Fixture::new();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut data = vec![0u8; 20_000];
    rng.fill(&mut data[..]);
    create_stream(&fixture, 1531, &data);

    let mut stream = fixture.open(1531, OpenMode::ReadOnly).unwrap();
    for _ in 0..200 {
        let start = rng.gen_range(0..data.len());
        let len = rng.gen_range(0..3000);
        stream.seek(SeekFrom::Start(start as u64)).unwrap();
        let end = (start + len).min(data.len());
        assert_eq!(stream.read_bytes(Some(len)).unwrap(), &data[start..end]);
        assert_eq!(stream.tell().unwrap(), end as u64);
    }
}

// =============================================================================
// Writing and updating
// =============================================================================

#[test]
fn test_write_past_end_zero_fills() {
    let fixture = Fixture::new();
    let mut stream = fixture.open(10, OpenMode::WriteCreate).unwrap();
    stream.write(b"hello").unwrap();
    stream.seek(SeekFrom::Start(23)).unwrap();
    stream.write(b"Z").unwrap();
    stream.close().unwrap();

    assert_eq!(fixture.volume_sizes(), vec![10, 10, 4]);
    let contents = fixture.contents();
    assert_eq!(&contents[..5], b"hello");
    assert!(contents[5..23].iter().all(|&b| b == 0));
    assert_eq!(contents[23], b'Z');
}

#[test]
fn test_overwrite_across_boundary_in_place() {
    let fixture = Fixture::new();
    let mut data = pattern(25);
    create_stream(&fixture, 10, &data);

    let mut stream = fixture.open(10, OpenMode::ReadWriteExisting).unwrap();
    stream.seek(SeekFrom::Start(8)).unwrap();
    stream.write(b"abc").unwrap();
    stream.close().unwrap();

    data[8..11].copy_from_slice(b"abc");
    assert_eq!(fixture.volume_sizes(), vec![10, 10, 5]);
    assert_eq!(fixture.contents(), data);
}

#[test]
fn test_append_starts_new_volume_after_partial() {
    let fixture = Fixture::new();
    create_stream(&fixture, 10, &pattern(24));

    let mut stream = fixture.open(10, OpenMode::ReadWriteExisting).unwrap();
    stream.seek(SeekFrom::End(0)).unwrap();
    stream.write(b"123456").unwrap();
    stream.close().unwrap();

    assert_eq!(fixture.volume_sizes(), vec![10, 10, 4, 6]);
}

#[test]
fn test_append_to_partial_fills_last_volume() {
    let fixture = Fixture::new();
    create_stream(&fixture, 10, &pattern(24));

    let config = VolumeConfig::new(&fixture.base, 10)
        .mode(OpenMode::ReadWriteExisting)
        .append_to_partial(true);
    let mut stream = SplitFile::open(config).unwrap();
    stream.seek(SeekFrom::End(0)).unwrap();
    stream.write(b"123456").unwrap();
    stream.close().unwrap();

    assert_eq!(fixture.volume_sizes(), vec![10, 10, 10]);
    assert_eq!(&fixture.contents()[24..], b"123456");
}

#[test]
fn test_unbounded_reopen_grows_last_volume_only_when_appending_to_partial() {
    for (append_to_partial, expected) in [(true, vec![10u64, 10, 54]), (false, vec![10u64, 10, 4, 50])] {
        let fixture = Fixture::new();
        create_stream(&fixture, 10, &pattern(24));

        let config = VolumeConfig::new(&fixture.base, 0)
            .mode(OpenMode::ReadWriteExisting)
            .append_to_partial(append_to_partial);
        let mut stream = SplitFile::open(config).unwrap();
        stream.seek(SeekFrom::End(0)).unwrap();
        stream.write(&pattern(50)).unwrap();
        stream.close().unwrap();

        assert_eq!(fixture.volume_sizes(), expected, "append_to_partial={append_to_partial}");
        assert_eq!(&fixture.contents()[24..], &pattern(50)[..]);
    }
}

#[test]
fn test_open_update_fills_partial_volume() {
    let fixture = Fixture::new();
    create_stream(&fixture, 10, &pattern(24));

    let mut stream = volsplit::open(&fixture.base, "r+b", 10).unwrap();
    stream.seek(SeekFrom::End(0)).unwrap();
    stream.write(&pattern(8)).unwrap();
    stream.close().unwrap();

    assert_eq!(fixture.volume_sizes(), vec![10, 10, 10, 2]);
}

#[test]
fn test_append_mode_starts_at_end() {
    let fixture = Fixture::new();
    create_stream(&fixture, 10, &pattern(24));

    let mut stream = volsplit::open(&fixture.base, "ab", 10).unwrap();
    assert_eq!(stream.mode(), OpenMode::ReadWriteExisting);
    assert_eq!(stream.tell().unwrap(), 24);
    stream.write(b"12345678").unwrap();
    stream.close().unwrap();

    assert_eq!(fixture.volume_sizes(), vec![10, 10, 10, 2]);
    assert_eq!(&fixture.contents()[..24], &pattern(24)[..]);
    assert_eq!(&fixture.contents()[24..], b"12345678");
}

#[test]
fn test_append_mode_creates_missing_stream() {
    let fixture = Fixture::new();
    let mut stream = volsplit::open(&fixture.base, "ab+", 10).unwrap();
    assert_eq!(stream.tell().unwrap(), 0);
    stream.write(&pattern(15)).unwrap();

    stream.seek(SeekFrom::Start(3)).unwrap();
    assert_eq!(stream.read_bytes(Some(4)).unwrap(), &pattern(7)[3..]);
    stream.close().unwrap();

    assert_eq!(fixture.volume_sizes(), vec![10, 5]);
    assert_eq!(fixture.contents(), pattern(15));
}

#[test]
fn test_append_mode_keeps_empty_stream() {
    let fixture = Fixture::new();
    volsplit::open(&fixture.base, "a+b", 10).unwrap().close().unwrap();

    assert_eq!(fixture.volume_sizes(), vec![0]);
    let stream = volsplit::open(&fixture.base, "rb", 10).unwrap();
    assert_eq!(stream.size().unwrap(), 0);
}

#[test]
fn test_write_then_read_back_in_update_session() {
    let fixture = Fixture::new();
    let data = pattern(1000);
    let mut stream = fixture.open(64, OpenMode::WriteCreateUpdate).unwrap();
    stream.write_all(&data).unwrap();

    stream.seek(SeekFrom::Start(100)).unwrap();
    assert_eq!(stream.read_bytes(Some(200)).unwrap(), &data[100..300]);
    stream.write(b"xyz").unwrap();
    stream.seek(SeekFrom::Start(298)).unwrap();
    assert_eq!(stream.read_bytes(Some(7)).unwrap(), [data[298], data[299], b'x', b'y', b'z', data[303], data[304]]);
    stream.close().unwrap();

    assert_eq!(fixture.volume_sizes().len(), 16);
}

#[test]
fn test_io_copy_into_stream() {
    let fixture = Fixture::new();
    let data = pattern(30_000);
    let mut stream = fixture.open(7000, OpenMode::WriteCreate).unwrap();
    let copied = io::copy(&mut io::Cursor::new(&data), &mut stream).unwrap();
    stream.flush().unwrap();
    drop(stream);

    assert_eq!(copied, 30_000);
    assert_eq!(fixture.volume_sizes(), vec![7000, 7000, 7000, 7000, 2000]);
    assert_eq!(fixture.contents(), data);
}

// =============================================================================
// Truncate
// =============================================================================

#[test]
fn test_truncate_shrink_removes_later_volumes() {
    let fixture = Fixture::new();
    create_stream(&fixture, 10, &pattern(25));

    let mut stream = fixture.open(10, OpenMode::ReadWriteExisting).unwrap();
    stream.seek(SeekFrom::Start(20)).unwrap();
    assert_eq!(stream.truncate(Some(12)).unwrap(), 12);
    assert_eq!(stream.tell().unwrap(), 12);
    stream.close().unwrap();

    assert_eq!(fixture.volume_sizes(), vec![10, 2]);
    assert!(!fixture.exists(3));
    assert_eq!(fixture.contents(), &pattern(25)[..12]);
}

#[test]
fn test_truncate_at_boundary_keeps_lower_volume() {
    let fixture = Fixture::new();
    create_stream(&fixture, 10, &pattern(25));

    let mut stream = fixture.open(10, OpenMode::ReadWriteExisting).unwrap();
    stream.truncate(Some(10)).unwrap();
    stream.close().unwrap();

    assert_eq!(fixture.volume_sizes(), vec![10]);
}

#[test]
fn test_truncate_grow_zero_fills_and_keeps_position() {
    let fixture = Fixture::new();
    create_stream(&fixture, 10, &pattern(12));

    let mut stream = fixture.open(10, OpenMode::ReadWriteExisting).unwrap();
    stream.seek(SeekFrom::Start(3)).unwrap();
    stream.truncate(Some(30)).unwrap();
    assert_eq!(stream.tell().unwrap(), 3);
    assert_eq!(stream.size().unwrap(), 30);
    stream.close().unwrap();

    assert_eq!(fixture.volume_sizes(), vec![10, 2, 10, 8]);
    let contents = fixture.contents();
    assert_eq!(&contents[..12], &pattern(12)[..]);
    assert!(contents[12..].iter().all(|&b| b == 0));
}

#[test]
fn test_truncate_defaults_to_position() {
    let fixture = Fixture::new();
    let mut stream = fixture.open(10, OpenMode::WriteCreateUpdate).unwrap();
    stream.write(&pattern(25)).unwrap();
    stream.seek(SeekFrom::Start(15)).unwrap();
    assert_eq!(stream.truncate(None).unwrap(), 15);
    stream.close().unwrap();

    assert_eq!(fixture.volume_sizes(), vec![10, 5]);
}

// =============================================================================
// Empty trailing volumes
// =============================================================================

#[test]
fn test_update_open_trims_stray_empty_volume() {
    let fixture = Fixture::new();
    fixture.write_volumes(&[b"0123456789", b""]);

    let stream = fixture.open(10, OpenMode::ReadWriteExisting).unwrap();
    assert_eq!(stream.volume_count(), 1);
    drop(stream);
    assert!(!fixture.exists(2));
}

#[test]
fn test_read_only_never_deletes() {
    let fixture = Fixture::new();
    fixture.write_volumes(&[b"0123456789", b""]);

    let mut stream = fixture.open(10, OpenMode::ReadOnly).unwrap();
    assert_eq!(stream.read_to_end_of_stream().unwrap(), b"0123456789");
    stream.close().unwrap();
    assert!(fixture.exists(2));
}

#[test]
fn test_first_volume_survives_when_empty() {
    let fixture = Fixture::new();
    let mut stream = fixture.open(10, OpenMode::WriteCreate).unwrap();
    stream.close().unwrap();

    assert_eq!(fixture.volume_sizes(), vec![0]);
}

#[test]
fn test_reopened_empty_stream_fills_first_volume() {
    let fixture = Fixture::new();
    fixture.open(10, OpenMode::WriteCreate).unwrap().close().unwrap();

    let mut stream = fixture.open(10, OpenMode::ReadWriteExisting).unwrap();
    stream.write(&pattern(15)).unwrap();
    stream.close().unwrap();

    assert_eq!(fixture.volume_sizes(), vec![10, 5]);
}

// =============================================================================
// Usage errors and lifecycle
// =============================================================================

#[test]
fn test_open_missing_first_volume() {
    let fixture = Fixture::new();
    for mode in [OpenMode::ReadOnly, OpenMode::ReadWriteExisting] {
        let err = fixture.open(10, mode).unwrap_err();
        assert!(matches!(err, Error::VolumeMissing { volume: 1, .. }), "{mode}: {err}");
    }
    assert!(!fixture.exists(1));
}

#[test]
fn test_mode_strings() {
    let fixture = Fixture::new();
    let mut stream = volsplit::open(&fixture.base, "wb", 10).unwrap();
    assert!(stream.writable().unwrap());
    assert!(!stream.readable().unwrap());
    stream.write(b"data").unwrap();
    stream.close().unwrap();

    let stream = volsplit::open(&fixture.base, "r+b", 10).unwrap();
    assert_eq!(stream.mode(), OpenMode::ReadWriteExisting);

    drop(stream);

    let err = volsplit::open(&fixture.base, "rw", 10).unwrap_err();
    assert!(matches!(err, Error::InvalidMode(_)));
}

#[test]
fn test_wrong_direction_is_rejected() {
    let fixture = Fixture::new();
    create_stream(&fixture, 10, b"data");

    let mut reader = fixture.open(10, OpenMode::ReadOnly).unwrap();
    assert!(matches!(reader.write(b"x"), Err(Error::Unsupported(_))));
    assert!(matches!(reader.truncate(Some(0)), Err(Error::Unsupported(_))));
    assert_eq!(reader.read_bytes(None).unwrap(), b"data");

    let mut writer = fixture.open(10, OpenMode::WriteCreate).unwrap();
    assert!(matches!(writer.read_bytes(Some(1)), Err(Error::Unsupported(_))));
}

#[test]
fn test_bad_seeks_leave_position_unchanged() {
    let fixture = Fixture::new();
    create_stream(&fixture, 10, &pattern(25));

    let mut stream = fixture.open(10, OpenMode::ReadOnly).unwrap();
    stream.seek(SeekFrom::Start(5)).unwrap();
    assert!(matches!(stream.seek(SeekFrom::Current(-6)), Err(Error::NegativeSeek(-1))));
    assert!(matches!(stream.seek_whence(0, 3), Err(Error::InvalidWhence(3))));
    assert_eq!(stream.tell().unwrap(), 5);
    assert_eq!(stream.seek_whence(-5, 2).unwrap(), 20);
}

#[test]
fn test_close_is_idempotent() {
    let fixture = Fixture::new();
    let mut stream = fixture.open(10, OpenMode::WriteCreate).unwrap();
    stream.write(b"abc").unwrap();
    stream.close().unwrap();
    stream.close().unwrap();

    assert!(stream.closed());
    assert!(matches!(stream.tell(), Err(Error::Closed)));
    assert!(matches!(stream.write(b"x"), Err(Error::Closed)));
    assert_eq!(fixture.contents(), b"abc");
}
