//! Command implementations for the CLI tool.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use volsplit::transform::{CipherKey, TransformOptions, TransformReader, TransformWriter};
use volsplit::{OpenMode, SplitFile, VolumeConfig};

use crate::exit_codes::{ExitCode, error_to_exit_code, io_error_to_exit_code};
use crate::output::{VolumeRow, format_volume_table, humanize_bytes};
use crate::password::resolve_key;

/// Configuration for the split command.
pub struct SplitConfig<'a> {
    pub input: &'a Path,
    pub base: &'a Path,
    pub volume_size: u64,
    pub compress: Option<u32>,
    pub passphrase: Option<String>,
    pub encrypt: bool,
    pub quiet: bool,
}

/// Configuration for the join command.
pub struct JoinConfig<'a> {
    pub base: &'a Path,
    pub output: &'a Path,
    pub compressed: bool,
    pub passphrase: Option<String>,
    pub decrypt: bool,
    pub quiet: bool,
}

/// Configuration for commands that update an existing stream in place.
pub struct UpdateConfig<'a> {
    pub base: &'a Path,
    pub volume_size: u64,
    pub append_to_partial: bool,
    pub quiet: bool,
}

/// Parses a byte count with an optional `K`, `M` or `G` suffix (powers of 1024).
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let (digits, multiplier) = match s.char_indices().last() {
        Some((i, c)) if c.is_ascii_alphabetic() => {
            let multiplier = match c.to_ascii_uppercase() {
                'K' => 1u64 << 10,
                'M' => 1 << 20,
                'G' => 1 << 30,
                _ => return Err(format!("unknown size suffix '{}'", c)),
            };
            (&s[..i], multiplier)
        }
        _ => (s, 1),
    };
    let value: u64 = digits
        .trim()
        .parse()
        .map_err(|e| format!("invalid size '{}': {}", s, e))?;
    value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("size '{}' is too large", s))
}

fn transform_options(compress: Option<u32>, key: Option<CipherKey>) -> TransformOptions {
    let mut options = TransformOptions::new();
    options.compression = compress;
    options.key = key;
    options
}

fn report(context: &str, error: &volsplit::Error) -> ExitCode {
    eprintln!("Error {}: {}", context, error);
    error_to_exit_code(error)
}

fn open_file(path: &Path) -> Result<File, ExitCode> {
    File::open(path).map_err(|e| {
        eprintln!("Error opening {}: {}", path.display(), e);
        ExitCode::IoError
    })
}

fn copy_into_stream(
    input: &mut impl Read,
    stream: &mut SplitFile,
    options: &TransformOptions,
) -> volsplit::Result<u64> {
    let mut writer = TransformWriter::new(stream, options)?;
    io::copy(input, &mut writer)?;
    writer.finish()
}

/// Split command implementation
pub fn split(config: &SplitConfig<'_>) -> ExitCode {
    let key = match resolve_key(config.passphrase.clone(), config.encrypt, true) {
        Ok(k) => k,
        Err(code) => return code,
    };
    let options = transform_options(config.compress, key);

    let mut input = match open_file(config.input) {
        Ok(f) => BufReader::new(f),
        Err(code) => return code,
    };

    let volume_config =
        VolumeConfig::new(config.base, config.volume_size).mode(OpenMode::WriteCreate);
    let mut stream = match SplitFile::open(volume_config) {
        Ok(s) => s,
        Err(e) => return report("creating volumes", &e),
    };

    let consumed = match copy_into_stream(&mut input, &mut stream, &options) {
        Ok(n) => n,
        Err(e) => return report("writing volumes", &e),
    };
    let stored = stream.size().unwrap_or_default();
    if let Err(e) = stream.close() {
        return report("closing volumes", &e);
    }

    if !config.quiet {
        println!(
            "{} -> {} volume(s): {} read, {} stored",
            config.input.display(),
            stream.volume_count(),
            humanize_bytes(consumed),
            humanize_bytes(stored)
        );
    }
    ExitCode::Success
}

/// Join command implementation
pub fn join(config: &JoinConfig<'_>) -> ExitCode {
    let key = match resolve_key(config.passphrase.clone(), config.decrypt, false) {
        Ok(k) => k,
        Err(code) => return code,
    };
    let encrypted = key.is_some();
    let options = transform_options(config.compressed.then_some(0), key);

    let mut stream = match SplitFile::open(VolumeConfig::new(config.base, 0)) {
        Ok(s) => s,
        Err(e) => return report("opening volumes", &e),
    };
    let mut reader = match TransformReader::new(&mut stream, &options) {
        Ok(r) => r,
        Err(e) => return report("reading stream header", &e),
    };

    let mut output = match File::create(config.output) {
        Ok(f) => BufWriter::new(f),
        Err(e) => {
            eprintln!("Error creating {}: {}", config.output.display(), e);
            return ExitCode::IoError;
        }
    };

    let copied = io::copy(&mut reader, &mut output).and_then(|n| output.flush().map(|_| n));
    drop(reader);
    let copied = match copied {
        Ok(n) => n,
        Err(e) => {
            eprintln!("Error joining volumes: {}", e);
            return match io_error_to_exit_code(&e) {
                ExitCode::BadData if encrypted => ExitCode::WrongPassphrase,
                code => code,
            };
        }
    };

    if !config.quiet {
        println!(
            "{} volume(s) -> {}: {}",
            stream.volume_count(),
            config.output.display(),
            humanize_bytes(copied)
        );
    }
    ExitCode::Success
}

/// Info command implementation
pub fn info(base: &Path) -> ExitCode {
    let stream = match SplitFile::open(VolumeConfig::new(base, 0)) {
        Ok(s) => s,
        Err(e) => return report("opening volumes", &e),
    };

    let table = stream.table();
    let paths: Vec<_> = (1..=table.volume_count())
        .map(|n| stream.store().volume_path(n))
        .collect();
    let rows: Vec<VolumeRow<'_>> = paths
        .iter()
        .zip(1u32..)
        .map(|(path, number)| VolumeRow {
            number,
            path,
            offset: table.start_of(number),
            size: table.size_of(number),
        })
        .collect();

    print!("{}", format_volume_table(&rows, table.total_size()));
    ExitCode::Success
}

fn open_for_update(config: &UpdateConfig<'_>, append: bool) -> Result<SplitFile, ExitCode> {
    let volume_config = VolumeConfig::new(config.base, config.volume_size)
        .mode(OpenMode::ReadWriteExisting)
        .append(append)
        .append_to_partial(config.append_to_partial);
    SplitFile::open(volume_config).map_err(|e| report("opening volumes", &e))
}

/// Truncate command implementation
pub fn truncate(config: &UpdateConfig<'_>, length: u64) -> ExitCode {
    let mut stream = match open_for_update(config, false) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let before = stream.size().unwrap_or_default();
    if let Err(e) = stream.truncate(Some(length)).and_then(|_| stream.close()) {
        return report("truncating", &e);
    }

    if !config.quiet {
        println!(
            "{}: {} -> {} in {} volume(s)",
            config.base.display(),
            humanize_bytes(before),
            humanize_bytes(length),
            stream.volume_count()
        );
    }
    ExitCode::Success
}

/// Append command implementation
///
/// Creates the stream if it does not exist yet.
pub fn append(config: &UpdateConfig<'_>, input: &Path) -> ExitCode {
    let mut source = match open_file(input) {
        Ok(f) => BufReader::new(f),
        Err(code) => return code,
    };
    let mut stream = match open_for_update(config, true) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let appended = io::copy(&mut source, &mut stream)
        .map_err(volsplit::Error::from)
        .and_then(|n| stream.close().map(|_| n));
    let appended = match appended {
        Ok(n) => n,
        Err(e) => return report("appending", &e),
    };

    if !config.quiet {
        println!(
            "{} -> {}: {} appended, {} volume(s)",
            input.display(),
            config.base.display(),
            humanize_bytes(appended),
            stream.volume_count()
        );
    }
    ExitCode::Success
}
