//! Optional byte-stream transforms layered over a split stream.
//!
//! Data written through a [`TransformWriter`] is compressed with LZMA2 and
//! then encrypted with AES-256, each layer being optional. A
//! [`TransformReader`] configured with the same options undoes both in
//! reverse order. Transforms are sequential only: they wrap any `Read` or
//! `Write`, and know nothing about volumes.
//!
//! # Example
//!
//! ```rust
//! use std::io::{Read, Write};
//! use volsplit::transform::{TransformOptions, TransformReader, TransformWriter};
//! use volsplit::volume::MemoryStore;
//! use volsplit::{OpenMode, SplitFile, VolumeConfig};
//!
//! let options = TransformOptions::new().compression(6);
//! let store = MemoryStore::new();
//! let config = VolumeConfig::new("mem", 64).mode(OpenMode::WriteCreateUpdate);
//! let mut stream = SplitFile::open_in(store.clone(), &config)?;
//!
//! let mut writer = TransformWriter::new(&mut stream, &options)?;
//! writer.write_all(&[b'a'; 10_000])?;
//! writer.finish()?;
//!
//! stream.seek(std::io::SeekFrom::Start(0))?;
//! let mut restored = Vec::new();
//! TransformReader::new(&mut stream, &options)?.read_to_end(&mut restored)?;
//! assert_eq!(restored.len(), 10_000);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[cfg(feature = "aes")]
mod cipher;
#[cfg(feature = "lzma")]
mod compress;

use std::io::{self, Read, Write};

use crate::Result;

#[cfg(feature = "aes")]
pub use cipher::{Aes256Decoder, Aes256Encoder, CipherKey, IV_LEN};
#[cfg(feature = "lzma")]
pub use compress::MAX_PRESET;

/// Which transforms to apply.
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    /// LZMA2 preset (0-9), or `None` to store data uncompressed.
    #[cfg(feature = "lzma")]
    pub compression: Option<u32>,
    /// Encryption key, or `None` to store data in the clear.
    #[cfg(feature = "aes")]
    pub key: Option<CipherKey>,
}

impl TransformOptions {
    /// Creates options that apply no transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables LZMA2 compression with the given preset.
    #[cfg(feature = "lzma")]
    pub fn compression(mut self, preset: u32) -> Self {
        self.compression = Some(preset);
        self
    }

    /// Enables AES-256 encryption with the given key.
    #[cfg(feature = "aes")]
    pub fn key(mut self, key: CipherKey) -> Self {
        self.key = Some(key);
        self
    }

    /// Returns true if neither compression nor encryption is enabled.
    pub fn is_identity(&self) -> bool {
        let mut identity = true;
        #[cfg(feature = "lzma")]
        {
            identity &= self.compression.is_none();
        }
        #[cfg(feature = "aes")]
        {
            identity &= self.key.is_none();
        }
        identity
    }
}

enum CipherSink<'a, W: Write> {
    Plain(&'a mut W),
    #[cfg(feature = "aes")]
    Encrypted(Aes256Encoder<&'a mut W>),
}

impl<'a, W: Write> CipherSink<'a, W> {
    #[cfg_attr(not(feature = "aes"), allow(unused_variables))]
    fn new(sink: &'a mut W, options: &TransformOptions) -> Result<Self> {
        #[cfg(feature = "aes")]
        if let Some(key) = &options.key {
            return Ok(Self::Encrypted(Aes256Encoder::new(sink, key)?));
        }
        Ok(Self::Plain(sink))
    }

    fn finish(self) -> io::Result<()> {
        match self {
            Self::Plain(w) => w.flush(),
            #[cfg(feature = "aes")]
            Self::Encrypted(e) => e.finish().map(|_| ()),
        }
    }
}

impl<W: Write> Write for CipherSink<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(w) => w.write(buf),
            #[cfg(feature = "aes")]
            Self::Encrypted(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(w) => w.flush(),
            #[cfg(feature = "aes")]
            Self::Encrypted(e) => e.flush(),
        }
    }
}

enum WriteStage<'a, W: Write> {
    Direct(CipherSink<'a, W>),
    #[cfg(feature = "lzma")]
    Compressed(lzma_rust2::Lzma2Writer<CipherSink<'a, W>>),
}

/// Compresses and encrypts everything written to it.
///
/// [`finish`](Self::finish) must be called to write the final compressed
/// chunk and cipher block; dropping the writer without it leaves a truncated
/// stream.
pub struct TransformWriter<'a, W: Write> {
    stage: WriteStage<'a, W>,
    consumed: u64,
}

impl<W: Write> std::fmt::Debug for TransformWriter<'_, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformWriter")
            .field("consumed", &self.consumed)
            .finish_non_exhaustive()
    }
}

impl<'a, W: Write> TransformWriter<'a, W> {
    /// Wraps `sink`, writing any transform headers immediately.
    pub fn new(sink: &'a mut W, options: &TransformOptions) -> Result<Self> {
        #[allow(unused_mut)]
        let mut cipher = CipherSink::new(sink, options)?;

        #[cfg(feature = "lzma")]
        if let Some(preset) = options.compression {
            let lzma2 = compress::lzma2_options(preset);
            cipher.write_all(&[compress::property_byte(&lzma2)])?;
            log::debug!("compressing with LZMA2 preset {}", preset.min(MAX_PRESET));
            return Ok(Self {
                stage: WriteStage::Compressed(lzma_rust2::Lzma2Writer::new(cipher, lzma2)),
                consumed: 0,
            });
        }

        Ok(Self {
            stage: WriteStage::Direct(cipher),
            consumed: 0,
        })
    }

    /// Flushes every layer and returns the number of bytes consumed.
    pub fn finish(self) -> Result<u64> {
        match self.stage {
            WriteStage::Direct(cipher) => cipher.finish()?,
            #[cfg(feature = "lzma")]
            WriteStage::Compressed(writer) => {
                let cipher = writer
                    .finish()
                    .map_err(|e| io::Error::other(e.to_string()))?;
                cipher.finish()?;
            }
        }
        Ok(self.consumed)
    }
}

impl<W: Write> Write for TransformWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = match &mut self.stage {
            WriteStage::Direct(cipher) => cipher.write(buf)?,
            #[cfg(feature = "lzma")]
            WriteStage::Compressed(writer) => writer.write(buf)?,
        };
        self.consumed += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.stage {
            WriteStage::Direct(cipher) => cipher.flush(),
            #[cfg(feature = "lzma")]
            WriteStage::Compressed(writer) => writer.flush(),
        }
    }
}

enum CipherSource<'a, R: Read> {
    Plain(&'a mut R),
    #[cfg(feature = "aes")]
    Decrypted(Aes256Decoder<&'a mut R>),
}

impl<'a, R: Read> CipherSource<'a, R> {
    #[cfg_attr(not(feature = "aes"), allow(unused_variables))]
    fn new(source: &'a mut R, options: &TransformOptions) -> Result<Self> {
        #[cfg(feature = "aes")]
        if let Some(key) = &options.key {
            return Ok(Self::Decrypted(Aes256Decoder::new(source, key)?));
        }
        Ok(Self::Plain(source))
    }
}

impl<R: Read> Read for CipherSource<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Plain(r) => r.read(buf),
            #[cfg(feature = "aes")]
            Self::Decrypted(d) => d.read(buf),
        }
    }
}

enum ReadStage<'a, R: Read> {
    Direct(CipherSource<'a, R>),
    #[cfg(feature = "lzma")]
    Compressed(lzma_rust2::Lzma2Reader<CipherSource<'a, R>>),
}

/// Decrypts and decompresses a stream written by [`TransformWriter`].
pub struct TransformReader<'a, R: Read> {
    stage: ReadStage<'a, R>,
}

impl<R: Read> std::fmt::Debug for TransformReader<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformReader").finish_non_exhaustive()
    }
}

impl<'a, R: Read> TransformReader<'a, R> {
    /// Wraps `source`, reading any transform headers immediately.
    pub fn new(source: &'a mut R, options: &TransformOptions) -> Result<Self> {
        #[allow(unused_mut)]
        let mut cipher = CipherSource::new(source, options)?;

        #[cfg(feature = "lzma")]
        if options.compression.is_some() {
            let mut prop = [0u8; 1];
            cipher.read_exact(&mut prop).map_err(|e| {
                if e.kind() == io::ErrorKind::UnexpectedEof {
                    crate::Error::InvalidFormat("compressed stream is missing its header".into())
                } else {
                    crate::Error::Io(e)
                }
            })?;
            let dict_size = compress::decode_lzma2_dict_size(prop[0])?;
            return Ok(Self {
                stage: ReadStage::Compressed(lzma_rust2::Lzma2Reader::new(cipher, dict_size, None)),
            });
        }

        Ok(Self {
            stage: ReadStage::Direct(cipher),
        })
    }
}

impl<R: Read> Read for TransformReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.stage {
            ReadStage::Direct(source) => source.read(buf),
            #[cfg(feature = "lzma")]
            ReadStage::Compressed(reader) => reader.read(buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(data: &[u8], options: &TransformOptions) -> (Vec<u8>, Vec<u8>) {
        let mut encoded = Vec::new();
        let mut writer = TransformWriter::new(&mut encoded, options).unwrap();
        writer.write_all(data).unwrap();
        assert_eq!(writer.finish().unwrap(), data.len() as u64);

        let mut source = encoded.as_slice();
        let mut decoded = Vec::new();
        TransformReader::new(&mut source, options)
            .unwrap()
            .read_to_end(&mut decoded)
            .unwrap();
        (encoded, decoded)
    }

    fn sample() -> Vec<u8> {
        b"the quick brown fox jumps over the lazy dog\n".repeat(500)
    }

    #[test]
    fn test_identity() {
        let options = TransformOptions::new();
        assert!(options.is_identity());
        let (encoded, decoded) = round_trip(&sample(), &options);
        assert_eq!(encoded, sample());
        assert_eq!(decoded, sample());
    }

    #[cfg(feature = "lzma")]
    #[test]
    fn test_compression_shrinks_repetitive_data() {
        let options = TransformOptions::new().compression(6);
        assert!(!options.is_identity());
        let (encoded, decoded) = round_trip(&sample(), &options);
        assert!(encoded.len() < sample().len() / 10);
        assert_eq!(decoded, sample());
    }

    #[cfg(feature = "aes")]
    #[test]
    fn test_encryption_only() {
        let options = TransformOptions::new().key(CipherKey::from_passphrase("pw"));
        let (encoded, decoded) = round_trip(&sample(), &options);
        assert_eq!(encoded.len(), IV_LEN + (sample().len() / 16 + 1) * 16);
        assert_eq!(decoded, sample());
    }

    #[cfg(all(feature = "lzma", feature = "aes"))]
    #[test]
    fn test_compress_then_encrypt() {
        let options = TransformOptions::new()
            .compression(3)
            .key(CipherKey::from_passphrase("pw"));
        let (encoded, decoded) = round_trip(&sample(), &options);
        assert!(encoded.len() < sample().len() / 4);
        assert_eq!(decoded, sample());
    }

    #[cfg(feature = "lzma")]
    #[test]
    fn test_empty_input() {
        let options = TransformOptions::new().compression(1);
        let (_, decoded) = round_trip(b"", &options);
        assert!(decoded.is_empty());
    }

    #[cfg(feature = "lzma")]
    #[test]
    fn test_missing_header() {
        let options = TransformOptions::new().compression(1);
        let mut source: &[u8] = &[];
        let err = TransformReader::new(&mut source, &options).unwrap_err();
        assert!(matches!(err, crate::Error::InvalidFormat(_)));
    }
}
