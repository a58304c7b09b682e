//! AES-256-CBC encryption layer.
//!
//! An encrypted stream starts with a random 16-byte IV, followed by the
//! AES-256-CBC ciphertext of the payload with PKCS7 padding.

use aes::Aes256;
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use sha2::{Digest, Sha256};
use std::io::{self, Read, Write};
use zeroize::Zeroizing;

use crate::{Error, Result};

type Aes256CbcDec = cbc::Decryptor<Aes256>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;

/// AES block size in bytes.
const BLOCK_SIZE: usize = 16;

/// Length of the IV header at the start of an encrypted stream.
pub const IV_LEN: usize = 16;

/// Amount of plaintext buffered before whole blocks are encrypted.
const CHUNK_SIZE: usize = 4096;

/// A 256-bit AES key, wiped from memory on drop.
#[derive(Clone)]
pub struct CipherKey {
    key: Zeroizing<[u8; 32]>,
}

impl CipherKey {
    /// Wraps raw key bytes.
    pub fn new(key: [u8; 32]) -> Self {
        Self {
            key: Zeroizing::new(key),
        }
    }

    /// Derives a key as the SHA-256 digest of `passphrase`.
    pub fn from_passphrase(passphrase: &str) -> Self {
        Self::new(Sha256::digest(passphrase.as_bytes()).into())
    }

    fn as_slice(&self) -> &[u8] {
        &self.key[..]
    }
}

impl std::fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CipherKey([REDACTED])")
    }
}

fn cipher_error(e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e.to_string())
}

/// Generates a random IV from the operating system's CSPRNG.
fn random_iv() -> Result<[u8; IV_LEN]> {
    let mut iv = [0u8; IV_LEN];
    getrandom::getrandom(&mut iv)
        .map_err(|e| Error::CryptoError(format!("failed to generate IV: {}", e)))?;
    Ok(iv)
}

/// AES-256 encoder for writing encrypted streams.
pub struct Aes256Encoder<W: Write> {
    inner: W,
    buffer: Vec<u8>,
    key: CipherKey,
    iv: [u8; IV_LEN],
}

impl<W: Write> std::fmt::Debug for Aes256Encoder<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aes256Encoder").finish_non_exhaustive()
    }
}

impl<W: Write> Aes256Encoder<W> {
    /// Creates an encoder with a fresh random IV and writes the IV header.
    pub fn new(output: W, key: &CipherKey) -> Result<Self> {
        let iv = random_iv()?;
        Ok(Self::with_iv(output, key, iv)?)
    }

    /// Creates an encoder with an explicit IV and writes the IV header.
    pub fn with_iv(mut output: W, key: &CipherKey, iv: [u8; IV_LEN]) -> io::Result<Self> {
        output.write_all(&iv)?;
        Ok(Self {
            inner: output,
            buffer: Vec::with_capacity(CHUNK_SIZE + BLOCK_SIZE),
            key: key.clone(),
            iv,
        })
    }

    /// Encrypts and writes the first `len` buffered bytes; `len` is block-aligned.
    fn encrypt_prefix(&mut self, len: usize) -> io::Result<()> {
        if len == 0 {
            return Ok(());
        }
        let mut block: Vec<u8> = self.buffer.drain(..len).collect();
        let encryptor =
            Aes256CbcEnc::new_from_slices(self.key.as_slice(), &self.iv).map_err(cipher_error)?;
        let encrypted = encryptor
            .encrypt_padded_mut::<NoPadding>(&mut block, len)
            .map_err(cipher_error)?;
        self.inner.write_all(encrypted)?;

        // CBC chains on the last ciphertext block.
        self.iv.copy_from_slice(&encrypted[len - BLOCK_SIZE..]);
        Ok(())
    }

    /// Finishes encoding, applying PKCS7 padding and encrypting the final block.
    pub fn finish(mut self) -> io::Result<W> {
        let complete = (self.buffer.len() / BLOCK_SIZE) * BLOCK_SIZE;
        self.encrypt_prefix(complete)?;

        let pad_len = BLOCK_SIZE - self.buffer.len();
        self.buffer.extend(std::iter::repeat_n(pad_len as u8, pad_len));
        self.encrypt_prefix(BLOCK_SIZE)?;

        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for Aes256Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        if self.buffer.len() >= CHUNK_SIZE {
            let complete = (self.buffer.len() / BLOCK_SIZE) * BLOCK_SIZE;
            self.encrypt_prefix(complete)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// AES-256 decoder for reading encrypted streams.
///
/// The final ciphertext block is held back until the source is exhausted so
/// its padding can be stripped.
pub struct Aes256Decoder<R: Read> {
    inner: R,
    key: CipherKey,
    iv: [u8; IV_LEN],
    pending: Vec<u8>,
    plain: Vec<u8>,
    pos: usize,
    finished: bool,
}

impl<R: Read> std::fmt::Debug for Aes256Decoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aes256Decoder").finish_non_exhaustive()
    }
}

impl<R: Read> Aes256Decoder<R> {
    /// Reads the IV header and creates a decoder.
    pub fn new(mut input: R, key: &CipherKey) -> Result<Self> {
        let mut iv = [0u8; IV_LEN];
        input.read_exact(&mut iv).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                Error::InvalidFormat("encrypted stream is shorter than its IV header".into())
            } else {
                Error::Io(e)
            }
        })?;
        Ok(Self {
            inner: input,
            key: key.clone(),
            iv,
            pending: Vec::new(),
            plain: Vec::new(),
            pos: 0,
            finished: false,
        })
    }

    fn decrypt(&mut self, data: &mut [u8]) -> io::Result<()> {
        let mut next_iv = [0u8; IV_LEN];
        next_iv.copy_from_slice(&data[data.len() - BLOCK_SIZE..]);
        let decryptor =
            Aes256CbcDec::new_from_slices(self.key.as_slice(), &self.iv).map_err(cipher_error)?;
        decryptor
            .decrypt_padded_mut::<NoPadding>(data)
            .map_err(cipher_error)?;
        self.iv = next_iv;
        Ok(())
    }

    fn refill(&mut self) -> io::Result<()> {
        let mut chunk = vec![0u8; CHUNK_SIZE];
        while self.plain.is_empty() && !self.finished {
            let n = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            if n == 0 {
                self.finished = true;
                if self.pending.is_empty() || self.pending.len() % BLOCK_SIZE != 0 {
                    return Err(cipher_error("encrypted stream is truncated"));
                }
                let mut last = std::mem::take(&mut self.pending);
                self.decrypt(&mut last)?;
                let pad = last[last.len() - 1] as usize;
                if pad == 0
                    || pad > BLOCK_SIZE
                    || !last[last.len() - pad..].iter().all(|&b| b as usize == pad)
                {
                    return Err(cipher_error("invalid padding (wrong key?)"));
                }
                last.truncate(last.len() - pad);
                self.plain = last;
                return Ok(());
            }

            self.pending.extend_from_slice(&chunk[..n]);
            // Keep at least one byte pending so the final block is decrypted
            // together with its padding check.
            let ready = ((self.pending.len() - 1) / BLOCK_SIZE) * BLOCK_SIZE;
            if ready > 0 {
                let mut block: Vec<u8> = self.pending.drain(..ready).collect();
                self.decrypt(&mut block)?;
                self.plain = block;
            }
        }
        Ok(())
    }
}

impl<R: Read> Read for Aes256Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.plain.len() {
            self.plain.clear();
            self.pos = 0;
            self.refill()?;
        }

        let available = &self.plain[self.pos..];
        let to_copy = available.len().min(buf.len());
        buf[..to_copy].copy_from_slice(&available[..to_copy]);
        self.pos += to_copy;
        Ok(to_copy)
    }
}
