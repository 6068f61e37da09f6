//! Chunked authenticated stream encryption.
//!
//! The stream is a sequence of packages in the DARE 2.0 layout, so data
//! written by earlier deployments keeps decrypting:
//!
//! ```text
//! +---------+-------+-------------+------------+-----------------+-----------+
//! | 0x20    | suite | len-1 (u16) | nonce (12) | payload (len)   | tag (16)  |
//! +---------+-------+-------------+------------+-----------------+-----------+
//! ```
//!
//! The first four header bytes are authenticated as associated data. Every
//! package of one stream shares the same random nonce; the AEAD nonce is that
//! value with its last four bytes XORed with the package sequence number. The
//! last package sets the high bit of the first nonce byte, so truncating or
//! extending a stream fails authentication.

use crate::error::{CryptoError, CryptoResult};
use crate::frame::read_full;
use crate::key::KEY_SIZE;
use aes_gcm::Aes256Gcm;
use chacha20poly1305::ChaCha20Poly1305;
use chacha20poly1305::aead::{Aead, KeyInit};
use rand::RngCore;
use std::io::{self, Read, Write};
use zeroize::Zeroizing;

/// Package format version.
pub const VERSION: u8 = 0x20;

/// Size of a package header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Size of the authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Maximum plaintext carried by one package.
pub const MAX_PAYLOAD_SIZE: usize = 1 << 16;

/// Size of a full package on the wire.
pub const MAX_PACKAGE_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE + TAG_SIZE;

const NONCE_SIZE: usize = 12;
const FINAL_FLAG: u8 = 0x80;
const MAX_PACKAGES: u64 = 1 << 32;

/// AEAD used for the packages of a stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum CipherSuite {
    /// Accepted when decrypting; never produced.
    Aes256Gcm = 0x00,
    /// Used for all new streams.
    ChaCha20Poly1305 = 0x01,
}

impl TryFrom<u8> for CipherSuite {
    type Error = CryptoError;

    fn try_from(byte: u8) -> CryptoResult<Self> {
        match byte {
            0x00 => Ok(CipherSuite::Aes256Gcm),
            0x01 => Ok(CipherSuite::ChaCha20Poly1305),
            other => Err(CryptoError::Decryption(format!(
                "unsupported cipher suite {other:#04x}"
            ))),
        }
    }
}

enum PackageCipher {
    Aes(Box<Aes256Gcm>),
    ChaCha(ChaCha20Poly1305),
}

impl PackageCipher {
    fn new(suite: CipherSuite, key: &[u8; KEY_SIZE]) -> Self {
        match suite {
            CipherSuite::Aes256Gcm => Self::Aes(Box::new(Aes256Gcm::new(key.into()))),
            CipherSuite::ChaCha20Poly1305 => Self::ChaCha(ChaCha20Poly1305::new(key.into())),
        }
    }

    fn suite(&self) -> CipherSuite {
        match self {
            Self::Aes(_) => CipherSuite::Aes256Gcm,
            Self::ChaCha(_) => CipherSuite::ChaCha20Poly1305,
        }
    }

    fn open(&self, nonce: &[u8; NONCE_SIZE], aad: &[u8], sealed: &[u8]) -> CryptoResult<Vec<u8>> {
        let opened = match self {
            Self::Aes(cipher) => cipher.decrypt(
                aes_gcm::Nonce::from_slice(nonce),
                aes_gcm::aead::Payload { msg: sealed, aad },
            ),
            Self::ChaCha(cipher) => cipher.decrypt(
                chacha20poly1305::Nonce::from_slice(nonce),
                chacha20poly1305::aead::Payload { msg: sealed, aad },
            ),
        };
        opened.map_err(|_| {
            CryptoError::Decryption("authentication failed (wrong key or tampered data)".to_string())
        })
    }
}

/// Returns the exact ciphertext size for `size` bytes of plaintext.
pub fn encrypted_size(size: u64) -> CryptoResult<u64> {
    let payload = MAX_PAYLOAD_SIZE as u64;
    let full = size / payload;
    let rest = size % payload;

    if full + u64::from(rest > 0) > MAX_PACKAGES {
        return Err(CryptoError::PayloadTooLarge(size));
    }

    let mut total = full * MAX_PACKAGE_SIZE as u64;
    if rest > 0 {
        total += rest + (HEADER_SIZE + TAG_SIZE) as u64;
    }
    Ok(total)
}

fn package_nonce(header_nonce: &[u8], seq: u64) -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(header_nonce);
    let counter = u32::from_le_bytes([nonce[8], nonce[9], nonce[10], nonce[11]]) ^ seq as u32;
    nonce[8..].copy_from_slice(&counter.to_le_bytes());
    nonce
}

/// Encrypting writer.
///
/// Plaintext is buffered until a full package is available and more data
/// follows; the remainder is sealed as the final package by [`close`].
/// Nothing is written for a stream that never received data.
///
/// [`close`]: EncryptWriter::close
pub struct EncryptWriter<W: Write> {
    inner: W,
    cipher: ChaCha20Poly1305,
    nonce: [u8; NONCE_SIZE],
    seq: u64,
    buffer: Zeroizing<Vec<u8>>,
    closed: bool,
}

impl<W: Write> EncryptWriter<W> {
    /// Starts a new stream over `inner` with a fresh random nonce.
    pub fn new(inner: W, key: &[u8; KEY_SIZE]) -> Self {
        let mut nonce = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut nonce);

        Self {
            inner,
            cipher: ChaCha20Poly1305::new(key.into()),
            nonce,
            seq: 0,
            buffer: Zeroizing::new(Vec::new()),
            closed: false,
        }
    }

    /// Seals the buffered remainder as the final package.
    ///
    /// Only the first call has an effect.
    pub fn close(&mut self) -> CryptoResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if !self.buffer.is_empty() {
            self.seal_package(true)?;
        }
        self.inner.flush()?;
        Ok(())
    }

    /// Returns the underlying sink. Call [`close`](Self::close) first.
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn seal_package(&mut self, last: bool) -> CryptoResult<()> {
        if self.seq >= MAX_PACKAGES {
            return Err(CryptoError::PayloadTooLarge(self.seq * MAX_PAYLOAD_SIZE as u64));
        }

        let len = self.buffer.len();
        let mut header = [0u8; HEADER_SIZE];
        header[0] = VERSION;
        header[1] = CipherSuite::ChaCha20Poly1305 as u8;
        header[2..4].copy_from_slice(&((len - 1) as u16).to_le_bytes());
        header[4..].copy_from_slice(&self.nonce);
        if last {
            header[4] |= FINAL_FLAG;
        } else {
            header[4] &= !FINAL_FLAG;
        }

        let nonce = package_nonce(&header[4..], self.seq);
        let sealed = self
            .cipher
            .encrypt(
                chacha20poly1305::Nonce::from_slice(&nonce),
                chacha20poly1305::aead::Payload {
                    msg: self.buffer.as_slice(),
                    aad: &header[..4],
                },
            )
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;

        self.inner.write_all(&header)?;
        self.inner.write_all(&sealed)?;
        self.seq += 1;
        self.buffer.clear();
        Ok(())
    }
}

impl<W: Write> Write for EncryptWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(CryptoError::Encryption("write after close".to_string()).into_io());
        }

        let mut rest = buf;
        while !rest.is_empty() {
            if self.buffer.len() == MAX_PAYLOAD_SIZE {
                self.seal_package(false).map_err(CryptoError::into_io)?;
            }
            let take = (MAX_PAYLOAD_SIZE - self.buffer.len()).min(rest.len());
            self.buffer.extend_from_slice(&rest[..take]);
            rest = &rest[take..];
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Decrypting reader.
///
/// Fails if the stream is empty, truncated before its final package,
/// extended after it, or if any package fails authentication.
pub struct DecryptReader<R: Read> {
    inner: R,
    key: Zeroizing<[u8; KEY_SIZE]>,
    cipher: Option<PackageCipher>,
    stream_nonce: Option<[u8; NONCE_SIZE]>,
    seq: u64,
    package: Vec<u8>,
    plaintext: Zeroizing<Vec<u8>>,
    pos: usize,
    finalized: bool,
}

impl<R: Read> DecryptReader<R> {
    pub fn new(inner: R, key: &[u8; KEY_SIZE]) -> Self {
        Self {
            inner,
            key: Zeroizing::new(*key),
            cipher: None,
            stream_nonce: None,
            seq: 0,
            package: Vec::new(),
            plaintext: Zeroizing::new(Vec::new()),
            pos: 0,
            finalized: false,
        }
    }

    fn open_package(&mut self) -> CryptoResult<()> {
        let mut header = [0u8; HEADER_SIZE];
        match read_full(&mut self.inner, &mut header)? {
            0 if self.seq == 0 => {
                return Err(CryptoError::MalformedFrame("empty ciphertext".to_string()));
            }
            0 => {
                return Err(CryptoError::MalformedFrame(
                    "stream ended before the final package".to_string(),
                ));
            }
            HEADER_SIZE => {}
            n => {
                return Err(CryptoError::MalformedFrame(format!(
                    "package header truncated after {n} bytes"
                )));
            }
        }

        if header[0] != VERSION {
            return Err(CryptoError::UnsupportedVersion(header[0]));
        }

        let suite = CipherSuite::try_from(header[1])?;
        let key = &self.key;
        let cipher = self
            .cipher
            .get_or_insert_with(|| PackageCipher::new(suite, key));
        if cipher.suite() != suite {
            return Err(CryptoError::Decryption(
                "cipher suite changed within stream".to_string(),
            ));
        }

        let len = usize::from(u16::from_le_bytes([header[2], header[3]])) + 1;
        let last = header[4] & FINAL_FLAG != 0;
        if !last && len != MAX_PAYLOAD_SIZE {
            return Err(CryptoError::Decryption(format!(
                "non-final package carries {len} bytes"
            )));
        }

        let mut stream_nonce = [0u8; NONCE_SIZE];
        stream_nonce.copy_from_slice(&header[4..]);
        stream_nonce[0] &= !FINAL_FLAG;
        match self.stream_nonce {
            Some(expected) if expected != stream_nonce => {
                return Err(CryptoError::Decryption("package nonce mismatch".to_string()));
            }
            Some(_) => {}
            None => self.stream_nonce = Some(stream_nonce),
        }

        if self.seq >= MAX_PACKAGES {
            return Err(CryptoError::Decryption("too many packages".to_string()));
        }

        self.package.resize(len + TAG_SIZE, 0);
        let n = read_full(&mut self.inner, &mut self.package)?;
        if n != self.package.len() {
            return Err(CryptoError::MalformedFrame(format!(
                "package truncated after {n} of {} bytes",
                self.package.len()
            )));
        }

        let nonce = package_nonce(&header[4..], self.seq);
        let plaintext = cipher.open(&nonce, &header[..4], &self.package)?;

        self.plaintext = Zeroizing::new(plaintext);
        self.pos = 0;
        self.seq += 1;
        self.finalized = last;
        Ok(())
    }

    fn ensure_drained(&mut self) -> CryptoResult<()> {
        let mut extra = [0u8; 1];
        if read_full(&mut self.inner, &mut extra)? != 0 {
            return Err(CryptoError::Decryption(
                "unexpected data after final package".to_string(),
            ));
        }
        Ok(())
    }
}

impl<R: Read> Read for DecryptReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while self.pos == self.plaintext.len() {
            if self.finalized {
                self.ensure_drained().map_err(CryptoError::into_io)?;
                return Ok(0);
            }
            self.open_package().map_err(CryptoError::into_io)?;
        }

        let n = (self.plaintext.len() - self.pos).min(buf.len());
        buf[..n].copy_from_slice(&self.plaintext[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
