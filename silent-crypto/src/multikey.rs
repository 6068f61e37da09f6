//! Multi-key crypter.
//!
//! Wraps the stream engine in a small envelope that names the key used, so
//! keys can be rotated without re-encrypting stored data:
//!
//! 1. New data is always encrypted with the most recently added key.
//! 2. Decryption picks the key by the id embedded in the envelope.
//!
//! In bypass mode the envelope carries the plaintext verbatim behind a `'#'`
//! tag. Bypass output stays decryptable by a normal crypter and vice versa.

use crate::crypter::Crypter;
use crate::error::{CryptoError, CryptoResult};
use crate::frame::{self, FrameTag};
use crate::key::{Key, KeyRing};
use crate::stream::{self, DecryptReader, EncryptWriter};
use std::io::{self, Chain, Cursor, Read, Write};
use tracing::debug;

/// How a [`MultiKeyCrypter`] produces envelopes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Encrypt with the current key.
    #[default]
    Encrypt,
    /// Keep values human-readable, prefixed with `'#'`.
    Bypass,
}

/// A [`Crypter`] supporting multiple keys and seamless key rotation.
#[derive(Clone, Debug, Default)]
pub struct MultiKeyCrypter {
    keys: KeyRing,
    mode: Mode,
}

impl MultiKeyCrypter {
    /// Creates a crypter that encrypts with the ring's current key.
    pub fn new(keys: KeyRing) -> Self {
        Self::with_mode(keys, Mode::Encrypt)
    }

    /// Creates a bypass crypter. The ring is still used for decryption.
    pub fn bypass(keys: KeyRing) -> Self {
        Self::with_mode(keys, Mode::Bypass)
    }

    pub fn with_mode(keys: KeyRing, mode: Mode) -> Self {
        Self { keys, mode }
    }

    /// Adds a key and makes it current. Intended for setup only.
    pub fn add_key(&mut self, id: u32, secret: &[u8]) -> CryptoResult<()> {
        self.keys.add_key(id, secret)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_bypass(&self) -> bool {
        self.mode == Mode::Bypass
    }

    pub fn key_ring(&self) -> &KeyRing {
        &self.keys
    }

    /// Returns the exact envelope size for `len` bytes of plaintext.
    pub fn encrypted_size(&self, len: usize) -> CryptoResult<usize> {
        if len == 0 {
            return Ok(0);
        }

        let too_large = || CryptoError::PayloadTooLarge(len as u64);
        match self.mode {
            Mode::Bypass => len
                .checked_add(FrameTag::Bypass.header_len())
                .ok_or_else(too_large),
            Mode::Encrypt => {
                let engine = stream::encrypted_size(len as u64)?;
                usize::try_from(engine)
                    .ok()
                    .and_then(|n| n.checked_add(FrameTag::Sealed.header_len()))
                    .ok_or_else(too_large)
            }
        }
    }

    /// Streaming version of [`Crypter::encrypt`].
    ///
    /// The envelope header is written on the first non-empty write, so a
    /// stream that never receives data produces no bytes at all.
    pub fn encrypt_writer<W: Write>(&self, sink: W) -> FrameWriter<'_, W> {
        FrameWriter {
            crypter: self,
            state: Some(WriterState::Pending(sink)),
            closed: false,
        }
    }

    /// Streaming version of [`Crypter::decrypt`].
    ///
    /// The tag and key id are consumed eagerly; the payload is decrypted as
    /// the returned reader is drained.
    pub fn decrypt_reader<R: Read>(&self, mut source: R) -> CryptoResult<FrameReader<R>> {
        let tag = frame::read_tag(&mut source)
            .inspect_err(|e| debug!(error = %e, "rejected envelope tag"))?;

        match tag {
            None => Ok(FrameReader::Empty),
            Some(FrameTag::Bypass) => Ok(FrameReader::Bypass(source)),
            Some(FrameTag::Sealed) => {
                let key_id = frame::read_key_id(&mut source)?;
                let key = self
                    .keys
                    .lookup(key_id)
                    .inspect_err(|_| debug!(key_id, "envelope references unknown key"))?;

                // A header without payload is the empty value; the engine
                // itself rejects empty input.
                let mut first = [0u8; 1];
                if frame::read_full(&mut source, &mut first)? == 0 {
                    return Ok(FrameReader::Empty);
                }

                let source = Cursor::new(first).chain(source);
                Ok(FrameReader::Sealed(DecryptReader::new(source, key.engine_key())))
            }
        }
    }

    /// Builds the envelope header and picks the key, without touching the sink.
    fn header(&self) -> CryptoResult<(Vec<u8>, Option<&Key>)> {
        match self.mode {
            Mode::Bypass => {
                let mut header = Vec::with_capacity(FrameTag::Bypass.header_len());
                frame::write_tag(&mut header, FrameTag::Bypass)?;
                Ok((header, None))
            }
            Mode::Encrypt => {
                let key = self.keys.current_key()?;
                let mut header = Vec::with_capacity(FrameTag::Sealed.header_len());
                frame::write_tag(&mut header, FrameTag::Sealed)?;
                frame::write_key_id(&mut header, key.id())?;
                Ok((header, Some(key)))
            }
        }
    }
}

impl Crypter for MultiKeyCrypter {
    fn encrypt(&self, data: &[u8]) -> CryptoResult<Vec<u8>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let size = self.encrypted_size(data.len())?;
        let mut writer = self.encrypt_writer(Vec::with_capacity(size));
        writer.write_all(data)?;
        writer.finish()
    }

    fn decrypt(&self, data: &[u8]) -> CryptoResult<Vec<u8>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let mut reader = self.decrypt_reader(data)?;
        let mut plaintext = Vec::with_capacity(data.len());
        reader.read_to_end(&mut plaintext)?;
        Ok(plaintext)
    }
}

enum WriterState<W: Write> {
    Pending(W),
    Bypass(W),
    Sealed(EncryptWriter<W>),
}

/// Envelope writer returned by [`MultiKeyCrypter::encrypt_writer`].
///
/// Call [`close`](Self::close) or [`finish`](Self::finish) when done; the
/// final engine package is only written then.
pub struct FrameWriter<'a, W: Write> {
    crypter: &'a MultiKeyCrypter,
    // None while switching out of Pending, and for good once writing the
    // header to the sink failed.
    state: Option<WriterState<W>>,
    closed: bool,
}

impl<W: Write> FrameWriter<'_, W> {
    /// Completes the envelope. Safe to call more than once.
    pub fn close(&mut self) -> CryptoResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        match self.state.as_mut() {
            Some(WriterState::Sealed(w)) => w.close(),
            Some(WriterState::Bypass(w)) => Ok(w.flush()?),
            Some(WriterState::Pending(_)) | None => Ok(()),
        }
    }

    /// Completes the envelope and returns the sink.
    pub fn finish(mut self) -> CryptoResult<W> {
        self.close()?;
        match self.state {
            Some(WriterState::Pending(w) | WriterState::Bypass(w)) => Ok(w),
            Some(WriterState::Sealed(w)) => Ok(w.into_inner()),
            None => Err(CryptoError::Encryption("frame writer poisoned".to_string())),
        }
    }

    fn begin(&mut self) -> io::Result<()> {
        let mut sink = match self.state.take() {
            Some(WriterState::Pending(sink)) => sink,
            other => {
                self.state = other;
                return Ok(());
            }
        };

        let (header, key) = match self.crypter.header() {
            Ok(header) => header,
            Err(err) => {
                self.state = Some(WriterState::Pending(sink));
                return Err(err.into_io());
            }
        };

        // A partly written header cannot be retried; the writer stays poisoned.
        sink.write_all(&header)
            .inspect_err(|e| debug!(error = %e, "envelope header write failed"))?;

        self.state = Some(match key {
            None => WriterState::Bypass(sink),
            Some(key) => WriterState::Sealed(EncryptWriter::new(sink, key.engine_key())),
        });
        Ok(())
    }
}

impl<W: Write> Write for FrameWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(CryptoError::Encryption("write after close".to_string()).into_io());
        }

        if let Some(WriterState::Pending(_)) = self.state {
            if buf.is_empty() {
                return Ok(0);
            }
            self.begin()?;
        }

        match self.state.as_mut() {
            Some(WriterState::Bypass(w)) => w.write(buf),
            Some(WriterState::Sealed(w)) => w.write(buf),
            Some(WriterState::Pending(_)) => Ok(0),
            None => Err(io::Error::other("frame writer poisoned")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.state.as_mut() {
            Some(WriterState::Pending(w) | WriterState::Bypass(w)) => w.flush(),
            Some(WriterState::Sealed(w)) => w.flush(),
            None => Ok(()),
        }
    }
}

/// Envelope reader returned by [`MultiKeyCrypter::decrypt_reader`].
pub enum FrameReader<R: Read> {
    /// Empty envelope, or a sealed envelope without payload.
    Empty,
    /// Bypass payload, read verbatim.
    Bypass(R),
    /// Engine payload, decrypted while reading.
    Sealed(DecryptReader<Chain<Cursor<[u8; 1]>, R>>),
}

impl<R: Read> Read for FrameReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            FrameReader::Empty => Ok(0),
            FrameReader::Bypass(r) => r.read(buf),
            FrameReader::Sealed(r) => r.read(buf),
        }
    }
}
