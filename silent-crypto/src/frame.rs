//! Envelope framing.
//!
//! ```text
//! offset  field    notes
//! 0       tag      0x01 = engine-encrypted, 0x23 ('#') = bypass
//! 1..5    key id   only if tag == 0x01, little-endian u32
//! 5..     payload  engine packages (tag 0x01) or raw bytes (tag '#')
//! ```
//!
//! An empty logical value is encoded as a zero-length envelope with no tag.

use crate::error::{CryptoError, CryptoResult};
use std::io::{self, Read, Write};

/// Length of the tag byte.
pub const TAG_LEN: usize = 1;

/// Length of the key id that follows a [`FrameTag::Sealed`] tag.
pub const KEY_ID_LEN: usize = 4;

/// Header length of an engine-encrypted envelope.
pub const SEALED_HEADER_LEN: usize = TAG_LEN + KEY_ID_LEN;

/// First byte of a non-empty envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameTag {
    /// Engine-encrypted payload, key id follows.
    Sealed = 0x01,
    /// Raw payload kept legible for debugging, no key id.
    Bypass = b'#',
}

impl FrameTag {
    /// Returns the byte written on the wire.
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Returns the envelope overhead added on top of the payload.
    pub const fn header_len(self) -> usize {
        match self {
            FrameTag::Sealed => SEALED_HEADER_LEN,
            FrameTag::Bypass => TAG_LEN,
        }
    }
}

impl TryFrom<u8> for FrameTag {
    type Error = CryptoError;

    fn try_from(byte: u8) -> CryptoResult<Self> {
        match byte {
            0x01 => Ok(FrameTag::Sealed),
            b'#' => Ok(FrameTag::Bypass),
            other => Err(CryptoError::UnsupportedVersion(other)),
        }
    }
}

/// Writes the tag byte.
pub fn write_tag<W: Write + ?Sized>(w: &mut W, tag: FrameTag) -> io::Result<()> {
    w.write_all(&[tag.as_byte()])
}

/// Writes a key id as little-endian u32.
pub fn write_key_id<W: Write + ?Sized>(w: &mut W, key_id: u32) -> io::Result<()> {
    w.write_all(&key_id.to_le_bytes())
}

/// Reads the tag byte.
///
/// Returns `Ok(None)` if the input ends before any byte is read, which is the
/// canonical encoding of an empty value.
pub fn read_tag<R: Read + ?Sized>(r: &mut R) -> CryptoResult<Option<FrameTag>> {
    let mut byte = [0u8; TAG_LEN];
    if read_full(r, &mut byte)? == 0 {
        return Ok(None);
    }
    FrameTag::try_from(byte[0]).map(Some)
}

/// Reads the key id that follows a sealed tag.
pub fn read_key_id<R: Read + ?Sized>(r: &mut R) -> CryptoResult<u32> {
    let mut bytes = [0u8; KEY_ID_LEN];
    let n = read_full(r, &mut bytes)?;
    if n != KEY_ID_LEN {
        return Err(CryptoError::MalformedFrame(format!(
            "key id truncated after {n} of {KEY_ID_LEN} bytes"
        )));
    }
    Ok(u32::from_le_bytes(bytes))
}

/// Fills `buf` as far as the input allows and returns the number of bytes read.
///
/// Unlike `read_exact`, a short count is not an error; callers decide whether
/// end-of-input at this point is legal.
pub(crate) fn read_full<R: Read + ?Sized>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
