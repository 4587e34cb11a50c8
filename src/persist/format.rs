//! Binary layout of a persisted filter.
//!
//! ```text
//! [Header: 40 bytes, little-endian]
//!   Magic:          4 bytes  ("HBLM")
//!   Version:        2 bytes
//!   Storage:        1 byte   (0 = packed bits, 1 = byte flags)
//!   Reserved:       1 byte   (zero)
//!   Size:           8 bytes  (positions)
//!   Num Hashes:     4 bytes
//!   Shard Count:    4 bytes  (1 for central locking)
//!   Hasher Print:   8 bytes  (hash of a fixed probe, detects hasher/seed changes)
//!   Payload Length: 8 bytes
//!
//! [Payload: Payload Length bytes]
//!   packed bits: size/64 little-endian u64 words
//!   byte flags:  size bytes, nonzero = set
//!
//! [Trailer: 4 bytes]
//!   CRC-32 of the payload
//! ```
//!
//! The shard count is informational: a stream written by a striped filter
//! loads into a centrally locked one of the same size and vice versa.

use crate::core::StorageKind;
use crate::error::Result;
use crate::hash::BloomHasher;
use std::io::{self, Read, Write};

/// Magic bytes for format identification.
pub const MAGIC: &[u8; 4] = b"HBLM";

/// Current format version.
pub const VERSION: u16 = 1;

/// Header size in bytes.
pub const HEADER_SIZE: usize = 40;

/// Trailer size in bytes.
pub const TRAILER_SIZE: usize = 4;

const FINGERPRINT_PROBE: &[u8] = b"hyperbloom/fingerprint";

/// Malformed or incompatible filter stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// Invalid magic bytes in header
    #[error("Invalid magic bytes (expected 'HBLM')")]
    InvalidMagic,

    /// Unsupported format version
    #[error("Unsupported format version: {0} (expected {})", VERSION)]
    UnsupportedVersion(u16),

    /// Unknown storage identifier
    #[error("Unknown storage identifier: {0}")]
    UnknownStorage(u8),

    /// Stream was written by a filter with the other storage encoding
    #[error("Stream uses {found} storage, filter uses {expected}")]
    StorageMismatch {
        /// Storage of the filter being loaded into
        expected: StorageKind,
        /// Storage declared by the stream
        found: StorageKind,
    },

    /// Stream was written with a different hasher or seed
    #[error("Stream was written with a different hasher (fingerprint {found:#018x}, expected {expected:#018x})")]
    HasherMismatch {
        /// Fingerprint of the filter's hasher
        expected: u64,
        /// Fingerprint recorded in the stream
        found: u64,
    },

    /// Declared payload length disagrees with size and storage
    #[error("Payload length {found} does not match expected {expected}")]
    PayloadLength {
        /// Length implied by size and storage
        expected: u64,
        /// Length declared by the stream
        found: u64,
    },

    /// Payload does not match its checksum
    #[error("Checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        /// Checksum from the trailer
        stored: u32,
        /// Checksum of the payload as read
        computed: u32,
    },

    /// Header field holds a value no filter can have
    #[error("Invalid header: {0}")]
    InvalidHeader(&'static str),

    /// Stream ended before the declared content
    #[error("Stream truncated")]
    Truncated,
}

/// Decoded stream header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Header {
    /// Format version.
    pub version: u16,
    /// Storage encoding of the payload.
    pub storage: StorageKind,
    /// Number of positions.
    pub size: usize,
    /// Number of hash functions.
    pub num_hashes: usize,
    /// Lock count of the writing filter.
    pub shard_count: usize,
    /// Fingerprint of the writing filter's hasher.
    pub hasher_fingerprint: u64,
    /// Payload length in bytes.
    pub payload_len: u64,
}

impl Header {
    /// Encode into the fixed 40-byte layout.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(MAGIC);
        bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
        bytes[6] = self.storage.id();
        bytes[7] = 0;
        bytes[8..16].copy_from_slice(&(self.size as u64).to_le_bytes());
        bytes[16..20].copy_from_slice(&(self.num_hashes as u32).to_le_bytes());
        bytes[20..24].copy_from_slice(&(self.shard_count as u32).to_le_bytes());
        bytes[24..32].copy_from_slice(&self.hasher_fingerprint.to_le_bytes());
        bytes[32..40].copy_from_slice(&self.payload_len.to_le_bytes());
        bytes
    }

    /// Decode and sanity-check a header.
    ///
    /// # Errors
    ///
    /// `Format` for bad magic, version, storage id or out-of-range fields.
    pub fn from_bytes(bytes: &[u8; HEADER_SIZE]) -> Result<Self> {
        if &bytes[0..4] != MAGIC {
            return Err(FormatError::InvalidMagic.into());
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != VERSION {
            return Err(FormatError::UnsupportedVersion(version).into());
        }

        let storage = StorageKind::from_id(bytes[6]).ok_or(FormatError::UnknownStorage(bytes[6]))?;

        let size = usize::try_from(read_u64(&bytes[8..16]))
            .map_err(|_| FormatError::InvalidHeader("size exceeds address space"))?;
        if size == 0 {
            return Err(FormatError::InvalidHeader("size is zero").into());
        }

        let num_hashes = read_u32(&bytes[16..20]) as usize;
        if num_hashes == 0 {
            return Err(FormatError::InvalidHeader("hash count is zero").into());
        }

        let shard_count = read_u32(&bytes[20..24]) as usize;
        if shard_count == 0 {
            return Err(FormatError::InvalidHeader("shard count is zero").into());
        }

        Ok(Self {
            version,
            storage,
            size,
            num_hashes,
            shard_count,
            hasher_fingerprint: read_u64(&bytes[24..32]),
            payload_len: read_u64(&bytes[32..40]),
        })
    }

    /// Write the encoded header.
    ///
    /// # Errors
    ///
    /// Propagates writer failures.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }

    /// Read and decode a header.
    ///
    /// # Errors
    ///
    /// `Format(Truncated)` if fewer than 40 bytes are available, otherwise
    /// see [`Header::from_bytes`].
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut bytes = [0u8; HEADER_SIZE];
        read_exact(reader, &mut bytes)?;
        Self::from_bytes(&bytes)
    }

    /// Total stream length including header and trailer.
    #[must_use]
    pub fn stream_len(&self) -> u64 {
        HEADER_SIZE as u64 + self.payload_len + TRAILER_SIZE as u64
    }
}

/// Fingerprint recorded in the header for `hasher`.
#[must_use]
pub fn hasher_fingerprint<H: BloomHasher + ?Sized>(hasher: &H) -> u64 {
    hasher.hash_bytes(FINGERPRINT_PROBE)
}

/// `read_exact` that reports a short stream as `Truncated`.
pub(crate) fn read_exact<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|err| {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            FormatError::Truncated.into()
        } else {
            err.into()
        }
    })
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}

/// Writer adapter that checksums everything passing through it.
pub(crate) struct CrcWriter<W> {
    inner: W,
    hasher: crc32fast::Hasher,
    written: u64,
}

impl<W: Write> CrcWriter<W> {
    pub(crate) fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: crc32fast::Hasher::new(),
            written: 0,
        }
    }

    /// Bytes written and their checksum.
    pub(crate) fn finish(self) -> (u64, u32) {
        (self.written, self.hasher.finalize())
    }
}

impl<W: Write> Write for CrcWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HyperBloomError;
    use crate::hash::{StdHasher, XxHasher};

    fn sample() -> Header {
        Header {
            version: VERSION,
            storage: StorageKind::ByteFlags,
            size: 1024,
            num_hashes: 3,
            shard_count: 4,
            hasher_fingerprint: 0xdead_beef,
            payload_len: 1024,
        }
    }

    #[test]
    fn test_header_layout() {
        let bytes = sample().to_bytes();
        assert_eq!(&bytes[0..4], b"HBLM");
        assert_eq!(bytes[6], 1);
        assert_eq!(bytes[7], 0);
        assert_eq!(&bytes[8..16], &1024u64.to_le_bytes());
        assert_eq!(Header::from_bytes(&bytes).unwrap(), sample());
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut bytes = sample().to_bytes();
        bytes[0] = b'X';
        assert!(matches!(
            Header::from_bytes(&bytes),
            Err(HyperBloomError::Format(FormatError::InvalidMagic))
        ));
    }

    #[test]
    fn test_rejects_future_version() {
        let mut bytes = sample().to_bytes();
        bytes[4..6].copy_from_slice(&2u16.to_le_bytes());
        assert!(matches!(
            Header::from_bytes(&bytes),
            Err(HyperBloomError::Format(FormatError::UnsupportedVersion(2)))
        ));
    }

    #[test]
    fn test_rejects_unknown_storage() {
        let mut bytes = sample().to_bytes();
        bytes[6] = 7;
        assert!(matches!(
            Header::from_bytes(&bytes),
            Err(HyperBloomError::Format(FormatError::UnknownStorage(7)))
        ));
    }

    #[test]
    fn test_rejects_zero_fields() {
        let mut bytes = sample().to_bytes();
        bytes[16..20].copy_from_slice(&0u32.to_le_bytes());
        assert!(matches!(
            Header::from_bytes(&bytes),
            Err(HyperBloomError::Format(FormatError::InvalidHeader(_)))
        ));
    }

    #[test]
    fn test_short_header_is_truncated() {
        let bytes = sample().to_bytes();
        let mut short = &bytes[..20];
        assert!(matches!(
            Header::read_from(&mut short),
            Err(HyperBloomError::Format(FormatError::Truncated))
        ));
    }

    #[test]
    fn test_fingerprint_tracks_hasher_and_seed() {
        let default = hasher_fingerprint(&XxHasher::new());
        assert_eq!(default, hasher_fingerprint(&XxHasher::new()));
        assert_ne!(default, hasher_fingerprint(&XxHasher::with_seed(1)));
        assert_ne!(default, hasher_fingerprint(&StdHasher::new()));
    }

    #[test]
    fn test_crc_writer() {
        let mut out = Vec::new();
        let mut writer = CrcWriter::new(&mut out);
        writer.write_all(b"123456789").unwrap();
        let (written, crc) = writer.finish();
        assert_eq!(written, 9);
        // CRC-32/ISO-HDLC check value.
        assert_eq!(crc, 0xCBF4_3926);
        assert_eq!(out, b"123456789");
    }
}
