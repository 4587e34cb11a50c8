//! Saving and loading filter state.
//!
//! A saved stream carries the full filter geometry (see [`format`]) so that a
//! load can refuse anything it would silently corrupt the target with.
//!
//! # Load Semantics
//!
//! Loading is an OR-merge: every position set in the stream is set in the
//! target, and positions already set in the target stay set. Loading into a
//! fresh filter reproduces the saved one exactly; loading into a populated
//! filter yields the union.
//!
//! The stream is validated before anything is touched:
//!
//! 1. header magic, version and storage id
//! 2. storage, size, hash count and hasher match the target
//! 3. the full payload is read and its CRC-32 verified
//!
//! Only then are positions merged, each through the target's own write lock,
//! so a rejected stream never leaves the filter partially loaded and
//! concurrent lookups stay safe during a load.
//!
//! # Examples
//!
//! ```
//! use hyperbloom::StripedBloomFilter;
//!
//! let filter = StripedBloomFilter::new(1 << 16, 4, 16)?;
//! filter.insert("saved")?;
//!
//! let mut buf = Vec::new();
//! filter.save(&mut buf)?;
//!
//! let restored = StripedBloomFilter::new(1 << 16, 4, 16)?;
//! restored.load(buf.as_slice())?;
//! assert!(restored.lookup("saved")?);
//! # Ok::<(), hyperbloom::HyperBloomError>(())
//! ```

pub mod format;

pub use format::{FormatError, Header};

use crate::builder::FilterConfig;
use crate::core::{BitStore, ByteFlags, Filter, PackedBits, SharedFilter, StorageKind};
use crate::error::{HyperBloomError, Result};
use crate::hash::BloomHasher;
use crate::sync::LockStrategy;
use format::{hasher_fingerprint, read_exact, CrcWriter, VERSION};
use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

/// Header describing `filter` as it would be saved.
#[must_use]
pub fn header_of<S, L, H>(filter: &Filter<S, L, H>) -> Header
where
    S: BitStore,
    L: LockStrategy,
    H: BloomHasher,
{
    Header {
        version: VERSION,
        storage: S::KIND,
        size: filter.size(),
        num_hashes: filter.num_hashes(),
        shard_count: filter.shard_count(),
        hasher_fingerprint: hasher_fingerprint(filter.hasher()),
        payload_len: S::payload_len(filter.size()) as u64,
    }
}

/// Write `filter` to `writer`.
///
/// Positions are read one word or byte at a time while other threads may
/// still be inserting, so the saved state is a consistent superset of every
/// insert that completed before the call.
///
/// # Errors
///
/// `Io` if the writer fails.
pub fn save<S, L, H, W>(filter: &Filter<S, L, H>, mut writer: W) -> Result<()>
where
    S: BitStore,
    L: LockStrategy,
    H: BloomHasher,
    W: Write,
{
    let header = header_of(filter);
    header.write_to(&mut writer)?;

    let mut payload = CrcWriter::new(&mut writer);
    filter.store().write_payload(&mut payload)?;
    let (written, checksum) = payload.finish();
    debug_assert_eq!(written, header.payload_len);

    writer.write_all(&checksum.to_le_bytes())?;
    writer.flush()?;

    debug!(
        "saved filter: size={} k={} storage={} payload={}B crc={:#010x}",
        header.size, header.num_hashes, header.storage, written, checksum
    );
    Ok(())
}

/// OR-merge a stream written by [`save`] into `filter`.
///
/// # Errors
///
/// - `SizeMismatch` if the stream's size differs from `filter.size()`
/// - `HashCountMismatch` if its hash count differs
/// - `Format` for a malformed, truncated or corrupted stream, or one written
///   with another storage encoding or hasher
/// - `Io` if the reader fails
///
/// On error the filter is unchanged.
pub fn load<S, L, H, R>(filter: &Filter<S, L, H>, mut reader: R) -> Result<()>
where
    S: BitStore,
    L: LockStrategy,
    H: BloomHasher,
    R: Read,
{
    let header = Header::read_from(&mut reader).map_err(rejected)?;
    check_compatible(filter, &header).map_err(rejected)?;

    let mut payload = vec![0u8; S::payload_len(filter.size())];
    read_exact(&mut reader, &mut payload).map_err(rejected)?;

    let mut trailer = [0u8; format::TRAILER_SIZE];
    read_exact(&mut reader, &mut trailer).map_err(rejected)?;
    let stored = u32::from_le_bytes(trailer);
    let computed = crc32fast::hash(&payload);
    if stored != computed {
        return Err(rejected(FormatError::ChecksumMismatch { stored, computed }.into()));
    }

    S::for_each_set(&payload, |position| filter.set_position(position))?;

    debug!(
        "merged stream into filter: size={} k={} storage={}",
        header.size, header.num_hashes, header.storage
    );
    Ok(())
}

/// Read only the header of a stream.
///
/// # Errors
///
/// `Format` if the header is malformed, `Io` if the reader fails.
pub fn inspect<R: Read>(mut reader: R) -> Result<Header> {
    Header::read_from(&mut reader)
}

/// Save `filter` to `path`, creating or truncating the file.
///
/// # Errors
///
/// `Io` on any file system failure.
pub fn save_to_path<S, L, H, P>(filter: &Filter<S, L, H>, path: P) -> Result<()>
where
    S: BitStore,
    L: LockStrategy,
    H: BloomHasher,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    save(filter, &mut writer)?;
    let file = writer.into_inner().map_err(|err| err.into_error())?;
    file.sync_all()?;

    info!("saved {} to {}", filter, path.display());
    Ok(())
}

/// OR-merge the file at `path` into `filter`.
///
/// # Errors
///
/// See [`load`]; also `Io` if the file cannot be opened.
pub fn load_from_path<S, L, H, P>(filter: &Filter<S, L, H>, path: P) -> Result<()>
where
    S: BitStore,
    L: LockStrategy,
    H: BloomHasher,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)?;
    load(filter, BufReader::new(file))?;

    info!("loaded {} into {}", path.display(), filter);
    Ok(())
}

/// Read the header of the file at `path`.
///
/// # Errors
///
/// See [`inspect`].
pub fn inspect_path<P: AsRef<Path>>(path: P) -> Result<Header> {
    let file = File::open(path.as_ref())?;
    inspect(BufReader::new(file))
}

/// Recreate the filter saved at `path`, with the geometry its header
/// records and the default hasher.
///
/// The header is checked against the file length before anything is
/// allocated, so a forged size cannot request more memory than the file
/// could fill.
///
/// # Errors
///
/// See [`load`]; also `InvalidFilterSize`/`InvalidShardCount` if the header
/// describes a filter that cannot be built, `Format(PayloadLength)` if the
/// declared payload disagrees with size and storage, and `Format(Truncated)`
/// if the file is shorter than the header claims.
pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Box<dyn SharedFilter>> {
    let path = path.as_ref();
    let mut file = File::open(path)?;
    let header = Header::read_from(&mut file).map_err(rejected)?;
    check_stream_len(&header, file.metadata()?.len()).map_err(rejected)?;
    let filter = FilterConfig::from_header(&header).build_shared()?;

    file.rewind()?;
    filter.load(&mut BufReader::new(file))?;

    info!("opened {} from {}", filter, path.display());
    Ok(filter)
}

fn check_stream_len(header: &Header, file_len: u64) -> Result<()> {
    if !header.size.is_power_of_two() {
        return Err(HyperBloomError::invalid_filter_size(header.size));
    }

    let expected = match header.storage {
        StorageKind::PackedBits => PackedBits::payload_len(header.size),
        StorageKind::ByteFlags => ByteFlags::payload_len(header.size),
    } as u64;
    if header.payload_len != expected {
        return Err(FormatError::PayloadLength {
            expected,
            found: header.payload_len,
        }
        .into());
    }

    if file_len < header.stream_len() {
        return Err(FormatError::Truncated.into());
    }
    Ok(())
}

fn check_compatible<S, L, H>(filter: &Filter<S, L, H>, header: &Header) -> Result<()>
where
    S: BitStore,
    L: LockStrategy,
    H: BloomHasher,
{
    if header.storage != S::KIND {
        return Err(FormatError::StorageMismatch {
            expected: S::KIND,
            found: header.storage,
        }
        .into());
    }
    if header.size != filter.size() {
        return Err(HyperBloomError::size_mismatch(filter.size(), header.size));
    }
    if header.num_hashes != filter.num_hashes() {
        return Err(HyperBloomError::hash_count_mismatch(
            filter.num_hashes(),
            header.num_hashes,
        ));
    }
    let expected = hasher_fingerprint(filter.hasher());
    if header.hasher_fingerprint != expected {
        return Err(FormatError::HasherMismatch {
            expected,
            found: header.hasher_fingerprint,
        }
        .into());
    }
    let payload_len = S::payload_len(filter.size()) as u64;
    if header.payload_len != payload_len {
        return Err(FormatError::PayloadLength {
            expected: payload_len,
            found: header.payload_len,
        }
        .into());
    }
    Ok(())
}

fn rejected(err: HyperBloomError) -> HyperBloomError {
    warn!("rejected filter stream: {}", err);
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BloomFilter, ByteBloomFilter, StripedBloomFilter, StripedByteBloomFilter};
    use crate::hash::XxHasher;

    fn saved<S: BitStore, L: LockStrategy>(filter: &Filter<S, L>) -> Vec<u8> {
        let mut buf = Vec::new();
        filter.save(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_stream_length() {
        let packed = BloomFilter::new(1024, 3).unwrap();
        let buf = saved(&packed);
        assert_eq!(buf.len() as u64, header_of(&packed).stream_len());
        assert_eq!(buf.len(), 40 + 1024 / 8 + 4);

        let bytes = ByteBloomFilter::new(1024, 3).unwrap();
        assert_eq!(saved(&bytes).len(), 40 + 1024 + 4);
    }

    #[test]
    fn test_load_reproduces_state() {
        let source = StripedByteBloomFilter::new(1 << 14, 4, 16).unwrap();
        for i in 0..200 {
            source.insert(&format!("k{}", i)).unwrap();
        }
        let target = StripedByteBloomFilter::new(1 << 14, 4, 16).unwrap();
        target.load(saved(&source).as_slice()).unwrap();
        assert_eq!(target.count_ones(), source.count_ones());
        assert_eq!(saved(&target), saved(&source));
    }

    #[test]
    fn test_load_is_or_merge() {
        let a = BloomFilter::new(4096, 3).unwrap();
        let b = BloomFilter::new(4096, 3).unwrap();
        a.insert("left").unwrap();
        b.insert("right").unwrap();

        b.load(saved(&a).as_slice()).unwrap();
        assert!(b.lookup("left").unwrap());
        assert!(b.lookup("right").unwrap());
    }

    #[test]
    fn test_shard_count_does_not_matter() {
        let striped = StripedBloomFilter::new(4096, 3, 8).unwrap();
        striped.insert("moved").unwrap();
        let central = BloomFilter::new(4096, 3).unwrap();
        central.load(saved(&striped).as_slice()).unwrap();
        assert!(central.lookup("moved").unwrap());
    }

    #[test]
    fn test_size_mismatch_leaves_filter_untouched() {
        let small = BloomFilter::new(1024, 3).unwrap();
        small.insert("x").unwrap();
        let large = BloomFilter::new(2048, 3).unwrap();
        let err = large.load(saved(&small).as_slice()).unwrap_err();
        assert!(matches!(
            err,
            HyperBloomError::SizeMismatch {
                expected: 2048,
                found: 1024
            }
        ));
        assert_eq!(large.count_ones(), 0);
    }

    #[test]
    fn test_hash_count_mismatch() {
        let source = BloomFilter::new(1024, 3).unwrap();
        let target = BloomFilter::new(1024, 4).unwrap();
        assert!(matches!(
            target.load(saved(&source).as_slice()),
            Err(HyperBloomError::HashCountMismatch { expected: 4, found: 3 })
        ));
    }

    #[test]
    fn test_storage_mismatch() {
        let source = ByteBloomFilter::new(1024, 3).unwrap();
        let target = BloomFilter::new(1024, 3).unwrap();
        assert!(matches!(
            target.load(saved(&source).as_slice()),
            Err(HyperBloomError::Format(FormatError::StorageMismatch { .. }))
        ));
    }

    #[test]
    fn test_hasher_mismatch() {
        let source = BloomFilter::new(1024, 3).unwrap();
        let target: BloomFilter =
            BloomFilter::with_hasher(1024, 3, XxHasher::with_seed(42)).unwrap();
        assert!(matches!(
            target.load(saved(&source).as_slice()),
            Err(HyperBloomError::Format(FormatError::HasherMismatch { .. }))
        ));
    }

    #[test]
    fn test_corruption_detected_before_merge() {
        let source = ByteBloomFilter::new(1024, 3).unwrap();
        source.insert("a").unwrap();
        let mut buf = saved(&source);
        buf[format::HEADER_SIZE + 500] ^= 0x01;

        let target = ByteBloomFilter::new(1024, 3).unwrap();
        assert!(matches!(
            target.load(buf.as_slice()),
            Err(HyperBloomError::Format(FormatError::ChecksumMismatch { .. }))
        ));
        assert_eq!(target.count_ones(), 0);
    }

    #[test]
    fn test_truncated_payload() {
        let source = BloomFilter::new(1024, 3).unwrap();
        let buf = saved(&source);
        let target = BloomFilter::new(1024, 3).unwrap();
        assert!(matches!(
            target.load(&buf[..buf.len() - 10]),
            Err(HyperBloomError::Format(FormatError::Truncated))
        ));
    }

    #[test]
    fn test_inspect() {
        let filter = StripedByteBloomFilter::new(2048, 5, 4).unwrap();
        let header = inspect(saved(&filter).as_slice()).unwrap();
        assert_eq!(header.size, 2048);
        assert_eq!(header.num_hashes, 5);
        assert_eq!(header.shard_count, 4);
        assert_eq!(header.payload_len, 2048);
    }
}
