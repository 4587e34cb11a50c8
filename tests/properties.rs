//! Property tests for construction, derivation, membership and persistence.

use hyperbloom::hash::IndexDeriver;
use hyperbloom::{BloomFilter, ByteBloomFilter, StripedBloomFilter, StripedByteBloomFilter};
use proptest::prelude::*;

fn keys() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 0..48), 1..64)
}

/// Mostly powers of two, with arbitrary values mixed in.
fn count(max_log: u32) -> impl Strategy<Value = usize> {
    prop_oneof![
        (0u32..=max_log).prop_map(|e| 1usize << e),
        0usize..(1usize << max_log) + 100,
    ]
}

fn valid_size(size: usize) -> bool {
    size >= 64 && size.is_power_of_two()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_no_false_negatives(keys in keys(), shards_log in 0u32..5, k in 1usize..8) {
        let shards = 1usize << shards_log;
        let striped = StripedBloomFilter::new(1 << 12, k, shards).unwrap();
        let central = ByteBloomFilter::new(1 << 12, k).unwrap();
        for key in &keys {
            striped.insert(key).unwrap();
            central.insert(key).unwrap();
        }
        for key in &keys {
            prop_assert!(striped.lookup(key).unwrap());
            prop_assert!(central.lookup(key).unwrap());
        }
    }

    #[test]
    fn prop_construction_follows_geometry_rules(size in count(16), shards in count(10)) {
        let expected = valid_size(size)
            && shards.is_power_of_two()
            && shards <= size / 64
            && size % shards == 0;
        prop_assert_eq!(StripedBloomFilter::new(size, 3, shards).is_ok(), expected);
        prop_assert_eq!(StripedByteBloomFilter::new(size, 3, shards).is_ok(), expected);

        prop_assert_eq!(BloomFilter::new(size, 3).is_ok(), valid_size(size));
        prop_assert_eq!(ByteBloomFilter::new(size, 3).is_ok(), valid_size(size));
    }

    #[test]
    fn prop_derivation_is_deterministic(key in prop::collection::vec(any::<u8>(), 0..64), size_log in 6u32..24, k in 1usize..32) {
        let size = 1usize << size_log;
        let first = IndexDeriver::new(size, k).unwrap();
        let second = IndexDeriver::new(size, k).unwrap();
        prop_assert_eq!(first.derive(&key), first.derive(&key));
        prop_assert_eq!(first.derive(&key), second.derive(&key));
    }

    #[test]
    fn prop_hash_calls_are_independent(key in prop::collection::vec(any::<u8>(), 0..64), k in 2usize..16) {
        let deriver = IndexDeriver::new(1 << 24, k).unwrap();
        let positions = deriver.derive(&key);
        prop_assert!(
            positions.iter().any(|&p| p != positions[0]),
            "all {} positions equal: {:?}",
            k,
            positions
        );
    }

    #[test]
    fn prop_positions_in_range(key in prop::collection::vec(any::<u8>(), 0..64), size_log in 6u32..24, k in 1usize..32) {
        let size = 1usize << size_log;
        let deriver = IndexDeriver::new(size, k).unwrap();
        let positions = deriver.derive(&key);
        prop_assert_eq!(positions.len(), k);
        prop_assert!(positions.iter().all(|&p| p < size));
    }

    #[test]
    fn prop_save_load_preserves_state(keys in keys()) {
        let source = StripedByteBloomFilter::new(1 << 10, 3, 4).unwrap();
        for key in &keys {
            source.insert(key).unwrap();
        }
        let mut buf = Vec::new();
        source.save(&mut buf).unwrap();

        let target = StripedByteBloomFilter::new(1 << 10, 3, 4).unwrap();
        target.load(buf.as_slice()).unwrap();
        prop_assert_eq!(target.count_ones(), source.count_ones());

        let mut again = Vec::new();
        target.save(&mut again).unwrap();
        prop_assert_eq!(again, buf);
    }

    #[test]
    fn prop_load_is_union(left in keys(), right in keys()) {
        let a = BloomFilter::new(1 << 12, 4).unwrap();
        let b = BloomFilter::new(1 << 12, 4).unwrap();
        for key in &left {
            a.insert(key).unwrap();
        }
        for key in &right {
            b.insert(key).unwrap();
        }
        let mut buf = Vec::new();
        a.save(&mut buf).unwrap();
        b.load(buf.as_slice()).unwrap();

        for key in left.iter().chain(right.iter()) {
            prop_assert!(b.lookup(key).unwrap());
        }
    }

    #[test]
    fn prop_truncated_stream_never_modifies(keys in keys(), cut in 0usize..180) {
        let source = BloomFilter::new(1024, 3).unwrap();
        for key in &keys {
            source.insert(key).unwrap();
        }
        let mut buf = Vec::new();
        source.save(&mut buf).unwrap();
        // Full stream is 40 + 128 + 4 = 172 bytes.
        prop_assume!(cut < buf.len());

        let target = BloomFilter::new(1024, 3).unwrap();
        prop_assert!(target.load(&buf[..cut]).is_err());
        prop_assert_eq!(target.count_ones(), 0);
    }
}
