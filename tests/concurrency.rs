//! Multi-threaded behaviour of the locked and unlocked paths.

use hyperbloom::{
    BitStore, BloomFilter, ByteBloomFilter, Filter, LockStrategy, StripedBloomFilter,
    StripedByteBloomFilter,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

const THREADS: usize = 8;
const KEYS_PER_THREAD: usize = 2_000;

fn hammer_inserts<S, L>(filter: Arc<Filter<S, L>>)
where
    S: BitStore + 'static,
    L: LockStrategy + 'static,
{
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|tid| {
            let filter = Arc::clone(&filter);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..KEYS_PER_THREAD {
                    filter.insert(&format!("t{}-k{}", tid, i)).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    // Each thread then checks its own keys, concurrently with the others.
    let handles: Vec<_> = (0..THREADS)
        .map(|tid| {
            let filter = Arc::clone(&filter);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..KEYS_PER_THREAD {
                    let key = format!("t{}-k{}", tid, i);
                    assert!(filter.lookup(&key).unwrap(), "lost insert {}", key);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
}

#[test]
fn test_concurrent_inserts_all_variants() {
    hammer_inserts(Arc::new(BloomFilter::new(1 << 20, 4).unwrap()));
    hammer_inserts(Arc::new(ByteBloomFilter::new(1 << 20, 4).unwrap()));
    hammer_inserts(Arc::new(StripedBloomFilter::new(1 << 20, 4, 64).unwrap()));
    hammer_inserts(Arc::new(StripedByteBloomFilter::new(1 << 20, 4, 64).unwrap()));
}

#[test]
fn test_small_filter_shared_words_under_contention() {
    // 64 positions and one shard: every insert touches the same word.
    hammer_inserts(Arc::new(StripedBloomFilter::new(64, 2, 1).unwrap()));
    hammer_inserts(Arc::new(BloomFilter::new(64, 2).unwrap()));
}

#[test]
fn test_readers_during_writes_never_lose_completed_inserts() {
    let filter = Arc::new(StripedBloomFilter::new(1 << 18, 4, 32).unwrap());
    for i in 0..1000 {
        filter.insert(&format!("stable-{}", i)).unwrap();
    }

    let stop = Arc::new(AtomicBool::new(false));
    let writers: Vec<_> = (0..4)
        .map(|tid| {
            let filter = Arc::clone(&filter);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut i = 0usize;
                while !stop.load(Ordering::Relaxed) {
                    filter.insert(&format!("churn-{}-{}", tid, i)).unwrap();
                    i += 1;
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let filter = Arc::clone(&filter);
            thread::spawn(move || {
                for round in 0..5 {
                    for i in 0..1000 {
                        assert!(
                            filter.lookup(&format!("stable-{}", i)).unwrap(),
                            "round {} lost stable-{}",
                            round,
                            i
                        );
                    }
                }
            })
        })
        .collect();

    for r in readers {
        r.join().unwrap();
    }
    stop.store(true, Ordering::Relaxed);
    for w in writers {
        w.join().unwrap();
    }
}

#[test]
fn test_unlocked_warmup_then_concurrent_unlocked_lookups() {
    let filter = Arc::new(ByteBloomFilter::new(1 << 18, 4).unwrap());
    for i in 0..5_000 {
        filter.insert_unlocked(&format!("warm-{}", i)).unwrap();
    }

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let filter = Arc::clone(&filter);
            thread::spawn(move || {
                (0..5_000).all(|i| filter.lookup_unlocked(&format!("warm-{}", i)).unwrap())
            })
        })
        .collect();
    for h in handles {
        assert!(h.join().unwrap());
    }
}

#[test]
fn test_load_while_reading() {
    let source = StripedBloomFilter::new(1 << 16, 3, 16).unwrap();
    for i in 0..2000 {
        source.insert(&format!("incoming-{}", i)).unwrap();
    }
    let mut stream = Vec::new();
    source.save(&mut stream).unwrap();

    let target = Arc::new(StripedBloomFilter::new(1 << 16, 3, 16).unwrap());
    target.insert("resident").unwrap();

    let reader = {
        let target = Arc::clone(&target);
        thread::spawn(move || {
            for _ in 0..10_000 {
                assert!(target.lookup("resident").unwrap());
            }
        })
    };
    target.load(stream.as_slice()).unwrap();
    reader.join().unwrap();

    assert!((0..2000).all(|i| target.lookup(&format!("incoming-{}", i)).unwrap()));
}
