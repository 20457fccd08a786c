//! Frame cache integration tests

use critters::entity::behavior::BehaviorState;
use critters::entity::species::{ColorVariant, Species};
use critters::renderer::artwork::{ArtworkRenderer, FrameKey, SilhouetteRenderer};
use critters::renderer::cache::FrameCache;
use image::RgbaImage;
use proptest::prelude::*;
use std::sync::Arc;

fn key(frame: u32) -> FrameKey {
    FrameKey {
        species: Species::Fox,
        color: ColorVariant::Red,
        state: BehaviorState::Walking,
        frame,
        size: 8,
    }
}

#[test]
fn test_overflow_evicts_oldest_and_keeps_recent() {
    let cache = FrameCache::new(8);
    for frame in 0..8 {
        cache.populate(key(frame), RgbaImage::new(1, 1));
    }
    cache.populate(key(8), RgbaImage::new(1, 1));

    assert!(cache.len() <= 8);
    assert!(!cache.contains(&key(0)));
    assert!(!cache.contains(&key(1)));
    for frame in 2..=8 {
        assert!(cache.lookup(&key(frame)).is_some(), "frame {} should hit", frame);
    }
    assert_eq!(cache.stats().evictions, 2);
}

#[test]
fn test_touched_entry_outlives_untouched() {
    let cache = FrameCache::new(4);
    for frame in 0..4 {
        cache.populate(key(frame), RgbaImage::new(1, 1));
    }
    // Frame 0 is oldest by insertion but most recently used
    assert!(cache.lookup(&key(0)).is_some());
    cache.populate(key(4), RgbaImage::new(1, 1));

    assert!(cache.contains(&key(0)));
    assert!(!cache.contains(&key(1)));
    assert!(cache.contains(&key(4)));
}

#[test]
fn test_get_or_render_caches_once() {
    let cache = FrameCache::new(16);
    let renderer = SilhouetteRenderer;
    let first = cache.get_or_render(&key(2), &renderer).unwrap();
    let second = cache.get_or_render(&key(2), &renderer).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    let stats = cache.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
}

#[test]
fn test_concurrent_renders_share_one_entry() {
    let cache = Arc::new(FrameCache::new(32));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                let renderer = SilhouetteRenderer;
                (0..6)
                    .map(|frame| cache.get_or_render(&key(frame), &renderer).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(cache.len(), 6);
    for frame in 0..6 {
        let canonical = cache.lookup(&key(frame as u32)).unwrap();
        for images in &results {
            assert!(Arc::ptr_eq(&images[frame], &canonical));
        }
    }
}

#[test]
fn test_prewarm_fills_cache_in_background() {
    let cache = Arc::new(FrameCache::new(64));
    let renderer: Arc<dyn ArtworkRenderer> = Arc::new(SilhouetteRenderer);
    let keys: Vec<FrameKey> = (0..6).map(key).collect();
    cache.prewarm(renderer, keys.clone());

    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
    while cache.len() < keys.len() && std::time::Instant::now() < deadline {
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    assert_eq!(cache.len(), keys.len());
}

proptest! {
    #[test]
    fn prop_len_never_exceeds_capacity(
        capacity in 1usize..40,
        frames in proptest::collection::vec(0u32..120, 0..300),
    ) {
        let cache = FrameCache::new(capacity);
        for frame in frames {
            if frame % 3 == 0 {
                cache.lookup(&key(frame));
            } else {
                cache.populate(key(frame), RgbaImage::new(1, 1));
            }
            prop_assert!(cache.len() <= capacity);
        }
    }

    #[test]
    fn prop_each_eviction_frees_one_batch(
        capacity in 1usize..40,
        ops in proptest::collection::vec((0u32..120, 0usize..50), 0..300),
    ) {
        let cache = FrameCache::new(capacity);
        let batch = (capacity / 4).max(1) as u64;
        for (frame, touches) in ops {
            for _ in 0..touches {
                cache.lookup(&key(frame));
            }
            let before = cache.stats().evictions;
            cache.populate(key(frame), RgbaImage::new(1, 1));
            let freed = cache.stats().evictions - before;
            prop_assert!(freed == 0 || freed == batch, "freed {} batch {}", freed, batch);
        }
    }

    #[test]
    fn prop_latest_insert_always_hits(
        capacity in 1usize..20,
        frames in proptest::collection::vec(0u32..60, 1..100),
    ) {
        let cache = FrameCache::new(capacity);
        for frame in &frames {
            cache.populate(key(*frame), RgbaImage::new(1, 1));
            prop_assert!(cache.contains(&key(*frame)));
        }
    }
}
