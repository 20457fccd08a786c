//! Bounded frame cache with approximate-LRU eviction.
//!
//! Rendering a frame is far more expensive than a tick, so rendered images are
//! kept here keyed by `FrameKey`. Every access stamps the entry with a
//! monotonically increasing counter; when the cache is full a batch of the
//! stalest entries is dropped.
//!
//! All state sits behind one mutex. Rendering happens outside the lock, so two
//! threads can miss on the same key at once; the second insert finds the first
//! one's entry and discards its own image.

use ahash::AHashMap;
use image::RgbaImage;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::error::Result;
use crate::renderer::artwork::{ArtworkRenderer, FrameKey};

/// Shared handle to a rendered frame.
pub type FrameImage = Arc<RgbaImage>;

#[derive(Debug)]
struct CacheEntry {
    image: FrameImage,
    last_access: u64,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: AHashMap<FrameKey, CacheEntry>,
    access_counter: u64,
    stats: CacheStats,
}

impl CacheInner {
    fn next_stamp(&mut self) -> u64 {
        self.access_counter += 1;
        self.access_counter
    }
}

/// Hit/miss/eviction counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Inserts that lost the race to an entry populated first.
    pub duplicate_inserts: u64,
}

/// Thread-safe bounded cache of rendered frames.
#[derive(Debug)]
pub struct FrameCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

impl FrameCache {
    /// Create a cache holding at most `capacity` frames (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(CacheInner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        // The cache holds no invariant a panicking holder could break halfway
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }

    pub fn contains(&self, key: &FrameKey) -> bool {
        self.lock().entries.contains_key(key)
    }

    /// Look up a frame, refreshing its access stamp on a hit.
    pub fn lookup(&self, key: &FrameKey) -> Option<FrameImage> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let stamp = inner.next_stamp();
        match inner.entries.get_mut(key) {
            Some(entry) => {
                entry.last_access = stamp;
                let image = Arc::clone(&entry.image);
                inner.stats.hits += 1;
                Some(image)
            }
            None => {
                inner.stats.misses += 1;
                None
            }
        }
    }

    /// Insert a rendered frame and return the image now cached for `key`.
    ///
    /// If another caller populated the key first, that entry wins and
    /// `image` is dropped.
    pub fn populate(&self, key: FrameKey, image: RgbaImage) -> FrameImage {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let stamp = inner.next_stamp();

        if let Some(existing) = inner.entries.get_mut(&key) {
            existing.last_access = stamp;
            let image = Arc::clone(&existing.image);
            inner.stats.duplicate_inserts += 1;
            return image;
        }

        if inner.entries.len() >= self.capacity {
            let batch = (self.capacity / 4).max(1);
            let freed = evict_oldest(inner, batch);
            inner.stats.evictions += freed as u64;
            tracing::debug!(freed, capacity = self.capacity, "frame cache eviction");
        }

        let image = Arc::new(image);
        inner.entries.insert(
            key,
            CacheEntry {
                image: Arc::clone(&image),
                last_access: stamp,
            },
        );
        image
    }

    /// Return the cached frame or render, cache and return it.
    ///
    /// The renderer runs without holding the lock.
    pub fn get_or_render(&self, key: &FrameKey, renderer: &dyn ArtworkRenderer) -> Result<FrameImage> {
        if let Some(image) = self.lookup(key) {
            return Ok(image);
        }
        let image = renderer.render_frame(key)?;
        Ok(self.populate(*key, image))
    }

    /// Render any of `keys` not yet cached. Returns how many were rendered.
    ///
    /// Render failures are skipped; a later `get_or_render` will retry them.
    pub fn prewarm_blocking(&self, renderer: &dyn ArtworkRenderer, keys: &[FrameKey]) -> usize {
        let mut rendered = 0;
        for key in keys {
            if self.contains(key) {
                continue;
            }
            match renderer.render_frame(key) {
                Ok(image) => {
                    self.populate(*key, image);
                    rendered += 1;
                }
                Err(e) => tracing::debug!(?key, error = %e, "prewarm render failed"),
            }
        }
        rendered
    }

    /// Fire-and-forget prewarm on the rayon pool.
    ///
    /// Nothing waits on the result; if the process exits first the frames
    /// are simply rendered on demand later.
    pub fn prewarm(self: &Arc<Self>, renderer: Arc<dyn ArtworkRenderer>, keys: Vec<FrameKey>) {
        if keys.is_empty() {
            return;
        }
        let cache = Arc::clone(self);
        rayon::spawn(move || {
            let rendered = cache.prewarm_blocking(renderer.as_ref(), &keys);
            tracing::trace!(rendered, requested = keys.len(), "prewarm finished");
        });
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }
}

/// Drop the `batch` least recently touched entries.
///
/// The cutoff is first estimated from the stamp range in one pass. Stamps
/// cluster when a few frames are hot, so when the estimate would free fewer
/// than `batch` or more than twice that, the exact cutoff is taken as the
/// `batch`-th smallest stamp instead.
fn evict_oldest(inner: &mut CacheInner, batch: usize) -> usize {
    let len = inner.entries.len();
    if len == 0 {
        return 0;
    }
    let batch = batch.min(len);

    let (min, max) = inner
        .entries
        .values()
        .fold((u64::MAX, 0u64), |(lo, hi), e| (lo.min(e.last_access), hi.max(e.last_access)));
    let span = max - min + 1;
    let mut threshold = min + span * batch as u64 / len as u64;

    let below = inner
        .entries
        .values()
        .filter(|e| e.last_access < threshold)
        .count();
    if below < batch || below > batch * 2 {
        let mut stamps: Vec<u64> = inner.entries.values().map(|e| e.last_access).collect();
        let (_, nth, _) = stamps.select_nth_unstable(batch - 1);
        threshold = *nth + 1;
    }

    inner.entries.retain(|_, e| e.last_access >= threshold);
    len - inner.entries.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::behavior::BehaviorState;
    use crate::entity::species::{ColorVariant, Species};
    use crate::renderer::artwork::SilhouetteRenderer;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key(frame: u32) -> FrameKey {
        FrameKey {
            species: Species::Cat,
            color: ColorVariant::Black,
            state: BehaviorState::Idle,
            frame,
            size: 8,
        }
    }

    fn tiny() -> RgbaImage {
        RgbaImage::new(1, 1)
    }

    struct CountingRenderer(AtomicUsize);

    impl ArtworkRenderer for CountingRenderer {
        fn render_frame(&self, key: &FrameKey) -> Result<RgbaImage> {
            self.0.fetch_add(1, Ordering::SeqCst);
            SilhouetteRenderer.render_frame(key)
        }
    }

    #[test]
    fn test_lookup_miss_then_hit() {
        let cache = FrameCache::new(4);
        assert!(cache.lookup(&key(0)).is_none());
        cache.populate(key(0), tiny());
        assert!(cache.lookup(&key(0)).is_some());
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[test]
    fn test_size_never_exceeds_capacity() {
        let cache = FrameCache::new(8);
        for i in 0..100 {
            cache.populate(key(i), tiny());
            assert!(cache.len() <= 8);
        }
    }

    #[test]
    fn test_eviction_removes_oldest_touched() {
        let cache = FrameCache::new(4);
        for i in 0..4 {
            cache.populate(key(i), tiny());
        }
        // Touch 0 so 1 becomes the stalest
        cache.lookup(&key(0));
        cache.populate(key(10), tiny());

        assert!(!cache.contains(&key(1)));
        assert!(cache.contains(&key(0)));
        assert!(cache.contains(&key(10)));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_duplicate_populate_keeps_first_image() {
        let cache = FrameCache::new(4);
        let first = cache.populate(key(0), RgbaImage::new(2, 2));
        let second = cache.populate(key(0), RgbaImage::new(3, 3));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.dimensions(), (2, 2));
        assert_eq!(cache.stats().duplicate_inserts, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_or_render_renders_once() {
        let cache = FrameCache::new(4);
        let renderer = CountingRenderer(AtomicUsize::new(0));
        cache.get_or_render(&key(1), &renderer).unwrap();
        cache.get_or_render(&key(1), &renderer).unwrap();
        assert_eq!(renderer.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_prewarm_blocking_skips_cached() {
        let cache = FrameCache::new(16);
        let renderer = CountingRenderer(AtomicUsize::new(0));
        cache.populate(key(0), tiny());
        let rendered = cache.prewarm_blocking(&renderer, &[key(0), key(1), key(2)]);
        assert_eq!(rendered, 2);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_clustered_stamps_fall_back_to_sort() {
        let cache = FrameCache::new(8);
        for i in 0..8 {
            cache.populate(key(i), tiny());
        }
        // Keep 1..8 hot so only frame 0 sits below the estimated threshold
        for _ in 0..100 {
            for i in 1..8 {
                cache.lookup(&key(i));
            }
        }
        cache.populate(key(100), tiny());

        assert_eq!(cache.stats().evictions, 2);
        assert!(!cache.contains(&key(0)));
        assert!(!cache.contains(&key(1)));
        for i in 2..8 {
            assert!(cache.contains(&key(i)));
        }
        assert!(cache.contains(&key(100)));
    }

    #[test]
    fn test_hot_entry_evicts_only_one_batch() {
        let cache = FrameCache::new(8);
        for i in 0..8 {
            cache.populate(key(i), tiny());
        }
        cache.lookup(&key(6));
        for _ in 0..1000 {
            cache.lookup(&key(7));
        }
        cache.populate(key(100), tiny());

        assert_eq!(cache.stats().evictions, 2);
        assert_eq!(cache.len(), 7);
        assert!(!cache.contains(&key(0)));
        assert!(!cache.contains(&key(1)));
        for i in 2..8 {
            assert!(cache.contains(&key(i)), "frame {} should survive", i);
        }
        assert!(cache.contains(&key(100)));
    }

    #[test]
    fn test_concurrent_misses_converge() {
        let cache = Arc::new(FrameCache::new(64));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..32 {
                        cache.get_or_render(&key(i), &SilhouetteRenderer).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 32);
    }
}
