use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    thread::JoinHandle,
};

use tracing::{debug, warn};

use crate::{
    core::SpriteMetrics,
    loader::{IndexSource, SpriteFetcher},
    slicer::{self, SlicedSprite},
};

/// Bounded buffer of ready-to-display sprites, replenished by background
/// worker threads.
///
/// A slot is reserved (counted as in-flight) before its load is issued and
/// re-checked under the lock before the result is stored, so the ready length
/// never exceeds capacity. `dequeue` never blocks; every successful dequeue
/// schedules a refill.
pub struct PrefetchQueue {
    shared: Arc<Shared>,
}

struct Shared {
    state: Mutex<State>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    shutdown: AtomicBool,
    fetcher: Arc<dyn SpriteFetcher>,
    metrics: SpriteMetrics,
    capacity: usize,
}

struct State {
    ready: VecDeque<SlicedSprite>,
    in_flight: usize,
    indices: Box<dyn IndexSource>,
}

impl PrefetchQueue {
    pub fn new(
        fetcher: Arc<dyn SpriteFetcher>,
        indices: Box<dyn IndexSource>,
        metrics: SpriteMetrics,
        capacity: usize,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    ready: VecDeque::new(),
                    in_flight: 0,
                    indices,
                }),
                workers: Mutex::new(Vec::new()),
                shutdown: AtomicBool::new(false),
                fetcher,
                metrics,
                capacity,
            }),
        }
    }

    /// Begin background replenishment up to capacity.
    pub fn start(&self) {
        self.request_refill();
    }

    /// Number of sprites ready for immediate display.
    pub fn len(&self) -> usize {
        self.shared.state.lock().unwrap().ready.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pop the oldest ready sprite, if any, and schedule a refill for the
    /// freed slot. Never blocks; `None` means "no next image yet".
    pub fn dequeue(&self) -> Option<SlicedSprite> {
        let sprite = self.shared.state.lock().unwrap().ready.pop_front();
        if sprite.is_some() {
            self.request_refill();
        }
        sprite
    }

    /// Stop issuing new loads and join every worker. In-flight requests run
    /// to completion; their results are dropped under the lock.
    pub fn shutdown(&self) {
        self.shared.shutdown.store(true, Ordering::SeqCst);
        // Workers that fail can spawn a follow-up attempt, so drain until the
        // list stays empty.
        loop {
            let handles = std::mem::take(&mut *self.shared.workers.lock().unwrap());
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                let _ = handle.join();
            }
        }
    }

    fn request_refill(&self) {
        self.shared.request_refill();
    }
}

impl Shared {
    fn request_refill(self: &Arc<Self>) {
        if self.shutdown.load(Ordering::SeqCst) {
            return;
        }

        // Reserve slots under the lock, spawn outside it.
        let mut reserved = Vec::new();
        {
            let mut state = self.state.lock().unwrap();
            while state.ready.len() + state.in_flight < self.capacity {
                state.in_flight += 1;
                reserved.push(state.indices.next_index());
            }
        }

        if reserved.is_empty() {
            return;
        }

        let mut workers = self.workers.lock().unwrap();
        workers.retain(|h| !h.is_finished());
        for index in reserved {
            let shared = Arc::clone(self);
            workers.push(std::thread::spawn(move || load_one(&shared, index)));
        }
    }
}

fn load_one(shared: &Arc<Shared>, index: u32) {
    let loaded = shared
        .fetcher
        .fetch(index)
        .and_then(|img| slicer::slice(&img, shared.metrics));

    let failed = {
        let mut state = shared.state.lock().unwrap();
        state.in_flight -= 1;
        match loaded {
            Ok(sprite) => {
                if shared.shutdown.load(Ordering::SeqCst) {
                    return;
                }
                if state.ready.len() < shared.capacity {
                    state.ready.push_back(sprite);
                    debug!(index, ready = state.ready.len(), "sprite enqueued");
                }
                false
            }
            Err(e) => {
                warn!(index, error = %e, "sprite load failed");
                true
            }
        }
    };

    // The slot stays unfilled by this attempt; the fill pass continues with a
    // fresh index until the queue reaches capacity.
    if failed {
        shared.request_refill();
    }
}

impl Drop for PrefetchQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::{Duration, Instant},
    };

    use super::*;
    use crate::{core::RasterImage, error::ParadeError, loader::SequentialIndexSource};

    struct SolidFetcher {
        calls: AtomicUsize,
    }

    impl SolidFetcher {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl SpriteFetcher for SolidFetcher {
        fn fetch(&self, index: u32) -> crate::error::ParadeResult<RasterImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let shade = (index % 256) as u8;
            let data: Vec<u8> = std::iter::repeat_n([shade, 0, 0, 255], 28 * 28)
                .flatten()
                .collect();
            RasterImage::from_rgba8(28, 28, data)
        }
    }

    struct FailingFetcher {
        inner: SolidFetcher,
    }

    impl SpriteFetcher for FailingFetcher {
        fn fetch(&self, index: u32) -> crate::error::ParadeResult<RasterImage> {
            if index == 0 {
                return Err(ParadeError::load("synthetic failure"));
            }
            self.inner.fetch(index)
        }
    }

    fn metrics() -> SpriteMetrics {
        SpriteMetrics::from_container(168, 28, 23).unwrap()
    }

    fn wait_for(queue: &PrefetchQueue, len: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while queue.len() < len {
            assert!(Instant::now() < deadline, "queue never reached {len}");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn fills_to_capacity_and_never_exceeds() {
        let queue = PrefetchQueue::new(
            Arc::new(SolidFetcher::new()),
            Box::new(SequentialIndexSource::new(1, 10_000)),
            metrics(),
            3,
        );
        queue.start();
        queue.start(); // second start must not over-reserve
        wait_for(&queue, 3);
        assert_eq!(queue.len(), 3);
        queue.shutdown();
        assert!(queue.len() <= 3);
    }

    #[test]
    fn dequeue_schedules_refill() {
        let fetcher = Arc::new(SolidFetcher::new());
        let queue = PrefetchQueue::new(
            Arc::clone(&fetcher) as Arc<dyn SpriteFetcher>,
            Box::new(SequentialIndexSource::new(1, 10_000)),
            metrics(),
            3,
        );
        queue.start();
        wait_for(&queue, 3);

        let calls_before = fetcher.calls.load(Ordering::SeqCst);
        assert!(queue.dequeue().is_some());
        wait_for(&queue, 3);
        assert!(fetcher.calls.load(Ordering::SeqCst) > calls_before);
        queue.shutdown();
    }

    #[test]
    fn dequeue_on_empty_returns_none_without_blocking() {
        let queue = PrefetchQueue::new(
            Arc::new(SolidFetcher::new()),
            Box::new(SequentialIndexSource::new(1, 10_000)),
            metrics(),
            3,
        );
        assert!(queue.dequeue().is_none());
    }

    #[test]
    fn failed_fetch_abandons_slot_and_recovers() {
        // Index 0 fails; the fill pass carries on with fresh indices until
        // the queue still reaches capacity.
        let failing = Arc::new(FailingFetcher {
            inner: SolidFetcher::new(),
        });
        let queue = PrefetchQueue::new(
            Arc::clone(&failing) as Arc<dyn SpriteFetcher>,
            Box::new(SequentialIndexSource::new(0, 10_000)),
            metrics(),
            3,
        );
        queue.start();
        wait_for(&queue, 3);

        // The abandoned slot cost an extra fetch beyond the capacity.
        assert!(failing.inner.calls.load(Ordering::SeqCst) >= 3);
        queue.shutdown();
    }

    #[test]
    fn shutdown_joins_workers() {
        let queue = PrefetchQueue::new(
            Arc::new(SolidFetcher::new()),
            Box::new(SequentialIndexSource::new(1, 10_000)),
            metrics(),
            3,
        );
        queue.start();
        queue.shutdown();
        assert!(queue.len() <= 3);
        // After shutdown no further refills are issued.
        queue.start();
        assert!(queue.shared.workers.lock().unwrap().is_empty());
    }

    #[test]
    fn sprites_come_out_sliced() {
        let queue = PrefetchQueue::new(
            Arc::new(SolidFetcher::new()),
            Box::new(SequentialIndexSource::new(1, 10_000)),
            metrics(),
            1,
        );
        queue.start();
        wait_for(&queue, 1);
        let sprite = queue.dequeue().unwrap();
        assert_eq!(sprite.size, 168);
        assert_eq!(sprite.split_line, 138);
        assert_eq!(sprite.upper.height + sprite.lower.height, sprite.size);
        queue.shutdown();
    }
}
