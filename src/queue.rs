use std::collections::VecDeque;
use std::sync::Arc;

use crate::{
    assets::decode::decode_frame,
    cache::FrameStore,
    core::FrameIndex,
    fetch::{FetchOutcome, FrameFetcher},
    manifest::SequenceManifest,
    mapper::ScrollMapper,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Priority {
    /// Front-inserted; most recently requested wins.
    High,
    /// Appended behind all interactive work.
    Low,
}

/// Bounded-concurrency prioritized fetch scheduler over the frame store.
///
/// The deque holds indices whose store state is `Queued`; the active counter
/// tracks in-flight fetches. Exceeding the concurrency limit parks entries in
/// priority order, which is the only backpressure mechanism. Completion of any
/// load re-enters [`LoadQueue::process`], the sole point that keeps the
/// pipeline flowing.
pub struct LoadQueue {
    pending: VecDeque<FrameIndex>,
    active: usize,
    concurrency: usize,
}

impl LoadQueue {
    pub fn new(concurrency: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            active: 0,
            concurrency: concurrency.max(1),
        }
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Queue one index. Idempotent: anything already queued, loading, loaded,
    /// or failed is left alone and `false` is returned.
    pub fn enqueue(&mut self, store: &mut FrameStore, frame: FrameIndex, priority: Priority) -> bool {
        if !store.mark_queued(frame) {
            return false;
        }
        match priority {
            Priority::High => self.pending.push_front(frame),
            Priority::Low => self.pending.push_back(frame),
        }
        true
    }

    /// Re-seed the interactive window: the target plus a symmetric window of
    /// retained neighbors, all at high priority.
    ///
    /// Neighbors are pushed farthest-first so that after front insertion the
    /// deque head is the target itself, then the nearest neighbors.
    pub fn seed_window(
        &mut self,
        store: &mut FrameStore,
        mapper: &ScrollMapper,
        center: FrameIndex,
        radius: u32,
    ) {
        let stride = mapper.stride();
        for d in (1..=radius).rev() {
            let step = d * stride;
            let forward = center.0.saturating_add(step);
            if forward <= mapper.last() {
                self.enqueue(store, FrameIndex(forward), Priority::High);
            }
            if let Some(backward) = center.0.checked_sub(step) {
                self.enqueue(store, FrameIndex(backward), Priority::High);
            }
        }
        self.enqueue(store, center, Priority::High);
    }

    /// Drain the deque while capacity remains, starting one fetch per entry.
    ///
    /// Fetchers that resolve inline have their outcomes settled iteratively
    /// here (never recursively), then draining continues with the freed
    /// capacity.
    pub fn process(
        &mut self,
        store: &mut FrameStore,
        fetcher: &mut dyn FrameFetcher,
        manifest: &SequenceManifest,
    ) {
        let mut inline: Vec<(FrameIndex, FetchOutcome)> = Vec::new();
        loop {
            while self.active < self.concurrency {
                let Some(frame) = self.pending.pop_front() else {
                    break;
                };
                // Stale entries (cleared or already handled) are dropped here.
                if !store.mark_loading(frame) {
                    continue;
                }
                match fetcher.start(frame, &manifest.locator(frame)) {
                    Some(outcome) => inline.push((frame, outcome)),
                    None => self.active += 1,
                }
            }
            if inline.is_empty() {
                return;
            }
            for (frame, outcome) in inline.drain(..) {
                settle(store, frame, outcome);
            }
        }
    }

    /// Deliver the outcome of a deferred fetch started earlier via `process`.
    pub fn complete(
        &mut self,
        store: &mut FrameStore,
        fetcher: &mut dyn FrameFetcher,
        manifest: &SequenceManifest,
        frame: FrameIndex,
        outcome: FetchOutcome,
    ) {
        if store.is_loading(frame) {
            self.active = self.active.saturating_sub(1);
            settle(store, frame, outcome);
        }
        self.process(store, fetcher, manifest);
    }

    /// Drop all parked entries and forget in-flight bookkeeping.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.active = 0;
    }
}

fn settle(store: &mut FrameStore, frame: FrameIndex, outcome: FetchOutcome) {
    let handle = match outcome {
        FetchOutcome::Decoded(prepared) => Some(Arc::new(prepared)),
        FetchOutcome::Bytes(bytes) => match decode_frame(&bytes) {
            Ok(prepared) => Some(Arc::new(prepared)),
            Err(error) => {
                tracing::debug!(frame = frame.0, %error, "frame decode failed");
                None
            }
        },
        FetchOutcome::Failed => {
            tracing::debug!(frame = frame.0, "frame fetch failed");
            None
        }
    };
    store.settle(frame, handle);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::assets::PreparedFrame;

    fn manifest(count: u32) -> SequenceManifest {
        SequenceManifest::new("seq", "frame", "jpg", count).unwrap()
    }

    fn prepared() -> PreparedFrame {
        PreparedFrame {
            width: 1,
            height: 1,
            rgba8_premul: Arc::new(vec![0, 0, 0, 255]),
        }
    }

    /// Records every started locator; resolves inline or defers on demand.
    struct RecordingFetcher {
        started: Vec<(FrameIndex, String)>,
        inline: bool,
    }

    impl RecordingFetcher {
        fn deferred() -> Self {
            Self {
                started: Vec::new(),
                inline: false,
            }
        }

        fn inline() -> Self {
            Self {
                started: Vec::new(),
                inline: true,
            }
        }

        fn starts_for(&self, frame: FrameIndex) -> usize {
            self.started.iter().filter(|(f, _)| *f == frame).count()
        }
    }

    impl FrameFetcher for RecordingFetcher {
        fn start(&mut self, frame: FrameIndex, locator: &str) -> Option<FetchOutcome> {
            self.started.push((frame, locator.to_string()));
            self.inline.then(|| FetchOutcome::Decoded(prepared()))
        }
    }

    #[test]
    fn duplicate_enqueue_starts_one_fetch() {
        let m = manifest(10);
        let mut store = FrameStore::new(10);
        let mut queue = LoadQueue::new(4);
        let mut fetcher = RecordingFetcher::deferred();

        assert!(queue.enqueue(&mut store, FrameIndex(3), Priority::High));
        assert!(!queue.enqueue(&mut store, FrameIndex(3), Priority::Low));
        queue.process(&mut store, &mut fetcher, &m);
        assert!(!queue.enqueue(&mut store, FrameIndex(3), Priority::High));
        queue.process(&mut store, &mut fetcher, &m);

        assert_eq!(fetcher.starts_for(FrameIndex(3)), 1);
    }

    #[test]
    fn settled_indices_are_never_fetched_again() {
        let m = manifest(10);
        let mut store = FrameStore::new(10);
        let mut queue = LoadQueue::new(4);
        let mut fetcher = RecordingFetcher::deferred();

        queue.enqueue(&mut store, FrameIndex(1), Priority::High);
        queue.enqueue(&mut store, FrameIndex(2), Priority::High);
        queue.process(&mut store, &mut fetcher, &m);
        queue.complete(
            &mut store,
            &mut fetcher,
            &m,
            FrameIndex(1),
            FetchOutcome::Decoded(prepared()),
        );
        queue.complete(&mut store, &mut fetcher, &m, FrameIndex(2), FetchOutcome::Failed);

        for _ in 0..3 {
            queue.enqueue(&mut store, FrameIndex(1), Priority::High);
            queue.enqueue(&mut store, FrameIndex(2), Priority::Low);
            queue.process(&mut store, &mut fetcher, &m);
        }

        assert_eq!(fetcher.starts_for(FrameIndex(1)), 1);
        assert_eq!(fetcher.starts_for(FrameIndex(2)), 1);
        assert!(store.is_loaded(FrameIndex(1)));
        assert!(!store.is_loaded(FrameIndex(2)));
    }

    #[test]
    fn active_loads_never_exceed_concurrency() {
        let m = manifest(32);
        let mut store = FrameStore::new(32);
        let mut queue = LoadQueue::new(3);
        let mut fetcher = RecordingFetcher::deferred();

        for i in 0..20 {
            queue.enqueue(&mut store, FrameIndex(i), Priority::Low);
        }
        queue.process(&mut store, &mut fetcher, &m);
        assert_eq!(queue.active(), 3);
        assert_eq!(fetcher.started.len(), 3);

        // Each completion frees exactly one slot.
        let first = fetcher.started[0].0;
        queue.complete(
            &mut store,
            &mut fetcher,
            &m,
            first,
            FetchOutcome::Decoded(prepared()),
        );
        assert_eq!(queue.active(), 3);
        assert_eq!(fetcher.started.len(), 4);

        while let Some((frame, _)) = fetcher
            .started
            .iter()
            .find(|(f, _)| store.is_loading(*f))
            .cloned()
        {
            assert!(queue.active() <= 3);
            queue.complete(
                &mut store,
                &mut fetcher,
                &m,
                frame,
                FetchOutcome::Decoded(prepared()),
            );
        }
        assert_eq!(store.loaded_count(), 20);
        assert_eq!(queue.active(), 0);
    }

    #[test]
    fn high_priority_jumps_ahead_of_low() {
        let m = manifest(16);
        let mut store = FrameStore::new(16);
        let mut queue = LoadQueue::new(1);
        let mut fetcher = RecordingFetcher::deferred();

        queue.enqueue(&mut store, FrameIndex(8), Priority::Low);
        queue.enqueue(&mut store, FrameIndex(9), Priority::Low);
        queue.enqueue(&mut store, FrameIndex(2), Priority::High);

        queue.process(&mut store, &mut fetcher, &m);
        assert_eq!(fetcher.started[0].0, FrameIndex(2));
        assert_eq!(fetcher.started[0].1, "seq/frame-003.jpg");
    }

    #[test]
    fn seed_window_puts_target_at_the_front() {
        let m = manifest(32);
        let mapper = ScrollMapper::new(32, 1);
        let mut store = FrameStore::new(32);
        let mut queue = LoadQueue::new(1);
        let mut fetcher = RecordingFetcher::deferred();

        queue.seed_window(&mut store, &mapper, FrameIndex(10), 2);
        queue.process(&mut store, &mut fetcher, &m);
        assert_eq!(fetcher.started[0].0, FrameIndex(10));
        // Window membership: 8..=12 queued or loading, nothing else touched.
        for i in 8..=12 {
            assert!(!store.is_untouched(FrameIndex(i)));
        }
        assert!(store.is_untouched(FrameIndex(7)));
        assert!(store.is_untouched(FrameIndex(13)));
    }

    #[test]
    fn seed_window_clips_at_track_bounds() {
        let m = manifest(8);
        let mapper = ScrollMapper::new(8, 1);
        let mut store = FrameStore::new(8);
        let mut queue = LoadQueue::new(8);
        let mut fetcher = RecordingFetcher::deferred();

        queue.seed_window(&mut store, &mapper, FrameIndex(0), 3);
        queue.seed_window(&mut store, &mapper, FrameIndex(7), 3);
        queue.process(&mut store, &mut fetcher, &m);
        assert_eq!(queue.active(), 8);
    }

    #[test]
    fn inline_outcomes_drain_the_whole_backlog() {
        let m = manifest(12);
        let mut store = FrameStore::new(12);
        let mut queue = LoadQueue::new(2);
        let mut fetcher = RecordingFetcher::inline();

        for i in 0..12 {
            queue.enqueue(&mut store, FrameIndex(i), Priority::Low);
        }
        queue.process(&mut store, &mut fetcher, &m);

        assert_eq!(store.loaded_count(), 12);
        assert_eq!(queue.active(), 0);
        assert_eq!(queue.pending_len(), 0);
    }

    #[test]
    fn clear_drops_parked_entries() {
        let m = manifest(12);
        let mut store = FrameStore::new(12);
        let mut queue = LoadQueue::new(1);
        let mut fetcher = RecordingFetcher::deferred();

        for i in 0..6 {
            queue.enqueue(&mut store, FrameIndex(i), Priority::Low);
        }
        queue.process(&mut store, &mut fetcher, &m);
        queue.clear();
        assert_eq!(queue.pending_len(), 0);

        // Nothing new is started after the clear.
        let started = fetcher.started.len();
        queue.process(&mut store, &mut fetcher, &m);
        assert_eq!(fetcher.started.len(), started);
    }
}
