use std::sync::Arc;

use crate::{assets::PreparedFrame, core::FrameIndex};

/// Shared handle to one decoded frame.
pub type FrameHandle = Arc<PreparedFrame>;

/// Loading state of one frame index.
///
/// Every index is in exactly one state. `Loaded` and `Failed` are terminal: a
/// settled index never transitions again and is never fetched again.
#[derive(Clone, Debug, Default)]
pub enum FrameState {
    #[default]
    Unrequested,
    Queued,
    Loading,
    Loaded(FrameHandle),
    Failed,
}

impl FrameState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Loaded(_) | Self::Failed)
    }

    /// Queued or in flight.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Queued | Self::Loading)
    }
}

/// Dense per-index state table plus decoded handles.
///
/// One table holds both scheduling state and pixels, so no two bookkeeping
/// structures can disagree about an index. Retention is full-session: nothing
/// is ever evicted (bounded by the known frame count).
#[derive(Clone, Debug)]
pub struct FrameStore {
    states: Vec<FrameState>,
    loaded: usize,
    settled: usize,
}

impl FrameStore {
    pub fn new(frame_count: u32) -> Self {
        let mut states = Vec::new();
        states.resize_with(frame_count.max(1) as usize, FrameState::default);
        Self {
            states,
            loaded: 0,
            settled: 0,
        }
    }

    pub fn frame_count(&self) -> u32 {
        self.states.len() as u32
    }

    pub fn state(&self, frame: FrameIndex) -> &FrameState {
        static OUT_OF_RANGE: FrameState = FrameState::Failed;
        self.states.get(frame.0 as usize).unwrap_or(&OUT_OF_RANGE)
    }

    pub fn is_loaded(&self, frame: FrameIndex) -> bool {
        matches!(self.state(frame), FrameState::Loaded(_))
    }

    pub fn is_untouched(&self, frame: FrameIndex) -> bool {
        matches!(self.state(frame), FrameState::Unrequested)
    }

    pub fn is_loading(&self, frame: FrameIndex) -> bool {
        matches!(self.state(frame), FrameState::Loading)
    }

    pub fn handle(&self, frame: FrameIndex) -> Option<FrameHandle> {
        match self.state(frame) {
            FrameState::Loaded(handle) => Some(handle.clone()),
            _ => None,
        }
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded
    }

    pub fn settled_count(&self) -> usize {
        self.settled
    }

    /// True once every index is terminal; the warm-up stream may stop.
    pub fn all_settled(&self) -> bool {
        self.settled == self.states.len()
    }

    /// Unrequested -> Queued. Returns false (and does nothing) from any other
    /// state, which is what makes duplicate enqueues no-ops.
    pub(crate) fn mark_queued(&mut self, frame: FrameIndex) -> bool {
        match self.states.get_mut(frame.0 as usize) {
            Some(state @ FrameState::Unrequested) => {
                *state = FrameState::Queued;
                true
            }
            _ => false,
        }
    }

    /// Queued -> Loading. Returns false for stale or out-of-range entries.
    pub(crate) fn mark_loading(&mut self, frame: FrameIndex) -> bool {
        match self.states.get_mut(frame.0 as usize) {
            Some(state @ FrameState::Queued) => {
                *state = FrameState::Loading;
                true
            }
            _ => false,
        }
    }

    /// Loading -> Loaded / Failed. Terminal states are left untouched.
    pub(crate) fn settle(&mut self, frame: FrameIndex, handle: Option<FrameHandle>) {
        let Some(state) = self.states.get_mut(frame.0 as usize) else {
            return;
        };
        if !matches!(state, FrameState::Loading) {
            return;
        }
        *state = match handle {
            Some(handle) => {
                self.loaded += 1;
                FrameState::Loaded(handle)
            }
            None => FrameState::Failed,
        };
        self.settled += 1;
    }

    /// Closest loaded index scanning backward from `target` to 0, else the
    /// closest one scanning forward. None when nothing has loaded yet.
    pub fn nearest_loaded(&self, target: FrameIndex) -> Option<FrameIndex> {
        if self.loaded == 0 {
            return None;
        }
        let start = (target.0 as usize).min(self.states.len() - 1);
        for i in (0..=start).rev() {
            if matches!(self.states[i], FrameState::Loaded(_)) {
                return Some(FrameIndex(i as u32));
            }
        }
        for (offset, state) in self.states[start + 1..].iter().enumerate() {
            if matches!(state, FrameState::Loaded(_)) {
                return Some(FrameIndex((start + 1 + offset) as u32));
            }
        }
        None
    }
}
