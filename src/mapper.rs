use crate::core::{FrameIndex, clamp_progress};

/// Maps normalized scroll progress onto the frame grid.
///
/// Built once from the sequence length and the session stride; stateless
/// afterwards. With a stride `S > 1` only every S-th frame (plus the final
/// frame) is retained: targets, blends, and fetches all stay on that grid so a
/// constrained session never touches the skipped frames.
#[derive(Clone, Copy, Debug)]
pub struct ScrollMapper {
    frame_count: u32,
    stride: u32,
}

impl ScrollMapper {
    pub fn new(frame_count: u32, stride: u32) -> Self {
        Self {
            frame_count: frame_count.max(1),
            stride: stride.max(1),
        }
    }

    /// Index of the final frame.
    pub fn last(&self) -> u32 {
        self.frame_count - 1
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Normalized progress for a scroll offset over a scrollable extent.
    ///
    /// The extent is floored at one pixel, so a zero-height track reads as
    /// progress 0 rather than dividing by zero.
    pub fn progress(scroll_y: f64, extent_px: f64) -> f64 {
        clamp_progress(scroll_y / extent_px.max(1.0))
    }

    /// Continuous target position in `[0, frame_count - 1]`.
    pub fn target_float(&self, progress: f64) -> f64 {
        clamp_progress(progress) * f64::from(self.last())
    }

    /// Number of retained frames under the configured stride.
    pub fn retained_count(&self) -> u32 {
        self.frame_count.div_ceil(self.stride)
    }

    /// Discrete, stride-aligned target frame.
    ///
    /// The final frame is forced exactly at `progress >= 1` even when it does
    /// not sit on the stride grid.
    pub fn target_discrete(&self, progress: f64) -> FrameIndex {
        let p = clamp_progress(progress);
        if p >= 1.0 {
            return FrameIndex(self.last());
        }
        let retained = self.retained_count();
        let slot = (p * f64::from(retained - 1)).round() as u32;
        FrameIndex((slot * self.stride).min(self.last()))
    }

    /// Number of retained indices: every stride multiple, plus the final
    /// frame when it falls off the grid.
    pub fn grid_len(&self) -> u32 {
        let retained = self.retained_count();
        if self.last().is_multiple_of(self.stride) {
            retained
        } else {
            retained + 1
        }
    }

    /// Retained index at `slot`, in ascending order.
    pub fn grid_index(&self, slot: u32) -> Option<FrameIndex> {
        if slot >= self.grid_len() {
            return None;
        }
        Some(FrameIndex((slot * self.stride).min(self.last())))
    }

    /// The retained pair surrounding a continuous position, with the blend
    /// weight toward the later frame.
    ///
    /// Blending only ever happens between two retained frames; with stride 1
    /// this is the plain `floor`/`floor + 1` pair and the fractional part.
    pub fn blend_pair(&self, pos: f64) -> (FrameIndex, FrameIndex, f64) {
        let last = f64::from(self.last());
        let pos = if pos.is_nan() { 0.0 } else { pos.clamp(0.0, last) };

        let base = (((pos / f64::from(self.stride)).floor() as u32) * self.stride).min(self.last());
        let next = if base + self.stride <= self.last() {
            base + self.stride
        } else {
            self.last()
        };

        let span = f64::from(next - base);
        let mix = if span <= 0.0 {
            0.0
        } else {
            ((pos - f64::from(base)) / span).clamp(0.0, 1.0)
        };
        (FrameIndex(base), FrameIndex(next), mix)
    }
}
