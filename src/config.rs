use crate::error::{FilmstripError, FilmstripResult};

/// Viewport width at or below which the host counts as a mobile device.
pub const MOBILE_BREAKPOINT_PX: u32 = 768;

/// Effective connection type reported by the host at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ConnectionClass {
    Slow2g,
    TwoG,
    ThreeG,
    FourG,
    Unknown,
}

impl ConnectionClass {
    /// Connections slow enough that fewer, smaller fetches are warranted.
    pub fn is_constrained(self) -> bool {
        matches!(self, Self::Slow2g | Self::TwoG | Self::ThreeG)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DeviceClass {
    Mobile,
    Desktop,
}

/// Fit applied when drawing a frame into the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FitMode {
    /// Letterbox: the whole frame is visible, unused area stays transparent.
    Contain,
    /// Crop-to-fill: the frame covers the surface, overflow is clipped.
    Cover,
}

/// Environment signals sampled exactly once, at player construction.
///
/// These are never polled again; changing them requires a rebuild.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct HostProfile {
    pub viewport_width_px: u32,
    pub save_data: bool,
    pub connection: ConnectionClass,
    pub reduced_motion: bool,
}

impl HostProfile {
    pub fn device_class(&self) -> DeviceClass {
        if self.viewport_width_px <= MOBILE_BREAKPOINT_PX {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        }
    }

    /// True when either the user asked to save data or the connection is slow.
    pub fn is_constrained(&self) -> bool {
        self.save_data || self.connection.is_constrained()
    }
}

/// Immutable per-session playback tuning.
///
/// Derived once from the [`HostProfile`] at construction and never mutated; a
/// rebuild constructs a fresh value. Every downstream component receives the
/// relevant fields explicitly instead of reading ambient state.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct Tuning {
    /// Maximum simultaneously active frame fetches.
    pub concurrency: usize,
    /// Neighboring frames eagerly queued around the current target.
    pub prefetch_radius: u32,
    /// Step between retained frame indices; 1 keeps every frame.
    pub stride: u32,
    /// Easing factor toward the target each tick; 1.0 snaps instantly.
    pub smoothing: f64,
    /// Scroll track height in viewport-height units.
    pub scroll_track_vh: u32,
    /// Upper bound applied to the host device pixel ratio.
    pub device_pixel_ratio_cap: f64,
    /// Frames released per background warm-up chunk.
    pub warmup_chunk: u32,
    /// Ticks between warm-up chunk releases.
    pub warmup_interval_ticks: u32,
    /// Scroll progress that starts the warm-up stream; 0 starts it at bind.
    pub warmup_lazy_threshold: f64,
    /// Scroll progress past which the one-shot reveal fires.
    pub reveal_threshold: f64,
    pub fit_mode: FitMode,
}

impl Tuning {
    /// Derive session tuning from the startup environment signals.
    pub fn derive(profile: &HostProfile) -> Self {
        let mobile = profile.device_class() == DeviceClass::Mobile;
        let constrained = profile.is_constrained();
        let very_slow = profile.save_data
            || matches!(
                profile.connection,
                ConnectionClass::Slow2g | ConnectionClass::TwoG
            );

        Self {
            concurrency: if constrained {
                2
            } else if mobile {
                4
            } else {
                6
            },
            prefetch_radius: if constrained {
                2
            } else if mobile {
                4
            } else {
                6
            },
            stride: if very_slow {
                3
            } else if constrained {
                2
            } else {
                1
            },
            smoothing: if profile.reduced_motion {
                1.0
            } else if mobile {
                0.18
            } else {
                0.12
            },
            scroll_track_vh: if mobile { 260 } else { 400 },
            device_pixel_ratio_cap: if mobile { 1.5 } else { 2.0 },
            warmup_chunk: if constrained { 4 } else { 8 },
            warmup_interval_ticks: if constrained { 24 } else { 10 },
            warmup_lazy_threshold: if constrained { 0.02 } else { 0.0 },
            reveal_threshold: 0.12,
            fit_mode: if mobile { FitMode::Cover } else { FitMode::Contain },
        }
    }

    pub fn validate(&self) -> FilmstripResult<()> {
        if self.concurrency == 0 {
            return Err(FilmstripError::validation("concurrency must be > 0"));
        }
        if self.stride == 0 {
            return Err(FilmstripError::validation("stride must be > 0"));
        }
        if !self.smoothing.is_finite() || self.smoothing <= 0.0 || self.smoothing > 1.0 {
            return Err(FilmstripError::validation("smoothing must be in (0, 1]"));
        }
        if self.scroll_track_vh == 0 {
            return Err(FilmstripError::validation("scroll_track_vh must be > 0"));
        }
        if !self.device_pixel_ratio_cap.is_finite() || self.device_pixel_ratio_cap <= 0.0 {
            return Err(FilmstripError::validation(
                "device_pixel_ratio_cap must be finite and > 0",
            ));
        }
        if self.warmup_chunk == 0 {
            return Err(FilmstripError::validation("warmup_chunk must be > 0"));
        }
        for (name, v) in [
            ("warmup_lazy_threshold", self.warmup_lazy_threshold),
            ("reveal_threshold", self.reveal_threshold),
        ] {
            if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                return Err(FilmstripError::validation(format!(
                    "{name} must be in [0, 1]"
                )));
            }
        }
        Ok(())
    }
}
