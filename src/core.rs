use crate::error::{FilmstripError, FilmstripResult};

/// Absolute 0-based index into the frame sequence.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u32);

/// Host viewport geometry, sampled at bind time and on resize events.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    /// Width in CSS pixels.
    pub width_px: u32,
    /// Height in CSS pixels.
    pub height_px: u32,
    /// Physical-to-CSS pixel ratio reported by the host.
    pub device_pixel_ratio: f64,
}

impl Viewport {
    /// Create a validated viewport.
    pub fn new(width_px: u32, height_px: u32, device_pixel_ratio: f64) -> FilmstripResult<Self> {
        if width_px == 0 || height_px == 0 {
            return Err(FilmstripError::geometry("viewport dimensions must be > 0"));
        }
        if !device_pixel_ratio.is_finite() || device_pixel_ratio <= 0.0 {
            return Err(FilmstripError::geometry(
                "device_pixel_ratio must be finite and > 0",
            ));
        }
        Ok(Self {
            width_px,
            height_px,
            device_pixel_ratio,
        })
    }
}

/// Clamp a scroll progress value into `[0, 1]`. NaN maps to 0.
pub fn clamp_progress(p: f64) -> f64 {
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}
