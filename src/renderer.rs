use kurbo::Rect;

use crate::{
    assets::PreparedFrame,
    cache::FrameStore,
    composite::over,
    config::FitMode,
    core::FrameIndex,
    manifest::SequenceManifest,
    mapper::ScrollMapper,
};

/// Renderer-owned drawing surface, premultiplied RGBA8.
///
/// Untouched pixels stay transparent black so the host decides what shows
/// through letterbox bars.
#[derive(Clone, Debug)]
pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            data: vec![0; (width * height * 4) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        *self = Self::new(width, height);
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0; 4];
        }
        let at = ((y * self.width + x) * 4) as usize;
        [
            self.data[at],
            self.data[at + 1],
            self.data[at + 2],
            self.data[at + 3],
        ]
    }

    fn blend_pixel(&mut self, x: u32, y: u32, src: [u8; 4], opacity: f32) {
        let at = ((y * self.width + x) * 4) as usize;
        let dst = [
            self.data[at],
            self.data[at + 1],
            self.data[at + 2],
            self.data[at + 3],
        ];
        self.data[at..at + 4].copy_from_slice(&over(dst, src, opacity));
    }
}

/// Destination rectangle for an `iw x ih` frame on a `sw x sh` surface.
///
/// Contain letterboxes inside the surface; cover overflows it and gets
/// clipped at draw time. Both center the frame.
pub(crate) fn fit_rect(fit: FitMode, iw: u32, ih: u32, sw: u32, sh: u32) -> Rect {
    let (iw, ih) = (iw.max(1) as f64, ih.max(1) as f64);
    let (sw, sh) = (sw as f64, sh as f64);
    let scale = match fit {
        FitMode::Contain => (sw / iw).min(sh / ih),
        FitMode::Cover => (sw / iw).max(sh / ih),
    };
    let w = iw * scale;
    let h = ih * scale;
    let x = (sw - w) / 2.0;
    let y = (sh - h) / 2.0;
    Rect::new(x, y, x + w, y + h)
}

/// Nearest-neighbor scale-blit of `frame` into the surface at `opacity`.
fn draw_frame(surface: &mut Surface, frame: &PreparedFrame, fit: FitMode, opacity: f32) {
    if frame.width == 0 || frame.height == 0 || opacity <= 0.0 {
        return;
    }
    let rect = fit_rect(fit, frame.width, frame.height, surface.width, surface.height);
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return;
    }

    let x0 = rect.x0.max(0.0).floor() as u32;
    let y0 = rect.y0.max(0.0).floor() as u32;
    let x1 = (rect.x1.min(f64::from(surface.width)).ceil() as u32).min(surface.width);
    let y1 = (rect.y1.min(f64::from(surface.height)).ceil() as u32).min(surface.height);

    let sx_per_px = f64::from(frame.width) / rect.width();
    let sy_per_px = f64::from(frame.height) / rect.height();

    for dy in y0..y1 {
        let sy = ((f64::from(dy) + 0.5 - rect.y0) * sy_per_px) as u32;
        let sy = sy.min(frame.height - 1);
        for dx in x0..x1 {
            let sx = ((f64::from(dx) + 0.5 - rect.x0) * sx_per_px) as u32;
            let sx = sx.min(frame.width - 1);
            surface.blend_pixel(dx, dy, frame.pixel(sx, sy), opacity);
        }
    }
}

/// Direct element-swap strategy.
///
/// Resolves the locator the host should assign to its displayed image,
/// guarded so an unchanged frame is never reassigned (avoids flicker and a
/// redundant decode on the host side).
#[derive(Clone, Debug, Default)]
pub struct DirectSwapRenderer {
    current: Option<FrameIndex>,
}

impl DirectSwapRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last locator handed to the host, if any.
    pub fn current_locator(&self, manifest: &SequenceManifest) -> Option<String> {
        self.current.map(|f| manifest.locator(f))
    }

    /// Pick the target (or nearest loaded fallback) and return its locator,
    /// or None when unchanged or nothing has loaded yet.
    pub fn render(
        &mut self,
        target: FrameIndex,
        store: &FrameStore,
        manifest: &SequenceManifest,
    ) -> Option<String> {
        let pick = if store.is_loaded(target) {
            target
        } else {
            store.nearest_loaded(target)?
        };
        if self.current == Some(pick) {
            return None;
        }
        self.current = Some(pick);
        Some(manifest.locator(pick))
    }
}

/// Canvas cross-fade strategy.
///
/// Owns the continuous render position and the pixel surface. Each tick the
/// position eases toward the target, the surrounding retained pair is
/// blended, and missing frames degrade to the nearest loaded one.
pub struct CrossfadeRenderer {
    surface: Surface,
    render_pos: f64,
    smoothing: f64,
    fit: FitMode,
    poster_superseded: bool,
}

impl CrossfadeRenderer {
    pub fn new(width: u32, height: u32, smoothing: f64, fit: FitMode) -> Self {
        Self {
            surface: Surface::new(width, height),
            render_pos: 0.0,
            smoothing: smoothing.clamp(f64::MIN_POSITIVE, 1.0),
            fit,
            poster_superseded: false,
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn render_pos(&self) -> f64 {
        self.render_pos
    }

    /// True once the first frame has been painted; the host then hides the
    /// static poster image so the surface takes over without a flash.
    pub fn poster_superseded(&self) -> bool {
        self.poster_superseded
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface.resize(width, height);
    }

    /// Advance the easing toward `target` and repaint. Returns whether any
    /// frame was drawn.
    pub fn tick(&mut self, target: f64, mapper: &ScrollMapper, store: &FrameStore) -> bool {
        let last = f64::from(mapper.last());
        let target = if target.is_nan() {
            0.0
        } else {
            target.clamp(0.0, last)
        };
        self.render_pos += (target - self.render_pos) * self.smoothing;
        self.render_pos = self.render_pos.clamp(0.0, last);
        self.paint(mapper, store)
    }

    /// Repaint at the current position without advancing the easing (used
    /// after resizes and geometry refreshes).
    pub fn repaint(&mut self, mapper: &ScrollMapper, store: &FrameStore) -> bool {
        self.paint(mapper, store)
    }

    fn paint(&mut self, mapper: &ScrollMapper, store: &FrameStore) -> bool {
        let (base, next, mix) = mapper.blend_pair(self.render_pos);
        let base_handle = store.handle(base);
        let next_handle = store.handle(next);

        self.surface.clear();
        let drew = match (base_handle, next_handle) {
            (Some(a), Some(b)) if base != next => {
                draw_frame(&mut self.surface, &a, self.fit, (1.0 - mix) as f32);
                draw_frame(&mut self.surface, &b, self.fit, mix as f32);
                true
            }
            // Without both frames present no blend is attempted: whichever
            // side loaded is drawn alone at full opacity.
            (Some(a), _) => {
                draw_frame(&mut self.surface, &a, self.fit, 1.0);
                true
            }
            (None, Some(b)) => {
                draw_frame(&mut self.surface, &b, self.fit, 1.0);
                true
            }
            (None, None) => {
                let probe = FrameIndex(self.render_pos.round() as u32);
                match store.nearest_loaded(probe).and_then(|f| store.handle(f)) {
                    Some(fallback) => {
                        draw_frame(&mut self.surface, &fallback, self.fit, 1.0);
                        true
                    }
                    None => false,
                }
            }
        };
        if drew {
            self.poster_superseded = true;
        }
        drew
    }
}
