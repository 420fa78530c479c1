use crate::{
    cache::FrameStore,
    config::{HostProfile, Tuning},
    core::{FrameIndex, Viewport},
    error::FilmstripResult,
    fetch::{FetchOutcome, FrameFetcher},
    manifest::SequenceManifest,
    mapper::ScrollMapper,
    queue::{LoadQueue, Priority},
    renderer::{CrossfadeRenderer, DirectSwapRenderer, Surface},
};

/// Which rendering strategy the player drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderStrategy {
    /// Swap the displayed image's resource reference per discrete target.
    DirectSwap,
    /// Ease a continuous position and cross-fade on an owned surface.
    Crossfade,
}

/// Host anchors the player requires. Both must be present; a missing anchor
/// degrades the whole player to a permanent no-op instead of failing.
#[derive(Clone, Debug, Default)]
pub struct StageAnchors {
    /// Scrollable spacer whose height the player dictates.
    pub spacer: Option<String>,
    /// Container holding the displayed image and the injected surface.
    pub container: Option<String>,
}

impl StageAnchors {
    pub fn new(spacer: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            spacer: Some(spacer.into()),
            container: Some(container.into()),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.spacer.is_some() && self.container.is_some()
    }
}

/// Player lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Required anchors were missing at construction; permanently inactive.
    Inert,
    Constructed,
    Bound,
    Active,
    Destroyed,
}

enum RendererKind {
    Direct(DirectSwapRenderer),
    Crossfade(CrossfadeRenderer),
}

/// Low-priority background stream over the retained grid.
struct WarmupStream {
    slot: u32,
    countdown: u32,
    started: bool,
    done: bool,
}

impl WarmupStream {
    fn new() -> Self {
        Self {
            slot: 0,
            countdown: 0,
            started: false,
            done: false,
        }
    }
}

/// Orchestrates the scroll -> mapper -> queue -> cache -> renderer pipeline.
///
/// Sans-IO: the host delivers scroll offsets, animation ticks, resize events,
/// and deferred fetch outcomes; the player owns every other moving part for
/// its lifetime. All frame-level failures stay inside: playback degrades to
/// the nearest loaded frame, never to a visible error.
pub struct SequencePlayer {
    phase: Phase,
    manifest: SequenceManifest,
    profile: HostProfile,
    tuning: Tuning,
    strategy: RenderStrategy,
    mapper: ScrollMapper,
    store: FrameStore,
    queue: LoadQueue,
    fetcher: Box<dyn FrameFetcher>,
    renderer: RendererKind,
    viewport: Option<Viewport>,
    track_height_px: f64,
    last_scroll_y: f64,
    progress: f64,
    target_float: f64,
    target_discrete: FrameIndex,
    warmup: WarmupStream,
    reveal_fired: bool,
    reveal_hook: Option<Box<dyn FnMut()>>,
}

impl SequencePlayer {
    /// Construct with tuning derived from the host profile.
    pub fn new(
        manifest: SequenceManifest,
        profile: HostProfile,
        anchors: StageAnchors,
        strategy: RenderStrategy,
        fetcher: Box<dyn FrameFetcher>,
    ) -> FilmstripResult<Self> {
        let tuning = Tuning::derive(&profile);
        Self::with_tuning(manifest, profile, tuning, anchors, strategy, fetcher)
    }

    /// Construct with explicit tuning (tests, embedders with their own knobs).
    pub fn with_tuning(
        manifest: SequenceManifest,
        profile: HostProfile,
        tuning: Tuning,
        anchors: StageAnchors,
        strategy: RenderStrategy,
        fetcher: Box<dyn FrameFetcher>,
    ) -> FilmstripResult<Self> {
        manifest.validate()?;
        tuning.validate()?;

        let phase = if anchors.is_complete() {
            Phase::Constructed
        } else {
            Phase::Inert
        };
        let mapper = ScrollMapper::new(manifest.frame_count, tuning.stride);
        let store = FrameStore::new(manifest.frame_count);
        let queue = LoadQueue::new(tuning.concurrency);
        let renderer = build_renderer(strategy, &tuning);

        Ok(Self {
            phase,
            manifest,
            profile,
            tuning,
            strategy,
            mapper,
            store,
            queue,
            fetcher,
            renderer,
            viewport: None,
            track_height_px: 0.0,
            last_scroll_y: 0.0,
            progress: 0.0,
            target_float: 0.0,
            target_discrete: FrameIndex(0),
            warmup: WarmupStream::new(),
            reveal_fired: false,
            reveal_hook: None,
        })
    }

    /// Attach host geometry and start loading around the first frame.
    ///
    /// Maps to registering the scroll/resize listeners: afterwards the host
    /// feeds `on_scroll` / `on_tick` / `on_resize`.
    pub fn bind(&mut self, viewport: Viewport) {
        if self.phase != Phase::Constructed {
            return;
        }
        self.apply_viewport(viewport);
        if self.tuning.warmup_lazy_threshold <= 0.0 {
            self.warmup.started = true;
        }
        self.phase = Phase::Bound;
        self.retarget(self.last_scroll_y);
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Height the host must give the scroll spacer, in pixels.
    pub fn track_height_px(&self) -> f64 {
        self.track_height_px
    }

    /// Scrollable extent: track height minus viewport height, floored at 1.
    pub fn scroll_extent(&self) -> f64 {
        match self.viewport {
            Some(vp) => (self.track_height_px - f64::from(vp.height_px)).max(1.0),
            None => 1.0,
        }
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn target_frame(&self) -> FrameIndex {
        self.target_discrete
    }

    /// Continuous render position, when cross-fading.
    pub fn render_pos(&self) -> Option<f64> {
        match &self.renderer {
            RendererKind::Crossfade(r) => Some(r.render_pos()),
            RendererKind::Direct(_) => None,
        }
    }

    /// The composited surface, when cross-fading.
    pub fn surface(&self) -> Option<&Surface> {
        match &self.renderer {
            RendererKind::Crossfade(r) => Some(r.surface()),
            RendererKind::Direct(_) => None,
        }
    }

    /// Locator the host should currently display, when direct-swapping.
    pub fn display_locator(&self) -> Option<String> {
        match &self.renderer {
            RendererKind::Direct(r) => r.current_locator(&self.manifest),
            RendererKind::Crossfade(_) => None,
        }
    }

    /// True once the surface has painted and the static poster can be hidden.
    pub fn poster_superseded(&self) -> bool {
        match &self.renderer {
            RendererKind::Crossfade(r) => r.poster_superseded(),
            RendererKind::Direct(_) => false,
        }
    }

    pub fn store(&self) -> &FrameStore {
        &self.store
    }

    pub fn active_loads(&self) -> usize {
        self.queue.active()
    }

    pub fn pending_loads(&self) -> usize {
        self.queue.pending_len()
    }

    /// One-shot hook fired the first time progress exceeds the reveal
    /// threshold; later crossings are no-ops.
    pub fn set_reveal_hook(&mut self, hook: impl FnMut() + 'static) {
        self.reveal_hook = Some(Box::new(hook));
    }

    /// Scroll event: recompute targets, refresh queue priorities, render.
    pub fn on_scroll(&mut self, scroll_y: f64) {
        if !self.interactive() {
            return;
        }
        self.phase = Phase::Active;
        self.retarget(scroll_y);
    }

    /// Animation tick: advance easing, repaint, pace the warm-up stream.
    pub fn on_tick(&mut self) {
        if !self.interactive() {
            return;
        }
        if let RendererKind::Crossfade(r) = &mut self.renderer {
            r.tick(self.target_float, &self.mapper, &self.store);
        }
        self.warmup_tick();
    }

    /// Resize event: recompute track height and surface dimensions, then
    /// force a re-render at the (possibly changed) target.
    pub fn on_resize(&mut self, viewport: Viewport) {
        if !self.interactive() {
            return;
        }
        self.apply_viewport(viewport);
        self.retarget(self.last_scroll_y);
        if let RendererKind::Crossfade(r) = &mut self.renderer {
            r.repaint(&self.mapper, &self.store);
        }
    }

    /// Outcome of a fetch the host's transport resolved asynchronously.
    pub fn complete_load(&mut self, frame: FrameIndex, outcome: FetchOutcome) {
        if !self.interactive() {
            return;
        }
        self.queue.complete(
            &mut self.store,
            self.fetcher.as_mut(),
            &self.manifest,
            frame,
            outcome,
        );
        if let RendererKind::Direct(r) = &mut self.renderer
            && frame == self.target_discrete
        {
            r.render(self.target_discrete, &self.store, &self.manifest);
        }
    }

    /// Recompute layout-dependent geometry after external DOM changes.
    pub fn refresh(&mut self) {
        if !self.interactive() {
            return;
        }
        if let Some(viewport) = self.viewport {
            self.on_resize(viewport);
        }
    }

    /// Tear everything down. Idempotent; every later event is a no-op.
    pub fn destroy(&mut self) {
        if matches!(self.phase, Phase::Destroyed | Phase::Inert) {
            return;
        }
        self.phase = Phase::Destroyed;
        self.queue.clear();
        self.warmup.done = true;
        self.reveal_hook = None;
        tracing::debug!("sequence player destroyed");
    }

    /// Destroy, then reconstruct fresh state under the existing tuning. The
    /// previously bound viewport is re-bound automatically.
    pub fn rebuild(&mut self) {
        let (profile, tuning) = (self.profile, self.tuning);
        self.rebuild_with(profile, tuning);
    }

    /// Rebuild with newly sampled environment signals; this is the only way
    /// the session tuning ever changes.
    pub fn rebuild_with_profile(&mut self, profile: HostProfile) {
        self.rebuild_with(profile, Tuning::derive(&profile));
    }

    fn rebuild_with(&mut self, profile: HostProfile, tuning: Tuning) {
        if self.phase == Phase::Inert {
            return;
        }
        self.destroy();

        self.profile = profile;
        self.tuning = tuning;
        self.mapper = ScrollMapper::new(self.manifest.frame_count, self.tuning.stride);
        self.store = FrameStore::new(self.manifest.frame_count);
        self.queue = LoadQueue::new(self.tuning.concurrency);
        self.renderer = build_renderer(self.strategy, &self.tuning);
        self.warmup = WarmupStream::new();
        self.reveal_fired = false;
        self.last_scroll_y = 0.0;
        self.progress = 0.0;
        self.target_float = 0.0;
        self.target_discrete = FrameIndex(0);
        self.phase = Phase::Constructed;

        if let Some(viewport) = self.viewport.take() {
            self.bind(viewport);
        }
    }

    fn interactive(&self) -> bool {
        matches!(self.phase, Phase::Bound | Phase::Active)
    }

    fn apply_viewport(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport);
        self.track_height_px =
            f64::from(viewport.height_px) * f64::from(self.tuning.scroll_track_vh) / 100.0;
        if let RendererKind::Crossfade(r) = &mut self.renderer {
            let dpr = viewport
                .device_pixel_ratio
                .min(self.tuning.device_pixel_ratio_cap);
            let width = (f64::from(viewport.width_px) * dpr).round().max(1.0) as u32;
            let height = (f64::from(viewport.height_px) * dpr).round().max(1.0) as u32;
            r.resize(width, height);
        }
    }

    fn retarget(&mut self, scroll_y: f64) {
        self.last_scroll_y = scroll_y;
        let progress = ScrollMapper::progress(scroll_y, self.scroll_extent());
        self.progress = progress;
        self.target_float = self.mapper.target_float(progress);
        self.target_discrete = self.mapper.target_discrete(progress);

        self.queue.seed_window(
            &mut self.store,
            &self.mapper,
            self.target_discrete,
            self.tuning.prefetch_radius,
        );
        self.queue
            .process(&mut self.store, self.fetcher.as_mut(), &self.manifest);

        if !self.warmup.started && progress > self.tuning.warmup_lazy_threshold {
            self.warmup.started = true;
        }
        if !self.reveal_fired && progress > self.tuning.reveal_threshold {
            self.reveal_fired = true;
            if let Some(hook) = self.reveal_hook.as_mut() {
                hook();
            }
        }

        if let RendererKind::Direct(r) = &mut self.renderer {
            r.render(self.target_discrete, &self.store, &self.manifest);
        }
    }

    fn warmup_tick(&mut self) {
        if !self.warmup.started || self.warmup.done {
            return;
        }
        if self.store.all_settled() {
            self.warmup.done = true;
            return;
        }
        if self.warmup.countdown > 0 {
            self.warmup.countdown -= 1;
            return;
        }
        self.warmup.countdown = self.tuning.warmup_interval_ticks;

        let mut released = 0;
        while released < self.tuning.warmup_chunk {
            let Some(frame) = self.mapper.grid_index(self.warmup.slot) else {
                // Every retained index has been requested at least once.
                self.warmup.done = true;
                break;
            };
            self.warmup.slot += 1;
            if self.store.is_untouched(frame)
                && self.queue.enqueue(&mut self.store, frame, Priority::Low)
            {
                released += 1;
            }
        }
        if released > 0 {
            self.queue
                .process(&mut self.store, self.fetcher.as_mut(), &self.manifest);
        }
    }
}

fn build_renderer(strategy: RenderStrategy, tuning: &Tuning) -> RendererKind {
    match strategy {
        RenderStrategy::DirectSwap => RendererKind::Direct(DirectSwapRenderer::new()),
        RenderStrategy::Crossfade => RendererKind::Crossfade(CrossfadeRenderer::new(
            1,
            1,
            tuning.smoothing,
            tuning.fit_mode,
        )),
    }
}
