#![forbid(unsafe_code)]

pub mod assets;
pub mod cache;
pub mod composite;
pub mod config;
pub mod core;
pub mod error;
pub mod fetch;
pub mod manifest;
pub mod mapper;
pub mod player;
pub mod queue;
pub mod renderer;

pub use assets::PreparedFrame;
pub use cache::{FrameHandle, FrameState, FrameStore};
pub use config::{ConnectionClass, DeviceClass, FitMode, HostProfile, Tuning};
pub use core::{FrameIndex, Viewport};
pub use error::{FilmstripError, FilmstripResult};
pub use fetch::{FetchOutcome, FrameFetcher, FsFrameFetcher};
pub use manifest::SequenceManifest;
pub use mapper::ScrollMapper;
pub use player::{Phase, RenderStrategy, SequencePlayer, StageAnchors};
pub use queue::{LoadQueue, Priority};
pub use renderer::{CrossfadeRenderer, DirectSwapRenderer, Surface};
