use std::path::PathBuf;

use crate::{assets::PreparedFrame, core::FrameIndex};

/// Result of one frame fetch.
#[derive(Clone, Debug)]
pub enum FetchOutcome {
    /// Raw encoded bytes; the engine decodes them itself.
    Bytes(Vec<u8>),
    /// Host-decoded pixels, ready to draw.
    Decoded(PreparedFrame),
    /// Permanent failure for this index.
    Failed,
}

/// Boundary to the host's frame transport.
///
/// `start` must not block on slow transports: return `None` and deliver the
/// outcome later through [`crate::player::SequencePlayer::complete_load`].
/// Synchronous hosts may resolve inline by returning `Some`. For a given index
/// at most one fetch is ever started before its outcome arrives; a started
/// fetch is never cancelled.
pub trait FrameFetcher {
    fn start(&mut self, frame: FrameIndex, locator: &str) -> Option<FetchOutcome>;
}

/// Filesystem-backed fetcher resolving locators under a root directory.
///
/// Resolves every fetch inline; a missing or unreadable file is a permanent
/// failure, mirroring a 404 on a hosted frame set.
#[derive(Clone, Debug)]
pub struct FsFrameFetcher {
    root: PathBuf,
}

impl FsFrameFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FrameFetcher for FsFrameFetcher {
    fn start(&mut self, _frame: FrameIndex, locator: &str) -> Option<FetchOutcome> {
        Some(match std::fs::read(self.root.join(locator)) {
            Ok(bytes) => FetchOutcome::Bytes(bytes),
            Err(_) => FetchOutcome::Failed,
        })
    }
}
