use crate::{
    core::FrameIndex,
    error::{FilmstripError, FilmstripResult},
};

/// Naming contract for a pre-rendered frame set.
///
/// Frame assets are addressed as `{folder}/{prefix}-{NNN}.{ext}` where `NNN` is
/// the 1-based ordinal zero-padded to three digits. The convention must stay
/// bit-exact so an existing frame set can be dropped in unchanged.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SequenceManifest {
    /// Folder holding the frame files. Empty means the fetcher root itself.
    pub folder: String,
    /// File name prefix shared by every frame.
    pub prefix: String,
    /// File extension, without the dot.
    pub ext: String,
    /// Total number of frames in the sequence.
    pub frame_count: u32,
}

impl SequenceManifest {
    /// Create a validated manifest.
    pub fn new(
        folder: impl Into<String>,
        prefix: impl Into<String>,
        ext: impl Into<String>,
        frame_count: u32,
    ) -> FilmstripResult<Self> {
        let manifest = Self {
            folder: folder.into(),
            prefix: prefix.into(),
            ext: ext.into(),
            frame_count,
        };
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> FilmstripResult<()> {
        if self.frame_count == 0 {
            return Err(FilmstripError::validation("frame_count must be > 0"));
        }
        if self.prefix.is_empty() {
            return Err(FilmstripError::validation("prefix must be non-empty"));
        }
        if self.ext.is_empty() || self.ext.starts_with('.') {
            return Err(FilmstripError::validation(
                "ext must be non-empty and carry no leading dot",
            ));
        }
        Ok(())
    }

    /// Index of the final frame.
    pub fn last_frame(&self) -> FrameIndex {
        FrameIndex(self.frame_count - 1)
    }

    /// Resource locator for one frame.
    ///
    /// Pure and total over `[0, frame_count)`; the ordinal is `index + 1`.
    pub fn locator(&self, frame: FrameIndex) -> String {
        let ordinal = frame.0.saturating_add(1);
        let file = format!("{}-{:03}.{}", self.prefix, ordinal, self.ext);
        if self.folder.is_empty() {
            file
        } else {
            format!("{}/{}", self.folder, file)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(count: u32) -> SequenceManifest {
        SequenceManifest::new("sequence", "frame", "jpg", count).unwrap()
    }

    #[test]
    fn locator_is_one_based_and_zero_padded() {
        let m = manifest(300);
        assert_eq!(m.locator(FrameIndex(0)), "sequence/frame-001.jpg");
        assert_eq!(m.locator(FrameIndex(41)), "sequence/frame-042.jpg");
        assert_eq!(m.locator(FrameIndex(99)), "sequence/frame-100.jpg");
        assert_eq!(m.locator(FrameIndex(299)), "sequence/frame-300.jpg");
    }

    #[test]
    fn locator_without_folder_is_flat() {
        let m = SequenceManifest::new("", "shot", "png", 5).unwrap();
        assert_eq!(m.locator(FrameIndex(2)), "shot-003.png");
    }

    #[test]
    fn validation_rejects_bad_fields() {
        assert!(SequenceManifest::new("s", "frame", "jpg", 0).is_err());
        assert!(SequenceManifest::new("s", "", "jpg", 1).is_err());
        assert!(SequenceManifest::new("s", "frame", "", 1).is_err());
        assert!(SequenceManifest::new("s", "frame", ".jpg", 1).is_err());
    }
}
