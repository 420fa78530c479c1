pub type FilmstripResult<T> = Result<T, FilmstripError>;

#[derive(thiserror::Error, Debug)]
pub enum FilmstripError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("geometry error: {0}")]
    Geometry(String),

    #[error("fetch error: {0}")]
    Fetch(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FilmstripError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            FilmstripError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            FilmstripError::geometry("x")
                .to_string()
                .contains("geometry error:")
        );
        assert!(
            FilmstripError::fetch("x")
                .to_string()
                .contains("fetch error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = FilmstripError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
