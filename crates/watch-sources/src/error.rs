use thiserror::Error;

/// Failure of a single catalog request.
///
/// `NotFound` is the expected "no usable answer" outcome; the rest are transport or
/// protocol problems. Callers doing batch work treat all of them as a per-item failure.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no catalog entry for '{title}'")]
    NotFound { title: String },

    #[error("catalog returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("catalog request failed: {0}")]
    Transport(String),

    #[error("could not decode catalog response: {0}")]
    Decode(String),

    #[error("catalog does not support {0}")]
    Unsupported(&'static str),

    #[error("catalog API key is not configured")]
    MissingApiKey,
}

impl CatalogError {
    pub fn not_found(title: &str) -> Self {
        CatalogError::NotFound { title: title.to_string() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound { .. })
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CatalogError::Decode(err.to_string())
        } else {
            CatalogError::Transport(err.to_string())
        }
    }
}
