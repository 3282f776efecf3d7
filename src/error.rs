use thiserror::Error;

/// Everything that can go wrong while reconciling one building.
///
/// Only [`ReconcileError::Config`] and [`ReconcileError::Auth`] escape the
/// engine. The rest are absorbed by the resolver (skip the endpoint) or the
/// paginator (skip the page).
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("upstream rejected credentials: {0}")]
    Auth(String),
    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),
    #[error("upstream returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("page {page} failed: {source}")]
    PageFetch {
        page: u32,
        #[source]
        source: Box<ReconcileError>,
    },
}

impl ReconcileError {
    /// Fatal errors abort the whole resolution; no further candidates are tried.
    pub fn is_fatal(&self) -> bool {
        match self {
            ReconcileError::Config(_) | ReconcileError::Auth(_) => true,
            ReconcileError::PageFetch { source, .. } => source.is_fatal(),
            _ => false,
        }
    }

    pub fn page_fetch(page: u32, source: ReconcileError) -> Self {
        ReconcileError::PageFetch {
            page,
            source: Box::new(source),
        }
    }
}
