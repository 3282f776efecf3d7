//! Building-register floor reconciliation.
//!
//! Pulls the paginated floor outline for one building from the first usable
//! registry endpoint, then folds the rows into one exact-area record per floor:
//! endpoint resolution → pagination → normalize → merge → assemble.

pub mod assemble;
pub mod config;
pub mod decimal;
pub mod envelope;
pub mod error;
pub mod floor;
pub mod merge;
pub mod normalize;
pub mod paginate;
pub mod query;
pub mod resolve;
pub mod row;
pub mod source;

use tracing::info;

pub use crate::assemble::FloorSummary;
pub use crate::config::{EngineConfig, Endpoint};
pub use crate::error::ReconcileError;
pub use crate::merge::FloorRecord;
pub use crate::paginate::{FetchBatchResult, Paginator};
pub use crate::query::BuildingQuery;
pub use crate::row::RawRow;
pub use crate::source::{HttpPageSource, PageSource};

/// One engine instance per configuration; each `reconcile` call is a fresh pass.
pub struct Reconciler<S> {
    config: EngineConfig,
    source: S,
}

impl Reconciler<HttpPageSource> {
    /// Engine backed by the real HTTP source.
    pub fn from_config(config: EngineConfig) -> Result<Self, ReconcileError> {
        let source = HttpPageSource::new(config.request_timeout())?;
        Ok(Self::new(config, source))
    }
}

impl<S: PageSource> Reconciler<S> {
    pub fn new(config: EngineConfig, source: S) -> Self {
        Self { config, source }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetches whatever the first usable endpoint has for `query`.
    pub async fn fetch(&self, query: &BuildingQuery) -> Result<FetchBatchResult, ReconcileError> {
        self.config.validate()?;
        query.validate()?;

        let paginator = Paginator::new(&self.source, &self.config);
        resolve::resolve(&paginator, &self.config.endpoints, query).await
    }

    /// Full pass: fetch, then normalize/merge/assemble.
    pub async fn reconcile(&self, query: &BuildingQuery) -> Result<FloorSummary, ReconcileError> {
        let batch = self.fetch(query).await?;
        let summary = assemble::summarize(&batch);
        info!(
            endpoint = summary.source_endpoint.as_deref().unwrap_or("-"),
            fetched = summary.fetched,
            floors = summary.floors.len(),
            failed_pages = batch.failed_pages.len(),
            "Reconciled"
        );
        Ok(summary)
    }
}
