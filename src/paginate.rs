use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{EngineConfig, Endpoint};
use crate::envelope::{self, Page};
use crate::error::ReconcileError;
use crate::query::BuildingQuery;
use crate::row::RawRow;
use crate::source::{PageRequest, PageSource};

/// All rows gathered for one invocation, plus where they came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchBatchResult {
    pub endpoint_used: Option<String>,
    pub total_count: u64,
    pub rows: Vec<RawRow>,
    /// Pages that failed after the endpoint was selected.
    pub failed_pages: Vec<u32>,
}

impl FetchBatchResult {
    /// Every candidate came back empty or unusable.
    pub fn exhausted() -> Self {
        Self::default()
    }
}

/// Walks the pages of one endpoint in bounded concurrent batches.
pub struct Paginator<'a> {
    source: &'a dyn PageSource,
    config: &'a EngineConfig,
}

impl<'a> Paginator<'a> {
    pub fn new(source: &'a dyn PageSource, config: &'a EngineConfig) -> Self {
        Self { source, config }
    }

    pub async fn fetch_page(
        &self,
        endpoint: &Endpoint,
        query: &BuildingQuery,
        page_no: u32,
    ) -> Result<Page, ReconcileError> {
        let request = PageRequest {
            endpoint,
            query,
            service_key: &self.config.service_key,
            page_no,
            num_of_rows: self.config.page_size,
        };
        let response = self.source.fetch_page(&request).await?;
        envelope::decode(&response)
    }

    pub async fn fetch_first(
        &self,
        endpoint: &Endpoint,
        query: &BuildingQuery,
    ) -> Result<Page, ReconcileError> {
        self.fetch_page(endpoint, query, 1).await
    }

    /// Fetches pages 2.. given an already-fetched first page. Failed pages
    /// are logged and contribute nothing.
    pub async fn fetch_rest(
        &self,
        endpoint: &Endpoint,
        query: &BuildingQuery,
        first: Page,
    ) -> FetchBatchResult {
        let total_count = first.total_count;
        let mut result = FetchBatchResult {
            endpoint_used: Some(endpoint.name.clone()),
            total_count,
            rows: first.rows,
            failed_pages: Vec::new(),
        };

        let page_size = u64::from(self.config.page_size.max(1));
        if total_count <= page_size {
            return result;
        }

        let total_pages = total_count
            .div_ceil(page_size)
            .min(u64::from(self.config.max_pages)) as u32;
        let remaining: Vec<u32> = (2..=total_pages).collect();
        info!(
            endpoint = %endpoint.name,
            total_count,
            total_pages,
            "Fetching {} more pages",
            remaining.len()
        );

        for batch in remaining.chunks(self.config.batch_size.max(1)) {
            let fetches = batch.iter().map(|&p| self.fetch_page(endpoint, query, p));
            let pages = join_all(fetches).await;

            // Appended in page order once the whole batch has resolved.
            for (&page_no, outcome) in batch.iter().zip(pages) {
                match outcome {
                    Ok(page) => {
                        debug!(page = page_no, rows = page.rows.len(), "page ok");
                        result.rows.extend(page.rows);
                    }
                    Err(e) => {
                        let err = ReconcileError::page_fetch(page_no, e);
                        warn!(endpoint = %endpoint.name, "{}", err);
                        result.failed_pages.push(page_no);
                    }
                }
            }
        }

        result
    }

    /// First page plus everything after it.
    pub async fn fetch_all(
        &self,
        endpoint: &Endpoint,
        query: &BuildingQuery,
    ) -> Result<FetchBatchResult, ReconcileError> {
        let first = self.fetch_first(endpoint, query).await?;
        Ok(self.fetch_rest(endpoint, query, first).await)
    }
}
