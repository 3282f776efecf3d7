use tracing::{info, warn};

use crate::config::Endpoint;
use crate::envelope::Page;
use crate::error::ReconcileError;
use crate::paginate::{FetchBatchResult, Paginator};
use crate::query::BuildingQuery;

/// What a candidate's first page tells us about it.
#[derive(Debug)]
pub enum Attempt {
    /// Credentials or configuration problem: stop everything.
    Fatal(ReconcileError),
    /// Nothing for this building here.
    Empty,
    /// Unreadable answer; another candidate may do better.
    Malformed(ReconcileError),
    Usable(Page),
}

impl Attempt {
    pub fn classify(outcome: Result<Page, ReconcileError>) -> Self {
        match outcome {
            Ok(page) if page.is_empty() => Attempt::Empty,
            Ok(page) => Attempt::Usable(page),
            Err(e) if e.is_fatal() => Attempt::Fatal(e),
            Err(e) => Attempt::Malformed(e),
        }
    }
}

/// Tries candidates in order: first usable wins, fatal short-circuits.
/// Running out of candidates is a successful empty result.
pub async fn resolve(
    paginator: &Paginator<'_>,
    candidates: &[Endpoint],
    query: &BuildingQuery,
) -> Result<FetchBatchResult, ReconcileError> {
    for endpoint in candidates {
        match Attempt::classify(paginator.fetch_first(endpoint, query).await) {
            Attempt::Fatal(e) => {
                warn!(endpoint = %endpoint.name, "Aborting resolution: {}", e);
                return Err(e);
            }
            Attempt::Empty => {
                info!(endpoint = %endpoint.name, "No rows, trying next candidate");
            }
            Attempt::Malformed(e) => {
                warn!(endpoint = %endpoint.name, "Skipping candidate: {}", e);
            }
            Attempt::Usable(first) => {
                info!(
                    endpoint = %endpoint.name,
                    total_count = first.total_count,
                    "Selected endpoint"
                );
                return Ok(paginator.fetch_rest(endpoint, query, first).await);
            }
        }
    }

    info!("All {} candidates exhausted", candidates.len());
    Ok(FetchBatchResult::exhausted())
}
