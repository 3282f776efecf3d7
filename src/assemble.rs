use serde::{Deserialize, Serialize};

use crate::merge::{self, FloorRecord};
use crate::normalize::normalize_row;
use crate::paginate::FetchBatchResult;

/// What callers get back for one building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorSummary {
    pub floors: Vec<FloorRecord>,
    pub source_endpoint: Option<String>,
    pub total_count: u64,
    pub fetched: usize,
}

/// Drops the "floor 0, no area" noise, orders top floor first and assigns ids.
pub fn assemble(records: Vec<FloorRecord>) -> Vec<FloorRecord> {
    let mut floors: Vec<FloorRecord> = records
        .into_iter()
        .filter(|r| !(r.floor_no == 0 && r.area == "0"))
        .collect();

    floors.sort_by(|a, b| b.floor_no.cmp(&a.floor_no));
    for (i, record) in floors.iter_mut().enumerate() {
        record.id = format!("{}-{}", record.floor_no, i);
    }
    floors
}

/// normalize → merge → assemble over one fetched batch.
pub fn summarize(batch: &FetchBatchResult) -> FloorSummary {
    let merged = merge::merge(batch.rows.iter().map(normalize_row));
    FloorSummary {
        floors: assemble(merged),
        source_endpoint: batch.endpoint_used.clone(),
        total_count: batch.total_count,
        fetched: batch.rows.len(),
    }
}
