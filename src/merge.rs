use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::decimal;
use crate::floor::is_basement_text;
use crate::normalize::NormalizedRow;

/// One deduplicated floor. `id` stays empty until the rows are assembled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorRecord {
    pub id: String,
    pub floor_no: i64,
    pub level_code: String,
    pub level_label: String,
    pub area: String,
    pub primary_purpose: String,
    pub secondary_purpose: String,
}

impl From<NormalizedRow> for FloorRecord {
    fn from(row: NormalizedRow) -> Self {
        FloorRecord {
            id: String::new(),
            floor_no: row.floor_no,
            level_code: row.level_code,
            level_label: row.level_label,
            area: row.area,
            primary_purpose: row.primary_purpose,
            secondary_purpose: row.secondary_purpose,
        }
    }
}

/// Folds rows into one record per floor number, in arrival order.
pub fn merge<I>(rows: I) -> Vec<FloorRecord>
where
    I: IntoIterator<Item = NormalizedRow>,
{
    let mut records: Vec<FloorRecord> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();

    for row in rows {
        let slot = match index.get(&row.floor_no).copied() {
            Some(slot) => slot,
            None => {
                index.insert(row.floor_no, records.len());
                records.push(FloorRecord::from(row));
                continue;
            }
        };

        let record = &mut records[slot];
        record.area = decimal::add(&record.area, &row.area);
        if record.level_code.is_empty() {
            record.level_code = row.level_code;
        }
        if record.level_label.is_empty() {
            record.level_label = row.level_label;
        }
        record.primary_purpose =
            pick_purpose_by_floor(record.floor_no, &record.primary_purpose, &row.primary_purpose);
        record.secondary_purpose = pick_purpose_by_floor(
            record.floor_no,
            &record.secondary_purpose,
            &row.secondary_purpose,
        );
    }

    records
}

/// Chooses between two purpose labels for the same floor. Above ground the
/// non-basement label wins, below ground the basement one; otherwise the
/// longer non-empty label.
pub fn pick_purpose_by_floor(floor_no: i64, current: &str, candidate: &str) -> String {
    let current_basement = is_basement_text(current);
    let candidate_basement = is_basement_text(candidate);

    if current_basement != candidate_basement {
        if floor_no > 0 {
            let pick = if current_basement { candidate } else { current };
            return pick.to_string();
        }
        if floor_no < 0 {
            let pick = if current_basement { current } else { candidate };
            return pick.to_string();
        }
    }

    if current.is_empty() {
        return candidate.to_string();
    }
    if candidate.is_empty() {
        return current.to_string();
    }
    // Ties keep the seeded value.
    if candidate.chars().count() > current.chars().count() {
        candidate.to_string()
    } else {
        current.to_string()
    }
}
