use serde::Serialize;

use crate::decimal;
use crate::floor::{self, BASEMENT_CODE, BASEMENT_LABEL, GROUND_CODE, GROUND_LABEL};
use crate::row::RawRow;

const AREA_FIELDS: &[&str] = &["area", "flrArea", "flr_area", "totArea", "archArea"];
const PRIMARY_PURPOSE_FIELDS: &[&str] = &["mainPurpsCdNm", "mainPurps"];
const SECONDARY_PURPOSE_FIELDS: &[&str] = &["etcPurps", "etcPurpose"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRow {
    pub floor_no: i64,
    pub level_code: String,
    pub level_label: String,
    pub area: String,
    pub primary_purpose: String,
    pub secondary_purpose: String,
}

pub fn normalize_row(row: &RawRow) -> NormalizedRow {
    let floor_no = floor::classify(row);

    let (fallback_code, fallback_label) = match floor_no {
        n if n < 0 => (BASEMENT_CODE, BASEMENT_LABEL),
        n if n > 0 => (GROUND_CODE, GROUND_LABEL),
        _ => ("", ""),
    };
    let level_code = row
        .first_text(floor::LEVEL_CODE_FIELDS)
        .unwrap_or_else(|| fallback_code.to_string());
    let level_label = row
        .first_text(floor::LEVEL_NAME_FIELDS)
        .unwrap_or_else(|| fallback_label.to_string());

    NormalizedRow {
        floor_no,
        level_code,
        level_label,
        area: extract_area(row),
        primary_purpose: row.first_text(PRIMARY_PURPOSE_FIELDS).unwrap_or_default(),
        secondary_purpose: row.first_text(SECONDARY_PURPOSE_FIELDS).unwrap_or_default(),
    }
}

/// Named area fields first, then any other key mentioning "area". First
/// positive value wins.
fn extract_area(row: &RawRow) -> String {
    let named = AREA_FIELDS.iter().filter_map(|k| row.get(k));
    let scanned = row
        .fields()
        .filter(|(k, _)| k.to_lowercase().contains("area"))
        .map(|(_, v)| v);

    named
        .chain(scanned)
        .map(decimal::normalize_value)
        .find(|a| !decimal::is_zero(a) && !decimal::is_negative(a))
        .unwrap_or_else(|| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: serde_json::Value) -> RawRow {
        RawRow::from_value(v).unwrap()
    }

    #[test]
    fn full_row() {
        let r = row(json!({
            "flrGbCd": "20",
            "flrGbCdNm": "지상",
            "flrNo": 3,
            "area": "1,204.50",
            "mainPurpsCdNm": " 업무시설 ",
            "etcPurps": "사무소"
        }));
        let n = normalize_row(&r);
        assert_eq!(n.floor_no, 3);
        assert_eq!(n.level_code, "20");
        assert_eq!(n.level_label, "지상");
        assert_eq!(n.area, "1204.5");
        assert_eq!(n.primary_purpose, "업무시설");
        assert_eq!(n.secondary_purpose, "사무소");
    }

    #[test]
    fn synthesizes_level_from_sign() {
        // Sign comes from the purpose text; no level code or name on the row.
        let n = normalize_row(&row(json!({
            "flrNoNm": "지하1층",
            "mainPurpsCdNm": "지하주차장",
            "area": "10"
        })));
        assert_eq!(n.floor_no, -1);
        assert_eq!(n.level_code, "10");
        assert_eq!(n.level_label, "지하");

        let n = normalize_row(&row(json!({ "flrNo": "2", "area": "10" })));
        assert_eq!((n.level_code.as_str(), n.level_label.as_str()), ("20", "지상"));

        let n = normalize_row(&row(json!({ "area": "10" })));
        assert_eq!((n.level_code.as_str(), n.level_label.as_str()), ("", ""));
    }

    #[test]
    fn area_skips_zero_named_fields() {
        let r = row(json!({ "flrNo": 1, "area": "0", "totArea": "", "flrArea": "55.10" }));
        assert_eq!(normalize_row(&r).area, "55.1");
    }

    #[test]
    fn area_scans_unknown_keys() {
        let r = row(json!({ "flrNo": 1, "area": "0", "exclusiveAREA": "33.3" }));
        assert_eq!(normalize_row(&r).area, "33.3");
    }

    #[test]
    fn area_defaults_to_zero() {
        let r = row(json!({ "flrNo": 1, "area": "n/a", "landArea": "-4" }));
        assert_eq!(normalize_row(&r).area, "0");
        assert_eq!(normalize_row(&row(json!({ "flrNo": 1 }))).area, "0");
    }
}
