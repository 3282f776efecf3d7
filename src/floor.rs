use std::sync::LazyLock;

use regex::Regex;

use crate::row::RawRow;

static BASEMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(지하|basement|(?:^|[^a-z])b\d+)").unwrap());
static GROUND_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(지상|ground)").unwrap());
static INT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+$").unwrap());

pub const BASEMENT_CODE: &str = "10";
pub const GROUND_CODE: &str = "20";
pub const BASEMENT_LABEL: &str = "지하";
pub const GROUND_LABEL: &str = "지상";

pub const LEVEL_CODE_FIELDS: &[&str] = &["flrGbCd", "flrGbCode", "floorTypeCode", "flr_gb_cd"];
pub const LEVEL_NAME_FIELDS: &[&str] = &["flrGbCdNm", "flrGbNm", "floorTypeName", "flr_gb_cd_nm"];
pub const PURPOSE_FIELDS: &[&str] = &["mainPurpsCdNm", "etcPurps"];

// Order matters: numeric fields before the free-text names.
const FLOOR_FIELDS: &[&str] = &[
    "flrNo",
    "flr_no",
    "floorNo",
    "floor",
    "flrNoNm",
    "floorName",
    "flr_no_nm",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelSign {
    Basement,
    Ground,
}

/// True when free text reads as a basement level ("지하", "basement", "B2").
pub fn is_basement_text(text: &str) -> bool {
    BASEMENT_RE.is_match(text)
}

/// Signed floor number for a raw row; `0` when no floor field parses.
pub fn classify(row: &RawRow) -> i64 {
    let Some(mag) = magnitude(row) else {
        return 0;
    };

    match sign_hint(row) {
        Some(LevelSign::Basement) if mag > 0 => -mag,
        Some(LevelSign::Ground) if mag < 0 => mag.saturating_abs(),
        _ => mag,
    }
}

/// Basement/ground hint: explicit code, then level name, then purpose text.
pub fn sign_hint(row: &RawRow) -> Option<LevelSign> {
    if let Some(code) = row.first_text(LEVEL_CODE_FIELDS) {
        match code.as_str() {
            BASEMENT_CODE => return Some(LevelSign::Basement),
            GROUND_CODE => return Some(LevelSign::Ground),
            _ => {}
        }
    }

    if let Some(name) = row.first_text(LEVEL_NAME_FIELDS) {
        if BASEMENT_RE.is_match(&name) {
            return Some(LevelSign::Basement);
        }
        if GROUND_RE.is_match(&name) {
            return Some(LevelSign::Ground);
        }
    }

    let basement_purpose = PURPOSE_FIELDS
        .iter()
        .filter_map(|k| row.text(k))
        .any(|p| BASEMENT_RE.is_match(&p));
    if basement_purpose {
        return Some(LevelSign::Basement);
    }

    None
}

/// First floor field that yields an integer, as-is or after stripping
/// everything but digits and '-'.
pub fn magnitude(row: &RawRow) -> Option<i64> {
    FLOOR_FIELDS.iter().find_map(|field| {
        let raw = row.text(field)?;
        if INT_RE.is_match(&raw) {
            return raw.parse().ok();
        }
        let stripped: String = raw
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '-')
            .collect();
        if INT_RE.is_match(&stripped) {
            stripped.parse().ok()
        } else {
            None
        }
    })
}
