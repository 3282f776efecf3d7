use serde::{Deserialize, Serialize};

use crate::error::ReconcileError;

/// Lot address of one building: district + dong codes, land type, main/sub lot number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingQuery {
    pub sigungu_cd: String,
    pub bjdong_cd: String,
    pub plat_gb_cd: Option<String>,
    pub bun: Option<String>,
    pub ji: Option<String>,
}

impl BuildingQuery {
    pub fn new(sigungu_cd: impl Into<String>, bjdong_cd: impl Into<String>) -> Self {
        BuildingQuery {
            sigungu_cd: sigungu_cd.into(),
            bjdong_cd: bjdong_cd.into(),
            ..Default::default()
        }
    }

    pub fn with_lot(mut self, bun: impl Into<String>, ji: impl Into<String>) -> Self {
        self.bun = Some(bun.into());
        self.ji = Some(ji.into());
        self
    }

    pub fn validate(&self) -> Result<(), ReconcileError> {
        if self.sigungu_cd.trim().is_empty() || self.bjdong_cd.trim().is_empty() {
            return Err(ReconcileError::Config(
                "sigunguCd and bjdongCd are required".into(),
            ));
        }
        Ok(())
    }

    /// Upstream query pairs. Lot numbers are zero-padded to four digits.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("sigunguCd", self.sigungu_cd.trim().to_string()),
            ("bjdongCd", self.bjdong_cd.trim().to_string()),
        ];
        if let Some(gb) = non_blank(&self.plat_gb_cd) {
            pairs.push(("platGbCd", gb.to_string()));
        }
        if let Some(bun) = non_blank(&self.bun) {
            pairs.push(("bun", pad_lot(bun)));
        }
        if let Some(ji) = non_blank(&self.ji) {
            pairs.push(("ji", pad_lot(ji)));
        }
        pairs
    }
}

fn non_blank(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn pad_lot(n: &str) -> String {
    format!("{:0>4}", n)
}
