use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ReconcileError;

const HUB_FLOOR_OUTLINE_URL: &str =
    "https://apis.data.go.kr/1613000/BldRgstHubService/getBrFlrOulnInfo";
const LEGACY_FLOOR_OUTLINE_URL: &str =
    "https://apis.data.go.kr/1613000/BldRgstService_v2/getBrFlrOulnInfo";

/// One upstream source believed to hold the floor outline. `name` is what the
/// summary reports as `sourceEndpoint`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
    pub url: String,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Endpoint {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Everything the engine needs, passed in by the caller. Nothing is read from
/// the process environment here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Candidates in priority order.
    pub endpoints: Vec<Endpoint>,
    pub service_key: String,
    pub page_size: u32,
    pub batch_size: usize,
    pub max_pages: u32,
    pub request_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            endpoints: vec![
                Endpoint::new("BldRgstHubService/getBrFlrOulnInfo", HUB_FLOOR_OUTLINE_URL),
                Endpoint::new("BldRgstService_v2/getBrFlrOulnInfo", LEGACY_FLOOR_OUTLINE_URL),
            ],
            service_key: String::new(),
            page_size: 100,
            batch_size: 10,
            max_pages: 150,
            request_timeout_secs: 15,
        }
    }
}

impl EngineConfig {
    pub fn with_service_key(mut self, key: impl Into<String>) -> Self {
        self.service_key = key.into();
        self
    }

    pub fn with_endpoints(mut self, endpoints: Vec<Endpoint>) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Checked before any request goes out.
    pub fn validate(&self) -> Result<(), ReconcileError> {
        if self.service_key.trim().is_empty() {
            return Err(ReconcileError::Config("service key is not set".into()));
        }
        if self.page_size == 0 {
            return Err(ReconcileError::Config("page_size must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(ReconcileError::Config("batch_size must be at least 1".into()));
        }
        if let Some(e) = self.endpoints.iter().find(|e| e.url.trim().is_empty()) {
            return Err(ReconcileError::Config(format!("endpoint '{}' has no url", e.name)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = EngineConfig::default();
        assert_eq!(c.page_size, 100);
        assert_eq!(c.batch_size, 10);
        assert_eq!(c.max_pages, 150);
        assert_eq!(c.endpoints.len(), 2);
        assert_eq!(c.request_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn missing_key_is_config_error() {
        let err = EngineConfig::default().validate().unwrap_err();
        assert!(matches!(err, ReconcileError::Config(_)));
        assert!(EngineConfig::default().with_service_key("k").validate().is_ok());
    }

    #[test]
    fn zero_sizes_rejected() {
        let mut c = EngineConfig::default().with_service_key("k");
        c.batch_size = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn partial_deserialize_keeps_defaults() {
        let c: EngineConfig =
            serde_json::from_str(r#"{ "service_key": "abc", "page_size": 50 }"#).unwrap();
        assert_eq!(c.service_key, "abc");
        assert_eq!(c.page_size, 50);
        assert_eq!(c.max_pages, 150);
    }
}
