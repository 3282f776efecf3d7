use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::Endpoint;
use crate::error::ReconcileError;
use crate::query::BuildingQuery;

/// One page request against one endpoint.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<'a> {
    pub endpoint: &'a Endpoint,
    pub query: &'a BuildingQuery,
    pub service_key: &'a str,
    pub page_no: u32,
    pub num_of_rows: u32,
}

/// Status and body as received; decoding is the envelope module's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        UpstreamResponse {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetches raw pages. The HTTP implementation lives below; tests plug in
/// canned pages.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<UpstreamResponse, ReconcileError>;
}

pub struct HttpPageSource {
    http: Client,
}

impl HttpPageSource {
    pub fn new(timeout: Duration) -> Result<Self, ReconcileError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReconcileError::Config(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<UpstreamResponse, ReconcileError> {
        let mut params: Vec<(&str, String)> = vec![
            ("serviceKey", request.service_key.to_string()),
            ("_type", "json".to_string()),
            ("numOfRows", request.num_of_rows.to_string()),
            ("pageNo", request.page_no.to_string()),
        ];
        params.extend(request.query.to_pairs());

        debug!(endpoint = %request.endpoint.name, page = request.page_no, "GET");
        let response = self
            .http
            .get(&request.endpoint.url)
            .query(&params)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(UpstreamResponse { status, body })
    }
}
