use crate::services::transport::{TransportError, UpstreamRequest, UpstreamResponse, UpstreamTransport};
use serde::Serialize;
use std::sync::Arc;

/// Marketplace API client
///
/// Builds the upstream URLs and applies the single trailing-slash retry
/// that the plan endpoints need: some deployments answer 404 on
/// `/plans/search` but accept `/plans/search/`.
#[derive(Clone)]
pub struct MarketplaceClient {
    base_url: String,
    transport: Arc<dyn UpstreamTransport>,
}

impl MarketplaceClient {
    /// Create a new client against `base_url` (no trailing slash)
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn UpstreamTransport>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/v1/counties/by/zip/{zip}`
    pub async fn counties_by_zip(
        &self,
        zip: &str,
        year: i32,
        api_key: &str,
    ) -> Result<UpstreamResponse, TransportError> {
        let url = format!(
            "{}/api/v1/counties/by/zip/{}?year={}&apikey={}",
            self.base_url,
            urlencoding::encode(zip),
            year,
            urlencoding::encode(api_key)
        );

        tracing::debug!("Looking up counties for ZIP {} ({})", zip, redact(&url, api_key));

        self.transport
            .send(UpstreamRequest::get(url))
            .await
            .map_err(|e| redact_error(e, api_key))
    }

    /// `POST /api/v1/plans/search`, retried once at `/plans/search/` on 404
    pub async fn search_plans<B: Serialize>(
        &self,
        body: &B,
        year: i32,
        api_key: &str,
    ) -> Result<UpstreamResponse, TransportError> {
        self.post_with_slash_fallback("/api/v1/plans/search", body, year, api_key)
            .await
    }

    /// Bulk `POST /api/v1/plans`, retried once at `/plans/` on 404
    pub async fn plan_details<B: Serialize>(
        &self,
        body: &B,
        year: i32,
        api_key: &str,
    ) -> Result<UpstreamResponse, TransportError> {
        self.post_with_slash_fallback("/api/v1/plans", body, year, api_key)
            .await
    }

    async fn post_with_slash_fallback<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        year: i32,
        api_key: &str,
    ) -> Result<UpstreamResponse, TransportError> {
        let payload = serde_json::to_value(body)
            .map_err(|e| TransportError::Request(format!("Failed to encode request body: {}", e)))?;

        let url = self.plans_url(path, year, api_key);
        tracing::debug!("POST {}", redact(&url, api_key));

        let response = self
            .transport
            .send(UpstreamRequest::post(url, payload.clone()))
            .await
            .map_err(|e| redact_error(e, api_key))?;

        if response.status != 404 {
            return Ok(response);
        }

        let alt_url = self.plans_url(&format!("{}/", path), year, api_key);
        tracing::debug!("Got 404, retrying with trailing slash: {}", redact(&alt_url, api_key));

        self.transport
            .send(UpstreamRequest::post(alt_url, payload))
            .await
            .map_err(|e| redact_error(e, api_key))
    }

    fn plans_url(&self, path: &str, year: i32, api_key: &str) -> String {
        format!(
            "{}{}?apikey={}&year={}",
            self.base_url,
            path,
            urlencoding::encode(api_key),
            year
        )
    }
}

/// Strip the API key from a URL before it is logged
fn redact(url: &str, api_key: &str) -> String {
    let encoded = urlencoding::encode(api_key);
    if encoded.is_empty() {
        return url.to_string();
    }
    url.replace(encoded.as_ref(), "***")
}

fn redact_error(err: TransportError, api_key: &str) -> TransportError {
    match err {
        TransportError::Request(message) => TransportError::Request(redact(&message, api_key)),
        other => other,
    }
}
