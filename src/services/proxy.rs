use crate::config::MarketplaceConfig;
use crate::core::{apply_detail, normalize_plan, parse_ages, parse_income, parse_plan_list, resolve_fips, scalar_to_string};
use crate::models::{
    zip_digits, CountyQuery, Household, NormalizedPlan, Place, PlanDetailsBody, PlanSearchBody,
    PlanSearchQuery, PlanSearchResponse, INDIVIDUAL_MARKET,
};
use crate::services::marketplace::MarketplaceClient;
use crate::services::transport::{TransportError, UpstreamResponse, UpstreamTransport};
use futures::future::join_all;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

/// Errors surfaced by the proxy endpoints
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Configuration(String),

    #[error("{context}: upstream returned {status}")]
    Upstream {
        context: &'static str,
        status: u16,
        body: String,
    },

    #[error("Bad upstream JSON")]
    UpstreamParse { body: String },

    #[error("Upstream request timed out")]
    Timeout,

    #[error("{0}")]
    Unknown(String),
}

impl From<TransportError> for ProxyError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => ProxyError::Timeout,
            TransportError::Request(message) => ProxyError::Unknown(message),
        }
    }
}

// Validation codes in the order they are reported
const VALIDATION_ORDER: &[&str] = &["invalid_zip", "missing_state", "missing_household_size"];

impl From<ValidationErrors> for ProxyError {
    fn from(errors: ValidationErrors) -> Self {
        let first = errors
            .field_errors()
            .into_values()
            .flat_map(|errs| errs.iter())
            .min_by_key(|e| {
                VALIDATION_ORDER
                    .iter()
                    .position(|code| *code == e.code)
                    .unwrap_or(VALIDATION_ORDER.len())
            })
            .and_then(|e| e.message.as_ref().map(|m| m.to_string()));

        ProxyError::Validation(first.unwrap_or_else(|| "Invalid request".to_string()))
    }
}

/// Validated, upstream-ready form of a plan search request
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub zip: String,
    pub state: String,
    pub ages: Vec<u32>,
    pub income: Option<f64>,
}

impl SearchParams {
    pub fn from_query(query: &PlanSearchQuery) -> Result<Self, ProxyError> {
        query.validate()?;

        Ok(Self {
            zip: zip_digits(query.zip.as_deref().unwrap_or_default()),
            state: query.state.as_deref().unwrap_or_default().trim().to_string(),
            ages: parse_ages(query.ages.as_deref().unwrap_or_default()),
            income: parse_income(query.income.as_deref()),
        })
    }
}

/// Marketplace plan-search proxy
///
/// Resolves the county, runs the plan search, normalizes the results and
/// fills missing deductible / out-of-pocket figures from the bulk detail
/// endpoint. Holds no per-request state.
pub struct MarketplaceProxy {
    config: MarketplaceConfig,
    client: MarketplaceClient,
}

impl MarketplaceProxy {
    pub fn new(config: MarketplaceConfig, transport: Arc<dyn UpstreamTransport>) -> Self {
        let client = MarketplaceClient::new(config.base_url.clone(), transport);
        Self { config, client }
    }

    pub fn config(&self) -> &MarketplaceConfig {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str, ProxyError> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| ProxyError::Configuration("MARKETPLACE_API_KEY not configured".to_string()))
    }

    /// Run a full plan search for the given query
    pub async fn search_plans(&self, query: &PlanSearchQuery) -> Result<PlanSearchResponse, ProxyError> {
        let params = SearchParams::from_query(query)?;
        let api_key = self.api_key()?;
        let year = self.config.year;

        tracing::info!(
            "Searching plans for ZIP {} ({}), {} people",
            params.zip,
            params.state,
            params.ages.len()
        );

        let countyfips = self.resolve_county(&params, year, api_key).await?;
        let place = Place {
            countyfips,
            state: params.state.clone(),
            zipcode: params.zip.clone(),
        };

        let search_body = PlanSearchBody {
            household: Household::for_search(&params.ages, params.income),
            market: INDIVIDUAL_MARKET,
            place: place.clone(),
            year,
        };

        let response = self.client.search_plans(&search_body, year, api_key).await?;
        let payload = expect_json(response, "Plan search failed")?;

        let summaries = parse_plan_list(&payload);
        let mut plans: Vec<NormalizedPlan> = summaries.iter().map(normalize_plan).collect();

        let candidate_ids: Vec<String> = plans
            .iter()
            .filter(|p| p.needs_enrichment())
            .filter_map(|p| p.plan_id.clone())
            .collect();

        if !candidate_ids.is_empty() {
            let details_household = Household::for_details(&params.ages, params.income);
            let details = self
                .fetch_details(&candidate_ids, &details_household, &place, year, api_key)
                .await;

            for plan in plans.iter_mut() {
                let detail = plan.plan_id.as_ref().and_then(|id| details.get(id));
                if let Some(detail) = detail {
                    apply_detail(plan, detail);
                }
            }
        }

        tracing::info!(
            "Returning {} plans for ZIP {} ({} enrichment candidates)",
            plans.len(),
            params.zip,
            candidate_ids.len()
        );

        Ok(PlanSearchResponse {
            plans,
            raw_count: summaries.len(),
            enriched: candidate_ids.len(),
        })
    }

    async fn resolve_county(&self, params: &SearchParams, year: i32, api_key: &str) -> Result<String, ProxyError> {
        let response = self.client.counties_by_zip(&params.zip, year, api_key).await?;
        let payload = expect_json(response, "FIPS lookup failed")?;

        resolve_fips(&payload, &params.state).ok_or_else(|| {
            tracing::info!("No county FIPS found for ZIP {}", params.zip);
            ProxyError::Validation("Could not resolve county FIPS for ZIP".to_string())
        })
    }

    /// Fetch detail records in batches; a failed batch is skipped
    async fn fetch_details(
        &self,
        plan_ids: &[String],
        household: &Household,
        place: &Place,
        year: i32,
        api_key: &str,
    ) -> HashMap<String, Value> {
        let batches = plan_ids.chunks(self.config.batch_size).map(|chunk| {
            let body = PlanDetailsBody {
                household: household.clone(),
                place: place.clone(),
                market: INDIVIDUAL_MARKET,
                plan_ids: chunk.to_vec(),
                year,
            };
            async move { self.fetch_batch(body, year, api_key).await }
        });

        join_all(batches).await.into_iter().flatten().collect()
    }

    async fn fetch_batch(&self, body: PlanDetailsBody, year: i32, api_key: &str) -> Vec<(String, Value)> {
        let size = body.plan_ids.len();

        let response = match self.client.plan_details(&body, year, api_key).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                tracing::warn!("Skipping detail batch of {} plans: upstream returned {}", size, response.status);
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!("Skipping detail batch of {} plans: {}", size, e);
                return Vec::new();
            }
        };

        let payload = match response.json() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Skipping detail batch of {} plans: invalid JSON: {}", size, e);
                return Vec::new();
            }
        };

        parse_plan_list(&payload)
            .into_iter()
            .filter_map(|detail| {
                let id = detail.get("id").and_then(scalar_to_string)?;
                Some((id, detail))
            })
            .collect()
    }

    /// Standalone county lookup; returns the upstream JSON verbatim
    pub async fn lookup_counties(&self, query: &CountyQuery) -> Result<Value, ProxyError> {
        query.validate()?;
        let api_key = self.api_key()?;

        let digits = zip_digits(query.zip.as_deref().unwrap_or_default());
        let zip = digits
            .get(..5)
            .ok_or_else(|| ProxyError::Validation("Invalid zip".to_string()))?;
        let year = query
            .year
            .as_deref()
            .and_then(|y| y.trim().parse::<i32>().ok())
            .filter(|y| *y > 0)
            .unwrap_or(self.config.year);

        let response = self.client.counties_by_zip(zip, year, api_key).await?;
        expect_json(response, "County lookup failed")
    }
}

/// Pass non-success statuses through and parse the body as JSON
fn expect_json(response: UpstreamResponse, context: &'static str) -> Result<Value, ProxyError> {
    if !response.is_success() {
        tracing::error!("{}: upstream returned {}", context, response.status);
        return Err(ProxyError::Upstream {
            context,
            status: response.status,
            body: response.body,
        });
    }

    response.json().map_err(|e| {
        tracing::error!("{}: invalid upstream JSON: {}", context, e);
        ProxyError::UpstreamParse { body: response.body.clone() }
    })
}
