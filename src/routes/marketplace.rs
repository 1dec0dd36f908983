use actix_web::{http::StatusCode, web, HttpResponse, Responder, ResponseError};
use crate::models::{CountyQuery, ErrorResponse, HealthResponse, PlanSearchQuery};
use crate::services::{MarketplaceProxy, ProxyError};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<MarketplaceProxy>,
}

/// Configure all marketplace routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/marketplace/plans", web::get().to(search_plans))
        .route("/marketplace/counties", web::get().to(lookup_counties));
}

impl ResponseError for ProxyError {
    fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Validation(_) => StatusCode::BAD_REQUEST,
            ProxyError::Configuration(_) | ProxyError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ProxyError::UpstreamParse { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ProxyError::Validation(message) | ProxyError::Configuration(message) => {
                ErrorResponse::new(message.clone())
            }
            ProxyError::Upstream { context, status, body } => ErrorResponse {
                status: Some(*status),
                body: Some(body.clone()),
                ..ErrorResponse::new(*context)
            },
            ProxyError::UpstreamParse { body } => ErrorResponse {
                body: Some(body.clone()),
                ..ErrorResponse::new("Bad upstream JSON")
            },
            ProxyError::Timeout | ProxyError::Unknown(_) => ErrorResponse {
                message: Some(self.to_string()),
                ..ErrorResponse::new("Proxy failure")
            },
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        configured: state.proxy.is_configured(),
    })
}

/// Plan search endpoint
///
/// GET /api/marketplace/plans?zip=&state=&householdSize=&income=&ages=
///
/// Returns `{ plans, rawCount, enriched }`.
async fn search_plans(
    state: web::Data<AppState>,
    query: web::Query<PlanSearchQuery>,
) -> Result<HttpResponse, ProxyError> {
    let response = state.proxy.search_plans(&query).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// County lookup endpoint
///
/// GET /api/marketplace/counties?zip=&year=
async fn lookup_counties(
    state: web::Data<AppState>,
    query: web::Query<CountyQuery>,
) -> Result<HttpResponse, ProxyError> {
    let counties = state.proxy.lookup_counties(&query).await?;
    Ok(HttpResponse::Ok().json(counties))
}
