//! Marketplace proxy - plan search backend for the agency website
//!
//! Resolves a ZIP code to its county, searches the health-insurance
//! marketplace for plans and normalizes the heterogeneous upstream payloads,
//! filling missing deductible and out-of-pocket figures from plan details.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use config::{MarketplaceConfig, Settings};
pub use services::{MarketplaceProxy, ProxyError, ReqwestTransport, UpstreamTransport};
pub use models::{NormalizedPlan, PlanSearchQuery, PlanSearchResponse, CountyQuery};
