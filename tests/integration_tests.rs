// Integration tests for the marketplace proxy over a fake upstream

use actix_web::{test, web, App};
use async_trait::async_trait;
use marketplace_proxy::config::MarketplaceConfig;
use marketplace_proxy::models::{CountyQuery, PlanSearchQuery};
use marketplace_proxy::routes::{self, marketplace::AppState};
use marketplace_proxy::services::{
    MarketplaceProxy, ProxyError, TransportError, UpstreamRequest, UpstreamResponse, UpstreamTransport,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

type Responder = Box<dyn Fn(&UpstreamRequest) -> Result<UpstreamResponse, TransportError> + Send + Sync>;

/// Upstream stand-in that records every request
struct FakeTransport {
    respond: Responder,
    requests: Mutex<Vec<UpstreamRequest>>,
}

impl FakeTransport {
    fn new<F>(respond: F) -> Arc<Self>
    where
        F: Fn(&UpstreamRequest) -> Result<UpstreamResponse, TransportError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            respond: Box::new(respond),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn urls(&self) -> Vec<String> {
        self.requests.lock().unwrap().iter().map(|r| r.url.clone()).collect()
    }

    fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpstreamTransport for FakeTransport {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, TransportError> {
        let response = (self.respond)(&request);
        self.requests.lock().unwrap().push(request);
        response
    }
}

const BASE: &str = "https://marketplace.test";

fn ok(body: Value) -> Result<UpstreamResponse, TransportError> {
    Ok(UpstreamResponse::new(200, body.to_string()))
}

fn status(code: u16, body: &str) -> Result<UpstreamResponse, TransportError> {
    Ok(UpstreamResponse::new(code, body))
}

fn path_of(request: &UpstreamRequest) -> &str {
    let rest = request.url.strip_prefix(BASE).unwrap_or(&request.url);
    rest.split('?').next().unwrap_or(rest)
}

fn counties() -> Value {
    json!([
        {"state": "CA", "fips": "6037", "name": "Los Angeles"},
        {"state": "NV", "fips": "32003", "name": "Clark"}
    ])
}

fn proxy_with(transport: Arc<FakeTransport>) -> MarketplaceProxy {
    let config = MarketplaceConfig::new(Some("test-key".to_string()), BASE, 2025);
    MarketplaceProxy::new(config, transport)
}

fn search_query() -> PlanSearchQuery {
    PlanSearchQuery {
        zip: Some("89101".to_string()),
        state: Some("NV".to_string()),
        household_size: Some("2".to_string()),
        income: Some("48000".to_string()),
        ages: Some("34, 7,abc,-2".to_string()),
    }
}

fn plan_ids(body: &Value) -> Vec<String> {
    body["plan_ids"]
        .as_array()
        .map(|ids| ids.iter().filter_map(|id| id.as_str().map(String::from)).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_search_resolves_county_and_enriches() {
    let transport = FakeTransport::new(|request| match path_of(request) {
        "/api/v1/counties/by/zip/89101" => ok(counties()),
        "/api/v1/plans/search" => ok(json!({"plans": [
            {"id": "P1", "name": "Bronze", "premium": 250, "deductible": 7000, "oop_max": 9000},
            {"id": "P2", "name": "Silver", "premium": 400},
            {"name": "No id"}
        ], "total": 3})),
        "/api/v1/plans" => ok(json!({"plans": [
            {"id": "P2", "deductibles": [
                {"amount": 3200, "individual": true, "network_tier": "In-Network"}
            ], "moops": [
                {"amount": 8100, "individual": true, "network_tier": "In-Network"}
            ], "network": "EPO"},
            {"deductible": 1}
        ]})),
        other => panic!("unexpected upstream path {}", other),
    });

    let proxy = proxy_with(transport.clone());
    let response = proxy.search_plans(&search_query()).await.unwrap();

    assert_eq!(response.raw_count, 3);
    assert_eq!(response.enriched, 1);
    assert_eq!(response.plans.len(), 3);

    let silver = &response.plans[1];
    assert_eq!(silver.plan_id.as_deref(), Some("P2"));
    assert_eq!(silver.deductible, Some(3200.0));
    assert_eq!(silver.out_of_pocket_max, Some(8100.0));
    assert_eq!(silver.network_type.as_deref(), Some("EPO"));

    let bronze = &response.plans[0];
    assert_eq!(bronze.deductible, Some(7000.0));
    assert_eq!(bronze.network_type, None);

    let requests = transport.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests[0].url.contains("year=2025"));
    assert!(requests[0].url.contains("apikey=test-key"));

    let search_body = requests[1].body.as_ref().unwrap();
    assert_eq!(search_body["place"], json!({"countyfips": "32003", "state": "NV", "zipcode": "89101"}));
    assert_eq!(search_body["market"], "Individual");
    assert_eq!(search_body["household"]["income"], json!(48000.0));
    assert_eq!(
        search_body["household"]["people"],
        json!([
            {"age": 34, "aptc_eligible": true, "uses_tobacco": false},
            {"age": 7, "aptc_eligible": true, "uses_tobacco": false}
        ])
    );

    let details_body = requests[2].body.as_ref().unwrap();
    assert_eq!(plan_ids(details_body), vec!["P2".to_string()]);
    assert!(details_body["household"]["people"][0].get("aptc_eligible").is_none());
}

#[tokio::test]
async fn test_search_retries_once_with_trailing_slash() {
    let transport = FakeTransport::new(|request| match path_of(request) {
        "/api/v1/counties/by/zip/89101" => ok(counties()),
        "/api/v1/plans/search" => status(404, "not found"),
        "/api/v1/plans/search/" => ok(json!([{"id": "P1", "deductible": 100, "oop_max": 200}])),
        other => panic!("unexpected upstream path {}", other),
    });

    let proxy = proxy_with(transport.clone());
    let response = proxy.search_plans(&search_query()).await.unwrap();

    assert_eq!(response.raw_count, 1);
    assert_eq!(response.enriched, 0);

    let paths: Vec<String> = transport.urls().iter().map(|u| u.split('?').next().unwrap().to_string()).collect();
    assert_eq!(
        paths,
        vec![
            format!("{}/api/v1/counties/by/zip/89101", BASE),
            format!("{}/api/v1/plans/search", BASE),
            format!("{}/api/v1/plans/search/", BASE),
        ]
    );
}

#[tokio::test]
async fn test_search_gives_up_after_single_retry() {
    let transport = FakeTransport::new(|request| match path_of(request) {
        "/api/v1/counties/by/zip/89101" => ok(counties()),
        _ => status(404, "still missing"),
    });

    let proxy = proxy_with(transport.clone());
    let err = proxy.search_plans(&search_query()).await.unwrap_err();

    match err {
        ProxyError::Upstream { context, status, body } => {
            assert_eq!(context, "Plan search failed");
            assert_eq!(status, 404);
            assert_eq!(body, "still missing");
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
    assert_eq!(transport.urls().len(), 3);
}

#[tokio::test]
async fn test_failed_batch_does_not_affect_others() {
    let summaries: Vec<Value> = (0..45).map(|i| json!({"plan_id": format!("P{:02}", i)})).collect();

    let transport = FakeTransport::new(move |request| match path_of(request) {
        "/api/v1/counties/by/zip/89101" => ok(counties()),
        "/api/v1/plans/search" => ok(json!({"plans": summaries.clone()})),
        "/api/v1/plans" => {
            let ids = plan_ids(request.body.as_ref().unwrap());
            if ids.len() == 40 {
                status(500, "batch exploded")
            } else {
                let details: Vec<Value> = ids
                    .iter()
                    .map(|id| json!({"id": id, "cost_sharing": {"deductible": 1500, "oop_max": 6000}}))
                    .collect();
                ok(json!({"plans": details}))
            }
        }
        other => panic!("unexpected upstream path {}", other),
    });

    let proxy = proxy_with(transport.clone());
    let response = proxy.search_plans(&search_query()).await.unwrap();

    assert_eq!(response.raw_count, 45);
    assert_eq!(response.enriched, 45);

    for plan in &response.plans[..40] {
        assert_eq!(plan.deductible, None);
        assert_eq!(plan.out_of_pocket_max, None);
    }
    for plan in &response.plans[40..] {
        assert_eq!(plan.deductible, Some(1500.0));
        assert_eq!(plan.out_of_pocket_max, Some(6000.0));
    }

    let detail_calls = transport.urls().iter().filter(|u| u.contains("/api/v1/plans?")).count();
    assert_eq!(detail_calls, 2);
}

#[tokio::test]
async fn test_detail_lookup_retries_once_with_trailing_slash() {
    let transport = FakeTransport::new(|request| match path_of(request) {
        "/api/v1/counties/by/zip/89101" => ok(counties()),
        "/api/v1/plans/search" => ok(json!([{"id": "P1"}, {"id": "P2", "deductible": 900, "oop_max": 5000}])),
        "/api/v1/plans" => status(404, "not found"),
        "/api/v1/plans/" => ok(json!({"plans": [
            {"id": "P1", "cost_sharing": {"deductible": "$2,000", "out_of_pocket_max": "$7,500"}}
        ]})),
        other => panic!("unexpected upstream path {}", other),
    });

    let proxy = proxy_with(transport.clone());
    let response = proxy.search_plans(&search_query()).await.unwrap();

    assert_eq!(response.enriched, 1);
    assert_eq!(response.plans[0].deductible, Some(2000.0));
    assert_eq!(response.plans[0].out_of_pocket_max, Some(7500.0));

    let paths: Vec<String> = transport.urls().iter().map(|u| u.split('?').next().unwrap().to_string()).collect();
    assert_eq!(
        paths[2..],
        [format!("{}/api/v1/plans", BASE), format!("{}/api/v1/plans/", BASE)]
    );
}

#[tokio::test]
async fn test_detail_batch_with_invalid_json_is_skipped() {
    let summaries: Vec<Value> = (0..45).map(|i| json!({"plan_id": format!("P{:02}", i)})).collect();

    let transport = FakeTransport::new(move |request| match path_of(request) {
        "/api/v1/counties/by/zip/89101" => ok(counties()),
        "/api/v1/plans/search" => ok(json!({"plans": summaries.clone()})),
        "/api/v1/plans" => {
            let ids = plan_ids(request.body.as_ref().unwrap());
            if ids.len() == 40 {
                status(200, "<html>maintenance</html>")
            } else {
                let details: Vec<Value> = ids.iter().map(|id| json!({"id": id, "deductible": 300, "oop_max": 3000})).collect();
                ok(json!({"plans": details}))
            }
        }
        other => panic!("unexpected upstream path {}", other),
    });

    let proxy = proxy_with(transport);
    let response = proxy.search_plans(&search_query()).await.unwrap();

    assert_eq!(response.raw_count, 45);
    assert_eq!(response.enriched, 45);
    assert!(response.plans[..40].iter().all(|p| p.deductible.is_none() && p.out_of_pocket_max.is_none()));
    assert!(response.plans[40..].iter().all(|p| p.deductible == Some(300.0) && p.out_of_pocket_max == Some(3000.0)));
}

#[tokio::test]
async fn test_transport_error_message_has_api_key_redacted() {
    let transport = FakeTransport::new(|request| {
        Err(TransportError::Request(format!("error sending request for url ({})", request.url)))
    });
    let proxy = proxy_with(transport);

    let err = proxy.search_plans(&search_query()).await.unwrap_err();
    let message = err.to_string();
    assert!(matches!(err, ProxyError::Unknown(_)));
    assert!(!message.contains("test-key"), "key leaked in {}", message);
    assert!(message.contains("apikey=***"));
}

#[tokio::test]
async fn test_detail_batch_transport_error_is_skipped() {
    let transport = FakeTransport::new(|request| match path_of(request) {
        "/api/v1/counties/by/zip/89101" => ok(counties()),
        "/api/v1/plans/search" => ok(json!([{"id": "P1"}])),
        _ => Err(TransportError::Request("connection reset".to_string())),
    });

    let proxy = proxy_with(transport);
    let response = proxy.search_plans(&search_query()).await.unwrap();

    assert_eq!(response.enriched, 1);
    assert_eq!(response.plans[0].deductible, None);
}

#[tokio::test]
async fn test_county_lookup_failure_passes_status_through() {
    let transport = FakeTransport::new(|_| status(403, "{\"message\":\"bad key\"}"));

    let proxy = proxy_with(transport.clone());
    let err = proxy.search_plans(&search_query()).await.unwrap_err();

    assert!(matches!(err, ProxyError::Upstream { status: 403, context: "FIPS lookup failed", .. }));
    assert_eq!(transport.urls().len(), 1);
}

#[tokio::test]
async fn test_unresolvable_county_is_rejected() {
    let transport = FakeTransport::new(|_| ok(json!({"counties": []})));

    let proxy = proxy_with(transport);
    let err = proxy.search_plans(&search_query()).await.unwrap_err();

    match err {
        ProxyError::Validation(message) => assert_eq!(message, "Could not resolve county FIPS for ZIP"),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_request_never_reaches_upstream() {
    let transport = FakeTransport::new(|_| panic!("upstream must not be called"));
    let proxy = proxy_with(transport.clone());

    let mut query = search_query();
    query.zip = Some("902".to_string());

    let err = proxy.search_plans(&query).await.unwrap_err();
    assert!(matches!(err, ProxyError::Validation(ref m) if m == "Invalid zip"));
    assert!(transport.urls().is_empty());
}

#[tokio::test]
async fn test_missing_api_key_is_configuration_error() {
    let transport = FakeTransport::new(|_| panic!("upstream must not be called"));
    let config = MarketplaceConfig::new(None, BASE, 2025);
    let proxy = MarketplaceProxy::new(config, transport);

    let err = proxy.search_plans(&search_query()).await.unwrap_err();
    assert!(matches!(err, ProxyError::Configuration(_)));
}

#[tokio::test]
async fn test_timeout_maps_to_timeout_error() {
    let transport = FakeTransport::new(|_| Err(TransportError::Timeout));
    let proxy = proxy_with(transport);

    let err = proxy.search_plans(&search_query()).await.unwrap_err();
    assert!(matches!(err, ProxyError::Timeout));
}

#[tokio::test]
async fn test_county_lookup_uses_requested_year() {
    let transport = FakeTransport::new(|_| ok(json!({"counties": [{"fips": "06037"}]})));
    let proxy = proxy_with(transport.clone());

    let query = CountyQuery {
        zip: Some("90210-1234".to_string()),
        year: Some("2024".to_string()),
    };
    let counties = proxy.lookup_counties(&query).await.unwrap();

    assert_eq!(counties, json!({"counties": [{"fips": "06037"}]}));
    let urls = transport.urls();
    assert_eq!(urls.len(), 1);
    assert!(urls[0].starts_with(&format!("{}/api/v1/counties/by/zip/90210?", BASE)));
    assert!(urls[0].contains("year=2024"));
}

#[tokio::test]
async fn test_county_lookup_bad_json_is_parse_error() {
    let transport = FakeTransport::new(|_| status(200, "<html>oops</html>"));
    let proxy = proxy_with(transport);

    let query = CountyQuery {
        zip: Some("90210".to_string()),
        year: None,
    };
    let err = proxy.lookup_counties(&query).await.unwrap_err();
    assert!(matches!(err, ProxyError::UpstreamParse { ref body } if body == "<html>oops</html>"));
}

macro_rules! app_with {
    ($transport:expr) => {{
        let state = AppState {
            proxy: Arc::new(proxy_with($transport)),
        };
        test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(routes::configure_routes),
        )
        .await
    }};
}

#[actix_web::test]
async fn test_plans_route_returns_normalized_json() {
    let transport = FakeTransport::new(|request| match path_of(request) {
        "/api/v1/counties/by/zip/89101" => ok(counties()),
        "/api/v1/plans/search" => ok(json!([
            {"plan_id": "P1", "plan_name": "Gold", "issuer_name": "Acme", "premium": "$512.00",
             "deductible": 1000, "oop_max": 4000, "metal_level": "Gold"}
        ])),
        other => panic!("unexpected upstream path {}", other),
    });
    let app = app_with!(transport);

    let req = test::TestRequest::get()
        .uri("/api/marketplace/plans?zip=89101&state=NV&householdSize=1&ages=40")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["rawCount"], 1);
    assert_eq!(body["enriched"], 0);
    assert_eq!(
        body["plans"][0],
        json!({
            "planId": "P1",
            "planName": "Gold",
            "issuerName": "Acme",
            "metalLevel": "Gold",
            "monthlyPremium": 512.0,
            "deductible": 1000.0,
            "outOfPocketMax": 4000.0,
            "networkType": null
        })
    );
}

#[actix_web::test]
async fn test_plans_route_rejects_bad_zip() {
    let transport = FakeTransport::new(|_| panic!("upstream must not be called"));
    let app = app_with!(transport);

    let req = test::TestRequest::get()
        .uri("/api/marketplace/plans?zip=9021O&state=CA&householdSize=1")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"error": "Invalid zip"}));
}

#[actix_web::test]
async fn test_plans_route_passes_upstream_status_through() {
    let transport = FakeTransport::new(|_| status(429, "slow down"));
    let app = app_with!(transport);

    let req = test::TestRequest::get()
        .uri("/api/marketplace/plans?zip=89101&state=NV&householdSize=1")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 429);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"error": "FIPS lookup failed", "status": 429, "body": "slow down"}));
}

#[actix_web::test]
async fn test_counties_route_reports_timeout() {
    let transport = FakeTransport::new(|_| Err(TransportError::Timeout));
    let app = app_with!(transport);

    let req = test::TestRequest::get()
        .uri("/api/marketplace/counties?zip=90210")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 504);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Proxy failure");
}

#[actix_web::test]
async fn test_health_route_reports_configuration() {
    let transport = FakeTransport::new(|_| panic!("upstream must not be called"));
    let app = app_with!(transport);

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["configured"], true);
}
