//! HTTP-level tests for the liveness and prediction endpoints, driven through
//! the router with stub scorers in place of a real model file.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use healthai_guardian::api::{build_router, handlers::LIVENESS_MESSAGE, AppState};
use healthai_guardian::config::CorsConfig;
use healthai_guardian::error::InferenceError;
use healthai_guardian::metrics::ServiceMetrics;
use healthai_guardian::models::{InferenceEngine, RiskScorer};
use healthai_guardian::types::prediction::{
    DISCLAIMER, HIGH_RISK_RECOMMENDATION, LOW_RISK_RECOMMENDATION,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Returns a fixed probability and remembers what it was asked to score.
struct StubScorer {
    probability: f64,
    calls: AtomicUsize,
    last_features: Mutex<Vec<f32>>,
}

impl StubScorer {
    fn new(probability: f64) -> Arc<Self> {
        Arc::new(Self {
            probability,
            calls: AtomicUsize::new(0),
            last_features: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RiskScorer for StubScorer {
    fn predict_proba(&self, features: &[f32]) -> Result<[f64; 2], InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_features.lock().unwrap() = features.to_vec();
        Ok([1.0 - self.probability, self.probability])
    }
}

struct FailingScorer;

impl RiskScorer for FailingScorer {
    fn predict_proba(&self, _features: &[f32]) -> Result<[f64; 2], InferenceError> {
        Err(InferenceError::Runtime(
            "input tensor shape mismatch: secret detail".to_string(),
        ))
    }
}

fn cors_config() -> CorsConfig {
    CorsConfig {
        allowed_origins: vec!["https://clinic.example".to_string()],
        allowed_methods: vec!["GET".to_string(), "POST".to_string()],
        allowed_headers: vec!["content-type".to_string()],
    }
}

fn app_with(scorer: Arc<dyn RiskScorer>) -> (Router, Arc<ServiceMetrics>) {
    app_with_cors(scorer, &cors_config())
}

fn app_with_cors(scorer: Arc<dyn RiskScorer>, cors: &CorsConfig) -> (Router, Arc<ServiceMetrics>) {
    let metrics = Arc::new(ServiceMetrics::new());
    let state = AppState::new(InferenceEngine::new(scorer), metrics.clone());
    (build_router(state, cors), metrics)
}

fn preflight(origin: &str) -> Request<Body> {
    Request::builder()
        .method(Method::OPTIONS)
        .uri("/predict")
        .header(header::ORIGIN, origin)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap()
}

fn scenario_payload() -> Value {
    json!({
        "age": 63, "sex": 1, "cp": 3, "trestbps": 145, "chol": 233,
        "fbs": 1, "restecg": 0, "thalach": 150, "exang": 0,
        "oldpeak": 2.3, "slope": 0, "ca": 0, "thal": 1
    })
}

fn predict_request(body: String) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn predict(app: Router, payload: &Value) -> (StatusCode, Value) {
    send(app, predict_request(payload.to_string())).await
}

#[tokio::test]
async fn test_liveness() {
    let (app, _) = app_with(Arc::new(FailingScorer));

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": LIVENESS_MESSAGE }));
}

#[tokio::test]
async fn test_high_risk_prediction() {
    let scorer = StubScorer::new(0.72);
    let (app, metrics) = app_with(scorer.clone());

    let (status, body) = predict(app, &scenario_payload()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "risk_level": "High Risk",
            "risk_probability": 0.72,
            "recommendation": HIGH_RISK_RECOMMENDATION,
            "disclaimer": DISCLAIMER,
        })
    );
    assert_eq!(
        *scorer.last_features.lock().unwrap(),
        vec![63.0, 1.0, 3.0, 145.0, 233.0, 1.0, 0.0, 150.0, 0.0, 2.3, 0.0, 0.0, 1.0]
    );
    assert_eq!(metrics.predictions_served.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_low_risk_prediction() {
    let (app, _) = app_with(StubScorer::new(0.10));

    let (status, body) = predict(app, &scenario_payload()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["risk_level"], "Low Risk");
    assert_eq!(body["risk_probability"], 0.1);
    assert_eq!(body["recommendation"], LOW_RISK_RECOMMENDATION);
    assert_eq!(body["disclaimer"], DISCLAIMER);
}

#[tokio::test]
async fn test_cautionary_band_prediction() {
    let (app, _) = app_with(StubScorer::new(0.45));

    let (status, body) = predict(app, &scenario_payload()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["risk_level"], "Low Risk");
    assert_eq!(body["risk_probability"], 0.45);
    assert_eq!(body["recommendation"], HIGH_RISK_RECOMMENDATION);
}

#[tokio::test]
async fn test_threshold_boundaries() {
    let (app, _) = app_with(StubScorer::new(0.5));
    let (_, body) = predict(app, &scenario_payload()).await;
    assert_eq!(body["risk_level"], "Low Risk");
    assert_eq!(body["recommendation"], HIGH_RISK_RECOMMENDATION);

    let (app, _) = app_with(StubScorer::new(0.4));
    let (_, body) = predict(app, &scenario_payload()).await;
    assert_eq!(body["risk_level"], "Low Risk");
    assert_eq!(body["recommendation"], LOW_RISK_RECOMMENDATION);
}

#[tokio::test]
async fn test_identical_requests_identical_responses() {
    let (app, _) = app_with(StubScorer::new(0.6789));

    let (_, first) = predict(app.clone(), &scenario_payload()).await;
    let (_, second) = predict(app, &scenario_payload()).await;

    assert_eq!(first, second);
    assert_eq!(first["risk_probability"], 0.679);
}

#[tokio::test]
async fn test_extra_field_rejected_without_inference() {
    let scorer = StubScorer::new(0.72);
    let (app, metrics) = app_with(scorer.clone());

    let mut payload = scenario_payload();
    payload["smoker"] = json!(1);
    let (status, body) = predict(app, &payload).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["detail"][0]["field"], "smoker");
    assert_eq!(scorer.calls(), 0);
    assert_eq!(metrics.validation_rejections.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_missing_field_rejected() {
    let scorer = StubScorer::new(0.72);
    let (app, _) = app_with(scorer.clone());

    let mut payload = scenario_payload();
    payload.as_object_mut().unwrap().remove("thalach");
    let (status, body) = predict(app, &payload).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"][0]["field"], "thalach");
    assert_eq!(body["detail"][0]["message"], "field required");
    assert_eq!(scorer.calls(), 0);
}

#[tokio::test]
async fn test_non_numeric_value_rejected() {
    let scorer = StubScorer::new(0.72);
    let (app, _) = app_with(scorer.clone());

    let mut payload = scenario_payload();
    payload["chol"] = json!("high");
    let (status, body) = predict(app, &payload).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"][0]["field"], "chol");
    assert_eq!(scorer.calls(), 0);
}

#[tokio::test]
async fn test_fractional_measurement_rejected() {
    let scorer = StubScorer::new(0.72);
    let (app, metrics) = app_with(scorer.clone());

    let mut payload = scenario_payload();
    payload["age"] = json!(63.5);
    let (status, body) = predict(app, &payload).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["detail"][0]["field"], "age");
    assert_eq!(scorer.calls(), 0);
    assert_eq!(metrics.validation_rejections.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_column_header_payload_accepted() {
    let scorer = StubScorer::new(0.72);
    let (app, _) = app_with(scorer.clone());

    let payload = json!({
        "AGE": 63, "SEX": 1, "CP": 3, "TRESTBPS": 145, "CHOL": 233,
        "FBS": 1, "RESTECG": 0, "THALACH": 150, "EXANG": 0,
        "OLDPEAK": 2.3, "SLOPE": 0, "CA": 0, "THAL": 1
    });
    let (status, body) = predict(app, &payload).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["risk_level"], "High Risk");
    assert_eq!(
        *scorer.last_features.lock().unwrap(),
        vec![63.0, 1.0, 3.0, 145.0, 233.0, 1.0, 0.0, 150.0, 0.0, 2.3, 0.0, 0.0, 1.0]
    );
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let scorer = StubScorer::new(0.72);
    let (app, _) = app_with(scorer.clone());

    let (status, body) = send(app, predict_request("{\"age\": 63,".to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["detail"][0]["field"], "body");
    assert_eq!(scorer.calls(), 0);
}

#[tokio::test]
async fn test_missing_content_type_rejected() {
    let scorer = StubScorer::new(0.72);
    let (app, _) = app_with(scorer.clone());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/predict")
        .body(Body::from(scenario_payload().to_string()))
        .unwrap();
    let (status, _) = send(app, request).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(scorer.calls(), 0);
}

#[tokio::test]
async fn test_inference_failure_is_generic_500() {
    let (app, metrics) = app_with(Arc::new(FailingScorer));

    let (status, body) = predict(app, &scenario_payload()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "inference_error");
    assert!(!body.to_string().contains("secret detail"));
    assert_eq!(metrics.inference_failures.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_cors_preflight_allows_configured_origin() {
    let (app, _) = app_with(StubScorer::new(0.72));

    let response = app.oneshot(preflight("https://clinic.example")).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("https://clinic.example")
    );
}

#[tokio::test]
async fn test_cors_rejects_unknown_origin() {
    let (app, _) = app_with(StubScorer::new(0.72));

    let response = app.oneshot(preflight("https://elsewhere.example")).await.unwrap();

    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn test_cors_empty_or_wildcard_origins_allow_any() {
    for origins in [vec![], vec!["*".to_string()]] {
        let cors = CorsConfig {
            allowed_origins: origins,
            ..cors_config()
        };
        let (app, _) = app_with_cors(StubScorer::new(0.72), &cors);

        let response = app.oneshot(preflight("https://anywhere.example")).await.unwrap();

        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
    }
}
