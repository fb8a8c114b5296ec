#![forbid(unsafe_code)]

use std::net::SocketAddr;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use survey_adapter::config::AdapterConfig;
use survey_adapter::rate_limiter::RateLimitConfig;
use survey_adapter::{build_router, AppState};
use survey_engines::submission_client::{
    SubmissionClient, SubmissionClientConfig, SubmissionError,
};
use survey_kernel_contracts::assignment::DragPayload;
use survey_kernel_contracts::role::RoleId;
use survey_kernel_contracts::session::SurveyPage;
use survey_kernel_contracts::submission::{
    ParticipantPayload, SurveyResponsePayload, SurveySubmissionRequest,
};
use survey_os::flow::PageFlowController;
use survey_os::intake::IntakeForm;
use survey_storage::kv::InMemoryKeyValueStore;
use tokio::net::TcpListener;

fn generous_limit() -> RateLimitConfig {
    RateLimitConfig {
        max_requests: 1_000,
        window: Duration::from_secs(900),
    }
}

async fn spawn_server(state: AppState, config: AdapterConfig) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(state, &config);
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    format!("http://{addr}")
}

async fn spawn_default() -> (String, AppState) {
    let state = AppState::in_memory(generous_limit());
    let config = AdapterConfig {
        rate_limit: generous_limit(),
        ..AdapterConfig::default()
    };
    (spawn_server(state.clone(), config).await, state)
}

fn client(base_url: &str) -> SubmissionClient {
    let mut config = SubmissionClientConfig::with_base_url(base_url);
    config.timeout_ms = Some(5_000);
    SubmissionClient::new(config)
}

/// Status and JSON body, whatever the status class.
fn read(result: Result<ureq::Response, ureq::Error>) -> (u16, ureq::Response) {
    match result {
        Ok(response) => (response.status(), response),
        Err(ureq::Error::Status(status, response)) => (status, response),
        Err(err) => panic!("transport failure: {err}"),
    }
}

async fn post_raw(url: String, body: String) -> (u16, Value) {
    tokio::task::spawn_blocking(move || {
        let (status, response) = read(
            ureq::post(&url)
                .set("Content-Type", "application/json")
                .send_string(&body),
        );
        (status, response.into_json::<Value>().unwrap())
    })
    .await
    .unwrap()
}

async fn get_raw(url: String) -> (u16, ureq::Response) {
    tokio::task::spawn_blocking(move || read(ureq::get(&url).call()))
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn at_http_01_health_reports_running_with_timestamp() {
    let (base, _) = spawn_default().await;
    let health = tokio::task::spawn_blocking(move || client(&base).health())
        .await
        .unwrap()
        .unwrap();
    assert!(health.success);
    assert_eq!(health.message, "Survey API is running");
    assert!(chrono::DateTime::parse_from_rfc3339(&health.timestamp).is_ok());
}

#[tokio::test(flavor = "multi_thread")]
async fn at_http_02_stats_start_at_zero() {
    let (base, _) = spawn_default().await;
    let stats = tokio::task::spawn_blocking(move || client(&base).stats())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stats.total_participants, 0);
    assert_eq!(stats.total_submissions, 0);
    assert_eq!(stats.completed_submissions, 0);
    assert_eq!(stats.completion_rate, "0.00");
}

#[tokio::test(flavor = "multi_thread")]
async fn at_http_03_full_session_submits_through_the_page_flow() {
    let (base, state) = spawn_default().await;
    let base_for_flow = base.clone();

    let (flow, receipt) = tokio::task::spawn_blocking(move || {
        let mut flow = PageFlowController::resume_with_rng(
            InMemoryKeyValueStore::new(),
            StdRng::seed_from_u64(2024),
        );
        flow.submit_intake(&IntakeForm::new("36", "Pharmacology"))
            .unwrap();
        flow.continue_to_assignment().unwrap();
        let icon_ids: Vec<String> = flow
            .assignment()
            .unwrap()
            .available_icons()
            .iter()
            .map(|icon| icon.id.clone())
            .collect();
        for (idx, icon_id) in icon_ids.into_iter().enumerate() {
            flow.drop_on_role(RoleId(idx as u8 + 1), &DragPayload::New { icon_id })
                .unwrap();
        }
        let receipt = flow.submit_survey(&client(&base_for_flow)).unwrap();
        (flow, receipt)
    })
    .await
    .unwrap();

    assert_eq!(flow.current_page(), SurveyPage::Completed);
    assert!(flow.is_submitted());
    assert_eq!(receipt.count, 14);

    let rows = {
        let repo = state.repo().lock().unwrap();
        repo.responses_for_submission(&receipt.submission_id).unwrap()
    };
    assert_eq!(rows.len(), 14);
    assert_eq!(rows[0].response_order, 0);
    assert_eq!(rows[0].role_title, "Conceptualization");

    let stats = tokio::task::spawn_blocking(move || client(&base).stats())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stats.total_participants, 1);
    assert_eq!(stats.total_submissions, 1);
    assert_eq!(stats.completion_rate, "100.00");
}

#[tokio::test(flavor = "multi_thread")]
async fn at_http_04_validation_failures_list_every_field() {
    let (base, state) = spawn_default().await;
    let body = json!({
        "participant": {"age": 12, "field_of_study": "x"},
        "responses": []
    });
    let (status, json) = post_raw(format!("{base}/api/survey/submit"), body.to_string()).await;
    assert_eq!(status, 400);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Validation failed");
    assert!(json.get("code").is_none());
    let fields: Vec<&str> = json["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(
        fields,
        vec!["participant.age", "participant.field_of_study", "responses"]
    );
    assert_eq!(state.repo().lock().unwrap().participant_count().unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn at_http_05_client_surfaces_server_rejection_message() {
    let (base, _) = spawn_default().await;
    let err = tokio::task::spawn_blocking(move || {
        client(&base).submit_request(&SurveySubmissionRequest {
            participant: ParticipantPayload {
                age: 150,
                field_of_study: "Biology".to_string(),
            },
            responses: vec![SurveyResponsePayload {
                role_title: "Software".to_string(),
                assigned_icon: "Gear".to_string(),
                response_order: 0,
            }],
            survey_version: None,
        })
    })
    .await
    .unwrap()
    .unwrap_err();
    assert_eq!(
        err,
        SubmissionError::Server {
            status: 400,
            message: "Validation failed".to_string()
        }
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn at_http_06_malformed_json_is_a_validation_failure() {
    let (base, _) = spawn_default().await;
    let (status, json) =
        post_raw(format!("{base}/api/survey/submit"), "{\"participant\":".to_string()).await;
    assert_eq!(status, 400);
    assert_eq!(json["error"], "Validation failed");
    assert_eq!(json["details"][0]["field"], "body");
}

#[tokio::test(flavor = "multi_thread")]
async fn at_http_07_unknown_route_is_not_found() {
    let (base, _) = spawn_default().await;
    let (status, response) = get_raw(format!("{base}/api/survey/unknown")).await;
    assert_eq!(status, 404);
    let json: Value = response.into_json().unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Endpoint not found");
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test(flavor = "multi_thread")]
async fn at_http_08_rate_limit_rejects_after_budget() {
    let limit = RateLimitConfig {
        max_requests: 2,
        window: Duration::from_secs(900),
    };
    let config = AdapterConfig {
        rate_limit: limit,
        ..AdapterConfig::default()
    };
    let base = spawn_server(AppState::in_memory(limit), config).await;

    for _ in 0..2 {
        let (status, _) = get_raw(format!("{base}/api/health")).await;
        assert_eq!(status, 200);
    }
    let (status, response) = get_raw(format!("{base}/api/health")).await;
    assert_eq!(status, 429);
    assert!(response.header("retry-after").is_some());
    let json: Value = response.into_json().unwrap();
    assert_eq!(json["code"], "RATE_LIMITED");
    assert_eq!(
        json["error"],
        "Too many requests from this IP, please try again later."
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn at_http_09_cors_allows_only_configured_origins() {
    let (base, _) = spawn_default().await;
    let (allowed, denied) = tokio::task::spawn_blocking(move || {
        let preflight = |origin: &str| {
            let (_, response) = read(
                ureq::request("OPTIONS", &format!("{base}/api/survey/submit"))
                    .set("Origin", origin)
                    .set("Access-Control-Request-Method", "POST")
                    .call(),
            );
            response
                .header("access-control-allow-origin")
                .map(str::to_string)
        };
        (
            preflight("http://localhost:5173"),
            preflight("https://elsewhere.example"),
        )
    })
    .await
    .unwrap();
    assert_eq!(allowed.as_deref(), Some("http://localhost:5173"));
    assert_eq!(denied, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn at_http_10_responses_carry_security_headers() {
    let (base, _) = spawn_default().await;
    let (_, response) = get_raw(format!("{base}/api/health")).await;
    assert_eq!(response.header("x-content-type-options"), Some("nosniff"));
    assert_eq!(response.header("x-frame-options"), Some("SAMEORIGIN"));
}
