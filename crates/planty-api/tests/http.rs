use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::Duration;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use planty_api::auth::AppStateInner;
use planty_api::router::router;
use planty_api::token::TokenService;
use planty_bus::{ColorCommand, ColorPublisher, PublishError};
use planty_db::Database;
use planty_vision::{PlantAnalyzer, VisionError};

#[derive(Default)]
struct RecordingPublisher {
    sent: Mutex<Vec<ColorCommand>>,
}

impl ColorPublisher for RecordingPublisher {
    fn publish(&self, cmd: ColorCommand) -> Result<(), PublishError> {
        self.sent.lock().unwrap().push(cmd);
        Ok(())
    }
}

struct CannedAnalyzer;

#[async_trait]
impl PlantAnalyzer for CannedAnalyzer {
    async fn diagnose(&self, plant_type: &str) -> Result<String, VisionError> {
        Ok(format!("The {} looks healthy.", plant_type))
    }
}

struct BlindAnalyzer;

#[async_trait]
impl PlantAnalyzer for BlindAnalyzer {
    async fn diagnose(&self, _plant_type: &str) -> Result<String, VisionError> {
        Err(VisionError::NoFrame)
    }
}

struct Harness {
    app: Router,
    publisher: Arc<RecordingPublisher>,
}

impl Harness {
    fn new(analyzer: Option<Arc<dyn PlantAnalyzer>>) -> Self {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let publisher = Arc::new(RecordingPublisher::default());
        let state = AppStateInner::new(
            db,
            TokenService::new("test-secret", Duration::hours(24)),
            publisher.clone(),
            analyzer,
        );
        Self {
            app: router(state),
            publisher,
        }
    }

    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        (status, value)
    }

    async fn signup(&self, user_id: &str, password: &str, email: &str) -> Value {
        let (status, body) = self
            .call(
                Method::POST,
                "/auth/signup",
                None,
                Some(json!({"userId": user_id, "nickname": user_id, "userPw": password, "email": email})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    async fn login(&self, user_id: &str, password: &str) -> Value {
        let (status, body) = self
            .call(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({"userId": user_id, "userPw": password})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    async fn token_for(&self, user_id: &str, password: &str, email: &str) -> String {
        self.signup(user_id, password, email).await;
        self.login(user_id, password).await["token"]
            .as_str()
            .unwrap()
            .to_string()
    }
}

#[tokio::test]
async fn alice_end_to_end() {
    let h = Harness::new(None);

    let signup = h.signup("alice", "pw1", "a@x.com").await;
    assert_eq!(signup["success"], true);

    let login = h.login("alice", "pw1").await;
    assert_eq!(login["success"], true);
    assert_eq!(login["requiresPlantRegistration"], true);
    assert_eq!(login["userData"]["userId"], "alice");
    assert_eq!(login["userData"]["email"], "a@x.com");
    let token = login["token"].as_str().unwrap().to_string();

    let (status, created) = h
        .call(
            Method::POST,
            "/plants",
            Some(token.as_str()),
            Some(json!({"name": "Fern", "type": "fern", "watering_cycle": 7})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["success"], true);
    let plant_id = created["plant"]["id"].as_i64().unwrap();

    let (status, list) = h.call(Method::GET, "/plants", Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["owner_id"], "alice");
    assert_eq!(list[0]["type"], "fern");

    let (status, led) = h
        .call(
            Method::POST,
            &format!("/plants/{}/led", plant_id),
            Some(token.as_str()),
            Some(json!({"plant_id": plant_id, "mode": "glow", "r": 200, "g": 100, "b": 50, "strength": 128})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(led["success"], true);
    assert_eq!(led["led"]["r"], 200);

    {
        let sent = h.publisher.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!((sent[0].r - 50.196).abs() < 0.01);
        assert!((sent[0].g - 25.098).abs() < 0.01);
        assert!((sent[0].b - 12.549).abs() < 0.01);
    }

    let relogin = h.login("alice", "pw1").await;
    assert_eq!(relogin["requiresPlantRegistration"], false);
}

#[tokio::test]
async fn signup_conflicts_are_envelopes() {
    let h = Harness::new(None);
    h.signup("alice", "pw1", "a@x.com").await;

    let dup_id = h.signup("alice", "pw2", "other@x.com").await;
    assert_eq!(dup_id["success"], false);
    assert_eq!(dup_id["errorCode"], "USER_EXISTS");

    let dup_email = h.signup("bob", "pw2", "a@x.com").await;
    assert_eq!(dup_email["success"], false);
    assert_eq!(dup_email["errorCode"], "EMAIL_EXISTS");
}

#[tokio::test]
async fn failed_logins_issue_no_token() {
    let h = Harness::new(None);
    h.signup("alice", "pw1", "a@x.com").await;

    let wrong = h.login("alice", "wrong").await;
    assert_eq!(wrong["success"], false);
    assert_eq!(wrong["message"], "Incorrect password");
    assert!(wrong["token"].is_null());

    let unknown = h.login("nobody", "pw1").await;
    assert_eq!(unknown["success"], false);
    assert_eq!(unknown["message"], "User not found");
    assert!(unknown["token"].is_null());
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let h = Harness::new(None);

    let (status, body) = h.call(Method::GET, "/plants", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["errorCode"], "INVALID_CREDENTIAL");

    let (status, _) = h.call(Method::GET, "/plants", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Valid signature, but the subject never signed up.
    let ghost = TokenService::new("test-secret", Duration::hours(1)).issue("ghost").unwrap();
    let (status, _) = h.call(Method::GET, "/plants", Some(ghost.as_str()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn foreign_plant_matches_missing_plant() {
    let h = Harness::new(None);
    let alice = h.token_for("alice", "pw1", "a@x.com").await;
    let bob = h.token_for("bob", "pw2", "b@x.com").await;

    let (_, created) = h
        .call(
            Method::POST,
            "/plants",
            Some(alice.as_str()),
            Some(json!({"name": "Fern", "type": "fern", "watering_cycle": 7})),
        )
        .await;
    let plant_id = created["plant"]["id"].as_i64().unwrap();

    let (foreign_status, foreign) = h.call(Method::GET, &format!("/plants/{}", plant_id), Some(bob.as_str()), None).await;
    let (missing_status, missing) = h.call(Method::GET, "/plants/9999", Some(bob.as_str()), None).await;
    assert_eq!(foreign_status, missing_status);
    assert_eq!(foreign, missing);
    assert_eq!(foreign["success"], false);

    let (status, body) = h
        .call(
            Method::POST,
            &format!("/plants/{}/led", plant_id),
            Some(bob.as_str()),
            Some(json!({"mode": "glow", "r": 1, "g": 2, "b": 3})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(h.publisher.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn led_overwrite_and_not_configured() {
    let h = Harness::new(None);
    let token = h.token_for("alice", "pw1", "a@x.com").await;
    let (_, created) = h
        .call(
            Method::POST,
            "/plants",
            Some(token.as_str()),
            Some(json!({"name": "Fern", "type": "fern", "watering_cycle": 7})),
        )
        .await;
    let uri = format!("/plants/{}/led", created["plant"]["id"]);

    let (status, unset) = h.call(Method::GET, &uri, Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unset["success"], false);
    assert!(unset["led"].is_null());

    for (mode, r) in [("glow", 10), ("pulse", 99)] {
        let (status, _) = h
            .call(Method::POST, &uri, Some(token.as_str()), Some(json!({"mode": mode, "r": r, "g": 0, "b": 0})))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, led) = h.call(Method::GET, &uri, Some(token.as_str()), None).await;
    assert_eq!(led["success"], true);
    assert_eq!(led["led"]["mode"], "pulse");
    assert_eq!(led["led"]["r"], 99);
    assert_eq!(led["led"]["strength"], 128);

    let (status, body) = h
        .call(Method::POST, &uri, Some(token.as_str()), Some(json!({"mode": "glow", "r": 999, "g": 0, "b": 0})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorCode"], "BAD_REQUEST");
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let h = Harness::new(None);
    let (status, body) = h
        .call(Method::POST, "/auth/login", None, Some(json!({"userId": "alice"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn analysis_history_over_http() {
    let h = Harness::new(None);
    let token = h.token_for("alice", "pw1", "a@x.com").await;
    let (_, created) = h
        .call(
            Method::POST,
            "/plants",
            Some(token.as_str()),
            Some(json!({"name": "Fern", "type": "fern", "watering_cycle": 7})),
        )
        .await;
    let uri = format!("/plants/{}/ai-analysis", created["plant"]["id"]);

    let (status, _) = h.call(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = h.call(Method::POST, &uri, None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for text in ["Leaves drooping.", "Recovered after watering."] {
        let (status, saved) = h
            .call(Method::POST, &uri, None, Some(json!({"analysis_text": text})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["success"], true);
    }

    let (status, latest) = h.call(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest["analysis_text"], "Recovered after watering.");
}

#[tokio::test]
async fn run_analysis_uses_plant_type() {
    let analyzer: Arc<dyn PlantAnalyzer> = Arc::new(CannedAnalyzer);
    let h = Harness::new(Some(analyzer));
    let token = h.token_for("alice", "pw1", "a@x.com").await;
    let (_, created) = h
        .call(
            Method::POST,
            "/plants",
            Some(token.as_str()),
            Some(json!({"name": "Fern", "type": "boston fern", "watering_cycle": 7})),
        )
        .await;
    let plant_id = created["plant"]["id"].as_i64().unwrap();

    let (status, run) = h
        .call(Method::POST, &format!("/plants/{}/ai-analysis/run", plant_id), Some(token.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(run["analysis_text"], "The boston fern looks healthy.");

    let (_, latest) = h
        .call(Method::GET, &format!("/plants/{}/ai-analysis", plant_id), None, None)
        .await;
    assert_eq!(latest["id"], run["id"]);
}

#[tokio::test]
async fn run_analysis_without_analyzer_is_upstream_failure() {
    let h = Harness::new(None);
    let token = h.token_for("alice", "pw1", "a@x.com").await;
    let (_, created) = h
        .call(
            Method::POST,
            "/plants",
            Some(token.as_str()),
            Some(json!({"name": "Fern", "type": "fern", "watering_cycle": 7})),
        )
        .await;

    let (status, body) = h
        .call(
            Method::POST,
            &format!("/plants/{}/ai-analysis/run", created["plant"]["id"]),
            Some(token.as_str()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["errorCode"], "UPSTREAM_FAILURE");

    let (status, body) = h
        .call(Method::POST, "/plants/9999/ai-analysis/run", Some(token.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errorCode"], "NOT_FOUND");
}

#[tokio::test]
async fn failed_diagnosis_is_upstream_failure_and_stores_nothing() {
    let analyzer: Arc<dyn PlantAnalyzer> = Arc::new(BlindAnalyzer);
    let h = Harness::new(Some(analyzer));
    let token = h.token_for("alice", "pw1", "a@x.com").await;
    let (_, created) = h
        .call(
            Method::POST,
            "/plants",
            Some(token.as_str()),
            Some(json!({"name": "Fern", "type": "fern", "watering_cycle": 7})),
        )
        .await;
    let plant_id = created["plant"]["id"].as_i64().unwrap();

    let (status, body) = h
        .call(Method::POST, &format!("/plants/{}/ai-analysis/run", plant_id), Some(token.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
    assert_eq!(body["errorCode"], "UPSTREAM_FAILURE");

    let (status, _) = h
        .call(Method::GET, &format!("/plants/{}/ai-analysis", plant_id), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_plant_id_is_bad_request_envelope() {
    let h = Harness::new(None);
    let token = h.token_for("alice", "pw1", "a@x.com").await;

    for (method, uri, token) in [
        (Method::GET, "/plants/abc", Some(token.as_str())),
        (Method::GET, "/plants/abc/led", Some(token.as_str())),
        (Method::GET, "/plants/abc/ai-analysis", None),
    ] {
        let (status, body) = h.call(method, uri, token, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["success"], false, "{uri}");
        assert_eq!(body["errorCode"], "BAD_REQUEST", "{uri}");
    }
}

#[tokio::test]
async fn refresh_reissues_token() {
    let h = Harness::new(None);
    let token = h.token_for("alice", "pw1", "a@x.com").await;

    let (status, body) = h.call(Method::POST, "/auth/refresh", Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let fresh = body["token"].as_str().unwrap();

    let (status, _) = h.call(Method::GET, "/plants", Some(fresh), None).await;
    assert_eq!(status, StatusCode::OK);
}
