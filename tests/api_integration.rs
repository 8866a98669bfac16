use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use content_hub::api::routes::create_router;
use content_hub::logic::HubService;
use content_hub::model::SequenceIdGenerator;
use content_hub::seed::{
    load_seed_data, ACCOUNT_BANANAS, ACCOUNT_TESTING, LIBRARY_HOUSE, PROGRAM_LEAVES,
    TEMPLATE_LOFI,
};
use content_hub::store::InMemoryStore;
use content_hub::SchemaDescriptor;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

// Test client wrapper around the in-process router
struct TestClient {
    app: Router,
    headers: Vec<(&'static str, String)>,
}

impl TestClient {
    async fn new() -> Self {
        let store = InMemoryStore::new();
        load_seed_data(&store).await.unwrap();
        let service = HubService::new(Arc::new(store), SchemaDescriptor::standard().unwrap())
            .with_id_generator(SequenceIdGenerator::new("api"));

        Self {
            app: create_router::<InMemoryStore>().with_state(Arc::new(service)),
            headers: Vec::new(),
        }
    }

    fn as_user(mut self, user_id: &str, accounts: &[&str], roles: &str) -> Self {
        self.headers = vec![
            ("x-user-id", user_id.to_string()),
            ("x-account-ids", accounts.join(",")),
            ("x-user-roles", roles.to_string()),
        ];
        self
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(path);
        for (name, value) in &self.headers {
            request = request.header(*name, value);
        }
        let request = match body {
            Some(json) => request
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn post(&self, path: &str, json: Value) -> (StatusCode, Value) {
        self.send(Method::POST, path, Some(json)).await
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.send(Method::GET, path, None).await
    }
}

async fn artist() -> TestClient {
    TestClient::new()
        .await
        .as_user("artist-1", &[ACCOUNT_TESTING, ACCOUNT_BANANAS], "artist")
}

#[tokio::test]
async fn test_health() {
    let client = TestClient::new().await;
    let (status, body) = client.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_clone_program_then_read_it_back() {
    let client = artist().await;

    let (status, body) = client
        .post(
            &format!("/programs/{}/clone", PROGRAM_LEAVES),
            json!({ "name": "cannons fifty nine", "library_id": LIBRARY_HOUSE }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["top"]["kind"], "program");
    assert_eq!(body["top"]["row"]["attributes"]["key"], "C#");
    assert_eq!(body["counts"]["program_sequence_chord"], 3);
    assert_eq!(body["children"].as_array().unwrap().len(), 26);

    let new_id = body["top"]["row"]["id"].as_str().unwrap().to_string();

    let (status, program) = client.get(&format!("/programs/{}", new_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(program["id"], new_id.as_str());
    assert_eq!(program["name"], "cannons fifty nine");
    assert_eq!(program["library_id"], LIBRARY_HOUSE);

    let (status, graph) = client.get(&format!("/programs/{}/graph", new_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(graph["children"].as_array().unwrap().len(), 26);
}

#[tokio::test]
async fn test_clone_template_forces_preview() {
    let client = artist().await;
    let (status, body) = client
        .post(&format!("/templates/{}/clone", TEMPLATE_LOFI), json!({}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["top"]["row"]["attributes"]["type"], "Preview");
    assert_eq!(body["top"]["row"]["attributes"]["ship_key"], "lofi2");
    assert_eq!(body["counts"]["template_binding"], 3);
}

#[tokio::test]
async fn test_clone_error_statuses() {
    let client = artist().await;
    let path = format!("/programs/{}/clone", PROGRAM_LEAVES);

    let (status, body) = client.post(&path, json!({ "tempo": -3 })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("tempo"));

    let (status, _) = client.post("/programs/no-such-program/clone", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = client
        .post(&path, json!({ "library_id": "lib-nowhere" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = client
        .post("/program_voices/leaves-voice-drums/clone", json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = client.post("/widgets/w1/clone", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = client.post(&path, json!(["not", "an", "object"])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_access_is_enforced() {
    let path = format!("/programs/{}/clone", PROGRAM_LEAVES);

    let listener = TestClient::new()
        .await
        .as_user("listener-1", &[ACCOUNT_TESTING], "user");
    let (status, _) = listener.post(&path, json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    // reading is fine without the artist role
    let (status, _) = listener.get(&format!("/programs/{}", PROGRAM_LEAVES)).await;
    assert_eq!(status, StatusCode::OK);

    let outsider = TestClient::new()
        .await
        .as_user("artist-2", &[ACCOUNT_BANANAS], "artist");
    let (status, _) = outsider.get(&format!("/programs/{}", PROGRAM_LEAVES)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let confused = TestClient::new()
        .await
        .as_user("artist-3", &[ACCOUNT_TESTING], "wizard");
    let (status, _) = confused.post(&path, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
