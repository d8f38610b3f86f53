//! In-process double of the GCS JSON API
//!
//! Serves the handful of endpoints [`crate::GcsBackend`] calls, with real
//! generation preconditions, so the HTTP adapter and the CLI can be tested
//! end to end without cloud credentials.

use std::{
    collections::{HashMap, HashSet},
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tokio::task::JoinHandle;

use crate::Config;

#[derive(Debug, Clone)]
struct MockObject {
    data: Vec<u8>,
    generation: i64,
}

#[derive(Debug, Default)]
struct MockState {
    buckets: HashSet<String>,
    objects: HashMap<(String, String), MockObject>,
    next_generation: i64,
    failures_remaining: usize,
    last_authorization: Option<String>,
}

impl MockState {
    fn bump_generation(&mut self) -> i64 {
        self.next_generation += 1;
        self.next_generation
    }

    /// Record the caller and consume one injected failure, if any
    fn intercept(&mut self, headers: &HeaderMap) -> Option<Response> {
        self.last_authorization = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        if self.failures_remaining > 0 {
            self.failures_remaining -= 1;
            return Some((StatusCode::SERVICE_UNAVAILABLE, "injected failure").into_response());
        }
        None
    }
}

type Shared = Arc<Mutex<MockState>>;

fn lock(state: &Shared) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// GCS JSON API double listening on a random localhost port
///
/// The server task is aborted when this value is dropped.
pub struct MockGcsServer {
    addr: SocketAddr,
    state: Shared,
    task: JoinHandle<()>,
}

impl MockGcsServer {
    /// Bind to `127.0.0.1:0` and start serving on the current runtime
    pub async fn start() -> std::io::Result<Self> {
        let state: Shared = Arc::new(Mutex::new(MockState {
            next_generation: 1_000,
            ..MockState::default()
        }));

        let app = Router::new()
            .route("/storage/v1/b", post(insert_bucket))
            .route("/storage/v1/b/:bucket", get(get_bucket))
            .route(
                "/storage/v1/b/:bucket/o/:object",
                get(get_object).delete(delete_object),
            )
            .route("/upload/storage/v1/b/:bucket/o", post(upload_object))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { addr, state, task })
    }

    /// Base URL to use as the storage endpoint
    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Default configuration pointed at this server and `bucket`
    pub fn config(&self, bucket: &str) -> Config {
        let mut config = Config::default();
        config.bucket = bucket.to_string();
        config.storage.endpoint = self.endpoint();
        config.storage.request_timeout_secs = 5;
        config
    }

    pub fn create_bucket(&self, bucket: &str) {
        lock(&self.state).buckets.insert(bucket.to_string());
    }

    pub fn has_bucket(&self, bucket: &str) -> bool {
        lock(&self.state).buckets.contains(bucket)
    }

    /// Current payload of `name`, if it exists
    pub fn object(&self, bucket: &str, name: &str) -> Option<Vec<u8>> {
        lock(&self.state)
            .objects
            .get(&(bucket.to_string(), name.to_string()))
            .map(|obj| obj.data.clone())
    }

    /// Unconditionally write `name`, as a foreign writer would
    pub fn put_object(&self, bucket: &str, name: &str, data: &[u8]) -> i64 {
        let mut state = lock(&self.state);
        let generation = state.bump_generation();
        state.objects.insert(
            (bucket.to_string(), name.to_string()),
            MockObject {
                data: data.to_vec(),
                generation,
            },
        );
        generation
    }

    /// Unconditionally delete `name`, returning whether it existed
    pub fn remove_object(&self, bucket: &str, name: &str) -> bool {
        lock(&self.state)
            .objects
            .remove(&(bucket.to_string(), name.to_string()))
            .is_some()
    }

    /// Answer the next `count` requests with `503 Service Unavailable`
    pub fn fail_next_requests(&self, count: usize) {
        lock(&self.state).failures_remaining = count;
    }

    /// `Authorization` header of the most recent request
    pub fn last_authorization(&self) -> Option<String> {
        lock(&self.state).last_authorization.clone()
    }
}

impl Drop for MockGcsServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn object_resource(bucket: &str, name: &str, obj: &MockObject) -> serde_json::Value {
    json!({
        "kind": "storage#object",
        "bucket": bucket,
        "name": name,
        "generation": obj.generation.to_string(),
        "size": obj.data.len().to_string(),
        "timeCreated": Utc::now().to_rfc3339(),
    })
}

fn parse_generation(raw: Option<&str>) -> Result<Option<i64>, Response> {
    raw.map(str::parse::<i64>)
        .transpose()
        .map_err(|_| (StatusCode::BAD_REQUEST, "invalid ifGenerationMatch").into_response())
}

#[derive(Debug, Deserialize)]
struct ProjectQuery {
    project: String,
}

#[derive(Debug, Deserialize)]
struct BucketBody {
    name: String,
}

async fn insert_bucket(
    State(state): State<Shared>,
    Query(query): Query<ProjectQuery>,
    headers: HeaderMap,
    Json(body): Json<BucketBody>,
) -> Response {
    let mut state = lock(&state);
    if let Some(failure) = state.intercept(&headers) {
        return failure;
    }
    if query.project.is_empty() {
        return (StatusCode::BAD_REQUEST, "missing project").into_response();
    }
    if !state.buckets.insert(body.name.clone()) {
        return (StatusCode::CONFLICT, "bucket exists").into_response();
    }
    Json(json!({ "kind": "storage#bucket", "name": body.name })).into_response()
}

async fn get_bucket(
    State(state): State<Shared>,
    Path(bucket): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut state = lock(&state);
    if let Some(failure) = state.intercept(&headers) {
        return failure;
    }
    if state.buckets.contains(&bucket) {
        Json(json!({ "kind": "storage#bucket", "name": bucket })).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

#[derive(Debug, Deserialize)]
struct UploadQuery {
    name: String,
    #[serde(rename = "ifGenerationMatch")]
    if_generation_match: Option<String>,
}

async fn upload_object(
    State(state): State<Shared>,
    Path(bucket): Path<String>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut state = lock(&state);
    if let Some(failure) = state.intercept(&headers) {
        return failure;
    }
    if !state.buckets.contains(&bucket) {
        return StatusCode::NOT_FOUND.into_response();
    }
    let expected = match parse_generation(query.if_generation_match.as_deref()) {
        Ok(expected) => expected,
        Err(response) => return response,
    };

    let key = (bucket.clone(), query.name.clone());
    let current = state.objects.get(&key).map(|obj| obj.generation);
    let allowed = match expected {
        None => true,
        Some(0) => current.is_none(),
        Some(generation) => current == Some(generation),
    };
    if !allowed {
        return StatusCode::PRECONDITION_FAILED.into_response();
    }

    let obj = MockObject {
        data: body.to_vec(),
        generation: state.bump_generation(),
    };
    let resource = object_resource(&bucket, &query.name, &obj);
    state.objects.insert(key, obj);
    Json(resource).into_response()
}

#[derive(Debug, Deserialize)]
struct GetQuery {
    alt: Option<String>,
}

async fn get_object(
    State(state): State<Shared>,
    Path((bucket, object)): Path<(String, String)>,
    Query(query): Query<GetQuery>,
    headers: HeaderMap,
) -> Response {
    let mut state = lock(&state);
    if let Some(failure) = state.intercept(&headers) {
        return failure;
    }
    let Some(obj) = state.objects.get(&(bucket.clone(), object.clone())) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    if query.alt.as_deref() == Some("media") {
        (
            [("x-goog-generation", obj.generation.to_string())],
            obj.data.clone(),
        )
            .into_response()
    } else {
        Json(object_resource(&bucket, &object, obj)).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct DeleteQuery {
    #[serde(rename = "ifGenerationMatch")]
    if_generation_match: Option<String>,
}

async fn delete_object(
    State(state): State<Shared>,
    Path((bucket, object)): Path<(String, String)>,
    Query(query): Query<DeleteQuery>,
    headers: HeaderMap,
) -> Response {
    let mut state = lock(&state);
    if let Some(failure) = state.intercept(&headers) {
        return failure;
    }
    let expected = match parse_generation(query.if_generation_match.as_deref()) {
        Ok(expected) => expected,
        Err(response) => return response,
    };

    let key = (bucket, object);
    let Some(current) = state.objects.get(&key).map(|obj| obj.generation) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if expected.is_some_and(|generation| generation != current) {
        return StatusCode::PRECONDITION_FAILED.into_response();
    }

    state.objects.remove(&key);
    StatusCode::NO_CONTENT.into_response()
}
