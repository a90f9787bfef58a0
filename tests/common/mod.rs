//! Common test utilities
//!
//! Provides rustls initialisation and an in-process, stateful mock of the
//! Bastion REST API served by axum. The mock keeps objects per collection:
//!
//! - `POST <collection>/` stores the body under a generated `id`
//! - `GET <collection>/` lists, honouring `?q=<field>=<value>`
//! - `GET|PUT|DELETE <collection>/<key>` address one object by `id` or by any
//!   `*_name` field, PUT upserts
//!
//! Every request and its JSON body are recorded so tests can assert on the
//! wire traffic.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Once};
use tokio::sync::RwLock;
use wallix_bastion_provider::{BastionClient, ProviderBlock, ProviderConfig};

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        rustls::crypto::ring::default_provider()
            .install_default()
            .expect("Failed to install rustls crypto provider");
    });
}

/// Fully specified provider block so the environment never leaks in
pub fn provider_block(api_version: &str) -> ProviderBlock {
    ProviderBlock {
        ip: Some("bastion.test".to_string()),
        port: Some(443),
        token: Some("test-key".to_string()),
        user: Some("admin".to_string()),
        password: None,
        api_version: Some(api_version.to_string()),
    }
}

/// Client talking to `base_url` (`http://host:port/api`)
pub fn client_for(base_url: &str, api_version: &str) -> BastionClient {
    let config = ProviderConfig::from_block(provider_block(api_version)).with_base_url(base_url);
    BastionClient::new(&config).expect("Failed to build client")
}

#[derive(Clone, Debug, Default)]
pub struct MockBastion {
    collections: Arc<RwLock<BTreeMap<String, Vec<Map<String, Value>>>>>,
    requests: Arc<RwLock<Vec<String>>>,
    bodies: Arc<RwLock<Vec<(String, Value)>>>,
    next_id: Arc<AtomicU64>,
}

impl MockBastion {
    /// Serve the mock on an ephemeral port; returns the API base URL
    pub async fn start() -> (Self, String) {
        init_rustls();
        let mock = Self::default();
        let app = Router::new()
            .route("/api/version", get(version))
            .fallback(handle)
            .with_state(mock.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().expect("Failed to read mock address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock server failed");
        });
        (mock, format!("http://{addr}/api"))
    }

    /// Requests seen so far, as `METHOD /path?query`
    pub async fn requests(&self) -> Vec<String> {
        self.requests.read().await.clone()
    }

    /// JSON body of the last request matching `request` (`METHOD /path?query`)
    pub async fn body_of(&self, request: &str) -> Option<Value> {
        self.bodies
            .read()
            .await
            .iter()
            .rev()
            .find(|(seen, _)| seen == request)
            .map(|(_, body)| body.clone())
    }

    pub async fn objects(&self, collection: &str) -> Vec<Map<String, Value>> {
        self.collections
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Seed an object, generating its `id` when absent
    pub async fn insert(&self, collection: &str, object: Value) -> String {
        let mut object = object.as_object().cloned().expect("object expected");
        let id = self.id_for(&mut object);
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(object);
        id
    }

    /// Drop an object behind the provider's back
    pub async fn forget(&self, collection: &str, key: &str) {
        if let Some(objects) = self.collections.write().await.get_mut(collection) {
            objects.retain(|o| !matches_key(o, key));
        }
    }

    fn id_for(&self, object: &mut Map<String, Value>) -> String {
        if let Some(id) = object.get("id").and_then(Value::as_str) {
            return id.to_string();
        }
        let id = format!("{:032x}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        object.insert("id".to_string(), Value::from(id.clone()));
        id
    }
}

fn matches_key(object: &Map<String, Value>, key: &str) -> bool {
    object
        .iter()
        .any(|(field, value)| (field == "id" || field.ends_with("_name")) && value.as_str() == Some(key))
}

async fn version() -> Json<Value> {
    Json(json!({
        "version": "3.12",
        "version_decimal": 3.12,
        "wab_version": "10.0",
        "wab_version_decimal": 10.0,
        "wab_version_hotfix": "10.0.3",
        "wab_version_hotfix_decimal": 10.03,
        "wab_complete_version": "10.0.3.0"
    }))
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"error": message}))).into_response()
}

async fn handle(State(mock): State<MockBastion>, method: Method, uri: Uri, body: Bytes) -> Response {
    let path_and_query = uri.path_and_query().map_or_else(|| uri.path().to_string(), ToString::to_string);
    let request = format!("{method} {path_and_query}");
    mock.requests.write().await.push(request.clone());

    // /api/<version>/<collection...>[/<key>]
    let Some(rest) = uri
        .path()
        .strip_prefix("/api/")
        .and_then(|p| p.split_once('/'))
        .map(|(_, rest)| rest)
    else {
        return error(StatusCode::NOT_FOUND, "unknown route");
    };
    let (collection, key) = match rest.strip_suffix('/') {
        Some(collection) => (collection.to_string(), None),
        None => match rest.rsplit_once('/') {
            Some((collection, key)) => (collection.to_string(), Some(key.to_string())),
            None => (String::new(), Some(rest.to_string())),
        },
    };
    let payload: Option<Map<String, Value>> = if body.is_empty() {
        None
    } else {
        match serde_json::from_slice::<Map<String, Value>>(&body) {
            Ok(payload) => {
                mock.bodies
                    .write()
                    .await
                    .push((request, Value::Object(payload.clone())));
                Some(payload)
            }
            Err(_) => return error(StatusCode::BAD_REQUEST, "body is not a JSON object"),
        }
    };

    let mut collections = mock.collections.write().await;
    let objects = collections.entry(collection).or_default();
    match (method, key) {
        (Method::GET, None) => {
            let filter = uri.query().and_then(|q| {
                q.split('&')
                    .find_map(|pair| pair.strip_prefix("q="))
                    .and_then(|expr| expr.split_once('='))
                    .map(|(field, value)| (field.to_string(), value.to_string()))
            });
            let listed: Vec<Value> = objects
                .iter()
                .filter(|o| {
                    filter
                        .as_ref()
                        .is_none_or(|(field, value)| o.get(field).and_then(Value::as_str) == Some(value.as_str()))
                })
                .cloned()
                .map(Value::Object)
                .collect();
            Json(Value::Array(listed)).into_response()
        }
        (Method::GET, Some(key)) => match objects.iter().find(|o| matches_key(o, &key)) {
            Some(object) => Json(Value::Object(object.clone())).into_response(),
            None => error(StatusCode::NOT_FOUND, "not found"),
        },
        (Method::POST, None) => {
            let Some(mut object) = payload else {
                return error(StatusCode::BAD_REQUEST, "missing body");
            };
            mock.id_for(&mut object);
            objects.push(object);
            StatusCode::NO_CONTENT.into_response()
        }
        (Method::PUT, Some(key)) => {
            let payload = payload.unwrap_or_default();
            match objects.iter_mut().find(|o| matches_key(o, &key)) {
                Some(object) => object.extend(payload),
                None => {
                    let mut object = payload;
                    object.entry("id").or_insert_with(|| Value::from(key));
                    objects.push(object);
                }
            }
            StatusCode::NO_CONTENT.into_response()
        }
        (Method::DELETE, Some(key)) => {
            let before = objects.len();
            objects.retain(|o| !matches_key(o, &key));
            if objects.len() == before {
                error(StatusCode::NOT_FOUND, "not found")
            } else {
                StatusCode::NO_CONTENT.into_response()
            }
        }
        _ => error(StatusCode::METHOD_NOT_ALLOWED, "unsupported"),
    }
}
