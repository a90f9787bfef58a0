//! # Bastion REST client
//!
//! Thin reqwest wrapper around the appliance's REST API.
//!
//! - Every request targets `https://<ip>:<port>/api/<api_version>/<uri>`
//! - Authentication uses the API key headers when a token is configured and
//!   HTTP Basic otherwise
//! - Certificate verification is disabled: appliances ship self-signed
//!   certificates
//! - No retries; any unexpected status surfaces as an error carrying the body
//!
//! Request bodies are never logged since most of them carry credentials.

use crate::config::ProviderConfig;
use crate::constants::{CONTENT_TYPE, USER_AGENT};
use crate::error::{BastionError, Result};
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info_span, Instrument};

/// Answer of `GET /api/version`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct VersionInfo {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub version_decimal: f64,
    #[serde(default)]
    pub wab_version: String,
    #[serde(default)]
    pub wab_version_decimal: f64,
    #[serde(default)]
    pub wab_version_hotfix: String,
    #[serde(default)]
    pub wab_version_hotfix_decimal: f64,
    #[serde(default)]
    pub wab_complete_version: String,
}

/// HTTP client bound to one appliance and one API version
#[derive(Clone)]
pub struct BastionClient {
    http_client: Client,
    base_url: String,
    api_version: String,
    user: String,
    token: Option<String>,
    password: Option<String>,
}

impl std::fmt::Debug for BastionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BastionClient")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl BastionClient {
    /// Build a client from a resolved configuration
    ///
    /// # Errors
    /// Returns an error when the configuration is invalid or the TLS stack
    /// cannot be initialised.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;

        let base_url = config.base_url.clone().map_or_else(
            || format!("https://{}:{}/api", config.ip, config.port),
            |url| url.trim_end_matches('/').to_string(),
        );

        let http_client = Client::builder()
            .danger_accept_invalid_certs(true)
            .user_agent(USER_AGENT)
            .build()?;

        debug!(base_url = %base_url, api_version = %config.api_version, "Bastion client ready");

        Ok(Self {
            http_client,
            base_url,
            api_version: config.api_version.clone(),
            user: config.user.clone(),
            token: config.token.clone().filter(|t| !t.is_empty()),
            password: config.password.clone(),
        })
    }

    /// API version string this client was configured with (`v3.12`, ...)
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    fn versioned_url(&self, uri: &str) -> String {
        if uri.starts_with('/') {
            format!("{}/{}{}", self.base_url, self.api_version, uri)
        } else {
            format!("{}/{}/{}", self.base_url, self.api_version, uri)
        }
    }

    /// Build HTTP request with authentication headers
    fn make_request(&self, method: Method, url: &str, body: Option<&Value>) -> reqwest::RequestBuilder {
        let mut request = self
            .http_client
            .request(method, url)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE);

        request = match &self.token {
            Some(token) => request
                .header("X-Auth-Key", token)
                .header("X-Auth-User", &self.user),
            None => {
                let raw = format!(
                    "{}:{}",
                    self.user,
                    self.password.as_deref().unwrap_or_default()
                );
                request.header(
                    reqwest::header::AUTHORIZATION,
                    format!("Basic {}", general_purpose::STANDARD.encode(raw)),
                )
            }
        };

        if let Some(body) = body {
            request = request.json(body);
        }

        request
    }

    async fn send(&self, method: Method, url: String, body: Option<&Value>) -> Result<(StatusCode, String)> {
        let span = info_span!("bastion.request", http.method = %method, http.url = %url);
        async move {
            let response = self.make_request(method, &url, body).send().await?;
            let status = response.status();
            let text = response.text().await?;
            debug!(http.status = status.as_u16(), "response received");
            Ok((status, text))
        }
        .instrument(span)
        .await
    }

    /// Send one request under the versioned prefix and return the raw status and body
    ///
    /// # Errors
    /// Returns [`BastionError::Transport`] when no response was received.
    pub async fn request(&self, method: Method, uri: &str, body: Option<&Value>) -> Result<(StatusCode, String)> {
        self.send(method, self.versioned_url(uri), body).await
    }

    /// GET a JSON object; a 404 yields `None`
    ///
    /// # Errors
    /// Any status other than 200 or 404, or an undecodable body.
    pub async fn get_json<T: DeserializeOwned>(&self, uri: &str) -> Result<Option<T>> {
        let (status, body) = self.request(Method::GET, uri, None).await?;
        match status {
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::OK => Ok(Some(decode(&body)?)),
            other => Err(BastionError::NotOk {
                status: other.as_u16(),
                body,
            }),
        }
    }

    /// GET a JSON value where 404 is an error (collections, singletons)
    ///
    /// # Errors
    /// Any status other than 200, or an undecodable body.
    pub async fn get_required<T: DeserializeOwned>(&self, uri: &str) -> Result<T> {
        let (status, body) = self.request(Method::GET, uri, None).await?;
        if status != StatusCode::OK {
            return Err(BastionError::NotOk {
                status: status.as_u16(),
                body,
            });
        }
        decode(&body)
    }

    async fn mutate<B: Serialize + ?Sized>(&self, method: Method, uri: &str, body: Option<&B>) -> Result<()> {
        let body = body.map(serde_json::to_value).transpose()?;
        let (status, text) = self.request(method, uri, body.as_ref()).await?;
        if status != StatusCode::OK && status != StatusCode::NO_CONTENT {
            return Err(BastionError::NotOkOrNoContent {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(())
    }

    /// POST a JSON payload, accepting 200 or 204
    ///
    /// # Errors
    /// Any other status, or a transport failure.
    pub async fn post<B: Serialize + ?Sized>(&self, uri: &str, body: &B) -> Result<()> {
        self.mutate(Method::POST, uri, Some(body)).await
    }

    /// PUT a JSON payload, accepting 200 or 204
    ///
    /// # Errors
    /// Any other status, or a transport failure.
    pub async fn put<B: Serialize + ?Sized>(&self, uri: &str, body: &B) -> Result<()> {
        self.mutate(Method::PUT, uri, Some(body)).await
    }

    /// DELETE, accepting 200 or 204
    ///
    /// # Errors
    /// Any other status, or a transport failure.
    pub async fn delete(&self, uri: &str) -> Result<()> {
        self.mutate::<Value>(Method::DELETE, uri, None).await
    }

    /// Look an object up through the API's query filter.
    ///
    /// Issues `GET <collection>?q=<field>=<value>` and reports the ID only
    /// when exactly one object matched.
    ///
    /// # Errors
    /// A non-200 answer or an undecodable body.
    pub async fn search_by_query(&self, collection: &str, field: &str, value: &str) -> Result<Option<String>> {
        let results: Vec<Value> = self
            .get_required(&format!("{collection}?q={field}={value}"))
            .await?;
        debug!(collection, field, value, matches = results.len(), "query search");
        if results.len() != 1 {
            return Ok(None);
        }
        Ok(results.first().map(object_id))
    }

    /// Look an object up by listing `field` and `id` of the whole collection.
    ///
    /// # Errors
    /// A non-200 answer or an undecodable body.
    pub async fn search_by_scan(&self, collection: &str, field: &str, value: &str) -> Result<Option<String>> {
        self.find_in_list(&format!("{collection}?fields={field},id&limit=-1"), field, value)
            .await
    }

    /// GET a list and return the ID of the first element whose `field` equals `value`
    ///
    /// # Errors
    /// A non-200 answer or an undecodable body.
    pub async fn find_in_list(&self, uri: &str, field: &str, value: &str) -> Result<Option<String>> {
        let results: Vec<Value> = self.get_required(uri).await?;
        debug!(uri, field, value, candidates = results.len(), "list scan");
        Ok(results
            .iter()
            .find(|item| item.get(field).and_then(Value::as_str) == Some(value))
            .map(object_id))
    }

    /// `GET /api/version`, outside the versioned prefix
    ///
    /// # Errors
    /// A non-200 answer or an undecodable body.
    pub async fn version(&self) -> Result<VersionInfo> {
        let (status, body) = self
            .send(Method::GET, format!("{}/version", self.base_url), None)
            .await?;
        if status != StatusCode::OK {
            return Err(BastionError::NotOk {
                status: status.as_u16(),
                body,
            });
        }
        decode(&body)
    }
}

/// Decode a response body, reading `null` members as absent so they take
/// the `#[serde(default)]` value of the wire struct
fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    let mut value: Value = serde_json::from_str(body)?;
    drop_null_members(&mut value);
    Ok(serde_json::from_value(value)?)
}

fn drop_null_members(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(drop_null_members);
        }
        Value::Array(items) => items.iter_mut().for_each(drop_null_members),
        _ => {}
    }
}

fn object_id(item: &Value) -> String {
    item.get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderBlock;

    fn client(api_version: &str) -> BastionClient {
        let cfg = ProviderConfig::from_block(ProviderBlock {
            ip: Some("bastion.example".to_string()),
            port: Some(8443),
            token: Some("key".to_string()),
            user: Some("admin".to_string()),
            password: None,
            api_version: Some(api_version.to_string()),
        });
        BastionClient::new(&cfg).unwrap()
    }

    #[test]
    fn test_versioned_url_single_separator() {
        let c = client("v3.12");
        assert_eq!(c.versioned_url("/users/bob"), "https://bastion.example:8443/api/v3.12/users/bob");
        assert_eq!(c.versioned_url("users/bob"), "https://bastion.example:8443/api/v3.12/users/bob");
    }

    #[test]
    fn test_base_url_override() {
        let cfg = ProviderConfig::from_block(ProviderBlock {
            token: Some("key".to_string()),
            api_version: Some("v3.8".to_string()),
            ..ProviderBlock::default()
        })
        .with_base_url("http://127.0.0.1:9000/api/");
        let c = BastionClient::new(&cfg).unwrap();
        assert_eq!(c.versioned_url("/devices/"), "http://127.0.0.1:9000/api/v3.8/devices/");
    }

    #[test]
    fn test_debug_hides_token() {
        let c = client("v3.3");
        assert!(!format!("{c:?}").contains("key"));
    }

    #[test]
    fn test_object_id() {
        assert_eq!(object_id(&serde_json::json!({"id": "abc"})), "abc");
        assert_eq!(object_id(&serde_json::json!({})), "");
    }

    #[test]
    fn test_decode_reads_null_as_default() {
        #[derive(Debug, Default, Deserialize)]
        #[serde(default)]
        struct Inner {
            enabled: bool,
            tags: Vec<String>,
        }
        #[derive(Debug, Default, Deserialize)]
        #[serde(default)]
        struct Outer {
            name: String,
            expiration_date: String,
            inner: Inner,
            items: Vec<Inner>,
        }
        let outer: Outer = decode(
            r#"{"name": "alice", "expiration_date": null,
                "inner": {"enabled": null, "tags": null},
                "items": [{"enabled": true, "tags": null}]}"#,
        )
        .unwrap();
        assert_eq!(outer.name, "alice");
        assert_eq!(outer.expiration_date, "");
        assert!(!outer.inner.enabled);
        assert!(outer.items[0].enabled);
        assert!(outer.items[0].tags.is_empty());
        assert!(decode::<Outer>("{not json").is_err());
    }
}
