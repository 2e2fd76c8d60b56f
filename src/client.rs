//! Jira REST clients
//!
//! Builds the two authenticated clients a tool needs for one instance: the
//! platform REST API (`/rest/api/3`) and the Agile REST API
//! (`/rest/agile/1.0`). Both share basic auth and host, and neither treats a
//! non-2xx status as a transport failure: every request yields an
//! [`ApiResponse`] the caller can inspect.

use crate::config::InstanceConfig;
use crate::{BridgeError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Base path of the platform REST API
pub const PLATFORM_API_PATH: &str = "/rest/api/3";

/// Base path of the Agile REST API
pub const AGILE_API_PATH: &str = "/rest/agile/1.0";

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Status and decoded body of a Jira response
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// JSON body; non-JSON text is kept as a string, empty bodies are `null`
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into [`BridgeError::Upstream`]
    pub fn into_result(self) -> Result<Value> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(BridgeError::Upstream {
                status: self.status,
                body: self.body,
            })
        }
    }

    /// Decode a successful body into `T`
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        let body = self.into_result()?;
        Ok(serde_json::from_value(body)?)
    }
}

/// Authenticated client rooted at one Jira API base path
#[derive(Debug, Clone)]
pub struct JiraClient {
    http: Client,
    base_url: String,
    email: String,
    api_token: String,
}

impl JiraClient {
    fn new(http: Client, base_url: String, config: &InstanceConfig) -> Self {
        Self {
            http,
            base_url,
            email: config.email.trim().to_string(),
            api_token: config.api_token.trim().to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for a path relative to the base
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.send(self.request(Method::GET, path)).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<ApiResponse> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .basic_auth(&self.email, Some(&self.api_token))
    }

    async fn send(&self, request: RequestBuilder) -> Result<ApiResponse> {
        // reqwest::Error converts to BridgeError::Http via #[from]
        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        debug!(status, base_url = %self.base_url, "Jira response");
        Ok(ApiResponse { status, body })
    }
}

/// The pair of clients handed to a tool
#[derive(Debug, Clone)]
pub struct ApiClients {
    /// Platform REST API (issues, components, transitions)
    pub api: JiraClient,
    /// Agile REST API (sprints, boards, epics)
    pub agile: JiraClient,
}

/// Build both clients for an instance's cloud site
///
/// Performs no network I/O; bad credentials only surface on the first
/// request.
pub fn build_clients(config: &InstanceConfig) -> Result<ApiClients> {
    build_clients_for_site(config, &config.site_url())
}

/// Build both clients against an explicit site root
pub fn build_clients_for_site(config: &InstanceConfig, site_url: &str) -> Result<ApiClients> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let http = Client::builder()
        .default_headers(headers)
        .timeout(REQUEST_TIMEOUT)
        .build()?;

    let site = site_url.trim_end_matches('/');
    debug!(site = %site, "Building Jira API clients");

    Ok(ApiClients {
        api: JiraClient::new(http.clone(), format!("{}{}", site, PLATFORM_API_PATH), config),
        agile: JiraClient::new(http, format!("{}{}", site, AGILE_API_PATH), config),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> InstanceConfig {
        InstanceConfig::new("acme", "dev@acme.com", "ATATT3xFfGF0abcdefghijklmnop")
    }

    #[test]
    fn test_build_clients_base_urls() {
        let clients = build_clients(&config()).unwrap();
        assert_eq!(
            clients.api.base_url(),
            "https://acme.atlassian.net/rest/api/3"
        );
        assert_eq!(
            clients.agile.base_url(),
            "https://acme.atlassian.net/rest/agile/1.0"
        );
    }

    #[test]
    fn test_build_clients_tolerates_suffixed_domain() {
        let config = InstanceConfig::new("acme.atlassian.net", "dev@acme.com", "t");
        let clients = build_clients(&config).unwrap();
        assert_eq!(
            clients.api.base_url(),
            "https://acme.atlassian.net/rest/api/3"
        );
    }

    #[test]
    fn test_build_clients_bare_cloud_domain() {
        let config = InstanceConfig::new("atlassian.net", "dev@acme.com", "t");
        let clients = build_clients(&config).unwrap();
        assert_eq!(clients.api.base_url(), "https://atlassian.net/rest/api/3");
    }

    #[test]
    fn test_build_clients_for_site() {
        let clients = build_clients_for_site(&config(), "http://127.0.0.1:9999/").unwrap();
        assert_eq!(clients.agile.base_url(), "http://127.0.0.1:9999/rest/agile/1.0");
        assert_eq!(
            clients.agile.url("/sprint/4/issue"),
            "http://127.0.0.1:9999/rest/agile/1.0/sprint/4/issue"
        );
    }

    #[test]
    fn test_api_response_success() {
        let response = ApiResponse {
            status: 200,
            body: json!({"id": "10000"}),
        };
        assert!(response.is_success());
        assert_eq!(response.into_result().unwrap()["id"], "10000");
    }

    #[test]
    fn test_api_response_upstream_error() {
        let response = ApiResponse {
            status: 403,
            body: json!({"errorMessages": ["Forbidden"]}),
        };
        assert!(!response.is_success());
        match response.into_result() {
            Err(BridgeError::Upstream { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body["errorMessages"][0], "Forbidden");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_api_response_typed_decode() {
        #[derive(serde::Deserialize)]
        struct Component {
            id: String,
        }
        let response = ApiResponse {
            status: 201,
            body: json!({"id": "42", "name": "Backend"}),
        };
        let component: Component = response.json().unwrap();
        assert_eq!(component.id, "42");
    }
}
