//! REST collaborator boundary
//!
//! REST functions delegate to a [`RestClient`] and must never throw through
//! the evaluator: failures come back as a structured error map. The default
//! client is disabled and returns that map for every call; an HTTP-backed
//! client is available behind the `rest` feature.

use crate::value::Value;
use arbiter_dsl::ast::RestMethod;
use std::collections::BTreeMap;
use std::time::Duration;

/// Default per-call timeout (5s)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// A reified REST request
#[derive(Debug, Clone)]
pub struct RestRequest {
    pub method: RestMethod,
    pub url: String,
    pub body: Option<Value>,
    pub headers: Option<Value>,
    pub timeout: Duration,
}

/// External REST collaborator. Implementations must not panic and must
/// translate every failure into [`error_map`].
pub trait RestClient: Send + Sync {
    fn execute(&self, request: RestRequest) -> Value;
}

/// Structured failure map: `{ success: false, error: true, message, status? }`
pub fn error_map(message: impl Into<String>, status: Option<u16>) -> Value {
    let mut map = BTreeMap::new();
    map.insert("success".to_string(), Value::Boolean(false));
    map.insert("error".to_string(), Value::Boolean(true));
    map.insert("message".to_string(), Value::String(message.into()));
    if let Some(status) = status {
        map.insert(
            "status".to_string(),
            Value::Number(rust_decimal::Decimal::from(status)),
        );
    }
    Value::Object(map)
}

/// Default collaborator: REST calls are not configured.
#[derive(Debug, Default)]
pub struct DisabledRestClient;

impl RestClient for DisabledRestClient {
    fn execute(&self, request: RestRequest) -> Value {
        tracing::warn!(
            url = %request.url,
            method = request.method.as_str(),
            "REST call attempted without a configured client"
        );
        error_map("REST client is not configured", None)
    }
}

#[cfg(feature = "rest")]
pub use http_client::HttpRestClient;

#[cfg(feature = "rest")]
mod http_client {
    use super::*;

    /// Blocking HTTP client for the REST function family.
    pub struct HttpRestClient {
        client: reqwest::blocking::Client,
    }

    impl HttpRestClient {
        pub fn new() -> Self {
            Self {
                client: reqwest::blocking::Client::new(),
            }
        }
    }

    impl Default for HttpRestClient {
        fn default() -> Self {
            Self::new()
        }
    }

    impl RestClient for HttpRestClient {
        fn execute(&self, request: RestRequest) -> Value {
            let method = match request.method {
                RestMethod::Get => reqwest::Method::GET,
                RestMethod::Post => reqwest::Method::POST,
                RestMethod::Put => reqwest::Method::PUT,
                RestMethod::Delete => reqwest::Method::DELETE,
                RestMethod::Patch => reqwest::Method::PATCH,
            };

            let mut builder = self
                .client
                .request(method, &request.url)
                .timeout(request.timeout);

            if let Some(Value::Object(headers)) = &request.headers {
                for (name, value) in headers {
                    builder = builder.header(name, value.to_display_string());
                }
            }
            if let Some(body) = &request.body {
                builder = builder.json(&body.to_json());
            }

            let response = match builder.send() {
                Ok(response) => response,
                Err(e) => return error_map(e.to_string(), None),
            };

            let status = response.status();
            if !status.is_success() {
                return error_map(
                    format!("HTTP {} from {}", status.as_u16(), request.url),
                    Some(status.as_u16()),
                );
            }

            match response.json::<serde_json::Value>() {
                Ok(json) => Value::from_json(&json),
                Err(e) => error_map(format!("invalid JSON response: {e}"), Some(status.as_u16())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_client_returns_error_map() {
        let client = DisabledRestClient;
        let result = client.execute(RestRequest {
            method: RestMethod::Get,
            url: "https://example.com".into(),
            body: None,
            headers: None,
            timeout: DEFAULT_TIMEOUT,
        });
        let Value::Object(map) = result else {
            panic!("expected object");
        };
        assert_eq!(map.get("success"), Some(&Value::Boolean(false)));
        assert_eq!(map.get("error"), Some(&Value::Boolean(true)));
        assert!(map.contains_key("message"));
    }

    #[test]
    fn test_error_map_with_status() {
        let Value::Object(map) = error_map("HTTP 404", Some(404)) else {
            panic!("expected object");
        };
        assert_eq!(
            map.get("status"),
            Some(&Value::Number(rust_decimal::Decimal::from(404u16)))
        );
    }
}
