//! HTTP service invoker.
//!
//! The production [`ServiceInvoker`]: a thin reqwest client that places
//! one JSON call per request intent. `GET` and `DELETE` endpoints carry
//! the request fields as query parameters, everything else sends a JSON
//! body. `{WireName}` segments in the endpoint path are substituted from
//! the body and removed from it.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::adapter::ServiceInvoker;
use crate::descriptor::OperationDescriptor;
use crate::error::{CoreError, InvokeFault, Result};
use crate::request::RequestIntent;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpInvoker {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpInvoker {
    pub fn builder() -> HttpInvokerBuilder {
        HttpInvokerBuilder::default()
    }
}

#[derive(Default)]
pub struct HttpInvokerBuilder {
    url: Option<String>,
    token: Option<String>,
    insecure: bool,
    user_agent: Option<String>,
    timeout: Option<Duration>,
}

impl HttpInvokerBuilder {
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<HttpInvoker> {
        let url = self
            .url
            .ok_or_else(|| CoreError::Validation("service URL is required".into()))?;
        url::Url::parse(&url)
            .map_err(|e| CoreError::Validation(format!("invalid service URL '{url}': {e}")))?;
        let base_url = url.trim_end_matches('/').to_string();

        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .user_agent(
                self.user_agent
                    .unwrap_or_else(|| format!("opsctl/{}", env!("CARGO_PKG_VERSION"))),
            );
        if self.insecure {
            debug!("TLS certificate verification disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder
            .build()
            .map_err(|e| CoreError::Validation(format!("failed to build HTTP client: {e}")))?;

        Ok(HttpInvoker {
            client,
            base_url,
            token: self.token,
        })
    }
}

#[async_trait]
impl ServiceInvoker for HttpInvoker {
    async fn invoke(
        &self,
        operation: &OperationDescriptor,
        request: &RequestIntent,
    ) -> std::result::Result<Value, InvokeFault> {
        let mut body = request.body.clone();
        let path = substitute_path(&operation.endpoint.path, &mut body);
        let url = format!("{}{}", self.base_url, ensure_leading_slash(&path));

        let method = reqwest::Method::from_bytes(operation.endpoint.method.as_bytes()).map_err(
            |_| InvokeFault::Transport {
                message: format!("unsupported HTTP method '{}'", operation.endpoint.method),
                name_resolution: false,
            },
        )?;

        trace!(operation = %request.operation, %url, "sending request");
        let mut builder = self.client.request(method.clone(), &url);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder = if method == reqwest::Method::GET || method == reqwest::Method::DELETE {
            builder.query(&query_pairs(&body))
        } else {
            builder.json(&Value::Object(body))
        };

        let response = builder.send().await.map_err(transport_fault)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_fault)?;

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(Value::Object(Map::new()));
            }
            serde_json::from_str(&text).map_err(|e| InvokeFault::Service {
                status: Some(status.as_u16()),
                code: None,
                message: format!("response was not valid JSON: {e}"),
            })
        } else {
            Err(service_fault(status.as_u16(), &text))
        }
    }
}

/// Replace `{WireName}` path segments from the body, removing consumed
/// fields. Unresolvable segments are left literal; request building
/// guarantees the referenced fields are bound.
fn substitute_path(path: &str, body: &mut Map<String, Value>) -> String {
    let mut rendered = String::with_capacity(path.len());
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        rendered.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match body.remove(name) {
                    Some(value) => {
                        rendered.push_str(&urlencoding::encode(&scalar_text(&value)));
                    }
                    None => {
                        rendered.push('{');
                        rendered.push_str(name);
                        rendered.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                rendered.push('{');
                rest = after;
            }
        }
    }
    rendered.push_str(rest);
    rendered
}

fn ensure_leading_slash(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Flatten remaining body fields into query pairs; lists repeat the key.
fn query_pairs(body: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in body {
        match value {
            Value::Array(items) => {
                for item in items {
                    pairs.push((key.clone(), scalar_text(item)));
                }
            }
            other => pairs.push((key.clone(), scalar_text(other))),
        }
    }
    pairs
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn transport_fault(err: reqwest::Error) -> InvokeFault {
    let name_resolution = is_dns_failure(&err);
    InvokeFault::Transport {
        message: err.to_string(),
        name_resolution,
    }
}

fn is_dns_failure(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        let text = e.to_string().to_lowercase();
        if text.contains("dns")
            || text.contains("name or service not known")
            || text.contains("failed to lookup address")
        {
            return true;
        }
        current = e.source();
    }
    false
}

/// Map a non-2xx answer into a service fault, digging a message out of
/// common error body shapes.
fn service_fault(status: u16, body: &str) -> InvokeFault {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .or_else(|| v.get("detail"))
        })
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                body.trim().to_string()
            }
        });
    let code = parsed
        .as_ref()
        .and_then(|v| v.get("code"))
        .and_then(Value::as_str)
        .map(str::to_string);

    InvokeFault::Service {
        status: Some(status),
        code,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn path_substitution_consumes_fields() {
        let mut body = Map::new();
        body.insert("JobId".into(), json!("job 42"));
        body.insert("Status".into(), json!("RUNNING"));

        let path = substitute_path("/v1/jobs/{JobId}", &mut body);
        assert_eq!(path, "/v1/jobs/job%2042");
        assert!(!body.contains_key("JobId"));
        assert!(body.contains_key("Status"));
    }

    #[test]
    fn unresolved_template_stays_literal() {
        let mut body = Map::new();
        let path = substitute_path("/v1/jobs/{JobId}", &mut body);
        assert_eq!(path, "/v1/jobs/{JobId}");
    }

    #[test]
    fn query_pairs_repeat_list_keys() {
        let mut body = Map::new();
        body.insert("Status".into(), json!("RUNNING"));
        body.insert("Tag".into(), json!(["a", "b"]));
        body.insert("Limit".into(), json!(10));

        let pairs = query_pairs(&body);
        assert!(pairs.contains(&("Status".into(), "RUNNING".into())));
        assert!(pairs.contains(&("Tag".into(), "a".into())));
        assert!(pairs.contains(&("Tag".into(), "b".into())));
        assert!(pairs.contains(&("Limit".into(), "10".into())));
    }

    #[test]
    fn service_fault_extracts_message_and_code() {
        let fault = service_fault(404, r#"{"message": "no such job", "code": "NotFound"}"#);
        match fault {
            InvokeFault::Service {
                status,
                code,
                message,
            } => {
                assert_eq!(status, Some(404));
                assert_eq!(code.as_deref(), Some("NotFound"));
                assert_eq!(message, "no such job");
            }
            other => panic!("unexpected fault: {other:?}"),
        }
    }

    #[test]
    fn service_fault_with_empty_body_names_the_status() {
        let fault = service_fault(502, "");
        match fault {
            InvokeFault::Service { message, .. } => assert_eq!(message, "HTTP 502"),
            other => panic!("unexpected fault: {other:?}"),
        }
    }

    #[test]
    fn builder_rejects_bad_url() {
        assert!(HttpInvoker::builder().url("not a url").build().is_err());
        assert!(HttpInvoker::builder().build().is_err());
    }
}
