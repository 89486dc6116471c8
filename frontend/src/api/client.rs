use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::{api::types::ApiError, config};

#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: Option<String>,
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: None,
        }
    }

    pub fn new_with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: Some(base_url.into()),
        }
    }

    pub(crate) fn http_client(&self) -> &Client {
        &self.client
    }

    pub(crate) async fn resolved_base_url(&self) -> String {
        let base = if let Some(base) = &self.base_url {
            base.clone()
        } else {
            config::await_api_base_url().await
        };
        base.trim_end_matches('/').to_string()
    }

    /// POSTs `body` to `{base}/{path}` and returns the decoded JSON body of a
    /// 2xx response. Failures are collapsed into an `ApiError` whose message
    /// prefers the server's `message` field, then the transport message, then
    /// `fallback`.
    pub(crate) async fn post_json<B>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<Value, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let base_url = self.resolved_base_url().await;
        let url = format!("{}/{}", base_url, path.trim_start_matches('/'));
        log::debug!("POST {}", url);

        let response = self
            .http_client()
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                log::warn!("POST {} failed before a response arrived: {}", url, e);
                ApiError::request_failed(non_empty(e.to_string()).unwrap_or_else(|| fallback.into()))
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            ApiError::request_failed(non_empty(e.to_string()).unwrap_or_else(|| fallback.into()))
        })?;
        let parsed = if text.trim().is_empty() {
            None
        } else {
            serde_json::from_str::<Value>(&text).ok()
        };

        if status.is_success() {
            Ok(parsed.unwrap_or(Value::Null))
        } else {
            log::warn!("POST {} returned {}", url, status);
            Err(error_from_response(status, parsed.as_ref(), fallback))
        }
    }
}

pub(crate) fn error_from_response(
    status: StatusCode,
    body: Option<&Value>,
    fallback: &str,
) -> ApiError {
    let server_message = body.and_then(|b| b.get("message"));
    if let Some(text) = server_message.and_then(describe_message) {
        let details = server_message.filter(|m| !m.is_string()).cloned();
        return ApiError::server(text, details);
    }

    let transport = match status.canonical_reason() {
        Some(_) => format!("Request failed with status code {}", status.as_u16()),
        None => fallback.to_string(),
    };
    ApiError::server(transport, body.cloned())
}

/// Renders a server `message` value as display text. Structured messages
/// (field → errors maps, lists) are flattened into one line.
pub(crate) fn describe_message(message: &Value) -> Option<String> {
    match message {
        Value::String(text) => non_empty(text.trim().to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(describe_message).collect();
            non_empty(parts.join("; "))
        }
        Value::Object(map) => {
            let parts: Vec<String> = map
                .iter()
                .filter_map(|(field, value)| {
                    describe_message(value).map(|text| format!("{}: {}", field, text))
                })
                .collect();
            non_empty(parts.join("; "))
        }
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
