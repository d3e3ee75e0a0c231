//! HTTP plumbing shared by every adapter: client construction and the
//! status-code to [`ProviderError`] mapping.

use std::time::Duration;

use newsroom_core::error::ProviderError;
use serde::de::DeserializeOwned;
use tracing::warn;

/// Request timeout for completion calls. Large digests can take minutes.
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Build the HTTP client an adapter sends requests with.
pub(crate) fn build_client() -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| ProviderError::NotConfigured(format!("Failed to create HTTP client: {e}")))
}

/// Send a prepared request and decode a successful JSON body.
///
/// 429 maps to `RateLimited`, 401/403 to `AuthenticationFailed`, any other
/// non-2xx to `ApiError`. Transport failures are `Network` (or `Timeout`),
/// and an undecodable body is `InvalidResponse`.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            ProviderError::Timeout(e.to_string())
        } else {
            ProviderError::Network(e.to_string())
        }
    })?;

    let status = response.status().as_u16();

    if status == 429 {
        let retry_after_secs = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(5);
        return Err(ProviderError::RateLimited { retry_after_secs });
    }
    if status == 401 || status == 403 {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::AuthenticationFailed(format!(
            "{provider} rejected the API key: {body}"
        )));
    }
    if !(200..300).contains(&status) {
        let error_body = response.text().await.unwrap_or_default();
        warn!(provider, status, body = %error_body, "API error");
        return Err(ProviderError::ApiError {
            status_code: status,
            message: error_body,
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ProviderError::Network(e.to_string()))?;

    serde_json::from_slice(&bytes).map_err(|e| {
        ProviderError::InvalidResponse(format!("Failed to parse {provider} response: {e}"))
    })
}

/// Merge caller-supplied extra fields into a request body, top level.
pub(crate) fn merge_extra(
    body: &mut serde_json::Value,
    extra: &serde_json::Map<String, serde_json::Value>,
) {
    if let Some(obj) = body.as_object_mut() {
        for (key, value) in extra {
            obj.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn status_error(status: u16) -> ProviderError {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
            .mount(&server)
            .await;

        let client = build_client().unwrap();
        send_json::<serde_json::Value>("test", client.post(server.uri()))
            .await
            .unwrap_err()
    }

    #[tokio::test]
    async fn maps_rate_limit() {
        assert!(matches!(
            status_error(429).await,
            ProviderError::RateLimited { .. }
        ));
    }

    #[tokio::test]
    async fn maps_auth_failures() {
        assert!(matches!(
            status_error(401).await,
            ProviderError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            status_error(403).await,
            ProviderError::AuthenticationFailed(_)
        ));
    }

    #[tokio::test]
    async fn maps_other_statuses_to_api_error() {
        match status_error(500).await {
            ProviderError::ApiError {
                status_code,
                message,
            } => {
                assert_eq!(status_code, 500);
                assert_eq!(message, "nope");
            }
            other => panic!("Expected ApiError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = build_client().unwrap();
        let err = send_json::<serde_json::Value>("test", client.post(server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let client = build_client().unwrap();
        // Port 9 (discard) on localhost is closed in test environments
        let err = send_json::<serde_json::Value>("test", client.post("http://127.0.0.1:9/"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Network(_) | ProviderError::Timeout(_)
        ));
    }

    #[test]
    fn extra_fields_merge_at_top_level() {
        let mut body = serde_json::json!({"model": "m", "max_tokens": 10});
        let mut extra = serde_json::Map::new();
        extra.insert("top_p".into(), serde_json::json!(0.9));
        extra.insert("max_tokens".into(), serde_json::json!(20));
        merge_extra(&mut body, &extra);
        assert_eq!(body["top_p"], 0.9);
        assert_eq!(body["max_tokens"], 20);
    }
}
