//! Response normalization.
//!
//! Every transport response — success or not — is normalized into an
//! [`ApiResponse`] with a uniform `success`/`data`/`error` surface. Non-2xx
//! statuses and unparseable bodies are *returns*, never errors: only
//! transport-level failures surface as [`crate::Error`].

use crate::{Error, Result};
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Fixed message for response bodies that fail to parse as JSON.
pub const PARSE_FAILURE_MESSAGE: &str = "Failed to parse response";

/// Error details carried by an unsuccessful [`ApiResponse`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code: the HTTP status for derived errors, or whatever the body
    /// carried when it supplied its own `success` envelope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Value>,
    /// Human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiError {
    fn from_status(status: StatusCode) -> Self {
        Self {
            code: Some(Value::from(status.as_u16())),
            message: Some(
                status
                    .canonical_reason()
                    .unwrap_or("HTTP error")
                    .to_string(),
            ),
        }
    }

    fn parse_failure(status: StatusCode) -> Self {
        Self {
            code: Some(Value::from(status.as_u16())),
            message: Some(PARSE_FAILURE_MESSAGE.to_string()),
        }
    }
}

/// A body that already carries its own `success` envelope; passed through
/// unchanged instead of being derived from the HTTP status.
#[derive(Debug, Deserialize)]
struct EnvelopedBody {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<ApiError>,
}

/// The normalized response callers receive from every route invocation.
///
/// # Examples
///
/// ```no_run
/// use dialpath::{CallOptions, Client};
/// use serde_json::json;
///
/// # async fn example() -> dialpath::Result<()> {
/// let client = Client::builder().base_url("https://api.example.com")?.build()?;
///
/// let response = client
///     .route("users")
///     .action("getProfile")
///     .expect("not a reserved name")
///     .send(CallOptions::new().with_query_param("id", "123"))
///     .await?;
///
/// if response.success {
///     println!("profile: {:?}", response.data);
/// } else if let Some(error) = &response.error {
///     println!("failed: {:?} {:?}", error.code, error.message);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// Whether the call succeeded: the body's own `success` field when
    /// present, otherwise derived from the HTTP status being 2xx.
    pub success: bool,
    /// The parsed body (or its `data` field for enveloped bodies) on
    /// success.
    pub data: Option<Value>,
    /// Error details on failure.
    pub error: Option<ApiError>,
    /// The HTTP status code.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The raw response body, preserved for debugging.
    pub raw_body: String,
    /// Total latency across all attempts.
    pub latency: Duration,
    /// Number of attempts made; `1` means no retries were needed.
    pub attempts: usize,
}

impl ApiResponse {
    /// Normalizes a raw transport response.
    ///
    /// A JSON object body with a boolean `success` field passes through
    /// unchanged. Otherwise `success` is derived from the status: a parsed
    /// 2xx body becomes `data`, a non-2xx status becomes `error`, and an
    /// unparseable 2xx body becomes a parse failure with a fixed message.
    pub(crate) fn normalize(
        status: StatusCode,
        headers: HeaderMap,
        raw_body: String,
        latency: Duration,
        attempts: usize,
    ) -> Self {
        let parsed: Option<Value> = serde_json::from_str(&raw_body).ok();

        if let Some(body) = &parsed {
            let has_success_flag = body.get("success").is_some_and(Value::is_boolean);
            if has_success_flag {
                if let Ok(enveloped) = serde_json::from_value::<EnvelopedBody>(body.clone()) {
                    return Self {
                        success: enveloped.success,
                        data: enveloped.data,
                        error: enveloped.error,
                        status,
                        headers,
                        raw_body,
                        latency,
                        attempts,
                    };
                }
            }
        }

        let (success, data, error) = if status.is_success() {
            match parsed {
                Some(data) => (true, Some(data), None),
                None => (false, None, Some(ApiError::parse_failure(status))),
            }
        } else {
            (false, None, Some(ApiError::from_status(status)))
        };

        Self {
            success,
            data,
            error,
            status,
            headers,
            raw_body,
            latency,
            attempts,
        }
    }

    /// Deserializes `data` into a typed value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] when there is no data or it does not match
    /// the target type.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T> {
        let data = self.data.clone().ok_or_else(|| Error::Parse {
            detail: "response has no data".to_string(),
        })?;
        serde_json::from_value(data).map_err(|e| Error::Parse {
            detail: e.to_string(),
        })
    }

    /// Returns a header value by name, when it is valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Returns `true` if the call needed more than one attempt.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(status: StatusCode, body: &str) -> ApiResponse {
        ApiResponse::normalize(
            status,
            HeaderMap::new(),
            body.to_string(),
            Duration::from_millis(5),
            1,
        )
    }

    #[test]
    fn two_xx_bodies_become_data() {
        let response = normalize(StatusCode::OK, r#"{"id": 7, "name": "x"}"#);
        assert!(response.success);
        assert_eq!(response.data, Some(json!({"id": 7, "name": "x"})));
        assert!(response.error.is_none());
        assert_eq!(response.raw_body, r#"{"id": 7, "name": "x"}"#);
    }

    #[test]
    fn non_two_xx_statuses_become_errors_not_panics() {
        let response = normalize(StatusCode::NOT_FOUND, "missing");
        assert!(!response.success);
        assert!(response.data.is_none());
        let error = response.error.unwrap();
        assert_eq!(error.code, Some(json!(404)));
        assert_eq!(error.message.as_deref(), Some("Not Found"));
    }

    #[test]
    fn enveloped_bodies_pass_through_unchanged() {
        let response = normalize(
            StatusCode::OK,
            r#"{"success": false, "error": {"code": "E42", "message": "nope"}}"#,
        );
        assert!(!response.success);
        let error = response.error.unwrap();
        assert_eq!(error.code, Some(json!("E42")));
        assert_eq!(error.message.as_deref(), Some("nope"));
    }

    #[test]
    fn enveloped_success_wins_over_a_failing_status() {
        // The body's own verdict takes precedence over the HTTP status.
        let response = normalize(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"success": true, "data": {"ok": 1}}"#,
        );
        assert!(response.success);
        assert_eq!(response.data, Some(json!({"ok": 1})));
    }

    #[test]
    fn non_boolean_success_fields_are_not_envelopes() {
        let response = normalize(StatusCode::OK, r#"{"success": "yes"}"#);
        assert!(response.success);
        assert_eq!(response.data, Some(json!({"success": "yes"})));
    }

    #[test]
    fn unparseable_two_xx_bodies_are_parse_failures() {
        let response = normalize(StatusCode::OK, "not json");
        assert!(!response.success);
        let error = response.error.unwrap();
        assert_eq!(error.code, Some(json!(200)));
        assert_eq!(error.message.as_deref(), Some(PARSE_FAILURE_MESSAGE));
    }

    #[test]
    fn data_as_deserializes_typed_values() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct User {
            id: u64,
        }

        let response = normalize(StatusCode::OK, r#"{"id": 7}"#);
        assert_eq!(response.data_as::<User>().unwrap(), User { id: 7 });

        let empty = normalize(StatusCode::NOT_FOUND, "gone");
        assert!(matches!(empty.data_as::<User>(), Err(Error::Parse { .. })));
    }
}
