//! Shared plumbing for talking to Google REST endpoints.
//!
//! Google APIs report failures in one of two shapes:
//!
//! ```text
//! REST APIs:   {"error": {"code": 403, "message": "…", "status": "PERMISSION_DENIED"}}
//! OAuth:       {"error": "invalid_grant", "error_description": "Token has been expired or revoked."}
//! ```
//!
//! [`read_error_body`] normalises both into an [`ApiErrorBody`] so callers
//! can surface the remote message verbatim.

use crate::error::Pdf2SlidesError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// The useful part of a Google error response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorBody {
    /// Machine-readable code (`invalid_grant`, `PERMISSION_DENIED`, …), if any.
    pub code: Option<String>,
    /// Human-readable message; falls back to the raw body text.
    pub message: String,
}

/// Drain a failed response and extract its error message.
pub async fn read_error_body(resp: reqwest::Response) -> ApiErrorBody {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    parse_error_body(&text).unwrap_or_else(|| ApiErrorBody {
        code: None,
        message: if text.trim().is_empty() {
            status.canonical_reason().unwrap_or("no response body").to_string()
        } else {
            text.trim().to_string()
        },
    })
}

/// Parse either error shape from a response body.
pub fn parse_error_body(text: &str) -> Option<ApiErrorBody> {
    let value: Value = serde_json::from_str(text).ok()?;
    match value.get("error")? {
        Value::Object(obj) => Some(ApiErrorBody {
            code: obj.get("status").and_then(Value::as_str).map(String::from),
            message: obj
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or(text)
                .to_string(),
        }),
        Value::String(code) => Some(ApiErrorBody {
            code: Some(code.clone()),
            message: value
                .get("error_description")
                .and_then(Value::as_str)
                .map(|d| format!("{code}: {d}"))
                .unwrap_or_else(|| code.clone()),
        }),
        _ => None,
    }
}

/// Send `request`; on success decode the JSON body as `T`.
pub(crate) async fn send_json<T: DeserializeOwned>(
    operation: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<T, Pdf2SlidesError> {
    let resp = send(operation, request).await?;
    resp.json::<T>()
        .await
        .map_err(|e| Pdf2SlidesError::UnexpectedResponse {
            operation,
            detail: e.to_string(),
        })
}

/// Send `request` and turn any non-2xx status into [`Pdf2SlidesError::Api`].
pub(crate) async fn send(
    operation: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, Pdf2SlidesError> {
    let resp = request.send().await.map_err(Pdf2SlidesError::http(operation))?;
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = read_error_body(resp).await;
    Err(Pdf2SlidesError::Api {
        operation,
        status: status.as_u16(),
        message: body.message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rest_error() {
        let body = parse_error_body(
            r#"{"error":{"code":403,"message":"Insufficient Permission","status":"PERMISSION_DENIED"}}"#,
        )
        .unwrap();
        assert_eq!(body.code.as_deref(), Some("PERMISSION_DENIED"));
        assert_eq!(body.message, "Insufficient Permission");
    }

    #[test]
    fn parses_oauth_error() {
        let body = parse_error_body(
            r#"{"error":"invalid_grant","error_description":"Token has been expired or revoked."}"#,
        )
        .unwrap();
        assert_eq!(body.code.as_deref(), Some("invalid_grant"));
        assert!(body.message.contains("expired or revoked"));
    }

    #[test]
    fn non_json_is_not_parsed() {
        assert!(parse_error_body("<html>502 Bad Gateway</html>").is_none());
        assert!(parse_error_body(r#"{"ok":true}"#).is_none());
    }
}
