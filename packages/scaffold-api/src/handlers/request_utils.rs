//! Request parsing and response building helpers.

use std::error::Error as StdError;

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderMap, CONTENT_TYPE, LOCATION};
use hyper::{Request, Response, StatusCode};
use scaffold_core::forms::FormData;
use scaffold_core::ScaffoldError;
use tokio::time;

use crate::config::ApiConfig;
use crate::router::RouterError;

/// Type alias for matchit parameters with explicit lifetimes
pub type MatchitParams<'a, 'b> = matchit::Params<'a, 'b>;

/// Reads the whole request body within `request_timeout_ms`, refusing bodies
/// above `max_body_bytes`.
///
/// # Returns
/// The request headers and the body bytes.
pub async fn read_request_body_with_timeout<B>(
    req: Request<B>,
    config: &ApiConfig,
) -> Result<(HeaderMap, Bytes), RouterError>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let (parts, body) = req.into_parts();
    let timeout_duration = time::Duration::from_millis(config.request_timeout_ms);
    let body = time::timeout(
        timeout_duration,
        Limited::new(body, config.max_body_bytes).collect(),
    )
    .await
    .map_err(|_| RouterError::Timeout)?
    .map_err(|e| {
        if e.downcast_ref::<LengthLimitError>().is_some() {
            RouterError::PayloadTooLarge
        } else {
            RouterError::BadRequest(format!("Failed to read request body: {}", e))
        }
    })?;
    Ok((parts.headers, body.to_bytes()))
}

/// Parses a submitted form: JSON objects when the content type says so,
/// `application/x-www-form-urlencoded` otherwise.
pub fn parse_form_data(headers: &HeaderMap, body: &[u8]) -> Result<FormData, RouterError> {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_start().starts_with("application/json"))
        .unwrap_or(false);

    if is_json {
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| RouterError::BadRequest(format!("Invalid JSON: {}", e)))?;
        FormData::from_json(&value).map_err(map_scaffold_error)
    } else {
        let text = std::str::from_utf8(body)
            .map_err(|_| RouterError::BadRequest("Form body is not valid UTF-8".to_string()))?;
        Ok(FormData::from_urlencoded(text))
    }
}

/// Map ScaffoldError to the matching RouterError
pub fn map_scaffold_error(e: ScaffoldError) -> RouterError {
    match e {
        ScaffoldError::EntityNotFound { .. } | ScaffoldError::RecordNotFound { .. } => {
            RouterError::NotFound(e.to_string())
        }
        ScaffoldError::UniqueViolation { .. }
        | ScaffoldError::Conflict(_)
        | ScaffoldError::PrimaryKeyChange { .. } => RouterError::Conflict(e.to_string()),
        ScaffoldError::FieldNotFound { .. }
        | ScaffoldError::MissingValue { .. }
        | ScaffoldError::TypeMismatch { .. }
        | ScaffoldError::InvalidValue { .. }
        | ScaffoldError::ReferenceNotFound { .. }
        | ScaffoldError::SerializationError(_) => RouterError::BadRequest(e.to_string()),
        _ => RouterError::InternalError(e.to_string()),
    }
}

/// Helper to build a response with a body
pub fn build_response(
    status: StatusCode,
    content_type: &str,
    body: Bytes,
) -> Result<Response<Bytes>, RouterError> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, content_type)
        .body(body)
        .map_err(|e| RouterError::InternalError(format!("Failed to build response: {}", e)))
}

/// Helper to build a `303 See Other` redirect
pub fn build_redirect(location: &str) -> Result<Response<Bytes>, RouterError> {
    Response::builder()
        .status(StatusCode::SEE_OTHER)
        .header(LOCATION, location)
        .body(Bytes::new())
        .map_err(|e| RouterError::InternalError(format!("Failed to build response: {}", e)))
}
