//! Domain errors rendered as HTTP responses.
//!
//! Every failure leaves the API in the same envelope: `{code, message,
//! traceId?, details?}`. That includes bodies and query strings Actix cannot
//! deserialise, which are routed through [`extractor_config`] instead of the
//! framework's plain-text 400.

use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse, ResponseError, http::StatusCode, web};
use serde_json::json;
use tracing::{debug, error};

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

const REDACTED_MESSAGE: &str = "Internal server error";

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self.code() {
            ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        if let Some(trace_id) = self.trace_id() {
            response.insert_header((TRACE_ID_HEADER, trace_id.to_owned()));
        }
        if self.code() != ErrorCode::InternalError {
            return response.json(self);
        }

        error!(message = self.message(), "internal error returned to client");
        let public = Error::internal(REDACTED_MESSAGE);
        match self.trace_id() {
            Some(trace_id) => response.json(public.with_trace_id(trace_id.to_owned())),
            None => response.json(public),
        }
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "actix error promoted to domain error");
        Error::internal(REDACTED_MESSAGE)
    }
}

fn malformed(source: &'static str, reason: String) -> actix_web::Error {
    debug!(source, %reason, "rejected malformed request");
    Error::invalid_request(format!("malformed {source}: {reason}"))
        .with_details(json!({ "field": source, "code": "malformed" }))
        .into()
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    match err {
        JsonPayloadError::ContentType => malformed("body", "expected application/json".to_owned()),
        other => malformed("body", other.to_string()),
    }
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    malformed("query", err.to_string())
}

/// Register extractor settings that report failures as domain errors.
pub fn extractor_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error));
}
