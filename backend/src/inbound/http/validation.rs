//! Shared validation helpers for inbound HTTP adapters.

use std::str::FromStr;

use pagination::{PageRequest, PaginationError};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;

use crate::domain::Error;

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidLimit,
    InvalidCursor,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidLimit => "invalid_limit",
            ErrorCode::InvalidCursor => "invalid_cursor",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: String,
    message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("missing required field: {field}"))
        .with_code(ErrorCode::MissingField)
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must be a valid UUID"))
        .with_value(ErrorCode::InvalidUuid, value)
}

/// Parse a path segment into one of the typed identifiers.
pub(crate) fn parse_id<T: FromStr>(value: &str, field: FieldName) -> Result<T, Error> {
    value
        .parse()
        .map_err(|_| invalid_uuid_error(field, value))
}

/// `?limit=&cursor=` query shared by list endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page size between 1 and 100. Defaults to 20.
    pub limit: Option<usize>,
    /// Opaque cursor from a previous page's `nextCursor`.
    pub cursor: Option<String>,
}

impl PageQuery {
    /// Validate into a [`PageRequest`].
    pub(crate) fn to_request(&self) -> Result<PageRequest, Error> {
        PageRequest::new(self.limit, self.cursor.as_deref()).map_err(map_pagination_error)
    }
}

fn map_pagination_error(error: PaginationError) -> Error {
    match &error {
        PaginationError::InvalidLimit { .. } => {
            ValidationError::new("limit", error.to_string()).with_code(ErrorCode::InvalidLimit)
        }
        PaginationError::InvalidCursor { .. } => {
            ValidationError::new("cursor", error.to_string()).with_code(ErrorCode::InvalidCursor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CommunityId, ErrorCode as DomainCode};
    use rstest::rstest;
    use serde_json::Value;

    fn detail<'a>(error: &'a Error, key: &str) -> Option<&'a str> {
        error.details().and_then(|d| d.get(key)).and_then(Value::as_str)
    }

    #[rstest]
    fn malformed_ids_name_the_field() {
        let error = parse_id::<CommunityId>("nope", FieldName::new("communityId"))
            .expect_err("invalid id");
        assert_eq!(error.code(), DomainCode::InvalidRequest);
        assert_eq!(detail(&error, "field"), Some("communityId"));
        assert_eq!(detail(&error, "code"), Some("invalid_uuid"));
        assert_eq!(detail(&error, "value"), Some("nope"));
    }

    #[rstest]
    #[case(Some(0), None, "limit", "invalid_limit")]
    #[case(Some(101), None, "limit", "invalid_limit")]
    #[case(None, Some("%%%"), "cursor", "invalid_cursor")]
    fn bad_pagination_values_are_rejected(
        #[case] limit: Option<usize>,
        #[case] cursor: Option<&str>,
        #[case] field: &str,
        #[case] code: &str,
    ) {
        let query = PageQuery {
            limit,
            cursor: cursor.map(str::to_owned),
        };
        let error = query.to_request().expect_err("invalid page");
        assert_eq!(detail(&error, "field"), Some(field));
        assert_eq!(detail(&error, "code"), Some(code));
    }

    #[rstest]
    fn missing_pagination_uses_defaults() {
        let request = PageQuery::default().to_request().expect("defaults");
        assert_eq!(request.limit(), pagination::DEFAULT_LIMIT);
        assert_eq!(request.offset(), 0);
    }
}
