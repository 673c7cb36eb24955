use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde_json::json;
use std::fmt;

/// Error taxonomy for plate-management operations.
///
/// Validation failures and rule violations are user-visible outcomes; database
/// failures map to opaque 5xx responses and abort the remaining work with any
/// already-persisted effects left in place (the merge is deliberately not
/// transactional, see `plates::services`).
#[derive(Debug, Clone)]
pub enum BusinessError {
    /// Invalid user input (400 Bad Request)
    ValidationError { field: String, message: String },
    /// Business rule violations, e.g. screen safety (422 Unprocessable Entity)
    BusinessRuleViolation { rule: String, message: String },
    /// Resource not found (404 Not Found)
    NotFound { resource: String, id: String },
    /// Duplicate resource (409 Conflict)
    Duplicate { resource: String, field: String },
    /// Database connectivity failure (502 Bad Gateway)
    ExternalServiceError { service: String, message: String },
    /// Generic application error (500 Internal Server Error)
    InternalError { message: String },
}

impl fmt::Display for BusinessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusinessError::ValidationError { field, message } => {
                write!(f, "Validation error in field '{field}': {message}")
            }
            BusinessError::BusinessRuleViolation { rule, message } => {
                write!(f, "Business rule '{rule}' violated: {message}")
            }
            BusinessError::NotFound { resource, id } => {
                write!(f, "{resource} with id '{id}' not found")
            }
            BusinessError::Duplicate { resource, field } => {
                write!(f, "{resource} with this {field} already exists")
            }
            BusinessError::ExternalServiceError { service, message } => {
                write!(f, "External service '{service}' error: {message}")
            }
            BusinessError::InternalError { message } => {
                write!(f, "Internal error: {message}")
            }
        }
    }
}

impl std::error::Error for BusinessError {}

/// Convert `BusinessError` to HTTP responses
impl IntoResponse for BusinessError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            BusinessError::ValidationError { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            BusinessError::BusinessRuleViolation { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "BUSINESS_RULE_VIOLATION")
            }
            BusinessError::NotFound { .. } => (StatusCode::NOT_FOUND, "RESOURCE_NOT_FOUND"),
            BusinessError::Duplicate { .. } => (StatusCode::CONFLICT, "DUPLICATE_RESOURCE"),
            BusinessError::ExternalServiceError { .. } => {
                (StatusCode::BAD_GATEWAY, "EXTERNAL_SERVICE_ERROR")
            }
            BusinessError::InternalError { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Map `DbErr` to appropriate HTTP responses with business context
pub fn map_db_error(err: DbErr, context: &str) -> BusinessError {
    match err {
        DbErr::RecordNotFound(msg) => BusinessError::NotFound {
            resource: context.replace('_', " "),
            id: extract_id_from_message(&msg),
        },
        DbErr::Conn(conn_err) => BusinessError::ExternalServiceError {
            service: "database".to_string(),
            message: conn_err.to_string(),
        },
        DbErr::Exec(exec_err) => {
            let err_msg = exec_err.to_string();
            if err_msg.contains("UNIQUE constraint") || err_msg.contains("duplicate key") {
                BusinessError::Duplicate {
                    resource: context.replace('_', " "),
                    field: "position".to_string(),
                }
            } else {
                BusinessError::InternalError { message: err_msg }
            }
        }
        _ => BusinessError::InternalError {
            message: err.to_string(),
        },
    }
}

/// Pull an id out of messages shaped like "Plate with id 'value' not found"
fn extract_id_from_message(msg: &str) -> String {
    if let Some(start_pos) = msg.find(" id '") {
        let after_id = &msg[start_pos + 5..];
        if let Some(end_pos) = after_id.find('\'') {
            return after_id[..end_pos].to_string();
        }
    }
    "unknown".to_string()
}

/// Convenience macros for creating business errors
#[macro_export]
macro_rules! validation_error {
    ($field:expr, $message:expr) => {
        $crate::common::errors::BusinessError::ValidationError {
            field: $field.to_string(),
            message: $message.to_string(),
        }
    };
}

#[macro_export]
macro_rules! business_rule_violation {
    ($rule:expr, $message:expr) => {
        $crate::common::errors::BusinessError::BusinessRuleViolation {
            rule: $rule.to_string(),
            message: $message.to_string(),
        }
    };
}

#[macro_export]
macro_rules! not_found {
    ($resource:expr, $id:expr) => {
        $crate::common::errors::BusinessError::NotFound {
            resource: $resource.to_string(),
            id: $id.to_string(),
        }
    };
}

/// Extension trait to add business error conversion to `DbErr`
pub trait DbErrorExt {
    fn to_business_error(self, context: &str) -> BusinessError;
}

impl DbErrorExt for DbErr {
    fn to_business_error(self, context: &str) -> BusinessError {
        map_db_error(self, context)
    }
}

/// Result type alias for business operations
pub type BusinessResult<T> = Result<T, BusinessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_macro_builds_the_right_variant() {
        let err = validation_error!("order_by", "some runs have no start time");
        assert!(matches!(err, BusinessError::ValidationError { .. }));
        assert!(err.to_string().contains("order_by"));
    }

    #[test]
    fn record_not_found_maps_to_not_found() {
        let db_err = DbErr::RecordNotFound("Plate with id 'abc-123' not found".to_string());
        let business_err = map_db_error(db_err, "plate");

        match business_err {
            BusinessError::NotFound { resource, id } => {
                assert_eq!(resource, "plate");
                assert_eq!(id, "abc-123");
            }
            other => panic!("Expected not found error, got {other:?}"),
        }
    }

    #[test]
    fn screen_safety_violation_renders_rule_and_message() {
        let err = business_rule_violation!("same_screen", "plates belong to different screens");
        assert_eq!(
            err.to_string(),
            "Business rule 'same_screen' violated: plates belong to different screens"
        );
    }
}
