use std::collections::BTreeMap;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;
use tracing::error;
use validator::ValidationErrors;

use crate::report::ReportError;

#[derive(Debug, Display)]
pub enum AppError {
    #[display(fmt = "Please correct the errors below.")]
    Validation(ValidationErrors),

    #[display(fmt = "{}", _0)]
    NotFound(String),

    /// The record exists but belongs to a different employee.
    #[display(fmt = "{}", _0)]
    Mismatch(String),

    #[display(fmt = "Confirmation required: repeat the request with ?confirm=true")]
    ConfirmationRequired(serde_json::Value),

    #[display(fmt = "Database error: {}", _0)]
    Database(sqlx::Error),

    #[display(fmt = "Report error: {}", _0)]
    Report(ReportError),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{} not found", what))
    }

    fn field_messages(errors: &ValidationErrors) -> BTreeMap<&'static str, Vec<String>> {
        errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages = errs
                    .iter()
                    .map(|e| match &e.message {
                        Some(message) => message.to_string(),
                        None => e.code.to_string(),
                    })
                    .collect();
                (field, messages)
            })
            .collect()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(e: ValidationErrors) -> Self {
        AppError::Validation(e)
    }
}

impl From<ReportError> for AppError {
    fn from(e: ReportError) -> Self {
        AppError::Report(e)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::Mismatch(_) => StatusCode::NOT_FOUND,
            AppError::ConfirmationRequired(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Report(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Validation(errors) => json!({
                "message": self.to_string(),
                "errors": Self::field_messages(errors),
            }),
            AppError::ConfirmationRequired(record) => json!({
                "message": self.to_string(),
                "record": record,
            }),
            AppError::NotFound(_) | AppError::Mismatch(_) => json!({
                "message": self.to_string(),
            }),
            AppError::Database(_) | AppError::Report(_) => {
                error!(error = %self, "Request failed");
                json!({
                    "message": "Something went wrong, Contact with system admin"
                })
            }
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use crate::utils::form::field_error;

    async fn body_json(err: AppError) -> serde_json::Value {
        let resp = err.error_response();
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[actix_web::test]
    async fn validation_errors_are_listed_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("sub_type", field_error("required", "Please choose Rent/Bill/Guest."));

        let err = AppError::from(errors);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let body = body_json(err).await;
        assert_eq!(body["errors"]["sub_type"][0], "Please choose Rent/Bill/Guest.");
    }

    #[actix_web::test]
    async fn mismatch_is_a_visible_not_found() {
        let err = AppError::Mismatch("Work record does not belong to this employee".into());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(err).await["message"],
            "Work record does not belong to this employee"
        );
    }

    #[actix_web::test]
    async fn database_details_stay_in_the_log() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(err).await;
        assert!(!body["message"].as_str().unwrap().contains("no rows"));
    }

    #[test]
    fn confirmation_is_a_conflict() {
        let err = AppError::ConfirmationRequired(json!({"id": 1}));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }
}
