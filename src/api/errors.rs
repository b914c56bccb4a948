//! # Manejo de errores
//!
//! Jerarquía de errores de la aplicación con thiserror. Cada variante se
//! traduce a una respuesta JSON `{success: false, error, message}`.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::error::Error;
use thiserror::Error;

use crate::lunch::SelectionError;

/// Mensaje único para fallos de guardado; no se distingue entre errores
/// transitorios y permanentes
pub const RETRY_LATER: &str = "No se pudo guardar, inténtelo de nuevo más tarde";

/// Tipos de error de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    /// Error de base de datos con la operación que falló
    #[error("Error de base de datos en operación '{operation}': {source}")]
    Database {
        operation: String,
        #[source]
        source: mongodb::error::Error,
    },

    /// La operación no terminó dentro del límite configurado
    #[error("Tiempo de espera agotado en operación '{operation}'")]
    Timeout { operation: String },

    /// Día no reservable (fecha inválida, pasada, fuera de plazo o fin de semana)
    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("Error de validación en campo '{field}': {message}")]
    ValidationWithField { field: String, message: String },

    #[error("Error de validación: {0}")]
    Validation(String),

    #[error("No encontrado: {resource_type} con ID '{id}'")]
    NotFoundWithId { resource_type: String, id: String },

    /// Error interno con código de rastreo
    #[error("Error interno (trace: {trace_id}): {message}")]
    InternalWithTrace { trace_id: String, message: String },

    #[error("Error interno: {0}")]
    Internal(String),
}

impl AppError {
    pub fn database(operation: &str, source: mongodb::error::Error) -> Self {
        Self::Database {
            operation: operation.to_string(),
            source,
        }
    }

    pub fn timeout(operation: &str) -> Self {
        Self::Timeout {
            operation: operation.to_string(),
        }
    }

    pub fn validation_field(field: &str, message: &str) -> Self {
        Self::ValidationWithField {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    pub fn not_found_id(resource_type: &str, id: &str) -> Self {
        Self::NotFoundWithId {
            resource_type: resource_type.to_string(),
            id: id.to_string(),
        }
    }

    /// Crea un error interno con trace ID (nuevo si no se indica)
    pub fn internal_trace(message: &str, trace_id: Option<String>) -> Self {
        Self::InternalWithTrace {
            trace_id: trace_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            message: message.to_string(),
        }
    }

    /// Errores que el usuario puede resolver reintentando
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Database { .. }
                | Self::Timeout { .. }
                | Self::InternalWithTrace { .. }
                | Self::Internal(_)
        )
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Selection(_) | Self::ValidationWithField { .. } | Self::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFoundWithId { .. } => StatusCode::NOT_FOUND,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Database { .. } | Self::InternalWithTrace { .. } | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Log detallado del error antes de responder
        let body = match self {
            Self::Database { operation, source } => {
                tracing::error!(
                    operation = %operation,
                    error = %source,
                    error_chain = ?source.source(),
                    "Database error occurred"
                );
                ErrorResponse::new("Error de base de datos", RETRY_LATER)
            }
            Self::Timeout { operation } => {
                tracing::error!(operation = %operation, "Store operation timed out");
                ErrorResponse::new("Tiempo de espera agotado", RETRY_LATER)
            }
            Self::Selection(reason) => {
                tracing::info!(reason = %reason, "Day rejected by booking window");
                ErrorResponse::new("Día no reservable", &reason.to_string())
            }
            Self::ValidationWithField { field, message } => {
                tracing::warn!(field = %field, message = %message, "Validation error");
                ErrorResponse::new(
                    "Error de validación",
                    &format!("Campo '{}': {}", field, message),
                )
            }
            Self::Validation(message) => {
                tracing::warn!(message = %message, "Validation error");
                ErrorResponse::new("Error de validación", message)
            }
            Self::NotFoundWithId { resource_type, id } => {
                tracing::info!(resource_type = %resource_type, id = %id, "Resource not found");
                ErrorResponse::new(
                    "No encontrado",
                    &format!("{} con ID '{}' no encontrado", resource_type, id),
                )
            }
            Self::InternalWithTrace { trace_id, message } => {
                tracing::error!(
                    trace_id = %trace_id,
                    message = %message,
                    "Internal error with trace"
                );
                ErrorResponse::new(
                    "Error interno",
                    &format!("{} (trace: {})", RETRY_LATER, trace_id),
                )
            }
            Self::Internal(message) => {
                tracing::error!(message = %message, "Internal error");
                ErrorResponse::new("Error interno", RETRY_LATER)
            }
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    fn new(error: &str, message: &str) -> Self {
        Self {
            success: false,
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lunch::ReservationDay;

    #[test]
    fn selection_errors_are_bad_requests() {
        let dia = ReservationDay::parse("2024-05-11").unwrap();
        let err = AppError::from(SelectionError::Weekend { dia });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_retryable());
    }

    #[test]
    fn store_failures_are_retryable() {
        let err = AppError::timeout("apply_delta");
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert!(err.is_retryable());
        assert!(AppError::internal_trace("fallo", None).is_retryable());
    }

    #[test]
    fn unknown_student_is_not_found() {
        let err = AppError::not_found_id("Alumno", "nadie@escola.pt");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert!(!err.is_retryable());
    }

    #[test]
    fn trace_id_is_generated_when_missing() {
        match AppError::internal_trace("fallo", None) {
            AppError::InternalWithTrace { trace_id, .. } => assert!(!trace_id.is_empty()),
            other => panic!("variante inesperada: {other:?}"),
        }
    }
}
