use axum_helpers::AppError;
use strum::{Display, IntoStaticStr};
use thiserror::Error;

pub const MISSING_FIELDS_MESSAGE: &str = "Todos los campos son obligatorios excepto thumbnails.";
pub const NOT_FOUND_MESSAGE: &str = "Producto no encontrado";

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("{}", MISSING_FIELDS_MESSAGE)]
    MissingFields,

    #[error("Invalid product update: {0}")]
    InvalidPatch(String),

    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ProductResult<T> = Result<T, ProductError>;

/// The catalog operation a failure happened in.
///
/// Store failures are reported to clients with a per-operation message, so
/// every handler tags its errors with one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    /// Client-facing message for an internal failure of this operation.
    pub fn failure_message(self) -> &'static str {
        match self {
            Operation::List => "Error al obtener productos",
            Operation::Get => "Error al obtener producto",
            Operation::Create => "Error al agregar producto",
            Operation::Update => "Error al actualizar producto",
            Operation::Delete => "Error al eliminar producto",
        }
    }
}

impl ProductError {
    /// Maps the error to an HTTP error for `operation`.
    ///
    /// Store failures are logged with their cause; the client only sees the
    /// operation's generic message.
    pub fn into_app_error(self, operation: Operation) -> AppError {
        match self {
            ProductError::MissingFields => AppError::Validation(MISSING_FIELDS_MESSAGE.to_string()),
            err @ ProductError::InvalidPatch(_) => AppError::BadRequest(err.to_string()),
            ProductError::NotFound(id) => {
                tracing::debug!(product_id = %id, %operation, "Product not found");
                AppError::NotFound(NOT_FOUND_MESSAGE.to_string())
            }
            err @ (ProductError::Database(_)
            | ProductError::Io(_)
            | ProductError::Serialization(_)) => {
                tracing::error!(%operation, error = %err, "Product store failure");
                AppError::InternalServerError(operation.failure_message().to_string())
            }
        }
    }
}

impl From<mongodb::error::Error> for ProductError {
    fn from(err: mongodb::error::Error) -> Self {
        ProductError::Database(err.to_string())
    }
}
