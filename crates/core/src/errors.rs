use rust_decimal::Decimal;
use thiserror::Error;

use crate::export::ExportError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown {field} option `{value}`")]
    UnknownOption { field: &'static str, value: String },
    #[error("unknown add-on `{0}` (catalog ids need no price, custom items need name and price)")]
    UnknownAddOn(String),
    #[error("{field} `{value}` exceeds the accepted maximum of {max}")]
    OutOfRange { field: &'static str, value: String, max: Decimal },
    #[error("invalid date `{0}` (expected YYYY-MM-DD)")]
    InvalidDate(String),
}

impl DomainError {
    pub fn unknown_option(field: &'static str, value: &str) -> Self {
        Self::UnknownOption { field, value: value.trim().to_string() }
    }
}

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("export failure: {0}")]
    Export(#[from] ExportError),
    #[error("export format `{0}` is not available")]
    ExportUnavailable(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "This output is not available right now. Other formats remain usable."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. }
            | Self::ServiceUnavailable { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(error) => {
                Self::BadRequest { message: error.to_string(), correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::ExportUnavailable(format) => Self::ServiceUnavailable {
                message: format!("export format `{format}` is not available"),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Export(error) => {
                Self::Internal { message: error.to_string(), correlation_id: "unassigned".to_owned() }
            }
        }
    }
}
