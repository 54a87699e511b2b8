use thiserror::Error;

/// Caller input that can never become a valid [`PrefixFilter`](crate::PrefixFilter).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("prefix filter cannot be empty")]
    EmptyPrefixFilter,
    #[error("prefix at position {position} is empty after trimming")]
    BlankPrefix { position: usize },
    #[error("prefix filter has {count} prefixes; at most {max} are allowed")]
    TooManyPrefixes { count: usize, max: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionStage {
    Begin,
    SelectIds,
    Delete,
    Commit,
}

impl TransactionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::SelectIds => "select_ids",
            Self::Delete => "delete",
            Self::Commit => "commit",
        }
    }
}

impl std::fmt::Display for TransactionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("query failed during {operation}: {message}")]
    Query { operation: &'static str, message: String },
    #[error("delete transaction failed at {stage}: {message}")]
    Transaction { stage: TransactionStage, message: String },
}

impl StoreError {
    pub fn query(operation: &'static str, error: impl std::fmt::Display) -> Self {
        Self::Query { operation, message: error.to_string() }
    }

    pub fn transaction(stage: TransactionStage, error: impl std::fmt::Display) -> Self {
        Self::Transaction { stage, message: error.to_string() }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("validation failed: {0}")]
    Validation(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check the prefix parameter and try again."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. } | Self::Internal { correlation_id, .. } => {
                correlation_id
            }
        }
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Validation(error) => {
                Self::BadRequest { message: error.to_string(), correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Store(error) => {
                Self::Internal { message: error.to_string(), correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{
        ApplicationError, DomainError, InterfaceError, StoreError, TransactionStage,
    };

    #[test]
    fn validation_error_maps_to_bad_request_interface_error() {
        let interface =
            ApplicationError::from(DomainError::EmptyPrefixFilter).into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ..
            } if correlation_id == "req-1"
        ));
        assert_eq!(
            interface.user_message(),
            "The request could not be processed. Check the prefix parameter and try again."
        );
    }

    #[test]
    fn query_error_maps_to_internal() {
        let interface = ApplicationError::from(StoreError::query("search", "disk I/O error"))
            .into_interface("req-2");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.correlation_id(), "req-2");
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }

    #[test]
    fn transaction_error_names_the_failed_stage() {
        let error = StoreError::transaction(TransactionStage::Delete, "constraint failed");
        assert_eq!(error.to_string(), "delete transaction failed at delete: constraint failed");

        let interface = ApplicationError::from(error).into_interface("req-3");
        assert!(matches!(
            interface,
            InterfaceError::Internal { ref message, .. } if message.contains("at delete")
        ));
    }

    #[test]
    fn blank_prefix_is_a_validation_error() {
        let error = ApplicationError::from(DomainError::BlankPrefix { position: 2 });
        assert!(error.is_validation());
        assert_eq!(
            error.to_string(),
            "validation failed: prefix at position 2 is empty after trimming"
        );
    }
}
