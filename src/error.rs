//! Structural errors raised while deriving a select clause.

use thiserror::Error;

type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Fatal schema violations. The first one encountered aborts the build.
#[derive(Error, Debug)]
pub enum SelectError {
    /// A schema that must carry an identifier has none
    #[error("{0} must have an 'id' field")]
    MissingIdField(String),

    /// Mapping nested inside a mapping
    #[error("Deeply nested dictionaries are not supported in field '{0}'")]
    DeeplyNestedDictionary(String),

    /// Tuple field, or tuple as a collection element
    #[error("Tuples are not supported in field '{0}'")]
    NestedTuple(String),

    #[error("Invalid field type for '{field}': {ty}")]
    InvalidFieldType { field: String, ty: String },

    /// Unrecognized extensibility policy
    #[error("{0}")]
    ModelConfig(String),

    /// Unexpected failure while classifying or expanding a field
    #[error("{message}")]
    TypeProcessing {
        message: String,
        #[source]
        source: Option<Cause>,
    },
}

impl SelectError {
    pub fn type_processing(message: impl Into<String>, source: impl Into<Cause>) -> Self {
        SelectError::TypeProcessing { message: message.into(), source: Some(source.into()) }
    }

    /// Errors caused by nesting the select grammar cannot express.
    pub fn is_nesting_error(&self) -> bool {
        matches!(self, SelectError::DeeplyNestedDictionary(_) | SelectError::NestedTuple(_))
    }
}

/// Result type for select derivation
pub type Result<T> = std::result::Result<T, SelectError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn messages_name_the_offender() {
        assert_eq!(
            SelectError::DeeplyNestedDictionary("level1".into()).to_string(),
            "Deeply nested dictionaries are not supported in field 'level1'"
        );
        assert_eq!(
            SelectError::MissingIdField("Model".into()).to_string(),
            "Model must have an 'id' field"
        );
    }

    #[test]
    fn type_processing_keeps_cause() {
        let err = SelectError::type_processing(
            "Error processing field 'x'",
            crate::schema::SchemaError::Unknown("Ghost".into()),
        );
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("unknown schema 'Ghost'"));
        assert!(!err.is_nesting_error());
        assert!(SelectError::NestedTuple("t".into()).is_nesting_error());
    }
}
