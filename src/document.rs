//! Schema documents: JSON files describing a set of named schemas.
//!
//! ```json
//! {
//!   "User":    { "fields": { "id": "str", "address": "Address | None" } },
//!   "Address": { "fields": { "street": "str" }, "extra": "allow" }
//! }
//! ```
use indexmap::IndexMap;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::schema::{Schema, SchemaError, SchemaSet};
use crate::type_expr::{self, TypeExprError};

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("at JSON path {path} → {message}")]
    Json { path: String, message: String },
    #[error("{schema}.{field}: {source}")]
    TypeExpr {
        schema: String,
        field: String,
        #[source]
        source: TypeExprError,
    },
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaDoc {
    fields: IndexMap<String, String>,
    #[serde(default)]
    extra: Option<String>,
}

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, DocumentError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| DocumentError::Json {
        path: err.path().to_string(),
        message: err.into_inner().to_string(),
    })
}

/// Parses a schema document and lowers every field's type expression.
pub fn parse_document(src: &str) -> Result<SchemaSet, DocumentError> {
    let docs: IndexMap<String, SchemaDoc> = from_str_with_path(src)?;
    let mut set = SchemaSet::new();
    for (name, doc) in docs {
        let mut schema = Schema::new(name.clone());
        schema.extra = doc.extra;
        for (field, expr) in doc.fields {
            let ty = type_expr::parse(&expr).map_err(|source| DocumentError::TypeExpr {
                schema: name.clone(),
                field: field.clone(),
                source,
            })?;
            schema.fields.insert(field, ty);
        }
        set.insert(schema)?;
    }
    Ok(set)
}
