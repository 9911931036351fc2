//! Derive Fluree select clauses from static data-model schemas.
//!
//! ```
//! use fluree_select::{from_schema, FieldType, Schema, SchemaSet};
//!
//! let schemas = SchemaSet::new()
//!     .with(Schema::new("Address").field("id", FieldType::string()).field("street", FieldType::string()))
//!     .unwrap();
//! let user = Schema::new("User")
//!     .field("id", FieldType::string())
//!     .field("name", FieldType::string())
//!     .field("address", FieldType::record("Address"));
//!
//! let select = from_schema(&schemas, &user).unwrap();
//! assert_eq!(serde_json::to_value(&select).unwrap(), serde_json::json!(["*", {"address": ["*"]}]));
//! ```
pub mod builder;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod schema;
pub mod select;
pub mod shape;
pub mod type_expr;

pub use builder::{SelectBuilder, Selection};
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use error::{Result, SelectError};
pub use schema::{ExtraPolicy, FieldType, Primitive, Schema, SchemaSet};
pub use select::{SelectClause, SelectExpr, SelectExprList};

/// Validates the root schema and builds its selection, returning the
/// diagnostics alongside it.
///
/// The `id` check runs before anything else, including model-config
/// validation. `schemas` resolves nested record references; `root` does
/// not need to be a member.
pub fn build_selection<'s>(schemas: &'s SchemaSet, root: &'s Schema) -> Result<Selection> {
    if !root.has_id() {
        return Err(SelectError::MissingIdField(root.name.clone()));
    }
    root.extra_policy()?;
    SelectBuilder::new(schemas).build(root)
}

/// Select expression list for `root`. Diagnostics are only logged.
pub fn from_schema(schemas: &SchemaSet, root: &Schema) -> Result<SelectExprList> {
    build_selection(schemas, root).map(|s| s.select)
}
