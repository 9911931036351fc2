//! Select-clause derivation from a schema graph.
//!
//! Every expression list starts with `"*"`, which already covers scalar
//! fields. Only records, collections of records and mappings need explicit
//! node templates. Schema names are the identities used for cycle detection:
//! a schema already expanded during this build resolves to `["*"]`.

use std::collections::HashSet;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{Result, SelectError};
use crate::schema::{FieldType, Schema, SchemaSet};
use crate::select::SelectExprList;
use crate::shape::{self, Shape};

/// Outcome of a successful build.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub select: SelectExprList,
    pub diagnostics: Vec<Diagnostic>,
}

/// Single-use builder; all state lives for one [`SelectBuilder::build`].
pub struct SelectBuilder<'s> {
    schemas: &'s SchemaSet,
    diagnostics: Diagnostics,
    visited: HashSet<&'s str>,  // root is never pre-added
}

impl<'s> SelectBuilder<'s> {
    pub fn new(schemas: &'s SchemaSet) -> Self {
        Self { schemas, diagnostics: Diagnostics::new(), visited: HashSet::new() }
    }

    /// Walks `root` and every schema reachable from it. Diagnostics are
    /// flushed only when the whole walk succeeds.
    pub fn build(mut self, root: &'s Schema) -> Result<Selection> {
        let span = tracing::debug_span!("select_build", schema = %root.name);
        let _guard = span.enter();

        let select = self.expand_fields(root)?;
        let diagnostics = self.diagnostics.flush();
        tracing::debug!(entries = select.len(), diagnostics = diagnostics.len(), "select built");
        Ok(Selection { select, diagnostics })
    }

    fn expand_fields(&mut self, schema: &'s Schema) -> Result<SelectExprList> {
        let mut select = SelectExprList::wildcard();
        for (name, ty) in schema.non_id_fields() {
            self.process_field(name, ty, &mut select)?;
        }
        self.check_optional_fields(schema);
        Ok(select)
    }

    fn process_field(&mut self, field: &str, ty: &FieldType, select: &mut SelectExprList) -> Result<()> {
        let real = shape::real_type(ty);
        check_nesting(field, real)?;

        match shape::classify(real) {
            // covered by "*"
            Shape::Primitive(_) => {}
            Shape::Record(name) => {
                let nested = self.expand_nested(field, name)?;
                select.push_node(field, nested);
            }
            Shape::Collection(item) => {
                self.diagnostics.add(Diagnostic::list_order(field));
                match shape::classify(item) {
                    Shape::Record(name) => {
                        let nested = self.expand_nested(field, name)?;
                        select.push_node(field, nested);
                    }
                    Shape::Mapping(_) => select.push_node(field, SelectExprList::wildcard()),
                    Shape::Tuple(_) => return Err(SelectError::NestedTuple(field.to_string())),
                    _ => {}
                }
            }
            Shape::Mapping(_) => select.push_node(field, SelectExprList::wildcard()),
            Shape::Tuple(_) => return Err(SelectError::NestedTuple(field.to_string())),
            Shape::Invalid(_) => {
                return Err(SelectError::InvalidFieldType {
                    field: field.to_string(),
                    ty: ty.to_string(),
                });
            }
        }
        Ok(())
    }

    fn expand_nested(&mut self, field: &str, name: &str) -> Result<SelectExprList> {
        let schema = self.schemas.get(name).map_err(|e| {
            SelectError::type_processing(
                format!("Error processing field '{field}' of type {name}: {e}"),
                e,
            )
        })?;

        if !self.visited.insert(schema.name.as_str()) {
            tracing::debug!(field, schema = %schema.name, "schema already expanded, using wildcard");
            return Ok(SelectExprList::wildcard());
        }

        if shape::requires_id(schema)? && !schema.has_id() {
            return Err(SelectError::MissingIdField(format!("Nested model '{}'", schema.name)));
        }

        tracing::debug!(field, schema = %schema.name, "expanding nested schema");
        self.expand_fields(schema)
    }

    /// Advises when a model could be inserted with nothing but its id.
    fn check_optional_fields(&mut self, schema: &Schema) {
        let non_id: Vec<(&String, &FieldType)> = schema.non_id_fields().collect();
        if non_id.is_empty() {
            return;
        }
        if non_id.iter().any(|(_, ty)| shape::classify(ty).is_record_or_collection()) {
            return;
        }
        if let [(field, _)] = non_id.as_slice() {
            self.diagnostics.add(Diagnostic::single_optional_field(field));
        } else {
            self.diagnostics.add(Diagnostic::empty_model(&schema.name));
        }
    }
}

/// Mapping-of-mapping cannot be expressed as a node template, whether the
/// field is a mapping itself or a collection of them.
fn check_nesting(field: &str, real: &FieldType) -> Result<()> {
    let depth = match real {
        FieldType::Collection(item) => shape::mapping_depth(item),
        other => shape::mapping_depth(other),
    };
    if depth > 1 {
        return Err(SelectError::DeeplyNestedDictionary(field.to_string()));
    }
    Ok(())
}

// ------------------------------- Tests ------------------------------------ //
