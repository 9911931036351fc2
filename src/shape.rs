//! Shape classification for field types.
//!
//! Pure and total over [`FieldType`]: every descriptor maps to exactly one
//! [`Shape`]. Optional and union wrappers are peeled first.

use crate::error::Result;
use crate::schema::{ExtraPolicy, FieldType, Primitive, Schema};

/// Verdict for a field's real (unwrapped) type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape<'a> {
    Primitive(Primitive),
    Record(&'a str),
    Collection(&'a FieldType),  // element type, still wrapped
    Mapping(&'a FieldType),     // value type, still wrapped
    Tuple(&'a [FieldType]),
    Invalid(&'a FieldType),
}

impl Shape<'_> {
    /// Records and collections are the shapes that keep a model from being
    /// insertable with nothing but its identifier.
    pub fn is_record_or_collection(&self) -> bool {
        matches!(self, Shape::Record(_) | Shape::Collection(_))
    }
}

/// Strips `Optional`/`Union` wrappers down to a representative type.
///
/// For unions a collection member wins, otherwise the first member. A
/// heterogeneous union (record vs mapping, say) therefore classifies as
/// whichever comes first.
pub fn real_type(ty: &FieldType) -> &FieldType {
    match ty {
        FieldType::Optional(inner) => real_type(inner),
        FieldType::Union(members) => {
            let pick = members
                .iter()
                .find(|m| matches!(m, FieldType::Collection(_)))
                .or_else(|| members.first());
            match pick {
                Some(member) => real_type(member),
                None => ty,
            }
        }
        _ => ty,
    }
}

pub fn classify(ty: &FieldType) -> Shape<'_> {
    match real_type(ty) {
        FieldType::Primitive(kind) => Shape::Primitive(*kind),
        FieldType::Record(name) => Shape::Record(name),
        FieldType::Collection(item) => Shape::Collection(item),
        FieldType::Mapping(value) => Shape::Mapping(value),
        FieldType::Tuple(elems) => Shape::Tuple(elems),
        other @ (FieldType::Opaque(_) | FieldType::Optional(_) | FieldType::Union(_)) => {
            Shape::Invalid(other)
        }
    }
}

/// Number of directly nested mappings; 0 for anything that is not a mapping.
pub fn mapping_depth(ty: &FieldType) -> usize {
    let mut depth = 0;
    let mut cur = real_type(ty);
    while let FieldType::Mapping(value) = cur {
        depth += 1;
        cur = real_type(value);
    }
    depth
}

/// A nested record must declare `id` unless it tolerates extra keys.
/// An absent policy behaves as `forbid`.
pub fn requires_id(schema: &Schema) -> Result<bool> {
    Ok(!matches!(
        schema.extra_policy()?,
        Some(ExtraPolicy::Allow | ExtraPolicy::Ignore)
    ))
}
