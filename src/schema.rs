//! Static schema description consumed by the select builder.
//!
//! A `SchemaSet` is a registry of named record schemas. Nested records are
//! referenced by name, so self- and mutually-referential models are plain data
//! and schema identity is simply the name.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::error::SelectError;

/// Name of the identifier field every insertable record carries.
pub const ID_FIELD: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    String,
    Integer,
    Float,
    Boolean,
}

/// Declared type of a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Primitive(Primitive),
    Optional(Box<FieldType>),
    Union(Vec<FieldType>),       // non-null members only; null is expressed via Optional
    Collection(Box<FieldType>),  // ordered sequence
    Mapping(Box<FieldType>),     // string-keyed, value type
    Record(String),              // reference into the owning SchemaSet
    Tuple(Vec<FieldType>),
    Opaque(String),              // anything the derivation step could not map
}

impl FieldType {
    pub fn string() -> Self { FieldType::Primitive(Primitive::String) }
    pub fn integer() -> Self { FieldType::Primitive(Primitive::Integer) }
    pub fn float() -> Self { FieldType::Primitive(Primitive::Float) }
    pub fn boolean() -> Self { FieldType::Primitive(Primitive::Boolean) }

    pub fn optional(inner: FieldType) -> Self { FieldType::Optional(Box::new(inner)) }
    pub fn list(item: FieldType) -> Self { FieldType::Collection(Box::new(item)) }
    pub fn map(value: FieldType) -> Self { FieldType::Mapping(Box::new(value)) }
    pub fn record(name: impl Into<String>) -> Self { FieldType::Record(name.into()) }
}

/// Renders the type-expression syntax accepted by [`crate::type_expr::parse`].
///
/// Parsing the output gives back any type the parser itself produces. A
/// hand-built `Union` with an `Optional` member is not in that form: it
/// renders as `A | None | B` and parses back as `Optional(Union[A, B])`.
impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, xs: &[FieldType], sep: &str) -> fmt::Result {
            for (i, x) in xs.iter().enumerate() {
                if i > 0 { f.write_str(sep)?; }
                write!(f, "{x}")?;
            }
            Ok(())
        }
        match self {
            FieldType::Primitive(Primitive::String) => f.write_str("str"),
            FieldType::Primitive(Primitive::Integer) => f.write_str("int"),
            FieldType::Primitive(Primitive::Float) => f.write_str("float"),
            FieldType::Primitive(Primitive::Boolean) => f.write_str("bool"),
            FieldType::Optional(inner) => write!(f, "{inner} | None"),
            FieldType::Union(members) => join(f, members, " | "),
            FieldType::Collection(item) => write!(f, "list[{item}]"),
            FieldType::Mapping(value) => write!(f, "dict[str, {value}]"),
            FieldType::Record(name) => f.write_str(name),
            FieldType::Tuple(elems) => {
                f.write_str("tuple[")?;
                join(f, elems, ", ")?;
                f.write_str("]")
            }
            FieldType::Opaque(text) => f.write_str(text),
        }
    }
}

// ------------------------------ Extra policy ------------------------------ //

/// How a model treats keys it does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraPolicy {
    Allow,
    Ignore,
    Forbid,
}

impl FromStr for ExtraPolicy {
    type Err = SelectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allow" => Ok(ExtraPolicy::Allow),
            "ignore" => Ok(ExtraPolicy::Ignore),
            "forbid" => Ok(ExtraPolicy::Forbid),
            other => Err(SelectError::ModelConfig(format!(
                "Invalid 'extra' configuration value: {other}. Must be one of: 'allow', 'ignore', 'forbid'"
            ))),
        }
    }
}

impl fmt::Display for ExtraPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExtraPolicy::Allow => "allow",
            ExtraPolicy::Ignore => "ignore",
            ExtraPolicy::Forbid => "forbid",
        })
    }
}

// --------------------------------- Schema --------------------------------- //

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub name: String,
    pub fields: IndexMap<String, FieldType>,  // declaration order
    /// Raw `extra` setting as declared. Kept unparsed so an unrecognized
    /// value surfaces as a `ModelConfig` error during the build.
    pub extra: Option<String>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: IndexMap::new(), extra: None }
    }

    pub fn field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.insert(name.into(), ty);
        self
    }

    pub fn extra(mut self, policy: impl Into<String>) -> Self {
        self.extra = Some(policy.into());
        self
    }

    pub fn has_id(&self) -> bool {
        self.fields.contains_key(ID_FIELD)
    }

    /// Parsed extra policy; `None` when the schema declares none.
    pub fn extra_policy(&self) -> Result<Option<ExtraPolicy>, SelectError> {
        self.extra.as_deref().map(str::parse).transpose()
    }

    /// Fields other than the identifier, in declaration order.
    pub fn non_id_fields(&self) -> impl Iterator<Item = (&String, &FieldType)> {
        self.fields.iter().filter(|(name, _)| name.as_str() != ID_FIELD)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("unknown schema '{0}'")]
    Unknown(String),
    #[error("schema '{0}' is defined more than once")]
    Duplicate(String),
}

// ------------------------------- Schema set ------------------------------- //

/// Registry of every schema a build may reach.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaSet {
    schemas: IndexMap<String, Schema>,
}

impl SchemaSet {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, schema: Schema) -> Result<(), SchemaError> {
        if self.schemas.contains_key(&schema.name) {
            return Err(SchemaError::Duplicate(schema.name));
        }
        self.schemas.insert(schema.name.clone(), schema);
        Ok(())
    }

    pub fn with(mut self, schema: Schema) -> Result<Self, SchemaError> {
        self.insert(schema)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Result<&Schema, SchemaError> {
        self.schemas.get(name).ok_or_else(|| SchemaError::Unknown(name.to_string()))
    }

    /// Folds another set into this one; names must not collide.
    pub fn extend(&mut self, other: SchemaSet) -> Result<(), SchemaError> {
        for (_, schema) in other.schemas {
            self.insert(schema)?;
        }
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize { self.schemas.len() }
    pub fn is_empty(&self) -> bool { self.schemas.is_empty() }
}
