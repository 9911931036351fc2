//! Typed select-clause values.
//!
//! ```text
//! SelectClause   = SelectObject | SelectArray
//! SelectObject   = { LogicVariable: SelectExprList }
//! SelectArray    = [ LogicVariable | SelectObject , ... ]
//! SelectExprList = [ SelectExpr , ... ]          (non-empty)
//! SelectExpr     = "*" | Predicate | NodeTemplate
//! NodeTemplate   = { Predicate: SelectExprList }
//! LogicVariable  = "?" [a-zA-Z0-9_-]+
//! ```
//!
//! Serialization yields exactly this JSON. Parsing (`TryFrom<&Value>`, or
//! `Deserialize`) validates it.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

pub const WILDCARD: &str = "*";

static LOGIC_VARIABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\?[a-zA-Z0-9_-]+$").expect("static regex"));

/// `?name`, `?first-name`, `?address_1` ...
pub fn is_logic_variable(s: &str) -> bool {
    LOGIC_VARIABLE.is_match(s)
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ClauseError {
    #[error("at {at}: select expression list must not be empty")]
    EmptyList { at: String },
    #[error("at {at}: {what} must have at least one entry")]
    EmptyObject { at: String, what: &'static str },
    #[error("at {at}: '{var}' is not a logic variable")]
    InvalidVariable { at: String, var: String },
    #[error("at {at}: expected {expected}, found {found}")]
    Unexpected { at: String, expected: &'static str, found: &'static str },
}

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectExpr {
    Wildcard,
    Predicate(String),
    Node(NodeTemplate),
}

/// Never empty: constructed from the wildcard or validated on parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SelectExprList(Vec<SelectExpr>);

/// Predicate → nested expression list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct NodeTemplate(IndexMap<String, SelectExprList>);

/// Logic variable → expression list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct SelectObject(IndexMap<String, SelectExprList>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SelectArrayElement {
    Variable(String),
    Object(SelectObject),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SelectArray(Vec<SelectArrayElement>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SelectClause {
    Object(SelectObject),
    Array(SelectArray),
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Serialize for SelectExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SelectExpr::Wildcard => serializer.serialize_str(WILDCARD),
            SelectExpr::Predicate(p) => serializer.serialize_str(p),
            SelectExpr::Node(t) => t.serialize(serializer),
        }
    }
}

impl SelectExprList {
    /// `["*"]`
    pub fn wildcard() -> Self {
        Self(vec![SelectExpr::Wildcard])
    }

    pub fn push(&mut self, expr: SelectExpr) {
        self.0.push(expr);
    }

    /// Appends `{predicate: list}`.
    pub fn push_node(&mut self, predicate: impl Into<String>, list: SelectExprList) {
        self.0.push(SelectExpr::Node(NodeTemplate::single(predicate, list)));
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SelectExpr> { self.0.iter() }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn as_slice(&self) -> &[SelectExpr] { &self.0 }
    pub fn into_vec(self) -> Vec<SelectExpr> { self.0 }

    // A list is never empty, so there is no `is_empty`.
    pub fn first(&self) -> &SelectExpr { &self.0[0] }

    pub fn is_wildcard_only(&self) -> bool {
        matches!(self.0.as_slice(), [SelectExpr::Wildcard])
    }

    pub fn to_value(&self) -> Value {
        Value::Array(self.0.iter().map(SelectExpr::to_value).collect())
    }
}

impl SelectExpr {
    pub fn to_value(&self) -> Value {
        match self {
            SelectExpr::Wildcard => Value::from(WILDCARD),
            SelectExpr::Predicate(p) => Value::from(p.as_str()),
            SelectExpr::Node(t) => Value::Object(
                t.0.iter().map(|(k, v)| (k.clone(), v.to_value())).collect(),
            ),
        }
    }
}

impl NodeTemplate {
    pub fn single(predicate: impl Into<String>, list: SelectExprList) -> Self {
        let mut map = IndexMap::new();
        map.insert(predicate.into(), list);
        Self(map)
    }

    pub fn get(&self, predicate: &str) -> Option<&SelectExprList> { self.0.get(predicate) }
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, SelectExprList> { self.0.iter() }
}

impl SelectObject {
    pub fn get(&self, var: &str) -> Option<&SelectExprList> { self.0.get(var) }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl SelectArray {
    pub fn elements(&self) -> &[SelectArrayElement] { &self.0 }
}

impl SelectClause {
    /// `{ var: list }`, the usual envelope around a derived selection.
    pub fn for_variable(var: &str, list: SelectExprList) -> Result<Self, ClauseError> {
        if !is_logic_variable(var) {
            return Err(ClauseError::InvalidVariable { at: "/".into(), var: var.to_string() });
        }
        let mut map = IndexMap::new();
        map.insert(var.to_string(), list);
        Ok(SelectClause::Object(SelectObject(map)))
    }
}

// -------------------------------- Parsing -------------------------------- //

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn child(at: &str, key: impl std::fmt::Display) -> String {
    if at == "/" { format!("/{key}") } else { format!("{at}/{key}") }
}

fn parse_list(v: &Value, at: &str) -> Result<SelectExprList, ClauseError> {
    let xs = v.as_array().ok_or_else(|| ClauseError::Unexpected {
        at: at.to_string(),
        expected: "an expression list",
        found: kind_of(v),
    })?;
    if xs.is_empty() {
        return Err(ClauseError::EmptyList { at: at.to_string() });
    }
    let exprs = xs
        .iter()
        .enumerate()
        .map(|(i, x)| parse_expr(x, &child(at, i)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SelectExprList(exprs))
}

fn parse_expr(v: &Value, at: &str) -> Result<SelectExpr, ClauseError> {
    match v {
        Value::String(s) if s == WILDCARD => Ok(SelectExpr::Wildcard),
        Value::String(s) => Ok(SelectExpr::Predicate(s.clone())),
        Value::Object(m) if m.is_empty() => {
            Err(ClauseError::EmptyObject { at: at.to_string(), what: "node template" })
        }
        Value::Object(m) => {
            let mut template = NodeTemplate::default();
            for (k, sub) in m {
                template.0.insert(k.clone(), parse_list(sub, &child(at, k))?);
            }
            Ok(SelectExpr::Node(template))
        }
        other => Err(ClauseError::Unexpected {
            at: at.to_string(),
            expected: "a wildcard, predicate or node template",
            found: kind_of(other),
        }),
    }
}

fn parse_object(m: &serde_json::Map<String, Value>, at: &str) -> Result<SelectObject, ClauseError> {
    if m.is_empty() {
        return Err(ClauseError::EmptyObject { at: at.to_string(), what: "select object" });
    }
    let mut out = SelectObject::default();
    for (var, sub) in m {
        if !is_logic_variable(var) {
            return Err(ClauseError::InvalidVariable { at: at.to_string(), var: var.clone() });
        }
        out.0.insert(var.clone(), parse_list(sub, &child(at, var))?);
    }
    Ok(out)
}

impl TryFrom<&Value> for SelectExprList {
    type Error = ClauseError;
    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        parse_list(v, "/")
    }
}

impl TryFrom<&Value> for SelectClause {
    type Error = ClauseError;
    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        match v {
            Value::Object(m) => Ok(SelectClause::Object(parse_object(m, "/")?)),
            Value::Array(xs) => {
                let mut elems = Vec::with_capacity(xs.len());
                for (i, x) in xs.iter().enumerate() {
                    let at = child("/", i);
                    let el = match x {
                        Value::String(s) if is_logic_variable(s) => SelectArrayElement::Variable(s.clone()),
                        Value::String(s) => {
                            return Err(ClauseError::InvalidVariable { at, var: s.clone() });
                        }
                        Value::Object(m) => SelectArrayElement::Object(parse_object(m, &at)?),
                        other => {
                            return Err(ClauseError::Unexpected {
                                at,
                                expected: "a logic variable or select object",
                                found: kind_of(other),
                            });
                        }
                    };
                    elems.push(el);
                }
                Ok(SelectClause::Array(SelectArray(elems)))
            }
            other => Err(ClauseError::Unexpected {
                at: "/".into(),
                expected: "a select object or select array",
                found: kind_of(other),
            }),
        }
    }
}

impl<'de> Deserialize<'de> for SelectExprList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let v = Value::deserialize(deserializer)?;
        SelectExprList::try_from(&v).map_err(serde::de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for SelectClause {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let v = Value::deserialize(deserializer)?;
        SelectClause::try_from(&v).map_err(serde::de::Error::custom)
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn logic_variables() {
        for ok in ["?firstname", "?first-name", "?first_name", "?address-1"] {
            assert!(is_logic_variable(ok), "{ok}");
        }
        for bad in ["firstname", "?", "?first name", "?a\n", "??x", ""] {
            assert!(!is_logic_variable(bad), "{bad:?}");
        }
    }

    #[test]
    fn nested_list_serializes_to_grammar() {
        let mut inner = SelectExprList::wildcard();
        inner.push_node("address", SelectExprList::wildcard());
        let mut root = SelectExprList::wildcard();
        root.push(SelectExpr::Predicate("name".into()));
        root.push_node("bestFriend", inner);

        let expected = json!(["*", "name", {"bestFriend": ["*", {"address": ["*"]}]}]);
        assert_eq!(serde_json::to_value(&root).unwrap(), expected);
        assert_eq!(root.to_value(), expected);
    }

    #[test]
    fn parses_select_object_and_array() {
        let obj = json!({"?s": ["name", {"bestFriend": ["*"]}]});
        let clause = SelectClause::try_from(&obj).unwrap();
        let SelectClause::Object(o) = &clause else { panic!("expected object") };
        assert_eq!(o.get("?s").unwrap().len(), 2);
        assert_eq!(serde_json::to_value(&clause).unwrap(), obj);

        let arr = json!(["?s", "?name", {"?friend": ["*"]}]);
        let clause = SelectClause::try_from(&arr).unwrap();
        let SelectClause::Array(a) = &clause else { panic!("expected array") };
        assert_eq!(a.elements().len(), 3);
        assert_eq!(serde_json::to_value(&clause).unwrap(), arr);
    }

    #[test]
    fn rejects_grammar_violations() {
        assert_eq!(
            SelectClause::try_from(&json!({"?s": []})).unwrap_err(),
            ClauseError::EmptyList { at: "/?s".into() }
        );
        assert_eq!(
            SelectClause::try_from(&json!({"s": ["*"]})).unwrap_err(),
            ClauseError::InvalidVariable { at: "/".into(), var: "s".into() }
        );
        assert!(matches!(
            SelectClause::try_from(&json!({"?s": ["*", {"friend": [1]}]})).unwrap_err(),
            ClauseError::Unexpected { ref at, found: "number", .. } if at == "/?s/1/friend/0"
        ));
        assert_eq!(
            SelectClause::try_from(&json!({})).unwrap_err(),
            ClauseError::EmptyObject { at: "/".into(), what: "select object" }
        );
        assert_eq!(
            SelectClause::try_from(&json!(["?s", {}])).unwrap_err(),
            ClauseError::EmptyObject { at: "/1".into(), what: "select object" }
        );
        assert_eq!(
            SelectClause::try_from(&json!({"?s": ["*", {}]})).unwrap_err(),
            ClauseError::EmptyObject { at: "/?s/1".into(), what: "node template" }
        );
        assert!(SelectClause::try_from(&json!("?s")).is_err());
        assert!(SelectClause::try_from(&json!(["name"])).is_err());
    }

    #[test]
    fn deserialize_validates() {
        let list: SelectExprList = serde_json::from_value(json!(["*", {"a": ["*"]}])).unwrap();
        assert_eq!(list.first(), &SelectExpr::Wildcard);
        assert!(serde_json::from_value::<SelectExprList>(json!([])).is_err());
    }

    #[test]
    fn envelope_requires_logic_variable() {
        let clause = SelectClause::for_variable("?s", SelectExprList::wildcard()).unwrap();
        assert_eq!(serde_json::to_value(&clause).unwrap(), json!({"?s": ["*"]}));
        assert!(SelectClause::for_variable("s", SelectExprList::wildcard()).is_err());
    }
}
