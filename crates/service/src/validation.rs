//! Field-presence and type checks run before any handler touches a store.
//!
//! Empty strings and empty lists count as absent. A value that is present but
//! of the wrong shape is reported as [`ValidationError::WrongType`], never as
//! missing.

use serde_json::Value;
use thiserror::Error;

/// Argument mapping carried by a request.
pub type Args = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Str,
    Int,
    StrList,
}

impl FieldKind {
    pub fn describe(self) -> &'static str {
        match self {
            FieldKind::Str => "a string",
            FieldKind::Int => "an integer",
            FieldKind::StrList => "a list of strings",
        }
    }
}

/// One required argument of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn str(name: &'static str) -> Self { Self { name, kind: FieldKind::Str } }
    pub const fn int(name: &'static str) -> Self { Self { name, kind: FieldKind::Int } }
    pub const fn str_list(name: &'static str) -> Self { Self { name, kind: FieldKind::StrList } }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("request carries no argument mapping")]
    MissingArgs,
    #[error("required argument `{0}` is missing or empty")]
    MissingField(String),
    #[error("argument `{field}` has the wrong type: expected {expected}")]
    WrongType { field: String, expected: &'static str },
    #[error("argument `{field}` is malformed: {reason}")]
    Malformed { field: String, reason: String },
}

impl ValidationError {
    pub fn malformed(field: &str, reason: impl Into<String>) -> Self {
        Self::Malformed { field: field.to_string(), reason: reason.into() }
    }

    fn wrong_type(field: &str, kind: FieldKind) -> Self {
        Self::WrongType { field: field.to_string(), expected: kind.describe() }
    }
}

/// Check every required field. Operations with no required fields accept an
/// absent mapping.
pub fn validate(args: Option<&Args>, required: &[FieldSpec]) -> Result<(), ValidationError> {
    if required.is_empty() {
        return Ok(());
    }
    let args = args.ok_or(ValidationError::MissingArgs)?;
    for spec in required {
        match coerce(args.get(spec.name), spec.name, spec.kind)? {
            Some(_) => {}
            None => return Err(ValidationError::MissingField(spec.name.to_string())),
        }
    }
    Ok(())
}

/// A value coerced to its declared kind.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Coerced<'a> {
    Str(&'a str),
    Int(i64),
    StrList(Vec<&'a str>),
}

/// `Ok(None)` means absent (or empty); `Err` means present with the wrong shape.
fn coerce<'a>(value: Option<&'a Value>, field: &str, kind: FieldKind) -> Result<Option<Coerced<'a>>, ValidationError> {
    let value = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(v) => v,
    };
    match (kind, value) {
        (FieldKind::Str, Value::String(s)) if s.is_empty() => Ok(None),
        (FieldKind::Str, Value::String(s)) => Ok(Some(Coerced::Str(s))),
        (FieldKind::Int, Value::Number(n)) => n
            .as_i64()
            .map(|i| Some(Coerced::Int(i)))
            .ok_or_else(|| ValidationError::wrong_type(field, kind)),
        // timestamps often arrive as decimal strings
        (FieldKind::Int, Value::String(s)) if s.is_empty() => Ok(None),
        (FieldKind::Int, Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(|i| Some(Coerced::Int(i)))
            .map_err(|_| ValidationError::wrong_type(field, kind)),
        (FieldKind::StrList, Value::Array(items)) if items.is_empty() => Ok(None),
        (FieldKind::StrList, Value::Array(items)) => items
            .iter()
            .map(|v| v.as_str().ok_or_else(|| ValidationError::wrong_type(field, kind)))
            .collect::<Result<Vec<_>, _>>()
            .map(|list| Some(Coerced::StrList(list))),
        _ => Err(ValidationError::wrong_type(field, kind)),
    }
}

/// Typed read access to a request's arguments, for use after [`validate`].
#[derive(Debug, Clone, Copy)]
pub struct ArgReader<'a> {
    args: Option<&'a Args>,
}

impl<'a> ArgReader<'a> {
    pub fn new(args: Option<&'a Args>) -> Self { Self { args } }

    fn get(&self, field: &str, kind: FieldKind) -> Result<Option<Coerced<'a>>, ValidationError> {
        coerce(self.args.and_then(|a| a.get(field)), field, kind)
    }

    pub fn opt_str(&self, field: &str) -> Result<Option<&'a str>, ValidationError> {
        match self.get(field, FieldKind::Str)? {
            Some(Coerced::Str(s)) => Ok(Some(s)),
            _ => Ok(None),
        }
    }

    pub fn str(&self, field: &str) -> Result<&'a str, ValidationError> {
        self.opt_str(field)?.ok_or_else(|| ValidationError::MissingField(field.to_string()))
    }

    pub fn opt_int(&self, field: &str) -> Result<Option<i64>, ValidationError> {
        match self.get(field, FieldKind::Int)? {
            Some(Coerced::Int(i)) => Ok(Some(i)),
            _ => Ok(None),
        }
    }

    pub fn str_list(&self, field: &str) -> Result<Vec<String>, ValidationError> {
        match self.get(field, FieldKind::StrList)? {
            Some(Coerced::StrList(list)) => Ok(list.into_iter().map(str::to_string).collect()),
            _ => Err(ValidationError::MissingField(field.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(v: Value) -> Args {
        match v {
            Value::Object(map) => map,
            _ => panic!("test args must be an object"),
        }
    }

    const CREATE: &[FieldSpec] = &[FieldSpec::str("createdBy"), FieldSpec::str("title")];

    #[test]
    fn absent_mapping_fails_when_fields_are_required() {
        assert_eq!(validate(None, CREATE), Err(ValidationError::MissingArgs));
        assert_eq!(validate(None, &[]), Ok(()));
    }

    #[test]
    fn missing_and_empty_fields_are_missing() {
        let a = args(json!({"createdBy": "alice"}));
        assert_eq!(validate(Some(&a), CREATE), Err(ValidationError::MissingField("title".into())));
        let a = args(json!({"createdBy": "alice", "title": ""}));
        assert_eq!(validate(Some(&a), CREATE), Err(ValidationError::MissingField("title".into())));
        let a = args(json!({"createdBy": "alice", "title": null}));
        assert_eq!(validate(Some(&a), CREATE), Err(ValidationError::MissingField("title".into())));
    }

    #[test]
    fn wrong_type_is_distinct_from_missing() {
        let a = args(json!({"createdBy": "alice", "title": 12}));
        assert_eq!(
            validate(Some(&a), CREATE),
            Err(ValidationError::WrongType { field: "title".into(), expected: "a string" })
        );
    }

    #[test]
    fn string_lists_must_be_non_empty_and_all_strings() {
        let spec = &[FieldSpec::str_list("commentIds")];
        assert!(validate(Some(&args(json!({"commentIds": ["a", "b"]}))), spec).is_ok());
        assert_eq!(
            validate(Some(&args(json!({"commentIds": []}))), spec),
            Err(ValidationError::MissingField("commentIds".into()))
        );
        assert!(matches!(
            validate(Some(&args(json!({"commentIds": ["a", 1]}))), spec),
            Err(ValidationError::WrongType { .. })
        ));
        assert!(matches!(
            validate(Some(&args(json!({"commentIds": "a"}))), spec),
            Err(ValidationError::WrongType { .. })
        ));
    }

    #[test]
    fn integers_coerce_from_numeric_strings() {
        let a = args(json!({"timeStampFrom": "1500", "timeStampTo": 2000, "bad": "soon"}));
        let reader = ArgReader::new(Some(&a));
        assert_eq!(reader.opt_int("timeStampFrom"), Ok(Some(1500)));
        assert_eq!(reader.opt_int("timeStampTo"), Ok(Some(2000)));
        assert_eq!(reader.opt_int("absent"), Ok(None));
        assert!(matches!(reader.opt_int("bad"), Err(ValidationError::WrongType { .. })));
    }

    #[test]
    fn verdict_is_deterministic() {
        let a = args(json!({"createdBy": 3}));
        let first = validate(Some(&a), CREATE);
        assert_eq!(first, validate(Some(&a), CREATE));
    }

    #[test]
    fn reader_treats_empty_optional_string_as_absent() {
        let a = args(json!({"titleUpdate": "", "forumId": "f-1"}));
        let reader = ArgReader::new(Some(&a));
        assert_eq!(reader.opt_str("titleUpdate"), Ok(None));
        assert_eq!(reader.str("forumId"), Ok("f-1"));
        assert_eq!(reader.str("commentId"), Err(ValidationError::MissingField("commentId".into())));
    }
}
