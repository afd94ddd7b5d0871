//! Annotation values.

use serde::{Deserialize, Serialize};

use super::AnnotationInstance;

/// One named value inside an annotation instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnnotationValue {
    /// String literal.
    String(String),
    /// Class literal, by qualified name.
    Class(String),
    /// Enum constant, by constant name.
    Enum(String),
    /// Boolean literal.
    Boolean(bool),
    /// Integer literal.
    Integer(i64),
    /// Array of enum constants.
    EnumArray(Vec<String>),
    /// A single nested annotation.
    Nested(AnnotationInstance),
    /// Array of nested annotations.
    NestedArray(Vec<AnnotationInstance>),
}

impl AnnotationValue {
    /// Name of this value's kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            AnnotationValue::String(_) => "string",
            AnnotationValue::Class(_) => "class",
            AnnotationValue::Enum(_) => "enum",
            AnnotationValue::Boolean(_) => "boolean",
            AnnotationValue::Integer(_) => "integer",
            AnnotationValue::EnumArray(_) => "enum array",
            AnnotationValue::Nested(_) => "annotation",
            AnnotationValue::NestedArray(_) => "annotation array",
        }
    }

    /// Try to get as a string literal.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnnotationValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as a class name.
    pub fn as_class(&self) -> Option<&str> {
        match self {
            AnnotationValue::Class(c) => Some(c),
            _ => None,
        }
    }

    /// Try to get as an enum constant name.
    pub fn as_enum(&self) -> Option<&str> {
        match self {
            AnnotationValue::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Try to get as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AnnotationValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AnnotationValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as an array of enum constants.
    ///
    /// A lone enum constant is accepted as a one-element array.
    pub fn as_enum_array(&self) -> Option<Vec<&str>> {
        match self {
            AnnotationValue::EnumArray(items) => Some(items.iter().map(String::as_str).collect()),
            AnnotationValue::Enum(e) => Some(vec![e.as_str()]),
            _ => None,
        }
    }

    /// Try to get as an array of nested annotations.
    ///
    /// A lone nested annotation is accepted as a one-element array.
    pub fn as_nested_array(&self) -> Option<&[AnnotationInstance]> {
        match self {
            AnnotationValue::NestedArray(items) => Some(items),
            AnnotationValue::Nested(item) => Some(std::slice::from_ref(item)),
            _ => None,
        }
    }
}
