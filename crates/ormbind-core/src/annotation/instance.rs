//! Annotation instances.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::AnnotationValue;
use crate::error::AnnotationError;

/// One annotation occurrence with its explicitly specified values.
///
/// Values the author left at their declared default are absent, which is how the
/// resolver tells "explicit" from "implicit".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnnotationInstance {
    /// Qualified annotation name.
    pub name: String,
    /// Explicit values keyed by member name.
    #[serde(default)]
    pub values: BTreeMap<String, AnnotationValue>,
}

impl AnnotationInstance {
    /// Create an instance with no explicit values.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
        }
    }

    /// Set a value.
    pub fn with_value(mut self, key: impl Into<String>, value: AnnotationValue) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    /// Set a string value.
    pub fn with_string(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_value(key, AnnotationValue::String(value.into()))
    }

    /// Set a class value.
    pub fn with_class(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_value(key, AnnotationValue::Class(value.into()))
    }

    /// Set an enum value.
    pub fn with_enum(self, key: impl Into<String>, constant: impl Into<String>) -> Self {
        self.with_value(key, AnnotationValue::Enum(constant.into()))
    }

    /// Set a boolean value.
    pub fn with_bool(self, key: impl Into<String>, value: bool) -> Self {
        self.with_value(key, AnnotationValue::Boolean(value))
    }

    /// Set an enum array value.
    pub fn with_enum_array<I, S>(self, key: impl Into<String>, constants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let constants = constants.into_iter().map(Into::into).collect();
        self.with_value(key, AnnotationValue::EnumArray(constants))
    }

    /// Set a nested annotation array value.
    pub fn with_nested_array(
        self,
        key: impl Into<String>,
        nested: impl IntoIterator<Item = AnnotationInstance>,
    ) -> Self {
        self.with_value(key, AnnotationValue::NestedArray(nested.into_iter().collect()))
    }

    /// Get a raw value.
    pub fn value(&self, key: &str) -> Option<&AnnotationValue> {
        self.values.get(key)
    }

    /// Check whether a value was explicitly specified.
    pub fn has_value(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Get a string value.
    pub fn string(&self, key: &str) -> Result<Option<&str>, AnnotationError> {
        self.typed(key, "string", AnnotationValue::as_str)
    }

    /// Get a class value.
    pub fn class(&self, key: &str) -> Result<Option<&str>, AnnotationError> {
        self.typed(key, "class", AnnotationValue::as_class)
    }

    /// Get a boolean value.
    pub fn boolean(&self, key: &str) -> Result<Option<bool>, AnnotationError> {
        self.typed(key, "boolean", AnnotationValue::as_bool)
    }

    /// Get an enum value parsed into `E`.
    pub fn enumeration<E: FromStr>(&self, key: &str) -> Result<Option<E>, AnnotationError> {
        match self.typed(key, "enum", AnnotationValue::as_enum)? {
            Some(constant) => self.parse_constant(key, constant).map(Some),
            None => Ok(None),
        }
    }

    /// Get a required enum value parsed into `E`.
    pub fn required_enumeration<E: FromStr>(&self, key: &str) -> Result<E, AnnotationError> {
        self.enumeration(key)?
            .ok_or_else(|| AnnotationError::MissingValue {
                annotation: self.name.clone(),
                key: key.to_string(),
            })
    }

    /// Get an enum array value, each constant parsed into `E`. Absent means empty.
    pub fn enumeration_array<E: FromStr>(&self, key: &str) -> Result<Vec<E>, AnnotationError> {
        let constants = self
            .typed(key, "enum array", AnnotationValue::as_enum_array)?
            .unwrap_or_default();
        constants
            .into_iter()
            .map(|constant| self.parse_constant(key, constant))
            .collect()
    }

    /// Get a nested annotation array value. Absent means empty.
    pub fn nested_array(&self, key: &str) -> Result<&[AnnotationInstance], AnnotationError> {
        Ok(self
            .typed(key, "annotation array", AnnotationValue::as_nested_array)?
            .unwrap_or(&[]))
    }

    fn typed<'a, T>(
        &'a self,
        key: &str,
        expected: &'static str,
        extract: impl FnOnce(&'a AnnotationValue) -> Option<T>,
    ) -> Result<Option<T>, AnnotationError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(value) => {
                let found = value.kind();
                extract(value)
                    .map(Some)
                    .ok_or_else(|| AnnotationError::TypeMismatch {
                        annotation: self.name.clone(),
                        key: key.to_string(),
                        expected,
                        found,
                    })
            }
        }
    }

    fn parse_constant<E: FromStr>(&self, key: &str, constant: &str) -> Result<E, AnnotationError> {
        constant
            .parse()
            .map_err(|_| AnnotationError::UnknownConstant {
                annotation: self.name.clone(),
                key: key.to_string(),
                constant: constant.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Mode {
        On,
        Off,
    }

    impl FromStr for Mode {
        type Err = ();

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s {
                "ON" => Ok(Mode::On),
                "OFF" => Ok(Mode::Off),
                _ => Err(()),
            }
        }
    }

    #[test]
    fn test_typed_lookups() {
        let instance = AnnotationInstance::new("test.Switch")
            .with_enum("mode", "ON")
            .with_bool("enabled", false)
            .with_string("label", "main")
            .with_enum_array("history", ["ON", "OFF"]);

        assert_eq!(instance.enumeration::<Mode>("mode").unwrap(), Some(Mode::On));
        assert_eq!(instance.boolean("enabled").unwrap(), Some(false));
        assert_eq!(instance.string("label").unwrap(), Some("main"));
        assert_eq!(
            instance.enumeration_array::<Mode>("history").unwrap(),
            vec![Mode::On, Mode::Off]
        );
        assert_eq!(instance.string("missing").unwrap(), None);
        assert!(instance.nested_array("missing").unwrap().is_empty());
    }

    #[test]
    fn test_type_mismatch() {
        let instance = AnnotationInstance::new("test.Switch").with_bool("mode", true);
        let err = instance.enumeration::<Mode>("mode").unwrap_err();
        assert!(matches!(
            err,
            AnnotationError::TypeMismatch {
                expected: "enum",
                found: "boolean",
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_constant() {
        let instance = AnnotationInstance::new("test.Switch").with_enum("mode", "MAYBE");
        let err = instance.enumeration::<Mode>("mode").unwrap_err();
        assert!(matches!(err, AnnotationError::UnknownConstant { constant, .. } if constant == "MAYBE"));
    }

    #[test]
    fn test_required_enumeration() {
        let instance = AnnotationInstance::new("test.Switch");
        let err = instance.required_enumeration::<Mode>("mode").unwrap_err();
        assert!(matches!(err, AnnotationError::MissingValue { .. }));
    }
}
