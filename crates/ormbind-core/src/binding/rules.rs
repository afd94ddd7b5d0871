//! Ordered override rules.
//!
//! Every derived field of an association is computed by folding a fixed list of named
//! rules over an initial value. A rule sees the value produced so far plus the resolution
//! input and returns the next value; later rules win. Keeping the rules as data makes the
//! precedence order visible in one place and lets each rule be tested alone.

use std::fmt::Debug;

use super::attribute::MappedAttribute;
use super::fetch::FetchStyle;
use crate::annotation::AnnotationInstance;
use crate::error::{AnnotationError, MappingError};

/// Everything a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    /// Attribute being resolved.
    pub attribute: &'a MappedAttribute,
    /// The association annotation for the attribute's nature (empty when implicit).
    pub association: &'a AnnotationInstance,
    /// Referenced (element) type supplied by the scanner.
    pub referenced_type: Option<&'a str>,
    /// Fetch style resolved before laziness.
    pub fetch_style: Option<FetchStyle>,
}

impl<'a> RuleInput<'a> {
    /// Single instance of a directive on the attribute.
    pub fn directive(&self, name: &str) -> Result<Option<&'a AnnotationInstance>, MappingError> {
        self.attribute.annotation(name)
    }

    /// Map an annotation lookup result into a mapping-error result.
    pub fn lookup<T>(&self, result: Result<T, AnnotationError>) -> Result<T, MappingError> {
        result.map_err(|e| {
            self.attribute
                .context()
                .annotation_error(&self.attribute.role(), e)
        })
    }

    /// Build a mapping error at the attribute's origin.
    pub fn error(&self, message: impl Into<String>) -> MappingError {
        self.attribute.context().make_mapping_error(message)
    }
}

/// Rule function: `(current value, input) -> next value`.
pub type RuleFn<T> = fn(T, &RuleInput<'_>) -> Result<T, MappingError>;

/// A named override rule.
#[derive(Clone, Copy)]
pub struct OverrideRule<T> {
    /// Rule name, reported in traces.
    pub name: &'static str,
    /// Rule function.
    pub apply: RuleFn<T>,
}

impl<T> OverrideRule<T> {
    /// Create a rule.
    pub const fn new(name: &'static str, apply: RuleFn<T>) -> Self {
        Self { name, apply }
    }
}

impl<T> Debug for OverrideRule<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("OverrideRule").field(&self.name).finish()
    }
}

/// Fold `rules` over `initial` in order.
pub fn apply_rules<T: Debug>(
    field: &'static str,
    initial: T,
    rules: &[OverrideRule<T>],
    input: &RuleInput<'_>,
) -> Result<T, MappingError> {
    let mut value = initial;
    for rule in rules {
        value = (rule.apply)(value, input)?;
        tracing::trace!(
            attribute = input.attribute.name(),
            field,
            rule = rule.name,
            value = ?value,
            "override rule applied"
        );
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationSet;
    use crate::binding::context::BindingContext;
    use crate::binding::nature::{AccessType, AttributeNature};
    use crate::error::Origin;

    fn double(value: u32, _input: &RuleInput<'_>) -> Result<u32, MappingError> {
        Ok(value * 2)
    }

    fn add_one(value: u32, _input: &RuleInput<'_>) -> Result<u32, MappingError> {
        Ok(value + 1)
    }

    fn fail(_value: u32, input: &RuleInput<'_>) -> Result<u32, MappingError> {
        Err(input.error("rule failed"))
    }

    fn attribute() -> MappedAttribute {
        MappedAttribute::new(
            "count",
            "int",
            AttributeNature::Basic,
            AccessType::Field,
            AnnotationSet::new(),
            BindingContext::new(Origin::other("test")),
        )
        .unwrap()
    }

    #[test]
    fn test_rules_apply_in_order() {
        let attr = attribute();
        let association = AnnotationInstance::default();
        let input = RuleInput {
            attribute: &attr,
            association: &association,
            referenced_type: None,
            fetch_style: None,
        };
        let rules = [OverrideRule::new("double", double), OverrideRule::new("add", add_one)];
        assert_eq!(apply_rules("n", 3, &rules, &input).unwrap(), 7);

        let reversed = [OverrideRule::new("add", add_one), OverrideRule::new("double", double)];
        assert_eq!(apply_rules("n", 3, &reversed, &input).unwrap(), 8);
    }

    #[test]
    fn test_failing_rule_stops_pipeline() {
        let attr = attribute();
        let association = AnnotationInstance::default();
        let input = RuleInput {
            attribute: &attr,
            association: &association,
            referenced_type: None,
            fetch_style: None,
        };
        let rules = [OverrideRule::new("fail", fail), OverrideRule::new("add", add_one)];
        let err = apply_rules("n", 1, &rules, &input).unwrap_err();
        assert_eq!(err.message, "rule failed");
    }
}
