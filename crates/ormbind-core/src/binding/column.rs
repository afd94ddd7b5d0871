//! Join column values.

use serde::{Deserialize, Serialize};

use crate::annotation::AnnotationInstance;
use crate::error::AnnotationError;

/// Column values read from a join-column annotation.
///
/// Members the annotation leaves unset take the standard defaults: nullable,
/// insertable and updatable are true, unique is false, names are implicit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Explicit column name, if any.
    pub name: Option<String>,
    /// Explicit referenced column name, if any.
    pub referenced_column_name: Option<String>,
    /// Whether the column accepts nulls.
    pub nullable: bool,
    /// Whether the column is unique.
    pub unique: bool,
    /// Whether the column is included in inserts.
    pub insertable: bool,
    /// Whether the column is included in updates.
    pub updatable: bool,
    /// Explicit owning table, if any.
    pub table: Option<String>,
    /// Explicit DDL fragment, if any.
    pub column_definition: Option<String>,
}

impl Default for Column {
    fn default() -> Self {
        Self {
            name: None,
            referenced_column_name: None,
            nullable: true,
            unique: false,
            insertable: true,
            updatable: true,
            table: None,
            column_definition: None,
        }
    }
}

impl Column {
    /// Create a column with an explicit name and default flags.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Read column values from a join-column annotation instance.
    pub fn from_annotation(annotation: &AnnotationInstance) -> Result<Self, AnnotationError> {
        let defaults = Column::default();
        Ok(Self {
            name: non_empty(annotation.string("name")?),
            referenced_column_name: non_empty(annotation.string("referencedColumnName")?),
            nullable: annotation.boolean("nullable")?.unwrap_or(defaults.nullable),
            unique: annotation.boolean("unique")?.unwrap_or(defaults.unique),
            insertable: annotation.boolean("insertable")?.unwrap_or(defaults.insertable),
            updatable: annotation.boolean("updatable")?.unwrap_or(defaults.updatable),
            table: non_empty(annotation.string("table")?),
            column_definition: non_empty(annotation.string("columnDefinition")?),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::names::jpa;

    #[test]
    fn test_defaults() {
        let column = Column::from_annotation(&AnnotationInstance::new(jpa::JOIN_COLUMN)).unwrap();
        assert_eq!(column, Column::default());
        assert!(column.insertable);
        assert!(column.name.is_none());
    }

    #[test]
    fn test_explicit_values() {
        let annotation = AnnotationInstance::new(jpa::JOIN_COLUMN)
            .with_string("name", "customer_id")
            .with_string("referencedColumnName", "id")
            .with_bool("insertable", false)
            .with_bool("nullable", false)
            .with_string("table", "");

        let column = Column::from_annotation(&annotation).unwrap();
        assert_eq!(column.name.as_deref(), Some("customer_id"));
        assert_eq!(column.referenced_column_name.as_deref(), Some("id"));
        assert!(!column.insertable);
        assert!(!column.nullable);
        assert!(column.updatable);
        assert!(column.table.is_none());
    }
}
