//! Output formatters for bindings and audit rows.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use ormbind_audit::AuditRecord;
use ormbind_core::binding::{AssociationAttribute, BoundAttribute, EntityBinding};
use ormbind_core::BindingErrors;

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter: Send + Sync {
    /// Format bound entities.
    fn format_bindings(&self, bindings: &[EntityBinding]) -> String;

    /// Format per-entity binding failures.
    fn format_failures(&self, failures: &[BindingErrors]) -> String;

    /// Format audit rows.
    fn format_records(&self, records: &[AuditRecord]) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_bindings(&self, bindings: &[EntityBinding]) -> String {
        if bindings.is_empty() {
            return "No entities".to_string();
        }

        let mut table = Table::new();
        table.set_header(vec![
            "Entity", "Attribute", "Nature", "Target", "Mapped By", "Lazy", "Optional", "Fetch", "Cascade",
            "Join Columns",
        ]);

        for binding in bindings {
            for attribute in binding.attributes() {
                table.add_row(attribute_row(binding.name(), attribute));
            }
        }

        table.to_string()
    }

    fn format_failures(&self, failures: &[BindingErrors]) -> String {
        let mut table = Table::new();
        table.set_header(vec!["Entity", "Origin", "Error"]);
        for failure in failures {
            for error in &failure.errors {
                table.add_row(vec![
                    Cell::new(&failure.entity),
                    Cell::new(error.origin.to_string()),
                    Cell::new(&error.message),
                ]);
            }
        }
        format!("\n{}", table)
    }

    fn format_records(&self, records: &[AuditRecord]) -> String {
        if records.is_empty() {
            return "No audit rows".to_string();
        }

        let mut table = Table::new();
        table.set_header(vec!["REV", "REVTYPE", "Audit Entity", "Id", "Data", "Modified"]);
        for record in records {
            let data = record
                .data
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join(", ");
            table.add_row(vec![
                Cell::new(record.revision),
                Cell::new(record.revision_type),
                Cell::new(&record.audit_entity_name),
                Cell::new(&record.entity_id),
                Cell::new(data),
                Cell::new(record.modified.join(", ")),
            ]);
        }
        table.to_string()
    }
}

fn attribute_row(entity: &str, attribute: &BoundAttribute) -> Vec<Cell> {
    let mut row = vec![
        Cell::new(entity),
        Cell::new(attribute.name()),
        Cell::new(attribute.nature()),
    ];
    match attribute.as_association() {
        Some(association) => {
            row.extend([
                Cell::new(association.referenced_entity_type()),
                Cell::new(association.mapped_by().unwrap_or("")),
                Cell::new(association.is_lazy()),
                Cell::new(association.is_optional()),
                Cell::new(association.fetch_style().map(|s| s.to_string()).unwrap_or_default()),
                Cell::new(cascade_list(association).join(", ")),
                Cell::new(join_column_names(association).join(", ")),
            ]);
        }
        None => row.extend((0..7).map(|_| Cell::new(""))),
    }
    row
}

fn cascade_list(association: &AssociationAttribute) -> Vec<String> {
    association
        .cascade_types()
        .iter()
        .map(|c| format!("{:?}", c).to_uppercase())
        .chain(
            association
                .vendor_cascade_types()
                .iter()
                .map(|c| format!("{:?}", c).to_lowercase()),
        )
        .collect()
}

fn join_column_names(association: &AssociationAttribute) -> Vec<String> {
    association
        .join_columns()
        .iter()
        .map(|c| c.name.clone().unwrap_or_else(|| "<default>".to_string()))
        .collect()
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_bindings(&self, bindings: &[EntityBinding]) -> String {
        let entities: Vec<serde_json::Value> = bindings
            .iter()
            .map(|binding| {
                let attributes: Vec<serde_json::Value> = binding
                    .attributes()
                    .iter()
                    .map(|attribute| match attribute.as_association() {
                        Some(association) => serde_json::json!({
                            "name": association.name(),
                            "nature": association.nature(),
                            "target": association.referenced_entity_type(),
                            "mapped_by": association.mapped_by(),
                            "lazy": association.is_lazy(),
                            "optional": association.is_optional(),
                            "unwrap_proxy": association.is_unwrap_proxy(),
                            "orphan_removal": association.is_orphan_removal(),
                            "ignore_not_found": association.is_ignore_not_found(),
                            "fetch_style": association.fetch_style().map(|s| s.to_string()),
                            "cascade": association.cascade_types(),
                            "vendor_cascade": association.vendor_cascade_types(),
                            "maps_id": association.maps_id(),
                            "join_columns": join_column_names(association),
                            "insertable": association.is_insertable(),
                            "updatable": association.is_updatable(),
                            "optimistic_lock": association.is_optimistic_lockable(),
                        }),
                        None => serde_json::json!({
                            "name": attribute.name(),
                            "nature": attribute.nature(),
                        }),
                    })
                    .collect();
                serde_json::json!({ "entity": binding.name(), "attributes": attributes })
            })
            .collect();
        serde_json::to_string_pretty(&entities).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_failures(&self, failures: &[BindingErrors]) -> String {
        let errors: Vec<serde_json::Value> = failures
            .iter()
            .flat_map(|failure| {
                failure.errors.iter().map(move |error| {
                    serde_json::json!({
                        "entity": failure.entity,
                        "origin": error.origin.to_string(),
                        "message": error.message,
                    })
                })
            })
            .collect();
        serde_json::to_string_pretty(&serde_json::json!({ "errors": errors }))
            .unwrap_or_else(|_| "{}".to_string())
    }

    fn format_records(&self, records: &[AuditRecord]) -> String {
        serde_json::to_string_pretty(records).unwrap_or_else(|_| "[]".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ormbind_audit::RevisionType;
    use ormbind_core::{EntityId, MappingError, Origin, Value};

    fn record() -> AuditRecord {
        AuditRecord {
            revision: 3,
            timestamp: 0,
            revision_type: RevisionType::Add,
            entity_name: "Order".to_string(),
            audit_entity_name: "Order_AUD".to_string(),
            entity_id: EntityId::Int(1),
            data: vec![("status".to_string(), Value::from("NEW"))],
            modified: Vec::new(),
        }
    }

    #[test]
    fn test_table_records() {
        let output = TableFormatter.format_records(&[record()]);
        assert!(output.contains("Order_AUD"));
        assert!(output.contains("ADD"));
        assert!(output.contains("status="));
    }

    #[test]
    fn test_empty_records() {
        assert_eq!(TableFormatter.format_records(&[]), "No audit rows");
        assert_eq!(JsonFormatter.format_records(&[]), "[]");
    }

    #[test]
    fn test_json_failures() {
        let failures = vec![BindingErrors {
            entity: "Order".to_string(),
            errors: vec![MappingError::new("bad join table", Origin::document("shop.json"))],
        }];
        let output = JsonFormatter.format_failures(&failures);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["errors"][0]["message"], "bad join table");
        assert_eq!(parsed["errors"][0]["entity"], "Order");
    }
}
