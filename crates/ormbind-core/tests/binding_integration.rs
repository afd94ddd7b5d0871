//! Integration tests for entity binding and mapping documents.

use std::io::Write;
use std::sync::Arc;

use ormbind_core::annotation::names::{jpa, vendor};
use ormbind_core::binding::{
    AttributeDescriptor, AttributeNature, BinderConfig, CascadeType, EntityBinder, EntityDescriptor,
    FetchStyle, RecordingMessageLogger,
};
use ormbind_core::{AnnotationInstance, Error, MappingDocument, OriginKind};

struct TestContext {
    binder: EntityBinder,
    logger: Arc<RecordingMessageLogger>,
}

impl TestContext {
    fn new() -> Self {
        let logger = Arc::new(RecordingMessageLogger::new());
        let binder = EntityBinder::new(BinderConfig::new().with_require_identifier(true))
            .with_logger(logger.clone());
        Self { binder, logger }
    }
}

fn join_column(name: &str) -> AnnotationInstance {
    AnnotationInstance::new(jpa::JOIN_COLUMN).with_string("name", name)
}

fn shop_document() -> MappingDocument {
    let customer = EntityDescriptor::new("com.acme.Customer")
        .with_attribute(
            AttributeDescriptor::new("id", "long", AttributeNature::Basic)
                .with_annotation(AnnotationInstance::new(jpa::ID)),
        )
        .with_attribute(
            AttributeDescriptor::new("orders", "java.util.Set", AttributeNature::OneToMany)
                .with_referenced_type("com.acme.Order")
                .with_annotation(
                    AnnotationInstance::new(jpa::ONE_TO_MANY)
                        .with_string("mappedBy", "customer")
                        .with_enum_array("cascade", ["ALL"]),
                ),
        );

    let order = EntityDescriptor::new("com.acme.Order")
        .with_attribute(
            AttributeDescriptor::new("id", "long", AttributeNature::Basic)
                .with_annotation(AnnotationInstance::new(jpa::ID)),
        )
        .with_attribute(
            AttributeDescriptor::new("customer", "com.acme.Customer", AttributeNature::ManyToOne)
                .with_annotation(AnnotationInstance::new(jpa::MANY_TO_ONE).with_enum("fetch", "EAGER"))
                .with_annotation(AnnotationInstance::new(vendor::FETCH).with_enum("value", "JOIN"))
                .with_annotation(join_column("customer_id")),
        )
        .with_attribute(
            AttributeDescriptor::new("tags", "java.util.Set", AttributeNature::ManyToMany)
                .with_referenced_type("com.acme.Tag")
                .with_annotation(AnnotationInstance::new(jpa::MANY_TO_MANY))
                .with_annotation(
                    AnnotationInstance::new(jpa::JOIN_TABLE)
                        .with_string("name", "order_tags")
                        .with_nested_array("joinColumns", [join_column("order_id")])
                        .with_nested_array("inverseJoinColumns", [join_column("tag_id")]),
                ),
        )
        .with_attribute(
            AttributeDescriptor::new("notes", "java.util.List", AttributeNature::ElementCollectionBasic)
                .with_referenced_type("java.lang.String")
                .with_annotation(AnnotationInstance::new(jpa::ELEMENT_COLLECTION))
                .with_annotation(
                    AnnotationInstance::new(jpa::COLLECTION_TABLE)
                        .with_nested_array("joinColumns", [join_column("order_id")]),
                ),
        );

    MappingDocument::new("shop.json")
        .with_entity(customer)
        .with_entity(order)
}

#[test]
fn test_bind_shop_document() {
    let ctx = TestContext::new();
    let outcome = shop_document().bind(&ctx.binder);

    assert!(outcome.is_success(), "failures: {:?}", outcome.failures);
    assert!(ctx.logger.is_empty());

    let customer = outcome.entity("com.acme.Customer").unwrap();
    let orders = customer.association("orders").unwrap();
    assert_eq!(orders.mapped_by(), Some("customer"));
    assert!(orders.cascade_types().contains(&CascadeType::All));
    assert!(orders.is_lazy());

    let order = outcome.entity("com.acme.Order").unwrap();
    let to_customer = order.association("customer").unwrap();
    assert!(!to_customer.is_lazy());
    assert_eq!(to_customer.fetch_style(), Some(FetchStyle::Join));
    assert_eq!(to_customer.join_columns()[0].name.as_deref(), Some("customer_id"));

    let tags = order.association("tags").unwrap();
    assert_eq!(tags.inverse_join_columns().len(), 1);
    assert_eq!(tags.join_table_annotation().unwrap().name, jpa::JOIN_TABLE);

    let notes = order.association("notes").unwrap();
    assert_eq!(notes.join_table_annotation().unwrap().name, jpa::COLLECTION_TABLE);
    assert_eq!(notes.referenced_entity_type(), "java.lang.String");
}

#[test]
fn test_document_file_roundtrip() {
    let ctx = TestContext::new();
    let json = shop_document().to_json().unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();

    let loaded = MappingDocument::from_path(file.path()).unwrap();
    assert_eq!(loaded.name.as_deref(), Some("shop.json"));
    assert!(loaded.bind(&ctx.binder).is_success());
}

#[test]
fn test_unnamed_document_uses_path_as_origin() {
    let ctx = TestContext::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(
        &path,
        r#"{ "entities": [ { "name": "com.acme.Broken", "attributes": [
            { "name": "id", "declared_type": "long", "nature": "basic",
              "annotations": [ { "name": "javax.persistence.Id" } ] },
            { "name": "total", "declared_type": "int", "nature": "basic",
              "annotations": [ { "name": "javax.persistence.JoinTable" } ] }
        ] } ] }"#,
    )
    .unwrap();

    let outcome = MappingDocument::from_path(&path).unwrap().bind(&ctx.binder);
    assert_eq!(outcome.error_count(), 1);

    let err = &outcome.failures[0].errors[0];
    assert_eq!(err.origin.kind, OriginKind::Document);
    assert_eq!(err.origin.name, path.display().to_string());
    assert_eq!(ctx.logger.len(), 1);
}

#[test]
fn test_missing_document_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = MappingDocument::from_path(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_overrides_from_document() {
    let ctx = TestContext::new();
    let document = MappingDocument::new("overrides.json").with_entity(
        EntityDescriptor::new("com.acme.Order")
            .with_attribute(
                AttributeDescriptor::new("id", "long", AttributeNature::Basic)
                    .with_annotation(AnnotationInstance::new(jpa::ID)),
            )
            .with_attribute(
                AttributeDescriptor::new("customer", "com.acme.Customer", AttributeNature::ManyToOne)
                    .with_annotation(AnnotationInstance::new(jpa::MANY_TO_ONE))
                    .with_override(
                        AnnotationInstance::new(jpa::MANY_TO_ONE)
                            .with_class("targetEntity", "com.acme.CustomerImpl")
                            .with_bool("optional", false),
                    ),
            ),
    );

    let outcome = document.bind(&ctx.binder);
    let customer = outcome
        .entity("com.acme.Order")
        .and_then(|o| o.association("customer"))
        .unwrap();
    assert_eq!(customer.referenced_entity_type(), "com.acme.CustomerImpl");
    assert!(!customer.is_optional());
}
