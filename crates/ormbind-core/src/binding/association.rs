//! Association attribute resolution.
//!
//! An association attribute is resolved once, eagerly, from the attribute's annotation
//! set. Standard annotations, vendor directives and document overrides may all say
//! something about the same field; each field is computed by an ordered list of
//! [`OverrideRule`]s so the precedence is explicit:
//!
//! | field | rules, lowest precedence first |
//! |-------|--------------------------------|
//! | referenced type | declared/referenced type, `Target`, `targetEntity` |
//! | laziness | implicit fetch, `LazyToOne`, explicit `fetch`, `Fetch` mode, fetch style |
//! | optional | default `true`, explicit `optional` |
//! | orphan removal | default `false`, explicit `orphanRemoval` |
//!
//! All failures are [`MappingError`]s located at the binding context's origin.

use std::collections::BTreeSet;

use tracing::debug;

use super::attribute::{AttributeDescriptor, MappedAttribute};
use super::cascade::{CascadeType, VendorCascadeType};
use super::column::Column;
use super::context::BindingContext;
use super::fetch::{FetchMode, FetchStyle, FetchType, LazyToOneOption, NotFoundAction};
use super::nature::AttributeNature;
use super::rules::{apply_rules, OverrideRule, RuleInput};
use super::type_resolver::{default_association_type_resolver, AttributeTypeResolver, ResolvedType};
use crate::annotation::names::{jpa, vendor, VOID_CLASS};
use crate::annotation::AnnotationInstance;
use crate::error::MappingError;

const REFERENCED_TYPE_RULES: &[OverrideRule<Option<String>>] = &[
    OverrideRule::new("declared-type", declared_referenced_type),
    OverrideRule::new("target-directive", target_directive),
    OverrideRule::new("target-entity", target_entity_member),
];

const LAZY_RULES: &[OverrideRule<bool>] = &[
    OverrideRule::new("implicit-fetch", implicit_fetch),
    OverrideRule::new("lazy-to-one", lazy_to_one_directive),
    OverrideRule::new("explicit-fetch", explicit_fetch_member),
    OverrideRule::new("fetch-mode", fetch_mode_directive),
    OverrideRule::new("fetch-style", resolved_fetch_style),
];

const OPTIONAL_RULES: &[OverrideRule<bool>] = &[OverrideRule::new("optional", optional_member)];

const ORPHAN_REMOVAL_RULES: &[OverrideRule<bool>] =
    &[OverrideRule::new("orphan-removal", orphan_removal_member)];

/// A resolved relational association (or element collection).
#[derive(Debug, Clone)]
pub struct AssociationAttribute {
    base: MappedAttribute,
    referenced_entity_type: String,
    mapped_by: Option<String>,
    cascade_types: BTreeSet<CascadeType>,
    vendor_cascade_types: BTreeSet<VendorCascadeType>,
    optional: bool,
    lazy: bool,
    unwrap_proxy: bool,
    orphan_removal: bool,
    ignore_not_found: bool,
    fetch_style: Option<FetchStyle>,
    referenced_id_attribute_name: Option<String>,
    join_columns: Vec<Column>,
    inverse_join_columns: Vec<Column>,
    join_table_annotation: Option<AnnotationInstance>,
    insertable: bool,
    updatable: bool,
    optimistic_lockable: bool,
}

impl AssociationAttribute {
    /// Resolve an association using the default type resolver chain.
    pub fn resolve(
        descriptor: &AttributeDescriptor,
        context: BindingContext,
    ) -> Result<Self, MappingError> {
        Self::resolve_with(descriptor, context, &default_association_type_resolver())
    }

    /// Resolve an association with an explicit type resolver chain.
    pub fn resolve_with(
        descriptor: &AttributeDescriptor,
        context: BindingContext,
        type_resolver: &dyn AttributeTypeResolver,
    ) -> Result<Self, MappingError> {
        let mut base = MappedAttribute::from_descriptor(descriptor, context)?;
        let resolved = Resolution::compute(&base, descriptor.referenced_type.as_deref())?;
        let resolved_type = type_resolver.resolve(&base)?;
        base.set_resolved_type(resolved_type);

        debug!(
            role = %base.role(),
            nature = %base.nature(),
            target = %resolved.referenced_entity_type,
            lazy = resolved.lazy,
            "association resolved"
        );

        Ok(Self {
            base,
            referenced_entity_type: resolved.referenced_entity_type,
            mapped_by: resolved.mapped_by,
            cascade_types: resolved.cascade_types,
            vendor_cascade_types: resolved.vendor_cascade_types,
            optional: resolved.optional,
            lazy: resolved.lazy,
            unwrap_proxy: resolved.unwrap_proxy,
            orphan_removal: resolved.orphan_removal,
            ignore_not_found: resolved.ignore_not_found,
            fetch_style: resolved.fetch_style,
            referenced_id_attribute_name: resolved.referenced_id_attribute_name,
            join_columns: resolved.join_columns,
            inverse_join_columns: resolved.inverse_join_columns,
            join_table_annotation: resolved.join_table_annotation,
            insertable: resolved.insertable,
            updatable: resolved.updatable,
            optimistic_lockable: resolved.optimistic_lockable,
        })
    }

    /// The underlying mapped attribute.
    pub fn attribute(&self) -> &MappedAttribute {
        &self.base
    }

    /// Attribute name.
    pub fn name(&self) -> &str {
        self.base.name()
    }

    /// Attribute nature.
    pub fn nature(&self) -> AttributeNature {
        self.base.nature()
    }

    /// Qualified name of the referenced entity (or element) type.
    pub fn referenced_entity_type(&self) -> &str {
        &self.referenced_entity_type
    }

    /// Owning-side attribute name when this is the inverse side.
    pub fn mapped_by(&self) -> Option<&str> {
        self.mapped_by.as_deref()
    }

    /// Standard cascade types.
    pub fn cascade_types(&self) -> &BTreeSet<CascadeType> {
        &self.cascade_types
    }

    /// Vendor cascade types.
    pub fn vendor_cascade_types(&self) -> &BTreeSet<VendorCascadeType> {
        &self.vendor_cascade_types
    }

    /// Whether the association may be null.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Whether the association is loaded lazily.
    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    /// Whether lazy loading hands out the real instance instead of a proxy.
    pub fn is_unwrap_proxy(&self) -> bool {
        self.unwrap_proxy
    }

    /// Whether orphaned targets are removed.
    pub fn is_orphan_removal(&self) -> bool {
        self.orphan_removal
    }

    /// Whether a missing target row is treated as null.
    pub fn is_ignore_not_found(&self) -> bool {
        self.ignore_not_found
    }

    /// Fetch style, if a fetch-mode directive chose one.
    pub fn fetch_style(&self) -> Option<FetchStyle> {
        self.fetch_style
    }

    /// Identifier attribute the foreign key maps to.
    pub fn referenced_id_attribute_name(&self) -> Option<&str> {
        self.referenced_id_attribute_name.as_deref()
    }

    /// Whether a maps-id directive is present.
    pub fn maps_id(&self) -> bool {
        self.referenced_id_attribute_name.is_some()
    }

    /// Join columns in declaration order.
    pub fn join_columns(&self) -> &[Column] {
        &self.join_columns
    }

    /// Inverse join columns from the join table.
    pub fn inverse_join_columns(&self) -> &[Column] {
        &self.inverse_join_columns
    }

    /// Explicit join table or collection table annotation.
    pub fn join_table_annotation(&self) -> Option<&AnnotationInstance> {
        self.join_table_annotation.as_ref()
    }

    /// Whether the association's columns take part in inserts.
    pub fn is_insertable(&self) -> bool {
        self.insertable
    }

    /// Whether the association's columns take part in updates.
    pub fn is_updatable(&self) -> bool {
        self.updatable
    }

    /// Whether a change to this association bumps the owner's version.
    pub fn is_optimistic_lockable(&self) -> bool {
        self.optimistic_lockable
    }

    /// Explicit value type chosen by the type resolver chain.
    pub fn resolved_type(&self) -> &ResolvedType {
        self.base.resolved_type()
    }
}

/// Owned results of one resolution pass.
struct Resolution {
    referenced_entity_type: String,
    mapped_by: Option<String>,
    cascade_types: BTreeSet<CascadeType>,
    vendor_cascade_types: BTreeSet<VendorCascadeType>,
    optional: bool,
    lazy: bool,
    unwrap_proxy: bool,
    orphan_removal: bool,
    ignore_not_found: bool,
    fetch_style: Option<FetchStyle>,
    referenced_id_attribute_name: Option<String>,
    join_columns: Vec<Column>,
    inverse_join_columns: Vec<Column>,
    join_table_annotation: Option<AnnotationInstance>,
    insertable: bool,
    updatable: bool,
    optimistic_lockable: bool,
}

impl Resolution {
    fn compute(base: &MappedAttribute, referenced_type: Option<&str>) -> Result<Self, MappingError> {
        let nature = base.nature();
        let implicit = AnnotationInstance::new(nature.annotation_name());
        let association = base.annotation(nature.annotation_name())?.unwrap_or(&implicit);

        let mut input = RuleInput {
            attribute: base,
            association,
            referenced_type,
            fetch_style: None,
        };

        let ignore_not_found = determine_not_found(&input)?;
        let referenced_entity_type = apply_rules("referenced_type", None, REFERENCED_TYPE_RULES, &input)?
            .ok_or_else(|| {
                input.error(format!(
                    "Can't find the target type for this collection attribute: {}",
                    base.role()
                ))
            })?;
        let mapped_by = input
            .lookup(association.string("mappedBy"))?
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let optional = apply_rules("optional", true, OPTIONAL_RULES, &input)?;

        let fetch_style = determine_fetch_style(&input)?;
        input.fetch_style = fetch_style;
        let lazy = apply_rules("lazy", false, LAZY_RULES, &input)?;

        let unwrap_proxy = determine_unwrap_proxy(&input)?;
        let orphan_removal = apply_rules("orphan_removal", false, ORPHAN_REMOVAL_RULES, &input)?;
        let cascade_types = input
            .lookup(association.enumeration_array::<CascadeType>("cascade"))?
            .into_iter()
            .collect();
        let vendor_cascade_types = determine_vendor_cascade_types(&input)?;
        let join_columns = determine_join_columns(&input)?;
        let inverse_join_columns = determine_inverse_join_columns(&input)?;
        let referenced_id_attribute_name = determine_maps_id(&input)?;
        let join_table_annotation = determine_explicit_join_table(base)?.cloned();

        let insertable = join_columns.is_empty() || join_columns.iter().any(|c| c.insertable);
        let updatable = join_columns.is_empty() || join_columns.iter().any(|c| c.updatable);
        let optimistic_lockable = if base.annotations().contains(vendor::OPTIMISTIC_LOCK) {
            base.is_optimistic_lockable()?
        } else {
            !nature.is_to_one() || insertable
        };

        Ok(Self {
            referenced_entity_type,
            mapped_by,
            cascade_types,
            vendor_cascade_types,
            optional,
            lazy,
            unwrap_proxy,
            orphan_removal,
            ignore_not_found,
            fetch_style,
            referenced_id_attribute_name,
            join_columns,
            inverse_join_columns,
            join_table_annotation,
            insertable,
            updatable,
            optimistic_lockable,
        })
    }
}

// Referenced type rules.

fn declared_referenced_type(
    _current: Option<String>,
    input: &RuleInput<'_>,
) -> Result<Option<String>, MappingError> {
    let nature = input.attribute.nature();
    let declared = input.attribute.declared_type();
    let candidate = match input.referenced_type {
        Some(referenced) => Some(referenced),
        None if nature.is_to_many() || nature.is_element_collection() => None,
        None => Some(declared),
    };
    Ok(candidate.filter(|s| !s.is_empty()).map(str::to_string))
}

fn target_directive(
    current: Option<String>,
    input: &RuleInput<'_>,
) -> Result<Option<String>, MappingError> {
    let Some(target) = input.directive(vendor::TARGET)? else {
        return Ok(current);
    };
    Ok(explicit_class(input.lookup(target.class("value"))?).or(current))
}

fn target_entity_member(
    current: Option<String>,
    input: &RuleInput<'_>,
) -> Result<Option<String>, MappingError> {
    let target_entity = input.lookup(input.association.class("targetEntity"))?;
    Ok(explicit_class(target_entity).or(current))
}

fn explicit_class(class: Option<&str>) -> Option<String> {
    class
        .filter(|c| !c.is_empty() && *c != VOID_CLASS)
        .map(str::to_string)
}

// Laziness rules.

fn implicit_fetch(_current: bool, input: &RuleInput<'_>) -> Result<bool, MappingError> {
    let fetch = input
        .lookup(input.association.enumeration::<FetchType>("fetch"))?
        .unwrap_or_else(|| input.attribute.nature().default_fetch_type());
    Ok(fetch == FetchType::Lazy)
}

fn lazy_to_one_directive(current: bool, input: &RuleInput<'_>) -> Result<bool, MappingError> {
    match input.directive(vendor::LAZY_TO_ONE)? {
        Some(lazy_to_one) => {
            let option: LazyToOneOption = input.lookup(lazy_to_one.required_enumeration("value"))?;
            Ok(option != LazyToOneOption::False)
        }
        None => Ok(current),
    }
}

fn explicit_fetch_member(current: bool, input: &RuleInput<'_>) -> Result<bool, MappingError> {
    match input.lookup(input.association.enumeration::<FetchType>("fetch"))? {
        Some(fetch) => Ok(fetch == FetchType::Lazy),
        None => Ok(current),
    }
}

fn fetch_mode_directive(current: bool, input: &RuleInput<'_>) -> Result<bool, MappingError> {
    match input.directive(vendor::FETCH)? {
        Some(fetch) => {
            let mode: FetchMode = input.lookup(fetch.required_enumeration("value"))?;
            Ok(mode != FetchMode::Join)
        }
        None => Ok(current),
    }
}

fn resolved_fetch_style(current: bool, input: &RuleInput<'_>) -> Result<bool, MappingError> {
    Ok(input
        .fetch_style
        .map(|style| style != FetchStyle::Join)
        .unwrap_or(current))
}

// Boolean member rules.

fn optional_member(current: bool, input: &RuleInput<'_>) -> Result<bool, MappingError> {
    Ok(input
        .lookup(input.association.boolean("optional"))?
        .unwrap_or(current))
}

fn orphan_removal_member(current: bool, input: &RuleInput<'_>) -> Result<bool, MappingError> {
    Ok(input
        .lookup(input.association.boolean("orphanRemoval"))?
        .unwrap_or(current))
}

// Single-source fields.

fn determine_not_found(input: &RuleInput<'_>) -> Result<bool, MappingError> {
    let action = match input.directive(vendor::NOT_FOUND)? {
        Some(not_found) => input
            .lookup(not_found.enumeration::<NotFoundAction>("action"))?
            .unwrap_or_default(),
        None => NotFoundAction::default(),
    };
    Ok(action == NotFoundAction::Ignore)
}

fn determine_unwrap_proxy(input: &RuleInput<'_>) -> Result<bool, MappingError> {
    match input.directive(vendor::LAZY_TO_ONE)? {
        Some(lazy_to_one) => {
            let option: LazyToOneOption = input.lookup(lazy_to_one.required_enumeration("value"))?;
            Ok(option == LazyToOneOption::NoProxy)
        }
        None => Ok(false),
    }
}

fn determine_fetch_style(input: &RuleInput<'_>) -> Result<Option<FetchStyle>, MappingError> {
    match input.directive(vendor::FETCH)? {
        Some(fetch) => {
            let mode: FetchMode = input.lookup(fetch.required_enumeration("value"))?;
            Ok(Some(mode.into()))
        }
        None => Ok(None),
    }
}

fn determine_vendor_cascade_types(
    input: &RuleInput<'_>,
) -> Result<BTreeSet<VendorCascadeType>, MappingError> {
    match input.directive(vendor::CASCADE)? {
        Some(cascade) => Ok(input
            .lookup(cascade.enumeration_array::<VendorCascadeType>("value"))?
            .into_iter()
            .collect()),
        None => Ok(BTreeSet::new()),
    }
}

fn determine_maps_id(input: &RuleInput<'_>) -> Result<Option<String>, MappingError> {
    let Some(maps_id) = input.directive(jpa::MAPS_ID)? else {
        return Ok(None);
    };
    if !input.attribute.nature().is_to_one() {
        return Err(input.error(format!(
            "@MapsId can only be specified on a many-to-one or one-to-one associations, property: {}",
            input.attribute.role()
        )));
    }
    let value = input.lookup(maps_id.string("value"))?.unwrap_or_default();
    Ok(Some(value.to_string()))
}

fn determine_join_columns(input: &RuleInput<'_>) -> Result<Vec<Column>, MappingError> {
    let mut join_columns = Vec::new();

    if let Some(join_column) = input.directive(jpa::JOIN_COLUMN)? {
        join_columns.push(input.lookup(Column::from_annotation(join_column))?);
    }

    let nested_sources = [
        (jpa::JOIN_COLUMNS, "value"),
        (jpa::COLLECTION_TABLE, "joinColumns"),
        (jpa::JOIN_TABLE, "joinColumns"),
    ];
    for (directive, member) in nested_sources {
        if let Some(annotation) = input.directive(directive)? {
            for nested in input.lookup(annotation.nested_array(member))? {
                join_columns.push(input.lookup(Column::from_annotation(nested))?);
            }
        }
    }

    Ok(join_columns)
}

fn determine_inverse_join_columns(input: &RuleInput<'_>) -> Result<Vec<Column>, MappingError> {
    let Some(join_table) = input.directive(jpa::JOIN_TABLE)? else {
        return Ok(Vec::new());
    };
    input
        .lookup(join_table.nested_array("inverseJoinColumns"))?
        .iter()
        .map(|nested| input.lookup(Column::from_annotation(nested)))
        .collect()
}

/// Validate join-table / collection-table placement and return the one present.
///
/// Applies to every attribute, association or not: a join table on a basic attribute is
/// as wrong as one on an element collection.
pub fn determine_explicit_join_table(
    attribute: &MappedAttribute,
) -> Result<Option<&AnnotationInstance>, MappingError> {
    let collection_table = attribute.annotation(jpa::COLLECTION_TABLE)?;
    let join_table = attribute.annotation(jpa::JOIN_TABLE)?;
    let context = attribute.context();
    let entity = context.origin().name.as_str();

    if collection_table.is_some() && join_table.is_some() {
        let message = context
            .logger()
            .collection_table_and_join_table_used_together(entity, attribute.name());
        return Err(context.make_mapping_error(message));
    }

    if collection_table.is_some() && attribute.annotation(jpa::ELEMENT_COLLECTION)?.is_none() {
        let message = context
            .logger()
            .collection_table_without_element_collection(entity, attribute.name());
        return Err(context.make_mapping_error(message));
    }

    if join_table.is_some() && !attribute.nature().is_entity_association() {
        let message = context
            .logger()
            .join_table_for_non_association_attribute(entity, attribute.name());
        return Err(context.make_mapping_error(message));
    }

    Ok(collection_table.or(join_table))
}
