//! Attribute natures and access strategies.

use serde::{Deserialize, Serialize};

use super::fetch::FetchType;
use crate::annotation::names::{jpa, vendor};

/// What kind of persistent property an attribute is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeNature {
    /// Scalar column.
    Basic,
    /// Single-valued association, unique on both sides.
    OneToOne,
    /// Single-valued association, many owners per target.
    ManyToOne,
    /// Collection of entities, one owner per element.
    OneToMany,
    /// Collection of entities through a link table.
    ManyToMany,
    /// Polymorphic collection over unrelated entity types.
    ManyToAny,
    /// Collection of basic values.
    ElementCollectionBasic,
    /// Collection of embeddable values.
    ElementCollectionEmbeddable,
    /// Embedded component.
    Embedded,
    /// Embedded composite identifier.
    EmbeddedId,
}

impl AttributeNature {
    /// Qualified name of the annotation that declares this nature.
    pub fn annotation_name(&self) -> &'static str {
        match self {
            AttributeNature::Basic => jpa::BASIC,
            AttributeNature::OneToOne => jpa::ONE_TO_ONE,
            AttributeNature::ManyToOne => jpa::MANY_TO_ONE,
            AttributeNature::OneToMany => jpa::ONE_TO_MANY,
            AttributeNature::ManyToMany => jpa::MANY_TO_MANY,
            AttributeNature::ManyToAny => vendor::MANY_TO_ANY,
            AttributeNature::ElementCollectionBasic
            | AttributeNature::ElementCollectionEmbeddable => jpa::ELEMENT_COLLECTION,
            AttributeNature::Embedded => jpa::EMBEDDED,
            AttributeNature::EmbeddedId => jpa::EMBEDDED_ID,
        }
    }

    /// Many-to-one or one-to-one.
    pub fn is_to_one(&self) -> bool {
        matches!(self, AttributeNature::ManyToOne | AttributeNature::OneToOne)
    }

    /// One-to-many, many-to-many or many-to-any.
    pub fn is_to_many(&self) -> bool {
        matches!(
            self,
            AttributeNature::OneToMany | AttributeNature::ManyToMany | AttributeNature::ManyToAny
        )
    }

    /// One of the four entity association natures.
    pub fn is_entity_association(&self) -> bool {
        matches!(
            self,
            AttributeNature::OneToOne
                | AttributeNature::OneToMany
                | AttributeNature::ManyToMany
                | AttributeNature::ManyToOne
        )
    }

    /// Element collection of basic or embeddable values.
    pub fn is_element_collection(&self) -> bool {
        matches!(
            self,
            AttributeNature::ElementCollectionBasic | AttributeNature::ElementCollectionEmbeddable
        )
    }

    /// Natures resolved by the association resolver.
    pub fn is_association(&self) -> bool {
        self.is_to_one() || self.is_to_many() || self.is_element_collection()
    }

    /// Fetch type applied when the association annotation leaves `fetch` unset.
    pub fn default_fetch_type(&self) -> FetchType {
        if self.is_to_one() {
            FetchType::Eager
        } else {
            FetchType::Lazy
        }
    }
}

impl std::fmt::Display for AttributeNature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AttributeNature::Basic => "basic",
            AttributeNature::OneToOne => "one-to-one",
            AttributeNature::ManyToOne => "many-to-one",
            AttributeNature::OneToMany => "one-to-many",
            AttributeNature::ManyToMany => "many-to-many",
            AttributeNature::ManyToAny => "many-to-any",
            AttributeNature::ElementCollectionBasic => "element-collection(basic)",
            AttributeNature::ElementCollectionEmbeddable => "element-collection(embeddable)",
            AttributeNature::Embedded => "embedded",
            AttributeNature::EmbeddedId => "embedded-id",
        };
        write!(f, "{}", name)
    }
}

/// How the persistence engine reads and writes the attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    /// Direct field access.
    #[default]
    Field,
    /// Getter/setter access.
    Property,
}
