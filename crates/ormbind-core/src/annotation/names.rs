//! Qualified annotation names understood by the binder.

/// Standard persistence annotations.
pub mod jpa {
    pub const ONE_TO_ONE: &str = "javax.persistence.OneToOne";
    pub const MANY_TO_ONE: &str = "javax.persistence.ManyToOne";
    pub const ONE_TO_MANY: &str = "javax.persistence.OneToMany";
    pub const MANY_TO_MANY: &str = "javax.persistence.ManyToMany";
    pub const ELEMENT_COLLECTION: &str = "javax.persistence.ElementCollection";
    pub const EMBEDDED: &str = "javax.persistence.Embedded";
    pub const EMBEDDED_ID: &str = "javax.persistence.EmbeddedId";
    pub const BASIC: &str = "javax.persistence.Basic";
    pub const ID: &str = "javax.persistence.Id";
    pub const JOIN_COLUMN: &str = "javax.persistence.JoinColumn";
    pub const JOIN_COLUMNS: &str = "javax.persistence.JoinColumns";
    pub const JOIN_TABLE: &str = "javax.persistence.JoinTable";
    pub const COLLECTION_TABLE: &str = "javax.persistence.CollectionTable";
    pub const MAPS_ID: &str = "javax.persistence.MapsId";
}

/// Vendor-extension annotations.
pub mod vendor {
    pub const TARGET: &str = "org.hibernate.annotations.Target";
    pub const LAZY_TO_ONE: &str = "org.hibernate.annotations.LazyToOne";
    pub const FETCH: &str = "org.hibernate.annotations.Fetch";
    pub const CASCADE: &str = "org.hibernate.annotations.Cascade";
    pub const NOT_FOUND: &str = "org.hibernate.annotations.NotFound";
    pub const OPTIMISTIC_LOCK: &str = "org.hibernate.annotations.OptimisticLock";
    pub const TYPE: &str = "org.hibernate.annotations.Type";
    pub const PARAMETER: &str = "org.hibernate.annotations.Parameter";
    pub const MANY_TO_ANY: &str = "org.hibernate.annotations.ManyToAny";
}

/// Class name used by annotations as the "not specified" class default.
pub const VOID_CLASS: &str = "void";
