//! Fetch, laziness and not-found constants.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Standard `fetch` member of association annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FetchType {
    /// Load on first access.
    Lazy,
    /// Load together with the owner.
    Eager,
}

impl FromStr for FetchType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LAZY" => Ok(FetchType::Lazy),
            "EAGER" => Ok(FetchType::Eager),
            _ => Err(()),
        }
    }
}

/// Vendor fetch-mode directive value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FetchMode {
    /// Separate select per association.
    Select,
    /// Outer join in the owner's select.
    Join,
    /// Batched subselect for all owners loaded together.
    Subselect,
}

impl FromStr for FetchMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SELECT" => Ok(FetchMode::Select),
            "JOIN" => Ok(FetchMode::Join),
            "SUBSELECT" => Ok(FetchMode::Subselect),
            _ => Err(()),
        }
    }
}

/// SQL strategy used by the loader for an association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStyle {
    /// Separate select.
    Select,
    /// Immediate join.
    Join,
    /// Batched subselect.
    Subselect,
}

impl From<FetchMode> for FetchStyle {
    fn from(mode: FetchMode) -> Self {
        match mode {
            FetchMode::Select => FetchStyle::Select,
            FetchMode::Subselect => FetchStyle::Subselect,
            FetchMode::Join => FetchStyle::Join,
        }
    }
}

impl std::fmt::Display for FetchStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchStyle::Select => write!(f, "select"),
            FetchStyle::Join => write!(f, "join"),
            FetchStyle::Subselect => write!(f, "subselect"),
        }
    }
}

/// Vendor lazy-to-one directive value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LazyToOneOption {
    /// Eager loading.
    False,
    /// Lazy through a proxy.
    Proxy,
    /// Lazy without a proxy; the real instance is handed out on access.
    NoProxy,
}

impl FromStr for LazyToOneOption {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FALSE" => Ok(LazyToOneOption::False),
            "PROXY" => Ok(LazyToOneOption::Proxy),
            "NO_PROXY" => Ok(LazyToOneOption::NoProxy),
            _ => Err(()),
        }
    }
}

/// Vendor not-found directive action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotFoundAction {
    /// Fail when the referenced row is missing.
    #[default]
    Exception,
    /// Treat a missing referenced row as null.
    Ignore,
}

impl FromStr for NotFoundAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EXCEPTION" => Ok(NotFoundAction::Exception),
            "IGNORE" => Ok(NotFoundAction::Ignore),
            _ => Err(()),
        }
    }
}
