//! Cascade constants.
//!
//! The standard and vendor cascade sets are configured independently and stay separate
//! all the way into the mapping model.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Standard cascade types (`cascade` member of association annotations).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CascadeType {
    All,
    Persist,
    Merge,
    Remove,
    Refresh,
    Detach,
}

impl FromStr for CascadeType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ALL" => Ok(CascadeType::All),
            "PERSIST" => Ok(CascadeType::Persist),
            "MERGE" => Ok(CascadeType::Merge),
            "REMOVE" => Ok(CascadeType::Remove),
            "REFRESH" => Ok(CascadeType::Refresh),
            "DETACH" => Ok(CascadeType::Detach),
            _ => Err(()),
        }
    }
}

/// Vendor cascade types (`value` member of the vendor cascade directive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VendorCascadeType {
    All,
    Persist,
    Merge,
    Remove,
    Refresh,
    Delete,
    SaveUpdate,
    Replicate,
    Lock,
    Detach,
}

impl FromStr for VendorCascadeType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ALL" => Ok(VendorCascadeType::All),
            "PERSIST" => Ok(VendorCascadeType::Persist),
            "MERGE" => Ok(VendorCascadeType::Merge),
            "REMOVE" => Ok(VendorCascadeType::Remove),
            "REFRESH" => Ok(VendorCascadeType::Refresh),
            "DELETE" => Ok(VendorCascadeType::Delete),
            "SAVE_UPDATE" => Ok(VendorCascadeType::SaveUpdate),
            "REPLICATE" => Ok(VendorCascadeType::Replicate),
            "LOCK" => Ok(VendorCascadeType::Lock),
            "DETACH" | "EVICT" => Ok(VendorCascadeType::Detach),
            _ => Err(()),
        }
    }
}
