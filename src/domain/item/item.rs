//! Item module.
//!
//! This module contains the generic representation of the items a
//! folder holds. Concrete item types (messages, calendar items,
//! contacts…) only contribute fields, they are not modeled here.

use serde::{Deserialize, Serialize};
use std::{
    fmt,
    hash::{Hash, Hasher},
    result,
    str::FromStr,
};
use thiserror::Error;

use crate::service;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot parse delete type {0}: expected HardDelete, SoftDelete or MoveToDeletedItems")]
    ParseDeleteTypeError(String),
    #[error("cannot find item matching the query")]
    ItemNotFoundError,
    #[error("cannot get a single item: {0} items match the query")]
    MultipleItemsFoundError(usize),
    #[error("cannot query people: expected exactly one folder, got {0}")]
    PeopleFolderCountError(usize),

    #[error(transparent)]
    ServiceError(#[from] service::Error),
}

pub type Result<T> = result::Result<T, Error>;

/// Represents the identifier of an item. The change key is a version
/// token, only the id carries identity.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct ItemId {
    pub id: String,
    pub changekey: Option<String>,
}

impl ItemId {
    pub fn new<I: ToString>(id: I, changekey: Option<String>) -> Self {
        Self {
            id: id.to_string(),
            changekey,
        }
    }
}

impl PartialEq for ItemId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Hash for ItemId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Represents an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: Option<ItemId>,
    pub item_class: Option<String>,
    pub subject: Option<String>,
    pub is_read: Option<bool>,
}

impl Item {
    /// Gets the value of a searchable field as a string.
    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => self.id.as_ref().map(|id| id.id.clone()),
            "item_class" => self.item_class.clone(),
            "subject" => self.subject.clone(),
            "is_read" => self.is_read.map(|is_read| is_read.to_string()),
            _ => None,
        }
    }
}

/// Represents a person found in a contacts folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    pub display_name: String,
    pub email_address: Option<String>,
}

/// Represents the kind of change reported by a synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeType {
    Create,
    Update,
    Delete,
    /// Only reported for items.
    ReadFlagChange,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::ReadFlagChange => write!(f, "read flag change"),
        }
    }
}

/// Represents the way folders and items are deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeleteType {
    HardDelete,
    SoftDelete,
    MoveToDeletedItems,
}

impl Default for DeleteType {
    fn default() -> Self {
        Self::HardDelete
    }
}

impl fmt::Display for DeleteType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::HardDelete => write!(f, "HardDelete"),
            Self::SoftDelete => write!(f, "SoftDelete"),
            Self::MoveToDeletedItems => write!(f, "MoveToDeletedItems"),
        }
    }
}

impl FromStr for DeleteType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "HardDelete" => Ok(Self::HardDelete),
            "SoftDelete" => Ok(Self::SoftDelete),
            "MoveToDeletedItems" => Ok(Self::MoveToDeletedItems),
            _ => Err(Error::ParseDeleteTypeError(s.to_owned())),
        }
    }
}

/// Represents an item search criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Restriction {
    /// Field equals the value.
    Eq(String, String),
    /// Field contains the value, case-insensitively.
    Contains(String, String),
    Not(Box<Restriction>),
    And(Vec<Restriction>),
    Or(Vec<Restriction>),
}

impl Restriction {
    pub fn eq<F: ToString, V: ToString>(field: F, value: V) -> Self {
        Self::Eq(field.to_string(), value.to_string())
    }

    pub fn contains<F: ToString, V: ToString>(field: F, value: V) -> Self {
        Self::Contains(field.to_string(), value.to_string())
    }

    pub fn matches(&self, item: &Item) -> bool {
        match self {
            Self::Eq(field, value) => item.field(field).as_ref() == Some(value),
            Self::Contains(field, value) => item
                .field(field)
                .map(|field| field.to_lowercase().contains(&value.to_lowercase()))
                .unwrap_or(false),
            Self::Not(restriction) => !restriction.matches(item),
            Self::And(restrictions) => restrictions.iter().all(|r| r.matches(item)),
            Self::Or(restrictions) => restrictions.iter().any(|r| r.matches(item)),
        }
    }
}
