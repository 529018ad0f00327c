//! Item module.
//!
//! This module contains everything related to the items held by
//! folders.

pub mod item;
pub use item::{
    ChangeType, DeleteType, Error, Item, ItemId, Persona, Restriction, Result,
};

pub mod query;
pub use query::{ItemQuery, PeopleQuery};
