//! Folder id module.
//!
//! This module contains the value objects used to reference remote
//! folders, either by server-assigned id or by well-known name.

use serde::{Deserialize, Serialize};
use std::{
    fmt,
    hash::{Hash, Hasher},
};

/// Represents a folder reference assigned by the server.
///
/// The change key is a version token used for optimistic concurrency:
/// two ids with different change keys still refer to the same folder.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct FolderId {
    pub id: String,
    pub changekey: Option<String>,
}

impl FolderId {
    pub fn new<I: ToString>(id: I, changekey: Option<String>) -> Self {
        Self {
            id: id.to_string(),
            changekey,
        }
    }
}

impl PartialEq for FolderId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Hash for FolderId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Represents the mailbox a distinguished folder belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mailbox {
    pub email_address: String,
}

impl Mailbox {
    pub fn new<E: ToString>(email_address: E) -> Self {
        Self {
            email_address: email_address.to_string(),
        }
    }
}

/// Represents a well-known folder reference (`inbox`, `calendar`…),
/// usable without knowing the folder id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DistinguishedFolderId {
    pub id: String,
    pub mailbox: Option<Mailbox>,
}

impl DistinguishedFolderId {
    pub fn new<I: ToString>(id: I, mailbox: Option<Mailbox>) -> Self {
        Self {
            id: id.to_string(),
            mailbox,
        }
    }
}

/// Represents any folder reference a service call accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseFolderId {
    FolderId(FolderId),
    DistinguishedFolderId(DistinguishedFolderId),
}

impl From<FolderId> for BaseFolderId {
    fn from(id: FolderId) -> Self {
        Self::FolderId(id)
    }
}

impl From<DistinguishedFolderId> for BaseFolderId {
    fn from(id: DistinguishedFolderId) -> Self {
        Self::DistinguishedFolderId(id)
    }
}

impl fmt::Display for BaseFolderId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::FolderId(id) => write!(f, "{}", id),
            Self::DistinguishedFolderId(DistinguishedFolderId { id, mailbox: None }) => {
                write!(f, "{}", id)
            }
            Self::DistinguishedFolderId(DistinguishedFolderId {
                id,
                mailbox: Some(mailbox),
            }) => write!(f, "{} ({})", id, mailbox.email_address),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn folder_ids_compare_by_id_only() {
        let id = FolderId::new("AAMk", Some("ck1".into()));
        let same = FolderId::new("AAMk", Some("ck2".into()));
        assert_eq!(id, same);
        assert_eq!(1, HashSet::<FolderId>::from_iter([id, same]).len());
        assert_ne!(FolderId::new("AAMk", None), FolderId::new("AAMl", None));
    }

    #[test]
    fn display_base_folder_ids() {
        assert_eq!("AAMk", BaseFolderId::from(FolderId::new("AAMk", None)).to_string());
        assert_eq!(
            "inbox (bob@localhost)",
            BaseFolderId::from(DistinguishedFolderId::new(
                "inbox",
                Some(Mailbox::new("bob@localhost"))
            ))
            .to_string()
        );
    }
}
