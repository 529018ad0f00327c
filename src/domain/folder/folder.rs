//! Folder module.
//!
//! This module contains the representation of the remote folder and
//! the errors shared by all the folder operations.

use serde::{Deserialize, Serialize};
use std::{fmt, result};
use thiserror::Error;

use crate::{
    account, item, service, AccountConfig, BaseFolderId, Build, DistinguishedFolderId, FolderId,
    FolderKind,
};

use super::field::FIELDS;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot find folder {0}")]
    FolderNotFound(String),
    #[error("cannot find folder {0}: expected {1} folder(s), got {2}")]
    MultipleFoldersFound(String, usize, usize),
    #[error("cannot proceed: folder has no id, it must be saved first")]
    MissingId,
    #[error("cannot create folder: folder has no parent")]
    MissingParent,
    #[error("cannot apply server response: expected folder id {0}, got {1}")]
    IdMismatch(String, String),
    #[error("cannot apply server response: expected exactly one result, got {0}")]
    UnexpectedResultCount(usize),
    #[error("cannot sync folders: expected exactly one folder, got {0}")]
    SingleFolderRequired(usize),
    #[error("cannot resolve folder: expected {expected} folder, got {got}")]
    UnexpectedFolderKind { expected: FolderKind, got: FolderKind },
    #[error("cannot create folder: update fields are only allowed on saved folders")]
    UpdateFieldsOnCreate,
    #[error("cannot change folder class of a saved folder")]
    FolderClassLocked,
    #[error("cannot update folder: unknown or read-only field {0}")]
    InvalidField(String),
    #[error("cannot use field {0}: server build {1} does not support it")]
    UnsupportedField(&'static str, Build),
    #[error("cannot go up: folder is already at the top of the hierarchy")]
    AlreadyAtTop,
    #[error("cannot find parent folder without cache")]
    ParentWithoutCache,
    #[error("cannot wipe folder {0}: folder already visited")]
    WipeCycleError(String),
    #[error("cannot wipe folder: max depth {0} exceeded")]
    WipeMaxDepthError(usize),
    #[error("cannot stream events: invalid subscription(s) {}", .0.join(", "))]
    InvalidSubscription(Vec<String>),
    #[error("cannot parse glob pattern {1}")]
    ParseGlobPatternError(#[source] regex::Error, String),

    #[error(transparent)]
    ConfigError(#[from] account::config::Error),
    #[error(transparent)]
    ServiceError(#[from] service::Error),
    #[error(transparent)]
    ItemError(#[from] item::Error),
}

impl Error {
    /// Gets the service error behind this error, if any.
    pub fn service_error(&self) -> Option<&service::Error> {
        match self {
            Self::ServiceError(err) => Some(err),
            Self::ItemError(item::Error::ServiceError(err)) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = result::Result<T, Error>;

/// Represents a permission granted to a user on a folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub user: String,
    pub permission_level: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    pub permissions: Vec<Permission>,
}

/// Represents the rights of the authenticated user on a folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveRights {
    pub create_associated: bool,
    pub create_contents: bool,
    pub create_hierarchy: bool,
    pub delete: bool,
    pub modify: bool,
    pub read: bool,
}

/// Represents the remote folder.
///
/// A folder without id has never been persisted. The folder does not
/// know the hierarchy it belongs to: operations needing it take the
/// [`Root`](crate::Root) as parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub(super) kind: FolderKind,
    pub(super) id: Option<FolderId>,
    pub parent_folder_id: Option<FolderId>,
    pub(super) folder_class: Option<String>,
    /// Represents the display name of the folder.
    pub name: String,
    pub total_count: Option<u32>,
    pub child_folder_count: Option<u32>,
    pub unread_count: Option<u32>,
    pub permission_set: Option<PermissionSet>,
    pub effective_rights: Option<EffectiveRights>,

    /// Tells if the folder was resolved as a well-known folder. Not
    /// persisted.
    #[serde(skip)]
    pub is_distinguished: bool,
    /// Represents the cursor of the last completed item sync.
    #[serde(skip)]
    pub item_sync_state: Option<String>,
    /// Represents the cursor of the last completed hierarchy sync.
    #[serde(skip)]
    pub folder_sync_state: Option<String>,
}

impl Folder {
    pub fn new(kind: FolderKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Builds a transient reference to the well-known folder of the
    /// given kind.
    pub fn distinguished(kind: FolderKind) -> Self {
        Self {
            kind,
            is_distinguished: true,
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: FolderId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_name<N: ToString>(mut self, name: N) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_folder_class<C: ToString>(mut self, folder_class: C) -> Self {
        self.folder_class = Some(folder_class.to_string());
        self
    }

    pub fn with_parent(mut self, parent_folder_id: FolderId) -> Self {
        self.parent_folder_id = Some(parent_folder_id);
        self
    }

    pub fn kind(&self) -> FolderKind {
        self.kind
    }

    pub fn id(&self) -> Option<&FolderId> {
        self.id.as_ref()
    }

    pub fn changekey(&self) -> Option<&str> {
        self.id.as_ref().and_then(|id| id.changekey.as_deref())
    }

    pub fn folder_class(&self) -> Option<&str> {
        self.folder_class.as_deref()
    }

    /// Sets the folder class. Only allowed before the first save.
    pub fn set_folder_class<C: ToString>(&mut self, folder_class: C) -> Result<()> {
        if self.id.is_some() {
            return Err(Error::FolderClassLocked);
        }
        self.folder_class = Some(folder_class.to_string());
        Ok(())
    }

    /// Gets the id of the parent folder. A folder being its own parent
    /// has no parent.
    pub fn parent_id(&self) -> Option<&FolderId> {
        match (&self.parent_folder_id, &self.id) {
            (Some(parent), Some(id)) if parent == id => None,
            (parent, _) => parent.as_ref(),
        }
    }

    pub fn require_id(&self) -> Result<&FolderId> {
        self.id.as_ref().ok_or(Error::MissingId)
    }

    /// Tells if the folder can be deleted. Well-known folders cannot.
    pub fn is_deletable(&self) -> bool {
        !self.is_distinguished
    }

    /// Applies defaults and checks the folder against the server
    /// build before sending it.
    pub fn clean(&mut self, build: Build) -> Result<()> {
        if self.folder_class.is_none() {
            self.folder_class = self.kind.container_class().map(String::from);
        }
        for field in FIELDS {
            if !field.supports_version(build) && (field.is_set)(self) {
                return Err(Error::UnsupportedField(field.name, build));
            }
        }
        Ok(())
    }

    /// Builds the reference used to address the folder on the server.
    ///
    /// Distinguished folders are addressed by well-known name, scoped
    /// to the account mailbox, so that they can be used before being
    /// resolved.
    pub fn to_folder_id(&self, account: &AccountConfig) -> Result<BaseFolderId> {
        if self.is_distinguished {
            if let Some(id) = self.kind.distinguished_id() {
                return Ok(DistinguishedFolderId::new(id, account.mailbox()).into());
            }
        }
        self.id
            .clone()
            .map(BaseFolderId::from)
            .ok_or(Error::MissingId)
    }

    /// Copies the identity and all the schema fields of the given
    /// folder into this one.
    pub fn copy_fields_from(&mut self, other: Folder) {
        self.id = other.id;
        self.parent_folder_id = other.parent_folder_id;
        self.folder_class = other.folder_class;
        self.name = other.name;
        self.total_count = other.total_count;
        self.child_folder_count = other.child_folder_count;
        self.unread_count = other.unread_count;
        self.permission_set = other.permission_set;
        self.effective_rights = other.effective_rights;
    }

    /// Deduces the kind of a folder of unknown kind, first from its
    /// localized name then from its folder class.
    pub(super) fn deduce_kind(&mut self, locale: &str) {
        if self.kind != FolderKind::Generic {
            return;
        }
        self.kind = FolderKind::from_localized_name(&self.name, locale)
            .or_else(|| {
                self.folder_class
                    .as_deref()
                    .and_then(FolderKind::from_container_class)
            })
            .unwrap_or(FolderKind::Generic);
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.name)
    }
}
