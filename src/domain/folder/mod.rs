//! Folder module.
//!
//! This module contains everything related to remote folders: the
//! folder itself, its identifiers and kinds, the root owning the
//! hierarchy and the operations available on folders.

pub mod id;
pub use id::{BaseFolderId, DistinguishedFolderId, FolderId, Mailbox};

pub mod kind;
pub use kind::FolderKind;

pub mod field;
pub use field::{FieldDescriptor, FIELDS};

pub mod folder;
pub use folder::{EffectiveRights, Error, Folder, Permission, PermissionSet, Result};

pub mod root;
pub use root::Root;

pub mod folders;
pub use folders::{FolderCollection, SyncStep, SyncSteps};

pub mod navigation;
pub use navigation::{Glob, Walk};

pub mod pattern;
pub use pattern::Pattern;

pub mod mutation;
pub use mutation::MAX_WIPE_DEPTH;

pub mod sync;
pub use sync::{FolderSync, SyncHierarchy, SyncItems};

pub mod subscription;
pub use subscription::{Events, StreamingEvents};

mod user_config;
