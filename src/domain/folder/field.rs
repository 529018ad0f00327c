//! Folder field module.
//!
//! This module contains the static schema of the folder: an ordered
//! table of field descriptors used to validate folders against a
//! server build and to compute the fields sent on update.

use crate::{Build, Folder, EXCHANGE_2007_SP1};

/// Represents the description of a folder field.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    /// Represents the name of the field, as accepted by
    /// [`Folder::save`](crate::Folder::save).
    pub name: &'static str,
    /// Represents the URI of the field on the server side.
    pub field_uri: &'static str,
    pub is_read_only: bool,
    pub is_required: bool,
    /// Tells if the field cannot be unset once the folder is saved.
    pub is_required_after_save: bool,
    /// Represents the first server build supporting the field, `None`
    /// when all builds do.
    pub supported_from: Option<Build>,
    /// Tells if the field holds a non-empty value on the given folder.
    pub is_set: fn(&Folder) -> bool,
}

impl FieldDescriptor {
    pub fn supports_version(&self, build: Build) -> bool {
        self.supported_from
            .map(|from| build >= from)
            .unwrap_or(true)
    }
}

pub static FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        name: "id",
        field_uri: "folder:FolderId",
        is_read_only: true,
        is_required: false,
        is_required_after_save: false,
        supported_from: None,
        is_set: |folder| folder.id().is_some(),
    },
    FieldDescriptor {
        name: "parent_folder_id",
        field_uri: "folder:ParentFolderId",
        is_read_only: true,
        is_required: false,
        is_required_after_save: false,
        supported_from: None,
        is_set: |folder| folder.parent_folder_id.is_some(),
    },
    FieldDescriptor {
        name: "folder_class",
        field_uri: "folder:FolderClass",
        is_read_only: false,
        is_required: false,
        is_required_after_save: true,
        supported_from: None,
        is_set: |folder| folder.folder_class().map(|c| !c.is_empty()).unwrap_or(false),
    },
    FieldDescriptor {
        name: "name",
        field_uri: "folder:DisplayName",
        is_read_only: false,
        is_required: false,
        is_required_after_save: false,
        supported_from: None,
        is_set: |folder| !folder.name.is_empty(),
    },
    FieldDescriptor {
        name: "total_count",
        field_uri: "folder:TotalCount",
        is_read_only: true,
        is_required: false,
        is_required_after_save: false,
        supported_from: None,
        is_set: |folder| folder.total_count.is_some(),
    },
    FieldDescriptor {
        name: "child_folder_count",
        field_uri: "folder:ChildFolderCount",
        is_read_only: true,
        is_required: false,
        is_required_after_save: false,
        supported_from: None,
        is_set: |folder| folder.child_folder_count.is_some(),
    },
    FieldDescriptor {
        name: "unread_count",
        field_uri: "folder:UnreadCount",
        is_read_only: true,
        is_required: false,
        is_required_after_save: false,
        supported_from: None,
        is_set: |folder| folder.unread_count.is_some(),
    },
    FieldDescriptor {
        name: "permission_set",
        field_uri: "folder:PermissionSet",
        is_read_only: false,
        is_required: false,
        is_required_after_save: false,
        supported_from: Some(EXCHANGE_2007_SP1),
        is_set: |folder| {
            folder
                .permission_set
                .as_ref()
                .map(|set| !set.permissions.is_empty())
                .unwrap_or(false)
        },
    },
    FieldDescriptor {
        name: "effective_rights",
        field_uri: "folder:EffectiveRights",
        is_read_only: true,
        is_required: false,
        is_required_after_save: false,
        supported_from: Some(EXCHANGE_2007_SP1),
        is_set: |folder| folder.effective_rights.is_some(),
    },
];

/// Lists the fields supported by the given server build, in schema
/// order.
pub fn supported_fields(build: Build) -> impl Iterator<Item = &'static FieldDescriptor> {
    FIELDS.iter().filter(move |field| field.supports_version(build))
}

pub fn field_by_name(name: &str) -> Option<&'static FieldDescriptor> {
    FIELDS.iter().find(|field| field.name == name)
}
