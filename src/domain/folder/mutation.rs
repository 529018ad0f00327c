//! Folder mutation module.
//!
//! This module contains the operations reading or changing a folder
//! on the server and keeping the root cache in line with the result.

use log::{debug, info, trace, warn};
use std::collections::HashSet;

use crate::{
    service, BaseFolderId, DeleteType, Folder, FolderCollection, FolderId, FolderKind, Item,
    ItemId, Root,
};

use super::{
    field::{field_by_name, supported_fields},
    Error, Result,
};

/// Represents the maximum depth of the subtree a wipe goes through.
pub const MAX_WIPE_DEPTH: usize = 16;

// Server refusals a wipe works around when emptying a folder.
fn is_empty_refusal(err: &Error) -> bool {
    matches!(
        err.service_error(),
        Some(service::Error::AccessDenied(_) | service::Error::CannotEmptyFolder(_))
    )
}

// Server refusals a wipe works around when deleting items one by one.
fn is_delete_items_refusal(err: &Error) -> bool {
    matches!(
        err.service_error(),
        Some(service::Error::AccessDenied(_) | service::Error::CannotDeleteObject(_))
    )
}

impl Folder {
    /// Fetches the folder the given reference points to, checking it
    /// has the expected kind. A `Generic` kind accepts any folder.
    pub fn resolve(root: &Root, kind: FolderKind, reference: Folder) -> Result<Folder> {
        let description = match reference.to_folder_id(root.account()) {
            Ok(id) => id.to_string(),
            Err(_) => reference.to_string(),
        };

        let mut results = FolderCollection::new(root, vec![reference]).resolve()?;
        let folder = match results.len() {
            0 => return Err(Error::FolderNotFound(description)),
            1 => results.remove(0)?,
            n => return Err(Error::UnexpectedResultCount(n)),
        };

        if kind != FolderKind::Generic && folder.kind() != kind {
            return Err(Error::UnexpectedFolderKind {
                expected: kind,
                got: folder.kind(),
            });
        }

        trace!("resolved folder: {:#?}", folder);
        Ok(folder)
    }

    /// Fetches the well-known folder of the given kind.
    pub fn get_distinguished(root: &Root, kind: FolderKind) -> Result<Folder> {
        info!("getting distinguished folder {}", kind);
        match Folder::resolve(root, kind, Folder::distinguished(kind)) {
            Err(err)
                if err
                    .service_error()
                    .map(service::Error::is_missing_folder)
                    .unwrap_or(false) =>
            {
                debug!("cannot resolve distinguished folder {}: {}", kind, err);
                Err(Error::FolderNotFound(
                    kind.distinguished_id().unwrap_or_default().to_owned(),
                ))
            }
            result => result,
        }
    }

    /// Fetches the folder again and overrides its fields with the
    /// fresh ones.
    pub fn refresh(&mut self, root: &Root) -> Result<()> {
        let id = self.require_id()?.clone();
        info!("refreshing folder {}", self);

        let fresh = Folder::resolve(root, self.kind, self.clone())?;
        match fresh.id() {
            Some(fresh_id) if *fresh_id == id => (),
            fresh_id => {
                return Err(Error::IdMismatch(
                    id.to_string(),
                    fresh_id.map(ToString::to_string).unwrap_or_default(),
                ))
            }
        }

        self.copy_fields_from(fresh);
        Ok(())
    }

    /// Creates the folder when it has no id, updates it otherwise.
    ///
    /// Updates send the given fields, or all the writable fields
    /// supported by the server when none are given. Field lists are
    /// refused on creation.
    pub fn save(&mut self, root: &Root, update_fields: Option<&[&str]>) -> Result<&mut Folder> {
        let version = root.account().version;

        if self.id.is_none() {
            if update_fields.is_some() {
                return Err(Error::UpdateFieldsOnCreate);
            }
            let parent = self.parent_folder_id.clone().ok_or(Error::MissingParent)?;
            self.clean(version)?;
            info!("creating folder {} in {}", self, parent);

            let mut ids = root
                .service()
                .create_folder(&BaseFolderId::from(parent), &[&*self])?;
            if ids.len() != 1 {
                return Err(Error::UnexpectedResultCount(ids.len()));
            }
            self.id = Some(ids.remove(0));
            root.add_folder(self)?;
            return Ok(self);
        }

        self.clean(version)?;
        let fields: Vec<&str> = match update_fields {
            Some(fields) => {
                for name in fields {
                    match field_by_name(name) {
                        Some(field) if !field.is_read_only => (),
                        _ => return Err(Error::InvalidField(name.to_string())),
                    }
                }
                fields.to_vec()
            }
            None => supported_fields(version)
                .filter(|field| !field.is_read_only)
                .filter(|field| {
                    !(field.is_required || field.is_required_after_save) || (field.is_set)(self)
                })
                .map(|field| field.name)
                .collect(),
        };
        info!("updating folder {}", self);
        debug!(
            "update fields: {:?}",
            fields
                .iter()
                .filter_map(|name| field_by_name(name))
                .map(|field| field.field_uri)
                .collect::<Vec<_>>()
        );

        let mut ids = root.service().update_folder(&[(&*self, fields.as_slice())])?;
        if ids.len() != 1 {
            return Err(Error::UnexpectedResultCount(ids.len()));
        }
        let id: FolderId = ids.remove(0);
        if self.id() != Some(&id) {
            return Err(Error::IdMismatch(
                self.id().map(ToString::to_string).unwrap_or_default(),
                id.to_string(),
            ));
        }
        self.id = Some(id);
        root.update_folder(self)?;
        Ok(self)
    }

    /// Deletes the folder and forgets its id.
    pub fn delete(&mut self, root: &Root, delete_type: DeleteType) -> Result<()> {
        self.require_id()?;
        info!("deleting folder {} ({})", self, delete_type);

        let id = self.to_folder_id(root.account())?;
        root.service().delete_folder(&[id], delete_type)?;
        root.remove_folder(self)?;
        self.id = None;
        Ok(())
    }

    /// Deletes the items of the folder, and its subfolders if asked.
    pub fn empty(&self, root: &Root, delete_type: DeleteType, delete_sub_folders: bool) -> Result<()> {
        info!(
            "emptying folder {} ({}, subfolders: {})",
            self, delete_type, delete_sub_folders
        );

        let id = self.to_folder_id(root.account())?;
        root.service()
            .empty_folder(&[id], delete_type, delete_sub_folders)?;
        if delete_sub_folders {
            // deleted subfolders are unknown, the whole cache is stale
            root.clear_cache();
        }
        Ok(())
    }

    /// Deletes all the items and subfolders of the folder, on a best
    /// effort basis. Well-known folders are kept, as are folders the
    /// server refuses to empty.
    pub fn wipe(&self, root: &Root, page_size: Option<usize>) -> Result<()> {
        self.wipe_level(root, page_size, 0, &mut HashSet::new())
    }

    fn wipe_level(
        &self,
        root: &Root,
        page_size: Option<usize>,
        level: usize,
        visited: &mut HashSet<FolderId>,
    ) -> Result<()> {
        let id = self.require_id()?;
        if !visited.insert(id.clone()) {
            return Err(Error::WipeCycleError(self.to_string()));
        }
        if level > MAX_WIPE_DEPTH {
            return Err(Error::WipeMaxDepthError(MAX_WIPE_DEPTH));
        }
        info!("wiping folder {}", self);

        let has_distinguished_subfolders = root
            .get_children(self)?
            .iter()
            .any(|child| child.is_distinguished);

        if let Err(err) = self.empty(root, DeleteType::HardDelete, !has_distinguished_subfolders) {
            if !is_empty_refusal(&err) {
                return Err(err);
            }
            warn!("cannot empty folder {}: {}", self, err);

            let retry = if has_distinguished_subfolders {
                Err(err)
            } else {
                self.empty(root, DeleteType::HardDelete, false)
            };

            if let Err(err) = retry {
                if !is_empty_refusal(&err) {
                    return Err(err);
                }
                warn!("cannot empty folder {} without subfolders: {}", self, err);

                let deleted = self
                    .all(root)
                    .and_then(|query| Ok(query.page_size(page_size).delete(DeleteType::HardDelete)?));
                match deleted {
                    Ok(count) => debug!("deleted {} item(s) of folder {}", count, self),
                    Err(err) if is_delete_items_refusal(&err) => {
                        warn!("cannot delete items of folder {}: {}", self, err)
                    }
                    Err(err) => return Err(err),
                }
            }
        }

        let children = root.get_children(self)?;
        for mut child in children {
            child.wipe_level(root, page_size, level + 1, visited)?;

            if child.is_deletable() && root.get_children(&child)?.is_empty() {
                warn!("deleting folder {}", child);
                match child.delete(root, DeleteType::HardDelete) {
                    Err(Error::ServiceError(service::Error::DeleteDistinguishedFolder(err))) => {
                        warn!("cannot delete distinguished folder {}: {}", child, err)
                    }
                    result => result?,
                }
            }
        }

        Ok(())
    }

    /// Creates the given items in the folder.
    pub fn bulk_create(&self, root: &Root, items: &[Item]) -> Result<Vec<ItemId>> {
        let id = self.to_folder_id(root.account())?;
        info!("creating {} item(s) in folder {}", items.len(), id);
        Ok(root.service().create_items(&id, items)?)
    }

    /// Checks the folder is readable with a cheap item query.
    pub fn test_access(&self, root: &Root) -> Result<bool> {
        self.all(root)?.exists()?;
        Ok(true)
    }
}
