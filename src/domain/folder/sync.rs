//! Folder sync module.
//!
//! This module contains the delta synchronizations of a folder. The
//! returned iterators borrow the folder mutably: the cursor of a
//! synchronization is stored back into the folder once the server
//! reports it complete, and only then. Stopping early leaves the
//! folder cursor untouched.

use log::debug;

use crate::{ChangeType, Folder, Item, Root, SyncItemsOptions};

use super::{folders::SyncStep, folders::SyncSteps, Result};

/// Represents an ongoing synchronization of a folder.
pub struct FolderSync<'f, 'a, T> {
    folder: &'f mut Folder,
    steps: SyncSteps<'a, T>,
    store_sync_state: fn(&mut Folder, String),
}

pub type SyncItems<'f, 'a> = FolderSync<'f, 'a, Item>;
pub type SyncHierarchy<'f, 'a> = FolderSync<'f, 'a, Folder>;

impl<'f, 'a, T> Iterator for FolderSync<'f, 'a, T> {
    type Item = Result<(ChangeType, T)>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.steps.next()? {
            Ok(SyncStep::Change(change_type, change)) => Some(Ok((change_type, change))),
            Ok(SyncStep::Completed { sync_state }) => {
                debug!("storing sync state {} in folder {}", sync_state, self.folder);
                (self.store_sync_state)(&mut *self.folder, sync_state);
                None
            }
            Err(err) => Some(Err(err)),
        }
    }
}

impl Folder {
    /// Synchronizes the items of the folder. Without explicit cursor,
    /// or with an empty one, resumes from the last completed item sync.
    pub fn sync_items<'f, 'a>(
        &'f mut self,
        root: &'a Root<'a>,
        mut options: SyncItemsOptions,
    ) -> Result<SyncItems<'f, 'a>> {
        options.sync_state = options
            .sync_state
            .filter(|sync_state| !sync_state.is_empty())
            .or_else(|| self.item_sync_state.clone());
        let steps = self.collection(root).sync_items(options)?;
        Ok(FolderSync {
            folder: self,
            steps,
            store_sync_state: |folder, sync_state| folder.item_sync_state = Some(sync_state),
        })
    }

    /// Synchronizes the subfolders of the folder. Without explicit
    /// cursor, resumes from the last completed hierarchy sync.
    pub fn sync_hierarchy<'f, 'a>(
        &'f mut self,
        root: &'a Root<'a>,
        sync_state: Option<String>,
        only_fields: Option<Vec<String>>,
    ) -> Result<SyncHierarchy<'f, 'a>> {
        let sync_state = sync_state
            .filter(|sync_state| !sync_state.is_empty())
            .or_else(|| self.folder_sync_state.clone());
        let steps = self
            .collection(root)
            .sync_hierarchy(sync_state, only_fields)?;
        Ok(FolderSync {
            folder: self,
            steps,
            store_sync_state: |folder, sync_state| folder.folder_sync_state = Some(sync_state),
        })
    }
}
