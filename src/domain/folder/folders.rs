//! Folders module.
//!
//! This module contains the query layer over a set of folders. The
//! collection turns folder operations into service calls and
//! reconciles the results with the folders it was built from.

use log::{debug, info, trace};
use std::collections::VecDeque;

use crate::{
    item, service, BaseFolderId, ChangeType, EventType, Folder, FolderKind, Item, ItemQuery,
    PeopleQuery, Restriction, Root, Subscription, SyncItemsOptions, SyncPage, Traversal,
};

use super::{Error, Result};

/// Represents a step of a delta synchronization: either a change or
/// the end of the synchronization, carrying the cursor to resume from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStep<T> {
    Change(ChangeType, T),
    Completed { sync_state: String },
}

type Fetch<'a, T> = Box<dyn FnMut(Option<String>) -> service::Result<SyncPage<T>> + 'a>;

/// Represents the lazy sequence of steps of a delta synchronization.
///
/// Pages are fetched from the service only when the previous one is
/// consumed. The sequence ends after a single
/// [`SyncStep::Completed`], or after the first error.
pub struct SyncSteps<'a, T> {
    fetch: Fetch<'a, T>,
    sync_state: Option<String>,
    changes: VecDeque<(ChangeType, T)>,
    is_last_page: bool,
    is_done: bool,
}

impl<'a, T> SyncSteps<'a, T> {
    fn new(sync_state: Option<String>, fetch: Fetch<'a, T>) -> Self {
        Self {
            fetch,
            sync_state,
            changes: VecDeque::new(),
            is_last_page: false,
            is_done: false,
        }
    }
}

impl<'a, T> Iterator for SyncSteps<'a, T> {
    type Item = Result<SyncStep<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.is_done {
                return None;
            }

            if let Some((change_type, change)) = self.changes.pop_front() {
                return Some(Ok(SyncStep::Change(change_type, change)));
            }

            if self.is_last_page {
                self.is_done = true;
                let sync_state = self.sync_state.clone().unwrap_or_default();
                debug!("sync completed with state {}", sync_state);
                return Some(Ok(SyncStep::Completed { sync_state }));
            }

            match (self.fetch)(self.sync_state.clone()) {
                Ok(page) => {
                    debug!(
                        "fetched sync page of {} change(s), last: {}",
                        page.changes.len(),
                        page.includes_last_item_in_range
                    );
                    self.sync_state = Some(page.sync_state);
                    self.is_last_page = page.includes_last_item_in_range;
                    self.changes.extend(page.changes);
                }
                Err(err) => {
                    self.is_done = true;
                    return Some(Err(err.into()));
                }
            }
        }
    }
}

/// Represents a set of folders of a hierarchy.
#[derive(Clone)]
pub struct FolderCollection<'a> {
    root: &'a Root<'a>,
    folders: Vec<Folder>,
}

impl<'a> FolderCollection<'a> {
    pub fn new(root: &'a Root<'a>, folders: Vec<Folder>) -> Self {
        Self { root, folders }
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn into_folders(self) -> Vec<Folder> {
        self.folders
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    fn ids(&self) -> Result<Vec<BaseFolderId>> {
        self.folders
            .iter()
            .map(|folder| folder.to_folder_id(self.root.account()))
            .collect()
    }

    fn single_id(&self) -> Result<BaseFolderId> {
        match self.folders.as_slice() {
            [folder] => folder.to_folder_id(self.root.account()),
            folders => Err(Error::SingleFolderRequired(folders.len())),
        }
    }

    /// Fetches the folders of the collection from the server, one
    /// result per folder, in order.
    ///
    /// Resolved folders take the kind of the requested folder, or a
    /// deduced one when the requested kind is unknown.
    pub fn resolve(&self) -> Result<Vec<Result<Folder>>> {
        let ids = self.ids()?;
        info!("resolving {} folder(s)", ids.len());
        debug!("folder references: {:?}", ids);

        let results = self.root.service().get_folders(&ids)?;
        if results.len() > ids.len() {
            return Err(Error::UnexpectedResultCount(results.len()));
        }
        let locale = self.root.account().locale();

        let folders = self
            .folders
            .iter()
            .zip(results)
            .map(|(requested, result)| -> Result<Folder> {
                let mut folder = result?;
                if requested.kind() == FolderKind::Generic {
                    folder.deduce_kind(locale);
                } else {
                    folder.kind = requested.kind();
                }
                folder.is_distinguished = requested.is_distinguished;
                if folder.name.is_empty() {
                    if let Some(id) = folder.kind().distinguished_id() {
                        folder.name = id.to_owned();
                    }
                }
                Ok(folder)
            })
            .collect::<Vec<_>>();

        trace!("resolved folders: {:#?}", folders);
        Ok(folders)
    }

    /// Searches the subfolders of the folders of the collection.
    pub fn find_folders(&self, traversal: Traversal) -> Result<Vec<Folder>> {
        self.find_folders_named(traversal, None)
    }

    fn find_folders_named(&self, traversal: Traversal, name: Option<&str>) -> Result<Vec<Folder>> {
        let locale = self.root.account().locale();
        let mut found = Vec::new();

        for id in self.ids()? {
            debug!("finding {:?} subfolders of {} named {:?}", traversal, id, name);
            let folders = self.root.service().find_folders(&id, traversal, name)?;
            found.extend(folders.into_iter().map(|mut folder| {
                folder.deduce_kind(locale);
                folder
            }));
        }

        trace!("found folders: {:#?}", found);
        Ok(found)
    }

    /// Gets the only direct subfolder with the given name.
    pub fn get(&self, name: &str) -> Result<Folder> {
        let mut folders = self.find_folders_named(Traversal::Shallow, Some(name))?;
        match folders.len() {
            0 => Err(Error::FolderNotFound(name.to_owned())),
            1 => Ok(folders.remove(0)),
            n => Err(Error::MultipleFoldersFound(name.to_owned(), 1, n)),
        }
    }

    /// Builds a query over all the items of the collection.
    pub fn all(&self) -> Result<ItemQuery<'a>> {
        Ok(ItemQuery::new(
            self.root.service(),
            self.ids()?,
            self.root.account().item_page_size(),
        ))
    }

    pub fn none(&self) -> ItemQuery<'a> {
        ItemQuery::none(self.root.service())
    }

    pub fn filter(&self, restriction: Restriction) -> Result<ItemQuery<'a>> {
        Ok(self.all()?.filter(restriction))
    }

    pub fn exclude(&self, restriction: Restriction) -> Result<ItemQuery<'a>> {
        Ok(self.all()?.exclude(restriction))
    }

    /// Builds a people search. Only one folder can be searched.
    pub fn people(&self) -> Result<PeopleQuery<'a>> {
        if self.folders.len() != 1 {
            return Err(item::Error::PeopleFolderCountError(self.folders.len()).into());
        }
        Ok(PeopleQuery::new(self.root.service(), self.single_id()?))
    }

    /// Synchronizes the items of the only folder of the collection.
    pub fn sync_items(&self, options: SyncItemsOptions) -> Result<SyncSteps<'a, Item>> {
        let folder = self.single_id()?;
        info!("syncing items of folder {}", folder);
        debug!("sync items options: {:?}", options);

        let service = self.root.service();
        let mut options = options;
        let sync_state = options.sync_state.take();

        Ok(SyncSteps::new(
            sync_state,
            Box::new(move |sync_state: Option<String>| {
                let options = SyncItemsOptions {
                    sync_state,
                    ..options.clone()
                };
                service.sync_folder_items(&folder, &options)
            }),
        ))
    }

    /// Synchronizes the subfolders of the only folder of the
    /// collection.
    pub fn sync_hierarchy(
        &self,
        sync_state: Option<String>,
        only_fields: Option<Vec<String>>,
    ) -> Result<SyncSteps<'a, Folder>> {
        let folder = self.single_id()?;
        info!("syncing hierarchy of folder {}", folder);

        let service = self.root.service();
        let locale = self.root.account().locale().to_owned();

        Ok(SyncSteps::new(
            sync_state,
            Box::new(move |sync_state: Option<String>| -> service::Result<SyncPage<Folder>> {
                let mut page = service.sync_folder_hierarchy(
                    &folder,
                    sync_state.as_deref(),
                    only_fields.as_deref(),
                )?;
                for (_, changed) in page.changes.iter_mut() {
                    changed.deduce_kind(&locale);
                }
                Ok(page)
            }),
        ))
    }

    pub fn subscribe_to_pull(
        &self,
        event_types: &[EventType],
        watermark: Option<&str>,
        timeout: u32,
    ) -> Result<Vec<service::Result<Subscription>>> {
        let ids = self.ids()?;
        info!("creating pull subscription on {} folder(s)", ids.len());
        Ok(self
            .root
            .service()
            .subscribe_to_pull(&ids, event_types, watermark, timeout)?)
    }

    pub fn subscribe_to_push(
        &self,
        callback_url: &str,
        event_types: &[EventType],
        watermark: Option<&str>,
        status_frequency: u32,
    ) -> Result<Vec<service::Result<Subscription>>> {
        let ids = self.ids()?;
        info!("creating push subscription on {} folder(s)", ids.len());
        debug!("push callback url: {}", callback_url);
        Ok(self.root.service().subscribe_to_push(
            &ids,
            event_types,
            watermark,
            status_frequency,
            callback_url,
        )?)
    }

    pub fn subscribe_to_streaming(
        &self,
        event_types: &[EventType],
    ) -> Result<Vec<service::Result<Subscription>>> {
        let ids = self.ids()?;
        info!("creating streaming subscription on {} folder(s)", ids.len());
        Ok(self
            .root
            .service()
            .subscribe_to_streaming(&ids, event_types)?)
    }
}

impl Folder {
    /// Builds a collection holding only this folder.
    pub fn collection<'a>(&self, root: &'a Root<'a>) -> FolderCollection<'a> {
        FolderCollection::new(root, vec![self.clone()])
    }

    pub fn all<'a>(&self, root: &'a Root<'a>) -> Result<ItemQuery<'a>> {
        self.collection(root).all()
    }

    pub fn none<'a>(&self, root: &'a Root<'a>) -> ItemQuery<'a> {
        self.collection(root).none()
    }

    pub fn filter<'a>(&self, root: &'a Root<'a>, restriction: Restriction) -> Result<ItemQuery<'a>> {
        self.collection(root).filter(restriction)
    }

    pub fn exclude<'a>(&self, root: &'a Root<'a>, restriction: Restriction) -> Result<ItemQuery<'a>> {
        self.collection(root).exclude(restriction)
    }

    pub fn people<'a>(&self, root: &'a Root<'a>) -> Result<PeopleQuery<'a>> {
        self.collection(root).people()
    }

    /// Gets the only direct subfolder with the given name, straight
    /// from the server.
    pub fn get<'a>(&self, root: &'a Root<'a>, name: &str) -> Result<Folder> {
        self.collection(root).get(name)
    }
}
