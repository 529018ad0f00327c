//! Memory service module.
//!
//! This module contains an in-process implementation of the service.
//! The whole mailbox lives in memory: folders, items, people, user
//! configurations and subscriptions. Changes are recorded in journals
//! so that delta synchronizations can be replayed, sync states being
//! positions in those journals.

use chrono::Utc;
use log::{debug, info, trace};
use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap, HashSet, VecDeque},
    time::Duration,
    vec,
};
use uuid::Uuid;

use crate::{
    service::{Error, Result},
    BaseFolderId, ChangeType, DeleteType, Event, EventType, Folder, FolderId, FolderKind, Item,
    ItemId, Notification, NotificationStream, Persona, Restriction, Service, Subscription,
    SyncItemsOptions, SyncPage, Traversal, UserConfiguration, UserConfigurationProperties,
};

const ROOT_DISTINGUISHED_ID: &str = "msgfolderroot";
const ROOT_NAME: &str = "root";
const DEFAULT_MAX_CHANGES: usize = 512;
const DEFAULT_EVENTS_BATCH_SIZE: usize = 50;
// Guards ancestor lookups against manufactured parent cycles.
const MAX_ANCESTORS: usize = 256;

const WELL_KNOWN_FOLDERS: [(FolderKind, &str); 11] = [
    (FolderKind::Inbox, "Inbox"),
    (FolderKind::Outbox, "Outbox"),
    (FolderKind::SentItems, "Sent Items"),
    (FolderKind::DeletedItems, "Deleted Items"),
    (FolderKind::Drafts, "Drafts"),
    (FolderKind::JunkEmail, "Junk E-mail"),
    (FolderKind::Calendar, "Calendar"),
    (FolderKind::Contacts, "Contacts"),
    (FolderKind::Tasks, "Tasks"),
    (FolderKind::Notes, "Notes"),
    (FolderKind::Journal, "Journal"),
];

/// Represents an operation the memory service can be told to refuse
/// on a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Denial {
    /// Emptying the folder fails with `CannotEmptyFolder`.
    EmptyFolder,
    /// Deleting the folder fails with `AccessDenied`.
    DeleteFolder,
    /// Deleting items of the folder fails with `CannotDeleteObject`.
    DeleteItems,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn parse_sync_state(sync_state: Option<&str>) -> Result<usize> {
    match sync_state {
        None => Ok(0),
        Some(sync_state) => sync_state.parse().map_err(|_| Error::ProtocolError {
            code: "ErrorInvalidSyncStateData".into(),
            message: format!("invalid sync state {}", sync_state),
        }),
    }
}

fn select_item_fields(item: &Item, only_fields: Option<&[String]>) -> Item {
    let only_fields = match only_fields {
        Some(fields) => fields,
        None => return item.clone(),
    };
    let has = |name: &str| only_fields.iter().any(|field| field == name);
    Item {
        id: item.id.clone(),
        item_class: item.item_class.clone().filter(|_| has("item_class")),
        subject: item.subject.clone().filter(|_| has("subject")),
        is_read: item.is_read.filter(|_| has("is_read")),
    }
}

#[derive(Debug)]
struct StoredFolder {
    id: FolderId,
    folder: Folder,
    distinguished_id: Option<String>,
    items: Vec<Item>,
    people: Vec<Persona>,
    user_configs: BTreeMap<String, UserConfiguration>,
}

#[derive(Debug)]
struct ItemChange {
    folder: FolderId,
    change_type: ChangeType,
    item: Item,
}

#[derive(Debug)]
struct FolderChange {
    ancestors: Vec<FolderId>,
    change_type: ChangeType,
    folder: Folder,
}

#[derive(Debug)]
struct SubscriptionState {
    folders: Vec<FolderId>,
    event_types: Vec<EventType>,
    events: VecDeque<Event>,
}

#[derive(Debug)]
struct State {
    folders: Vec<StoredFolder>,
    soft_deleted: Vec<(FolderId, Folder)>,
    denials: HashMap<FolderId, HashSet<Denial>>,
    item_journal: Vec<ItemChange>,
    folder_journal: Vec<FolderChange>,
    subscriptions: HashMap<String, SubscriptionState>,
    watermark: u64,
    events_batch_size: usize,
}

impl State {
    fn position(&self, id: &FolderId) -> Result<usize> {
        self.folders
            .iter()
            .position(|stored| stored.id == *id)
            .ok_or_else(|| Error::FolderNotFound(id.to_string()))
    }

    fn resolve(&self, email: &str, folder: &BaseFolderId) -> Result<usize> {
        match folder {
            BaseFolderId::FolderId(id) => self.position(id),
            BaseFolderId::DistinguishedFolderId(distinguished) => {
                let is_other_mailbox = distinguished
                    .mailbox
                    .as_ref()
                    .map(|mailbox| !mailbox.email_address.eq_ignore_ascii_case(email))
                    .unwrap_or(false);
                if is_other_mailbox {
                    return Err(Error::FolderNotFound(folder.to_string()));
                }
                self.folders
                    .iter()
                    .position(|stored| {
                        stored.distinguished_id.as_deref() == Some(distinguished.id.as_str())
                    })
                    .ok_or_else(|| Error::FolderNotFound(folder.to_string()))
            }
        }
    }

    fn children(&self, id: &FolderId) -> Vec<usize> {
        self.folders
            .iter()
            .enumerate()
            .filter(|(_, stored)| stored.folder.parent_id() == Some(id))
            .map(|(idx, _)| idx)
            .collect()
    }

    // Pre-order, the folder itself excluded.
    fn descendants(&self, id: &FolderId) -> Vec<usize> {
        let mut descendants = Vec::new();
        let mut visited = HashSet::from([id.clone()]);
        let mut stack: Vec<usize> = self.children(id).into_iter().rev().collect();
        while let Some(idx) = stack.pop() {
            if !visited.insert(self.folders[idx].id.clone()) {
                continue;
            }
            descendants.push(idx);
            stack.extend(self.children(&self.folders[idx].id).into_iter().rev());
        }
        descendants
    }

    fn ancestors(&self, id: &FolderId) -> Vec<FolderId> {
        let mut ancestors = Vec::new();
        let mut current = self.position(id).ok();
        while let Some(idx) = current {
            match self.folders[idx].folder.parent_id() {
                Some(parent) if ancestors.len() < MAX_ANCESTORS => {
                    ancestors.push(parent.clone());
                    current = self.position(parent).ok();
                }
                _ => break,
            }
        }
        ancestors
    }

    fn is_denied(&self, id: &FolderId, denial: Denial) -> bool {
        self.denials
            .get(id)
            .map(|denials| denials.contains(&denial))
            .unwrap_or(false)
    }

    fn notify(
        &mut self,
        event_type: EventType,
        folder_id: &FolderId,
        parent_folder_id: Option<&FolderId>,
        item_id: Option<&ItemId>,
    ) {
        self.watermark += 1;
        let event = Event {
            event_type,
            watermark: Some(self.watermark.to_string()),
            timestamp: Some(Utc::now()),
            item_id: item_id.cloned(),
            folder_id: Some(folder_id.clone()),
            parent_folder_id: parent_folder_id.cloned(),
        };

        for subscription in self.subscriptions.values_mut() {
            let is_watched = subscription.folders.iter().any(|id| {
                id == folder_id || Some(id) == parent_folder_id
            });
            if is_watched && subscription.event_types.contains(&event_type) {
                subscription.events.push_back(event.clone());
            }
        }
    }

    fn record_folder_change(&mut self, change_type: ChangeType, folder: Folder) {
        let ancestors = match folder.id() {
            Some(id) => self.ancestors(id),
            None => Vec::new(),
        };
        self.folder_journal.push(FolderChange {
            ancestors,
            change_type,
            folder,
        });
    }

    fn record_item_change(&mut self, folder: &FolderId, change_type: ChangeType, item: Item) {
        let event_type = match change_type {
            ChangeType::Create => EventType::Created,
            ChangeType::Delete => EventType::Deleted,
            ChangeType::Update | ChangeType::ReadFlagChange => EventType::Modified,
        };
        self.notify(event_type, folder, None, item.id.as_ref());
        self.item_journal.push(ItemChange {
            folder: folder.clone(),
            change_type,
            item,
        });
    }

    fn insert_folder(
        &mut self,
        parent: Option<&FolderId>,
        folder: Folder,
        distinguished_id: Option<&str>,
    ) -> FolderId {
        let id = FolderId::new(new_id(), Some(new_id()));
        let mut folder = folder.with_id(id.clone());
        folder.parent_folder_id = parent.cloned();

        self.folders.push(StoredFolder {
            id: FolderId::new(&id.id, None),
            folder: folder.clone(),
            distinguished_id: distinguished_id.map(String::from),
            items: Vec::new(),
            people: Vec::new(),
            user_configs: BTreeMap::new(),
        });
        // ancestors are looked up from the stored folders
        self.record_folder_change(ChangeType::Create, folder);
        if let Some(parent) = parent {
            self.notify(EventType::Created, &id, Some(parent), None);
        }
        id
    }

    // Removes the given folders, children before parents so that the
    // recorded ancestors are still reachable.
    fn remove_folders(&mut self, indices: Vec<usize>) -> Vec<StoredFolder> {
        let removed_ids: HashSet<FolderId> = indices
            .iter()
            .map(|idx| self.folders[*idx].id.clone())
            .collect();

        for idx in indices.iter().rev() {
            let folder = self.folders[*idx].folder.clone();
            let parent = folder.parent_id().cloned();
            self.record_folder_change(ChangeType::Delete, folder);
            let id = self.folders[*idx].id.clone();
            self.notify(EventType::Deleted, &id, parent.as_ref(), None);
        }

        let (removed, kept): (Vec<StoredFolder>, Vec<StoredFolder>) = std::mem::take(&mut self.folders)
            .into_iter()
            .partition(|stored| removed_ids.contains(&stored.id));
        self.folders = kept;
        removed
    }
}

/// Represents the notifications of a streaming connection to the
/// memory service, collected when the connection is opened.
struct MemoryStream {
    notifications: vec::IntoIter<Notification>,
    error_subscription_ids: Vec<String>,
}

impl Iterator for MemoryStream {
    type Item = Result<Notification>;

    fn next(&mut self) -> Option<Self::Item> {
        self.notifications.next().map(Ok)
    }
}

impl NotificationStream for MemoryStream {
    fn error_subscription_ids(&self) -> Vec<String> {
        self.error_subscription_ids.clone()
    }
}

/// Represents the in-memory service.
pub struct MemoryService {
    email: String,
    state: RefCell<State>,
}

impl MemoryService {
    /// Builds a mailbox holding only the root folder.
    pub fn new<E: ToString>(email: E) -> Self {
        let mut state = State {
            folders: Vec::new(),
            soft_deleted: Vec::new(),
            denials: HashMap::new(),
            item_journal: Vec::new(),
            folder_journal: Vec::new(),
            subscriptions: HashMap::new(),
            watermark: 0,
            events_batch_size: DEFAULT_EVENTS_BATCH_SIZE,
        };
        state.insert_folder(
            None,
            Folder::new(FolderKind::Generic).with_name(ROOT_NAME),
            Some(ROOT_DISTINGUISHED_ID),
        );

        Self {
            email: email.to_string(),
            state: RefCell::new(state),
        }
    }

    /// Builds a mailbox holding the root folder and the usual
    /// well-known folders right under it.
    pub fn with_well_known_folders<E: ToString>(email: E) -> Self {
        let service = Self::new(email);
        {
            let mut state = service.state.borrow_mut();
            let root_id = state.folders[0].id.clone();
            for (kind, name) in WELL_KNOWN_FOLDERS {
                let mut folder = Folder::new(FolderKind::Generic).with_name(name);
                if let Some(folder_class) = kind.container_class() {
                    folder = folder.with_folder_class(folder_class);
                }
                state.insert_folder(Some(&root_id), folder, kind.distinguished_id());
            }
        }
        service
    }

    pub fn root_id(&self) -> FolderId {
        self.state.borrow().folders[0].id.clone()
    }

    /// Gets the id of the folder with the given well-known name.
    pub fn distinguished(&self, distinguished_id: &str) -> Option<FolderId> {
        self.state
            .borrow()
            .folders
            .iter()
            .find(|stored| stored.distinguished_id.as_deref() == Some(distinguished_id))
            .map(|stored| stored.id.clone())
    }

    /// Adds a folder under the given parent, optionally addressable by
    /// a well-known name.
    pub fn insert_folder(
        &self,
        parent: &FolderId,
        name: &str,
        folder_class: Option<&str>,
        distinguished_id: Option<&str>,
    ) -> Result<FolderId> {
        let mut state = self.state.borrow_mut();
        state.position(parent)?;

        let mut folder = Folder::new(FolderKind::Generic).with_name(name);
        if let Some(folder_class) = folder_class {
            folder = folder.with_folder_class(folder_class);
        }
        let id = state.insert_folder(Some(parent), folder, distinguished_id);
        debug!("inserted folder {} ({}) under {}", name, id, parent);
        Ok(id)
    }

    /// Makes the service refuse an operation on the given folder.
    pub fn deny(&self, folder: &FolderId, denial: Denial) {
        self.state
            .borrow_mut()
            .denials
            .entry(folder.clone())
            .or_default()
            .insert(denial);
    }

    pub fn add_person(&self, folder: &FolderId, person: Persona) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let idx = state.position(folder)?;
        state.folders[idx].people.push(person);
        Ok(())
    }

    /// Changes the read flag of an item.
    pub fn mark_read(&self, id: &ItemId, is_read: bool) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let (folder, updated) = state
            .folders
            .iter_mut()
            .find_map(|stored| {
                let item = stored
                    .items
                    .iter_mut()
                    .find(|item| item.id.as_ref() == Some(id))?;
                item.is_read = Some(is_read);
                Some((stored.id.clone(), item.clone()))
            })
            .ok_or_else(|| Error::ItemNotFound(id.to_string()))?;
        state.record_item_change(&folder, ChangeType::ReadFlagChange, updated);
        Ok(())
    }

    /// Sets the maximum number of events returned by a pull.
    pub fn set_events_batch_size(&self, size: usize) {
        self.state.borrow_mut().events_batch_size = size.max(1);
    }

    pub fn contains_folder(&self, id: &FolderId) -> bool {
        self.state.borrow().position(id).is_ok()
    }

    pub fn item_count(&self, folder: &FolderId) -> usize {
        let state = self.state.borrow();
        state
            .position(folder)
            .map(|idx| state.folders[idx].items.len())
            .unwrap_or(0)
    }

    fn subscribe(
        &self,
        folders: &[BaseFolderId],
        event_types: &[EventType],
        with_watermark: bool,
    ) -> Result<Vec<Result<Subscription>>> {
        let mut state = self.state.borrow_mut();

        let ids = folders
            .iter()
            .map(|folder| {
                state
                    .resolve(&self.email, folder)
                    .map(|idx| state.folders[idx].id.clone())
            })
            .collect::<Result<Vec<_>>>();
        let ids = match ids {
            Ok(ids) => ids,
            Err(err) => return Ok(vec![Err(err)]),
        };

        let subscription_id = new_id();
        state.subscriptions.insert(
            subscription_id.clone(),
            SubscriptionState {
                folders: ids,
                event_types: event_types.to_vec(),
                events: VecDeque::new(),
            },
        );
        debug!("created subscription {}", subscription_id);

        Ok(vec![Ok(Subscription {
            subscription_id,
            watermark: with_watermark.then(|| state.watermark.to_string()),
        })])
    }
}

impl Service for MemoryService {
    fn get_folders(&self, folders: &[BaseFolderId]) -> Result<Vec<Result<Folder>>> {
        let state = self.state.borrow();
        Ok(folders
            .iter()
            .map(|folder| {
                state
                    .resolve(&self.email, folder)
                    .map(|idx| state.folders[idx].folder.clone())
            })
            .collect())
    }

    fn find_folders(
        &self,
        parent: &BaseFolderId,
        traversal: Traversal,
        name: Option<&str>,
    ) -> Result<Vec<Folder>> {
        let state = self.state.borrow();
        let idx = state.resolve(&self.email, parent)?;
        let parent_id = &state.folders[idx].id;

        let folders: Vec<Folder> = match traversal {
            Traversal::Shallow => state
                .children(parent_id)
                .into_iter()
                .map(|idx| state.folders[idx].folder.clone())
                .collect(),
            Traversal::Deep => state
                .descendants(parent_id)
                .into_iter()
                .map(|idx| state.folders[idx].folder.clone())
                .collect(),
            Traversal::SoftDeleted => state
                .soft_deleted
                .iter()
                .filter(|(parent, _)| parent == parent_id)
                .map(|(_, folder)| folder.clone())
                .collect(),
        };

        Ok(folders
            .into_iter()
            .filter(|folder| name.map(|name| folder.name == name).unwrap_or(true))
            .collect())
    }

    fn create_folder(&self, parent: &BaseFolderId, folders: &[&Folder]) -> Result<Vec<FolderId>> {
        let mut state = self.state.borrow_mut();
        let idx = state.resolve(&self.email, parent)?;
        let parent_id = state.folders[idx].id.clone();

        Ok(folders
            .iter()
            .map(|folder| {
                let mut new_folder = Folder::new(FolderKind::Generic).with_name(&folder.name);
                if let Some(folder_class) = folder.folder_class() {
                    new_folder = new_folder.with_folder_class(folder_class);
                }
                new_folder.permission_set = folder.permission_set.clone();
                let id = state.insert_folder(Some(&parent_id), new_folder, None);
                info!("created folder {} ({}) under {}", folder.name, id, parent_id);
                id
            })
            .collect())
    }

    fn update_folder(&self, folders: &[(&Folder, &[&str])]) -> Result<Vec<FolderId>> {
        let mut state = self.state.borrow_mut();
        let mut ids = Vec::new();

        for (folder, fields) in folders {
            let id = folder
                .id()
                .ok_or_else(|| Error::FolderNotFound(folder.name.clone()))?;
            let idx = state.position(id)?;
            let stored = &mut state.folders[idx].folder;

            for field in fields.iter() {
                match *field {
                    "name" => stored.name = folder.name.clone(),
                    "permission_set" => stored.permission_set = folder.permission_set.clone(),
                    // the folder class cannot change once created
                    "folder_class" if stored.folder_class() == folder.folder_class() => (),
                    field => {
                        return Err(Error::ProtocolError {
                            code: "ErrorInvalidPropertySet".into(),
                            message: format!("cannot set field {}", field),
                        })
                    }
                }
            }

            let new_id = FolderId::new(&id.id, Some(new_id()));
            *stored = stored.clone().with_id(new_id.clone());
            let updated = stored.clone();
            let parent = updated.parent_id().cloned();

            state.record_folder_change(ChangeType::Update, updated);
            state.notify(EventType::Modified, &new_id, parent.as_ref(), None);
            ids.push(new_id);
        }

        Ok(ids)
    }

    fn delete_folder(&self, folders: &[BaseFolderId], delete_type: DeleteType) -> Result<()> {
        let mut state = self.state.borrow_mut();

        for folder in folders {
            let idx = state.resolve(&self.email, folder)?;
            let stored = &state.folders[idx];
            if stored.distinguished_id.is_some() {
                return Err(Error::DeleteDistinguishedFolder(folder.to_string()));
            }
            if state.is_denied(&stored.id, Denial::DeleteFolder) {
                return Err(Error::AccessDenied(folder.to_string()));
            }

            let id = stored.id.clone();
            let mut indices = vec![idx];
            indices.extend(state.descendants(&id));
            let removed = state.remove_folders(indices);
            info!("deleted {} folder(s) from {} ({})", removed.len(), folder, delete_type);

            if delete_type == DeleteType::SoftDelete {
                for stored in removed {
                    if let Some(parent) = stored.folder.parent_id().cloned() {
                        state.soft_deleted.push((parent, stored.folder));
                    }
                }
            }
        }

        Ok(())
    }

    fn empty_folder(
        &self,
        folders: &[BaseFolderId],
        delete_type: DeleteType,
        delete_sub_folders: bool,
    ) -> Result<()> {
        let mut state = self.state.borrow_mut();

        for folder in folders {
            let idx = state.resolve(&self.email, folder)?;
            let id = state.folders[idx].id.clone();
            if state.is_denied(&id, Denial::EmptyFolder) {
                return Err(Error::CannotEmptyFolder(folder.to_string()));
            }

            let descendants = state.descendants(&id);
            if delete_sub_folders
                && descendants
                    .iter()
                    .any(|idx| state.folders[*idx].distinguished_id.is_some())
            {
                return Err(Error::CannotEmptyFolder(folder.to_string()));
            }

            let items = std::mem::take(&mut state.folders[idx].items);
            for item in items {
                let deleted = Item {
                    id: item.id,
                    ..Item::default()
                };
                state.record_item_change(&id, ChangeType::Delete, deleted);
            }
            if delete_sub_folders {
                state.remove_folders(descendants);
            }
            info!("emptied folder {} ({})", folder, delete_type);
        }

        Ok(())
    }

    fn find_items(
        &self,
        folders: &[BaseFolderId],
        restriction: Option<&Restriction>,
        page_size: usize,
        offset: usize,
    ) -> Result<Vec<Item>> {
        let state = self.state.borrow();
        let indices = folders
            .iter()
            .map(|folder| state.resolve(&self.email, folder))
            .collect::<Result<Vec<_>>>()?;

        let items: Vec<Item> = indices
            .into_iter()
            .flat_map(|idx| state.folders[idx].items.iter())
            .filter(|item| restriction.map(|r| r.matches(item)).unwrap_or(true))
            .skip(offset)
            .take(page_size)
            .cloned()
            .collect();
        trace!("found items: {:#?}", items);
        Ok(items)
    }

    fn create_items(&self, folder: &BaseFolderId, items: &[Item]) -> Result<Vec<ItemId>> {
        let mut state = self.state.borrow_mut();
        let idx = state.resolve(&self.email, folder)?;
        let folder_id = state.folders[idx].id.clone();

        let mut ids = Vec::new();
        for item in items {
            let id = ItemId::new(new_id(), Some(new_id()));
            let item = Item {
                id: Some(id.clone()),
                ..item.clone()
            };
            state.folders[idx].items.push(item.clone());
            state.record_item_change(&folder_id, ChangeType::Create, item);
            ids.push(id);
        }

        Ok(ids)
    }

    fn delete_items(&self, items: &[ItemId], _delete_type: DeleteType) -> Result<()> {
        let mut state = self.state.borrow_mut();

        for id in items {
            let (folder_idx, item_idx) = state
                .folders
                .iter()
                .enumerate()
                .find_map(|(folder_idx, stored)| {
                    stored
                        .items
                        .iter()
                        .position(|item| item.id.as_ref() == Some(id))
                        .map(|item_idx| (folder_idx, item_idx))
                })
                .ok_or_else(|| Error::ItemNotFound(id.to_string()))?;

            let folder_id = state.folders[folder_idx].id.clone();
            if state.is_denied(&folder_id, Denial::DeleteItems) {
                return Err(Error::CannotDeleteObject(id.to_string()));
            }

            let item = state.folders[folder_idx].items.remove(item_idx);
            let deleted = Item {
                id: item.id,
                ..Item::default()
            };
            state.record_item_change(&folder_id, ChangeType::Delete, deleted);
        }

        Ok(())
    }

    fn find_people(&self, folder: &BaseFolderId, query: Option<&str>) -> Result<Vec<Persona>> {
        let state = self.state.borrow();
        let idx = state.resolve(&self.email, folder)?;
        let query = query.map(str::to_lowercase);

        Ok(state.folders[idx]
            .people
            .iter()
            .filter(|person| match &query {
                None => true,
                Some(query) => {
                    person.display_name.to_lowercase().contains(query)
                        || person
                            .email_address
                            .as_ref()
                            .map(|email| email.to_lowercase().contains(query))
                            .unwrap_or(false)
                }
            })
            .cloned()
            .collect())
    }

    fn sync_folder_items(
        &self,
        folder: &BaseFolderId,
        options: &SyncItemsOptions,
    ) -> Result<SyncPage<Item>> {
        let state = self.state.borrow();
        let idx = state.resolve(&self.email, folder)?;
        let folder_id = &state.folders[idx].id;

        let max_changes = options
            .max_changes_returned
            .filter(|max| *max > 0)
            .unwrap_or(DEFAULT_MAX_CHANGES);
        let mut position = parse_sync_state(options.sync_state.as_deref())?
            .min(state.item_journal.len());
        let mut changes = Vec::new();

        while position < state.item_journal.len() && changes.len() < max_changes {
            let change = &state.item_journal[position];
            position += 1;

            if change.folder != *folder_id {
                continue;
            }
            let is_ignored = change
                .item
                .id
                .as_ref()
                .map(|id| options.ignore.contains(id))
                .unwrap_or(false);
            if is_ignored {
                continue;
            }
            changes.push((
                change.change_type,
                select_item_fields(&change.item, options.only_fields.as_deref()),
            ));
        }

        debug!("synced {} item change(s) of {}", changes.len(), folder);
        Ok(SyncPage {
            changes,
            sync_state: position.to_string(),
            includes_last_item_in_range: position >= state.item_journal.len(),
        })
    }

    fn sync_folder_hierarchy(
        &self,
        folder: &BaseFolderId,
        sync_state: Option<&str>,
        _only_fields: Option<&[String]>,
    ) -> Result<SyncPage<Folder>> {
        let state = self.state.borrow();
        let idx = state.resolve(&self.email, folder)?;
        let folder_id = &state.folders[idx].id;

        let start = parse_sync_state(sync_state)?.min(state.folder_journal.len());
        let changes: Vec<(ChangeType, Folder)> = state.folder_journal[start..]
            .iter()
            .filter(|change| change.ancestors.contains(folder_id))
            .map(|change| (change.change_type, change.folder.clone()))
            .collect();

        debug!("synced {} folder change(s) under {}", changes.len(), folder);
        Ok(SyncPage {
            changes,
            sync_state: state.folder_journal.len().to_string(),
            includes_last_item_in_range: true,
        })
    }

    fn get_user_configuration(
        &self,
        folder: &BaseFolderId,
        name: &str,
        properties: UserConfigurationProperties,
    ) -> Result<UserConfiguration> {
        let state = self.state.borrow();
        let idx = state.resolve(&self.email, folder)?;
        state.folders[idx]
            .user_configs
            .get(name)
            .cloned()
            .map(|config| config.select(properties))
            .ok_or_else(|| Error::ItemNotFound(name.to_owned()))
    }

    fn create_user_configuration(
        &self,
        folder: &BaseFolderId,
        config: &UserConfiguration,
    ) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let idx = state.resolve(&self.email, folder)?;
        let configs = &mut state.folders[idx].user_configs;
        if configs.contains_key(&config.name) {
            return Err(Error::ProtocolError {
                code: "ErrorItemSave".into(),
                message: format!("user configuration {} already exists", config.name),
            });
        }
        configs.insert(config.name.clone(), config.clone());
        Ok(())
    }

    fn update_user_configuration(
        &self,
        folder: &BaseFolderId,
        config: &UserConfiguration,
    ) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let idx = state.resolve(&self.email, folder)?;
        match state.folders[idx].user_configs.get_mut(&config.name) {
            Some(stored) => {
                *stored = config.clone();
                Ok(())
            }
            None => Err(Error::ItemNotFound(config.name.clone())),
        }
    }

    fn delete_user_configuration(&self, folder: &BaseFolderId, name: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let idx = state.resolve(&self.email, folder)?;
        state.folders[idx]
            .user_configs
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::ItemNotFound(name.to_owned()))
    }

    fn subscribe_to_pull(
        &self,
        folders: &[BaseFolderId],
        event_types: &[EventType],
        _watermark: Option<&str>,
        _timeout: u32,
    ) -> Result<Vec<Result<Subscription>>> {
        self.subscribe(folders, event_types, true)
    }

    fn subscribe_to_push(
        &self,
        folders: &[BaseFolderId],
        event_types: &[EventType],
        _watermark: Option<&str>,
        _status_frequency: u32,
        _callback_url: &str,
    ) -> Result<Vec<Result<Subscription>>> {
        self.subscribe(folders, event_types, true)
    }

    fn subscribe_to_streaming(
        &self,
        folders: &[BaseFolderId],
        event_types: &[EventType],
    ) -> Result<Vec<Result<Subscription>>> {
        self.subscribe(folders, event_types, false)
    }

    fn unsubscribe(&self, subscription_id: &str) -> Result<()> {
        self.state
            .borrow_mut()
            .subscriptions
            .remove(subscription_id)
            .map(|_| ())
            .ok_or_else(|| Error::InvalidSubscription(subscription_id.to_owned()))
    }

    fn get_events(&self, subscription_id: &str, watermark: &str) -> Result<Notification> {
        let mut state = self.state.borrow_mut();
        let batch_size = state.events_batch_size;
        let current_watermark = state.watermark.to_string();
        let subscription = state
            .subscriptions
            .get_mut(subscription_id)
            .ok_or_else(|| Error::InvalidSubscription(subscription_id.to_owned()))?;

        let count = batch_size.min(subscription.events.len());
        let mut events: Vec<Event> = subscription.events.drain(..count).collect();
        if events.is_empty() {
            events.push(Event {
                event_type: EventType::Status,
                watermark: Some(current_watermark),
                timestamp: Some(Utc::now()),
                item_id: None,
                folder_id: None,
                parent_folder_id: None,
            });
        }

        Ok(Notification {
            subscription_id: subscription_id.to_owned(),
            previous_watermark: Some(watermark.to_owned()),
            more_events: !subscription.events.is_empty(),
            events,
        })
    }

    fn get_streaming_events<'a>(
        &'a self,
        subscription_ids: &[String],
        connection_timeout: u32,
        request_timeout: Duration,
    ) -> Result<Box<dyn NotificationStream + 'a>> {
        debug!(
            "opening stream for {} minute(s), request timeout {:?}",
            connection_timeout, request_timeout
        );
        let mut state = self.state.borrow_mut();
        let mut notifications = Vec::new();
        let mut error_subscription_ids = Vec::new();

        for subscription_id in subscription_ids {
            match state.subscriptions.get_mut(subscription_id) {
                Some(subscription) if !subscription.events.is_empty() => {
                    notifications.push(Notification {
                        subscription_id: subscription_id.clone(),
                        previous_watermark: None,
                        more_events: false,
                        events: subscription.events.drain(..).collect(),
                    })
                }
                Some(_) => (),
                None => error_subscription_ids.push(subscription_id.clone()),
            }
        }

        Ok(Box::new(MemoryStream {
            notifications: notifications.into_iter(),
            error_subscription_ids,
        }))
    }
}
