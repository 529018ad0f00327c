//! Service module.
//!
//! This module exposes the service trait, which is the seam between
//! the folder engine and the request/response layer talking to the
//! server. Implementations own the wire encoding, the transport and
//! the authentication; the engine only deals with the structured
//! parameters and results.

use std::{result, time::Duration};
use thiserror::Error;

use crate::{
    BaseFolderId, DeleteType, EventType, Folder, FolderId, Item, ItemId, Notification,
    NotificationStream, Persona, Restriction, Subscription, SyncItemsOptions, SyncPage,
    Traversal, UserConfiguration, UserConfigurationProperties,
};

/// Represents the protocol errors a service call can fail with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("cannot find folder {0}")]
    FolderNotFound(String),
    #[error("cannot find item {0}")]
    ItemNotFound(String),
    #[error("cannot find public folder replica for {0}")]
    NoPublicFolderReplicaAvailable(String),
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("cannot empty folder {0}")]
    CannotEmptyFolder(String),
    #[error("cannot delete object {0}")]
    CannotDeleteObject(String),
    #[error("cannot delete distinguished folder {0}")]
    DeleteDistinguishedFolder(String),
    #[error("invalid subscription {0}")]
    InvalidSubscription(String),
    #[error("server responded with {code}: {message}")]
    ProtocolError { code: String, message: String },
    #[error("cannot reach server: {0}")]
    TransportError(String),
}

impl Error {
    /// Tells if the error means the targeted folder does not exist
    /// (or is not reachable) on the server.
    pub fn is_missing_folder(&self) -> bool {
        matches!(
            self,
            Self::FolderNotFound(_)
                | Self::ItemNotFound(_)
                | Self::NoPublicFolderReplicaAvailable(_)
        )
    }
}

pub type Result<T> = result::Result<T, Error>;

/// Represents the calls the folder engine makes to the server.
///
/// Calls taking several folders answer with one result per folder,
/// in the same order. Per-folder failures are returned inside the
/// list, the outer result is reserved to failures of the whole call.
pub trait Service {
    fn get_folders(&self, folders: &[BaseFolderId]) -> Result<Vec<Result<Folder>>>;
    fn find_folders(
        &self,
        parent: &BaseFolderId,
        traversal: Traversal,
        name: Option<&str>,
    ) -> Result<Vec<Folder>>;
    fn create_folder(&self, parent: &BaseFolderId, folders: &[&Folder]) -> Result<Vec<FolderId>>;
    fn update_folder(&self, folders: &[(&Folder, &[&str])]) -> Result<Vec<FolderId>>;
    fn delete_folder(&self, folders: &[BaseFolderId], delete_type: DeleteType) -> Result<()>;
    fn empty_folder(
        &self,
        folders: &[BaseFolderId],
        delete_type: DeleteType,
        delete_sub_folders: bool,
    ) -> Result<()>;

    fn find_items(
        &self,
        folders: &[BaseFolderId],
        restriction: Option<&Restriction>,
        page_size: usize,
        offset: usize,
    ) -> Result<Vec<Item>>;
    fn create_items(&self, folder: &BaseFolderId, items: &[Item]) -> Result<Vec<ItemId>>;
    fn delete_items(&self, items: &[ItemId], delete_type: DeleteType) -> Result<()>;
    fn find_people(&self, folder: &BaseFolderId, query: Option<&str>) -> Result<Vec<Persona>>;

    fn sync_folder_items(
        &self,
        folder: &BaseFolderId,
        options: &SyncItemsOptions,
    ) -> Result<SyncPage<Item>>;
    fn sync_folder_hierarchy(
        &self,
        folder: &BaseFolderId,
        sync_state: Option<&str>,
        only_fields: Option<&[String]>,
    ) -> Result<SyncPage<Folder>>;

    fn get_user_configuration(
        &self,
        folder: &BaseFolderId,
        name: &str,
        properties: UserConfigurationProperties,
    ) -> Result<UserConfiguration>;
    fn create_user_configuration(
        &self,
        folder: &BaseFolderId,
        config: &UserConfiguration,
    ) -> Result<()>;
    fn update_user_configuration(
        &self,
        folder: &BaseFolderId,
        config: &UserConfiguration,
    ) -> Result<()>;
    fn delete_user_configuration(&self, folder: &BaseFolderId, name: &str) -> Result<()>;

    /// Creates a pull subscription. The `timeout` is in minutes and
    /// is reset each time events are pulled.
    fn subscribe_to_pull(
        &self,
        folders: &[BaseFolderId],
        event_types: &[EventType],
        watermark: Option<&str>,
        timeout: u32,
    ) -> Result<Vec<Result<Subscription>>>;
    /// Creates a push subscription. The server calls `callback_url`
    /// every `status_frequency` minutes.
    fn subscribe_to_push(
        &self,
        folders: &[BaseFolderId],
        event_types: &[EventType],
        watermark: Option<&str>,
        status_frequency: u32,
        callback_url: &str,
    ) -> Result<Vec<Result<Subscription>>>;
    fn subscribe_to_streaming(
        &self,
        folders: &[BaseFolderId],
        event_types: &[EventType],
    ) -> Result<Vec<Result<Subscription>>>;
    fn unsubscribe(&self, subscription_id: &str) -> Result<()>;
    fn get_events(&self, subscription_id: &str, watermark: &str) -> Result<Notification>;
    /// Opens a streaming connection. The server keeps it open for
    /// `connection_timeout` minutes, the whole request must not last
    /// more than `request_timeout`.
    fn get_streaming_events<'a>(
        &'a self,
        subscription_ids: &[String],
        connection_timeout: u32,
        request_timeout: Duration,
    ) -> Result<Box<dyn NotificationStream + 'a>>;
}
