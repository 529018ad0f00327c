pub mod account;
pub use account::{
    AccountConfig, Build, DEFAULT_LOCALE, DEFAULT_PAGE_SIZE, EXCHANGE_2007, EXCHANGE_2007_SP1,
    EXCHANGE_2010, EXCHANGE_2010_SP1, EXCHANGE_2013, EXCHANGE_2016,
};

pub mod service;
pub use service::{
    Event, EventType, Notification, NotificationStream, Service, Subscription, SyncItemsOptions,
    SyncPage, SyncScope, Traversal, UserConfiguration, UserConfigurationProperties,
};
#[cfg(feature = "memory-service")]
pub use service::{Denial, MemoryService};

pub mod domain;
pub use domain::{folder, item};
pub use domain::folder::{
    BaseFolderId, DistinguishedFolderId, EffectiveRights, Events, FieldDescriptor, Folder,
    FolderCollection, FolderId, FolderKind, FolderSync, Glob, Mailbox, Pattern, Permission,
    PermissionSet, Root, StreamingEvents, SyncHierarchy, SyncItems, SyncStep, SyncSteps, Walk,
    FIELDS, MAX_WIPE_DEPTH,
};
pub use domain::item::{
    ChangeType, DeleteType, Item, ItemId, ItemQuery, PeopleQuery, Persona, Restriction,
};
