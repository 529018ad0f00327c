mod service;
pub mod types;

#[cfg(feature = "memory-service")]
pub mod memory;

pub use self::service::{Error, Result, Service};
pub use self::types::{
    Event, EventType, Notification, NotificationStream, Subscription, SyncItemsOptions,
    SyncPage, SyncScope, Traversal, UserConfiguration, UserConfigurationProperties,
};
#[cfg(feature = "memory-service")]
pub use self::memory::{Denial, MemoryService};
