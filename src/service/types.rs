//! Service types module.
//!
//! This module contains the structured parameters and results
//! exchanged with the service layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

use crate::{ChangeType, FolderId, ItemId};

use super::Result;

/// Represents the depth of a folder search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Traversal {
    Shallow,
    Deep,
    SoftDeleted,
}

/// Represents which items an item synchronization covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncScope {
    NormalItems,
    NormalAndAssociatedItems,
}

/// Represents the parameters of an item synchronization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncItemsOptions {
    /// Represents the cursor to resume from. `None` starts a full
    /// synchronization.
    pub sync_state: Option<String>,
    /// Represents the item fields to fetch, all of them when `None`.
    pub only_fields: Option<Vec<String>>,
    /// Represents the items to leave out of the synchronization.
    pub ignore: Vec<ItemId>,
    /// Represents the maximum number of changes per round trip.
    pub max_changes_returned: Option<usize>,
    pub sync_scope: Option<SyncScope>,
}

/// Represents one round trip of a delta synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPage<T> {
    pub changes: Vec<(ChangeType, T)>,
    /// Represents the cursor positioned right after the changes of
    /// this page.
    pub sync_state: String,
    /// Tells if the server has no more changes after this page.
    pub includes_last_item_in_range: bool,
}

/// Represents the kinds of events a subscription can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    Copied,
    Created,
    Deleted,
    Modified,
    Moved,
    NewMail,
    FreeBusyChanged,
    Status,
}

impl EventType {
    /// Event types subscribed to when none are given.
    pub const ALL: [EventType; 7] = [
        EventType::Copied,
        EventType::Created,
        EventType::Deleted,
        EventType::Modified,
        EventType::Moved,
        EventType::NewMail,
        EventType::FreeBusyChanged,
    ];
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Copied => write!(f, "CopiedEvent"),
            Self::Created => write!(f, "CreatedEvent"),
            Self::Deleted => write!(f, "DeletedEvent"),
            Self::Modified => write!(f, "ModifiedEvent"),
            Self::Moved => write!(f, "MovedEvent"),
            Self::NewMail => write!(f, "NewMailEvent"),
            Self::FreeBusyChanged => write!(f, "FreeBusyChangedEvent"),
            Self::Status => write!(f, "StatusEvent"),
        }
    }
}

/// Represents a single event of a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: EventType,
    /// Represents the watermark positioned right after this event.
    pub watermark: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub item_id: Option<ItemId>,
    pub folder_id: Option<FolderId>,
    pub parent_folder_id: Option<FolderId>,
}

/// Represents a batch of events delivered for one subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub subscription_id: String,
    pub previous_watermark: Option<String>,
    /// Tells if the server holds more events for the subscription.
    pub more_events: bool,
    pub events: Vec<Event>,
}

/// Represents a subscription handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub subscription_id: String,
    /// Represents the watermark to start pulling events from. Streaming
    /// subscriptions have none.
    pub watermark: Option<String>,
}

/// Represents the notification stream of a streaming subscription.
///
/// The stream ends when the server closes the connection. Erroneous
/// subscription ids reported by the server along the way are kept
/// aside and exposed once the stream is consumed.
pub trait NotificationStream: Iterator<Item = Result<Notification>> {
    fn error_subscription_ids(&self) -> Vec<String>;
}

/// Represents the parts of a user configuration object to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserConfigurationProperties {
    Id,
    Dictionary,
    XmlData,
    BinaryData,
    All,
}

impl Default for UserConfigurationProperties {
    fn default() -> Self {
        Self::All
    }
}

/// Represents a user configuration object stored on a folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfiguration {
    pub name: String,
    pub dictionary: Option<BTreeMap<String, String>>,
    pub xml_data: Option<Vec<u8>>,
    pub binary_data: Option<Vec<u8>>,
}

impl UserConfiguration {
    pub fn new<N: ToString>(name: N) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Keeps only the parts selected by the given properties.
    pub fn select(mut self, properties: UserConfigurationProperties) -> Self {
        use UserConfigurationProperties::*;
        if !matches!(properties, Dictionary | All) {
            self.dictionary = None;
        }
        if !matches!(properties, XmlData | All) {
            self.xml_data = None;
        }
        if !matches!(properties, BinaryData | All) {
            self.binary_data = None;
        }
        self
    }
}
