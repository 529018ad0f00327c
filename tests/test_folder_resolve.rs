use log::LevelFilter;
use std::{borrow::Cow, cell::Cell, time::Duration};

use ews_folder_lib::{
    folder, service, AccountConfig, BaseFolderId, DeleteType, EventType, Folder,
    FolderCollection, FolderId, FolderKind, Item, ItemId, Notification, NotificationStream,
    Persona, Restriction, Root, Service, Subscription, SyncItemsOptions, SyncPage, Traversal,
    UserConfiguration, UserConfigurationProperties,
};

fn init_logger() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(LevelFilter::Debug)
        .try_init();
}

fn account() -> AccountConfig {
    AccountConfig {
        name: "account".into(),
        primary_smtp_address: "bob@localhost".into(),
        ..AccountConfig::default()
    }
}

fn unreachable() -> service::Error {
    service::Error::TransportError("connection refused".into())
}

/// Answers every folder lookup with a fixed number of folders, and
/// fails every other call.
struct StubService {
    results: usize,
    request_timeout: Cell<Option<Duration>>,
}

impl StubService {
    fn new(results: usize) -> Self {
        Self {
            results,
            request_timeout: Cell::new(None),
        }
    }
}

impl Service for StubService {
    fn get_folders(&self, _folders: &[BaseFolderId]) -> service::Result<Vec<service::Result<Folder>>> {
        Ok((0..self.results)
            .map(|i| {
                Ok(Folder::new(FolderKind::Generic)
                    .with_id(FolderId::new(format!("f{}", i), None))
                    .with_name(format!("Folder {}", i)))
            })
            .collect())
    }

    fn find_folders(
        &self,
        _parent: &BaseFolderId,
        _traversal: Traversal,
        _name: Option<&str>,
    ) -> service::Result<Vec<Folder>> {
        Err(unreachable())
    }

    fn create_folder(&self, _parent: &BaseFolderId, _folders: &[&Folder]) -> service::Result<Vec<FolderId>> {
        Err(unreachable())
    }

    fn update_folder(&self, _folders: &[(&Folder, &[&str])]) -> service::Result<Vec<FolderId>> {
        Err(unreachable())
    }

    fn delete_folder(&self, _folders: &[BaseFolderId], _delete_type: DeleteType) -> service::Result<()> {
        Err(unreachable())
    }

    fn empty_folder(
        &self,
        _folders: &[BaseFolderId],
        _delete_type: DeleteType,
        _delete_sub_folders: bool,
    ) -> service::Result<()> {
        Err(unreachable())
    }

    fn find_items(
        &self,
        _folders: &[BaseFolderId],
        _restriction: Option<&Restriction>,
        _page_size: usize,
        _offset: usize,
    ) -> service::Result<Vec<Item>> {
        Err(unreachable())
    }

    fn create_items(&self, _folder: &BaseFolderId, _items: &[Item]) -> service::Result<Vec<ItemId>> {
        Err(unreachable())
    }

    fn delete_items(&self, _items: &[ItemId], _delete_type: DeleteType) -> service::Result<()> {
        Err(unreachable())
    }

    fn find_people(&self, _folder: &BaseFolderId, _query: Option<&str>) -> service::Result<Vec<Persona>> {
        Err(unreachable())
    }

    fn sync_folder_items(
        &self,
        _folder: &BaseFolderId,
        _options: &SyncItemsOptions,
    ) -> service::Result<SyncPage<Item>> {
        Err(unreachable())
    }

    fn sync_folder_hierarchy(
        &self,
        _folder: &BaseFolderId,
        _sync_state: Option<&str>,
        _only_fields: Option<&[String]>,
    ) -> service::Result<SyncPage<Folder>> {
        Err(unreachable())
    }

    fn get_user_configuration(
        &self,
        _folder: &BaseFolderId,
        _name: &str,
        _properties: UserConfigurationProperties,
    ) -> service::Result<UserConfiguration> {
        Err(unreachable())
    }

    fn create_user_configuration(
        &self,
        _folder: &BaseFolderId,
        _config: &UserConfiguration,
    ) -> service::Result<()> {
        Err(unreachable())
    }

    fn update_user_configuration(
        &self,
        _folder: &BaseFolderId,
        _config: &UserConfiguration,
    ) -> service::Result<()> {
        Err(unreachable())
    }

    fn delete_user_configuration(&self, _folder: &BaseFolderId, _name: &str) -> service::Result<()> {
        Err(unreachable())
    }

    fn subscribe_to_pull(
        &self,
        _folders: &[BaseFolderId],
        _event_types: &[EventType],
        _watermark: Option<&str>,
        _timeout: u32,
    ) -> service::Result<Vec<service::Result<Subscription>>> {
        Err(unreachable())
    }

    fn subscribe_to_push(
        &self,
        _folders: &[BaseFolderId],
        _event_types: &[EventType],
        _watermark: Option<&str>,
        _status_frequency: u32,
        _callback_url: &str,
    ) -> service::Result<Vec<service::Result<Subscription>>> {
        Err(unreachable())
    }

    fn subscribe_to_streaming(
        &self,
        _folders: &[BaseFolderId],
        _event_types: &[EventType],
    ) -> service::Result<Vec<service::Result<Subscription>>> {
        Err(unreachable())
    }

    fn unsubscribe(&self, _subscription_id: &str) -> service::Result<()> {
        Err(unreachable())
    }

    fn get_events(&self, _subscription_id: &str, _watermark: &str) -> service::Result<Notification> {
        Err(unreachable())
    }

    fn get_streaming_events<'a>(
        &'a self,
        _subscription_ids: &[String],
        _connection_timeout: u32,
        request_timeout: Duration,
    ) -> service::Result<Box<dyn NotificationStream + 'a>> {
        self.request_timeout.set(Some(request_timeout));
        Err(unreachable())
    }
}

fn top() -> Folder {
    Folder::new(FolderKind::Root)
        .with_id(FolderId::new("root", None))
        .with_name("root")
}

#[test]
fn test_resolve_result_count() {
    init_logger();
    let reference = Folder::new(FolderKind::Generic).with_id(FolderId::new("f1", None));

    let none = StubService::new(0);
    let root = Root::new(Cow::Owned(account()), &none, top());
    assert!(matches!(
        Folder::resolve(&root, FolderKind::Generic, reference.clone()),
        Err(folder::Error::FolderNotFound(id)) if id == "f1"
    ));

    let many = StubService::new(2);
    let root = Root::new(Cow::Owned(account()), &many, top());
    assert!(matches!(
        Folder::resolve(&root, FolderKind::Generic, reference.clone()),
        Err(folder::Error::UnexpectedResultCount(2))
    ));
    assert!(matches!(
        Root::from_service(Cow::Owned(account()), &many),
        Err(folder::Error::UnexpectedResultCount(2))
    ));

    let one = StubService::new(1);
    let root = Root::new(Cow::Owned(account()), &one, top());
    let folder = Folder::resolve(&root, FolderKind::Generic, reference).unwrap();
    assert_eq!("Folder 0", folder.name);
    let inbox = Folder::get_distinguished(&root, FolderKind::Inbox).unwrap();
    assert_eq!(FolderKind::Inbox, inbox.kind());
    assert!(inbox.is_distinguished);
}

#[test]
fn test_service_errors_propagate() {
    init_logger();
    let stub = StubService::new(0);
    let root = Root::new(Cow::Owned(account()), &stub, top());

    assert!(matches!(
        root.get_children(root.folder()),
        Err(folder::Error::ServiceError(service::Error::TransportError(_)))
    ));
    assert!(!root.is_cached(root.folder().id().unwrap()));

    let mut glob = root.folder().glob(&root, "*");
    assert!(matches!(
        glob.next(),
        Some(Err(folder::Error::ServiceError(service::Error::TransportError(_))))
    ));
    assert!(glob.next().is_none());

    let mut walk = root.folder().walk(&root);
    assert!(matches!(
        walk.next(),
        Some(Err(folder::Error::ServiceError(_)))
    ));

    assert!(matches!(
        root.folder().wipe(&root, None),
        Err(folder::Error::ServiceError(_))
    ));
    assert!(matches!(
        root.folder().test_access(&root),
        Err(folder::Error::ItemError(_))
    ));
}

#[test]
fn test_single_folder_operations() {
    init_logger();
    let stub = StubService::new(0);
    let root = Root::new(Cow::Owned(account()), &stub, top());

    let folders = vec![
        Folder::new(FolderKind::Messages).with_id(FolderId::new("f1", None)),
        Folder::new(FolderKind::Messages).with_id(FolderId::new("f2", None)),
    ];
    let collection = FolderCollection::new(&root, folders);
    assert!(matches!(
        collection.sync_items(SyncItemsOptions::default()),
        Err(folder::Error::SingleFolderRequired(2))
    ));
    assert!(matches!(
        collection.sync_hierarchy(None, None),
        Err(folder::Error::SingleFolderRequired(2))
    ));

    // syncs are lazy, nothing is sent before the first step
    let single = FolderCollection::new(&root, vec![top()]);
    let mut steps = single.sync_items(SyncItemsOptions::default()).unwrap();
    assert!(matches!(
        steps.next(),
        Some(Err(folder::Error::ServiceError(service::Error::TransportError(_))))
    ));
    assert!(steps.next().is_none());
}

#[test]
fn test_streaming_request_timeout() {
    init_logger();
    let stub = StubService::new(0);
    let root = Root::new(Cow::Owned(account()), &stub, top());

    let events = root
        .folder()
        .get_streaming_events(&root, &["s1".to_owned()], 1, None);
    assert!(events.is_err());
    // one minute of connection plus the grace period
    assert_eq!(Some(Duration::from_secs(120)), stub.request_timeout.get());
}
