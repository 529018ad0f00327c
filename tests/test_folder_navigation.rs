#[cfg(feature = "memory-service")]
use log::LevelFilter;
#[cfg(feature = "memory-service")]
use std::{borrow::Cow, collections::HashSet};

#[cfg(feature = "memory-service")]
use std::time::Duration;

#[cfg(feature = "memory-service")]
use ews_folder_lib::{
    folder, service, AccountConfig, BaseFolderId, DeleteType, Denial, EventType, Folder,
    FolderId, FolderKind, Item, ItemId, MemoryService, Notification, NotificationStream, Persona,
    Restriction, Root, Service, Subscription, SyncItemsOptions, SyncPage, Traversal,
    UserConfiguration, UserConfigurationProperties, MAX_WIPE_DEPTH,
};

#[cfg(feature = "memory-service")]
fn init_logger() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(LevelFilter::Debug)
        .try_init();
}

#[cfg(feature = "memory-service")]
fn account() -> AccountConfig {
    AccountConfig {
        name: "account".into(),
        primary_smtp_address: "bob@localhost".into(),
        ..AccountConfig::default()
    }
}

#[cfg(feature = "memory-service")]
struct Tree {
    service: MemoryService,
    a: FolderId,
    b: FolderId,
    c: FolderId,
}

// root -> A -> {B, C}, B being the well-known notes folder
#[cfg(feature = "memory-service")]
fn tree() -> Tree {
    let service = MemoryService::new("bob@localhost");
    let root_id = service.root_id();
    let a = service
        .insert_folder(&root_id, "A", Some("IPF.Note"), None)
        .unwrap();
    let b = service
        .insert_folder(&a, "B", Some("IPF.StickyNote"), Some("notes"))
        .unwrap();
    let c = service.insert_folder(&a, "C", Some("IPF.Note"), None).unwrap();
    Tree { service, a, b, c }
}

#[cfg(feature = "memory-service")]
fn names(folders: impl Iterator<Item = folder::Result<Folder>>) -> Vec<String> {
    folders.map(|folder| folder.unwrap().name).collect()
}

#[cfg(feature = "memory-service")]
#[test]
fn test_glob() {
    init_logger();
    let tree = tree();
    let account = account();
    let root = Root::from_service(Cow::Borrowed(&account), &tree.service).unwrap();
    let top = root.folder();

    assert_eq!(vec!["A", "B", "C"], names(top.glob(&root, "A/**")));
    assert_eq!(vec!["B"], names(top.glob(&root, "a/b")));
    assert_eq!(vec!["C"], names(top.glob(&root, "A/[c]")));
    assert_eq!(vec!["B", "C"], names(top.glob(&root, "A/?")));
    assert_eq!(vec!["A"], names(top.glob(&root, "")));
    assert_eq!(vec!["A"], names(top.glob(&root, "A/..")));
    assert_eq!(vec!["B"], names(top.glob(&root, "**/A/b")));
    assert!(names(top.glob(&root, "X/*")).is_empty());

    let folder_b = root.get_path("A/B").unwrap();
    assert_eq!(vec!["A"], names(folder_b.glob(&root, "/*")));
    assert_eq!(vec!["B", "C"], names(folder_b.glob(&root, "../*")));

    let mut glob = top.glob(&root, "..");
    assert!(matches!(glob.next(), Some(Err(folder::Error::AlreadyAtTop))));
    assert!(glob.next().is_none());

    // globbing any depth equals filtering the walk by name
    let globbed: HashSet<FolderId> = top
        .glob(&root, "**/c")
        .map(|folder| folder.unwrap().id().cloned().unwrap())
        .collect();
    let walked: HashSet<FolderId> = top
        .walk(&root)
        .map(|folder| folder.unwrap())
        .filter(|folder| folder.name.to_lowercase() == "c")
        .map(|folder| folder.id().cloned().unwrap())
        .collect();
    assert_eq!(walked, globbed);
    assert_eq!(HashSet::from([tree.c.clone()]), globbed);
}

#[cfg(feature = "memory-service")]
#[test]
fn test_walk_and_tree() {
    init_logger();
    let tree = tree();
    let account = account();
    let root = Root::from_service(Cow::Borrowed(&account), &tree.service).unwrap();

    assert_eq!(vec!["A", "B", "C"], names(root.folder().walk(&root)));
    // walks are restartable
    assert_eq!(vec!["A", "B", "C"], names(root.folder().walk(&root)));

    assert_eq!(
        "root\n└── A\n    ├── B\n    └── C",
        root.folder().tree(&root).unwrap()
    );

    tree.service
        .insert_folder(&tree.service.root_id(), "0-first", None, None)
        .unwrap();
    root.clear_cache();
    assert_eq!(
        "root\n├── 0-first\n└── A\n    ├── B\n    └── C",
        root.folder().tree(&root).unwrap()
    );
}

#[cfg(feature = "memory-service")]
#[test]
fn test_parts_and_children() {
    init_logger();
    let tree = tree();
    let account = account();
    let root = Root::from_service(Cow::Borrowed(&account), &tree.service).unwrap();

    let folder_b = root.get_path("/A/B").unwrap();
    assert_eq!(Some(&tree.b), folder_b.id());
    assert_eq!(FolderKind::Notes, folder_b.kind());
    assert!(folder_b.is_distinguished);
    assert!(!folder_b.is_deletable());

    let parts = folder_b.parts(&root).unwrap();
    assert_eq!(3, parts.len());
    assert_eq!(root.folder().id(), parts[0].id());
    assert_eq!(None, parts[0].parent(&root).unwrap());
    assert_eq!(&folder_b, &parts[2]);
    assert_eq!("/root/A/B", folder_b.absolute(&root).unwrap());

    let folder_a = folder_b.child(&root, "..").unwrap();
    assert_eq!(Some(&tree.a), folder_a.id());
    assert_eq!(FolderKind::Messages, folder_a.kind());
    assert_eq!(folder_a, folder_a.child(&root, ".").unwrap());
    assert_eq!(
        vec!["B", "C"],
        folder_a
            .children(&root)
            .unwrap()
            .folders()
            .iter()
            .map(|folder| folder.name.clone())
            .collect::<Vec<_>>()
    );

    assert!(matches!(
        root.folder().child(&root, ".."),
        Err(folder::Error::AlreadyAtTop)
    ));
    assert!(matches!(
        folder_a.child(&root, "c"),
        Err(folder::Error::FolderNotFound(name)) if name == "c"
    ));

    let folder_c = folder_a.child_uncached(&root, "C").unwrap();
    assert_eq!(Some(&tree.c), folder_c.id());
    assert!(matches!(
        folder_a.child_uncached(&root, ".."),
        Err(folder::Error::ParentWithoutCache)
    ));
    assert!(matches!(
        folder_a.child_uncached(&root, "Z"),
        Err(folder::Error::FolderNotFound(_))
    ));
}

#[cfg(feature = "memory-service")]
#[test]
fn test_self_parent_is_top() {
    init_logger();
    let tree = tree();
    let account = account();
    let root = Root::from_service(Cow::Borrowed(&account), &tree.service).unwrap();

    let mut folder_a = root.get_path("A").unwrap();
    folder_a.parent_folder_id = folder_a.id().cloned();
    root.update_folder(&folder_a).unwrap();

    assert_eq!(None, folder_a.parent(&root).unwrap());
    assert_eq!(1, folder_a.parts(&root).unwrap().len());
    assert_eq!("/A", folder_a.absolute(&root).unwrap());
}

#[cfg(feature = "memory-service")]
#[test]
fn test_wipe_keeps_distinguished_folders() {
    init_logger();
    let tree = tree();
    let account = account();
    let root = Root::from_service(Cow::Borrowed(&account), &tree.service).unwrap();

    let folder_c = root.get_path("A/C").unwrap();
    folder_c
        .bulk_create(&root, &[Item::default(), Item::default()])
        .unwrap();
    assert_eq!(2, tree.service.item_count(&tree.c));

    let folder_a = root.get_path("A").unwrap();
    folder_a.wipe(&root, None).unwrap();

    assert!(tree.service.contains_folder(&tree.a));
    assert!(tree.service.contains_folder(&tree.b));
    assert!(!tree.service.contains_folder(&tree.c));
    assert_eq!(vec!["B"], names(folder_a.glob(&root, "*")));
}

#[cfg(feature = "memory-service")]
#[test]
fn test_wipe_falls_back_to_items() {
    init_logger();
    let tree = tree();
    let account = account();
    let root = Root::from_service(Cow::Borrowed(&account), &tree.service).unwrap();

    tree.service.deny(&tree.c, Denial::EmptyFolder);
    tree.service.deny(&tree.c, Denial::DeleteFolder);
    let folder_c = root.get_path("A/C").unwrap();
    folder_c.bulk_create(&root, &[Item::default()]).unwrap();

    // items are deleted one by one, the refused folder deletion still
    // fails the wipe
    let folder_a = root.get_path("A").unwrap();
    assert!(matches!(
        folder_a.wipe(&root, None),
        Err(folder::Error::ServiceError(ews_folder_lib::service::Error::AccessDenied(_)))
    ));
    assert_eq!(0, tree.service.item_count(&tree.c));
    assert!(tree.service.contains_folder(&tree.c));
}

#[cfg(feature = "memory-service")]
#[test]
fn test_wipe_max_depth() {
    init_logger();
    let service = MemoryService::new("bob@localhost");
    let mut parent = service.root_id();
    let mut ids = Vec::new();
    for level in 0..=MAX_WIPE_DEPTH + 1 {
        let id = service
            .insert_folder(&parent, &format!("F{}", level), Some("IPF.Note"), None)
            .unwrap();
        service.deny(&id, Denial::EmptyFolder);
        ids.push(id.clone());
        parent = id;
    }

    let account = account();
    let root = Root::from_service(Cow::Borrowed(&account), &service).unwrap();
    let top = root.get_path("F0").unwrap();

    assert!(matches!(
        top.wipe(&root, None),
        Err(folder::Error::WipeMaxDepthError(MAX_WIPE_DEPTH))
    ));
    for id in &ids {
        assert!(service.contains_folder(id));
    }
}

#[cfg(feature = "memory-service")]
#[test]
fn test_wipe_cycle() {
    init_logger();
    let service = MemoryService::new("bob@localhost");
    let a = service
        .insert_folder(&service.root_id(), "A", Some("IPF.Note"), None)
        .unwrap();
    let c = service.insert_folder(&a, "C", Some("IPF.Note"), None).unwrap();
    service.deny(&a, Denial::EmptyFolder);
    service.deny(&c, Denial::EmptyFolder);

    let account = account();
    let root = Root::from_service(Cow::Borrowed(&account), &service).unwrap();

    // A becomes a child of its own child in the cache only
    let mut folder_a = root.get_path("A").unwrap();
    let folder_c = root.get_path("A/C").unwrap();
    folder_a.parent_folder_id = folder_c.id().cloned();
    root.update_folder(&folder_a).unwrap();

    assert!(matches!(
        folder_a.wipe(&root, None),
        Err(folder::Error::WipeCycleError(_))
    ));
    assert!(service.contains_folder(&a));
    assert!(service.contains_folder(&c));
}

#[cfg(feature = "memory-service")]
#[test]
fn test_tree_cycle() {
    init_logger();
    let service = MemoryService::new("bob@localhost");
    let a = service
        .insert_folder(&service.root_id(), "A", Some("IPF.Note"), None)
        .unwrap();
    service.insert_folder(&a, "C", Some("IPF.Note"), None).unwrap();

    let account = account();
    let root = Root::from_service(Cow::Borrowed(&account), &service).unwrap();

    let mut folder_a = root.get_path("A").unwrap();
    let folder_c = root.get_path("A/C").unwrap();
    folder_a.parent_folder_id = folder_c.id().cloned();
    root.update_folder(&folder_a).unwrap();

    assert_eq!("A\n└── C", folder_a.tree(&root).unwrap());
    assert_eq!("C", folder_c.tree(&root).unwrap());
}

#[cfg(feature = "memory-service")]
#[test]
fn test_wipe_refused_item_deletion() {
    init_logger();
    let tree = tree();
    let account = account();
    let root = Root::from_service(Cow::Borrowed(&account), &tree.service).unwrap();

    tree.service.deny(&tree.c, Denial::EmptyFolder);
    tree.service.deny(&tree.c, Denial::DeleteItems);
    let folder_c = root.get_path("A/C").unwrap();
    folder_c
        .bulk_create(&root, &[Item::default(), Item::default()])
        .unwrap();

    // the items stay, the folder itself can still be deleted
    let folder_a = root.get_path("A").unwrap();
    folder_a.wipe(&root, None).unwrap();
    assert!(!tree.service.contains_folder(&tree.c));
    assert!(tree.service.contains_folder(&tree.b));
    assert!(tree.service.contains_folder(&tree.a));
}

#[cfg(feature = "memory-service")]
#[test]
fn test_wipe_keeps_unknown_distinguished_folders() {
    init_logger();
    let tree = tree();
    let d = tree
        .service
        .insert_folder(&tree.a, "D", Some("IPF.Note"), Some("recoverableitemsroot"))
        .unwrap();
    let account = account();
    let root = Root::from_service(Cow::Borrowed(&account), &tree.service).unwrap();

    // not a well-known folder, the cache sees it as deletable
    let folder_d = root.get_path("A/D").unwrap();
    assert!(folder_d.is_deletable());

    let folder_a = root.get_path("A").unwrap();
    folder_a.wipe(&root, None).unwrap();
    assert!(tree.service.contains_folder(&d));
    assert!(tree.service.contains_folder(&tree.b));
    assert!(!tree.service.contains_folder(&tree.c));
}

/// Delegates to a memory service, except item deletions which always
/// fail as if the items were already gone.
#[cfg(feature = "memory-service")]
struct VanishingItems<'a>(&'a MemoryService);

#[cfg(feature = "memory-service")]
impl<'a> Service for VanishingItems<'a> {
    fn get_folders(&self, folders: &[BaseFolderId]) -> service::Result<Vec<service::Result<Folder>>> {
        self.0.get_folders(folders)
    }

    fn find_folders(
        &self,
        parent: &BaseFolderId,
        traversal: Traversal,
        name: Option<&str>,
    ) -> service::Result<Vec<Folder>> {
        self.0.find_folders(parent, traversal, name)
    }

    fn create_folder(&self, parent: &BaseFolderId, folders: &[&Folder]) -> service::Result<Vec<FolderId>> {
        self.0.create_folder(parent, folders)
    }

    fn update_folder(&self, folders: &[(&Folder, &[&str])]) -> service::Result<Vec<FolderId>> {
        self.0.update_folder(folders)
    }

    fn delete_folder(&self, folders: &[BaseFolderId], delete_type: DeleteType) -> service::Result<()> {
        self.0.delete_folder(folders, delete_type)
    }

    fn empty_folder(
        &self,
        folders: &[BaseFolderId],
        delete_type: DeleteType,
        delete_sub_folders: bool,
    ) -> service::Result<()> {
        self.0.empty_folder(folders, delete_type, delete_sub_folders)
    }

    fn find_items(
        &self,
        folders: &[BaseFolderId],
        restriction: Option<&Restriction>,
        page_size: usize,
        offset: usize,
    ) -> service::Result<Vec<Item>> {
        self.0.find_items(folders, restriction, page_size, offset)
    }

    fn create_items(&self, folder: &BaseFolderId, items: &[Item]) -> service::Result<Vec<ItemId>> {
        self.0.create_items(folder, items)
    }

    fn delete_items(&self, items: &[ItemId], _delete_type: DeleteType) -> service::Result<()> {
        match items.first() {
            Some(id) => Err(service::Error::ItemNotFound(id.to_string())),
            None => Ok(()),
        }
    }

    fn find_people(&self, folder: &BaseFolderId, query: Option<&str>) -> service::Result<Vec<Persona>> {
        self.0.find_people(folder, query)
    }

    fn sync_folder_items(
        &self,
        folder: &BaseFolderId,
        options: &SyncItemsOptions,
    ) -> service::Result<SyncPage<Item>> {
        self.0.sync_folder_items(folder, options)
    }

    fn sync_folder_hierarchy(
        &self,
        folder: &BaseFolderId,
        sync_state: Option<&str>,
        only_fields: Option<&[String]>,
    ) -> service::Result<SyncPage<Folder>> {
        self.0.sync_folder_hierarchy(folder, sync_state, only_fields)
    }

    fn get_user_configuration(
        &self,
        folder: &BaseFolderId,
        name: &str,
        properties: UserConfigurationProperties,
    ) -> service::Result<UserConfiguration> {
        self.0.get_user_configuration(folder, name, properties)
    }

    fn create_user_configuration(
        &self,
        folder: &BaseFolderId,
        config: &UserConfiguration,
    ) -> service::Result<()> {
        self.0.create_user_configuration(folder, config)
    }

    fn update_user_configuration(
        &self,
        folder: &BaseFolderId,
        config: &UserConfiguration,
    ) -> service::Result<()> {
        self.0.update_user_configuration(folder, config)
    }

    fn delete_user_configuration(&self, folder: &BaseFolderId, name: &str) -> service::Result<()> {
        self.0.delete_user_configuration(folder, name)
    }

    fn subscribe_to_pull(
        &self,
        folders: &[BaseFolderId],
        event_types: &[EventType],
        watermark: Option<&str>,
        timeout: u32,
    ) -> service::Result<Vec<service::Result<Subscription>>> {
        self.0.subscribe_to_pull(folders, event_types, watermark, timeout)
    }

    fn subscribe_to_push(
        &self,
        folders: &[BaseFolderId],
        event_types: &[EventType],
        watermark: Option<&str>,
        status_frequency: u32,
        callback_url: &str,
    ) -> service::Result<Vec<service::Result<Subscription>>> {
        self.0
            .subscribe_to_push(folders, event_types, watermark, status_frequency, callback_url)
    }

    fn subscribe_to_streaming(
        &self,
        folders: &[BaseFolderId],
        event_types: &[EventType],
    ) -> service::Result<Vec<service::Result<Subscription>>> {
        self.0.subscribe_to_streaming(folders, event_types)
    }

    fn unsubscribe(&self, subscription_id: &str) -> service::Result<()> {
        self.0.unsubscribe(subscription_id)
    }

    fn get_events(&self, subscription_id: &str, watermark: &str) -> service::Result<Notification> {
        self.0.get_events(subscription_id, watermark)
    }

    fn get_streaming_events<'b>(
        &'b self,
        subscription_ids: &[String],
        connection_timeout: u32,
        request_timeout: Duration,
    ) -> service::Result<Box<dyn NotificationStream + 'b>> {
        self.0
            .get_streaming_events(subscription_ids, connection_timeout, request_timeout)
    }
}

#[cfg(feature = "memory-service")]
#[test]
fn test_wipe_propagates_missing_items() {
    init_logger();
    let tree = tree();
    let vanishing = VanishingItems(&tree.service);
    let account = account();
    let root = Root::from_service(Cow::Borrowed(&account), &vanishing).unwrap();

    tree.service.deny(&tree.c, Denial::EmptyFolder);
    let folder_c = root.get_path("A/C").unwrap();
    folder_c.bulk_create(&root, &[Item::default()]).unwrap();

    let folder_a = root.get_path("A").unwrap();
    let err = folder_a.wipe(&root, None).unwrap_err();
    assert!(matches!(
        err.service_error(),
        Some(service::Error::ItemNotFound(_))
    ));
    assert_eq!(1, tree.service.item_count(&tree.c));
    assert!(tree.service.contains_folder(&tree.c));
}
