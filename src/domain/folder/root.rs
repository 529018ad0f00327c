//! Root module.
//!
//! This module contains the owner of a folder hierarchy. The root
//! holds the account configuration, the service handle and the
//! authoritative cache of the folders of the hierarchy.
//!
//! The cache is populated on first use and is not thread safe: a root
//! is meant to be used by a single caller at a time. Interleaving
//! mutations with lazy walks may give stale results.

use log::{debug, info, trace};
use std::{borrow::Cow, cell::RefCell, collections::HashMap};

use crate::{service, AccountConfig, Folder, FolderId, FolderKind, Service, Traversal};

use super::{Error, Result};

/// Represents the folders cache, in insertion order.
#[derive(Debug, Default)]
struct FolderCache {
    folders: HashMap<FolderId, Folder>,
    order: Vec<FolderId>,
}

impl FolderCache {
    fn insert(&mut self, folder: Folder) {
        if let Some(id) = folder.id().cloned() {
            if self.folders.insert(id.clone(), folder).is_none() {
                self.order.push(id);
            }
        }
    }

    fn remove(&mut self, id: &FolderId) {
        if self.folders.remove(id).is_some() {
            self.order.retain(|cached_id| cached_id != id);
        }
    }

    fn iter(&self) -> impl Iterator<Item = &Folder> {
        self.order.iter().filter_map(|id| self.folders.get(id))
    }
}

/// Represents the root of a folder hierarchy.
pub struct Root<'a> {
    account: Cow<'a, AccountConfig>,
    service: &'a dyn Service,
    folder: Folder,
    cache: RefCell<Option<FolderCache>>,
}

impl<'a> Root<'a> {
    pub fn new(account: Cow<'a, AccountConfig>, service: &'a dyn Service, folder: Folder) -> Self {
        Self {
            account,
            service,
            folder,
            cache: RefCell::new(None),
        }
    }

    /// Builds the root of the account hierarchy by resolving the
    /// well-known root folder.
    pub fn from_service(account: Cow<'a, AccountConfig>, service: &'a dyn Service) -> Result<Self> {
        info!("resolving root folder of account {}", account.name);

        let reference = Folder::distinguished(FolderKind::Root).to_folder_id(&account)?;
        debug!("root folder reference: {}", reference);

        let mut results = service.get_folders(&[reference])?;
        if results.len() != 1 {
            return Err(Error::UnexpectedResultCount(results.len()));
        }
        let mut folder = results.remove(0)?;
        folder.kind = FolderKind::Root;
        folder.is_distinguished = true;
        trace!("root folder: {:#?}", folder);

        Ok(Self::new(account, service, folder))
    }

    pub fn account(&self) -> &AccountConfig {
        &self.account
    }

    pub fn service(&self) -> &'a dyn Service {
        self.service
    }

    /// Gets the folder at the top of the hierarchy.
    pub fn folder(&self) -> &Folder {
        &self.folder
    }

    fn populate(&self) -> Result<FolderCache> {
        info!("populating folders cache");
        let mut cache = FolderCache::default();

        let kinds: Vec<FolderKind> = FolderKind::WELL_KNOWN
            .into_iter()
            .filter(|kind| kind.supports_version(self.account.version))
            .collect();
        let references = kinds
            .iter()
            .map(|kind| Folder::distinguished(*kind).to_folder_id(&self.account))
            .collect::<Result<Vec<_>>>()?;

        let results = self.service.get_folders(&references)?;
        for (kind, result) in kinds.into_iter().zip(results) {
            match result {
                Ok(mut folder) => {
                    folder.kind = kind;
                    folder.is_distinguished = true;
                    cache.insert(folder);
                }
                Err(err)
                    if err.is_missing_folder()
                        || matches!(err, service::Error::AccessDenied(_)) =>
                {
                    debug!("skipping well-known folder {}: {}", kind, err);
                }
                Err(err) => return Err(err.into()),
            }
        }

        let root_reference = self.folder.to_folder_id(&self.account)?;
        for mut folder in self
            .service
            .find_folders(&root_reference, Traversal::Deep, None)?
        {
            match folder.id() {
                Some(id) if cache.folders.contains_key(id) => continue,
                Some(_) => {
                    folder.deduce_kind(self.account.locale());
                    cache.insert(folder);
                }
                None => continue,
            }
        }

        cache.insert(self.folder.clone());

        debug!("cached {} folder(s)", cache.order.len());
        trace!("folders cache: {:#?}", cache.order);
        Ok(cache)
    }

    fn with_cache<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut FolderCache) -> T,
    {
        let mut guard = self.cache.borrow_mut();
        let cache = match &mut *guard {
            Some(cache) => cache,
            empty => empty.insert(self.populate()?),
        };
        Ok(f(cache))
    }

    // Mutations are only reflected in an already populated cache, an
    // empty cache is fully fetched on next read anyway.
    fn with_populated_cache<F>(&self, f: F)
    where
        F: FnOnce(&mut FolderCache),
    {
        if let Some(cache) = self.cache.borrow_mut().as_mut() {
            f(cache)
        }
    }

    pub fn is_cached(&self, id: &FolderId) -> bool {
        self.cache
            .borrow()
            .as_ref()
            .map(|cache| cache.folders.contains_key(id))
            .unwrap_or(false)
    }

    pub fn get_folder(&self, id: &FolderId) -> Result<Option<Folder>> {
        self.with_cache(|cache| cache.folders.get(id).cloned())
    }

    /// Lists the cached children of the given folder, in cache order.
    pub fn get_children(&self, folder: &Folder) -> Result<Vec<Folder>> {
        let id = match folder.id() {
            Some(id) => id,
            None => return Ok(Vec::new()),
        };
        self.with_cache(|cache| {
            cache
                .iter()
                .filter(|child| child.parent_id() == Some(id))
                .cloned()
                .collect()
        })
    }

    pub fn add_folder(&self, folder: &Folder) -> Result<()> {
        folder.require_id()?;
        debug!("adding folder {} to cache", folder);
        self.with_populated_cache(|cache| cache.insert(folder.clone()));
        Ok(())
    }

    pub fn update_folder(&self, folder: &Folder) -> Result<()> {
        folder.require_id()?;
        debug!("updating folder {} in cache", folder);
        self.with_populated_cache(|cache| cache.insert(folder.clone()));
        Ok(())
    }

    pub fn remove_folder(&self, folder: &Folder) -> Result<()> {
        let id = folder.require_id()?;
        debug!("removing folder {} from cache", folder);
        self.with_populated_cache(|cache| cache.remove(id));
        Ok(())
    }

    pub fn clear_cache(&self) {
        debug!("clearing folders cache");
        *self.cache.borrow_mut() = None;
    }

    /// Finds the well-known kind matching a localized folder name, in
    /// the locale of the account.
    pub fn folder_kind_from_name(&self, name: &str) -> Option<FolderKind> {
        FolderKind::from_localized_name(name, self.account.locale())
    }

    /// Gets the folder of the given kind, preferring the well-known
    /// one. When none is cached, returns an unresolved reference to
    /// the well-known folder.
    pub fn get_default_folder(&self, kind: FolderKind) -> Result<Folder> {
        let folder = self.with_cache(|cache| {
            cache
                .iter()
                .find(|folder| folder.kind() == kind && folder.is_distinguished)
                .or_else(|| cache.iter().find(|folder| folder.kind() == kind))
                .cloned()
        })?;
        Ok(folder.unwrap_or_else(|| Folder::distinguished(kind)))
    }

    /// Gets the folder at the given `/`-separated path, relative to the
    /// top of the hierarchy.
    pub fn get_path(&self, path: &str) -> Result<Folder> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self.folder.clone(), |folder, segment| {
                folder.child(self, segment)
            })
    }
}
