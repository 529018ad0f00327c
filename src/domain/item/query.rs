//! Item query module.
//!
//! This module contains the lazy item queries built from a folder
//! collection. Nothing is sent to the server until the query is
//! executed.

use log::{debug, info, trace};

use crate::{BaseFolderId, DeleteType, Item, ItemId, Persona, Restriction, Service};

use super::{Error, Result};

/// Represents an item query over one or more folders.
#[derive(Clone)]
pub struct ItemQuery<'a> {
    service: &'a dyn Service,
    folders: Vec<BaseFolderId>,
    restrictions: Vec<Restriction>,
    page_size: usize,
    is_none: bool,
}

impl<'a> ItemQuery<'a> {
    pub fn new(service: &'a dyn Service, folders: Vec<BaseFolderId>, page_size: usize) -> Self {
        Self {
            service,
            folders,
            restrictions: Vec::new(),
            page_size: page_size.max(1),
            is_none: false,
        }
    }

    /// Builds a query that matches nothing, without ever reaching the
    /// server.
    pub fn none(service: &'a dyn Service) -> Self {
        Self {
            is_none: true,
            ..Self::new(service, Vec::new(), 1)
        }
    }

    pub fn filter(mut self, restriction: Restriction) -> Self {
        self.restrictions.push(restriction);
        self
    }

    pub fn exclude(mut self, restriction: Restriction) -> Self {
        self.restrictions.push(Restriction::Not(Box::new(restriction)));
        self
    }

    /// Overrides the page size. `None` keeps the current one.
    pub fn page_size(mut self, page_size: Option<usize>) -> Self {
        if let Some(page_size) = page_size.filter(|size| *size > 0) {
            self.page_size = page_size;
        }
        self
    }

    fn restriction(&self) -> Option<Restriction> {
        match self.restrictions.len() {
            0 => None,
            1 => Some(self.restrictions[0].clone()),
            _ => Some(Restriction::And(self.restrictions.clone())),
        }
    }

    /// Fetches all the matching items, page by page.
    pub fn fetch(&self) -> Result<Vec<Item>> {
        if self.is_none || self.folders.is_empty() {
            return Ok(Vec::new());
        }

        let restriction = self.restriction();
        debug!("item restriction: {:?}", restriction);

        let mut items = Vec::new();
        loop {
            let page = self.service.find_items(
                &self.folders,
                restriction.as_ref(),
                self.page_size,
                items.len(),
            )?;
            let page_len = page.len();
            items.extend(page);
            if page_len < self.page_size {
                break;
            }
        }

        trace!("items: {:#?}", items);
        Ok(items)
    }

    pub fn exists(&self) -> Result<bool> {
        if self.is_none || self.folders.is_empty() {
            return Ok(false);
        }
        let page = self
            .service
            .find_items(&self.folders, self.restriction().as_ref(), 1, 0)?;
        Ok(!page.is_empty())
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.fetch()?.len())
    }

    /// Gets the only item matching the query.
    pub fn get(&self) -> Result<Item> {
        let mut items = self.fetch()?;
        match items.len() {
            0 => Err(Error::ItemNotFoundError),
            1 => Ok(items.remove(0)),
            n => Err(Error::MultipleItemsFoundError(n)),
        }
    }

    /// Deletes all the matching items, one page of ids at a time, and
    /// returns how many were deleted.
    pub fn delete(&self, delete_type: DeleteType) -> Result<usize> {
        let ids: Vec<ItemId> = self
            .fetch()?
            .into_iter()
            .filter_map(|item| item.id)
            .collect();
        info!("deleting {} item(s)", ids.len());

        for chunk in ids.chunks(self.page_size) {
            debug!("deleting items chunk of size {}", chunk.len());
            self.service.delete_items(chunk, delete_type)?;
        }

        Ok(ids.len())
    }
}

/// Represents a people search in a single folder.
#[derive(Clone)]
pub struct PeopleQuery<'a> {
    service: &'a dyn Service,
    folder: BaseFolderId,
    query: Option<String>,
}

impl<'a> PeopleQuery<'a> {
    pub fn new(service: &'a dyn Service, folder: BaseFolderId) -> Self {
        Self {
            service,
            folder,
            query: None,
        }
    }

    pub fn query<Q: ToString>(mut self, query: Q) -> Self {
        self.query = Some(query.to_string());
        self
    }

    pub fn fetch(&self) -> Result<Vec<Persona>> {
        let people = self
            .service
            .find_people(&self.folder, self.query.as_deref())?;
        trace!("people: {:#?}", people);
        Ok(people)
    }
}
