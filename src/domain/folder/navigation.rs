//! Folder navigation module.
//!
//! This module contains the operations moving through a folder
//! hierarchy: parents, children, subtree walks, path globbing and tree
//! rendering. Except for [`Folder::child_uncached`], they all read the
//! cache of the root.

use log::{debug, trace};
use std::{collections::HashSet, iter, vec};

use crate::{Folder, FolderCollection, FolderId, Root};

use super::{pattern::Pattern, Error, Result};

/// Represents the lazy result of a glob.
pub type Glob<'a> = Box<dyn Iterator<Item = Result<Folder>> + 'a>;

fn glob_error<'a>(err: Error) -> Glob<'a> {
    Box::new(iter::once(Err(err)))
}

/// Represents a lazy pre-order walk over a subtree, the folder the
/// walk started from excluded.
///
/// The children of a folder are only looked up once the walk moves
/// past it.
pub struct Walk<'a> {
    root: &'a Root<'a>,
    stack: Vec<vec::IntoIter<Folder>>,
    pending: Option<Folder>,
    visited: HashSet<FolderId>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = Result<Folder>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(folder) = self.pending.take() {
            match self.root.get_children(&folder) {
                Ok(children) => self.stack.push(children.into_iter()),
                Err(err) => return Some(Err(err)),
            }
        }

        while let Some(children) = self.stack.last_mut() {
            match children.next() {
                Some(child) => {
                    if let Some(id) = child.id() {
                        if !self.visited.insert(id.clone()) {
                            debug!("skipping already walked folder {}", child);
                            continue;
                        }
                    }
                    self.pending = Some(child.clone());
                    return Some(Ok(child));
                }
                None => {
                    self.stack.pop();
                }
            }
        }

        None
    }
}

impl Folder {
    /// Lists the cached direct subfolders.
    pub fn children<'a>(&self, root: &'a Root<'a>) -> Result<FolderCollection<'a>> {
        Ok(FolderCollection::new(root, root.get_children(self)?))
    }

    /// Gets the cached parent folder. A folder being its own parent,
    /// or whose parent is out of the cache, has no parent.
    pub fn parent(&self, root: &Root) -> Result<Option<Folder>> {
        match self.parent_id() {
            Some(id) => root.get_folder(id),
            None => Ok(None),
        }
    }

    /// Lists the chain of folders leading to this one, top first and
    /// this folder last.
    pub fn parts(&self, root: &Root) -> Result<Vec<Folder>> {
        let mut parts = vec![self.clone()];
        let mut visited: HashSet<FolderId> = self.id().cloned().into_iter().collect();

        while let Some(parent) = parts[parts.len() - 1].parent(root)? {
            match parent.id() {
                Some(id) if !visited.insert(id.clone()) => break,
                _ => parts.push(parent),
            }
        }

        parts.reverse();
        Ok(parts)
    }

    /// Builds the absolute path of the folder, made of the names of
    /// its parts.
    pub fn absolute(&self, root: &Root) -> Result<String> {
        Ok(self
            .parts(root)?
            .iter()
            .map(|part| format!("/{}", part.name))
            .collect())
    }

    /// Walks the subtree of the folder. Each call starts a new walk.
    pub fn walk<'a>(&self, root: &'a Root<'a>) -> Walk<'a> {
        Walk {
            root,
            stack: Vec::new(),
            pending: Some(self.clone()),
            visited: self.id().cloned().into_iter().collect(),
        }
    }

    /// Finds the folders matching a `/`-separated pattern, relative
    /// to this folder.
    ///
    /// Each segment is a case-insensitive shell pattern. An empty
    /// first segment starts from the top of the hierarchy, `..` goes
    /// to the parent and `**` matches any depth. A trailing `**`
    /// matches this folder and its whole subtree.
    pub fn glob<'a>(&self, root: &'a Root<'a>, pattern: &str) -> Glob<'a> {
        let folder = self.clone();
        let pattern = pattern.to_owned();
        Box::new(iter::once(()).flat_map(move |_| folder.glob_segment(root, &pattern)))
    }

    fn glob_segment<'a>(&self, root: &'a Root<'a>, pattern: &str) -> Glob<'a> {
        let (head, tail) = match pattern.split_once('/') {
            Some((head, tail)) if !tail.is_empty() => (head, Some(tail.to_owned())),
            Some((head, _)) => (head, None),
            None => (pattern, None),
        };
        trace!("glob head {:?}, tail {:?}", head, tail);

        match head {
            "" => root
                .folder()
                .glob(root, tail.as_deref().unwrap_or("*")),
            ".." => match self.parent(root) {
                Ok(Some(parent)) => parent.glob(root, tail.as_deref().unwrap_or("*")),
                Ok(None) => glob_error(Error::AlreadyAtTop),
                Err(err) => glob_error(err),
            },
            "**" => match tail {
                None => Box::new(iter::once(Ok(self.clone())).chain(self.walk(root))),
                Some(tail) if tail.contains('/') => Box::new(
                    iter::once(Ok(self.clone()))
                        .chain(self.walk(root))
                        .flat_map(move |folder| match folder {
                            Ok(folder) => folder.glob(root, &tail),
                            Err(err) => glob_error(err),
                        }),
                ),
                Some(tail) => match Pattern::new(&tail) {
                    Ok(pattern) => Box::new(self.walk(root).filter(move |folder| match folder {
                        Ok(folder) => pattern.matches(&folder.name),
                        Err(_) => true,
                    })),
                    Err(err) => glob_error(err),
                },
            },
            head => {
                let pattern = match Pattern::new(head) {
                    Ok(pattern) => pattern,
                    Err(err) => return glob_error(err),
                };
                let children = match root.get_children(self) {
                    Ok(children) => children,
                    Err(err) => return glob_error(err),
                };
                Box::new(
                    children
                        .into_iter()
                        .filter(move |child| pattern.matches(&child.name))
                        .flat_map(move |child| -> Glob<'a> {
                            match &tail {
                                None => Box::new(iter::once(Ok(child))),
                                Some(tail) => child.glob(root, tail),
                            }
                        }),
                )
            }
        }
    }

    /// Renders the cached subtree of the folder, children sorted by
    /// name. A folder showing up twice is rendered once.
    pub fn tree(&self, root: &Root) -> Result<String> {
        let mut visited: HashSet<FolderId> = self.id().cloned().into_iter().collect();
        self.tree_level(root, &mut visited)
    }

    fn tree_level(&self, root: &Root, visited: &mut HashSet<FolderId>) -> Result<String> {
        let mut tree = format!("{}\n", self.name);

        let mut children = root.get_children(self)?;
        children.retain(|child| match child.id() {
            Some(id) if !visited.insert(id.clone()) => {
                debug!("skipping already rendered folder {}", child);
                false
            }
            _ => true,
        });
        children.sort_by(|a, b| a.name.cmp(&b.name));
        let count = children.len();

        for (i, child) in children.iter().enumerate() {
            let is_last = i + 1 == count;
            for (j, node) in child.tree_level(root, visited)?.split('\n').enumerate() {
                let prefix = match (is_last, j == 0) {
                    (false, true) => "├── ",
                    (false, false) => "│   ",
                    (true, true) => "└── ",
                    (true, false) => "    ",
                };
                tree.push_str(prefix);
                tree.push_str(node);
                tree.push('\n');
            }
        }

        Ok(tree.trim().to_owned())
    }

    /// Gets a cached direct subfolder by exact name. `..` gets the
    /// parent and `.` the folder itself.
    pub fn child(&self, root: &Root, name: &str) -> Result<Folder> {
        match name {
            ".." => self.parent(root)?.ok_or(Error::AlreadyAtTop),
            "." => Ok(self.clone()),
            name => root
                .get_children(self)?
                .into_iter()
                .find(|child| child.name == name)
                .ok_or_else(|| Error::FolderNotFound(name.to_owned())),
        }
    }

    /// Gets a direct subfolder by exact name, straight from the server
    /// and without touching the cache.
    pub fn child_uncached<'a>(&self, root: &'a Root<'a>, name: &str) -> Result<Folder> {
        match name {
            ".." => Err(Error::ParentWithoutCache),
            "." => Ok(self.clone()),
            name => self.get(root, name),
        }
    }
}
