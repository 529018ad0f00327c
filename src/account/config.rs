//! Account config module.
//!
//! This module contains the representation of the user account
//! configuration: the mailbox the folder hierarchy belongs to, the
//! locale used to recognize localized folder names and the build of
//! the server the account lives on.

use serde::{Deserialize, Serialize};
use std::{fmt, result, str::FromStr};
use thiserror::Error;

use crate::Mailbox;

pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const DEFAULT_LOCALE: &str = "en_US";

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot parse server build {0}: expected <major>.<minor>")]
    ParseBuildError(String),
}

pub type Result<T> = result::Result<T, Error>;

/// Represents the build of the server, used to know which folder
/// kinds and folder fields the server supports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Build {
    pub major: u8,
    pub minor: u8,
}

impl Build {
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

pub const EXCHANGE_2007: Build = Build::new(8, 0);
pub const EXCHANGE_2007_SP1: Build = Build::new(8, 1);
pub const EXCHANGE_2010: Build = Build::new(14, 0);
pub const EXCHANGE_2010_SP1: Build = Build::new(14, 1);
pub const EXCHANGE_2013: Build = Build::new(15, 0);
pub const EXCHANGE_2016: Build = Build::new(15, 1);

impl Default for Build {
    fn default() -> Self {
        EXCHANGE_2016
    }
}

impl fmt::Display for Build {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for Build {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (major, minor) = s
            .trim()
            .split_once('.')
            .ok_or_else(|| Error::ParseBuildError(s.to_owned()))?;
        let major = major
            .parse()
            .map_err(|_| Error::ParseBuildError(s.to_owned()))?;
        let minor = minor
            .split('.')
            .next()
            .and_then(|minor| minor.parse().ok())
            .ok_or_else(|| Error::ParseBuildError(s.to_owned()))?;
        Ok(Self { major, minor })
    }
}

/// Represents the configuration of the user account.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Represents the name of the account.
    pub name: String,
    /// Represents the primary SMTP address of the mailbox. It scopes
    /// distinguished folder references.
    pub primary_smtp_address: String,
    /// Represents the locale of the mailbox, used to match localized
    /// names of well-known folders.
    pub locale: Option<String>,
    /// Represents the build of the server.
    #[serde(default)]
    pub version: Build,
    /// Represents the page size used when querying items.
    pub item_page_size: Option<usize>,
}

impl AccountConfig {
    pub fn locale(&self) -> &str {
        self.locale.as_deref().unwrap_or(DEFAULT_LOCALE)
    }

    pub fn item_page_size(&self) -> usize {
        self.item_page_size
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Builds the mailbox distinguished folders are scoped to. An
    /// account without address produces no mailbox.
    pub fn mailbox(&self) -> Option<Mailbox> {
        if self.primary_smtp_address.trim().is_empty() {
            None
        } else {
            Some(Mailbox::new(self.primary_smtp_address.trim()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_build() {
        assert_eq!(Build::new(15, 1), "15.1".parse().unwrap());
        assert_eq!(Build::new(14, 3), "14.3.123.4".parse().unwrap());
        assert!(matches!(
            "15".parse::<Build>(),
            Err(Error::ParseBuildError(build)) if build == "15"
        ));
        assert!(EXCHANGE_2007_SP1 < EXCHANGE_2010);
    }

    #[test]
    fn account_defaults() {
        let config = AccountConfig::default();
        assert_eq!(DEFAULT_LOCALE, config.locale());
        assert_eq!(DEFAULT_PAGE_SIZE, config.item_page_size());
        assert_eq!(None, config.mailbox());

        let config = AccountConfig {
            primary_smtp_address: "bob@localhost".into(),
            locale: Some("de_DE".into()),
            item_page_size: Some(0),
            ..AccountConfig::default()
        };
        assert_eq!("de_DE", config.locale());
        assert_eq!(DEFAULT_PAGE_SIZE, config.item_page_size());
        assert_eq!(Some(Mailbox::new("bob@localhost")), config.mailbox());
    }
}
