//! Folder kind module.
//!
//! This module contains the table of folder subtypes. Each kind only
//! contributes static data: the well-known name it can be addressed
//! by, the container class of the items it holds, its localized
//! display names and the server build it appeared in.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Build, EXCHANGE_2010_SP1};

type LocalizedNames = &'static [(&'static str, &'static [&'static str])];

/// Represents the subtype of a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FolderKind {
    /// The root of the folder hierarchy.
    Root,
    /// A folder of unknown subtype.
    Generic,
    /// A user-created mail folder.
    Messages,
    Inbox,
    Outbox,
    SentItems,
    DeletedItems,
    Drafts,
    JunkEmail,
    Calendar,
    Contacts,
    Tasks,
    Notes,
    Journal,
    ArchiveInbox,
}

impl Default for FolderKind {
    fn default() -> Self {
        Self::Generic
    }
}

impl FolderKind {
    /// Kinds resolved by distinguished id when populating a folder
    /// cache.
    pub const WELL_KNOWN: [FolderKind; 12] = [
        FolderKind::Inbox,
        FolderKind::Outbox,
        FolderKind::SentItems,
        FolderKind::DeletedItems,
        FolderKind::Drafts,
        FolderKind::JunkEmail,
        FolderKind::Calendar,
        FolderKind::Contacts,
        FolderKind::Tasks,
        FolderKind::Notes,
        FolderKind::Journal,
        FolderKind::ArchiveInbox,
    ];

    // Many kinds share a container class, only the first match of
    // this list is retained.
    const CONTAINER_CLASS_LOOKUP: [FolderKind; 6] = [
        FolderKind::Messages,
        FolderKind::Tasks,
        FolderKind::Calendar,
        FolderKind::Contacts,
        FolderKind::Notes,
        FolderKind::Journal,
    ];

    pub fn distinguished_id(self) -> Option<&'static str> {
        match self {
            Self::Root => Some("msgfolderroot"),
            Self::Generic | Self::Messages => None,
            Self::Inbox => Some("inbox"),
            Self::Outbox => Some("outbox"),
            Self::SentItems => Some("sentitems"),
            Self::DeletedItems => Some("deleteditems"),
            Self::Drafts => Some("drafts"),
            Self::JunkEmail => Some("junkemail"),
            Self::Calendar => Some("calendar"),
            Self::Contacts => Some("contacts"),
            Self::Tasks => Some("tasks"),
            Self::Notes => Some("notes"),
            Self::Journal => Some("journal"),
            Self::ArchiveInbox => Some("archiveinbox"),
        }
    }

    pub fn container_class(self) -> Option<&'static str> {
        match self {
            Self::Root | Self::Generic => None,
            Self::Messages
            | Self::Inbox
            | Self::Outbox
            | Self::SentItems
            | Self::DeletedItems
            | Self::Drafts
            | Self::JunkEmail
            | Self::ArchiveInbox => Some("IPF.Note"),
            Self::Calendar => Some("IPF.Appointment"),
            Self::Contacts => Some("IPF.Contact"),
            Self::Tasks => Some("IPF.Task"),
            Self::Notes => Some("IPF.StickyNote"),
            Self::Journal => Some("IPF.Journal"),
        }
    }

    /// Gets the first server build supporting this kind, `None` when
    /// all builds do.
    pub fn supported_from(self) -> Option<Build> {
        match self {
            Self::ArchiveInbox => Some(EXCHANGE_2010_SP1),
            _ => None,
        }
    }

    pub fn supports_version(self, build: Build) -> bool {
        self.supported_from()
            .map(|from| build >= from)
            .unwrap_or(true)
    }

    fn localized_names_table(self) -> LocalizedNames {
        match self {
            Self::Inbox => &[
                ("da_DK", &["Indbakke"]),
                ("de_DE", &["Posteingang"]),
                ("en_US", &["Inbox"]),
                ("es_ES", &["Bandeja de entrada"]),
                ("fr_CA", &["Boîte de réception"]),
                ("nl_NL", &["Postvak IN"]),
                ("ru_RU", &["Входящие"]),
                ("sv_SE", &["Inkorgen"]),
                ("zh_CN", &["收件箱"]),
            ],
            Self::Outbox => &[
                ("da_DK", &["Udbakke"]),
                ("de_DE", &["Postausgang"]),
                ("en_US", &["Outbox"]),
                ("es_ES", &["Bandeja de salida"]),
                ("fr_CA", &["Boîte d'envoi"]),
                ("nl_NL", &["Postvak UIT"]),
                ("ru_RU", &["Исходящие"]),
                ("sv_SE", &["Utkorgen"]),
                ("zh_CN", &["发件箱"]),
            ],
            Self::SentItems => &[
                ("da_DK", &["Sendt post"]),
                ("de_DE", &["Gesendete Elemente"]),
                ("en_US", &["Sent Items"]),
                ("es_ES", &["Elementos enviados"]),
                ("fr_CA", &["Éléments envoyés"]),
                ("nl_NL", &["Verzonden items"]),
                ("ru_RU", &["Отправленные"]),
                ("sv_SE", &["Skickat"]),
                ("zh_CN", &["已发送邮件"]),
            ],
            Self::DeletedItems => &[
                ("da_DK", &["Slettet post"]),
                ("de_DE", &["Gelöschte Elemente"]),
                ("en_US", &["Deleted Items"]),
                ("es_ES", &["Elementos eliminados"]),
                ("fr_CA", &["Éléments supprimés"]),
                ("nl_NL", &["Verwijderde items"]),
                ("ru_RU", &["Удаленные"]),
                ("sv_SE", &["Borttaget"]),
                ("zh_CN", &["已删除邮件"]),
            ],
            Self::Drafts => &[
                ("da_DK", &["Kladder"]),
                ("de_DE", &["Entwürfe"]),
                ("en_US", &["Drafts"]),
                ("es_ES", &["Borradores"]),
                ("fr_CA", &["Brouillons"]),
                ("nl_NL", &["Concepten"]),
                ("ru_RU", &["Черновики"]),
                ("sv_SE", &["Utkast"]),
                ("zh_CN", &["草稿"]),
            ],
            Self::JunkEmail => &[
                ("da_DK", &["Uønsket e-mail"]),
                ("de_DE", &["Junk-E-Mail"]),
                ("en_US", &["Junk E-mail"]),
                ("es_ES", &["Correo no deseado"]),
                ("fr_CA", &["Courrier indésirables"]),
                ("nl_NL", &["Ongewenste e-mail"]),
                ("ru_RU", &["Нежелательная почта"]),
                ("sv_SE", &["Skräppost"]),
                ("zh_CN", &["垃圾邮件"]),
            ],
            Self::Calendar => &[
                ("da_DK", &["Kalender"]),
                ("de_DE", &["Kalender"]),
                ("en_US", &["Calendar"]),
                ("es_ES", &["Calendario"]),
                ("fr_CA", &["Calendrier"]),
                ("nl_NL", &["Agenda"]),
                ("ru_RU", &["Календарь"]),
                ("sv_SE", &["Kalender"]),
                ("zh_CN", &["日历"]),
            ],
            Self::Contacts => &[
                ("da_DK", &["Kontaktpersoner"]),
                ("de_DE", &["Kontakte"]),
                ("en_US", &["Contacts"]),
                ("es_ES", &["Contactos"]),
                ("fr_CA", &["Contacts"]),
                ("nl_NL", &["Contactpersonen"]),
                ("ru_RU", &["Контакты"]),
                ("sv_SE", &["Kontakter"]),
                ("zh_CN", &["联系人"]),
            ],
            Self::Tasks => &[
                ("da_DK", &["Opgaver"]),
                ("de_DE", &["Aufgaben"]),
                ("en_US", &["Tasks"]),
                ("es_ES", &["Tareas"]),
                ("fr_CA", &["Tâches"]),
                ("nl_NL", &["Taken"]),
                ("ru_RU", &["Задачи"]),
                ("sv_SE", &["Uppgifter"]),
                ("zh_CN", &["任务"]),
            ],
            Self::Notes => &[
                ("da_DK", &["Noter"]),
                ("de_DE", &["Notizen"]),
                ("en_US", &["Notes"]),
                ("es_ES", &["Notas"]),
                ("fr_CA", &["Notes"]),
                ("nl_NL", &["Notities"]),
                ("ru_RU", &["Заметки"]),
                ("sv_SE", &["Anteckningar"]),
                ("zh_CN", &["便笺"]),
            ],
            Self::Journal => &[
                ("de_DE", &["Journal"]),
                ("en_US", &["Journal"]),
                ("fr_CA", &["Journal"]),
            ],
            _ => &[],
        }
    }

    /// Gets the lowercased display names of this kind for the given
    /// locale. Unknown locales have no localized names.
    pub fn localized_names(self, locale: &str) -> Vec<String> {
        self.localized_names_table()
            .iter()
            .find(|(l, _)| *l == locale)
            .map(|(_, names)| names.iter().map(|name| name.to_lowercase()).collect())
            .unwrap_or_default()
    }

    /// Finds the well-known kind whose localized names contain the
    /// given folder name.
    pub fn from_localized_name(name: &str, locale: &str) -> Option<Self> {
        let name = name.to_lowercase();
        Self::WELL_KNOWN
            .into_iter()
            .find(|kind| kind.localized_names(locale).contains(&name))
    }

    /// Finds a reasonable kind for a container class, e.g. `IPF.Note`.
    pub fn from_container_class(container_class: &str) -> Option<Self> {
        Self::CONTAINER_CLASS_LOOKUP
            .into_iter()
            .find(|kind| kind.container_class() == Some(container_class))
    }
}

impl fmt::Display for FolderKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Root => write!(f, "Root"),
            Self::Generic => write!(f, "Folder"),
            Self::Messages => write!(f, "Messages"),
            Self::Inbox => write!(f, "Inbox"),
            Self::Outbox => write!(f, "Outbox"),
            Self::SentItems => write!(f, "SentItems"),
            Self::DeletedItems => write!(f, "DeletedItems"),
            Self::Drafts => write!(f, "Drafts"),
            Self::JunkEmail => write!(f, "JunkEmail"),
            Self::Calendar => write!(f, "Calendar"),
            Self::Contacts => write!(f, "Contacts"),
            Self::Tasks => write!(f, "Tasks"),
            Self::Notes => write!(f, "Notes"),
            Self::Journal => write!(f, "Journal"),
            Self::ArchiveInbox => write!(f, "ArchiveInbox"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EXCHANGE_2007_SP1, EXCHANGE_2016};

    #[test]
    fn find_kind_from_localized_name() {
        assert_eq!(
            Some(FolderKind::Inbox),
            FolderKind::from_localized_name("INBOX", "en_US")
        );
        assert_eq!(
            Some(FolderKind::DeletedItems),
            FolderKind::from_localized_name("Gelöschte Elemente", "de_DE")
        );
        assert_eq!(None, FolderKind::from_localized_name("Inbox", "xx_XX"));
        assert_eq!(None, FolderKind::from_localized_name("Archive", "en_US"));
    }

    #[test]
    fn find_kind_from_container_class() {
        assert_eq!(
            Some(FolderKind::Messages),
            FolderKind::from_container_class("IPF.Note")
        );
        assert_eq!(
            Some(FolderKind::Calendar),
            FolderKind::from_container_class("IPF.Appointment")
        );
        assert_eq!(None, FolderKind::from_container_class("IPF.Unknown"));
    }

    #[test]
    fn check_supported_versions() {
        assert!(FolderKind::Inbox.supports_version(EXCHANGE_2007_SP1));
        assert!(!FolderKind::ArchiveInbox.supports_version(EXCHANGE_2007_SP1));
        assert!(FolderKind::ArchiveInbox.supports_version(EXCHANGE_2016));
    }
}
