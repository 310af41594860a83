//! User-facing message catalog
//!
//! A small key → text lookup for the strings the library itself emits
//! (success messages and default notification titles). Unknown locales and
//! missing keys fall back to English.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Supported locales
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Fr,
    Es,
}

impl Locale {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fr => "fr",
            Self::Es => "es",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = crate::TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept region-qualified tags such as `fr-CA` or `es_MX`
        let lang = s
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_lowercase();
        match lang.as_str() {
            "en" => Ok(Self::En),
            "fr" => Ok(Self::Fr),
            "es" => Ok(Self::Es),
            _ => Err(crate::TodoError::validation(format!(
                "Unsupported locale '{s}'. Must be one of: {}",
                todo_sync_common::SUPPORTED_LOCALES.join(", ")
            ))),
        }
    }
}

/// Keys of the texts the library emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    TaskCreated,
    TaskUpdated,
    TaskDeleted,
    TaskMarkedComplete,
    TaskMarkedIncomplete,
    TitleSuccess,
    TitleError,
    TitleInfo,
    TitleWarning,
}

type Table = HashMap<MessageKey, &'static str>;

static EN: Lazy<Table> = Lazy::new(|| {
    HashMap::from([
        (MessageKey::TaskCreated, "Task created successfully"),
        (MessageKey::TaskUpdated, "Task updated successfully"),
        (MessageKey::TaskDeleted, "Task deleted successfully"),
        (MessageKey::TaskMarkedComplete, "Task marked as complete"),
        (MessageKey::TaskMarkedIncomplete, "Task marked as incomplete"),
        (MessageKey::TitleSuccess, "Success"),
        (MessageKey::TitleError, "Error"),
        (MessageKey::TitleInfo, "Information"),
        (MessageKey::TitleWarning, "Warning"),
    ])
});

static FR: Lazy<Table> = Lazy::new(|| {
    HashMap::from([
        (MessageKey::TaskCreated, "Tâche créée avec succès"),
        (MessageKey::TaskUpdated, "Tâche mise à jour avec succès"),
        (MessageKey::TaskDeleted, "Tâche supprimée avec succès"),
        (MessageKey::TaskMarkedComplete, "Tâche marquée comme terminée"),
        (MessageKey::TaskMarkedIncomplete, "Tâche marquée comme non terminée"),
        (MessageKey::TitleSuccess, "Succès"),
        (MessageKey::TitleError, "Erreur"),
        (MessageKey::TitleInfo, "Information"),
        (MessageKey::TitleWarning, "Avertissement"),
    ])
});

static ES: Lazy<Table> = Lazy::new(|| {
    HashMap::from([
        (MessageKey::TaskCreated, "Tarea creada con éxito"),
        (MessageKey::TaskUpdated, "Tarea actualizada con éxito"),
        (MessageKey::TaskDeleted, "Tarea eliminada con éxito"),
        (MessageKey::TaskMarkedComplete, "Tarea marcada como completada"),
        (MessageKey::TaskMarkedIncomplete, "Tarea marcada como pendiente"),
        (MessageKey::TitleSuccess, "Éxito"),
        (MessageKey::TitleError, "Error"),
        (MessageKey::TitleInfo, "Información"),
        (MessageKey::TitleWarning, "Advertencia"),
    ])
});

/// Lookup of message texts for the selected locale
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Catalog {
    locale: Locale,
}

impl Catalog {
    #[must_use]
    pub const fn new(locale: Locale) -> Self {
        Self { locale }
    }

    #[must_use]
    pub const fn locale(&self) -> Locale {
        self.locale
    }

    /// Text for `key` in the selected locale, English when missing
    #[must_use]
    pub fn text(&self, key: MessageKey) -> &'static str {
        let table: &Table = match self.locale {
            Locale::En => &EN,
            Locale::Fr => &FR,
            Locale::Es => &ES,
        };
        table
            .get(&key)
            .or_else(|| EN.get(&key))
            .copied()
            .unwrap_or_default()
    }
}
