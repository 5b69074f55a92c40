use crate::models::Note;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use thiserror::Error;

const NOTES_KEY_PREFIX: &str = "notes-";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage is not available")]
    Unavailable,
    #[error("failed to read `{key}`: {message}")]
    Read { key: String, message: String },
    #[error("failed to write `{key}`: {message}")]
    Write { key: String, message: String },
    #[error("failed to serialize value: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Synchronous string key-value store.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set_item(key, value)
    }
}

/// `window.localStorage`.
pub struct BrowserStorage {
    storage: web_sys::Storage,
}

impl BrowserStorage {
    pub fn open() -> StorageResult<Self> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .ok_or(StorageError::Unavailable)?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for BrowserStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        self.storage.get_item(key).map_err(|e| StorageError::Read {
            key: key.to_string(),
            message: format!("{e:?}"),
        })
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        // Quota errors surface here.
        self.storage.set_item(key, value).map_err(|e| StorageError::Write {
            key: key.to_string(),
            message: format!("{e:?}"),
        })
    }
}

/// In-memory store. Backs tests, and the widget when `localStorage` is blocked.
#[derive(Default)]
pub struct MemoryStorage {
    items: RefCell<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Open `localStorage`, falling back to memory when the browser refuses it.
pub fn open_default_store() -> Box<dyn KeyValueStore> {
    match BrowserStorage::open() {
        Ok(storage) => Box::new(storage),
        Err(e) => {
            log::warn!("event=storage_open module=storage status=fallback error={e}");
            Box::new(MemoryStorage::new())
        }
    }
}

pub(crate) fn load_json<T: for<'de> Deserialize<'de>, S: KeyValueStore + ?Sized>(
    store: &S,
    key: &str,
) -> StorageResult<Option<T>> {
    let Some(json) = store.get_item(key)? else {
        return Ok(None);
    };
    Ok(Some(serde_json::from_str(&json)?))
}

pub(crate) fn save_json<T: Serialize + ?Sized, S: KeyValueStore + ?Sized>(
    store: &S,
    key: &str,
    value: &T,
) -> StorageResult<()> {
    let json = serde_json::to_string(value)?;
    store.set_item(key, &json)
}

pub fn notes_key(widget_id: &str) -> String {
    format!("{NOTES_KEY_PREFIX}{widget_id}")
}

/// The persisted note list of one widget instance.
pub struct NoteStore<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> NoteStore<S> {
    pub fn new(store: S, widget_id: &str) -> Self {
        Self {
            store,
            key: notes_key(widget_id),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Stored notes in display order.
    ///
    /// A missing key, an unreadable store and corrupt JSON all yield an empty
    /// list; the latter two are logged.
    pub fn load(&self) -> Vec<Note> {
        match load_json::<Vec<Note>, _>(&self.store, &self.key) {
            Ok(notes) => notes.unwrap_or_default(),
            Err(e) => {
                log::warn!(
                    "event=notes_load module=storage status=fallback key={} error={e}",
                    self.key
                );
                Vec::new()
            }
        }
    }

    /// Overwrite the stored list with `notes`.
    pub fn save(&self, notes: &[Note]) -> StorageResult<()> {
        save_json(&self.store, &self.key, notes)
    }

    #[cfg(test)]
    pub(crate) fn raw(&self) -> Option<String> {
        self.store.get_item(&self.key).ok().flatten()
    }
}
