//! 浏览器 localStorage 中保存的卡组。

use wasm_bindgen::JsValue;
use web_sys::Storage;

use crate::game::{Deck, DeckRepository, StorageError, SAVED_DECK_KEY};

pub struct LocalStorageDeckRepository {
    storage: Storage,
}

impl LocalStorageDeckRepository {
    pub fn from_window() -> Result<Self, StorageError> {
        let window = web_sys::window().ok_or(StorageError::Unavailable)?;
        let storage = window
            .local_storage()
            .map_err(backend_error)?
            .ok_or(StorageError::Unavailable)?;
        Ok(Self { storage })
    }
}

fn backend_error(value: JsValue) -> StorageError {
    StorageError::Backend(value.as_string().unwrap_or_else(|| format!("{value:?}")))
}

impl DeckRepository for LocalStorageDeckRepository {
    fn load_saved_deck(&self) -> Result<Option<Deck>, StorageError> {
        let Some(json) = self
            .storage
            .get_item(SAVED_DECK_KEY)
            .map_err(backend_error)?
        else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn save_deck(&mut self, deck: &Deck) -> Result<(), StorageError> {
        let json = serde_json::to_string(deck)?;
        self.storage
            .set_item(SAVED_DECK_KEY, &json)
            .map_err(backend_error)
    }

    fn clear_deck(&mut self) -> Result<(), StorageError> {
        self.storage
            .remove_item(SAVED_DECK_KEY)
            .map_err(backend_error)
    }
}
