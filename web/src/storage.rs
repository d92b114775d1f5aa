use egdle_core::{Storage, StorageError};
use wasm_bindgen::JsValue;

/// The browser's `localStorage`, missing when the page may not use it.
pub struct LocalStorageBackend {
    storage: Option<web_sys::Storage>,
}

impl LocalStorageBackend {
    pub fn new() -> Self {
        let storage = gloo::utils::window().local_storage().ok().flatten();
        if storage.is_none() {
            log::warn!("localStorage is not available, nothing will be saved");
        }
        Self { storage }
    }

    fn raw(&self) -> Result<&web_sys::Storage, StorageError> {
        self.storage.as_ref().ok_or(StorageError::Unavailable)
    }
}

impl Default for LocalStorageBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn backend_error(err: JsValue) -> StorageError {
    StorageError::Backend(format!("{:?}", err))
}

impl Storage for LocalStorageBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.raw()?.get_item(key).map_err(backend_error)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.raw()?.set_item(key, value).map_err(backend_error)
    }
}
