// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! The localStorage slot that holds the serialized card book.

use wasm_bindgen::prelude::*;
use web_sys::Storage as WebStorage;

pub struct Storage {
    key: &'static str,
    /// Absent when the page has no localStorage; the book then lives only in
    /// memory.
    inner: Option<WebStorage>,
}

impl Storage {
    pub fn open(key: &'static str) -> Self {
        let inner = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        if inner.is_none() {
            web_sys::console::warn_1(&"localStorage unavailable, cards will not persist".into());
        }
        Self { key, inner }
    }

    pub fn load(&self) -> Result<Option<String>, JsValue> {
        match &self.inner {
            Some(storage) => storage.get_item(self.key),
            None => Ok(None),
        }
    }

    pub fn save(&self, data: &str) -> Result<(), JsValue> {
        match &self.inner {
            Some(storage) => storage.set_item(self.key, data),
            None => Ok(()),
        }
    }
}
