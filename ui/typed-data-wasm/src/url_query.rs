//! Page URL as a [`QueryStore`].
//!
//! Every write replaces the current history entry, so editing the JSON does
//! not stack up back-button entries. Only the requested key is touched.

use tds_session::QueryStore;
use tracing::warn;
use wasm_bindgen::JsValue;
use web_sys::Url;

use crate::dom;

#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserQuery;

impl BrowserQuery {
    fn current_url() -> Option<Url> {
        let href = dom::window().location().href().ok()?;
        Url::new(&href).ok()
    }

    fn update(edit: impl FnOnce(&web_sys::UrlSearchParams)) {
        let Some(url) = Self::current_url() else {
            warn!("cannot read page URL, skipping query update");
            return;
        };
        edit(&url.search_params());

        let result = dom::window()
            .history()
            .and_then(|h| h.replace_state_with_url(&JsValue::NULL, "", Some(&url.href())));
        if let Err(e) = result {
            warn!(error = ?e, "history.replaceState failed");
        }
    }
}

impl QueryStore for BrowserQuery {
    fn get(&self, key: &str) -> Option<String> {
        Self::current_url()?.search_params().get(key)
    }

    fn set(&mut self, key: &str, value: &str) {
        Self::update(|params| params.set(key, value));
    }

    fn remove(&mut self, key: &str) {
        Self::update(|params| params.delete(key));
    }
}
