//! Rendering of state into the bound elements.
//!
//! Each function reads the current state and rewrites one area of the page.
//! Call after any state change that affects that area.

use tracing::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::connector;
use crate::dom::{self, Elements};
use crate::state;

/// Addresses as a JSON array; nothing while there are none.
pub fn format_addresses(addresses: &[String]) -> String {
    if addresses.is_empty() {
        return String::new();
    }
    serde_json::to_string(addresses).unwrap_or_default()
}

pub fn format_chain_id(chain_id: Option<u64>) -> String {
    chain_id.map(|id| id.to_string()).unwrap_or_default()
}

pub fn account(els: &Elements) {
    let account = state::account();
    dom::set_text(&els.account_status, account.status.as_str());
    dom::set_text(&els.account_addresses, &format_addresses(&account.addresses));
    dom::set_text(&els.account_chain, &format_chain_id(account.chain_id));

    let connected = account.is_connected();
    dom::set_hidden(&els.disconnect_btn, !connected);
    els.sign_btn.set_disabled(!connected);
}

pub fn connect_status(els: &Elements) {
    let (status, error) = state::with(|s| (s.connect_status, s.connect_error.clone()));
    dom::set_text(&els.connect_status, status.as_str());
    dom::set_text(&els.connect_error, error.as_deref().unwrap_or_default());
}

fn connector_button(els: &Elements, id: &str, name: &str) -> Result<web_sys::Element, JsValue> {
    let btn = dom::create_element("button")?;
    btn.set_attribute("type", "button")?;
    btn.set_attribute("data-connector", id)?;
    dom::set_text(&btn, name);

    let (els2, id2) = (els.clone(), id.to_owned());
    let cb = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
        let (els3, id3) = (els2.clone(), id2.clone());
        wasm_bindgen_futures::spawn_local(async move {
            connector::connect(&els3, &id3).await;
        });
    }) as Box<dyn FnMut(_)>);
    btn.add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())?;
    cb.forget();

    Ok(btn)
}

/// Rebuild the connector button list.
pub fn connectors(els: &Elements) {
    let list = &els.connector_list;
    dom::clear(list);

    for info in state::connector_infos() {
        let appended = connector_button(els, &info.id, &info.name)
            .and_then(|btn| list.append_child(&btn).map(|_| ()));
        if let Err(e) = appended {
            warn!(connector = %info.id, error = ?e, "failed to render connector button");
        }
    }
}

pub fn signature(els: &Elements) {
    let (signature, error) = state::with(|s| (s.signature.clone(), s.sign_error.clone()));

    match error {
        Some(message) => {
            dom::set_text(&els.sign_error, &message);
            dom::set_hidden(&els.sign_error, false);
        }
        None => {
            dom::set_text(&els.sign_error, "");
            dom::set_hidden(&els.sign_error, true);
        }
    }

    match signature {
        Some(sig) => {
            dom::set_text(&els.signature_output, &sig);
            dom::set_hidden(&els.signature_block, false);
        }
        None => {
            dom::set_text(&els.signature_output, "");
            dom::set_hidden(&els.signature_block, true);
        }
    }
}

pub fn all(els: &Elements) {
    account(els);
    connect_status(els);
    connectors(els);
    signature(els);
    dom::autosize(&els.json_input);
}
