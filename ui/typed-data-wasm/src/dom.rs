//! DOM element bindings.
//!
//! All fields are resolved once at startup by `Elements::bind()`.
//! A missing element aborts startup with the element id in the error.

use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlButtonElement, HtmlElement, HtmlTextAreaElement};

// ── Helpers ──

fn doc() -> Document {
    window().document().expect("window has no document")
}

pub fn window() -> web_sys::Window {
    web_sys::window().expect("no global window")
}

pub fn by_id(id: &str) -> Option<Element> {
    doc().get_element_by_id(id)
}

pub fn by_id_typed<T: JsCast>(id: &str) -> Option<T> {
    by_id(id).and_then(|e| e.dyn_into::<T>().ok())
}

pub fn set_text(el: &Element, text: &str) {
    el.set_text_content(Some(text));
}

pub fn clear(el: &Element) {
    el.set_inner_html("");
}

pub fn set_hidden(el: &HtmlElement, hidden: bool) {
    el.set_hidden(hidden);
}

pub fn create_element(tag: &str) -> Result<Element, JsValue> {
    doc().create_element(tag)
}

/// Grow or shrink a textarea to fit its content.
pub fn autosize(el: &HtmlTextAreaElement) {
    let style = el.style();
    let _ = style.set_property("height", "auto");
    let _ = style.set_property("height", &format!("{}px", el.scroll_height()));
}

// ── Elements struct ──

/// All DOM element references used by the signer page.
/// Clone-friendly (all inner types are reference-counted via JS GC).
#[derive(Clone)]
pub struct Elements {
    pub root: HtmlElement,

    // Account
    pub account_status: Element,
    pub account_addresses: Element,
    pub account_chain: Element,
    pub disconnect_btn: HtmlButtonElement,

    // Connect
    pub connector_list: Element,
    pub connect_status: Element,
    pub connect_error: Element,

    // Sign
    pub json_input: HtmlTextAreaElement,
    pub sign_error: HtmlElement,
    pub sign_btn: HtmlButtonElement,
    pub signature_block: HtmlElement,
    pub signature_output: Element,
}

macro_rules! get_el {
    ($id:expr) => {
        by_id($id).ok_or_else(|| JsValue::from_str(&format!("missing element #{}", $id)))?
    };
}

macro_rules! get_typed {
    ($ty:ty, $id:expr) => {
        by_id_typed::<$ty>($id).ok_or_else(|| {
            JsValue::from_str(&format!("missing {} #{}", stringify!($ty), $id))
        })?
    };
}

impl Elements {
    /// Resolve all DOM references. Call once after DOMContentLoaded.
    pub fn bind() -> Result<Elements, JsValue> {
        Ok(Elements {
            root: get_typed!(HtmlElement, "app"),

            account_status: get_el!("accountStatus"),
            account_addresses: get_el!("accountAddresses"),
            account_chain: get_el!("accountChainId"),
            disconnect_btn: get_typed!(HtmlButtonElement, "disconnectBtn"),

            connector_list: get_el!("connectorList"),
            connect_status: get_el!("connectStatus"),
            connect_error: get_el!("connectError"),

            json_input: get_typed!(HtmlTextAreaElement, "jsonInput"),
            sign_error: get_typed!(HtmlElement, "signError"),
            sign_btn: get_typed!(HtmlButtonElement, "signBtn"),
            signature_block: get_typed!(HtmlElement, "signatureBlock"),
            signature_output: get_el!("signatureOutput"),
        })
    }
}
