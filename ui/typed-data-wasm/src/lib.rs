//! Typed Data Signer WASM frontend
//!
//! Paste EIP-712 typed data, keep it in the page URL, and ask a connected
//! browser wallet to sign it. Each concern lives in its own module.

pub mod config;
pub mod connector;
pub mod dom;
pub mod events;
pub mod render;
pub mod state;
pub mod url_query;

use tds_session::{SessionConfig, SessionController};
use tracing::info;
use wasm_bindgen::prelude::*;

/// WASM entry point – called automatically when the module is instantiated.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    // Improve panic messages in the browser console
    console_error_panic_hook::set_once();

    init().await
}

/// Main initialisation sequence.
pub async fn init() -> Result<(), JsValue> {
    let els = dom::Elements::bind()?;

    let config = config::PageConfig::from_element(&els.root);
    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(config.log_level)
            .build(),
    );

    // Session text comes from the URL once; from here on the URL only follows it
    let session_config = SessionConfig::default().with_query_key(&config.query_key);
    let session = SessionController::initialize_with(url_query::BrowserQuery, session_config);
    els.json_input.set_value(session.raw_text());
    state::set_session(session);

    render::all(&els);
    events::bind_events(&els)?;

    connector::discover(&els)?;
    connector::reconnect(&els, config.discovery_ms).await;

    info!(query_key = %config.query_key, "typed data signer ready");
    Ok(())
}
