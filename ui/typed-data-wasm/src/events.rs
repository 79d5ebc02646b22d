//! Event binding.
//!
//! Wires the textarea and the static buttons. Connector buttons are bound
//! as they are rendered (see `render::connectors`).

use async_trait::async_trait;
use serde_json::Value;
use tds_session::{SignerError, TypedDataSigner};
use tracing::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::connector::{self, ActiveSigner};
use crate::dom::{self, Elements};
use crate::render;
use crate::state::{self, AppState};

/// Helper: attach async click handler to an HtmlElement.
macro_rules! on_click_async {
    ($el:expr, $els:expr, $handler:expr) => {{
        let els = $els.clone();
        let cb = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
            let els2 = els.clone();
            wasm_bindgen_futures::spawn_local(async move {
                $handler(&els2).await;
            });
        }) as Box<dyn FnMut(_)>);
        $el.add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())?;
        cb.forget();
    }};
}

/// Bind all UI event listeners. Call once after init.
pub fn bind_events(els: &Elements) -> Result<(), JsValue> {
    {
        let els2 = els.clone();
        let cb = Closure::wrap(Box::new(move |_: web_sys::Event| {
            on_input(&els2);
        }) as Box<dyn FnMut(_)>);
        els.json_input
            .add_event_listener_with_callback("input", cb.as_ref().unchecked_ref())?;
        cb.forget();
    }

    on_click_async!(els.sign_btn, els, on_sign);
    on_click_async!(els.disconnect_btn, els, connector::disconnect);

    Ok(())
}

fn on_input(els: &Elements) {
    let text = els.json_input.value();
    let action = state::with_mut(|s| s.session.as_mut().map(|session| session.on_text_changed(text)));
    if let Some(action) = action {
        debug!(?action, "session text changed");
    }
    dom::autosize(&els.json_input);
}

/// Runs `on_issue` only once the session actually hands a payload to the
/// wrapped signer, so an unparseable click leaves the page untouched.
struct Submitting<S, F> {
    signer: S,
    on_issue: F,
}

#[async_trait(?Send)]
impl<S, F> TypedDataSigner for Submitting<S, F>
where
    S: TypedDataSigner,
    F: Fn(),
{
    async fn sign_typed_data(&self, payload: Value) -> Result<String, SignerError> {
        (self.on_issue)();
        self.signer.sign_typed_data(payload).await
    }
}

/// "Sign Typed Data" click.
pub async fn on_sign(els: &Elements) {
    let Some(session) = state::session_snapshot() else {
        return;
    };
    let signer = Submitting {
        signer: ActiveSigner::current(),
        on_issue: || {
            state::with_mut(AppState::begin_sign_request);
            render::signature(els);
        },
    };

    let outcome = session.request_signature(&signer).await;
    if state::with_mut(|s| s.finish_sign_request(outcome)) {
        render::signature(els);
    }
}
