//! Wallet connectors over injected EIP-1193 providers.
//!
//! Providers are found through EIP-6963 announcements plus the legacy
//! `window.ethereum` object. All wallet protocol work happens inside the
//! extension; this module only issues JSON-RPC requests and listens for
//! `accountsChanged` / `chainChanged` / `disconnect`.

use async_trait::async_trait;
use js_sys::Reflect;
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::Value;
use tds_api_types::{
    AccountSnapshot, AccountStatus, ConnectStatus, ConnectorInfo, Eip6963ProviderInfo,
    ProviderRpcError, RpcRequest, methods, parse_chain_id,
};
use tds_session::{SignerError, TypedDataSigner};
use tracing::{debug, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::dom::{self, Elements};
use crate::render;
use crate::state;

pub const INJECTED_ID: &str = "injected";
const NOT_CONNECTED: &str = "Connector not connected.";

#[wasm_bindgen]
extern "C" {
    /// An EIP-1193 provider object injected by a wallet extension.
    #[derive(Clone, Debug)]
    pub type Eip1193Provider;

    #[wasm_bindgen(method, catch)]
    fn request(this: &Eip1193Provider, args: &JsValue) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn on(this: &Eip1193Provider, event: &str, listener: &js_sys::Function) -> Result<(), JsValue>;
}

#[derive(Clone, Debug)]
pub struct Connector {
    pub info: ConnectorInfo,
    provider: Eip1193Provider,
    subscribed: bool,
}

// ── JSON-RPC ──

fn rpc_error(value: JsValue) -> ProviderRpcError {
    let message = Reflect::get(&value, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .or_else(|| value.as_string())
        .unwrap_or_default();
    let code = Reflect::get(&value, &JsValue::from_str("code"))
        .ok()
        .and_then(|c| c.as_f64())
        .map(|c| c as i64)
        .unwrap_or_default();
    ProviderRpcError { code, message }
}

fn local_error(message: impl ToString) -> ProviderRpcError {
    ProviderRpcError {
        code: 0,
        message: message.to_string(),
    }
}

async fn rpc<P, R>(provider: &Eip1193Provider, method: &str, params: P) -> Result<R, ProviderRpcError>
where
    P: Serialize,
    R: DeserializeOwned,
{
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    let args = RpcRequest::new(method, params)
        .serialize(&serializer)
        .map_err(local_error)?;

    debug!(method, "provider request");
    let promise = provider.request(&args).map_err(rpc_error)?;
    let value = JsFuture::from(promise).await.map_err(rpc_error)?;
    serde_wasm_bindgen::from_value(value).map_err(local_error)
}

async fn establish(provider: &Eip1193Provider, method: &str) -> Result<AccountSnapshot, ProviderRpcError> {
    let addresses: Vec<String> = rpc(provider, method, Vec::<String>::new()).await?;
    let chain_id = match rpc::<_, String>(provider, methods::CHAIN_ID, Vec::<String>::new()).await {
        Ok(raw) => parse_chain_id(&raw),
        Err(e) => {
            warn!(error = %e.message, "eth_chainId failed");
            None
        }
    };

    let status = if addresses.is_empty() {
        AccountStatus::Disconnected
    } else {
        AccountStatus::Connected
    };
    Ok(AccountSnapshot {
        status,
        addresses,
        chain_id,
    })
}

// ── Discovery ──

fn injected_provider() -> Option<Eip1193Provider> {
    Reflect::get(&dom::window(), &JsValue::from_str("ethereum"))
        .ok()
        .filter(|v| v.is_object())
        .map(|v| v.unchecked_into::<Eip1193Provider>())
}

fn register(els: &Elements, info: ConnectorInfo, provider: Eip1193Provider) {
    let added = state::with_mut(|s| {
        if s.connectors.iter().any(|c| c.info.id == info.id) {
            return false;
        }
        debug!(id = %info.id, name = %info.name, "connector available");
        s.connectors.push(Connector {
            info,
            provider,
            subscribed: false,
        });
        true
    });
    if added {
        render::connectors(els);
    }
}

fn on_announce(els: &Elements, event: &web_sys::Event) {
    let Some(event) = event.dyn_ref::<web_sys::CustomEvent>() else {
        return;
    };
    let detail = event.detail();
    let info = Reflect::get(&detail, &JsValue::from_str("info"))
        .ok()
        .and_then(|i| serde_wasm_bindgen::from_value::<Eip6963ProviderInfo>(i).ok());
    let provider = Reflect::get(&detail, &JsValue::from_str("provider"))
        .ok()
        .filter(|p| p.is_object());

    match (info, provider) {
        (Some(info), Some(provider)) => register(els, info.into(), provider.unchecked_into()),
        _ => warn!("ignoring malformed eip6963:announceProvider event"),
    }
}

/// Collect available connectors. Announcements arriving later are added as
/// they come.
pub fn discover(els: &Elements) -> Result<(), JsValue> {
    if let Some(provider) = injected_provider() {
        let info = ConnectorInfo {
            id: INJECTED_ID.to_owned(),
            name: "Injected".to_owned(),
            rdns: None,
            icon: None,
        };
        register(els, info, provider);
    }

    let window = dom::window();
    let els2 = els.clone();
    let cb = Closure::wrap(Box::new(move |event: web_sys::Event| {
        on_announce(&els2, &event);
    }) as Box<dyn FnMut(_)>);
    window.add_event_listener_with_callback("eip6963:announceProvider", cb.as_ref().unchecked_ref())?;
    cb.forget();

    window.dispatch_event(&web_sys::Event::new("eip6963:requestProvider")?)?;
    Ok(())
}

// ── Subscriptions ──

fn on_accounts_changed(els: &Elements, connector_id: &str, accounts: JsValue) {
    let addresses: Vec<String> = serde_wasm_bindgen::from_value(accounts).unwrap_or_default();
    if state::with_mut(|s| s.accounts_changed(connector_id, addresses)) {
        render::account(els);
    }
}

fn on_chain_changed(els: &Elements, connector_id: &str, chain: JsValue) {
    let chain_id = chain.as_string().and_then(|c| parse_chain_id(&c));
    if state::with_mut(|s| s.chain_changed(connector_id, chain_id)) {
        render::account(els);
    }
}

fn on_provider_disconnect(els: &Elements, connector_id: &str) {
    if state::with_mut(|s| s.provider_disconnected(connector_id)) {
        info!(connector = connector_id, "provider disconnected");
        render::account(els);
    }
}

fn listen(provider: &Eip1193Provider, event: &str, cb: Closure<dyn FnMut(JsValue)>) {
    if let Err(e) = provider.on(event, cb.as_ref().unchecked_ref()) {
        warn!(event, error = ?e, "provider does not support event subscription");
    }
    cb.forget();
}

fn subscribe(els: &Elements, connector: &Connector) {
    if connector.subscribed {
        return;
    }
    let id = connector.info.id.clone();

    let (els2, id2) = (els.clone(), id.clone());
    listen(
        &connector.provider,
        "accountsChanged",
        Closure::wrap(Box::new(move |accounts: JsValue| {
            on_accounts_changed(&els2, &id2, accounts);
        }) as Box<dyn FnMut(JsValue)>),
    );

    let (els2, id2) = (els.clone(), id.clone());
    listen(
        &connector.provider,
        "chainChanged",
        Closure::wrap(Box::new(move |chain: JsValue| {
            on_chain_changed(&els2, &id2, chain);
        }) as Box<dyn FnMut(JsValue)>),
    );

    let (els2, id2) = (els.clone(), id.clone());
    listen(
        &connector.provider,
        "disconnect",
        Closure::wrap(Box::new(move |_: JsValue| {
            on_provider_disconnect(&els2, &id2);
        }) as Box<dyn FnMut(JsValue)>),
    );

    state::with_mut(|s| {
        if let Some(c) = s.connectors.iter_mut().find(|c| c.info.id == id) {
            c.subscribed = true;
        }
    });
}

fn activate(els: &Elements, connector: &Connector, account: AccountSnapshot) {
    state::with_mut(|s| {
        s.account = account;
        s.active_connector = Some(connector.info.id.clone());
    });
    subscribe(els, connector);
}

// ── Commands ──

/// Ask the wallet for account access.
pub async fn connect(els: &Elements, connector_id: &str) {
    let Some(connector) = state::connector(connector_id) else {
        warn!(connector = connector_id, "unknown connector");
        return;
    };

    state::with_mut(|s| s.account.status = AccountStatus::Connecting);
    state::set_connect_result(ConnectStatus::Pending, None);
    render::account(els);
    render::connect_status(els);

    let result = match establish(&connector.provider, methods::REQUEST_ACCOUNTS).await {
        Ok(account) if account.is_connected() => Ok(account),
        Ok(_) => Err(local_error("Wallet returned no accounts.")),
        Err(e) => Err(e),
    };

    match result {
        Ok(account) => {
            info!(connector = connector_id, chain_id = ?account.chain_id, "connected");
            activate(els, &connector, account);
            state::remember_connector(connector_id);
            state::set_connect_result(ConnectStatus::Success, None);
        }
        Err(e) => {
            if e.is_user_rejection() {
                info!(connector = connector_id, "connect request rejected by user");
            } else {
                warn!(connector = connector_id, code = e.code, error = %e.message, "connect failed");
            }
            state::set_account(AccountSnapshot::default());
            state::set_connect_result(ConnectStatus::Error, Some(e.message));
        }
    }

    render::account(els);
    render::connect_status(els);
}

/// Silently restore the most recently used connector, if the wallet still
/// grants account access.
pub async fn reconnect(els: &Elements, discovery_ms: u32) {
    let Some(recent) = state::recent_connector_id() else {
        return;
    };
    gloo_timers::future::TimeoutFuture::new(discovery_ms).await;

    let Some(connector) = state::connector(&recent) else {
        debug!(connector = %recent, "recent connector not announced, skipping reconnect");
        return;
    };

    state::with_mut(|s| s.account.status = AccountStatus::Reconnecting);
    render::account(els);

    match establish(&connector.provider, methods::ACCOUNTS).await {
        Ok(account) if account.is_connected() => {
            info!(connector = %recent, "reconnected");
            activate(els, &connector, account);
        }
        Ok(_) => state::set_account(AccountSnapshot::default()),
        Err(e) => {
            debug!(connector = %recent, error = %e.message, "reconnect failed");
            state::set_account(AccountSnapshot::default());
        }
    }

    render::account(els);
}

pub async fn disconnect(els: &Elements) {
    if let Some(connector) = state::active_connector() {
        let params = vec![serde_json::json!({ "eth_accounts": {} })];
        if let Err(e) =
            rpc::<_, IgnoredAny>(&connector.provider, methods::REVOKE_PERMISSIONS, params).await
        {
            debug!(error = %e.message, "wallet_revokePermissions not honoured");
        }
    }

    state::forget_connector();
    state::with_mut(|s| {
        s.account = AccountSnapshot::default();
        s.active_connector = None;
    });
    state::set_connect_result(ConnectStatus::Idle, None);
    render::account(els);
    render::connect_status(els);
}

// ── Signing ──

/// Signs with whichever connector is active when constructed.
pub struct ActiveSigner {
    provider: Option<Eip1193Provider>,
    address: Option<String>,
}

impl ActiveSigner {
    pub fn current() -> Self {
        let account = state::account();
        Self {
            provider: state::active_connector().map(|c| c.provider),
            address: account.primary_address().map(str::to_owned),
        }
    }
}

#[async_trait(?Send)]
impl TypedDataSigner for ActiveSigner {
    async fn sign_typed_data(&self, payload: Value) -> Result<String, SignerError> {
        let (Some(provider), Some(address)) = (&self.provider, &self.address) else {
            return Err(SignerError::new(NOT_CONNECTED));
        };
        let typed_data = serde_json::to_string(&payload).map_err(|e| SignerError::new(e.to_string()))?;

        rpc(provider, methods::SIGN_TYPED_DATA_V4, vec![address.clone(), typed_data])
            .await
            .map_err(|e| SignerError::new(e.message))
    }
}
