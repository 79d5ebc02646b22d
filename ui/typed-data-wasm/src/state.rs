//! Global application state.
//!
//! Uses `RefCell`-wrapped `thread_local!` storage (WASM is single-threaded).
//! Never hold a borrow across an `.await`; snapshot what you need first.

use gloo_storage::{LocalStorage, Storage};
use std::cell::RefCell;
use tds_api_types::{AccountSnapshot, AccountStatus, ConnectStatus, ConnectorInfo};
use tds_session::{SessionController, SignOutcome};
use tracing::warn;

use crate::connector::Connector;
use crate::url_query::BrowserQuery;

const RECENT_CONNECTOR_KEY: &str = "tds.recentConnectorId";

pub type Session = SessionController<BrowserQuery>;

/// Central application state.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    pub session: Option<Session>,
    pub account: AccountSnapshot,
    pub connect_status: ConnectStatus,
    pub connect_error: Option<String>,
    pub connectors: Vec<Connector>,
    pub active_connector: Option<String>,
    pub signature: Option<String>,
    pub sign_error: Option<String>,
}

// ── Transitions ──
//
// Each returns whether the page needs re-rendering.

impl AppState {
    fn is_active(&self, connector_id: &str) -> bool {
        self.active_connector.as_deref() == Some(connector_id)
    }

    fn reset_account(&mut self) {
        self.account = AccountSnapshot::default();
        self.active_connector = None;
    }

    /// `accountsChanged`; an empty list means the wallet dropped access.
    pub fn accounts_changed(&mut self, connector_id: &str, addresses: Vec<String>) -> bool {
        if !self.is_active(connector_id) {
            return false;
        }
        if addresses.is_empty() {
            self.reset_account();
        } else {
            self.account.status = AccountStatus::Connected;
            self.account.addresses = addresses;
        }
        true
    }

    pub fn chain_changed(&mut self, connector_id: &str, chain_id: Option<u64>) -> bool {
        if !self.is_active(connector_id) {
            return false;
        }
        self.account.chain_id = chain_id;
        true
    }

    pub fn provider_disconnected(&mut self, connector_id: &str) -> bool {
        if !self.is_active(connector_id) {
            return false;
        }
        self.reset_account();
        true
    }

    /// A signature request is about to reach the wallet.
    pub fn begin_sign_request(&mut self) {
        self.signature = None;
        self.sign_error = None;
    }

    pub fn finish_sign_request(&mut self, outcome: SignOutcome) -> bool {
        match outcome {
            SignOutcome::Skipped => return false,
            SignOutcome::Signed(signature) => {
                self.signature = Some(signature);
                self.sign_error = None;
            }
            SignOutcome::Failed(e) => {
                self.signature = None;
                self.sign_error = Some(e.display_message().to_owned());
            }
        }
        true
    }
}

// ── Thread-local singleton ──

thread_local! {
    static STATE: RefCell<AppState> = RefCell::new(AppState::default());
}

/// Run a closure with shared read access to the state.
pub fn with<F, R>(f: F) -> R
where
    F: FnOnce(&AppState) -> R,
{
    STATE.with(|s| f(&s.borrow()))
}

/// Run a closure with mutable access to the state.
pub fn with_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut AppState) -> R,
{
    STATE.with(|s| f(&mut s.borrow_mut()))
}

// ── Convenience accessors ──

pub fn set_session(session: Session) {
    with_mut(|s| s.session = Some(session));
}

/// Copy of the session, safe to hold across an `.await`.
pub fn session_snapshot() -> Option<Session> {
    with(|s| s.session.clone())
}

pub fn account() -> AccountSnapshot {
    with(|s| s.account.clone())
}

pub fn set_account(account: AccountSnapshot) {
    with_mut(|s| s.account = account);
}

pub fn connector(id: &str) -> Option<Connector> {
    with(|s| s.connectors.iter().find(|c| c.info.id == id).cloned())
}

pub fn connector_infos() -> Vec<ConnectorInfo> {
    with(|s| s.connectors.iter().map(|c| c.info.clone()).collect())
}

pub fn active_connector() -> Option<Connector> {
    with(|s| {
        let id = s.active_connector.as_deref()?;
        s.connectors.iter().find(|c| c.info.id == id).cloned()
    })
}

pub fn set_connect_result(status: ConnectStatus, error: Option<String>) {
    with_mut(|s| {
        s.connect_status = status;
        s.connect_error = error;
    });
}

// ── localStorage helpers ──

pub fn recent_connector_id() -> Option<String> {
    LocalStorage::get(RECENT_CONNECTOR_KEY).ok()
}

pub fn remember_connector(id: &str) {
    if let Err(e) = LocalStorage::set(RECENT_CONNECTOR_KEY, id) {
        warn!(connector = id, error = %e, "failed to remember connector");
    }
}

pub fn forget_connector() {
    LocalStorage::delete(RECENT_CONNECTOR_KEY);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tds_session::SignerError;

    const ADDR: &str = "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826";

    fn connected_to(id: &str) -> AppState {
        AppState {
            account: AccountSnapshot {
                status: AccountStatus::Connected,
                addresses: vec![ADDR.to_owned()],
                chain_id: Some(1),
            },
            active_connector: Some(id.to_owned()),
            ..AppState::default()
        }
    }

    #[test]
    fn events_from_inactive_connector_are_ignored() {
        let mut state = connected_to("io.metamask");
        let before = state.account.clone();

        assert!(!state.accounts_changed("com.coinbase.wallet", vec![]));
        assert!(!state.chain_changed("com.coinbase.wallet", Some(10)));
        assert!(!state.provider_disconnected("com.coinbase.wallet"));

        assert_eq!(state.account, before);
        assert_eq!(state.active_connector.as_deref(), Some("io.metamask"));
    }

    #[test]
    fn events_before_any_connection_are_ignored() {
        let mut state = AppState::default();
        assert!(!state.accounts_changed("injected", vec![ADDR.to_owned()]));
        assert_eq!(state.account, AccountSnapshot::default());
    }

    #[test]
    fn active_connector_updates_account_and_chain() {
        let mut state = connected_to("injected");
        let other = "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB".to_owned();

        assert!(state.accounts_changed("injected", vec![other.clone()]));
        assert!(state.chain_changed("injected", Some(11_155_111)));

        assert_eq!(state.account.addresses, vec![other]);
        assert_eq!(state.account.chain_id, Some(11_155_111));
        assert!(state.account.is_connected());
    }

    #[test]
    fn empty_accounts_or_disconnect_drop_the_connection() {
        for disconnect in [true, false] {
            let mut state = connected_to("injected");
            let changed = if disconnect {
                state.provider_disconnected("injected")
            } else {
                state.accounts_changed("injected", vec![])
            };
            assert!(changed);
            assert_eq!(state.account, AccountSnapshot::default());
            assert_eq!(state.active_connector, None);
        }
    }

    #[test]
    fn skipped_sign_request_leaves_previous_result() {
        let mut state = AppState {
            signature: Some("0xabc".to_owned()),
            ..AppState::default()
        };
        assert!(!state.finish_sign_request(SignOutcome::Skipped));
        assert_eq!(state.signature.as_deref(), Some("0xabc"));
    }

    #[test]
    fn sign_results_replace_each_other() {
        let mut state = AppState::default();

        assert!(state.finish_sign_request(SignOutcome::Failed(SignerError::new(""))));
        assert_eq!(state.sign_error.as_deref(), Some("An error occurred while signing"));
        assert_eq!(state.signature, None);

        assert!(state.finish_sign_request(SignOutcome::Signed("0xabc".to_owned())));
        assert_eq!(state.signature.as_deref(), Some("0xabc"));
        assert_eq!(state.sign_error, None);

        state.begin_sign_request();
        assert_eq!((state.signature, state.sign_error), (None, None));
    }
}
