//! Session Sync Controller.
//!
//! Owns the editable JSON text. The URL is read once at initialization and
//! afterwards only written, through [`sync_query`], after every text change.

use serde_json::Value;
use tracing::{debug, error, trace};

use crate::codec;
use crate::config::SessionConfig;
use crate::error::{SessionError, SignerError};
use crate::query::QueryStore;
use crate::signer::TypedDataSigner;

/// What the URL-sync rule did with the query parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncAction {
    /// Text was empty; the parameter is gone.
    Removed,
    /// Text was valid JSON; the parameter now holds this base64 value.
    Written(String),
    /// Text was not valid JSON; the parameter was left as it was.
    Retained,
}

/// Result of [`SessionController::request_signature`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignOutcome {
    /// Text did not parse; the signer was never called.
    Skipped,
    Signed(String),
    Failed(SignerError),
}

/// Apply the URL-sync rule for `raw_text` to `query`.
pub fn sync_query<Q: QueryStore + ?Sized>(raw_text: &str, key: &str, query: &mut Q) -> SyncAction {
    if raw_text.is_empty() {
        query.remove(key);
        return SyncAction::Removed;
    }

    match codec::parse(raw_text) {
        Ok(_) => {
            let encoded = codec::encode(raw_text);
            query.set(key, &encoded);
            SyncAction::Written(encoded)
        }
        Err(e) => {
            trace!(error = %e, "session text is not valid JSON, keeping query parameter");
            SyncAction::Retained
        }
    }
}

#[derive(Clone, Debug)]
pub struct SessionController<Q> {
    raw_text: String,
    query: Q,
    config: SessionConfig,
}

impl<Q: QueryStore> SessionController<Q> {
    pub fn initialize(query: Q) -> Self {
        Self::initialize_with(query, SessionConfig::default())
    }

    /// Decode the starting text from `query`, then run the sync rule once.
    ///
    /// A parameter that fails to decode or parse yields empty text.
    pub fn initialize_with(query: Q, config: SessionConfig) -> Self {
        let raw_text = match query.get(&config.query_key) {
            Some(param) => codec::decode_pretty(&param).unwrap_or_else(|e| {
                debug!(error = %e, key = %config.query_key, "ignoring undecodable session parameter");
                String::new()
            }),
            None => String::new(),
        };

        let mut controller = Self {
            raw_text,
            query,
            config,
        };
        controller.sync();
        controller
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn query(&self) -> &Q {
        &self.query
    }

    /// Current value of the session query parameter.
    pub fn query_param(&self) -> Option<String> {
        self.query.get(&self.config.query_key)
    }

    /// Accept `new_text` as-is and sync the URL.
    pub fn on_text_changed(&mut self, new_text: impl Into<String>) -> SyncAction {
        self.raw_text = new_text.into();
        self.sync()
    }

    pub fn parsed(&self) -> Result<Value, SessionError> {
        codec::parse(&self.raw_text)
    }

    /// Parsed text ready to hand to a signer, or `None` (logged) if it does
    /// not parse.
    pub fn typed_data(&self) -> Option<Value> {
        match self.parsed() {
            Ok(value) => Some(value),
            Err(e) => {
                error!(error = %e, "JSON parsing error, not requesting a signature");
                None
            }
        }
    }

    /// Forward the parsed text to `signer` verbatim.
    pub async fn request_signature<S>(&self, signer: &S) -> SignOutcome
    where
        S: TypedDataSigner + ?Sized,
    {
        let Some(payload) = self.typed_data() else {
            return SignOutcome::Skipped;
        };

        match signer.sign_typed_data(payload).await {
            Ok(signature) => SignOutcome::Signed(signature),
            Err(e) => {
                debug!(error = %e, "signer rejected typed data");
                SignOutcome::Failed(e)
            }
        }
    }

    fn sync(&mut self) -> SyncAction {
        sync_query(&self.raw_text, &self.config.query_key, &mut self.query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::MemoryQuery;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;
    use std::cell::RefCell;

    const MAIL: &str = r#"{
  "types": {
    "EIP712Domain": [{ "name": "name", "type": "string" }],
    "Person": [
      { "name": "name", "type": "string" },
      { "name": "wallet", "type": "address" }
    ],
    "Mail": [
      { "name": "from", "type": "Person" },
      { "name": "to", "type": "Person" },
      { "name": "contents", "type": "string" }
    ]
  },
  "primaryType": "Mail",
  "domain": { "name": "Ether Mail" },
  "message": {
    "from": { "name": "Cow", "wallet": "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826" },
    "to": { "name": "Bob", "wallet": "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB" },
    "contents": "Hello, Bob!"
  }
}"#;

    struct RecordingSigner {
        calls: RefCell<Vec<Value>>,
        reply: Result<String, SignerError>,
    }

    impl RecordingSigner {
        fn replying(reply: Result<String, SignerError>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                reply,
            }
        }
    }

    #[async_trait(?Send)]
    impl TypedDataSigner for RecordingSigner {
        async fn sign_typed_data(&self, payload: Value) -> Result<String, SignerError> {
            self.calls.borrow_mut().push(payload);
            self.reply.clone()
        }
    }

    fn loaded_with(text: &str) -> SessionController<MemoryQuery> {
        let mut query = MemoryQuery::default();
        query.set("json", &codec::encode(text));
        SessionController::initialize(query)
    }

    #[test]
    fn load_without_parameter_is_empty() {
        let session = SessionController::initialize(MemoryQuery::parse(""));
        assert_eq!(session.raw_text(), "");
        assert_eq!(session.query_param(), None);
    }

    #[test]
    fn load_with_parameter_pretty_prints() {
        let session = loaded_with(r#"{"a":1}"#);
        assert_eq!(session.raw_text(), "{\n  \"a\": 1\n}");
        // The mount-time sync rewrites the parameter from the pretty text.
        assert_eq!(session.query_param(), Some(codec::encode("{\n  \"a\": 1\n}")));
    }

    #[test]
    fn load_with_garbage_falls_back_to_empty() {
        for param in ["%%%", "bm90IGpzb24=", "/w=="] {
            let session = SessionController::initialize(MemoryQuery::parse(&format!("json={param}")));
            assert_eq!(session.raw_text(), "", "param {param}");
            assert_eq!(session.query_param(), None, "param {param}");
        }
    }

    #[test]
    fn typing_valid_json_writes_raw_text() {
        let mut session = SessionController::initialize(MemoryQuery::default());
        let action = session.on_text_changed(r#"{"a":1}"#);
        assert_eq!(action, SyncAction::Written("eyJhIjoxfQ==".to_owned()));
        assert_eq!(session.query_param().as_deref(), Some("eyJhIjoxfQ=="));
    }

    #[test]
    fn truncated_json_keeps_last_good_parameter() {
        let mut session = SessionController::initialize(MemoryQuery::default());
        session.on_text_changed(r#"{"a":1}"#);
        assert_eq!(session.on_text_changed(r#"{"a":1"#), SyncAction::Retained);
        assert_eq!(session.raw_text(), r#"{"a":1"#);
        assert_eq!(session.query_param(), Some(codec::encode(r#"{"a":1}"#)));
    }

    #[test]
    fn clearing_text_removes_parameter() {
        let mut session = loaded_with(r#"{"a":1}"#);
        assert_eq!(session.on_text_changed(""), SyncAction::Removed);
        assert_eq!(session.query_param(), None);
    }

    #[test]
    fn whitespace_only_text_is_invalid_not_empty() {
        let mut session = loaded_with("[1]");
        assert_eq!(session.on_text_changed("  \n"), SyncAction::Retained);
        assert!(session.query_param().is_some());
    }

    #[test]
    fn other_parameters_survive_sync() {
        let mut session = SessionController::initialize(MemoryQuery::parse("ref=abc"));
        session.on_text_changed("true");
        session.on_text_changed("");
        assert_eq!(session.query().to_query_string(), "ref=abc");
    }

    #[test]
    fn custom_query_key() {
        let config = SessionConfig::default().with_query_key("td");
        let mut session = SessionController::initialize_with(MemoryQuery::default(), config);
        session.on_text_changed("{}");
        assert_eq!(session.query().get("td").as_deref(), Some("e30="));
        assert_eq!(session.query().get("json"), None);
    }

    #[test]
    fn deeply_nested_json_is_synced_and_reloaded() -> anyhow::Result<()> {
        let text = "[".repeat(200) + &"]".repeat(200);
        let mut session = SessionController::initialize(MemoryQuery::default());
        assert_eq!(
            session.on_text_changed(text.clone()),
            SyncAction::Written(codec::encode(&text))
        );

        let reloaded = SessionController::initialize(session.query().clone());
        assert!(!reloaded.raw_text().is_empty());
        assert_eq!(reloaded.parsed()?, codec::parse(&text)?);
        Ok(())
    }

    #[test]
    fn nesting_past_limit_keeps_parameter() {
        let depth = codec::MAX_DEPTH + 1;
        let mut session = loaded_with("[1]");
        let before = session.query_param();
        assert_eq!(
            session.on_text_changed("[".repeat(depth) + &"]".repeat(depth)),
            SyncAction::Retained
        );
        assert_eq!(session.query_param(), before);
    }

    #[test]
    fn lone_surrogate_escape_keeps_parameter() {
        let mut session = loaded_with("[1]");
        assert_eq!(session.on_text_changed(r#"{"a":"\ud800"}"#), SyncAction::Retained);
        assert_eq!(session.query_param(), Some(codec::encode("[\n  1\n]")));
    }

    #[tokio::test]
    async fn signing_invalid_json_never_reaches_signer() {
        let signer = RecordingSigner::replying(Ok("0xdead".to_owned()));
        let mut session = SessionController::initialize(MemoryQuery::default());
        session.on_text_changed(r#"{"types":"#);

        assert_eq!(session.request_signature(&signer).await, SignOutcome::Skipped);
        assert!(signer.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn signing_valid_json_forwards_parsed_object_once() -> anyhow::Result<()> {
        let signature = "0x".to_owned() + &"ab".repeat(65);
        let signer = RecordingSigner::replying(Ok(signature.clone()));
        let mut session = SessionController::initialize(MemoryQuery::default());
        session.on_text_changed(MAIL);

        let outcome = session.request_signature(&signer).await;
        assert_eq!(outcome, SignOutcome::Signed(signature));

        let calls = signer.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], serde_json::from_str::<Value>(MAIL)?);
        assert_eq!(calls[0]["primaryType"], json!("Mail"));
        Ok(())
    }

    #[tokio::test]
    async fn signer_error_is_surfaced_verbatim() {
        let signer =
            RecordingSigner::replying(Err(SignerError::new("User rejected the request.")));
        let session = loaded_with(MAIL);

        let outcome = session.request_signature(&signer).await;
        assert_eq!(
            outcome,
            SignOutcome::Failed(SignerError::new("User rejected the request."))
        );
    }

    fn json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            "\\PC{0,12}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 32, 5, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
                prop::collection::btree_map("[a-zA-Z_]{1,8}", inner, 0..5)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn valid_json_survives_a_fresh_load(value in json_value()) {
            let text = serde_json::to_string(&value).unwrap();
            let mut first = SessionController::initialize(MemoryQuery::default());
            first.on_text_changed(text.clone());

            let shared = MemoryQuery::parse(&first.query().to_query_string());
            let reloaded = SessionController::initialize(shared);
            let reparsed: Value = serde_json::from_str(reloaded.raw_text()).unwrap();
            prop_assert_eq!(reparsed, value);
        }

        #[test]
        fn invalid_json_never_touches_parameter(
            text in any::<String>().prop_filter("must not parse", |s| {
                !s.is_empty() && serde_json::from_str::<Value>(s).is_err()
            })
        ) {
            let mut session = loaded_with(r#"{"a":1}"#);
            let before = session.query_param();
            prop_assert_eq!(session.on_text_changed(text), SyncAction::Retained);
            prop_assert_eq!(session.query_param(), before);
        }
    }
}
