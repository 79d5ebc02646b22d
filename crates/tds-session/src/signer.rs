use async_trait::async_trait;
use serde_json::Value;

use crate::error::SignerError;

/// External capability that signs an EIP-712 typed-data payload.
///
/// The payload is passed through untouched; validating its
/// `{domain, types, primaryType, message}` shape is the signer's job.
/// Browser signers hold JS handles, so the future is not `Send`.
#[async_trait(?Send)]
pub trait TypedDataSigner {
    async fn sign_typed_data(&self, payload: Value) -> Result<String, SignerError>;
}
