//! Session sync for the typed-data signer.
//!
//! Keeps the JSON text a user is editing in step with a base64 query
//! parameter, and hands parsed typed data to a [`TypedDataSigner`].
//! Nothing here touches the browser: the URL is reached through
//! [`QueryStore`], so the whole contract runs natively under test.

pub mod codec;
pub mod config;
pub mod controller;
pub mod error;
pub mod query;
pub mod signer;

pub use config::SessionConfig;
pub use controller::{SessionController, SignOutcome, SyncAction, sync_query};
pub use error::{SessionError, SignerError};
pub use query::{MemoryQuery, QueryStore};
pub use signer::TypedDataSigner;
