use serde::{Deserialize, Serialize};
use std::fmt;

/// JSON-RPC method names sent to an injected EIP-1193 provider.
pub mod methods {
    pub const REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
    pub const ACCOUNTS: &str = "eth_accounts";
    pub const CHAIN_ID: &str = "eth_chainId";
    pub const SIGN_TYPED_DATA_V4: &str = "eth_signTypedData_v4";
    pub const REVOKE_PERMISSIONS: &str = "wallet_revokePermissions";
}

/// Connection state of the wallet account.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[default]
    Disconnected,
    Connecting,
    Reconnecting,
    Connected,
}

impl AccountStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountStatus::Disconnected => "disconnected",
            AccountStatus::Connecting => "connecting",
            AccountStatus::Reconnecting => "reconnecting",
            AccountStatus::Connected => "connected",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of the most recent connect request.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConnectStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Error,
}

impl ConnectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectStatus::Idle => "idle",
            ConnectStatus::Pending => "pending",
            ConnectStatus::Success => "success",
            ConnectStatus::Error => "error",
        }
    }
}

impl fmt::Display for ConnectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub status: AccountStatus,
    #[serde(default)]
    pub addresses: Vec<String>,
    #[serde(default, rename = "chainId")]
    pub chain_id: Option<u64>,
}

impl AccountSnapshot {
    pub fn is_connected(&self) -> bool {
        self.status == AccountStatus::Connected
    }

    pub fn primary_address(&self) -> Option<&str> {
        self.addresses.first().map(String::as_str)
    }
}

/// A wallet integration offered to the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectorInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub rdns: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

/// `info` member of an EIP-6963 `announceProvider` event detail.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Eip6963ProviderInfo {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub rdns: Option<String>,
}

impl From<Eip6963ProviderInfo> for ConnectorInfo {
    fn from(info: Eip6963ProviderInfo) -> Self {
        let id = match info.rdns.as_deref() {
            Some(rdns) if !rdns.is_empty() => rdns.to_owned(),
            _ => info.uuid.clone(),
        };
        ConnectorInfo {
            id,
            name: info.name,
            rdns: info.rdns,
            icon: info.icon,
        }
    }
}

/// Argument object of an EIP-1193 `request` call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RpcRequest<P> {
    pub method: String,
    pub params: P,
}

impl<P> RpcRequest<P> {
    pub fn new(method: &str, params: P) -> Self {
        Self {
            method: method.to_owned(),
            params,
        }
    }
}

/// Error object rejected by an EIP-1193 provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderRpcError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

impl ProviderRpcError {
    /// EIP-1193 "User Rejected Request".
    pub const USER_REJECTED: i64 = 4001;

    pub fn is_user_rejection(&self) -> bool {
        self.code == Self::USER_REJECTED
    }
}

/// Parse a `0x`-prefixed hex chain id as returned by `eth_chainId`.
pub fn parse_chain_id(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => trimmed.parse().ok(),
    }
}
