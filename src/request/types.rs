//! Signing request envelope and codec errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::abi::AbiError;
use crate::chain::types::AbiLookupError;
use crate::eosio::bytes::BinaryError;
use crate::eosio::chain_id::ChainId;
use crate::eosio::name::Name;
use crate::eosio::transaction::{hex_data, Action, Transaction};
use crate::request::chain_alias::ChainAlias;

/// Protocol versions this codec reads and writes.
pub const SUPPORTED_VERSIONS: [u8; 2] = [1, 2];

/// Version used by [`SigningRequest::new`].
pub const DEFAULT_VERSION: u8 = 2;

/// Target chain, either by alias or by explicit id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainIdSpec {
    Alias(ChainAlias),
    Id(ChainId),
}

impl ChainIdSpec {
    /// Canonical 32-byte id; aliases resolve through the alias table.
    pub fn resolve(&self) -> ChainId {
        match self {
            ChainIdSpec::Alias(alias) => alias.chain_id(),
            ChainIdSpec::Id(id) => *id,
        }
    }
}

/// What the issuer asks the wallet to sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestPayload {
    Action(Action),
    ActionList(Vec<Action>),
    Transaction(Transaction),
}

impl RequestPayload {
    pub(crate) fn variant_tag(&self) -> u32 {
        match self {
            RequestPayload::Action(_) => 0,
            RequestPayload::ActionList(_) => 1,
            RequestPayload::Transaction(_) => 2,
        }
    }

    /// Every action the payload will execute, in order.
    pub fn actions(&self) -> &[Action] {
        match self {
            RequestPayload::Action(action) => std::slice::from_ref(action),
            RequestPayload::ActionList(actions) => actions,
            RequestPayload::Transaction(tx) => &tx.actions,
        }
    }
}

/// Where to report the broadcast result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackSpec {
    /// URL template with `{{bn}}`, `{{tx}}`, `{{sig}}`, `{{sig[0]}}` placeholders.
    pub url: String,
    /// Deliver without a JSON body.
    #[serde(default)]
    pub background: bool,
}

/// Free-form issuer metadata (version 2 only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoPair {
    pub key: String,
    #[serde(with = "hex_data")]
    pub value: Vec<u8>,
}

/// Decoded signing request. Immutable once decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningRequest {
    pub version: u8,
    pub chain_id: ChainIdSpec,
    pub payload: RequestPayload,
    /// Issuer's stated intent; the wallet makes the final call.
    #[serde(default)]
    pub broadcast: bool,
    #[serde(default)]
    pub callback: Option<CallbackSpec>,
    #[serde(default)]
    pub info: Vec<InfoPair>,
}

impl SigningRequest {
    pub fn new(chain_id: ChainIdSpec, payload: RequestPayload) -> Self {
        Self {
            version: DEFAULT_VERSION,
            chain_id,
            payload,
            broadcast: true,
            callback: None,
            info: Vec::new(),
        }
    }

    pub fn with_callback(mut self, url: impl Into<String>, background: bool) -> Self {
        self.callback = Some(CallbackSpec {
            url: url.into(),
            background,
        });
        self
    }

    /// Resolved chain id in lower-case hex.
    pub fn chain_id(&self) -> String {
        self.chain_id.resolve().to_hex()
    }
}

/// Reason a URI could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeErrorKind {
    #[error("missing or unsupported scheme")]
    InvalidScheme,

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("empty payload")]
    Empty,

    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(u8),

    #[error("inflate failed: {0}")]
    Inflate(#[source] std::io::Error),

    #[error("malformed payload: {0}")]
    Binary(#[from] BinaryError),

    #[error("unknown chain alias {0}")]
    UnknownChainAlias(u8),

    #[error("unknown chain id variant {0}")]
    UnknownChainIdVariant(u32),

    #[error("unknown request variant {0}")]
    UnknownRequestVariant(u32),

    #[error("{0} trailing bytes after request")]
    TrailingBytes(usize),
}

/// Decode failure carrying the URI that caused it.
#[derive(Debug, Error)]
#[error("failed to decode signing request '{uri}': {kind}")]
pub struct DecodeError {
    pub uri: String,
    #[source]
    pub kind: DecodeErrorKind,
}

impl DecodeError {
    pub fn new(uri: impl Into<String>, kind: impl Into<DecodeErrorKind>) -> Self {
        Self {
            uri: uri.into(),
            kind: kind.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(u8),

    #[error("info pairs require protocol version 2")]
    InfoRequiresV2,

    #[error("callback url must not be empty")]
    EmptyCallbackUrl,

    #[error("deflate failed: {0}")]
    Deflate(#[source] std::io::Error),

    #[error(transparent)]
    Abi(#[from] AbiLookupError),

    #[error("failed to encode data for {account}::{action}: {source}")]
    ActionData {
        account: Name,
        action: Name,
        #[source]
        source: AbiError,
    },
}

pub type DecodeResult<T> = Result<T, DecodeError>;
pub type EncodeResult<T> = Result<T, EncodeError>;
