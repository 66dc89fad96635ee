//! Signing request envelope and its URI encoding.
//!
//! # Data Flow
//! ```text
//! esr:// URI
//!     → uri.rs (scheme, base64url, header byte, raw deflate)
//!     → codec.rs (binary body, v1 and v2 layouts)
//!     → types.rs (SigningRequest: chain id spec, payload, flags, callback)
//!
//! JSON actions + ABIs → builder.rs → SigningRequest → uri.rs → esr:// URI
//! ```
//!
//! # Design Decisions
//! - The payload is a closed enum; every consumer matches it exhaustively
//! - Unknown chain aliases and the identity variant fail decoding, so a
//!   decoded request always resolves to a concrete chain id
//! - `broadcast` on the envelope is advisory; the host decides

pub mod builder;
pub mod chain_alias;
mod codec;
pub mod types;
pub mod uri;

pub use builder::{JsonAction, RequestDocument};
pub use chain_alias::ChainAlias;
pub use types::{
    CallbackSpec, ChainIdSpec, DecodeError, DecodeErrorKind, DecodeResult, EncodeError,
    EncodeResult, InfoPair, RequestPayload, SigningRequest,
};
pub use uri::{Flate2, RawDeflate, UriCodec};
