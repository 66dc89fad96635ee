//! EOSIO signing request wallet library.
//!
//! Decodes `esr:` signing request URIs, resolves them against a live chain
//! into concrete transactions, signs them with a software key or a hardware
//! device, broadcasts them and notifies the issuer's callback.

// Protocol primitives
pub mod abi;
pub mod eosio;
pub mod request;

// Lifecycle stages
pub mod broadcast;
pub mod callback;
pub mod chain;
pub mod signing;
pub mod template;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::schema::EsrConfig;
pub use lifecycle::{SessionError, SessionOptions, SessionOutcome, SigningSession};
pub use request::{SigningRequest, UriCodec};
