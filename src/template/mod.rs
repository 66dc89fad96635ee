//! Transaction templating subsystem.
//!
//! # Data Flow
//! ```text
//! SigningRequest + signer authorization
//!     + ChainSnapshot (reference block)
//!     + AbiProvider (one ABI per referenced account)
//!     → templater.rs
//!     → ResolvedTransaction { contract_name, abi, transaction, actions }
//! ```

pub mod templater;
pub mod types;

pub use templater::{build_transaction, contract_name, resolve_authorization};
pub use types::{ResolvedTransaction, TemplateError, TemplateResult};
