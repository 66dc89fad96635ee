//! Signing session orchestration.
//!
//! # Responsibilities
//! - Run the stages of one signing request in order
//! - Tag every event with the session id and chain id
//! - Record per-stage metrics
//!
//! # Design Decisions
//! - Each stage is also exposed on its own, so a caller can decode
//!   without resolving or sign without broadcasting
//! - Broadcast happens only when both the host and the request want it

use thiserror::Error;
use tracing::{Instrument, Span};
use uuid::Uuid;

use crate::broadcast::broadcaster::broadcast;
use crate::broadcast::types::{BroadcastError, BroadcastOutcome};
use crate::callback::notifier::Notifier;
use crate::chain::client::ChainApi;
use crate::chain::resolver::fetch_snapshot;
use crate::chain::types::ChainError;
use crate::eosio::transaction::SignedTransaction;
use crate::observability::metrics::{observe, observe_async, Stage};
use crate::observability::spans::{new_session_id, record_chain_id, session_span};
use crate::request::types::{DecodeError, SigningRequest};
use crate::request::uri::UriCodec;
use crate::signing::providers::KeyProvider;
use crate::signing::signer::sign_transaction;
use crate::signing::types::{NetworkConfig, SignError, WalletContext};
use crate::template::templater::build_transaction;
use crate::template::types::{ResolvedTransaction, TemplateError};

/// Failure of the first stage that failed.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Sign(#[from] SignError),

    #[error(transparent)]
    Broadcast(#[from] BroadcastError),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Host-side settings for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Lifetime for transactions without an expiration.
    pub expire_in_seconds: u32,
    /// Host allows broadcasting. The request's own flag must also be set.
    pub broadcast: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            expire_in_seconds: 120,
            broadcast: true,
        }
    }
}

/// Everything a completed session produced.
#[derive(Debug)]
pub struct SessionOutcome {
    pub request: SigningRequest,
    pub resolved: ResolvedTransaction,
    pub signed: SignedTransaction,
    /// `None` when the transaction was signed but not broadcast.
    pub broadcast: Option<BroadcastOutcome>,
}

/// One signing request, from URI to callback.
pub struct SigningSession<'a> {
    id: Uuid,
    span: Span,
    codec: UriCodec,
    wallet: &'a WalletContext,
    options: SessionOptions,
}

impl<'a> SigningSession<'a> {
    pub fn new(wallet: &'a WalletContext, options: SessionOptions) -> Self {
        let id = new_session_id();
        Self {
            id,
            span: session_span(id),
            codec: UriCodec::new(),
            wallet,
            options,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn decode(&self, uri: &str) -> SessionResult<SigningRequest> {
        let _entered = self.span.enter();
        let request = observe(Stage::Decode, || self.codec.decode(uri))?;
        let chain_id = request.chain_id();
        record_chain_id(&self.span, &chain_id);
        tracing::info!(
            version = request.version,
            actions = request.payload.actions().len(),
            callback = request.callback.is_some(),
            "signing request decoded"
        );
        Ok(request)
    }

    /// Fetch chain state and build the transaction for this wallet.
    pub async fn resolve<C>(
        &self,
        request: &SigningRequest,
        client: &C,
    ) -> SessionResult<ResolvedTransaction>
    where
        C: ChainApi + ?Sized,
    {
        async {
            let chain_id = request.chain_id.resolve();
            let snapshot = observe_async(Stage::Snapshot, fetch_snapshot(client, &chain_id)).await?;
            let authorization = self.wallet.permission_level();
            let resolved = observe_async(
                Stage::Template,
                build_transaction(request, &authorization, &snapshot, client),
            )
            .await?;
            Ok::<_, SessionError>(resolved)
        }
        .instrument(self.span.clone())
        .await
    }

    pub async fn sign(
        &self,
        request: &SigningRequest,
        resolved: &ResolvedTransaction,
        provider: &dyn KeyProvider,
    ) -> SessionResult<SignedTransaction> {
        let network = NetworkConfig {
            chain_id: request.chain_id.resolve(),
            expire_in_seconds: self.options.expire_in_seconds,
        };
        let signed = observe_async(
            Stage::Sign,
            sign_transaction(resolved, provider, &network, Some(&self.wallet.pubkey)),
        )
        .instrument(self.span.clone())
        .await?;
        Ok(signed)
    }

    /// Push `signed` and deliver the request's callback, if any.
    pub async fn broadcast<C>(
        &self,
        request: &SigningRequest,
        signed: &SignedTransaction,
        client: &C,
        notifier: &Notifier,
    ) -> SessionResult<BroadcastOutcome>
    where
        C: ChainApi + ?Sized,
    {
        broadcast(signed, client, request.callback.as_ref(), notifier)
            .instrument(self.span.clone())
            .await
            .map_err(SessionError::from)
    }

    /// Whether [`SigningSession::run`] will broadcast `request`.
    pub fn should_broadcast(&self, request: &SigningRequest) -> bool {
        self.options.broadcast && request.broadcast
    }

    /// Run every stage. Stops at the first failure.
    pub async fn run<C>(
        &self,
        uri: &str,
        client: &C,
        provider: &dyn KeyProvider,
        notifier: &Notifier,
    ) -> SessionResult<SessionOutcome>
    where
        C: ChainApi + ?Sized,
    {
        let request = self.decode(uri)?;
        let resolved = self.resolve(&request, client).await?;
        let signed = self.sign(&request, &resolved, provider).await?;
        let broadcast = if self.should_broadcast(&request) {
            Some(self.broadcast(&request, &signed, client, notifier).await?)
        } else {
            let _entered = self.span.enter();
            tracing::info!(transaction_id = %signed.transaction.id(), "signed without broadcast");
            None
        };
        Ok(SessionOutcome {
            request,
            resolved,
            signed,
            broadcast,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::AbiDef;
    use crate::chain::types::{
        Block, ChainResult, GetAbiResponse, GetInfo, ProcessedTransaction,
        PushTransactionResponse,
    };
    use crate::eosio::chain_id::ChainId;
    use crate::eosio::name::{Name, PLACEHOLDER_ACTOR, PLACEHOLDER_PERMISSION};
    use crate::eosio::transaction::{Action, PackedTransaction, PermissionLevel};
    use crate::request::types::{ChainIdSpec, RequestPayload};
    use crate::signing::providers::SoftwareKey;
    use crate::signing::types::WalletMode;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const TEST_WIF: &str = "5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3";

    struct MockChain {
        chain_id: ChainId,
        pushes: AtomicUsize,
    }

    fn noop_abi() -> AbiDef {
        serde_json::from_value(serde_json::json!({
            "version": "eosio::abi/1.1",
            "structs": [{"name": "noop", "base": "", "fields": []}],
            "actions": [{"name": "noop", "type": "noop", "ricardian_contract": ""}]
        }))
        .unwrap()
    }

    #[async_trait]
    impl ChainApi for MockChain {
        async fn get_info(&self) -> ChainResult<GetInfo> {
            Ok(GetInfo {
                chain_id: self.chain_id,
                head_block_num: 0x0102_0304,
                head_block_id: String::new(),
                last_irreversible_block_num: 0,
                server_version: String::new(),
            })
        }

        async fn get_block(&self, block_num: u32) -> ChainResult<Block> {
            // far in the future so the transaction is never expired
            Ok(Block {
                block_num,
                id: "0102030411223344556677880000000000000000000000000000000000000000".into(),
                timestamp: "2050-01-01T00:00:00.000".parse().unwrap(),
                ref_block_prefix: None,
            })
        }

        async fn get_abi(&self, account: Name) -> ChainResult<GetAbiResponse> {
            Ok(GetAbiResponse {
                account_name: account,
                abi: Some(noop_abi()),
            })
        }

        async fn push_transaction(
            &self,
            _: &PackedTransaction,
        ) -> ChainResult<PushTransactionResponse> {
            self.pushes.fetch_add(1, Ordering::SeqCst);
            Ok(PushTransactionResponse {
                transaction_id: "abc".into(),
                processed: ProcessedTransaction {
                    id: "abc".into(),
                    block_num: 100,
                    block_time: String::new(),
                    receipt: None,
                },
            })
        }
    }

    fn wallet(key: &SoftwareKey) -> WalletContext {
        WalletContext {
            account: "alice".parse().unwrap(),
            authorization: "active".parse().unwrap(),
            pubkey: key.public_key(),
            mode: WalletMode::Hot,
        }
    }

    fn request_uri(chain_id: ChainId, broadcast: bool) -> String {
        let mut request = SigningRequest::new(
            ChainIdSpec::Id(chain_id),
            RequestPayload::Action(Action {
                account: "eosio".parse().unwrap(),
                name: "noop".parse().unwrap(),
                authorization: vec![PermissionLevel::new(PLACEHOLDER_ACTOR, PLACEHOLDER_PERMISSION)],
                data: Vec::new(),
            }),
        );
        request.broadcast = broadcast;
        UriCodec::new().encode(&request).unwrap()
    }

    #[tokio::test]
    async fn test_run_signs_and_broadcasts() {
        let key = SoftwareKey::from_private_key(TEST_WIF).unwrap();
        let wallet = wallet(&key);
        let chain = MockChain {
            chain_id: ChainId::from_bytes([5; 32]),
            pushes: AtomicUsize::new(0),
        };
        let notifier = Notifier::new(Duration::from_secs(1)).unwrap();
        let session = SigningSession::new(&wallet, SessionOptions::default());

        let outcome = session
            .run(&request_uri(chain.chain_id, true), &chain, &key, &notifier)
            .await
            .unwrap();

        let action = &outcome.signed.transaction.actions[0];
        assert_eq!(action.authorization[0], wallet.permission_level());
        assert_eq!(outcome.resolved.contract_name, "eosio".parse::<Name>().unwrap());
        let broadcast = outcome.broadcast.unwrap();
        assert_eq!(broadcast.result.block_num, 100);
        assert!(broadcast.callback.is_none());
        assert_eq!(chain.pushes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_request_without_broadcast_is_only_signed() {
        let key = SoftwareKey::from_private_key(TEST_WIF).unwrap();
        let wallet = wallet(&key);
        let chain = MockChain {
            chain_id: ChainId::from_bytes([5; 32]),
            pushes: AtomicUsize::new(0),
        };
        let notifier = Notifier::new(Duration::from_secs(1)).unwrap();
        let session = SigningSession::new(&wallet, SessionOptions::default());

        let outcome = session
            .run(&request_uri(chain.chain_id, false), &chain, &key, &notifier)
            .await
            .unwrap();
        assert!(outcome.broadcast.is_none());
        assert_eq!(outcome.signed.signatures.len(), 1);
        assert_eq!(chain.pushes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_later_stages_do_not_run_after_failure() {
        let key = SoftwareKey::from_private_key(TEST_WIF).unwrap();
        let wallet = wallet(&key);
        let chain = MockChain {
            chain_id: ChainId::from_bytes([6; 32]),
            pushes: AtomicUsize::new(0),
        };
        let notifier = Notifier::new(Duration::from_secs(1)).unwrap();
        let session = SigningSession::new(&wallet, SessionOptions::default());

        let err = session
            .run("esr:not-base64!", &chain, &key, &notifier)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Decode(_)));

        // the node serves a different chain than the request targets
        let err = session
            .run(&request_uri(ChainId::from_bytes([5; 32]), true), &chain, &key, &notifier)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Chain(ChainError::ChainMismatch { .. })));
        assert_eq!(chain.pushes.load(Ordering::SeqCst), 0);
    }
}
