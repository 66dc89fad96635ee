//! Submits signed transactions and fires the callback.
//!
//! # Responsibilities
//! - Push the signed transaction as-is, once
//! - On acceptance, hand the result to the callback notifier if the
//!   request asked for one
//!
//! A rejected push is a [`BroadcastError`]; a failed callback is reported
//! inside [`BroadcastOutcome`] and leaves the broadcast result intact.

use crate::broadcast::types::{BroadcastError, BroadcastOutcome, BroadcastResult};
use crate::callback::notifier::Notifier;
use crate::chain::client::ChainApi;
use crate::eosio::transaction::SignedTransaction;
use crate::observability::metrics::{observe_async, Stage};
use crate::request::types::CallbackSpec;

/// Push `signed` through `client`, then notify `callback` if present.
/// Push and callback are timed as separate stages.
pub async fn broadcast<C>(
    signed: &SignedTransaction,
    client: &C,
    callback: Option<&CallbackSpec>,
    notifier: &Notifier,
) -> Result<BroadcastOutcome, BroadcastError>
where
    C: ChainApi + ?Sized,
{
    let result = observe_async(Stage::Broadcast, submit(signed, client)).await?;
    let callback = match callback {
        Some(spec) => Some(observe_async(Stage::Notify, notifier.notify(spec, &result)).await),
        None => None,
    };
    if let Some(Err(e)) = &callback {
        tracing::warn!(
            transaction_id = %result.transaction_id,
            error = %e,
            "callback failed after successful broadcast"
        );
    }
    Ok(BroadcastOutcome { result, callback })
}

/// Push without any callback handling.
pub async fn submit<C>(signed: &SignedTransaction, client: &C) -> Result<BroadcastResult, BroadcastError>
where
    C: ChainApi + ?Sized,
{
    let packed = signed.to_packed();
    let response = client
        .push_transaction(&packed)
        .await
        .map_err(|source| BroadcastError {
            transaction_id: signed.transaction.id(),
            source,
        })?;

    let result = BroadcastResult::from_response(&response, signed);
    tracing::info!(
        transaction_id = %result.transaction_id,
        block_num = result.block_num,
        "transaction broadcast"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::types::{
        Block, ChainError, ChainResult, GetAbiResponse, GetInfo, ProcessedTransaction,
        PushTransactionResponse,
    };
    use crate::eosio::keys::PrivateKey;
    use crate::eosio::name::Name;
    use crate::eosio::transaction::{PackedTransaction, Transaction};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    struct PushOnly {
        accept: bool,
        pushed: Mutex<Vec<PackedTransaction>>,
    }

    #[async_trait]
    impl ChainApi for PushOnly {
        async fn get_info(&self) -> ChainResult<GetInfo> {
            unreachable!("broadcast never reads chain info")
        }

        async fn get_block(&self, _: u32) -> ChainResult<Block> {
            unreachable!("broadcast never reads blocks")
        }

        async fn get_abi(&self, _: Name) -> ChainResult<GetAbiResponse> {
            unreachable!("broadcast never reads abis")
        }

        async fn push_transaction(
            &self,
            transaction: &PackedTransaction,
        ) -> ChainResult<PushTransactionResponse> {
            self.pushed.lock().unwrap().push(transaction.clone());
            if !self.accept {
                return Err(ChainError::Api {
                    endpoint: "mock".into(),
                    code: 500,
                    message: "expired transaction".into(),
                    what: "Expired Transaction".into(),
                });
            }
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

    fn signed() -> SignedTransaction {
        let key: PrivateKey = "5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3"
            .parse()
            .unwrap();
        let transaction = Transaction::default();
        let signature = key.sign_digest(&[9; 32]).unwrap();
        SignedTransaction {
            transaction,
            signatures: vec![signature],
        }
    }

    #[tokio::test]
    async fn test_broadcast_without_callback() {
        let client = PushOnly {
            accept: true,
            pushed: Mutex::new(Vec::new()),
        };
        let notifier = Notifier::new(Duration::from_secs(1)).unwrap();
        let outcome = broadcast(&signed(), &client, None, &notifier).await.unwrap();

        assert_eq!(outcome.result.block_num, 100);
        assert_eq!(outcome.result.block_id, "abc");
        assert_eq!(outcome.result.signatures, vec![signed().signatures[0].to_string()]);
        assert!(outcome.callback.is_none());

        let pushed = client.pushed.lock().unwrap();
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed[0].compression, "none");
        assert_eq!(pushed[0].packed_trx, hex::encode(Transaction::default().pack()));
    }

    #[tokio::test]
    async fn test_rejected_push_skips_callback() {
        let client = PushOnly {
            accept: false,
            pushed: Mutex::new(Vec::new()),
        };
        let notifier = Notifier::new(Duration::from_secs(1)).unwrap();
        let spec = CallbackSpec {
            url: "ftp://never.example".into(),
            background: false,
        };
        let err = broadcast(&signed(), &client, Some(&spec), &notifier)
            .await
            .unwrap_err();
        assert_eq!(err.transaction_id, Transaction::default().id());
        assert!(err.to_string().contains("expired transaction"));
    }

    #[tokio::test]
    async fn test_callback_failure_keeps_broadcast_result() {
        let client = PushOnly {
            accept: true,
            pushed: Mutex::new(Vec::new()),
        };
        let notifier = Notifier::new(Duration::from_secs(1)).unwrap();
        let spec = CallbackSpec {
            url: "ftp://cb.example/{{tx}}".into(),
            background: false,
        };
        let outcome = broadcast(&signed(), &client, Some(&spec), &notifier)
            .await
            .unwrap();
        assert_eq!(outcome.result.transaction_id, "abc");
        assert!(matches!(outcome.callback, Some(Err(_))));
    }
}
