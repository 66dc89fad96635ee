//! Signs a resolved transaction. Never talks to the network.
//!
//! # Responsibilities
//! - Refuse transactions whose expiration has already passed
//! - Compute the chain-bound digest and hand it to the key provider
//! - Check every returned signature recovers to a key (and to the
//!   wallet's key when one is expected)

use chrono::Utc;

use crate::eosio::keys::PublicKey;
use crate::eosio::time::TimePointSec;
use crate::eosio::transaction::{signing_digest, PermissionLevel, SignedTransaction};
use crate::signing::providers::KeyProvider;
use crate::signing::types::{NetworkConfig, SignError, SignErrorKind, SignResult, SigningPayload};
use crate::template::types::ResolvedTransaction;

fn now() -> TimePointSec {
    TimePointSec(u32::try_from(Utc::now().timestamp()).unwrap_or(u32::MAX))
}

/// Sign `resolved` with `provider`. `expected_key`, when given, must be the
/// key every signature recovers to.
pub async fn sign_transaction(
    resolved: &ResolvedTransaction,
    provider: &dyn KeyProvider,
    network: &NetworkConfig,
    expected_key: Option<&PublicKey>,
) -> SignResult<SignedTransaction> {
    sign_transaction_at(resolved, provider, network, expected_key, now()).await
}

/// [`sign_transaction`] with an explicit current time.
pub async fn sign_transaction_at(
    resolved: &ResolvedTransaction,
    provider: &dyn KeyProvider,
    network: &NetworkConfig,
    expected_key: Option<&PublicKey>,
    now: TimePointSec,
) -> SignResult<SignedTransaction> {
    let mut transaction = resolved.transaction.clone();
    if transaction.header.expiration == TimePointSec::default() {
        transaction.header.expiration = now
            .checked_add_secs(network.expire_in_seconds)
            .unwrap_or(TimePointSec(u32::MAX));
    }
    if transaction.header.expiration <= now {
        let expiration = transaction.header.expiration;
        return Err(SignError::new(
            transaction,
            SignErrorKind::Expired { expiration, now },
        ));
    }

    let packed = transaction.pack();
    let digest = signing_digest(&network.chain_id, &packed);
    let mut authorization: Vec<PermissionLevel> = Vec::new();
    for level in transaction.actions.iter().flat_map(|a| &a.authorization) {
        if !authorization.contains(level) {
            authorization.push(*level);
        }
    }

    let payload = SigningPayload {
        chain_id: &network.chain_id,
        packed_trx: &packed,
        digest: &digest,
        authorization: &authorization,
    };
    let signatures = match provider.sign(payload).await {
        Ok(signatures) if signatures.is_empty() => {
            return Err(SignError::new(transaction, SignErrorKind::NoSignatures))
        }
        Ok(signatures) => signatures,
        Err(kind) => {
            tracing::warn!(error = %kind, "signing failed");
            return Err(SignError::new(transaction, kind));
        }
    };

    for signature in &signatures {
        let recovered = match signature.recover(&digest) {
            Ok(key) => key,
            Err(e) => return Err(SignError::new(transaction, e)),
        };
        if let Some(expected) = expected_key {
            if recovered != *expected {
                return Err(SignError::new(
                    transaction,
                    SignErrorKind::KeyMismatch {
                        expected: *expected,
                        actual: recovered,
                    },
                ));
            }
        }
    }

    tracing::info!(
        transaction_id = %transaction.id(),
        signatures = signatures.len(),
        chain_id = %network.chain_id,
        "transaction signed"
    );

    Ok(SignedTransaction {
        transaction,
        signatures,
    })
}
