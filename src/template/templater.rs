//! Turns a decoded request into a concrete transaction.
//!
//! # Responsibilities
//! - Pick the summary contract (account of the first action)
//! - Fetch one ABI per distinct account and rewrite every action's data
//!   with the signer filled in for placeholder names
//! - Stamp expiration and TAPOS fields from the reference block
//!
//! # Design Decisions
//! - Expiration is always reference block time + [`EXPIRE_SECONDS`],
//!   whatever the request carried
//! - Any failure returns an error; no partial transaction is produced

use std::collections::HashMap;

use crate::abi::{AbiDef, AbiSerializer};
use crate::chain::resolver::{
    distinct_accounts, fetch_abis, AbiProvider, ChainSnapshot, EXPIRE_SECONDS,
};
use crate::chain::types::AbiLookupError;
use crate::eosio::name::{Name, PLACEHOLDER_ACTOR, PLACEHOLDER_PERMISSION};
use crate::eosio::transaction::{Action, PermissionLevel, Transaction, TransactionHeader};
use crate::request::builder::JsonAction;
use crate::request::types::{RequestPayload, SigningRequest};
use crate::template::types::{ResolvedTransaction, TemplateError, TemplateResult};

/// Account whose ABI summarises the request.
pub fn contract_name(payload: &RequestPayload) -> TemplateResult<Name> {
    let first = match payload {
        RequestPayload::Action(action) => Some(action),
        RequestPayload::ActionList(actions) => actions.first(),
        RequestPayload::Transaction(tx) => tx.actions.first(),
    };
    first.map(|a| a.account).ok_or(TemplateError::EmptyActions)
}

/// Fill placeholder actor/permission with the signer.
pub fn resolve_authorization(level: &PermissionLevel, signer: &PermissionLevel) -> PermissionLevel {
    let actor = if level.actor == PLACEHOLDER_ACTOR {
        signer.actor
    } else {
        level.actor
    };
    let permission = if level.permission == PLACEHOLDER_ACTOR
        || level.permission == PLACEHOLDER_PERMISSION
    {
        signer.permission
    } else {
        level.permission
    };
    PermissionLevel::new(actor, permission)
}

fn resolve_action(
    action: &Action,
    abis: &HashMap<Name, AbiDef>,
    signer: &PermissionLevel,
) -> TemplateResult<(Action, JsonAction)> {
    let abi = abis
        .get(&action.account)
        .ok_or(AbiLookupError::Missing(action.account))?;
    let serializer = AbiSerializer::new(abi);
    let data_error = |source| TemplateError::ActionData {
        account: action.account,
        action: action.name,
        source,
    };

    let decoded = serializer
        .decode_action_data(action.name, &action.data, Some(signer))
        .map_err(data_error)?;
    let data = serializer
        .encode_action_data(action.name, &decoded)
        .map_err(data_error)?;
    let authorization: Vec<PermissionLevel> = action
        .authorization
        .iter()
        .map(|level| resolve_authorization(level, signer))
        .collect();

    let json = JsonAction {
        account: action.account,
        name: action.name,
        authorization: authorization.clone(),
        data: decoded,
    };
    let packed = Action {
        account: action.account,
        name: action.name,
        authorization,
        data,
    };
    Ok((packed, json))
}

/// Build the transaction `request` describes, signed by `authorization`,
/// against the chain state in `snapshot`.
pub async fn build_transaction<P>(
    request: &SigningRequest,
    authorization: &PermissionLevel,
    snapshot: &ChainSnapshot,
    abi_provider: &P,
) -> TemplateResult<ResolvedTransaction>
where
    P: AbiProvider + ?Sized,
{
    let contract_name = contract_name(&request.payload)?;

    let (base, context_free_actions) = match &request.payload {
        RequestPayload::Action(_) | RequestPayload::ActionList(_) => {
            (TransactionHeader::default(), Vec::new())
        }
        RequestPayload::Transaction(tx) => (tx.header.clone(), tx.context_free_actions.clone()),
    };
    let actions = request.payload.actions();

    let block = &snapshot.reference_block;
    let ref_block_prefix = block
        .ref_block_prefix()
        .ok_or(TemplateError::InvalidReferenceBlock {
            block_num: block.block_num,
        })?;
    let expiration = block
        .timestamp
        .to_time_point_sec()
        .checked_add_secs(EXPIRE_SECONDS)
        .ok_or(TemplateError::ExpirationOverflow)?;

    let accounts = distinct_accounts(
        context_free_actions
            .iter()
            .chain(actions.iter())
            .map(|a| a.account),
    );
    let abis = fetch_abis(abi_provider, &accounts).await?;

    let context_free_actions = context_free_actions
        .iter()
        .map(|a| resolve_action(a, &abis, authorization).map(|(packed, _)| packed))
        .collect::<TemplateResult<Vec<_>>>()?;
    let (actions, decoded): (Vec<_>, Vec<_>) = actions
        .iter()
        .map(|a| resolve_action(a, &abis, authorization))
        .collect::<TemplateResult<Vec<_>>>()?
        .into_iter()
        .unzip();

    let transaction = Transaction {
        header: TransactionHeader {
            expiration,
            ref_block_num: block.ref_block_num(),
            ref_block_prefix,
            ..base
        },
        context_free_actions,
        actions,
        transaction_extensions: match &request.payload {
            RequestPayload::Transaction(tx) => tx.transaction_extensions.clone(),
            RequestPayload::Action(_) | RequestPayload::ActionList(_) => Vec::new(),
        },
    };

    let abi = abis
        .get(&contract_name)
        .cloned()
        .ok_or(AbiLookupError::Missing(contract_name))?;

    tracing::info!(
        contract = %contract_name,
        actions = transaction.actions.len(),
        accounts = accounts.len(),
        expiration = %transaction.header.expiration,
        ref_block_num = transaction.header.ref_block_num,
        "transaction templated"
    );

    Ok(ResolvedTransaction {
        contract_name,
        abi,
        transaction,
        actions: decoded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::resolver::StaticAbis;
    use crate::chain::types::{Block, GetInfo};
    use crate::eosio::time::{BlockTimestamp, TimePointSec};
    use crate::request::chain_alias::ChainAlias;
    use crate::request::types::ChainIdSpec;
    use serde_json::json;

    fn name(s: &str) -> Name {
        s.parse().unwrap()
    }

    fn token_abi() -> AbiDef {
        serde_json::from_value(json!({
            "version": "eosio::abi/1.1",
            "structs": [{"name": "transfer", "base": "", "fields": [
                {"name": "from", "type": "name"},
                {"name": "to", "type": "name"},
                {"name": "quantity", "type": "asset"},
                {"name": "memo", "type": "string"}
            ]}],
            "actions": [{"name": "transfer", "type": "transfer", "ricardian_contract": ""}]
        }))
        .unwrap()
    }

    fn vote_abi() -> AbiDef {
        serde_json::from_value(json!({
            "version": "eosio::abi/1.1",
            "structs": [{"name": "voteproducer", "base": "", "fields": [
                {"name": "voter", "type": "name"},
                {"name": "proxy", "type": "name"},
                {"name": "producers", "type": "name[]"}
            ]}],
            "actions": [{"name": "voteproducer", "type": "voteproducer", "ricardian_contract": ""}]
        }))
        .unwrap()
    }

    fn provider() -> StaticAbis {
        StaticAbis::new()
            .with(name("eosio.token"), token_abi())
            .with(name("eosio"), vote_abi())
    }

    fn placeholder_auth() -> Vec<PermissionLevel> {
        vec![PermissionLevel::new(PLACEHOLDER_ACTOR, PLACEHOLDER_PERMISSION)]
    }

    fn transfer_action() -> Action {
        let data = AbiSerializer::new(&token_abi())
            .encode_action_data(
                name("transfer"),
                &json!({"from": "............1", "to": "bob", "quantity": "1.0000 EOS", "memo": "hi"}),
            )
            .unwrap();
        Action {
            account: name("eosio.token"),
            name: name("transfer"),
            authorization: placeholder_auth(),
            data,
        }
    }

    fn vote_action() -> Action {
        let data = AbiSerializer::new(&vote_abi())
            .encode_action_data(
                name("voteproducer"),
                &json!({"voter": "............1", "proxy": "", "producers": ["prod.a"]}),
            )
            .unwrap();
        Action {
            account: name("eosio"),
            name: name("voteproducer"),
            authorization: placeholder_auth(),
            data,
        }
    }

    fn snapshot(slot: u32) -> ChainSnapshot {
        ChainSnapshot {
            head_info: GetInfo {
                chain_id: ChainAlias::Eos.chain_id(),
                head_block_num: 0x0002_0010,
                head_block_id: String::new(),
                last_irreversible_block_num: 0,
                server_version: String::new(),
            },
            reference_block: Block {
                block_num: 0x0002_0010,
                id: "00020010aabbccdd11223344".to_string() + &"00".repeat(20),
                timestamp: BlockTimestamp(slot),
                ref_block_prefix: None,
            },
        }
    }

    fn signer() -> PermissionLevel {
        PermissionLevel::new(name("alice"), name("active"))
    }

    fn request(payload: RequestPayload) -> SigningRequest {
        SigningRequest::new(ChainIdSpec::Alias(ChainAlias::Eos), payload)
    }

    #[test]
    fn test_contract_name_uses_first_action() {
        let mut other = transfer_action();
        other.account = name("c");
        let payload = RequestPayload::ActionList(vec![vote_action(), transfer_action(), other]);
        assert_eq!(contract_name(&payload).unwrap(), name("eosio"));

        let tx = RequestPayload::Transaction(Transaction {
            actions: vec![transfer_action(), vote_action()],
            ..Default::default()
        });
        assert_eq!(contract_name(&tx).unwrap(), name("eosio.token"));
        assert!(matches!(
            contract_name(&RequestPayload::ActionList(Vec::new())),
            Err(TemplateError::EmptyActions)
        ));
    }

    #[test]
    fn test_resolve_authorization() {
        let signer = signer();
        let resolved = resolve_authorization(
            &PermissionLevel::new(PLACEHOLDER_ACTOR, PLACEHOLDER_ACTOR),
            &signer,
        );
        assert_eq!(resolved, signer);

        let fixed = PermissionLevel::new(name("bob"), name("owner"));
        assert_eq!(resolve_authorization(&fixed, &signer), fixed);
    }

    #[tokio::test]
    async fn test_expiration_is_reference_plus_two_hours() {
        let embedded = Transaction {
            header: TransactionHeader {
                expiration: TimePointSec(5),
                ref_block_num: 9,
                ref_block_prefix: 9,
                ..Default::default()
            },
            actions: vec![transfer_action()],
            ..Default::default()
        };
        for slot in [0u32, 1, 1_199_232_001] {
            let snap = snapshot(slot);
            let resolved = build_transaction(
                &request(RequestPayload::Transaction(embedded.clone())),
                &signer(),
                &snap,
                &provider(),
            )
            .await
            .unwrap();
            let reference = snap.reference_block.timestamp.to_time_point_sec().seconds();
            assert_eq!(resolved.transaction.header.expiration.seconds(), reference + 7200);
            assert_eq!(resolved.transaction.header.ref_block_num, 0x0010);
            assert_eq!(resolved.transaction.header.ref_block_prefix, 0x4433_2211);
        }
    }

    #[tokio::test]
    async fn test_multi_contract_actions_use_their_own_abi() {
        let resolved = build_transaction(
            &request(RequestPayload::ActionList(vec![transfer_action(), vote_action()])),
            &signer(),
            &snapshot(100),
            &provider(),
        )
        .await
        .unwrap();

        assert_eq!(resolved.contract_name, name("eosio.token"));
        assert_eq!(resolved.abi, token_abi());
        assert_eq!(resolved.actions[0].data["from"], "alice");
        assert_eq!(resolved.actions[1].data["voter"], "alice");
        assert_eq!(resolved.actions[1].data["producers"][0], "prod.a");
        for action in &resolved.transaction.actions {
            assert_eq!(action.authorization, vec![signer()]);
            // first field of both actions is the signer
            assert_eq!(&action.data[..8], &name("alice").value().to_le_bytes());
        }
    }

    #[tokio::test]
    async fn test_missing_abi_fails_whole_build() {
        let provider = StaticAbis::new().with(name("eosio.token"), token_abi());
        let err = build_transaction(
            &request(RequestPayload::ActionList(vec![transfer_action(), vote_action()])),
            &signer(),
            &snapshot(100),
            &provider,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TemplateError::Abi(AbiLookupError::Missing(a)) if a == name("eosio")));
    }

    #[tokio::test]
    async fn test_empty_payloads_fail() {
        for payload in [
            RequestPayload::ActionList(Vec::new()),
            RequestPayload::Transaction(Transaction::default()),
        ] {
            let err = build_transaction(&request(payload), &signer(), &snapshot(1), &provider())
                .await
                .unwrap_err();
            assert!(matches!(err, TemplateError::EmptyActions));
        }
    }

    #[tokio::test]
    async fn test_garbled_action_data() {
        let mut action = transfer_action();
        action.data.truncate(4);
        let err = build_transaction(
            &request(RequestPayload::Action(action)),
            &signer(),
            &snapshot(1),
            &provider(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TemplateError::ActionData { .. }));
    }
}
