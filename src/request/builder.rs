//! Build signing requests from human-readable action data.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::abi::AbiSerializer;
use crate::chain::resolver::{distinct_accounts, fetch_abis, AbiProvider};
use crate::chain::types::AbiLookupError;
use crate::eosio::name::{Name, PLACEHOLDER_ACTOR, PLACEHOLDER_PERMISSION};
use crate::eosio::transaction::{Action, PermissionLevel};
use crate::request::types::{
    CallbackSpec, ChainIdSpec, EncodeError, EncodeResult, InfoPair, RequestPayload,
    SigningRequest, DEFAULT_VERSION,
};

/// An action whose `data` is JSON rather than packed bytes.
///
/// An empty `authorization` means "whoever signs": it becomes the
/// placeholder `............1@............2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonAction {
    pub account: Name,
    pub name: Name,
    #[serde(default)]
    pub authorization: Vec<PermissionLevel>,
    pub data: Value,
}

/// A full request written by hand, as read by `esr encode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDocument {
    pub chain_id: ChainIdSpec,
    pub actions: Vec<JsonAction>,
    #[serde(default = "default_version")]
    pub version: u8,
    #[serde(default = "default_broadcast")]
    pub broadcast: bool,
    #[serde(default)]
    pub callback: Option<CallbackSpec>,
    #[serde(default)]
    pub info: Vec<InfoPair>,
}

fn default_version() -> u8 {
    DEFAULT_VERSION
}

fn default_broadcast() -> bool {
    true
}

impl RequestDocument {
    pub async fn into_request<P>(self, provider: &P) -> EncodeResult<SigningRequest>
    where
        P: AbiProvider + ?Sized,
    {
        let mut request =
            SigningRequest::from_json_actions(self.chain_id, &self.actions, provider).await?;
        request.version = self.version;
        request.broadcast = self.broadcast;
        request.callback = self.callback;
        request.info = self.info;
        Ok(request)
    }
}

impl SigningRequest {
    /// Pack JSON action data with each account's ABI. One action yields an
    /// `Action` payload, anything else an `ActionList`.
    pub async fn from_json_actions<P>(
        chain_id: ChainIdSpec,
        actions: &[JsonAction],
        provider: &P,
    ) -> EncodeResult<Self>
    where
        P: AbiProvider + ?Sized,
    {
        let accounts = distinct_accounts(actions.iter().map(|a| a.account));
        let abis = fetch_abis(provider, &accounts).await?;

        let mut packed = Vec::with_capacity(actions.len());
        for action in actions {
            // fetch_abis returns every requested account or fails
            let abi = abis
                .get(&action.account)
                .ok_or(AbiLookupError::Missing(action.account))?;
            let data = AbiSerializer::new(abi)
                .encode_action_data(action.name, &action.data)
                .map_err(|source| EncodeError::ActionData {
                    account: action.account,
                    action: action.name,
                    source,
                })?;
            let authorization = if action.authorization.is_empty() {
                vec![PermissionLevel::new(PLACEHOLDER_ACTOR, PLACEHOLDER_PERMISSION)]
            } else {
                action.authorization.clone()
            };
            packed.push(Action {
                account: action.account,
                name: action.name,
                authorization,
                data,
            });
        }

        let payload = match <[Action; 1]>::try_from(packed) {
            Ok([single]) => RequestPayload::Action(single),
            Err(list) => RequestPayload::ActionList(list),
        };
        Ok(Self::new(chain_id, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::AbiDef;
    use crate::chain::resolver::StaticAbis;
    use crate::request::chain_alias::ChainAlias;
    use serde_json::json;

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

    fn transfer(account: &str) -> JsonAction {
        JsonAction {
            account: account.parse().unwrap(),
            name: "transfer".parse().unwrap(),
            authorization: Vec::new(),
            data: json!({"from": "............1", "to": "bob", "quantity": "1.0000 EOS", "memo": ""}),
        }
    }

    #[tokio::test]
    async fn test_single_action_payload() {
        let provider = StaticAbis::new().with("eosio.token".parse().unwrap(), token_abi());
        let request = SigningRequest::from_json_actions(
            ChainIdSpec::Alias(ChainAlias::Eos),
            &[transfer("eosio.token")],
            &provider,
        )
        .await
        .unwrap();

        let RequestPayload::Action(action) = &request.payload else {
            panic!("expected single action payload");
        };
        assert_eq!(action.authorization[0].actor, PLACEHOLDER_ACTOR);
        // from is the actor placeholder
        assert_eq!(&action.data[..8], &1u64.to_le_bytes());
    }

    #[tokio::test]
    async fn test_multiple_actions_and_missing_abi() {
        let provider = StaticAbis::new()
            .with("eosio.token".parse().unwrap(), token_abi())
            .with("other.token".parse().unwrap(), token_abi());
        let request = SigningRequest::from_json_actions(
            ChainIdSpec::Alias(ChainAlias::Eos),
            &[transfer("eosio.token"), transfer("other.token")],
            &provider,
        )
        .await
        .unwrap();
        assert!(matches!(&request.payload, RequestPayload::ActionList(list) if list.len() == 2));

        let err = SigningRequest::from_json_actions(
            ChainIdSpec::Alias(ChainAlias::Eos),
            &[transfer("eosio.token"), transfer("nocontract")],
            &provider,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EncodeError::Abi(AbiLookupError::Missing(_))));
    }

    #[tokio::test]
    async fn test_bad_action_data() {
        let provider = StaticAbis::new().with("eosio.token".parse().unwrap(), token_abi());
        let mut action = transfer("eosio.token");
        action.data = json!({"from": "alice"});
        let err = SigningRequest::from_json_actions(
            ChainIdSpec::Alias(ChainAlias::Eos),
            &[action],
            &provider,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EncodeError::ActionData { .. }));
    }

    #[tokio::test]
    async fn test_document_defaults() {
        let doc: RequestDocument = serde_json::from_value(json!({
            "chain_id": {"alias": "EOS"},
            "actions": [transfer("eosio.token")],
            "callback": {"url": "https://cb.example/{{tx}}"}
        }))
        .unwrap();
        assert_eq!(doc.version, 2);
        assert!(doc.broadcast);

        let provider = StaticAbis::new().with("eosio.token".parse().unwrap(), token_abi());
        let request = doc.into_request(&provider).await.unwrap();
        assert_eq!(request.callback.unwrap().url, "https://cb.example/{{tx}}");
    }
}
