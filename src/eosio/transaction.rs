//! Actions and transactions with their packed binary form.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::eosio::bytes::{BinaryResult, ByteReader, ByteWriter};
use crate::eosio::chain_id::ChainId;
use crate::eosio::keys::Signature;
use crate::eosio::name::Name;
use crate::eosio::time::TimePointSec;

/// Serde helper for byte vectors rendered as hex strings.
pub(crate) mod hex_data {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionLevel {
    pub actor: Name,
    pub permission: Name,
}

impl PermissionLevel {
    pub fn new(actor: Name, permission: Name) -> Self {
        Self { actor, permission }
    }

    fn write(&self, w: &mut ByteWriter) {
        w.put_u64(self.actor.value());
        w.put_u64(self.permission.value());
    }

    fn read(r: &mut ByteReader<'_>) -> BinaryResult<Self> {
        Ok(Self {
            actor: Name::from_u64(r.get_u64()?),
            permission: Name::from_u64(r.get_u64()?),
        })
    }
}

/// A contract action with binary-encoded `data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub account: Name,
    pub name: Name,
    pub authorization: Vec<PermissionLevel>,
    #[serde(with = "hex_data")]
    pub data: Vec<u8>,
}

impl Action {
    pub fn write(&self, w: &mut ByteWriter) {
        w.put_u64(self.account.value());
        w.put_u64(self.name.value());
        w.put_varuint32(self.authorization.len() as u32);
        for level in &self.authorization {
            level.write(w);
        }
        w.put_bytes(&self.data);
    }

    pub fn read(r: &mut ByteReader<'_>) -> BinaryResult<Self> {
        let account = Name::from_u64(r.get_u64()?);
        let name = Name::from_u64(r.get_u64()?);
        let count = r.get_varuint32()?;
        let authorization = (0..count)
            .map(|_| PermissionLevel::read(r))
            .collect::<BinaryResult<Vec<_>>>()?;
        let data = r.get_bytes()?;
        Ok(Self {
            account,
            name,
            authorization,
            data,
        })
    }
}

pub(crate) fn write_actions(w: &mut ByteWriter, actions: &[Action]) {
    w.put_varuint32(actions.len() as u32);
    for action in actions {
        action.write(w);
    }
}

pub(crate) fn read_actions(r: &mut ByteReader<'_>) -> BinaryResult<Vec<Action>> {
    let count = r.get_varuint32()?;
    (0..count).map(|_| Action::read(r)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionExtension {
    #[serde(rename = "type")]
    pub kind: u16,
    #[serde(with = "hex_data")]
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactionHeader {
    pub expiration: TimePointSec,
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    pub max_net_usage_words: u32,
    pub max_cpu_usage_ms: u8,
    pub delay_sec: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(flatten)]
    pub header: TransactionHeader,
    #[serde(default)]
    pub context_free_actions: Vec<Action>,
    pub actions: Vec<Action>,
    #[serde(default)]
    pub transaction_extensions: Vec<TransactionExtension>,
}

impl Transaction {
    pub fn write(&self, w: &mut ByteWriter) {
        let h = &self.header;
        w.put_u32(h.expiration.seconds());
        w.put_u16(h.ref_block_num);
        w.put_u32(h.ref_block_prefix);
        w.put_varuint32(h.max_net_usage_words);
        w.put_u8(h.max_cpu_usage_ms);
        w.put_varuint32(h.delay_sec);
        write_actions(w, &self.context_free_actions);
        write_actions(w, &self.actions);
        w.put_varuint32(self.transaction_extensions.len() as u32);
        for ext in &self.transaction_extensions {
            w.put_u16(ext.kind);
            w.put_bytes(&ext.data);
        }
    }

    pub fn read(r: &mut ByteReader<'_>) -> BinaryResult<Self> {
        let header = TransactionHeader {
            expiration: TimePointSec(r.get_u32()?),
            ref_block_num: r.get_u16()?,
            ref_block_prefix: r.get_u32()?,
            max_net_usage_words: r.get_varuint32()?,
            max_cpu_usage_ms: r.get_u8()?,
            delay_sec: r.get_varuint32()?,
        };
        let context_free_actions = read_actions(r)?;
        let actions = read_actions(r)?;
        let ext_count = r.get_varuint32()?;
        let transaction_extensions = (0..ext_count)
            .map(|_| -> BinaryResult<TransactionExtension> {
                Ok(TransactionExtension {
                    kind: r.get_u16()?,
                    data: r.get_bytes()?,
                })
            })
            .collect::<BinaryResult<Vec<_>>>()?;
        Ok(Self {
            header,
            context_free_actions,
            actions,
            transaction_extensions,
        })
    }

    pub fn pack(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        self.write(&mut w);
        w.into_bytes()
    }

    /// sha256 of the packed transaction, hex encoded.
    pub fn id(&self) -> String {
        hex::encode(Sha256::digest(self.pack()))
    }

    /// Digest signed by every authorizing key.
    ///
    /// `sha256(chain_id ‖ packed_trx ‖ cfd_hash)` where `cfd_hash` is 32 zero
    /// bytes because no context-free data is attached.
    pub fn signing_digest(&self, chain_id: &ChainId) -> [u8; 32] {
        signing_digest(chain_id, &self.pack())
    }
}

pub fn signing_digest(chain_id: &ChainId, packed_trx: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(chain_id.as_bytes());
    hasher.update(packed_trx);
    hasher.update([0u8; 32]);
    hasher.finalize().into()
}

/// A transaction together with the signatures authorizing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub transaction: Transaction,
    pub signatures: Vec<Signature>,
}

impl SignedTransaction {
    /// Body accepted by `/v1/chain/push_transaction`.
    pub fn to_packed(&self) -> PackedTransaction {
        PackedTransaction {
            signatures: self.signatures.iter().map(ToString::to_string).collect(),
            compression: "none".to_string(),
            packed_context_free_data: String::new(),
            packed_trx: hex::encode(self.transaction.pack()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedTransaction {
    pub signatures: Vec<String>,
    pub compression: String,
    pub packed_context_free_data: String,
    pub packed_trx: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer_action() -> Action {
        Action {
            account: "eosio.token".parse().unwrap(),
            name: "transfer".parse().unwrap(),
            authorization: vec![PermissionLevel::new(
                "alice".parse().unwrap(),
                "active".parse().unwrap(),
            )],
            data: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_action_binary_layout() {
        let mut w = ByteWriter::new();
        transfer_action().write(&mut w);
        let bytes = w.into_bytes();
        // account + name + 1 auth count + 1 auth + data len + data
        assert_eq!(bytes.len(), 8 + 8 + 1 + 16 + 1 + 3);
        let mut r = ByteReader::new(&bytes);
        assert_eq!(Action::read(&mut r).unwrap(), transfer_action());
    }

    #[test]
    fn test_transaction_pack_and_read() {
        let tx = Transaction {
            header: TransactionHeader {
                expiration: TimePointSec(1_546_308_000),
                ref_block_num: 0x1234,
                ref_block_prefix: 0xdead_beef,
                ..Default::default()
            },
            actions: vec![transfer_action()],
            ..Default::default()
        };
        let packed = tx.pack();
        assert_eq!(&packed[..4], &1_546_308_000u32.to_le_bytes());
        let mut r = ByteReader::new(&packed);
        assert_eq!(Transaction::read(&mut r).unwrap(), tx);
        assert!(r.is_empty());
        assert_eq!(tx.id().len(), 64);
    }

    #[test]
    fn test_signing_digest_binds_chain_id() {
        let tx = Transaction {
            actions: vec![transfer_action()],
            ..Default::default()
        };
        let a = tx.signing_digest(&ChainId::from_bytes([1; 32]));
        let b = tx.signing_digest(&ChainId::from_bytes([2; 32]));
        assert_ne!(a, b);
    }

    #[test]
    fn test_transaction_json_shape() {
        let tx = Transaction {
            actions: vec![transfer_action()],
            ..Default::default()
        };
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["expiration"], "1970-01-01T00:00:00");
        assert_eq!(json["actions"][0]["data"], "010203");
        assert_eq!(json["actions"][0]["authorization"][0]["actor"], "alice");
    }
}
