//! Well-known chain aliases usable in place of a full chain id.

use serde::{Deserialize, Serialize};

use crate::eosio::chain_id::ChainId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChainAlias {
    Eos,
    Telos,
    Jungle,
    Kylin,
    Worbli,
    Bos,
    Meetone,
    Insights,
    Beos,
    Wax,
    Proton,
    Fio,
}

const ALIASES: [(ChainAlias, u8, &str); 12] = [
    (ChainAlias::Eos, 1, "aca376f206b8fc25a6ed44dbdc66547c36c6c33e3a119ffbeaef943642f0e906"),
    (ChainAlias::Telos, 2, "4667b205c6838ef70ff7988f6e8257e8be0e1284a2f59699054a018f743b1d11"),
    (ChainAlias::Jungle, 3, "e70aaab8997e1dfce58fbfac80cbbb8fecec7b99cf982a9444273cbc64c41473"),
    (ChainAlias::Kylin, 4, "5fff1dae8dc8e2fc4d5b23b2c7665c97f9e9d8edf2b6485a86ba311c25639191"),
    (ChainAlias::Worbli, 5, "73647cde120091e0a4b85bced2f3cfdb3041e266cbbe95cee59b73235a1b3b6f"),
    (ChainAlias::Bos, 6, "d5a3d18fbb3c084e3b1f3fa98c21014b5f3db536cc15d08f9f6479517c6a3d86"),
    (ChainAlias::Meetone, 7, "cfe6486a83bad4962f232d48003b1824ab5665c36778141034d75e57b956e422"),
    (ChainAlias::Insights, 8, "b042025541e25a472bffde2d62edd457b7e70cee943412b1ea0f044f88591664"),
    (ChainAlias::Beos, 9, "b912d19a6abd2b1b05611ae5be473355d64d95aeff0c09bedc8c166cd6468fe4"),
    (ChainAlias::Wax, 10, "1064487b3cd1a897ce03ae5b6a865651747e2e152090f99c1d19d44e01aea5a4"),
    (ChainAlias::Proton, 11, "384da888112027f0321850a169f737c33e53b388aad48b5adace4bab97f437e0"),
    (ChainAlias::Fio, 12, "21dcae42c0182200e93f954a074011f9048a7624c6fe81d3c9541a614a88bd1c"),
];

impl ChainAlias {
    /// Alias for a wire index. Index 0 is reserved and never valid.
    pub fn from_index(index: u8) -> Option<Self> {
        ALIASES.iter().find(|(_, i, _)| *i == index).map(|(a, _, _)| *a)
    }

    pub fn index(self) -> u8 {
        ALIASES
            .iter()
            .find(|(a, _, _)| *a == self)
            .map_or(0, |(_, i, _)| *i)
    }

    pub fn chain_id(self) -> ChainId {
        let hex_id = ALIASES
            .iter()
            .find(|(a, _, _)| *a == self)
            .map_or("", |(_, _, id)| *id);
        let mut bytes = [0u8; 32];
        // table entries are fixed 64-char hex literals
        if hex::decode_to_slice(hex_id, &mut bytes).is_err() {
            tracing::error!(alias = ?self, "malformed chain alias table entry");
        }
        ChainId::from_bytes(bytes)
    }

    /// Alias whose canonical id equals `chain_id`, if any.
    pub fn from_chain_id(chain_id: &ChainId) -> Option<Self> {
        let hex_id = chain_id.to_hex();
        ALIASES.iter().find(|(_, _, id)| *id == hex_id).map(|(a, _, _)| *a)
    }
}
