//! Contract ABI definitions as returned by `get_abi`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::eosio::bytes::BinaryError;
use crate::eosio::name::Name;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbiDef {
    pub version: String,
    pub types: Vec<AbiTypeDef>,
    pub structs: Vec<AbiStruct>,
    pub actions: Vec<AbiAction>,
    pub tables: Vec<AbiTable>,
    pub variants: Vec<AbiVariant>,
}

impl AbiDef {
    /// Struct type carried by the named action.
    pub fn action_type(&self, action: Name) -> Option<&str> {
        self.actions
            .iter()
            .find(|a| a.name == action)
            .map(|a| a.type_name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiTypeDef {
    pub new_type_name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiStruct {
    pub name: String,
    #[serde(default)]
    pub base: String,
    pub fields: Vec<AbiField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiAction {
    pub name: Name,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub ricardian_contract: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiTable {
    pub name: Name,
    #[serde(default)]
    pub index_type: String,
    #[serde(default)]
    pub key_names: Vec<String>,
    #[serde(default)]
    pub key_types: Vec<String>,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiVariant {
    pub name: String,
    pub types: Vec<String>,
}

/// Errors raised while converting action data between JSON and binary.
#[derive(Debug, Error)]
pub enum AbiError {
    #[error("unknown type '{0}'")]
    UnknownType(String),

    #[error("action '{0}' is not declared in the ABI")]
    UnknownAction(Name),

    #[error("expected {expected} for type '{type_name}'")]
    TypeMismatch {
        type_name: String,
        expected: &'static str,
    },

    #[error("invalid value for type '{type_name}': {reason}")]
    InvalidValue { type_name: String, reason: String },

    #[error("missing field '{field}' in struct '{struct_name}'")]
    MissingField { struct_name: String, field: String },

    #[error("variant '{variant}' has no alternative '{alternative}'")]
    UnknownVariantAlternative { variant: String, alternative: String },

    #[error("type nesting exceeds {0} levels")]
    TooDeep(usize),

    #[error("{0} trailing bytes after decoding")]
    TrailingBytes(usize),

    #[error(transparent)]
    Binary(#[from] BinaryError),
}

pub type AbiResult<T> = Result<T, AbiError>;
