//! JSON ⇄ binary conversion driven by an ABI.
//!
//! # Responsibilities
//! - Encode human-readable action data into its packed form
//! - Decode packed action data back into JSON
//! - Substitute signer placeholders in `name` values while decoding
//!
//! # Type Grammar
//! ```text
//! T[]   length-prefixed array
//! T?    optional, one presence byte
//! T$    binary extension, may be absent at the end of a struct
//! ```
//! Typedefs resolve before lookup. Variants use the `["type", value]` JSON form.
//! 64-bit and wider integers are rendered as strings; narrower ones as numbers.

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::abi::types::{AbiDef, AbiError, AbiResult, AbiStruct, AbiVariant};
use crate::eosio::asset::{Asset, Symbol, SymbolCode};
use crate::eosio::bytes::{ByteReader, ByteWriter};
use crate::eosio::keys::{PublicKey, Signature, KEY_TYPE_K1};
use crate::eosio::name::{Name, PLACEHOLDER_ACTOR, PLACEHOLDER_PERMISSION};
use crate::eosio::time::{BlockTimestamp, TimePoint, TimePointSec};
use crate::eosio::transaction::PermissionLevel;

const MAX_DEPTH: usize = 64;

static NULL: Value = Value::Null;

/// Indexed view over an [`AbiDef`].
#[derive(Debug)]
pub struct AbiSerializer<'a> {
    abi: &'a AbiDef,
    typedefs: HashMap<&'a str, &'a str>,
    structs: HashMap<&'a str, &'a AbiStruct>,
    variants: HashMap<&'a str, &'a AbiVariant>,
}

fn invalid(type_name: &str, reason: impl Into<String>) -> AbiError {
    AbiError::InvalidValue {
        type_name: type_name.to_string(),
        reason: reason.into(),
    }
}

fn mismatch(type_name: &str, expected: &'static str) -> AbiError {
    AbiError::TypeMismatch {
        type_name: type_name.to_string(),
        expected,
    }
}

fn as_str<'v>(value: &'v Value, type_name: &str) -> AbiResult<&'v str> {
    value.as_str().ok_or_else(|| mismatch(type_name, "a string"))
}

fn parse_str<T>(value: &Value, type_name: &str) -> AbiResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    as_str(value, type_name)?
        .parse()
        .map_err(|e: T::Err| invalid(type_name, e.to_string()))
}

fn json_to_i128(value: &Value, type_name: &str) -> AbiResult<i128> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .ok_or_else(|| invalid(type_name, format!("{n} is not an integer"))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| invalid(type_name, format!("'{s}' is not an integer"))),
        _ => Err(mismatch(type_name, "an integer")),
    }
}

fn json_to_u128(value: &Value, type_name: &str) -> AbiResult<u128> {
    match value {
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| invalid(type_name, format!("'{s}' is not an unsigned integer"))),
        other => u128::try_from(json_to_i128(other, type_name)?)
            .map_err(|_| invalid(type_name, "negative value")),
    }
}

fn int_in_range<T: TryFrom<i128>>(value: &Value, type_name: &str) -> AbiResult<T> {
    let v = json_to_i128(value, type_name)?;
    T::try_from(v).map_err(|_| invalid(type_name, format!("{v} is out of range")))
}

fn json_to_f64(value: &Value, type_name: &str) -> AbiResult<f64> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| mismatch(type_name, "a number")),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| invalid(type_name, format!("'{s}' is not a number"))),
        _ => Err(mismatch(type_name, "a number")),
    }
}

fn float_value(v: f64, type_name: &str) -> AbiResult<Value> {
    serde_json::Number::from_f64(v)
        .map(Value::Number)
        .ok_or_else(|| invalid(type_name, "non-finite float"))
}

fn hex_bytes(value: &Value, type_name: &str, expected_len: Option<usize>) -> AbiResult<Vec<u8>> {
    let bytes = hex::decode(as_str(value, type_name)?)
        .map_err(|e| invalid(type_name, e.to_string()))?;
    match expected_len {
        Some(len) if bytes.len() != len => Err(invalid(
            type_name,
            format!("expected {len} bytes, got {}", bytes.len()),
        )),
        _ => Ok(bytes),
    }
}

fn key_type(r: &mut ByteReader<'_>, type_name: &str) -> AbiResult<()> {
    match r.get_u8()? {
        KEY_TYPE_K1 => Ok(()),
        other => Err(invalid(type_name, format!("unsupported key type {other}"))),
    }
}

impl<'a> AbiSerializer<'a> {
    pub fn new(abi: &'a AbiDef) -> Self {
        Self {
            abi,
            typedefs: abi
                .types
                .iter()
                .map(|t| (t.new_type_name.as_str(), t.type_name.as_str()))
                .collect(),
            structs: abi.structs.iter().map(|s| (s.name.as_str(), s)).collect(),
            variants: abi.variants.iter().map(|v| (v.name.as_str(), v)).collect(),
        }
    }

    pub fn abi(&self) -> &AbiDef {
        self.abi
    }

    fn action_type(&self, action: Name) -> AbiResult<&'a str> {
        self.abi
            .action_type(action)
            .ok_or(AbiError::UnknownAction(action))
    }

    /// Encode JSON action arguments into packed action data.
    pub fn encode_action_data(&self, action: Name, value: &Value) -> AbiResult<Vec<u8>> {
        self.encode(self.action_type(action)?, value)
    }

    /// Decode packed action data. When `signer` is given, placeholder names
    /// are replaced with the signer's actor and permission.
    pub fn decode_action_data(
        &self,
        action: Name,
        data: &[u8],
        signer: Option<&PermissionLevel>,
    ) -> AbiResult<Value> {
        self.decode_with(self.action_type(action)?, data, signer)
    }

    pub fn encode(&self, type_name: &str, value: &Value) -> AbiResult<Vec<u8>> {
        let mut w = ByteWriter::new();
        self.encode_value(type_name, value, &mut w, 0)?;
        Ok(w.into_bytes())
    }

    pub fn decode(&self, type_name: &str, data: &[u8]) -> AbiResult<Value> {
        self.decode_with(type_name, data, None)
    }

    pub fn decode_with(
        &self,
        type_name: &str,
        data: &[u8],
        signer: Option<&PermissionLevel>,
    ) -> AbiResult<Value> {
        let mut r = ByteReader::new(data);
        let value = self.decode_value(type_name, &mut r, signer, 0)?;
        if !r.is_empty() {
            return Err(AbiError::TrailingBytes(r.remaining()));
        }
        Ok(value)
    }

    fn resolve<'t>(&'t self, type_name: &'t str) -> &'t str {
        let mut current = type_name;
        for _ in 0..MAX_DEPTH {
            match self.typedefs.get(current) {
                Some(next) => current = *next,
                None => break,
            }
        }
        current
    }

    fn encode_value(
        &self,
        type_name: &str,
        value: &Value,
        w: &mut ByteWriter,
        depth: usize,
    ) -> AbiResult<()> {
        if depth > MAX_DEPTH {
            return Err(AbiError::TooDeep(MAX_DEPTH));
        }
        if let Some(inner) = type_name.strip_suffix('$') {
            return self.encode_value(inner, value, w, depth + 1);
        }
        if let Some(inner) = type_name.strip_suffix("[]") {
            let items = value.as_array().ok_or_else(|| mismatch(type_name, "an array"))?;
            w.put_varuint32(items.len() as u32);
            for item in items {
                self.encode_value(inner, item, w, depth + 1)?;
            }
            return Ok(());
        }
        if let Some(inner) = type_name.strip_suffix('?') {
            if value.is_null() {
                w.put_u8(0);
                return Ok(());
            }
            w.put_u8(1);
            return self.encode_value(inner, value, w, depth + 1);
        }

        let resolved = self.resolve(type_name);
        if resolved != type_name {
            return self.encode_value(resolved, value, w, depth + 1);
        }
        if self.encode_builtin(type_name, value, w)? {
            return Ok(());
        }
        if let Some(variant) = self.variants.get(type_name) {
            let pair = value
                .as_array()
                .filter(|pair| pair.len() == 2)
                .ok_or_else(|| mismatch(type_name, "a [type, value] pair"))?;
            let alternative = as_str(&pair[0], type_name)?;
            let index = variant
                .types
                .iter()
                .position(|t| t == alternative)
                .ok_or_else(|| AbiError::UnknownVariantAlternative {
                    variant: type_name.to_string(),
                    alternative: alternative.to_string(),
                })?;
            w.put_varuint32(index as u32);
            return self.encode_value(alternative, &pair[1], w, depth + 1);
        }
        if let Some(def) = self.structs.get(type_name) {
            let fields = value.as_object().ok_or_else(|| mismatch(type_name, "an object"))?;
            return self.encode_struct(def, fields, w, depth + 1);
        }
        Err(AbiError::UnknownType(type_name.to_string()))
    }

    fn encode_struct(
        &self,
        def: &AbiStruct,
        fields: &Map<String, Value>,
        w: &mut ByteWriter,
        depth: usize,
    ) -> AbiResult<()> {
        // base chains may loop
        if depth > MAX_DEPTH {
            return Err(AbiError::TooDeep(MAX_DEPTH));
        }
        if !def.base.is_empty() {
            let base = self.resolve(&def.base);
            let base_def = self
                .structs
                .get(base)
                .ok_or_else(|| AbiError::UnknownType(base.to_string()))?;
            self.encode_struct(base_def, fields, w, depth + 1)?;
        }
        for field in &def.fields {
            let value = match fields.get(&field.name) {
                Some(v) => v,
                // an absent extension ends the struct
                None if field.type_name.ends_with('$') => break,
                None if field.type_name.ends_with('?') => &NULL,
                None => {
                    return Err(AbiError::MissingField {
                        struct_name: def.name.clone(),
                        field: field.name.clone(),
                    })
                }
            };
            self.encode_value(&field.type_name, value, w, depth + 1)?;
        }
        Ok(())
    }

    /// Returns `false` when `type_name` is not a built-in type.
    fn encode_builtin(&self, type_name: &str, value: &Value, w: &mut ByteWriter) -> AbiResult<bool> {
        match type_name {
            "bool" => w.put_bool(value.as_bool().ok_or_else(|| mismatch(type_name, "a bool"))?),
            "int8" => w.put_i8(int_in_range(value, type_name)?),
            "uint8" => w.put_u8(int_in_range(value, type_name)?),
            "int16" => w.put_i16(int_in_range(value, type_name)?),
            "uint16" => w.put_u16(int_in_range(value, type_name)?),
            "int32" => w.put_i32(int_in_range(value, type_name)?),
            "uint32" => w.put_u32(int_in_range(value, type_name)?),
            "int64" => w.put_i64(int_in_range(value, type_name)?),
            "uint64" => w.put_u64(int_in_range(value, type_name)?),
            "int128" => w.put_i128(json_to_i128(value, type_name)?),
            "uint128" => w.put_u128(json_to_u128(value, type_name)?),
            "varint32" => w.put_varint32(int_in_range(value, type_name)?),
            "varuint32" => w.put_varuint32(int_in_range(value, type_name)?),
            "float32" => w.put_f32(json_to_f64(value, type_name)? as f32),
            "float64" => w.put_f64(json_to_f64(value, type_name)?),
            "float128" => w.put_raw(&hex_bytes(value, type_name, Some(16))?),
            "time_point" => w.put_i64(parse_str::<TimePoint>(value, type_name)?.0),
            "time_point_sec" => w.put_u32(parse_str::<TimePointSec>(value, type_name)?.0),
            "block_timestamp_type" => w.put_u32(parse_str::<BlockTimestamp>(value, type_name)?.0),
            "name" => w.put_u64(parse_str::<Name>(value, type_name)?.value()),
            "bytes" => w.put_bytes(&hex_bytes(value, type_name, None)?),
            "string" => w.put_string(as_str(value, type_name)?),
            "checksum160" => w.put_raw(&hex_bytes(value, type_name, Some(20))?),
            "checksum256" => w.put_raw(&hex_bytes(value, type_name, Some(32))?),
            "checksum512" => w.put_raw(&hex_bytes(value, type_name, Some(64))?),
            "public_key" => {
                w.put_u8(KEY_TYPE_K1);
                w.put_raw(parse_str::<PublicKey>(value, type_name)?.as_bytes());
            }
            "signature" => {
                w.put_u8(KEY_TYPE_K1);
                w.put_raw(parse_str::<Signature>(value, type_name)?.as_bytes());
            }
            "symbol" => w.put_u64(parse_str::<Symbol>(value, type_name)?.value()),
            "symbol_code" => w.put_u64(parse_str::<SymbolCode>(value, type_name)?.value()),
            "asset" => {
                let asset: Asset = parse_str(value, type_name)?;
                w.put_i64(asset.amount);
                w.put_u64(asset.symbol.value());
            }
            "extended_asset" => {
                let obj = value.as_object().ok_or_else(|| mismatch(type_name, "an object"))?;
                let field = |name: &str| {
                    obj.get(name).ok_or_else(|| AbiError::MissingField {
                        struct_name: type_name.to_string(),
                        field: name.to_string(),
                    })
                };
                let asset: Asset = parse_str(field("quantity")?, "asset")?;
                let contract: Name = parse_str(field("contract")?, "name")?;
                w.put_i64(asset.amount);
                w.put_u64(asset.symbol.value());
                w.put_u64(contract.value());
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn decode_value(
        &self,
        type_name: &str,
        r: &mut ByteReader<'_>,
        signer: Option<&PermissionLevel>,
        depth: usize,
    ) -> AbiResult<Value> {
        if depth > MAX_DEPTH {
            return Err(AbiError::TooDeep(MAX_DEPTH));
        }
        if let Some(inner) = type_name.strip_suffix('$') {
            return self.decode_value(inner, r, signer, depth + 1);
        }
        if let Some(inner) = type_name.strip_suffix("[]") {
            let count = r.get_varuint32()?;
            let items = (0..count)
                .map(|_| self.decode_value(inner, r, signer, depth + 1))
                .collect::<AbiResult<Vec<_>>>()?;
            return Ok(Value::Array(items));
        }
        if let Some(inner) = type_name.strip_suffix('?') {
            return match r.get_u8()? {
                0 => Ok(Value::Null),
                _ => self.decode_value(inner, r, signer, depth + 1),
            };
        }

        let resolved = self.resolve(type_name);
        if resolved != type_name {
            return self.decode_value(resolved, r, signer, depth + 1);
        }
        if let Some(value) = self.decode_builtin(type_name, r, signer)? {
            return Ok(value);
        }
        if let Some(variant) = self.variants.get(type_name) {
            let index = r.get_varuint32()? as usize;
            let alternative = variant.types.get(index).ok_or_else(|| {
                AbiError::UnknownVariantAlternative {
                    variant: type_name.to_string(),
                    alternative: index.to_string(),
                }
            })?;
            let inner = self.decode_value(alternative, r, signer, depth + 1)?;
            return Ok(Value::Array(vec![Value::String(alternative.clone()), inner]));
        }
        if let Some(def) = self.structs.get(type_name) {
            let mut fields = Map::new();
            self.decode_struct(def, r, signer, &mut fields, depth + 1)?;
            return Ok(Value::Object(fields));
        }
        Err(AbiError::UnknownType(type_name.to_string()))
    }

    fn decode_struct(
        &self,
        def: &AbiStruct,
        r: &mut ByteReader<'_>,
        signer: Option<&PermissionLevel>,
        fields: &mut Map<String, Value>,
        depth: usize,
    ) -> AbiResult<()> {
        // base chains may loop
        if depth > MAX_DEPTH {
            return Err(AbiError::TooDeep(MAX_DEPTH));
        }
        if !def.base.is_empty() {
            let base = self.resolve(&def.base);
            let base_def = self
                .structs
                .get(base)
                .ok_or_else(|| AbiError::UnknownType(base.to_string()))?;
            self.decode_struct(base_def, r, signer, fields, depth + 1)?;
        }
        for field in &def.fields {
            if field.type_name.ends_with('$') && r.is_empty() {
                break;
            }
            let value = self.decode_value(&field.type_name, r, signer, depth + 1)?;
            fields.insert(field.name.clone(), value);
        }
        Ok(())
    }

    fn decode_builtin(
        &self,
        type_name: &str,
        r: &mut ByteReader<'_>,
        signer: Option<&PermissionLevel>,
    ) -> AbiResult<Option<Value>> {
        let value = match type_name {
            "bool" => Value::Bool(r.get_bool()?),
            "int8" => Value::from(r.get_i8()?),
            "uint8" => Value::from(r.get_u8()?),
            "int16" => Value::from(r.get_i16()?),
            "uint16" => Value::from(r.get_u16()?),
            "int32" => Value::from(r.get_i32()?),
            "uint32" => Value::from(r.get_u32()?),
            "int64" => Value::String(r.get_i64()?.to_string()),
            "uint64" => Value::String(r.get_u64()?.to_string()),
            "int128" => Value::String(r.get_i128()?.to_string()),
            "uint128" => Value::String(r.get_u128()?.to_string()),
            "varint32" => Value::from(r.get_varint32()?),
            "varuint32" => Value::from(r.get_varuint32()?),
            "float32" => float_value(f64::from(r.get_f32()?), type_name)?,
            "float64" => float_value(r.get_f64()?, type_name)?,
            "float128" => Value::String(hex::encode(r.take(16)?)),
            "time_point" => Value::String(TimePoint(r.get_i64()?).to_string()),
            "time_point_sec" => Value::String(TimePointSec(r.get_u32()?).to_string()),
            "block_timestamp_type" => Value::String(BlockTimestamp(r.get_u32()?).to_string()),
            "name" => {
                let mut name = Name::from_u64(r.get_u64()?);
                if let Some(signer) = signer {
                    if name == PLACEHOLDER_ACTOR {
                        name = signer.actor;
                    } else if name == PLACEHOLDER_PERMISSION {
                        name = signer.permission;
                    }
                }
                Value::String(name.to_string())
            }
            "bytes" => Value::String(hex::encode(r.get_bytes()?)),
            "string" => Value::String(r.get_string()?),
            "checksum160" => Value::String(hex::encode(r.take(20)?)),
            "checksum256" => Value::String(hex::encode(r.take(32)?)),
            "checksum512" => Value::String(hex::encode(r.take(64)?)),
            "public_key" => {
                key_type(r, type_name)?;
                let key = PublicKey::from_bytes(r.take(33)?)
                    .map_err(|e| invalid(type_name, e.to_string()))?;
                Value::String(key.to_string())
            }
            "signature" => {
                key_type(r, type_name)?;
                let sig = Signature::from_bytes(r.take(65)?)
                    .map_err(|e| invalid(type_name, e.to_string()))?;
                Value::String(sig.to_string())
            }
            "symbol" => Value::String(Symbol::from_u64(r.get_u64()?).to_string()),
            "symbol_code" => Value::String(SymbolCode::from_u64(r.get_u64()?).to_string()),
            "asset" => Value::String(read_asset(r)?.to_string()),
            "extended_asset" => {
                let quantity = read_asset(r)?;
                let contract = Name::from_u64(r.get_u64()?);
                serde_json::json!({
                    "quantity": quantity.to_string(),
                    "contract": contract.to_string(),
                })
            }
            _ => return Ok(None),
        };
        Ok(Some(value))
    }
}

fn read_asset(r: &mut ByteReader<'_>) -> AbiResult<Asset> {
    let amount = r.get_i64()?;
    let symbol = Symbol::from_u64(r.get_u64()?);
    Ok(Asset { amount, symbol })
}
