//! K1 (secp256k1) keys and signatures in their chain string formats.
//!
//! # Formats
//! - Public key: `EOS<base58>` (legacy) or `PUB_K1_<base58>`
//! - Private key: WIF (`5...`) or `PVT_K1_<base58>`
//! - Signature: `SIG_K1_<base58>`
//!
//! Legacy public keys carry `ripemd160(key)[..4]`, WIF carries
//! `sha256(sha256(0x80 ‖ key))[..4]`, and every `*_K1_` form carries
//! `ripemd160(data ‖ "K1")[..4]`.
//!
//! # Security
//! - Private keys are never formatted by `Debug`
//! - Signatures are always canonical (both `r` and `s` below 2^255 with
//!   no redundant leading zero byte)

use k256::ecdsa::signature::hazmat::RandomizedPrehashSigner;
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use ripemd::Ripemd160;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Binary type tag for K1 keys and signatures.
pub const KEY_TYPE_K1: u8 = 0;

const LEGACY_PUBLIC_PREFIX: &str = "EOS";
const MAX_SIGN_ATTEMPTS: u32 = 64;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid base58: {0}")]
    Base58(#[from] bs58::decode::Error),

    #[error("unsupported key format '{0}'")]
    UnsupportedFormat(String),

    #[error("checksum mismatch")]
    Checksum,

    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("unsupported key type {0}")]
    UnsupportedKeyType(u8),

    #[error("invalid key material: {0}")]
    Ecdsa(#[from] k256::ecdsa::Error),

    #[error("no canonical signature after {0} attempts")]
    NonCanonical(u32),
}

pub type KeyResult<T> = Result<T, KeyError>;

fn ripemd_checksum(data: &[u8], suffix: &[u8]) -> [u8; 4] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.update(suffix);
    let out = hasher.finalize();
    [out[0], out[1], out[2], out[3]]
}

fn encode_checked(data: &[u8], suffix: &[u8]) -> String {
    let mut buf = data.to_vec();
    buf.extend_from_slice(&ripemd_checksum(data, suffix));
    bs58::encode(buf).into_string()
}

fn decode_checked(s: &str, suffix: &[u8], expected: usize) -> KeyResult<Vec<u8>> {
    let mut raw = bs58::decode(s).into_vec()?;
    if raw.len() != expected + 4 {
        return Err(KeyError::Length {
            expected: expected + 4,
            actual: raw.len(),
        });
    }
    let checksum = raw.split_off(expected);
    if checksum != ripemd_checksum(&raw, suffix) {
        return Err(KeyError::Checksum);
    }
    Ok(raw)
}

fn sha256d_checksum(data: &[u8]) -> [u8; 4] {
    let out = Sha256::digest(Sha256::digest(data));
    [out[0], out[1], out[2], out[3]]
}

/// Compressed SEC1 secp256k1 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; 33]);

impl PublicKey {
    pub fn from_bytes(bytes: &[u8]) -> KeyResult<Self> {
        let data: [u8; 33] = bytes.try_into().map_err(|_| KeyError::Length {
            expected: 33,
            actual: bytes.len(),
        })?;
        VerifyingKey::from_sec1_bytes(&data)?;
        Ok(Self(data))
    }

    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(true);
        let mut data = [0u8; 33];
        data.copy_from_slice(point.as_bytes());
        Self(data)
    }

    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }

    pub fn to_legacy_string(&self) -> String {
        format!("{LEGACY_PUBLIC_PREFIX}{}", encode_checked(&self.0, b""))
    }

    pub fn to_k1_string(&self) -> String {
        format!("PUB_K1_{}", encode_checked(&self.0, b"K1"))
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let data = if let Some(rest) = s.strip_prefix("PUB_K1_") {
            decode_checked(rest, b"K1", 33)?
        } else if let Some(rest) = s.strip_prefix(LEGACY_PUBLIC_PREFIX) {
            decode_checked(rest, b"", 33)?
        } else {
            return Err(KeyError::UnsupportedFormat(s.to_string()));
        };
        Self::from_bytes(&data)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_legacy_string())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({self})")
    }
}

/// Recoverable signature: `[recovery header, r(32), s(32)]`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; 65]);

impl Signature {
    pub fn from_bytes(bytes: &[u8]) -> KeyResult<Self> {
        let data: [u8; 65] = bytes.try_into().map_err(|_| KeyError::Length {
            expected: 65,
            actual: bytes.len(),
        })?;
        Ok(Self(data))
    }

    fn from_parts(signature: &EcdsaSignature, recovery_id: RecoveryId) -> Self {
        let mut data = [0u8; 65];
        // 27 + 4 marks a compressed public key
        data[0] = recovery_id.to_byte() + 27 + 4;
        data[1..].copy_from_slice(&signature.to_bytes());
        Self(data)
    }

    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    pub fn is_canonical(&self) -> bool {
        let d = &self.0;
        d[1] & 0x80 == 0
            && !(d[1] == 0 && d[2] & 0x80 == 0)
            && d[33] & 0x80 == 0
            && !(d[33] == 0 && d[34] & 0x80 == 0)
    }

    /// Recover the public key that produced this signature over `digest`.
    pub fn recover(&self, digest: &[u8; 32]) -> KeyResult<PublicKey> {
        let header = self.0[0].wrapping_sub(27);
        let recovery_id = RecoveryId::from_byte(header & 3)
            .ok_or(KeyError::UnsupportedKeyType(self.0[0]))?;
        let signature = EcdsaSignature::from_slice(&self.0[1..])?;
        let key = VerifyingKey::recover_from_prehash(digest, &signature, recovery_id)?;
        Ok(PublicKey::from_verifying_key(&key))
    }
}

impl FromStr for Signature {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("SIG_K1_")
            .ok_or_else(|| KeyError::UnsupportedFormat(s.to_string()))?;
        Self::from_bytes(&decode_checked(rest, b"K1", 65)?)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SIG_K1_{}", encode_checked(&self.0, b"K1"))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({self})")
    }
}

/// secp256k1 private key.
#[derive(Clone)]
pub struct PrivateKey(SigningKey);

impl PrivateKey {
    pub fn from_bytes(bytes: &[u8]) -> KeyResult<Self> {
        Ok(Self(SigningKey::from_slice(bytes)?))
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_verifying_key(self.0.verifying_key())
    }

    /// Legacy wallet import format.
    pub fn to_wif(&self) -> String {
        let mut buf = vec![0x80];
        buf.extend_from_slice(&self.0.to_bytes());
        let checksum = sha256d_checksum(&buf);
        buf.extend_from_slice(&checksum);
        bs58::encode(buf).into_string()
    }

    /// Sign a 32-byte digest, retrying with fresh nonces until canonical.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> KeyResult<Signature> {
        let (signature, recovery_id) = self.0.sign_prehash_recoverable(digest)?;
        let first = Signature::from_parts(&signature, recovery_id);
        if first.is_canonical() {
            return Ok(first);
        }

        let verifying_key = self.0.verifying_key();
        for _ in 0..MAX_SIGN_ATTEMPTS {
            let signature: EcdsaSignature = self.0.sign_prehash_with_rng(&mut OsRng, digest)?;
            let recovery_id =
                RecoveryId::trial_recovery_from_prehash(verifying_key, digest, &signature)?;
            let candidate = Signature::from_parts(&signature, recovery_id);
            if candidate.is_canonical() {
                return Ok(candidate);
            }
        }
        Err(KeyError::NonCanonical(MAX_SIGN_ATTEMPTS))
    }
}

impl FromStr for PrivateKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix("PVT_K1_") {
            return Self::from_bytes(&decode_checked(rest, b"K1", 32)?);
        }
        let raw = bs58::decode(s).into_vec()?;
        if raw.len() != 37 {
            return Err(KeyError::Length {
                expected: 37,
                actual: raw.len(),
            });
        }
        if raw[0] != 0x80 {
            return Err(KeyError::UnsupportedFormat("WIF version byte".to_string()));
        }
        if raw[33..] != sha256d_checksum(&raw[..33]) {
            return Err(KeyError::Checksum);
        }
        Self::from_bytes(&raw[1..33])
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

macro_rules! string_serde {
    ($($ty:ty),*) => {$(
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    )*};
}

string_serde!(PublicKey, Signature);
