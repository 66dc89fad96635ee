//! Textual `esr:` URI ⇄ [`SigningRequest`].
//!
//! # Data Flow
//! ```text
//! decode:  strip scheme → base64url → header byte → raw inflate → codec::read_body
//! encode:  codec::write_body → raw deflate (if smaller) → header byte → base64url
//! ```
//!
//! # Design Decisions
//! - Compression is injected through [`RawDeflate`] so hosts can swap the
//!   implementation; [`Flate2`] is the default
//! - Decoding is tolerant of padding and of the legacy `eosio:` scheme;
//!   encoding always emits `esr://` without padding

use std::io::{Read, Write};

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::request::codec;
use crate::request::types::{
    DecodeError, DecodeErrorKind, DecodeResult, EncodeError, EncodeResult, SigningRequest,
    SUPPORTED_VERSIONS,
};

const SCHEMES: [&str; 4] = ["web+esr:", "esr:", "web+eosio:", "eosio:"];
const COMPRESSED_FLAG: u8 = 1 << 7;

const BASE64_URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Raw (headerless) deflate primitives.
pub trait RawDeflate {
    fn deflate_raw(&self, data: &[u8]) -> std::io::Result<Vec<u8>>;
    fn inflate_raw(&self, data: &[u8]) -> std::io::Result<Vec<u8>>;
}

/// [`RawDeflate`] backed by `flate2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flate2;

impl RawDeflate for Flate2 {
    fn deflate_raw(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn inflate_raw(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut out = Vec::new();
        DeflateDecoder::new(data).read_to_end(&mut out)?;
        Ok(out)
    }
}

/// Converts between signing request URIs and envelopes.
#[derive(Debug, Clone)]
pub struct UriCodec<Z = Flate2> {
    deflate: Z,
    compress: bool,
}

impl Default for UriCodec<Flate2> {
    fn default() -> Self {
        Self::new()
    }
}

impl UriCodec<Flate2> {
    pub fn new() -> Self {
        Self {
            deflate: Flate2,
            compress: true,
        }
    }
}

impl<Z: RawDeflate> UriCodec<Z> {
    pub fn with_deflate(deflate: Z) -> Self {
        Self {
            deflate,
            compress: true,
        }
    }

    /// Never compress on encode. Decoding still inflates flagged payloads.
    pub fn uncompressed(mut self) -> Self {
        self.compress = false;
        self
    }

    pub fn decode(&self, uri: &str) -> DecodeResult<SigningRequest> {
        self.decode_inner(uri).map_err(|kind| {
            tracing::debug!(error = %kind, "signing request rejected");
            DecodeError::new(uri, kind)
        })
    }

    fn decode_inner(&self, uri: &str) -> Result<SigningRequest, DecodeErrorKind> {
        let trimmed = uri.trim();
        let rest = SCHEMES
            .iter()
            .find_map(|scheme| strip_prefix_ignore_case(trimmed, scheme))
            .ok_or(DecodeErrorKind::InvalidScheme)?;
        let payload = rest.strip_prefix("//").unwrap_or(rest);

        let raw = BASE64_URL.decode(payload)?;
        let (&header, body) = raw.split_first().ok_or(DecodeErrorKind::Empty)?;

        let version = header & !COMPRESSED_FLAG;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(DecodeErrorKind::UnsupportedVersion(version));
        }

        let request = if header & COMPRESSED_FLAG != 0 {
            let inflated = self
                .deflate
                .inflate_raw(body)
                .map_err(DecodeErrorKind::Inflate)?;
            codec::read_body(version, &inflated)?
        } else {
            codec::read_body(version, body)?
        };

        tracing::debug!(
            version,
            chain_id = %request.chain_id(),
            actions = request.payload.actions().len(),
            "signing request decoded"
        );
        Ok(request)
    }

    pub fn encode(&self, request: &SigningRequest) -> EncodeResult<String> {
        if !SUPPORTED_VERSIONS.contains(&request.version) {
            return Err(EncodeError::UnsupportedVersion(request.version));
        }
        let body = codec::write_body(request)?;

        let mut header = request.version;
        let mut out = Vec::with_capacity(body.len() + 1);
        let compressed = if self.compress {
            let deflated = self
                .deflate
                .deflate_raw(&body)
                .map_err(EncodeError::Deflate)?;
            (deflated.len() < body.len()).then_some(deflated)
        } else {
            None
        };
        match compressed {
            Some(deflated) => {
                header |= COMPRESSED_FLAG;
                out.push(header);
                out.extend_from_slice(&deflated);
            }
            None => {
                out.push(header);
                out.extend_from_slice(&body);
            }
        }

        Ok(format!("esr://{}", BASE64_URL.encode(out)))
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}
