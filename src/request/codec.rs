//! Binary layout of a signing request body (everything after the header byte).
//!
//! ```text
//! chain_id   variant<chain_alias: uint8, chain_id: checksum256>
//! req        variant<action, action[], transaction, identity>
//! v1:  broadcast: bool, callback: {url: string, background: bool}?
//! v2:  flags: uint8 (1 = broadcast, 2 = background), callback: string,
//!      info: {key: string, value: bytes}[]
//! ```

use crate::eosio::bytes::{ByteReader, ByteWriter};
use crate::eosio::chain_id::ChainId;
use crate::eosio::transaction::{read_actions, write_actions, Action, Transaction};
use crate::request::chain_alias::ChainAlias;
use crate::request::types::{
    CallbackSpec, ChainIdSpec, DecodeErrorKind, EncodeError, EncodeResult, InfoPair,
    RequestPayload, SigningRequest,
};

const FLAG_BROADCAST: u8 = 1 << 0;
const FLAG_BACKGROUND: u8 = 1 << 1;

pub(crate) fn write_body(request: &SigningRequest) -> EncodeResult<Vec<u8>> {
    // v2 reads an empty url back as "no callback"
    if request.callback.as_ref().is_some_and(|cb| cb.url.is_empty()) {
        return Err(EncodeError::EmptyCallbackUrl);
    }

    let mut w = ByteWriter::new();

    match &request.chain_id {
        ChainIdSpec::Alias(alias) => {
            w.put_varuint32(0);
            w.put_u8(alias.index());
        }
        ChainIdSpec::Id(id) => {
            w.put_varuint32(1);
            w.put_raw(id.as_bytes());
        }
    }

    w.put_varuint32(request.payload.variant_tag());
    match &request.payload {
        RequestPayload::Action(action) => action.write(&mut w),
        RequestPayload::ActionList(actions) => write_actions(&mut w, actions),
        RequestPayload::Transaction(tx) => tx.write(&mut w),
    }

    match request.version {
        1 => {
            if !request.info.is_empty() {
                return Err(EncodeError::InfoRequiresV2);
            }
            w.put_bool(request.broadcast);
            match &request.callback {
                Some(cb) => {
                    w.put_u8(1);
                    w.put_string(&cb.url);
                    w.put_bool(cb.background);
                }
                None => w.put_u8(0),
            }
        }
        2 => {
            let mut flags = 0;
            if request.broadcast {
                flags |= FLAG_BROADCAST;
            }
            if request.callback.as_ref().is_some_and(|cb| cb.background) {
                flags |= FLAG_BACKGROUND;
            }
            w.put_u8(flags);
            w.put_string(request.callback.as_ref().map_or("", |cb| cb.url.as_str()));
            w.put_varuint32(request.info.len() as u32);
            for pair in &request.info {
                w.put_string(&pair.key);
                w.put_bytes(&pair.value);
            }
        }
        other => return Err(EncodeError::UnsupportedVersion(other)),
    }

    Ok(w.into_bytes())
}

pub(crate) fn read_body(version: u8, body: &[u8]) -> Result<SigningRequest, DecodeErrorKind> {
    let mut r = ByteReader::new(body);

    let chain_id = match r.get_varuint32()? {
        0 => {
            let index = r.get_u8()?;
            ChainIdSpec::Alias(
                ChainAlias::from_index(index).ok_or(DecodeErrorKind::UnknownChainAlias(index))?,
            )
        }
        1 => ChainIdSpec::Id(ChainId::from_bytes(r.get_array()?)),
        other => return Err(DecodeErrorKind::UnknownChainIdVariant(other)),
    };

    let payload = match r.get_varuint32()? {
        0 => RequestPayload::Action(Action::read(&mut r)?),
        1 => RequestPayload::ActionList(read_actions(&mut r)?),
        2 => RequestPayload::Transaction(Transaction::read(&mut r)?),
        // 3 is the identity request, which carries no payload to sign
        other => return Err(DecodeErrorKind::UnknownRequestVariant(other)),
    };

    let (broadcast, callback, info) = match version {
        1 => {
            let broadcast = r.get_bool()?;
            let callback = match r.get_u8()? {
                0 => None,
                _ => Some(CallbackSpec {
                    url: r.get_string()?,
                    background: r.get_bool()?,
                }),
            };
            (broadcast, callback, Vec::new())
        }
        2 => {
            let flags = r.get_u8()?;
            let url = r.get_string()?;
            let count = r.get_varuint32()?;
            let info = (0..count)
                .map(|_| -> Result<InfoPair, DecodeErrorKind> {
                    Ok(InfoPair {
                        key: r.get_string()?,
                        value: r.get_bytes()?,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let callback = (!url.is_empty()).then(|| CallbackSpec {
                url,
                background: flags & FLAG_BACKGROUND != 0,
            });
            (flags & FLAG_BROADCAST != 0, callback, info)
        }
        other => return Err(DecodeErrorKind::UnsupportedVersion(other)),
    };

    if !r.is_empty() {
        return Err(DecodeErrorKind::TrailingBytes(r.remaining()));
    }

    Ok(SigningRequest {
        version,
        chain_id,
        payload,
        broadcast,
        callback,
        info,
    })
}
