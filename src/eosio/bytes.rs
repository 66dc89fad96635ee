//! Little-endian binary encoding shared by the request codec, the ABI
//! serializer and transaction packing.

use thiserror::Error;

/// Errors raised while reading serialized data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BinaryError {
    #[error("unexpected end of data at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("varint at offset {0} does not fit in 32 bits")]
    VarintOverflow(usize),

    #[error("invalid utf-8 string at offset {0}")]
    InvalidUtf8(usize),

    #[error("invalid bool byte 0x{0:02x}")]
    InvalidBool(u8),
}

pub type BinaryResult<T> = Result<T, BinaryError>;

/// Append-only buffer for serialized values.
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn put_bool(&mut self, v: bool) {
        self.buf.push(v as u8);
    }

    pub fn put_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_u128(&mut self, v: u128) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_i8(&mut self, v: i8) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_i16(&mut self, v: i16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_i128(&mut self, v: i128) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// LEB128-style unsigned varint, at most 5 bytes.
    pub fn put_varuint32(&mut self, mut v: u32) {
        loop {
            let byte = (v & 0x7f) as u8;
            v >>= 7;
            if v == 0 {
                self.buf.push(byte);
                break;
            }
            self.buf.push(byte | 0x80);
        }
    }

    /// Zigzag-encoded signed varint.
    pub fn put_varint32(&mut self, v: i32) {
        self.put_varuint32(((v << 1) ^ (v >> 31)) as u32);
    }

    /// Raw bytes with no length prefix.
    pub fn put_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Length-prefixed bytes.
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.put_varuint32(bytes.len() as u32);
        self.buf.extend_from_slice(bytes);
    }

    pub fn put_string(&mut self, s: &str) {
        self.put_bytes(s.as_bytes());
    }
}

/// Cursor over serialized data.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn take(&mut self, n: usize) -> BinaryResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(BinaryError::UnexpectedEof {
                offset: self.pos,
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn get_array<const N: usize>(&mut self) -> BinaryResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn get_u8(&mut self) -> BinaryResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn get_bool(&mut self) -> BinaryResult<bool> {
        match self.get_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(BinaryError::InvalidBool(other)),
        }
    }

    pub fn get_u16(&mut self) -> BinaryResult<u16> {
        Ok(u16::from_le_bytes(self.get_array()?))
    }

    pub fn get_u32(&mut self) -> BinaryResult<u32> {
        Ok(u32::from_le_bytes(self.get_array()?))
    }

    pub fn get_u64(&mut self) -> BinaryResult<u64> {
        Ok(u64::from_le_bytes(self.get_array()?))
    }

    pub fn get_u128(&mut self) -> BinaryResult<u128> {
        Ok(u128::from_le_bytes(self.get_array()?))
    }

    pub fn get_i8(&mut self) -> BinaryResult<i8> {
        Ok(i8::from_le_bytes(self.get_array()?))
    }

    pub fn get_i16(&mut self) -> BinaryResult<i16> {
        Ok(i16::from_le_bytes(self.get_array()?))
    }

    pub fn get_i32(&mut self) -> BinaryResult<i32> {
        Ok(i32::from_le_bytes(self.get_array()?))
    }

    pub fn get_i64(&mut self) -> BinaryResult<i64> {
        Ok(i64::from_le_bytes(self.get_array()?))
    }

    pub fn get_i128(&mut self) -> BinaryResult<i128> {
        Ok(i128::from_le_bytes(self.get_array()?))
    }

    pub fn get_f32(&mut self) -> BinaryResult<f32> {
        Ok(f32::from_le_bytes(self.get_array()?))
    }

    pub fn get_f64(&mut self) -> BinaryResult<f64> {
        Ok(f64::from_le_bytes(self.get_array()?))
    }

    pub fn get_varuint32(&mut self) -> BinaryResult<u32> {
        let start = self.pos;
        let mut result: u64 = 0;
        let mut shift = 0;
        loop {
            let byte = self.get_u8()?;
            result |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
            if shift >= 35 {
                return Err(BinaryError::VarintOverflow(start));
            }
        }
        u32::try_from(result).map_err(|_| BinaryError::VarintOverflow(start))
    }

    pub fn get_varint32(&mut self) -> BinaryResult<i32> {
        let v = self.get_varuint32()?;
        Ok(((v >> 1) as i32) ^ -((v & 1) as i32))
    }

    pub fn get_bytes(&mut self) -> BinaryResult<Vec<u8>> {
        let len = self.get_varuint32()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    pub fn get_string(&mut self) -> BinaryResult<String> {
        let offset = self.pos;
        let bytes = self.get_bytes()?;
        String::from_utf8(bytes).map_err(|_| BinaryError::InvalidUtf8(offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varuint32_boundaries() {
        for v in [0u32, 1, 127, 128, 300, 16_383, 16_384, u32::MAX] {
            let mut w = ByteWriter::new();
            w.put_varuint32(v);
            let bytes = w.into_bytes();
            let mut r = ByteReader::new(&bytes);
            assert_eq!(r.get_varuint32().unwrap(), v);
            assert!(r.is_empty());
        }
    }

    #[test]
    fn test_varuint32_encoding() {
        let mut w = ByteWriter::new();
        w.put_varuint32(300);
        assert_eq!(w.as_slice(), &[0xac, 0x02]);
    }

    #[test]
    fn test_varint32_zigzag() {
        let mut w = ByteWriter::new();
        w.put_varint32(-1);
        w.put_varint32(1);
        w.put_varint32(i32::MIN);
        assert_eq!(&w.as_slice()[..2], &[0x01, 0x02]);
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.get_varint32().unwrap(), -1);
        assert_eq!(r.get_varint32().unwrap(), 1);
        assert_eq!(r.get_varint32().unwrap(), i32::MIN);
    }

    #[test]
    fn test_varuint32_overflow() {
        let bytes = [0xff, 0xff, 0xff, 0xff, 0xff, 0x01];
        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.get_varuint32(), Err(BinaryError::VarintOverflow(0)));
    }

    #[test]
    fn test_truncated_read() {
        let bytes = [0x01, 0x02];
        let mut r = ByteReader::new(&bytes);
        let err = r.get_u32().unwrap_err();
        assert!(matches!(err, BinaryError::UnexpectedEof { needed: 4, remaining: 2, .. }));
    }

    #[test]
    fn test_string_roundtrip() {
        let mut w = ByteWriter::new();
        w.put_string("hello");
        assert_eq!(w.as_slice()[0], 5);
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.get_string().unwrap(), "hello");
    }

    #[test]
    fn test_invalid_bool() {
        let mut r = ByteReader::new(&[2]);
        assert_eq!(r.get_bool(), Err(BinaryError::InvalidBool(2)));
    }
}
