//! Token amounts and symbols.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const MAX_PRECISION: u8 = 18;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("invalid symbol code '{0}': expected 1-7 uppercase letters")]
    InvalidSymbolCode(String),

    #[error("invalid symbol '{0}': expected '<precision>,<CODE>'")]
    InvalidSymbol(String),

    #[error("invalid asset '{0}': expected '<amount> <CODE>'")]
    InvalidAsset(String),

    #[error("precision {0} exceeds maximum of 18")]
    PrecisionTooHigh(u8),

    #[error("asset amount '{0}' is out of range")]
    AmountOutOfRange(String),
}

/// Up to seven uppercase letters packed little-endian into a `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SymbolCode(u64);

impl SymbolCode {
    pub const fn from_u64(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }
}

impl FromStr for SymbolCode {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.len() > 7 || !s.bytes().all(|c| c.is_ascii_uppercase()) {
            return Err(AssetError::InvalidSymbolCode(s.to_string()));
        }
        let value = s
            .bytes()
            .enumerate()
            .fold(0u64, |acc, (i, c)| acc | (u64::from(c) << (8 * i)));
        Ok(Self(value))
    }
}

impl fmt::Display for SymbolCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut v = self.0;
        while v != 0 {
            write!(f, "{}", (v & 0xff) as u8 as char)?;
            v >>= 8;
        }
        Ok(())
    }
}

/// Symbol code plus decimal precision. Packed as `precision | code << 8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub precision: u8,
    pub code: SymbolCode,
}

impl Symbol {
    pub fn new(precision: u8, code: SymbolCode) -> Result<Self, AssetError> {
        if precision > MAX_PRECISION {
            return Err(AssetError::PrecisionTooHigh(precision));
        }
        Ok(Self { precision, code })
    }

    pub fn from_u64(value: u64) -> Self {
        Self {
            precision: (value & 0xff) as u8,
            code: SymbolCode(value >> 8),
        }
    }

    pub fn value(self) -> u64 {
        u64::from(self.precision) | (self.code.0 << 8)
    }
}

impl FromStr for Symbol {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (precision, code) = s
            .split_once(',')
            .ok_or_else(|| AssetError::InvalidSymbol(s.to_string()))?;
        let precision: u8 = precision
            .trim()
            .parse()
            .map_err(|_| AssetError::InvalidSymbol(s.to_string()))?;
        Symbol::new(precision, code.trim().parse()?)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision, self.code)
    }
}

/// A signed amount in the smallest unit of its symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Asset {
    pub amount: i64,
    pub symbol: Symbol,
}

impl FromStr for Asset {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AssetError::InvalidAsset(s.to_string());
        let (amount, code) = s.trim().split_once(' ').ok_or_else(invalid)?;
        let code: SymbolCode = code.trim().parse()?;

        let (negative, digits) = match amount.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, amount),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        if int_part.is_empty()
            || !int_part.bytes().all(|c| c.is_ascii_digit())
            || !frac_part.bytes().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }
        let precision = u8::try_from(frac_part.len()).map_err(|_| invalid())?;
        let symbol = Symbol::new(precision, code)?;

        let magnitude: i128 = format!("{int_part}{frac_part}")
            .parse()
            .map_err(|_| AssetError::AmountOutOfRange(s.to_string()))?;
        let signed = if negative { -magnitude } else { magnitude };
        let amount =
            i64::try_from(signed).map_err(|_| AssetError::AmountOutOfRange(s.to_string()))?;

        Ok(Self { amount, symbol })
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.amount < 0 { "-" } else { "" };
        let magnitude = i128::from(self.amount).unsigned_abs();
        let precision = u32::from(self.symbol.precision);
        if precision == 0 {
            return write!(f, "{sign}{magnitude} {}", self.symbol.code);
        }
        let divisor = 10u128.pow(precision);
        write!(
            f,
            "{sign}{}.{:0width$} {}",
            magnitude / divisor,
            magnitude % divisor,
            self.symbol.code,
            width = precision as usize
        )
    }
}
