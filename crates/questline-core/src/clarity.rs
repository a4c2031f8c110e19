// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Clarity value model and consensus serialization.
//!
//! Contract-call arguments, map keys, and read-only results travel over the
//! chain API as `0x`-prefixed hex of the consensus serialization: a one-byte
//! type prefix followed by a big-endian payload. Tuples serialize their fields
//! sorted by name, which [`BTreeMap`] gives us for free.

use std::collections::BTreeMap;
use std::fmt;

use crate::c32;
use crate::error::QuestlineError;

const TYPE_INT: u8 = 0x00;
const TYPE_UINT: u8 = 0x01;
const TYPE_BUFFER: u8 = 0x02;
const TYPE_TRUE: u8 = 0x03;
const TYPE_FALSE: u8 = 0x04;
const TYPE_PRINCIPAL_STANDARD: u8 = 0x05;
const TYPE_PRINCIPAL_CONTRACT: u8 = 0x06;
const TYPE_RESPONSE_OK: u8 = 0x07;
const TYPE_RESPONSE_ERR: u8 = 0x08;
const TYPE_OPTIONAL_NONE: u8 = 0x09;
const TYPE_OPTIONAL_SOME: u8 = 0x0a;
const TYPE_LIST: u8 = 0x0b;
const TYPE_TUPLE: u8 = 0x0c;
const TYPE_STRING_ASCII: u8 = 0x0d;
const TYPE_STRING_UTF8: u8 = 0x0e;

/// Maximum nesting depth accepted when decoding.
const MAX_DEPTH: usize = 32;

/// Contract names and tuple keys are at most 128 bytes.
const MAX_NAME_LEN: usize = 128;

/// A standard principal: address version plus hash160.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StandardPrincipal {
    pub version: u8,
    pub hash160: [u8; 20],
}

impl StandardPrincipal {
    /// Parses a c32check address such as `SP3GHKMV4GSYNA8WGBX83DACG80K1RRVQZAZMB9J3`.
    pub fn from_address(address: &str) -> Result<Self, QuestlineError> {
        let (version, hash160) = c32::decode_address(address)?;
        Ok(Self { version, hash160 })
    }

    pub fn to_address(&self) -> Result<String, QuestlineError> {
        c32::encode_address(self.version, &self.hash160)
    }
}

/// A Clarity value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClarityValue {
    Int(i128),
    UInt(u128),
    Buffer(Vec<u8>),
    Bool(bool),
    StandardPrincipal(StandardPrincipal),
    ContractPrincipal(StandardPrincipal, String),
    ResponseOk(Box<ClarityValue>),
    ResponseErr(Box<ClarityValue>),
    OptionalNone,
    OptionalSome(Box<ClarityValue>),
    List(Vec<ClarityValue>),
    Tuple(BTreeMap<String, ClarityValue>),
    StringAscii(String),
    StringUtf8(String),
}

impl ClarityValue {
    /// Standard principal from a c32check address.
    pub fn principal(address: &str) -> Result<Self, QuestlineError> {
        if let Some((addr, name)) = address.split_once('.') {
            let principal = StandardPrincipal::from_address(addr)?;
            validate_name(name)?;
            return Ok(ClarityValue::ContractPrincipal(principal, name.to_string()));
        }
        Ok(ClarityValue::StandardPrincipal(StandardPrincipal::from_address(
            address,
        )?))
    }

    /// ASCII string, rejecting characters outside printable ASCII.
    pub fn string_ascii(value: &str) -> Result<Self, QuestlineError> {
        if !is_clarity_ascii(value) {
            return Err(QuestlineError::Codec(format!(
                "`{value}` is not a valid Clarity ASCII string"
            )));
        }
        Ok(ClarityValue::StringAscii(value.to_string()))
    }

    /// Tuple from `(name, value)` pairs.
    pub fn tuple<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, ClarityValue)>,
        K: Into<String>,
    {
        ClarityValue::Tuple(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Consensus serialization.
    pub fn serialize(&self) -> Result<Vec<u8>, QuestlineError> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Consensus serialization as `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> Result<String, QuestlineError> {
        Ok(format!("0x{}", hex::encode(self.serialize()?)))
    }

    /// Decodes a `0x`-prefixed (or bare) hex string.
    pub fn from_hex(input: &str) -> Result<Self, QuestlineError> {
        let trimmed = input.trim();
        let raw = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(raw)
            .map_err(|e| QuestlineError::Codec(format!("invalid hex: {e}")))?;
        Self::deserialize(&bytes)
    }

    /// Decodes exactly one value, rejecting trailing bytes.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, QuestlineError> {
        let mut reader = Reader { bytes, pos: 0 };
        let value = reader.read_value(0)?;
        if reader.pos != bytes.len() {
            return Err(QuestlineError::Codec(format!(
                "{} trailing bytes after value",
                bytes.len() - reader.pos
            )));
        }
        Ok(value)
    }

    /// Interprets a lookup result as a presence/ownership flag.
    ///
    /// `none` is false, `(some x)` is the flag of `x` when `x` is a bool and true
    /// otherwise, `(ok x)` unwraps, `uint` is true when non-zero. `(err ..)` and
    /// any other shape is a decode error.
    pub fn truthiness(&self) -> Result<bool, QuestlineError> {
        match self {
            ClarityValue::Bool(b) => Ok(*b),
            ClarityValue::OptionalNone => Ok(false),
            ClarityValue::OptionalSome(inner) => match inner.as_ref() {
                ClarityValue::Bool(b) => Ok(*b),
                _ => Ok(true),
            },
            ClarityValue::ResponseOk(inner) => inner.truthiness(),
            ClarityValue::UInt(n) => Ok(*n > 0),
            ClarityValue::ResponseErr(inner) => Err(QuestlineError::Codec(format!(
                "contract returned an error response: (err {inner})"
            ))),
            other => Err(QuestlineError::Codec(format!(
                "cannot interpret `{other}` as a flag"
            ))),
        }
    }

    /// Interprets a result as an unsigned amount, unwrapping `(ok ..)` and `(some ..)`.
    pub fn as_uint(&self) -> Result<u128, QuestlineError> {
        match self {
            ClarityValue::UInt(n) => Ok(*n),
            ClarityValue::ResponseOk(inner) | ClarityValue::OptionalSome(inner) => inner.as_uint(),
            ClarityValue::OptionalNone => Ok(0),
            other => Err(QuestlineError::Codec(format!(
                "cannot interpret `{other}` as uint"
            ))),
        }
    }

    fn write_to(&self, out: &mut Vec<u8>) -> Result<(), QuestlineError> {
        match self {
            ClarityValue::Int(n) => {
                out.push(TYPE_INT);
                out.extend_from_slice(&n.to_be_bytes());
            }
            ClarityValue::UInt(n) => {
                out.push(TYPE_UINT);
                out.extend_from_slice(&n.to_be_bytes());
            }
            ClarityValue::Buffer(bytes) => {
                out.push(TYPE_BUFFER);
                write_len(out, bytes.len())?;
                out.extend_from_slice(bytes);
            }
            ClarityValue::Bool(true) => out.push(TYPE_TRUE),
            ClarityValue::Bool(false) => out.push(TYPE_FALSE),
            ClarityValue::StandardPrincipal(p) => {
                out.push(TYPE_PRINCIPAL_STANDARD);
                out.push(p.version);
                out.extend_from_slice(&p.hash160);
            }
            ClarityValue::ContractPrincipal(p, name) => {
                validate_name(name)?;
                out.push(TYPE_PRINCIPAL_CONTRACT);
                out.push(p.version);
                out.extend_from_slice(&p.hash160);
                out.push(name.len() as u8);
                out.extend_from_slice(name.as_bytes());
            }
            ClarityValue::ResponseOk(inner) => {
                out.push(TYPE_RESPONSE_OK);
                inner.write_to(out)?;
            }
            ClarityValue::ResponseErr(inner) => {
                out.push(TYPE_RESPONSE_ERR);
                inner.write_to(out)?;
            }
            ClarityValue::OptionalNone => out.push(TYPE_OPTIONAL_NONE),
            ClarityValue::OptionalSome(inner) => {
                out.push(TYPE_OPTIONAL_SOME);
                inner.write_to(out)?;
            }
            ClarityValue::List(items) => {
                out.push(TYPE_LIST);
                write_len(out, items.len())?;
                for item in items {
                    item.write_to(out)?;
                }
            }
            ClarityValue::Tuple(fields) => {
                out.push(TYPE_TUPLE);
                write_len(out, fields.len())?;
                for (name, value) in fields {
                    validate_name(name)?;
                    out.push(name.len() as u8);
                    out.extend_from_slice(name.as_bytes());
                    value.write_to(out)?;
                }
            }
            ClarityValue::StringAscii(s) => {
                if !is_clarity_ascii(s) {
                    return Err(QuestlineError::Codec(format!(
                        "`{s}` is not a valid Clarity ASCII string"
                    )));
                }
                out.push(TYPE_STRING_ASCII);
                write_len(out, s.len())?;
                out.extend_from_slice(s.as_bytes());
            }
            ClarityValue::StringUtf8(s) => {
                out.push(TYPE_STRING_UTF8);
                write_len(out, s.len())?;
                out.extend_from_slice(s.as_bytes());
            }
        }
        Ok(())
    }
}

impl fmt::Display for ClarityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClarityValue::Int(n) => write!(f, "{n}"),
            ClarityValue::UInt(n) => write!(f, "u{n}"),
            ClarityValue::Buffer(b) => write!(f, "0x{}", hex::encode(b)),
            ClarityValue::Bool(b) => write!(f, "{b}"),
            ClarityValue::StandardPrincipal(p) => match p.to_address() {
                Ok(addr) => write!(f, "'{addr}"),
                Err(_) => write!(f, "'<version {}>", p.version),
            },
            ClarityValue::ContractPrincipal(p, name) => match p.to_address() {
                Ok(addr) => write!(f, "'{addr}.{name}"),
                Err(_) => write!(f, "'<version {}>.{name}", p.version),
            },
            ClarityValue::ResponseOk(v) => write!(f, "(ok {v})"),
            ClarityValue::ResponseErr(v) => write!(f, "(err {v})"),
            ClarityValue::OptionalNone => write!(f, "none"),
            ClarityValue::OptionalSome(v) => write!(f, "(some {v})"),
            ClarityValue::List(items) => {
                write!(f, "(list")?;
                for item in items {
                    write!(f, " {item}")?;
                }
                write!(f, ")")
            }
            ClarityValue::Tuple(fields) => {
                write!(f, "(tuple")?;
                for (k, v) in fields {
                    write!(f, " ({k} {v})")?;
                }
                write!(f, ")")
            }
            ClarityValue::StringAscii(s) => write!(f, "{s:?}"),
            ClarityValue::StringUtf8(s) => write!(f, "u{s:?}"),
        }
    }
}

/// Printable ASCII plus `\t`, `\n`, `\r`.
pub fn is_clarity_ascii(s: &str) -> bool {
    s.bytes()
        .all(|b| (0x20..0x7f).contains(&b) || matches!(b, b'\t' | b'\n' | b'\r'))
}

fn validate_name(name: &str) -> Result<(), QuestlineError> {
    if name.is_empty() || name.len() > MAX_NAME_LEN || !name.is_ascii() {
        return Err(QuestlineError::Codec(format!(
            "invalid Clarity name `{name}`"
        )));
    }
    Ok(())
}

fn write_len(out: &mut Vec<u8>, len: usize) -> Result<(), QuestlineError> {
    let len = u32::try_from(len)
        .map_err(|_| QuestlineError::Codec(format!("length {len} exceeds u32")))?;
    out.extend_from_slice(&len.to_be_bytes());
    Ok(())
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], QuestlineError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                QuestlineError::Codec(format!(
                    "unexpected end of input: need {n} bytes at offset {}",
                    self.pos
                ))
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, QuestlineError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<usize, QuestlineError> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(u32::from_be_bytes(buf) as usize)
    }

    fn u128(&mut self) -> Result<[u8; 16], QuestlineError> {
        let mut buf = [0u8; 16];
        buf.copy_from_slice(self.take(16)?);
        Ok(buf)
    }

    fn principal(&mut self) -> Result<StandardPrincipal, QuestlineError> {
        let version = self.u8()?;
        let mut hash160 = [0u8; 20];
        hash160.copy_from_slice(self.take(20)?);
        Ok(StandardPrincipal { version, hash160 })
    }

    fn name(&mut self) -> Result<String, QuestlineError> {
        let len = self.u8()? as usize;
        let raw = self.take(len)?;
        let name = std::str::from_utf8(raw)
            .map_err(|e| QuestlineError::Codec(format!("name is not utf-8: {e}")))?;
        validate_name(name)?;
        Ok(name.to_string())
    }

    /// Bounds a declared element count by the bytes left, so a hostile length
    /// cannot trigger a huge allocation before the reads fail.
    fn count(&mut self) -> Result<usize, QuestlineError> {
        let count = self.u32()?;
        if count > self.bytes.len() - self.pos {
            return Err(QuestlineError::Codec(format!(
                "declared {count} elements but only {} bytes remain",
                self.bytes.len() - self.pos
            )));
        }
        Ok(count)
    }

    fn read_value(&mut self, depth: usize) -> Result<ClarityValue, QuestlineError> {
        if depth > MAX_DEPTH {
            return Err(QuestlineError::Codec(format!(
                "value nesting exceeds {MAX_DEPTH}"
            )));
        }
        let type_id = self.u8()?;
        let value = match type_id {
            TYPE_INT => ClarityValue::Int(i128::from_be_bytes(self.u128()?)),
            TYPE_UINT => ClarityValue::UInt(u128::from_be_bytes(self.u128()?)),
            TYPE_BUFFER => {
                let len = self.u32()?;
                ClarityValue::Buffer(self.take(len)?.to_vec())
            }
            TYPE_TRUE => ClarityValue::Bool(true),
            TYPE_FALSE => ClarityValue::Bool(false),
            TYPE_PRINCIPAL_STANDARD => ClarityValue::StandardPrincipal(self.principal()?),
            TYPE_PRINCIPAL_CONTRACT => {
                let principal = self.principal()?;
                ClarityValue::ContractPrincipal(principal, self.name()?)
            }
            TYPE_RESPONSE_OK => ClarityValue::ResponseOk(Box::new(self.read_value(depth + 1)?)),
            TYPE_RESPONSE_ERR => ClarityValue::ResponseErr(Box::new(self.read_value(depth + 1)?)),
            TYPE_OPTIONAL_NONE => ClarityValue::OptionalNone,
            TYPE_OPTIONAL_SOME => {
                ClarityValue::OptionalSome(Box::new(self.read_value(depth + 1)?))
            }
            TYPE_LIST => {
                let count = self.count()?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(self.read_value(depth + 1)?);
                }
                ClarityValue::List(items)
            }
            TYPE_TUPLE => {
                let count = self.count()?;
                let mut fields = BTreeMap::new();
                for _ in 0..count {
                    let name = self.name()?;
                    let value = self.read_value(depth + 1)?;
                    if fields.insert(name.clone(), value).is_some() {
                        return Err(QuestlineError::Codec(format!(
                            "duplicate tuple field `{name}`"
                        )));
                    }
                }
                ClarityValue::Tuple(fields)
            }
            TYPE_STRING_ASCII => {
                let len = self.u32()?;
                let raw = self.take(len)?;
                let s = std::str::from_utf8(raw)
                    .ok()
                    .filter(|s| is_clarity_ascii(s))
                    .ok_or_else(|| QuestlineError::Codec("invalid ASCII string".into()))?;
                ClarityValue::StringAscii(s.to_string())
            }
            TYPE_STRING_UTF8 => {
                let len = self.u32()?;
                let raw = self.take(len)?;
                let s = std::str::from_utf8(raw)
                    .map_err(|e| QuestlineError::Codec(format!("invalid utf-8 string: {e}")))?;
                ClarityValue::StringUtf8(s.to_string())
            }
            other => {
                return Err(QuestlineError::Codec(format!(
                    "unknown type prefix 0x{other:02x}"
                )));
            }
        };
        Ok(value)
    }
}
