//! The `Value` tagged union and its fixed-width on-disk encoding.
//!
//! Every value, whether a B+-tree key or a tuple column, is serialized into
//! exactly [`crate::constants::VALUE_ENCODED_SIZE`] bytes: a tag byte
//! followed by a type-specific, zero-padded payload. Decoding never needs
//! schema context, which keeps node and tuple-record offset arithmetic
//! simple and schema-independent.

use crate::constants::{MAX_VARCHAR_LEN, VALUE_ENCODED_SIZE};
use crate::error::{DbError, DbResult};
use std::cmp::Ordering;

const TAG_NULL: u8 = 0;
const TAG_INT32: u8 = 1;
const TAG_FLOAT32: u8 = 2;
const TAG_VARCHAR: u8 = 3;

/// A column's declared type. Distinct from [`Value`]: a column has a type
/// whether or not any given row's value in it is null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int32,
    Float32,
    Varchar(u16),
}

impl ColumnType {
    pub fn tag(self) -> u8 {
        match self {
            ColumnType::Int32 => TAG_INT32,
            ColumnType::Float32 => TAG_FLOAT32,
            ColumnType::Varchar(_) => TAG_VARCHAR,
        }
    }

    /// The `size` field stored in a ColumnDef record: fixed for numerics,
    /// the declared capacity for strings.
    pub fn declared_size(self) -> u16 {
        match self {
            ColumnType::Int32 => 4,
            ColumnType::Float32 => 4,
            ColumnType::Varchar(n) => n,
        }
    }

    pub fn from_tag_and_size(tag: u8, size: u16) -> DbResult<Self> {
        match tag {
            TAG_INT32 => Ok(ColumnType::Int32),
            TAG_FLOAT32 => Ok(ColumnType::Float32),
            TAG_VARCHAR => Ok(ColumnType::Varchar(size)),
            _ => Err(DbError::BadType),
        }
    }
}

/// A single cell value. `Null` carries no type information of its own; the
/// owning column's declared type is what the catalog enforces on write.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int32(i32),
    Float32(f32),
    Varchar(String),
}

impl Value {
    fn tag(&self) -> u8 {
        match self {
            Value::Null => TAG_NULL,
            Value::Int32(_) => TAG_INT32,
            Value::Float32(_) => TAG_FLOAT32,
            Value::Varchar(_) => TAG_VARCHAR,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Encodes into a fixed `VALUE_ENCODED_SIZE`-byte slot.
    pub fn encode(&self) -> DbResult<[u8; VALUE_ENCODED_SIZE]> {
        let mut buf = [0u8; VALUE_ENCODED_SIZE];
        buf[0] = self.tag();
        match self {
            Value::Null => {}
            Value::Int32(v) => buf[1..5].copy_from_slice(&v.to_le_bytes()),
            Value::Float32(v) => buf[1..5].copy_from_slice(&v.to_le_bytes()),
            Value::Varchar(s) => {
                let bytes = s.as_bytes();
                if bytes.len() > MAX_VARCHAR_LEN {
                    return Err(DbError::Other(format!(
                        "varchar value {} bytes exceeds {} byte capacity",
                        bytes.len(),
                        MAX_VARCHAR_LEN
                    )));
                }
                buf[1] = bytes.len() as u8;
                buf[2..2 + bytes.len()].copy_from_slice(bytes);
            }
        }
        Ok(buf)
    }

    pub fn decode(buf: &[u8]) -> DbResult<Self> {
        debug_assert!(buf.len() >= VALUE_ENCODED_SIZE);
        match buf[0] {
            TAG_NULL => Ok(Value::Null),
            TAG_INT32 => Ok(Value::Int32(i32::from_le_bytes(
                buf[1..5].try_into().unwrap(),
            ))),
            TAG_FLOAT32 => Ok(Value::Float32(f32::from_le_bytes(
                buf[1..5].try_into().unwrap(),
            ))),
            TAG_VARCHAR => {
                let len = buf[1] as usize;
                let bytes = &buf[2..2 + len];
                let s = std::str::from_utf8(bytes)
                    .map_err(|_| DbError::Other("varchar payload is not valid utf-8".into()))?;
                Ok(Value::Varchar(s.to_string()))
            }
            _ => Err(DbError::BadType),
        }
    }

    /// Ordering is only defined within the same tag; comparing across tags
    /// (including against Null) is `BadType`.
    pub fn compare(&self, other: &Value) -> DbResult<Ordering> {
        match (self, other) {
            (Value::Int32(a), Value::Int32(b)) => Ok(a.cmp(b)),
            (Value::Float32(a), Value::Float32(b)) => {
                a.partial_cmp(b).ok_or(DbError::BadType)
            }
            (Value::Varchar(a), Value::Varchar(b)) => Ok(a.cmp(b)),
            (Value::Null, Value::Null) => Ok(Ordering::Equal),
            _ => Err(DbError::BadType),
        }
    }

    pub fn equals(&self, other: &Value) -> DbResult<bool> {
        self.compare(other).map(|ord| ord == Ordering::Equal)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Varchar(v) => write!(f, "{v}"),
        }
    }
}
