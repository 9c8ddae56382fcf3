//! Tuple header and the fixed-layout record a tuple is serialized into.

use crate::constants::{TUPLE_HEADER_SIZE, VALUE_ENCODED_SIZE};
use crate::error::{DbError, DbResult};
use crate::value::Value;

/// {xmin, xmax, is_deleted}. `xmax == 0` means "not deleted by anyone yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TupleHeader {
    pub xmin: u64,
    pub xmax: u64,
    pub is_deleted: bool,
}

impl TupleHeader {
    fn encode(&self, buf: &mut [u8]) {
        buf[0..8].copy_from_slice(&self.xmin.to_le_bytes());
        buf[8..16].copy_from_slice(&self.xmax.to_le_bytes());
        buf[16] = self.is_deleted as u8;
    }

    fn decode(buf: &[u8]) -> Self {
        TupleHeader {
            xmin: u64::from_le_bytes(buf[0..8].try_into().unwrap()),
            xmax: u64::from_le_bytes(buf[8..16].try_into().unwrap()),
            is_deleted: buf[16] != 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    pub header: TupleHeader,
    pub values: Vec<Value>,
}

impl Tuple {
    /// Encodes into exactly `record_size` bytes
    /// (`TUPLE_HEADER_SIZE + columns.len() * VALUE_ENCODED_SIZE`).
    pub fn encode(&self, record_size: usize) -> DbResult<Vec<u8>> {
        let expected = TUPLE_HEADER_SIZE + self.values.len() * VALUE_ENCODED_SIZE;
        if expected != record_size {
            return Err(DbError::Other(format!(
                "tuple record size mismatch: schema expects {record_size}, tuple encodes to {expected}"
            )));
        }

        let mut buf = vec![0u8; record_size];
        self.header.encode(&mut buf[0..TUPLE_HEADER_SIZE]);

        let mut offset = TUPLE_HEADER_SIZE;
        for value in &self.values {
            let encoded = value.encode()?;
            buf[offset..offset + VALUE_ENCODED_SIZE].copy_from_slice(&encoded);
            offset += VALUE_ENCODED_SIZE;
        }
        Ok(buf)
    }

    pub fn decode(buf: &[u8], column_count: usize) -> DbResult<Self> {
        let header = TupleHeader::decode(&buf[0..TUPLE_HEADER_SIZE]);
        let mut values = Vec::with_capacity(column_count);
        let mut offset = TUPLE_HEADER_SIZE;
        for _ in 0..column_count {
            values.push(Value::decode(&buf[offset..offset + VALUE_ENCODED_SIZE])?);
            offset += VALUE_ENCODED_SIZE;
        }
        Ok(Tuple { header, values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuple_round_trips() {
        let tuple = Tuple {
            header: TupleHeader {
                xmin: 3,
                xmax: 0,
                is_deleted: false,
            },
            values: vec![Value::Int32(10), Value::Varchar("hi".into())],
        };
        let record_size = TUPLE_HEADER_SIZE + 2 * VALUE_ENCODED_SIZE;
        let encoded = tuple.encode(record_size).unwrap();
        let decoded = Tuple::decode(&encoded, 2).unwrap();
        assert_eq!(tuple, decoded);
    }
}
