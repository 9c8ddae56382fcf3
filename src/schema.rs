//! Column and table schema definitions, and their fixed-width on-disk
//! encoding inside the metadata page's inline schema array.

use crate::constants::{
    COLUMN_DEF_SIZE, MAX_COLUMNS, MAX_COLUMN_NAME, MAX_TABLE_NAME, TABLE_SCHEMA_SIZE,
};
use crate::error::{DbError, DbResult};
use crate::value::ColumnType;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
    pub is_primary_key: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: ColumnType, is_primary_key: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            is_primary_key,
        }
    }

    fn encode(&self) -> DbResult<[u8; COLUMN_DEF_SIZE]> {
        let mut buf = [0u8; COLUMN_DEF_SIZE];
        let name_bytes = self.name.as_bytes();
        if name_bytes.len() > MAX_COLUMN_NAME {
            return Err(DbError::Other(format!(
                "column name '{}' exceeds {MAX_COLUMN_NAME} bytes",
                self.name
            )));
        }
        buf[..name_bytes.len()].copy_from_slice(name_bytes);
        buf[MAX_COLUMN_NAME] = self.ty.tag();
        buf[MAX_COLUMN_NAME + 1..MAX_COLUMN_NAME + 3]
            .copy_from_slice(&self.ty.declared_size().to_le_bytes());
        buf[MAX_COLUMN_NAME + 3] = self.is_primary_key as u8;
        Ok(buf)
    }

    fn decode(buf: &[u8]) -> DbResult<Self> {
        let name_end = buf[..MAX_COLUMN_NAME]
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(MAX_COLUMN_NAME);
        let name = std::str::from_utf8(&buf[..name_end])
            .map_err(|_| DbError::Other("column name is not valid utf-8".into()))?
            .to_string();
        let tag = buf[MAX_COLUMN_NAME];
        let size = u16::from_le_bytes(
            buf[MAX_COLUMN_NAME + 1..MAX_COLUMN_NAME + 3]
                .try_into()
                .unwrap(),
        );
        let ty = ColumnType::from_tag_and_size(tag, size)?;
        let is_primary_key = buf[MAX_COLUMN_NAME + 3] != 0;
        Ok(Column {
            name,
            ty,
            is_primary_key,
        })
    }
}

/// A table's schema plus the root page of its primary-key B+-tree, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<Column>,
    /// 0 (NULL_PAGE_ID) until the table is created and a root is allocated.
    pub root_page_id: u64,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> DbResult<Self> {
        if columns.len() > MAX_COLUMNS {
            return Err(DbError::SchemaTooLarge);
        }
        let pk_count = columns.iter().filter(|c| c.is_primary_key).count();
        if pk_count > 1 {
            return Err(DbError::Other(
                "at most one primary-key column per table".into(),
            ));
        }
        Ok(Self {
            name: name.into(),
            columns,
            root_page_id: 0,
        })
    }

    pub fn primary_key_index(&self) -> Option<usize> {
        self.columns.iter().position(|c| c.is_primary_key)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Fixed on-disk size of one tuple record for this schema:
    /// header + one fixed-width value slot per column.
    pub fn tuple_record_size(&self) -> usize {
        crate::constants::TUPLE_HEADER_SIZE
            + self.columns.len() * crate::constants::VALUE_ENCODED_SIZE
    }

    pub(crate) fn encode(&self) -> DbResult<[u8; TABLE_SCHEMA_SIZE]> {
        let mut buf = [0u8; TABLE_SCHEMA_SIZE];
        let name_bytes = self.name.as_bytes();
        if name_bytes.len() > MAX_TABLE_NAME {
            return Err(DbError::Other(format!(
                "table name '{}' exceeds {MAX_TABLE_NAME} bytes",
                self.name
            )));
        }
        if self.columns.len() > MAX_COLUMNS {
            return Err(DbError::SchemaTooLarge);
        }
        buf[..name_bytes.len()].copy_from_slice(name_bytes);
        buf[MAX_TABLE_NAME] = self.columns.len() as u8;

        let cols_off = MAX_TABLE_NAME + 1;
        for (i, col) in self.columns.iter().enumerate() {
            let encoded = col.encode()?;
            let off = cols_off + i * COLUMN_DEF_SIZE;
            buf[off..off + COLUMN_DEF_SIZE].copy_from_slice(&encoded);
        }

        let root_off = cols_off + MAX_COLUMNS * COLUMN_DEF_SIZE;
        buf[root_off..root_off + 8].copy_from_slice(&self.root_page_id.to_le_bytes());
        Ok(buf)
    }

    pub(crate) fn decode(buf: &[u8]) -> DbResult<Self> {
        let name_end = buf[..MAX_TABLE_NAME]
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(MAX_TABLE_NAME);
        let name = std::str::from_utf8(&buf[..name_end])
            .map_err(|_| DbError::Other("table name is not valid utf-8".into()))?
            .to_string();
        let col_count = buf[MAX_TABLE_NAME] as usize;
        if col_count > MAX_COLUMNS {
            return Err(DbError::SchemaTooLarge);
        }

        let cols_off = MAX_TABLE_NAME + 1;
        let mut columns = Vec::with_capacity(col_count);
        for i in 0..col_count {
            let off = cols_off + i * COLUMN_DEF_SIZE;
            columns.push(Column::decode(&buf[off..off + COLUMN_DEF_SIZE])?);
        }

        let root_off = cols_off + MAX_COLUMNS * COLUMN_DEF_SIZE;
        let root_page_id = u64::from_le_bytes(buf[root_off..root_off + 8].try_into().unwrap());

        Ok(TableSchema {
            name,
            columns,
            root_page_id,
        })
    }
}
