//! 스키마 추출
//!
//! 연결된 SQLite 데이터베이스의 테이블/컬럼 목록을 읽습니다.

use rusqlite::Connection;
use serde::Serialize;

use crate::error::{QaError, QaResult};

/// 테이블 하나의 스키마 (컬럼은 선언 순서)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<String>,
}

/// 테이블 이름 → 컬럼 목록 (sqlite_master 순서 유지)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaMap {
    tables: Vec<TableSchema>,
}

impl SchemaMap {
    pub fn new(tables: Vec<TableSchema>) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &[TableSchema] {
        &self.tables
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// 번역 대상 테이블 (첫 번째 테이블)
    pub fn primary(&self) -> Option<&TableSchema> {
        self.tables.first()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// 지정한 테이블만 남긴 스키마
    pub fn restrict(&self, name: &str) -> QaResult<SchemaMap> {
        let table = self.get(name).ok_or_else(|| {
            QaError::Schema(format!(
                "Unknown table '{}' (available: {:?})",
                name,
                self.table_names()
            ))
        })?;
        Ok(SchemaMap::new(vec![table.clone()]))
    }
}

/// 연결에서 스키마 추출
pub fn extract_schema(conn: &Connection) -> QaResult<SchemaMap> {
    read_schema(conn).map_err(|e| QaError::Schema(e.to_string()))
}

fn read_schema(conn: &Connection) -> rusqlite::Result<SchemaMap> {
    let names: Vec<String> = {
        let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='table'")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect::<rusqlite::Result<_>>()?
    };

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(&name)))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        tracing::debug!("Table {}: {} column(s)", name, columns.len());
        tables.push(TableSchema { name, columns });
    }

    Ok(SchemaMap::new(tables))
}

// ============================================================================
// Identifier Helpers
// ============================================================================

/// 단순 식별자 여부 (`[A-Za-z_][A-Za-z0-9_]*`)
pub fn is_plain_ident(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// 항상 큰따옴표로 감싼 식별자
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// 필요할 때만 큰따옴표로 감싼 식별자
pub fn sql_ident(name: &str) -> String {
    if is_plain_ident(name) {
        name.to_string()
    } else {
        quote_ident(name)
    }
}
