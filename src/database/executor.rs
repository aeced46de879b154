//! SQL 실행기
//!
//! `select`로 시작하는 문장은 결과 표를 돌려주고, 그 외 문장은 실행 후
//! 커밋하고 성공 메시지를 돌려줍니다. 실패는 모두 `SQL Error: ...`입니다.

use std::path::PathBuf;

use rusqlite::{Connection, OpenFlags};

use crate::error::{QaError, QaResult};

use super::table::{CellValue, ResultTable};

/// 비조회 문장 성공 메시지
pub const SUCCESS_MESSAGE: &str = "Query executed successfully";

/// 실행 대상 연결
#[derive(Debug)]
pub enum SqlSource<'a> {
    /// 실행할 때마다 열고 닫는 데이터베이스 파일
    OwnedPath(PathBuf),
    /// 호출자가 소유한 연결 (CSV 세션)
    Borrowed(&'a Connection),
}

/// 실행 결과
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub table: ResultTable,
    /// 비조회 문장일 때만 Some
    pub message: Option<String>,
}

/// 앞뒤 공백 제거 후 대소문자 무시하고 `select`로 시작하는지
pub fn is_read_query(sql: &str) -> bool {
    sql.trim().to_lowercase().starts_with("select")
}

/// SQL 한 문장 실행
pub fn execute_sql(source: SqlSource<'_>, sql: &str) -> QaResult<QueryOutcome> {
    match source {
        SqlSource::OwnedPath(path) => {
            let conn = Connection::open_with_flags(
                &path,
                OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(sql_error)?;

            let outcome = run(&conn, sql);
            if let Err((_, e)) = conn.close() {
                tracing::warn!("Failed to close {:?}: {}", path, e);
            }
            outcome
        }
        SqlSource::Borrowed(conn) => run(conn, sql),
    }
}

fn run(conn: &Connection, sql: &str) -> QaResult<QueryOutcome> {
    tracing::debug!("Executing SQL: {}", sql);

    let result = if is_read_query(sql) {
        query_table(conn, sql).map(|table| QueryOutcome {
            table,
            message: None,
        })
    } else {
        execute_statement(conn, sql).map(|()| QueryOutcome {
            table: ResultTable::empty(),
            message: Some(SUCCESS_MESSAGE.to_string()),
        })
    };

    result.map_err(sql_error)
}

fn query_table(conn: &Connection, sql: &str) -> rusqlite::Result<ResultTable> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

    let mut rows = Vec::new();
    let mut cursor = stmt.query([])?;
    while let Some(row) = cursor.next()? {
        let mut values = Vec::with_capacity(columns.len());
        for i in 0..columns.len() {
            values.push(CellValue::from(row.get_ref(i)?));
        }
        rows.push(values);
    }

    Ok(ResultTable::new(columns, rows))
}

/// 결과 행이 있는 문장(PRAGMA 등)도 끝까지 소비한 뒤 커밋
fn execute_statement(conn: &Connection, sql: &str) -> rusqlite::Result<()> {
    {
        let mut stmt = conn.prepare(sql)?;
        let mut cursor = stmt.query([])?;
        while cursor.next()?.is_some() {}
    }

    if !conn.is_autocommit() {
        conn.execute_batch("COMMIT")?;
    }
    Ok(())
}

fn sql_error(e: rusqlite::Error) -> QaError {
    QaError::Sql(e.to_string())
}
