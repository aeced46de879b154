//! 데이터 소스 로딩
//!
//! - CSV: 메모리 SQLite의 `data` 테이블로 적재 (컬럼 타입 추론)
//! - SQLite 파일(.db/.sqlite/.sqlite3): 경로만 보관하고 질의마다 다시 엶

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OpenFlags};

use crate::error::{QaError, QaResult};

use super::executor::{execute_sql, SqlSource};
use super::schema::{extract_schema, quote_ident, SchemaMap};
use super::table::ResultTable;

/// CSV가 적재되는 테이블 이름
pub const CSV_TABLE_NAME: &str = "data";

/// 업로드 직후 보여줄 미리보기 행 수
pub const PREVIEW_ROWS: usize = 3;

/// 결측값으로 취급하는 셀 (앞뒤 공백 제거 후 비교)
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// ============================================================================
// Source Kind
// ============================================================================

/// 업로드 종류 (확장자 기준)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// .csv
    Tabular,
    /// .db / .sqlite / .sqlite3
    Relational,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> QaResult<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(SourceKind::Tabular),
            "db" | "sqlite" | "sqlite3" => Ok(SourceKind::Relational),
            "" => Err(QaError::UnsupportedFileType(String::new())),
            other => Err(QaError::UnsupportedFileType(format!(".{}", other))),
        }
    }
}

// ============================================================================
// Data Source
// ============================================================================

/// 질의 가능한 데이터 소스
#[derive(Debug)]
pub enum DataSource {
    /// 세션 동안 유지되는 메모리 연결
    Tabular {
        conn: Connection,
        schema: SchemaMap,
        preview: ResultTable,
    },
    /// 디스크의 SQLite 파일
    Relational { path: PathBuf, schema: SchemaMap },
}

impl DataSource {
    /// 확장자에 따라 CSV 또는 SQLite 파일을 엶
    pub fn open(path: &Path) -> QaResult<Self> {
        match SourceKind::from_path(path)? {
            SourceKind::Tabular => load_csv(path),
            SourceKind::Relational => open_sqlite(path),
        }
    }

    pub fn schema(&self) -> &SchemaMap {
        match self {
            DataSource::Tabular { schema, .. } | DataSource::Relational { schema, .. } => schema,
        }
    }

    /// CSV 미리보기 (SQLite 파일은 없음)
    pub fn preview(&self) -> Option<&ResultTable> {
        match self {
            DataSource::Tabular { preview, .. } => Some(preview),
            DataSource::Relational { .. } => None,
        }
    }

    /// 번역 대상을 한 테이블로 제한
    pub fn select_table(&mut self, name: &str) -> QaResult<()> {
        let restricted = self.schema().restrict(name)?;
        match self {
            DataSource::Tabular { schema, .. } | DataSource::Relational { schema, .. } => {
                *schema = restricted;
            }
        }
        Ok(())
    }

    /// 실행기에 넘길 연결 정보
    pub fn sql_source(&self) -> SqlSource<'_> {
        match self {
            DataSource::Tabular { conn, .. } => SqlSource::Borrowed(conn),
            DataSource::Relational { path, .. } => SqlSource::OwnedPath(path.clone()),
        }
    }
}

// ============================================================================
// SQLite File
// ============================================================================

fn open_sqlite(path: &Path) -> QaResult<DataSource> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|e| QaError::Schema(format!("Failed to open {}: {}", path.display(), e)))?;
    let schema = extract_schema(&conn)?;

    tracing::info!(
        "Opened SQLite database {:?} ({} table(s))",
        path,
        schema.tables().len()
    );

    Ok(DataSource::Relational {
        path: path.to_path_buf(),
        schema,
    })
}

// ============================================================================
// CSV
// ============================================================================

/// 추론된 컬럼 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Affinity {
    Integer,
    Real,
    Text,
}

impl Affinity {
    fn sql(self) -> &'static str {
        match self {
            Affinity::Integer => "INTEGER",
            Affinity::Real => "REAL",
            Affinity::Text => "TEXT",
        }
    }

    fn convert(self, raw: &str) -> Value {
        let trimmed = raw.trim();
        match self {
            Affinity::Integer => trimmed
                .parse::<i64>()
                .map(Value::Integer)
                .unwrap_or_else(|_| Value::Text(raw.to_string())),
            Affinity::Real => trimmed
                .parse::<f64>()
                .map(Value::Real)
                .unwrap_or_else(|_| Value::Text(raw.to_string())),
            Affinity::Text => Value::Text(raw.to_string()),
        }
    }
}

type CsvRows = Vec<Vec<Option<String>>>;

/// CSV를 메모리 데이터베이스의 `data` 테이블로 적재
pub fn load_csv(path: &Path) -> QaResult<DataSource> {
    let (headers, rows) = read_csv(path).map_err(|e| QaError::Schema(QaError::chain(&e)))?;
    let columns = dedupe_headers(&headers);
    let affinities = infer_affinities(&rows, columns.len());

    let mut conn = Connection::open_in_memory().map_err(|e| QaError::Sql(e.to_string()))?;
    fill_table(&mut conn, &columns, &affinities, &rows)
        .map_err(|e| QaError::Schema(format!("Failed to load CSV into SQLite: {}", e)))?;

    let schema = extract_schema(&conn)?;
    let preview = execute_sql(
        SqlSource::Borrowed(&conn),
        &format!("SELECT * FROM {} LIMIT {}", CSV_TABLE_NAME, PREVIEW_ROWS),
    )?
    .table;

    tracing::info!(
        "Loaded {:?} into table '{}' ({} rows, {} columns)",
        path,
        CSV_TABLE_NAME,
        rows.len(),
        columns.len()
    );

    Ok(DataSource::Tabular {
        conn,
        schema,
        preview,
    })
}

fn read_csv(path: &Path) -> Result<(Vec<String>, CsvRows)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(|s| s.to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        anyhow::bail!("CSV file has no header row");
    }

    let mut rows = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result.context("Failed to read CSV row")?;
        if record.len() > headers.len() {
            anyhow::bail!(
                "Row {} has {} fields, expected at most {}",
                line + 2,
                record.len(),
                headers.len()
            );
        }
        rows.push(
            record
                .iter()
                .map(|cell| (!is_missing(cell)).then(|| cell.to_string()))
                .collect(),
        );
    }

    Ok((headers, rows))
}

fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell.trim())
}

/// 빈 헤더는 `Unnamed: i`, 중복 헤더는 `.1`, `.2` 접미사
fn dedupe_headers(headers: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(headers.len());

    for (i, header) in headers.iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {}", i)
        } else {
            header.clone()
        };

        let mut name = base.clone();
        let mut suffix = 1;
        while seen.iter().any(|s| s.eq_ignore_ascii_case(&name)) {
            name = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        seen.push(name);
    }

    seen
}

/// 결측이 아닌 모든 값이 정수면 INTEGER, 실수면 REAL, 그 외 TEXT
fn infer_affinities(rows: &CsvRows, width: usize) -> Vec<Affinity> {
    (0..width)
        .map(|col| {
            let mut affinity = None;
            for raw in rows.iter().filter_map(|r| r.get(col).and_then(|v| v.as_deref())) {
                let value = raw.trim();
                let candidate = if value.parse::<i64>().is_ok() {
                    Affinity::Integer
                } else if value.parse::<f64>().is_ok() {
                    Affinity::Real
                } else {
                    return Affinity::Text;
                };
                affinity = Some(match (affinity, candidate) {
                    (Some(Affinity::Real), _) | (_, Affinity::Real) => Affinity::Real,
                    _ => Affinity::Integer,
                });
            }
            affinity.unwrap_or(Affinity::Text)
        })
        .collect()
}

fn fill_table(
    conn: &mut Connection,
    columns: &[String],
    affinities: &[Affinity],
    rows: &CsvRows,
) -> rusqlite::Result<()> {
    let table = quote_ident(CSV_TABLE_NAME);
    let column_defs = columns
        .iter()
        .zip(affinities)
        .map(|(name, affinity)| format!("{} {}", quote_ident(name), affinity.sql()))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");

    let tx = conn.transaction()?;
    tx.execute(&format!("CREATE TABLE {} ({})", table, column_defs), [])?;
    {
        let mut stmt = tx.prepare(&format!("INSERT INTO {} VALUES ({})", table, placeholders))?;
        for row in rows {
            let values: Vec<Value> = affinities
                .iter()
                .enumerate()
                .map(|(i, affinity)| match row.get(i).and_then(|v| v.as_deref()) {
                    Some(raw) => affinity.convert(raw),
                    None => Value::Null,
                })
                .collect();
            stmt.execute(params_from_iter(values.iter()))?;
        }
    }
    tx.commit()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::table::CellValue;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_source_kind_routing() {
        assert_eq!(
            SourceKind::from_path(Path::new("a.CSV")).unwrap(),
            SourceKind::Tabular
        );
        for name in ["a.db", "a.sqlite", "a.sqlite3"] {
            assert_eq!(
                SourceKind::from_path(Path::new(name)).unwrap(),
                SourceKind::Relational
            );
        }
        let err = SourceKind::from_path(Path::new("a.xlsx")).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file type: .xlsx");
    }

    #[test]
    fn test_load_csv_schema_and_preview() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "people.csv",
            "name,age,score\nAlice,30,1.5\nBob,25,2\nCara,41,\nDan,19,3.25\n",
        );

        let source = DataSource::open(&path).unwrap();
        let schema = source.schema();
        assert_eq!(schema.table_names(), vec!["data"]);
        assert_eq!(schema.primary().unwrap().columns, vec!["name", "age", "score"]);

        let preview = source.preview().unwrap();
        assert_eq!(preview.row_count(), 3);
        assert_eq!(preview.columns, vec!["name", "age", "score"]);
        assert_eq!(preview.rows[0][1], CellValue::Integer(30));
        assert_eq!(preview.rows[1][2], CellValue::Real(2.0));
        assert_eq!(preview.rows[2][2], CellValue::Null);
    }

    #[test]
    fn test_inferred_types_allow_numeric_comparison() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "t.csv", "age\n9\n10\n100\n");
        let source = DataSource::open(&path).unwrap();

        let outcome =
            execute_sql(source.sql_source(), "SELECT COUNT(*) FROM data WHERE age > 9").unwrap();
        assert_eq!(outcome.table.rows, vec![vec![CellValue::Integer(2)]]);
    }

    #[test]
    fn test_headers_are_deduplicated() {
        let headers: Vec<String> = ["a", "a", "", "A"].iter().map(|s| s.to_string()).collect();
        assert_eq!(dedupe_headers(&headers), vec!["a", "a.1", "Unnamed: 2", "A.1"]);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "t.csv", "a,b\n1\n2,x\n");
        let source = DataSource::open(&path).unwrap();
        let preview = source.preview().unwrap();
        assert_eq!(preview.rows[0], vec![CellValue::Integer(1), CellValue::Null]);
    }

    #[test]
    fn test_long_rows_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "t.csv", "a,b\n1,2,3\n");
        let err = DataSource::open(&path).unwrap_err();
        assert!(err.to_string().contains("expected at most 2"));
    }

    #[test]
    fn test_empty_csv_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "t.csv", "");
        let err = DataSource::open(&path).unwrap_err();
        assert!(err.to_string().contains("no header row"));
    }

    #[test]
    fn test_open_sqlite_file_and_select_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shop.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE users (id INTEGER, name TEXT);
             CREATE TABLE orders (id INTEGER, total REAL);",
        )
        .unwrap();
        drop(conn);

        let mut source = DataSource::open(&path).unwrap();
        assert!(source.preview().is_none());
        assert_eq!(source.schema().table_names(), vec!["users", "orders"]);

        source.select_table("orders").unwrap();
        assert_eq!(source.schema().table_names(), vec!["orders"]);
        assert!(source.select_table("users").is_err());
    }

    #[test]
    fn test_non_database_file_is_schema_error() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "bad.db", &"not a sqlite file ".repeat(200));
        let err = DataSource::open(&path).unwrap_err();
        assert!(matches!(err, QaError::Schema(_)));
    }
}
