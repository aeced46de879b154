//! Database 모듈 - 자연어 SQL 질의 파이프라인
//!
//! - Source: CSV → 메모리 `data` 테이블, SQLite 파일은 경로 보관
//! - Schema: 테이블/컬럼 목록 추출
//! - Translator: 키워드 + 퍼지 컬럼 매칭 기반 SQL 생성
//! - Executor: SELECT는 결과 표, 그 외는 커밋 후 성공 메시지

mod executor;
mod fuzzy;
mod schema;
mod source;
mod table;
mod translator;

// Re-exports
pub use executor::{execute_sql, is_read_query, QueryOutcome, SqlSource, SUCCESS_MESSAGE};
pub use fuzzy::{closest_column, similarity, MATCH_CUTOFF};
pub use schema::{extract_schema, quote_ident, sql_ident, SchemaMap, TableSchema};
pub use source::{load_csv, DataSource, SourceKind, CSV_TABLE_NAME, PREVIEW_ROWS};
pub use table::{CellValue, ResultTable};
pub use translator::{translate, translate_for_table, NO_TABLE_SQL, ROW_LIMIT};

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_csv_count_end_to_end() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("people.csv");
        std::fs::write(&path, "name,age\nAlice,30\nBob,22\nCara,41\n").unwrap();

        let source = DataSource::open(&path).unwrap();
        let sql = translate("count", source.schema());
        assert_eq!(sql, "SELECT COUNT(*) FROM data;");

        let outcome = execute_sql(source.sql_source(), &sql).unwrap();
        assert_eq!(outcome.table.rows, vec![vec![CellValue::Integer(3)]]);
    }

    #[test]
    fn test_csv_filter_end_to_end() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("people.csv");
        std::fs::write(&path, "name,age\nAlice,30\nBob,22\nCara,41\n").unwrap();

        let source = DataSource::open(&path).unwrap();
        let sql = translate("names where age > 25", source.schema());
        assert_eq!(sql, "SELECT name FROM data WHERE age > 25 LIMIT 50;");

        let outcome = execute_sql(source.sql_source(), &sql).unwrap();
        assert_eq!(
            outcome.table.rows,
            vec![
                vec![CellValue::Text("Alice".into())],
                vec![CellValue::Text("Cara".into())],
            ]
        );
    }

    #[test]
    fn test_schema_question_end_to_end() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("people.csv");
        std::fs::write(&path, "name,age\nAlice,30\n").unwrap();

        let source = DataSource::open(&path).unwrap();
        let sql = translate("show the schema", source.schema());
        let outcome = execute_sql(source.sql_source(), &sql).unwrap();
        assert!(outcome.table.is_empty());
        assert_eq!(outcome.message.as_deref(), Some(SUCCESS_MESSAGE));
    }
}
