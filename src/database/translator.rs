//! 자연어 → SQL 휴리스틱 번역
//!
//! 언어 모델 없이 키워드와 정규식만으로 단일 테이블 SELECT를 만듭니다.
//! 규칙은 위에서부터 순서대로 적용됩니다.
//!
//! 1. "count" / "how many" 포함 → `SELECT COUNT(*) FROM t;`
//! 2. "schema" / "columns" 포함 → `PRAGMA table_info('t');`
//! 3. 공백 단위 토큰 중 처음으로 컬럼과 비슷한 것 → 선택 컬럼 (없으면 `*`)
//! 4. `col > 25` 형태 → WHERE 조건 (AND)
//! 5. `SELECT c FROM t[ WHERE ...] LIMIT 50;`
//!
//! 같은 입력에는 항상 같은 문장을 돌려줍니다.

use std::sync::OnceLock;

use regex::Regex;

use super::fuzzy::closest_column;
use super::schema::{sql_ident, SchemaMap, TableSchema};

/// 결과 행 상한
pub const ROW_LIMIT: usize = 50;

/// 테이블이 하나도 없을 때의 문장
pub const NO_TABLE_SQL: &str = "SELECT 'No table found' as error;";

fn comparison() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\w+)\s*(>=|<=|>|<|=)\s*(\d+)").expect("comparison regex"))
}

/// 질문을 SQL로 번역 (첫 번째 테이블 대상)
pub fn translate(question: &str, schema: &SchemaMap) -> String {
    match schema.primary() {
        Some(table) => translate_for_table(question, table),
        None => {
            tracing::debug!("No table available for translation");
            NO_TABLE_SQL.to_string()
        }
    }
}

/// 지정한 테이블에 대해 번역
pub fn translate_for_table(question: &str, table: &TableSchema) -> String {
    let query = question.to_lowercase();
    let table_name = sql_ident(&table.name);

    if query.contains("count") || query.contains("how many") {
        return format!("SELECT COUNT(*) FROM {};", table_name);
    }

    if query.contains("schema") || query.contains("columns") {
        return format!("PRAGMA table_info('{}');", table.name.replace('\'', "''"));
    }

    let selected = query
        .split_whitespace()
        .find_map(|token| closest_column(token, &table.columns))
        .map(sql_ident);
    if selected.is_none() {
        tracing::debug!("No column matched, selecting all columns");
    }
    let selected = selected.unwrap_or_else(|| "*".to_string());

    let conditions = extract_conditions(&query, &table.columns);

    let mut sql = format!("SELECT {} FROM {}", selected, table_name);
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(&format!(" LIMIT {};", ROW_LIMIT));
    sql
}

/// 질문에 나타난 순서대로 WHERE 조건 수집
///
/// 컬럼과 매칭되지 않는 조건은 버립니다.
fn extract_conditions(query: &str, columns: &[String]) -> Vec<String> {
    comparison()
        .captures_iter(query)
        .filter_map(|caps| {
            let (word, op, value) = (caps.get(1)?, caps.get(2)?, caps.get(3)?);
            match closest_column(word.as_str(), columns) {
                Some(column) => Some(format!(
                    "{} {} {}",
                    sql_ident(column),
                    op.as_str(),
                    value.as_str()
                )),
                None => {
                    tracing::debug!("Dropping condition on unknown column '{}'", word.as_str());
                    None
                }
            }
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
