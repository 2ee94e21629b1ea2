use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use crate::errors::AppError;

pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DirectoryEntry {
    pub id: i64,
    pub name: String,
    pub company: Option<String>,
    pub title: Option<String>,
    pub school: Option<String>,
    pub email: Option<String>,
    pub linkedin_url: Option<String>,
}

pub fn clamp_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// `%term%` pattern with LIKE wildcards in the term escaped.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Case-insensitive match on name, company or school.
pub async fn search(
    pool: &SqlitePool,
    query: &str,
    limit: u32,
) -> Result<Vec<DirectoryEntry>, AppError> {
    let pattern = like_pattern(query);
    Ok(sqlx::query_as::<_, DirectoryEntry>(
        r#"
        SELECT id, name, company, title, school, email, linkedin_url
        FROM directory
        WHERE lower(name) LIKE ?1 ESCAPE '\'
           OR lower(coalesce(company, '')) LIKE ?1 ESCAPE '\'
           OR lower(coalesce(school, '')) LIKE ?1 ESCAPE '\'
        ORDER BY name
        LIMIT ?2
        "#,
    )
    .bind(pattern)
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn seeded_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query(
            r#"
            CREATE TABLE directory (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                company TEXT,
                title TEXT,
                school TEXT,
                email TEXT,
                linkedin_url TEXT
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();
        for (name, company, school) in [
            ("Jane Doe", Some("Evercore"), Some("University of Michigan")),
            ("John Roe", Some("Goldman Sachs"), None),
            ("Ana 100% Lee", None, Some("USC")),
        ] {
            sqlx::query("INSERT INTO directory (name, company, school) VALUES (?, ?, ?)")
                .bind(name)
                .bind(company)
                .bind(school)
                .execute(&pool)
                .await
                .unwrap();
        }
        pool
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), 20);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(500)), 100);
        assert_eq!(clamp_limit(Some(42)), 42);
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" 100%_A "), "%100\\%\\_a%");
    }

    #[tokio::test]
    async fn test_search_matches_any_column_case_insensitively() {
        let pool = seeded_pool().await;

        let by_school = search(&pool, "michigan", 20).await.unwrap();
        assert_eq!(by_school.len(), 1);
        assert_eq!(by_school[0].name, "Jane Doe");

        let by_company = search(&pool, "GOLDMAN", 20).await.unwrap();
        assert_eq!(by_company[0].name, "John Roe");

        let by_name = search(&pool, "o", 20).await.unwrap();
        let names: Vec<&str> = by_name.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Jane Doe", "John Roe"]);
    }

    #[tokio::test]
    async fn test_search_honours_limit_and_literal_percent() {
        let pool = seeded_pool().await;
        assert_eq!(search(&pool, "", 2).await.unwrap().len(), 2);

        let literal = search(&pool, "100%", 20).await.unwrap();
        assert_eq!(literal.len(), 1);
        assert_eq!(literal[0].name, "Ana 100% Lee");
    }
}
