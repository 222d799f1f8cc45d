use anyhow::Result;
use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::postgres::{PgConnection, PgExecutor};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A persisted analysis.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ReviewRecord {
    pub id: i32,
    pub original_review: String,
    pub sentiment: String,
    pub key_points: Option<String>,
    /// UTC, ISO-8601
    #[schema(value_type = String, example = "2024-05-01T08:30:00.123456")]
    pub timestamp: NaiveDateTime,
}

pub async fn init_db(conn: &mut PgConnection) -> Result<()> {
    // 1. Base schema
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS review_results (
            id SERIAL PRIMARY KEY,
            original_review TEXT NOT NULL,
            sentiment TEXT NOT NULL,
            key_points TEXT,
            timestamp TIMESTAMP NOT NULL DEFAULT (NOW() AT TIME ZONE 'utc')
        );
        "#,
    )
    .execute(&mut *conn)
    .await?;

    // 2. Tables created with the old bounded label column
    sqlx::query("ALTER TABLE review_results ALTER COLUMN sentiment TYPE TEXT;")
        .execute(&mut *conn)
        .await?;

    Ok(())
}

pub async fn insert_review<'e, E: PgExecutor<'e>>(
    executor: E,
    original_review: &str,
    sentiment: &str,
    key_points: &str,
) -> Result<ReviewRecord> {
    let record = sqlx::query_as::<_, ReviewRecord>(
        r#"
        INSERT INTO review_results (original_review, sentiment, key_points)
        VALUES ($1, $2, $3)
        RETURNING id, original_review, sentiment, key_points, timestamp
        "#,
    )
    .bind(original_review)
    .bind(sentiment)
    .bind(key_points)
    .fetch_one(executor)
    .await?;

    Ok(record)
}

/// All stored analyses, newest first.
pub async fn list_reviews<'e, E: PgExecutor<'e>>(executor: E) -> Result<Vec<ReviewRecord>> {
    let records = sqlx::query_as::<_, ReviewRecord>(
        r#"
        SELECT id, original_review, sentiment, key_points, timestamp
        FROM review_results
        ORDER BY id DESC
        "#,
    )
    .fetch_all(executor)
    .await?;

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Connection;

    // Runs inside a transaction that is rolled back, so existing rows are untouched.
    #[tokio::test]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_insert_and_list_newest_first() {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            return;
        };
        let mut conn = PgConnection::connect(&url).await.unwrap();
        let mut tx = conn.begin().await.unwrap();

        init_db(&mut *tx).await.unwrap();

        let long_label = "VERY_POSITIVE_WITH_A_CUSTOM_MODEL_LABEL_THAT_IS_LONGER_THAN_FIFTY";
        let first = insert_review(&mut *tx, "Baterai awet", "POSITIVE", "- Baterai awet")
            .await
            .unwrap();
        let second = insert_review(&mut *tx, "Harga mahal", long_label, "- Harga mahal\n- Kemasan rusak")
            .await
            .unwrap();

        assert!(second.id > first.id);
        assert_eq!(first.original_review, "Baterai awet");
        assert_eq!(first.sentiment, "POSITIVE");
        assert_eq!(first.key_points.as_deref(), Some("- Baterai awet"));
        assert_eq!(second.sentiment, long_label);
        assert!(second.timestamp >= first.timestamp);

        let listed = list_reviews(&mut *tx).await.unwrap();
        assert!(listed.len() >= 2);
        for (stored, inserted) in listed.iter().zip([&second, &first]) {
            assert_eq!(stored.id, inserted.id);
            assert_eq!(stored.original_review, inserted.original_review);
            assert_eq!(stored.sentiment, inserted.sentiment);
            assert_eq!(stored.key_points, inserted.key_points);
            assert_eq!(stored.timestamp, inserted.timestamp);
        }

        tx.rollback().await.unwrap();
    }
}
