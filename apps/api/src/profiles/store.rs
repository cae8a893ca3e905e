use anyhow::Result;
use sqlx::types::Json;
use sqlx::{Connection, PgConnection, PgPool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::customer::{CustomerProfileRow, NewCustomerProfile};

/// Result of a full profile replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceOutcome {
    pub inserted: usize,
    pub failed: usize,
}

/// Replaces the whole profile collection with `profiles`.
///
/// The delete and all inserts share one transaction, so a crash never leaves
/// the collection empty. Each insert runs in its own savepoint: a document that
/// fails to insert is logged and skipped, and the rest of the batch continues.
pub async fn replace_profiles(
    pool: &PgPool,
    profiles: &[NewCustomerProfile],
) -> Result<ReplaceOutcome> {
    let mut tx = pool.begin().await?;

    let deleted = sqlx::query("DELETE FROM customer_profiles")
        .execute(&mut *tx)
        .await?
        .rows_affected();
    info!("Cleared {deleted} existing customer profiles");

    let mut outcome = ReplaceOutcome {
        inserted: 0,
        failed: 0,
    };

    for (position, profile) in profiles.iter().enumerate() {
        let mut savepoint = tx.begin().await?;
        match insert_profile(&mut savepoint, profile, position as i32).await {
            Ok(()) => {
                savepoint.commit().await?;
                outcome.inserted += 1;
            }
            Err(e) => {
                warn!("Skipping profile at position {position}: {e}");
                savepoint.rollback().await?;
                outcome.failed += 1;
            }
        }
    }

    tx.commit().await?;
    info!(
        "Inserted {} customer profiles ({} failed)",
        outcome.inserted, outcome.failed
    );
    Ok(outcome)
}

async fn insert_profile(
    conn: &mut PgConnection,
    profile: &NewCustomerProfile,
    position: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO customer_profiles
            (id, age_range, spending_level, purchase_categories,
             interaction_frequency, cultural_dna, import_position)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&profile.age_range)
    .bind(&profile.spending_level)
    .bind(&profile.purchase_categories)
    .bind(&profile.interaction_frequency)
    .bind(profile.cultural_dna.as_ref().map(Json))
    .bind(position)
    .execute(conn)
    .await?;
    Ok(())
}

/// All profiles in import order (oldest import first, then row position).
pub async fn list_profiles(pool: &PgPool) -> Result<Vec<CustomerProfileRow>> {
    Ok(sqlx::query_as::<_, CustomerProfileRow>(
        "SELECT * FROM customer_profiles ORDER BY created_at, import_position",
    )
    .fetch_all(pool)
    .await?)
}

/// Records user feedback on a profile's accuracy. Returns `None` if no such profile.
pub async fn set_feedback(
    pool: &PgPool,
    id: Uuid,
    feedback: i16,
) -> Result<Option<CustomerProfileRow>> {
    Ok(sqlx::query_as::<_, CustomerProfileRow>(
        "UPDATE customer_profiles SET accuracy_feedback = $1 WHERE id = $2 RETURNING *",
    )
    .bind(feedback)
    .bind(id)
    .fetch_optional(pool)
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_profile(age: &str, categories: &[&str]) -> NewCustomerProfile {
        NewCustomerProfile {
            age_range: Some(age.to_string()),
            spending_level: Some("Medium".to_string()),
            purchase_categories: categories.iter().map(|s| s.to_string()).collect(),
            interaction_frequency: None,
            cultural_dna: None,
        }
    }

    fn ages(rows: &[CustomerProfileRow]) -> Vec<&str> {
        rows.iter().filter_map(|r| r.age_range.as_deref()).collect()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_replace_discards_previous_import(pool: PgPool) {
        let first = vec![new_profile("18-24", &["books"]), new_profile("25-34", &["wine"])];
        replace_profiles(&pool, &first).await.unwrap();

        let second = vec![
            new_profile("35-44", &["vinyl"]),
            new_profile("45-54", &["film"]),
            new_profile("55-64", &["travel"]),
        ];
        let outcome = replace_profiles(&pool, &second).await.unwrap();
        assert_eq!(outcome, ReplaceOutcome { inserted: 3, failed: 0 });

        let rows = list_profiles(&pool).await.unwrap();
        assert_eq!(ages(&rows), vec!["35-44", "45-54", "55-64"]);
        assert_eq!(rows[0].purchase_categories, vec!["vinyl".to_string()]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_failing_insert_is_skipped(pool: PgPool) {
        // Postgres text columns reject NUL bytes
        let profiles = vec![
            new_profile("18-24", &["books"]),
            new_profile("bad\0age", &["wine"]),
            new_profile("35-44", &["vinyl"]),
        ];
        let outcome = replace_profiles(&pool, &profiles).await.unwrap();
        assert_eq!(outcome, ReplaceOutcome { inserted: 2, failed: 1 });

        let rows = list_profiles(&pool).await.unwrap();
        assert_eq!(ages(&rows), vec!["18-24", "35-44"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_feedback_on_missing_profile_is_none(pool: PgPool) {
        let row = set_feedback(&pool, Uuid::new_v4(), 1).await.unwrap();
        assert!(row.is_none());
    }
}
