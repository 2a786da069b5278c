use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::{Pool, Postgres};

use crate::models::DbSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteSlotOutcome {
    Deleted,
    Missing,
    Booked,
}

/// Returns `None` when the professor already has a slot at `slot_time`.
pub async fn create_slot(
    pool: &Pool<Postgres>,
    professor_id: i64,
    slot_time: DateTime<Utc>,
) -> Result<Option<DbSlot>> {
    let slot = sqlx::query_as::<_, DbSlot>(
        r#"
        INSERT INTO slots (professor_id, slot_time, is_booked, created_at)
        VALUES ($1, $2, FALSE, $3)
        ON CONFLICT ON CONSTRAINT uq_slots_professor_time DO NOTHING
        RETURNING id, professor_id, slot_time, is_booked, created_at
        "#,
    )
    .bind(professor_id)
    .bind(slot_time)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?;

    Ok(slot)
}

pub async fn get_slot(
    pool: &Pool<Postgres>,
    professor_id: i64,
    slot_id: i64,
) -> Result<Option<DbSlot>> {
    let slot = sqlx::query_as::<_, DbSlot>(
        r#"
        SELECT id, professor_id, slot_time, is_booked, created_at
        FROM slots
        WHERE id = $1 AND professor_id = $2
        "#,
    )
    .bind(slot_id)
    .bind(professor_id)
    .fetch_optional(pool)
    .await?;

    Ok(slot)
}

pub async fn get_slots_by_professor(pool: &Pool<Postgres>, professor_id: i64) -> Result<Vec<DbSlot>> {
    let slots = sqlx::query_as::<_, DbSlot>(
        r#"
        SELECT id, professor_id, slot_time, is_booked, created_at
        FROM slots
        WHERE professor_id = $1
        ORDER BY slot_time ASC, id ASC
        "#,
    )
    .bind(professor_id)
    .fetch_all(pool)
    .await?;

    Ok(slots)
}

/// Returns the number of rows touched (0 when the slot does not exist).
pub async fn set_booked(pool: &Pool<Postgres>, slot_id: i64, is_booked: bool) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE slots
        SET is_booked = $2
        WHERE id = $1
        "#,
    )
    .bind(slot_id)
    .bind(is_booked)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn delete_slot(
    pool: &Pool<Postgres>,
    professor_id: i64,
    slot_id: i64,
) -> Result<DeleteSlotOutcome> {
    let mut tx = pool.begin().await?;

    let is_booked: Option<bool> = sqlx::query_scalar(
        r#"
        SELECT is_booked
        FROM slots
        WHERE id = $1 AND professor_id = $2
        FOR UPDATE
        "#,
    )
    .bind(slot_id)
    .bind(professor_id)
    .fetch_optional(&mut *tx)
    .await?;

    let outcome = match is_booked {
        None => DeleteSlotOutcome::Missing,
        Some(true) => DeleteSlotOutcome::Booked,
        Some(false) => {
            sqlx::query("DELETE FROM slots WHERE id = $1")
                .bind(slot_id)
                .execute(&mut *tx)
                .await?;
            DeleteSlotOutcome::Deleted
        }
    };

    tx.commit().await?;
    Ok(outcome)
}
