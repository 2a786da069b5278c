use chrono::Utc;
use eyre::Result;
use officehours_core::models::appointment::{AppointmentStatus, NewAppointment};
use sqlx::{PgConnection, Pool, Postgres};

use super::violated_unique_constraint;
use crate::models::{DbAppointment, DbAppointmentDetail};

const APPOINTMENT_COLUMNS: &str =
    "id, student_id, professor_id, slot_id, slot_time, reason, status, created_at";

const DETAIL_SELECT: &str = r#"
    SELECT a.id,
           s.id AS student_id, s.username AS student_username, s.email AS student_email,
           p.id AS professor_id, p.username AS professor_username, p.email AS professor_email,
           a.slot_id, a.slot_time, a.reason, a.status, a.created_at
    FROM appointments a
    JOIN users s ON s.id = a.student_id
    JOIN users p ON p.id = a.professor_id
"#;

#[derive(Debug)]
pub enum BookOutcome {
    Booked(DbAppointment),
    SlotTaken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    AlreadyCancelled,
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    Updated,
    Missing,
    Rejected,
}

async fn insert_appointment(conn: &mut PgConnection, new: &NewAppointment) -> sqlx::Result<DbAppointment> {
    let sql = format!(
        r#"
        INSERT INTO appointments (student_id, professor_id, slot_id, slot_time, reason, status, created_at)
        VALUES ($1, $2, $3, $4, $5, 'booked', $6)
        RETURNING {APPOINTMENT_COLUMNS}
        "#
    );

    sqlx::query_as::<_, DbAppointment>(&sql)
        .bind(new.student_id)
        .bind(new.professor_id)
        .bind(new.slot_id)
        .bind(new.slot_time)
        .bind(&new.reason)
        .bind(Utc::now())
        .fetch_one(conn)
        .await
}

/// Plain insert; the slot flag is left alone.
pub async fn create_appointment(pool: &Pool<Postgres>, new: &NewAppointment) -> Result<DbAppointment> {
    let mut conn = pool.acquire().await?;
    let appointment = insert_appointment(&mut *conn, new).await?;

    Ok(appointment)
}

/// Flips the slot to booked and inserts the appointment in one transaction.
///
/// Only one of any number of concurrent callers sees `Booked` for a given slot.
pub async fn book_slot(pool: &Pool<Postgres>, new: &NewAppointment) -> Result<BookOutcome> {
    let mut tx = pool.begin().await?;

    let claimed = sqlx::query(
        r#"
        UPDATE slots
        SET is_booked = TRUE
        WHERE id = $1 AND professor_id = $2 AND is_booked = FALSE
        "#,
    )
    .bind(new.slot_id)
    .bind(new.professor_id)
    .execute(&mut *tx)
    .await?;

    if claimed.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(BookOutcome::SlotTaken);
    }

    match insert_appointment(&mut *tx, new).await {
        Ok(appointment) => {
            tx.commit().await?;
            Ok(BookOutcome::Booked(appointment))
        }
        Err(err) if violated_unique_constraint(&err).is_some() => {
            tx.rollback().await?;
            Ok(BookOutcome::SlotTaken)
        }
        Err(err) => Err(err.into()),
    }
}

/// Cancels a booked appointment and frees its slot in one transaction.
pub async fn cancel_appointment(pool: &Pool<Postgres>, appointment_id: i64) -> Result<CancelOutcome> {
    let mut tx = pool.begin().await?;

    let released: Option<Option<i64>> = sqlx::query_scalar(
        r#"
        UPDATE appointments
        SET status = 'cancelled'
        WHERE id = $1 AND status = 'booked'
        RETURNING slot_id
        "#,
    )
    .bind(appointment_id)
    .fetch_optional(&mut *tx)
    .await?;

    let outcome = match released {
        Some(slot_id) => {
            if let Some(slot_id) = slot_id {
                sqlx::query("UPDATE slots SET is_booked = FALSE WHERE id = $1")
                    .bind(slot_id)
                    .execute(&mut *tx)
                    .await?;
            }
            CancelOutcome::Cancelled
        }
        None => {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM appointments WHERE id = $1)")
                    .bind(appointment_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if exists {
                CancelOutcome::AlreadyCancelled
            } else {
                CancelOutcome::Missing
            }
        }
    };

    tx.commit().await?;
    Ok(outcome)
}

/// Status writes only ever move booked to cancelled.
pub async fn set_status(
    pool: &Pool<Postgres>,
    appointment_id: i64,
    status: AppointmentStatus,
) -> Result<StatusOutcome> {
    let updated: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE appointments
        SET status = $2
        WHERE id = $1 AND (status = $2 OR status = 'booked')
        RETURNING id
        "#,
    )
    .bind(appointment_id)
    .bind(status.as_str())
    .fetch_optional(pool)
    .await?;

    if updated.is_some() {
        return Ok(StatusOutcome::Updated);
    }

    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM appointments WHERE id = $1)")
        .bind(appointment_id)
        .fetch_one(pool)
        .await?;

    Ok(if exists {
        StatusOutcome::Rejected
    } else {
        StatusOutcome::Missing
    })
}

pub async fn get_appointment_detail(
    pool: &Pool<Postgres>,
    appointment_id: i64,
) -> Result<Option<DbAppointmentDetail>> {
    let sql = format!("{DETAIL_SELECT} WHERE a.id = $1");

    let detail = sqlx::query_as::<_, DbAppointmentDetail>(&sql)
        .bind(appointment_id)
        .fetch_optional(pool)
        .await?;

    Ok(detail)
}

pub async fn get_appointments_for_student(
    pool: &Pool<Postgres>,
    student_id: i64,
    status: AppointmentStatus,
) -> Result<Vec<DbAppointmentDetail>> {
    let sql = format!("{DETAIL_SELECT} WHERE a.student_id = $1 AND a.status = $2 ORDER BY a.id ASC");

    let details = sqlx::query_as::<_, DbAppointmentDetail>(&sql)
        .bind(student_id)
        .bind(status.as_str())
        .fetch_all(pool)
        .await?;

    Ok(details)
}

pub async fn get_appointments_for_professor(
    pool: &Pool<Postgres>,
    professor_id: i64,
    status: AppointmentStatus,
) -> Result<Vec<DbAppointmentDetail>> {
    let sql = format!("{DETAIL_SELECT} WHERE a.professor_id = $1 AND a.status = $2 ORDER BY a.id ASC");

    let details = sqlx::query_as::<_, DbAppointmentDetail>(&sql)
        .bind(professor_id)
        .bind(status.as_str())
        .fetch_all(pool)
        .await?;

    Ok(details)
}
