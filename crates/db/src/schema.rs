use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

/// Statements run in order; every one is idempotent.
const SCHEMA: &[&str] = &[
    // Users
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        username VARCHAR(20) NOT NULL,
        email VARCHAR(255) NOT NULL,
        password_hash VARCHAR(255) NOT NULL,
        role VARCHAR(16) NOT NULL,
        last_login TIMESTAMP WITH TIME ZONE NULL,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        CONSTRAINT uq_users_username UNIQUE (username),
        CONSTRAINT uq_users_email UNIQUE (email),
        CONSTRAINT valid_role CHECK (role IN ('student', 'professor'))
    );
    "#,
    // Slots: one per professor and exact timestamp
    r#"
    CREATE TABLE IF NOT EXISTS slots (
        id BIGSERIAL PRIMARY KEY,
        professor_id BIGINT NOT NULL REFERENCES users(id),
        slot_time TIMESTAMP WITH TIME ZONE NOT NULL,
        is_booked BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        CONSTRAINT uq_slots_professor_time UNIQUE (professor_id, slot_time)
    );
    "#,
    // Appointments keep a snapshot of the slot time so history survives slot deletion
    r#"
    CREATE TABLE IF NOT EXISTS appointments (
        id BIGSERIAL PRIMARY KEY,
        student_id BIGINT NOT NULL REFERENCES users(id),
        professor_id BIGINT NOT NULL REFERENCES users(id),
        slot_id BIGINT NULL REFERENCES slots(id) ON DELETE SET NULL,
        slot_time TIMESTAMP WITH TIME ZONE NOT NULL,
        reason TEXT NOT NULL,
        status VARCHAR(16) NOT NULL DEFAULT 'booked',
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        CONSTRAINT valid_status CHECK (status IN ('booked', 'cancelled')),
        CONSTRAINT valid_reason CHECK (char_length(reason) >= 10)
    );
    "#,
    // At most one active appointment per slot
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS uq_appointments_active_slot
        ON appointments(slot_id) WHERE status = 'booked';
    "#,
    "CREATE INDEX IF NOT EXISTS idx_slots_professor_id ON slots(professor_id);",
    "CREATE INDEX IF NOT EXISTS idx_appointments_student_id ON appointments(student_id, status);",
    "CREATE INDEX IF NOT EXISTS idx_appointments_professor_id ON appointments(professor_id, status);",
];

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Database schema initialized successfully.");
    Ok(())
}
