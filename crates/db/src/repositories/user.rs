use chrono::Utc;
use eyre::Result;
use officehours_core::models::user::NewUser;
use sqlx::{Pool, Postgres};

use super::violated_unique_constraint;
use crate::models::DbUser;

const USER_COLUMNS: &str = "id, username, email, password_hash, role, last_login, created_at";

#[derive(Debug)]
pub enum CreateUserOutcome {
    Created(DbUser),
    UsernameTaken,
    EmailTaken,
}

pub async fn create_user(pool: &Pool<Postgres>, new: &NewUser) -> Result<CreateUserOutcome> {
    let sql = format!(
        r#"
        INSERT INTO users (username, email, password_hash, role, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {USER_COLUMNS}
        "#
    );

    let inserted = sqlx::query_as::<_, DbUser>(&sql)
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.role.as_str())
        .bind(Utc::now())
        .fetch_one(pool)
        .await;

    match inserted {
        Ok(user) => Ok(CreateUserOutcome::Created(user)),
        Err(err) => match violated_unique_constraint(&err).as_deref() {
            Some("uq_users_email") => Ok(CreateUserOutcome::EmailTaken),
            Some(_) => Ok(CreateUserOutcome::UsernameTaken),
            None => Err(err.into()),
        },
    }
}

pub async fn get_user_by_id(pool: &Pool<Postgres>, id: i64) -> Result<Option<DbUser>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

    let user = sqlx::query_as::<_, DbUser>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn get_user_by_username(pool: &Pool<Postgres>, username: &str) -> Result<Option<DbUser>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");

    let user = sqlx::query_as::<_, DbUser>(&sql)
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn get_user_by_email(pool: &Pool<Postgres>, email: &str) -> Result<Option<DbUser>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

    let user = sqlx::query_as::<_, DbUser>(&sql)
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn touch_last_login(pool: &Pool<Postgres>, id: i64) -> Result<Option<DbUser>> {
    let sql = format!(
        r#"
        UPDATE users
        SET last_login = $2
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    );

    let user = sqlx::query_as::<_, DbUser>(&sql)
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?;

    Ok(user)
}
