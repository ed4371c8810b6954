//! Repository for the `staff_users` table.

use notifications_core::types::DbId;
use sqlx::PgPool;

use crate::models::staff_user::StaffUser;

const COLUMNS: &str = "id, username, password_hash, is_active, created_at, last_login_at";

pub struct StaffUserRepo;

impl StaffUserRepo {
    /// Insert a staff account with an already hashed password.
    pub async fn create(
        pool: &PgPool,
        username: &str,
        password_hash: &str,
    ) -> Result<StaffUser, sqlx::Error> {
        let query = format!(
            "INSERT INTO staff_users (username, password_hash) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StaffUser>(&query)
            .bind(username)
            .bind(password_hash)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<StaffUser>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM staff_users WHERE username = $1");
        sqlx::query_as::<_, StaffUser>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<StaffUser>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM staff_users WHERE id = $1");
        sqlx::query_as::<_, StaffUser>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn record_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE staff_users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
