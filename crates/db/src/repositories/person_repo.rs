//! Repository for the `persons` table.

use notifications_core::types::DbId;
use sqlx::PgPool;

use crate::models::person::{Person, UpsertPerson};

const COLUMNS: &str = "id, username, name, email, created_at, updated_at";

const P_COLUMNS: &str = "p.id, p.username, p.name, p.email, p.created_at, p.updated_at";

pub struct PersonRepo;

impl PersonRepo {
    /// Create or update a person keyed by `username`.
    ///
    /// Returns the row and whether it was newly inserted.
    pub async fn upsert_by_username(
        pool: &PgPool,
        input: &UpsertPerson,
    ) -> Result<(Person, bool), sqlx::Error> {
        let query = format!(
            "INSERT INTO persons (username, name, email) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (username) DO UPDATE SET \
                name = EXCLUDED.name, \
                email = EXCLUDED.email, \
                updated_at = NOW() \
             RETURNING {COLUMNS}, (xmax = 0) AS inserted"
        );
        let row: PersonUpsertRow = sqlx::query_as(&query)
            .bind(&input.username)
            .bind(&input.name)
            .bind(&input.email)
            .fetch_one(pool)
            .await?;
        Ok((row.person, row.inserted))
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Person>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM persons WHERE id = $1");
        sqlx::query_as::<_, Person>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Map usernames to person IDs. Unknown usernames are absent from the result.
    pub async fn find_ids_by_usernames(
        pool: &PgPool,
        usernames: &[String],
    ) -> Result<Vec<(String, DbId)>, sqlx::Error> {
        sqlx::query_as::<_, (String, DbId)>(
            "SELECT username, id FROM persons WHERE username = ANY($1)",
        )
        .bind(usernames)
        .fetch_all(pool)
        .await
    }

    /// Persons with a current link to a company in one of `group_codes`, by name.
    pub async fn list_by_group_codes(
        pool: &PgPool,
        group_codes: &[&str],
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Person>, sqlx::Error> {
        let codes: Vec<String> = group_codes.iter().map(|c| c.to_string()).collect();
        let query = format!(
            "SELECT {P_COLUMNS} FROM persons p \
             WHERE EXISTS ( \
                 SELECT 1 FROM person_companies pc \
                 JOIN companies c ON c.id = pc.company_id \
                 JOIN companies_groups g ON g.id = c.group_id \
                 WHERE pc.person_id = p.id AND pc.current = true AND g.code = ANY($1) \
             ) \
             ORDER BY p.name, p.id \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Person>(&query)
            .bind(codes)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count_by_group_codes(
        pool: &PgPool,
        group_codes: &[&str],
    ) -> Result<i64, sqlx::Error> {
        let codes: Vec<String> = group_codes.iter().map(|c| c.to_string()).collect();
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM persons p \
             WHERE EXISTS ( \
                 SELECT 1 FROM person_companies pc \
                 JOIN companies c ON c.id = pc.company_id \
                 JOIN companies_groups g ON g.id = c.group_id \
                 WHERE pc.person_id = p.id AND pc.current = true AND g.code = ANY($1) \
             )",
        )
        .bind(codes)
        .fetch_one(pool)
        .await
    }
}

#[derive(sqlx::FromRow)]
struct PersonUpsertRow {
    #[sqlx(flatten)]
    person: Person,
    inserted: bool,
}
