//! Postgres-backed credential store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sqlx::{postgres::PgRow, Connection, PgPool, Row};
use time::Date;
use tracing::{info_span, Instrument};

use super::{
    storage::{CredentialStore, SignupOutcome},
    types::IdentityRecord,
    utils::is_unique_violation,
};

pub const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

fn db_span(operation: &'static str, statement: &'static str) -> tracing::Span {
    info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `users` table if it does not exist yet.
    ///
    /// # Errors
    /// Returns an error if any schema statement fails.
    pub async fn apply_schema(&self) -> Result<()> {
        for statement in SCHEMA_SQL.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement)
                .execute(&self.pool)
                .instrument(info_span!("db.schema", db.system = "postgresql"))
                .await
                .context("failed to apply users schema")?;
        }
        Ok(())
    }
}

fn record_from_row(row: &PgRow) -> Result<IdentityRecord> {
    let credential_hash: String = row.try_get("credential_hash")?;
    let date_of_birth: Option<Date> = row.try_get("date_of_birth")?;
    Ok(IdentityRecord {
        id: row.try_get("id")?,
        display_name: row.try_get("display_name")?,
        credential_hash: SecretString::from(credential_hash),
        date_of_birth,
    })
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn save(&self, record: IdentityRecord) -> Result<()> {
        let query = r"
            INSERT INTO users
                (id, display_name, credential_hash, date_of_birth)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                display_name = EXCLUDED.display_name,
                credential_hash = EXCLUDED.credential_hash,
                date_of_birth = EXCLUDED.date_of_birth
        ";
        sqlx::query(query)
            .bind(&record.id)
            .bind(&record.display_name)
            .bind(record.credential_hash.expose_secret())
            .bind(record.date_of_birth)
            .execute(&self.pool)
            .instrument(db_span("UPSERT", query))
            .await
            .context("failed to save user")?;
        Ok(())
    }

    async fn insert_if_absent(&self, record: IdentityRecord) -> Result<SignupOutcome> {
        let query = r"
            INSERT INTO users
                (id, display_name, credential_hash, date_of_birth)
            VALUES ($1, $2, $3, $4)
        ";
        let result = sqlx::query(query)
            .bind(&record.id)
            .bind(&record.display_name)
            .bind(record.credential_hash.expose_secret())
            .bind(record.date_of_birth)
            .execute(&self.pool)
            .instrument(db_span("INSERT", query))
            .await;

        match result {
            Ok(_) => Ok(SignupOutcome::Created),
            Err(err) if is_unique_violation(&err) => Ok(SignupOutcome::Conflict),
            Err(err) => Err(err).context("failed to insert user"),
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<IdentityRecord>> {
        let query = "SELECT id, display_name, credential_hash, date_of_birth FROM users WHERE id = $1";
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", query))
            .await
            .context("failed to lookup user")?;
        row.as_ref()
            .map(record_from_row)
            .transpose()
            .context("failed to decode user row")
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let query = "DELETE FROM users WHERE id = $1";
        let result = sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(db_span("DELETE", query))
            .await
            .context("failed to delete user")?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> Result<()> {
        let query = "DELETE FROM users";
        sqlx::query(query)
            .execute(&self.pool)
            .instrument(db_span("DELETE", query))
            .await
            .context("failed to delete users")?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self
            .pool
            .acquire()
            .instrument(info_span!(
                "db.acquire",
                db.system = "postgresql",
                db.operation = "ACQUIRE"
            ))
            .await
            .context("failed to acquire database connection")?;
        conn.ping()
            .instrument(info_span!(
                "db.ping",
                db.system = "postgresql",
                db.operation = "PING"
            ))
            .await
            .context("failed to ping database")
    }
}
