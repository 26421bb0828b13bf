use async_trait::async_trait;
use sqlx::{
    Connection, PgPool, Row,
    postgres::{PgPoolOptions, PgRow},
};
use std::time::Duration;
use tracing::{Instrument, debug, info_span};

use super::{CredentialStore, StoreError};
use crate::accounts::{
    model::{IdentityField, NewUser, UserRecord},
    password::CredentialHash,
};

pub const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

const EMAIL_UNIQUE_INDEX: &str = "users_email_lower_key";
const PHONE_UNIQUE_INDEX: &str = "users_phone_key";

/// Transaction-scoped advisory lock taken by every insert, so `seq` and `created_at`
/// are allocated in the same order.
const USERS_INSERT_LOCK: i64 = 0x7573_6572_735f_7365;

#[derive(Debug, Clone, Copy)]
pub struct PgStoreOptions {
    max_connections: u32,
    acquire_timeout: Duration,
}

impl PgStoreOptions {
    /// Defaults: 5 connections, 5s acquire timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
        }
    }

    #[must_use]
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    #[must_use]
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }
}

impl Default for PgStoreOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Postgres-backed store. Owns its pool; call [`CredentialStore::close`] on shutdown.
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Open a pool against `dsn`.
    ///
    /// # Errors
    /// Returns an error if the first connection cannot be established.
    pub async fn connect(dsn: &str, options: PgStoreOptions) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(options.max_connections)
            .acquire_timeout(options.acquire_timeout)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await?;

        Ok(Self { pool })
    }

    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply `sql/schema.sql`. Idempotent.
    ///
    /// # Errors
    /// Returns an error if any statement fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "MIGRATE"
        );
        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&self.pool)
            .instrument(span)
            .await?;
        debug!("Schema applied");
        Ok(())
    }

    async fn fetch_one_by(
        &self,
        query: &'static str,
        value: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(value)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;

        Ok(row.map(|row| user_from_row(&row)).transpose()?)
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let query = r"
            SELECT id, name, email, phone, credential_hash, created_at
            FROM users
            WHERE lower(email) = lower($1)
        ";
        self.fetch_one_by(query, email).await
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<UserRecord>, StoreError> {
        let query = r"
            SELECT id, name, email, phone, credential_hash, created_at
            FROM users
            WHERE phone = $1
        ";
        self.fetch_one_by(query, phone).await
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let query = r"
            INSERT INTO users (id, name, email, phone, credential_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING created_at
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(USERS_INSERT_LOCK)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query(query)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.phone)
            .bind(user.credential_hash.as_phc())
            .fetch_one(&mut *tx)
            .instrument(span)
            .await;

        let row = match result {
            Ok(row) => row,
            Err(err) => {
                // rolls back and releases the lock
                drop(tx);
                return match conflict_field(&err) {
                    // Postgres reports whichever index it hit first; keep email ahead of phone.
                    Some(IdentityField::Phone) => {
                        if self.find_by_email(&user.email).await?.is_some() {
                            Err(StoreError::Conflict(IdentityField::Email))
                        } else {
                            Err(StoreError::Conflict(IdentityField::Phone))
                        }
                    }
                    Some(field) => Err(StoreError::Conflict(field)),
                    None => Err(err.into()),
                };
            }
        };
        tx.commit().await?;

        Ok(UserRecord {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            credential_hash: user.credential_hash,
            created_at: row.try_get("created_at")?,
        })
    }

    async fn list(&self, limit: u32, offset: u64) -> Result<Vec<UserRecord>, StoreError> {
        let query = r"
            SELECT id, name, email, phone, credential_hash, created_at
            FROM users
            ORDER BY seq
            LIMIT $1 OFFSET $2
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let rows = sqlx::query(query)
            .bind(i64::from(limit))
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .instrument(span)
            .await?;

        Ok(rows
            .iter()
            .map(user_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self.pool.acquire().instrument(acquire_span).await?;
        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping().instrument(ping_span).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

fn user_from_row(row: &PgRow) -> Result<UserRecord, sqlx::Error> {
    Ok(UserRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        credential_hash: CredentialHash::from_stored(row.try_get::<String, _>("credential_hash")?),
        created_at: row.try_get("created_at")?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

/// Map a unique violation on one of the identity indexes to the field it guards.
fn conflict_field(err: &sqlx::Error) -> Option<IdentityField> {
    if !is_unique_violation(err) {
        return None;
    }
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    match db_err.constraint() {
        Some(EMAIL_UNIQUE_INDEX) => Some(IdentityField::Email),
        Some(PHONE_UNIQUE_INDEX) => Some(IdentityField::Phone),
        _ => None,
    }
}
