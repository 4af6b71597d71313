use anyhow::{Context, Result};
use sqlx::PgPool;

const CREATE_ACCOUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    account_number VARCHAR(34) PRIMARY KEY,
    user_id        VARCHAR(64) NOT NULL UNIQUE,
    balance        BIGINT NOT NULL CHECK (balance >= 0),
    currency       CHAR(3) NOT NULL DEFAULT 'EUR'
)
"#;

const CREATE_TRANSFERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS transfers (
    id           UUID PRIMARY KEY,
    user_id      VARCHAR(64) NOT NULL,
    amount       BIGINT NOT NULL CHECK (amount > 0),
    currency     CHAR(3) NOT NULL,
    account_from VARCHAR(34) NOT NULL,
    account_to   VARCHAR(34) NOT NULL,
    explanation  TEXT NOT NULL,
    status       VARCHAR(16) NOT NULL,
    sender_name  TEXT NOT NULL,
    created_at   TIMESTAMPTZ NOT NULL
)
"#;

const CREATE_TRANSFERS_USER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS transfers_user_created_idx ON transfers (user_id, created_at DESC)";

const CREATE_REMOTE_BANKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS remote_banks (
    bank_prefix     CHAR(3) PRIMARY KEY,
    name            TEXT NOT NULL,
    transaction_url TEXT NOT NULL,
    api_key         TEXT NOT NULL,
    owners          TEXT,
    jwks_url        TEXT NOT NULL
)
"#;

/// Create the tables this service owns if they do not exist yet
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    tracing::info!("Ensuring PostgreSQL schema...");

    for (name, ddl) in [
        ("accounts", CREATE_ACCOUNTS_TABLE),
        ("transfers", CREATE_TRANSFERS_TABLE),
        ("transfers_user_created_idx", CREATE_TRANSFERS_USER_INDEX),
        ("remote_banks", CREATE_REMOTE_BANKS_TABLE),
    ] {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to create {}", name))?;
    }

    Ok(())
}
