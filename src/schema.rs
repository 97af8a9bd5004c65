//! Database schema management for `agro-sensorflow`.
//!
//! Ensures required tables, indexes and change-feed triggers exist before
//! serving requests. Applied once on startup from `main.rs`.

use anyhow::Result;
use sqlx::PgPool;

use crate::feed::{NOTIFICATIONS_CHANNEL, READINGS_CHANNEL};

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the `sensors` registry, the `sensor_readings` table with its JSON
/// payload column, and the `notifications` table keyed by `custom_id`. Each
/// of the latter two gets a trigger that publishes row changes on the change
/// feed channel. Safe to call on every startup.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sensors (
            id             BIGSERIAL PRIMARY KEY,
            serial_number  TEXT    NOT NULL UNIQUE,
            location       TEXT,
            kind           TEXT,
            modbus_address INTEGER,
            status         TEXT    NOT NULL DEFAULT 'active'
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sensor_readings (
            id                   BIGSERIAL PRIMARY KEY,
            sensor_id            BIGINT REFERENCES sensors (id),
            sensor_serial_number TEXT,
            timestamp            TIMESTAMPTZ NOT NULL DEFAULT now(),
            source               TEXT,
            quality_score        INTEGER,
            data                 JSONB
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_sensor_readings_timestamp
            ON sensor_readings (timestamp);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id         BIGSERIAL PRIMARY KEY,
            custom_id  TEXT        NOT NULL UNIQUE,
            kind       TEXT        NOT NULL,
            title      TEXT        NOT NULL,
            message    TEXT        NOT NULL,
            sensor     TEXT,
            show_toast BOOLEAN     NOT NULL DEFAULT TRUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    for (table, channel) in [
        ("sensor_readings", READINGS_CHANNEL),
        ("notifications", NOTIFICATIONS_CHANNEL),
    ] {
        create_change_trigger(&mut tx, table, channel).await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Publish `{"op": ..., "table": ...}` on `channel` for every row change.
async fn create_change_trigger(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    table: &str,
    channel: &str,
) -> Result<()> {
    // ---
    sqlx::query(&format!(
        r#"
        CREATE OR REPLACE FUNCTION notify_{table}_change() RETURNS trigger AS $$
        BEGIN
            PERFORM pg_notify(
                '{channel}',
                json_build_object('op', TG_OP, 'table', TG_TABLE_NAME)::text
            );
            RETURN NULL;
        END;
        $$ LANGUAGE plpgsql;
        "#
    ))
    .execute(&mut **tx)
    .await?;

    sqlx::query(&format!(
        "DROP TRIGGER IF EXISTS {table}_change_feed ON {table};"
    ))
    .execute(&mut **tx)
    .await?;

    sqlx::query(&format!(
        r#"
        CREATE TRIGGER {table}_change_feed
            AFTER INSERT OR UPDATE OR DELETE ON {table}
            FOR EACH ROW EXECUTE FUNCTION notify_{table}_change();
        "#
    ))
    .execute(&mut **tx)
    .await?;

    Ok(())
}
