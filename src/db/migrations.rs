use anyhow::Context;
use rusqlite::{params, Connection};

// Applied in order; each name is recorded in schema_history so a migration
// runs exactly once per database.
const MIGRATIONS: &[(&str, &str)] = &[(
    "001_init.sql",
    include_str!("../../migrations/001_init.sql"),
)];

pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_history (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .context("failed to create schema history table")?;

    for &(name, sql) in MIGRATIONS {
        let applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM schema_history WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .context("failed to read schema history")?;
        if applied {
            continue;
        }

        conn.execute_batch(sql)
            .with_context(|| format!("failed to apply migration {name}"))?;
        conn.execute(
            "INSERT INTO schema_history (name) VALUES (?1)",
            params![name],
        )
        .with_context(|| format!("failed to record migration {name}"))?;

        tracing::debug!(migration = name, "schema migration applied");
    }

    Ok(())
}
