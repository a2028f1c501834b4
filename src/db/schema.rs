use rusqlite::Connection;

use super::{StoreError, StoreResult};

struct Migration {
    version: &'static str,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "001",
        name: "initial",
        sql: include_str!("migrations/001_initial.sql"),
    },
    Migration {
        version: "002",
        name: "package_project_index",
        sql: include_str!("migrations/002_package_project_index.sql"),
    },
];

const LEDGER: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
)";

pub fn run_migrations(conn: &Connection) -> StoreResult<()> {
    run_with(conn, MIGRATIONS)
}

fn run_with(conn: &Connection, migrations: &[Migration]) -> StoreResult<()> {
    conn.execute_batch(LEDGER)?;
    let mut applied = applied_versions(conn)?;

    // A projects table with an empty ledger predates version tracking
    if let Some(baseline) = migrations.first() {
        if applied.is_empty() && table_exists(conn, "projects")? {
            record(conn, baseline)?;
            applied.push(baseline.version.to_string());
            tracing::info!(version = baseline.version, "baselined existing database");
        }
    }

    for migration in migrations {
        if !applied.iter().any(|v| v == migration.version) {
            apply(conn, migration)?;
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn applied_versions(conn: &Connection) -> StoreResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT version FROM schema_migrations ORDER BY version")?;
    let versions = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(versions)
}

fn record(conn: &Connection, migration: &Migration) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?, ?, ?)",
        (
            migration.version,
            migration.name,
            chrono::Utc::now().to_rfc3339(),
        ),
    )?;
    Ok(())
}

/// Runs the migration and its ledger row in one transaction; a failure leaves neither behind.
fn apply(conn: &Connection, migration: &Migration) -> StoreResult<()> {
    tracing::info!(
        version = migration.version,
        name = migration.name,
        "applying migration"
    );

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(migration.sql)
        .map_err(|source| StoreError::Migration {
            version: migration.version,
            name: migration.name,
            source,
        })?;
    record(&tx, migration)?;
    tx.commit()?;

    Ok(())
}
