//! Schema upgrades, tracked in SQLite's `user_version`.
//!
//! Entry `n` of [`MIGRATIONS`] moves a database from version `n` to `n + 1`.
//! Pending steps run in one transaction, so a failed upgrade leaves the file
//! at its previous version.

use anyhow::{anyhow, Context, Result};
use rusqlite::Connection;

use crate::log_info;

const ENABLE_LOGS: bool = true;

const MIGRATIONS: &[&str] = &[include_str!("schemas/schema_v1.sql")];

/// Version a fully migrated database reports.
pub fn latest_version() -> i32 {
    MIGRATIONS.len() as i32
}

pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let found: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read schema version")?;

    let applied = usize::try_from(found)
        .ok()
        .filter(|applied| *applied <= MIGRATIONS.len())
        .ok_or_else(|| {
            anyhow!(
                "schema version {found} is not supported; this build knows up to {}",
                latest_version()
            )
        })?;
    if applied == MIGRATIONS.len() {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .context("failed to start schema upgrade")?;
    for (step, sql) in MIGRATIONS.iter().enumerate().skip(applied) {
        tx.execute_batch(sql)
            .with_context(|| format!("failed to upgrade schema to version {}", step + 1))?;
    }
    tx.pragma_update(None, "user_version", latest_version())
        .context("failed to record schema version")?;
    tx.commit().context("failed to commit schema upgrade")?;

    log_info!("Schema upgraded from version {found} to {}", latest_version());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(conn: &Connection) -> i32 {
        conn.pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn fresh_database_reaches_latest_version() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(version(&conn), 0);
        run_migrations(&mut conn).unwrap();
        assert_eq!(version(&conn), latest_version());
    }

    #[test]
    fn refuses_unknown_versions() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", latest_version() + 1)
            .unwrap();
        let err = run_migrations(&mut conn).unwrap_err();
        assert!(err.to_string().contains("not supported"));

        conn.pragma_update(None, "user_version", -1).unwrap();
        assert!(run_migrations(&mut conn).is_err());
    }

    #[test]
    fn migrating_twice_is_harmless() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        run_migrations(&mut conn).unwrap();
        assert_eq!(version(&conn), latest_version());
    }
}
