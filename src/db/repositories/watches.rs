use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime},
    models::{Watch, WatchInfo},
};

fn row_to_watch(row: &Row) -> Result<Watch> {
    let date_of_creation: String = row.get("date_of_creation")?;

    Ok(Watch {
        watch_id: row.get("watch_id")?,
        user_id: row.get("user_id")?,
        name: row.get("name")?,
        date_of_creation: parse_datetime(&date_of_creation, "date_of_creation")?,
    })
}

pub(crate) fn query_cycles(conn: &Connection, watch_id: i64) -> Result<Vec<i64>> {
    let mut stmt =
        conn.prepare("SELECT DISTINCT cycle FROM logs WHERE watch_id = ?1 ORDER BY cycle ASC")?;
    let cycles = stmt
        .query_map(params![watch_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
    Ok(cycles)
}

impl Database {
    /// Create a watch for a user. Returns `None` if the user already has a
    /// watch with that name.
    pub async fn create_watch(
        &self,
        user_id: i64,
        name: String,
        date_of_creation: DateTime<Utc>,
    ) -> Result<Option<Watch>> {
        self.execute(move |conn| {
            let existing: Option<i64> = conn
                .query_row(
                    "SELECT watch_id FROM watches WHERE user_id = ?1 AND name = ?2",
                    params![user_id, name],
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                return Ok(None);
            }

            conn.execute(
                "INSERT INTO watches (user_id, name, date_of_creation) VALUES (?1, ?2, ?3)",
                params![user_id, name, format_datetime(&date_of_creation)],
            )?;

            Ok(Some(Watch {
                watch_id: conn.last_insert_rowid(),
                user_id,
                name,
                date_of_creation,
            }))
        })
        .await
    }

    /// All watches of a user, oldest first.
    pub async fn get_watches(&self, user_id: i64) -> Result<Vec<Watch>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT watch_id, user_id, name, date_of_creation
                 FROM watches
                 WHERE user_id = ?1
                 ORDER BY date_of_creation ASC, watch_id ASC",
            )?;

            let mut rows = stmt.query(params![user_id])?;
            let mut watches = Vec::new();
            while let Some(row) = rows.next()? {
                watches.push(row_to_watch(row)?);
            }

            Ok(watches)
        })
        .await
    }

    pub async fn get_watch_by_name(&self, user_id: i64, name: &str) -> Result<Option<Watch>> {
        let name = name.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT watch_id, user_id, name, date_of_creation
                 FROM watches
                 WHERE user_id = ?1 AND name = ?2",
            )?;

            let mut rows = stmt.query(params![user_id, name])?;
            let watch = match rows.next()? {
                Some(row) => Some(row_to_watch(row)?),
                None => None,
            };
            Ok(watch)
        })
        .await
    }

    /// Delete a watch and, through the foreign key cascade, its logs.
    pub async fn delete_watch(&self, watch_id: i64) -> Result<()> {
        self.execute(move |conn| {
            let rows_affected =
                conn.execute("DELETE FROM watches WHERE watch_id = ?1", params![watch_id])?;

            if rows_affected == 0 {
                return Err(anyhow::anyhow!("Watch not found"));
            }
            Ok(())
        })
        .await
    }

    /// Distinct cycle numbers that have at least one log, ascending.
    pub async fn get_cycles(&self, watch_id: i64) -> Result<Vec<i64>> {
        self.execute(move |conn| query_cycles(conn, watch_id)).await
    }

    pub async fn get_watch_info(&self, watch: &Watch) -> Result<WatchInfo> {
        let watch = watch.clone();
        self.execute(move |conn| {
            let cycles = query_cycles(conn, watch.watch_id)?;
            let total_measures: i64 = conn.query_row(
                "SELECT COUNT(*) FROM logs WHERE watch_id = ?1",
                params![watch.watch_id],
                |row| row.get(0),
            )?;

            Ok(WatchInfo {
                watch,
                cycles,
                total_measures,
            })
        })
        .await
    }
}
