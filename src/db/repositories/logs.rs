use anyhow::Result;
use rusqlite::{params, Row};

use crate::analysis::Cell;
use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime},
    models::{LogEntry, LogTable, NewLogEntry},
};

fn row_to_log(row: &Row) -> Result<LogEntry> {
    let timedate: String = row.get("timedate")?;

    Ok(LogEntry {
        log_id: row.get("log_id")?,
        watch_id: row.get("watch_id")?,
        cycle: row.get("cycle")?,
        timedate: parse_datetime(&timedate, "timedate")?,
        measure: row.get("measure")?,
    })
}

impl Database {
    pub async fn insert_log(&self, entry: NewLogEntry) -> Result<LogEntry> {
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO logs (watch_id, cycle, timedate, measure) VALUES (?1, ?2, ?3, ?4)",
                params![
                    entry.watch_id,
                    entry.cycle,
                    format_datetime(&entry.timedate),
                    entry.measure,
                ],
            )?;

            Ok(LogEntry {
                log_id: conn.last_insert_rowid(),
                watch_id: entry.watch_id,
                cycle: entry.cycle,
                timedate: entry.timedate,
                measure: entry.measure,
            })
        })
        .await
    }

    /// Logs of one watch cycle ordered by time, as a raw table for frame construction.
    pub async fn get_log_table(&self, watch_id: i64, cycle: i64) -> Result<LogTable> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT log_id, timedate, measure
                 FROM logs
                 WHERE watch_id = ?1 AND cycle = ?2
                 ORDER BY timedate ASC, log_id ASC",
            )?;

            let rows = stmt
                .query_map(params![watch_id, cycle], |row| {
                    Ok(vec![
                        Cell::Integer(row.get(0)?),
                        Cell::Text(row.get(1)?),
                        Cell::Real(row.get(2)?),
                    ])
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(LogTable::new(rows))
        })
        .await
    }

    /// A log, provided it belongs to one of the user's watches.
    pub async fn get_log_for_user(&self, log_id: i64, user_id: i64) -> Result<Option<LogEntry>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT logs.log_id, logs.watch_id, logs.cycle, logs.timedate, logs.measure
                 FROM logs
                 JOIN watches ON watches.watch_id = logs.watch_id
                 WHERE logs.log_id = ?1 AND watches.user_id = ?2",
            )?;

            let mut rows = stmt.query(params![log_id, user_id])?;
            let log = match rows.next()? {
                Some(row) => Some(row_to_log(row)?),
                None => None,
            };
            Ok(log)
        })
        .await
    }

    pub async fn delete_log(&self, log_id: i64) -> Result<()> {
        self.execute(move |conn| {
            let rows_affected =
                conn.execute("DELETE FROM logs WHERE log_id = ?1", params![log_id])?;

            if rows_affected == 0 {
                return Err(anyhow::anyhow!("Log not found"));
            }
            Ok(())
        })
        .await
    }

    /// One past the highest cycle in use, or 1 for a watch without logs.
    pub async fn next_cycle(&self, watch_id: i64) -> Result<i64> {
        self.execute(move |conn| {
            let highest: Option<i64> = conn.query_row(
                "SELECT MAX(cycle) FROM logs WHERE watch_id = ?1",
                params![watch_id],
                |row| row.get(0),
            )?;
            Ok(highest.map_or(1, |cycle| cycle + 1))
        })
        .await
    }

    /// Remove every log of one cycle. Returns how many logs were removed.
    pub async fn delete_cycle(&self, watch_id: i64, cycle: i64) -> Result<usize> {
        self.execute(move |conn| {
            let removed = conn.execute(
                "DELETE FROM logs WHERE watch_id = ?1 AND cycle = ?2",
                params![watch_id, cycle],
            )?;
            Ok(removed)
        })
        .await
    }
}
