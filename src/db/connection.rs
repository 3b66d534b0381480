//! The SQLite handle shared by every request.
//!
//! The connection is opened and migrated on the caller's thread, so a broken
//! database file fails `Database::open` directly. It then moves onto a
//! `watchlog-db` thread that runs queued jobs one at a time. Dropping the
//! last `Database` clone closes the queue; the thread finishes the jobs it
//! already holds, closes the connection and is joined.

use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use rusqlite::Connection;
use tokio::sync::oneshot;

use crate::db::migrations::run_migrations;
use crate::{log_error, log_info, log_warn};

const ENABLE_LOGS: bool = true;

type Job = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

struct Worker {
    jobs: Option<mpsc::Sender<Job>>,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    fn spawn(conn: Connection, path: PathBuf) -> Result<Self> {
        let (jobs, queue) = mpsc::channel::<Job>();
        let thread = thread::Builder::new()
            .name("watchlog-db".into())
            .spawn(move || run_jobs(conn, queue, &path))
            .context("failed to spawn database thread")?;

        Ok(Self {
            jobs: Some(jobs),
            thread: Some(thread),
        })
    }

    fn submit(&self, job: Job) -> Result<()> {
        self.jobs
            .as_ref()
            .ok_or_else(|| anyhow!("database queue is closed"))?
            .send(job)
            .map_err(|_| anyhow!("database thread has exited"))
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        drop(self.jobs.take());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log_error!("Database thread panicked");
            }
        }
    }
}

fn run_jobs(mut conn: Connection, queue: mpsc::Receiver<Job>, path: &Path) {
    for job in queue {
        job(&mut conn);
    }
    if let Err((_, err)) = conn.close() {
        log_warn!("Closing {} failed: {err}", path.display());
    }
    log_info!("Database {} closed", path.display());
}

fn open_connection(path: &Path) -> Result<Connection> {
    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open SQLite database {}", path.display()))?;

    // Deleting users and watches relies on cascades.
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("failed to enable foreign keys")?;
    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
        log_warn!("WAL journal unavailable, keeping default journal: {err}");
    }

    run_migrations(&mut conn)?;
    Ok(conn)
}

/// Cloneable handle to the watchlog database.
#[derive(Clone)]
pub struct Database {
    worker: Arc<Worker>,
    path: Arc<PathBuf>,
}

impl Database {
    /// Open (creating if needed) and migrate the database at `path`.
    pub fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let conn = open_connection(&path)?;
        let worker = Worker::spawn(conn, path.clone())?;
        log_info!("Database ready at {}", path.display());

        Ok(Self {
            worker: Arc::new(worker),
            path: Arc::new(path),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `task` on the database thread and wait for its result.
    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply, response) = oneshot::channel();
        self.worker.submit(Box::new(move |conn| {
            // The caller may have gone away; its result is simply dropped.
            let _ = reply.send(task(conn));
        }))?;

        response
            .await
            .context("database thread dropped the request")?
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Database;
    use tempfile::TempDir;

    /// Fresh database in a temp dir. Keep the dir alive for the test's duration.
    pub fn open_temp_database() -> (TempDir, Database) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let db = Database::open(dir.path().join("watchlog.sqlite3")).expect("open database");
        (dir, db)
    }
}
