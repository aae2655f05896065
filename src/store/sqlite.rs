//! SQLite implementation of `RecordStore`.
//!
//! The connection is opened and brought up to schema on the caller's thread,
//! then handed to a worker thread that runs queued jobs one at a time. Rows are
//! kept as JSON payloads in a single `records` table keyed by collection and id.

use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use tokio::sync::oneshot;

use super::{schema::ensure_schema, Collection, RecordStore, Row, StoreError, StoreResult};

type Job = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

/// Owns the worker thread. Dropping the last handle closes the job queue and
/// waits for the jobs already queued to finish.
struct Worker {
    jobs: Mutex<Option<mpsc::Sender<Job>>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Worker {
    fn spawn(mut conn: Connection) -> Result<Self> {
        let (jobs, queue) = mpsc::channel::<Job>();
        let thread = thread::Builder::new()
            .name("hotel-admin-db".into())
            .spawn(move || {
                for job in queue {
                    job(&mut conn);
                }
                info!("Record store worker stopped");
            })
            .context("failed to spawn record store worker")?;

        Ok(Self {
            jobs: Mutex::new(Some(jobs)),
            thread: Mutex::new(Some(thread)),
        })
    }

    fn submit(&self, job: Job) -> Result<()> {
        let jobs = self.jobs.lock().unwrap_or_else(|p| p.into_inner());
        jobs.as_ref()
            .ok_or_else(|| anyhow!("record store is closed"))?
            .send(job)
            .map_err(|_| anyhow!("record store worker is gone"))
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.jobs.lock().unwrap_or_else(|p| p.into_inner()).take();
        let thread = self.thread.lock().unwrap_or_else(|p| p.into_inner()).take();
        if let Some(Err(err)) = thread.map(JoinHandle::join) {
            error!("Record store worker panicked: {err:?}");
        }
    }
}

fn open_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("failed to create database directory {}", parent.display())
        })?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open SQLite database {}", path.display()))?;
    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
        error!("Failed to enable WAL mode: {err}");
    }
    ensure_schema(&mut conn)?;
    Ok(conn)
}

fn decode_payload(id: i64, payload: &str) -> Result<Row> {
    let mut row: Row = serde_json::from_str(payload)
        .with_context(|| format!("record {id} holds an invalid JSON payload"))?;
    row.insert("id".into(), Value::from(id));
    Ok(row)
}

#[derive(Clone)]
pub struct SqliteStore {
    worker: Arc<Worker>,
    path: Arc<PathBuf>,
}

impl SqliteStore {
    pub fn open(path: PathBuf) -> Result<Self> {
        let conn = open_connection(&path)?;
        let worker = Worker::spawn(conn)?;
        info!("Record store ready at {}", path.display());
        Ok(Self {
            worker: Arc::new(worker),
            path: Arc::new(path),
        })
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Run `query` on the worker's connection and await its result.
    async fn run<F, T>(&self, query: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply, answer) = oneshot::channel();
        self.worker.submit(Box::new(move |conn| {
            // The caller may have timed out and gone away.
            let _ = reply.send(query(conn));
        }))?;
        answer
            .await
            .map_err(|_| anyhow!("record store worker dropped the query"))?
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn create(&self, collection: Collection, mut row: Row) -> StoreResult<Row> {
        row.remove("id");
        let now = Utc::now().to_rfc3339();
        if !matches!(row.get("created_at"), Some(Value::String(_))) {
            row.insert("created_at".into(), Value::from(now.clone()));
        }

        let row = self
            .run(move |conn| {
                let payload = serde_json::to_string(&row)?;
                conn.execute(
                    "INSERT INTO records (collection, data, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?3)",
                    params![collection.as_str(), payload, now],
                )
                .with_context(|| format!("failed to insert {collection} record"))?;

                let id = conn.last_insert_rowid();
                row.insert("id".into(), Value::from(id));
                Ok(row)
            })
            .await?;
        Ok(row)
    }

    async fn update(&self, collection: Collection, id: i64, patch: Row) -> StoreResult<Row> {
        let updated = self
            .run(move |conn| {
                let tx = conn.transaction()?;
                let payload: Option<String> = tx
                    .query_row(
                        "SELECT data FROM records WHERE collection = ?1 AND id = ?2",
                        params![collection.as_str(), id],
                        |row| row.get(0),
                    )
                    .optional()?;
                let Some(payload) = payload else {
                    return Ok(None);
                };

                let now = Utc::now().to_rfc3339();
                let mut row = decode_payload(id, &payload)?;
                for (key, value) in patch {
                    if key != "id" {
                        row.insert(key, value);
                    }
                }
                row.insert("updated_at".into(), Value::from(now.clone()));

                let mut stored = row.clone();
                stored.remove("id");
                tx.execute(
                    "UPDATE records SET data = ?1, updated_at = ?2
                     WHERE collection = ?3 AND id = ?4",
                    params![serde_json::to_string(&stored)?, now, collection.as_str(), id],
                )
                .with_context(|| format!("failed to update {collection} record {id}"))?;
                tx.commit()?;
                Ok(Some(row))
            })
            .await?;

        updated.ok_or(StoreError::NotFound { collection, id })
    }

    async fn delete(&self, collection: Collection, id: i64) -> StoreResult<i64> {
        let rows_affected = self
            .run(move |conn| {
                conn.execute(
                    "DELETE FROM records WHERE collection = ?1 AND id = ?2",
                    params![collection.as_str(), id],
                )
                .with_context(|| format!("failed to delete {collection} record {id}"))
            })
            .await?;

        if rows_affected == 0 {
            return Err(StoreError::NotFound { collection, id });
        }
        Ok(id)
    }

    async fn list(&self, collection: Collection) -> StoreResult<Vec<Row>> {
        let rows = self
            .run(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, data FROM records WHERE collection = ?1 ORDER BY id ASC",
                )?;
                let mut rows = stmt.query(params![collection.as_str()])?;
                let mut records = Vec::new();
                while let Some(row) = rows.next()? {
                    let id: i64 = row.get(0)?;
                    let payload: String = row.get(1)?;
                    records.push(decode_payload(id, &payload)?);
                }
                Ok(records)
            })
            .await?;
        Ok(rows)
    }
}
