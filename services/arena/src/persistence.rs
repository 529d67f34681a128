use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use gauntlet_types::Session;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};

/// Snapshot storage keyed by session id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &str) -> anyhow::Result<Option<Session>>;
    async fn save(&self, session: &Session) -> anyhow::Result<()>;
    async fn session_ids(&self) -> anyhow::Result<Vec<String>>;
}

/// Store used by tests and by deployments without a database path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshots: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self, id: &str) -> anyhow::Result<Option<Session>> {
        let snapshots = self
            .snapshots
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        snapshots
            .get(id)
            .map(|json| serde_json::from_str(json).context("decode session snapshot"))
            .transpose()
    }

    async fn save(&self, session: &Session) -> anyhow::Result<()> {
        let json = serde_json::to_string(session).context("encode session snapshot")?;
        self.snapshots
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?
            .insert(session.id.clone(), json);
        Ok(())
    }

    async fn session_ids(&self) -> anyhow::Result<Vec<String>> {
        let snapshots = self
            .snapshots
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(snapshots.keys().cloned().collect())
    }
}

enum StoreRequest {
    Save {
        id: String,
        day: u32,
        json: String,
        reply: oneshot::Sender<anyhow::Result<()>>,
    },
    Load {
        id: String,
        reply: oneshot::Sender<anyhow::Result<Option<String>>>,
    },
    SessionIds {
        reply: oneshot::Sender<anyhow::Result<Vec<String>>>,
    },
}

/// One JSON snapshot row per session in a WAL-mode SQLite database.
///
/// The connection lives on a dedicated worker thread; requests are queued in arrival order, so a
/// load always observes every save queued before it.
#[derive(Debug)]
pub struct SqliteStore {
    sender: mpsc::Sender<StoreRequest>,
}

impl SqliteStore {
    pub fn open(path: &Path, buffer_size: usize) -> anyhow::Result<Self> {
        let conn = Connection::open(path).context("open session snapshot db")?;
        init_schema_sqlite(&conn)?;

        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        std::thread::Builder::new()
            .name("session-store".to_string())
            .spawn(move || store_worker(conn, receiver))
            .context("spawn session store worker")?;
        Ok(Self { sender })
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<anyhow::Result<T>>) -> StoreRequest,
    ) -> anyhow::Result<T> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(build(reply))
            .await
            .map_err(|_| anyhow!("session store worker stopped"))?;
        response
            .await
            .map_err(|_| anyhow!("session store worker dropped the request"))?
    }
}

fn init_schema_sqlite(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA synchronous=NORMAL;
         CREATE TABLE IF NOT EXISTS sessions (
             id TEXT PRIMARY KEY,
             snapshot TEXT NOT NULL,
             updated_day INTEGER NOT NULL
         );",
    )
    .context("init session snapshot schema")?;
    Ok(())
}

fn write_snapshot(conn: &Connection, id: &str, day: u32, json: &str) -> anyhow::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO sessions (id, snapshot, updated_day) VALUES (?, ?, ?)",
        params![id, json, day],
    )
    .context("write session snapshot")?;
    Ok(())
}

fn read_snapshot(conn: &Connection, id: &str) -> anyhow::Result<Option<String>> {
    conn.query_row(
        "SELECT snapshot FROM sessions WHERE id = ?",
        params![id],
        |row| row.get(0),
    )
    .optional()
    .context("read session snapshot")
}

fn read_session_ids(conn: &Connection) -> anyhow::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT id FROM sessions ORDER BY id ASC")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

fn store_worker(conn: Connection, mut receiver: mpsc::Receiver<StoreRequest>) {
    while let Some(request) = receiver.blocking_recv() {
        match request {
            StoreRequest::Save {
                id,
                day,
                json,
                reply,
            } => {
                let result = write_snapshot(&conn, &id, day, &json);
                if let Err(err) = &result {
                    error!(session = %id, day, ?err, "session snapshot write failed");
                }
                let _ = reply.send(result);
            }
            StoreRequest::Load { id, reply } => {
                let _ = reply.send(read_snapshot(&conn, &id));
            }
            StoreRequest::SessionIds { reply } => {
                let _ = reply.send(read_session_ids(&conn));
            }
        }
    }
    info!("session store worker stopped");
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn load(&self, id: &str) -> anyhow::Result<Option<Session>> {
        let id = id.to_string();
        let row = self
            .request(|reply| StoreRequest::Load { id, reply })
            .await?;
        row.map(|json| serde_json::from_str(&json).context("decode session snapshot"))
            .transpose()
    }

    async fn save(&self, session: &Session) -> anyhow::Result<()> {
        let json = serde_json::to_string(session).context("encode session snapshot")?;
        let id = session.id.clone();
        let day = session.day_counter;
        self.request(|reply| StoreRequest::Save {
            id,
            day,
            json,
            reply,
        })
        .await
    }

    async fn session_ids(&self) -> anyhow::Result<Vec<String>> {
        self.request(|reply| StoreRequest::SessionIds { reply })
            .await
    }
}
