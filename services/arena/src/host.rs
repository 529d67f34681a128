//! Registry of live session tasks.
//!
//! A session task is spawned the first time its id is addressed. Its starting state is the
//! persisted snapshot when one exists and a fresh idle session otherwise.

use std::collections::HashMap;
use std::sync::Mutex;

use gauntlet_types::{ArenaError, ErrorKind, Session};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use thiserror::Error as ThisError;
use tracing::{info, warn};

use crate::balance::BalanceError;
use crate::session_task::{SessionDeps, SessionHandle, SessionTask, TaskConfig};

#[derive(Debug, ThisError)]
pub enum HostError {
    #[error(transparent)]
    Arena(#[from] ArenaError),
    #[error(transparent)]
    Balance(#[from] BalanceError),
    #[error("session task is no longer running")]
    SessionClosed,
    #[error("session storage failed: {0}")]
    Storage(String),
}

impl HostError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HostError::Arena(err) => err.kind(),
            HostError::Balance(BalanceError::InsufficientFunds { .. }) => ErrorKind::Validation,
            HostError::Balance(BalanceError::Unavailable(_))
            | HostError::SessionClosed
            | HostError::Storage(_) => ErrorKind::UnexpectedFault,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            HostError::Arena(err) => err.code(),
            HostError::Balance(BalanceError::InsufficientFunds { .. }) => "INSUFFICIENT_FUNDS",
            HostError::Balance(BalanceError::Unavailable(_)) => "BALANCE_UNAVAILABLE",
            HostError::SessionClosed => "SESSION_CLOSED",
            HostError::Storage(_) => "STORAGE_FAILURE",
        }
    }
}

pub struct ArenaHost {
    deps: SessionDeps,
    config: TaskConfig,
    sessions: tokio::sync::Mutex<HashMap<String, SessionHandle>>,
    master_rng: Mutex<StdRng>,
}

impl ArenaHost {
    /// `seed` makes every session's RNG reproducible; entropy is used when it is `None`.
    pub fn new(deps: SessionDeps, config: TaskConfig, seed: Option<u64>) -> Self {
        let master_rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            deps,
            config,
            sessions: tokio::sync::Mutex::new(HashMap::new()),
            master_rng: Mutex::new(master_rng),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.deps.clock.now_ms()
    }

    fn session_rng(&self) -> Result<StdRng, HostError> {
        let mut master = self
            .master_rng
            .lock()
            .map_err(|_| HostError::Storage("rng lock poisoned".to_string()))?;
        Ok(StdRng::seed_from_u64(master.next_u64()))
    }

    /// Address of the task owning `id`, spawning it if needed.
    pub async fn handle(&self, id: &str) -> Result<SessionHandle, HostError> {
        let mut sessions = self.sessions.lock().await;
        if let Some(handle) = sessions.get(id) {
            if !handle.is_closed() {
                return Ok(handle.clone());
            }
            warn!(session = %id, "session task exited; respawning");
        }

        let session = self
            .deps
            .store
            .load(id)
            .await
            .map_err(|err| HostError::Storage(format!("{err:#}")))?
            .unwrap_or_else(|| Session::new(id));
        info!(
            session = %id,
            phase = session.phase.as_str(),
            day = session.day_counter,
            "spawning session task"
        );
        let (task, handle) =
            SessionTask::new(session, self.deps.clone(), self.config.clone(), self.session_rng()?);
        task.spawn();
        sessions.insert(id.to_string(), handle.clone());
        Ok(handle)
    }

    /// Spawn tasks for every persisted session that was mid-game. Returns how many resumed.
    pub async fn resume_running(&self) -> anyhow::Result<usize> {
        let mut resumed = 0;
        for id in self.deps.store.session_ids().await? {
            let Some(session) = self.deps.store.load(&id).await? else {
                continue;
            };
            if !session.is_running() {
                continue;
            }
            self.handle(&id).await?;
            resumed += 1;
        }
        info!(resumed, "resumed running sessions");
        Ok(resumed)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
