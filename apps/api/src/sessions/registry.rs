//! Live sessions, one tokio task each.
//!
//! A session task owns its controller outright. Handlers reach it through an
//! mpsc command channel and read its latest snapshot from a watch channel, so
//! events for one session are applied strictly in arrival order.
//!
//! When a task exits it removes its own handle. The final snapshot of a session
//! that ended on its own is kept for `retention` so clients can still read the
//! feedback status, then evicted.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::sessions::agent::VoiceEvent;
use crate::sessions::controller::{
    EventOutcome, SessionError, SessionSnapshot, VoiceSessionController,
};

const COMMAND_BUFFER: usize = 32;

enum SessionCommand {
    Event(VoiceEvent, oneshot::Sender<EventOutcome>),
    Stop(oneshot::Sender<Result<(), SessionError>>),
}

struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    status: watch::Receiver<SessionSnapshot>,
}

struct EndedSession {
    snapshot: SessionSnapshot,
    ended_at: Instant,
}

enum Lookup {
    Live(mpsc::Sender<SessionCommand>, watch::Receiver<SessionSnapshot>),
    Ended(SessionSnapshot),
}

#[derive(Debug, Clone, Serialize)]
pub struct EventAck {
    pub outcome: EventOutcome,
    pub session: SessionSnapshot,
}

#[derive(Clone)]
pub struct SessionRegistry {
    live: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
    ended: Arc<RwLock<HashMap<Uuid, EndedSession>>>,
    retention: Duration,
}

impl SessionRegistry {
    pub fn new(retention: Duration) -> Self {
        Self {
            live: Arc::new(RwLock::new(HashMap::new())),
            ended: Arc::new(RwLock::new(HashMap::new())),
            retention,
        }
    }

    /// Hands a started controller to its own task.
    pub async fn spawn(&self, controller: VoiceSessionController) -> SessionSnapshot {
        let session_id = controller.session_id();
        let snapshot = controller.snapshot();
        let (commands, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (status_tx, status) = watch::channel(snapshot.clone());

        self.live
            .write()
            .await
            .insert(session_id, SessionHandle { commands, status });
        tokio::spawn(run_session(controller, command_rx, status_tx, self.clone()));

        info!("Session {session_id} registered");
        snapshot
    }

    pub async fn snapshot(&self, session_id: Uuid) -> Result<SessionSnapshot, AppError> {
        match self.lookup(session_id).await? {
            Lookup::Live(_, status) => Ok(status.borrow().clone()),
            Lookup::Ended(snapshot) => Ok(snapshot),
        }
    }

    /// Delivers one voice event. Events for a session that already ended are
    /// acknowledged as ignored.
    pub async fn deliver(&self, session_id: Uuid, event: VoiceEvent) -> Result<EventAck, AppError> {
        let (commands, mut status) = match self.lookup(session_id).await? {
            Lookup::Live(commands, status) => (commands, status),
            Lookup::Ended(session) => {
                debug!("Session {session_id} already ended; event ignored");
                return Ok(EventAck {
                    outcome: EventOutcome::Ignored,
                    session,
                });
            }
        };
        let (reply_tx, reply_rx) = oneshot::channel();

        let outcome = match commands.send(SessionCommand::Event(event, reply_tx)).await {
            Ok(()) => reply_rx.await.unwrap_or(EventOutcome::Ignored),
            Err(_) => {
                debug!("Session {session_id} already closed; event ignored");
                EventOutcome::Ignored
            }
        };

        let session = status.borrow_and_update().clone();
        Ok(EventAck { outcome, session })
    }

    /// Manual stop. Stopping a session that already ended is a no-op.
    pub async fn stop(&self, session_id: Uuid) -> Result<SessionSnapshot, AppError> {
        let (commands, mut status) = match self.lookup(session_id).await? {
            Lookup::Live(commands, status) => (commands, status),
            Lookup::Ended(snapshot) => return Ok(snapshot),
        };
        let (reply_tx, reply_rx) = oneshot::channel();

        if commands.send(SessionCommand::Stop(reply_tx)).await.is_ok() {
            if let Ok(result) = reply_rx.await {
                result?;
            }
        }

        let snapshot = status.borrow_and_update().clone();
        Ok(snapshot)
    }

    /// Drops a session. A live task tears down its call and exits without
    /// leaving a final snapshot behind.
    pub async fn remove(&self, session_id: Uuid) -> Result<(), AppError> {
        let live = self.live.write().await.remove(&session_id).is_some();
        let ended = self.ended.write().await.remove(&session_id).is_some();
        if !live && !ended {
            return Err(not_found(session_id));
        }
        info!("Session {session_id} removed");
        Ok(())
    }

    async fn lookup(&self, session_id: Uuid) -> Result<Lookup, AppError> {
        if let Some(handle) = self.live.read().await.get(&session_id) {
            return Ok(Lookup::Live(handle.commands.clone(), handle.status.clone()));
        }

        self.evict_expired().await;
        self.ended
            .read()
            .await
            .get(&session_id)
            .map(|ended| Lookup::Ended(ended.snapshot.clone()))
            .ok_or_else(|| not_found(session_id))
    }

    /// Called by a session task on exit. Sessions removed explicitly are gone
    /// already and are not retained.
    async fn retire(&self, session_id: Uuid, snapshot: SessionSnapshot) {
        let was_live = self.live.write().await.remove(&session_id).is_some();
        if was_live {
            self.ended.write().await.insert(
                session_id,
                EndedSession {
                    snapshot,
                    ended_at: Instant::now(),
                },
            );
        }
        self.evict_expired().await;
    }

    async fn evict_expired(&self) {
        let retention = self.retention;
        self.ended
            .write()
            .await
            .retain(|_, ended| ended.ended_at.elapsed() < retention);
    }
}

async fn run_session(
    mut controller: VoiceSessionController,
    mut commands: mpsc::Receiver<SessionCommand>,
    status: watch::Sender<SessionSnapshot>,
    registry: SessionRegistry,
) {
    let session_id = controller.session_id();

    while let Some(command) = commands.recv().await {
        match command {
            SessionCommand::Event(event, reply) => {
                let outcome = controller.handle_event(event).await;
                status.send_replace(controller.snapshot());
                let _ = reply.send(outcome);
            }
            SessionCommand::Stop(reply) => {
                let result = controller.stop().await;
                status.send_replace(controller.snapshot());
                let _ = reply.send(result);
            }
        }

        if controller.is_ended() {
            break;
        }
    }

    // Every sender is gone (session removed) or the session ended.
    controller.teardown().await;
    let snapshot = controller.snapshot();
    status.send_replace(snapshot.clone());
    registry.retire(session_id, snapshot).await;
    debug!("Session {session_id} task exited");
}

fn not_found(session_id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {session_id} not found"))
}
