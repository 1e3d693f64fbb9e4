//! Per-document lint sessions.
//!
//! [`Linter::start`] runs the config gate and the lint for one document
//! snapshot on a spawned task. Starting a new session for a document
//! cancels the previous one, so at most one session per document is ever
//! in flight and only the latest can report.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};

use crate::LintError;
use crate::cancel::{CancelSignal, Outcome};
use crate::diagnostic::EngineResult;
use crate::document::{DocumentId, DocumentSnapshot};
use crate::engine::{Engine, EngineExit};
use crate::gate::{ConfigGate, GateVerdict};
use crate::invoker::LintInvoker;
use crate::process::{self, ProcessRun};
use crate::settings::SharedSettings;
use crate::store::{IssueStore, LintRecord};

/// Observable state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    CheckingConfig,
    Linting,
    Completed,
    Failed,
    Canceled,
}

impl SessionState {
    /// Returns true for `Completed`, `Failed` and `Canceled`.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Failed | SessionState::Canceled
        )
    }
}

type SessionTable = Arc<Mutex<HashMap<DocumentId, Arc<SessionShared>>>>;

#[derive(Debug)]
struct SessionShared {
    id: DocumentId,
    generation: u64,
    state: watch::Sender<SessionState>,
    cancel: CancelSignal,
}

impl SessionShared {
    /// Moves to `next` unless a terminal state was already reached.
    fn advance(&self, next: SessionState) -> bool {
        self.state.send_if_modified(|state| {
            if state.is_terminal() {
                return false;
            }
            *state = next;
            true
        })
    }

    fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Cancels the session. Must be called with the session table locked.
    fn cancel_locked(&self) {
        if self.advance(SessionState::Canceled) {
            debug!("Canceled session {} for {}", self.generation, self.id);
        }
        self.cancel.cancel();
    }
}

/// Drops `shared` from the table unless a newer session replaced it.
fn forget(table: &mut HashMap<DocumentId, Arc<SessionShared>>, shared: &SessionShared) {
    if table
        .get(&shared.id)
        .is_some_and(|current| current.generation == shared.generation)
    {
        table.remove(&shared.id);
    }
}

/// A handle to one session.
///
/// Dropping the handle does not cancel the session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    shared: Arc<SessionShared>,
    sessions: SessionTable,
}

impl SessionHandle {
    pub fn id(&self) -> &DocumentId {
        &self.shared.id
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Cancels the session and terminates its subprocess. Idempotent, and a
    /// no-op once the session finished.
    pub fn cancel(&self) {
        let mut sessions = self.sessions.lock();
        self.shared.cancel_locked();
        forget(&mut sessions, &self.shared);
    }

    /// Waits for a terminal state.
    ///
    /// For `Completed` the record is already in the store when this returns;
    /// the callback may still be running.
    pub async fn wait(&self) -> SessionState {
        let mut rx = self.shared.state.subscribe();
        match rx.wait_for(|state| state.is_terminal()).await {
            Ok(state) => *state,
            // The sender lives in `self.shared`, so this is unreachable.
            Err(_) => self.state(),
        }
    }

    /// Waits for a terminal state, canceling the session when `timeout`
    /// expires first.
    pub async fn wait_timeout(&self, timeout: Duration) -> SessionState {
        match tokio::time::timeout(timeout, self.wait()).await {
            Ok(state) => state,
            Err(_) => {
                warn!("Lint of {} timed out after {:?}", self.shared.id, timeout);
                self.cancel();
                self.state()
            }
        }
    }
}

/// Orchestrates lint sessions and owns the issue store.
#[derive(Debug, Clone)]
pub struct Linter {
    settings: SharedSettings,
    store: Arc<IssueStore>,
    sessions: SessionTable,
    next_generation: Arc<AtomicU64>,
}

impl Linter {
    /// Creates a linter that reads `settings` at the start of every session.
    pub fn new(settings: SharedSettings) -> Self {
        Self {
            settings,
            store: Arc::new(IssueStore::new()),
            sessions: Arc::new(Mutex::new(HashMap::new())),
            next_generation: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<IssueStore> {
        &self.store
    }

    /// Starts linting `snapshot`, superseding any session for the same
    /// document.
    ///
    /// `on_complete` is called once with the committed record or the
    /// failure. It is never called for a canceled or superseded session.
    /// Must be called from within a Tokio runtime.
    pub fn start<F>(&self, snapshot: DocumentSnapshot, on_complete: F) -> SessionHandle
    where
        F: FnOnce(Result<Arc<LintRecord>, LintError>) + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let (state, _) = watch::channel(SessionState::Idle);
        let shared = Arc::new(SessionShared {
            id: snapshot.id.clone(),
            generation,
            state,
            cancel: CancelSignal::new(),
        });

        {
            let mut sessions = self.sessions.lock();
            if let Some(previous) = sessions.insert(snapshot.id.clone(), shared.clone()) {
                debug!(
                    "Session {} supersedes session {} for {}",
                    generation, previous.generation, snapshot.id
                );
                previous.cancel_locked();
            }
        }

        let engine = Engine::new(self.settings.get());
        let task = SessionTask {
            shared: shared.clone(),
            sessions: self.sessions.clone(),
            store: self.store.clone(),
        };
        tokio::spawn(task.run(snapshot, engine, on_complete));

        SessionHandle {
            shared,
            sessions: self.sessions.clone(),
        }
    }

    /// Lints `snapshot` and waits for the outcome.
    pub async fn lint(
        &self,
        snapshot: DocumentSnapshot,
    ) -> Result<Outcome<Arc<LintRecord>>, LintError> {
        let (tx, rx) = oneshot::channel();
        let handle = self.start(snapshot, move |result| {
            let _ = tx.send(result);
        });
        // The sender is dropped without sending when the session is canceled.
        match rx.await {
            Ok(result) => result.map(Outcome::Finished),
            Err(_) => {
                debug!("Lint of {} ended as {:?}", handle.id(), handle.state());
                Ok(Outcome::Canceled)
            }
        }
    }

    /// Cancels the in-flight session for `id`. Returns true if there was one.
    pub fn cancel(&self, id: &DocumentId) -> bool {
        let mut sessions = self.sessions.lock();
        match sessions.remove(id) {
            Some(session) => {
                session.cancel_locked();
                true
            }
            None => false,
        }
    }

    /// Cancels every in-flight session.
    pub fn cancel_all(&self) {
        let mut sessions = self.sessions.lock();
        for (_, session) in sessions.drain() {
            session.cancel_locked();
        }
    }

    /// Cancels any session for `id` and forgets its results.
    pub fn close(&self, id: &DocumentId) {
        self.cancel(id);
        self.store.remove(id);
    }

    /// Returns the state of the in-flight session for `id`, if any.
    pub fn session_state(&self, id: &DocumentId) -> Option<SessionState> {
        self.sessions.lock().get(id).map(|session| session.state())
    }

    /// Runs the engine's fix on a file on disk.
    pub async fn fix_file(&self, path: &Path) -> Result<(), LintError> {
        let engine = Engine::new(self.settings.get());
        let program = engine.program();
        let command = engine.command(engine.fix_args(path));
        let limit = engine.settings().max_output_bytes;

        let captured = match process::run(command, &program, None, limit, &CancelSignal::new()).await? {
            ProcessRun::Exited(captured) => captured,
            ProcessRun::Canceled => return Ok(()),
        };

        if !captured.stderr.trim().is_empty() {
            warn!("{}", captured.stderr.trim());
        }
        if EngineExit::from_status(&captured.status).has_report() {
            info!("Fixed {}", path.display());
            Ok(())
        } else {
            Err(LintError::LintFailed {
                code: captured.status.code(),
                stderr: captured.stderr,
            })
        }
    }
}

/// The spawned half of a session.
struct SessionTask {
    shared: Arc<SessionShared>,
    sessions: SessionTable,
    store: Arc<IssueStore>,
}

enum Finish {
    Completed(EngineResult),
    Failed(LintError),
    Canceled,
}

impl SessionTask {
    async fn run<F>(self, snapshot: DocumentSnapshot, engine: Engine, on_complete: F)
    where
        F: FnOnce(Result<Arc<LintRecord>, LintError>),
    {
        let finish = match self.lint(&snapshot, &engine).await {
            Ok(Outcome::Finished(result)) => Finish::Completed(result),
            Ok(Outcome::Canceled) => Finish::Canceled,
            // Whatever a terminated engine reported is noise.
            Err(_) if self.shared.cancel.is_cancelled() => Finish::Canceled,
            Err(e) => Finish::Failed(e),
        };

        if let Some(result) = self.settle(finish) {
            on_complete(result);
        }
    }

    async fn lint(
        &self,
        snapshot: &DocumentSnapshot,
        engine: &Engine,
    ) -> Result<Outcome<EngineResult>, LintError> {
        let cancel = &self.shared.cancel;

        if !self.shared.advance(SessionState::CheckingConfig) {
            return Ok(Outcome::Canceled);
        }
        let verdict = match ConfigGate::new(engine)
            .check(&snapshot.syntax, snapshot.path(), cancel)
            .await?
        {
            Outcome::Finished(verdict) => verdict,
            Outcome::Canceled => return Ok(Outcome::Canceled),
        };
        if let GateVerdict::Unsatisfied { plugin } = verdict {
            return Err(LintError::missing_plugin(plugin, snapshot.syntax.as_str()));
        }

        if !self.shared.advance(SessionState::Linting) {
            return Ok(Outcome::Canceled);
        }
        LintInvoker::new(engine)
            .run(
                &snapshot.text,
                snapshot.path(),
                engine.settings().config_path.as_deref(),
                cancel,
            )
            .await
    }

    /// Moves to the terminal state and commits under the session table
    /// lock. Returns what to report, if this session still may report.
    fn settle(&self, finish: Finish) -> Option<Result<Arc<LintRecord>, LintError>> {
        let shared = &self.shared;
        let mut sessions = self.sessions.lock();
        forget(&mut sessions, shared);

        if shared.state().is_terminal() {
            debug!("Session {} for {} was superseded", shared.generation, shared.id);
            return None;
        }

        match finish {
            Finish::Completed(result) => {
                let record = self.store.set(&shared.id, result);
                shared.advance(SessionState::Completed);
                debug!("Session {} for {} completed", shared.generation, shared.id);
                Some(Ok(record))
            }
            Finish::Failed(e) => {
                shared.advance(SessionState::Failed);
                warn!("Lint of {} failed: {}", shared.id, e);
                Some(Err(e))
            }
            Finish::Canceled => {
                shared.advance(SessionState::Canceled);
                None
            }
        }
    }
}
