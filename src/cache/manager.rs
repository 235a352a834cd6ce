//! The sync cache: one instance owns the document, the session, and the
//! flush scheduler for the lifetime of a host session.
//!
//! All state lives here - no ambient globals. The host constructs a
//! `SyncCache` at session start, drives its flush deadlines from its event
//! loop (`next_flush_deadline` / `poll_flush`), routes page-lifecycle
//! signals into `handle_lifecycle`, and tears the instance down at logout.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::RemoteStore;
use crate::auth::{FreshnessWindow, Session, SessionIdentity};
use crate::config::SyncConfig;
use crate::models::document::{delete_by_id, update_by_id};
use crate::models::{
    ActivityEntry, CalendarEvent, ClassEntry, Document, Flashcard, Note, PomodoroSession,
    PomodoroSettings, PomodoroStats, RecordId, StudyTask, Todo, UserProfile,
};
use crate::storage::{KeyValueStorage, DARK_MODE_KEY};

use super::FlushScheduler;

/// How a flush reaches the remote store.
///
/// `Normal` awaits the write and logs failure. `Beacon` hands the payload
/// to a fire-and-forget send that survives host teardown. Both go through
/// the scheduler's single claim step, so one flush is never sent twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Normal,
    Beacon,
}

/// Host page-lifecycle signals. Every one of them forces a beacon flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Hide,
    Unload,
    Navigate,
    VisibilityHidden,
}

pub struct SyncCache<S: RemoteStore> {
    store: Arc<S>,
    storage: Box<dyn KeyValueStorage>,
    session: Session,
    document: Document,
    document_loaded: bool,
    document_freshness: FreshnessWindow,
    scheduler: FlushScheduler,
    ready_tx: watch::Sender<Option<bool>>,
}

impl<S: RemoteStore> SyncCache<S> {
    pub fn new(config: &SyncConfig, store: Arc<S>, storage: Box<dyn KeyValueStorage>) -> Self {
        let mut session = Session::new(config.identity_ttl());
        session.restore(storage.as_ref());

        let (ready_tx, _) = watch::channel(None);

        Self {
            store,
            storage,
            session,
            document: Document::default(),
            document_loaded: false,
            document_freshness: FreshnessWindow::new(config.document_ttl()),
            scheduler: FlushScheduler::new(config.debounce(), config.max_delay()),
            ready_tx,
        }
    }

    // ========================================================================
    // Readiness
    // ========================================================================

    /// Run the initial verify (and document load, if authenticated) once and
    /// publish the settled outcome on the readiness channel.
    pub async fn initialize(&mut self) -> bool {
        let authenticated = self.verify().await.is_some();
        let _ = self.ready_tx.send(Some(authenticated));
        authenticated
    }

    /// Readiness signal: `None` until `initialize` settles, then
    /// `Some(authenticated)`. Late subscribers see the settled value.
    pub fn subscribe_ready(&self) -> watch::Receiver<Option<bool>> {
        self.ready_tx.subscribe()
    }

    pub fn is_ready(&self) -> bool {
        self.ready_tx.borrow().is_some()
    }

    // ========================================================================
    // Identity
    // ========================================================================

    /// Check the session, trusting a cached verification inside its TTL.
    ///
    /// Only an explicit rejection from the remote store destroys the
    /// session; transient failures fall back to the cached identity.
    pub async fn verify(&mut self) -> Option<UserProfile> {
        if self.session.is_fresh() {
            debug!("Cached identity is fresh, skipping verify call");
            return self.session.user().cloned();
        }

        let token = match self.session.token() {
            Some(token) => token.to_string(),
            None => return None,
        };

        match self.store.verify(&token).await {
            Ok(user) => {
                self.session.refresh_user(user.clone(), self.storage.as_mut());
                if !self.document_loaded {
                    if let Err(e) = self.load_document(false).await {
                        warn!(error = %e, "Document load after verify failed");
                    }
                }
                Some(user)
            }
            Err(e) if e.is_auth_rejection() => {
                info!(error = %e, "Credential rejected by remote store, clearing session");
                self.session.clear(self.storage.as_mut());
                self.reset_document();
                None
            }
            Err(e) => {
                // Transient infrastructure failure is not proof of an
                // invalid credential.
                warn!(error = %e, "Verify failed, falling back to cached identity");
                self.session.user().cloned()
            }
        }
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<UserProfile> {
        let auth = self.store.login(email, password).await?;
        let user = auth.user.clone();
        self.session.replace(
            SessionIdentity {
                token: auth.token,
                user: auth.user,
            },
            self.storage.as_mut(),
        );
        // A fresh principal may not match whatever stale document we have.
        self.load_document(true).await?;
        info!(email, "Logged in");
        Ok(user)
    }

    pub async fn register(
        &mut self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<UserProfile> {
        let auth = self
            .store
            .register(email, password, first_name, last_name)
            .await?;
        let user = auth.user.clone();
        self.session.replace(
            SessionIdentity {
                token: auth.token,
                user: auth.user,
            },
            self.storage.as_mut(),
        );
        self.load_document(true).await?;
        info!(email, "Registered");
        Ok(user)
    }

    /// Tear the session down: best-effort remote logout, then a destructive
    /// local reset of identity, persisted keys, document, and timers.
    pub async fn logout(&mut self) {
        if let Some(token) = self.session.token().map(str::to_string) {
            if let Err(e) = self.store.logout(&token).await {
                debug!(error = %e, "Remote logout failed, clearing locally anyway");
            }
        }
        self.session.clear(self.storage.as_mut());
        self.reset_document();
        info!("Logged out");
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    pub fn current_user(&self) -> Option<&UserProfile> {
        self.session.user()
    }

    // ========================================================================
    // Document load
    // ========================================================================

    /// Fetch the document from the remote store, unless a loaded copy is
    /// still inside its freshness window and `force` is false.
    pub async fn load_document(&mut self, force: bool) -> Result<()> {
        if !force && self.document_loaded && self.document_freshness.is_fresh() {
            debug!("Cached document is fresh, skipping load");
            return Ok(());
        }

        let token = self
            .session
            .token()
            .ok_or_else(|| anyhow::anyhow!("Cannot load document without a session"))?
            .to_string();

        let document = self.store.read_document(&token).await?;
        self.document = document;
        self.document_loaded = true;
        self.document_freshness.stamp();
        // A freshly loaded document is by definition not dirty.
        self.scheduler.reset();

        // Keep the denormalized theme flag in step so the next startup can
        // apply it before any load completes.
        let dark = self.document.settings.dark_mode;
        self.storage
            .set(DARK_MODE_KEY, if dark { "true" } else { "false" });

        debug!("Document loaded");
        Ok(())
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    fn reset_document(&mut self) {
        self.document = Document::default();
        self.document_loaded = false;
        self.document_freshness.reset();
        self.scheduler.reset();
    }

    // ========================================================================
    // Flushing
    // ========================================================================

    /// Deadline for the next scheduled flush, for hosts that want to sleep
    /// precisely instead of polling.
    pub fn next_flush_deadline(&self) -> Option<Instant> {
        self.scheduler.deadline()
    }

    pub fn is_dirty(&self) -> bool {
        self.scheduler.is_dirty()
    }

    /// Drive the timers from the host event loop: flushes when a deadline
    /// has passed, no-ops otherwise.
    pub async fn poll_flush(&mut self) {
        self.poll_flush_at(Instant::now()).await;
    }

    pub async fn poll_flush_at(&mut self, now: Instant) {
        if self.scheduler.is_due(now) {
            self.flush_now(Transport::Normal).await;
        }
    }

    /// Cancel the timers and flush immediately through the given transport.
    /// When nothing is pending this issues zero network calls.
    pub async fn flush_now(&mut self, transport: Transport) {
        match transport {
            Transport::Beacon => self.flush_beacon(),
            Transport::Normal => {
                // Token first: a flush with no session must leave the dirty
                // state in place so a later login can still push the edits.
                let Some(token) = self.flush_token() else {
                    return;
                };
                if !self.scheduler.claim() {
                    return;
                }
                self.document.last_sync = Some(Utc::now());
                if let Err(e) = self.store.write_document(&token, &self.document).await {
                    // The claim already cleared the dirty flag, so this write
                    // is lost until the next mutation schedules another
                    // flush. Accepted at-most-once-per-trigger gap.
                    warn!(error = %e, "Document write failed");
                }
            }
        }
    }

    /// Synchronous teardown flush: claims the pending mutation and hands the
    /// document to the fire-and-forget transport. Safe to call where an
    /// awaited request would be cancelled by the host going away.
    pub fn flush_beacon(&mut self) {
        let Some(token) = self.flush_token() else {
            return;
        };
        if !self.scheduler.claim() {
            return;
        }
        self.document.last_sync = Some(Utc::now());
        self.store.send_beacon(&token, &self.document);
    }

    /// Page-lifecycle signals all force an immediate beacon flush.
    pub fn handle_lifecycle(&mut self, event: LifecycleEvent) {
        debug!(event = ?event, "Lifecycle signal, forcing flush");
        self.flush_beacon();
    }

    fn flush_token(&self) -> Option<String> {
        let token = self.session.token();
        if token.is_none() {
            debug!("No session, leaving pending mutation for a later flush");
        }
        token.map(str::to_string)
    }

    // ========================================================================
    // Mutators
    //
    // Every mutator below touches the shared document and marks the
    // scheduler dirty. Update/delete on an unknown identifier are no-ops
    // that leave the document clean.
    // ========================================================================

    fn mark_dirty(&mut self) {
        self.scheduler.mark_dirty();
    }

    // ===== Flashcards =====

    pub fn flashcards(&self) -> &[Flashcard] {
        &self.document.flashcards
    }

    pub fn set_flashcards(&mut self, flashcards: Vec<Flashcard>) {
        self.document.flashcards = flashcards;
        self.mark_dirty();
    }

    pub fn add_flashcard(&mut self, card: Flashcard) {
        self.document.flashcards.push(card);
        self.mark_dirty();
    }

    pub fn update_flashcard(&mut self, card: Flashcard) {
        if update_by_id(&mut self.document.flashcards, card) {
            self.mark_dirty();
        }
    }

    pub fn delete_flashcard(&mut self, id: &RecordId) {
        if delete_by_id(&mut self.document.flashcards, id) {
            self.mark_dirty();
        }
    }

    // ===== Todos =====

    pub fn todos(&self) -> &[Todo] {
        &self.document.todos
    }

    pub fn set_todos(&mut self, todos: Vec<Todo>) {
        self.document.todos = todos;
        self.mark_dirty();
    }

    pub fn add_todo(&mut self, todo: Todo) {
        self.document.todos.push(todo);
        self.mark_dirty();
    }

    pub fn update_todo(&mut self, todo: Todo) {
        if update_by_id(&mut self.document.todos, todo) {
            self.mark_dirty();
        }
    }

    pub fn delete_todo(&mut self, id: &RecordId) {
        if delete_by_id(&mut self.document.todos, id) {
            self.mark_dirty();
        }
    }

    // ===== Notes =====

    pub fn notes(&self) -> &[Note] {
        &self.document.notes
    }

    pub fn set_notes(&mut self, notes: Vec<Note>) {
        self.document.notes = notes;
        self.mark_dirty();
    }

    pub fn add_note(&mut self, note: Note) {
        self.document.notes.push(note);
        self.mark_dirty();
    }

    pub fn update_note(&mut self, note: Note) {
        if update_by_id(&mut self.document.notes, note) {
            self.mark_dirty();
        }
    }

    pub fn delete_note(&mut self, id: &RecordId) {
        if delete_by_id(&mut self.document.notes, id) {
            self.mark_dirty();
        }
    }

    // ===== Classes =====

    pub fn classes(&self) -> &[ClassEntry] {
        &self.document.classes
    }

    pub fn set_classes(&mut self, classes: Vec<ClassEntry>) {
        self.document.classes = classes;
        self.mark_dirty();
    }

    pub fn add_class(&mut self, class: ClassEntry) {
        self.document.classes.push(class);
        self.mark_dirty();
    }

    pub fn update_class(&mut self, class: ClassEntry) {
        if update_by_id(&mut self.document.classes, class) {
            self.mark_dirty();
        }
    }

    pub fn delete_class(&mut self, id: &RecordId) {
        if delete_by_id(&mut self.document.classes, id) {
            self.mark_dirty();
        }
    }

    // ===== Events =====

    pub fn events(&self) -> &[CalendarEvent] {
        &self.document.events
    }

    pub fn set_events(&mut self, events: Vec<CalendarEvent>) {
        self.document.events = events;
        self.mark_dirty();
    }

    pub fn add_event(&mut self, event: CalendarEvent) {
        self.document.events.push(event);
        self.mark_dirty();
    }

    pub fn update_event(&mut self, event: CalendarEvent) {
        if update_by_id(&mut self.document.events, event) {
            self.mark_dirty();
        }
    }

    pub fn delete_event(&mut self, id: &RecordId) {
        if delete_by_id(&mut self.document.events, id) {
            self.mark_dirty();
        }
    }

    // ===== Tasks =====

    pub fn tasks(&self) -> &[StudyTask] {
        &self.document.tasks
    }

    pub fn set_tasks(&mut self, tasks: Vec<StudyTask>) {
        self.document.tasks = tasks;
        self.mark_dirty();
    }

    pub fn add_task(&mut self, task: StudyTask) {
        self.document.tasks.push(task);
        self.mark_dirty();
    }

    pub fn update_task(&mut self, task: StudyTask) {
        if update_by_id(&mut self.document.tasks, task) {
            self.mark_dirty();
        }
    }

    pub fn delete_task(&mut self, id: &RecordId) {
        if delete_by_id(&mut self.document.tasks, id) {
            self.mark_dirty();
        }
    }

    // ===== Pomodoro =====

    pub fn set_pomodoro_stats(&mut self, stats: PomodoroStats) {
        self.document.pomodoro_stats = stats;
        self.mark_dirty();
    }

    pub fn add_pomodoro_session(&mut self, session: PomodoroSession) {
        self.document.pomodoro_sessions.push(session);
        self.mark_dirty();
    }

    pub fn set_pomodoro_settings(&mut self, settings: PomodoroSettings) {
        self.document.pomodoro_settings = settings;
        self.mark_dirty();
    }

    // ===== Activity log =====

    pub fn log_activity(&mut self, entry: ActivityEntry) {
        self.document.activity_log.push(entry);
        self.mark_dirty();
    }

    // ===== Settings =====

    /// The theme flag is denormalized into persistent storage so a restarted
    /// host can apply it before the document has loaded.
    pub fn dark_mode(&self) -> bool {
        match self.storage.get(DARK_MODE_KEY) {
            Some(value) => value == "true",
            None => self.document.settings.dark_mode,
        }
    }

    pub fn set_dark_mode(&mut self, enabled: bool) {
        self.storage
            .set(DARK_MODE_KEY, if enabled { "true" } else { "false" });
        self.document.settings.dark_mode = enabled;
        self.mark_dirty();
    }
}

impl SyncCache<crate::api::ApiClient> {
    /// Production wiring: reqwest-backed store with the configured timeout
    /// and file-backed persistent storage.
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        let client =
            crate::api::ApiClient::with_timeout(config.api_url.clone(), config.request_timeout())?;
        let storage = crate::storage::FileStorage::new()?;
        Ok(Self::new(config, Arc::new(client), Box::new(storage)))
    }
}

// ============================================================================
// Tests
// ============================================================================
