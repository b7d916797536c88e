//! In-memory store and reporter implementations.
//!
//! Used by the dispatch tests and by embedders that want the pipeline
//! without a real persistence layer. State lives behind plain mutexes;
//! none of the operations await while holding a lock.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use flashnote_core::{
    Account, AccountStore, Error, NoteRecord, NoteScheduleUpdate, NoteStore, Reporter, Result,
    TaskRecord, TaskScheduleUpdate, TaskStore,
};

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryAccountStore {
    accounts: Mutex<HashMap<Uuid, Account>>,
    increments: Mutex<u32>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, account: Account) {
        self.accounts
            .lock()
            .expect("account lock")
            .insert(account.id, account);
    }

    pub fn get(&self, id: Uuid) -> Option<Account> {
        self.accounts.lock().expect("account lock").get(&id).cloned()
    }

    /// Total quota increments across all accounts.
    pub fn increment_count(&self) -> u32 {
        *self.increments.lock().expect("account lock")
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn fetch(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.accounts.lock().expect("account lock").get(&id).cloned())
    }

    async fn increment_dispatch_quota(&self, id: Uuid) -> Result<()> {
        let mut accounts = self.accounts.lock().expect("account lock");
        let account = accounts
            .get_mut(&id)
            .ok_or_else(|| Error::Store(format!("account not found: {}", id)))?;
        account.quota.dispatch_count += 1;
        account.quota.last_dispatch_at = Some(Utc::now());
        *self.increments.lock().expect("account lock") += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Notes
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryNoteStore {
    notes: Mutex<HashMap<Uuid, NoteRecord>>,
    writes: Mutex<u32>,
}

impl InMemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, note: NoteRecord) {
        self.notes.lock().expect("note lock").insert(note.id, note);
    }

    pub fn get(&self, id: Uuid) -> Option<NoteRecord> {
        self.notes.lock().expect("note lock").get(&id).cloned()
    }

    /// Number of schedule writes that reached the store.
    pub fn write_count(&self) -> u32 {
        *self.writes.lock().expect("note lock")
    }
}

#[async_trait]
impl NoteStore for InMemoryNoteStore {
    async fn fetch(&self, id: Uuid) -> Result<Option<NoteRecord>> {
        Ok(self.notes.lock().expect("note lock").get(&id).cloned())
    }

    async fn write_schedule(&self, id: Uuid, update: NoteScheduleUpdate) -> Result<()> {
        let mut notes = self.notes.lock().expect("note lock");
        let note = notes
            .get_mut(&id)
            .ok_or_else(|| Error::Store(format!("note not found: {}", id)))?;

        let now = Utc::now();
        note.schedule = Some(update.schedule);
        note.provenance = Some(update.provenance);
        if let Some(body) = update.body {
            note.body = body;
            note.edited_at = now;
        }
        note.updated_at = now;

        *self.writes.lock().expect("note lock") += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: Mutex<HashMap<Uuid, TaskRecord>>,
    writes: Mutex<u32>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, task: TaskRecord) {
        self.tasks.lock().expect("task lock").insert(task.id, task);
    }

    pub fn get(&self, id: Uuid) -> Option<TaskRecord> {
        self.tasks.lock().expect("task lock").get(&id).cloned()
    }

    pub fn write_count(&self) -> u32 {
        *self.writes.lock().expect("task lock")
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn fetch(&self, id: Uuid) -> Result<Option<TaskRecord>> {
        Ok(self.tasks.lock().expect("task lock").get(&id).cloned())
    }

    async fn write_schedule(&self, id: Uuid, update: TaskScheduleUpdate) -> Result<()> {
        let mut tasks = self.tasks.lock().expect("task lock");
        let task = tasks
            .get_mut(&id)
            .ok_or_else(|| Error::Store(format!("task not found: {}", id)))?;

        task.schedule = Some(update.schedule);
        task.provenance = Some(update.provenance);
        task.description = update.description;
        task.updated_at = Utc::now();

        *self.writes.lock().expect("task lock") += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Reporter
// ---------------------------------------------------------------------------

/// Captures reports for assertions.
#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<(String, JsonValue)>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<(String, JsonValue)> {
        self.reports.lock().expect("reporter lock").clone()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.lock().expect("reporter lock").is_empty()
    }
}

#[async_trait]
impl Reporter for RecordingReporter {
    async fn report(&self, title: &str, payload: JsonValue) {
        self.reports
            .lock()
            .expect("reporter lock")
            .push((title.to_string(), payload));
    }
}
