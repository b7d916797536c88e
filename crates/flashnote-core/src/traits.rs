//! Store and reporter interfaces the pipeline depends on.
//!
//! These traits define the seams to the note/task subsystem, the account
//! store, and the diagnostics channel, enabling in-memory implementations
//! for tests. The pipeline never creates or deletes records — it only
//! reads them and conditionally writes scheduling fields.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Account, NoteRecord, Provenance, Schedule, TaskRecord};

/// Fields written onto a note by a successful commit.
#[derive(Debug, Clone)]
pub struct NoteScheduleUpdate {
    pub schedule: Schedule,
    pub provenance: Provenance,
    /// When present, replaces the note body (model-reformulated text).
    pub body: Option<String>,
}

/// Fields written onto a task by a successful commit.
#[derive(Debug, Clone)]
pub struct TaskScheduleUpdate {
    pub schedule: Schedule,
    pub provenance: Provenance,
    pub description: String,
}

/// Read-only account lookup plus the quota side channel.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fetch an account, `None` if it does not exist.
    async fn fetch(&self, id: Uuid) -> Result<Option<Account>>;

    /// Increment the account's dispatch counter and stamp the time.
    ///
    /// Best-effort: no transactional guarantee. A rare double increment
    /// when two race branches both commit is accepted.
    async fn increment_dispatch_quota(&self, id: Uuid) -> Result<()>;
}

/// Note lookup and schedule write-back.
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn fetch(&self, id: Uuid) -> Result<Option<NoteRecord>>;

    /// Unconditional field write. Callers are responsible for the
    /// re-read-before-write commit guard.
    async fn write_schedule(&self, id: Uuid, update: NoteScheduleUpdate) -> Result<()>;
}

/// Task lookup and schedule write-back.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn fetch(&self, id: Uuid) -> Result<Option<TaskRecord>>;

    async fn write_schedule(&self, id: Uuid, update: TaskScheduleUpdate) -> Result<()>;
}

/// Fire-and-forget diagnostics sink.
///
/// Implementations must never fail the caller: delivery problems are
/// logged and swallowed. Nothing in the pipeline awaits a response.
#[async_trait]
pub trait Reporter: Send + Sync {
    async fn report(&self, title: &str, payload: JsonValue);
}
