//! Guarded commit of an [`EventDraft`] onto a target record.
//!
//! Mutual exclusion between redundant branches is optimistic: re-read
//! the record immediately before writing and short-circuit if another
//! branch (or the user) already finalized it. First successful write
//! wins; no locks, no transactions.

use tracing::debug;
use uuid::Uuid;

use flashnote_core::{
    EventDraft, NoteScheduleUpdate, NoteStore, Provenance, RecordState, Result, Schedule,
    TaskScheduleUpdate, TaskStore,
};

/// What happened at the commit point. Only `Committed` mutated anything;
/// the other outcomes are silent no-ops, never errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// The record already carries scheduling fields — another branch or
    /// an earlier dispatch finalized it.
    AlreadyScheduled,
    /// The record is gone or no longer active.
    Missing,
}

fn schedule_of(draft: &EventDraft) -> Schedule {
    Schedule {
        calendar_stamp: draft.calendar_stamp,
        remind_stamp: draft.remind_stamp,
        reminder: draft.reminder,
    }
}

/// Re-read and conditionally write a note's scheduling fields.
pub async fn commit_note(
    store: &dyn NoteStore,
    note_id: Uuid,
    draft: &EventDraft,
    provenance: Provenance,
) -> Result<CommitOutcome> {
    let Some(note) = store.fetch(note_id).await? else {
        debug!(%note_id, "note vanished before commit");
        return Ok(CommitOutcome::Missing);
    };
    if note.state != RecordState::Active {
        return Ok(CommitOutcome::Missing);
    }
    if note.schedule.is_some() {
        debug!(%note_id, "note already scheduled, skipping commit");
        return Ok(CommitOutcome::AlreadyScheduled);
    }

    store
        .write_schedule(
            note_id,
            NoteScheduleUpdate {
                schedule: schedule_of(draft),
                provenance,
                body: draft.body_override.clone(),
            },
        )
        .await?;
    Ok(CommitOutcome::Committed)
}

/// Re-read and conditionally write a task's scheduling fields.
pub async fn commit_task(
    store: &dyn TaskStore,
    task_id: Uuid,
    draft: &EventDraft,
    provenance: Provenance,
) -> Result<CommitOutcome> {
    let Some(task) = store.fetch(task_id).await? else {
        debug!(%task_id, "task vanished before commit");
        return Ok(CommitOutcome::Missing);
    };
    if task.state != RecordState::Active {
        return Ok(CommitOutcome::Missing);
    }
    if task.schedule.is_some() {
        debug!(%task_id, "task already scheduled, skipping commit");
        return Ok(CommitOutcome::AlreadyScheduled);
    }

    store
        .write_schedule(
            task_id,
            TaskScheduleUpdate {
                schedule: schedule_of(draft),
                provenance,
                description: draft.description.clone(),
            },
        )
        .await?;
    Ok(CommitOutcome::Committed)
}
