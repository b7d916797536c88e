//! Entry hooks: the points where the note and task subsystems hand a
//! freshly written record to the pipeline.
//!
//! Both hooks run after the triggering write has already been
//! acknowledged to its caller, so nothing here may surface an error —
//! ineligible or unusable situations simply skip.

use tracing::{debug, warn};
use uuid::Uuid;

use flashnote_core::defaults::FREE_DISPATCH_LIMIT;
use flashnote_core::{Account, AccountState, NoteRecord, RecordState, TaskRecord};

use crate::dispatch::{DispatchOutcome, Dispatcher};

/// Flags passed by the note subsystem when posting.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoteHookOptions {
    /// The caller asked for this note to stay out of automation.
    pub disable_automation: bool,
}

impl Dispatcher {
    /// A note was posted. Race-classify it unless the account or note is
    /// ineligible.
    pub async fn on_note_posted(
        &self,
        note_id: Uuid,
        options: NoteHookOptions,
    ) -> DispatchOutcome {
        let note = match self.notes.fetch(note_id).await {
            Ok(Some(note)) => note,
            Ok(None) => {
                debug!(%note_id, "note not found, skipping");
                return DispatchOutcome::Skipped;
            }
            Err(e) => {
                warn!(%note_id, error = %e, "note fetch failed");
                return DispatchOutcome::Skipped;
            }
        };
        if note.state != RecordState::Active {
            return DispatchOutcome::Skipped;
        }

        let Some(account) = self.eligible_account(note.owner).await else {
            return DispatchOutcome::Skipped;
        };

        if options.disable_automation {
            debug!(%note_id, "automation disabled by caller");
            return DispatchOutcome::Skipped;
        }
        if note.schedule.is_some() {
            debug!(%note_id, "note already scheduled");
            return DispatchOutcome::Skipped;
        }

        let Some(message) = note_message(&note) else {
            debug!(%note_id, "nothing classifiable in note");
            return DispatchOutcome::Skipped;
        };

        self.dispatch_note(&note, &account, message).await
    }

    /// A task was updated. Sequentially classify its description.
    pub async fn on_task_updated(&self, task: &TaskRecord) -> DispatchOutcome {
        if task.state != RecordState::Active {
            return DispatchOutcome::Skipped;
        }
        let Some(account) = self.eligible_account(task.owner).await else {
            return DispatchOutcome::Skipped;
        };

        self.dispatch_task(task, &account).await
    }

    /// Shared account eligibility: must exist, be active, and have free
    /// quota (or a subscription).
    async fn eligible_account(&self, account_id: Uuid) -> Option<Account> {
        let account = match self.accounts.fetch(account_id).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                debug!(%account_id, "account not found, skipping");
                return None;
            }
            Err(e) => {
                warn!(%account_id, error = %e, "account fetch failed");
                return None;
            }
        };
        if account.state != AccountState::Normal {
            return None;
        }
        if account.quota.dispatch_count >= FREE_DISPATCH_LIMIT && !account.subscribed {
            debug!(%account_id, "free dispatch quota exhausted");
            return None;
        }
        Some(account)
    }
}

/// Derive the classified message from a note.
///
/// The body participates only when it is a single paragraph; longer
/// notes classify on their title alone. A note with neither yields
/// nothing to classify.
pub fn note_message(note: &NoteRecord) -> Option<String> {
    let title = note.title.trim();
    let body = note.body.trim();
    let single_paragraph = !body.is_empty() && !body.contains('\n');

    match (title.is_empty(), single_paragraph) {
        (false, true) => Some(format!("{}\n{}", title, body)),
        (false, false) => Some(title.to_string()),
        (true, true) => Some(body.to_string()),
        (true, false) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn note(title: &str, body: &str) -> NoteRecord {
        NoteRecord {
            id: Uuid::new_v4(),
            owner: Uuid::new_v4(),
            title: title.to_string(),
            body: body.to_string(),
            state: RecordState::Active,
            schedule: None,
            provenance: None,
            edited_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn title_and_single_paragraph_join() {
        let msg = note_message(&note("买菜", "周六上午去超市")).unwrap();
        assert_eq!(msg, "买菜\n周六上午去超市");
    }

    #[test]
    fn multi_paragraph_body_falls_back_to_title() {
        let msg = note_message(&note("买菜", "第一段\n第二段")).unwrap();
        assert_eq!(msg, "买菜");
    }

    #[test]
    fn body_alone_is_used_when_title_empty() {
        let msg = note_message(&note("", "一小时后，提醒我去拿快递")).unwrap();
        assert_eq!(msg, "一小时后，提醒我去拿快递");
    }

    #[test]
    fn empty_title_and_multi_paragraph_body_yield_nothing() {
        assert!(note_message(&note("", "第一段\n第二段")).is_none());
    }

    #[test]
    fn empty_note_yields_nothing() {
        assert!(note_message(&note("", "")).is_none());
    }
}
