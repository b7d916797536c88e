//! Dispatch orchestration: wiring selector → prompts → gateway →
//! extractor → assembler → guarded commit.
//!
//! Two variants share the per-branch chain:
//!
//! - **Concurrent race** (notes): a small fixed number of branches run
//!   the full chain in parallel, each with a distinct worker. All
//!   branches run to completion; a sibling's success never cancels the
//!   others. The dispatch succeeds if any branch committed.
//! - **Sequential retry** (tasks): one branch at a time, retrying once
//!   with the failing model excluded, two attempts total.
//!
//! Nothing here ever propagates an error to the triggering request —
//! every failure collapses into a [`DispatchOutcome`].

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use flashnote_core::{
    storage_model_name, Account, AccountStore, NoteRecord, NoteStore, Provenance, Reporter,
    TaskRecord, TaskStore,
};
use flashnote_core::defaults::{RACE_BRANCHES, SEQUENTIAL_MAX_ATTEMPTS};
use flashnote_inference::{
    build_prompts, parse_directive, ClassificationInput, ClassifierGateway, SelectedWorker,
    WorkerDescriptor, WorkerRegistry,
};
use flashnote_inference::selector::select_worker;

use crate::assemble::{assemble, Assembly};
use crate::commit::{commit_note, commit_task, CommitOutcome};

/// Overall result of one dispatch invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Some branch committed a schedule.
    Committed,
    /// The classifier decided there is nothing to schedule.
    NoOp,
    /// Nothing ran or nothing was left to do (ineligible account, no
    /// usable worker, record already finalized).
    Skipped,
    /// Every branch soft-failed; the record is untouched.
    Failed,
}

/// Result of a single branch. Stale drafts and lost commit races are
/// silent outcomes, distinct from soft failures so the sequential
/// variant can decide what retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BranchOutcome {
    Committed,
    NoOp,
    Stale,
    RaceLost,
    Failed,
}

/// The pipeline with its collaborators. Cloning is cheap; every field
/// is shared.
#[derive(Clone)]
pub struct Dispatcher {
    pub(crate) registry: Arc<WorkerRegistry>,
    pub(crate) gateway: Arc<dyn ClassifierGateway>,
    pub(crate) accounts: Arc<dyn AccountStore>,
    pub(crate) notes: Arc<dyn NoteStore>,
    pub(crate) tasks: Arc<dyn TaskStore>,
    pub(crate) reporter: Arc<dyn Reporter>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<WorkerRegistry>,
        gateway: Arc<dyn ClassifierGateway>,
        accounts: Arc<dyn AccountStore>,
        notes: Arc<dyn NoteStore>,
        tasks: Arc<dyn TaskStore>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            registry,
            gateway,
            accounts,
            notes,
            tasks,
            reporter,
        }
    }

    // -----------------------------------------------------------------------
    // Concurrent race (notes)
    // -----------------------------------------------------------------------

    /// Race up to [`RACE_BRANCHES`] workers against a note.
    pub async fn dispatch_note(
        &self,
        note: &NoteRecord,
        account: &Account,
        message: String,
    ) -> DispatchOutcome {
        self.dispatch_note_at(note, account, message, Utc::now())
            .await
    }

    /// As [`Self::dispatch_note`] with an explicit dispatch start time.
    pub async fn dispatch_note_at(
        &self,
        note: &NoteRecord,
        account: &Account,
        message: String,
        now: DateTime<Utc>,
    ) -> DispatchOutcome {
        let mut excluded: HashSet<String> = HashSet::new();
        let mut branches = Vec::new();

        for branch in 0..RACE_BRANCHES {
            // Each branch gets a distinct worker; siblings' models are
            // excluded up front.
            let Some(selected) = select_worker(&self.registry, &excluded) else {
                break;
            };
            excluded.insert(selected.descriptor.model.clone());

            let this = self.clone();
            let account = account.clone();
            let message = message.clone();
            let note_id = note.id;
            branches.push(tokio::spawn(async move {
                let outcome = this
                    .run_note_branch(note_id, &account, &message, selected, now)
                    .await;
                debug!(branch, outcome = ?outcome, "race branch finished");
                outcome
            }));
        }

        if branches.is_empty() {
            // Registry empty or fully unresolvable. Expected during
            // partial outages, so not reported.
            debug!("no usable workers, skipping note dispatch");
            return DispatchOutcome::Skipped;
        }

        // Losing branches run to completion; their model calls are an
        // accepted redundancy cost.
        let outcomes: Vec<BranchOutcome> = join_all(branches)
            .await
            .into_iter()
            .filter_map(|joined| joined.ok())
            .collect();

        if outcomes.contains(&BranchOutcome::Committed) {
            DispatchOutcome::Committed
        } else if outcomes.contains(&BranchOutcome::NoOp) {
            DispatchOutcome::NoOp
        } else if outcomes.contains(&BranchOutcome::RaceLost) {
            DispatchOutcome::Skipped
        } else {
            DispatchOutcome::Failed
        }
    }

    // -----------------------------------------------------------------------
    // Sequential retry (tasks)
    // -----------------------------------------------------------------------

    /// Classify a task with at most [`SEQUENTIAL_MAX_ATTEMPTS`] workers,
    /// one at a time.
    pub async fn dispatch_task(&self, task: &TaskRecord, account: &Account) -> DispatchOutcome {
        self.dispatch_task_at(task, account, Utc::now()).await
    }

    /// As [`Self::dispatch_task`] with an explicit dispatch start time.
    pub async fn dispatch_task_at(
        &self,
        task: &TaskRecord,
        account: &Account,
        now: DateTime<Utc>,
    ) -> DispatchOutcome {
        let message = task.description.trim().to_string();
        if message.is_empty() {
            return DispatchOutcome::Skipped;
        }

        let mut excluded: HashSet<String> = HashSet::new();
        for attempt in 1..=SEQUENTIAL_MAX_ATTEMPTS {
            let Some(selected) = select_worker(&self.registry, &excluded) else {
                debug!(attempt, "no usable worker for task dispatch");
                return if attempt == 1 {
                    DispatchOutcome::Skipped
                } else {
                    DispatchOutcome::Failed
                };
            };
            excluded.insert(selected.descriptor.model.clone());

            match self
                .run_task_branch(task.id, account, &message, selected, now)
                .await
            {
                BranchOutcome::Committed => return DispatchOutcome::Committed,
                BranchOutcome::NoOp => return DispatchOutcome::NoOp,
                BranchOutcome::RaceLost => return DispatchOutcome::Skipped,
                BranchOutcome::Stale | BranchOutcome::Failed => {
                    debug!(attempt, "task branch soft-failed, excluding model");
                }
            }
        }
        DispatchOutcome::Failed
    }

    // -----------------------------------------------------------------------
    // Shared per-branch chain
    // -----------------------------------------------------------------------

    async fn run_note_branch(
        &self,
        note_id: Uuid,
        account: &Account,
        message: &str,
        selected: SelectedWorker,
        now: DateTime<Utc>,
    ) -> BranchOutcome {
        let draft = match self.classify(message, account, &selected, now).await {
            Err(_) => return BranchOutcome::Failed,
            Ok(Assembly::NoOp) => return BranchOutcome::NoOp,
            Ok(Assembly::Stale) => return BranchOutcome::Stale,
            Ok(Assembly::Draft(draft)) => draft,
        };

        match commit_note(
            self.notes.as_ref(),
            note_id,
            &draft,
            provenance_of(&selected.descriptor),
        )
        .await
        {
            Ok(CommitOutcome::Committed) => {
                self.record_success(account.id).await;
                info!(
                    %note_id,
                    provider = %selected.descriptor.provider,
                    model = %selected.descriptor.model,
                    "note schedule committed"
                );
                BranchOutcome::Committed
            }
            Ok(_) => BranchOutcome::RaceLost,
            Err(e) => {
                warn!(%note_id, error = %e, "note commit failed");
                BranchOutcome::Failed
            }
        }
    }

    async fn run_task_branch(
        &self,
        task_id: Uuid,
        account: &Account,
        message: &str,
        selected: SelectedWorker,
        now: DateTime<Utc>,
    ) -> BranchOutcome {
        let draft = match self.classify(message, account, &selected, now).await {
            Err(_) => return BranchOutcome::Failed,
            Ok(Assembly::NoOp) => return BranchOutcome::NoOp,
            Ok(Assembly::Stale) => return BranchOutcome::Stale,
            Ok(Assembly::Draft(draft)) => draft,
        };

        match commit_task(
            self.tasks.as_ref(),
            task_id,
            &draft,
            provenance_of(&selected.descriptor),
        )
        .await
        {
            Ok(CommitOutcome::Committed) => {
                self.record_success(account.id).await;
                info!(
                    %task_id,
                    provider = %selected.descriptor.provider,
                    model = %selected.descriptor.model,
                    "task schedule committed"
                );
                BranchOutcome::Committed
            }
            Ok(_) => BranchOutcome::RaceLost,
            Err(e) => {
                warn!(%task_id, error = %e, "task commit failed");
                BranchOutcome::Failed
            }
        }
    }

    /// Select → prompt → call → extract → assemble, reporting parse and
    /// validation rejections with enough context for a postmortem.
    async fn classify(
        &self,
        message: &str,
        account: &Account,
        selected: &SelectedWorker,
        now: DateTime<Utc>,
    ) -> flashnote_core::Result<Assembly> {
        let input = ClassificationInput::new(message, now, &account.timezone);
        let prompts = build_prompts(&input);

        let reply = self
            .gateway
            .call(&selected.descriptor, &selected.connection, prompts)
            .await?;

        let directive = match parse_directive(&reply.content) {
            Ok(directive) => directive,
            Err(e) => {
                self.reporter
                    .report(
                        "tagged output rejected",
                        json!({
                            "error": e.to_string(),
                            "raw": reply.content,
                            "provider": selected.descriptor.provider.as_str(),
                            "model": selected.descriptor.model,
                        }),
                    )
                    .await;
                return Err(e);
            }
        };

        match assemble(&directive, now, &account.timezone) {
            Ok(assembly) => Ok(assembly),
            Err(e) => {
                self.reporter
                    .report(
                        "directive failed validation",
                        json!({
                            "error": e.to_string(),
                            "directive": format!("{:?}", directive),
                            "provider": selected.descriptor.provider.as_str(),
                            "model": selected.descriptor.model,
                        }),
                    )
                    .await;
                Err(e)
            }
        }
    }

    /// Quota bump after a committed branch. Best-effort: a failed
    /// increment never un-commits the schedule.
    async fn record_success(&self, account_id: Uuid) {
        if let Err(e) = self.accounts.increment_dispatch_quota(account_id).await {
            warn!(%account_id, error = %e, "dispatch quota increment failed");
        }
    }
}

fn provenance_of(worker: &WorkerDescriptor) -> Provenance {
    Provenance {
        persona: worker.persona.clone(),
        provider: worker.provider.as_str().to_string(),
        model: storage_model_name(&worker.model).to_string(),
    }
}
