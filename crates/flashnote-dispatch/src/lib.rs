//! # flashnote-dispatch
//!
//! Event assembly and dispatch orchestration for the flashnote
//! classification pipeline.
//!
//! This crate provides:
//! - The event assembler resolving directives into committable drafts
//! - The guarded, at-most-once schedule commit
//! - The two dispatch orchestrators (concurrent race for notes,
//!   sequential retry for tasks) and their entry hooks
//! - The diagnostic webhook reporter
//! - In-memory store implementations for tests and embedders
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use flashnote_dispatch::{Dispatcher, NoteHookOptions, WebhookReporter};
//! use flashnote_inference::{HttpGateway, WorkerRegistry};
//!
//! let dispatcher = Dispatcher::new(
//!     Arc::new(WorkerRegistry::from_env()),
//!     Arc::new(HttpGateway::new()?),
//!     accounts,
//!     notes,
//!     tasks,
//!     Arc::new(WebhookReporter::from_env()?),
//! );
//!
//! // After the note write is acknowledged:
//! dispatcher.on_note_posted(note_id, NoteHookOptions::default()).await;
//! ```

pub mod assemble;
pub mod commit;
pub mod dispatch;
pub mod hooks;
pub mod memory;
pub mod report;

// Re-export core types
pub use flashnote_core::*;

pub use assemble::{assemble, Assembly};
pub use commit::{commit_note, commit_task, CommitOutcome};
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use hooks::{note_message, NoteHookOptions};
pub use memory::{
    InMemoryAccountStore, InMemoryNoteStore, InMemoryTaskStore, RecordingReporter,
};
pub use report::WebhookReporter;
