//! # flashnote-core
//!
//! Core types, traits, and abstractions for the flashnote scheduling
//! pipeline.
//!
//! This crate provides:
//! - The shared error taxonomy ([`Error`], [`Result`])
//! - The pipeline data model (directives, event drafts, target records)
//! - Store and reporter traits the dispatch layer is wired against
//! - Timezone resolution with fixed-offset fallback
//! - Centralized default constants and structured-logging field names

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod timezone;
pub mod traits;

pub use error::{Error, Result};
pub use models::{
    Account, AccountState, Direction, Directive, EventDraft, LaterOption, NoteRecord, Provenance,
    Quota, RecordState, RelativeDay, ReminderPolicy, Schedule, TaskRecord,
};
pub use models::storage_model_name;
pub use timezone::LocalZone;
pub use traits::{
    AccountStore, NoteScheduleUpdate, NoteStore, Reporter, TaskScheduleUpdate, TaskStore,
};
