//! # flashnote-inference
//!
//! Worker registry, provider adapters, and the model gateway for the
//! flashnote classification pipeline.
//!
//! This crate provides:
//! - The configured worker pool and shuffle-then-scan selection
//! - Prompt construction for the schedule classifier
//! - Per-provider request adapters (strategy objects, one per quirk)
//! - The bounded-timeout chat-completion gateway
//! - The tagged-output extractor producing [`flashnote_core::Directive`]
//! - A scripted mock gateway for dispatch tests

pub mod adapter;
pub mod extract;
pub mod gateway;
pub mod mock;
pub mod prompt;
pub mod registry;
pub mod selector;

// Re-export core types
pub use flashnote_core::*;

pub use adapter::{adapter_for, AdaptedRequest, ProviderAdapter};
pub use extract::parse_directive;
pub use gateway::{ChatMessage, ClassifierGateway, HttpGateway, RawReply};
pub use mock::MockGateway;
pub use prompt::{build_prompts, ClassificationInput};
pub use registry::{default_workers, ConnectionConfig, Provider, WorkerDescriptor, WorkerRegistry};
pub use selector::{select_worker, SelectedWorker};
