//! Structured logging field name constants.
//!
//! All crates use these constants for consistent structured logging
//! fields, so log aggregation tools can query by standardized names
//! across the pipeline.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, branch soft-failed |
//! | INFO  | Lifecycle events, successful commits |
//! | DEBUG | Decision points, call durations, config choices |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "inference", "dispatch"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "selector", "gateway", "extract", "assemble", "commit"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "select", "call", "dispatch_note", "dispatch_task"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Account UUID owning the target record.
pub const ACCOUNT_ID: &str = "account_id";

/// Note UUID being augmented.
pub const NOTE_ID: &str = "note_id";

/// Task UUID being augmented.
pub const TASK_ID: &str = "task_id";

// ─── Worker fields ─────────────────────────────────────────────────────────

/// Computing provider id of the selected worker.
pub const PROVIDER: &str = "provider";

/// Model name of the selected worker.
pub const MODEL: &str = "model";

/// Persona of the selected worker.
pub const PERSONA: &str = "persona";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Attempt number within the sequential dispatcher (1-based).
pub const ATTEMPT: &str = "attempt";

/// Branch index within the race dispatcher (0-based).
pub const BRANCH: &str = "branch";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
