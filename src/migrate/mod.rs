//! Preview migration engine.
//!
//! Pipeline: `CandidateScanner` -> `DestinationGrouper` -> `MigrationExecutor`,
//! with a `ResourceGuard` and a `CancelSource` polled between batches and a
//! `ProgressSink` told about every batch. `controller::run_migration` wires
//! them together behind the run lock and the operator prompt.

pub mod controller;
pub mod executor;
pub mod grouper;
pub mod guard;
pub mod layout;
pub mod lock;
pub mod progress;
pub mod prompt;
pub mod record;
pub mod scanner;

pub use controller::{MigrationRun, RunOutcome, run_migration};
pub use executor::{ExitOutcome, MigrationExecutor, MigrationMode, RunReport, RunStats};
pub use grouper::{DestinationGrouper, group, group_records};
pub use guard::{MemoryGuard, MemoryLimit, MemoryMeasure, ResourceGuard, SAFETY_MARGIN_BYTES};
pub use layout::{DEFAULT_LEGACY_MARKER, DEFAULT_PREVIEW_ROOT, PreviewLayout};
pub use lock::RunLock;
pub use progress::{NullProgress, ProgressSink, TerminalProgress};
pub use prompt::{AssumeYes, Prompt, StdinPrompt};
pub use record::{FileId, MigrationBatch, PreviewRecord};
pub use scanner::{CandidateScanner, LegacyTreeScanner, RecordListScanner, ScanSummary};
