//! Run controller: lock, summarize, confirm, then stream scan -> group -> execute.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::output as out;
use crate::shutdown::CancelSource;
use crate::store::ObjectStore;

use super::executor::{ExitOutcome, MigrationExecutor, MigrationMode, RunReport, RunStats};
use super::grouper::group;
use super::guard::ResourceGuard;
use super::layout::PreviewLayout;
use super::lock::RunLock;
use super::progress::ProgressSink;
use super::prompt::Prompt;
use super::scanner::{CandidateScanner, ScanSummary};

/// Everything one migration run works against.
pub struct MigrationRun<'a> {
    /// Local root of the store; the run lock lives here.
    pub storage_root: &'a Path,
    pub store: &'a dyn ObjectStore,
    pub layout: &'a PreviewLayout,
    pub scanner: &'a dyn CandidateScanner,
    pub guard: &'a dyn ResourceGuard,
    pub cancel: &'a dyn CancelSource,
    pub mode: MigrationMode,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The operator answered no; nothing was touched.
    Declined,
    Finished(RunReport),
}

impl RunOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::Declined => 0,
            RunOutcome::Finished(report) => report.outcome.exit_code(),
        }
    }
}

/// Run one migration. The prompt is always consulted before anything changes;
/// batch mode passes `AssumeYes`.
pub fn run_migration(
    run: &MigrationRun<'_>,
    prompt: &mut dyn Prompt,
    progress: &mut dyn ProgressSink,
) -> Result<RunOutcome> {
    let lock = RunLock::acquire(run.storage_root)?;
    info!(lock = %lock.path().display(), "Run lock acquired");

    let summary = run.scanner.summary().context("count legacy previews")?;
    out::print_info(&describe(&summary, run.mode));
    if summary.is_empty() {
        out::print_success("Nothing to migrate.");
        return Ok(RunOutcome::Finished(RunReport {
            outcome: ExitOutcome::Completed,
            stats: RunStats::default(),
        }));
    }

    let question = match (run.mode, run.dry_run) {
        (_, true) => "Walk through the migration without changing anything?",
        (MigrationMode::Move, false) => "Migrate these previews now?",
        (MigrationMode::Delete, false) => "Delete these previews now? They are regenerated on demand.",
    };
    if !prompt.confirm(question).context("read confirmation")? {
        info!("Migration declined by operator");
        return Ok(RunOutcome::Declined);
    }

    progress.start(summary.groups);
    let records = run.scanner.scan().context("scan legacy previews")?;
    let report = MigrationExecutor::new(run.store, run.layout)
        .with_mode(run.mode)
        .with_dry_run(run.dry_run)
        .run(group(records), run.guard, run.cancel, progress)?;

    info!(
        outcome = ?report.outcome,
        batches = report.stats.batches,
        moved = report.stats.objects_moved,
        deleted = report.stats.objects_deleted,
        dirs_removed = report.stats.dirs_removed,
        "Migration run finished"
    );
    drop(lock);
    Ok(RunOutcome::Finished(report))
}

fn describe(summary: &ScanSummary, mode: MigrationMode) -> String {
    let verb = match mode {
        MigrationMode::Move => "migrated",
        MigrationMode::Delete => "deleted",
    };
    format!(
        "{} preview file(s) for {} source file(s) in {} folder(s) need to be {verb}.",
        summary.previews, summary.source_files, summary.groups
    )
}
