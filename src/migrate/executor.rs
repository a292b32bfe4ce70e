//! Batch migration executor.
//!
//! For each batch: move every record from its legacy location to its stored
//! path (creating the destination folder on demand), then delete the emptied
//! legacy folder chain bottom-up. Between batches the cancellation source and
//! the resource guard are polled; a stop is only ever taken at a batch
//! boundary, so every started batch is finished and reclaimed.
//!
//! Failures other than a missing destination folder are fatal: the run stops
//! and the current batch may be left partially migrated. The next run's scan
//! picks up whatever is still in the legacy layout.

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::errors::MigrateError;
use crate::shutdown::CancelSource;
use crate::store::{ObjectStore, StorePath};

use super::guard::ResourceGuard;
use super::layout::PreviewLayout;
use super::progress::ProgressSink;
use super::record::MigrationBatch;

/// How a run ended without a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Completed,
    CancelledCleanly,
    AbortedOnResource,
}

impl ExitOutcome {
    /// Process exit status: only a resource abort is a failure.
    pub fn exit_code(self) -> u8 {
        match self {
            ExitOutcome::Completed | ExitOutcome::CancelledCleanly => 0,
            ExitOutcome::AbortedOnResource => 1,
        }
    }
}

/// What happens to each legacy object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MigrationMode {
    /// Move into the sharded layout.
    #[default]
    Move,
    /// Delete the legacy object; previews are regenerated on demand.
    Delete,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub batches: u64,
    pub objects_moved: u64,
    pub objects_deleted: u64,
    pub dirs_created: u64,
    pub dirs_removed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: ExitOutcome,
    pub stats: RunStats,
}

/// Per-invocation state; never persisted.
#[derive(Debug, Default)]
struct RunState {
    /// Destination folder last confirmed to exist.
    last_destination_parent: Option<StorePath>,
    /// Former parent of the most recently moved object.
    previous_source_parent: Option<StorePath>,
}

pub struct MigrationExecutor<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    layout: &'a PreviewLayout,
    mode: MigrationMode,
    dry_run: bool,
}

impl<'a, S: ObjectStore + ?Sized> MigrationExecutor<'a, S> {
    pub fn new(store: &'a S, layout: &'a PreviewLayout) -> Self {
        Self {
            store,
            layout,
            mode: MigrationMode::Move,
            dry_run: false,
        }
    }

    pub fn with_mode(mut self, mode: MigrationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Report every operation without touching the store.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Process batches until the input is exhausted or a stop is requested.
    pub fn run<B, E, G, C, P>(&self, batches: B, guard: &G, cancel: &C, progress: &mut P) -> Result<RunReport>
    where
        B: IntoIterator<Item = Result<MigrationBatch, E>>,
        anyhow::Error: From<E>,
        G: ResourceGuard + ?Sized,
        C: CancelSource + ?Sized,
        P: ProgressSink + ?Sized,
    {
        let mut state = RunState::default();
        let mut stats = RunStats::default();
        let mut batches = batches.into_iter();

        let outcome = loop {
            // Batch boundary: the only place a stop is honoured.
            if cancel.is_cancelled() {
                info!(batches = stats.batches, "Cancellation requested; stopping at group boundary");
                break ExitOutcome::CancelledCleanly;
            }
            let usage = guard.memory_usage();
            progress.memory(usage);
            if !guard.has_headroom() {
                warn!(
                    batches = stats.batches,
                    memory = usage.unwrap_or_default(),
                    "Memory headroom below safety margin; stopping before next group"
                );
                break ExitOutcome::AbortedOnResource;
            }

            let batch = match batches.next() {
                None => break ExitOutcome::Completed,
                Some(b) => b.map_err(anyhow::Error::from).context("scan for legacy previews failed")?,
            };

            progress.batch_started(&batch);
            self.migrate_batch(&batch, &mut state, &mut stats, progress)?;
            self.reclaim(&mut state, &mut stats, progress)?;
            stats.batches += 1;
            progress.advance();
            debug!(
                destination = %batch.destination_parent,
                objects = batch.len(),
                "Finished group"
            );
        };

        progress.finish(outcome);
        Ok(RunReport { outcome, stats })
    }

    fn migrate_batch<P>(
        &self,
        batch: &MigrationBatch,
        state: &mut RunState,
        stats: &mut RunStats,
        progress: &mut P,
    ) -> Result<()>
    where
        P: ProgressSink + ?Sized,
    {
        for record in &batch.records {
            let source = self.layout.legacy_source(&record.path)?;
            let destination = &record.path;

            match self.mode {
                MigrationMode::Move => {
                    progress.status(&format!("Moving {source} to {destination}"));
                    if self.dry_run {
                        info!(src = %source, dest = %destination, "dry-run: would move preview");
                    } else {
                        let parent = record.destination_parent();
                        self.ensure_destination_dir(&parent, state, stats)?;
                        self.store
                            .move_object(&source, destination)
                            .with_context(|| format!("move '{source}' -> '{destination}'"))?;
                        stats.objects_moved += 1;
                        debug!(file_id = %record.file_id, src = %source, dest = %destination, "Moved preview");
                    }
                }
                MigrationMode::Delete => {
                    progress.status(&format!("Deleting {source}"));
                    if self.dry_run {
                        info!(src = %source, "dry-run: would delete preview");
                    } else {
                        self.store
                            .delete_object(&source)
                            .with_context(|| format!("delete '{source}'"))?;
                        stats.objects_deleted += 1;
                        debug!(file_id = %record.file_id, src = %source, "Deleted preview");
                    }
                }
            }

            state.previous_source_parent = source.parent();
        }
        Ok(())
    }

    /// Stat the destination folder; a missing folder (and its ancestors) is created.
    fn ensure_destination_dir(&self, dir: &StorePath, state: &mut RunState, stats: &mut RunStats) -> Result<()> {
        if state.last_destination_parent.as_ref() == Some(dir) {
            return Ok(());
        }
        match self.store.stat_dir(dir) {
            Ok(()) => {}
            Err(MigrateError::NotFound(_)) => {
                debug!(dir = %dir, "Destination folder missing; creating it");
                self.store
                    .create_dir_all(dir)
                    .with_context(|| format!("create destination folder '{dir}'"))?;
                stats.dirs_created += 1;
            }
            Err(e) => return Err(e).with_context(|| format!("stat destination folder '{dir}'")),
        }
        state.last_destination_parent = Some(dir.clone());
        Ok(())
    }

    /// Delete the emptied legacy folder and then each ancestor that became empty,
    /// stopping at the first folder that still has an entry. The ascent never
    /// leaves the legacy root, so the preview root itself is never removed.
    fn reclaim<P>(&self, state: &mut RunState, stats: &mut RunStats, progress: &mut P) -> Result<()>
    where
        P: ProgressSink + ?Sized,
    {
        let Some(start) = state.previous_source_parent.take() else {
            return Ok(());
        };
        progress.status(&format!("Deleting empty parent folders of {start}"));
        if self.dry_run {
            info!(dir = %start, "dry-run: would delete empty parent folders");
            return Ok(());
        }

        let floor = self.layout.legacy_root();
        let mut current = start;
        while current.starts_with(&floor) {
            let empty = self
                .store
                .is_empty_dir(&current)
                .with_context(|| format!("list folder '{current}'"))?;
            if !empty {
                break;
            }
            let Some(parent) = current.parent() else {
                break;
            };
            self.store
                .remove_empty_dir(&current)
                .with_context(|| format!("delete empty folder '{current}'"))?;
            stats.dirs_removed += 1;
            debug!(dir = %current, "Deleted empty folder");
            current = parent;
        }
        Ok(())
    }
}
