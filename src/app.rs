//! Application orchestrator.
//! Loads/merges config, initializes logging, installs the signal handler, validates
//! the storage root, wires the migration collaborators and reports the outcome.

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, error};

use preview_migrate::cli::Args;
use preview_migrate::migrate::{
    AssumeYes, LegacyTreeScanner, NullProgress, ProgressSink, Prompt, SAFETY_MARGIN_BYTES, StdinPrompt,
    TerminalProgress,
};
use preview_migrate::output as out;
use preview_migrate::{
    CONFIG_ENV_VAR, Config, ExitOutcome, FsObjectStore, LoadResult, MemoryGuard, MigrateError, MigrationRun,
    RunOutcome, RunReport, ShutdownSignal, default_config_path, load_or_init, run_migration,
    validate_and_normalize,
};

use crate::logging::init_tracing;

/// Run the CLI application; returns the process exit code.
pub fn run(args: Args) -> Result<u8> {
    // Handle --print-config before logging init
    if args.print_config {
        print_config_location();
        return Ok(0);
    }

    let mut cfg = match load_or_init()? {
        LoadResult::Loaded { config, .. } => config,
        LoadResult::CreatedTemplate(path) => {
            out::print_success(&format!("A template preview_migrate config was written to: {}", path.display()));
            out::print_info("Edit the file to set `storage_root` (and optionally `memory_limit`, `log_level`, `log_file`). Example:\n\n<config>\n  <storage_root>/mnt/bucket</storage_root>\n  <memory_limit>512M</memory_limit>\n</config>\n");
            if args.storage_root.is_none() {
                out::print_info(&format!(
                    "Then re-run this command. To use a different location set {CONFIG_ENV_VAR}."
                ));
                return Ok(0);
            }
            Config::default()
        }
    };
    args.apply_overrides(&mut cfg);

    // Initialize logging and keep the guard so the interrupt handler can flush it
    let guard_opt = init_tracing(cfg.log_level, cfg.log_file.as_deref(), args.json).map_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {e}"));
        e
    })?;
    let guard_slot = Arc::new(Mutex::new(guard_opt));

    let shutdown = ShutdownSignal::new();
    {
        let guard_slot = Arc::clone(&guard_slot);
        let interrupted_once = AtomicBool::new(false);
        shutdown
            .install_handler(move || {
                if !interrupted_once.swap(true, Ordering::Relaxed) {
                    out::print_warn("Interrupt received; will finish the current group and then stop.");
                    return;
                }
                out::print_warn("Second interrupt; exiting without finishing the current group.");
                if let Ok(mut g) = guard_slot.lock() {
                    let _ = g.take(); // flush tracing_appender
                }
                std::process::exit(130);
            })
            .context("install interrupt handler")?;
    }

    debug!("Starting preview_migrate: {:?}", args);

    let result = migrate(&mut cfg, &shutdown);

    // Ensure logs are flushed before exit
    if let Ok(mut g) = guard_slot.lock() {
        let _ = g.take();
    }

    result
}

fn migrate(cfg: &mut Config, shutdown: &ShutdownSignal) -> Result<u8> {
    validate_and_normalize(cfg)?;
    let storage_root = cfg
        .storage_root
        .clone()
        .context("storage_root missing after validation")?;
    let layout = cfg.layout()?;

    let store = FsObjectStore::new(&storage_root);
    let scanner = LegacyTreeScanner::new(&storage_root, layout.clone());
    let guard = MemoryGuard::from_limit(cfg.memory_limit);

    let mut progress: Box<dyn ProgressSink> = if cfg.progress && atty::is(atty::Stream::Stderr) {
        Box::new(TerminalProgress::new())
    } else {
        Box::new(NullProgress)
    };
    let mut prompt: Box<dyn Prompt> = if cfg.assume_yes {
        Box::new(AssumeYes)
    } else {
        Box::new(StdinPrompt::stdio())
    };

    let run = MigrationRun {
        storage_root: &storage_root,
        store: &store,
        layout: &layout,
        scanner: &scanner,
        guard: &guard,
        cancel: shutdown,
        mode: cfg.mode(),
        dry_run: cfg.dry_run,
    };

    match run_migration(&run, prompt.as_mut(), progress.as_mut()) {
        Ok(outcome) => {
            report_outcome(&outcome, cfg);
            Ok(outcome.exit_code())
        }
        Err(e) => {
            if let Some(me) = e.downcast_ref::<MigrateError>() {
                let code = me.code();
                match me {
                    MigrateError::AlreadyRunning(lock) => {
                        error!(code, kind = me.kind(), lock = %lock.display(), "Another migration is running")
                    }
                    MigrateError::DirectoryNotEmpty(dir) => {
                        error!(code, kind = me.kind(), dir = %dir, "Reclaim failed")
                    }
                    MigrateError::AlreadyExists(dest) => {
                        error!(code, kind = me.kind(), dest = %dest, "Move refused")
                    }
                    _ => error!(code, kind = me.kind(), error = %format!("{e:#}"), "Migration failed"),
                }
            } else {
                error!(error = %format!("{e:#}"), "Migration failed");
            }
            Err(e)
        }
    }
}

fn report_outcome(outcome: &RunOutcome, cfg: &Config) {
    let report: &RunReport = match outcome {
        RunOutcome::Declined => {
            out::print_info("Declined; nothing was changed.");
            return;
        }
        RunOutcome::Finished(report) => report,
    };
    let s = &report.stats;
    let done = if cfg.dry_run {
        format!("Dry-run walked {} group(s); nothing was changed.", s.batches)
    } else if cfg.delete_legacy {
        format!(
            "Deleted {} preview(s) in {} group(s); removed {} empty folder(s).",
            s.objects_deleted, s.batches, s.dirs_removed
        )
    } else {
        format!(
            "Migrated {} preview(s) in {} group(s); removed {} empty folder(s).",
            s.objects_moved, s.batches, s.dirs_removed
        )
    };

    match report.outcome {
        ExitOutcome::Completed => {
            if s.batches > 0 {
                out::print_success(&done);
            }
        }
        ExitOutcome::CancelledCleanly => {
            out::print_info(&done);
            out::print_warn("Stopped after the current group as requested. Run again to continue where this run left off.");
        }
        ExitOutcome::AbortedOnResource => {
            out::print_info(&done);
            out::print_error(&format!(
                "Stopped: less than {} MiB of memory headroom left below the limit. Raise memory_limit or run again to continue.",
                SAFETY_MARGIN_BYTES / (1024 * 1024)
            ));
        }
    }
}

fn print_config_location() {
    if let Ok(cfg_env) = std::env::var(CONFIG_ENV_VAR) {
        out::print_info(&format!("Using {CONFIG_ENV_VAR} (explicit):\n  {cfg_env}\n"));
        out::print_info(&format!("To override, unset {CONFIG_ENV_VAR} or set it to another file."));
        return;
    }
    match default_config_path() {
        Ok(p) => {
            out::print_info(&format!("Default preview_migrate config path:\n  {}\n", p.display()));
            if p.exists() {
                out::print_info("A config file already exists at that location.");
            } else {
                out::print_info("No config file exists there yet. Run without --print-config to create a template.");
            }
        }
        Err(e) => out::print_error(&format!("Could not determine a default config path: {e}")),
    }
}
