//! Log output for the webhook server and the `docbridge-query` tool.
//!
//! Every webhook call logs inside its `webhook` span, so each line carries the call's
//! `request_id`. Lines are mirrored to stdout and to `DOCBRIDGE_LOG_FILE`
//! (default `logs/docbridge.log`). Credentials never reach these sinks; `Config` redacts them.
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global subscriber. Call once, after `.env` is loaded and before the pipeline is
/// built, so configuration warnings about missing credentials are captured.
///
/// `RUST_LOG` filters both sinks (default `info`); `RUST_LOG=docbridge=debug` adds per-file
/// extraction and prompt-source lines. If the log file cannot be opened, only stdout is used.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(false).compact();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer);

    if let Some(writer) = configure_file_writer() {
        let file_layer = fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .compact();

        registry.with(file_layer).init();
    } else {
        registry.init();
    }
}

const LOG_FILE_VAR: &str = "DOCBRIDGE_LOG_FILE";
const DEFAULT_LOG_FILE: &str = "logs/docbridge.log";

/// Appending file writer; the worker guard lives in `LOG_GUARD` until exit.
fn configure_file_writer() -> Option<NonBlocking> {
    let path = std::env::var(LOG_FILE_VAR)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());
    let file = open_log_file(Path::new(&path))?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file);
    let _ = LOG_GUARD.set(guard);
    Some(non_blocking)
}

/// Open `path` for appending, creating its parent directory first.
fn open_log_file(path: &Path) -> Option<File> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        if let Err(err) = std::fs::create_dir_all(parent) {
            eprintln!("Failed to create log directory {}: {err}", parent.display());
            return None;
        }
    }
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(file),
        Err(err) => {
            eprintln!("Failed to open log file {}: {err}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("docbridge-{name}-{}", std::process::id()))
    }

    #[test]
    fn log_file_and_missing_parent_are_created() {
        let dir = scratch_dir("logs");
        let path = dir.join("nested").join("webhook.log");

        let mut file = open_log_file(&path).expect("log file");
        writeln!(file, "first line").expect("write");
        drop(file);
        let mut file = open_log_file(&path).expect("reopen");
        writeln!(file, "second line").expect("write");
        drop(file);

        let contents = std::fs::read_to_string(&path).expect("read log");
        assert_eq!(contents, "first line\nsecond line\n");
        std::fs::remove_dir_all(dir).expect("cleanup");
    }

    #[test]
    fn unopenable_path_disables_file_logging() {
        let dir = scratch_dir("blocked");
        std::fs::create_dir_all(&dir).expect("dir");
        let blocker = dir.join("not-a-dir");
        std::fs::write(&blocker, b"").expect("blocker");

        assert!(open_log_file(&blocker.join("docbridge.log")).is_none());
        std::fs::remove_dir_all(dir).expect("cleanup");
    }
}
