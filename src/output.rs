//! User-facing messages with a consistent `info:/ok:/warn:/error:` prefix.
//! Colors are enabled only when the target stream is a TTY. Progress rendering
//! and the confirmation prompt use stderr, so `info`/`ok` lines on stdout stay scriptable.

use owo_colors::OwoColorize;

#[derive(Clone, Copy)]
enum Kind {
    Info,
    Success,
    Warn,
    Error,
}

impl Kind {
    fn to_stderr(self) -> bool {
        matches!(self, Kind::Warn | Kind::Error)
    }

    fn label(self) -> &'static str {
        match self {
            Kind::Info => "info:",
            Kind::Success => "ok:",
            Kind::Warn => "warn:",
            Kind::Error => "error:",
        }
    }
}

fn emit(kind: Kind, msg: &str) {
    let stream = if kind.to_stderr() { atty::Stream::Stderr } else { atty::Stream::Stdout };
    let label = kind.label();
    let prefix = if atty::is(stream) {
        match kind {
            Kind::Info => label.cyan().bold().to_string(),
            Kind::Success => label.green().bold().to_string(),
            Kind::Warn => label.yellow().bold().to_string(),
            Kind::Error => label.red().bold().to_string(),
        }
    } else {
        label.to_string()
    };
    if kind.to_stderr() {
        eprintln!("{prefix} {msg}");
    } else {
        println!("{prefix} {msg}");
    }
}

pub fn print_info(msg: &str) {
    emit(Kind::Info, msg);
}

pub fn print_success(msg: &str) {
    emit(Kind::Success, msg);
}

pub fn print_warn(msg: &str) {
    emit(Kind::Warn, msg);
}

pub fn print_error(msg: &str) {
    emit(Kind::Error, msg);
}
