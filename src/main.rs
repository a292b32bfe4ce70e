use anyhow::Result;
use std::process::ExitCode;

mod app;
mod logging;

fn main() -> Result<ExitCode> {
    let args = preview_migrate::cli::parse();
    app::run(args).map(ExitCode::from)
}
