use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Builder, Env, Target};
use phasescope::config::Config;
use std::fs::File;

fn main() -> Result<()> {
    let cfg = Config::parse();
    init_logging(&cfg)?;

    if cfg.list_devices {
        phasescope::audio::list_input_devices()?;
        return Ok(());
    }

    phasescope::app::run(cfg)
}

/// Logs go to `--log-file` when given; otherwise only errors reach stderr,
/// since the scope owns the terminal.
fn init_logging(cfg: &Config) -> Result<()> {
    let default_filter = if cfg.log_file.is_some() { "info" } else { "error" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_filter));
    builder.format_timestamp_millis();
    if let Some(path) = &cfg.log_file {
        let file = File::create(path)
            .with_context(|| format!("create log file {}", path.display()))?;
        builder.target(Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}
