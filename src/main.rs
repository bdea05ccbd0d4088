use std::io::Write;

use anyhow::Context;
use clap::Parser;
use release_notifier::config::{Args, Config};
use release_notifier::{logger, run};
use tracing as log;

/// Appends `total-comments=<n>` to the file GitHub Actions reads step
/// outputs from, when running as an action.
fn set_output(total: u64) -> anyhow::Result<()> {
    let Some(path) = std::env::var_os("GITHUB_OUTPUT") else {
        return Ok(());
    };
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(&path)
        .with_context(|| format!("failed to open {}", path.to_string_lossy()))?;
    writeln!(file, "total-comments={total}")
        .with_context(|| format!("failed to write to {}", path.to_string_lossy()))?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logger::init();

    let config = Config::from_args(Args::parse())?;
    let total = match run::run(&config).await {
        Ok(total) => total,
        Err(e) => {
            log::error!("{e:?}");
            return Err(e);
        }
    };

    println!("{total}");
    set_output(total)?;
    Ok(())
}
